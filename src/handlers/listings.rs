// src/handlers/listings.rs

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppError,
    models::listing::{Listing, ListingDetail, ListingIdentity, ListingKey},
    recommend,
    store::{Catalog, ListingQuery, ListingStore},
    visibility::{is_closed_for_display, is_publicly_visible},
};

const BROWSE_LIMIT: i64 = 48;
const FEATURED_LIMIT: usize = 8;
const MAX_COMPARE_ITEMS: usize = 4;

/// Query parameters for the browse feeds.
#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    /// 'rent' or 'sale'; anything else means both.
    pub mode: Option<String>,
    pub location: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<i64>,
}

fn browse_query(params: &BrowseParams) -> ListingQuery {
    let is_for_rent = match params.mode.as_deref() {
        Some("rent") => Some(true),
        Some("sale") | Some("buy") => Some(false),
        _ => None,
    };

    ListingQuery {
        is_for_rent,
        location_like: params.location.clone(),
        brand_like: params.brand.clone(),
        model_like: params.model.clone(),
        year: params.year,
        min_price: params.min_price,
        max_price: params.max_price,
        promoted: None,
        exclude_id: None,
        exclude_slug: None,
        limit: params.limit.unwrap_or(BROWSE_LIMIT).clamp(1, BROWSE_LIMIT),
    }
}

async fn feed(
    store: Arc<dyn ListingStore>,
    catalog: Catalog,
    params: BrowseParams,
) -> Result<Json<Vec<Listing>>, AppError> {
    let rows = store.search(catalog, &browse_query(&params)).await?;
    let now = Utc::now();
    let visible = rows
        .into_iter()
        .filter(|listing| is_publicly_visible(listing, now))
        .collect();
    Ok(Json(visible))
}

/// Public cars feed with optional filters, newest first.
pub async fn list_cars(
    State(store): State<Arc<dyn ListingStore>>,
    Query(params): Query<BrowseParams>,
) -> Result<impl IntoResponse, AppError> {
    feed(store, Catalog::Cars, params).await
}

/// Public parts feed, same filter surface as cars.
pub async fn list_parts(
    State(store): State<Arc<dyn ListingStore>>,
    Query(params): Query<BrowseParams>,
) -> Result<impl IntoResponse, AppError> {
    feed(store, Catalog::Parts, params).await
}

/// Home-page hero feed: currently promoted listings first, then recent.
///
/// Promoted rows are queried explicitly so a long-running promotion still
/// surfaces after newer listings have pushed it out of the recency window.
pub async fn featured_cars(
    State(store): State<Arc<dyn ListingStore>>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();

    let promoted_query = ListingQuery {
        promoted: Some(true),
        ..ListingQuery::default()
    };
    let mut featured: Vec<Listing> = store
        .search(Catalog::Cars, &promoted_query)
        .await?
        .into_iter()
        .filter(|listing| listing.is_promoted_now(now) && is_publicly_visible(listing, now))
        .collect();

    if featured.len() < FEATURED_LIMIT {
        let seen: HashSet<ListingIdentity> =
            featured.iter().filter_map(Listing::identity).collect();
        let recent = store.search(Catalog::Cars, &ListingQuery::default()).await?;
        featured.extend(
            recent
                .into_iter()
                .filter(|listing| is_publicly_visible(listing, now))
                .filter(|listing| {
                    listing
                        .identity()
                        .is_none_or(|identity| !seen.contains(&identity))
                }),
        );
    }
    featured.truncate(FEATURED_LIMIT);

    Ok(Json(featured))
}

/// Query parameters for compare-tray hydration.
#[derive(Debug, Deserialize)]
pub struct CompareParams {
    /// Comma-separated slugs, capped at the tray size.
    pub slugs: String,
}

/// Resolves the compare tray's slugs into full listings, dropping anything
/// no longer publicly visible.
pub async fn compare_cars(
    State(store): State<Arc<dyn ListingStore>>,
    Query(params): Query<CompareParams>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let mut listings = Vec::new();

    for slug in params
        .slugs
        .split(',')
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .take(MAX_COMPARE_ITEMS)
    {
        let key = ListingKey::Slug(slug.to_string());
        if let Some(listing) = store.find_by_key(Catalog::Cars, &key).await? {
            if is_publicly_visible(&listing, now) {
                listings.push(listing);
            }
        }
    }

    Ok(Json(listings))
}

/// Car detail page: the listing plus its recommendation blocks.
pub async fn get_car(
    State(store): State<Arc<dyn ListingStore>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    detail(store, Catalog::Cars, &key, true).await
}

/// Part detail page. Parts carry no recommendation blocks.
pub async fn get_part(
    State(store): State<Arc<dyn ListingStore>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    detail(store, Catalog::Parts, &key, false).await
}

async fn detail(
    store: Arc<dyn ListingStore>,
    catalog: Catalog,
    raw_key: &str,
    with_recommendations: bool,
) -> Result<Json<ListingDetail>, AppError> {
    let key = ListingKey::parse(raw_key);
    let listing = store
        .find_by_key(catalog, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

    let now = Utc::now();
    if !is_publicly_visible(&listing, now) {
        // Drafts and long-closed listings look exactly like missing ones.
        return Err(AppError::NotFound("Listing not found".to_string()));
    }

    if let Some(id) = listing.id {
        if let Err(err) = store.record_view(catalog, id).await {
            tracing::warn!("failed to record view for listing {id}: {err}");
        }
    }

    let (similar_rentals, recommended_sales) = if with_recommendations {
        if listing.is_for_rent {
            (
                recommend::similar_rentals(store.as_ref(), catalog, &listing).await,
                Vec::new(),
            )
        } else {
            (
                Vec::new(),
                recommend::recommended_sales(store.as_ref(), catalog, &listing).await,
            )
        }
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(Json(ListingDetail {
        closed_for_display: is_closed_for_display(&listing, now),
        listing,
        similar_rentals,
        recommended_sales,
    }))
}
