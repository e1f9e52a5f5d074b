// src/handlers/host.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::listing::{
        CreateListingRequest, Listing, ListingChanges, ListingKey, NewListing,
        UpdateListingRequest,
    },
    store::{Catalog, ListingStore},
    utils::{html::clean_html, jwt::Claims, slug::generate_slug},
};

fn owner_id(claims: &Claims) -> i64 {
    claims.sub.parse::<i64>().unwrap_or(0)
}

/// Trims optional free-text fields, dropping blanks entirely.
fn normalized(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Lists the current host's ads, partitioned the way the dashboard renders
/// them: everything not closed on top, closed ads below.
pub async fn list_my_listings(
    State(store): State<Arc<dyn ListingStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let mine = store.by_owner(Catalog::Cars, owner_id(&claims)).await?;
    let (closed, active): (Vec<Listing>, Vec<Listing>) = mine
        .into_iter()
        .partition(|listing| listing.status_or_default() == "closed");

    Ok(Json(serde_json::json!({
        "active": active,
        "closed": closed,
    })))
}

/// Creates a new ad for the current host.
///
/// The slug is generated from the title; the write is an upsert keyed on
/// slug, so a retried submission lands on the same row instead of
/// duplicating it.
pub async fn create_listing(
    State(store): State<Arc<dyn ListingStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let now = Utc::now();
    let is_for_rent = payload.listing_type == "rent";
    let description = normalized(payload.description).map(|text| clean_html(&text));

    let listing = NewListing {
        slug: generate_slug(payload.title.trim(), now),
        title: payload.title.trim().to_string(),
        brand: normalized(payload.brand),
        model: normalized(payload.model),
        year: payload.year,
        body_type: normalized(payload.body_type),
        location: normalized(payload.location),
        description,
        images: payload.images,
        is_for_rent,
        price_per_day: if is_for_rent { payload.price } else { None },
        price_buy: if is_for_rent { None } else { payload.price },
        currency: normalized(payload.currency).map(|c| c.to_uppercase()),
        status: payload.status.unwrap_or_else(|| "active".to_string()),
        owner_id: owner_id(&claims),
    };

    let stored = store
        .upsert(Catalog::Cars, listing)
        .await?
        .ok_or_else(|| {
            // Slug collision with another host's row; a retry regenerates
            // the time-derived suffix.
            AppError::BadRequest("Could not save the listing, please retry".to_string())
        })?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Applies the dashboard's partial edits to one of the host's ads.
///
/// A status transition to 'closed' stamps `closed_at`, starting the public
/// grace window; any transition away from 'closed' clears it. The price
/// lands on the column matching the listing's `is_for_rent`.
pub async fn update_listing(
    State(store): State<Arc<dyn ListingStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let owner = owner_id(&claims);
    let current = store
        .find_by_key(Catalog::Cars, &ListingKey::Id(id))
        .await?
        .filter(|listing| listing.owner_id == Some(owner))
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

    let mut changes = ListingChanges::default();

    if let Some(description) = payload.description {
        let cleaned = normalized(Some(description)).map(|text| clean_html(&text));
        changes.description = Some(cleaned);
    }

    if let Some(status) = payload.status {
        if status != current.status_or_default() {
            changes.closed_at = Some(if status == "closed" {
                Some(Utc::now())
            } else {
                None
            });
            changes.status = Some(status);
        }
    }

    if let Some(price) = payload.price {
        if current.is_for_rent {
            changes.price_per_day = Some(Some(price));
        } else {
            changes.price_buy = Some(Some(price));
        }
    }

    if changes.is_empty() {
        return Err(AppError::BadRequest("No updates to save".to_string()));
    }

    let updated = store
        .update(Catalog::Cars, id, owner, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

    Ok(Json(updated))
}
