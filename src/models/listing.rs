// src/models/listing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use url::Url;
use validator::Validate;

/// Canonical listing record, shared by the 'cars' and 'parts' tables.
///
/// Rows arriving from outside the crate (store payloads, older clients) use a
/// mix of historical field names (`pricePerDay`, `host_name`, ...); serde
/// aliases fold them into this one shape at the boundary so the ranking and
/// visibility code never has to duck-type.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: Option<i64>,

    /// Human-readable alternate key, unique per table. Preferred for lookups.
    #[serde(default)]
    pub slug: Option<String>,

    pub title: String,

    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,

    /// Free-text body style ("SUV", "pickup truck", ...). Only a ranking hint.
    #[serde(default)]
    pub body_type: Option<String>,

    /// Comma-delimited "city, region, country".
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default, alias = "host_name")]
    pub seller: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Ordered image URLs, stored as a JSON array.
    #[serde(default = "empty_images")]
    pub images: Json<Vec<String>>,

    #[serde(default)]
    pub is_for_rent: bool,

    /// Active when `is_for_rent` is true; the other price field is ignored.
    #[serde(default, alias = "pricePerDay")]
    pub price_per_day: Option<f64>,

    /// Active when `is_for_rent` is false.
    #[serde(default, alias = "priceBuy")]
    pub price_buy: Option<f64>,

    #[serde(default, alias = "price_currency")]
    pub currency: Option<String>,

    /// 'active' | 'closed' | 'draft'. Absent means active.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub owner_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub views_count: i64,
    #[serde(default)]
    pub sales_count: i64,

    #[serde(default)]
    pub promoted: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub promoted_expires: Option<DateTime<Utc>>,
}

fn empty_images() -> Json<Vec<String>> {
    Json(Vec::new())
}

/// Tolerant timestamp field: anything that is not a well-formed RFC 3339
/// string becomes `None` instead of a deserialization error. Visibility
/// rules treat a missing timestamp as "not visible", so malformed data
/// fails closed.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) => parse_timestamp(&raw),
        _ => None,
    })
}

/// Parses an RFC 3339 timestamp, returning `None` on malformed input.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Default for Listing {
    fn default() -> Self {
        Listing {
            id: None,
            slug: None,
            title: String::new(),
            brand: None,
            model: None,
            year: None,
            body_type: None,
            location: None,
            seller: None,
            description: None,
            images: empty_images(),
            is_for_rent: false,
            price_per_day: None,
            price_buy: None,
            currency: None,
            status: None,
            owner_id: None,
            created_at: None,
            updated_at: None,
            closed_at: None,
            views_count: 0,
            sales_count: 0,
            promoted: false,
            promoted_expires: None,
        }
    }
}

impl Listing {
    /// Lowercased status, defaulting to 'active' when absent or blank.
    pub fn status_or_default(&self) -> String {
        match self.status.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => "active".to_string(),
        }
    }

    /// The price field selected by `is_for_rent`.
    pub fn active_price(&self) -> Option<f64> {
        if self.is_for_rent {
            self.price_per_day
        } else {
            self.price_buy
        }
    }

    /// Dedup key: id when present, otherwise slug. Listings with neither
    /// cannot be deduplicated and are kept as-is.
    pub fn identity(&self) -> Option<ListingIdentity> {
        if let Some(id) = self.id {
            return Some(ListingIdentity::Id(id));
        }
        self.slug.clone().map(ListingIdentity::Slug)
    }

    /// Normalized seller name for vendor comparisons; blank sellers yield
    /// `None` and never count as a distinct vendor.
    pub fn seller_key(&self) -> Option<String> {
        let key = self.seller.as_deref()?.trim().to_lowercase();
        if key.is_empty() { None } else { Some(key) }
    }

    /// Instant the grace window is measured from: `closed_at`, falling back
    /// to `updated_at`.
    pub fn closed_reference(&self) -> Option<DateTime<Utc>> {
        self.closed_at.or(self.updated_at)
    }

    pub fn is_promoted_now(&self, now: DateTime<Utc>) -> bool {
        self.promoted && self.promoted_expires.is_none_or(|expires| expires > now)
    }
}

/// Identity used when merging candidate pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingIdentity {
    Id(i64),
    Slug(String),
}

/// Lookup key for detail pages: numeric path segments are ids, anything
/// else is a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingKey {
    Id(i64),
    Slug(String),
}

impl ListingKey {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => ListingKey::Id(id),
            Err(_) => ListingKey::Slug(raw.to_string()),
        }
    }
}

/// Detail-page payload: the focal listing plus its recommendation blocks.
#[derive(Debug, Serialize)]
pub struct ListingDetail {
    pub listing: Listing,
    /// True while a closed listing is still inside the grace window, so the
    /// page can render the "sold recently" state instead of hiding it.
    pub closed_for_display: bool,
    pub similar_rentals: Vec<Listing>,
    pub recommended_sales: Vec<Listing>,
}

/// DTO for creating a new ad from the host dashboard.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 140))]
    pub title: String,
    #[validate(length(max = 60))]
    pub brand: Option<String>,
    #[validate(length(max = 60))]
    pub model: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(max = 40))]
    pub body_type: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// 'rent' or 'buy'.
    #[serde(alias = "type")]
    #[validate(custom(function = validate_listing_type))]
    pub listing_type: String,
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    /// Already-uploaded image URLs; object storage is a separate service.
    #[serde(default)]
    #[validate(custom(function = validate_image_urls))]
    pub images: Vec<String>,
    #[validate(custom(function = validate_status))]
    pub status: Option<String>,
    #[validate(length(max = 8))]
    pub currency: Option<String>,
}

/// DTO for the partial edits the dashboard supports.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_status))]
    pub status: Option<String>,
    /// Routed to the price column matching the listing's `is_for_rent`.
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
}

fn validate_listing_type(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "rent" | "buy" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_listing_type")),
    }
}

fn validate_status(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "active" | "closed" | "draft" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_status")),
    }
}

fn validate_image_urls(urls: &[String]) -> Result<(), validator::ValidationError> {
    for url in urls {
        if url.len() > 500 {
            return Err(validator::ValidationError::new("url_too_long"));
        }
        if Url::parse(url).is_err() {
            return Err(validator::ValidationError::new("invalid_url"));
        }
    }
    Ok(())
}

/// Write payload for `ListingStore::upsert`, keyed on `slug`.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub slug: String,
    pub title: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub body_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_for_rent: bool,
    pub price_per_day: Option<f64>,
    pub price_buy: Option<f64>,
    pub currency: Option<String>,
    pub status: String,
    pub owner_id: i64,
}

/// Field-level changes for `ListingStore::update`. Outer `None` means
/// "leave untouched"; inner `None` clears the column.
#[derive(Debug, Clone, Default)]
pub struct ListingChanges {
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub price_per_day: Option<Option<f64>>,
    pub price_buy: Option<Option<f64>>,
    pub closed_at: Option<Option<DateTime<Utc>>>,
}

impl ListingChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.status.is_none()
            && self.price_per_day.is_none()
            && self.price_buy.is_none()
            && self.closed_at.is_none()
    }
}
