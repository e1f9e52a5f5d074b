// src/store/mod.rs

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::host::Host;
use crate::models::listing::{Listing, ListingChanges, ListingKey, NewListing};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Which listing table a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Cars,
    Parts,
}

impl Catalog {
    pub fn table(self) -> &'static str {
        match self {
            Catalog::Cars => "cars",
            Catalog::Parts => "parts",
        }
    }
}

const DEFAULT_SEARCH_LIMIT: i64 = 48;

/// Filter set for listing searches, mirroring the equals / gte / lte / neq /
/// ilike surface the managed store exposes. Results are always ordered by
/// `created_at` descending.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub is_for_rent: Option<bool>,
    pub location_like: Option<String>,
    pub brand_like: Option<String>,
    pub model_like: Option<String>,
    pub year: Option<i32>,
    /// Bounds on the price column selected by `is_for_rent`
    /// (`price_buy` for sales, `price_per_day` otherwise).
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Filters on the raw `promoted` flag; expiry is a display concern the
    /// caller checks with `is_promoted_now`.
    pub promoted: Option<bool>,
    pub exclude_id: Option<i64>,
    pub exclude_slug: Option<String>,
    pub limit: i64,
}

impl Default for ListingQuery {
    fn default() -> Self {
        ListingQuery {
            is_for_rent: None,
            location_like: None,
            brand_like: None,
            model_like: None,
            year: None,
            min_price: None,
            max_price: None,
            promoted: None,
            exclude_id: None,
            exclude_slug: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ListingQuery {
    pub fn rentals() -> Self {
        ListingQuery {
            is_for_rent: Some(true),
            ..ListingQuery::default()
        }
    }

    pub fn sales() -> Self {
        ListingQuery {
            is_for_rent: Some(false),
            ..ListingQuery::default()
        }
    }

    pub fn price_between(mut self, min: f64, max: f64) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    /// Excludes a focal listing by both id and slug.
    pub fn excluding(mut self, listing: &Listing) -> Self {
        self.exclude_id = listing.id;
        self.exclude_slug = listing.slug.clone();
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// The price column this query's bounds apply to.
    pub fn price_column(&self) -> &'static str {
        if self.is_for_rent == Some(false) {
            "price_buy"
        } else {
            "price_per_day"
        }
    }
}

/// The data-store collaborator seam. Page handlers and the recommendation
/// engine only ever talk to this trait; the concrete transport lives behind
/// it (Postgres in production, an in-memory store in tests).
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn search(&self, catalog: Catalog, query: &ListingQuery)
    -> Result<Vec<Listing>, AppError>;

    async fn find_by_key(
        &self,
        catalog: Catalog,
        key: &ListingKey,
    ) -> Result<Option<Listing>, AppError>;

    async fn by_owner(&self, catalog: Catalog, owner_id: i64) -> Result<Vec<Listing>, AppError>;

    /// Inserts a listing, replacing any existing row with the same slug.
    /// Returns `None` when the slug already belongs to a different owner;
    /// the existing row is left untouched.
    async fn upsert(
        &self,
        catalog: Catalog,
        listing: NewListing,
    ) -> Result<Option<Listing>, AppError>;

    /// Applies partial changes to a listing owned by `owner_id`. Returns
    /// `None` when no such row exists (wrong id or wrong owner).
    async fn update(
        &self,
        catalog: Catalog,
        id: i64,
        owner_id: i64,
        changes: ListingChanges,
    ) -> Result<Option<Listing>, AppError>;

    /// Bumps the view counter. Best-effort; callers tolerate failure.
    async fn record_view(&self, catalog: Catalog, id: i64) -> Result<(), AppError>;

    /// Finds or creates the host row for an email address.
    async fn upsert_host(&self, email: &str) -> Result<Host, AppError>;
}
