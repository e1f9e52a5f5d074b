// src/store/memory.rs

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;
use crate::models::host::Host;
use crate::models::listing::{Listing, ListingChanges, ListingKey, NewListing};
use crate::store::{Catalog, ListingQuery, ListingStore};

/// In-memory listing store with the same filter semantics as `PgStore`.
/// Backs the integration tests and local development without a database.
#[derive(Default)]
pub struct MemoryStore {
    cars: Mutex<Vec<Listing>>,
    parts: Mutex<Vec<Listing>>,
    hosts: Mutex<Vec<Host>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Loads fixture listings, assigning ids and creation times where the
    /// fixture left them out.
    pub fn seed(&self, catalog: Catalog, listings: Vec<Listing>) {
        let mut rows = self.rows(catalog).lock().expect("listing store poisoned");
        for mut listing in listings {
            if listing.id.is_none() {
                listing.id = Some(self.allocate_id());
            }
            if listing.created_at.is_none() {
                listing.created_at = Some(Utc::now());
            }
            rows.push(listing);
        }
    }

    fn rows(&self, catalog: Catalog) -> &Mutex<Vec<Listing>> {
        match catalog {
            Catalog::Cars => &self.cars,
            Catalog::Parts => &self.parts,
        }
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.lock().expect("listing store poisoned");
        *next += 1;
        *next
    }
}

fn contains_ci(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_deref()
        .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
}

fn matches(listing: &Listing, query: &ListingQuery) -> bool {
    if let Some(is_for_rent) = query.is_for_rent {
        if listing.is_for_rent != is_for_rent {
            return false;
        }
    }
    if let Some(location) = &query.location_like {
        if !contains_ci(&listing.location, location) {
            return false;
        }
    }
    if let Some(brand) = &query.brand_like {
        if !contains_ci(&listing.brand, brand) {
            return false;
        }
    }
    if let Some(model) = &query.model_like {
        if !contains_ci(&listing.model, model) {
            return false;
        }
    }
    if let Some(year) = query.year {
        if listing.year != Some(year) {
            return false;
        }
    }

    // Same column selection as the SQL query; a missing price fails any
    // bound, as NULL comparisons do.
    let price = if query.price_column() == "price_buy" {
        listing.price_buy
    } else {
        listing.price_per_day
    };
    if let Some(min) = query.min_price {
        if !price.is_some_and(|p| p >= min) {
            return false;
        }
    }
    if let Some(max) = query.max_price {
        if !price.is_some_and(|p| p <= max) {
            return false;
        }
    }

    if let Some(promoted) = query.promoted {
        if listing.promoted != promoted {
            return false;
        }
    }

    if let Some(exclude_id) = query.exclude_id {
        if listing.id == Some(exclude_id) {
            return false;
        }
    }
    if let Some(exclude_slug) = &query.exclude_slug {
        if listing.slug.as_deref() == Some(exclude_slug.as_str()) {
            return false;
        }
    }

    true
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn search(
        &self,
        catalog: Catalog,
        query: &ListingQuery,
    ) -> Result<Vec<Listing>, AppError> {
        let rows = self.rows(catalog).lock().expect("listing store poisoned");
        let mut hits: Vec<Listing> = rows
            .iter()
            .filter(|listing| matches(listing, query))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(query.limit.max(0) as usize);
        Ok(hits)
    }

    async fn find_by_key(
        &self,
        catalog: Catalog,
        key: &ListingKey,
    ) -> Result<Option<Listing>, AppError> {
        let rows = self.rows(catalog).lock().expect("listing store poisoned");
        let hit = rows
            .iter()
            .find(|listing| match key {
                ListingKey::Id(id) => listing.id == Some(*id),
                ListingKey::Slug(slug) => listing.slug.as_deref() == Some(slug.as_str()),
            })
            .cloned();
        Ok(hit)
    }

    async fn by_owner(&self, catalog: Catalog, owner_id: i64) -> Result<Vec<Listing>, AppError> {
        let rows = self.rows(catalog).lock().expect("listing store poisoned");
        let mut mine: Vec<Listing> = rows
            .iter()
            .filter(|listing| listing.owner_id == Some(owner_id))
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn upsert(
        &self,
        catalog: Catalog,
        listing: NewListing,
    ) -> Result<Option<Listing>, AppError> {
        let now = Utc::now();
        let mut rows = self.rows(catalog).lock().expect("listing store poisoned");

        if let Some(existing) = rows
            .iter_mut()
            .find(|row| row.slug.as_deref() == Some(listing.slug.as_str()))
        {
            // Same owner guard as the SQL conflict clause.
            if existing.owner_id != Some(listing.owner_id) {
                return Ok(None);
            }
            existing.title = listing.title;
            existing.brand = listing.brand;
            existing.model = listing.model;
            existing.year = listing.year;
            existing.body_type = listing.body_type;
            existing.location = listing.location;
            existing.description = listing.description;
            existing.images = sqlx::types::Json(listing.images);
            existing.is_for_rent = listing.is_for_rent;
            existing.price_per_day = listing.price_per_day;
            existing.price_buy = listing.price_buy;
            existing.currency = listing.currency;
            existing.status = Some(listing.status);
            existing.updated_at = Some(now);
            return Ok(Some(existing.clone()));
        }

        let stored = Listing {
            id: Some(self.allocate_id()),
            slug: Some(listing.slug),
            title: listing.title,
            brand: listing.brand,
            model: listing.model,
            year: listing.year,
            body_type: listing.body_type,
            location: listing.location,
            seller: None,
            description: listing.description,
            images: sqlx::types::Json(listing.images),
            is_for_rent: listing.is_for_rent,
            price_per_day: listing.price_per_day,
            price_buy: listing.price_buy,
            currency: listing.currency,
            status: Some(listing.status),
            owner_id: Some(listing.owner_id),
            created_at: Some(now),
            updated_at: Some(now),
            ..Listing::default()
        };
        rows.push(stored.clone());
        Ok(Some(stored))
    }

    async fn update(
        &self,
        catalog: Catalog,
        id: i64,
        owner_id: i64,
        changes: ListingChanges,
    ) -> Result<Option<Listing>, AppError> {
        let mut rows = self.rows(catalog).lock().expect("listing store poisoned");
        let Some(listing) = rows
            .iter_mut()
            .find(|row| row.id == Some(id) && row.owner_id == Some(owner_id))
        else {
            return Ok(None);
        };

        if let Some(description) = changes.description {
            listing.description = description;
        }
        if let Some(status) = changes.status {
            listing.status = Some(status);
        }
        if let Some(price_per_day) = changes.price_per_day {
            listing.price_per_day = price_per_day;
        }
        if let Some(price_buy) = changes.price_buy {
            listing.price_buy = price_buy;
        }
        if let Some(closed_at) = changes.closed_at {
            listing.closed_at = closed_at;
        }
        listing.updated_at = Some(Utc::now());

        Ok(Some(listing.clone()))
    }

    async fn record_view(&self, catalog: Catalog, id: i64) -> Result<(), AppError> {
        let mut rows = self.rows(catalog).lock().expect("listing store poisoned");
        if let Some(listing) = rows.iter_mut().find(|row| row.id == Some(id)) {
            listing.views_count += 1;
        }
        Ok(())
    }

    async fn upsert_host(&self, email: &str) -> Result<Host, AppError> {
        let mut hosts = self.hosts.lock().expect("listing store poisoned");
        if let Some(host) = hosts.iter().find(|host| host.email == email) {
            return Ok(host.clone());
        }

        let host = Host {
            id: hosts.len() as i64 + 1,
            email: email.to_string(),
            created_at: Some(Utc::now()),
        };
        hosts.push(host.clone());
        Ok(host)
    }
}
