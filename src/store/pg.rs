// src/store/pg.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::host::Host;
use crate::models::listing::{Listing, ListingChanges, ListingKey, NewListing};
use crate::store::{Catalog, ListingQuery, ListingStore};

/// Postgres-backed listing store.
///
/// Queries are built at runtime with `QueryBuilder` because the filter set
/// is dynamic; table names come from `Catalog::table()`, never from user
/// input, and every value is bound.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn search(
        &self,
        catalog: Catalog,
        query: &ListingQuery,
    ) -> Result<Vec<Listing>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM ");
        builder.push(catalog.table());
        builder.push(" WHERE TRUE");

        if let Some(is_for_rent) = query.is_for_rent {
            builder.push(" AND is_for_rent = ").push_bind(is_for_rent);
        }
        if let Some(location) = &query.location_like {
            builder
                .push(" AND location ILIKE ")
                .push_bind(format!("%{location}%"));
        }
        if let Some(brand) = &query.brand_like {
            builder
                .push(" AND brand ILIKE ")
                .push_bind(format!("%{brand}%"));
        }
        if let Some(model) = &query.model_like {
            builder
                .push(" AND model ILIKE ")
                .push_bind(format!("%{model}%"));
        }
        if let Some(year) = query.year {
            builder.push(" AND year = ").push_bind(year);
        }

        let price_column = query.price_column();
        if let Some(min) = query.min_price {
            builder
                .push(format!(" AND {price_column} >= "))
                .push_bind(min);
        }
        if let Some(max) = query.max_price {
            builder
                .push(format!(" AND {price_column} <= "))
                .push_bind(max);
        }

        if let Some(promoted) = query.promoted {
            builder.push(" AND promoted = ").push_bind(promoted);
        }
        if let Some(id) = query.exclude_id {
            builder.push(" AND id <> ").push_bind(id);
        }
        if let Some(slug) = &query.exclude_slug {
            builder.push(" AND slug <> ").push_bind(slug.clone());
        }

        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.limit);

        let rows = builder
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_key(
        &self,
        catalog: Catalog,
        key: &ListingKey,
    ) -> Result<Option<Listing>, AppError> {
        let table = catalog.table();
        let listing = match key {
            ListingKey::Id(id) => {
                sqlx::query_as::<_, Listing>(&format!("SELECT * FROM {table} WHERE id = $1"))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            ListingKey::Slug(slug) => {
                sqlx::query_as::<_, Listing>(&format!("SELECT * FROM {table} WHERE slug = $1"))
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(listing)
    }

    async fn by_owner(&self, catalog: Catalog, owner_id: i64) -> Result<Vec<Listing>, AppError> {
        let rows = sqlx::query_as::<_, Listing>(&format!(
            "SELECT * FROM {} WHERE owner_id = $1 ORDER BY created_at DESC",
            catalog.table()
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert(
        &self,
        catalog: Catalog,
        listing: NewListing,
    ) -> Result<Option<Listing>, AppError> {
        let table = catalog.table();
        // The conflict update is owner-guarded: a slug collision with
        // another host's row updates nothing and returns no row.
        let sql = format!(
            "INSERT INTO {table} (slug, title, brand, model, year, body_type, location, description, \
             images, is_for_rent, price_per_day, price_buy, currency, status, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (slug) DO UPDATE SET \
             title = EXCLUDED.title, brand = EXCLUDED.brand, model = EXCLUDED.model, \
             year = EXCLUDED.year, body_type = EXCLUDED.body_type, location = EXCLUDED.location, \
             description = EXCLUDED.description, images = EXCLUDED.images, \
             is_for_rent = EXCLUDED.is_for_rent, price_per_day = EXCLUDED.price_per_day, \
             price_buy = EXCLUDED.price_buy, currency = EXCLUDED.currency, \
             status = EXCLUDED.status, updated_at = NOW() \
             WHERE {table}.owner_id = EXCLUDED.owner_id \
             RETURNING *"
        );

        let stored = sqlx::query_as::<_, Listing>(&sql)
            .bind(&listing.slug)
            .bind(&listing.title)
            .bind(&listing.brand)
            .bind(&listing.model)
            .bind(listing.year)
            .bind(&listing.body_type)
            .bind(&listing.location)
            .bind(&listing.description)
            .bind(sqlx::types::Json(&listing.images))
            .bind(listing.is_for_rent)
            .bind(listing.price_per_day)
            .bind(listing.price_buy)
            .bind(&listing.currency)
            .bind(&listing.status)
            .bind(listing.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn update(
        &self,
        catalog: Catalog,
        id: i64,
        owner_id: i64,
        changes: ListingChanges,
    ) -> Result<Option<Listing>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
        builder.push(catalog.table());
        builder.push(" SET updated_at = NOW()");

        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(status) = &changes.status {
            builder.push(", status = ").push_bind(status.clone());
        }
        if let Some(price_per_day) = changes.price_per_day {
            builder.push(", price_per_day = ").push_bind(price_per_day);
        }
        if let Some(price_buy) = changes.price_buy {
            builder.push(", price_buy = ").push_bind(price_buy);
        }
        if let Some(closed_at) = changes.closed_at {
            builder.push(", closed_at = ").push_bind(closed_at);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner_id = ")
            .push_bind(owner_id)
            .push(" RETURNING *");

        let updated = builder
            .build_query_as::<Listing>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn record_view(&self, catalog: Catalog, id: i64) -> Result<(), AppError> {
        sqlx::query(&format!(
            "UPDATE {} SET views_count = views_count + 1 WHERE id = $1",
            catalog.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_host(&self, email: &str) -> Result<Host, AppError> {
        let host = sqlx::query_as::<_, Host>(
            "INSERT INTO hosts (email) VALUES ($1) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING *",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(host)
    }
}
