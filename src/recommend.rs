// src/recommend.rs
//
// Listing recommendation engine. Candidate pools come from the store in
// small recency-ordered tiers; ranking itself is pure, synchronous sorting
// over the fetched rows. A failed tier fetch degrades to an empty tier, so
// "no recommendations" is always a valid outcome, never an error.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::listing::{Listing, ListingIdentity};
use crate::store::{Catalog, ListingQuery, ListingStore};
use crate::utils::body_type::detect_body_type;
use crate::utils::location::parse_location;

/// Recommendation blocks never exceed this many entries.
pub const MAX_RECOMMENDATIONS: usize = 6;

/// First rental tier searches ±20% around the focal price.
const NARROW_SPREAD: f64 = 0.2;
/// Fallback rental tier widens to ±40%.
const WIDE_SPREAD: f64 = 0.4;
/// Candidates fetched per rental tier.
const RENTAL_TIER_FETCH: i64 = 12;
/// Widen the band when the deduped narrow tier has fewer than this.
const WIDEN_BELOW: usize = 4;
/// Candidates fetched for the sale case.
const SALE_TIER_FETCH: i64 = 24;

/// Symmetric percentage band around a reference price.
pub fn price_band(price: f64, spread: f64) -> (f64, f64) {
    (price * (1.0 - spread), price * (1.0 + spread))
}

/// Up to six rentals priced near the focal rental, ranked for relevance.
///
/// Fetches a ±20% tier first and widens to ±40% when that leaves fewer
/// than four distinct candidates.
pub async fn similar_rentals(
    store: &dyn ListingStore,
    catalog: Catalog,
    focal: &Listing,
) -> Vec<Listing> {
    let Some(price) = focal.price_per_day else {
        // No reference price, no band to search.
        return Vec::new();
    };

    let (lo, hi) = price_band(price, NARROW_SPREAD);
    let narrow = fetch_tier(store, catalog, focal, lo, hi).await;

    let mut pool = dedup_and_exclude(focal, narrow);
    if pool.len() < WIDEN_BELOW {
        let (lo, hi) = price_band(price, WIDE_SPREAD);
        pool.extend(fetch_tier(store, catalog, focal, lo, hi).await);
    }

    rank_similar_rentals(focal, pool)
}

/// Up to six sale listings for the focal sale listing, same body type
/// first, then nearest sale price.
pub async fn recommended_sales(
    store: &dyn ListingStore,
    catalog: Catalog,
    focal: &Listing,
) -> Vec<Listing> {
    let query = ListingQuery::sales()
        .excluding(focal)
        .limit(SALE_TIER_FETCH);
    let pool = match store.search(catalog, &query).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!("recommended-sales fetch failed: {err}");
            Vec::new()
        }
    };

    rank_recommended_sales(focal, pool)
}

async fn fetch_tier(
    store: &dyn ListingStore,
    catalog: Catalog,
    focal: &Listing,
    lo: f64,
    hi: f64,
) -> Vec<Listing> {
    let query = ListingQuery::rentals()
        .price_between(lo, hi)
        .excluding(focal)
        .limit(RENTAL_TIER_FETCH);
    match store.search(catalog, &query).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!("similar-rentals tier fetch failed: {err}");
            Vec::new()
        }
    }
}

/// Ranks a rental candidate pool against the focal rental. Pure.
///
/// Priority order: different vendor first, then same city, then same
/// region, then smallest rental price difference. Ties keep the pool's
/// recency order.
pub fn rank_similar_rentals(focal: &Listing, pool: Vec<Listing>) -> Vec<Listing> {
    let mut candidates = dedup_and_exclude(focal, pool);

    let focal_seller = focal.seller_key();
    let focal_place = parse_location(focal.location.as_deref().unwrap_or_default());
    let focal_price = focal.price_per_day;

    candidates.sort_by(|a, b| {
        let ka = rental_sort_key(a, focal_seller.as_deref(), &focal_place, focal_price);
        let kb = rental_sort_key(b, focal_seller.as_deref(), &focal_place, focal_price);
        ka.0.cmp(&kb.0)
            .then(ka.1.cmp(&kb.1))
            .then(ka.2.cmp(&kb.2))
            .then(ka.3.partial_cmp(&kb.3).unwrap_or(Ordering::Equal))
    });

    candidates.truncate(MAX_RECOMMENDATIONS);
    candidates
}

/// Ranks a sale candidate pool: drops non-positive sale prices, then sorts
/// by same-body-type first and ascending sale price difference. Pure.
pub fn rank_recommended_sales(focal: &Listing, pool: Vec<Listing>) -> Vec<Listing> {
    let mut candidates: Vec<Listing> = dedup_and_exclude(focal, pool)
        .into_iter()
        .filter(|candidate| candidate.price_buy.is_some_and(|price| price > 0.0))
        .collect();

    let focal_body = detect_body_type(focal);
    let focal_price = focal.price_buy;

    candidates.sort_by(|a, b| {
        let body_a = u8::from(detect_body_type(a) != focal_body);
        let body_b = u8::from(detect_body_type(b) != focal_body);
        let diff_a = price_difference(a.price_buy, focal_price);
        let diff_b = price_difference(b.price_buy, focal_price);
        body_a
            .cmp(&body_b)
            .then(diff_a.partial_cmp(&diff_b).unwrap_or(Ordering::Equal))
    });

    candidates.truncate(MAX_RECOMMENDATIONS);
    candidates
}

/// (vendor rank, city rank, region rank, price difference); lower sorts
/// first on every component.
fn rental_sort_key(
    candidate: &Listing,
    focal_seller: Option<&str>,
    focal_place: &crate::utils::location::ParsedLocation,
    focal_price: Option<f64>,
) -> (u8, u8, u8, f64) {
    let different_vendor = match (focal_seller, candidate.seller_key()) {
        (Some(focal), Some(candidate)) => focal != candidate,
        // An empty seller name never counts as a different vendor.
        _ => false,
    };

    let place = parse_location(candidate.location.as_deref().unwrap_or_default());
    let same_city = !focal_place.city.is_empty()
        && focal_place.city.eq_ignore_ascii_case(&place.city);
    let same_region = !focal_place.region.is_empty()
        && focal_place.region.eq_ignore_ascii_case(&place.region);

    (
        u8::from(!different_vendor),
        u8::from(!same_city),
        u8::from(!same_region),
        price_difference(candidate.price_per_day, focal_price),
    )
}

/// Absolute price difference; a missing price on either side counts as
/// zero difference rather than failing.
fn price_difference(candidate: Option<f64>, focal: Option<f64>) -> f64 {
    match (candidate, focal) {
        (Some(candidate), Some(focal)) => (candidate - focal).abs(),
        _ => 0.0,
    }
}

/// Removes the focal listing (by id and by slug) and collapses duplicate
/// identities, keeping first occurrence. Applied at every merge step, not
/// just once: a stale tier fetch racing a fresh one must never let the
/// focal listing back into its own recommendations.
fn dedup_and_exclude(focal: &Listing, pool: impl IntoIterator<Item = Listing>) -> Vec<Listing> {
    let mut seen: HashSet<ListingIdentity> = HashSet::new();
    let mut out = Vec::new();

    for candidate in pool {
        if is_focal(focal, &candidate) {
            continue;
        }
        if let Some(identity) = candidate.identity() {
            if !seen.insert(identity) {
                continue;
            }
        }
        out.push(candidate);
    }

    out
}

fn is_focal(focal: &Listing, candidate: &Listing) -> bool {
    if let (Some(focal_id), Some(candidate_id)) = (focal.id, candidate.id) {
        if focal_id == candidate_id {
            return true;
        }
    }
    matches!(
        (focal.slug.as_deref(), candidate.slug.as_deref()),
        (Some(focal_slug), Some(candidate_slug)) if focal_slug == candidate_slug
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::host::Host;
    use crate::models::listing::{ListingChanges, ListingKey, NewListing};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn rental(id: i64, price: f64, seller: &str, location: &str) -> Listing {
        Listing {
            id: Some(id),
            slug: Some(format!("rental-{id}")),
            title: format!("Rental {id}"),
            is_for_rent: true,
            price_per_day: Some(price),
            seller: Some(seller.to_string()),
            location: Some(location.to_string()),
            ..Listing::default()
        }
    }

    fn sale(id: i64, price: f64, body_type: &str) -> Listing {
        Listing {
            id: Some(id),
            slug: Some(format!("sale-{id}")),
            title: format!("Sale {id}"),
            is_for_rent: false,
            price_buy: Some(price),
            body_type: Some(body_type.to_string()),
            ..Listing::default()
        }
    }

    #[test]
    fn different_vendor_outranks_better_price_and_location() {
        let focal = rental(1, 100.0, "Acme", "Kampala, Central");
        let same_vendor = rental(2, 95.0, "Acme", "Kampala, Central");
        let other_vendor = rental(3, 98.0, "Beta", "Jinja, Eastern");

        let ranked = rank_similar_rentals(&focal, vec![same_vendor, other_vendor]);

        assert_eq!(ranked[0].id, Some(3));
        assert_eq!(ranked[1].id, Some(2));
    }

    #[test]
    fn vendor_comparison_ignores_case_and_blank_sellers() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let shouting = rental(2, 90.0, "ACME", "Kampala");
        let anonymous = Listing {
            seller: Some("   ".to_string()),
            ..rental(3, 90.0, "", "Kampala")
        };
        let rival = rental(4, 90.0, "Beta", "Kampala");

        let ranked = rank_similar_rentals(&focal, vec![shouting, anonymous, rival]);

        // Only the rival counts as a different vendor.
        assert_eq!(ranked[0].id, Some(4));
    }

    #[test]
    fn city_then_region_break_ties_within_a_vendor_group() {
        let focal = rental(1, 100.0, "Acme", "Kampala, Central, Uganda");
        let same_city = rental(2, 110.0, "Beta", "Kampala, Western");
        let same_region = rental(3, 101.0, "Beta", "Entebbe, Central");
        let elsewhere = rental(4, 100.0, "Beta", "Gulu, Northern");

        let ranked = rank_similar_rentals(&focal, vec![elsewhere, same_region, same_city]);

        assert_eq!(ranked[0].id, Some(2));
        assert_eq!(ranked[1].id, Some(3));
        assert_eq!(ranked[2].id, Some(4));
    }

    #[test]
    fn price_difference_orders_the_final_tier() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let near = rental(2, 102.0, "Beta", "Jinja");
        let far = rental(3, 118.0, "Beta", "Jinja");
        let nearest = rental(4, 99.0, "Beta", "Jinja");

        let ranked = rank_similar_rentals(&focal, vec![near, far, nearest]);

        assert_eq!(ranked[0].id, Some(4));
        assert_eq!(ranked[1].id, Some(2));
        assert_eq!(ranked[2].id, Some(3));
    }

    #[test]
    fn focal_listing_never_appears_in_output() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let by_id = Listing {
            slug: Some("other-slug".to_string()),
            ..rental(1, 100.0, "Beta", "Jinja")
        };
        let by_slug = Listing {
            id: None,
            slug: Some("rental-1".to_string()),
            ..rental(9, 100.0, "Beta", "Jinja")
        };
        let keeper = rental(5, 100.0, "Beta", "Jinja");

        let ranked = rank_similar_rentals(&focal, vec![by_id, by_slug, keeper]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, Some(5));
    }

    #[test]
    fn merged_pools_dedup_by_id_then_slug() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let first = rental(2, 95.0, "Beta", "Jinja");
        let duplicate_id = rental(2, 95.0, "Beta", "Jinja");
        let slug_only = Listing {
            id: None,
            ..rental(3, 96.0, "Beta", "Jinja")
        };
        let duplicate_slug = Listing {
            id: None,
            ..rental(3, 96.0, "Beta", "Jinja")
        };

        let ranked = rank_similar_rentals(
            &focal,
            vec![first, duplicate_id, slug_only, duplicate_slug],
        );

        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn empty_pool_is_a_valid_empty_state() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        assert!(rank_similar_rentals(&focal, Vec::new()).is_empty());
        assert!(rank_recommended_sales(&focal, Vec::new()).is_empty());
    }

    #[test]
    fn results_truncate_to_six() {
        let focal = rental(0, 100.0, "Acme", "Kampala");
        let pool: Vec<Listing> = (1..=10)
            .map(|i| rental(i, 100.0 + i as f64, "Beta", "Jinja"))
            .collect();

        assert_eq!(rank_similar_rentals(&focal, pool).len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn wide_band_contains_the_narrow_band() {
        let (narrow_lo, narrow_hi) = price_band(100.0, 0.2);
        let (wide_lo, wide_hi) = price_band(100.0, 0.4);

        assert!(wide_lo <= narrow_lo);
        assert!(wide_hi >= narrow_hi);

        // Every price the narrow band admits, the wide band admits too.
        for price in [80.0, 90.0, 100.0, 110.0, 120.0] {
            assert!(price >= narrow_lo && price <= narrow_hi);
            assert!(price >= wide_lo && price <= wide_hi);
        }
    }

    #[test]
    fn missing_prices_count_as_zero_difference() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let unpriced = Listing {
            price_per_day: None,
            ..rental(2, 0.0, "Beta", "Jinja")
        };
        let priced = rental(3, 101.0, "Beta", "Jinja");

        let ranked = rank_similar_rentals(&focal, vec![priced, unpriced]);

        // Zero difference sorts ahead of a real 1.0 difference.
        assert_eq!(ranked[0].id, Some(2));
    }

    #[test]
    fn sales_rank_same_body_type_before_price() {
        let focal = sale(1, 50_000_000.0, "SUV");
        let cheap_sedan = sale(2, 50_500_000.0, "sedan");
        let pricier_suv = sale(3, 58_000_000.0, "SUV");
        let nearest_suv = sale(4, 51_000_000.0, "4x4");

        let ranked =
            rank_recommended_sales(&focal, vec![cheap_sedan, pricier_suv, nearest_suv]);

        assert_eq!(ranked[0].id, Some(4));
        assert_eq!(ranked[1].id, Some(3));
        assert_eq!(ranked[2].id, Some(2));
    }

    #[tokio::test]
    async fn sparse_narrow_band_widens_to_the_fallback_tier() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let narrow = rental(2, 110.0, "Beta", "Jinja");
        // Outside ±20% of 100 but inside ±40%.
        let wide_only = rental(3, 135.0, "Beta", "Jinja");

        let store = MemoryStore::new();
        store.seed(
            Catalog::Cars,
            vec![focal.clone(), narrow, wide_only],
        );

        let similar = similar_rentals(&store, Catalog::Cars, &focal).await;

        let ids: Vec<Option<i64>> = similar.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn well_stocked_narrow_band_skips_the_fallback_tier() {
        let focal = rental(1, 100.0, "Acme", "Kampala");
        let mut pool: Vec<Listing> = (2..=6)
            .map(|i| rental(i, 100.0 + i as f64, "Beta", "Jinja"))
            .collect();
        pool.push(rental(9, 135.0, "Beta", "Jinja"));

        let store = MemoryStore::new();
        store.seed(Catalog::Cars, pool);

        let similar = similar_rentals(&store, Catalog::Cars, &focal).await;

        // Five distinct narrow-band candidates, so the wide tier is never
        // fetched and the 135 listing stays out.
        assert_eq!(similar.len(), 5);
        assert!(similar.iter().all(|l| l.id != Some(9)));
    }

    struct FailingStore;

    #[async_trait]
    impl ListingStore for FailingStore {
        async fn search(
            &self,
            _catalog: Catalog,
            _query: &ListingQuery,
        ) -> Result<Vec<Listing>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn find_by_key(
            &self,
            _catalog: Catalog,
            _key: &ListingKey,
        ) -> Result<Option<Listing>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn by_owner(
            &self,
            _catalog: Catalog,
            _owner_id: i64,
        ) -> Result<Vec<Listing>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn upsert(
            &self,
            _catalog: Catalog,
            _listing: NewListing,
        ) -> Result<Option<Listing>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn update(
            &self,
            _catalog: Catalog,
            _id: i64,
            _owner_id: i64,
            _changes: ListingChanges,
        ) -> Result<Option<Listing>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn record_view(&self, _catalog: Catalog, _id: i64) -> Result<(), AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn upsert_host(&self, _email: &str) -> Result<Host, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn fetch_failures_degrade_to_empty_blocks() {
        let focal_rental = rental(1, 100.0, "Acme", "Kampala");
        let focal_sale = sale(1, 40_000_000.0, "sedan");

        let similar = similar_rentals(&FailingStore, Catalog::Cars, &focal_rental).await;
        assert!(similar.is_empty());

        let recommended = recommended_sales(&FailingStore, Catalog::Cars, &focal_sale).await;
        assert!(recommended.is_empty());
    }

    #[test]
    fn sales_drop_candidates_without_a_positive_price() {
        let focal = sale(1, 40_000_000.0, "sedan");
        let free = sale(2, 0.0, "sedan");
        let negative = sale(3, -5.0, "sedan");
        let unpriced = Listing {
            price_buy: None,
            ..sale(4, 0.0, "sedan")
        };
        let keeper = sale(5, 41_000_000.0, "sedan");

        let ranked = rank_recommended_sales(&focal, vec![free, negative, unpriced, keeper]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, Some(5));
    }
}
