// src/visibility.rs

use chrono::{DateTime, Duration, Utc};

use crate::models::listing::Listing;

/// How long a closed listing keeps appearing in public feeds.
pub const GRACE_WINDOW_HOURS: i64 = 24;

fn grace_window() -> Duration {
    Duration::hours(GRACE_WINDOW_HOURS)
}

/// Whether a closed listing is still inside its grace window at `now`.
///
/// The window is measured from `closed_at`, falling back to `updated_at`;
/// a listing with neither fails closed. The boundary is inclusive: exactly
/// `GRACE_WINDOW_HOURS` old is still visible, a moment older is not.
pub fn is_closed_listing_visible(listing: &Listing, now: DateTime<Utc>) -> bool {
    if listing.status_or_default() != "closed" {
        return false;
    }
    let Some(closed_at) = listing.closed_reference() else {
        return false;
    };
    now.signed_duration_since(closed_at) <= grace_window()
}

/// Whether a listing belongs in a public-facing feed at `now`.
///
/// Drafts are never shown, closed listings only inside the grace window,
/// everything else (including unknown statuses) is shown.
pub fn is_publicly_visible(listing: &Listing, now: DateTime<Utc>) -> bool {
    match listing.status_or_default().as_str() {
        "draft" => false,
        "closed" => is_closed_listing_visible(listing, now),
        _ => true,
    }
}

/// True exactly when a listing is closed and still visible, so pages can
/// render a distinct "sold, recently closed" state.
pub fn is_closed_for_display(listing: &Listing, now: DateTime<Utc>) -> bool {
    listing.status_or_default() == "closed" && is_closed_listing_visible(listing, now)
}
