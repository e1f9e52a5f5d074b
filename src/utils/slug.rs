// src/utils/slug.rs

use chrono::{DateTime, Utc};

/// Builds a URL-safe slug from a listing title: lowercased, non-alphanumeric
/// runs collapsed to single hyphens, plus a four-digit time-derived suffix
/// so two ads with the same title get distinct slugs.
pub fn generate_slug(title: &str, now: DateTime<Utc>) -> String {
    let mut base = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c);
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "listing" } else { base };

    let suffix = now.timestamp_millis().unsigned_abs() % 10_000;
    format!("{base}-{suffix:04}")
}
