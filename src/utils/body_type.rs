// src/utils/body_type.rs

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::listing::Listing;

/// Coarse body-style buckets used for "recommended sales" ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Suv,
    Pickup,
    Sedan,
    Other,
}

/// Ordered table of regex hints mapping free text to a body-type bucket.
/// The first matching rule wins; no match means `Other`.
///
/// The hint list is heuristic by nature (a "luxury saloon" is a sedan, a
/// "Hilux" is a pickup even when the body_type column is blank), so it is
/// kept as replaceable data rather than baked into the ranking code.
pub struct BodyTypeHints {
    rules: Vec<(Regex, BodyType)>,
}

const DEFAULT_HINTS: &[(&str, BodyType)] = &[
    (
        r"(?i)\b(pick\s?-?up|hilux|ranger|d-?max|navara|tundra|truck)\b",
        BodyType::Pickup,
    ),
    (
        r"(?i)\b(suv|4x4|land\s?cruiser|prado|rav\s?4|x-?trail|cr-?v|harrier|fortuner|pajero|tucson|jeep)\b",
        BodyType::Suv,
    ),
    (
        r"(?i)\b(sedan|saloon|corolla|camry|accord|civic|axio|premio|altezza|mark\s?x)\b",
        BodyType::Sedan,
    ),
];

impl BodyTypeHints {
    pub fn new(rules: Vec<(Regex, BodyType)>) -> Self {
        BodyTypeHints { rules }
    }

    /// The built-in hint table, compiled once.
    pub fn builtin() -> &'static BodyTypeHints {
        static BUILTIN: OnceLock<BodyTypeHints> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let rules = DEFAULT_HINTS
                .iter()
                .map(|(pattern, body_type)| {
                    let regex =
                        Regex::new(pattern).expect("built-in body-type hint must compile");
                    (regex, *body_type)
                })
                .collect();
            BodyTypeHints::new(rules)
        })
    }

    pub fn detect(&self, text: &str) -> BodyType {
        for (regex, body_type) in &self.rules {
            if regex.is_match(text) {
                return *body_type;
            }
        }
        BodyType::Other
    }

    /// Classifies a listing from its first non-empty descriptive field:
    /// `body_type`, else `model`, else `title`.
    pub fn classify(&self, listing: &Listing) -> BodyType {
        let text = [
            listing.body_type.as_deref(),
            listing.model.as_deref(),
            Some(listing.title.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_default();

        self.detect(text)
    }
}

/// Classification through the built-in hint table.
pub fn detect_body_type(listing: &Listing) -> BodyType {
    BodyTypeHints::builtin().classify(listing)
}
