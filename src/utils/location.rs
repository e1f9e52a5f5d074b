// src/utils/location.rs

use serde::Serialize;

/// Components of a comma-delimited "city, region, country" string.
/// Absent positions are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedLocation {
    pub city: String,
    pub region: String,
    pub country: String,
}

/// Splits a free-text location on commas: position 0 is the city, 1 the
/// region, 2 the country. A missing country falls back to the region, then
/// the city, matching how short locations like "Kampala, Uganda" are
/// written in practice.
pub fn parse_location(raw: &str) -> ParsedLocation {
    let parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let city = parts.first().copied().unwrap_or_default();
    let region = parts.get(1).copied().unwrap_or_default();
    let country = parts
        .get(2)
        .or_else(|| parts.get(1))
        .or_else(|| parts.first())
        .copied()
        .unwrap_or_default();

    ParsedLocation {
        city: city.to_string(),
        region: region.to_string(),
        country: country.to_string(),
    }
}
