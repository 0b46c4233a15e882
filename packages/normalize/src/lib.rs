#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing field normalization.
//!
//! Turns the free-text fields of a [`RawListing`] into the numeric and
//! categorical columns of a [`CleanedListing`]. Each site formats prices and
//! areas differently (`"$2,500/mo"`, `"From $2,500"`, `"$2,500 - $3,100"`,
//! `"1,200 sqft"`, `"850 ft²"`), so every parser strips the known decorations
//! and then takes the first number left in the text.
//!
//! A field that cannot be parsed becomes `None` for that field only. Parsing
//! never fails a whole record.

use std::sync::LazyLock;

use nyc_rent_listing_models::{CleanedListing, RawListing, is_unavailable};
use regex::Regex;

/// First run of digits, with an optional decimal fraction.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap_or_else(|_| unreachable!()));

/// Decorations removed from price text before the number is extracted.
const PRICE_DECORATIONS: &[&str] = &["$", ",", "/mo", "+", "From"];

/// Unit suffixes removed from square footage text. `ftÂ²` is how `ft²`
/// arrives when a page is decoded as Latin-1.
const SQFT_DECORATIONS: &[&str] = &["sqft", "ftÂ²", "ft²", ","];

/// Extracts the first number from already-stripped text.
fn first_number(text: &str) -> Option<f64> {
    let found = NUMBER_RE.find(text)?;
    found.as_str().parse::<f64>().ok()
}

fn strip_all(text: &str, decorations: &[&str]) -> String {
    decorations
        .iter()
        .fold(text.to_owned(), |acc, pattern| acc.replace(*pattern, ""))
}

/// Parses listing price text into dollars.
///
/// Ranges resolve to their lower bound. Returns `None` for the `"N/A"`
/// sentinel, for text without digits, and for non-positive amounts.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    if is_unavailable(text) {
        return None;
    }

    let stripped = strip_all(text, PRICE_DECORATIONS);
    let value = first_number(stripped.trim()).filter(|v| *v > 0.0);

    if value.is_none() {
        log::trace!("Unparseable price text '{text}'");
    }

    value
}

/// Parses square footage text.
///
/// Returns `None` for the `"N/A"` sentinel, for text without digits, and for
/// non-positive areas.
#[must_use]
pub fn parse_sqft(text: &str) -> Option<f64> {
    if is_unavailable(text) {
        return None;
    }

    let stripped = strip_all(text, SQFT_DECORATIONS);
    let value = first_number(stripped.trim()).filter(|v| *v > 0.0);

    if value.is_none() {
        log::trace!("Unparseable sqft text '{text}'");
    }

    value
}

/// Price per square foot, or `None` unless both inputs are known and the
/// area is positive.
#[must_use]
pub fn compute_price_per_sqft(price: Option<f64>, sqft: Option<f64>) -> Option<f64> {
    let price = price?;
    let sqft = sqft?;
    if sqft > 0.0 { Some(price / sqft) } else { None }
}

/// Returns the trimmed label, or `None` for the sentinel.
fn category(text: &str) -> Option<String> {
    if is_unavailable(text) {
        None
    } else {
        Some(text.trim().to_owned())
    }
}

/// Normalizes a single listing.
#[must_use]
pub fn clean_listing(raw: RawListing) -> CleanedListing {
    let price_clean = parse_price(&raw.price);
    let sqft_clean = parse_sqft(&raw.sqft);
    let price_per_sqft = compute_price_per_sqft(price_clean, sqft_clean);
    let beds_category = category(&raw.beds);
    let baths_category = category(&raw.baths);

    CleanedListing {
        raw,
        price_clean,
        sqft_clean,
        price_per_sqft,
        beds_category,
        baths_category,
    }
}

/// Normalizes every listing, preserving input order.
#[must_use]
pub fn clean_listings(raw: impl IntoIterator<Item = RawListing>) -> Vec<CleanedListing> {
    let cleaned: Vec<CleanedListing> = raw.into_iter().map(clean_listing).collect();

    let priced = cleaned.iter().filter(|l| l.price_clean.is_some()).count();
    log::debug!(
        "Normalized {} listings ({priced} with a parseable price)",
        cleaned.len()
    );

    cleaned
}

#[cfg(test)]
mod tests {
    use nyc_rent_listing_models::{NeighborhoodId, PropertyType, Source, UNAVAILABLE};

    use super::*;

    #[test]
    fn parses_monthly_price() {
        assert_eq!(parse_price("$2,500/mo"), Some(2500.0));
    }

    #[test]
    fn parses_price_with_plus_suffix() {
        assert_eq!(parse_price("$2,500+"), Some(2500.0));
    }

    #[test]
    fn parses_from_prefix() {
        assert_eq!(parse_price("From $2,500"), Some(2500.0));
    }

    #[test]
    fn price_range_takes_lower_bound() {
        assert_eq!(parse_price("$2,500 - $3,100"), Some(2500.0));
    }

    #[test]
    fn parses_price_with_trailing_label() {
        assert_eq!(parse_price("$3,495/mo 1 bd"), Some(3495.0));
    }

    #[test]
    fn keeps_decimal_fraction() {
        assert_eq!(parse_price("$1,999.50"), Some(1999.5));
    }

    #[test]
    fn unparseable_price_is_none() {
        assert_eq!(parse_price(UNAVAILABLE), None);
        assert_eq!(parse_price("Call for Rent"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("$0"), None);
    }

    #[test]
    fn parses_sqft_with_unit_suffix() {
        assert_eq!(parse_sqft("1,200 sqft"), Some(1200.0));
        assert_eq!(parse_sqft("1200ft²"), Some(1200.0));
        assert_eq!(parse_sqft("1,200 ftÂ²"), Some(1200.0));
    }

    #[test]
    fn sqft_range_takes_lower_bound() {
        assert_eq!(parse_sqft("650 - 900 sqft"), Some(650.0));
    }

    #[test]
    fn unparseable_sqft_is_none() {
        assert_eq!(parse_sqft(UNAVAILABLE), None);
        assert_eq!(parse_sqft("-- sqft"), None);
        assert_eq!(parse_sqft("0 sqft"), None);
    }

    #[test]
    fn computes_price_per_sqft() {
        assert_eq!(compute_price_per_sqft(Some(2500.0), Some(1250.0)), Some(2.0));
    }

    #[test]
    fn price_per_sqft_requires_both_inputs() {
        assert_eq!(compute_price_per_sqft(Some(2500.0), None), None);
        assert_eq!(compute_price_per_sqft(None, Some(1250.0)), None);
    }

    #[test]
    fn price_per_sqft_rejects_zero_area() {
        assert_eq!(compute_price_per_sqft(Some(2500.0), Some(0.0)), None);
    }

    fn raw(price: &str, sqft: &str, beds: &str) -> RawListing {
        RawListing {
            source: Source::PrimarySite,
            neighborhood: NeighborhoodId::new("chelsea").unwrap(),
            price: price.to_owned(),
            address: "1 W 20th St".to_owned(),
            beds: beds.to_owned(),
            baths: UNAVAILABLE.to_owned(),
            sqft: sqft.to_owned(),
            property_type: PropertyType::Rent,
        }
    }

    #[test]
    fn cleans_complete_listing() {
        let cleaned = clean_listing(raw("$3,000/mo", "500 sqft", " 1 bed "));
        assert_eq!(cleaned.price_clean, Some(3000.0));
        assert_eq!(cleaned.sqft_clean, Some(500.0));
        assert_eq!(cleaned.price_per_sqft, Some(6.0));
        assert_eq!(cleaned.beds_category.as_deref(), Some("1 bed"));
        assert_eq!(cleaned.baths_category, None);
        assert_eq!(cleaned.raw.price, "$3,000/mo");
    }

    #[test]
    fn malformed_fields_become_none_without_affecting_others() {
        let cleaned = clean_listing(raw("Contact agent", "500 sqft", "Studio"));
        assert_eq!(cleaned.price_clean, None);
        assert_eq!(cleaned.sqft_clean, Some(500.0));
        assert_eq!(cleaned.price_per_sqft, None);
        assert_eq!(cleaned.beds_category.as_deref(), Some("Studio"));
    }

    #[test]
    fn clean_listings_preserves_order() {
        let cleaned = clean_listings(vec![
            raw("$1,000", UNAVAILABLE, UNAVAILABLE),
            raw("$2,000", UNAVAILABLE, UNAVAILABLE),
        ]);
        let prices: Vec<_> = cleaned.iter().map(|l| l.price_clean).collect();
        assert_eq!(prices, vec![Some(1000.0), Some(2000.0)]);
    }
}
