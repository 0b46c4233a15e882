#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing record types shared across the nyc-rent toolchain.
//!
//! Collectors produce [`RawListing`] records whose fields are free text
//! exactly as they appeared on the listing site. The normalizer turns those
//! into [`CleanedListing`] records with parsed numeric columns, which the
//! statistics crate aggregates per neighborhood.

pub mod neighborhoods;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Marker a collector writes when a field was not found on the card.
pub const UNAVAILABLE: &str = "N/A";

/// Returns `true` if the text is the [`UNAVAILABLE`] sentinel or blank.
#[must_use]
pub fn is_unavailable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNAVAILABLE)
}

/// Errors raised when a record violates the listing contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    /// A neighborhood identifier was empty or whitespace.
    #[error("Neighborhood identifier must not be empty")]
    EmptyNeighborhood,
}

/// The listing website a record was collected from.
///
/// Older raw files name the sites directly (`zillow`, `streeteasy`,
/// `apartments.com`); those spellings are accepted when parsing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Source {
    /// Primary listing site (Zillow).
    #[serde(alias = "zillow")]
    #[strum(to_string = "primary_site", serialize = "zillow")]
    PrimarySite,
    /// Secondary listing site (StreetEasy).
    #[serde(alias = "streeteasy")]
    #[strum(to_string = "secondary_site", serialize = "streeteasy")]
    SecondarySite,
    /// Rental aggregator site (Apartments.com).
    #[serde(alias = "apartments.com")]
    #[strum(to_string = "aggregator_site", serialize = "apartments.com")]
    AggregatorSite,
}

impl Source {
    /// All sources in column order.
    pub const ALL: &[Self] = &[Self::PrimarySite, Self::SecondarySite, Self::AggregatorSite];

    /// Name of the website this source stands for.
    #[must_use]
    pub const fn site_label(self) -> &'static str {
        match self {
            Self::PrimarySite => "zillow",
            Self::SecondarySite => "streeteasy",
            Self::AggregatorSite => "apartments.com",
        }
    }
}

/// Whether a listing is offered for rent or for sale.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyType {
    /// Rental listing.
    Rent,
    /// Listing for sale.
    Sale,
}

/// Identifier of the neighborhood a listing was collected under
/// (e.g. `"park-slope"`).
///
/// Always non-empty. Use [`NeighborhoodId::new`] or deserialize from a
/// string; blank identifiers are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NeighborhoodId(String);

impl NeighborhoodId {
    /// Creates an identifier from the given text, trimming surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::EmptyNeighborhood`] if the text is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ListingError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ListingError::EmptyNeighborhood);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NeighborhoodId {
    type Error = ListingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NeighborhoodId> for String {
    fn from(value: NeighborhoodId) -> Self {
        value.0
    }
}

impl AsRef<str> for NeighborhoodId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NeighborhoodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The context one collection call runs under.
///
/// Every record a collector returns for a batch carries these three values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeBatch {
    /// Site being collected.
    pub source: Source,
    /// Neighborhood being collected.
    pub neighborhood: NeighborhoodId,
    /// Rentals or sales.
    pub property_type: PropertyType,
}

impl ScrapeBatch {
    /// Creates a new batch.
    #[must_use]
    pub const fn new(
        source: Source,
        neighborhood: NeighborhoodId,
        property_type: PropertyType,
    ) -> Self {
        Self {
            source,
            neighborhood,
            property_type,
        }
    }

    /// Builds a [`RawListing`] belonging to this batch.
    #[must_use]
    pub fn listing(&self, fields: ListingText) -> RawListing {
        RawListing {
            source: self.source,
            neighborhood: self.neighborhood.clone(),
            price: fields.price,
            address: fields.address,
            beds: fields.beds,
            baths: fields.baths,
            sqft: fields.sqft,
            property_type: self.property_type,
        }
    }
}

impl std::fmt::Display for ScrapeBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.source, self.neighborhood, self.property_type
        )
    }
}

/// The free-text fields of one listing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingText {
    /// Price text (e.g. `"$3,000/mo"`).
    pub price: String,
    /// Street address text.
    pub address: String,
    /// Bedroom text (e.g. `"Studio"`, `"2 bed"`).
    pub beds: String,
    /// Bathroom text (e.g. `"1 ba"`).
    pub baths: String,
    /// Square footage text (e.g. `"1,200 sqft"`).
    pub sqft: String,
}

impl Default for ListingText {
    fn default() -> Self {
        Self {
            price: UNAVAILABLE.to_owned(),
            address: UNAVAILABLE.to_owned(),
            beds: UNAVAILABLE.to_owned(),
            baths: UNAVAILABLE.to_owned(),
            sqft: UNAVAILABLE.to_owned(),
        }
    }
}

/// One scraped listing with its fields as collected.
///
/// Field order matches the raw CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    /// Site the listing came from.
    pub source: Source,
    /// Neighborhood the listing was collected under.
    pub neighborhood: NeighborhoodId,
    /// Price text, or [`UNAVAILABLE`].
    pub price: String,
    /// Address text, or [`UNAVAILABLE`].
    pub address: String,
    /// Bedroom text, or [`UNAVAILABLE`].
    pub beds: String,
    /// Bathroom text, or [`UNAVAILABLE`].
    pub baths: String,
    /// Square footage text, or [`UNAVAILABLE`].
    pub sqft: String,
    /// Rent or sale.
    pub property_type: PropertyType,
}

impl RawListing {
    /// Returns `true` if neither a price nor an address was found.
    #[must_use]
    pub fn is_empty_card(&self) -> bool {
        is_unavailable(&self.price) && is_unavailable(&self.address)
    }
}

/// A raw listing plus the numeric and categorical columns parsed from it.
///
/// Numeric columns are `None` whenever the text could not be parsed; they
/// are never coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedListing {
    /// The listing as collected.
    pub raw: RawListing,
    /// Parsed price in dollars.
    pub price_clean: Option<f64>,
    /// Parsed square footage.
    pub sqft_clean: Option<f64>,
    /// `price_clean / sqft_clean` when both are known and the area is
    /// positive.
    pub price_per_sqft: Option<f64>,
    /// Bedroom label as extracted (e.g. `"Studio"`, `"1 bed"`).
    pub beds_category: Option<String>,
    /// Bathroom label as extracted.
    pub baths_category: Option<String>,
}

impl CleanedListing {
    /// Neighborhood of the underlying listing.
    #[must_use]
    pub const fn neighborhood(&self) -> &NeighborhoodId {
        &self.raw.neighborhood
    }

    /// Source of the underlying listing.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.raw.source
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn source_round_trips_snake_case() {
        assert_eq!(Source::PrimarySite.to_string(), "primary_site");
        assert_eq!(
            Source::from_str("aggregator_site").unwrap(),
            Source::AggregatorSite
        );
    }

    #[test]
    fn source_accepts_site_names() {
        assert_eq!(Source::from_str("zillow").unwrap(), Source::PrimarySite);
        assert_eq!(
            Source::from_str("streeteasy").unwrap(),
            Source::SecondarySite
        );
        assert_eq!(
            Source::from_str("apartments.com").unwrap(),
            Source::AggregatorSite
        );
    }

    #[test]
    fn rejects_blank_neighborhood() {
        assert_eq!(
            NeighborhoodId::new("   "),
            Err(ListingError::EmptyNeighborhood)
        );
        assert_eq!(NeighborhoodId::new(" soho ").unwrap().as_str(), "soho");
    }

    #[test]
    fn detects_unavailable_text() {
        assert!(is_unavailable("N/A"));
        assert!(is_unavailable(" n/a "));
        assert!(is_unavailable(""));
        assert!(!is_unavailable("$2,500"));
    }

    #[test]
    fn batch_stamps_context_onto_listing() {
        let batch = ScrapeBatch::new(
            Source::SecondarySite,
            NeighborhoodId::new("dumbo").unwrap(),
            PropertyType::Sale,
        );
        let listing = batch.listing(ListingText {
            price: "$1,200,000".to_owned(),
            ..ListingText::default()
        });
        assert_eq!(listing.source, Source::SecondarySite);
        assert_eq!(listing.neighborhood.as_str(), "dumbo");
        assert_eq!(listing.property_type, PropertyType::Sale);
        assert_eq!(listing.sqft, UNAVAILABLE);
        assert!(!listing.is_empty_card());
        assert_eq!(batch.to_string(), "secondary_site/dumbo/sale");
    }

    #[test]
    fn empty_card_has_neither_price_nor_address() {
        let batch = ScrapeBatch::new(
            Source::PrimarySite,
            NeighborhoodId::new("soho").unwrap(),
            PropertyType::Rent,
        );
        assert!(batch.listing(ListingText::default()).is_empty_card());
    }

    #[test]
    fn enum_parse_errors_are_std_errors() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Source::from_str("craigslist").unwrap_err().into();
        assert!(!err.to_string().is_empty());
        let err: Box<dyn std::error::Error + Send + Sync> =
            PropertyType::from_str("lease").unwrap_err().into();
        assert!(!err.to_string().is_empty());
    }
}
