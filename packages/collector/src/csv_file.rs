//! Raw-listing CSV files.
//!
//! A collection run saves its merged records with [`write_raw_listings`]
//! so aggregation can be re-run later without touching the network.
//! [`CsvCollector`] replays such a file through the [`Collector`] trait.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use nyc_rent_listing_models::{PropertyType, RawListing, ScrapeBatch};

use crate::{CollectError, Collector};

/// Column names of the raw-listing file.
pub const RAW_LISTING_HEADERS: &[&str] = &[
    "source",
    "neighborhood",
    "price",
    "address",
    "beds",
    "baths",
    "sqft",
    "property_type",
];

/// File name of a raw-listing file, e.g. `nyc_rent_raw_listings_20250301.csv`.
#[must_use]
pub fn raw_listings_filename(property_type: PropertyType, date: NaiveDate) -> String {
    format!(
        "nyc_{property_type}_raw_listings_{}.csv",
        date.format("%Y%m%d")
    )
}

/// Reads raw listings from CSV with a header row.
///
/// # Errors
///
/// Returns [`CollectError::Csv`] if a row is malformed, names an unknown
/// source or property type, or has a blank neighborhood.
pub fn read_raw_listings<R: Read>(reader: R) -> Result<Vec<RawListing>, CollectError> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize()
        .map(|row| row.map_err(CollectError::from))
        .collect()
}

/// Writes raw listings as CSV. The header row is always written, even for
/// an empty slice.
///
/// # Errors
///
/// Returns [`CollectError`] if writing fails.
pub fn write_raw_listings<W: Write>(writer: W, listings: &[RawListing]) -> Result<(), CollectError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(RAW_LISTING_HEADERS)?;
    for listing in listings {
        csv.serialize(listing)?;
    }
    csv.flush()?;
    Ok(())
}

/// Collector backed by a raw-listing file loaded into memory.
#[derive(Debug, Clone, Default)]
pub struct CsvCollector {
    listings: Vec<RawListing>,
}

impl CsvCollector {
    /// Loads a raw-listing file.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if the file cannot be opened or parsed.
    pub fn open(path: &Path) -> Result<Self, CollectError> {
        let listings = read_raw_listings(BufReader::new(File::open(path)?))?;
        log::info!("Loaded {} raw listings from {}", listings.len(), path.display());
        Ok(Self { listings })
    }

    /// Wraps already-loaded records.
    #[must_use]
    pub const fn from_listings(listings: Vec<RawListing>) -> Self {
        Self { listings }
    }

    /// Distinct batches present in the file, in first-seen order.
    #[must_use]
    pub fn batches(&self) -> Vec<ScrapeBatch> {
        let mut batches: Vec<ScrapeBatch> = Vec::new();
        for listing in &self.listings {
            let batch = ScrapeBatch::new(
                listing.source,
                listing.neighborhood.clone(),
                listing.property_type,
            );
            if !batches.contains(&batch) {
                batches.push(batch);
            }
        }
        batches
    }

    /// Every record in file order, regardless of batch.
    #[must_use]
    pub fn load_all(self) -> Vec<RawListing> {
        self.listings
    }
}

impl Collector for CsvCollector {
    async fn collect(&self, batch: &ScrapeBatch) -> Result<Vec<RawListing>, CollectError> {
        Ok(self
            .listings
            .iter()
            .filter(|listing| {
                listing.source == batch.source
                    && listing.neighborhood == batch.neighborhood
                    && listing.property_type == batch.property_type
            })
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
