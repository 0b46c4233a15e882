#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output artifacts for an aggregation run.
//!
//! Each run writes two comma-separated files: the cleaned-listing table
//! (raw columns plus the parsed numeric columns) and the wide
//! neighborhood-statistics table built by [`StatsTable`]. File names encode
//! the property type and the run date.

pub mod table;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nyc_rent_listing_models::{CleanedListing, PropertyType};

pub use crate::table::StatsTable;

/// Errors that can occur while writing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column names of the cleaned-listing table.
pub const CLEANED_LISTING_HEADERS: &[&str] = &[
    "source",
    "neighborhood",
    "price",
    "address",
    "beds",
    "baths",
    "sqft",
    "property_type",
    "price_clean",
    "sqft_clean",
    "price_per_sqft",
];

/// File name of the cleaned-listing table, e.g.
/// `nyc_rent_prices_20250301.csv`.
#[must_use]
pub fn cleaned_listings_filename(property_type: PropertyType, date: NaiveDate) -> String {
    format!("nyc_{property_type}_prices_{}.csv", date.format("%Y%m%d"))
}

/// File name of the statistics table, e.g.
/// `nyc_rent_neighborhood_stats_20250301.csv`.
#[must_use]
pub fn stats_filename(property_type: PropertyType, date: NaiveDate) -> String {
    format!(
        "nyc_{property_type}_neighborhood_stats_{}.csv",
        date.format("%Y%m%d")
    )
}

/// Writes the cleaned-listing table.
///
/// # Errors
///
/// Returns [`ReportError`] if writing fails.
pub fn write_cleaned_listings<W: Write>(
    writer: W,
    listings: &[CleanedListing],
) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CLEANED_LISTING_HEADERS)?;

    for listing in listings {
        let raw = &listing.raw;
        let price_clean = table::format_number(listing.price_clean);
        let sqft_clean = table::format_number(listing.sqft_clean);
        let price_per_sqft = table::format_number(listing.price_per_sqft);
        let record: [&str; 11] = [
            raw.source.as_ref(),
            raw.neighborhood.as_str(),
            raw.price.as_str(),
            raw.address.as_str(),
            raw.beds.as_str(),
            raw.baths.as_str(),
            raw.sqft.as_str(),
            raw.property_type.as_ref(),
            &price_clean,
            &sqft_clean,
            &price_per_sqft,
        ];
        csv.write_record(record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes the statistics table.
///
/// # Errors
///
/// Returns [`ReportError`] if writing fails.
pub fn write_stats_table<W: Write>(writer: W, table: &StatsTable) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.headers)?;
    for row in &table.rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Paths of the files written by [`write_run_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutputs {
    /// Cleaned-listing table.
    pub cleaned_listings: PathBuf,
    /// Neighborhood statistics table.
    pub stats: PathBuf,
}

/// Writes both run artifacts into `output_dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`ReportError`] if the directory or either file cannot be
/// written.
pub fn write_run_outputs(
    output_dir: &Path,
    property_type: PropertyType,
    date: NaiveDate,
    listings: &[CleanedListing],
    table: &StatsTable,
) -> Result<RunOutputs, ReportError> {
    std::fs::create_dir_all(output_dir)?;

    let cleaned_path = output_dir.join(cleaned_listings_filename(property_type, date));
    write_cleaned_listings(BufWriter::new(File::create(&cleaned_path)?), listings)?;
    log::info!(
        "Saved {} cleaned listings to {}",
        listings.len(),
        cleaned_path.display()
    );

    let stats_path = output_dir.join(stats_filename(property_type, date));
    write_stats_table(BufWriter::new(File::create(&stats_path)?), table)?;
    log::info!(
        "Saved neighborhood stats ({} rows) to {}",
        table.rows.len(),
        stats_path.display()
    );

    Ok(RunOutputs {
        cleaned_listings: cleaned_path,
        stats: stats_path,
    })
}

#[cfg(test)]
mod tests {
    use nyc_rent_listing_models::{NeighborhoodId, RawListing, Source, UNAVAILABLE};
    use nyc_rent_normalize::clean_listings;
    use nyc_rent_stats::aggregate;

    use super::*;

    fn raw(neighborhood: &str, source: Source, price: &str, address: &str, sqft: &str) -> RawListing {
        RawListing {
            source,
            neighborhood: NeighborhoodId::new(neighborhood).unwrap(),
            price: price.to_owned(),
            address: address.to_owned(),
            beds: "1 bed".to_owned(),
            baths: UNAVAILABLE.to_owned(),
            sqft: sqft.to_owned(),
            property_type: PropertyType::Rent,
        }
    }

    fn sample() -> Vec<CleanedListing> {
        clean_listings(vec![
            raw("soho", Source::PrimarySite, "$3,000/mo", "10 Prince St, New York, NY", "500 sqft"),
            raw("soho", Source::SecondarySite, "$3,500", "22 Spring St", UNAVAILABLE),
            raw("dumbo", Source::AggregatorSite, "$2,800 - $3,900", "55 Water St", "640 sqft"),
        ])
    }

    #[test]
    fn names_files_by_type_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            cleaned_listings_filename(PropertyType::Rent, date),
            "nyc_rent_prices_20250301.csv"
        );
        assert_eq!(
            stats_filename(PropertyType::Sale, date),
            "nyc_sale_neighborhood_stats_20250301.csv"
        );
    }

    #[test]
    fn writes_cleaned_listings_with_quoting() {
        let mut buf = Vec::new();
        write_cleaned_listings(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "source,neighborhood,price,address,beds,baths,sqft,property_type,price_clean,sqft_clean,price_per_sqft"
        );
        assert_eq!(
            lines.next().unwrap(),
            "primary_site,soho,\"$3,000/mo\",\"10 Prince St, New York, NY\",1 bed,N/A,500 sqft,rent,3000,500,6"
        );
        assert_eq!(
            lines.next().unwrap(),
            "secondary_site,soho,\"$3,500\",22 Spring St,1 bed,N/A,N/A,rent,3500,,"
        );
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn stats_output_is_byte_identical_across_runs() {
        let listings = sample();
        let render = || {
            let mut buf = Vec::new();
            write_stats_table(&mut buf, &StatsTable::from_stats(&aggregate(&listings))).unwrap();
            buf
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn stats_output_ignores_input_order() {
        let listings = sample();
        let mut reversed = listings.clone();
        reversed.reverse();

        let render = |listings: &[CleanedListing]| {
            let mut buf = Vec::new();
            write_stats_table(&mut buf, &StatsTable::from_stats(&aggregate(listings))).unwrap();
            String::from_utf8(buf).unwrap()
        };
        assert_eq!(render(&listings), render(&reversed));
    }

    #[test]
    fn stats_rows_start_with_neighborhood() {
        let mut buf = Vec::new();
        write_stats_table(&mut buf, &StatsTable::from_stats(&aggregate(&sample()))).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert!(rows[0].starts_with("neighborhood,overall_price_clean_mean,"));
        assert!(rows[1].starts_with("dumbo,2800,2800,2800,2800,1,"));
        assert!(rows[2].starts_with("soho,3250,3250,3000,3500,2,"));
    }

    #[test]
    fn writes_run_outputs_to_directory() {
        let dir = std::env::temp_dir().join(format!("nyc_rent_report_{}", std::process::id()));
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let listings = sample();
        let table = StatsTable::from_stats(&aggregate(&listings));

        let outputs = write_run_outputs(&dir, PropertyType::Rent, date, &listings, &table).unwrap();

        assert!(outputs.cleaned_listings.ends_with("nyc_rent_prices_20250301.csv"));
        assert!(outputs.stats.ends_with("nyc_rent_neighborhood_stats_20250301.csv"));
        let stats = std::fs::read_to_string(&outputs.stats).unwrap();
        assert_eq!(stats.lines().count(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
