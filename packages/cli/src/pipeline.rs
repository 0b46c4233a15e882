//! Collect -> normalize -> aggregate -> report.
//!
//! Each stage is a plain function so the subcommands in `main.rs` can run
//! them alone (`collect`, `aggregate`) or chained (`run`).

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nyc_rent_cli_utils::{IndicatifProgress, MultiProgress};
use nyc_rent_collector::csv_file::write_raw_listings;
use nyc_rent_collector::html::HtmlCollector;
use nyc_rent_collector::{CollectError, CollectOptions, collect_all, plan_batches, retain_minimal};
use nyc_rent_listing_models::neighborhoods::{all_neighborhoods, borough_of};
use nyc_rent_listing_models::{ListingError, NeighborhoodId, PropertyType, RawListing, Source};
use nyc_rent_normalize::clean_listings;
use nyc_rent_report::{ReportError, RunOutputs, StatsTable, write_run_outputs};
use nyc_rent_stats::aggregate;

/// Environment variable consulted when `--output-dir` is not given.
pub const OUTPUT_DIR_ENV: &str = "NYC_RENT_OUTPUT_DIR";

/// Output directory used when neither the flag nor the env var is set.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Picks the output directory: flag, then env var, then the default.
#[must_use]
pub fn resolve_output_dir(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Requested sources, or every source when none were named. Duplicates are
/// dropped.
#[must_use]
pub fn resolve_sources(requested: &[Source]) -> Vec<Source> {
    if requested.is_empty() {
        return Source::ALL.to_vec();
    }
    let mut sources = Vec::new();
    for &source in requested {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Requested neighborhoods, or the whole catalog when none were named.
///
/// # Errors
///
/// Returns [`ListingError`] if a requested slug is blank.
pub fn resolve_neighborhoods(requested: &[String]) -> Result<Vec<NeighborhoodId>, ListingError> {
    if requested.is_empty() {
        return Ok(all_neighborhoods());
    }
    requested
        .iter()
        .map(|slug| -> Result<NeighborhoodId, ListingError> {
            let id = NeighborhoodId::new(slug.as_str())?;
            if borough_of(id.as_str()).is_none() {
                log::warn!("{id} is not in the neighborhood catalog; collecting anyway");
            }
            Ok(id)
        })
        .collect()
}

/// Collects every `(neighborhood, source)` batch from the live sites.
///
/// Batches that fail are logged and skipped.
///
/// # Errors
///
/// Returns [`CollectError`] if the HTTP client cannot be built.
pub async fn collect_listings(
    multi: &MultiProgress,
    options: CollectOptions,
    sources: &[Source],
    neighborhoods: &[NeighborhoodId],
    property_type: PropertyType,
) -> Result<Vec<RawListing>, CollectError> {
    let batches = plan_batches(sources, neighborhoods, property_type);
    let concurrency = options.concurrency;
    let collector = HtmlCollector::new(options)?;

    let progress = IndicatifProgress::steps_bar(multi, "Collecting");
    let outcome = collect_all(&collector, &batches, concurrency, &progress).await;

    if !outcome.failed.is_empty() {
        log::warn!(
            "{} of {} batches failed: {}",
            outcome.failed.len(),
            batches.len(),
            outcome
                .failed
                .iter()
                .map(|(batch, _)| batch.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(outcome.listings)
}

/// Writes raw listings to `path`, creating its parent directory.
///
/// # Errors
///
/// Returns [`CollectError`] if the file cannot be written.
pub fn save_raw_listings(path: &Path, listings: &[RawListing]) -> Result<(), CollectError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    write_raw_listings(BufWriter::new(File::create(path)?), listings)?;
    log::info!("Saved {} raw listings to {}", listings.len(), path.display());
    Ok(())
}

/// Property type to aggregate: the requested one, else that of the first
/// record, else rentals.
#[must_use]
pub fn select_property_type(listings: &[RawListing], requested: Option<PropertyType>) -> PropertyType {
    requested
        .or_else(|| listings.first().map(|l| l.property_type))
        .unwrap_or(PropertyType::Rent)
}

/// Normalizes and aggregates the records of one property type and writes
/// both output tables.
///
/// Records of other property types are skipped.
///
/// # Errors
///
/// Returns [`ReportError`] if the outputs cannot be written.
pub fn aggregate_listings(
    listings: Vec<RawListing>,
    property_type: PropertyType,
    output_dir: &Path,
    date: NaiveDate,
) -> Result<RunOutputs, ReportError> {
    let total = listings.len();
    let (selected, skipped): (Vec<RawListing>, Vec<RawListing>) = listings
        .into_iter()
        .partition(|l| l.property_type == property_type);
    if !skipped.is_empty() {
        log::warn!(
            "Skipping {} of {total} records that are not {property_type} listings",
            skipped.len()
        );
    }

    let cleaned = clean_listings(retain_minimal(selected));
    let stats = aggregate(&cleaned);
    let table = StatsTable::from_stats(&stats);

    write_run_outputs(output_dir, property_type, date, &cleaned, &table)
}
