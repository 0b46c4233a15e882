//! Wide statistics table shaping.
//!
//! Flattens [`NeighborhoodStats`] into one row per neighborhood with a fixed
//! column layout:
//!
//! * `neighborhood`
//! * `overall_price_clean_{mean,median,min,max,count}`
//! * `overall_price_per_sqft_{mean,median,min,max,count}`
//! * `overall_beds_mode`, `overall_baths_mode`
//! * `<source>_price_clean_{mean,median,count}` for each observed source
//! * `count_<beds>_bed` for each bedroom label observed anywhere

use std::collections::{BTreeMap, BTreeSet};

use nyc_rent_listing_models::Source;
use nyc_rent_stats_models::{NeighborhoodStats, SummaryStats};

/// Trailing words dropped from a bedroom label when naming its column.
const BED_WORDS: &[&str] = &["bed", "beds", "bd", "bds", "bedroom", "bedrooms"];

/// A rendered statistics table: header plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsTable {
    /// Column names.
    pub headers: Vec<String>,
    /// One row per neighborhood, in the order of the input stats.
    pub rows: Vec<Vec<String>>,
}

impl StatsTable {
    /// Builds the wide table for a set of neighborhood statistics.
    #[must_use]
    pub fn from_stats(stats: &[NeighborhoodStats]) -> Self {
        let sources: BTreeSet<Source> = stats
            .iter()
            .flat_map(|s| s.by_source.iter().map(|b| b.source))
            .collect();

        let bed_columns = bed_columns(stats);

        let mut headers = vec!["neighborhood".to_owned()];
        push_summary_headers(&mut headers, "overall_price_clean");
        push_summary_headers(&mut headers, "overall_price_per_sqft");
        headers.push("overall_beds_mode".to_owned());
        headers.push("overall_baths_mode".to_owned());
        for source in &sources {
            for stat in ["mean", "median", "count"] {
                headers.push(format!("{source}_price_clean_{stat}"));
            }
        }
        for slug in &bed_columns {
            headers.push(format!("count_{slug}_bed"));
        }

        let rows = stats
            .iter()
            .map(|neighborhood| {
                let mut row = vec![neighborhood.neighborhood.to_string()];
                push_summary_cells(&mut row, &neighborhood.price);
                push_summary_cells(&mut row, &neighborhood.price_per_sqft);
                row.push(neighborhood.beds_mode.clone().unwrap_or_default());
                row.push(neighborhood.baths_mode.clone().unwrap_or_default());

                for &source in &sources {
                    match neighborhood.source(source) {
                        Some(by_source) => {
                            row.push(format_number(by_source.mean));
                            row.push(format_number(by_source.median));
                            row.push(by_source.count.to_string());
                        }
                        None => {
                            row.push(String::new());
                            row.push(String::new());
                            row.push("0".to_owned());
                        }
                    }
                }

                let bed_counts = bed_counts_by_slug(neighborhood);
                for slug in &bed_columns {
                    row.push(bed_counts.get(slug).copied().unwrap_or(0).to_string());
                }

                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Returns the index of a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the cell at `(neighborhood, column)`, if both exist.
    #[must_use]
    pub fn cell(&self, neighborhood: &str, column: &str) -> Option<&str> {
        let idx = self.column(column)?;
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|n| n == neighborhood))
            .and_then(|row| row.get(idx))
            .map(String::as_str)
    }
}

fn push_summary_headers(headers: &mut Vec<String>, prefix: &str) {
    for stat in ["mean", "median", "min", "max", "count"] {
        headers.push(format!("{prefix}_{stat}"));
    }
}

fn push_summary_cells(row: &mut Vec<String>, stats: &SummaryStats) {
    row.push(format_number(stats.mean));
    row.push(format_number(stats.median));
    row.push(format_number(stats.min));
    row.push(format_number(stats.max));
    row.push(stats.count.to_string());
}

/// Renders a nullable number: empty for `None`, otherwise the shortest
/// decimal that round-trips.
#[must_use]
pub fn format_number(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Column slug for a bedroom label: `"Studio"` -> `studio`,
/// `"2 Beds"` -> `2`, `"1-2 bd"` -> `1-2`.
#[must_use]
pub fn bed_slug(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    let kept = match words.split_last() {
        Some((last, rest)) if !rest.is_empty() && BED_WORDS.contains(last) => rest,
        _ => &words[..],
    };

    kept.join("_")
}

/// Sort key: studio first, then labels with a leading number in numeric
/// order, then everything else alphabetically.
fn bed_order(slug: &str) -> (u8, u64, String) {
    if slug == "studio" {
        return (0, 0, slug.to_owned());
    }
    let digits: String = slug.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<u64>().map_or_else(
        |_| (2, 0, slug.to_owned()),
        |n| (1, n, slug.to_owned()),
    )
}

fn bed_columns(stats: &[NeighborhoodStats]) -> Vec<String> {
    let slugs: BTreeSet<String> = stats
        .iter()
        .flat_map(|s| s.beds_distribution.keys().map(|label| bed_slug(label)))
        .collect();

    let mut columns: Vec<String> = slugs.into_iter().collect();
    columns.sort_by_key(|slug| bed_order(slug));
    columns
}

/// Labels that share a slug share a column, so their counts are summed.
fn bed_counts_by_slug(stats: &NeighborhoodStats) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for (label, count) in &stats.beds_distribution {
        *counts.entry(bed_slug(label)).or_default() += count;
    }
    counts
}
