#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood statistic types.
//!
//! Produced once per aggregation run from the full set of cleaned listings
//! and consumed by the report writer. Every statistic over an empty set is
//! `None` with a count of zero.

use std::collections::BTreeMap;

use nyc_rent_listing_models::{NeighborhoodId, Source};
use serde::{Deserialize, Serialize};

/// Mean, median, min, max, and count over the non-null values of one
/// metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Arithmetic mean.
    pub mean: Option<f64>,
    /// Median; the average of the two middle values for even counts.
    pub median: Option<f64>,
    /// Smallest value.
    pub min: Option<f64>,
    /// Largest value.
    pub max: Option<f64>,
    /// Number of non-null values.
    pub count: u64,
}

impl SummaryStats {
    /// Returns `true` if no values contributed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Price statistics for one source within a neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    /// The listing site.
    pub source: Source,
    /// Mean price.
    pub mean: Option<f64>,
    /// Median price.
    pub median: Option<f64>,
    /// Number of listings from this source with a parseable price.
    pub count: u64,
}

/// Aggregated statistics for one neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodStats {
    /// The neighborhood.
    pub neighborhood: NeighborhoodId,
    /// Every listing collected for the neighborhood, parseable or not.
    pub listing_count: u64,
    /// Statistics over `price_clean`.
    pub price: SummaryStats,
    /// Statistics over `price_per_sqft`.
    pub price_per_sqft: SummaryStats,
    /// Per-source price statistics, one entry per source observed anywhere
    /// in the run, in [`Source::ALL`] order.
    pub by_source: Vec<SourceStats>,
    /// Listings per distinct bedroom label.
    pub beds_distribution: BTreeMap<String, u64>,
    /// Most frequent bedroom label.
    pub beds_mode: Option<String>,
    /// Most frequent bathroom label.
    pub baths_mode: Option<String>,
}

impl NeighborhoodStats {
    /// Looks up the statistics for a source.
    #[must_use]
    pub fn source(&self, source: Source) -> Option<&SourceStats> {
        self.by_source.iter().find(|s| s.source == source)
    }
}
