#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood price aggregation.
//!
//! [`aggregate`] groups cleaned listings by neighborhood and computes the
//! overall price and price-per-square-foot summaries, per-source price
//! summaries, the bedroom-label distribution, and the most common bedroom
//! and bathroom labels.
//!
//! Aggregation is a pure batch computation: it owns no state between calls,
//! performs no I/O, and its numeric output does not depend on the order of
//! the input. Neighborhoods without any listings never appear in the output.

pub mod summary;

use std::collections::{BTreeMap, BTreeSet};

use nyc_rent_listing_models::{CleanedListing, NeighborhoodId, Source};
use nyc_rent_stats_models::{NeighborhoodStats, SourceStats};

use crate::summary::{mode, summarize};

/// Aggregates cleaned listings into one [`NeighborhoodStats`] per
/// neighborhood, ordered by neighborhood identifier.
#[must_use]
pub fn aggregate(listings: &[CleanedListing]) -> Vec<NeighborhoodStats> {
    let observed_sources: BTreeSet<Source> = listings.iter().map(CleanedListing::source).collect();

    // Listings keep their input order within each group so mode ties
    // resolve to the first-seen label.
    let mut groups: BTreeMap<&NeighborhoodId, Vec<&CleanedListing>> = BTreeMap::new();
    for listing in listings {
        groups.entry(listing.neighborhood()).or_default().push(listing);
    }

    let stats: Vec<NeighborhoodStats> = groups
        .into_iter()
        .map(|(neighborhood, group)| neighborhood_stats(neighborhood, &group, &observed_sources))
        .collect();

    log::info!(
        "Aggregated {} listings into {} neighborhoods across {} sources",
        listings.len(),
        stats.len(),
        observed_sources.len()
    );

    stats
}

fn neighborhood_stats(
    neighborhood: &NeighborhoodId,
    group: &[&CleanedListing],
    observed_sources: &BTreeSet<Source>,
) -> NeighborhoodStats {
    let price = summarize(group.iter().filter_map(|l| l.price_clean));
    let price_per_sqft = summarize(group.iter().filter_map(|l| l.price_per_sqft));

    let by_source = observed_sources
        .iter()
        .map(|&source| {
            let stats = summarize(
                group
                    .iter()
                    .filter(|l| l.source() == source)
                    .filter_map(|l| l.price_clean),
            );
            SourceStats {
                source,
                mean: stats.mean,
                median: stats.median,
                count: stats.count,
            }
        })
        .collect();

    let mut beds_distribution: BTreeMap<String, u64> = BTreeMap::new();
    for label in group.iter().filter_map(|l| l.beds_category.as_deref()) {
        *beds_distribution.entry(label.to_owned()).or_default() += 1;
    }

    let beds_mode = mode(group.iter().filter_map(|l| l.beds_category.as_deref()));
    let baths_mode = mode(group.iter().filter_map(|l| l.baths_category.as_deref()));

    if price.is_empty() {
        log::debug!(
            "[{neighborhood}] {} listings but no parseable prices",
            group.len()
        );
    }

    NeighborhoodStats {
        neighborhood: neighborhood.clone(),
        listing_count: group.len() as u64,
        price,
        price_per_sqft,
        by_source,
        beds_distribution,
        beds_mode,
        baths_mode,
    }
}
