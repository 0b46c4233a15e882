#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing collection.
//!
//! Provides the [`Collector`] trait and two implementations: the
//! config-driven [`html::HtmlCollector`], which fetches search pages from
//! the listing sites in [`registry`], and [`csv_file::CsvCollector`], which
//! replays a previously written raw-listing file.
//!
//! Every collection call is scoped to one [`ScrapeBatch`]. [`collect_all`]
//! runs many batches with bounded concurrency and merges their records in
//! batch order, so downstream aggregation sees the same sequence on every
//! run regardless of which request finished first.

pub mod csv_file;
pub mod html;
pub mod progress;
pub mod registry;
pub mod site;

use std::sync::Arc;

use nyc_rent_listing_models::{NeighborhoodId, PropertyType, RawListing, ScrapeBatch, Source};

use crate::progress::ProgressCallback;

/// Desktop browser user agent sent with every search request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Errors that can occur while collecting listings.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A site's CSS selector is invalid.
    #[error("Invalid selector {0}")]
    Selector(String),

    /// A site's details pattern is invalid.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The site refused the request (bot wall, captcha page).
    #[error("Request blocked by {site}")]
    Blocked {
        /// Name of the refusing site.
        site: String,
    },

    /// No site definition exists for the source.
    #[error("No site configured for source {0}")]
    UnknownSite(Source),

    /// The site does not list the requested property type.
    #[error("{site} does not list {property_type} properties")]
    Unsupported {
        /// Source of the batch.
        site: Source,
        /// Requested property type.
        property_type: PropertyType,
    },
}

/// Tuning knobs for collection runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    /// Maximum number of search result pages fetched per batch.
    pub max_pages: u32,
    /// Pause between consecutive page requests of one batch.
    pub delay_ms: u64,
    /// Maximum number of batches in flight at once.
    pub concurrency: usize,
    /// User agent header sent with every request.
    pub user_agent: String,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_pages: 3,
            delay_ms: 0,
            concurrency: 4,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Produces the raw listings of one batch.
pub trait Collector: Send + Sync {
    /// Collects every listing of `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if the batch cannot be collected.
    fn collect(
        &self,
        batch: &ScrapeBatch,
    ) -> impl std::future::Future<Output = Result<Vec<RawListing>, CollectError>> + Send;

    /// Short name of the collection strategy (e.g. `"html"`).
    fn name(&self) -> &str;
}

/// Drops cards that carry neither a price nor an address.
#[must_use]
pub fn retain_minimal(listings: Vec<RawListing>) -> Vec<RawListing> {
    let before = listings.len();
    let kept: Vec<RawListing> = listings
        .into_iter()
        .filter(|listing| !listing.is_empty_card())
        .collect();
    if kept.len() < before {
        log::debug!("Dropped {} empty listing cards", before - kept.len());
    }
    kept
}

/// Builds one batch per `(neighborhood, source)` pair, skipping sources
/// whose site does not list `property_type`.
#[must_use]
pub fn plan_batches(
    sources: &[Source],
    neighborhoods: &[NeighborhoodId],
    property_type: PropertyType,
) -> Vec<ScrapeBatch> {
    let supported: Vec<Source> = sources
        .iter()
        .copied()
        .filter(|&source| {
            let ok = registry::site_for(source).is_some_and(|site| site.supports(property_type));
            if !ok {
                log::info!("Skipping {source}: no {property_type} search on this site");
            }
            ok
        })
        .collect();

    neighborhoods
        .iter()
        .flat_map(|neighborhood| {
            supported
                .iter()
                .map(move |&source| ScrapeBatch::new(source, neighborhood.clone(), property_type))
        })
        .collect()
}

/// Result of [`collect_all`].
#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// Records of every successful batch, in batch order.
    pub listings: Vec<RawListing>,
    /// Batches that failed, with the error message.
    pub failed: Vec<(ScrapeBatch, String)>,
}

/// Runs every batch through `collector`, at most `concurrency` at a time.
///
/// Failed batches are logged and reported in [`CollectOutcome::failed`]
/// without aborting the run. Records are merged in the order of `batches`,
/// not completion order.
pub async fn collect_all(
    collector: &impl Collector,
    batches: &[ScrapeBatch],
    concurrency: usize,
    progress: &Arc<dyn ProgressCallback>,
) -> CollectOutcome {
    use futures::stream::{self, StreamExt as _};

    log::info!(
        "Collecting {} batches with {} (concurrency={concurrency})",
        batches.len(),
        collector.name()
    );
    progress.set_total(batches.len() as u64);

    let mut results: Vec<(usize, Result<Vec<RawListing>, CollectError>)> =
        stream::iter(batches.iter().enumerate().map(|(idx, batch)| async move {
            let result = collector.collect(batch).await;
            progress.set_message(batch.to_string());
            progress.inc(1);
            (idx, result)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut outcome = CollectOutcome::default();
    for (idx, result) in results {
        let batch = &batches[idx];
        match result {
            Ok(listings) => {
                let listings = retain_minimal(listings);
                log::info!("[{batch}] {} listings", listings.len());
                outcome.listings.extend(listings);
            }
            Err(e) => {
                log::warn!("[{batch}] collection failed: {e}");
                outcome.failed.push((batch.clone(), e.to_string()));
            }
        }
    }

    progress.finish(format!(
        "{} listings from {} batches ({} failed)",
        outcome.listings.len(),
        batches.len(),
        outcome.failed.len()
    ));

    outcome
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nyc_rent_listing_models::{ListingText, UNAVAILABLE};

    use super::*;
    use crate::progress::null_progress;

    /// Answers each batch after a delay that shrinks with the neighborhood
    /// position, so later batches finish first.
    struct FakeCollector;

    impl Collector for FakeCollector {
        async fn collect(&self, batch: &ScrapeBatch) -> Result<Vec<RawListing>, CollectError> {
            let delay = match batch.neighborhood.as_str() {
                "soho" => 30,
                "dumbo" => 15,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if batch.neighborhood.as_str() == "harlem" {
                return Err(CollectError::Blocked {
                    site: "Example".to_owned(),
                });
            }

            Ok(vec![
                batch.listing(ListingText {
                    price: format!("$1,000 {}", batch.neighborhood),
                    address: "1 Main St".to_owned(),
                    ..ListingText::default()
                }),
                batch.listing(ListingText::default()),
            ])
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn ids(slugs: &[&str]) -> Vec<NeighborhoodId> {
        slugs.iter().map(|s| NeighborhoodId::new(*s).unwrap()).collect()
    }

    #[test]
    fn default_options() {
        let options = CollectOptions::default();
        assert_eq!(options.max_pages, 3);
        assert_eq!(options.delay_ms, 0);
        assert_eq!(options.concurrency, 4);
        assert!(options.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn retains_cards_with_price_or_address() {
        let batch = ScrapeBatch::new(
            Source::PrimarySite,
            NeighborhoodId::new("soho").unwrap(),
            PropertyType::Rent,
        );
        let listings = vec![
            batch.listing(ListingText::default()),
            batch.listing(ListingText {
                price: "$3,000".to_owned(),
                ..ListingText::default()
            }),
            batch.listing(ListingText {
                address: "10 Prince St".to_owned(),
                ..ListingText::default()
            }),
            batch.listing(ListingText {
                price: "  ".to_owned(),
                address: "n/a".to_owned(),
                ..ListingText::default()
            }),
        ];
        let kept = retain_minimal(listings);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].price, "$3,000");
        assert_eq!(kept[1].price, UNAVAILABLE);
    }

    #[test]
    fn plans_batches_per_neighborhood_and_supported_source() {
        let neighborhoods = ids(&["soho", "dumbo"]);

        let rent = plan_batches(Source::ALL, &neighborhoods, PropertyType::Rent);
        assert_eq!(rent.len(), 6);
        assert_eq!(rent[0].neighborhood.as_str(), "soho");
        assert_eq!(rent[0].source, Source::PrimarySite);
        assert_eq!(rent[2].source, Source::AggregatorSite);
        assert_eq!(rent[3].neighborhood.as_str(), "dumbo");

        let sale = plan_batches(Source::ALL, &neighborhoods, PropertyType::Sale);
        assert_eq!(sale.len(), 4);
        assert!(sale.iter().all(|b| b.source != Source::AggregatorSite));
        assert!(sale.iter().all(|b| b.property_type == PropertyType::Sale));
    }

    #[tokio::test]
    async fn merges_in_batch_order_and_skips_failures() {
        let batches = plan_batches(
            &[Source::PrimarySite],
            &ids(&["soho", "harlem", "dumbo", "chelsea"]),
            PropertyType::Rent,
        );

        let outcome = collect_all(&FakeCollector, &batches, 4, &null_progress()).await;

        let prices: Vec<&str> = outcome.listings.iter().map(|l| l.price.as_str()).collect();
        assert_eq!(
            prices,
            vec!["$1,000 soho", "$1,000 dumbo", "$1,000 chelsea"]
        );
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0.neighborhood.as_str(), "harlem");
        assert!(outcome.failed[0].1.contains("blocked"));
    }

    #[tokio::test]
    async fn zero_concurrency_still_runs() {
        let batches = plan_batches(&[Source::SecondarySite], &ids(&["chelsea"]), PropertyType::Sale);
        let outcome = collect_all(&FakeCollector, &batches, 0, &null_progress()).await;
        assert_eq!(outcome.listings.len(), 1);
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn unsupported_error_names_site_and_type() {
        let err = CollectError::Unsupported {
            site: Source::AggregatorSite,
            property_type: PropertyType::Sale,
        };
        assert_eq!(err.to_string(), "aggregator_site does not list sale properties");
        assert!(std::error::Error::source(&err).is_none());
    }
}
