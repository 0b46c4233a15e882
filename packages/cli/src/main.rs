#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for NYC listing collection and neighborhood statistics.
//!
//! Uses `indicatif-log-bridge` (via [`nyc_rent_cli_utils::init_logger`])
//! so log lines and the collection progress bar share the terminal.

mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use nyc_rent_collector::CollectOptions;
use nyc_rent_collector::csv_file::{CsvCollector, raw_listings_filename};
use nyc_rent_collector::registry::all_sites;
use nyc_rent_listing_models::neighborhoods::{all_neighborhoods, borough_of};
use nyc_rent_listing_models::{NeighborhoodId, PropertyType, Source};

use crate::pipeline::OUTPUT_DIR_ENV;

#[derive(Parser)]
#[command(
    name = "nyc_rent",
    about = "Collect NYC listing prices and summarize them by neighborhood"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the neighborhood catalog
    Neighborhoods,
    /// List the configured listing sites
    Sites {
        /// Also print each site's search URLs for this neighborhood slug
        #[arg(long)]
        neighborhood: Option<String>,
    },
    /// Collect raw listings from the listing sites into a CSV file
    Collect {
        #[command(flatten)]
        collect: CollectArgs,
        /// Raw listing file to write (defaults to a dated file in the
        /// output directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output directory (overrides `NYC_RENT_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Normalize a raw listing file and write neighborhood statistics
    Aggregate {
        /// Raw listing CSV to read
        #[arg(long)]
        input: PathBuf,
        /// Output directory (overrides `NYC_RENT_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Property type to aggregate (defaults to that of the first record)
        #[arg(long)]
        property_type: Option<PropertyType>,
        /// Run date used in output file names, as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Collect, then aggregate, in one go
    Run {
        #[command(flatten)]
        collect: CollectArgs,
        /// Output directory (overrides `NYC_RENT_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CollectArgs {
    /// Rentals or sales
    #[arg(long, default_value = "rent")]
    property_type: PropertyType,
    /// Comma-separated sources (e.g. "`primary_site,streeteasy`"). All if omitted.
    #[arg(long, value_delimiter = ',')]
    sources: Vec<Source>,
    /// Comma-separated neighborhood slugs. The whole catalog if omitted.
    #[arg(long, value_delimiter = ',')]
    neighborhoods: Vec<String>,
    /// Maximum result pages per batch
    #[arg(long)]
    max_pages: Option<u32>,
    /// Maximum batches in flight
    #[arg(long)]
    concurrency: Option<usize>,
    /// Delay between page requests of one batch, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

impl CollectArgs {
    fn options(&self) -> CollectOptions {
        let defaults = CollectOptions::default();
        CollectOptions {
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            delay_ms: self.delay_ms.unwrap_or(defaults.delay_ms),
            ..defaults
        }
    }
}

fn output_dir(flag: Option<PathBuf>) -> PathBuf {
    pipeline::resolve_output_dir(flag, std::env::var(OUTPUT_DIR_ENV).ok())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nyc_rent_cli_utils::init_logger();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Neighborhoods => {
            println!("{:<22} BOROUGH", "SLUG");
            println!("{}", "-".repeat(32));
            for id in all_neighborhoods() {
                let borough = borough_of(id.as_str()).map(|b| b.to_string()).unwrap_or_default();
                println!("{:<22} {borough}", id.as_str());
            }
        }
        Commands::Sites { neighborhood } => {
            let neighborhood = neighborhood.map(NeighborhoodId::new).transpose()?;
            println!("{:<16} {:<16} {:<15} TYPES", "SOURCE", "SITE", "LABEL");
            println!("{}", "-".repeat(60));
            for site in all_sites() {
                let types: Vec<String> = [PropertyType::Rent, PropertyType::Sale]
                    .into_iter()
                    .filter(|&pt| site.supports(pt))
                    .map(|pt| pt.to_string())
                    .collect();
                println!(
                    "{:<16} {:<16} {:<15} {}",
                    site.source.to_string(),
                    site.name,
                    site.source.site_label(),
                    types.join(",")
                );
                if let Some(id) = &neighborhood {
                    for pt in [PropertyType::Rent, PropertyType::Sale] {
                        if let Some(url) = site.search_url(id, pt) {
                            println!("  {:<5} {url}", pt.to_string());
                        }
                    }
                }
            }
        }
        Commands::Collect {
            collect,
            out,
            output_dir: dir,
        } => {
            let out = out.unwrap_or_else(|| {
                output_dir(dir).join(raw_listings_filename(collect.property_type, today()))
            });
            let sources = pipeline::resolve_sources(&collect.sources);
            let neighborhoods = pipeline::resolve_neighborhoods(&collect.neighborhoods)?;

            let listings = pipeline::collect_listings(
                &multi,
                collect.options(),
                &sources,
                &neighborhoods,
                collect.property_type,
            )
            .await?;
            pipeline::save_raw_listings(&out, &listings)?;
        }
        Commands::Aggregate {
            input,
            output_dir: dir,
            property_type,
            date,
        } => {
            let listings = CsvCollector::open(&input)?.load_all();
            let property_type = pipeline::select_property_type(&listings, property_type);
            let outputs = pipeline::aggregate_listings(
                listings,
                property_type,
                &output_dir(dir),
                date.unwrap_or_else(today),
            )?;
            println!("{}", outputs.cleaned_listings.display());
            println!("{}", outputs.stats.display());
        }
        Commands::Run {
            collect,
            output_dir: dir,
        } => {
            let dir = output_dir(dir);
            let date = today();
            let sources = pipeline::resolve_sources(&collect.sources);
            let neighborhoods = pipeline::resolve_neighborhoods(&collect.neighborhoods)?;

            let listings = pipeline::collect_listings(
                &multi,
                collect.options(),
                &sources,
                &neighborhoods,
                collect.property_type,
            )
            .await?;
            pipeline::save_raw_listings(
                &dir.join(raw_listings_filename(collect.property_type, date)),
                &listings,
            )?;

            let outputs =
                pipeline::aggregate_listings(listings, collect.property_type, &dir, date)?;
            println!("{}", outputs.cleaned_listings.display());
            println!("{}", outputs.stats.display());
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_collect_flags() {
        let cli = Cli::try_parse_from([
            "nyc_rent",
            "collect",
            "--property-type",
            "sale",
            "--sources",
            "zillow,secondary_site",
            "--neighborhoods",
            "soho,dumbo",
            "--max-pages",
            "1",
        ])
        .unwrap();

        let Commands::Collect { collect, out, .. } = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(collect.property_type, PropertyType::Sale);
        assert_eq!(collect.sources, vec![Source::PrimarySite, Source::SecondarySite]);
        assert_eq!(collect.neighborhoods, vec!["soho", "dumbo"]);
        assert!(out.is_none());

        let options = collect.options();
        assert_eq!(options.max_pages, 1);
        assert_eq!(options.concurrency, CollectOptions::default().concurrency);
    }

    #[test]
    fn parses_aggregate_date() {
        let cli = Cli::try_parse_from([
            "nyc_rent",
            "aggregate",
            "--input",
            "raw.csv",
            "--date",
            "2025-03-01",
        ])
        .unwrap();

        let Commands::Aggregate {
            input,
            date,
            property_type,
            ..
        } = cli.command
        else {
            panic!("expected aggregate");
        };
        assert_eq!(input, PathBuf::from("raw.csv"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(property_type, None);
    }

    #[test]
    fn rejects_unknown_source() {
        assert!(Cli::try_parse_from(["nyc_rent", "collect", "--sources", "craigslist"]).is_err());
    }
}
