//! Site registry. Loads every listing site definition from embedded TOML.
//!
//! Each `.toml` file in `packages/collector/sites/` is baked into the binary
//! at compile time via [`include_str!`]. Supporting a new site means adding
//! a [`Source`] variant, a TOML file, and an entry below.

use nyc_rent_listing_models::Source;

use crate::site::{SiteDefinition, parse_site_toml};

/// TOML configs embedded at compile time.
const SITE_TOMLS: &[(&str, &str)] = &[
    ("primary_site", include_str!("../sites/primary_site.toml")),
    ("secondary_site", include_str!("../sites/secondary_site.toml")),
    ("aggregator_site", include_str!("../sites/aggregator_site.toml")),
];

/// Total number of configured sites (used in tests).
#[cfg(test)]
const EXPECTED_SITE_COUNT: usize = 3;

/// Returns every configured site definition.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_sites() -> Vec<SiteDefinition> {
    SITE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_site_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the site definition for a source.
#[must_use]
pub fn site_for(source: Source) -> Option<SiteDefinition> {
    all_sites().into_iter().find(|site| site.source == source)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use nyc_rent_listing_models::{NeighborhoodId, PropertyType};

    use super::*;

    #[test]
    fn loads_all_sites() {
        assert_eq!(all_sites().len(), EXPECTED_SITE_COUNT);
    }

    #[test]
    fn one_site_per_source() {
        let sources: BTreeSet<Source> = all_sites().iter().map(|s| s.source).collect();
        assert_eq!(sources.len(), EXPECTED_SITE_COUNT);
        for source in Source::ALL {
            assert!(sources.contains(source), "no site for {source}");
        }
    }

    #[test]
    fn file_names_match_sources() {
        for (name, toml) in SITE_TOMLS {
            let site = parse_site_toml(toml).unwrap();
            assert_eq!(site.source.as_ref(), *name);
        }
    }

    #[test]
    fn aggregator_site_is_rent_only() {
        let site = site_for(Source::AggregatorSite).unwrap();
        assert!(site.supports(PropertyType::Rent));
        assert!(!site.supports(PropertyType::Sale));
    }

    #[test]
    fn builds_site_search_urls() {
        let id = NeighborhoodId::new("park-slope").unwrap();
        assert_eq!(
            site_for(Source::PrimarySite)
                .unwrap()
                .search_url(&id, PropertyType::Rent)
                .unwrap(),
            "https://www.zillow.com/park-slope-new-york-ny/rentals/"
        );
        assert_eq!(
            site_for(Source::SecondarySite)
                .unwrap()
                .search_url(&id, PropertyType::Sale)
                .unwrap(),
            "https://streeteasy.com/for-sale/park_slope"
        );
        assert_eq!(
            site_for(Source::AggregatorSite)
                .unwrap()
                .search_url(&id, PropertyType::Rent)
                .unwrap(),
            "https://www.apartments.com/new-york/park-slope/"
        );
    }

    #[test]
    fn all_patterns_compile() {
        for site in all_sites() {
            let details = &site.details;
            let patterns = details
                .studio
                .iter()
                .chain(details.beds.iter().map(|r| &r.pattern))
                .chain(details.baths.iter().map(|r| &r.pattern))
                .chain(details.sqft.iter().map(|r| &r.pattern));
            for pattern in patterns {
                assert!(
                    regex::Regex::new(pattern).is_ok(),
                    "{}: bad pattern {pattern}",
                    site.name
                );
            }
        }
    }
}
