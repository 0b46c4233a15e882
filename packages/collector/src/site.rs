//! Config-driven listing site definitions.
//!
//! [`SiteDefinition`] captures everything that differs between listing
//! sites (search URL layout, pagination, card selectors, detail-text
//! patterns) as plain data. One generic collector handles every site.

use nyc_rent_listing_models::{NeighborhoodId, PropertyType, Source};
use serde::Deserialize;

/// A listing site, loaded from TOML at compile time.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteDefinition {
    /// Which source records from this site are tagged with.
    pub source: Source,
    /// Human-readable site name (e.g. `"StreetEasy"`).
    pub name: String,
    /// How neighborhood slugs are spelled in this site's URLs.
    #[serde(default)]
    pub slug_style: SlugStyle,
    /// Search URL templates per property type.
    pub search_urls: SearchUrls,
    /// Template for pages after the first. `{url}` is the first-page URL
    /// and `{page}` the 1-based page number. Absent for single-page sites.
    #[serde(default)]
    pub page_template: Option<String>,
    /// Page title fragments that mean the request was refused.
    #[serde(default)]
    pub blocked_markers: Vec<String>,
    /// CSS selectors for listing cards and their fields.
    pub selectors: Selectors,
    /// Patterns applied to the combined details text of a card.
    #[serde(default)]
    pub details: DetailPatterns,
}

/// Search URL template per property type. `{neighborhood}` is replaced by
/// the site-styled slug. A missing entry means the site does not list that
/// property type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchUrls {
    /// Rental search template.
    #[serde(default)]
    pub rent: Option<String>,
    /// For-sale search template.
    #[serde(default)]
    pub sale: Option<String>,
}

impl SearchUrls {
    /// Template for a property type.
    #[must_use]
    pub fn get(&self, property_type: PropertyType) -> Option<&str> {
        match property_type {
            PropertyType::Rent => self.rent.as_deref(),
            PropertyType::Sale => self.sale.as_deref(),
        }
    }
}

/// Spelling of neighborhood slugs in a site's URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugStyle {
    /// `upper-east-side`
    #[default]
    Hyphen,
    /// `upper_east_side`
    Underscore,
}

impl SlugStyle {
    /// Applies the style to a catalog slug.
    #[must_use]
    pub fn apply(self, slug: &str) -> String {
        let lower = slug.trim().to_lowercase().replace(' ', "-");
        match self {
            Self::Hyphen => lower,
            Self::Underscore => lower.replace('-', "_"),
        }
    }
}

/// One CSS selector per field. Fields without a selector are either read
/// from the details text or left unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct Selectors {
    /// Selects each listing card on a results page.
    pub card: String,
    /// Price element inside a card.
    #[serde(default)]
    pub price: Option<String>,
    /// Address element inside a card.
    #[serde(default)]
    pub address: Option<String>,
    /// Bedroom element inside a card.
    #[serde(default)]
    pub beds: Option<String>,
    /// Bathroom element inside a card.
    #[serde(default)]
    pub baths: Option<String>,
    /// Square footage element inside a card.
    #[serde(default)]
    pub sqft: Option<String>,
    /// Elements whose joined text holds beds/baths/sqft for sites that do
    /// not mark them up separately.
    #[serde(default)]
    pub details: Option<String>,
    /// Present on a results page only when another page follows.
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Regex rules for pulling fields out of free details text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailPatterns {
    /// Matches a studio unit; a match sets beds to `"Studio"`.
    #[serde(default)]
    pub studio: Option<String>,
    /// Bedroom count rule.
    #[serde(default)]
    pub beds: Option<PatternRule>,
    /// Bathroom count rule.
    #[serde(default)]
    pub baths: Option<PatternRule>,
    /// Square footage rule.
    #[serde(default)]
    pub sqft: Option<PatternRule>,
}

/// A regex and the template its captures expand into (`$1 bed`).
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRule {
    /// Regular expression with capture groups.
    pub pattern: String,
    /// Expansion template using `$n` capture references.
    pub template: String,
}

impl SiteDefinition {
    /// Whether this site lists the given property type.
    #[must_use]
    pub fn supports(&self, property_type: PropertyType) -> bool {
        self.search_urls.get(property_type).is_some()
    }

    /// First-page search URL for a neighborhood, or `None` if the site does
    /// not list the property type.
    #[must_use]
    pub fn search_url(
        &self,
        neighborhood: &NeighborhoodId,
        property_type: PropertyType,
    ) -> Option<String> {
        let template = self.search_urls.get(property_type)?;
        Some(template.replace(
            "{neighborhood}",
            &self.slug_style.apply(neighborhood.as_str()),
        ))
    }

    /// URL of a 1-based results page. Page 1 is the search URL itself;
    /// later pages need a page template.
    #[must_use]
    pub fn page_url(&self, search_url: &str, page: u32) -> Option<String> {
        if page <= 1 {
            return Some(search_url.to_owned());
        }
        let template = self.page_template.as_deref()?;
        Some(
            template
                .replace("{url}", search_url)
                .replace("{page}", &page.to_string()),
        )
    }

    /// Returns `true` if a page title shows the request was refused.
    #[must_use]
    pub fn is_blocked(&self, title: &str) -> bool {
        self.blocked_markers
            .iter()
            .any(|marker| title.contains(marker.as_str()))
    }
}

/// Parses a site definition from TOML.
///
/// # Errors
///
/// Returns the TOML error message if the document is invalid.
pub fn parse_site_toml(toml_str: &str) -> Result<SiteDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
