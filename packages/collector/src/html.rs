//! Search-page collector for the configured listing sites.
//!
//! Fetches up to `max_pages` result pages per batch and extracts one
//! [`RawListing`] per listing card using the site's selectors. Parsing is a
//! pure function over the page body ([`extract_listings`]) so it can be
//! tested against saved pages without a network.

use std::time::Duration;

use nyc_rent_listing_models::{ListingText, RawListing, ScrapeBatch, Source, UNAVAILABLE};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::site::{PatternRule, SiteDefinition};
use crate::{CollectError, CollectOptions, Collector, registry};

/// Listings found on one results page.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// One record per listing card, in page order.
    pub listings: Vec<RawListing>,
    /// Whether the page links to a following results page.
    pub has_next: bool,
}

/// Collector that fetches and parses live search pages.
#[derive(Debug, Clone)]
pub struct HtmlCollector {
    client: reqwest::Client,
    sites: Vec<SiteDefinition>,
    options: CollectOptions,
}

impl HtmlCollector {
    /// Creates a collector over every registered site.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn new(options: CollectOptions) -> Result<Self, CollectError> {
        Self::with_sites(options, registry::all_sites())
    }

    /// Creates a collector over the given site definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn with_sites(
        options: CollectOptions,
        sites: Vec<SiteDefinition>,
    ) -> Result<Self, CollectError> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            sites,
            options,
        })
    }

    fn site(&self, source: Source) -> Result<&SiteDefinition, CollectError> {
        self.sites
            .iter()
            .find(|site| site.source == source)
            .ok_or(CollectError::UnknownSite(source))
    }

    async fn fetch(&self, url: &str) -> Result<String, CollectError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Collector for HtmlCollector {
    async fn collect(&self, batch: &ScrapeBatch) -> Result<Vec<RawListing>, CollectError> {
        let site = self.site(batch.source)?;
        let search_url = site
            .search_url(&batch.neighborhood, batch.property_type)
            .ok_or(CollectError::Unsupported {
                site: batch.source,
                property_type: batch.property_type,
            })?;

        let compiled = CompiledSite::compile(site)?;
        let mut listings = Vec::new();

        for page in 1..=self.options.max_pages {
            let Some(url) = site.page_url(&search_url, page) else {
                break;
            };

            if page > 1 && self.options.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.delay_ms)).await;
            }

            log::debug!("[{batch}] Fetching page {page}: {url}");
            let result = self
                .fetch(&url)
                .await
                .and_then(|body| compiled.parse_page(&body, site, batch));

            // Pages already collected survive a failure further down the
            // result list.
            let extracted = match result {
                Ok(extracted) => extracted,
                Err(e) if page == 1 => {
                    if matches!(e, CollectError::Blocked { .. }) {
                        log::warn!("[{batch}] {} refused {url}", site.name);
                    }
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("[{batch}] Stopping at page {page} of {}: {e}", site.name);
                    break;
                }
            };

            let found = extracted.listings.len();
            log::debug!("[{batch}] Page {page}: {found} cards");
            listings.extend(extracted.listings);

            if found == 0 || !extracted.has_next {
                break;
            }
        }

        log::info!(
            "[{batch}] Collected {} listings from {}",
            listings.len(),
            site.name
        );
        Ok(listings)
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

/// A [`SiteDefinition`] with its selectors and patterns compiled.
struct CompiledSite {
    card: Selector,
    title: Selector,
    price: Option<Selector>,
    address: Option<Selector>,
    beds: Option<Selector>,
    baths: Option<Selector>,
    sqft: Option<Selector>,
    details: Option<Selector>,
    next_page: Option<Selector>,
    studio: Option<Regex>,
    beds_rule: Option<(Regex, String)>,
    baths_rule: Option<(Regex, String)>,
    sqft_rule: Option<(Regex, String)>,
}

impl CompiledSite {
    fn compile(site: &SiteDefinition) -> Result<Self, CollectError> {
        let selectors = &site.selectors;
        let details = &site.details;

        Ok(Self {
            card: parse_selector(&selectors.card)?,
            title: parse_selector("title")?,
            price: parse_optional_selector(selectors.price.as_deref())?,
            address: parse_optional_selector(selectors.address.as_deref())?,
            beds: parse_optional_selector(selectors.beds.as_deref())?,
            baths: parse_optional_selector(selectors.baths.as_deref())?,
            sqft: parse_optional_selector(selectors.sqft.as_deref())?,
            details: parse_optional_selector(selectors.details.as_deref())?,
            next_page: parse_optional_selector(selectors.next_page.as_deref())?,
            studio: details.studio.as_deref().map(Regex::new).transpose()?,
            beds_rule: compile_rule(details.beds.as_ref())?,
            baths_rule: compile_rule(details.baths.as_ref())?,
            sqft_rule: compile_rule(details.sqft.as_ref())?,
        })
    }

    fn parse_page(
        &self,
        body: &str,
        site: &SiteDefinition,
        batch: &ScrapeBatch,
    ) -> Result<ExtractedPage, CollectError> {
        let document = Html::parse_document(body);

        let title = document
            .select(&self.title)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if site.is_blocked(&title) {
            return Err(CollectError::Blocked {
                site: site.name.clone(),
            });
        }

        let listings: Vec<RawListing> = document
            .select(&self.card)
            .map(|card| batch.listing(self.card_text(card)))
            .collect();

        let has_next = match &self.next_page {
            Some(sel) => document.select(sel).next().is_some(),
            None => site.page_template.is_some() && !listings.is_empty(),
        };

        Ok(ExtractedPage { listings, has_next })
    }

    fn card_text(&self, card: ElementRef<'_>) -> ListingText {
        let details = self.details.as_ref().map(|sel| {
            card.select(sel)
                .map(element_text)
                .collect::<Vec<_>>()
                .join(" ")
        });
        let details = details.as_deref().unwrap_or_default();

        let beds = match &self.beds {
            Some(sel) => first_text(card, sel),
            None => self
                .studio
                .as_ref()
                .filter(|re| re.is_match(details))
                .map(|_| "Studio".to_owned())
                .or_else(|| apply_rule(self.beds_rule.as_ref(), details)),
        };
        let baths = match &self.baths {
            Some(sel) => first_text(card, sel),
            None => apply_rule(self.baths_rule.as_ref(), details),
        };
        let sqft = match &self.sqft {
            Some(sel) => first_text(card, sel),
            None => apply_rule(self.sqft_rule.as_ref(), details),
        };

        ListingText {
            price: or_unavailable(self.price.as_ref().and_then(|sel| first_text(card, sel))),
            address: or_unavailable(self.address.as_ref().and_then(|sel| first_text(card, sel))),
            beds: or_unavailable(beds),
            baths: or_unavailable(baths),
            sqft: or_unavailable(sqft),
        }
    }
}

/// Extracts every listing card on a results page.
///
/// Fields the card does not carry are set to [`UNAVAILABLE`].
///
/// # Errors
///
/// Returns [`CollectError::Blocked`] if the page title matches one of the
/// site's blocked markers, or a selector/pattern error if the site
/// definition is invalid.
pub fn extract_listings(
    body: &str,
    site: &SiteDefinition,
    batch: &ScrapeBatch,
) -> Result<ExtractedPage, CollectError> {
    CompiledSite::compile(site)?.parse_page(body, site, batch)
}

fn parse_selector(selector: &str) -> Result<Selector, CollectError> {
    Selector::parse(selector).map_err(|e| CollectError::Selector(format!("'{selector}': {e}")))
}

fn parse_optional_selector(selector: Option<&str>) -> Result<Option<Selector>, CollectError> {
    selector.map(parse_selector).transpose()
}

fn compile_rule(rule: Option<&PatternRule>) -> Result<Option<(Regex, String)>, CollectError> {
    rule.map(|rule| Regex::new(&rule.pattern).map(|re| (re, rule.template.clone())))
        .transpose()
        .map_err(CollectError::from)
}

fn apply_rule(rule: Option<&(Regex, String)>, text: &str) -> Option<String> {
    let (re, template) = rule?;
    let captures = re.captures(text)?;
    let mut out = String::new();
    captures.expand(template, &mut out);
    Some(out)
}

/// Whitespace-normalized text of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn or_unavailable(text: Option<String>) -> String {
    text.unwrap_or_else(|| UNAVAILABLE.to_owned())
}
