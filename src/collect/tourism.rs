//! Tourism website source
//!
//! Each island has a beach listing page linking to one page per site. Site
//! pages carry the name, a description, and tabbed facility and activity
//! lists; the tab contents are present in the served HTML.

use crate::collect::fetcher::fetch_page;
use crate::collect::source::{ItemFetcher, WorkItem, WorkSource};
use crate::collect::FetchError;
use crate::config::{TourismConfig, TourismIsland};
use crate::storage::Record;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Column holding the site page URL
pub const SITE_LINK_FIELD: &str = "site_link";

const SITE_LINK_SELECTOR: &str = "span[itemprop='name'] a[href]";
const NAME_SELECTOR: &str = "h1.title span[itemprop='name']";
const DESCRIPTION_SELECTOR: &str = "div.midpanel_row p";
const FACILITIES_SELECTOR: &str = "[id='contenttab0.5'] ul";
const ACTIVITIES_SELECTOR: &str = "[id='contenttab4'] ul";

/// Enumerates the site pages listed for each island
pub struct TourismSource {
    client: Client,
    base_url: String,
    islands: Vec<TourismIsland>,
}

impl TourismSource {
    pub fn new(client: Client, config: &TourismConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            islands: config.islands.clone(),
        }
    }

    /// URL of the beach listing of an island
    pub fn listing_url(&self, island: &TourismIsland) -> Result<Url, FetchError> {
        let raw = format!("{}/{}/beaches/", self.base_url, island.slug);
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

#[async_trait]
impl WorkSource for TourismSource {
    fn groups(&self) -> Vec<String> {
        self.islands.iter().map(TourismIsland::display_name).collect()
    }

    async fn enumerate(&self, group: &str) -> Result<Vec<WorkItem>, FetchError> {
        let island = self
            .islands
            .iter()
            .find(|island| island.display_name() == group)
            .ok_or_else(|| FetchError::UnknownGroup(group.to_string()))?;

        let listing_url = self.listing_url(island)?;
        let html = fetch_page(&self.client, listing_url.as_str()).await?;
        let links = extract_site_links(&html, &listing_url);

        tracing::info!("Found {} site links for {}", links.len(), group);

        Ok(links
            .into_iter()
            .map(|link| WorkItem::new(link, group))
            .collect())
    }
}

/// Fetches and extracts one site page
pub struct TourismFetcher {
    client: Client,
}

impl TourismFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ItemFetcher for TourismFetcher {
    async fn fetch(&self, item: &WorkItem) -> Result<Record, FetchError> {
        let html = fetch_page(&self.client, &item.identifier).await?;
        extract_site(&html, &item.identifier)
    }
}

/// Extracts the absolute site links of a listing page
///
/// Links keep page order; repeats are dropped.
pub fn extract_site_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse(SITE_LINK_SELECTOR) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if seen.insert(absolute_url.clone()) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    Some(url.to_string())
}

/// Extracts the record of a site page
///
/// # Fields
///
/// | Column | Source | Required |
/// |--------|--------|----------|
/// | name | `h1.title span[itemprop=name]` | yes |
/// | description | `div.midpanel_row p`, skipping price lines (`$...`) | at least one paragraph |
/// | facilities | facilities tab list, lower-cased, `", "`-joined | no |
/// | activities | activities tab list, lower-cased, `", "`-joined | no |
pub fn extract_site(html: &str, url: &str) -> Result<Record, FetchError> {
    let document = Html::parse_document(html);

    let missing = |selector: &str| FetchError::MissingElement {
        url: url.to_string(),
        selector: selector.to_string(),
    };

    let name = select_all(&document, NAME_SELECTOR)
        .into_iter()
        .next()
        .map(element_text)
        .ok_or_else(|| missing(NAME_SELECTOR))?;

    let paragraphs = select_all(&document, DESCRIPTION_SELECTOR);
    if paragraphs.is_empty() {
        return Err(missing(DESCRIPTION_SELECTOR));
    }
    let description = paragraphs
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty() && !text.starts_with('$'))
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Record::new()
        .with("name", name)
        .with("description", description)
        .with("facilities", list_text(&document, FACILITIES_SELECTOR))
        .with("activities", list_text(&document, ACTIVITIES_SELECTOR)))
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Element text with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cased entries of the first list matching `css`, `", "`-joined
fn list_text(document: &Html, css: &str) -> Option<String> {
    let list = select_all(document, css).into_iter().next()?;

    let entries: Vec<String> = match Selector::parse("li") {
        Ok(li) => list
            .select(&li)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .map(|text| text.to_lowercase())
            .collect(),
        Err(_) => Vec::new(),
    };

    Some(entries.join(", "))
}
