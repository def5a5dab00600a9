//! Extraction functions run against a rendered document.
//!
//! Every function here is pure: it only reads the content tree it is handed. The tree is
//! reached through [`ContentNode`], so the same logic runs over a `scraper` parse of a
//! page snapshot or over any other queryable node representation.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::models::Candidate;
use crate::price::parse_price;

/// How many ancestor levels to search for a price next to a listing title.
pub const MAX_ANCESTOR_DEPTH: usize = 6;

/// Title cascade used to guess a product name from a product page.
pub const PRODUCT_TITLE_SELECTORS: &[&str] = &[
    r#"h1[data-automation-id="product-title"]"#,
    r#"h1[data-test="product-title"]"#,
    "h1",
    r#"[itemprop="name"]"#,
];

/// A queryable element in a rendered content tree.
pub trait ContentNode: Sized {
    /// First descendant matching `selector`, in document order.
    fn query_selector(&self, selector: &str) -> Option<Self>;
    /// All descendants matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self>;
    fn attribute(&self, name: &str) -> Option<String>;
    /// Concatenated text of the node and its descendants.
    fn text_content(&self) -> String;
    fn parent_element(&self) -> Option<Self>;
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("Skipping invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

impl<'a> ContentNode for ElementRef<'a> {
    fn query_selector(&self, selector: &str) -> Option<Self> {
        let selector = parse_selector(selector)?;
        self.select(&selector).next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        match parse_selector(selector) {
            Some(selector) => self.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().and_then(ElementRef::wrap)
    }
}

/// An extraction function plus its arguments, as handed to a render service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extractor {
    /// Price from the first selector in the cascade that yields usable text.
    FirstPrice { selectors: Vec<String> },
    /// Listing titles with their links and a co-located price when one exists.
    Candidates {
        title_selectors: Vec<String>,
        price_selectors: Vec<String>,
    },
    /// Absolute href of the first element matching any link selector.
    FirstProductLink { link_selectors: Vec<String> },
    /// Best guess at the product name shown on a product page.
    ProductQuery,
    /// Whitespace-stripped price text of a single selector on the current page.
    PagePrice { selector: String },
}

/// Value produced by an [`Extractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Extraction {
    Price(Option<String>),
    Candidates(Vec<Candidate>),
    Link(Option<String>),
    Text(Option<String>),
}

impl Extractor {
    /// Runs the extractor against a document root. `location` resolves relative links.
    pub fn run<N: ContentNode>(&self, document: &N, location: &Url) -> Extraction {
        match self {
            Extractor::FirstPrice { selectors } => {
                Extraction::Price(scrape_first_price(document, selectors))
            }
            Extractor::Candidates {
                title_selectors,
                price_selectors,
            } => Extraction::Candidates(scrape_candidates(
                document,
                title_selectors,
                price_selectors,
                location,
            )),
            Extractor::FirstProductLink { link_selectors } => {
                Extraction::Link(find_first_product_link(document, link_selectors, location))
            }
            Extractor::ProductQuery => Extraction::Text(product_query(document)),
            Extractor::PagePrice { selector } => Extraction::Text(page_price(document, selector)),
        }
    }

    /// Parses an HTML snapshot and runs the extractor against its top-level document.
    pub fn run_on_html(&self, html: &str, location: &Url) -> Extraction {
        let document = Html::parse_document(html);
        self.run(&document.root_element(), location)
    }
}

/// Prefer the `content` attribute (structured-data markup), else the element text.
fn raw_price_text<N: ContentNode>(node: &N) -> String {
    node.attribute("content")
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| node.text_content())
        .trim()
        .to_string()
}

fn price_of<N: ContentNode>(node: &N) -> Option<String> {
    let raw = raw_price_text(node);
    if raw.is_empty() {
        return None;
    }
    parse_price(&raw)
}

fn resolve_href(href: &str, location: &Url) -> String {
    location
        .join(href)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Selectors are tried in order; the first one that yields a usable price wins.
pub fn scrape_first_price<N: ContentNode>(document: &N, selectors: &[String]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|selector| document.query_selector(selector))
        .find_map(|element| price_of(&element))
}

/// Price selector match within `MAX_ANCESTOR_DEPTH` levels above `title`, starting at
/// the title element itself.
fn co_located_price<N: ContentNode>(title: N, price_selectors: &[String]) -> Option<String> {
    let mut node = Some(title);
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let current = node?;
        for selector in price_selectors {
            if let Some(price) = current
                .query_selector(selector)
                .and_then(|element| price_of(&element))
            {
                return Some(price);
            }
        }
        node = current.parent_element();
    }
    None
}

/// Collects `{title, href, price}` candidates for every title selector in order.
pub fn scrape_candidates<N: ContentNode>(
    document: &N,
    title_selectors: &[String],
    price_selectors: &[String],
    location: &Url,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for selector in title_selectors {
        for element in document.query_selector_all(selector) {
            let title = element.text_content().trim().to_string();
            if title.is_empty() {
                continue;
            }
            let href = element
                .attribute("href")
                .filter(|href| !href.is_empty())
                .map(|href| resolve_href(&href, location));
            let price = co_located_price(element, price_selectors);

            candidates.push(Candidate { title, href, price });
        }
    }

    candidates
}

/// Absolute href of the first element matching a link selector that carries one.
pub fn find_first_product_link<N: ContentNode>(
    document: &N,
    link_selectors: &[String],
    location: &Url,
) -> Option<String> {
    link_selectors
        .iter()
        .filter_map(|selector| document.query_selector(selector))
        .filter_map(|element| element.attribute("href"))
        .find(|href| !href.is_empty())
        .map(|href| resolve_href(&href, location))
}

/// Product title guess: first cascade hit longer than three characters, else the
/// document title.
pub fn product_query<N: ContentNode>(document: &N) -> Option<String> {
    PRODUCT_TITLE_SELECTORS
        .iter()
        .filter_map(|selector| document.query_selector(selector))
        .map(|element| element.text_content().trim().to_string())
        .find(|text| text.chars().count() > 3)
        .or_else(|| {
            document
                .query_selector("title")
                .map(|title| title.text_content().trim().to_string())
        })
        .filter(|text| !text.is_empty())
}

/// Raw price text of the page's primary price element with all whitespace removed.
pub fn page_price<N: ContentNode>(document: &N, selector: &str) -> Option<String> {
    let element = document.query_selector(selector)?;
    let raw = raw_price_text(&element);
    if raw.is_empty() {
        return None;
    }
    Some(raw.split_whitespace().collect())
}
