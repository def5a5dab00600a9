//! Retailer catalog: where to search and which selector cascades to try on each site.
//!
//! Cascades are ordered from most to least specific. They are data, not logic: the
//! extraction chain walks them in order.

use serde::{Deserialize, Serialize};

/// Static description of one retailer.
#[derive(Debug, Clone, Copy)]
pub struct SiteSpec {
    pub site: &'static str,
    /// Host fragment used to recognise the user's current site.
    pub domain: &'static str,
    /// Search URL with a `{query}` placeholder.
    pub search_url: &'static str,
    /// Price element on the retailer's own product page.
    pub primary_price_selector: &'static str,
    pub price_selectors: &'static [&'static str],
    pub link_selectors: &'static [&'static str],
    pub title_selectors: &'static [&'static str],
}

pub const SITE_CATALOG: &[SiteSpec] = &[
    SiteSpec {
        site: "kroger",
        domain: "kroger.com",
        search_url: "https://www.kroger.com/search?query={query}",
        primary_price_selector: ".kds-Price-promotional",
        price_selectors: &[
            ".kds-Price-promotional",
            ".kds-Price",
            r#"[data-qa="ProductPrices"] .kds-Price"#,
            r#"[data-qa="search-results"] .kds-Price"#,
        ],
        link_selectors: &[
            r#"a[data-qa="product-name"]"#,
            r#"[data-qa="product-card"] a"#,
            "a.kds-Link",
        ],
        title_selectors: &[
            r#"a[data-qa="product-name"]"#,
            r#"[data-qa="product-card"] a"#,
            ".kds-Text--l a",
        ],
    },
    SiteSpec {
        site: "walmart",
        domain: "walmart.com",
        search_url: "https://www.walmart.com/search?q={query}",
        primary_price_selector: r#"span[itemprop="price"]"#,
        price_selectors: &[
            r#"span[itemprop="price"]"#,
            ".price-characteristic",
            ".price-group",
            r#"[data-automation-id="product-price"] span"#,
            r#"[data-automation-id="price"]"#,
            ".mr1.mr2-xl.lh-copy",
        ],
        link_selectors: &[
            r#"a[data-automation-id="product-title"]"#,
            r#"a[href*="/ip/"]"#,
            r#"a[href*="/ip"]"#,
        ],
        title_selectors: &[
            r#"a[data-automation-id="product-title"]"#,
            r#"a[href*="/ip/"]"#,
            r#"a[href*="/ip"]"#,
        ],
    },
    SiteSpec {
        site: "target",
        domain: "target.com",
        search_url: "https://www.target.com/s?searchTerm={query}",
        primary_price_selector: r#"[data-test="product-price"]"#,
        price_selectors: &[
            r#"[data-test="product-price"]"#,
            r#"[data-test="current-price"]"#,
            ".h-display-xs",
            r#"[data-test="listing-price"]"#,
        ],
        link_selectors: &[r#"a[data-test="product-title"]"#, r#"a[href*="/p/"]"#],
        title_selectors: &[r#"a[data-test="product-title"]"#, r#"a[href*="/p/"]"#],
    },
];

/// One competitor to search during a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub site: String,
    pub search_url: String,
    pub price_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
    pub title_selectors: Vec<String>,
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl SiteSpec {
    /// True when `host` belongs to this retailer.
    pub fn matches_host(&self, host: &str) -> bool {
        host.to_lowercase().contains(self.domain)
    }

    pub fn search_url_for(&self, query: &str) -> String {
        self.search_url
            .replace("{query}", &urlencoding::encode(query))
    }

    pub fn target_for(&self, query: &str) -> Target {
        Target {
            site: self.site.to_string(),
            search_url: self.search_url_for(query),
            price_selectors: owned(self.price_selectors),
            link_selectors: owned(self.link_selectors),
            title_selectors: owned(self.title_selectors),
        }
    }
}

/// Targets for every catalog site except the one the user is currently on.
pub fn build_targets(query: &str, current_host: &str) -> Vec<Target> {
    SITE_CATALOG
        .iter()
        .filter(|spec| !spec.matches_host(current_host))
        .map(|spec| spec.target_for(query))
        .collect()
}

/// Catalog entry for the site serving `host`, if it is one we know.
pub fn site_for_host(host: &str) -> Option<&'static SiteSpec> {
    SITE_CATALOG.iter().find(|spec| spec.matches_host(host))
}

/// The retailer's own product-page price selector for `host`.
pub fn primary_selector(host: &str) -> Option<&'static str> {
    site_for_host(host).map(|spec| spec.primary_price_selector)
}
