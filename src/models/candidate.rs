use serde::{Deserialize, Serialize};

/// A tentative product listing pulled from a search results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    /// Absolute URL of the listing when it could be resolved.
    pub href: Option<String>,
    /// Canonical `$`-prefixed price found next to the title, if any.
    pub price: Option<String>,
}

impl Candidate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: None,
            price: None,
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }
}
