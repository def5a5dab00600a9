use serde::{Deserialize, Serialize};
use std::fmt;

pub mod candidate;
pub mod comparison;
pub mod price_comparison;

// Re-exports for convenience
pub use candidate::*;
pub use comparison::*;
pub use price_comparison::*;

pub const PRICE_NOT_FOUND: &str = "Price not found";
pub const ERROR_DISPLAY: &str = "Error";

/// Result of scraping one target. Exactly one is produced per dispatched target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Price(String),
    NotFound,
    Error,
}

impl ScrapeOutcome {
    /// The string shown to the caller: the price, "Price not found" or "Error".
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScrapeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeOutcome::Price(price) => f.write_str(price),
            ScrapeOutcome::NotFound => f.write_str(PRICE_NOT_FOUND),
            ScrapeOutcome::Error => f.write_str(ERROR_DISPLAY),
        }
    }
}
