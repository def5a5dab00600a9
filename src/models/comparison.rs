use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ScrapeOutcome;

/// Invocation boundary: what to look for and which site the user is already on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub query: String,
    #[serde(default)]
    pub current_host: String,
}

impl CompareRequest {
    pub fn new(query: impl Into<String>, current_host: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            current_host: current_host.into(),
        }
    }
}

/// Site identifier -> display string ("$x.yy", "Price not found" or "Error").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareResponse {
    pub results: HashMap<String, String>,
}

impl CompareResponse {
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, ScrapeOutcome)>,
    {
        let results = outcomes
            .into_iter()
            .map(|(site, outcome)| (site, outcome.display_string()))
            .collect();
        Self { results }
    }

    pub fn get(&self, site: &str) -> Option<&str> {
        self.results.get(site).map(String::as_str)
    }

    /// Site names in a stable order for display.
    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = self.results.keys().map(String::as_str).collect();
        sites.sort_unstable();
        sites
    }
}
