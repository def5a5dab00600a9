use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::price::price_amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePrice {
    pub site: String,
    pub price: String,
    pub amount: Decimal,
}

/// Cheapest/most expensive summary over the sites that returned a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub best: SitePrice,
    pub worst: Option<SitePrice>,
    pub savings: Option<Decimal>,
    pub savings_percentage: Option<f64>,
    pub priced_sites: usize,
    pub generated_at: DateTime<Utc>,
}

impl PriceComparison {
    /// Builds a summary from a result mapping. Entries that are not prices
    /// ("Price not found", "Error", unparseable text) are skipped. Returns `None`
    /// when no site has a price.
    pub fn from_results(results: &HashMap<String, String>) -> Option<Self> {
        let mut priced: Vec<SitePrice> = results
            .iter()
            .filter_map(|(site, price)| {
                Some(SitePrice {
                    site: site.clone(),
                    price: price.clone(),
                    amount: price_amount(price)?,
                })
            })
            .collect();

        if priced.is_empty() {
            return None;
        }

        // Stable tie-breaking regardless of map iteration order
        priced.sort_by(|a, b| a.amount.cmp(&b.amount).then_with(|| a.site.cmp(&b.site)));

        let priced_sites = priced.len();
        let best = priced.first()?.clone();
        let worst = if priced_sites > 1 { priced.last().cloned() } else { None };

        let savings = worst.as_ref().map(|w| w.amount - best.amount);
        let savings_percentage = match (&worst, savings) {
            (Some(w), Some(s)) if !w.amount.is_zero() => {
                (s / w.amount * Decimal::from(100)).round_dp(2).to_f64()
            }
            _ => None,
        };

        Some(Self {
            best,
            worst,
            savings,
            savings_percentage,
            priced_sites,
            generated_at: Utc::now(),
        })
    }
}
