//! Fuzzy ranking of search-result listings against the search query.

use tracing::debug;

use crate::models::Candidate;
use crate::text::{extract_numeric_tokens, guess_brand_token, jaccard, tokenize};

/// Minimum score a listing needs to be accepted.
pub const MIN_MATCH_SCORE: f64 = 0.22;
/// Boost per shared size/count token.
pub const NUMERIC_MATCH_BOOST: f64 = 0.12;
/// Cap on the total size/count boost.
pub const NUMERIC_BOOST_CAP: f64 = 0.4;
/// Boost when the query's brand token appears in the listing title.
pub const BRAND_BOOST: f64 = 0.15;

/// Query features computed once and reused for every candidate.
#[derive(Debug, Clone)]
pub struct QueryProfile {
    tokens: Vec<String>,
    numeric: Vec<String>,
    brand: Option<String>,
}

impl QueryProfile {
    pub fn new(query: &str) -> Self {
        let tokens = tokenize(query);
        let numeric = extract_numeric_tokens(query);
        let brand = guess_brand_token(&tokens);
        Self {
            tokens,
            numeric,
            brand,
        }
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    /// Jaccard title similarity plus size/count and brand boosts.
    pub fn score(&self, title: &str) -> f64 {
        let title_tokens = tokenize(title);
        let mut score = jaccard(&self.tokens, &title_tokens);

        let title_numeric = extract_numeric_tokens(title);
        let numeric_matches = self
            .numeric
            .iter()
            .filter(|n| title_numeric.contains(n))
            .count();
        score += (numeric_matches as f64 * NUMERIC_MATCH_BOOST).min(NUMERIC_BOOST_CAP);

        if let Some(brand) = &self.brand {
            if title_tokens.contains(brand) {
                score += BRAND_BOOST;
            }
        }

        score
    }
}

/// Picks the highest scoring candidate. Ties keep the first one seen. The winner is only
/// returned when its score reaches [`MIN_MATCH_SCORE`].
pub fn pick_best_candidate<'a>(candidates: &'a [Candidate], query: &str) -> Option<&'a Candidate> {
    let profile = QueryProfile::new(query);
    let mut best: Option<&Candidate> = None;
    let mut best_score = 0.0;

    for candidate in candidates {
        let score = profile.score(&candidate.title);
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    match best {
        Some(candidate) if best_score >= MIN_MATCH_SCORE => {
            debug!(
                "Best candidate '{}' scored {:.3} for query '{}'",
                candidate.title, best_score, query
            );
            Some(candidate)
        }
        _ => {
            debug!(
                "No candidate reached {:.2} for query '{}' (best {:.3})",
                MIN_MATCH_SCORE, query, best_score
            );
            None
        }
    }
}
