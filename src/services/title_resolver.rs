//! Fuzzy resolution of free-text queries to catalog titles.
//!
//! Scores are on a 0-100 scale. A query scores against a title as the best of
//! a plain edit-distance ratio and two token-based ratios (token order and
//! token set insensitive), the latter weighted down slightly so that an exact
//! match always outranks a reordered or partial one.

use std::collections::BTreeSet;

use crate::{catalog::Catalog, models::TitleMatch};

/// Default minimum score for a query to resolve
pub const FUZZY_MATCH_THRESHOLD: u8 = 80;

const TOKEN_SCALE: f64 = 0.95;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResolveError {
    /// No title scored at or above the threshold. An expected outcome.
    #[error("No catalog title matches '{query}' (best score {best_score})")]
    NotFound { query: String, best_score: u8 },

    /// The fuzzy matcher produced a title the catalog index does not know.
    #[error("Matched title '{title}' is missing from the catalog index")]
    Inconsistent { title: String },
}

/// Lowercases, folds punctuation to spaces and collapses whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity between two already-normalized strings, 0-100
pub fn score(query: &str, title: &str) -> u8 {
    if query == title {
        return 100;
    }
    if query.is_empty() || title.is_empty() {
        return 0;
    }

    let plain = ratio(query, title);
    let tokens = token_sort_ratio(query, title).max(token_set_ratio(query, title)) * TOKEN_SCALE;

    (plain.max(tokens) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Compares the shared tokens against each side's full token set
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join(a_tokens.intersection(&b_tokens));
    let only_a = join(a_tokens.difference(&b_tokens));
    let only_b = join(b_tokens.difference(&a_tokens));

    let combined_a = concat(&shared, &only_a);
    let combined_b = concat(&shared, &only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !shared.is_empty() {
        best = best
            .max(ratio(&shared, &combined_a))
            .max(ratio(&shared, &combined_b));
    }
    best
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

/// Highest scoring title for `query`
///
/// Among equal scores a title matching the raw query case-insensitively wins
/// (so "Heat!" beats "Heat" for the query "heat!"); otherwise the earliest
/// catalog position is kept.
fn extract_one<'a>(raw_query: &str, query: &str, catalog: &'a Catalog) -> Option<(&'a str, u8)> {
    let raw_query = raw_query.trim().to_lowercase();
    let mut best: Option<(&'a str, u8, bool)> = None;
    for (movie, normalized) in catalog.movies().iter().zip(catalog.normalized_titles()) {
        let candidate = score(query, normalized);
        let literal = movie.title.trim().to_lowercase() == raw_query;
        let better = match best {
            None => true,
            Some((_, top, top_literal)) => {
                candidate > top || (candidate == top && literal && !top_literal)
            }
        };
        if better {
            best = Some((movie.title.as_str(), candidate, literal));
        }
    }
    best.map(|(title, score, _)| (title, score))
}

/// Maps a matched title back to its first catalog position
fn locate(title: &str, catalog: &Catalog) -> Result<usize, ResolveError> {
    catalog
        .position_of(title)
        .ok_or_else(|| ResolveError::Inconsistent {
            title: title.to_string(),
        })
}

/// Resolves free-text queries against a catalog
#[derive(Debug, Clone, Copy)]
pub struct TitleResolver {
    threshold: u8,
}

impl Default for TitleResolver {
    fn default() -> Self {
        Self::new(FUZZY_MATCH_THRESHOLD)
    }
}

impl TitleResolver {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Resolves `query` to the best matching catalog title
    pub fn resolve(&self, query: &str, catalog: &Catalog) -> Result<TitleMatch, ResolveError> {
        let normalized = normalize(query);
        let (title, best_score) = extract_one(query, &normalized, catalog).unwrap_or(("", 0));

        if normalized.is_empty() || best_score < self.threshold {
            tracing::debug!(
                query = %normalized,
                best_score,
                threshold = self.threshold,
                "No title above threshold"
            );
            return Err(ResolveError::NotFound {
                query: normalized,
                best_score,
            });
        }

        let index = locate(title, catalog)?;

        Ok(TitleMatch {
            index,
            title: title.to_string(),
            score: best_score,
        })
    }

    /// Best `limit` candidates for `query`, highest score first
    pub fn search(&self, query: &str, catalog: &Catalog, limit: usize) -> Vec<TitleMatch> {
        let normalized = normalize(query);
        if normalized.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<TitleMatch> = catalog
            .movies()
            .iter()
            .zip(catalog.normalized_titles())
            .enumerate()
            .map(|(index, (movie, title))| TitleMatch {
                index,
                title: movie.title.clone(),
                score: score(&normalized, title),
            })
            .filter(|m| m.score > 0)
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.index.cmp(&b.index)));
        matches.truncate(limit);
        matches
    }
}
