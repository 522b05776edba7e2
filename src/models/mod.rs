use serde::{Deserialize, Serialize};

/// A single movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    /// TMDB id, when the catalog artifact already knows it
    #[serde(rename = "movie_id", default)]
    pub external_id: Option<u64>,
}

impl MovieRecord {
    pub fn new(title: impl Into<String>, external_id: Option<u64>) -> Self {
        Self {
            title: title.into(),
            external_id,
        }
    }
}

/// One recommended movie, ready to render as a tile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub poster_url: String,
}

/// User-visible condition attached to a recommendation result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The query did not match any title closely enough
    MovieNotFound,
    /// No metadata API key is configured, so every poster is the placeholder
    PostersUnavailable,
}

/// Response for a single recommendation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub query: String,
    /// Catalog title the query resolved to
    pub matched_title: Option<String>,
    /// Up to five movies, most similar first
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl RecommendationResult {
    /// Empty result for a query that resolved to nothing
    pub fn not_found(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            matched_title: None,
            recommendations: Vec::new(),
            notice: Some(Notice::MovieNotFound),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// A catalog title with its fuzzy score against a query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleMatch {
    pub index: usize,
    pub title: String,
    /// 0-100
    pub score: u8,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Response from GET /search/movie
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response from GET /movie/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}
