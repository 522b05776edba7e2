//! Movie metadata provider abstraction
//!
//! Recommendations only carry a title and a poster, so a provider needs exactly
//! two lookups: title to external id, and external id to poster URL. Every
//! failure is returned as an `EnrichmentError`; the orchestrator downgrades it
//! to the placeholder poster instead of failing the request.

use std::time::Duration;

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Failure of a single metadata lookup
#[derive(thiserror::Error, Debug)]
pub enum EnrichmentError {
    #[error("No metadata match for '{0}'")]
    NotFound(String),

    #[error("Movie {0} has no poster")]
    NoPoster(u64),

    #[error("Metadata API returned status {0}")]
    Status(u16),

    #[error("Metadata API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode metadata response: {0}")]
    Decode(String),

    #[error("Metadata lookup timed out after {0:?}")]
    Timeout(Duration),
}

pub type EnrichmentResult<T> = Result<T, EnrichmentError>;

/// Trait for metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search the provider by title and return the first match's id
    async fn find_external_id(&self, title: &str) -> EnrichmentResult<u64>;

    /// Fetch the full poster URL for a provider id
    async fn fetch_poster_url(&self, id: u64) -> EnrichmentResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
