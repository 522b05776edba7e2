//! TMDB API provider
//!
//! API Flow:
//! 1. Id lookup: /search/movie?query=<title> → first result's id
//! 2. Poster: /movie/{id} → poster_path, joined onto the image base URL

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    models::{TmdbMovieDetails, TmdbSearchResponse},
    services::providers::{EnrichmentError, EnrichmentResult, MetadataProvider},
};

const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
}

impl TmdbProvider {
    /// Creates a TMDB provider whose every request is bounded by `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> EnrichmentResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url,
        })
    }

    /// Joins a TMDB `poster_path` onto the image base URL
    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.image_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    /// GETs `path` with the API key and language attached and decodes the body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> EnrichmentResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, path = %path, "TMDB API returned error status");
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let response_text = response.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDB response"
            );
            EnrichmentError::Decode(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn find_external_id(&self, title: &str) -> EnrichmentResult<u64> {
        let search: TmdbSearchResponse = self
            .get_json("/search/movie", &[("query", title)])
            .await?;

        let first = search
            .results
            .into_iter()
            .next()
            .ok_or_else(|| EnrichmentError::NotFound(title.to_string()))?;

        tracing::debug!(
            query = %title,
            tmdb_id = first.id,
            tmdb_title = ?first.title,
            provider = "tmdb",
            "Title search matched"
        );

        Ok(first.id)
    }

    async fn fetch_poster_url(&self, id: u64) -> EnrichmentResult<String> {
        let details: TmdbMovieDetails = self.get_json(&format!("/movie/{}", id), &[]).await?;

        match details.poster_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(self.poster_url(path)),
            _ => Err(EnrichmentError::NoPoster(id)),
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
