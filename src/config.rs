use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the prebuilt catalog artifact (movies + similarity matrix)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// TMDB API key. Posters are disabled when absent.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix joined with a TMDB `poster_path`
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Placeholder image returned when no poster can be obtained
    #[serde(default = "default_no_poster_url")]
    pub no_poster_url: String,

    /// Minimum fuzzy score (0-100) for a query to resolve to a title
    #[serde(default = "default_fuzzy_match_threshold")]
    pub fuzzy_match_threshold: u8,

    /// Per-call timeout for metadata API requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "artifacts/catalog.json".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_no_poster_url() -> String {
    "https://via.placeholder.com/150?text=No+Image".to_string()
}

fn default_fuzzy_match_threshold() -> u8 {
    80
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            no_poster_url: default_no_poster_url(),
            fuzzy_match_threshold: default_fuzzy_match_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
            .validate()
    }

    /// Rejects values envy accepts but the service cannot use
    pub fn validate(self) -> anyhow::Result<Self> {
        if self.fuzzy_match_threshold > 100 {
            anyhow::bail!(
                "FUZZY_MATCH_THRESHOLD must be between 0 and 100, got {}",
                self.fuzzy_match_threshold
            );
        }
        Ok(self)
    }

    /// The API key, treating a blank value as missing
    pub fn api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
