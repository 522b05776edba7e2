use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    models::{MovieRecord, Notice, Recommendation, RecommendationResult},
    services::{
        providers::{EnrichmentError, EnrichmentResult, MetadataProvider},
        ranker,
        title_resolver::{ResolveError, TitleResolver},
    },
};

/// Number of recommendations returned per query
pub const TOP_K: usize = 5;

/// Appended to a title whose external id could not be resolved
pub const POSTER_NOT_FOUND_SUFFIX: &str = " (poster not found)";

pub const DEFAULT_NO_POSTER_URL: &str = "https://via.placeholder.com/150?text=No+Image";

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(8);

/// Generates movie recommendations from the catalog's similarity matrix
///
/// Resolution and ranking run synchronously; poster enrichment then fans out
/// one task per recommended movie. Results always come back in ranked order,
/// and a failed lookup only ever downgrades its own entry to the placeholder.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    resolver: TitleResolver,
    /// `None` when no API key is configured
    provider: Option<Arc<dyn MetadataProvider>>,
    no_poster_url: String,
    call_timeout: Duration,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, provider: Option<Arc<dyn MetadataProvider>>) -> Self {
        Self {
            catalog,
            resolver: TitleResolver::default(),
            provider,
            no_poster_url: DEFAULT_NO_POSTER_URL.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_resolver(mut self, resolver: TitleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_no_poster_url(mut self, url: impl Into<String>) -> Self {
        self.no_poster_url = url.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn resolver(&self) -> &TitleResolver {
        &self.resolver
    }

    pub fn posters_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Recommends up to [`TOP_K`] movies similar to the title `query` resolves to
    ///
    /// An unmatched query yields an empty result with a `MovieNotFound` notice.
    /// Only an internal inconsistency between the matcher and the catalog index
    /// is returned as an error.
    #[instrument(skip(self), fields(provider = self.provider.as_ref().map(|p| p.name())))]
    pub async fn get_recommendations(&self, query: &str) -> AppResult<RecommendationResult> {
        let matched = match self.resolver.resolve(query, &self.catalog) {
            Ok(matched) => matched,
            Err(ResolveError::NotFound { query: normalized, best_score }) => {
                tracing::info!(
                    query = %normalized,
                    best_score,
                    "Movie not found in catalog with sufficient similarity"
                );
                return Ok(RecommendationResult::not_found(query));
            }
            Err(e @ ResolveError::Inconsistent { .. }) => {
                tracing::error!(error = %e, "Title resolver and catalog index disagree");
                return Err(AppError::Internal(e.to_string()));
            }
        };

        let neighbours: Vec<MovieRecord> =
            ranker::top_neighbours(matched.index, self.catalog.similarity(), TOP_K)
                .into_iter()
                .filter_map(|(index, _)| self.catalog.get(index).cloned())
                .collect();

        tracing::info!(
            matched_title = %matched.title,
            score = matched.score,
            recommendations = neighbours.len(),
            "Resolved query"
        );

        let (recommendations, notice) = match &self.provider {
            Some(provider) => (self.enrich_all(provider, neighbours).await, None),
            None => {
                let placeholders = neighbours
                    .into_iter()
                    .map(|movie| Recommendation {
                        title: movie.title,
                        poster_url: self.no_poster_url.clone(),
                    })
                    .collect();
                (placeholders, Some(Notice::PostersUnavailable))
            }
        };

        Ok(RecommendationResult {
            query: query.to_string(),
            matched_title: Some(matched.title),
            recommendations,
            notice,
        })
    }

    /// Enriches every movie concurrently, returning them in input order
    async fn enrich_all(
        &self,
        provider: &Arc<dyn MetadataProvider>,
        movies: Vec<MovieRecord>,
    ) -> Vec<Recommendation> {
        let mut tasks = Vec::with_capacity(movies.len());

        for movie in movies {
            let fallback_title = movie.title.clone();
            let provider = Arc::clone(provider);
            let no_poster_url = self.no_poster_url.clone();
            let timeout = self.call_timeout;
            let task = tokio::spawn(async move {
                enrich(provider.as_ref(), movie, timeout, no_poster_url).await
            });
            tasks.push((fallback_title, task));
        }

        // Awaiting in spawn order keeps each result in its ranked slot
        let mut recommendations = Vec::with_capacity(tasks.len());
        for (fallback_title, task) in tasks {
            match task.await {
                Ok(recommendation) => recommendations.push(recommendation),
                Err(e) => {
                    tracing::error!(error = %e, title = %fallback_title, "Enrichment task join error");
                    recommendations.push(Recommendation {
                        title: fallback_title,
                        poster_url: self.no_poster_url.clone(),
                    });
                }
            }
        }

        let missing = recommendations
            .iter()
            .filter(|r| r.poster_url == self.no_poster_url)
            .count();
        if missing > 0 {
            tracing::warn!(
                success_count = recommendations.len() - missing,
                error_count = missing,
                "Partial poster enrichment failure"
            );
        }

        recommendations
    }
}

/// Resolves one movie's poster, degrading to the placeholder on any failure
async fn enrich(
    provider: &dyn MetadataProvider,
    movie: MovieRecord,
    timeout: Duration,
    no_poster_url: String,
) -> Recommendation {
    let external_id = match movie.external_id {
        Some(id) => Ok(id),
        None => bounded(timeout, provider.find_external_id(&movie.title)).await,
    };

    let id = match external_id {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, title = %movie.title, "Could not resolve external id");
            return Recommendation {
                title: format!("{}{}", movie.title, POSTER_NOT_FOUND_SUFFIX),
                poster_url: no_poster_url,
            };
        }
    };

    let poster_url = match bounded(timeout, provider.fetch_poster_url(id)).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, title = %movie.title, external_id = id, "Poster unavailable");
            no_poster_url
        }
    };

    Recommendation {
        title: movie.title,
        poster_url,
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = EnrichmentResult<T>>,
) -> EnrichmentResult<T> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(EnrichmentError::Timeout(timeout)))
}
