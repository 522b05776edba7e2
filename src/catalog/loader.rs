use std::path::Path;

use serde::Deserialize;

use super::{Catalog, CatalogError, SimilarityMatrix};
use crate::models::MovieRecord;

/// On-disk layout of the catalog artifact
#[derive(Debug, Deserialize)]
struct CatalogArtifact {
    movies: Vec<MovieRecord>,
    similarity: Vec<Vec<f32>>,
}

/// Loads and validates the catalog artifact at `path`
///
/// Any failure here is fatal: the service never runs on a partial catalog.
pub async fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let catalog = parse_catalog(&bytes)?;

    tracing::info!(
        path = %path.display(),
        movies = catalog.len(),
        "Catalog loaded"
    );

    Ok(catalog)
}

/// Builds a catalog from the JSON artifact bytes
pub fn parse_catalog(bytes: &[u8]) -> Result<Catalog, CatalogError> {
    let artifact: CatalogArtifact = serde_json::from_slice(bytes)?;
    let similarity = SimilarityMatrix::new(artifact.similarity)?;
    Catalog::new(artifact.movies, similarity)
}
