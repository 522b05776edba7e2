//! Read-only movie catalog and its precomputed similarity matrix.
//!
//! Both are built offline and loaded once at startup. Nothing in the crate
//! mutates them afterwards; request handlers share them through an `Arc`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::MovieRecord;
use crate::services::title_resolver::normalize;

pub mod loader;

pub use loader::load_catalog;

/// Errors raised while building a catalog. All of them are fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog contains no movies")]
    Empty,

    #[error("Similarity matrix has {rows} rows but the catalog has {movies} movies")]
    DimensionMismatch { movies: usize, rows: usize },

    #[error("Similarity row {row} has {found} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Similarity score at ({row}, {col}) is not a finite number")]
    NonFinite { row: usize, col: usize },
}

/// Square matrix of pairwise similarity scores indexed by catalog position
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: Vec<Vec<f32>>,
}

impl SimilarityMatrix {
    /// Validates that the matrix is square and every score is finite
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self, CatalogError> {
        let expected = rows.len();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(CatalogError::NotSquare {
                    row: row_idx,
                    expected,
                    found: row.len(),
                });
            }
            if let Some(col) = row.iter().position(|score| !score.is_finite()) {
                return Err(CatalogError::NonFinite { row: row_idx, col });
            }
        }

        Ok(Self { rows })
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}

/// The movie table plus its similarity matrix
#[derive(Debug)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
    similarity: SimilarityMatrix,
    /// Normalized form of each title, same order as `movies`
    normalized_titles: Vec<String>,
    /// Exact title -> first position holding it
    title_index: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn new(movies: Vec<MovieRecord>, similarity: SimilarityMatrix) -> Result<Self, CatalogError> {
        if movies.is_empty() {
            return Err(CatalogError::Empty);
        }
        if similarity.dimension() != movies.len() {
            return Err(CatalogError::DimensionMismatch {
                movies: movies.len(),
                rows: similarity.dimension(),
            });
        }

        let normalized_titles = movies.iter().map(|m| normalize(&m.title)).collect();

        let mut title_index = HashMap::with_capacity(movies.len());
        for (position, movie) in movies.iter().enumerate() {
            title_index.entry(movie.title.clone()).or_insert(position);
        }
        if title_index.len() != movies.len() {
            tracing::warn!(
                movies = movies.len(),
                distinct_titles = title_index.len(),
                "Catalog contains duplicate titles, first occurrence wins"
            );
        }

        Ok(Self {
            movies,
            similarity,
            normalized_titles,
            title_index,
            loaded_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn normalized_titles(&self) -> &[String] {
        &self.normalized_titles
    }

    /// Position of the first movie with exactly this title
    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
