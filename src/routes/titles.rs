use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::TitleMatch,
    routes::AppState,
};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TitleEntry {
    pub index: usize,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct TitleList {
    pub total: usize,
    pub titles: Vec<TitleEntry>,
}

/// Handler listing catalog titles in catalog order
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Json<TitleList> {
    let catalog = state.recommender.catalog();
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let titles = catalog
        .movies()
        .iter()
        .enumerate()
        .skip(offset)
        .take(limit)
        .map(|(index, movie)| TitleEntry {
            index,
            title: movie.title.clone(),
        })
        .collect();

    Json(TitleList {
        total: catalog.len(),
        titles,
    })
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

/// Handler for fuzzy title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<TitleMatch>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    let recommender = &state.recommender;
    let matches = recommender
        .resolver()
        .search(&params.q, recommender.catalog(), limit);

    tracing::info!(query = %params.q, results = matches.len(), "Title search completed");

    Ok(Json(matches))
}
