use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use cinematch::{
    catalog::{Catalog, SimilarityMatrix},
    config::Config,
    models::MovieRecord,
    routes::{create_router, AppState},
    services::{
        providers::{EnrichmentError, EnrichmentResult},
        MetadataProvider, Recommender,
    },
};

const NO_POSTER: &str = "https://placeholder.test/none.png";

/// Counts calls and serves posters for every title except "Cars"
#[derive(Default)]
struct FakeProvider {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl MetadataProvider for FakeProvider {
    async fn find_external_id(&self, title: &str) -> EnrichmentResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match title {
            "Cars" => Err(EnrichmentError::NotFound(title.to_string())),
            _ => Ok(title.len() as u64),
        }
    }

    async fn fetch_poster_url(&self, id: u64) -> EnrichmentResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://img.test/{}.jpg", id))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn test_catalog() -> Catalog {
    let movies = vec![
        MovieRecord::new("Toy Story", None),
        MovieRecord::new("Toy Story 2", None),
        MovieRecord::new("Cars", None),
        MovieRecord::new("Finding Nemo", None),
        MovieRecord::new("Up", None),
        MovieRecord::new("Heat", None),
        MovieRecord::new("Monsters, Inc.", None),
    ];
    let matrix = SimilarityMatrix::new(vec![
        vec![1.0, 0.9, 0.6, 0.7, 0.5, 0.0, 0.8],
        vec![0.9, 1.0, 0.6, 0.7, 0.5, 0.0, 0.8],
        vec![0.6, 0.6, 1.0, 0.4, 0.3, 0.1, 0.5],
        vec![0.7, 0.7, 0.4, 1.0, 0.6, 0.0, 0.6],
        vec![0.5, 0.5, 0.3, 0.6, 1.0, 0.1, 0.5],
        vec![0.0, 0.0, 0.1, 0.0, 0.1, 1.0, 0.0],
        vec![0.8, 0.8, 0.5, 0.6, 0.5, 0.0, 1.0],
    ])
    .unwrap();
    Catalog::new(movies, matrix).unwrap()
}

fn create_test_server(provider: Option<Arc<FakeProvider>>) -> TestServer {
    let provider = provider.map(|p| p as Arc<dyn MetadataProvider>);
    let recommender =
        Recommender::new(Arc::new(test_catalog()), provider).with_no_poster_url(NO_POSTER);
    let app = create_router(AppState::new(recommender));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(None);
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["movies"], 7);
    assert_eq!(body["posters_enabled"], false);
}

#[tokio::test]
async fn test_recommendations_with_posters() {
    let provider = Arc::new(FakeProvider::default());
    let server = create_test_server(Some(provider.clone()));

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "title": "  toy STORY " }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["matched_title"], "Toy Story");
    assert!(body.get("notice").is_none());

    let recs = body["recommendations"].as_array().unwrap();
    let titles: Vec<&str> = recs.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec![
            "Toy Story 2",
            "Monsters, Inc.",
            "Finding Nemo",
            "Cars (poster not found)",
            "Up"
        ]
    );
    assert_eq!(recs[0]["poster_url"], "https://img.test/11.jpg");
    assert_eq!(recs[3]["poster_url"], NO_POSTER);

    // Five id lookups plus four poster lookups ("Cars" has no id)
    assert_eq!(provider.calls.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_recommendations_not_found() {
    let provider = Arc::new(FakeProvider::default());
    let server = create_test_server(Some(provider.clone()));

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "title": "zzzznotamovie" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["notice"], "movie_not_found");
    assert!(body["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_recommendations_without_api_key() {
    let server = create_test_server(None);

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "title": "Toy Story" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["notice"], "posters_unavailable");

    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 5);
    assert_eq!(recs[3]["title"], "Cars");
    assert!(recs.iter().all(|r| r["poster_url"] == NO_POSTER));
}

#[tokio::test]
async fn test_recommendations_blank_title() {
    let server = create_test_server(None);

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "title": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Title cannot be empty");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(None);
    let id = "8f14e45f-ceea-467f-a0e6-6e2f6b2b2b2b";

    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_list_titles() {
    let server = create_test_server(None);

    let response = server
        .get("/api/v1/titles")
        .add_query_param("limit", 2)
        .add_query_param("offset", 1)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 7);
    assert_eq!(
        body["titles"],
        json!([
            { "index": 1, "title": "Toy Story 2" },
            { "index": 2, "title": "Cars" }
        ])
    );
}

#[tokio::test]
async fn test_search_titles() {
    let server = create_test_server(None);

    let response = server
        .get("/api/v1/titles/search")
        .add_query_param("q", "toy story")
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let matches: Vec<Value> = response.json();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["title"], "Toy Story");
    assert_eq!(matches[0]["score"], 100);
    assert_eq!(matches[1]["title"], "Toy Story 2");
}

#[tokio::test]
async fn test_search_titles_blank_query() {
    let server = create_test_server(None);
    let response = server.get("/api/v1/titles/search").add_query_param("q", " ").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_from_config_without_api_key() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        json!({
            "movies": [{"title": "Alien", "movie_id": 348}, {"title": "Aliens", "movie_id": 679}],
            "similarity": [[1.0, 0.9], [0.9, 1.0]]
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();

    let config = Config {
        catalog_path: file.path().display().to_string(),
        tmdb_api_key: Some(String::new()),
        no_poster_url: NO_POSTER.to_string(),
        ..Config::default()
    };
    let state = AppState::from_config(&config).await.unwrap();
    assert!(!state.recommender.posters_enabled());

    let server = TestServer::new(create_router(state)).unwrap();
    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "title": "alien" }))
        .await;

    let body: Value = response.json();
    assert_eq!(body["recommendations"], json!([{ "title": "Aliens", "poster_url": NO_POSTER }]));
}

#[tokio::test]
async fn test_state_from_config_missing_catalog_is_fatal() {
    let config = Config {
        catalog_path: "/nonexistent/catalog.json".to_string(),
        ..Config::default()
    };
    assert!(AppState::from_config(&config).await.is_err());
}
