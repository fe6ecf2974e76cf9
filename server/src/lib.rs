use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use formally_core::corpus::load_corpus;
use formally_core::strategy::{MemorySearch, SearchError, SearchStrategy};
use formally_core::{index, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub questions_only: bool,
}

fn default_top_n() -> usize {
    5
}

fn default_strategy() -> String {
    "memory".to_string()
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub strategy: String,
    pub elapsed_ms: f64,
    pub total_results: usize,
}

#[derive(Serialize)]
struct StrategyInfo {
    id: &'static str,
    name: &'static str,
    description: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus_path: PathBuf,
    pub memory: Arc<MemorySearch>,
    /// Optional relational FTS strategy; absent unless a backend is wired up.
    pub fts: Option<Arc<dyn SearchStrategy>>,
    pub admin_token: Option<String>,
}

/// Load the corpus, build the in-memory snapshot, and assemble the router.
pub fn build_app(corpus_path: impl Into<PathBuf>) -> Result<Router> {
    let corpus_path = corpus_path.into();
    let records = load_corpus(&corpus_path)?;
    let memory = Arc::new(MemorySearch::from_records(records)?);
    tracing::info!(
        num_docs = memory.snapshot().num_docs(),
        "memory index built"
    );
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState {
        corpus_path,
        memory,
        fts: None,
        admin_token,
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/strategies", get(strategies_handler))
        .route("/search", post(search_handler))
        .route("/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let outcome = match req.strategy.as_str() {
        "postgres" => match &state.fts {
            Some(fts) => fts.search(&req.query, req.top_n, req.questions_only),
            None => Err(SearchError::NotReady),
        },
        // Unknown strategies fall back to the in-memory index.
        _ => state.memory.search(&req.query, req.top_n, req.questions_only),
    };
    let results = outcome.map_err(|e| match e {
        SearchError::NotReady | SearchError::Backend(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    })?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok(Json(SearchResponse {
        total_results: results.len(),
        results,
        query: req.query,
        strategy: req.strategy,
        elapsed_ms,
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut strategies = vec![state.memory.id()];
    if let Some(fts) = &state.fts {
        strategies.push(fts.id());
    }
    Json(serde_json::json!({ "status": "healthy", "strategies": strategies }))
}

pub async fn strategies_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut list = vec![strategy_info(state.memory.as_ref())];
    if let Some(fts) = &state.fts {
        list.push(strategy_info(fts.as_ref()));
    }
    Json(serde_json::json!({ "strategies": list }))
}

fn strategy_info(strategy: &dyn SearchStrategy) -> StrategyInfo {
    StrategyInfo {
        id: strategy.id(),
        name: strategy.name(),
        description: strategy.describe(),
    }
}

/// Re-read the corpus, rebuild the snapshot, and swap it in atomically.
/// In-flight queries keep the snapshot they started with.
async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let records = load_corpus(&state.corpus_path).map_err(internal)?;
    let snapshot = index::build(records).map_err(internal)?;
    let num_docs = snapshot.num_docs();
    state.memory.swap(snapshot);
    tracing::info!(num_docs, "memory index rebuilt");
    Ok(Json(
        serde_json::json!({ "reloaded": true, "num_docs": num_docs }),
    ))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

fn internal(err: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}
