use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn write_corpus() -> NamedTempFile {
    let corpus = json!([
        {
            "export_name": "addr_current",
            "key": "ADDR1",
            "question": "What is your current address?",
            "context": "Residential history"
        },
        {
            "export_name": "addr_apartment",
            "key": "ADDR2",
            "question": "Apartment number",
            "context": "Residential history"
        },
        {
            "export_name": "misc_color",
            "key": "MISC",
            "question": "Favorite color",
            "context": ""
        }
    ]);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(corpus.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn app() -> (Router, NamedTempFile) {
    let corpus = write_corpus();
    let app = formally_server::build_app(corpus.path()).unwrap();
    (app, corpus)
}

async fn post_search(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn search_returns_ranked_highlighted_results() {
    let (app, _corpus) = app();
    let (status, body) = post_search(app, json!({ "query": "address" })).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["key"], "ADDR1");
    assert_eq!(results[0]["rank"], 1);
    assert!(results[0]["highlighted_question"]
        .as_str()
        .unwrap()
        .contains("<mark>address</mark>"));
    assert_eq!(body["strategy"], "memory");
    assert_eq!(body["total_results"], results.len() as u64);
    assert!(body["elapsed_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn empty_queries_yield_empty_result_lists() {
    let (app, _corpus) = app();
    let (status, body) = post_search(app, json!({ "query": "!!!" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn top_n_bounds_the_response() {
    let (app, _corpus) = app();
    let (status, body) =
        post_search(app, json!({ "query": "address", "top_n": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["results"].as_array().unwrap().len() <= 1);
}

#[tokio::test]
async fn unconfigured_fts_strategy_maps_to_service_unavailable() {
    let (app, _corpus) = app();
    let (status, _) =
        post_search(app, json!({ "query": "address", "strategy": "postgres" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_strategies_fall_back_to_memory() {
    let (app, _corpus) = app();
    let (status, body) =
        post_search(app, json!({ "query": "address", "strategy": "bogus" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_available_strategies() {
    let (app, _corpus) = app();
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    let strategies = body["strategies"].as_array().unwrap();
    assert!(strategies.iter().any(|s| s == "memory"));
}

#[tokio::test]
async fn strategies_endpoint_describes_backends() {
    let (app, _corpus) = app();
    let (status, body) = get(app, "/strategies").await;
    assert_eq!(status, StatusCode::OK);
    let list = body["strategies"].as_array().unwrap();
    assert_eq!(list[0]["id"], "memory");
    assert_eq!(list[0]["name"], "In-Memory Index");
}

#[tokio::test]
async fn reload_requires_admin_token() {
    let (app, _corpus) = app();
    let req = Request::builder()
        .method("POST")
        .uri("/reload")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
