// tests/api_http.rs
//
// End-to-end over the router with a scripted provider: sessions, load, analyze,
// view/summary filters, classify, chat.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use student_sentiment_dashboard::ai_adapter::{DynProvider, MockProvider};
use student_sentiment_dashboard::analyze::RemoteStatus;
use student_sentiment_dashboard::api::SessionStatus;
use student_sentiment_dashboard::config::DashboardConfig;
use student_sentiment_dashboard::{router, AppState};

const SAMPLE: &str = "data/Datasetprojpowerbi.csv";

fn app_with(provider: DynProvider, dataset: impl Into<PathBuf>) -> Router {
    let mut cfg = DashboardConfig::default();
    cfg.dataset.path = dataset.into();
    router(AppState::new(cfg, provider, Duration::from_secs(2)))
}

fn app() -> Router {
    app_with(Arc::new(MockProvider::always("Positive")), SAMPLE)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, v)
}

async fn new_session(app: &Router) -> String {
    let (st, v) = send(app, "POST", "/sessions", None).await;
    assert_eq!(st, StatusCode::CREATED);
    v["session_id"].as_str().expect("session_id").to_string()
}

async fn loaded_session(app: &Router) -> String {
    let id = new_session(app).await;
    let (st, _) = send(app, "POST", &format!("/sessions/{id}/load"), None).await;
    assert_eq!(st, StatusCode::OK);
    id
}

async fn analyzed_session(app: &Router) -> String {
    let id = loaded_session(app).await;
    let (st, _) = send(
        app,
        "POST",
        &format!("/sessions/{id}/analyze"),
        Some(json!({ "method": "local" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    id
}

#[tokio::test]
async fn health_is_ok() {
    let (st, v) = send(&app(), "GET", "/health", None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v, Value::String("OK".into()));
}

#[tokio::test]
async fn unknown_session_is_404() {
    let (st, v) = send(&app(), "GET", "/sessions/nope", None).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
    assert_eq!(v["kind"], "unknown_session");
}

#[tokio::test]
async fn view_before_load_is_conflict() {
    let app = app();
    let id = new_session(&app).await;

    let (st, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["dataset_loaded"], false);
    assert_eq!(v["remote_status"], "remote_active");

    let (st, v) = send(&app, "GET", &format!("/sessions/{id}/view"), None).await;
    assert_eq!(st, StatusCode::CONFLICT);
    assert_eq!(v["kind"], "no_dataset");
}

#[tokio::test]
async fn load_normalizes_columns_and_categories() {
    let app = app();
    let id = new_session(&app).await;

    let (st, v) = send(&app, "POST", &format!("/sessions/{id}/load"), None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["rows"], 12);
    assert_eq!(v["analyzed"], false);
    let cols: Vec<&str> = v["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(
        cols,
        ["Student_ID", "Raw_Sentiments", "Category", "Resolved", "Date"]
    );

    let (st, v) = send(&app, "GET", &format!("/sessions/{id}/filters"), None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(
        v["categories"],
        json!([
            "All",
            "Administration",
            "Instruction",
            "Physical Facilities & Equipment"
        ])
    );
    assert_eq!(v["statuses"], json!(["All", "Resolved", "On Process"]));
    assert_eq!(v["date_column"], "Date");
    assert_eq!(v["min_date"], "2024-01-15");
    assert_eq!(v["max_date"], "2024-03-19");
}

#[tokio::test]
async fn load_missing_file_is_not_found() {
    let app = app_with(Arc::new(MockProvider::always("Neutral")), "data/nope.csv");
    let id = new_session(&app).await;
    let (st, v) = send(&app, "POST", &format!("/sessions/{id}/load"), None).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
    assert_eq!(v["kind"], "not_found");
}

#[tokio::test]
async fn load_garbage_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, b"\xff\xfe\x00garbage\xc3\x28\n\x00\x01").unwrap();

    let app = app_with(Arc::new(MockProvider::always("Neutral")), &path);
    let id = new_session(&app).await;
    let (st, v) = send(&app, "POST", &format!("/sessions/{id}/load"), None).await;
    assert_eq!(st, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["kind"], "parse");

    // session keeps working, still without a dataset
    let (_, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(v["dataset_loaded"], false);
}

#[tokio::test]
async fn analyze_without_dataset_is_conflict() {
    let app = app();
    let id = new_session(&app).await;
    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/analyze"),
        Some(json!({})),
    )
    .await;
    assert_eq!(st, StatusCode::CONFLICT);
    assert_eq!(v["kind"], "no_dataset");
}

#[tokio::test]
async fn local_analysis_labels_every_row() {
    let app = app();
    let id = loaded_session(&app).await;

    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/analyze"),
        Some(json!({ "method": "local" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["rows"], 12);
    assert_eq!(v["positive"], 4);
    assert_eq!(v["negative"], 4);
    assert_eq!(v["neutral"], 4);
    assert_eq!(v["remote"], 0);
    assert_eq!(v["local"], 12);
    assert_eq!(v["remote_unavailable"], false);

    let (_, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(v["analyzed"], true);
    assert_eq!(v["memoized"], 0);
}

#[tokio::test]
async fn remote_analysis_uses_model_and_memoizes() {
    let app = app();
    let id = loaded_session(&app).await;

    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/analyze"),
        Some(json!({ "method": "remote" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["positive"], 12);
    assert_eq!(v["remote"], 12);
    assert_eq!(v["local"], 0);

    let (_, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(v["memoized"], 12);
    assert_eq!(v["remote_status"], "remote_active");
}

#[tokio::test]
async fn remote_failure_falls_back_for_the_session() {
    let app = app_with(Arc::new(MockProvider::failing("connection refused")), SAMPLE);
    let id = loaded_session(&app).await;

    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/analyze"),
        Some(json!({ "method": "remote" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["remote_unavailable"], true);
    assert_eq!(v["remote"], 0);
    assert_eq!(v["local"], 12);
    // same labels the lexicon gives
    assert_eq!(v["positive"], 4);
    assert_eq!(v["negative"], 4);
    assert_eq!(v["neutral"], 4);

    let (_, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    let status: SessionStatus = serde_json::from_value(v).expect("typed session status");
    assert_eq!(status.remote_status, RemoteStatus::RemoteDisabled);
    assert!(status.remote_unavailable);
    assert!(status.analyzed);
    assert_eq!(status.rows, 12);

    // a second session starts fresh
    let other = new_session(&app).await;
    let (_, v) = send(&app, "GET", &format!("/sessions/{other}"), None).await;
    assert_eq!(v["remote_status"], "remote_active");
}

#[tokio::test]
async fn view_applies_filters() {
    let app = app();
    let id = loaded_session(&app).await;

    let cases = [
        ("", 12),
        ("?category=All", 12),
        ("?category=Instruction", 3),
        ("?category=Physical%20Facilities%20%26%20Equipment", 4),
        ("?status=Resolved", 6),
        ("?status=On%20Process", 4),
        ("?keyword=FEES", 1),
        ("?start=2024-02-01&end=2024-02-29", 4),
        ("?start=2024-03-01", 5),
        ("?category=Administration&status=On%20Process", 2),
    ];
    for (q, want) in cases {
        let (st, v) = send(&app, "GET", &format!("/sessions/{id}/view{q}"), None).await;
        assert_eq!(st, StatusCode::OK, "query {q}");
        assert_eq!(v["rows_in_view"], want, "query {q}");
        assert_eq!(v["rows_total"], 12);
        assert_eq!(v["rows"].as_array().unwrap().len(), want, "query {q}");
    }
}

#[tokio::test]
async fn summary_counts_view() {
    let app = app();
    let id = analyzed_session(&app).await;

    let (st, v) = send(&app, "GET", &format!("/sessions/{id}/summary"), None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["analyzed"], true);
    assert_eq!(v["kpis"]["total"], 12);
    assert_eq!(v["kpis"]["total_sentiments"], 12);
    assert_eq!(v["kpis"]["negative"], 4);
    assert_eq!(v["category_distribution"][0]["label"], "Administration");
    assert_eq!(v["category_distribution"][0]["count"], 5);

    let (_, v) = send(
        &app,
        "GET",
        &format!("/sessions/{id}/summary?keyword=zzzz"),
        None,
    )
    .await;
    assert_eq!(v["kpis"]["total"], 0);
    assert_eq!(v["sentiment_distribution"], json!([]));
}

#[tokio::test]
async fn classify_single_text() {
    let app = app();
    let id = new_session(&app).await;

    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/classify"),
        Some(json!({ "text": "The canteen food is terrible", "method": "local" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["category"], "Physical Facilities & Equipment");
    assert_eq!(v["sentiment"], "Negative");
    assert_eq!(v["origin"], "local");

    let (_, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/classify"),
        Some(json!({ "text": "whatever", "category": "Faculty", "method": "remote" })),
    )
    .await;
    assert_eq!(v["category"], "Instruction");
    assert_eq!(v["sentiment"], "Positive");
    assert_eq!(v["origin"], "remote");
}

#[tokio::test]
async fn chat_falls_back_to_local_stats() {
    let app = app_with(Arc::new(MockProvider::failing("503")), SAMPLE);
    let id = analyzed_session(&app).await;

    let (st, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/chat"),
        Some(json!({ "message": "How many negative comments are there?" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["from_model"], false);
    assert_eq!(v["text"], "There are 4 negative sentiments in the current view.");

    let (_, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/chat"),
        Some(json!({
            "message": "negative ones in facilities?",
            "category": "Physical Facilities & Equipment"
        })),
    )
    .await;
    assert_eq!(v["text"], "There are 2 negative sentiments in the current view.");

    let (_, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/chat"),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(v["from_model"], false);
    assert!(v["text"].as_str().unwrap().contains("unable to reach"));

    let (st, v) = send(&app, "GET", &format!("/sessions/{id}/chat"), None).await;
    assert_eq!(st, StatusCode::OK);
    let turns = v.as_array().unwrap();
    assert_eq!(turns.len(), 6);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[1]["role"], "assistant");
}

#[tokio::test]
async fn chat_uses_model_reply_and_does_not_disable_classifier() {
    let app = app_with(
        Arc::new(MockProvider::always("Positive").then(Err("timeout"))),
        SAMPLE,
    );
    let id = loaded_session(&app).await;

    let (_, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/chat"),
        Some(json!({ "message": "summarize" })),
    )
    .await;
    assert_eq!(v["from_model"], false);

    let (_, v) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(v["remote_status"], "remote_active");

    let (_, v) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/chat"),
        Some(json!({ "message": "summarize" })),
    )
    .await;
    assert_eq!(v["from_model"], true);
    assert_eq!(v["text"], "Positive");
}

#[tokio::test]
async fn delete_session_then_gone() {
    let app = app();
    let id = new_session(&app).await;

    let (st, _) = send(&app, "DELETE", &format!("/sessions/{id}"), None).await;
    assert_eq!(st, StatusCode::NO_CONTENT);
    let (st, _) = send(&app, "DELETE", &format!("/sessions/{id}"), None).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
}
