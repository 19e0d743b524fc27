//! End-to-end tests for the estimator form, driven through the router.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use house_price::{
    example_form, FeatureRecord, FormFields, PriceModel, PriceResult, Predictor, MODEL_COLUMNS,
};
use house_price_server::{router, AppState};

// ─────────────────────── helpers ───────────────────────

/// Sums the numeric inputs and remembers the column order it was given.
struct SumModel {
    seen: Mutex<Vec<Vec<String>>>,
}

impl SumModel {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl PriceModel for SumModel {
    fn predict(&self, record: &FeatureRecord) -> PriceResult<f64> {
        self.seen
            .lock()
            .unwrap()
            .push(record.columns().map(str::to_string).collect());
        Ok(record.iter().filter_map(|(_, v)| v.as_f64()).sum())
    }

    fn name(&self) -> &str {
        "sum"
    }
}

/// Formatted price `SumModel` gives for `example_form()`.
const EXAMPLE_PRICE: &str = "$8,553.30";

fn app_with(predictor: Predictor) -> Router {
    router(AppState::new(predictor, Duration::from_secs(600), 100))
}

fn app() -> (Router, Arc<SumModel>) {
    let model = Arc::new(SumModel::new());
    (app_with(Predictor::new(model.clone())), model)
}

fn encode(form: &[(&str, &str)]) -> String {
    fn escape(raw: &str) -> String {
        raw.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' => {
                    (b as char).to_string()
                }
                b' ' => "+".to_string(),
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    form.iter()
        .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn pairs(form: &FormFields) -> Vec<(&str, &str)> {
    form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn subset<'a>(form: &'a FormFields, keys: &[&str]) -> Vec<(&'a str, &'a str)> {
    form.iter()
        .filter(|(k, _)| keys.contains(&k.as_str()))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

const PAGE1: &[&str] = &["bedrooms", "bathrooms", "floors"];
const PAGE2: &[&str] = &[
    "bedrooms",
    "bathrooms",
    "floors",
    "waterfront",
    "condition",
    "grade",
    "age",
];

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, form: &[(&str, &str)]) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(encode(form)))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn session_id(html: &str) -> String {
    let marker = "name=\"session_id\" value=\"";
    let start = html.find(marker).expect("page should carry a session id") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

async fn health(app: &Router) -> Value {
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).unwrap()
}

// ─────────────────────── form flow ───────────────────────

#[tokio::test]
async fn test_index_opens_session() {
    let (app, _) = app();
    let (status, html) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("action=\"/page2\""));
    assert!(!session_id(&html).is_empty());
    assert_eq!(health(&app).await["sessions"], 1);
}

#[tokio::test]
async fn test_round_trip_with_hidden_fields() {
    let (app, _) = app();
    let form = example_form();

    let (status, html) = post(&app, "/page2", &subset(&form, PAGE1)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("action=\"/page3\""));
    assert!(html.contains("type=\"hidden\" name=\"bedrooms\" value=\"3\""));

    let (status, html) = post(&app, "/page3", &subset(&form, PAGE2)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("action=\"/predict\""));
    assert!(html.contains("type=\"hidden\" name=\"condition\" value=\"Good\""));

    let (status, html) = post(&app, "/predict", &pairs(&form)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(EXAMPLE_PRICE));
    assert!(!html.contains("An error occurred"));
}

#[tokio::test]
async fn test_round_trip_with_session() {
    let (app, _) = app();
    let form = example_form();
    let (_, html) = get(&app, "/").await;
    let id = session_id(&html);

    let mut page1 = subset(&form, PAGE1);
    page1.push(("session_id", id.as_str()));
    let (status, html) = post(&app, "/page2", &page1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session_id(&html), id);

    let mut page2 = subset(&form, PAGE2);
    page2.push(("session_id", id.as_str()));
    let (status, _) = post(&app, "/page3", &page2).await;
    assert_eq!(status, StatusCode::OK);

    let mut all = pairs(&form);
    all.push(("session_id", id.as_str()));
    let (status, html) = post(&app, "/predict", &all).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(EXAMPLE_PRICE));

    assert_eq!(health(&app).await["sessions"], 0);
}

#[tokio::test]
async fn test_session_overrides_tampered_hidden_field() {
    let (app, _) = app();
    let form = example_form();
    let (_, html) = get(&app, "/").await;
    let id = session_id(&html);

    let mut page1 = subset(&form, PAGE1);
    page1.push(("session_id", id.as_str()));
    post(&app, "/page2", &page1).await;

    let mut page2: Vec<(&str, &str)> = subset(&form, PAGE2)
        .into_iter()
        .map(|(k, v)| if k == "bedrooms" { (k, "300") } else { (k, v) })
        .collect();
    page2.push(("session_id", id.as_str()));
    let (status, html) = post(&app, "/page3", &page2).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"bedrooms\" value=\"3\""));
    assert!(!html.contains("value=\"300\""));

    let mut all: Vec<(&str, &str)> = pairs(&form)
        .into_iter()
        .map(|(k, v)| if k == "bedrooms" { (k, "300") } else { (k, v) })
        .collect();
    all.push(("session_id", id.as_str()));
    let (status, html) = post(&app, "/predict", &all).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(EXAMPLE_PRICE));
}

#[tokio::test]
async fn test_unknown_session_uses_submitted_fields() {
    let (app, _) = app();
    let form = example_form();

    let mut page1 = subset(&form, PAGE1);
    page1.push(("session_id", "not-a-session"));
    let (status, html) = post(&app, "/page2", &page1).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"bedrooms\" value=\"3\""));
    assert!(!html.contains("not-a-session"));
}

#[tokio::test]
async fn test_missing_field_on_page_transition() {
    let (app, _) = app();
    let (status, body) = post(&app, "/page2", &[("bedrooms", "3"), ("floors", "1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("bathrooms"));

    let form = example_form();
    let (status, body) = post(&app, "/page3", &subset(&form, PAGE1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("waterfront"));
}

// ─────────────────────── prediction ───────────────────────

#[tokio::test]
async fn test_model_receives_pinned_column_order() {
    let (app, model) = app();
    let form = example_form();
    let mut reversed = pairs(&form);
    reversed.reverse();

    let (status, _) = post(&app, "/predict", &reversed).await;
    assert_eq!(status, StatusCode::OK);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], MODEL_COLUMNS);
}

#[tokio::test]
async fn test_non_numeric_value_is_bad_request() {
    let (app, model) = app();
    let mut form = example_form();
    form.insert("lot_area".to_string(), "huge".to_string());

    let (status, body) = post(&app, "/predict", &pairs(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("An error occurred: "));
    assert!(body.contains("lot_area"));
    assert!(model.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_field_on_predict_is_bad_request() {
    let (app, _) = app();
    let mut form = example_form();
    form.remove("age");

    let (status, body) = post(&app, "/predict", &pairs(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("An error occurred: "));
}

#[tokio::test]
async fn test_no_model_is_server_error_before_coercion() {
    let app = app_with(Predictor::unavailable());
    let mut form = example_form();
    form.insert("bedrooms".to_string(), "lots".to_string());

    let (status, body) = post(&app, "/predict", &pairs(&form)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Model not loaded. Please check the server logs.");
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let (app, _) = app();
    let form = example_form();

    let (_, first) = post(&app, "/predict", &pairs(&form)).await;
    let (_, second) = post(&app, "/predict", &pairs(&form)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_predict_keeps_session() {
    let (app, _) = app();
    let (_, html) = get(&app, "/").await;
    let id = session_id(&html);

    let mut form = example_form();
    form.insert("grade".to_string(), "seven".to_string());
    let mut all = pairs(&form);
    all.push(("session_id", id.as_str()));

    let (status, _) = post(&app, "/predict", &all).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(health(&app).await["sessions"], 1);
}

async fn post_raw(app: &Router, uri: &str, body: &'static str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_bodyless_predict_without_model_is_server_error() {
    let app = app_with(Predictor::unavailable());
    let (status, body) = post_raw(&app, "/predict", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Model not loaded. Please check the server logs.");
}

#[tokio::test]
async fn test_bodyless_predict_with_model_is_bad_request() {
    let (app, model) = app();
    let (status, body) = post_raw(&app, "/predict", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("An error occurred: "));
    assert!(model.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_page_without_form_content_type_reports_missing_field() {
    let (app, _) = app();
    let (status, body) = post_raw(&app, "/page2", "bedrooms=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required field: bedrooms");

    let (status, body) = post_raw(&app, "/page3", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required field: bedrooms");
}

#[tokio::test]
async fn test_repeated_key_keeps_first_value() {
    let (app, _) = app();
    let form = example_form();
    let mut all = pairs(&form);
    all.push(("bedrooms", "x"));

    let (status, html) = post(&app, "/predict", &all).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(EXAMPLE_PRICE));
}

// ─────────────────────── health ───────────────────────

#[tokio::test]
async fn test_health_reports_model() {
    let (app, _) = app();
    let body = health(&app).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model"], "sum");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let app = app_with(Predictor::unavailable());
    let body = health(&app).await;
    assert_eq!(body["model_loaded"], false);
    assert!(body["model"].is_null());
}

#[tokio::test]
async fn test_missing_artifact_still_serves_pages() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Predictor::load(&dir.path().join("houseprice_pred.onnx")));

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"bedrooms\""));

    let (status, body) = post(&app, "/predict", &pairs(&example_form())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Model not loaded. Please check the server logs.");
}
