use std::sync::Mutex;

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::json;

use super::*;
use crate::predict::types::{PREDICTION_FAILED, PredictionSignal, UNEXPECTED_RESPONSE};
use crate::predict::predict;

const TIMEOUTS: Timeouts = Timeouts { request_secs: 5, connect_secs: 2 };

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/predict")
}

/// Answers with a label describing the single uploaded part.
async fn describe_upload(mut multipart: Multipart) -> axum::Json<Value> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        let len = field.bytes().await.unwrap().len();
        parts.push(format!("{name}|{file_name}|{mime}|{len}"));
    }
    axum::Json(json!({ "prediction": parts.join(",") }))
}

// =============================================================================
// parse_prediction
// =============================================================================

#[test]
fn parse_string_label() {
    assert_eq!(parse_prediction(r#"{"prediction":"cat"}"#).unwrap(), "cat");
}

#[test]
fn parse_numeric_label() {
    assert_eq!(parse_prediction(r#"{"prediction":7}"#).unwrap(), "7");
}

#[test]
fn parse_missing_or_empty_label() {
    assert!(matches!(parse_prediction(r#"{"label":"cat"}"#), Err(PredictError::MissingLabel)));
    assert!(matches!(parse_prediction(r#"{"prediction":""}"#), Err(PredictError::MissingLabel)));
    assert!(matches!(parse_prediction(r#"{"prediction":null}"#), Err(PredictError::MissingLabel)));
    assert!(matches!(parse_prediction("[]"), Err(PredictError::MissingLabel)));
}

#[test]
fn parse_non_json() {
    assert!(matches!(parse_prediction("<html>oops</html>"), Err(PredictError::Parse(_))));
}

// =============================================================================
// HttpClassifier against a mock endpoint
// =============================================================================

#[tokio::test]
async fn posts_single_jpeg_file_field() {
    let url = serve(Router::new().route("/predict", post(describe_upload))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();

    let label = classifier.classify(vec![0xff, 0xd8, 0xff, 0xd9]).await.unwrap();
    assert_eq!(label, "file|whiteboard.jpg|image/jpeg|4");
}

#[tokio::test]
async fn server_error_is_status_error() {
    let url = serve(Router::new().route("/predict", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();

    let err = classifier.classify(vec![1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, PredictError::Status { status: 500, ref body } if body == "boom"));
}

#[tokio::test]
async fn unrecognized_body_is_missing_label() {
    let url = serve(Router::new().route("/predict", post(|| async { axum::Json(json!({ "result": "cat" })) }))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();

    let err = classifier.classify(vec![1]).await.unwrap_err();
    assert!(matches!(err, PredictError::MissingLabel));
}

#[tokio::test]
async fn connection_refused_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let classifier = HttpClassifier::new(format!("http://{addr}/predict"), TIMEOUTS).unwrap();

    let err = classifier.classify(vec![1]).await.unwrap_err();
    assert!(matches!(err, PredictError::Request(_)));
}

// =============================================================================
// predict() end to end
// =============================================================================

#[tokio::test]
async fn http_500_signals_loading_then_one_error() {
    let url = serve(Router::new().route("/predict", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();
    let seen = Mutex::new(Vec::new());
    let sink = |signal: PredictionSignal| seen.lock().unwrap().push(signal);

    let outcome = predict(&classifier, vec![1, 2, 3], &sink).await;

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen, vec![PredictionSignal::loading(), PredictionSignal::error(PREDICTION_FAILED)]);
    let settled: Vec<_> = seen.iter().filter(|s| !s.loading).collect();
    assert_eq!(settled.len(), 1);
    assert!(settled[0].error.is_some());
    assert!(settled[0].label.is_none());
    assert_eq!(outcome, PredictionSignal::error(PREDICTION_FAILED));
}

#[tokio::test]
async fn unrecognized_response_signals_unexpected() {
    let url = serve(Router::new().route("/predict", post(|| async { axum::Json(json!({})) }))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();
    let seen = Mutex::new(Vec::new());
    let sink = |signal: PredictionSignal| seen.lock().unwrap().push(signal);

    predict(&classifier, vec![1], &sink).await;

    assert_eq!(seen.into_inner().unwrap().last(), Some(&PredictionSignal::error(UNEXPECTED_RESPONSE)));
}

#[tokio::test]
async fn success_signals_label() {
    let url = serve(Router::new().route("/predict", post(|| async { axum::Json(json!({ "prediction": "house" })) }))).await;
    let classifier = HttpClassifier::new(url, TIMEOUTS).unwrap();
    let seen = Mutex::new(Vec::new());
    let sink = |signal: PredictionSignal| seen.lock().unwrap().push(signal);

    let outcome = predict(&classifier, vec![1], &sink).await;

    assert_eq!(outcome, PredictionSignal::label("house"));
    assert_eq!(seen.into_inner().unwrap(), vec![PredictionSignal::loading(), PredictionSignal::label("house")]);
}
