//! End-to-end checks of both services built from configuration.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use phenoguard_core::phenotype::VteExtractor;
use phenoguard_server::api::{auditor, phenotype};
use phenoguard_server::config::{ServiceConfig, DEFAULT_AUDITOR_PORT, DEFAULT_NLP_PORT};
use phenoguard_vlm::VisualPiiAuditor;

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn nlp_service_uses_configured_model_and_window() {
    let config = ServiceConfig::from_lookup(DEFAULT_NLP_PORT, |key| match key {
        "PHENOGUARD_NLP_MODEL" => Some("en_core_web_sm".to_string()),
        "PHENOGUARD_NEGATION_WINDOW" => Some("5".to_string()),
        _ => None,
    });
    let extractor = VteExtractor::new(config.extractor_config());
    let app = phenotype::router(phenotype::PhenotypeState::new(
        extractor,
        config.open_database().unwrap(),
    ));

    let (status, health) = get_json(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model_version"], "en_core_web_sm");

    // "No" sits six tokens back: outside a window of five.
    let note = serde_json::json!({
        "patient_id": "P9",
        "encounter_id": "E9",
        "text_content": "No acute change , right leg thrombus."
    });
    let req = Request::builder()
        .method("POST")
        .uri("/extract/vte")
        .header("content-type", "application/json")
        .body(Body::from(note.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["has_vte"], true);
    assert_eq!(json["evidence"], serde_json::json!(["thrombus"]));
}

#[tokio::test]
async fn unknown_model_falls_back_to_general() {
    let config = ServiceConfig::from_lookup(DEFAULT_NLP_PORT, |key| {
        (key == "PHENOGUARD_NLP_MODEL").then(|| "en_core_sci_lg".to_string())
    });
    let extractor = VteExtractor::new(config.extractor_config());
    let app = phenotype::router(phenotype::PhenotypeState::new(
        extractor,
        config.open_database().unwrap(),
    ));

    let (_, health) = get_json(app, "/health").await;
    assert_eq!(health["model_version"], "en_core_web_sm");
}

#[tokio::test]
async fn auditor_service_reports_configured_provider() {
    let config = ServiceConfig::from_lookup(DEFAULT_AUDITOR_PORT, |key| {
        (key == "VLM_PROVIDER").then(|| "llava-v1.6-34b".to_string())
    });
    assert_eq!(config.port, 8001);

    let auditor = VisualPiiAuditor::mock(config.vlm_provider);
    let app = auditor::router(auditor::AuditorState::new(auditor));

    let (status, health) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model"], "llava-v1.6-34b");
}
