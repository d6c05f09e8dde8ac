//! Governance auditor service: visual PII checks on uploaded documents.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use phenoguard_vlm::VisualPiiAuditor;

use super::error::ApiError;

/// Largest accepted upload (multipart overhead included).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for the auditor routes.
#[derive(Clone)]
pub struct AuditorState {
    auditor: Arc<VisualPiiAuditor>,
}

impl AuditorState {
    pub fn new(auditor: VisualPiiAuditor) -> Self {
        Self {
            auditor: Arc::new(auditor),
        }
    }
}

/// Response for `POST /audit/document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResponse {
    pub filename: String,
    pub is_safe: bool,
    pub risk_score: f64,
    pub detected_issues: Vec<String>,
}

/// Build the governance auditor router.
pub fn router(state: AuditorState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/audit/document", post(audit_document))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn health(State(state): State<AuditorState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model": state.auditor.provider().model_id(),
    }))
}

async fn audit_document(
    State(state): State<AuditorState>,
    mut multipart: Multipart,
) -> Result<Json<AuditResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    tracing::info!(%filename, size = bytes.len(), "Auditing file");

    let auditor = state.auditor.clone();
    let report = tokio::task::spawn_blocking(move || auditor.audit_image(&bytes))
        .await
        .map_err(|e| ApiError::Audit(e.to_string()))?;

    if !report.is_safe {
        tracing::warn!(
            %filename,
            risk_score = report.risk_score,
            "Document blocked by visual audit"
        );
    }

    Ok(Json(AuditResponse {
        filename,
        is_safe: report.is_safe,
        risk_score: report.risk_score,
        detected_issues: report.detected_pii,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use phenoguard_vlm::{chat_completion, VisionClient, VisionRequest, VlmError, VlmProvider};
    use tower::ServiceExt;

    const BOUNDARY: &str = "phenoguard-test-boundary";

    struct CleanClient;

    impl VisionClient for CleanClient {
        fn complete(&self, _request: &VisionRequest) -> Result<serde_json::Value, VlmError> {
            Ok(chat_completion(concat!(
                r#"{"is_safe": true, "risk_score": 0.05, "#,
                r#""detected_pii": [], "reasoning": "Clean."}"#
            )))
        }
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/audit/document")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let app = router(AuditorState::new(VisualPiiAuditor::mock(VlmProvider::LlavaNext)));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let json = body_json(app.oneshot(req).await.unwrap()).await;

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model"], "llava-v1.6-34b");
    }

    #[tokio::test]
    async fn mock_audit_flags_upload() {
        let app = router(AuditorState::new(VisualPiiAuditor::mock(VlmProvider::OpenAiGpt4v)));
        let response = app
            .oneshot(multipart_request("file", "patient_001_page1.png", b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["filename"], "patient_001_page1.png");
        assert_eq!(json["is_safe"], false);
        assert_eq!(json["risk_score"], 0.95);
        assert_eq!(json["detected_issues"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clean_document_passes() {
        let auditor = VisualPiiAuditor::new(
            VlmProvider::OpenAiGpt4v,
            Some("key".into()),
            Arc::new(CleanClient),
        );
        let app = router(AuditorState::new(auditor));
        let response = app
            .oneshot(multipart_request("file", "redacted.png", b"pixels"))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["is_safe"], true);
        assert_eq!(json["detected_issues"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_file_field_returns_400() {
        let app = router(AuditorState::new(VisualPiiAuditor::mock(VlmProvider::OpenAiGpt4v)));
        let response = app
            .oneshot(multipart_request("attachment", "page.png", b"pixels"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "No file provided");
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected() {
        let app = router(AuditorState::new(VisualPiiAuditor::mock(VlmProvider::OpenAiGpt4v)));
        let req = Request::builder()
            .method("POST")
            .uri("/audit/document")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
