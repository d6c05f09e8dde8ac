//! Visual PII auditing of redacted document pages.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{MockVisionClient, VisionClient, VisionRequest};
use crate::prompts::AUDIT_PROMPT;

/// Reasoning reported when the VLM response cannot be interpreted.
pub const PARSER_FAILURE: &str = "Parser Failure";

/// Reasoning reported when the VLM call itself fails.
pub const REQUEST_FAILURE: &str = "VLM Request Failure";

/// Audit errors. Only local I/O surfaces here; VLM problems fail closed.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to read document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supported vision-language models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VlmProvider {
    #[default]
    #[serde(rename = "gpt-4-vision-preview")]
    OpenAiGpt4v,
    #[serde(rename = "llava-v1.6-34b")]
    LlavaNext,
}

impl VlmProvider {
    /// Provider model identifier.
    pub fn model_id(&self) -> &'static str {
        match self {
            VlmProvider::OpenAiGpt4v => "gpt-4-vision-preview",
            VlmProvider::LlavaNext => "llava-v1.6-34b",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "gpt-4-vision-preview" => Some(VlmProvider::OpenAiGpt4v),
            "llava-v1.6-34b" => Some(VlmProvider::LlavaNext),
            _ => None,
        }
    }
}

impl std::fmt::Display for VlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_id())
    }
}

/// Outcome of one visual audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub is_safe: bool,
    /// 0.0 (clean) to 1.0 (certain leak)
    pub risk_score: f64,
    pub detected_pii: Vec<String>,
    pub reasoning: String,
}

impl AuditResult {
    /// Unsafe result used whenever the VLM answer cannot be trusted.
    pub fn fail_closed(reasoning: &str) -> Self {
        Self {
            is_safe: false,
            risk_score: 1.0,
            detected_pii: vec!["Error".to_string()],
            reasoning: reasoning.to_string(),
        }
    }
}

/// Interpret a chat-completion payload as an audit result.
///
/// Any structural problem yields [`AuditResult::fail_closed`] with
/// [`PARSER_FAILURE`]; this never returns an error.
pub fn parse_vlm_response(response: &serde_json::Value) -> AuditResult {
    match extract_audit(response) {
        Ok(result) => result,
        Err(reason) => {
            tracing::error!(%reason, "Failed to parse VLM response");
            AuditResult::fail_closed(PARSER_FAILURE)
        }
    }
}

fn extract_audit(response: &serde_json::Value) -> Result<AuditResult, String> {
    let content = response
        .pointer("/choices/0/message/content")
        .ok_or("missing choices[0].message.content")?
        .as_str()
        .ok_or("message content is not a string")?;

    // Models sometimes wrap the object in prose or code fences
    let json_start = content.find('{').ok_or("no JSON object found in content")?;
    let json_end = content.rfind('}').ok_or("no closing brace found in content")?;
    if json_end < json_start {
        return Err("closing brace precedes opening brace".into());
    }

    let result: AuditResult =
        serde_json::from_str(&content[json_start..=json_end]).map_err(|e| e.to_string())?;

    if !(0.0..=1.0).contains(&result.risk_score) {
        return Err(format!("risk_score {} outside [0, 1]", result.risk_score));
    }

    Ok(result)
}

/// Visual governance auditor.
///
/// Sends each page image to the configured VLM with [`AUDIT_PROMPT`] and
/// parses the verdict. Shared across request handlers behind an `Arc`.
pub struct VisualPiiAuditor {
    provider: VlmProvider,
    api_key: Option<String>,
    client: Arc<dyn VisionClient>,
}

impl VisualPiiAuditor {
    pub fn new(
        provider: VlmProvider,
        api_key: Option<String>,
        client: Arc<dyn VisionClient>,
    ) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(provider = %provider, "No API key found, running in mock mode");
        }
        Self {
            provider,
            api_key,
            client,
        }
    }

    /// Auditor backed by [`MockVisionClient`].
    pub fn mock(provider: VlmProvider) -> Self {
        Self::new(provider, None, Arc::new(MockVisionClient))
    }

    pub fn provider(&self) -> VlmProvider {
        self.provider
    }

    pub fn is_mock_mode(&self) -> bool {
        self.api_key.is_none()
    }

    /// Audit raw image bytes.
    pub fn audit_image(&self, image_bytes: &[u8]) -> AuditResult {
        let _span = tracing::info_span!(
            "visual_audit",
            model = %self.provider,
            image_size = image_bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let request = VisionRequest {
            model: self.provider.model_id().to_string(),
            prompt: AUDIT_PROMPT.to_string(),
            image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        };

        let result = match self.client.complete(&request) {
            Ok(response) => parse_vlm_response(&response),
            Err(e) => {
                tracing::error!(error = %e, "VLM request failed");
                AuditResult::fail_closed(REQUEST_FAILURE)
            }
        };

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            is_safe = result.is_safe,
            risk_score = result.risk_score,
            issues = result.detected_pii.len(),
            "Visual audit complete"
        );

        result
    }

    /// Audit a document page stored on disk.
    pub fn audit_document(&self, path: impl AsRef<Path>) -> Result<AuditResult, AuditError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Starting visual audit");

        let bytes = std::fs::read(path).map_err(|source| AuditError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(self.audit_image(&bytes))
    }
}

impl std::fmt::Debug for VisualPiiAuditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualPiiAuditor")
            .field("provider", &self.provider)
            .field("mock_mode", &self.is_mock_mode())
            .finish()
    }
}
