//! Vision-language model client seam.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::MOCK_AUDIT_CONTENT;

/// VLM transport errors.
#[derive(Error, Debug)]
pub enum VlmError {
    #[error("VLM request failed: {0}")]
    Request(String),

    #[error("Unexpected VLM status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A single image + prompt request in chat-completion form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Provider model identifier
    pub model: String,
    pub prompt: String,
    /// Base64-encoded page image
    pub image_base64: String,
}

/// Sends audit requests to a vision-language model.
///
/// Returns the raw chat-completion payload; interpretation happens in
/// `parse_vlm_response`. Implementations must be thread-safe so one client
/// can be shared by all request handlers.
pub trait VisionClient: Send + Sync {
    fn complete(&self, request: &VisionRequest) -> Result<serde_json::Value, VlmError>;
}

/// Client that answers every request with a canned "unsafe" payload.
#[derive(Debug, Clone, Default)]
pub struct MockVisionClient;

impl VisionClient for MockVisionClient {
    fn complete(&self, request: &VisionRequest) -> Result<serde_json::Value, VlmError> {
        tracing::info!(model = %request.model, "Sending request to mock VLM");
        Ok(chat_completion(MOCK_AUDIT_CONTENT))
    }
}

/// Wrap message content in the `choices[0].message.content` envelope.
pub fn chat_completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            { "message": { "content": content } }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_client_returns_envelope() {
        let request = VisionRequest {
            model: "llava-v1.6-34b".into(),
            prompt: "prompt".into(),
            image_base64: "aW1n".into(),
        };
        let response = MockVisionClient.complete(&request).unwrap();
        let content = response["choices"][0]["message"]["content"].as_str().unwrap();
        assert!(content.contains("Sarah Jones"));
    }

    #[test]
    fn test_client_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn VisionClient>();
    }
}
