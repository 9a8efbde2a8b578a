//! Gemini (Google) image editor.

use crate::error::{DesignerError, Result};
use crate::image::provider::ImageEditor;
use crate::image::types::{EditMetadata, EditRequest, EditResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GOOGLE_API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image.
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (preview).
    ProImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for GeminiEditor.
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `API_KEY`, then `GOOGLE_API_KEY` env vars.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the service endpoint (scheme and host).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bounds each request. Without it the transport default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the editor.
    ///
    /// A missing API key is not an error here; the first edit call reports it.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self.api_key.or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        });

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(GeminiEditor {
            client: client.build()?,
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Image editor backed by the Gemini `generateContent` endpoint.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        )
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<EditResult> {
        let start = Instant::now();

        let api_key = self.api_key.as_deref().ok_or_else(|| DesignerError::Service {
            status: None,
            message: format!(
                "API key not configured. Set {}.",
                API_KEY_ENV_VARS.join(" or ")
            ),
        })?;

        let body = GeminiRequest::from_edit_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = request.mime_type(),
            "sending image edit request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
            DesignerError::service(Some(status.as_u16()), &format!("invalid response: {e}"))
        })?;

        let encoded_payload = gemini_response.into_image_payload()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(duration_ms, "image edit complete");

        Ok(EditResult::new(encoded_payload).with_metadata(EditMetadata {
            model: Some(self.model.as_str().to_string()),
            duration_ms: Some(duration_ms),
        }))
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit_image(&self, request: &EditRequest) -> Result<EditResult> {
        self.edit_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Maps an error response to a service error, preferring the JSON `error.message`.
fn parse_error(status: u16, text: &str) -> DesignerError {
    let message = serde_json::from_str::<GeminiErrorResponse>(text)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| text.to_string());
    DesignerError::service(Some(status), &message)
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        // Image first, then the instruction
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.mime_type().to_string(),
                    data: req.encoded_payload().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: req.prompt().to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    /// Extracts the first inline image of the first candidate.
    ///
    /// Text parts ahead of the image are skipped rather than treated as a
    /// refusal; only parts of the first candidate are searched.
    fn into_image_payload(self) -> Result<String> {
        let block_reason = self.prompt_feedback.and_then(|f| {
            f.block_reason_message.or(f.block_reason)
        });

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(no_image(block_reason));
        };

        let finish_reason = candidate.finish_reason;
        candidate
            .content
            .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
            .map(|inline| inline.data)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| no_image(block_reason.or(finish_reason)))
    }
}

fn no_image(reason: Option<String>) -> DesignerError {
    tracing::warn!(reason = ?reason, "response contained no image");
    DesignerError::NoImageReturned { reason }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
}
