//! Core types for image intake and editing.

use crate::error::{DesignerError, Result, VALIDATION_MESSAGE};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME type used when a file declares none and cannot be detected.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Image formats accepted by the upload surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// All accepted formats, in the order the upload surface advertises them.
    pub const ACCEPTED: [ImageFormat; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Looks up an accepted format by MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Returns the `accept` filter string for a file picker.
    pub fn accept_filter() -> String {
        Self::ACCEPTED
            .iter()
            .map(|f| f.mime_type())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Data URI helpers.
pub mod data_url {
    use super::*;

    /// Builds a `data:<mime>;base64,<payload>` URI from raw bytes.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        from_base64(mime_type, &base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Builds a data URI from an already encoded payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> String {
        format!("data:{};base64,{}", mime_type, payload)
    }

    /// Splits a base64 data URI into its MIME type and decoded bytes.
    pub fn decode(uri: &str) -> Result<(String, Vec<u8>)> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| DesignerError::Decode("not a data URI".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| DesignerError::Decode("data URI is not base64".into()))?;
        let bytes = decode_base64(payload)?;
        Ok((mime_type.to_string(), bytes))
    }

    /// Decodes a base64 payload, tolerating embedded whitespace and missing padding.
    pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
        let cleaned: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
            return Ok(data);
        }

        base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(&cleaned)
            .map_err(|e| DesignerError::Decode(e.to_string()))
    }
}

/// A user-supplied image, encoded for transport and preview.
///
/// Built only by intake; the payload and preview always come from the same read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    file_name: String,
    encoded_payload: String,
    mime_type: String,
    preview: String,
}

impl UploadedImage {
    /// Encodes `bytes` once and derives both the payload and the preview from it.
    pub(crate) fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        let mime_type = mime_type.into();
        let encoded_payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        let preview = data_url::from_base64(&mime_type, &encoded_payload);
        Self {
            file_name: file_name.into(),
            encoded_payload,
            mime_type,
            preview,
        }
    }

    /// Name of the file the image came from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Base64 encoded image content.
    pub fn encoded_payload(&self) -> &str {
        &self.encoded_payload
    }

    /// MIME type declared for (or detected from) the file.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Data URI suitable for on-screen preview.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Returns true if the MIME type is one the upload surface advertises.
    pub fn is_accepted_type(&self) -> bool {
        ImageFormat::from_mime_type(&self.mime_type).is_some()
    }

    /// Size of the decoded image in bytes.
    pub fn size(&self) -> usize {
        // base64 expands every 3 bytes into 4 characters
        let padding = self.encoded_payload.bytes().rev().take_while(|b| *b == b'=').count();
        self.encoded_payload.len() / 4 * 3 - padding
    }
}

/// A validated request to edit an image with a text instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    encoded_payload: String,
    mime_type: String,
    prompt: String,
}

impl EditRequest {
    /// Builds a request from an uploaded image and prompt.
    ///
    /// Fails with a validation error if the image is missing or the prompt is blank.
    pub fn new(image: Option<&UploadedImage>, prompt: &str) -> Result<Self> {
        let image = image.ok_or_else(|| DesignerError::Validation(VALIDATION_MESSAGE.into()))?;
        Self::from_parts(image.encoded_payload(), image.mime_type(), prompt)
    }

    /// Builds a request from an already encoded payload.
    ///
    /// An empty payload is a present (zero-byte) image and is passed through.
    pub fn from_parts(
        encoded_payload: impl Into<String>,
        mime_type: impl Into<String>,
        prompt: &str,
    ) -> Result<Self> {
        if prompt.trim().is_empty() {
            return Err(DesignerError::Validation(VALIDATION_MESSAGE.into()));
        }
        Ok(Self {
            encoded_payload: encoded_payload.into(),
            mime_type: mime_type.into(),
            prompt: prompt.to_string(),
        })
    }

    /// Base64 image payload.
    pub fn encoded_payload(&self) -> &str {
        &self.encoded_payload
    }

    /// MIME type of the payload.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Instruction text, as typed.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Metadata about the generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A generated image, kept as the base64 payload the service returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "edit result should be displayed or saved"]
pub struct EditResult {
    /// Base64 encoded PNG bytes.
    pub encoded_payload: String,
    /// Generation metadata.
    pub metadata: EditMetadata,
}

impl EditResult {
    /// MIME type results are displayed and exported as.
    pub const MIME_TYPE: &'static str = "image/png";

    /// Creates a result from a base64 payload.
    pub fn new(encoded_payload: impl Into<String>) -> Self {
        Self {
            encoded_payload: encoded_payload.into(),
            metadata: EditMetadata::default(),
        }
    }

    /// Attaches generation metadata.
    pub fn with_metadata(mut self, metadata: EditMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the image as a PNG data URL.
    pub fn to_data_url(&self) -> String {
        data_url::from_base64(Self::MIME_TYPE, &self.encoded_payload)
    }

    /// Decodes the payload to raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        data_url::decode_base64(&self.encoded_payload)
    }
}
