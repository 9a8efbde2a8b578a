//! Error types for garden design sessions.

/// Message shown when an edit is submitted without an image or prompt.
pub const VALIDATION_MESSAGE: &str = "Please upload an image and enter a prompt.";

/// Maximum length of a service message carried in an error.
const MAX_MESSAGE_LEN: usize = 500;

/// Errors that can occur while ingesting, editing or exporting an image.
#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    /// Missing image or blank prompt. Raised before any network activity.
    #[error("{0}")]
    Validation(String),

    /// The selected file could not be read.
    #[error("failed to read image {name}: {source}")]
    Read {
        /// Display name of the file.
        name: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The service answered but the response carried no image part.
    #[error("Failed to edit image: API did not return an image. Please try a different prompt.")]
    NoImageReturned {
        /// Block or finish reason reported by the service, if any.
        reason: Option<String>,
    },

    /// The call to the generation service failed.
    #[error("Failed to edit image: {message}")]
    Service {
        /// HTTP status, when the service answered.
        status: Option<u16>,
        /// Message reported by the service or transport.
        message: String,
    },

    /// A failure that carried no descriptive message.
    #[error("An unknown error occurred while editing the image.")]
    Unknown,

    /// I/O error while saving a result.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A result payload could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),
}

impl DesignerError {
    /// Builds a `Service` error, or `Unknown` when the message is empty.
    pub fn service(status: Option<u16>, message: &str) -> Self {
        let message = sanitize_error_message(message);
        if message.is_empty() {
            return Self::Unknown;
        }
        Self::Service { status, message }
    }

    /// Returns true for the errors produced by the generation client.
    pub fn is_edit_failure(&self) -> bool {
        matches!(
            self,
            Self::NoImageReturned { .. } | Self::Service { .. } | Self::Unknown
        )
    }
}

impl From<reqwest::Error> for DesignerError {
    fn from(err: reqwest::Error) -> Self {
        Self::service(err.status().map(|s| s.as_u16()), &err.to_string())
    }
}

/// Collapses whitespace and caps the length of a message from the service.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_MESSAGE_LEN {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Result type alias for garden design operations.
pub type Result<T> = std::result::Result<T, DesignerError>;
