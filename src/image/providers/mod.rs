//! Image editing providers.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel, API_KEY_ENV_VARS};
