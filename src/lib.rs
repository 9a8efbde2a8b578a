#![warn(missing_docs)]
//! Garden Designer - visualize changes to an outdoor space.
//!
//! Upload a photo, describe the change in plain words, and get back an edited
//! image generated by Gemini.
//!
//! # Quick Start
//!
//! ```no_run
//! use garden_designer::{FileSource, GeminiEditor, SessionController, SessionPhase};
//!
//! #[tokio::main]
//! async fn main() -> garden_designer::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut session = SessionController::new(editor);
//!
//!     session.upload(&FileSource::new("backyard.jpg")).await;
//!     session.set_prompt("Add a small wooden bench under the tree.");
//!
//!     if session.submit().await == SessionPhase::Succeeded {
//!         let path = session.save_result(".").await?;
//!         println!("saved {}", path.display());
//!     } else if let Some(error) = session.state().error {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): Gemini image editor
//! - `cli`: Command-line interface

mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{DesignerError, Result, VALIDATION_MESSAGE};

pub use image::{
    data_url, EditMetadata, EditRequest, EditResult, FileSource, ImageEditor, ImageFormat,
    ImageIntake, ImageSource, MemorySource, UploadedImage,
};
pub use session::{
    download_filename, SessionController, SessionPhase, SessionState, PRESET_PROMPTS,
};

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{DesignerError, Result};
    pub use crate::image::{EditRequest, EditResult, FileSource, ImageEditor, UploadedImage};
    pub use crate::session::{SessionController, SessionPhase, SessionState};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiEditor;
}
