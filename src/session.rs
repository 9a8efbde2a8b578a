//! Session controller: owns the state of one design session and sequences
//! image intake and image editing in response to user actions.
//!
//! State is published through a [`tokio::sync::watch`] channel. Presentation
//! layers call [`SessionController::subscribe`] and render each snapshot.

use crate::error::{DesignerError, Result};
use crate::image::{
    EditRequest, EditResult, ImageEditor, ImageIntake, ImageSource, UploadedImage,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Example prompts offered next to the prompt box.
pub const PRESET_PROMPTS: [&str; 6] = [
    "Add a stone pathway through the middle.",
    "Fill the garden with colorful wildflowers.",
    "Add a small wooden bench under the tree.",
    "Make it a Japanese zen garden.",
    "Add a retro film filter.",
    "Remove the lawn chair.",
];

const FILENAME_PREFIX: &str = "garden_design_";
const FILENAME_PROMPT_LEN: usize = 30;

/// Where the session is in the upload → submit → result cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing uploaded yet.
    #[default]
    Idle,
    /// An image is loaded and no edit has been attempted since.
    ImageLoaded,
    /// An edit request is in flight.
    Submitting,
    /// The last edit produced an image.
    Succeeded,
    /// The last edit failed.
    Failed,
}

/// Everything a presentation layer needs to render the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Current uploaded image.
    pub image: Option<UploadedImage>,
    /// Result of the last successful edit.
    pub result: Option<EditResult>,
    /// Current prompt text.
    pub prompt: String,
    /// True while an edit request is in flight.
    pub is_loading: bool,
    /// Message of the last error.
    pub error: Option<String>,
    /// Current phase.
    pub phase: SessionPhase,
}

impl SessionState {
    /// Mirrors the enabled state of the submit control.
    pub fn can_submit(&self) -> bool {
        !self.is_loading && self.image.is_some() && !self.prompt.trim().is_empty()
    }

    /// Preview of the uploaded image, if any.
    pub fn preview_url(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.preview())
    }

    /// The edited image as a PNG data URL, if any.
    pub fn result_data_url(&self) -> Option<String> {
        self.result.as_ref().map(EditResult::to_data_url)
    }

    /// Suggested file name for downloading the result.
    pub fn download_filename(&self) -> String {
        download_filename(&self.prompt)
    }
}

/// Derives a download file name from a prompt.
///
/// Every UTF-16 unit that is not an ASCII letter or digit becomes `_`, the rest
/// is lowercased, and the first 30 units are kept.
pub fn download_filename(prompt: &str) -> String {
    let sanitized: String = prompt
        .encode_utf16()
        .take(FILENAME_PROMPT_LEN)
        .map(|unit| match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect();
    format!("{FILENAME_PREFIX}{sanitized}.png")
}

/// Owns a [`SessionState`] and drives it with an [`ImageEditor`].
///
/// Mutating operations take `&mut self`, so one controller never has two edit
/// requests in flight.
pub struct SessionController<E> {
    editor: E,
    intake: ImageIntake,
    state: watch::Sender<SessionState>,
}

impl<E: ImageEditor> SessionController<E> {
    /// Creates an idle session that edits images with `editor`.
    pub fn new(editor: E) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            editor,
            intake: ImageIntake::new(),
            state,
        }
    }

    /// Replaces the intake settings (e.g. to enable strict type checks).
    pub fn with_intake(mut self, intake: ImageIntake) -> Self {
        self.intake = intake;
        self
    }

    /// Returns the editor backing this session.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Sets the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.state.send_modify(|s| s.prompt = prompt);
    }

    /// Replaces the prompt with one of [`PRESET_PROMPTS`].
    pub fn use_preset(&mut self, index: usize) -> Result<()> {
        let preset = PRESET_PROMPTS.get(index).ok_or_else(|| {
            DesignerError::Validation(format!(
                "No preset prompt {index}; choose 0 to {}.",
                PRESET_PROMPTS.len() - 1
            ))
        })?;
        self.set_prompt(*preset);
        Ok(())
    }

    /// Loads a selected file as the session image.
    ///
    /// A new image clears any previous result and error. If the file cannot be
    /// read, only the error message changes.
    pub async fn upload<S: ImageSource + ?Sized>(&mut self, source: &S) -> SessionPhase {
        let outcome = self.intake.ingest(source).await;
        self.apply_upload(outcome.map(Some))
    }

    /// Loads the first of several dropped files.
    pub async fn upload_dropped<S: ImageSource>(&mut self, sources: &[S]) -> SessionPhase {
        let outcome = self.intake.ingest_dropped(sources).await;
        self.apply_upload(outcome)
    }

    fn apply_upload(&mut self, outcome: Result<Option<UploadedImage>>) -> SessionPhase {
        match outcome {
            Ok(Some(image)) => {
                tracing::info!(file = image.file_name(), "image uploaded");
                self.state.send_modify(|s| {
                    s.image = Some(image);
                    s.result = None;
                    s.error = None;
                    s.phase = SessionPhase::ImageLoaded;
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("upload failed: {e}");
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
        self.state.borrow().phase
    }

    /// Submits the current image and prompt for editing.
    ///
    /// Without an image or with a blank prompt, only the error message is set and
    /// the editor is not called. Otherwise publishes the loading state, awaits the
    /// editor, and publishes the result or error.
    pub async fn submit(&mut self) -> SessionPhase {
        let is_loading = self.state.borrow().is_loading;
        if is_loading {
            tracing::warn!("edit already in flight, ignoring submit");
            return SessionPhase::Submitting;
        }

        let request = {
            let state = self.state.borrow();
            EditRequest::new(state.image.as_ref(), &state.prompt)
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
                return self.state.borrow().phase;
            }
        };

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
            s.result = None;
            s.phase = SessionPhase::Submitting;
        });

        tracing::info!(editor = self.editor.name(), "submitting image edit");
        let outcome = self.editor.edit_image(&request).await;

        self.state.send_modify(|s| {
            s.is_loading = false;
            match outcome {
                Ok(result) => {
                    s.result = Some(result);
                    s.phase = SessionPhase::Succeeded;
                }
                Err(e) => {
                    tracing::warn!("image edit failed: {e}");
                    s.error = Some(e.to_string());
                    s.phase = SessionPhase::Failed;
                }
            }
        });
        self.state.borrow().phase
    }

    /// Writes the edited image into `dir` under [`download_filename`].
    pub async fn save_result(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let (bytes, file_name) = {
            let state = self.state.borrow();
            let result = state
                .result
                .as_ref()
                .ok_or_else(|| DesignerError::Validation("No edited image to save.".into()))?;
            (result.decode()?, state.download_filename())
        };

        let path = dir.as_ref().join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(path = %path.display(), size_bytes = bytes.len(), "edited image saved");
        Ok(path)
    }
}
