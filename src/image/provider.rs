//! Image editor trait.

use crate::error::Result;
use crate::image::types::{EditRequest, EditResult};
use async_trait::async_trait;

/// A remote service that edits an image according to a text instruction.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Edits the image in `request` and returns the generated image payload.
    async fn edit_image(&self, request: &EditRequest) -> Result<EditResult>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}

