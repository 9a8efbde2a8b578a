//! Image intake and editing.

pub mod intake;
mod provider;
pub mod providers;
mod types;

pub use intake::{FileSource, ImageIntake, ImageSource, MemorySource};
pub use provider::ImageEditor;
pub use types::{
    data_url, EditMetadata, EditRequest, EditResult, ImageFormat, UploadedImage,
    FALLBACK_MIME_TYPE,
};
