//! Image intake: turns a selected or dropped file into an [`UploadedImage`].

use crate::error::{DesignerError, Result};
use crate::image::types::{ImageFormat, UploadedImage, FALLBACK_MIME_TYPE};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A file-like object the user selected or dropped.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Display name of the file.
    fn name(&self) -> &str;

    /// MIME type declared by whoever produced the file, if any.
    fn declared_mime_type(&self) -> Option<&str>;

    /// Reads the full binary content.
    async fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// An image file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    mime_type: Option<String>,
}

impl FileSource {
    /// Creates a source for `path`, with no declared MIME type.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            mime_type: None,
        }
    }

    /// Declares the MIME type instead of detecting it.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Image bytes already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    mime_type: Option<String>,
    data: Vec<u8>,
}

impl MemorySource {
    /// Creates a source from raw bytes.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data,
        }
    }

    /// Declares the MIME type of the bytes.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
impl ImageSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

/// Converts image sources into [`UploadedImage`] values.
///
/// The accepted types (PNG, JPEG, WebP) are only a soft filter by default: other
/// types are logged and ingested anyway. Use [`ImageIntake::strict`] to reject them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageIntake {
    strict: bool,
}

impl ImageIntake {
    /// Creates an intake with the soft type filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects files whose type is not an accepted image type.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads `source` once and builds an [`UploadedImage`] from its content.
    pub async fn ingest<S: ImageSource + ?Sized>(&self, source: &S) -> Result<UploadedImage> {
        let data = source.read().await.map_err(|e| DesignerError::Read {
            name: source.name().to_string(),
            source: e,
        })?;

        let mime_type = resolve_mime_type(source, &data);
        if ImageFormat::from_mime_type(&mime_type).is_none() {
            if self.strict {
                return Err(DesignerError::Validation(format!(
                    "Unsupported image type {mime_type}. Use {}.",
                    ImageFormat::accept_filter()
                )));
            }
            tracing::warn!(
                file = source.name(),
                mime_type = %mime_type,
                "ingesting file outside the accepted image types"
            );
        }

        tracing::debug!(
            file = source.name(),
            mime_type = %mime_type,
            size_bytes = data.len(),
            "image ingested"
        );

        Ok(UploadedImage::from_bytes(source.name(), mime_type, &data))
    }

    /// Ingests the first of several dropped files; the rest are ignored.
    ///
    /// Returns `None` when nothing was dropped.
    pub async fn ingest_dropped<S: ImageSource>(
        &self,
        sources: &[S],
    ) -> Result<Option<UploadedImage>> {
        let Some(first) = sources.first() else {
            return Ok(None);
        };
        if sources.len() > 1 {
            tracing::debug!(
                ignored = sources.len() - 1,
                "multiple files dropped, using the first"
            );
        }
        self.ingest(first).await.map(Some)
    }
}

/// Reads `source` with the default intake settings.
pub async fn ingest<S: ImageSource + ?Sized>(source: &S) -> Result<UploadedImage> {
    ImageIntake::new().ingest(source).await
}

/// Declared type first, then magic bytes, then file extension.
fn resolve_mime_type<S: ImageSource + ?Sized>(source: &S, data: &[u8]) -> String {
    if let Some(declared) = source.declared_mime_type().filter(|m| !m.trim().is_empty()) {
        return declared.to_string();
    }
    ImageFormat::from_magic_bytes(data)
        .or_else(|| {
            Path::new(source.name())
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .map(|f| f.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::data_url;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    struct FailingSource;

    #[async_trait]
    impl ImageSource for FailingSource {
        fn name(&self) -> &str {
            "broken.png"
        }

        fn declared_mime_type(&self) -> Option<&str> {
            Some("image/png")
        }

        async fn read(&self) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "truncated file",
            ))
        }
    }

    #[tokio::test]
    async fn test_ingest_uses_declared_mime_type() {
        let source = MemorySource::new("yard.jpg", PNG_BYTES.to_vec()).with_mime_type("image/jpeg");
        let image = ingest(&source).await.unwrap();

        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.file_name(), "yard.jpg");
        assert!(image.preview().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_ingest_preview_decodes_to_payload() {
        let source = MemorySource::new("yard.png", PNG_BYTES.to_vec()).with_mime_type("image/png");
        let image = ingest(&source).await.unwrap();

        let (mime, preview_bytes) = data_url::decode(image.preview()).unwrap();
        let payload_bytes = data_url::decode_base64(image.encoded_payload()).unwrap();
        assert_eq!(mime, image.mime_type());
        assert_eq!(preview_bytes, payload_bytes);
        assert_eq!(payload_bytes, PNG_BYTES.to_vec());
    }

    #[tokio::test]
    async fn test_ingest_detects_mime_type_when_undeclared() {
        let image = ingest(&MemorySource::new("photo", PNG_BYTES.to_vec()))
            .await
            .unwrap();
        assert_eq!(image.mime_type(), "image/png");

        let image = ingest(&MemorySource::new("photo.webp", vec![0; 4]))
            .await
            .unwrap();
        assert_eq!(image.mime_type(), "image/webp");

        let image = ingest(&MemorySource::new("notes", vec![0; 4]))
            .await
            .unwrap();
        assert_eq!(image.mime_type(), FALLBACK_MIME_TYPE);
    }

    #[tokio::test]
    async fn test_soft_filter_accepts_other_types() {
        let source = MemorySource::new("anim.gif", b"GIF89a".to_vec()).with_mime_type("image/gif");
        let image = ImageIntake::new().ingest(&source).await.unwrap();
        assert_eq!(image.mime_type(), "image/gif");
        assert!(!image.is_accepted_type());
    }

    #[tokio::test]
    async fn test_strict_filter_rejects_other_types() {
        let source = MemorySource::new("anim.gif", b"GIF89a".to_vec()).with_mime_type("image/gif");
        let err = ImageIntake::new()
            .strict(true)
            .ingest(&source)
            .await
            .unwrap_err();
        assert!(matches!(err, DesignerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_read_failure_is_read_error() {
        let err = ingest(&FailingSource).await.unwrap_err();
        match err {
            DesignerError::Read { name, .. } => assert_eq!(name, "broken.png"),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ingest_dropped_uses_first_only() {
        let sources = vec![
            MemorySource::new("first.png", PNG_BYTES.to_vec()),
            MemorySource::new("second.png", vec![9; 16]),
        ];
        let image = ImageIntake::new()
            .ingest_dropped(&sources)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.file_name(), "first.png");

        let none: Vec<MemorySource> = Vec::new();
        assert!(ImageIntake::new().ingest_dropped(&none).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_source_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garden.png");
        std::fs::write(&path, PNG_BYTES).unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.name(), "garden.png");

        let image = ingest(&source).await.unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.size(), PNG_BYTES.len());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let source = FileSource::new("/definitely/not/here.png");
        assert!(matches!(
            ingest(&source).await,
            Err(DesignerError::Read { .. })
        ));
    }
}
