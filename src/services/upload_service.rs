//! On-disk storage for images and contact attachments.
//!
//! Files land in `<root>/<kindergarten_id>/<folder>/<uuid><ext>` and are
//! referenced by their public path `<prefix>/<kindergarten_id>/<folder>/<uuid><ext>`,
//! which is what the content tables store.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];
pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/bmp"];
pub const ATTACHMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "doc", "docx"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("File exceeds the maximum size of {} MB", limit / (1024 * 1024))]
    TooLarge { limit: usize },

    #[error("File type '.{0}' is not allowed")]
    ExtensionNotAllowed(String),

    #[error("Content type '{0}' is not allowed")]
    MimeNotAllowed(String),

    #[error("File content does not match its extension")]
    ContentMismatch,

    #[error("Invalid upload path")]
    InvalidPath,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Attachment,
}

impl UploadKind {
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => IMAGE_EXTENSIONS,
            UploadKind::Attachment => ATTACHMENT_EXTENSIONS,
        }
    }

    fn max_bytes(&self) -> usize {
        let uploads = &config::config().uploads;
        match self {
            UploadKind::Image => uploads.max_image_bytes,
            UploadKind::Attachment => uploads.max_attachment_bytes,
        }
    }
}

/// A file read from a multipart field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// File name without directory or extension, used as a default title.
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Keep `[A-Za-z0-9_-]`; anything else is dropped. Empty becomes `general`.
pub fn sanitize_folder(folder: &str) -> String {
    let clean: String = folder
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if clean.is_empty() {
        "general".to_string()
    } else {
        clean
    }
}

fn matches_image_signature(extension: &str, bytes: &[u8]) -> bool {
    match extension {
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "png" => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "gif" => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        "bmp" => bytes.starts_with(b"BM"),
        _ => false,
    }
}

/// Check size, extension, declared MIME type and (for images) the file
/// signature. Returns the normalized extension.
pub fn validate(file: &UploadedFile, kind: UploadKind) -> Result<String, UploadError> {
    if file.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    let limit = kind.max_bytes();
    if file.bytes.len() > limit {
        return Err(UploadError::TooLarge { limit });
    }

    let extension = file.extension();
    if !kind.extensions().contains(&extension.as_str()) {
        return Err(UploadError::ExtensionNotAllowed(extension));
    }

    if kind == UploadKind::Image {
        let mime = file
            .content_type
            .as_deref()
            .map(|mime| mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_MIME_TYPES.contains(&mime.as_str()) {
            return Err(UploadError::MimeNotAllowed(if mime.is_empty() { "none".to_string() } else { mime }));
        }
        if !matches_image_signature(&extension, &file.bytes) {
            return Err(UploadError::ContentMismatch);
        }
    }

    Ok(extension)
}

#[derive(Debug, Clone)]
pub struct UploadService {
    root: PathBuf,
    public_prefix: String,
}

impl UploadService {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config() -> Self {
        let uploads = &config::config().uploads;
        Self::new(&uploads.root, &uploads.public_prefix)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_image(&self, kindergarten_id: i32, folder: &str, file: &UploadedFile) -> Result<String, UploadError> {
        self.save(kindergarten_id, folder, file, UploadKind::Image).await
    }

    pub async fn save_attachment(&self, kindergarten_id: i32, file: &UploadedFile) -> Result<String, UploadError> {
        self.save(kindergarten_id, "contacts", file, UploadKind::Attachment).await
    }

    /// Validate and write the file, returning its public path.
    pub async fn save(
        &self,
        kindergarten_id: i32,
        folder: &str,
        file: &UploadedFile,
        kind: UploadKind,
    ) -> Result<String, UploadError> {
        let extension = validate(file, kind)?;
        let folder = sanitize_folder(folder);
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(kindergarten_id.to_string()).join(&folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &file.bytes).await?;

        let public_path = format!("{}/{}/{}/{}", self.public_prefix, kindergarten_id, folder, file_name);
        debug!("Stored upload '{}' ({} bytes) at {}", file.file_name, file.bytes.len(), public_path);
        Ok(public_path)
    }

    /// Map a public path back to a location under the uploads root.
    pub fn resolve(&self, public_path: &str) -> Result<PathBuf, UploadError> {
        let relative = public_path
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or(UploadError::InvalidPath)?;

        let relative = Path::new(relative);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(UploadError::InvalidPath);
        }
        Ok(self.root.join(relative))
    }

    /// Remove a stored file. Missing files are not an error.
    pub async fn delete(&self, public_path: &str) -> Result<bool, UploadError> {
        let path = self.resolve(public_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted upload {}", public_path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete without surfacing failures; used when a record is already gone.
    pub async fn discard(&self, public_path: Option<&str>) {
        let Some(path) = public_path.filter(|p| !p.is_empty()) else {
            return;
        };
        if let Err(e) = self.delete(path).await {
            warn!("Failed to delete upload {}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn file(name: &str, mime: Option<&str>, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            field: "image".to_string(),
            file_name: name.to_string(),
            content_type: mime.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    fn temp_service() -> UploadService {
        let root = std::env::temp_dir().join(format!("kinder-uploads-{}", Uuid::new_v4()));
        UploadService::new(root, "/uploads")
    }

    #[test]
    fn sanitizes_folder_names() {
        assert_eq!(sanitize_folder("gallery"), "gallery");
        assert_eq!(sanitize_folder("../etc"), "etc");
        assert_eq!(sanitize_folder("a/b c"), "abc");
        assert_eq!(sanitize_folder("../"), "general");
    }

    #[test]
    fn validates_images() {
        assert_eq!(validate(&file("Photo.PNG", Some("image/png"), PNG), UploadKind::Image).unwrap(), "png");
        assert!(matches!(
            validate(&file("x.svg", Some("image/svg+xml"), b"<svg/>"), UploadKind::Image),
            Err(UploadError::ExtensionNotAllowed(_))
        ));
        assert!(matches!(
            validate(&file("x.png", Some("text/html"), PNG), UploadKind::Image),
            Err(UploadError::MimeNotAllowed(_))
        ));
        assert!(matches!(
            validate(&file("x.png", Some("image/png"), b"<html>"), UploadKind::Image),
            Err(UploadError::ContentMismatch)
        ));
        assert!(matches!(validate(&file("x.png", None, b""), UploadKind::Image), Err(UploadError::EmptyFile)));
        assert!(matches!(
            validate(&file("x.png", None, PNG), UploadKind::Image),
            Err(UploadError::MimeNotAllowed(mime)) if mime == "none"
        ));
        assert_eq!(validate(&file("x.png", Some("image/PNG; q=1"), PNG), UploadKind::Image).unwrap(), "png");
    }

    #[test]
    fn rejects_oversized_images() {
        let mut bytes = PNG.to_vec();
        bytes.resize(config::config().uploads.max_image_bytes + 1, 0);
        assert!(matches!(
            validate(&file("big.png", Some("image/png"), &bytes), UploadKind::Image),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[test]
    fn attachments_allow_documents() {
        assert_eq!(validate(&file("cv.pdf", Some("application/pdf"), b"%PDF-1.4"), UploadKind::Attachment).unwrap(), "pdf");
        assert!(validate(&file("run.exe", None, b"MZ"), UploadKind::Attachment).is_err());
    }

    #[test]
    fn resolve_rejects_traversal() {
        let service = temp_service();
        assert!(service.resolve("/uploads/3/gallery/a.png").is_ok());
        assert!(service.resolve("/uploads/../secret").is_err());
        assert!(service.resolve("/etc/passwd").is_err());
        assert!(service.resolve("/uploadsX/3/a.png").is_err());
    }

    #[tokio::test]
    async fn saves_and_deletes_under_tenant_folder() {
        let service = temp_service();
        let path = service.save_image(4, "gallery", &file("a.png", Some("image/png"), PNG)).await.unwrap();
        assert!(path.starts_with("/uploads/4/gallery/"));
        assert!(path.ends_with(".png"));

        let on_disk = service.resolve(&path).unwrap();
        assert!(on_disk.exists());
        assert!(service.delete(&path).await.unwrap());
        assert!(!service.delete(&path).await.unwrap());

        let _ = std::fs::remove_dir_all(service.root());
    }
}
