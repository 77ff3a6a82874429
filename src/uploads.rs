use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::fs;
use uuid::Uuid;

const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug)]
pub enum UploadError {
    TooLarge,
    UnsupportedType,
    InvalidPayload,
    Io(std::io::Error),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "image too large"),
            Self::UnsupportedType => write!(f, "unsupported image type"),
            Self::InvalidPayload => write!(f, "invalid image payload"),
            Self::Io(err) => write!(f, "image storage failed: {err}"),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Splits a `data:image/...;base64,` payload into mime type and raw bytes.
pub fn parse_data_uri(payload: &str) -> Result<(String, Vec<u8>), UploadError> {
    let rest = payload
        .strip_prefix("data:")
        .ok_or(UploadError::InvalidPayload)?;
    let (mime, encoded) = rest
        .split_once(";base64,")
        .ok_or(UploadError::InvalidPayload)?;

    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(UploadError::UnsupportedType);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| UploadError::InvalidPayload)?;
    if bytes.is_empty() {
        return Err(UploadError::InvalidPayload);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(UploadError::TooLarge);
    }

    Ok((mime.to_owned(), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Object storage for message images. Commit happens before the message row
/// is written; `remove` is the compensating path when that write fails.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Commits image bytes, returning the permanent reference URL.
    async fn store(&self, data: &[u8], mime: &str) -> Result<String, UploadError>;

    /// Best-effort removal of a previously stored image. Failures are logged
    /// and swallowed.
    async fn remove(&self, url: &str);
}

/// Local-disk store serving committed images under `base_url`.
pub struct DiskImageStore {
    root: PathBuf,
    base_url: String,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn store(&self, data: &[u8], mime: &str) -> Result<String, UploadError> {
        fs::create_dir_all(&self.root).await?;

        let filename = format!("{}.{}", Uuid::now_v7().simple(), extension_for(mime));
        fs::write(self.root.join(&filename), data).await?;

        Ok(format!("{}/{}", self.base_url, filename))
    }

    async fn remove(&self, url: &str) {
        let filename = url.rsplit('/').next().unwrap_or_default();
        if filename.is_empty() || filename.contains("..") {
            return;
        }
        if let Err(err) = fs::remove_file(self.root.join(filename)).await {
            tracing::debug!(url, "orphan image cleanup failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn png_data_uri() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES))
    }

    #[test]
    fn parses_valid_data_uri() {
        let (mime, bytes) = parse_data_uri(&png_data_uri()).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, PNG_BYTES);
    }

    #[test]
    fn rejects_payload_without_data_prefix() {
        assert!(matches!(
            parse_data_uri("image/png;base64,aGk="),
            Err(UploadError::InvalidPayload)
        ));
    }

    #[test]
    fn rejects_unsupported_mime_type() {
        assert!(matches!(
            parse_data_uri("data:application/pdf;base64,aGk="),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn rejects_garbage_base64() {
        assert!(matches!(
            parse_data_uri("data:image/png;base64,@@not-base64@@"),
            Err(UploadError::InvalidPayload)
        ));
    }

    #[test]
    fn rejects_oversized_image() {
        let huge = STANDARD.encode(vec![0u8; MAX_IMAGE_SIZE + 1]);
        let payload = format!("data:image/png;base64,{huge}");
        assert!(matches!(
            parse_data_uri(&payload),
            Err(UploadError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn disk_store_writes_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path(), "/uploads");

        let url = store.store(PNG_BYTES, "image/png").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let filename = url.rsplit('/').next().unwrap();
        let path = dir.path().join(filename);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG_BYTES);

        store.remove(&url).await;
        assert!(!path.exists());
    }
}
