use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::media::{MediaUrls, UPLOADS_PREFIX};

const MAX_EXT_LEN: usize = 10;

/// Metadata returned for every stored file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredUpload {
    /// public URL
    pub url: String,
    pub filename: String,
    pub original_name: Option<String>,
    pub size: usize,
    pub content_type: String,
}

/// Local-disk media store with mime and size checks.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
    allowed_mime: Vec<String>,
    urls: MediaUrls,
}

impl UploadStore {
    pub fn new<P: Into<PathBuf>>(dir: P, max_bytes: usize, allowed_mime: Vec<String>, urls: MediaUrls) -> Self {
        let allowed_mime = allowed_mime.into_iter().map(|m| m.trim().to_ascii_lowercase()).collect();
        Self { dir: dir.into(), max_bytes, allowed_mime, urls }
    }

    pub fn from_config(cfg: &configs::UploadConfig) -> Self {
        Self::new(&cfg.dir, cfg.max_bytes, cfg.allowed_mime.clone(), MediaUrls::new(&cfg.public_base_url))
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn max_bytes(&self) -> usize { self.max_bytes }

    /// Decide the effective mime type: the declared one unless missing or generic,
    /// then a guess from the file name.
    pub fn detect_mime(declared: Option<&str>, original_name: Option<&str>) -> Option<String> {
        let declared = declared
            .and_then(|d| d.split(';').next())
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty() && d != "application/octet-stream");
        declared.or_else(|| {
            original_name
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.essence_str().to_string())
        })
    }

    /// Validate and write one file as `<uuid>.<ext>`.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        declared_mime: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredUpload, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("empty file".into()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::TooLarge { size: bytes.len(), limit: self.max_bytes });
        }
        let mime = Self::detect_mime(declared_mime, original_name)
            .ok_or_else(|| ServiceError::UnsupportedMedia("unknown content type".into()))?;
        if !self.allowed_mime.iter().any(|m| m == &mime) {
            return Err(ServiceError::UnsupportedMedia(mime));
        }

        let original_name = original_name.map(base_name).filter(|n| !n.is_empty());
        let ext = original_name
            .as_deref()
            .and_then(extension_of)
            .or_else(|| extension_for_mime(&mime))
            .unwrap_or_else(|| "bin".to_string());
        let filename = format!("{}.{}", Uuid::new_v4(), ext);

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&filename), bytes).await?;
        info!(%filename, size = bytes.len(), content_type = %mime, "upload_stored");

        Ok(StoredUpload {
            url: self.urls.to_public(&format!("{UPLOADS_PREFIX}{filename}")),
            filename,
            original_name,
            size: bytes.len(),
            content_type: mime,
        })
    }

    /// Delete a stored file by bare name.
    pub async fn delete(&self, filename: &str) -> Result<(), ServiceError> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(%filename, "upload_deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::not_found("file")),
            Err(e) => {
                warn!(%filename, error = %e, "upload_delete_failed");
                Err(e.into())
            }
        }
    }
}

/// A name without directories, traversal or hidden-file prefix.
pub fn validate_filename(name: &str) -> Result<(), ServiceError> {
    let bad = name.is_empty()
        || name.len() > 255
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
        || name.chars().any(char::is_control);
    if bad {
        return Err(ServiceError::Validation(format!("invalid file name '{name}'")));
    }
    Ok(())
}

/// Last path component of a client-supplied file name.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or_default().trim().to_string()
}

fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXT_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn extension_for_mime(mime: &str) -> Option<String> {
    let preferred = match mime {
        "image/jpeg" => Some("jpg"),
        "image/svg+xml" => Some("svg"),
        "image/png" => Some("png"),
        "application/pdf" => Some("pdf"),
        _ => None,
    };
    preferred
        .or_else(|| mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied()))
        .map(str::to_string)
}
