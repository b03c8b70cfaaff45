//! # folio-media-local
//! Local filesystem implementation of `MediaHost`.
//! Every upload gets its own uuid v7 file name, sharded two levels deep by
//! the SHA-256 of its bytes. Identical bytes uploaded twice are two files, so
//! deleting one post's media never touches another's.

use async_trait::async_trait;
use folio_core::{MediaError, MediaHost, MediaKind, MediaRef, UploadFile};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub struct LocalMediaHost {
    /// Root directory for all uploads (e.g., "./uploads")
    root_path: PathBuf,
    /// Public URL prefix the root is served under (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaHost {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self { root_path: root.into(), url_prefix }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// "ab/cd/<uuid>.png", where ab/cd are the first bytes of the content hash.
    fn relative_path(hash: &str, stem: &str, extension: Option<&str>) -> String {
        let name = match extension {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        format!("{}/{}/{}", &hash[0..2], &hash[2..4], name)
    }

    /// Maps one of our URLs back onto the filesystem. Anything outside the
    /// root (or not ours at all) yields `None`.
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let rel = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        let rel = Path::new(rel);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root_path.join(rel))
    }

    async fn write(&self, file: &UploadFile) -> anyhow::Result<String> {
        let hash = hex::encode(Sha256::digest(&file.data));
        let stem = Uuid::now_v7().simple().to_string();
        let rel = Self::relative_path(&hash, &stem, extension_for(file).as_deref());
        let target = self.root_path.join(&rel);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, &file.data).await?;
        log::debug!("stored {} ({} bytes)", rel, file.data.len());
        Ok(format!("{}/{}", self.url_prefix, rel))
    }
}

/// Prefers the uploaded name's extension, then the first one known for the
/// content type.
fn extension_for(file: &UploadFile) -> Option<String> {
    let from_name = Path::new(&file.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(&file.content_type)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

fn is_media_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    ["image/", "video/", "audio/"].iter().any(|prefix| lower.starts_with(prefix))
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn upload(&self, file: UploadFile) -> Result<MediaRef, MediaError> {
        if file.data.is_empty() {
            return Err(MediaError::Rejected(format!("'{}' is empty", file.file_name)));
        }
        if !is_media_type(&file.content_type) {
            return Err(MediaError::Rejected(format!(
                "unsupported content type '{}'",
                file.content_type
            )));
        }

        let kind = MediaKind::from_reported(&file.content_type);
        match self.write(&file).await {
            Ok(url) => Ok(MediaRef::new(url, kind)),
            Err(err) => Err(MediaError::Transient(format!("could not store '{}': {err}", file.file_name))),
        }
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), MediaError> {
        let Some(path) = self.path_for_url(url) else {
            return Err(MediaError::Rejected(format!("{url} is not a local media URL")));
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MediaError::Transient(err.to_string())),
        }
    }
}
