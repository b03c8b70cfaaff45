//! Bounded, retrying uploads to the media host.

use folio_core::{MediaError, MediaHost, MediaRef, UploadFile};
use std::sync::Arc;
use std::time::Duration;

/// How long one transfer may take and how often a transient failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub timeout: Duration,
    /// Extra attempts after a transient failure. Capped at 1.
    pub retries: u8,
}

impl UploadPolicy {
    pub const MAX_RETRIES: u8 = 1;

    pub fn new(timeout: Duration, retries: u8) -> Self {
        Self { timeout, retries: retries.min(Self::MAX_RETRIES) }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 1)
    }
}

#[derive(Clone)]
pub(crate) struct Uploader {
    host: Arc<dyn MediaHost>,
    policy: UploadPolicy,
}

impl Uploader {
    pub(crate) fn new(host: Arc<dyn MediaHost>, policy: UploadPolicy) -> Self {
        Self { host, policy }
    }

    /// One upload. Timeouts count as transient; rejected files are never retried.
    pub(crate) async fn upload(&self, file: UploadFile) -> Result<MediaRef, MediaError> {
        let attempts = 1 + u32::from(self.policy.retries.min(UploadPolicy::MAX_RETRIES));
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.policy.timeout, self.host.upload(file.clone())).await {
                Ok(result) => result,
                Err(_) => Err(MediaError::Transient(format!(
                    "upload of '{}' timed out after {}s",
                    file.file_name,
                    self.policy.timeout.as_secs_f32()
                ))),
            };

            match outcome {
                Ok(media) => {
                    log::debug!("uploaded '{}' to {}", file.file_name, media.url);
                    return Ok(media);
                }
                Err(err) if err.is_transient() && attempt < attempts => {
                    log::warn!("retrying upload of '{}' after: {}", file.file_name, err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Best-effort removal of files uploaded by an aborted save.
    pub(crate) async fn discard(&self, urls: &[String]) {
        for url in urls {
            if let Err(err) = self.host.delete_by_url(url).await {
                log::warn!("could not discard orphaned upload {}: {}", url, err);
            }
        }
    }

    pub(crate) fn host(&self) -> &Arc<dyn MediaHost> {
        &self.host
    }
}
