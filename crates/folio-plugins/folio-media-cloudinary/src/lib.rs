//! # folio-media-cloudinary
//!
//! `MediaHost` backed by Cloudinary's HTTP API. Uploads go through an
//! unsigned upload preset; deletion needs the API key and secret and is
//! signed with SHA-256.

use async_trait::async_trait;
use folio_core::{MediaError, MediaHost, MediaKind, MediaRef, UploadFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

const API_BASE: &str = "https://api.cloudinary.com";

pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
}

pub struct CloudinaryMediaHost {
    config: CloudinaryConfig,
    api_base: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    resource_type: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryMediaHost {
    /// `timeout` bounds each HTTP call; the upload policy above this adds
    /// its own per-attempt limit.
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, api_base: API_BASE.to_string(), client })
    }

    /// Points the client somewhere other than the public API.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, resource: &str, action: &str) -> String {
        format!("{}/v1_1/{}/{}/{}", self.api_base, self.config.cloud_name, resource, action)
    }
}

/// The asset id inside a delivery URL: everything after `/upload/`, minus a
/// leading version segment (`v1712345678/`) and the file extension.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, after) = url.split_once("/upload/")?;
    let after = after.split(['?', '#']).next().unwrap_or(after);

    let without_version = match after.split_once('/') {
        Some((first, rest))
            if first.len() > 1
                && first.starts_with('v')
                && first[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => after,
    };

    let id = match without_version.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => without_version,
    };
    (!id.is_empty()).then(|| id.to_string())
}

/// `image`, `video` or `raw`, read from the segment before `/upload/`.
fn resource_type_from_url(url: &str) -> &'static str {
    let before = url.split_once("/upload/").map(|(b, _)| b).unwrap_or_default();
    match before.rsplit('/').next() {
        Some("video") => "video",
        Some("raw") => "raw",
        _ => "image",
    }
}

/// Hex SHA-256 over the sorted parameters followed by the secret.
pub fn sign(public_id: &str, timestamp: i64, secret: &str) -> String {
    let payload = format!("public_id={public_id}&timestamp={timestamp}{secret}");
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// The host reports audio as `video`; the uploaded file's own type breaks the tie.
fn reported_kind(resource_type: &str, file_kind: MediaKind) -> MediaKind {
    match MediaKind::from_reported(resource_type) {
        MediaKind::Video if file_kind == MediaKind::Audio => MediaKind::Audio,
        kind => kind,
    }
}

fn transport_error(err: reqwest::Error) -> MediaError {
    MediaError::Transient(err.to_string())
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> MediaError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        MediaError::Transient(format!("{status}: {message}"))
    } else {
        MediaError::Rejected(format!("{status}: {message}"))
    }
}

#[async_trait]
impl MediaHost for CloudinaryMediaHost {
    async fn upload(&self, file: UploadFile) -> Result<MediaRef, MediaError> {
        let file_kind = file.kind();
        let part = Part::bytes(file.data.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| MediaError::Rejected(format!("bad content type: {e}")))?;
        let form = Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body: UploadResponse = response.json().await.map_err(transport_error)?;
        log::debug!("cloudinary stored '{}' as {}", file.file_name, body.secure_url);
        Ok(MediaRef::new(body.secure_url, reported_kind(&body.resource_type, file_kind)))
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), MediaError> {
        let (Some(api_key), Some(api_secret)) = (&self.config.api_key, &self.config.api_secret)
        else {
            return Err(MediaError::Rejected("delete needs media.api_key and media.api_secret".into()));
        };
        let public_id = public_id_from_url(url)
            .ok_or_else(|| MediaError::Rejected(format!("no public id in {url}")))?;

        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign(&public_id, timestamp, api_secret.expose_secret());
        let params = [
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.to_string()),
            ("api_key", api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let response = self
            .client
            .post(self.endpoint(resource_type_from_url(url), "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body: DestroyResponse = response.json().await.map_err(transport_error)?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected(format!("destroy of {public_id} returned '{other}'"))),
        }
    }
}
