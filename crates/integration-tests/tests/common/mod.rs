#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::web;
use folio_api::{AppState, SessionSettings};
use folio_auth_simple::SharedSecretAuth;
use folio_core::{MockMailer, PostSchema};
use folio_db_sqlite::SqliteDocumentStore;
use folio_media_local::LocalMediaHost;
use folio_services::UploadPolicy;
use secrecy::SecretString;
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse";
pub const BOUNDARY: &str = "----folio-test-boundary";

/// A fully wired app state over an in-memory store and a scratch media dir.
pub struct Harness {
    pub state: web::Data<AppState>,
    pub store: Arc<SqliteDocumentStore>,
    pub media_root: TempDir,
}

pub async fn harness(schema: PostSchema, mailer: MockMailer) -> Harness {
    let store = Arc::new(SqliteDocumentStore::new("sqlite::memory:").await.unwrap());
    let media_root = tempfile::tempdir().unwrap();
    let media = Arc::new(LocalMediaHost::new(media_root.path(), "/media"));
    let secret = SecretString::from(PASSWORD.to_string());

    let state = web::Data::new(AppState::new(
        store.clone(),
        media,
        Arc::new(mailer),
        Arc::new(SharedSecretAuth::new(Some(&secret))),
        schema,
        UploadPolicy::default(),
        SessionSettings::default(),
    ));
    Harness { state, store, media_root }
}

pub fn admin_cookie() -> Cookie<'static> {
    Cookie::new(folio_api::middleware::ADMIN_COOKIE, "true")
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File { name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8] },
}

/// Encodes parts as `multipart/form-data`; returns the content type and body.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File { name, file_name, content_type, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
