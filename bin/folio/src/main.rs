//! # Folio Binary
//!
//! The entry point that assembles the application from configuration and
//! compile-time features.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use async_trait::async_trait;
use folio_api::middleware::{cors_policy, standard_middleware};
use folio_api::{configure_routes, AppState, SessionSettings};
use folio_config::{MediaBackend, Settings};
use folio_core::{AdminAuth, AppError, ContactMessage, DocumentStore, Mailer, MediaHost};
use folio_services::UploadPolicy;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("enable a document store feature, e.g. `db-sqlite`");

#[cfg(not(feature = "auth-simple"))]
compile_error!("enable an admin auth feature, e.g. `auth-simple`");

#[cfg(feature = "db-sqlite")]
use folio_db_sqlite::SqliteDocumentStore;

#[cfg(feature = "auth-simple")]
use folio_auth_simple::SharedSecretAuth;

/// Files served by the app itself, when media lives on local disk.
struct LocalMount {
    url_prefix: String,
    root: PathBuf,
}

/// Stands in for the mailer when no email service is configured; every
/// contact submission then fails with a mail error.
struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _message: &ContactMessage) -> folio_core::Result<()> {
        Err(AppError::Mail("no email service is configured".into()))
    }
}

#[cfg(feature = "media-local")]
async fn local_media(settings: &Settings) -> anyhow::Result<(Arc<dyn MediaHost>, Option<LocalMount>)> {
    let root = settings.media.local_root.clone();
    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("creating media directory {}", root.display()))?;
    let host = folio_media_local::LocalMediaHost::new(root.clone(), settings.media.url_prefix.clone());
    let mount = LocalMount { url_prefix: settings.media.url_prefix.clone(), root };
    Ok((Arc::new(host), Some(mount)))
}

#[cfg(not(feature = "media-local"))]
async fn local_media(_settings: &Settings) -> anyhow::Result<(Arc<dyn MediaHost>, Option<LocalMount>)> {
    anyhow::bail!("media.backend = local requires the `media-local` feature")
}

#[cfg(feature = "media-cloudinary")]
fn cloudinary_media(settings: &mut Settings) -> anyhow::Result<Arc<dyn MediaHost>> {
    use folio_media_cloudinary::{CloudinaryConfig, CloudinaryMediaHost};

    let media = &mut settings.media;
    let config = CloudinaryConfig {
        cloud_name: media.cloud_name.clone().context("media.cloud_name is not set")?,
        upload_preset: media.upload_preset.clone().context("media.upload_preset is not set")?,
        api_key: media.api_key.clone(),
        api_secret: media.api_secret.take(),
    };
    if config.api_key.is_none() || config.api_secret.is_none() {
        log::warn!("cloudinary api key/secret not set; media deletion will fail");
    }
    let timeout = settings.upload_timeout();
    Ok(Arc::new(CloudinaryMediaHost::new(config, timeout)?))
}

#[cfg(not(feature = "media-cloudinary"))]
fn cloudinary_media(_settings: &mut Settings) -> anyhow::Result<Arc<dyn MediaHost>> {
    anyhow::bail!("media.backend = cloudinary requires the `media-cloudinary` feature")
}

#[cfg(feature = "mail-emailjs")]
fn mailer(settings: &mut Settings) -> anyhow::Result<Arc<dyn Mailer>> {
    use folio_mail_emailjs::{EmailJsConfig, EmailJsMailer};

    let mail = &mut settings.mail;
    match (mail.service_id.clone(), mail.template_id.clone(), mail.public_key.clone()) {
        (Some(service_id), Some(template_id), Some(public_key)) => {
            let config = EmailJsConfig {
                endpoint: mail.endpoint.clone(),
                service_id,
                template_id,
                public_key,
                private_key: mail.private_key.take(),
            };
            Ok(Arc::new(EmailJsMailer::new(config)?))
        }
        _ => {
            log::warn!("email service is not configured; the contact form will report failures");
            Ok(Arc::new(DisabledMailer))
        }
    }
}

#[cfg(not(feature = "mail-emailjs"))]
fn mailer(_settings: &mut Settings) -> anyhow::Result<Arc<dyn Mailer>> {
    log::warn!("built without a mail feature; the contact form will report failures");
    Ok(Arc::new(DisabledMailer))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let mut settings = Settings::load().context("loading configuration")?;

    // 1. Document store
    #[cfg(feature = "db-sqlite")]
    let store: Arc<dyn DocumentStore> = Arc::new(
        SqliteDocumentStore::new(&settings.database_url)
            .await
            .with_context(|| format!("opening {}", settings.database_url))?,
    );

    // 2. Media host
    let (media, mount) = match settings.media.backend {
        MediaBackend::Local => local_media(&settings).await?,
        MediaBackend::Cloudinary => (cloudinary_media(&mut settings)?, None),
    };

    // 3. Admin auth
    #[cfg(feature = "auth-simple")]
    let auth: Arc<dyn AdminAuth> = Arc::new(SharedSecretAuth::new(settings.admin_password.as_ref()));

    // 4. Mailer
    let mailer = mailer(&mut settings)?;

    let state = web::Data::new(AppState::new(
        store,
        media,
        mailer,
        auth,
        settings.post_schema,
        UploadPolicy::new(settings.upload_timeout(), settings.upload_retries),
        SessionSettings { cookie_secure: settings.cookie_secure, session_days: settings.session_days },
    ));
    let mount = mount.map(Arc::new);

    log::info!("Folio starting on http://{}", settings.bind_addr);

    HttpServer::new(move || {
        let app = App::new().app_data(state.clone()).configure(configure_routes);
        let app = match mount.as_deref() {
            Some(m) => app.service(Files::new(&m.url_prefix, &m.root)),
            None => app,
        };
        app.wrap(cors_policy()).wrap(standard_middleware())
    })
    .bind(settings.bind_addr.as_str())
    .with_context(|| format!("binding {}", settings.bind_addr))?
    .run()
    .await?;

    Ok(())
}
