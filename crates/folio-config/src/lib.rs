//! folio/crates/folio-config/src/lib.rs
//!
//! Layered settings for the Folio binary: built-in defaults, then an optional
//! `folio.toml`, then `FOLIO_*` environment variables (a `.env` file is read
//! first). Nested keys use a double underscore: `FOLIO_MEDIA__BACKEND`.

use config::{Config, Environment, File, Map};
use folio_core::PostSchema;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "FOLIO";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Debug)]
pub struct MediaSettings {
    pub backend: MediaBackend,
    /// Directory served under `url_prefix` by the local backend.
    pub local_root: PathBuf,
    pub url_prefix: String,
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
}

#[derive(Debug)]
pub struct MailSettings {
    pub endpoint: String,
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<SecretString>,
}

impl MailSettings {
    /// All three public identifiers are present.
    pub fn is_configured(&self) -> bool {
        self.service_id.is_some() && self.template_id.is_some() && self.public_key.is_some()
    }
}

#[derive(Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub admin_password: Option<SecretString>,
    pub cookie_secure: bool,
    pub session_days: i64,
    pub post_schema: PostSchema,
    pub upload_timeout_secs: u64,
    pub upload_retries: u8,
    pub media: MediaSettings,
    pub mail: MailSettings,
}

// What the `config` sources deserialize into, before secrets are wrapped.
#[derive(Deserialize)]
struct RawSettings {
    bind_addr: String,
    database_url: String,
    admin_password: Option<String>,
    cookie_secure: bool,
    session_days: i64,
    post_schema: String,
    upload_timeout_secs: u64,
    upload_retries: u8,
    media: RawMedia,
    mail: RawMail,
}

#[derive(Deserialize)]
struct RawMedia {
    backend: MediaBackend,
    local_root: PathBuf,
    url_prefix: String,
    cloud_name: Option<String>,
    upload_preset: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

#[derive(Deserialize)]
struct RawMail {
    endpoint: String,
    service_id: Option<String>,
    template_id: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
}

impl Settings {
    /// Reads `.env`, `folio.toml` (if present) and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("ignoring unreadable .env file: {}", e),
        }
        Self::from_sources(Some(Path::new("folio.toml")), None)
    }

    /// Builds settings from an optional TOML file and either the process
    /// environment (`env = None`) or the given variables.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("bind_addr", "127.0.0.1:8080")?
            .set_default("database_url", "sqlite:folio.db")?
            .set_default("cookie_secure", false)?
            .set_default("session_days", 7)?
            .set_default("post_schema", "blocks")?
            .set_default("upload_timeout_secs", 30)?
            .set_default("upload_retries", 1)?
            .set_default("media.backend", "local")?
            .set_default("media.local_root", "./uploads")?
            .set_default("media.url_prefix", "/media")?
            .set_default("mail.endpoint", "https://api.emailjs.com/api/v1.0/email/send")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, SettingsError> {
        let post_schema = raw.post_schema.parse::<PostSchema>().map_err(SettingsError::Invalid)?;
        if raw.session_days < 1 {
            return Err(SettingsError::Invalid("session_days must be at least 1".into()));
        }
        if raw.upload_timeout_secs == 0 {
            return Err(SettingsError::Invalid("upload_timeout_secs must be positive".into()));
        }

        let media = MediaSettings {
            backend: raw.media.backend,
            local_root: raw.media.local_root,
            url_prefix: raw.media.url_prefix.trim_end_matches('/').to_string(),
            cloud_name: non_blank(raw.media.cloud_name),
            upload_preset: non_blank(raw.media.upload_preset),
            api_key: non_blank(raw.media.api_key),
            api_secret: secret(raw.media.api_secret),
        };
        if media.backend == MediaBackend::Cloudinary
            && (media.cloud_name.is_none() || media.upload_preset.is_none())
        {
            return Err(SettingsError::Invalid(
                "media.cloud_name and media.upload_preset are required for the cloudinary backend"
                    .into(),
            ));
        }

        let admin_password = secret(raw.admin_password);
        if admin_password.is_none() {
            log::warn!("FOLIO_ADMIN_PASSWORD is not set; admin login is disabled");
        }

        Ok(Settings {
            bind_addr: raw.bind_addr,
            database_url: raw.database_url,
            admin_password,
            cookie_secure: raw.cookie_secure,
            session_days: raw.session_days,
            post_schema,
            upload_timeout_secs: raw.upload_timeout_secs,
            upload_retries: raw.upload_retries.min(1),
            media,
            mail: MailSettings {
                endpoint: raw.mail.endpoint,
                service_id: non_blank(raw.mail.service_id),
                template_id: non_blank(raw.mail.template_id),
                public_key: non_blank(raw.mail.public_key),
                private_key: secret(raw.mail.private_key),
            },
        })
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn secret(value: Option<String>) -> Option<SecretString> {
    non_blank(value).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::from_sources(None, env(&[])).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:8080");
        assert_eq!(settings.post_schema, PostSchema::Blocks);
        assert_eq!(settings.session_days, 7);
        assert_eq!(settings.upload_timeout(), Duration::from_secs(30));
        assert_eq!(settings.media.backend, MediaBackend::Local);
        assert_eq!(settings.media.url_prefix, "/media");
        assert!(settings.admin_password.is_none());
        assert!(!settings.mail.is_configured());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_sources(
            None,
            env(&[
                ("FOLIO_ADMIN_PASSWORD", "hunter2"),
                ("FOLIO_POST_SCHEMA", "Legacy"),
                ("FOLIO_COOKIE_SECURE", "true"),
                ("FOLIO_UPLOAD_RETRIES", "5"),
                ("FOLIO_MEDIA__URL_PREFIX", "/files/"),
                ("FOLIO_MAIL__SERVICE_ID", "svc"),
                ("FOLIO_MAIL__TEMPLATE_ID", "tpl"),
                ("FOLIO_MAIL__PUBLIC_KEY", "pk"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.admin_password.as_ref().map(|s| s.expose_secret()), Some("hunter2"));
        assert_eq!(settings.post_schema, PostSchema::Legacy);
        assert!(settings.cookie_secure);
        assert_eq!(settings.upload_retries, 1);
        assert_eq!(settings.media.url_prefix, "/files");
        assert!(settings.mail.is_configured());
    }

    #[test]
    fn blank_password_counts_as_unset() {
        let settings = Settings::from_sources(None, env(&[("FOLIO_ADMIN_PASSWORD", "  ")])).unwrap();
        assert!(settings.admin_password.is_none());
    }

    #[test]
    fn cloudinary_requires_cloud_name_and_preset() {
        let err = Settings::from_sources(None, env(&[("FOLIO_MEDIA__BACKEND", "cloudinary")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let ok = Settings::from_sources(
            None,
            env(&[
                ("FOLIO_MEDIA__BACKEND", "cloudinary"),
                ("FOLIO_MEDIA__CLOUD_NAME", "demo"),
                ("FOLIO_MEDIA__UPLOAD_PRESET", "unsigned"),
            ]),
        )
        .unwrap();
        assert_eq!(ok.media.backend, MediaBackend::Cloudinary);
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let err = Settings::from_sources(None, env(&[("FOLIO_POST_SCHEMA", "xml")])).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn toml_file_sits_between_defaults_and_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "bind_addr = \"0.0.0.0:9000\"\nsession_days = 3").unwrap();

        let settings =
            Settings::from_sources(Some(file.path()), env(&[("FOLIO_SESSION_DAYS", "14")])).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.session_days, 14);
    }
}
