//! EmailJS `Mailer`: sends the contact form through a stored email template
//! via the public REST endpoint.

use async_trait::async_trait;
use folio_core::{AppError, ContactMessage, Mailer, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

pub struct EmailJsConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// Needed only when the account enforces private-key calls.
    pub private_key: Option<SecretString>,
}

pub struct EmailJsMailer {
    config: EmailJsConfig,
    client: Client,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

impl EmailJsMailer {
    pub fn new(config: EmailJsConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { config, client })
    }

    fn request<'a>(&'a self, message: &'a ContactMessage) -> SendRequest<'a> {
        SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            access_token: self.config.private_key.as_ref().map(|k| k.expose_secret()),
            template_params: TemplateParams {
                name: &message.name,
                email: &message.email,
                subject: &message.subject,
                message: &message.message,
            },
        }
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send(&self, message: &ContactMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&self.request(message))
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("email API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            log::error!("email API answered {}: {}", status, body);
            return Err(AppError::Mail(format!("email API error ({status}): {body}")));
        }
        Ok(())
    }
}
