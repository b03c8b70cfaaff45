use folio_core::{AppError, ContactMessage, Mailer, Result};
use std::sync::Arc;

pub struct ContactService {
    mailer: Arc<dyn Mailer>,
}

impl ContactService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Trims every field, checks them, then hands the message to the mailer.
    pub async fn submit(&self, message: ContactMessage) -> Result<()> {
        let message = ContactMessage {
            name: message.name.trim().to_string(),
            email: message.email.trim().to_string(),
            subject: message.subject.trim().to_string(),
            message: message.message.trim().to_string(),
        };

        if message.name.is_empty() || message.subject.is_empty() || message.message.is_empty() {
            return Err(AppError::validation("Please fill in all fields"));
        }
        if !is_plausible_email(&message.email) {
            return Err(AppError::validation("A valid email address is required"));
        }

        self.mailer.send(&message).await?;
        log::info!("contact message from {} sent", message.email);
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(' '),
        None => false,
    }
}
