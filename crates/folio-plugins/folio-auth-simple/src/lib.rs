//! # folio-auth-simple
//!
//! `AdminAuth` for a single shared admin secret. The configured value may be
//! the password itself or an Argon2 PHC string (`$argon2id$...`).

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use folio_core::traits::AdminAuth;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

enum Secret {
    /// SHA-256 of the plain password; compared in constant time.
    Digest([u8; 32]),
    /// A PHC-formatted Argon2 hash.
    Argon2(String),
}

pub struct SharedSecretAuth {
    secret: Option<Secret>,
}

impl SharedSecretAuth {
    pub fn new(configured: Option<&SecretString>) -> Self {
        let secret = configured.map(|s| s.expose_secret()).map(|raw| {
            if raw.starts_with("$argon2") {
                Secret::Argon2(raw.to_string())
            } else {
                Secret::Digest(Sha256::digest(raw.as_bytes()).into())
            }
        });
        Self { secret }
    }
}

impl AdminAuth for SharedSecretAuth {
    fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn verify(&self, submitted: &str) -> bool {
        match &self.secret {
            None => false,
            Some(Secret::Digest(expected)) => {
                let given: [u8; 32] = Sha256::digest(submitted.as_bytes()).into();
                given[..].ct_eq(&expected[..]).into()
            }
            Some(Secret::Argon2(phc)) => match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default().verify_password(submitted.as_bytes(), &parsed).is_ok(),
                Err(err) => {
                    log::error!("configured admin hash is not a valid PHC string: {}", err);
                    false
                }
            },
        }
    }
}
