//! folio/crates/folio-api/src/middleware.rs
//!
//! Request logging, CORS, and the cookies that carry the admin session and
//! a reader's likes.

use crate::error::ApiError;
use actix_cors::Cors;
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::middleware::Logger;
use actix_web::{FromRequest, HttpRequest};
use std::collections::BTreeSet;
use std::future::{ready, Ready};

pub const ADMIN_COOKIE: &str = "admin-authenticated";
pub const LIKED_COOKIE: &str = "liked_thoughts";
const LIKED_SEPARATOR: char = '.';
pub const LIKED_LIMIT: usize = 500;

// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .max_age(3600)
}

/// How the admin cookie is issued.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub cookie_secure: bool,
    pub session_days: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { cookie_secure: false, session_days: 7 }
    }
}

pub fn is_admin(req: &HttpRequest) -> bool {
    req.cookie(ADMIN_COOKIE).is_some_and(|c| c.value() == "true")
}

pub fn admin_cookie(settings: SessionSettings) -> Cookie<'static> {
    Cookie::build(ADMIN_COOKIE, "true")
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(settings.cookie_secure)
        .max_age(Duration::days(settings.session_days))
        .finish()
}

pub fn clear_admin_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(ADMIN_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Extractor for admin-only JSON and mutation endpoints: 401 without the
/// session cookie.
pub struct AdminSession;

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if is_admin(req) {
            ready(Ok(AdminSession))
        } else {
            log::warn!("rejected admin request to {}", req.path());
            ready(Err(ApiError::unauthorized()))
        }
    }
}

/// The thought ids this browser has liked.
pub fn liked_ids(req: &HttpRequest) -> BTreeSet<String> {
    req.cookie(LIKED_COOKIE)
        .map(|c| {
            c.value()
                .split(LIKED_SEPARATOR)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Ids are time-ordered, so an oversized set keeps its newest `LIKED_LIMIT`.
pub fn liked_cookie(ids: &BTreeSet<String>) -> Cookie<'static> {
    let value = ids
        .iter()
        .rev()
        .take(LIKED_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&LIKED_SEPARATOR.to_string());
    Cookie::build(LIKED_COOKIE, value)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(365))
        .finish()
}
