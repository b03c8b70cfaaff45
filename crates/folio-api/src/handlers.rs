//! # folio-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.

use crate::error::ApiError;
use crate::forms;
use crate::middleware::{
    admin_cookie, clear_admin_cookie, is_admin, liked_cookie, liked_ids, AdminSession,
    SessionSettings, LIKED_LIMIT,
};
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use folio_core::{AdminAuth, AppError, ContactMessage, DocumentStore, Mailer, MediaHost, PostSchema};
use folio_services::{CommentService, ContactService, ThoughtService, UploadPolicy};
use folio_ui::{
    AdminTemplate, ContactTemplate, EditTemplate, FeedEntry, HomeTemplate, LoginTemplate,
    ThoughtTemplate, ThoughtsTemplate,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const HOME_LATEST: usize = 3;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub thoughts: ThoughtService,
    pub comments: CommentService,
    pub contact: ContactService,
    pub auth: Arc<dyn AdminAuth>,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaHost>,
        mailer: Arc<dyn Mailer>,
        auth: Arc<dyn AdminAuth>,
        schema: PostSchema,
        policy: UploadPolicy,
        session: SessionSettings,
    ) -> Self {
        AppState {
            thoughts: ThoughtService::new(store.clone(), media, policy, schema),
            comments: CommentService::new(store),
            contact: ContactService::new(mailer),
            auth,
            session,
        }
    }
}

fn html(template: impl Template) -> Result<HttpResponse, ApiError> {
    let body = template
        .render()
        .map_err(|e| ApiError(AppError::Internal(format!("template rendering failed: {e}"))))?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, location)).finish()
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// ── Public pages ────────────────────────────────────────────────────────────

pub async fn home(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let posts = data.thoughts.list(None).await?;
    html(HomeTemplate {
        is_admin: is_admin(&req),
        latest: posts.iter().take(HOME_LATEST).map(FeedEntry::from).collect(),
    })
}

pub async fn thoughts_feed(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner().q.trim().to_string();
    let posts = data.thoughts.list(Some(&query)).await?;
    html(ThoughtsTemplate {
        is_admin: is_admin(&req),
        entries: posts.iter().map(FeedEntry::from).collect(),
        query,
    })
}

pub async fn thought_page(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data.thoughts.get(&id).await?;
    let comments = data.comments.list(&id).await?;
    let liked = liked_ids(&req).contains(&id);
    html(ThoughtTemplate::new(&post, &comments, liked, is_admin(&req)))
}

/// Flips this reader's like and records the id set in a cookie.
async fn toggle_like(
    data: &AppState,
    req: &HttpRequest,
    id: &str,
) -> Result<(bool, u64, actix_web::cookie::Cookie<'static>), ApiError> {
    let mut liked = liked_ids(req);
    let now_liked = !liked.contains(id);
    if now_liked && liked.len() >= LIKED_LIMIT {
        return Err(ApiError::bad_request("This browser has reached its like limit"));
    }
    let count = data.thoughts.toggle_like(id, now_liked).await?;
    if now_liked {
        liked.insert(id.to_string());
    } else {
        liked.remove(id);
    }
    Ok((now_liked, count, liked_cookie(&liked)))
}

pub async fn like_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let (_, _, cookie) = toggle_like(&data, &req, &id).await?;
    let mut response = see_other(&format!("/thoughts/{id}"));
    response.add_cookie(&cookie).map_err(|e| ApiError(AppError::Internal(e.to_string())))?;
    Ok(response)
}

pub async fn like_api(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let (liked, count, cookie) = toggle_like(&data, &req, &id).await?;
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "success": true, "liked": liked, "likeCount": count })))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
}

pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match data.comments.add(&id, &form.name, &form.text).await {
        Ok(_) => Ok(see_other(&format!("/thoughts/{id}#comments"))),
        Err(AppError::ValidationError(msg)) => {
            let post = data.thoughts.get(&id).await?;
            let comments = data.comments.list(&id).await?;
            let mut page =
                ThoughtTemplate::new(&post, &comments, liked_ids(&req).contains(&id), is_admin(&req));
            page.comment_error = Some(msg);
            let mut response = html(page)?;
            *response.status_mut() = actix_web::http::StatusCode::BAD_REQUEST;
            Ok(response)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn contact_page(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    html(ContactTemplate {
        is_admin: is_admin(&req),
        form: ContactMessage::default(),
        error: None,
        sent: false,
    })
}

pub async fn contact_submit(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ContactMessage>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();
    match data.contact.submit(form.clone()).await {
        Ok(()) => html(ContactTemplate {
            is_admin: is_admin(&req),
            form: ContactMessage::default(),
            error: None,
            sent: true,
        }),
        Err(err) => {
            let err = ApiError(err);
            let status = actix_web::ResponseError::status_code(&err);
            let mut response = html(ContactTemplate {
                is_admin: is_admin(&req),
                error: Some(err.public_message()),
                form,
                sent: false,
            })?;
            *response.status_mut() = status;
            Ok(response)
        }
    }
}

// ── JSON reads ──────────────────────────────────────────────────────────────

pub async fn thought_json(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let post = data.thoughts.get(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn comments_json(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let comments = data.comments.list(&path).await?;
    Ok(HttpResponse::Ok().json(comments))
}

// ── Admin session ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    if is_admin(&req) {
        return Ok(see_other("/thoughts/admin"));
    }
    html(LoginTemplate { is_admin: false, configured: data.auth.is_configured() })
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if !data.auth.is_configured() {
        log::error!("admin login attempted but no admin password is configured");
        return Ok(HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": "Server not configured" })));
    }
    if !data.auth.verify(&body.password) {
        log::warn!("failed admin login");
        return Err(ApiError(AppError::Unauthorized("Incorrect password".into())));
    }
    log::info!("admin logged in");
    Ok(HttpResponse::Ok().cookie(admin_cookie(data.session)).json(json!({ "success": true })))
}

pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().cookie(clear_admin_cookie()).json(json!({ "success": true }))
}

pub async fn auth_check(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "isAdmin": is_admin(&req) }))
}

// ── Admin authoring ─────────────────────────────────────────────────────────

pub async fn admin_page(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    if !is_admin(&req) {
        return Ok(see_other("/admin/login"));
    }
    let query = query.into_inner().q.trim().to_string();
    let posts = data.thoughts.list(Some(&query)).await?;
    html(AdminTemplate {
        is_admin: true,
        entries: posts.iter().map(FeedEntry::from).collect(),
        query,
        error: None,
    })
}

pub async fn create_thought(
    data: web::Data<AppState>,
    _admin: AdminSession,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let draft = forms::read_draft(payload).await?;
    let id = data.thoughts.create(draft).await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "id": id })))
}

pub async fn edit_page(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !is_admin(&req) {
        return Ok(see_other("/admin/login"));
    }
    let post = data.thoughts.get(&path).await?;
    let page = EditTemplate::new(&post).map_err(|e| ApiError(AppError::Internal(e.to_string())))?;
    html(page)
}

pub async fn update_thought(
    data: web::Data<AppState>,
    _admin: AdminSession,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let draft = forms::read_draft(payload).await?;
    data.thoughts.update(&path, draft).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteThoughtRequest {
    pub id: String,
}

pub async fn delete_thought(
    data: web::Data<AppState>,
    _admin: AdminSession,
    body: web::Json<DeleteThoughtRequest>,
) -> Result<HttpResponse, ApiError> {
    data.thoughts.delete(&body.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub thought_id: String,
    pub comment_id: String,
}

pub async fn delete_comment(
    data: web::Data<AppState>,
    _admin: AdminSession,
    body: web::Json<DeleteCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    data.comments.delete(&body.thought_id, &body.comment_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

// ── Media ───────────────────────────────────────────────────────────────────

pub async fn upload_media(
    data: web::Data<AppState>,
    _admin: AdminSession,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut parts = forms::collect_parts(payload).await?;
    let file = parts.files.remove("file").ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let media = data.thoughts.upload_media(file).await?;
    Ok(HttpResponse::Ok().json(media))
}

#[derive(Debug, Deserialize)]
pub struct DeleteMediaRequest {
    pub url: String,
}

pub async fn delete_media(
    data: web::Data<AppState>,
    _admin: AdminSession,
    body: web::Json<DeleteMediaRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::bad_request("No URL provided"));
    }
    data.thoughts.delete_media(&body.url).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
