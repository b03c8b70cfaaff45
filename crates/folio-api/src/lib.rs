//! # folio-api
//!
//! The web routing and orchestration layer for Folio.

pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;
pub use middleware::SessionSettings;

/// Configures every page and JSON endpoint.
///
/// `/thoughts/admin` is registered ahead of `/thoughts/{id}` so the literal
/// segment wins.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::home))
        .route("/contact", web::get().to(handlers::contact_page))
        .route("/contact", web::post().to(handlers::contact_submit))
        .route("/admin/login", web::get().to(handlers::login_page))
        .route("/thoughts", web::get().to(handlers::thoughts_feed))
        .route("/thoughts/admin", web::get().to(handlers::admin_page))
        .route("/thoughts/admin", web::post().to(handlers::create_thought))
        .route("/thoughts/{id}", web::get().to(handlers::thought_page))
        .route("/thoughts/{id}/edit", web::get().to(handlers::edit_page))
        .route("/thoughts/{id}/like", web::post().to(handlers::like_form))
        .route("/thoughts/{id}/comments", web::post().to(handlers::add_comment))
        .service(
            web::scope("/api")
                .route("/admin/login", web::post().to(handlers::login))
                .route("/admin/delete", web::post().to(handlers::delete_thought))
                .route("/admin/comments/delete", web::post().to(handlers::delete_comment))
                .route("/auth/logout", web::post().to(handlers::logout))
                .route("/auth/check", web::get().to(handlers::auth_check))
                .route("/thoughts/{id}", web::get().to(handlers::thought_json))
                .route("/thoughts/{id}", web::put().to(handlers::update_thought))
                .route("/thoughts/{id}/comments", web::get().to(handlers::comments_json))
                .route("/thoughts/{id}/like", web::post().to(handlers::like_api))
                .route("/media/upload", web::post().to(handlers::upload_media))
                .route("/media/delete", web::post().to(handlers::delete_media)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::ADMIN_COOKIE;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use chrono::{TimeZone, Utc};
    use folio_core::{
        Document, MockAdminAuth, MockDocumentStore, MockMailer, MockMediaHost, PostSchema,
    };
    use folio_services::UploadPolicy;
    use serde_json::json;
    use std::sync::Arc;

    fn state(store: MockDocumentStore, auth: MockAdminAuth) -> web::Data<AppState> {
        state_with_media(store, MockMediaHost::new(), auth)
    }

    fn state_with_media(
        store: MockDocumentStore,
        media: MockMediaHost,
        auth: MockAdminAuth,
    ) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(store),
            Arc::new(media),
            Arc::new(MockMailer::new()),
            Arc::new(auth),
            PostSchema::Blocks,
            UploadPolicy::default(),
            SessionSettings::default(),
        ))
    }

    fn thought() -> Document {
        Document {
            id: "t1".into(),
            fields: json!({
                "title": "First",
                "content": "Hello\n[Image: left, 50%]",
                "additionalMedia": [{ "url": "https://cdn/a.png", "type": "image" }],
                "likeCount": 2,
            }),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[actix_web::test]
    async fn legacy_thought_is_served_as_blocks() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(Some(thought())));
        let app = test::init_service(
            App::new().app_data(state(store, MockAdminAuth::new())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/thoughts/t1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["title"], "First");
        assert_eq!(body["likeCount"], 2);
        assert_eq!(body["blocks"][0], json!({ "type": "text", "content": "Hello" }));
        assert_eq!(body["blocks"][1]["mediaRef"]["url"], "https://cdn/a.png");
    }

    #[actix_web::test]
    async fn missing_thought_is_404_json() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        let app = test::init_service(
            App::new().app_data(state(store, MockAdminAuth::new())).configure(configure_routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/thoughts/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn login_without_configured_secret_is_a_server_error() {
        let mut auth = MockAdminAuth::new();
        auth.expect_is_configured().return_const(false);
        let app = test::init_service(
            App::new().app_data(state(MockDocumentStore::new(), auth)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "password": "anything" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn login_sets_the_admin_cookie() {
        let mut auth = MockAdminAuth::new();
        auth.expect_is_configured().return_const(true);
        auth.expect_verify().returning(|p| p == "letmein");
        let app = test::init_service(
            App::new().app_data(state(MockDocumentStore::new(), auth)).configure(configure_routes),
        )
        .await;

        let wrong = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "password": "nope" }))
            .to_request();
        assert_eq!(test::call_service(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

        let right = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "password": "letmein" }))
            .to_request();
        let resp = test::call_service(&app, right).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == ADMIN_COOKIE)
            .expect("admin cookie");
        assert_eq!(cookie.value(), "true");
    }

    #[actix_web::test]
    async fn admin_pages_redirect_and_endpoints_refuse_without_session() {
        let app = test::init_service(
            App::new()
                .app_data(state(MockDocumentStore::new(), MockAdminAuth::new()))
                .configure(configure_routes),
        )
        .await;

        let page = test::call_service(&app, test::TestRequest::get().uri("/thoughts/admin").to_request()).await;
        assert_eq!(page.status(), StatusCode::SEE_OTHER);
        assert_eq!(page.headers().get("location").unwrap(), "/admin/login");

        let delete = test::TestRequest::post()
            .uri("/api/admin/delete")
            .set_json(json!({ "id": "t1" }))
            .to_request();
        assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn auth_check_reports_the_cookie() {
        let app = test::init_service(
            App::new()
                .app_data(state(MockDocumentStore::new(), MockAdminAuth::new()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/auth/check")
            .cookie(Cookie::new(ADMIN_COOKIE, "true"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "isAdmin": true }));
    }

    #[actix_web::test]
    async fn like_toggles_through_the_cookie() {
        let mut store = MockDocumentStore::new();
        store
            .expect_increment()
            .withf(|c, id, f, d| c == "thoughts" && id == "t1" && f == "likeCount" && *d == 1)
            .times(1)
            .returning(|_, _, _, _| Ok(3));
        let app = test::init_service(
            App::new().app_data(state(store, MockAdminAuth::new())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/thoughts/t1/like").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let liked = resp
            .response()
            .cookies()
            .find(|c| c.name() == crate::middleware::LIKED_COOKIE)
            .map(|c| c.value().to_string());
        assert_eq!(liked.as_deref(), Some("t1"));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["likeCount"], 3);
        assert_eq!(body["liked"], true);
    }

    #[actix_web::test]
    async fn blank_title_edit_never_reaches_the_media_host() {
        let mut media = MockMediaHost::new();
        media.expect_upload().times(0);
        media.expect_delete_by_url().times(0);
        let app = test::init_service(
            App::new()
                .app_data(state_with_media(MockDocumentStore::new(), media, MockAdminAuth::new()))
                .configure(configure_routes),
        )
        .await;

        let boundary = "folio-edit";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n   \r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"blocks\"\r\n\r\n\
             [{{\"type\":\"image\",\"file\":\"file-0\"}}]\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file-0\"; filename=\"new.png\"\r\n\
             Content-Type: image/png\r\n\r\npng-bytes\r\n\
             --{boundary}--\r\n"
        );
        let req = test::TestRequest::put()
            .uri("/api/thoughts/t1")
            .cookie(Cookie::new(ADMIN_COOKIE, "true"))
            .insert_header(("content-type", format!("multipart/form-data; boundary={boundary}")))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Title is required");
    }

    #[actix_web::test]
    async fn likes_stop_at_the_cookie_limit() {
        let app = test::init_service(
            App::new()
                .app_data(state(MockDocumentStore::new(), MockAdminAuth::new()))
                .configure(configure_routes),
        )
        .await;

        let full = (0..crate::middleware::LIKED_LIMIT)
            .map(|n| format!("t-{n:04}"))
            .collect::<Vec<_>>()
            .join(".");
        let req = test::TestRequest::post()
            .uri("/api/thoughts/t-new/like")
            .cookie(Cookie::new(crate::middleware::LIKED_COOKIE, full.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        // unliking is still allowed at the limit
        let mut store = MockDocumentStore::new();
        store.expect_increment().times(1).returning(|_, _, _, _| Ok(0));
        let app = test::init_service(
            App::new().app_data(state(store, MockAdminAuth::new())).configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/thoughts/t-0001/like")
            .cookie(Cookie::new(crate::middleware::LIKED_COOKIE, full))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["liked"], false);
    }
}
