mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use common::{admin_cookie, harness, multipart, Part, PASSWORD};
use folio_api::configure_routes;
use folio_core::{MockMailer, PostSchema};
use serde_json::{json, Value};

fn create_request(title: &str) -> test::TestRequest {
    let blocks = json!([
        { "type": "text", "content": "First line\nsecond line" },
        { "type": "image", "alignment": "left", "widthPercent": 50, "file": "file-0" },
        { "type": "divider" },
        { "type": "video" },
    ])
    .to_string();
    let (content_type, body) = multipart(&[
        Part::Text("title", title),
        Part::File { name: "hero", file_name: "cover.png", content_type: "image/png", data: b"hero-bytes" },
        Part::Text("blocks", &blocks),
        Part::File { name: "file-0", file_name: "inline.jpg", content_type: "image/jpeg", data: b"inline-bytes" },
    ]);
    test::TestRequest::post()
        .uri("/thoughts/admin")
        .cookie(admin_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

fn blocks_json(text: &str) -> String {
    json!([{ "type": "text", "content": text }]).to_string()
}

#[actix_web::test]
async fn login_then_publish_then_read_back() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let login = test::TestRequest::post()
        .uri("/api/admin/login")
        .set_json(json!({ "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, login).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == folio_api::middleware::ADMIN_COOKIE)
        .map(|c| c.into_owned())
        .expect("session cookie");

    let check = test::TestRequest::get().uri("/api/auth/check").cookie(session).to_request();
    let body: Value = test::call_and_read_body_json(&app, check).await;
    assert_eq!(body["isAdmin"], true);

    let resp = test::call_service(&app, create_request("Hello world").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/api/thoughts/{id}")).to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let blocks = post["blocks"].as_array().unwrap();

    // hero first, the empty video draft dropped
    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[0]["type"], "image");
    assert_eq!(blocks[0]["alignment"], "center");
    assert_eq!(blocks[0]["widthPercent"], 80);
    assert_eq!(blocks[1], json!({ "type": "text", "content": "First line\nsecond line" }));
    assert_eq!(blocks[2]["alignment"], "left");
    assert_eq!(blocks[2]["widthPercent"], 50);
    assert_eq!(blocks[3], json!({ "type": "divider" }));
    assert_eq!(post["likeCount"], 0);

    let inline_url = blocks[2]["mediaRef"]["url"].as_str().unwrap();
    assert!(inline_url.starts_with("/media/"));
    assert!(inline_url.ends_with(".jpg"));

    let page = test::TestRequest::get().uri(&format!("/thoughts/{id}")).to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, page).await.to_vec()).unwrap();
    assert!(html.contains("Hello world"));
    assert!(html.contains("First line<br />\nsecond line"));
    let stored_name = inline_url.rsplit('/').next().unwrap();
    assert!(html.contains(stored_name));

    let feed = test::TestRequest::get().uri("/thoughts?q=HELLO").to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, feed).await.to_vec()).unwrap();
    assert!(html.contains(&format!("/thoughts/{id}")));
}

#[actix_web::test]
async fn blank_title_is_rejected_before_any_upload() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let resp = test::call_service(&app, create_request("   ").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(h.media_root.path()).unwrap().count(), 0);
}

#[actix_web::test]
async fn edit_replaces_blocks_and_marks_the_update() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let created: Value = test::call_and_read_body_json(&app, create_request("Draft").to_request()).await;
    let id = created["id"].as_str().unwrap().to_string();

    let edit_page = test::TestRequest::get()
        .uri(&format!("/thoughts/{id}/edit"))
        .cookie(admin_cookie())
        .to_request();
    assert_eq!(test::call_service(&app, edit_page).await.status(), StatusCode::OK);

    let blocks = json!([
        { "type": "quote", "content": "Less is more" },
        { "type": "text", "content": "   " },
        { "type": "audio", "file": "file-2" },
    ])
    .to_string();
    let (content_type, body) = multipart(&[
        Part::Text("title", "Final"),
        Part::Text("blocks", &blocks),
        Part::File { name: "file-2", file_name: "take.mp3", content_type: "audio/mpeg", data: b"mp3" },
    ]);
    let update = test::TestRequest::put()
        .uri(&format!("/api/thoughts/{id}"))
        .cookie(admin_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, update).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&format!("/api/thoughts/{id}")).to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post["title"], "Final");
    let blocks = post["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], json!({ "type": "quote", "content": "Less is more" }));
    assert_eq!(blocks[1]["type"], "audio");
    assert!(blocks[1]["mediaRef"]["url"].as_str().unwrap().ends_with(".mp3"));
    assert!(!post["updatedAt"].is_null());

    let (content_type, body) = multipart(&[Part::Text("title", "Hijack"), Part::Text("blocks", &blocks_json("x"))]);
    let anonymous = test::TestRequest::put()
        .uri(&format!("/api/thoughts/{id}"))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delete_removes_the_record_and_its_media() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let created: Value = test::call_and_read_body_json(&app, create_request("Doomed").to_request()).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/api/thoughts/{id}")).to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let hero_url = post["blocks"][0]["mediaRef"]["url"].as_str().unwrap();
    let hero_path = h.media_root.path().join(hero_url.trim_start_matches("/media/"));
    assert!(hero_path.exists());

    let delete = test::TestRequest::post()
        .uri("/api/admin/delete")
        .cookie(admin_cookie())
        .set_json(json!({ "id": id }))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::OK);

    let gone = test::TestRequest::get().uri(&format!("/api/thoughts/{id}")).to_request();
    assert_eq!(test::call_service(&app, gone).await.status(), StatusCode::NOT_FOUND);
    assert!(!hero_path.exists());
}

#[actix_web::test]
async fn blank_title_edit_leaves_no_files_behind() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let created: Value = test::call_and_read_body_json(&app, create_request("Kept").to_request()).await;
    let id = created["id"].as_str().unwrap().to_string();
    let before = stored_files(h.media_root.path());

    let blocks = json!([{ "type": "image", "file": "file-0" }]).to_string();
    let (content_type, body) = multipart(&[
        Part::Text("title", "   "),
        Part::Text("blocks", &blocks),
        Part::File { name: "file-0", file_name: "new.png", content_type: "image/png", data: b"new" },
    ]);
    let update = test::TestRequest::put()
        .uri(&format!("/api/thoughts/{id}"))
        .cookie(admin_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, update).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_files(h.media_root.path()), before);
}

#[actix_web::test]
async fn deleting_one_thought_keeps_identical_media_of_another() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let first: Value = test::call_and_read_body_json(&app, create_request("First").to_request()).await;
    let second: Value = test::call_and_read_body_json(&app, create_request("Second").to_request()).await;
    let first_id = first["id"].as_str().unwrap().to_string();
    let second_id = second["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/api/thoughts/{second_id}")).to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let media_paths: Vec<_> = post["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|b| b["mediaRef"]["url"].as_str())
        .map(|url| h.media_root.path().join(url.trim_start_matches("/media/")))
        .collect();
    assert_eq!(media_paths.len(), 2);

    let delete = test::TestRequest::post()
        .uri("/api/admin/delete")
        .cookie(admin_cookie())
        .set_json(json!({ "id": first_id }))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::OK);

    for path in &media_paths {
        assert!(path.exists(), "{} was removed with the other thought", path.display());
    }
    let req = test::TestRequest::get().uri(&format!("/thoughts/{second_id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn oversized_part_count_is_refused() {
    let h = harness(PostSchema::Blocks, MockMailer::new()).await;
    let app = test::init_service(App::new().app_data(h.state.clone()).configure(configure_routes)).await;

    let names: Vec<String> = (0..=folio_api::forms::MAX_PARTS).map(|n| format!("extra-{n}")).collect();
    let mut parts = vec![Part::Text("title", "Flood"), Part::Text("blocks", "[]")];
    parts.extend(names.iter().map(|name| Part::Text(name.as_str(), "x")));
    let (content_type, body) = multipart(&parts);

    let req = test::TestRequest::post()
        .uri("/thoughts/admin")
        .cookie(admin_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("too many parts"));
}

/// Every file under the media root, sorted.
fn stored_files(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    fn walk(dir: &std::path::Path, out: &mut Vec<std::path::PathBuf>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, out);
            } else {
                out.push(path);
            }
        }
    }
    let mut files = Vec::new();
    walk(root, &mut files);
    files.sort();
    files
}
