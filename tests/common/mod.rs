//! Common test utilities for integration tests.
//!
//! JSON fixtures in the backend's wire format, and helpers that mount the
//! captcha and CSRF endpoints on a wiremock server.
#![allow(dead_code)]

use std::sync::Arc;

use postboard::adapters::ReqwestHttpClient;
use postboard::client::{BoardClient, CAPTCHA_PATH, CSRF_COOKIE, CSRF_PATH};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_CSRF_TOKEN: &str = "test-csrf-token-12345";

/// A post as returned by the list endpoint.
pub fn post_json(id: u64, username: &str, replies: Vec<Value>) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
        "homepage_url": null,
        "text_html": format!("post <i>{}</i>", id),
        "created_at": "2024-05-01T10:00:00Z",
        "parent": null,
        "files": [],
        "replies": replies,
    })
}

pub fn page_json(posts: Vec<Value>, total_pages: u32) -> Value {
    json!({ "posts": posts, "totalPages": total_pages })
}

pub fn captcha_json(key: &str) -> Value {
    json!({
        "captcha_key": key,
        "captcha_image_url": format!("/captcha/image/{}/", key),
    })
}

/// Mount `GET /api/captcha/` returning a captcha with `key`.
pub async fn mount_captcha(server: &MockServer, key: &str) {
    Mock::given(method("GET"))
        .and(path(CAPTCHA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(captcha_json(key)))
        .mount(server)
        .await;
}

/// Mount `GET /api/csrf/get/`, which sets the CSRF cookie.
pub async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "set-cookie",
                    format!("{}={}; Path=/", CSRF_COOKIE, TEST_CSRF_TOKEN).as_str(),
                )
                .set_body_json(json!({"message": "CSRF cookie set"})),
        )
        .mount(server)
        .await;
}

/// A board client talking to `server` over real HTTP.
pub fn board_client(server: &MockServer) -> Arc<BoardClient<ReqwestHttpClient>> {
    let http = ReqwestHttpClient::new().expect("Failed to build HTTP client");
    Arc::new(BoardClient::new(Arc::new(http), server.uri()))
}
