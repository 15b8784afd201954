//! Typed client for the board's REST API.
//!
//! Wraps an [`HttpClient`] and turns responses into models or a
//! [`BoardError`]: a 4xx carrying the backend's `error` field becomes a
//! validation error, anything else that is not 2xx is a transport error.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::compose::SelectedFile;
use crate::error::{BoardError, BoardResult, TransportError, ValidationError};
use crate::models::{CaptchaChallenge, PostId, PostPage};
use crate::state::FetchDescriptor;
use crate::traits::{Headers, HttpClient, MultipartForm, Response};

pub const POSTS_PATH: &str = "/api/posts/get/";
pub const CREATE_PATH: &str = "/api/posts/create/";
pub const CAPTCHA_PATH: &str = "/api/captcha/";
pub const CSRF_PATH: &str = "/api/csrf/get/";

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Longest error body kept in a transport error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Everything sent to create one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub username: String,
    pub email: String,
    pub homepage_url: Option<String>,
    pub text_html: String,
    pub parent_id: Option<PostId>,
    pub captcha_key: String,
    pub captcha_answer: String,
    pub files: Vec<SelectedFile>,
}

impl Submission {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "username": self.username,
            "email": self.email,
            "homepage_url": self.homepage_url.as_deref().unwrap_or(""),
            "text_html": self.text_html,
            "parent_id": self.parent_id,
            "captcha_0": self.captcha_key,
            "captcha_1": self.captcha_answer,
        })
    }

    fn to_form(&self) -> MultipartForm {
        let parent = self
            .parent_id
            .map_or_else(|| "null".to_string(), |id| id.to_string());
        let mut form = MultipartForm::new()
            .text("username", self.username.as_str())
            .text("email", self.email.as_str())
            .text("homepage_url", self.homepage_url.as_deref().unwrap_or(""))
            .text("text_html", self.text_html.as_str())
            .text("parent_id", parent)
            .text("captcha_0", self.captcha_key.as_str())
            .text("captcha_1", self.captcha_answer.as_str());
        for file in &self.files {
            form = form.file(file.to_part());
        }
        form
    }
}

/// Client for the board API.
#[derive(Debug)]
pub struct BoardClient<H: HttpClient> {
    http: Arc<H>,
    base_url: String,
}

impl<H: HttpClient> BoardClient<H> {
    pub fn new(http: Arc<H>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Arc<H> {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch one page of top-level posts with their replies.
    pub async fn fetch_posts(&self, descriptor: &FetchDescriptor) -> BoardResult<PostPage> {
        let url = format!(
            "{}?page={}&limit={}&sort_by={}&sort_order={}",
            self.url(POSTS_PATH),
            descriptor.page,
            descriptor.page_size,
            urlencoding::encode(descriptor.sort_key.as_str()),
            urlencoding::encode(descriptor.sort_direction.as_str()),
        );
        debug!(url = %url, "Fetching posts");

        let response = self.get(&url).await?;
        let page = PostPage::from_slice(&response.body)?;
        debug!(
            posts = page.posts.len(),
            total_pages = page.total_pages,
            "Fetched posts"
        );
        Ok(page)
    }

    /// Request a fresh captcha.
    pub async fn fetch_captcha(&self) -> BoardResult<CaptchaChallenge> {
        let url = self.url(CAPTCHA_PATH);
        let response = self.get(&url).await?;
        Ok(response.json()?)
    }

    /// CSRF token for mutating requests, asking the server to issue one if needed.
    pub async fn ensure_csrf(&self) -> BoardResult<String> {
        if let Some(token) = self.http.cookie(&self.base_url, CSRF_COOKIE) {
            return Ok(token);
        }

        let url = self.url(CSRF_PATH);
        self.get(&url).await?;
        self.http
            .cookie(&self.base_url, CSRF_COOKIE)
            .ok_or_else(|| {
                warn!(url = %url, "CSRF cookie missing after token request");
                BoardError::Transport(TransportError::InvalidResponse {
                    message: format!("server did not set the '{}' cookie", CSRF_COOKIE),
                })
            })
    }

    /// Create a post or reply.
    ///
    /// Sent as JSON when there are no attachments, multipart otherwise.
    pub async fn create_post(&self, submission: &Submission) -> BoardResult<()> {
        let token = self.ensure_csrf().await?;
        let url = self.url(CREATE_PATH);

        let mut headers = Headers::new();
        headers.insert(CSRF_HEADER.to_string(), token);

        let result = if submission.files.is_empty() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
            let body = submission.to_json().to_string();
            self.http.post(&url, &body, &headers).await
        } else {
            self.http
                .post_multipart(&url, submission.to_form(), &headers)
                .await
        };
        let response = result.map_err(|e| TransportError::from_http(e, &url))?;
        check_status(response, &url)?;

        info!(
            parent_id = ?submission.parent_id,
            files = submission.files.len(),
            "Post created"
        );
        Ok(())
    }

    async fn get(&self, url: &str) -> BoardResult<Response> {
        let response = self
            .http
            .get(url, &Headers::new())
            .await
            .map_err(|e| TransportError::from_http(e, url))?;
        check_status(response, url)
    }
}

/// Pass 2xx responses through and classify everything else.
fn check_status(response: Response, url: &str) -> BoardResult<Response> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    if (400..500).contains(&status) {
        if let Some(validation) = ValidationError::from_body(&response.body) {
            debug!(url = %url, status, error = %validation, "Request rejected");
            return Err(BoardError::Validation(validation));
        }
    }

    let body = response.text().unwrap_or_default();
    let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    warn!(url = %url, status, "Request failed");
    Err(BoardError::Transport(TransportError::HttpStatus { status, message }))
}
