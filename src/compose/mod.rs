//! Composing posts and replies.
//!
//! A [`Composer`] owns one draft: the poster's identity, the text, the picked
//! files and the captcha it will be submitted with. Local checks run before
//! any request is made; the captcha is single-use and is replaced after every
//! submission that reached the server.

mod draft;
mod files;
pub mod format;

pub use draft::{Identity, PostDraft, MAX_USERNAME_CHARS};
pub use files::{content_type_for, FilePolicy, FileSelection, SelectedFile, FILES_FIELD};
pub use format::{FormatKind, Formatted};

use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{BoardClient, Submission};
use crate::error::{BoardError, BoardResult, ValidationError};
use crate::models::{CaptchaChallenge, PostId};
use crate::preview;
use crate::traits::HttpClient;

pub struct Composer<H: HttpClient> {
    client: Arc<BoardClient<H>>,
    draft: PostDraft,
    files: FileSelection,
    captcha: Option<CaptchaChallenge>,
}

impl<H: HttpClient> Composer<H> {
    /// A composer for a top-level post (`parent_id == None`) or a reply.
    pub fn new(client: Arc<BoardClient<H>>, parent_id: Option<PostId>) -> Self {
        Self {
            client,
            draft: PostDraft::new(parent_id),
            files: FileSelection::default(),
            captcha: None,
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.draft.identity = identity;
        self
    }

    pub fn with_file_policy(mut self, policy: FilePolicy) -> Self {
        self.files = FileSelection::new(policy);
        self
    }

    pub fn parent_id(&self) -> Option<PostId> {
        self.draft.parent_id
    }

    pub fn draft(&self) -> &PostDraft {
        &self.draft
    }

    pub fn identity(&self) -> &Identity {
        &self.draft.identity
    }

    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.draft.identity
    }

    pub fn text(&self) -> &str {
        &self.draft.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Apply a toolbar format to `range` of the text; returns the new cursor.
    pub fn apply_format(&mut self, range: Range<usize>, kind: FormatKind) -> usize {
        let formatted = format::apply(&self.draft.text, range, kind);
        self.draft.text = formatted.text;
        formatted.cursor
    }

    /// Sanitized HTML of the current text
    pub fn preview(&self) -> String {
        preview::render(&self.draft.text)
    }

    /// Attach files; rejected ones are reported and left out.
    pub fn attach(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> BoardResult<()> {
        self.files.add(files).map_err(BoardError::Validation)
    }

    pub fn files(&self) -> &[SelectedFile] {
        self.files.files()
    }

    pub fn remove_file(&mut self, index: usize) -> Option<SelectedFile> {
        self.files.remove(index)
    }

    pub fn captcha(&self) -> Option<&CaptchaChallenge> {
        self.captcha.as_ref()
    }

    /// Fetch a new captcha, replacing the current one.
    pub async fn load_captcha(&mut self) -> BoardResult<&CaptchaChallenge> {
        let challenge = self.client.fetch_captcha().await?;
        debug!(key = %challenge.key, "Loaded captcha");
        Ok(&*self.captcha.insert(challenge))
    }

    /// Submit the draft with the answer to the current captcha.
    ///
    /// On success the text, files and captcha are reset (the identity is kept)
    /// and the parent id is returned. Local problems are reported without
    /// contacting the server.
    pub async fn submit(&mut self, captcha_answer: &str) -> BoardResult<Option<PostId>> {
        let submission = self.prepare(captcha_answer)?;
        let result = self.client.create_post(&submission).await;

        if let Err(e) = self.refresh_captcha().await {
            warn!(error = %e, "Failed to refresh captcha");
        }

        match result {
            Ok(()) => {
                self.draft.text.clear();
                self.files.clear();
                Ok(self.draft.parent_id)
            }
            Err(e) => {
                warn!(
                    parent_id = ?self.draft.parent_id,
                    error = %e,
                    code = e.error_code(),
                    "Submission failed"
                );
                Err(e)
            }
        }
    }

    fn prepare(&self, captcha_answer: &str) -> BoardResult<Submission> {
        let mut problems = match self.draft.validate() {
            Ok(()) => Vec::new(),
            Err(e) => e.messages,
        };
        let captcha_answer = captcha_answer.trim();
        if captcha_answer.is_empty() {
            problems.push("Captcha is required.".to_string());
        }
        let captcha_key = match &self.captcha {
            Some(challenge) => challenge.key.clone(),
            None => {
                problems.push("Captcha has not been loaded.".to_string());
                String::new()
            }
        };
        if !problems.is_empty() {
            return Err(BoardError::Validation(ValidationError::from_messages(
                problems,
            )));
        }

        let identity = &self.draft.identity;
        Ok(Submission {
            username: identity.username.trim().to_string(),
            email: identity.email.trim().to_string(),
            homepage_url: self.draft.homepage().map(str::to_string),
            text_html: self.draft.text.clone(),
            parent_id: self.draft.parent_id,
            captcha_key,
            captcha_answer: captcha_answer.to_string(),
            files: self.files.files().to_vec(),
        })
    }

    /// Replace the used captcha; it is cleared if a new one cannot be had.
    async fn refresh_captcha(&mut self) -> BoardResult<()> {
        self.captcha = None;
        self.load_captcha().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockHttpClient;
    use crate::client::{CAPTCHA_PATH, CREATE_PATH, CSRF_COOKIE};
    use serde_json::json;

    const BASE: &str = "http://board.test";

    fn setup() -> (Arc<MockHttpClient>, Composer<MockHttpClient>) {
        let http = Arc::new(MockHttpClient::new());
        http.set_json(
            &format!("{}{}", BASE, CAPTCHA_PATH),
            200,
            json!({"captcha_key": "k1", "captcha_image_url": "/captcha/image/k1/"}),
        );
        http.set_json(&format!("{}{}", BASE, CREATE_PATH), 201, json!({}));
        http.set_cookie(CSRF_COOKIE, "tok");
        let client = Arc::new(BoardClient::new(Arc::clone(&http), BASE));
        let composer = Composer::new(client, Some(7))
            .with_identity(Identity::new("alice", "alice@example.com"));
        (http, composer)
    }

    fn create_requests(http: &MockHttpClient) -> usize {
        http.requests_to(&format!("{}{}", BASE, CREATE_PATH)).len()
    }

    #[tokio::test]
    async fn test_submit_success_resets_draft_keeps_identity() {
        let (http, mut composer) = setup();
        composer.load_captcha().await.unwrap();
        composer.set_text("hello");
        composer
            .attach(vec![SelectedFile::new("a.png", "image/png", vec![1u8])])
            .unwrap();

        let parent = composer.submit("answer").await.unwrap();

        assert_eq!(parent, Some(7));
        assert_eq!(composer.text(), "");
        assert!(composer.files().is_empty());
        assert_eq!(composer.identity().username, "alice");
        assert_eq!(create_requests(&http), 1);
        // one captcha on load, one after the submission
        assert_eq!(http.requests_to(&format!("{}{}", BASE, CAPTCHA_PATH)).len(), 2);
    }

    #[tokio::test]
    async fn test_local_validation_makes_no_request() {
        let (http, mut composer) = setup();
        composer.load_captcha().await.unwrap();
        http.clear_requests();

        let err = composer.submit("answer").await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(ref v) if v.mentions("Text")));
        assert!(http.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_captcha_answer() {
        let (http, mut composer) = setup();
        composer.load_captcha().await.unwrap();
        composer.set_text("hello");

        let err = composer.submit("  ").await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(ref v) if v.mentions("Captcha")));
        assert_eq!(create_requests(&http), 0);
    }

    #[tokio::test]
    async fn test_rejected_file_makes_no_request() {
        let (http, mut composer) = setup();
        composer.load_captcha().await.unwrap();
        composer.set_text("hello");

        let err = composer
            .attach(vec![
                SelectedFile::new("ok.png", "image/png", vec![1u8]),
                SelectedFile::new("big.png", "image/png", vec![0u8; 6 * 1024 * 1024]),
            ])
            .unwrap_err();

        assert!(matches!(err, BoardError::Validation(ref v) if v.mentions("big.png")));
        assert_eq!(composer.files().len(), 1);
        assert_eq!(composer.files()[0].filename, "ok.png");
        assert_eq!(create_requests(&http), 0);
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_text_and_refreshes_captcha() {
        let (http, mut composer) = setup();
        http.set_json(
            &format!("{}{}", BASE, CREATE_PATH),
            400,
            json!({"error": "Invalid captcha."}),
        );
        composer.load_captcha().await.unwrap();
        composer.set_text("hello");
        http.set_json(
            &format!("{}{}", BASE, CAPTCHA_PATH),
            200,
            json!({"captcha_key": "k2", "captcha_image_url": "/captcha/image/k2/"}),
        );

        let err = composer.submit("wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Error: Invalid captcha.");
        assert_eq!(composer.text(), "hello");
        assert_eq!(composer.captcha().map(|c| c.key.as_str()), Some("k2"));
    }

    #[test]
    fn test_preview_and_format() {
        let (_, mut composer) = setup();
        composer.set_text("bold\nline");
        let cursor = composer.apply_format(0..4, FormatKind::Bold);
        assert_eq!(cursor, "<strong>bold</strong>".len());
        assert_eq!(composer.preview(), "<strong>bold</strong><br>line");
    }
}
