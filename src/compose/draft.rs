//! Post draft fields and the checks run before anything is sent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::models::PostId;

pub const MAX_USERNAME_CHARS: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Invalid username regex pattern"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex pattern")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[^\s/?#]+\.[^\s/?#]+(?:[/?#]\S*)?$")
        .expect("Invalid homepage regex pattern")
});

/// Who is posting; remembered from one post to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub homepage_url: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            homepage_url: String::new(),
        }
    }

    pub fn with_homepage(mut self, homepage_url: impl Into<String>) -> Self {
        self.homepage_url = homepage_url.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub identity: Identity,
    pub text: String,
    /// `None` for a top-level post
    pub parent_id: Option<PostId>,
}

impl PostDraft {
    pub fn new(parent_id: Option<PostId>) -> Self {
        Self {
            parent_id,
            ..Self::default()
        }
    }

    /// Homepage, or `None` when left blank
    pub fn homepage(&self) -> Option<&str> {
        let url = self.identity.homepage_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();
        let username = self.identity.username.trim();
        let email = self.identity.email.trim();

        if username.is_empty() {
            problems.push("User name is required.".to_string());
        } else if !USERNAME_RE.is_match(username) {
            problems.push("User name may contain only latin letters and digits.".to_string());
        } else if username.chars().count() > MAX_USERNAME_CHARS {
            problems.push(format!(
                "User name must be at most {} characters.",
                MAX_USERNAME_CHARS
            ));
        }

        if email.is_empty() {
            problems.push("E-mail is required.".to_string());
        } else if !EMAIL_RE.is_match(email) {
            problems.push("Enter a valid e-mail address.".to_string());
        }

        if let Some(url) = self.homepage() {
            if !URL_RE.is_match(url) {
                problems.push("Home page must be a valid http(s) URL.".to_string());
            }
        }

        if self.text.trim().is_empty() {
            problems.push("Text is required.".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_messages(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> PostDraft {
        PostDraft {
            identity: Identity::new("alice42", "alice@example.com"),
            text: "hello".to_string(),
            parent_id: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn test_username_rules() {
        let mut draft = valid_draft();
        draft.identity.username = "alice_42".to_string();
        assert!(draft.validate().unwrap_err().mentions("latin letters"));

        draft.identity.username = "a".repeat(151);
        assert!(draft.validate().unwrap_err().mentions("150"));

        draft.identity.username = "a".repeat(150);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_email_rules() {
        let mut draft = valid_draft();
        draft.identity.email = "not-an-email".to_string();
        assert!(draft.validate().unwrap_err().mentions("e-mail"));
    }

    #[test]
    fn test_homepage_optional_but_checked() {
        let mut draft = valid_draft();
        draft.identity.homepage_url = "   ".to_string();
        assert!(draft.validate().is_ok());
        assert_eq!(draft.homepage(), None);

        draft.identity.homepage_url = "ftp://example.com".to_string();
        assert!(draft.validate().unwrap_err().mentions("Home page"));

        draft.identity.homepage_url = "https://example.com/me?x=1".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_all_problems_reported() {
        let draft = PostDraft::new(Some(3));
        let err = draft.validate().unwrap_err();
        assert_eq!(err.messages.len(), 3);
        assert!(err.mentions("User name"));
        assert!(err.mentions("E-mail"));
        assert!(err.mentions("Text"));
    }
}
