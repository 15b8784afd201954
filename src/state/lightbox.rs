//! Lightbox state for viewing a single image attachment.

use crate::models::Attachment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightboxState {
    open: bool,
    src: String,
    caption: String,
}

impl LightboxState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `src`, replacing whatever is currently open.
    pub fn open(&mut self, src: impl Into<String>, caption: impl Into<String>) {
        self.open = true;
        self.src = src.into();
        self.caption = caption.into();
    }

    /// Open an image attachment. Other files are downloads and are ignored.
    pub fn open_attachment(&mut self, attachment: &Attachment) -> bool {
        if !attachment.is_image() {
            return false;
        }
        self.open(attachment.data_url(), attachment.filename.clone());
        true
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str, content_type: &str) -> Attachment {
        Attachment {
            filename: name.to_string(),
            content_type: content_type.to_string(),
            payload: "aGk=".to_string(),
        }
    }

    #[test]
    fn test_open_replaces_current_item() {
        let mut lightbox = LightboxState::new();
        lightbox.open("a.png", "first");
        lightbox.open("b.png", "second");
        assert!(lightbox.is_open());
        assert_eq!(lightbox.src(), "b.png");
        assert_eq!(lightbox.caption(), "second");
    }

    #[test]
    fn test_close_resets() {
        let mut lightbox = LightboxState::new();
        lightbox.open("a.png", "first");
        lightbox.close();
        assert_eq!(lightbox, LightboxState::default());
    }

    #[test]
    fn test_open_attachment_image() {
        let mut lightbox = LightboxState::new();
        assert!(lightbox.open_attachment(&attachment("cat.png", "image/png")));
        assert_eq!(lightbox.src(), "data:image/png;base64,aGk=");
        assert_eq!(lightbox.caption(), "cat.png");
    }

    #[test]
    fn test_open_attachment_ignores_text_files() {
        let mut lightbox = LightboxState::new();
        assert!(!lightbox.open_attachment(&attachment("notes.txt", "text/plain")));
        assert!(!lightbox.is_open());
    }
}
