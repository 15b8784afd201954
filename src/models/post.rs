use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    deserialize_id, deserialize_nullable_string, deserialize_nullable_vec, deserialize_optional_id,
};

/// Server-assigned post identifier
pub type PostId = u64;

/// A file attached to a post, as returned by the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded file content (API sends as "file_base64")
    #[serde(rename = "file_base64", default)]
    pub payload: String,
}

impl Attachment {
    /// Whether the attachment can be shown inline in the viewer
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image")
    }

    /// `data:` URL suitable for an image source or a download link
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.payload)
    }

    /// Decode the transport payload back to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(self.payload.as_bytes())
    }
}

/// A post or a reply; both share the same recursive shape.
///
/// Equality and drop walk the reply tree with an explicit stack, so threads
/// of any depth are safe to compare and free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: PostId,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub email: String,
    #[serde(default)]
    pub homepage_url: Option<String>,
    /// Pre-sanitized HTML body (API sends as "text_html")
    #[serde(
        rename = "text_html",
        default,
        deserialize_with = "deserialize_nullable_string"
    )]
    pub body_html: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Parent post id for replies (API sends as "parent")
    #[serde(
        rename = "parent",
        default,
        deserialize_with = "deserialize_optional_id"
    )]
    pub parent_id: Option<PostId>,
    #[serde(rename = "files", default, deserialize_with = "deserialize_nullable_vec")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "deserialize_nullable_vec")]
    pub replies: Vec<Post>,
}

impl Post {
    /// Body with raw newlines turned into line breaks for display
    pub fn display_html(&self) -> String {
        self.body_html.replace('\n', "<br />")
    }

    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    /// Homepage link, ignoring blank values the server may send
    pub fn homepage(&self) -> Option<&str> {
        self.homepage_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.username == other.username
            && self.email == other.email
            && self.homepage_url == other.homepage_url
            && self.body_html == other.body_html
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.parent_id == other.parent_id
            && self.attachments == other.attachments
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_content(b) || a.replies.len() != b.replies.len() {
                return false;
            }
            pending.extend(a.replies.iter().zip(b.replies.iter()));
        }
        true
    }
}

impl Drop for Post {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut post) = stack.pop() {
            stack.append(&mut post.replies);
        }
    }
}

/// Response from the post list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostPage {
    #[serde(default, deserialize_with = "deserialize_nullable_vec")]
    pub posts: Vec<Post>,
    /// Number of pages for the current page size (API sends as "totalPages")
    #[serde(rename = "totalPages", default = "default_total_pages")]
    pub total_pages: u32,
}

fn default_total_pages() -> u32 {
    1
}

impl PostPage {
    /// Parse a list response without a nesting limit.
    ///
    /// Each reply level costs two levels of JSON nesting, so the default
    /// parser limit would reject threads a few dozen replies deep. The
    /// stack grows on the heap as the parser descends.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut json = serde_json::Deserializer::from_slice(bytes);
        json.disable_recursion_limit();
        let page = PostPage::deserialize(serde_stacker::Deserializer::new(&mut json))?;
        json.end()?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_JSON: &str = r#"{
        "posts": [
            {
                "id": 7,
                "username": "alice",
                "email": "alice@example.com",
                "homepage_url": null,
                "text_html": "hello\nworld",
                "created_at": "2024-03-01T10:00:00Z",
                "updated_at": "2024-03-01T10:00:00Z",
                "parent": null,
                "files": [
                    {"filename": "a.png", "content_type": "image/png", "file_base64": "aGk="}
                ],
                "replies": [
                    {
                        "id": 9,
                        "username": "bob",
                        "email": "bob@example.com",
                        "text_html": "re",
                        "created_at": "2024-03-01T11:00:00Z",
                        "parent": 7,
                        "replies": []
                    }
                ]
            }
        ],
        "totalPages": 3
    }"#;

    #[test]
    fn test_post_page_deserialize() {
        let page: PostPage = serde_json::from_str(PAGE_JSON).unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.posts.len(), 1);

        let post = &page.posts[0];
        assert_eq!(post.id, 7);
        assert_eq!(post.body_html, "hello\nworld");
        assert_eq!(post.attachments.len(), 1);
        assert_eq!(post.replies[0].id, 9);
        assert_eq!(post.replies[0].parent_id, Some(7));
        assert!(post.replies[0].attachments.is_empty());
    }

    #[test]
    fn test_post_page_defaults() {
        let page: PostPage = serde_json::from_str(r#"{"posts": null}"#).unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_display_html_converts_newlines() {
        let page: PostPage = serde_json::from_str(PAGE_JSON).unwrap();
        assert_eq!(page.posts[0].display_html(), "hello<br />world");
    }

    #[test]
    fn test_attachment_data_url_and_decode() {
        let attachment = Attachment {
            filename: "a.png".to_string(),
            content_type: "image/png".to_string(),
            payload: "aGk=".to_string(),
        };
        assert!(attachment.is_image());
        assert_eq!(attachment.data_url(), "data:image/png;base64,aGk=");
        assert_eq!(attachment.decode().unwrap(), b"hi");
    }

    /// `{"posts": [<root> -> ... -> <leaf>], "totalPages": 1}` as raw JSON
    fn deep_page_json(depth: usize) -> String {
        let mut json = String::from(r#"{"posts":["#);
        for id in 1..=depth {
            json.push_str(&format!(
                r#"{{"id":{},"username":"u","email":"u@example.com","text_html":"x","created_at":"2024-03-01T10:00:00Z","replies":["#,
                id
            ));
        }
        for _ in 0..depth {
            json.push_str("]}");
        }
        json.push_str(r#"],"totalPages":1}"#);
        json
    }

    fn depth_of(post: &Post) -> usize {
        let mut depth = 1;
        let mut node = post;
        while let Some(child) = node.replies.first() {
            depth += 1;
            node = child;
        }
        depth
    }

    #[test]
    fn test_from_slice_accepts_deep_threads() {
        for depth in [63, 100, 5_000] {
            let page = PostPage::from_slice(deep_page_json(depth).as_bytes()).unwrap();
            assert_eq!(depth_of(&page.posts[0]), depth);
        }
    }

    #[test]
    fn test_from_slice_rejects_trailing_garbage() {
        assert!(PostPage::from_slice(br#"{"posts": []} x"#).is_err());
        assert!(PostPage::from_slice(b"").is_err());
    }

    #[test]
    fn test_deep_threads_compare_and_drop() {
        let json = deep_page_json(20_000);
        let a = PostPage::from_slice(json.as_bytes()).unwrap();
        let b = PostPage::from_slice(json.as_bytes()).unwrap();
        assert_eq!(a, b);

        // Differs only in the innermost reply
        let leaf_changed = json.replacen(r#""id":20000,"#, r#""id":0,"#, 1);
        let c = PostPage::from_slice(leaf_changed.as_bytes()).unwrap();
        assert!(a != c);
    }

    #[test]
    fn test_homepage_ignores_blank() {
        let mut page: PostPage = serde_json::from_str(PAGE_JSON).unwrap();
        let post = &mut page.posts[0];
        assert_eq!(post.homepage(), None);
        post.homepage_url = Some("  ".to_string());
        assert_eq!(post.homepage(), None);
        post.homepage_url = Some("https://alice.dev".to_string());
        assert_eq!(post.homepage(), Some("https://alice.dev"));
    }
}
