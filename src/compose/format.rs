//! Formatting toolbar: wrap the selected text in one of the allowed tags.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Italic,
    Bold,
    Code,
    /// Link to the selected text, which is taken as the URL
    Link,
    /// Replace the selection with a line break
    Break,
}

/// Result of applying a format: the new text and where the cursor lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub cursor: usize,
}

/// Apply `kind` to the byte range `range` of `text`.
///
/// The range is clamped to the text and moved back onto char boundaries, so
/// any range is accepted.
pub fn apply(text: &str, range: Range<usize>, kind: FormatKind) -> Formatted {
    let (start, end) = clamp_range(text, range);
    let selected = &text[start..end];

    let replacement = match kind {
        FormatKind::Italic => format!("<i>{}</i>", selected),
        FormatKind::Bold => format!("<strong>{}</strong>", selected),
        FormatKind::Code => format!("<code>{}</code>", selected),
        FormatKind::Link => {
            let url = link_target(selected).replace('"', "&quot;");
            format!(
                "<a href=\"{url}\" target=\"_blank\" title=\"{url}\">{}</a>",
                selected
            )
        }
        FormatKind::Break => "<br>".to_string(),
    };

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(&replacement);
    out.push_str(&text[end..]);
    Formatted {
        text: out,
        cursor: start + replacement.len(),
    }
}

/// Trimmed selection with `http://` added when it has no http(s) scheme.
fn link_target(selected: &str) -> String {
    let url = selected.trim();
    let lower = url.to_ascii_lowercase();
    if url.is_empty() || lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

fn clamp_range(text: &str, range: Range<usize>) -> (usize, usize) {
    let mut start = range.start.min(text.len());
    let mut end = range.end.min(text.len());
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (start, end.max(start))
}
