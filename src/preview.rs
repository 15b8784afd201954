//! Sanitizing formatter for the live post preview.
//!
//! [`render`] turns raw composer text into the small HTML subset the board
//! accepts:
//!
//! - every `\n` becomes `<br>`
//! - only `a`, `i`, `strong`, `b`, `code` and `br` survive; other tags are
//!   dropped and their inner text kept
//! - `a` keeps `href` and `title`, other tags keep no attributes
//! - a `<` that does not open a well-formed tag is emitted as `&lt;`
//! - `<!-- ... -->` comments are removed; an unterminated `<!--` is text
//!
//! The function is total: any input, however malformed, produces output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tags allowed in posts.
pub const ALLOWED_TAGS: &[&str] = &["a", "i", "strong", "b", "code", "br"];

/// Attributes allowed on `<a>`, in output order.
const LINK_ATTRIBUTES: &[&str] = &["href", "title"];

/// URL schemes that are never emitted in `href`.
const BLOCKED_SCHEMES: &[&str] = &["javascript", "vbscript", "data"];

/// A complete start or end tag at the beginning of the input.
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<(/?)([A-Za-z][A-Za-z0-9]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*/?>"#,
    )
    .expect("Invalid tag regex pattern")
});

/// One attribute inside a matched tag.
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .expect("Invalid attribute regex pattern")
});

/// Render composer text as sanitized HTML.
pub fn render(raw: &str) -> String {
    let text = raw.replace('\n', "<br>");
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    // Once a search for "-->" fails, no later "<!--" can be closed either.
    let mut comments_closed = true;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if comments_closed {
            if let Some(body) = rest.strip_prefix("<!--") {
                match body.find("-->") {
                    Some(end) => {
                        rest = &body[end + 3..];
                        continue;
                    }
                    None => comments_closed = false,
                }
            }
        }

        match TAG_RE.captures(rest) {
            Some(caps) => {
                let whole = caps.get(0).map_or(rest.len(), |m| m.end());
                let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());
                let name = caps
                    .get(2)
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .unwrap_or_default();
                let attrs = caps.get(3).map_or("", |m| m.as_str());

                if ALLOWED_TAGS.contains(&name.as_str()) {
                    emit_tag(&mut out, &name, closing, attrs);
                }
                rest = &rest[whole..];
            }
            None => {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn emit_tag(out: &mut String, name: &str, closing: bool, attrs: &str) {
    if closing {
        // `</br>` is treated like `<br>` by browsers
        if name == "br" {
            out.push_str("<br>");
        } else {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        return;
    }

    out.push('<');
    out.push_str(name);
    if name == "a" {
        for (key, value) in link_attributes(attrs) {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attribute(&value));
            out.push('"');
        }
    }
    out.push('>');
}

/// `href` and `title` of a link, first occurrence wins, unsafe hrefs dropped.
fn link_attributes(attrs: &str) -> Vec<(&'static str, String)> {
    let mut found: Vec<(&'static str, String)> = Vec::new();

    for caps in ATTR_RE.captures_iter(attrs) {
        let key = caps
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let Some(&allowed) = LINK_ATTRIBUTES.iter().find(|a| **a == key) else {
            continue;
        };
        if found.iter().any(|(k, _)| *k == allowed) {
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        if allowed == "href" && !is_safe_href(&value) {
            continue;
        }
        found.push((allowed, value));
    }

    found.sort_by_key(|(key, _)| LINK_ATTRIBUTES.iter().position(|a| a == key));
    found
}

/// Reject script-capable schemes, including ones hidden by whitespace or
/// character references.
fn is_safe_href(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    // "/path:x" and "?q=a:b" have no scheme
    let head = normalized
        .split(&['/', '?', '#'][..])
        .next()
        .unwrap_or_default();
    // A reference such as "&colon;" could decode to the scheme separator
    if head.contains('&') {
        return false;
    }
    match head.split_once(':') {
        Some((scheme, _)) => !BLOCKED_SCHEMES.contains(&scheme),
        None => true,
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(render("a\nb"), "a<br>b");
        assert_eq!(render("\n\n"), "<br><br>");
    }

    #[test]
    fn test_disallowed_tags_keep_text() {
        assert_eq!(render("<script>x</script>"), "x");
        assert_eq!(render("<div><p>hi</p></div>"), "hi");
    }

    #[test]
    fn test_link_keeps_only_href_and_title() {
        assert_eq!(
            render(r#"<a onclick="x" href="y">t</a>"#),
            r#"<a href="y">t</a>"#
        );
        assert_eq!(
            render(r#"<a title="t" target="_blank" href="http://e.com">e</a>"#),
            r#"<a href="http://e.com" title="t">e</a>"#
        );
    }

    #[test]
    fn test_allowed_tags_lose_attributes() {
        assert_eq!(
            render(r#"<strong style="color:red">b</strong>"#),
            "<strong>b</strong>"
        );
        assert_eq!(render("<I>x</I>"), "<i>x</i>");
        assert_eq!(render("<code class=\"x\">c</code>"), "<code>c</code>");
        assert_eq!(render("<b>x</b>"), "<b>x</b>");
    }

    #[test]
    fn test_br_forms_are_normalized() {
        assert_eq!(render("a<br/>b<br />c<BR>d"), "a<br>b<br>c<br>d");
    }

    #[test]
    fn test_stray_angle_bracket_is_escaped() {
        assert_eq!(render("1 < 2"), "1 &lt; 2");
        assert_eq!(render("<"), "&lt;");
        assert_eq!(render("<a href=\"x\""), "&lt;a href=\"x\"");
        assert_eq!(render("<<i>x</i>"), "&lt;<i>x</i>");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        assert_eq!(
            render(r#"<a title="a>b" href='y'>t</a>"#),
            r#"<a href="y" title="a&gt;b">t</a>"#
        );
    }

    #[test]
    fn test_unsafe_hrefs_are_dropped() {
        assert_eq!(render(r#"<a href="javascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href=" JaVa script:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="vbscript:x">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="data:text/html,x">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="&#106;avascript:x">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="javascript&colon;alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="javascript&#58;alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(render(r#"<a href="javascript&#x3A;alert(1)">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_ampersands_in_attributes_are_escaped() {
        assert_eq!(
            render(r#"<a href="/search?a=1&b=2" title="Q&amp;A">x</a>"#),
            r#"<a href="/search?a=1&amp;b=2" title="Q&amp;amp;A">x</a>"#
        );
    }

    #[test]
    fn test_relative_and_http_hrefs_kept() {
        assert_eq!(render(r#"<a href="/p?a=b:c">x</a>"#), r#"<a href="/p?a=b:c">x</a>"#);
        assert_eq!(
            render(r#"<a href=https://e.com>x</a>"#),
            r#"<a href="https://e.com">x</a>"#
        );
    }

    #[test]
    fn test_embedded_quote_is_escaped() {
        assert_eq!(
            render(r#"<a title='say "hi"'>x</a>"#),
            r#"<a title="say &quot;hi&quot;">x</a>"#
        );
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(render("a<!-- hidden -->b"), "ab");
        assert_eq!(render("<!---->x<!-- <b> -->y"), "xy");
    }

    #[test]
    fn test_unterminated_comment_is_text() {
        assert_eq!(render("a<!-- open <b>b</b>"), "a&lt;!-- open <b>b</b>");
        assert_eq!(render("<!--x<!--y"), "&lt;!--x&lt;!--y");
    }

    #[test]
    fn test_many_unterminated_comments_render_in_one_pass() {
        let input = "<!--".repeat(50_000);
        let out = render(&input);
        assert_eq!(out, "&lt;!--".repeat(50_000));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(render("hello & goodbye"), "hello & goodbye");
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        assert_eq!(render("żółw <i>🐢</i> <"), "żółw <i>🐢</i> &lt;");
    }
}
