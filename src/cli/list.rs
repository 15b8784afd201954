//! `postboard` default command: print one page of the board.

use std::fmt::Write as _;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::adapters::ReqwestHttpClient;
use crate::cli::args::ListOptions;
use crate::client::BoardClient;
use crate::config::BoardConfig;
use crate::state::PageTarget;
use crate::sync::{BoardSnapshot, SyncCoordinator};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex pattern"));
static BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid break regex pattern"));

/// Fetch the requested page and print it to stdout.
pub async fn run_list(options: ListOptions, config: BoardConfig) -> Result<()> {
    let http = ReqwestHttpClient::with_timeout(config.request_timeout())?;
    let client = Arc::new(BoardClient::new(Arc::new(http), config.api_url.clone()));
    let board = SyncCoordinator::new(client, config).with_sort(options.sort_state());

    board.mount().await.map_err(|e| eyre!(e.user_message()))?;
    if let Some(page) = options.page.filter(|&p| p > 1) {
        board
            .go_to_page(PageTarget::Number(page))
            .await
            .map_err(|e| eyre!(e.user_message()))?;
    }
    if options.expand_all {
        board.expand_all();
    }

    let snapshot = board.snapshot();
    debug!(rows = snapshot.rows().len(), "Rendering board");
    print!("{}", render_rows(&snapshot));
    Ok(())
}

/// Plain-text listing of the snapshot, replies indented under their parents.
pub fn render_rows(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Page {}/{} (sorted by {} {})",
        snapshot.page.current_page,
        snapshot.page.total_pages,
        snapshot.sort.key,
        snapshot.sort.direction
    );

    let rows = snapshot.rows();
    if rows.is_empty() {
        out.push_str("No posts yet.\n");
        return out;
    }

    for row in rows {
        let indent = "  ".repeat(row.depth);
        let post = row.post;
        let marker = match (row.has_replies, row.expanded) {
            (false, _) => ' ',
            (true, true) => '-',
            (true, false) => '+',
        };
        let _ = writeln!(
            out,
            "{}{} #{} {} <{}> {}",
            indent,
            marker,
            post.id,
            post.username,
            post.email,
            post.created_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(url) = post.homepage() {
            let _ = writeln!(out, "{}    {}", indent, url);
        }
        for line in plain_text(&post.body_html).lines() {
            let _ = writeln!(out, "{}    {}", indent, line);
        }
        if !post.attachments.is_empty() {
            let names: Vec<&str> = post.attachments.iter().map(|a| a.filename.as_str()).collect();
            let _ = writeln!(out, "{}    [files: {}]", indent, names.join(", "));
        }
        if row.truncated {
            let _ = writeln!(out, "{}    (replies nested too deep to show)", indent);
        }
    }
    out
}

fn plain_text(html: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(html, "\n");
    TAG_RE
        .replace_all(&with_breaks, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Post;
    use crate::state::{InteractionState, LightboxState, PageState, SortState};
    use serde_json::json;

    fn post(id: u64, body: &str, replies: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "id": id,
            "username": format!("user{}", id),
            "email": format!("user{}@example.com", id),
            "text_html": body,
            "created_at": "2024-03-01T12:30:00Z",
            "replies": replies,
        })
    }

    fn snapshot(tree: Vec<Post>, interaction: InteractionState) -> BoardSnapshot {
        BoardSnapshot {
            tree: Arc::new(tree),
            page: PageState {
                current_page: 1,
                total_pages: 2,
                page_size: 25,
            },
            sort: SortState::default(),
            interaction,
            lightbox: LightboxState::default(),
            loading: false,
            last_error: None,
            confirmed: None,
            max_render_depth: 64,
        }
    }

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(
            plain_text("<strong>hi</strong> &amp; bye<br>next"),
            "hi & bye\nnext"
        );
    }

    #[test]
    fn test_render_empty_board() {
        let out = render_rows(&snapshot(Vec::new(), InteractionState::new()));
        assert!(out.starts_with("Page 1/2 (sorted by id desc)"));
        assert!(out.contains("No posts yet."));
    }

    #[test]
    fn test_render_collapsed_and_expanded() {
        let tree: Vec<Post> = serde_json::from_value(json!([
            post(1, "<i>root</i>", vec![post(2, "reply", vec![])]),
        ]))
        .unwrap();

        let collapsed = render_rows(&snapshot(tree.clone(), InteractionState::new()));
        assert!(collapsed.contains("+ #1 user1 <user1@example.com> 2024-03-01 12:30"));
        assert!(collapsed.contains("    root"));
        assert!(!collapsed.contains("#2"));

        let mut interaction = InteractionState::new();
        interaction.toggle_expanded(1);
        let expanded = render_rows(&snapshot(tree, interaction));
        assert!(expanded.contains("- #1"));
        assert!(expanded.contains("\n   #2 user2"));
    }
}
