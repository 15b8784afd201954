//! Thread store: the post tree of the page currently on screen.
//!
//! The tree is replaced wholesale on every successful fetch and handed out as
//! a shared read-only snapshot. There is no API for patching single nodes.
//! All traversals use an explicit stack, so deeply nested threads cannot
//! overflow the call stack.

use std::sync::Arc;

use crate::models::{Post, PostId};
use crate::state::InteractionState;

/// Depth past which [`ThreadStore::find`] and [`ThreadStore::node_count`] stop descending
pub const MAX_TRAVERSAL_DEPTH: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct ThreadStore {
    tree: Arc<Vec<Post>>,
}

/// One line of the flattened, display-ordered thread list
#[derive(Debug, Clone, Copy)]
pub struct ThreadRow<'a> {
    pub id: PostId,
    pub post: &'a Post,
    /// 0 for top-level posts
    pub depth: usize,
    pub has_replies: bool,
    pub expanded: bool,
    pub reply_open: bool,
    /// Expanded, but its replies are nested too deep to be listed
    pub truncated: bool,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the posts of a freshly fetched page.
    pub fn replace_page(&mut self, posts: Vec<Post>) {
        self.tree = Arc::new(posts);
    }

    /// Snapshot of the current tree; later replacements do not affect it.
    pub fn current_tree(&self) -> Arc<Vec<Post>> {
        Arc::clone(&self.tree)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Number of top-level posts on the page
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn find(&self, id: PostId) -> Option<&Post> {
        find_in(&self.tree, id)
    }

    /// Posts on the page including all nested replies
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<(&Post, usize)> = self.tree.iter().map(|p| (p, 0)).collect();
        while let Some((post, depth)) = stack.pop() {
            count += 1;
            if depth < MAX_TRAVERSAL_DEPTH {
                stack.extend(post.replies.iter().map(|r| (r, depth + 1)));
            }
        }
        count
    }

    /// Ids of every post that has replies, for "expand all"
    pub fn expandable_ids(&self) -> Vec<PostId> {
        let mut ids = Vec::new();
        let mut stack: Vec<(&Post, usize)> = self.tree.iter().map(|p| (p, 0)).collect();
        while let Some((post, depth)) = stack.pop() {
            if post.has_replies() {
                ids.push(post.id);
            }
            if depth < MAX_TRAVERSAL_DEPTH {
                stack.extend(post.replies.iter().map(|r| (r, depth + 1)));
            }
        }
        ids
    }

    /// Flatten the tree into display order.
    ///
    /// Replies are listed only under expanded posts. Posts deeper than
    /// `max_depth` are left out and their parent row is marked `truncated`.
    pub fn visible_rows<'a>(
        &'a self,
        interaction: &InteractionState,
        max_depth: usize,
    ) -> Vec<ThreadRow<'a>> {
        visible_rows_in(&self.tree, interaction, max_depth)
    }
}

/// Depth-first search for `id` in `posts`.
pub fn find_in(posts: &[Post], id: PostId) -> Option<&Post> {
    let mut stack: Vec<(&Post, usize)> = posts.iter().map(|p| (p, 0)).collect();
    while let Some((post, depth)) = stack.pop() {
        if post.id == id {
            return Some(post);
        }
        if depth < MAX_TRAVERSAL_DEPTH {
            stack.extend(post.replies.iter().map(|r| (r, depth + 1)));
        }
    }
    None
}

/// [`ThreadStore::visible_rows`] over any snapshot of the tree.
pub fn visible_rows_in<'a>(
    posts: &'a [Post],
    interaction: &InteractionState,
    max_depth: usize,
) -> Vec<ThreadRow<'a>> {
    let mut rows = Vec::with_capacity(posts.len());
    // Reversed so the first post is popped first
    let mut stack: Vec<(&Post, usize)> = posts.iter().rev().map(|p| (p, 0)).collect();

    while let Some((post, depth)) = stack.pop() {
        let expanded = interaction.is_expanded(post.id);
        let descend = expanded && post.has_replies();
        let truncated = descend && depth >= max_depth;

        rows.push(ThreadRow {
            id: post.id,
            post,
            depth,
            has_replies: post.has_replies(),
            expanded,
            reply_open: interaction.is_reply_open(post.id),
            truncated,
        });

        if descend && !truncated {
            stack.extend(post.replies.iter().rev().map(|r| (r, depth + 1)));
        }
    }
    rows
}
