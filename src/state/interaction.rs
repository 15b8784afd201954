//! Per-post interaction state: the open reply editor and expanded threads.
//!
//! Keyed by post id and kept apart from the tree, so it survives reloads.
//! Ids that are no longer on the page are simply never looked up.

use std::collections::HashSet;

use crate::models::PostId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    reply_target: Option<PostId>,
    expanded: HashSet<PostId>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the reply editor under `id`, or close it if it is already open there.
    ///
    /// Only one editor is open at a time. Returns the new target.
    pub fn toggle_reply(&mut self, id: PostId) -> Option<PostId> {
        self.reply_target = if self.reply_target == Some(id) {
            None
        } else {
            Some(id)
        };
        self.reply_target
    }

    pub fn cancel_reply(&mut self) {
        self.reply_target = None;
    }

    pub fn reply_target(&self) -> Option<PostId> {
        self.reply_target
    }

    pub fn is_reply_open(&self, id: PostId) -> bool {
        self.reply_target == Some(id)
    }

    /// Flip whether the replies under `id` are shown. Returns the new state.
    pub fn toggle_expanded(&mut self, id: PostId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn is_expanded(&self, id: PostId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expand_all(&mut self, ids: impl IntoIterator<Item = PostId>) {
        self.expanded.extend(ids);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// A reply to `id` was accepted by the server; close its editor.
    pub fn on_submit_success(&mut self, id: PostId) {
        if self.reply_target == Some(id) {
            self.reply_target = None;
        }
    }
}
