//! Sync coordinator: keeps the local board state consistent with the server.
//!
//! Every user action mutates local state synchronously and then, if the
//! visible data depends on it, fetches the matching page. Each fetch is tagged
//! with a generation number; only the completion carrying the newest
//! generation may touch the store or the error state, so a slow response can
//! never overwrite the result of a later request.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. All methods take `&self`, so several operations can be in flight
//! at once from one task (e.g. with `tokio::join!`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::client::BoardClient;
use crate::compose::{Composer, Identity};
use crate::config::{BoardConfig, CollapsePolicy};
use crate::error::{BoardError, BoardResult};
use crate::models::{Attachment, Post, PostId, PostPage};
use crate::state::{
    FetchDescriptor, InteractionState, LightboxState, PageState, PageTarget,
    PaginationController, SortKey, SortState,
};
use crate::store::{visible_rows_in, ThreadRow, ThreadStore};
use crate::traits::HttpClient;

/// How a fetch ended, from the point of view of local state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new tree was stored
    Applied,
    /// A newer fetch was issued meanwhile; the result was dropped
    Discarded,
    /// Nothing to do: the server returned what is already shown, or the
    /// requested page is already current
    Unchanged,
}

/// Read-only view of everything a renderer needs.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub tree: Arc<Vec<Post>>,
    pub page: PageState,
    pub sort: SortState,
    pub interaction: InteractionState,
    pub lightbox: LightboxState,
    pub loading: bool,
    pub last_error: Option<BoardError>,
    /// Descriptor of the page the tree came from
    pub confirmed: Option<FetchDescriptor>,
    pub max_render_depth: usize,
}

impl BoardSnapshot {
    /// Display rows for the snapshot's tree and interaction state.
    pub fn rows(&self) -> Vec<ThreadRow<'_>> {
        visible_rows_in(&self.tree, &self.interaction, self.max_render_depth)
    }
}

#[derive(Debug)]
struct BoardState {
    store: ThreadStore,
    pagination: PaginationController,
    interaction: InteractionState,
    lightbox: LightboxState,
    confirmed: Option<FetchDescriptor>,
    last_error: Option<BoardError>,
    loading: bool,
}

pub struct SyncCoordinator<H: HttpClient> {
    client: Arc<BoardClient<H>>,
    config: BoardConfig,
    state: Mutex<BoardState>,
    /// Generation of the most recently issued fetch
    generation: AtomicU64,
}

impl<H: HttpClient> SyncCoordinator<H> {
    pub fn new(client: Arc<BoardClient<H>>, config: BoardConfig) -> Self {
        let state = BoardState {
            store: ThreadStore::new(),
            pagination: PaginationController::new(config.page_size),
            interaction: InteractionState::new(),
            lightbox: LightboxState::new(),
            confirmed: None,
            last_error: None,
            loading: false,
        };
        Self {
            client,
            config,
            state: Mutex::new(state),
            generation: AtomicU64::new(0),
        }
    }

    /// Start from a sort order other than newest-first.
    pub fn with_sort(self, sort: SortState) -> Self {
        {
            let mut state = self.lock();
            state.pagination = state.pagination.clone().with_sort(sort);
        }
        self
    }

    pub fn client(&self) -> &Arc<BoardClient<H>> {
        &self.client
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    /// Initial fetch when the board is first shown.
    pub async fn mount(&self) -> BoardResult<FetchOutcome> {
        info!(api_url = %self.client.base_url(), "Mounting board");
        self.fetch_current().await
    }

    /// Fetch the current page again.
    pub async fn reload(&self) -> BoardResult<FetchOutcome> {
        self.fetch_current().await
    }

    pub async fn go_to_page(&self, target: PageTarget) -> BoardResult<FetchOutcome> {
        let started = {
            let mut state = self.lock();
            match state.pagination.go_to_page(target) {
                Some(_) => Some(self.begin_fetch(&mut state)),
                None => None,
            }
        };
        match started {
            Some((generation, descriptor)) => self.run_fetch(generation, descriptor).await,
            None => Ok(FetchOutcome::Unchanged),
        }
    }

    /// Sort by `key` (flipping direction if already sorted by it) and fetch page 1.
    pub async fn set_sort(&self, key: SortKey) -> BoardResult<FetchOutcome> {
        let (generation, descriptor) = {
            let mut state = self.lock();
            state.pagination.set_sort(key);
            self.begin_fetch(&mut state)
        };
        self.run_fetch(generation, descriptor).await
    }

    async fn fetch_current(&self) -> BoardResult<FetchOutcome> {
        let (generation, descriptor) = {
            let mut state = self.lock();
            self.begin_fetch(&mut state)
        };
        self.run_fetch(generation, descriptor).await
    }

    /// Tag a new fetch of the intended descriptor.
    fn begin_fetch(&self, state: &mut BoardState) -> (u64, FetchDescriptor) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let descriptor = state.pagination.descriptor();
        state.loading = true;
        debug!(
            generation,
            page = descriptor.page,
            sort_key = %descriptor.sort_key,
            sort_direction = %descriptor.sort_direction,
            "Fetching page"
        );
        (generation, descriptor)
    }

    async fn run_fetch(
        &self,
        generation: u64,
        descriptor: FetchDescriptor,
    ) -> BoardResult<FetchOutcome> {
        let result = self.client.fetch_posts(&descriptor).await;
        let outcome = self.complete_fetch(generation, descriptor, result)?;

        // The server may report fewer pages than the one just requested;
        // follow the clamped page once
        if outcome == FetchOutcome::Applied {
            let follow_up = {
                let mut state = self.lock();
                if state.confirmed != Some(state.pagination.descriptor()) {
                    Some(self.begin_fetch(&mut state))
                } else {
                    None
                }
            };
            if let Some((generation, descriptor)) = follow_up {
                debug!(page = descriptor.page, "Requested page out of range, following");
                let result = self.client.fetch_posts(&descriptor).await;
                return self.complete_fetch(generation, descriptor, result);
            }
        }
        Ok(outcome)
    }

    /// Apply a fetch result if it belongs to the latest generation.
    fn complete_fetch(
        &self,
        generation: u64,
        descriptor: FetchDescriptor,
        result: BoardResult<PostPage>,
    ) -> BoardResult<FetchOutcome> {
        let mut state = self.lock();
        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(
                generation,
                latest,
                ok = result.is_ok(),
                "Discarding stale response"
            );
            return Ok(FetchOutcome::Discarded);
        }
        state.loading = false;

        match result {
            Ok(page) => {
                let unchanged = state.confirmed == Some(descriptor)
                    && state.store.current_tree().as_slice() == page.posts.as_slice();

                state.pagination.apply_total_pages(page.total_pages);
                state.confirmed = Some(descriptor);
                state.last_error = None;
                if self.config.collapse_policy == CollapsePolicy::OnReload {
                    state.interaction.collapse_all();
                }

                if unchanged {
                    debug!(generation, page = descriptor.page, "Page unchanged");
                    return Ok(FetchOutcome::Unchanged);
                }

                let count = page.posts.len();
                state.store.replace_page(page.posts);
                info!(
                    generation,
                    page = descriptor.page,
                    total_pages = state.pagination.page().total_pages,
                    posts = count,
                    "Applied page"
                );
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                warn!(
                    generation,
                    page = descriptor.page,
                    error = %e,
                    code = e.error_code(),
                    "Fetch failed, keeping previous page"
                );
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Submitting
    // ------------------------------------------------------------------------

    /// Composer sharing this coordinator's API client.
    pub fn composer(&self, parent_id: Option<PostId>, identity: Identity) -> Composer<H> {
        Composer::new(Arc::clone(&self.client), parent_id).with_identity(identity)
    }

    /// Submit `composer` and refresh the page once the server accepts it.
    ///
    /// Returns the parent id of the accepted post. A failed refresh does not
    /// fail the submission; it is recorded like any other fetch error.
    pub async fn submit(
        &self,
        composer: &mut Composer<H>,
        captcha_answer: &str,
    ) -> BoardResult<Option<PostId>> {
        let parent_id = composer.submit(captcha_answer).await?;

        {
            let mut state = self.lock();
            if let Some(id) = parent_id {
                state.interaction.on_submit_success(id);
            }
            if self.config.collapse_policy == CollapsePolicy::OnSubmit {
                state.interaction.collapse_all();
            }
        }
        info!(parent_id = ?parent_id, "Submission accepted, reloading");

        if let Err(e) = self.reload().await {
            warn!(error = %e, "Reload after submission failed");
        }
        Ok(parent_id)
    }

    // ------------------------------------------------------------------------
    // Local interaction
    // ------------------------------------------------------------------------

    pub fn toggle_reply(&self, id: PostId) -> Option<PostId> {
        self.lock().interaction.toggle_reply(id)
    }

    pub fn toggle_expanded(&self, id: PostId) -> bool {
        self.lock().interaction.toggle_expanded(id)
    }

    /// Expand every thread on the current page.
    pub fn expand_all(&self) {
        let mut state = self.lock();
        let ids = state.store.expandable_ids();
        state.interaction.expand_all(ids);
    }

    pub fn collapse_all(&self) {
        self.lock().interaction.collapse_all();
    }

    pub fn open_lightbox(&self, src: impl Into<String>, caption: impl Into<String>) {
        self.lock().lightbox.open(src, caption);
    }

    /// Open an image attachment; returns false for files that are not images.
    pub fn open_attachment(&self, attachment: &Attachment) -> bool {
        self.lock().lightbox.open_attachment(attachment)
    }

    pub fn close_lightbox(&self) {
        self.lock().lightbox.close();
    }

    // ------------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> BoardSnapshot {
        let state = self.lock();
        BoardSnapshot {
            tree: state.store.current_tree(),
            page: state.pagination.page(),
            sort: state.pagination.sort(),
            interaction: state.interaction.clone(),
            lightbox: state.lightbox.clone(),
            loading: state.loading,
            last_error: state.last_error.clone(),
            confirmed: state.confirmed,
            max_render_depth: self.config.max_render_depth,
        }
    }

    pub fn current_tree(&self) -> Arc<Vec<Post>> {
        self.lock().store.current_tree()
    }

    /// Descriptor the user asked for, possibly not yet loaded
    pub fn intended_descriptor(&self) -> FetchDescriptor {
        self.lock().pagination.descriptor()
    }

    /// Descriptor of the page currently shown
    pub fn confirmed_descriptor(&self) -> Option<FetchDescriptor> {
        self.lock().confirmed
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn last_error(&self) -> Option<BoardError> {
        self.lock().last_error.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
