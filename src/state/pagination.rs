//! Pagination and sort state for the post list.
//!
//! The controller holds the *intended* view: every mutation is applied
//! synchronously and yields the [`FetchDescriptor`] the coordinator should
//! fetch next. What the server last confirmed is tracked by the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Posts per page used by the board
pub const DEFAULT_PAGE_SIZE: u32 = 25;

// ============================================================================
// Sort
// ============================================================================

/// Column the post list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Username,
    Email,
    CreatedAt,
}

impl SortKey {
    /// Value sent as `sort_by`
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Username => "username",
            SortKey::Email => "email",
            SortKey::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "username" | "user" => Ok(SortKey::Username),
            "email" => Ok(SortKey::Email),
            "created_at" | "date" => Ok(SortKey::CreatedAt),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Value sent as `sort_order`
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one active sort column and its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

impl Default for SortState {
    /// Newest posts first
    fn default() -> Self {
        Self::new(SortKey::Id, SortDirection::Desc)
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Invariant: `1 <= current_page <= total_pages`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl PageState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Navigation request from the pager controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    Prev,
    Next,
    Number(u32),
}

/// Everything needed to request one page from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchDescriptor {
    pub page: u32,
    pub page_size: u32,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

// ============================================================================
// PaginationController
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    page: PageState,
    sort: SortState,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: PageState::new(page_size),
            sort: SortState::default(),
        }
    }

    /// Start from a sort other than the default.
    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn descriptor(&self) -> FetchDescriptor {
        FetchDescriptor {
            page: self.page.current_page,
            page_size: self.page.page_size,
            sort_key: self.sort.key,
            sort_direction: self.sort.direction,
        }
    }

    /// Page `target` would land on, clamped to the known range.
    pub fn resolve(&self, target: PageTarget) -> u32 {
        let current = self.page.current_page;
        let resolved = match target {
            PageTarget::Prev => current.saturating_sub(1),
            PageTarget::Next => current.saturating_add(1),
            PageTarget::Number(n) => n,
        };
        resolved.clamp(1, self.page.total_pages)
    }

    /// Move to another page.
    ///
    /// Returns `None` when the resolved page is the current one, in which case
    /// nothing needs fetching.
    pub fn go_to_page(&mut self, target: PageTarget) -> Option<FetchDescriptor> {
        let page = self.resolve(target);
        if page == self.page.current_page {
            return None;
        }
        self.page.current_page = page;
        Some(self.descriptor())
    }

    /// Same key flips the direction, a new key starts ascending. Always back to page 1.
    pub fn set_sort(&mut self, key: SortKey) -> FetchDescriptor {
        self.sort = if self.sort.key == key {
            SortState::new(key, self.sort.direction.flipped())
        } else {
            SortState::new(key, SortDirection::Asc)
        };
        self.page.current_page = 1;
        self.descriptor()
    }

    /// Record the page count reported by the server.
    ///
    /// `0` means an empty list and counts as a single page.
    pub fn apply_total_pages(&mut self, total_pages: u32) {
        self.page.total_pages = total_pages.max(1);
        self.page.current_page = self.page.current_page.clamp(1, self.page.total_pages);
    }
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
