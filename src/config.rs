//! Board client configuration.
//!
//! Defaults suit a backend running locally; every field can be overridden
//! from the environment or with the `with_*` builder methods.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `POSTBOARD_API_URL` | `http://localhost:8000` |
//! | `POSTBOARD_PAGE_SIZE` | `25` |
//! | `POSTBOARD_MAX_DEPTH` | `64` |
//! | `POSTBOARD_COLLAPSE` | `retain` |
//! | `POSTBOARD_TIMEOUT_SECS` | `30` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::state::DEFAULT_PAGE_SIZE;

pub const ENV_API_URL: &str = "POSTBOARD_API_URL";
pub const ENV_PAGE_SIZE: &str = "POSTBOARD_PAGE_SIZE";
pub const ENV_MAX_DEPTH: &str = "POSTBOARD_MAX_DEPTH";
pub const ENV_COLLAPSE: &str = "POSTBOARD_COLLAPSE";
pub const ENV_TIMEOUT_SECS: &str = "POSTBOARD_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_RENDER_DEPTH: usize = 64;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What happens to expanded threads when the page is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsePolicy {
    /// Expanded threads stay expanded
    #[default]
    Retain,
    /// Collapse everything after a successful submission
    OnSubmit,
    /// Collapse everything whenever a new page is applied
    OnReload,
}

impl CollapsePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollapsePolicy::Retain => "retain",
            CollapsePolicy::OnSubmit => "on_submit",
            CollapsePolicy::OnReload => "on_reload",
        }
    }
}

impl fmt::Display for CollapsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollapsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "retain" => Ok(CollapsePolicy::Retain),
            "on_submit" => Ok(CollapsePolicy::OnSubmit),
            "on_reload" => Ok(CollapsePolicy::OnReload),
            other => Err(format!("unknown collapse policy '{}'", other)),
        }
    }
}

/// Configuration for a board session.
///
/// # Example
///
/// ```ignore
/// use postboard::config::{BoardConfig, CollapsePolicy};
///
/// let config = BoardConfig::default()
///     .with_api_url("https://board.example.com")
///     .with_collapse_policy(CollapsePolicy::OnSubmit);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Top-level posts per page
    pub page_size: u32,
    /// Deepest reply level listed by the thread view
    pub max_render_depth: usize,
    pub collapse_policy: CollapsePolicy,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_render_depth: DEFAULT_MAX_RENDER_DEPTH,
            collapse_policy: CollapsePolicy::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BoardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the page size (at least 1).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth;
        self
    }

    pub fn with_collapse_policy(mut self, policy: CollapsePolicy) -> Self {
        self.collapse_policy = policy;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read overrides from `POSTBOARD_*` environment variables.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BoardConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_api_url(url.trim());
        }
        if let Some(size) = parse_var::<u32>(&lookup, ENV_PAGE_SIZE) {
            if size == 0 {
                warn!(var = ENV_PAGE_SIZE, "Page size must be positive, using default");
            } else {
                config = config.with_page_size(size);
            }
        }
        if let Some(depth) = parse_var::<usize>(&lookup, ENV_MAX_DEPTH) {
            config = config.with_max_render_depth(depth);
        }
        if let Some(policy) = parse_var::<CollapsePolicy>(&lookup, ENV_COLLAPSE) {
            config = config.with_collapse_policy(policy);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_TIMEOUT_SECS) {
            config = config.with_request_timeout_secs(secs);
        }
        config
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(var = key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
