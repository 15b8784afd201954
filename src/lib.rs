//! postboard - client core for a threaded comment board
//!
//! The crate keeps a local, consistent view of one page of a comment board:
//! the post tree, pagination and sort state, which threads are expanded and
//! which reply form is open. It loads pages and submits posts through an
//! [`traits::HttpClient`], and renders user-typed previews with a small
//! allowlist sanitizer.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod models;
pub mod preview;
pub mod state;
pub mod store;
pub mod sync;
pub mod traits;
