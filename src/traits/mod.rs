//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - HTTP operations the board client performs

pub mod http;

pub use http::{FilePart, Headers, HttpClient, HttpError, MultipartForm, Response};
