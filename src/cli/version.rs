//! Version command for the postboard CLI.

/// The current version of postboard, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_string() -> String {
    format!("postboard {}", VERSION)
}
