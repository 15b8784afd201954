//! CLI module for postboard.
//!
//! Parses the command line and runs the selected command:
//! - `--version` / `--help`
//! - listing one page of posts (the default)
//!
//! # Usage
//!
//! ```ignore
//! use postboard::cli::{parse_args, run_cli_command};
//! use postboard::config::BoardConfig;
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, BoardConfig::from_env()).await?;
//! ```

pub mod args;
pub mod list;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, ListOptions, USAGE};
pub use list::{render_rows, run_list};
pub use version::{version_string, VERSION};

use color_eyre::Result;

use crate::config::BoardConfig;

/// Run a parsed command to completion.
pub async fn run_cli_command(command: CliCommand, config: BoardConfig) -> Result<()> {
    match command {
        CliCommand::Version => {
            println!("{}", version_string());
            Ok(())
        }
        CliCommand::Help => {
            println!("{}\n\n{}", version_string(), USAGE);
            Ok(())
        }
        CliCommand::List(options) => run_list(options, config).await,
    }
}
