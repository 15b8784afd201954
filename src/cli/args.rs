//! Command-line argument parsing for the postboard CLI.

use thiserror::Error;

use crate::state::{SortDirection, SortKey, SortState};

/// Options for listing one page of the board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
    /// Show every reply instead of top-level posts only
    pub expand_all: bool,
}

impl ListOptions {
    /// Initial sort: newest first unless a key or direction was given.
    ///
    /// A key without a direction sorts ascending, like clicking a column.
    pub fn sort_state(&self) -> SortState {
        match (self.sort, self.direction) {
            (None, None) => SortState::default(),
            (None, Some(direction)) => SortState::new(SortKey::Id, direction),
            (Some(key), direction) => {
                SortState::new(key, direction.unwrap_or(SortDirection::Asc))
            }
        }
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Print a page of posts (default)
    List(ListOptions),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("invalid value '{value}' for {flag}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("unknown argument '{0}' (see --help)")]
    Unknown(String),
}

pub const USAGE: &str = "\
Usage: postboard [OPTIONS]

Options:
  -p, --page <N>      Page to show (default 1)
  -s, --sort <KEY>    Sort by id, username, email or created_at
      --asc           Ascending order
      --desc          Descending order
  -a, --expand-all    Show all replies
  -V, --version       Print version
  -h, --help          Print this help

Environment:
  POSTBOARD_API_URL, POSTBOARD_PAGE_SIZE, POSTBOARD_MAX_DEPTH,
  POSTBOARD_COLLAPSE, POSTBOARD_TIMEOUT_SECS, RUST_LOG";

/// Parse command-line arguments and return the command to run.
///
/// The first item is the program name and is skipped.
///
/// # Examples
///
/// ```
/// use postboard::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["postboard".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut options = ListOptions::default();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        // Support --flag=value as well as --flag value
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--page" | "-p" => {
                let value = value_for(&flag, inline, &mut args)?;
                let page = value.parse::<u32>().map_err(|e| ArgsError::InvalidValue {
                    flag: flag.clone(),
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
                if page == 0 {
                    return Err(ArgsError::InvalidValue {
                        flag,
                        value,
                        reason: "pages start at 1".to_string(),
                    });
                }
                options.page = Some(page);
            }
            "--sort" | "-s" => {
                let value = value_for(&flag, inline, &mut args)?;
                let key = value.parse::<SortKey>().map_err(|reason| ArgsError::InvalidValue {
                    flag: flag.clone(),
                    value: value.clone(),
                    reason,
                })?;
                options.sort = Some(key);
            }
            "--asc" => options.direction = Some(SortDirection::Asc),
            "--desc" => options.direction = Some(SortDirection::Desc),
            "--expand-all" | "-a" => options.expand_all = true,
            _ => return Err(ArgsError::Unknown(arg)),
        }
    }
    Ok(CliCommand::List(options))
}

fn value_for<I>(flag: &str, inline: Option<String>, args: &mut I) -> Result<String, ArgsError>
where
    I: Iterator<Item = String>,
{
    inline
        .or_else(|| args.next())
        .ok_or_else(|| ArgsError::MissingValue {
            flag: flag.to_string(),
        })
}
