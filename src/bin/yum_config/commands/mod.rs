//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `yum-config`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `yum_repo_tools` library to perform the core logic.

pub mod completions;
pub mod compose;
pub mod global;
pub mod module;
pub mod repo;

/// Parse one `--set-opts` value into a key/value pair.
///
/// Used as a clap value parser so malformed pairs are rejected as usage
/// errors, before any config file is touched. The value may itself contain
/// `=`, as baseurls with query strings do; only the first one splits.
pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err("set options must be provided as \"key=value\" pairs".to_string()),
    }
}
