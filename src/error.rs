//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `yum-repo-tools` crates. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the application. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the application to simplify function signatures and ensure
//!   type safety.
//!
//! The `Error` enum is designed to be exhaustive and cover all possible
//! failure scenarios, including:
//!
//! - Config file parsing errors (with file and line context).
//! - Section lookups that match nothing, or more than one file.
//! - Files that exist but cannot be modified.
//! - Unsupported repo options and invalid command arguments.
//! - Compose metadata and hash-config validation failures.
//! - HTTP transport failures and unexpected response statuses.
//! - I/O, YAML, JSON, URL, regex and glob errors from the underlying
//!   libraries.
//!
//! There is deliberately no retry machinery here: every failure is surfaced
//! to the caller on first occurrence, and the binaries translate it into a
//! non-zero exit code.

use thiserror::Error;

/// Main error type for yum-repo-tools operations
#[derive(Error, Debug)]
pub enum Error {
    /// A config file could not be parsed as INI.
    ///
    /// Includes the file path, the 1-based line number of the offending
    /// line, and the specific parsing issue.
    #[error("Failed to parse {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// A section or config file that an operation requires does not exist.
    #[error("Not found: {target}")]
    NotFound { target: String },

    /// A section name matched more than one config file.
    ///
    /// The update is refused rather than guessing; callers disambiguate
    /// with an explicit file path.
    #[error("Section '{section}' appears in multiple config files: {}. Pass an explicit file path to disambiguate", candidates.join(", "))]
    AmbiguousSection {
        section: String,
        candidates: Vec<String>,
    },

    /// A config file exists but cannot be written.
    #[error("No write permission for {path}")]
    PermissionDenied { path: String },

    /// One or more requested options are not valid for this config type.
    #[error("Unsupported config option(s): {options}")]
    InvalidOption { options: String },

    /// An attempt to add a section that the target file already has.
    #[error("Section '{section}' already exists in {path}")]
    SectionExists { section: String, path: String },

    /// Command arguments that are syntactically valid but make no sense
    /// together (or reference unknown values).
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// An error occurred while processing CentOS compose metadata.
    #[error("Compose error: {message}")]
    Compose { message: String },

    /// Hash-resolver data is unusable: a config file that does not exist,
    /// or fetched commit metadata with no commits in it.
    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    /// A remote server answered with a non-success HTTP status.
    #[error("Unexpected response status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// A downloaded repo file has no leading `[section]` title to name it
    /// after.
    #[error("Downloaded repo from {url} has no section title")]
    MissingRepoTitle { url: String },

    /// An HTTP transport error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
