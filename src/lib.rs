//! # Yum Repo Tools Library
//!
//! This library edits yum/dnf configuration files and resolves the remote
//! metadata those edits are driven by. It backs the `yum-config`,
//! `dlrn-hash` and `repo-setup` command-line tools but can be used by any
//! application that manages RDO or CentOS package repos.
//!
//! ## Quick Example
//!
//! ```
//! use yum_repo_tools::document::Document;
//!
//! let source = "[epel]\nname=Extra Packages\nenabled=0\n";
//! let mut doc = Document::parse(source, "epel.repo").unwrap();
//!
//! // parsing is lossless
//! assert_eq!(doc.render(), source);
//!
//! // edits touch only the lines they must
//! doc.set_key("epel", "enabled", "1").unwrap();
//! assert_eq!(doc.render(), "[epel]\nname=Extra Packages\nenabled=1\n");
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Document (`document`)**: A lossless, line-oriented model of one
//!   INI-style config file. Unchanged lines render back byte-identical, so
//!   hand-maintained spacing and comments survive every edit.
//! - **Location (`locate`)**: Finds which file in a repo directory defines a
//!   given section; several matches are a hard error listing the candidates.
//! - **Editing (`editor`)**: `RepoConfig`, `GlobalConfig` and `ModuleConfig`
//!   wrap the document model with the yum/dnf specific rules (supported
//!   options, enable/disable, module state files) and write atomically.
//! - **Remote metadata (`http`, `dlrn`, `compose`)**: A blocking HTTP
//!   fetcher plus the DLRN hash resolver and CentOS compose repo support
//!   built on top of it.
//! - **Host setup (`distro`, `setup`)**: Detects the running distro and
//!   installs the RDO Trunk and CentOS dependency repos for it.
//!
//! ## Execution Flow
//!
//! A typical `yum-config repo` invocation runs through these steps:
//!
//! 1.  **Validate**: Check requested options against the supported set
//!     before anything is read.
//! 2.  **Locate**: Resolve the target section to exactly one file, unless
//!     the caller pinned one explicitly.
//! 3.  **Load**: Parse the file into a [`document::Document`].
//! 4.  **Edit**: Apply the requested key changes in place.
//! 5.  **Persist**: Write to a temp file in the same directory and rename
//!     over the original, preserving its permissions.
//!
//! The remote-driven flows (`dlrn`, `compose`, `setup`) put one or more
//! HTTP fetches in front of the same edit-and-persist core.

pub mod compose;
pub mod defaults;
pub mod distro;
pub mod dlrn;
pub mod document;
pub mod editor;
pub mod error;
pub mod http;
pub mod locate;
pub mod output;
pub mod setup;

#[cfg(test)]
mod document_proptest;
