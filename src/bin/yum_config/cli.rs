//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use yum_repo_tools::output::init_logging;

use crate::commands;

/// Yum Config - Manage yum/dnf repo files, dnf modules and global options
#[derive(Parser, Debug)]
#[command(name = "yum-config")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update a repo section in a .repo file
    Repo(commands::repo::RepoArgs),

    /// Set options in the main section of the global yum/dnf configuration
    Global(commands::global::GlobalArgs),

    /// Enable, disable or reset a dnf module
    Module(commands::module::ModuleArgs),

    /// Enable the repos of a CentOS Stream compose, pinned to its id
    EnableComposeRepos(commands::compose::ComposeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Repo(args) => commands::repo::execute(args),
            Commands::Global(args) => commands::global::execute(args),
            Commands::Module(args) => commands::module::execute(args),
            Commands::EnableComposeRepos(args) => commands::compose::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_requires_name_or_url() {
        assert!(Cli::try_parse_from(["yum-config", "repo"]).is_err());
    }

    #[test]
    fn test_repo_name_alone_parses() {
        assert!(Cli::try_parse_from(["yum-config", "repo", "epel", "--enable"]).is_ok());
    }

    #[test]
    fn test_down_url_alone_satisfies_the_target_group() {
        let parsed =
            Cli::try_parse_from(["yum-config", "repo", "--down-url", "https://example.com/e.repo"]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_enable_and_disable_conflict() {
        let parsed =
            Cli::try_parse_from(["yum-config", "repo", "epel", "--enable", "--disable"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_malformed_set_opts_is_a_parse_error() {
        let parsed =
            Cli::try_parse_from(["yum-config", "repo", "epel", "--set-opts", "enabled"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_module_rejects_unknown_operation() {
        assert!(Cli::try_parse_from(["yum-config", "module", "install", "nginx"]).is_err());
        assert!(Cli::try_parse_from(["yum-config", "module", "enable", "nginx"]).is_ok());
    }

    #[test]
    fn test_compose_release_choices_are_enforced() {
        let parsed = Cli::try_parse_from([
            "yum-config",
            "enable-compose-repos",
            "--compose-url",
            "https://composes.centos.org/latest-CentOS-Stream-8/compose/",
            "--release",
            "fedora-40",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_global_flags_parse_anywhere() {
        let parsed = Cli::try_parse_from([
            "yum-config",
            "global",
            "--set-opts",
            "keepcache=0",
            "--log-level",
            "debug",
            "--color",
            "never",
        ]);
        assert!(parsed.is_ok());
    }
}
