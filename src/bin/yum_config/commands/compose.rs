//! Enable-compose-repos command implementation
//!
//! Pins a CentOS Stream compose to its concrete id and writes one repo
//! file per variant, then optionally disables whatever conflicts with
//! them: same-named sections elsewhere, or whole repo files.

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Args;
use std::path::PathBuf;

use yum_repo_tools::compose::{disable_repo_files, ComposeRepos};
use yum_repo_tools::defaults::{
    COMPOSE_REPOS_RELEASES, COMPOSE_REPOS_SUPPORTED_ARCHS, YUM_REPO_DIR,
};
use yum_repo_tools::http::Fetcher;
use yum_repo_tools::output::{emoji, OutputConfig};

/// Arguments for the enable-compose-repos command
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Compose top URL, typically a latest-* alias
    #[arg(long, value_name = "URL")]
    pub compose_url: String,

    /// CentOS Stream release the compose belongs to
    #[arg(
        long,
        value_name = "RELEASE",
        default_value = "centos-stream-8",
        value_parser = PossibleValuesParser::new(COMPOSE_REPOS_RELEASES)
    )]
    pub release: String,

    /// Architecture the repo baseurls should point at
    #[arg(
        long,
        value_name = "ARCH",
        default_value = "x86_64",
        value_parser = PossibleValuesParser::new(COMPOSE_REPOS_SUPPORTED_ARCHS)
    )]
    pub arch: String,

    /// Variants to enable; all of them when not given
    #[arg(long, value_name = "VARIANT", num_args = 1..)]
    pub variants: Vec<String>,

    /// Repo files to disable wholesale once the compose repos are in
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub disable_repos: Vec<PathBuf>,

    /// Disable same-named sections in other repo files
    #[arg(long)]
    pub disable_all_conflicting: bool,

    /// Directory the repo files are written to
    #[arg(long, value_name = "PATH", default_value = YUM_REPO_DIR)]
    pub config_dir_path: PathBuf,
}

/// Execute the enable-compose-repos command
pub fn execute(args: ComposeArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let fetcher = Fetcher::new()?;
    let compose = ComposeRepos::new(&fetcher, &args.compose_url, &args.release, &args.arch)?;
    println!(
        "{} Compose pinned to {}",
        emoji(&out, "📌", "[PIN]"),
        compose.compose_id()
    );

    let written = compose.enable_repos(
        &args.variants,
        &args.config_dir_path,
        args.disable_all_conflicting,
    )?;
    for path in &written {
        println!(
            "{} Enabled compose repo {}",
            emoji(&out, "✅", "[OK]"),
            path.display()
        );
    }

    disable_repo_files(&args.disable_repos)?;
    for path in &args.disable_repos {
        println!(
            "{} Disabled repo file {}",
            emoji(&out, "🚫", "[OFF]"),
            path.display()
        );
    }
    Ok(())
}
