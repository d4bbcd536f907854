//! # Repo Setup CLI
//!
//! Installs RDO Trunk, ceph, opstools and distro repo files into a yum
//! repo directory, the standard way TripleO jobs and images get their
//! package sources. Which repos are valid depends on the distro, so the
//! host is detected from os-release and used both as the default distro
//! and to sanity-check Stream against non-Stream requests.

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Parser;
use std::path::PathBuf;

use yum_repo_tools::defaults::{distro_choices, DEFAULT_RDO_MIRROR, DISTRO_REPO_DIR, YUM_REPO_DIR};
use yum_repo_tools::distro::DistroInfo;
use yum_repo_tools::http::Fetcher;
use yum_repo_tools::output::{emoji, init_logging, OutputConfig};
use yum_repo_tools::setup::{RepoSetup, REPO_CHOICES};

/// Repo Setup - Install RDO Trunk and distro repo files
#[derive(Parser, Debug)]
#[command(name = "repo-setup")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Repos to install
    #[arg(
        value_name = "REPO",
        required = true,
        num_args = 1..,
        value_parser = PossibleValuesParser::new(REPO_CHOICES)
    )]
    repos: Vec<String>,

    /// Target distro; the running host when not given
    #[arg(
        short,
        long,
        value_name = "DISTRO",
        value_parser = PossibleValuesParser::new(distro_choices())
    )]
    distro: Option<String>,

    /// Target branch
    #[arg(short, long, value_name = "BRANCH", default_value = "master")]
    branch: String,

    /// Directory in which to save the selected repos
    #[arg(short, long, value_name = "PATH", default_value = YUM_REPO_DIR)]
    output_path: PathBuf,

    /// Package mirror; each distro has its own default
    #[arg(long, value_name = "URL")]
    mirror: Option<String>,

    /// Server the RDO Trunk repos are fetched from
    #[arg(long, value_name = "URL", default_value = DEFAULT_RDO_MIRROR)]
    rdo_mirror: String,

    /// Install CentOS Stream repos (the default)
    #[arg(long, conflicts_with = "no_stream")]
    stream: bool,

    /// Install non-Stream CentOS repos
    #[arg(long)]
    no_stream: bool,

    /// Secondary distro repo directory
    #[arg(long, value_name = "PATH", default_value = DISTRO_REPO_DIR, hide = true)]
    distro_repos_path: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let out = OutputConfig::from_env_and_flag(&cli.color);

    let host = DistroInfo::detect();
    let distro = match &cli.distro {
        Some(distro) => distro.clone(),
        None => host.label(),
    };

    let setup = RepoSetup::new(
        cli.repos.clone(),
        &distro,
        &cli.branch,
        &cli.output_path,
        cli.mirror.as_deref(),
        &cli.rdo_mirror,
        !cli.no_stream,
    )?
    .with_distro_repo_dir(&cli.distro_repos_path);

    std::fs::create_dir_all(&cli.output_path)?;
    let fetcher = Fetcher::new()?;
    setup.run(&fetcher, &host.name, &host.major_version)?;

    println!(
        "{} Installed {} for {}-{} into {}",
        emoji(&out, "✅", "[OK]"),
        cli.repos.join(", "),
        distro,
        cli.branch,
        cli.output_path.display()
    );
    Ok(())
}
