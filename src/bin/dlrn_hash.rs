//! # DLRN Hash CLI
//!
//! Resolves a DLRN promotion tag, like `current-tripleo`, to the concrete
//! build hashes it points at on the DLRN server. The result pins CI jobs
//! and deployments to an exact repo state instead of a moving alias.
//!
//! Output goes to stdout as a readable report or, with `--json`, as a JSON
//! document for scripting.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use yum_repo_tools::dlrn::{DlrnConfig, HashInfo};
use yum_repo_tools::http::Fetcher;
use yum_repo_tools::output::{emoji, init_logging, OutputConfig};

/// DLRN Hash - Resolve promotion tags to concrete DLRN build hashes
#[derive(Parser, Debug)]
#[command(name = "dlrn-hash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// OS version the build was made for
    #[arg(long, value_name = "OS", default_value = "centos8")]
    os_version: String,

    /// OpenStack release the build belongs to
    #[arg(long, value_name = "RELEASE", default_value = "master")]
    release: String,

    /// DLRN component; the aggregated repo when not given
    #[arg(long, value_name = "COMPONENT")]
    component: Option<String>,

    /// Promotion tag to resolve
    #[arg(long, value_name = "TAG", default_value = "current-tripleo")]
    tag: String,

    /// DLRN server to query, overriding the configured one
    #[arg(long, value_name = "URL")]
    dlrn_url: Option<String>,

    /// Resolver config file; system, user and built-in configs otherwise
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

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

    let mut config = DlrnConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.dlrn_url {
        config.dlrn_url = url.clone();
    }

    let fetcher = Fetcher::new()?;
    let info = HashInfo::fetch(
        &fetcher,
        &config,
        &cli.os_version,
        &cli.release,
        &cli.tag,
        cli.component.as_deref(),
    )?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let out = OutputConfig::from_env_and_flag(&cli.color);
        println!(
            "{} Resolved '{}' for {}-{}",
            emoji(&out, "🔍", "[HASH]"),
            cli.tag,
            cli.os_version,
            cli.release
        );
        println!("{}", info);
    }
    Ok(())
}
