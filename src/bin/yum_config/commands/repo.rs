//! Repo command implementation
//!
//! Creates or updates `[section]` blocks in yum/dnf `.repo` files. With a
//! repo name the section is located across the config directory (or in one
//! explicit file); without one, a downloaded repo file drives an update of
//! every section it defines.

use anyhow::Result;
use clap::{ArgGroup, Args};
use std::path::PathBuf;

use yum_repo_tools::defaults::YUM_REPO_DIR;
use yum_repo_tools::editor::RepoConfig;

use super::parse_key_value;

/// Arguments for the repo command
#[derive(Args, Debug)]
#[command(group = ArgGroup::new("target").required(true).multiple(true).args(["name", "down_url"]))]
pub struct RepoArgs {
    /// Name of the repo section to create or update
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Enable the repo
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Disable the repo
    #[arg(long)]
    pub disable: bool,

    /// Repo options to set, as key=value pairs
    #[arg(long, value_name = "KEY=VALUE", num_args = 1.., value_parser = parse_key_value)]
    pub set_opts: Vec<(String, String)>,

    /// Directory searched for .repo files
    #[arg(long, value_name = "PATH", default_value = YUM_REPO_DIR)]
    pub config_dir_path: PathBuf,

    /// Operate on this file instead of searching the directory
    #[arg(long, value_name = "PATH")]
    pub config_file_path: Option<PathBuf>,

    /// URL of a repo file whose options seed the update
    #[arg(long, value_name = "URL")]
    pub down_url: Option<String>,
}

/// Execute the repo command
pub fn execute(args: RepoArgs) -> Result<()> {
    let enabled = enabled_flag(args.enable, args.disable);
    let repos = RepoConfig::new(Some(&args.config_dir_path));

    match &args.name {
        Some(name) => {
            repos.add_or_update_section(
                name,
                &args.set_opts,
                args.config_file_path.as_deref(),
                args.down_url.as_deref(),
                enabled,
            )?;
        }
        None => {
            let url = match args.down_url.as_deref() {
                Some(url) => url,
                None => anyhow::bail!(
                    "You must provide a repo 'name' or a valid 'url' where repo \
                     info can be downloaded."
                ),
            };
            repos.add_or_update_all_from_url(
                url,
                &args.set_opts,
                args.config_file_path.as_deref(),
                enabled,
            )?;
        }
    }
    Ok(())
}

/// Fold the --enable/--disable pair into one optional state.
fn enabled_flag(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
