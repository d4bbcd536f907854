//! Global command implementation
//!
//! Sets options in the `[main]` section of the yum/dnf global
//! configuration. The default `/etc/yum.conf` is created with a bare
//! `[main]` section when nothing exists there yet; an explicit path must
//! already exist.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use yum_repo_tools::editor::GlobalConfig;

use super::parse_key_value;

/// Arguments for the global command
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Global options to set, as key=value pairs
    #[arg(long, value_name = "KEY=VALUE", num_args = 1.., value_parser = parse_key_value)]
    pub set_opts: Vec<(String, String)>,

    /// Operate on this file instead of /etc/yum.conf
    #[arg(long, value_name = "PATH")]
    pub config_file_path: Option<PathBuf>,
}

/// Execute the global command
pub fn execute(args: GlobalArgs) -> Result<()> {
    let global = GlobalConfig::new(args.config_file_path.as_deref())?;
    global.update(&args.set_opts)?;
    Ok(())
}
