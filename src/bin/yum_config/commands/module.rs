//! Module command implementation
//!
//! Edits dnf module state files, the same records `dnf module enable`
//! maintains under `/etc/dnf/modules.d`. Writing the state directly keeps
//! image builds from needing a working dnf stack.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use yum_repo_tools::defaults::DNF_MODULE_DIR;
use yum_repo_tools::editor::ModuleConfig;

/// State transitions a module supports
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModuleOperation {
    /// Mark the module enabled
    Enable,
    /// Mark the module disabled
    Disable,
    /// Forget any recorded state for the module
    Reset,
}

/// Arguments for the module command
#[derive(Args, Debug)]
pub struct ModuleArgs {
    /// Operation to apply to the module
    #[arg(value_enum)]
    pub operation: ModuleOperation,

    /// Name of the module
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Stream to pin, e.g. 17 for mariadb
    #[arg(long, value_name = "STREAM")]
    pub stream: Option<String>,

    /// Profile to record for an enabled module
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Directory holding module state files
    #[arg(long, value_name = "PATH", default_value = DNF_MODULE_DIR)]
    pub config_dir_path: PathBuf,
}

/// Execute the module command
pub fn execute(args: ModuleArgs) -> Result<()> {
    let modules = ModuleConfig::new(Some(&args.config_dir_path));
    match args.operation {
        ModuleOperation::Enable => {
            modules.enable(&args.name, args.stream.as_deref(), args.profile.as_deref())?;
        }
        ModuleOperation::Disable => modules.disable(&args.name, args.stream.as_deref())?,
        ModuleOperation::Reset => modules.reset(&args.name)?,
    }
    Ok(())
}
