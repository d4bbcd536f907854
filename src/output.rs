//! Terminal output preferences for the CLI binaries.
//!
//! Repo edits mostly run inside provisioning scripts and CI jobs, so every
//! user-facing confirmation goes through [`OutputConfig`] to decide whether
//! emojis and colors are safe to print. The decision honors:
//!
//! - `--color=never|always|auto` on the command line
//! - `NO_COLOR` (per <https://no-color.org/>)
//! - `CLICOLOR=0` and `CLICOLOR_FORCE=1`
//! - `TERM=dumb`
//!
//! The binaries also route their [`log`] output to stderr from here, via
//! [`init_logging`], keeping stdout reserved for results.
//!
//! ## Example
//!
//! ```rust,ignore
//! use yum_repo_tools::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Enabled repo 'epel'", emoji(&out, "✅", "[OK]"));
//! ```

use std::env;

/// Whether decorated output should be produced.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// True when emojis and colors are printed.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the output mode from the `--color` flag and the environment.
    ///
    /// `always` and `never` are absolute; anything else falls back to
    /// environment detection, where `NO_COLOR` (set at all), `CLICOLOR=0`
    /// and `TERM=dumb` disable decoration, `CLICOLOR_FORCE` enables it even
    /// without a TTY, and otherwise the terminal's own capabilities decide.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // NO_COLOR disables on presence alone, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|value| value == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|value| value != "0" && !value.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|value| value == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Picks the emoji or its plain-text stand-in, depending on the output mode.
///
/// Plain variants keep a fixed `[TAG]` shape so log scrapers can match them.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Initialize stderr logging for a CLI binary from its `--log-level` flag.
///
/// Unparseable levels fall back to `info` rather than failing the run, and
/// a second call is a no-op, so tests may call this freely.
pub fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_always_wins() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_flag_never_wins() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_flag_is_case_insensitive() {
        let config = OutputConfig::from_env_and_flag("NEVER");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_picks_decorated_variant() {
        let config = OutputConfig::with_color();
        assert_eq!(emoji(&config, "✅", "[OK]"), "✅");
    }

    #[test]
    fn test_emoji_picks_plain_variant() {
        let config = OutputConfig::without_color();
        assert_eq!(emoji(&config, "✅", "[OK]"), "[OK]");
    }

    #[test]
    fn test_init_logging_tolerates_repeat_and_garbage() {
        init_logging("debug");
        init_logging("not-a-level");
    }
}
