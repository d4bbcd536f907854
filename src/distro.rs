//! Host distro detection
//!
//! The repo setup tool defaults its distro argument to whatever the host
//! is, read from `/etc/os-release`. Two quirks need handling: UBI
//! containers identify as plain `rhel` in os-release and are only
//! recognizable by their `ubi.repo` file, and unsupported platforms fall
//! back to `centos7` with a warning instead of failing outright.

use std::path::Path;

use log::warn;

use crate::defaults::{is_supported_distro, OS_RELEASE_PATH, UBI_REPO_MARKER};

/// What the host identifies as, per os-release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistroInfo {
    /// The os-release `ID`, e.g. `centos`.
    pub id: String,
    /// Major part of `VERSION_ID`, e.g. `9`.
    pub major_version: String,
    /// The os-release `NAME`, e.g. `CentOS Stream`.
    pub name: String,
}

impl DistroInfo {
    /// Detect the running host.
    pub fn detect() -> Self {
        Self::from_files(Path::new(OS_RELEASE_PATH), Path::new(UBI_REPO_MARKER))
    }

    fn from_files(os_release: &Path, ubi_marker: &Path) -> Self {
        let content = std::fs::read_to_string(os_release).unwrap_or_default();
        let mut info = parse_os_release(&content);

        // UBI images identify as plain rhel in os-release
        if ubi_marker.is_file() {
            info.id = "ubi".to_string();
        }

        if !is_supported_distro(&info.id, &info.major_version) {
            warn!(
                "Unsupported platform '{}{}', centos7 will be used unless \
                 a distro is given explicitly.",
                info.id, info.major_version
            );
            info.id = "centos".to_string();
            info.major_version = "7".to_string();
        }
        if info.id == "ubi" {
            warn!(
                "CentOS {} Base and AppStream will be installed for this UBI distro",
                info.major_version
            );
        }
        info
    }

    /// The combined label used in mirror paths, e.g. `centos9`. Fedora has
    /// no version suffix.
    pub fn label(&self) -> String {
        if self.id == "fedora" {
            self.id.clone()
        } else {
            format!("{}{}", self.id, self.major_version)
        }
    }
}

fn parse_os_release(content: &str) -> DistroInfo {
    let mut id = String::new();
    let mut version_id = String::new();
    let mut name = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.trim() {
            "ID" => id = value.to_string(),
            "VERSION_ID" => version_id = value.to_string(),
            "NAME" => name = value.to_string(),
            _ => {}
        }
    }

    let major_version = version_id
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();
    DistroInfo {
        id,
        major_version,
        name,
    }
}
