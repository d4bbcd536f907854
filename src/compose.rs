//! CentOS compose repo management
//!
//! CentOS Stream publishes nightly composes with a `composeinfo.json`
//! metadata document describing the compose id and its variants
//! (BaseOS, AppStream, ...). Pointing yum at `latest-*` URLs makes
//! deployments drift; this module pins the latest compose to its concrete
//! id and writes one repo file per variant.
//!
//! ## Features
//!
//! - Validate the compose URL against the known layout of each supported
//!   release before anything is downloaded
//! - Fetch and parse the compose metadata, warning when the metadata
//!   format is newer than the one this tool knows
//! - Write `<compose-id>-<Variant>.repo` files with pinned baseurls,
//!   skipping variants that already have a section
//! - Optionally disable conflicting sections of the same name in other
//!   repo files, and disable whole repo files wholesale

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;

use crate::defaults::{
    compose_url_pattern, COMPOSE_REPOS_INFO_PATH, COMPOSE_REPOS_RELEASES,
    COMPOSE_REPOS_SUPPORTED_ARCHS, YUM_REPO_DIR, YUM_REPO_FILE_EXTENSION,
};
use crate::document::Document;
use crate::editor::{load, save_atomic, YumConfigEditor};
use crate::error::{Error, Result};
use crate::http::Fetcher;
use crate::locate::find_section_files;

/// The productmd metadata version this module was written against.
const SUPPORTED_METADATA_VERSION: &str = "1.2";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct ComposeInfo {
    header: ComposeHeader,
    payload: ComposePayload,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct ComposeHeader {
    version: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct ComposePayload {
    compose: ComposeIdent,
    variants: BTreeMap<String, ComposeVariant>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct ComposeIdent {
    id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct ComposeVariant {
    #[serde(default)]
    arches: Vec<String>,
}

/// A validated compose with its metadata downloaded and its URL pinned to
/// the concrete compose id.
#[derive(Debug)]
pub struct ComposeRepos {
    release: String,
    arch: String,
    pinned_url: String,
    info: ComposeInfo,
}

impl ComposeRepos {
    /// Validate the request and download the compose metadata.
    ///
    /// # Arguments
    ///
    /// * `compose_url` - Compose top URL, typically a `latest-*` alias
    /// * `release` - One of the supported CentOS Stream releases
    /// * `arch` - Architecture the repo baseurls should point at
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] for unknown releases or architectures,
    /// [`Error::Compose`] when the URL does not match the release's layout.
    pub fn new(fetcher: &Fetcher, compose_url: &str, release: &str, arch: &str) -> Result<Self> {
        if !COMPOSE_REPOS_RELEASES.contains(&release) {
            return Err(Error::InvalidArguments {
                message: format!(
                    "'{}' is not a supported release. Expected one of: {}",
                    release,
                    COMPOSE_REPOS_RELEASES.join(", ")
                ),
            });
        }
        if !COMPOSE_REPOS_SUPPORTED_ARCHS.contains(&arch) {
            return Err(Error::InvalidArguments {
                message: format!(
                    "'{}' is not a supported architecture. Expected one of: {}",
                    arch,
                    COMPOSE_REPOS_SUPPORTED_ARCHS.join(", ")
                ),
            });
        }
        let pattern = compose_url_pattern(release).ok_or_else(|| Error::InvalidArguments {
            message: format!("no compose URL pattern known for '{}'", release),
        })?;
        let url_re = Regex::new(pattern)?;
        if !url_re.is_match(compose_url) {
            return Err(Error::Compose {
                message: format!(
                    "URL '{}' does not match the expected compose layout for {}",
                    compose_url, release
                ),
            });
        }

        let info_url = format!(
            "{}/{}",
            compose_url.trim_end_matches('/'),
            COMPOSE_REPOS_INFO_PATH
        );
        let info: ComposeInfo = fetcher.fetch_json(&info_url)?;
        if info.header.version != SUPPORTED_METADATA_VERSION {
            warn!(
                "Compose metadata version is {} but {} was expected, continuing anyway",
                info.header.version, SUPPORTED_METADATA_VERSION
            );
        }

        let replacement = format!("${{1}}/{}${{3}}", info.payload.compose.id);
        let pinned_url = url_re.replace(compose_url, replacement.as_str()).to_string();
        debug!("Pinned compose URL: {}", pinned_url);

        Ok(ComposeRepos {
            release: release.to_string(),
            arch: arch.to_string(),
            pinned_url,
            info,
        })
    }

    /// The concrete compose id, e.g. `CentOS-Stream-9-20240818.0`.
    pub fn compose_id(&self) -> &str {
        &self.info.payload.compose.id
    }

    /// The release this compose belongs to.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// All variant names the compose publishes, sorted.
    pub fn variants(&self) -> Vec<&str> {
        self.info
            .payload
            .variants
            .keys()
            .map(String::as_str)
            .collect()
    }

    /// Write one pinned repo file per variant into `dir_path`.
    ///
    /// An empty `variants` list means every variant of the compose. A
    /// variant whose section already exists in its target file is left
    /// alone, so re-running against the same compose is harmless. With
    /// `override_conflicting`, sections of the same name in other repo
    /// files are disabled.
    ///
    /// # Returns
    ///
    /// The repo files written (or already in place), in variant order.
    pub fn enable_repos(
        &self,
        variants: &[String],
        dir_path: &Path,
        override_conflicting: bool,
    ) -> Result<Vec<PathBuf>> {
        let selected: Vec<String> = if variants.is_empty() {
            self.variants().iter().map(|name| name.to_string()).collect()
        } else {
            variants.to_vec()
        };

        let mut written = Vec::new();
        for variant in &selected {
            let variant_info =
                self.info
                    .payload
                    .variants
                    .get(variant)
                    .ok_or_else(|| Error::Compose {
                        message: format!(
                            "variant '{}' not found in compose {}",
                            variant,
                            self.compose_id()
                        ),
                    })?;
            if !variant_info.arches.is_empty()
                && !variant_info.arches.iter().any(|arch| arch == &self.arch)
            {
                warn!(
                    "Variant '{}' is not published for {}, skipping",
                    variant, self.arch
                );
                continue;
            }

            let section = variant.to_lowercase();
            let path = dir_path.join(format!(
                "{}-{}{}",
                self.compose_id(),
                variant,
                YUM_REPO_FILE_EXTENSION
            ));
            let baseurl = format!(
                "{}/{}/{}/os",
                self.pinned_url.trim_end_matches('/'),
                variant,
                self.arch
            );

            let mut doc = if path.is_file() {
                load(&path)?
            } else {
                Document::new()
            };
            if doc.has_section(&section) {
                debug!(
                    "Section '{}' already exists in {}, skipping",
                    section,
                    path.display()
                );
            } else {
                doc.push_section(&section, &path.display().to_string())?;
                doc.set_key(&section, "name", &format!("{} {}", self.compose_id(), variant))?;
                doc.set_key(&section, "baseurl", &baseurl)?;
                doc.set_key(&section, "enabled", "1")?;
                doc.set_key(&section, "gpgcheck", "0")?;
                save_atomic(&doc, &path)?;
                info!("Enabled compose repo '{}' in {}", section, path.display());
            }

            if override_conflicting {
                self.disable_conflicting(&section, &path, dir_path)?;
            }
            written.push(path);
        }
        Ok(written)
    }

    /// Disable sections named `section` in every repo file except `keep`.
    fn disable_conflicting(&self, section: &str, keep: &Path, dir_path: &Path) -> Result<()> {
        for file in find_section_files(section, dir_path, YUM_REPO_FILE_EXTENSION)? {
            if file == keep {
                continue;
            }
            let mut doc = load(&file)?;
            doc.set_key(section, "enabled", "0")?;
            save_atomic(&doc, &file)?;
            info!(
                "Disabled conflicting section '{}' in {}",
                section,
                file.display()
            );
        }
        Ok(())
    }
}

/// Disable every section of each given repo file.
pub fn disable_repo_files(paths: &[PathBuf]) -> Result<()> {
    let editor = YumConfigEditor::new(YUM_REPO_DIR, YUM_REPO_FILE_EXTENSION);
    let sets = [("enabled".to_string(), "0".to_string())];
    for path in paths {
        editor.update_all_sections(&sets, path)?;
    }
    Ok(())
}
