//! Atomic editing of yum/dnf configuration files
//!
//! ## Key Components
//!
//! - [`load`] / [`save_atomic`]: read a config file into a [`Document`] and
//!   write it back through a temp-file rename, so a crash never leaves a
//!   half-written repo file behind
//! - [`YumConfigEditor`]: section-level operations against a config
//!   directory or one explicit file
//! - [`RepoConfig`]: `.repo` files under `/etc/yum.repos.d`, with option
//!   validation and seeding from a downloaded repo file
//! - [`GlobalConfig`]: the `[main]` section of `/etc/yum.conf`
//! - [`ModuleConfig`]: dnf module state files under `/etc/dnf/modules.d`
//!
//! ## Example
//!
//! ```ignore
//! use yum_repo_tools::editor::RepoConfig;
//!
//! let repos = RepoConfig::new(None);
//! repos.update_section(
//!     "epel",
//!     &[("priority".to_string(), "10".to_string())],
//!     None,
//!     Some(false),
//! )?;
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::defaults::{
    DNF_MODULE_DIR, DNF_MODULE_FILE_EXTENSION, YUM_GLOBAL_CONFIG_FILE_PATH, YUM_REPO_DIR,
    YUM_REPO_FILE_EXTENSION, YUM_REPO_SUPPORTED_OPTIONS,
};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::http::Fetcher;
use crate::locate::{self, is_writable, SectionRef, Target};

/// Parse the config file at `path` into a [`Document`].
pub fn load(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    Document::parse(&content, &path.display().to_string())
}

/// Write `doc` to `path` through a temp file in the same directory.
///
/// The final rename makes the update atomic: a concurrent `yum` run sees
/// either the old file or the new one, never a partial write. Permissions
/// of an existing file carry over to the replacement.
pub fn save_atomic(doc: &Document, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let previous_permissions = std::fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(doc.render().as_bytes())?;
    tmp.flush()?;
    if let Some(permissions) = previous_permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

/// Section-level edit operations shared by every config flavor.
///
/// The editor is bound to a directory and a file extension; each operation
/// optionally takes an explicit file path that bypasses the directory scan.
pub struct YumConfigEditor {
    dir: PathBuf,
    extension: String,
    valid_options: Option<&'static [&'static str]>,
}

impl YumConfigEditor {
    /// Create an editor over `dir`, considering only files with `extension`.
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        YumConfigEditor {
            dir: dir.into(),
            extension: extension.to_string(),
            valid_options: None,
        }
    }

    /// Restrict the option names this editor accepts.
    pub fn with_valid_options(mut self, options: &'static [&'static str]) -> Self {
        self.valid_options = Some(options);
        self
    }

    /// The directory this editor scans.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reject option names outside the supported set, before any file is
    /// touched.
    fn validate_options(&self, sets: &[(String, String)]) -> Result<()> {
        let valid = match self.valid_options {
            Some(valid) => valid,
            None => return Ok(()),
        };
        let unsupported: Vec<&str> = sets
            .iter()
            .filter(|(key, _)| !valid.contains(&key.as_str()))
            .map(|(key, _)| key.as_str())
            .collect();
        if unsupported.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidOption {
                options: unsupported.join(", "),
            })
        }
    }

    fn resolve(&self, section: &str, file_path: Option<&Path>) -> Result<SectionRef> {
        match file_path {
            Some(path) => locate::locate(section, Target::File(path)),
            None => locate::locate(
                section,
                Target::Dir {
                    dir: &self.dir,
                    extension: &self.extension,
                },
            ),
        }
    }

    /// Apply `sets` to an existing `[section]`.
    ///
    /// # Arguments
    ///
    /// * `section` - Name of the section to update
    /// * `sets` - Key/value pairs to write, in order
    /// * `file_path` - Explicit config file; when `None` the configured
    ///   directory is searched
    ///
    /// # Returns
    ///
    /// The path of the file that was rewritten.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOption`] for unsupported option names,
    /// [`Error::NotFound`] when no file defines the section and
    /// [`Error::AmbiguousSection`] when more than one does.
    pub fn update_section(
        &self,
        section: &str,
        sets: &[(String, String)],
        file_path: Option<&Path>,
    ) -> Result<PathBuf> {
        self.validate_options(sets)?;
        let found = self.resolve(section, file_path)?;
        if !is_writable(&found.path) {
            return Err(Error::PermissionDenied {
                path: found.path.display().to_string(),
            });
        }
        let mut doc = load(&found.path)?;
        for (key, value) in sets {
            doc.set_key(section, key, value)?;
        }
        save_atomic(&doc, &found.path)?;
        info!("Section '{}' was successfully updated.", section);
        Ok(found.path)
    }

    /// Add a new `[section]` with `sets` to `file_path`, creating the file
    /// when it does not exist yet.
    ///
    /// # Errors
    ///
    /// [`Error::SectionExists`] when the file already defines the section.
    pub fn add_section(
        &self,
        section: &str,
        sets: &[(String, String)],
        file_path: &Path,
    ) -> Result<PathBuf> {
        self.validate_options(sets)?;
        let mut doc = if file_path.is_file() {
            if !is_writable(file_path) {
                return Err(Error::PermissionDenied {
                    path: file_path.display().to_string(),
                });
            }
            load(file_path)?
        } else {
            Document::new()
        };
        doc.push_section(section, &file_path.display().to_string())?;
        for (key, value) in sets {
            doc.set_key(section, key, value)?;
        }
        save_atomic(&doc, file_path)?;
        info!("Section '{}' was successfully added.", section);
        Ok(file_path.to_path_buf())
    }

    /// Apply `sets` to every section of one config file.
    pub fn update_all_sections(&self, sets: &[(String, String)], file_path: &Path) -> Result<()> {
        self.validate_options(sets)?;
        if !file_path.is_file() {
            return Err(Error::NotFound {
                target: format!("config file {}", file_path.display()),
            });
        }
        if !is_writable(file_path) {
            return Err(Error::PermissionDenied {
                path: file_path.display().to_string(),
            });
        }
        let mut doc = load(file_path)?;
        doc.set_all_sections(sets)?;
        save_atomic(&doc, file_path)?;
        info!(
            "All sections of {} were successfully updated.",
            file_path.display()
        );
        Ok(())
    }

    /// Remove a `[section]` and its entries, leaving the rest of the file
    /// untouched.
    pub fn remove_section(&self, section: &str, file_path: Option<&Path>) -> Result<PathBuf> {
        let found = self.resolve(section, file_path)?;
        if !is_writable(&found.path) {
            return Err(Error::PermissionDenied {
                path: found.path.display().to_string(),
            });
        }
        let mut doc = load(&found.path)?;
        doc.remove_section(section)?;
        save_atomic(&doc, &found.path)?;
        info!("Section '{}' was successfully removed.", section);
        Ok(found.path)
    }
}

/// Editor for `.repo` files, restricted to the option names yum honors
/// in a repository section.
pub struct RepoConfig {
    editor: YumConfigEditor,
}

impl RepoConfig {
    /// Create a repo editor over `dir_path`, defaulting to
    /// `/etc/yum.repos.d`.
    pub fn new(dir_path: Option<&Path>) -> Self {
        let dir = dir_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(YUM_REPO_DIR));
        RepoConfig {
            editor: YumConfigEditor::new(dir, YUM_REPO_FILE_EXTENSION)
                .with_valid_options(YUM_REPO_SUPPORTED_OPTIONS),
        }
    }

    /// The directory this editor scans.
    pub fn dir(&self) -> &Path {
        self.editor.dir()
    }

    /// Fold an `--enable`/`--disable` flag into the option pairs. The flag
    /// wins over an explicit `enabled=` pair.
    fn merge_enabled(sets: &[(String, String)], enabled: Option<bool>) -> Vec<(String, String)> {
        let mut merged = sets.to_vec();
        if let Some(enabled) = enabled {
            merged.retain(|(key, _)| key != "enabled");
            merged.push((
                "enabled".to_string(),
                if enabled { "1" } else { "0" }.to_string(),
            ));
        }
        merged
    }

    fn fetch_section_entries(&self, url: &str, section: &str) -> Result<Vec<(String, String)>> {
        let fetcher = Fetcher::new()?;
        let content = fetcher.fetch_text(url)?;
        let doc = Document::parse(&content, url)?;
        if !doc.has_section(section) {
            return Err(Error::NotFound {
                target: format!("section '{}' in repo file downloaded from {}", section, url),
            });
        }
        Ok(doc.entries(section))
    }

    /// Update an existing repo section.
    pub fn update_section(
        &self,
        section: &str,
        sets: &[(String, String)],
        file_path: Option<&Path>,
        enabled: Option<bool>,
    ) -> Result<()> {
        let merged = Self::merge_enabled(sets, enabled);
        if merged.is_empty() {
            debug!("Nothing to update for section '{}'", section);
            return Ok(());
        }
        self.editor.update_section(section, &merged, file_path)?;
        Ok(())
    }

    /// Add a new repo section to `file_path`.
    pub fn add_section(
        &self,
        section: &str,
        sets: &[(String, String)],
        file_path: &Path,
        enabled: Option<bool>,
    ) -> Result<()> {
        let merged = Self::merge_enabled(sets, enabled);
        self.editor.add_section(section, &merged, file_path)?;
        Ok(())
    }

    /// Update a repo section, creating it when it does not exist yet.
    ///
    /// A missing section is created only when there is somewhere sensible
    /// to put it: an explicit `file_path`, or a `down_url` whose downloaded
    /// section seeds the new one (CLI pairs overriding downloaded entries).
    /// Without either, a missing section stays a hard [`Error::NotFound`].
    pub fn add_or_update_section(
        &self,
        section: &str,
        sets: &[(String, String)],
        file_path: Option<&Path>,
        down_url: Option<&str>,
        enabled: Option<bool>,
    ) -> Result<()> {
        let merged = Self::merge_enabled(sets, enabled);
        self.editor.validate_options(&merged)?;

        let exists = match self.editor.resolve(section, file_path) {
            Ok(_) => true,
            Err(Error::NotFound { .. }) => false,
            Err(err) => return Err(err),
        };

        let mut combined = match down_url {
            Some(url) => self.fetch_section_entries(url, section)?,
            None => Vec::new(),
        };
        combined.extend(merged);

        if exists {
            if combined.is_empty() {
                debug!("Nothing to update for section '{}'", section);
                return Ok(());
            }
            self.editor.update_section(section, &combined, file_path)?;
        } else {
            if down_url.is_none() && file_path.is_none() {
                return Err(Error::NotFound {
                    target: format!(
                        "section '{}' in {} (*{})",
                        section,
                        self.editor.dir().display(),
                        YUM_REPO_FILE_EXTENSION
                    ),
                });
            }
            let target = match file_path {
                Some(path) => path.to_path_buf(),
                None => self
                    .editor
                    .dir()
                    .join(format!("{}{}", section, YUM_REPO_FILE_EXTENSION)),
            };
            self.editor.add_section(section, &combined, &target)?;
        }
        Ok(())
    }

    /// Download a repo file and apply every section it defines, with CLI
    /// pairs overriding the downloaded entries.
    ///
    /// When no `file_path` is given the target file is named after the
    /// first downloaded section, next to the other repo files.
    ///
    /// # Returns
    ///
    /// The path of the file that was written.
    pub fn add_or_update_all_from_url(
        &self,
        url: &str,
        sets: &[(String, String)],
        file_path: Option<&Path>,
        enabled: Option<bool>,
    ) -> Result<PathBuf> {
        let merged = Self::merge_enabled(sets, enabled);
        self.editor.validate_options(&merged)?;

        let fetcher = Fetcher::new()?;
        let content = fetcher.fetch_text(url)?;
        let downloaded = Document::parse(&content, url)?;
        let names: Vec<String> = downloaded
            .sections()
            .iter()
            .map(|name| name.to_string())
            .collect();
        if names.is_empty() {
            return Err(Error::MissingRepoTitle {
                url: url.to_string(),
            });
        }

        let target = match file_path {
            Some(path) => path.to_path_buf(),
            None => self
                .editor
                .dir()
                .join(format!("{}{}", names[0], YUM_REPO_FILE_EXTENSION)),
        };

        let mut doc = if target.is_file() {
            if !is_writable(&target) {
                return Err(Error::PermissionDenied {
                    path: target.display().to_string(),
                });
            }
            load(&target)?
        } else {
            Document::new()
        };

        for name in &names {
            let mut entries = downloaded.entries(name);
            entries.extend(merged.iter().cloned());
            self.editor.validate_options(&entries)?;
            if !doc.has_section(name) {
                doc.push_section(name, &target.display().to_string())?;
            }
            for (key, value) in &entries {
                doc.set_key(name, key, value)?;
            }
        }
        save_atomic(&doc, &target)?;
        info!(
            "Sections from {} were successfully applied to {}.",
            url,
            target.display()
        );
        Ok(target)
    }
}

/// Editor for the yum global config file and its `[main]` section.
#[derive(Debug)]
pub struct GlobalConfig {
    path: PathBuf,
}

impl GlobalConfig {
    /// Open the global config.
    ///
    /// An explicit `file_path` must already exist. Without one the default
    /// `/etc/yum.conf` is used and created with a bare `[main]` section
    /// when missing.
    pub fn new(file_path: Option<&Path>) -> Result<Self> {
        Self::open(file_path, Path::new(YUM_GLOBAL_CONFIG_FILE_PATH))
    }

    fn open(file_path: Option<&Path>, default_path: &Path) -> Result<Self> {
        match file_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::NotFound {
                        target: format!("config file {}", path.display()),
                    });
                }
                if !is_writable(path) {
                    return Err(Error::PermissionDenied {
                        path: path.display().to_string(),
                    });
                }
                Ok(GlobalConfig {
                    path: path.to_path_buf(),
                })
            }
            None => {
                let path = default_path.to_path_buf();
                if !path.is_file() {
                    info!(
                        "Global config file doesn't exist. Creating one at '{}'.",
                        path.display()
                    );
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let mut doc = Document::new();
                    doc.push_section("main", &path.display().to_string())?;
                    save_atomic(&doc, &path)?;
                }
                Ok(GlobalConfig { path })
            }
        }
    }

    /// The config file this editor writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `sets` to the `[main]` section, creating the section when the
    /// file exists without one.
    pub fn update(&self, sets: &[(String, String)]) -> Result<()> {
        if sets.is_empty() {
            debug!("Nothing to update in {}", self.path.display());
            return Ok(());
        }
        let mut doc = load(&self.path)?;
        if !doc.has_section("main") {
            doc.push_section("main", &self.path.display().to_string())?;
        }
        for (key, value) in sets {
            doc.set_key("main", key, value)?;
        }
        save_atomic(&doc, &self.path)?;
        info!("Section 'main' was successfully updated.");
        Ok(())
    }
}

/// Editor for dnf module state files.
///
/// Each module is tracked in `<dir>/<name>.module` with a single section
/// holding `name`, `stream`, `profiles` and `state`, the same layout dnf
/// itself maintains under `/etc/dnf/modules.d`.
pub struct ModuleConfig {
    dir: PathBuf,
}

impl ModuleConfig {
    /// Create a module editor over `dir_path`, defaulting to
    /// `/etc/dnf/modules.d`.
    pub fn new(dir_path: Option<&Path>) -> Self {
        let dir = dir_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DNF_MODULE_DIR));
        ModuleConfig { dir }
    }

    fn module_file(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", name, DNF_MODULE_FILE_EXTENSION))
    }

    fn write_state(
        &self,
        name: &str,
        stream: Option<&str>,
        profile: Option<&str>,
        state: &str,
        clear_profiles: bool,
    ) -> Result<()> {
        let path = self.module_file(name);
        let mut doc = if path.is_file() {
            if !is_writable(&path) {
                return Err(Error::PermissionDenied {
                    path: path.display().to_string(),
                });
            }
            load(&path)?
        } else {
            Document::new()
        };
        if !doc.has_section(name) {
            doc.push_section(name, &path.display().to_string())?;
        }

        let stream_value = match stream {
            Some(stream) => stream.to_string(),
            None => doc.get(name, "stream").unwrap_or_default(),
        };
        let profiles_value = if clear_profiles {
            String::new()
        } else {
            match profile {
                Some(profile) => profile.to_string(),
                None => doc.get(name, "profiles").unwrap_or_default(),
            }
        };

        doc.set_key(name, "name", name)?;
        doc.set_key(name, "stream", &stream_value)?;
        doc.set_key(name, "profiles", &profiles_value)?;
        doc.set_key(name, "state", state)?;

        std::fs::create_dir_all(&self.dir)?;
        save_atomic(&doc, &path)?;
        Ok(())
    }

    /// Mark a module enabled, optionally pinning a stream and a profile.
    pub fn enable(&self, name: &str, stream: Option<&str>, profile: Option<&str>) -> Result<()> {
        self.write_state(name, stream, profile, "enabled", false)?;
        info!("Module '{}' was successfully enabled.", name);
        Ok(())
    }

    /// Mark a module disabled. Disabling always clears the profile list.
    pub fn disable(&self, name: &str, stream: Option<&str>) -> Result<()> {
        self.write_state(name, stream, None, "disabled", true)?;
        info!("Module '{}' was successfully disabled.", name);
        Ok(())
    }

    /// Forget any recorded state for a module.
    ///
    /// Removes the module's section and deletes the state file once nothing
    /// else is left in it. Resetting a module that was never touched is a
    /// no-op, so reset is safe to run unconditionally.
    pub fn reset(&self, name: &str) -> Result<()> {
        let path = self.module_file(name);
        if !path.is_file() {
            debug!(
                "Module state file {} does not exist, nothing to reset",
                path.display()
            );
            return Ok(());
        }
        let mut doc = load(&path)?;
        if doc.has_section(name) {
            doc.remove_section(name)?;
        }
        if doc.is_effectively_empty() {
            std::fs::remove_file(&path)?;
        } else {
            save_atomic(&doc, &path)?;
        }
        info!("Module '{}' was successfully reset.", name);
        Ok(())
    }
}
