//! Section location across config files
//!
//! A repo or module name on the command line identifies a `[section]`, not a
//! file. This module resolves the section to the one file that defines it,
//! scanning a config directory the way yum itself would.
//!
//! ## Resolution rules
//!
//! - Files that don't carry the expected extension are never considered
//! - Files the process cannot write, and files that fail to parse, are
//!   skipped (with a debug log), since an update could not succeed there
//! - No candidate at all is a [`Error::NotFound`]
//! - More than one candidate is a hard [`Error::AmbiguousSection`] listing
//!   every file; the caller disambiguates with an explicit file path rather
//!   than this module guessing

use std::path::{Path, PathBuf};

use log::debug;

use crate::document::Document;
use crate::error::{Error, Result};

/// A section pinned to the config file that defines it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionRef {
    pub path: PathBuf,
    pub section: String,
}

/// Where to search for a section.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a> {
    /// One explicit config file.
    File(&'a Path),
    /// Every config file with `extension` directly below `dir`.
    Dir { dir: &'a Path, extension: &'a str },
}

/// Whether the file exists and carries write permission bits.
pub fn is_writable(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) => !metadata.permissions().readonly(),
        Err(_) => false,
    }
}

/// All writable, parseable config files below `dir` whose extension matches
/// and which define `[section]`. Results are sorted by file name so error
/// listings are stable.
pub fn find_section_files(section: &str, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    // the root section exists in every file and cannot be located by name
    if section.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*{}", dir.display(), extension);
    let mut matches = Vec::new();

    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                debug!("Skipping unreadable path: {}", err);
                continue;
            }
        };
        if !is_writable(&path) {
            debug!("Skipping non-writable config file {}", path.display());
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                debug!("Skipping config file {}: {}", path.display(), err);
                continue;
            }
        };
        let doc = match Document::parse(&content, &path.display().to_string()) {
            Ok(doc) => doc,
            Err(err) => {
                debug!("Skipping unparseable config file: {}", err);
                continue;
            }
        };
        if doc.has_section(section) {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches)
}

/// Resolve a section name to the single file that defines it.
///
/// # Errors
///
/// - [`Error::NotFound`] when no file defines the section (or the explicit
///   file does not define it)
/// - [`Error::AmbiguousSection`] when several files in the directory define
///   it; the error lists every candidate
pub fn locate(section: &str, target: Target<'_>) -> Result<SectionRef> {
    match target {
        Target::File(path) => {
            let content = std::fs::read_to_string(path).map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound {
                        target: format!("config file {}", path.display()),
                    }
                } else {
                    Error::Io(err)
                }
            })?;
            let doc = Document::parse(&content, &path.display().to_string())?;
            if section.is_empty() || !doc.has_section(section) {
                return Err(Error::NotFound {
                    target: format!("section '{}' in {}", section, path.display()),
                });
            }
            Ok(SectionRef {
                path: path.to_path_buf(),
                section: section.to_string(),
            })
        }
        Target::Dir { dir, extension } => {
            let mut files = find_section_files(section, dir, extension)?;
            if files.len() > 1 {
                return Err(Error::AmbiguousSection {
                    section: section.to_string(),
                    candidates: files
                        .iter()
                        .map(|path| path.display().to_string())
                        .collect(),
                });
            }
            match files.pop() {
                Some(path) => Ok(SectionRef {
                    path,
                    section: section.to_string(),
                }),
                None => Err(Error::NotFound {
                    target: format!(
                        "section '{}' in {} (*{})",
                        section,
                        dir.display(),
                        extension
                    ),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_repo(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    mod dir_scan_tests {
        use super::*;

        #[test]
        fn test_locate_single_match() {
            let dir = TempDir::new().unwrap();
            let path = write_repo(&dir, "epel.repo", "[epel]\nenabled=1\n");
            write_repo(&dir, "other.repo", "[other]\nenabled=1\n");

            let found = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap();
            assert_eq!(found.path, path);
            assert_eq!(found.section, "epel");
        }

        #[test]
        fn test_locate_no_match_is_not_found() {
            let dir = TempDir::new().unwrap();
            write_repo(&dir, "other.repo", "[other]\nenabled=1\n");

            let err = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }));
            assert!(format!("{err}").contains("'epel'"));
        }

        #[test]
        fn test_locate_multiple_matches_is_ambiguous() {
            let dir = TempDir::new().unwrap();
            write_repo(&dir, "b.repo", "[epel]\nenabled=1\n");
            write_repo(&dir, "a.repo", "[epel]\nenabled=0\n");

            let err = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap_err();
            match err {
                Error::AmbiguousSection {
                    section,
                    candidates,
                } => {
                    assert_eq!(section, "epel");
                    assert_eq!(candidates.len(), 2);
                    // sorted by file name
                    assert!(candidates[0].ends_with("a.repo"));
                    assert!(candidates[1].ends_with("b.repo"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_locate_ignores_other_extensions() {
            let dir = TempDir::new().unwrap();
            write_repo(&dir, "epel.repo.bak", "[epel]\nenabled=1\n");
            write_repo(&dir, "notes.md", "[epel]\n");
            let path = write_repo(&dir, "epel.repo", "[epel]\nenabled=1\n");

            let found = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap();
            assert_eq!(found.path, path);
        }

        #[test]
        fn test_locate_skips_unparseable_files() {
            let dir = TempDir::new().unwrap();
            write_repo(&dir, "broken.repo", "[epel\nwhat even is this\n");
            let path = write_repo(&dir, "good.repo", "[epel]\nenabled=1\n");

            let found = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap();
            assert_eq!(found.path, path);
        }

        #[cfg(unix)]
        #[test]
        fn test_locate_skips_readonly_files() {
            use std::os::unix::fs::PermissionsExt;

            let dir = TempDir::new().unwrap();
            let readonly = write_repo(&dir, "readonly.repo", "[epel]\nenabled=1\n");
            fs::set_permissions(&readonly, fs::Permissions::from_mode(0o444)).unwrap();
            let path = write_repo(&dir, "writable.repo", "[epel]\nenabled=1\n");

            let found = locate(
                "epel",
                Target::Dir {
                    dir: dir.path(),
                    extension: ".repo",
                },
            )
            .unwrap();
            assert_eq!(found.path, path);

            // restore so TempDir cleanup can delete it
            fs::set_permissions(&readonly, fs::Permissions::from_mode(0o644)).unwrap();
        }

        #[test]
        fn test_find_section_files_empty_dir() {
            let dir = TempDir::new().unwrap();
            let files = find_section_files("epel", dir.path(), ".repo").unwrap();
            assert!(files.is_empty());
        }
    }

    mod file_target_tests {
        use super::*;

        #[test]
        fn test_locate_in_explicit_file() {
            let dir = TempDir::new().unwrap();
            let path = write_repo(&dir, "custom.repo", "[epel]\nenabled=1\n");

            let found = locate("epel", Target::File(&path)).unwrap();
            assert_eq!(found.path, path);
        }

        #[test]
        fn test_locate_missing_section_in_file() {
            let dir = TempDir::new().unwrap();
            let path = write_repo(&dir, "custom.repo", "[other]\nenabled=1\n");

            let err = locate("epel", Target::File(&path)).unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }));
        }

        #[test]
        fn test_locate_missing_file() {
            let err = locate("epel", Target::File(Path::new("/nonexistent/x.repo")))
                .unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }));
        }

        #[test]
        fn test_locate_unparseable_file_is_parse_error() {
            let dir = TempDir::new().unwrap();
            let path = write_repo(&dir, "broken.repo", "stray line\n");

            let err = locate("epel", Target::File(&path)).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }));
        }
    }
}
