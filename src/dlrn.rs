//! DLRN build hash resolution
//!
//! DLRN continuously rebuilds OpenStack packages and publishes the result
//! under per-build URLs named by hashes. Promotion tags like
//! `current-tripleo` are symlinks on the DLRN server; resolving a tag to
//! its concrete hashes is what pins a deployment to an exact repo state.
//!
//! ## Features
//!
//! - Load resolver settings from a YAML config file, with system-wide,
//!   per-user and built-in fallbacks
//! - Validate requested os version, release, component and tag against the
//!   configured allow-lists before any request is made
//! - Resolve the tag to `commit.yaml` or `delorean.repo.md5` depending on
//!   os version and component, and extract the hashes from either format
//!
//! ## Example
//!
//! ```ignore
//! use yum_repo_tools::dlrn::{DlrnConfig, HashInfo};
//! use yum_repo_tools::http::Fetcher;
//!
//! let config = DlrnConfig::load(None)?;
//! let fetcher = Fetcher::new()?;
//! let info = HashInfo::fetch(&fetcher, &config, "centos9", "master", "current-tripleo", None)?;
//! println!("{}", info.full_hash);
//! ```

use std::fmt;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::{DLRN_CONFIG_PATHS, DLRN_DEFAULT_CONFIG, DLRN_USER_CONFIG_NAME};
use crate::error::{Error, Result};
use crate::http::Fetcher;

/// Resolver settings: the DLRN server plus the allow-lists a request is
/// checked against.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DlrnConfig {
    pub dlrn_url: String,
    pub releases: Vec<String>,
    pub components: Vec<String>,
    pub named_tags: Vec<String>,
    pub os_versions: Vec<String>,
}

impl DlrnConfig {
    /// The built-in config compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(serde_yaml::from_str(DLRN_DEFAULT_CONFIG)?)
    }

    /// Load the resolver config.
    ///
    /// An explicit `path` must exist. Without one, the first match wins:
    /// system paths, then the user's config directory, then the built-in
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(Error::InvalidConfig {
                    message: format!("config file {} does not exist", path.display()),
                });
            }
            return Self::from_file(path);
        }
        for candidate in DLRN_CONFIG_PATHS {
            let candidate = Path::new(candidate);
            if candidate.is_file() {
                return Self::from_file(candidate);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let candidate = config_dir.join(DLRN_USER_CONFIG_NAME);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        debug!("No resolver config file found, using built-in defaults");
        Self::embedded()
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading resolver config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Check a request against the configured allow-lists.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] naming the rejected value and the
    /// accepted ones.
    pub fn validate_selection(
        &self,
        os_version: &str,
        release: &str,
        tag: &str,
        component: Option<&str>,
    ) -> Result<()> {
        check_allowed("os version", os_version, &self.os_versions)?;
        check_allowed("release", release, &self.releases)?;
        check_allowed("tag", tag, &self.named_tags)?;
        if let Some(component) = component {
            check_allowed("component", component, &self.components)?;
        }
        Ok(())
    }
}

fn check_allowed(kind: &str, value: &str, allowed: &[String]) -> Result<()> {
    if allowed.iter().any(|entry| entry == value) {
        return Ok(());
    }
    Err(Error::InvalidArguments {
        message: format!(
            "'{}' is not a supported {}. Expected one of: {}",
            value,
            kind,
            allowed.join(", ")
        ),
    })
}

/// The URL a (os version, release, tag, component) tuple resolves to.
///
/// centos7 builds predate per-component pipelines and only publish
/// `commit.yaml`. Component builds publish `commit.yaml` under the
/// component tree. Everything else uses the aggregated
/// `delorean.repo.md5`.
pub fn resolve_repo_url(
    base_url: &str,
    os_version: &str,
    release: &str,
    tag: &str,
    component: Option<&str>,
) -> String {
    let base = base_url.trim_end_matches('/');
    if os_version.starts_with("centos7") {
        format!("{}/{}-{}/{}/commit.yaml", base, os_version, release, tag)
    } else if let Some(component) = component {
        format!(
            "{}/{}-{}/component/{}/{}/commit.yaml",
            base, os_version, release, component, tag
        )
    } else {
        format!(
            "{}/{}-{}/{}/delorean.repo.md5",
            base, os_version, release, tag
        )
    }
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    commits: Vec<Commit>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    commit_hash: String,
    distro_hash: String,
    #[serde(default)]
    extended_hash: Option<String>,
}

/// The hashes a promotion tag resolved to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HashInfo {
    pub os_version: String,
    pub release: String,
    pub tag: String,
    pub component: Option<String>,
    /// The URL the hashes were read from.
    pub repo_url: String,
    pub full_hash: String,
    pub commit_hash: Option<String>,
    pub distro_hash: Option<String>,
    pub extended_hash: Option<String>,
}

impl HashInfo {
    /// Resolve and download the hashes for one request.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] for values outside the allow-lists and
    /// [`Error::UnexpectedStatus`] when the DLRN server does not answer
    /// with the metadata file.
    pub fn fetch(
        fetcher: &Fetcher,
        config: &DlrnConfig,
        os_version: &str,
        release: &str,
        tag: &str,
        component: Option<&str>,
    ) -> Result<Self> {
        config.validate_selection(os_version, release, tag, component)?;
        let repo_url = resolve_repo_url(&config.dlrn_url, os_version, release, tag, component);
        let body = fetcher.fetch_text(&repo_url)?;
        Self::from_body(&repo_url, &body, os_version, release, tag, component)
    }

    fn from_body(
        repo_url: &str,
        body: &str,
        os_version: &str,
        release: &str,
        tag: &str,
        component: Option<&str>,
    ) -> Result<Self> {
        let (full_hash, commit_hash, distro_hash, extended_hash) =
            if repo_url.ends_with("commit.yaml") {
                let payload: CommitPayload = serde_yaml::from_str(body)?;
                let commit =
                    payload
                        .commits
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::InvalidConfig {
                            message: format!("no commits listed in {}", repo_url),
                        })?;
                let short_distro = commit
                    .distro_hash
                    .get(..8)
                    .unwrap_or(commit.distro_hash.as_str());
                let full_hash = format!("{}_{}", commit.commit_hash, short_distro);
                // DLRN emits the literal string "None" when a build has no
                // extended hash
                let extended_hash = commit
                    .extended_hash
                    .filter(|value| value != "None" && !value.is_empty());
                (
                    full_hash,
                    Some(commit.commit_hash),
                    Some(commit.distro_hash),
                    extended_hash,
                )
            } else {
                (body.trim().to_string(), None, None, None)
            };

        Ok(HashInfo {
            os_version: os_version.to_string(),
            release: release.to_string(),
            tag: tag.to_string(),
            component: component.map(str::to_string),
            repo_url: repo_url.to_string(),
            full_hash,
            commit_hash,
            distro_hash,
            extended_hash,
        })
    }
}

impl fmt::Display for HashInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "os_version: {}", self.os_version)?;
        writeln!(f, "release: {}", self.release)?;
        writeln!(f, "tag: {}", self.tag)?;
        if let Some(component) = &self.component {
            writeln!(f, "component: {}", component)?;
        }
        writeln!(f, "repo_url: {}", self.repo_url)?;
        write!(f, "full_hash: {}", self.full_hash)?;
        if let Some(commit_hash) = &self.commit_hash {
            write!(f, "\ncommit_hash: {}", commit_hash)?;
        }
        if let Some(distro_hash) = &self.distro_hash {
            write!(f, "\ndistro_hash: {}", distro_hash)?;
        }
        if let Some(extended_hash) = &self.extended_hash {
            write!(f, "\nextended_hash: {}", extended_hash)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod url_tests {
        use super::*;

        #[test]
        fn test_centos7_resolves_to_commit_yaml() {
            let url = resolve_repo_url(
                "https://trunk.rdoproject.org",
                "centos7",
                "train",
                "current-tripleo",
                None,
            );
            assert_eq!(
                url,
                "https://trunk.rdoproject.org/centos7-train/current-tripleo/commit.yaml"
            );
        }

        #[test]
        fn test_component_resolves_to_component_commit_yaml() {
            let url = resolve_repo_url(
                "https://trunk.rdoproject.org",
                "centos9",
                "master",
                "current-tripleo",
                Some("compute"),
            );
            assert_eq!(
                url,
                "https://trunk.rdoproject.org/centos9-master/component/compute/current-tripleo/commit.yaml"
            );
        }

        #[test]
        fn test_plain_request_resolves_to_md5() {
            let url = resolve_repo_url(
                "https://trunk.rdoproject.org",
                "centos8",
                "wallaby",
                "current-tripleo",
                None,
            );
            assert_eq!(
                url,
                "https://trunk.rdoproject.org/centos8-wallaby/current-tripleo/delorean.repo.md5"
            );
        }

        #[test]
        fn test_trailing_slash_in_base_url() {
            let url = resolve_repo_url(
                "https://trunk.rdoproject.org/",
                "centos8",
                "master",
                "current",
                None,
            );
            assert_eq!(
                url,
                "https://trunk.rdoproject.org/centos8-master/current/delorean.repo.md5"
            );
        }
    }

    mod config_tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_embedded_config_loads() {
            let config = DlrnConfig::embedded().unwrap();
            assert_eq!(config.dlrn_url, "https://trunk.rdoproject.org");
            assert!(config.releases.iter().any(|release| release == "master"));
            assert!(config.named_tags.iter().any(|tag| tag == "current-tripleo"));
            assert!(config.os_versions.iter().any(|os| os == "centos9"));
        }

        #[test]
        fn test_load_explicit_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(
                file,
                "dlrn_url: https://example.com\n\
                 releases: [master]\n\
                 components: [compute]\n\
                 named_tags: [current]\n\
                 os_versions: [centos9]"
            )
            .unwrap();

            let config = DlrnConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.dlrn_url, "https://example.com");
            assert_eq!(config.releases, vec!["master"]);
        }

        #[test]
        fn test_load_explicit_missing_file() {
            let err = DlrnConfig::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig { .. }));
        }

        #[test]
        fn test_config_with_missing_key_fails() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "dlrn_url: https://example.com\nreleases: [master]").unwrap();

            let err = DlrnConfig::load(Some(file.path())).unwrap_err();
            assert!(matches!(err, Error::Yaml(_)));
        }

        #[test]
        fn test_validate_selection_accepts_defaults() {
            let config = DlrnConfig::embedded().unwrap();
            config
                .validate_selection("centos8", "master", "current-tripleo", None)
                .unwrap();
        }

        #[test]
        fn test_validate_selection_rejects_unknown_release() {
            let config = DlrnConfig::embedded().unwrap();
            let err = config
                .validate_selection("centos8", "not-a-release", "current-tripleo", None)
                .unwrap_err();
            match err {
                Error::InvalidArguments { message } => {
                    assert!(message.contains("'not-a-release'"));
                    assert!(message.contains("release"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_validate_selection_rejects_unknown_component() {
            let config = DlrnConfig::embedded().unwrap();
            let err = config
                .validate_selection("centos9", "master", "current-tripleo", Some("warp-drive"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArguments { .. }));
        }

        #[test]
        fn test_validate_selection_rejects_unknown_os_version() {
            let config = DlrnConfig::embedded().unwrap();
            let err = config
                .validate_selection("gentoo", "master", "current-tripleo", None)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArguments { .. }));
        }
    }

    mod body_tests {
        use super::*;

        const COMMIT_YAML: &str = "\
commits:
- commit_hash: c9c96e518e42c6e9cbd5ddb3a1cfc19b310bc1f6
  distro_hash: 03b0e286ba5a01b33d1ba4d11a95a721e5c9fbab
  extended_hash: 'None'
- commit_hash: ffffffffffffffffffffffffffffffffffffffff
  distro_hash: eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee
";

        #[test]
        fn test_commit_yaml_takes_first_commit() {
            let info = HashInfo::from_body(
                "https://trunk.rdoproject.org/centos9-master/component/compute/current-tripleo/commit.yaml",
                COMMIT_YAML,
                "centos9",
                "master",
                "current-tripleo",
                Some("compute"),
            )
            .unwrap();

            assert_eq!(
                info.commit_hash.as_deref(),
                Some("c9c96e518e42c6e9cbd5ddb3a1cfc19b310bc1f6")
            );
            assert_eq!(
                info.full_hash,
                "c9c96e518e42c6e9cbd5ddb3a1cfc19b310bc1f6_03b0e286"
            );
        }

        #[test]
        fn test_extended_hash_none_string_is_dropped() {
            let info = HashInfo::from_body(
                "https://example.com/commit.yaml",
                COMMIT_YAML,
                "centos9",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap();
            assert_eq!(info.extended_hash, None);
        }

        #[test]
        fn test_real_extended_hash_is_kept() {
            let body = "\
commits:
- commit_hash: aaaa
  distro_hash: bbbbbbbbcccc
  extended_hash: dddd_eeee
";
            let info = HashInfo::from_body(
                "https://example.com/commit.yaml",
                body,
                "centos9",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap();
            assert_eq!(info.extended_hash.as_deref(), Some("dddd_eeee"));
            assert_eq!(info.full_hash, "aaaa_bbbbbbbb");
        }

        #[test]
        fn test_md5_body_is_the_full_hash() {
            let info = HashInfo::from_body(
                "https://example.com/centos8-master/current-tripleo/delorean.repo.md5",
                "ab5aeb3fc42d0fc0f4a4eb85cdb16962\n",
                "centos8",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap();

            assert_eq!(info.full_hash, "ab5aeb3fc42d0fc0f4a4eb85cdb16962");
            assert_eq!(info.commit_hash, None);
            assert_eq!(info.distro_hash, None);
            assert_eq!(info.extended_hash, None);
        }

        #[test]
        fn test_empty_commit_list_is_an_error() {
            let err = HashInfo::from_body(
                "https://example.com/commit.yaml",
                "commits: []\n",
                "centos9",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap_err();
            assert!(matches!(err, Error::InvalidConfig { .. }));
        }

        #[test]
        fn test_display_lists_resolved_hashes() {
            let info = HashInfo::from_body(
                "https://example.com/commit.yaml",
                COMMIT_YAML,
                "centos9",
                "master",
                "current-tripleo",
                Some("compute"),
            )
            .unwrap();

            let rendered = info.to_string();
            assert!(rendered.contains("component: compute"));
            assert!(rendered
                .contains("full_hash: c9c96e518e42c6e9cbd5ddb3a1cfc19b310bc1f6_03b0e286"));
            assert!(rendered
                .contains("distro_hash: 03b0e286ba5a01b33d1ba4d11a95a721e5c9fbab"));
        }
    }

    mod fetch_tests {
        use super::*;

        fn test_config(server_url: &str) -> DlrnConfig {
            DlrnConfig {
                dlrn_url: server_url.to_string(),
                releases: vec!["master".to_string()],
                components: vec!["compute".to_string()],
                named_tags: vec!["current-tripleo".to_string()],
                os_versions: vec!["centos8".to_string(), "centos9".to_string()],
            }
        }

        #[test]
        fn test_fetch_md5_hash() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/centos8-master/current-tripleo/delorean.repo.md5")
                .with_status(200)
                .with_body("ab5aeb3fc42d0fc0f4a4eb85cdb16962")
                .create();

            let config = test_config(&server.url());
            let fetcher = Fetcher::new().unwrap();
            let info = HashInfo::fetch(
                &fetcher,
                &config,
                "centos8",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap();

            assert_eq!(info.full_hash, "ab5aeb3fc42d0fc0f4a4eb85cdb16962");
            mock.assert();
        }

        #[test]
        fn test_fetch_component_commit_yaml() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock(
                    "GET",
                    "/centos9-master/component/compute/current-tripleo/commit.yaml",
                )
                .with_status(200)
                .with_body(
                    "commits:\n- commit_hash: abcdef\n  distro_hash: 0123456789\n",
                )
                .create();

            let config = test_config(&server.url());
            let fetcher = Fetcher::new().unwrap();
            let info = HashInfo::fetch(
                &fetcher,
                &config,
                "centos9",
                "master",
                "current-tripleo",
                Some("compute"),
            )
            .unwrap();

            assert_eq!(info.full_hash, "abcdef_01234567");
            assert_eq!(info.distro_hash.as_deref(), Some("0123456789"));
        }

        #[test]
        fn test_fetch_missing_tag_is_fatal() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/centos9-master/current-tripleo/delorean.repo.md5")
                .with_status(404)
                .create();

            let config = test_config(&server.url());
            let fetcher = Fetcher::new().unwrap();
            let err = HashInfo::fetch(
                &fetcher,
                &config,
                "centos9",
                "master",
                "current-tripleo",
                None,
            )
            .unwrap_err();

            assert!(matches!(err, Error::UnexpectedStatus { status: 404, .. }));
        }

        #[test]
        fn test_fetch_validates_before_requesting() {
            // no mock set up: validation must fail before any request
            let config = test_config("http://127.0.0.1:1");
            let fetcher = Fetcher::new().unwrap();
            let err = HashInfo::fetch(
                &fetcher,
                &config,
                "centos9",
                "master",
                "bogus-tag",
                None,
            )
            .unwrap_err();

            assert!(matches!(err, Error::InvalidArguments { .. }));
        }
    }
}
