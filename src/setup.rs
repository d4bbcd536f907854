//! Host setup for RDO Trunk and CentOS dependency repos.
//!
//! Downloads delorean repo files from an RDO Trunk server, rewrites their
//! mirrors and priorities where needed, generates the companion distro repos
//! (Ceph, opstools, HighAvailability, PowerTools/CRB, AppStream, BaseOS) and
//! installs everything into a yum repo directory, replacing whatever repos a
//! previous run left behind.
//!
//! ## Features
//!
//! - Validates the requested repo combination for the target distro before
//!   touching any file.
//! - Repoints `baseurl=` entries at a custom package or RDO Trunk mirror.
//! - Folds per-component delorean repos into a single `delorean.repo`.
//! - Handles UBI images by installing CentOS Base and AppStream next to the
//!   RDO Trunk repos.
//!
//! ## Example
//!
//! ```ignore
//! use yum_repo_tools::http::Fetcher;
//! use yum_repo_tools::setup::RepoSetup;
//!
//! let setup = RepoSetup::new(
//!     vec!["current-tripleo".to_string()],
//!     "centos9",
//!     "master",
//!     "/etc/yum.repos.d",
//!     None,
//!     "https://trunk.rdoproject.org",
//!     true,
//! )?;
//! setup.run(&Fetcher::new()?, "CentOS Stream", "9")?;
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use regex::Regex;

use crate::defaults::{default_mirror, DEFAULT_RDO_MIRROR, DISTRO_REPO_DIR, YUM_REPO_DIR};
use crate::error::{Error, Result};
use crate::http::Fetcher;

/// Repos that can be requested on the command line.
pub const REPO_CHOICES: &[&str] = &[
    "current",
    "deps",
    "current-tripleo",
    "current-tripleo-dev",
    "ceph",
    "opstools",
    "tripleo-ci-testing",
    "current-tripleo-rdo",
];

/// Subset of [`REPO_CHOICES`] that exists for Fedora.
const FEDORA_REPO_CHOICES: &[&str] = &[
    "current",
    "current-tripleo",
    "ceph",
    "deps",
    "tripleo-ci-testing",
];

/// Packages taken from delorean-current when mixing it with current-tripleo.
const INCLUDE_PKGS: &str = "includepkgs=instack,instack-undercloud,os-apply-config,\
os-collect-config,os-net-config,os-refresh-config,python*-tripleoclient,\
openstack-tripleo-*,openstack-puppet-modules,ansible-role-tripleo*,puppet-*,\
python*-tripleo-common,python*-paunch*,tripleo-ansible,ansible-config_template";

const TITLE_PATTERN: &str = r"\[(.*)\]";
const NAME_PATTERN: &str = r"name=(.+)";
const PRIORITY_PATTERN: &str = r"priority=\d+";

fn ceph_repo(mirror: &str, centos_release: &str, ceph_release: &str) -> String {
    format!(
        "\n[tripleo-centos-ceph-{ceph_release}]\n\
         name=tripleo-centos-ceph-{ceph_release}\n\
         baseurl={mirror}/centos/{centos_release}/storage/$basearch/ceph-{ceph_release}/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn ceph_sig_repo(mirror: &str, centos_release: &str, ceph_release: &str) -> String {
    format!(
        "\n[tripleo-centos-ceph-{ceph_release}]\n\
         name=tripleo-centos-ceph-{ceph_release}\n\
         baseurl={mirror}/SIGs/{centos_release}/storage/$basearch/ceph-{ceph_release}/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn ceph_rdo_repo(ceph_release: &str) -> String {
    format!(
        "\n[tripleo-centos-ceph-{ceph_release}]\n\
         name=tripleo-centos-ceph-{ceph_release}\n\
         baseurl=https://trunk.rdoproject.org/centos8-master/deps/storage/{ceph_release}/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn opstools_repo(mirror: &str) -> String {
    format!(
        "\n[tripleo-centos-opstools]\n\
         name=tripleo-centos-opstools\n\
         baseurl={mirror}/centos/7/opstools/$basearch/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn highavailability_repo(mirror: &str, legacy_url: &str, stream: &str) -> String {
    format!(
        "\n[tripleo-centos-highavailability]\n\
         name=tripleo-centos-highavailability\n\
         baseurl={mirror}/{legacy_url}{stream}/HighAvailability/$basearch/os/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn powertools_repo(mirror: &str, legacy_url: &str, stream: &str, pt_name: &str) -> String {
    format!(
        "\n[tripleo-centos-powertools]\n\
         name=tripleo-centos-powertools\n\
         baseurl={mirror}/{legacy_url}{stream}/{pt_name}/$basearch/os/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

fn appstream_repo(mirror: &str, legacy_url: &str, stream: &str, extra: &str) -> String {
    format!(
        "\n[tripleo-centos-appstream]\n\
         name=tripleo-centos-appstream\n\
         baseurl={mirror}/{legacy_url}{stream}/AppStream/$basearch/os/\n\
         gpgcheck=0\n\
         enabled=1\n\
         {extra}\n"
    )
}

fn base_repo(mirror: &str, legacy_url: &str, stream: &str) -> String {
    format!(
        "\n[tripleo-centos-baseos]\n\
         name=tripleo-centos-baseos\n\
         baseurl={mirror}/{legacy_url}{stream}/BaseOS/$basearch/os/\n\
         gpgcheck=0\n\
         enabled=1\n"
    )
}

/// Ceph release matching an OpenStack branch name.
fn ceph_release_for_branch(branch: &str) -> &'static str {
    match branch {
        "liberty" | "mitaka" => "hammer",
        "newton" | "ocata" | "pike" => "jewel",
        "queens" | "rocky" => "luminous",
        "stein" | "train" | "ussuri" | "victoria" => "nautilus",
        _ => "pacific",
    }
}

/// First `[section]` title in a downloaded repo file, used as the file name.
///
/// Per-component delorean repos carry titles like `[delorean-component-common]`
/// and are folded into a single `delorean` repo.
fn repo_title(content: &str, origin: &str) -> Result<String> {
    let title = Regex::new(TITLE_PATTERN)?
        .captures(content)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| Error::MissingRepoTitle {
            url: origin.to_string(),
        })?;
    if title.contains("component") {
        Ok("delorean".to_string())
    } else {
        Ok(title)
    }
}

/// Rewrites every `priority=` entry to `new_priority`, inserting one under
/// each section title when the content has none.
fn change_priority(content: &str, new_priority: u32) -> Result<String> {
    let priority_re = Regex::new(PRIORITY_PATTERN)?;
    let replacement = format!("priority={new_priority}");
    let updated = priority_re
        .replace_all(content, replacement.as_str())
        .into_owned();
    if priority_re.is_match(&updated) {
        return Ok(updated);
    }
    let mut lines = Vec::new();
    for line in content.split('\n') {
        lines.push(line.to_string());
        if line.starts_with('[') {
            lines.push(replacement.clone());
        }
    }
    Ok(lines.join("\n"))
}

/// Inserts the TripleO `includepkgs=` filter under each section title.
fn add_includepkgs(content: &str) -> String {
    let mut lines = Vec::new();
    for line in content.split('\n') {
        lines.push(line);
        if line.starts_with('[') {
            lines.push(INCLUDE_PKGS);
        }
    }
    lines.join("\n")
}

/// One full repo installation, parameterized by distro, branch and mirrors.
#[derive(Debug, Clone)]
pub struct RepoSetup {
    repos: Vec<String>,
    distro: String,
    branch: String,
    output_path: PathBuf,
    mirror: String,
    old_mirror: Option<String>,
    rdo_mirror: String,
    stream: bool,
    distro_repo_dir: PathBuf,
}

impl RepoSetup {
    /// Builds a setup run.
    ///
    /// # Arguments
    ///
    /// * `repos` - Repos to install, each one of [`REPO_CHOICES`].
    /// * `distro` - Distro label such as `centos9` or `fedora`.
    /// * `branch` - Lowercase OpenStack release name, or `master`.
    /// * `output_path` - Directory the repo files are written to.
    /// * `mirror` - Package mirror, defaulted per distro when `None`.
    /// * `rdo_mirror` - RDO Trunk server the delorean repos come from.
    /// * `stream` - Whether CentOS Stream repo paths are used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArguments`] when no mirror is given and none
    /// is known for the distro.
    pub fn new(
        repos: Vec<String>,
        distro: &str,
        branch: &str,
        output_path: impl Into<PathBuf>,
        mirror: Option<&str>,
        rdo_mirror: &str,
        stream: bool,
    ) -> Result<Self> {
        let fallback = default_mirror(distro).or_else(|| {
            // no release-specific fedora mirrors exist
            if distro.contains("fedora") {
                default_mirror("fedora")
            } else {
                None
            }
        });
        let mirror = match mirror {
            Some(mirror) => mirror.to_string(),
            None => fallback
                .ok_or_else(|| Error::InvalidArguments {
                    message: format!("no default mirror is known for '{distro}', use --mirror"),
                })?
                .to_string(),
        };
        Ok(RepoSetup {
            repos,
            distro: distro.to_string(),
            branch: branch.to_string(),
            output_path: output_path.into(),
            mirror,
            old_mirror: fallback.map(str::to_string),
            rdo_mirror: rdo_mirror.to_string(),
            stream,
            distro_repo_dir: PathBuf::from(DISTRO_REPO_DIR),
        })
    }

    /// Overrides the distro repo directory UBI images are served from.
    pub fn with_distro_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.distro_repo_dir = dir.into();
        self
    }

    /// Checks the requested repos against the distro and the host.
    ///
    /// `distro_name` and `distro_major_version` describe the host the repos
    /// are installed on, as reported by os-release.
    pub fn validate(&self, distro_name: &str, distro_major_version: &str) -> Result<()> {
        self.validate_current_tripleo()?;
        self.validate_distro_repos()?;
        self.validate_tripleo_ci_testing()?;
        self.validate_distro_stream(distro_name, distro_major_version)
    }

    fn validate_distro_repos(&self) -> Result<()> {
        let valid: &[&str] = if self.distro.contains("fedora") {
            FEDORA_REPO_CHOICES
        } else {
            REPO_CHOICES
        };
        let invalid: Vec<&str> = self
            .repos
            .iter()
            .map(String::as_str)
            .filter(|repo| !valid.contains(repo))
            .collect();
        if invalid.is_empty() {
            return Ok(());
        }
        Err(Error::InvalidArguments {
            message: format!(
                "{} repo(s) are not valid for {}. Valid repos are: {}",
                invalid.join(", "),
                self.distro,
                valid.join(", ")
            ),
        })
    }

    /// current-tripleo-dev already mixes current, current-tripleo and deps,
    /// so those must not be requested alongside it.
    fn validate_current_tripleo(&self) -> Result<()> {
        let has = |name: &str| self.repos.iter().any(|repo| repo == name);
        if has("current-tripleo") && has("current") {
            return Err(Error::InvalidArguments {
                message: "Cannot use current and current-tripleo at the same time.".to_string(),
            });
        }
        if !has("current-tripleo-dev") {
            return Ok(());
        }
        if has("current") || has("current-tripleo") || has("deps") {
            return Err(Error::InvalidArguments {
                message: "current-tripleo-dev should not be used with any other RDO Trunk repos."
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_tripleo_ci_testing(&self) -> Result<()> {
        let has = |name: &str| self.repos.iter().any(|repo| repo == name);
        if has("tripleo-ci-testing") && self.repos.len() > 1 {
            if has("deps") || has("ceph") || has("opstools") {
                return Ok(());
            }
            return Err(Error::InvalidArguments {
                message: "Cannot use tripleo-ci-testing at the same time as other repos, \
                          except deps, ceph or opstools."
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Fails when a stream repo layout is requested on a non-Stream CentOS
    /// host or vice versa. Skipped for custom output paths, where the repo
    /// files may never be used to install packages on this host.
    fn validate_distro_stream(&self, distro_name: &str, distro_major_version: &str) -> Result<()> {
        if self.output_path != Path::new(YUM_REPO_DIR) {
            return Ok(());
        }
        let name = distro_name.to_lowercase();
        if !name.contains("centos") {
            return Ok(());
        }
        if name == "centos" && distro_major_version != "8" {
            return Ok(());
        }
        if self.stream && !name.contains("stream") {
            return Err(Error::InvalidArguments {
                message: "--stream provided, but the OS is not the Stream version. \
                          Please ensure the host is Stream."
                    .to_string(),
            });
        }
        if !self.stream && name.contains("stream") {
            return Err(Error::InvalidArguments {
                message: "--no-stream provided, but the OS is the Stream version. \
                          Please ensure the host is not the Stream version."
                    .to_string(),
            });
        }
        Ok(())
    }

    /// RDO Trunk base URL for the distro and branch, with a trailing slash.
    fn base_path(&self) -> String {
        // UBI has no usable base paths of its own, CentOS ones are served
        let distro = if matches!(self.distro.as_str(), "ubi8" | "ubi9") {
            self.distro.replace("ubi", "centos")
        } else {
            self.distro.clone()
        };
        format!("{}/{}-{}/", self.rdo_mirror, distro, self.branch)
    }

    /// Removes repo files a previous run installed, from both the output
    /// path and the distro repo directory.
    fn remove_existing(&self) -> Result<()> {
        let pattern = if matches!(self.distro.as_str(), "ubi8" | "ubi9") {
            r"^(BaseOS|AppStream|delorean|tripleo-centos-(opstools|ceph|highavailability|powertools)).*\.repo"
        } else {
            r"^(delorean|tripleo-centos-(opstools|ceph|highavailability|powertools)).*\.repo"
        };
        let pattern = Regex::new(pattern)?;

        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.output_path)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        if self.distro_repo_dir.exists() {
            for entry in fs::read_dir(&self.distro_repo_dir)? {
                names.insert(entry?.file_name().to_string_lossy().into_owned());
            }
        }

        for name in &names {
            if !pattern.is_match(name) {
                continue;
            }
            for dir in [&self.output_path, &self.distro_repo_dir] {
                let path = dir.join(name);
                if path.exists() {
                    fs::remove_file(&path)?;
                    info!("Removed old repo \"{}\"", path.display());
                }
            }
        }
        Ok(())
    }

    /// Replaces default mirror references in downloaded repo content with
    /// the servers this run installs from.
    fn inject_mirrors(&self, content: &str) -> String {
        let mut content = content.replace(
            &format!("baseurl={DEFAULT_RDO_MIRROR}"),
            &format!("baseurl={}", self.rdo_mirror),
        );
        if let Some(old_mirror) = &self.old_mirror {
            content = content.replace(
                &format!("baseurl={old_mirror}"),
                &format!("baseurl={}", self.mirror),
            );
        }
        content
    }

    fn fetch_repo(&self, fetcher: &Fetcher, url: &str) -> Result<String> {
        Ok(self.inject_mirrors(&fetcher.fetch_text(url)?))
    }

    fn write_repo(&self, content: &str, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{name}.repo"));
        fs::write(&path, content)?;
        info!("Installed repo {} to {}", name, path.display());
        Ok(path)
    }

    /// Ceph repo content for a Ceph release, picking the repo source the
    /// distro actually serves it from.
    fn ceph_content(&self, ceph_release: &str) -> String {
        match self.distro.as_str() {
            "centos7" => ceph_repo(&self.mirror, "7", ceph_release),
            "centos8" if ceph_release == "nautilus" => ceph_rdo_repo(ceph_release),
            "centos8" => ceph_repo(&self.mirror, "8-stream", ceph_release),
            _ => ceph_sig_repo(&self.mirror, "9-stream", ceph_release),
        }
    }

    fn install_deps(&self, fetcher: &Fetcher, base_path: &str) -> Result<()> {
        let url = format!("{base_path}delorean-deps.repo");
        let content = self.fetch_repo(fetcher, &url)?;
        self.write_repo(&content, &self.output_path, &repo_title(&content, &url)?)?;
        Ok(())
    }

    fn install_repos(&self, fetcher: &Fetcher, base_path: &str) -> Result<()> {
        for repo in &self.repos {
            match repo.as_str() {
                "current" => {
                    let url = format!("{base_path}current/delorean.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    self.write_repo(&content, &self.output_path, "delorean")?;
                    self.install_deps(fetcher, base_path)?;
                }
                "deps" => self.install_deps(fetcher, base_path)?,
                "current-tripleo" => {
                    let url = format!("{base_path}current-tripleo/delorean.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    self.write_repo(&content, &self.output_path, &repo_title(&content, &url)?)?;
                    self.install_deps(fetcher, base_path)?;
                }
                "current-tripleo-dev" => {
                    let url = format!("{base_path}delorean-deps.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    self.write_repo(&content, &self.output_path, &repo_title(&content, &url)?)?;

                    let url = format!("{base_path}current-tripleo/delorean.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    let content = Regex::new(TITLE_PATTERN)?
                        .replace_all(&content, "[${1}-current-tripleo]")
                        .into_owned();
                    let content = Regex::new(NAME_PATTERN)?
                        .replace_all(&content, "name=${1}-current-tripleo")
                        .into_owned();
                    // mixing repos that were generated with the same priority
                    let content = change_priority(&content, 20)?;
                    self.write_repo(&content, &self.output_path, "delorean-current-tripleo")?;

                    let url = format!("{base_path}current/delorean.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    let content = add_includepkgs(&content);
                    let content = change_priority(&content, 10)?;
                    self.write_repo(&content, &self.output_path, "delorean")?;
                }
                "tripleo-ci-testing" | "current-tripleo-rdo" => {
                    let url = format!("{base_path}{repo}/delorean.repo");
                    let content = self.fetch_repo(fetcher, &url)?;
                    self.write_repo(&content, &self.output_path, &repo_title(&content, &url)?)?;
                    self.install_deps(fetcher, base_path)?;
                }
                "ceph" => {
                    let release = ceph_release_for_branch(&self.branch);
                    let content = self.ceph_content(release);
                    self.write_repo(
                        &content,
                        &self.output_path,
                        &format!("tripleo-centos-ceph-{release}"),
                    )?;
                }
                "opstools" => {
                    self.write_repo(
                        &opstools_repo(&self.mirror),
                        &self.output_path,
                        "tripleo-centos-opstools",
                    )?;
                }
                other => {
                    return Err(Error::InvalidArguments {
                        message: format!("Invalid repo \"{other}\" specified"),
                    });
                }
            }
        }
        self.install_distro_repos()
    }

    /// Installs the CentOS repos the requested branch needs next to the RDO
    /// Trunk ones: Base and AppStream on UBI, HighAvailability and
    /// PowerTools/CRB on CentOS 8 and later.
    fn install_distro_repos(&self) -> Result<()> {
        let mut distro = self.distro.clone();
        let mut legacy_url = "centos/";

        if matches!(distro.as_str(), "ubi8" | "ubi9") {
            let dp_exists = self.distro_repo_dir.exists();
            if !dp_exists {
                warn!(
                    "For UBI it is recommended to create {} and rerun!",
                    self.distro_repo_dir.display()
                );
            }
            let distro_path = if self.output_path == Path::new(YUM_REPO_DIR) && dp_exists {
                self.distro_repo_dir.clone()
            } else {
                self.output_path.clone()
            };
            // edk2 builds in these releases break UEFI guests, rhbz#1961558
            let extra = if matches!(self.branch.as_str(), "train" | "ussuri" | "victoria") {
                "exclude=edk2-ovmf-20200602gitca407c7246bf-5*"
            } else {
                ""
            };
            let major = distro.chars().last().unwrap_or('0');
            let stream_release = format!("{major}-stream");
            self.write_repo(
                &appstream_repo(&self.mirror, legacy_url, &stream_release, extra),
                &distro_path,
                "tripleo-centos-appstream",
            )?;
            self.write_repo(
                &base_repo(&self.mirror, legacy_url, &stream_release),
                &distro_path,
                "tripleo-centos-baseos",
            )?;
            distro = format!("centos{major}");
        }

        if distro.contains("centos") {
            let major = distro
                .chars()
                .last()
                .and_then(|digit| digit.to_digit(10))
                .unwrap_or(0);
            if major >= 8 {
                let mut stream_release = major.to_string();
                if self.stream {
                    stream_release.push_str("-stream");
                }
                let mut pt_name = "PowerTools";
                if stream_release.contains('9') {
                    legacy_url = "";
                    pt_name = "CRB";
                }
                self.write_repo(
                    &highavailability_repo(&self.mirror, legacy_url, &stream_release),
                    &self.output_path,
                    "tripleo-centos-highavailability",
                )?;
                self.write_repo(
                    &powertools_repo(&self.mirror, legacy_url, &stream_release, pt_name),
                    &self.output_path,
                    "tripleo-centos-powertools",
                )?;
                if stream_release.contains('9') {
                    self.write_repo(
                        &appstream_repo(&self.mirror, legacy_url, &stream_release, ""),
                        &self.output_path,
                        "tripleo-centos-appstream",
                    )?;
                    self.write_repo(
                        &base_repo(&self.mirror, legacy_url, &stream_release),
                        &self.output_path,
                        "tripleo-centos-baseos",
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Validates the request, removes previously installed repos and
    /// installs the selected ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArguments`] for a repo combination the distro
    /// does not support, [`Error::UnexpectedStatus`] when the RDO Trunk
    /// server rejects a download, and [`Error::Io`] when the output path
    /// cannot be read or written.
    pub fn run(&self, fetcher: &Fetcher, distro_name: &str, distro_major_version: &str) -> Result<()> {
        self.validate(distro_name, distro_major_version)?;
        let base_path = self.base_path();
        self.remove_existing()?;
        self.install_repos(fetcher, &base_path)
    }
}
