//! Default values for yum-repo-tools.
//!
//! This module provides centralized paths, option allow-lists and embedded
//! defaults used across the binaries, ensuring consistency and avoiding
//! duplication.

/// Directory that holds yum/dnf repo files.
pub const YUM_REPO_DIR: &str = "/etc/yum.repos.d";

/// File extension of yum/dnf repo files.
pub const YUM_REPO_FILE_EXTENSION: &str = ".repo";

/// yum/dnf global configuration file.
pub const YUM_GLOBAL_CONFIG_FILE_PATH: &str = "/etc/yum.conf";

/// Directory that holds dnf module state files.
pub const DNF_MODULE_DIR: &str = "/etc/dnf/modules.d";

/// File extension of dnf module state files.
pub const DNF_MODULE_FILE_EXTENSION: &str = ".module";

/// Options that may be set on a repo file section. Anything else is
/// rejected before the file is touched.
pub const YUM_REPO_SUPPORTED_OPTIONS: &[&str] = &[
    "name",
    "baseurl",
    "enabled",
    "gpgcheck",
    "gpgkey",
    "priority",
    "exclude",
];

/// Default DLRN server used for hash resolution and trunk repos.
pub const DEFAULT_RDO_MIRROR: &str = "https://trunk.rdoproject.org";

/// os-release file used for distro detection.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Marker file whose presence identifies a UBI container, where os-release
/// still claims plain RHEL.
pub const UBI_REPO_MARKER: &str = "/etc/yum.repos.d/ubi.repo";

/// Secondary repo directory used by UBI images and some node images.
pub const DISTRO_REPO_DIR: &str = "/etc/distro.repos.d";

/// Distros the repo setup tool can configure, as (id, major version)
/// pairs. An empty version accepts any version of that id.
pub const SUPPORTED_DISTROS: &[(&str, &str)] = &[
    ("centos", "7"),
    ("centos", "8"),
    ("centos", "9"),
    ("fedora", ""),
    ("rhel", "8"),
    ("rhel", "9"),
    ("ubi", "8"),
    ("ubi", "9"),
];

/// Whether a detected (id, major version) pair is one the setup tool
/// supports.
pub fn is_supported_distro(id: &str, major_version: &str) -> bool {
    SUPPORTED_DISTROS
        .iter()
        .any(|(distro, version)| *distro == id && (version.is_empty() || *version == major_version))
}

/// Default package mirror for each distro label.
pub fn default_mirror(distro: &str) -> Option<&'static str> {
    match distro {
        "fedora" => Some("https://mirrors.fedoraproject.org"),
        "centos7" | "centos8" | "ubi8" => Some("http://mirror.centos.org"),
        "centos9" | "ubi9" => Some("http://mirror.stream.centos.org"),
        "rhel8" | "rhel9" => Some(DEFAULT_RDO_MIRROR),
        _ => None,
    }
}

/// Distro labels accepted on the command line, e.g. `centos9` or `fedora`.
pub fn distro_choices() -> Vec<String> {
    SUPPORTED_DISTROS
        .iter()
        .map(|(distro, version)| format!("{distro}{version}"))
        .collect()
}

/// CentOS releases with compose metadata support.
pub const COMPOSE_REPOS_RELEASES: &[&str] = &["centos-stream-8", "centos-stream-9"];

/// Architectures a compose publishes repos for.
pub const COMPOSE_REPOS_SUPPORTED_ARCHS: &[&str] = &["aarch64", "ppc64le", "x86_64"];

/// Location of the compose metadata document below a compose URL.
pub const COMPOSE_REPOS_INFO_PATH: &str = "metadata/composeinfo.json";

/// Per-release pattern a compose URL must match. Group 1 is the server,
/// group 2 the (possibly label-based) compose segment, group 3 the
/// `/compose` tail; the segment gets replaced with the concrete compose id.
pub fn compose_url_pattern(release: &str) -> Option<&'static str> {
    match release {
        "centos-stream-8" => Some(r"^(https://composes\.centos\.org)/(.+?)(/compose/?)$"),
        "centos-stream-9" => {
            Some(r"^(https://odcs\.stream\.centos\.org/production)/(.+?)(/compose/?)$")
        }
        _ => None,
    }
}

/// Paths probed for a hash-resolver config file, in order. The embedded
/// [`DLRN_DEFAULT_CONFIG`] is the fallback when none exists.
pub const DLRN_CONFIG_PATHS: &[&str] = &[
    "/usr/local/etc/dlrn-hash/config.yaml",
    "/etc/dlrn-hash/config.yaml",
];

/// Name of the per-user hash-resolver config file below the platform config
/// directory.
pub const DLRN_USER_CONFIG_NAME: &str = "dlrn-hash/config.yaml";

/// Embedded hash-resolver configuration, used when no config file is
/// installed.
pub const DLRN_DEFAULT_CONFIG: &str = "\
dlrn_url: https://trunk.rdoproject.org
releases:
  - master
  - wallaby
  - victoria
  - ussuri
  - train
  - stein
  - queens
  - osp16-2
  - osp17
named_tags:
  - current
  - consistent
  - component-ci-testing
  - promoted-components
  - tripleo-ci-testing
  - current-tripleo
  - current-tripleo-rdo
components:
  - baremetal
  - cinder
  - clients
  - cloudops
  - common
  - compute
  - glance
  - manila
  - network
  - octavia
  - security
  - swift
  - tempest
  - tripleo
  - ui
  - validation
os_versions:
  - centos7
  - centos8
  - centos9
  - rhel8
  - rhel9
";
