//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions and repo file
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_repo_file("epel", repos::EPEL);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::repos;
    pub use super::TestFixture;
}

/// Common repo file snippets for testing.
#[allow(dead_code)]
pub mod repos {
    /// One enabled repo with the usual fields.
    pub const EPEL: &str = "\
[epel]
name=Extra Packages for Enterprise Linux
baseurl=https://dl.fedoraproject.org/pub/epel/$releasever/Everything/$basearch/
enabled=1
gpgcheck=1
";

    /// Two sections sharing one file.
    pub const CENTOS_PAIR: &str = "\
[baseos]
name=CentOS Stream - BaseOS
enabled=1

[appstream]
name=CentOS Stream - AppStream
enabled=1
";

    /// Comments and spacing that must survive edits byte for byte.
    pub const COMMENTED: &str = "\
# managed by kickstart, do not edit
[delorean]
name = delorean
# pinned during promotion
enabled = 0
";

    /// A second file defining the same `[epel]` section as [`EPEL`].
    pub const EPEL_CLONE: &str = "\
[epel]
name=epel mirror clone
enabled=0
";

    /// Broken: a leftover merge conflict marker where a header should be.
    pub const CONFLICT_MARKER: &str = "<<<<<<< HEAD\n[epel]\nname=x\n";

    /// A typical RDO Trunk repo file, as served for a promotion.
    pub const DELOREAN: &str = "\
[delorean]
name=delorean-openstack-nova-abc123
baseurl=https://trunk.rdoproject.org/centos9-master/ab/c1/abc123_def45678
enabled=1
gpgcheck=0
priority=1
";

    /// The matching deps repo file.
    pub const DELOREAN_DEPS: &str = "\
[delorean-deps]
name=delorean-deps
baseurl=http://mirror.stream.centos.org/SIGs/9-stream/cloud/$basearch/openstack-master/
enabled=1
gpgcheck=0
priority=20
";
}

/// A test fixture that provides a temporary config directory.
///
/// This struct simplifies the common pattern of creating a temp directory
/// standing in for `/etc/yum.repos.d` (or `/etc/dnf/modules.d`) and
/// populating it with repo files.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_repo_file("epel", repos::EPEL);
///
/// fixture
///     .yum_config()
///     .args(["repo", "epel", "--disable"])
///     .arg("--config-dir-path")
///     .arg(fixture.path())
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add `<name>.repo` with the given content.
    #[allow(dead_code)]
    pub fn with_repo_file(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("{name}.repo"), content)
    }

    /// Add a file with the given relative path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a file below the fixture back into a string.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path)).expect("Failed to read file")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `yum-config` command running in this fixture's directory.
    #[allow(dead_code)]
    pub fn yum_config(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("yum-config");
        cmd.current_dir(self.path());
        cmd
    }

    /// A `dlrn-hash` command running in this fixture's directory.
    #[allow(dead_code)]
    pub fn dlrn_hash(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dlrn-hash");
        cmd.current_dir(self.path());
        cmd
    }

    /// A `repo-setup` command running in this fixture's directory.
    ///
    /// The distro repo dir is redirected below the fixture so no test run
    /// can ever touch `/etc/distro.repos.d` on the machine running it.
    #[allow(dead_code)]
    pub fn repo_setup(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-setup");
        cmd.current_dir(self.path());
        cmd.arg("--distro-repos-path")
            .arg(self.path().join("distro.repos.d"));
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_repo_file() {
        let fixture = TestFixture::new().with_repo_file("epel", repos::EPEL);
        assert!(fixture.path().join("epel.repo").exists());
        assert_eq!(fixture.read("epel.repo"), repos::EPEL);
    }

    #[test]
    fn test_snippets_have_trailing_newlines() {
        // edits depend on files ending in a newline-terminated line
        for content in [
            repos::EPEL,
            repos::CENTOS_PAIR,
            repos::COMMENTED,
            repos::EPEL_CLONE,
            repos::DELOREAN,
            repos::DELOREAN_DEPS,
        ] {
            assert!(content.ends_with('\n'));
        }
    }
}
