//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a `cforge.toml` plus the
/// sources/patches trees a scenario needs.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Path of the project config
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("cforge.toml")
    }

    /// Write the project config
    pub fn write_config(&self, content: &str) {
        self.create_file("cforge.toml", content);
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write a one-line unified diff turning `old` into `new`
    pub fn create_diff(&self, name: &str, filename: &str, old: &str, new: &str) {
        self.create_file(
            name,
            &format!("--- a/{filename}\n+++ b/{filename}\n@@ -1 +1 @@\n-{old}\n+{new}\n"),
        );
    }

    /// Turn `dir` (relative to the project) into a git checkout of its current files
    ///
    /// Returns `false` when git is not installed.
    pub fn commit_sources(&self, dir: &str) -> bool {
        if !have_tool("git") {
            return false;
        }
        let root = self.dir.path().join(dir);
        git(&root, &["init", "--quiet"]);
        git(&root, &["add", "--all"]);
        git(&root, &["commit", "--quiet", "--no-gpg-sign", "-m", "initial"]);
        true
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `tool` is on `PATH`
pub fn have_tool(tool: &str) -> bool {
    which::which(tool).is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=cforge", "-c", "user.email=cforge@localhost"])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {args:?} failed");
}

/// Run the cforge binary inside `project` with directory overrides cleared
pub fn run_cforge(project: &TestProject, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cforge"))
        .current_dir(project.path())
        .env_remove("CFORGE_DRY_RUN")
        .env_remove("CFORGE_SOURCES_DIR")
        .env_remove("CFORGE_PATCHES_DIR")
        .env_remove("CFORGE_BUILD_DIR")
        .env_remove("CFORGE_INSTALL_DIR")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute cforge")
}

/// Recipe that stages a copy of `foo.c` through every phase
pub const FOO_RECIPE: &str = r#"
[build]
architectures = ["x86_64", "aarch64"]
jobs = 2

[components.foo]
configure = [["sh", "-c", "echo configured > config.status"]]
build = [["sh", "-c", "cp {sources}/foo.c foo.c.built"]]
install = [
    { run = ["mkdir", "-p", "{lib}"] },
    { run = ["cp", "foo.c.built", "{lib}/foo.c"] },
]
"#;
