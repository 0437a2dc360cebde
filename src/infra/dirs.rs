//! Root directory resolution
//!
//! Resolves the sources, patches, build and install roots for a project.
//! Each root is taken from, in order:
//! - `CFORGE_SOURCES_DIR`, `CFORGE_PATCHES_DIR`, `CFORGE_BUILD_DIR`,
//!   `CFORGE_INSTALL_DIR`
//! - the `[paths]` table of `cforge.toml`
//! - a fixed directory name under the project root
//!
//! Relative values resolve against the project root and a leading `~`
//! expands to the home directory.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults::{
    DEFAULT_BUILD_DIR, DEFAULT_INSTALL_DIR, DEFAULT_PATCHES_DIR, DEFAULT_SOURCES_DIR,
    ENV_BUILD_DIR, ENV_INSTALL_DIR, ENV_PATCHES_DIR, ENV_SOURCES_DIR,
};
use crate::core::paths::RootDirs;

/// Configured (not yet resolved) root values
#[derive(Debug, Clone, Copy, Default)]
pub struct RootSettings<'a> {
    pub sources: Option<&'a str>,
    pub patches: Option<&'a str>,
    pub build: Option<&'a str>,
    pub install: Option<&'a str>,
}

/// Resolves roots for one project
pub struct RootResolver<'a> {
    project_root: &'a Path,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> RootResolver<'a> {
    /// Resolver reading overrides from `lookup` instead of the process environment
    pub fn with_lookup(project_root: &'a Path, lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            project_root,
            lookup,
        }
    }

    /// Resolve all four roots
    pub fn resolve(&self, settings: &RootSettings<'_>) -> RootDirs {
        RootDirs {
            sources: self.resolve_one(ENV_SOURCES_DIR, settings.sources, DEFAULT_SOURCES_DIR),
            patches: self.resolve_one(ENV_PATCHES_DIR, settings.patches, DEFAULT_PATCHES_DIR),
            build: self.resolve_one(ENV_BUILD_DIR, settings.build, DEFAULT_BUILD_DIR),
            install: self.resolve_one(ENV_INSTALL_DIR, settings.install, DEFAULT_INSTALL_DIR),
        }
    }

    fn resolve_one(&self, env_name: &str, configured: Option<&str>, default: &str) -> PathBuf {
        if let Some(value) = (self.lookup)(env_name).filter(|v| !v.is_empty()) {
            return self.anchor(&expand_home(&value));
        }
        if let Some(value) = configured {
            return self.anchor(&expand_home(value));
        }
        self.project_root.join(default)
    }

    fn anchor(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Read a directory override from the process environment
pub fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
