//! Build directory layout
//!
//! Derives the four working directories of a component from the configured
//! roots. Build and install directories are namespaced by
//! `<arch><variant>/<component>` so targets never share scratch or prefix.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Root directories supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootDirs {
    /// Parent of every component's source checkout
    pub sources: PathBuf,
    /// Parent of every component's patch set
    pub patches: PathBuf,
    /// Parent of the per-target scratch directories
    pub build: PathBuf,
    /// Parent of the per-target install prefixes
    pub install: PathBuf,
}

/// Target architecture plus an optional build-variant qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    /// CPU/OS identifier, e.g. `x86_64`
    pub arch: String,
    /// Appended verbatim to `arch`, e.g. `-debug`; empty for none
    pub variant_suffix: String,
}

impl Target {
    /// Target without a variant suffix
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            variant_suffix: String::new(),
        }
    }

    /// Set the variant suffix
    #[must_use]
    pub fn with_variant(mut self, suffix: impl Into<String>) -> Self {
        self.variant_suffix = suffix.into();
        self
    }

    /// Directory name qualifying build and install trees
    pub fn qualifier(&self) -> String {
        format!("{}{}", self.arch, self.variant_suffix)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualifier())
    }
}

/// Working directories of one component for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPaths {
    sources_dir: PathBuf,
    patches_dir: PathBuf,
    builds_dir: PathBuf,
    installs_dir: PathBuf,
}

impl BuildPaths {
    /// Derive the layout for `component` built for `target`
    pub fn derive(roots: &RootDirs, component: &str, target: &Target) -> Self {
        let qualifier = target.qualifier();
        Self {
            sources_dir: roots.sources.join(component),
            patches_dir: roots.patches.join(component),
            builds_dir: roots.build.join(&qualifier).join(component),
            installs_dir: roots.install.join(&qualifier).join(component),
        }
    }

    /// Source checkout; managed outside the builder
    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }

    /// Diff files and replacement files for the component
    pub fn patches_dir(&self) -> &Path {
        &self.patches_dir
    }

    /// Scratch directory, created on demand
    pub fn builds_dir(&self) -> &Path {
        &self.builds_dir
    }

    /// Install prefix, emptied before every install
    pub fn installs_dir(&self) -> &Path {
        &self.installs_dir
    }

    /// `<installs>/lib`
    pub fn lib(&self) -> PathBuf {
        self.installs_dir.join("lib")
    }

    /// `<installs>/bin`
    pub fn bin(&self) -> PathBuf {
        self.installs_dir.join("bin")
    }

    /// `<installs>/include`
    pub fn include(&self) -> PathBuf {
        self.installs_dir.join("include")
    }

    /// `<installs>/usr`
    pub fn usr(&self) -> PathBuf {
        self.installs_dir.join("usr")
    }
}
