//! Project configuration
//!
//! Reads `cforge.toml`, which declares root directories, target
//! architectures and the recipe of every component:
//!
//! ```toml
//! [paths]
//! sources = "Sources"
//!
//! [build]
//! architectures = ["x86_64", "aarch64"]
//! variant_suffix = ""
//! jobs = 8
//!
//! [components.zlib]
//! configure = [["cmake", "-S", "{sources}", "-B", "{builds}"]]
//! build = [["cmake", "--build", "{builds}", "-j", "{jobs}"]]
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::lifecycle::{default_jobs, Builder};
use crate::core::paths::{RootDirs, Target};
use crate::core::recipe::{ComponentSpec, RecipeComponent};
use crate::error::ConfigError;
use crate::infra::dirs::{env_lookup, RootResolver, RootSettings};
use crate::infra::process::ProcessRunner;

/// Contents of `cforge.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Root directory overrides
    #[serde(default)]
    pub paths: PathsConfig,

    /// Target and parallelism settings
    #[serde(default)]
    pub build: BuildSettings,

    /// Component recipes by name
    #[serde(default)]
    pub components: BTreeMap<String, ComponentSpec>,
}

/// `[paths]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub sources: Option<String>,
    pub patches: Option<String>,
    pub build: Option<String>,
    pub install: Option<String>,
}

/// `[build]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    /// Architectures built when none is requested; empty means the host
    #[serde(default)]
    pub architectures: Vec<String>,

    /// Variant qualifier appended to every architecture
    #[serde(default)]
    pub variant_suffix: String,

    /// Parallel job count; derived from the CPU count when unset
    pub jobs: Option<usize>,
}

/// A loaded project: config plus resolved roots
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    roots: RootDirs,
}

impl Project {
    /// Load the project whose config lives at `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file is missing and
    /// `ConfigError::Parse` if it is not a valid project config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, &env_lookup)
    }

    /// Load with directory overrides read from `lookup`
    pub fn load_with(path: &Path, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let config: ProjectConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let root = project_root(path)?;
        Ok(Self::from_config(root, config, lookup))
    }

    /// Build a project from an already parsed config
    pub fn from_config(
        root: PathBuf,
        config: ProjectConfig,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        let settings = RootSettings {
            sources: config.paths.sources.as_deref(),
            patches: config.paths.patches.as_deref(),
            build: config.paths.build.as_deref(),
            install: config.paths.install.as_deref(),
        };
        let roots = RootResolver::with_lookup(&root, lookup).resolve(&settings);
        Self { root, config, roots }
    }

    /// Directory containing the config file
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed config
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Resolved root directories
    pub fn roots(&self) -> &RootDirs {
        &self.roots
    }

    /// Declared component names, sorted
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.config.components.keys().map(String::as_str)
    }

    /// Configured architectures, or the host architecture when none are
    pub fn architectures(&self) -> Vec<String> {
        if self.config.build.architectures.is_empty() {
            vec![env::consts::ARCH.to_string()]
        } else {
            self.config.build.architectures.clone()
        }
    }

    /// Validate requested architectures; an empty request selects all
    ///
    /// When the config lists no architectures any request is accepted.
    pub fn select_architectures(&self, requested: &[String]) -> Result<Vec<String>, ConfigError> {
        if requested.is_empty() {
            return Ok(self.architectures());
        }

        let known = &self.config.build.architectures;
        if let Some(arch) = requested
            .iter()
            .find(|arch| !known.is_empty() && !known.contains(arch))
        {
            return Err(ConfigError::UnknownArchitecture {
                arch: arch.clone(),
                known: known.clone(),
            });
        }
        Ok(requested.to_vec())
    }

    /// Target for `arch`, using `variant` in place of the configured suffix if given
    pub fn target_for(&self, arch: &str, variant: Option<&str>) -> Target {
        let suffix = variant.unwrap_or(&self.config.build.variant_suffix);
        Target::new(arch).with_variant(suffix)
    }

    /// Parallel job count
    pub fn jobs(&self) -> usize {
        self.config.build.jobs.map_or_else(default_jobs, |jobs| jobs.max(1))
    }

    /// Recipe component named `name`
    pub fn component(&self, name: &str) -> Result<RecipeComponent, ConfigError> {
        self.config
            .components
            .get(name)
            .map(|spec| RecipeComponent::new(name, spec.clone()))
            .ok_or_else(|| ConfigError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Builder for one component and target
    pub fn builder(
        &self,
        name: &str,
        target: Target,
        runner: ProcessRunner,
    ) -> Result<Builder, ConfigError> {
        let component = self.component(name)?;
        Ok(Builder::new(Box::new(component), target, &self.roots, runner).with_jobs(self.jobs()))
    }
}

/// Absolute directory containing `config_path`
fn project_root(config_path: &Path) -> Result<PathBuf, ConfigError> {
    let parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if parent.is_absolute() {
        return Ok(parent.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| ConfigError::Read {
        path: config_path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(cwd.join(parent))
}
