//! Declarative components
//!
//! A recipe is a `[components.<name>]` table from the project config. Each
//! lifecycle hook runs the recipe's argv steps from the build directory,
//! and the patch hook manages the recipe's fixes plus every `*.diff` under
//! the component's patches directory.
//!
//! Step arguments may use placeholders: `{component}`, `{arch}`, `{variant}`, `{jobs}`,
//! `{sources}`, `{patches}`, `{builds}`, `{installs}`, `{lib}`, `{bin}`,
//! `{include}`, `{usr}`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::defaults::PATCH_EXTENSION;
use crate::core::component::{BuildContext, Component};
use crate::error::{ConfigError, StepError};
use crate::infra::process::CommandLine;

/// Build steps and source modifications of one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentSpec {
    /// Steps of the configure hook
    #[serde(default)]
    pub configure: Vec<StepSpec>,

    /// Steps of the build hook
    #[serde(default)]
    pub build: Vec<StepSpec>,

    /// Steps of the install hook
    #[serde(default)]
    pub install: Vec<StepSpec>,

    /// Environment for every step
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Apply every diff found under the patches directory
    #[serde(default = "default_true")]
    pub patches: bool,

    /// Whole-file replacements
    #[serde(default)]
    pub fixes: Vec<FixSpec>,

    /// Links created at the end of install
    #[serde(default)]
    pub symlinks: Vec<SymlinkSpec>,
}

fn default_true() -> bool {
    true
}

/// One command of a hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    /// Bare argv, run from the build directory
    Argv(Vec<String>),
    /// Argv with its own working directory and environment
    Detailed {
        run: Vec<String>,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

/// A replacement file copied into the source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixSpec {
    /// Relative to the component's patches directory
    pub replacement: PathBuf,
    /// Relative to the component's sources directory
    pub destination: PathBuf,
}

/// A link created after the install steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymlinkSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub relative: bool,
}

/// Component driven by a [`ComponentSpec`]
#[derive(Debug, Clone)]
pub struct RecipeComponent {
    name: String,
    spec: ComponentSpec,
}

impl RecipeComponent {
    pub fn new(name: impl Into<String>, spec: ComponentSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    pub fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    fn run_steps(&self, ctx: &BuildContext<'_>, phase: &str, steps: &[StepSpec]) -> Result<(), StepError> {
        let vars = placeholders(ctx);
        for step in steps {
            let cmd = self.command_for(ctx, &vars, phase, step)?;
            ctx.run(&cmd)?;
        }
        Ok(())
    }

    fn command_for(
        &self,
        ctx: &BuildContext<'_>,
        vars: &HashMap<&'static str, String>,
        phase: &str,
        step: &StepSpec,
    ) -> Result<CommandLine, ConfigError> {
        let (argv, cwd, step_env) = match step {
            StepSpec::Argv(argv) => (argv, None, None),
            StepSpec::Detailed { run, cwd, env } => (run, cwd.as_deref(), Some(env)),
        };

        let Some((program, args)) = argv.split_first() else {
            return Err(ConfigError::EmptyCommand {
                component: self.name.clone(),
                phase: phase.to_string(),
            });
        };

        let mut cmd = CommandLine::new(self.expand(program, vars)?);
        for arg in args {
            cmd = cmd.arg(self.expand(arg, vars)?);
        }

        let dir = match cwd {
            Some(dir) => PathBuf::from(self.expand(dir, vars)?),
            None => ctx.paths().builds_dir().to_path_buf(),
        };
        cmd = cmd.current_dir(dir);

        for (key, value) in self.spec.env.iter().chain(step_env.into_iter().flatten()) {
            cmd = cmd.env(key.clone(), self.expand(value, vars)?);
        }

        Ok(cmd)
    }

    fn expand(&self, template: &str, vars: &HashMap<&'static str, String>) -> Result<String, ConfigError> {
        expand_placeholders(template, vars).map_err(|placeholder| ConfigError::UnknownPlaceholder {
            component: self.name.clone(),
            placeholder,
        })
    }
}

impl Component for RecipeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&self, ctx: &BuildContext<'_>) -> Result<(), StepError> {
        self.run_steps(ctx, "configure", &self.spec.configure)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<(), StepError> {
        self.run_steps(ctx, "build", &self.spec.build)
    }

    fn install(&self, ctx: &BuildContext<'_>) -> Result<(), StepError> {
        self.run_steps(ctx, "install", &self.spec.install)?;

        let vars = placeholders(ctx);
        for link in &self.spec.symlinks {
            let from = PathBuf::from(self.expand(&link.from, &vars)?);
            let to = PathBuf::from(self.expand(&link.to, &vars)?);
            ctx.setup_symlink(&from, &to, link.relative)?;
        }
        Ok(())
    }

    fn configure_patches(&self, ctx: &BuildContext<'_>, enable: bool) -> Result<(), StepError> {
        let paths = ctx.paths();

        for fix in &self.spec.fixes {
            ctx.add_file(
                &paths.patches_dir().join(&fix.replacement),
                &paths.sources_dir().join(&fix.destination),
                enable,
            )?;
        }

        if self.spec.patches {
            for patch_file in find_patch_files(paths.patches_dir()) {
                ctx.configure_patch_file(&patch_file, enable)?;
            }
        }
        Ok(())
    }
}

/// Every `*.diff` below `dir`, sorted; empty when `dir` is missing
pub fn find_patch_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no patches directory");
        return Vec::new();
    }

    let mut patches: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.to_string_lossy().ends_with(PATCH_EXTENSION))
        .collect();
    patches.sort();
    patches
}

/// Placeholder values for the component and target behind `ctx`
fn placeholders(ctx: &BuildContext<'_>) -> HashMap<&'static str, String> {
    let paths = ctx.paths();
    let display = |p: &Path| p.display().to_string();
    HashMap::from([
        ("component", ctx.component().to_string()),
        ("arch", ctx.target().arch.clone()),
        ("variant", ctx.target().variant_suffix.clone()),
        ("jobs", ctx.jobs().to_string()),
        ("sources", display(paths.sources_dir())),
        ("patches", display(paths.patches_dir())),
        ("builds", display(paths.builds_dir())),
        ("installs", display(paths.installs_dir())),
        ("lib", display(&paths.lib())),
        ("bin", display(&paths.bin())),
        ("include", display(&paths.include())),
        ("usr", display(&paths.usr())),
    ])
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// Substitute `{name}` placeholders; returns the first unknown name on failure
pub fn expand_placeholders(
    template: &str,
    vars: &HashMap<&'static str, String>,
) -> Result<String, String> {
    let pattern = placeholder_pattern();
    if let Some(unknown) = pattern
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !vars.contains_key(name.as_str()))
    {
        return Err(unknown);
    }

    Ok(pattern
        .replace_all(template, |caps: &Captures<'_>| vars[&caps[1]].clone())
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::guard::DiskProbe;
    use crate::core::paths::{BuildPaths, RootDirs, Target};
    use crate::infra::process::ProcessRunner;
    use tempfile::TempDir;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("builds", "/b/x86_64/zlib".to_string()),
            ("jobs", "6".to_string()),
        ])
    }

    fn paths_under(root: &Path) -> BuildPaths {
        let roots = RootDirs {
            sources: root.join("sources"),
            patches: root.join("patches"),
            build: root.join("build"),
            install: root.join("install"),
        };
        BuildPaths::derive(&roots, "zlib", &Target::new("x86_64"))
    }

    #[test]
    fn test_expand_known_placeholders() {
        assert_eq!(
            expand_placeholders("--build={builds} -j{jobs}", &vars()).unwrap(),
            "--build=/b/x86_64/zlib -j6"
        );
    }

    #[test]
    fn test_expand_leaves_plain_text() {
        assert_eq!(expand_placeholders("-DFOO=ON", &vars()).unwrap(), "-DFOO=ON");
    }

    #[test]
    fn test_expand_rejects_unknown_placeholder() {
        assert_eq!(
            expand_placeholders("{prefix}/lib", &vars()).unwrap_err(),
            "prefix"
        );
    }

    #[test]
    fn test_spec_parses_both_step_forms() {
        let spec: ComponentSpec = toml::from_str(
            r#"
configure = [["cmake", "-S", "{sources}"]]
build = [{ run = ["make", "-j{jobs}"], cwd = "{sources}", env = { V = "1" } }]
fixes = [{ replacement = "CMakeLists.txt", destination = "contrib/CMakeLists.txt" }]
"#,
        )
        .unwrap();

        assert!(spec.patches);
        assert_eq!(spec.configure, vec![StepSpec::Argv(vec![
            "cmake".to_string(),
            "-S".to_string(),
            "{sources}".to_string(),
        ])]);
        assert!(matches!(
            &spec.build[0],
            StepSpec::Detailed { cwd: Some(cwd), .. } if cwd == "{sources}"
        ));
        assert_eq!(spec.fixes.len(), 1);
        assert!(spec.install.is_empty());
    }

    #[test]
    fn test_spec_rejects_unknown_keys() {
        let parsed: Result<ComponentSpec, _> = toml::from_str("biuld = []");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_command_defaults_to_build_directory() {
        let dir = TempDir::new().unwrap();
        let paths = paths_under(dir.path());
        let target = Target::new("x86_64");
        let runner = ProcessRunner::new(true);
        let ctx = BuildContext {
            component: "zlib",
            target: &target,
            paths: &paths,
            runner: &runner,
            probe: &DiskProbe,
            jobs: 4,
        };
        let mut spec: ComponentSpec = toml::from_str("env = { CFLAGS = \"-O2\" }").unwrap();
        spec.build = vec![StepSpec::Argv(vec!["make".to_string(), "-j{jobs}".to_string()])];
        let recipe = RecipeComponent::new("zlib", spec);

        let cmd = recipe
            .command_for(&ctx, &placeholders(&ctx), "build", &recipe.spec().build[0])
            .unwrap();

        assert_eq!(cmd.to_string(), "make -j4");
        assert_eq!(cmd.cwd(), Some(paths.builds_dir()));
        assert_eq!(cmd.get_env(), &[("CFLAGS".to_string(), "-O2".to_string())]);
    }

    #[test]
    fn test_empty_step_is_config_error() {
        let dir = TempDir::new().unwrap();
        let paths = paths_under(dir.path());
        let target = Target::new("x86_64");
        let runner = ProcessRunner::new(true);
        let ctx = BuildContext {
            component: "zlib",
            target: &target,
            paths: &paths,
            runner: &runner,
            probe: &DiskProbe,
            jobs: 1,
        };
        let mut spec: ComponentSpec = toml::from_str("").unwrap();
        spec.configure = vec![StepSpec::Argv(Vec::new())];
        let recipe = RecipeComponent::new("zlib", spec);

        let err = recipe.configure(&ctx).unwrap_err();
        assert!(matches!(
            err,
            StepError::Config(ConfigError::EmptyCommand { .. })
        ));
    }

    #[test]
    fn test_find_patch_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/sub")).unwrap();
        std::fs::write(dir.path().join("src/sub/b.c.diff"), "").unwrap();
        std::fs::write(dir.path().join("a.c.diff"), "").unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();

        let found = find_patch_files(dir.path());

        assert_eq!(
            found,
            vec![dir.path().join("a.c.diff"), dir.path().join("src/sub/b.c.diff")]
        );
    }

    #[test]
    fn test_find_patch_files_missing_dir() {
        assert!(find_patch_files(Path::new("/definitely/not/here")).is_empty());
    }
}
