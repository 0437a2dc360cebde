//! Test utilities
//!
//! Generators for proptest plus fixtures for tests that need a real git
//! checkout or the `patch` tool.

use std::path::Path;
use std::process::Command;

pub mod generators {
    use proptest::prelude::*;

    /// Generate a component name (lowercase alphanumeric with hyphens)
    pub fn component_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate an architecture identifier
    pub fn architecture() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("x86_64".to_string()),
            Just("aarch64".to_string()),
            Just("armv7".to_string()),
            Just("riscv64".to_string()),
            "[a-z][a-z0-9_]{1,10}",
        ]
    }

    /// Generate a variant suffix, possibly empty
    pub fn variant_suffix() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "-[a-z]{1,8}"]
    }
}

/// Whether `tool` is on `PATH`
pub fn have_tool(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Write a one-line unified diff turning `old` into `new` in `filename`
pub fn write_diff(path: &Path, filename: &str, old: &str, new: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create patch directory");
    }
    let diff = format!("--- a/{filename}\n+++ b/{filename}\n@@ -1 +1 @@\n-{old}\n+{new}\n");
    std::fs::write(path, diff).expect("Failed to write diff");
}

/// Initialise a git repository in `dir` with `files` committed
///
/// Returns `false` when git is not installed so callers can skip.
pub fn git_repo_with(dir: &Path, files: &[(&str, &str)]) -> bool {
    if !have_tool("git") {
        return false;
    }

    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    let git = |args: &[&str]| {
        let status = Command::new("git")
            .args(["-c", "user.name=cforge", "-c", "user.email=cforge@localhost"])
            .args(args)
            .current_dir(dir)
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {args:?} failed");
    };
    git(&["init", "--quiet"]);
    git(&["add", "--all"]);
    git(&["commit", "--quiet", "--no-gpg-sign", "-m", "initial"]);
    true
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_component_name_generator(name in component_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_variant_suffix_generator(suffix in variant_suffix()) {
            prop_assert!(suffix.is_empty() || suffix.starts_with('-'));
        }
    }
}
