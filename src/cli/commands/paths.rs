//! CLI command for `cforge paths`

use anyhow::{Context, Result};

use crate::cli::output::is_json;
use crate::cli::Session;
use crate::core::paths::BuildPaths;

/// Execute the paths command
pub fn execute(session: &Session, component: &str, arch: Option<&str>) -> Result<()> {
    let project = session.project()?;
    project.component(component)?;

    let arch = match arch {
        Some(arch) => {
            project.select_architectures(&[arch.to_string()])?;
            arch.to_string()
        }
        None => project
            .architectures()
            .into_iter()
            .next()
            .context("No architectures configured")?,
    };
    let target = project.target_for(&arch, session.variant.as_deref());
    let paths = BuildPaths::derive(project.roots(), component, &target);

    if is_json() {
        let json = serde_json::json!({
            "component": component,
            "target": target.qualifier(),
            "sources": paths.sources_dir(),
            "patches": paths.patches_dir(),
            "builds": paths.builds_dir(),
            "installs": paths.installs_dir(),
            "lib": paths.lib(),
            "bin": paths.bin(),
            "include": paths.include(),
            "usr": paths.usr(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{component} ({target})");
    for (label, dir) in [
        ("sources", paths.sources_dir().to_path_buf()),
        ("patches", paths.patches_dir().to_path_buf()),
        ("builds", paths.builds_dir().to_path_buf()),
        ("installs", paths.installs_dir().to_path_buf()),
        ("lib", paths.lib()),
        ("bin", paths.bin()),
        ("include", paths.include()),
        ("usr", paths.usr()),
    ] {
        println!("  {label:<9} {}", dir.display());
    }
    Ok(())
}
