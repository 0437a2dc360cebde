//! CLI command for `cforge list`

use anyhow::Result;

use crate::cli::output::is_json;
use crate::cli::Session;

/// Execute the list command
pub fn execute(session: &Session) -> Result<()> {
    let project = session.project()?;
    let components: Vec<&str> = project.component_names().collect();
    let architectures = project.architectures();

    if is_json() {
        let json = serde_json::json!({
            "components": components,
            "architectures": architectures,
            "variant_suffix": session
                .variant
                .as_deref()
                .unwrap_or(&project.config().build.variant_suffix),
            "jobs": project.jobs(),
            "roots": project.roots(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Architectures: {}", architectures.join(", "));
    if components.is_empty() {
        println!("No components defined in {}", session.config_path.display());
        return Ok(());
    }
    println!("Components:");
    for name in components {
        println!("  {name}");
    }
    Ok(())
}
