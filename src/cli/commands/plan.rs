//! Plan command implementation.
//!
//! Shows what `package` would do without running anything.

use crate::cli::{Command, RuntimeConfig};
use crate::error::Result;
use crate::packager::Packager;

/// Execute plan command
pub(super) fn execute_plan(command: &Command, config: &RuntimeConfig) -> Result<()> {
    let Command::Plan { json, .. } = command else {
        unreachable!("execute_plan called with non-Plan command");
    };

    let manifest = config.load_manifest()?;
    let packager = Packager::new(manifest, &config.root, command.packager_options())?;
    let plan = packager.plan();
    let output = config.output();

    if *json {
        output.data(&serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    output.println(&format!("🔍 Packaging plan for {}", config.root.display()));
    for (index, planned) in plan.iter().enumerate() {
        let marker = if planned.skipped { " (skipped)" } else { "" };
        output.indent(&format!(
            "{}. {}: {}{}",
            index + 1,
            planned.step,
            planned.description,
            marker
        ));
    }

    Ok(())
}
