//! Package command implementation.
//!
//! Runs the full packaging procedure with step-by-step progress.

use super::helpers::{format_size, report_lines};
use crate::cli::{Command, RuntimeConfig};
use crate::error::Result;
use crate::packager::{Packager, Step};

/// Execute package command
pub(super) async fn execute_package(command: &Command, config: &RuntimeConfig) -> Result<()> {
    let Command::Package { json, .. } = command else {
        unreachable!("execute_package called with non-Package command");
    };

    let manifest = config.load_manifest()?;
    let packager = Packager::new(manifest, &config.root, command.packager_options())?;
    let output = config.output();

    output.verbose(&format!("Project root: {}", config.root.display()));
    output.verbose(&format!("Tool failures: {:?}", packager.tool_failure()));

    let total = Step::ALL.len();
    let mut index = 0;
    let report = packager
        .run_with(|planned| {
            index += 1;
            if *json {
                log::info!("{}: {}", planned.step, planned.description);
            } else if planned.skipped {
                output.skipped(&format!("{} (skipped)", planned.step));
            } else {
                output.step(index, total, &format!("{}: {}", planned.step, planned.description));
            }
        })
        .await?;

    if *json {
        output.data(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for warning in &report.warnings {
        output.warn(warning);
    }

    output.success(&format!(
        "Release assembled in {} ({} files, {})",
        report.package_dir.display(),
        report.total_files(),
        format_size(report.total_size())
    ));
    for line in report_lines(&report) {
        output.indent(&line);
    }

    Ok(())
}
