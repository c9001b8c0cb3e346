//! External tool invocation for the configure and build steps.

use crate::config::ToolCommand;
use crate::error::StepError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Locate the program for a tool command.
///
/// Programs containing a path separator are resolved against the project root
/// so `scripts/configure.sh`-style entries work from any working directory.
pub fn resolve_program(program: &str, root: &Path) -> Result<PathBuf, StepError> {
    let lookup = if program.contains('/') || program.contains('\\') {
        which::which_in(program, None::<&str>, root)
    } else {
        which::which(program)
    };

    match lookup {
        Ok(path) => {
            log::debug!("Resolved '{}' to {}", program, path.display());
            Ok(path)
        }
        Err(source) => Err(StepError::ToolNotFound {
            program: program.to_string(),
            source,
        }),
    }
}

/// Run a tool to completion in `root`.
///
/// The child inherits the terminal so build logs stream through unchanged.
/// Returns an error when the program cannot be found or started, or exits
/// unsuccessfully.
pub async fn run_tool(tool: &ToolCommand, root: &Path) -> Result<(), StepError> {
    let program = resolve_program(&tool.program, root)?;
    let command = tool.to_string();

    log::info!("Running `{}` in {}", command, root.display());

    let status = Command::new(&program)
        .args(&tool.args)
        .current_dir(root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| StepError::Spawn {
            command: command.clone(),
            source,
        })?;

    if status.success() {
        log::debug!("`{}` finished successfully", command);
        Ok(())
    } else {
        Err(StepError::ToolFailed {
            command,
            code: status.code(),
        })
    }
}
