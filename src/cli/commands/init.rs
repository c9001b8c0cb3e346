//! Init command implementation.
//!
//! Writes the default manifest so the layout can be customised.

use crate::cli::{Command, RuntimeConfig};
use crate::config::{MANIFEST_FILE_NAME, PackagerConfig};
use crate::error::{CliError, Result};

/// Execute init command
pub(super) fn execute_init(command: &Command, config: &RuntimeConfig) -> Result<()> {
    let Command::Init { force } = command else {
        unreachable!("execute_init called with non-Init command");
    };

    let path = match &config.manifest {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => config.root.join(path),
        None => config.root.join(MANIFEST_FILE_NAME),
    };

    if path.exists() && !force {
        return Err(CliError::AlreadyExists { path }.into());
    }

    let content = PackagerConfig::default().to_toml_string()?;
    std::fs::write(&path, content)?;
    log::debug!("Wrote default manifest to {}", path.display());

    config
        .output()
        .success(&format!("Wrote {}", path.display()));
    Ok(())
}
