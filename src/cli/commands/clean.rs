//! Clean command implementation.
//!
//! Removes the release directory.

use super::helpers::prompt_confirmation;
use crate::cli::{Command, RuntimeConfig};
use crate::error::Result;
use crate::packager::{Packager, PackagerOptions};

/// Execute clean command
pub(super) async fn execute_clean(command: &Command, config: &RuntimeConfig) -> Result<()> {
    let Command::Clean { yes } = command else {
        unreachable!("execute_clean called with non-Clean command");
    };

    let manifest = config.load_manifest()?;
    let packager = Packager::new(manifest, &config.root, PackagerOptions::default())?;
    let release_dir = &packager.layout().release_dir;
    let output = config.output();

    if !release_dir.exists() {
        output.println(&format!("Nothing to clean: {} does not exist", release_dir.display()));
        return Ok(());
    }

    if !yes && !prompt_confirmation(&format!("Remove {}?", release_dir.display()))? {
        output.println("Clean cancelled");
        return Ok(());
    }

    if packager.clean().await? {
        output.success(&format!("Removed {}", release_dir.display()));
    }

    Ok(())
}
