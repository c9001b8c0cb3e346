//! Command execution functions.
//!
//! Each command returns `Result<()>`; failures are reported here with the
//! failing step and recovery suggestions, and turned into exit code 1.

mod clean;
mod helpers;
mod init;
mod package;
mod plan;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use clean::execute_clean;
use init::execute_init;
use package::execute_package;
use plan::execute_plan;

/// Execute the selected command and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {validation_error}"));
        return Ok(1);
    }

    let config = RuntimeConfig::from_args(&args)?;
    let command = args.command();

    let result = match &command {
        Command::Package { .. } => execute_package(&command, &config).await,
        Command::Plan { .. } => execute_plan(&command, &config),
        Command::Clean { .. } => execute_clean(&command, &config).await,
        Command::Init { .. } => execute_init(&command, &config),
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            let output = config.output();
            output.error(&format!("Command '{}' failed: {}", command.name(), e));

            if !output.is_quiet() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    output.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        output.indent(&format!("• {suggestion}"));
                    }
                }
            }

            Ok(1)
        }
    }
}
