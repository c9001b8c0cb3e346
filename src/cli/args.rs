//! Command line argument parsing and validation.
//!
//! Running with no arguments packages the project in the current directory
//! using `release.toml` (or the built-in layout when there is none).

use crate::config::ToolFailurePolicy;
use crate::packager::PackagerOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Release packager for the CHIP-8 emulator
#[derive(Parser, Debug)]
#[command(
    name = "chip8_release",
    version,
    about = "Build the CHIP-8 emulator and assemble the release directory",
    long_about = "Build the CHIP-8 emulator and assemble the release directory.

Runs the configure script and the Release build, wipes release/, then copies
the executables, the SDL2 library, fonts/ and roms/ into release/chip8/.

Usage:
  chip8_release
  chip8_release package --skip-build
  chip8_release plan --json
  chip8_release -C ../chip8 clean --yes"
)]
pub struct Args {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Manifest file (defaults to <root>/release.toml when present)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "CHIP8_RELEASE_MANIFEST"
    )]
    pub manifest: Option<PathBuf>,

    /// Show every step as it runs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run (defaults to `package`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build and assemble the release directory
    Package {
        /// Do not run the configure script
        #[arg(long)]
        skip_configure: bool,

        /// Do not run the build; package the existing build output
        #[arg(long)]
        skip_build: bool,

        /// Keep going when the configure or build command fails
        #[arg(long)]
        ignore_tool_failures: bool,

        /// Compute SHA-256 checksums of the packaged files
        #[arg(long)]
        checksums: bool,

        /// Print the release report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the steps that would run, without running them
    Plan {
        /// Do not run the configure script
        #[arg(long)]
        skip_configure: bool,

        /// Do not run the build
        #[arg(long)]
        skip_build: bool,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove the release directory
    Clean {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a release.toml describing the default layout
    Init {
        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Package {
            skip_configure: false,
            skip_build: false,
            ignore_tool_failures: false,
            checksums: false,
            json: false,
        }
    }
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Package { .. } => "package",
            Command::Plan { .. } => "plan",
            Command::Clean { .. } => "clean",
            Command::Init { .. } => "init",
        }
    }

    /// Packager switches selected by this command
    pub fn packager_options(&self) -> PackagerOptions {
        match self {
            Command::Package {
                skip_configure,
                skip_build,
                ignore_tool_failures,
                checksums,
                ..
            } => PackagerOptions {
                skip_configure: *skip_configure,
                skip_build: *skip_build,
                tool_failure: ignore_tool_failures.then_some(ToolFailurePolicy::Warn),
                checksums: *checksums,
            },
            Command::Plan {
                skip_configure,
                skip_build,
                ..
            } => PackagerOptions {
                skip_configure: *skip_configure,
                skip_build: *skip_build,
                ..Default::default()
            },
            Command::Clean { .. } | Command::Init { .. } => PackagerOptions::default(),
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The selected command, `package` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be used together".to_string());
        }
        if let Some(root) = &self.root
            && root.as_os_str().is_empty()
        {
            return Err("--root must not be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Absolute project root
    pub root: PathBuf,
    /// Explicit manifest path, if any
    pub manifest: Option<PathBuf>,
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Resolve the project root and set up output for `args`
    pub fn from_args(args: &Args) -> std::io::Result<Self> {
        Ok(Self {
            root: crate::packager::project_root(args.root.as_deref())?,
            manifest: args.manifest.clone(),
            output: super::OutputManager::new(args.verbose, args.quiet),
        })
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Load the manifest for the project root
    pub fn load_manifest(&self) -> crate::error::Result<crate::config::PackagerConfig> {
        crate::config::PackagerConfig::discover(&self.root, self.manifest.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_package() {
        let args = Args::try_parse_from(["chip8_release"]).unwrap();
        assert_eq!(args.command(), Command::default());
        assert_eq!(args.command().name(), "package");
    }

    #[test]
    fn package_flags_become_options() {
        let args = Args::try_parse_from([
            "chip8_release",
            "package",
            "--skip-build",
            "--ignore-tool-failures",
        ])
        .unwrap();
        let options = args.command().packager_options();

        assert!(options.skip_build);
        assert!(!options.skip_configure);
        assert_eq!(options.tool_failure, Some(ToolFailurePolicy::Warn));
    }

    #[test]
    fn global_options_after_subcommand() {
        let args =
            Args::try_parse_from(["chip8_release", "plan", "-C", "/tmp/chip8", "--json"]).unwrap();
        assert_eq!(args.root, Some(PathBuf::from("/tmp/chip8")));
        assert!(matches!(args.command(), Command::Plan { json: true, .. }));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let args = Args::try_parse_from(["chip8_release", "-v", "-q"]).unwrap();
        assert!(args.validate().is_err());
    }
}
