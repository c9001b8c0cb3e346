//! Error types for chip8_release operations.
//!
//! Every failure that happens while packaging carries the [`Step`] that was
//! running, so the user sees "build step failed" instead of a bare I/O error.

use crate::packager::Step;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chip8_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all chip8_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Manifest loading or validation errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A packaging step failed
    #[error("{step} step failed: {source}")]
    Step {
        /// Step that was running
        step: Step,
        /// What went wrong
        #[source]
        source: StepError,
    },

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors outside of a packaging step
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Manifest errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Manifest file could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Manifest is not valid TOML for the packager schema
    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A field has a value the packager cannot work with
    #[error("Invalid value for '{field}': {reason}")]
    Invalid {
        /// Field name
        field: String,
        /// Reason for the error
        reason: String,
    },
}

/// Errors raised inside a single packaging step
#[derive(Error, Debug)]
pub enum StepError {
    /// The tool program could not be located
    #[error("'{program}' not found: {source}")]
    ToolNotFound {
        /// Program as configured
        program: String,
        /// Lookup error
        #[source]
        source: which::Error,
    },

    /// The tool was found but could not be started
    #[error("failed to run command {command}: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The tool exited unsuccessfully
    #[error("command {command} exited with {}", exit_description(.code))]
    ToolFailed {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },

    /// Filesystem error with path context
    #[error("{context} {path}: {source}")]
    Fs {
        /// Operation being performed (e.g. "copying file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// A source file or directory does not exist
    #[error("{path} does not exist")]
    MissingSource {
        /// Missing path
        path: PathBuf,
    },

    /// Expected a regular file
    #[error("{path} is not a file")]
    NotAFile {
        /// Offending path
        path: PathBuf,
    },

    /// Expected a directory
    #[error("{path} is not a directory")]
    NotADirectory {
        /// Offending path
        path: PathBuf,
    },

    /// Error walking a directory tree
    #[error("{0}")]
    Walk(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// The package directory does not match the configured layout
    #[error("release layout mismatch (unexpected: {unexpected:?}, missing: {missing:?})")]
    LayoutMismatch {
        /// Entries present but not configured
        unexpected: Vec<String>,
        /// Entries configured but absent
        missing: Vec<String>,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Refused to overwrite an existing file
    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists {
        /// Existing file
        path: PathBuf,
    },
}

/// Extension trait for attaching the operation and path to an I/O error.
pub trait ErrorExt<T> {
    /// Wrap an I/O error as [`StepError::Fs`].
    ///
    /// The `context` should be a present-tense verb phrase, e.g. "copying file".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>)
    -> std::result::Result<T, StepError>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(
        self,
        context: &'static str,
        path: impl Into<PathBuf>,
    ) -> std::result::Result<T, StepError> {
        self.map_err(|source| StepError::Fs {
            context,
            path: path.into(),
            source,
        })
    }
}

/// Attach the running [`Step`] to a step-level result.
pub trait StepContext<T> {
    /// Convert a [`StepError`] into [`ReleaseError::Step`].
    fn during(self, step: Step) -> Result<T>;
}

impl<T> StepContext<T> for std::result::Result<T, StepError> {
    fn during(self, step: Step) -> Result<T> {
        self.map_err(|source| ReleaseError::Step { step, source })
    }
}

impl ReleaseError {
    /// The packaging step that failed, if any
    pub fn step(&self) -> Option<Step> {
        match self {
            ReleaseError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::Parse { path, .. }) => vec![
                format!("Check the TOML syntax of {}", path.display()),
                "Run `chip8_release init --force` to regenerate a default manifest".to_string(),
            ],
            ReleaseError::Step {
                source: StepError::ToolNotFound { program, .. },
                ..
            } => vec![
                format!("Install '{program}' or add it to PATH"),
                "Use --skip-configure / --skip-build to package an existing build".to_string(),
            ],
            ReleaseError::Step {
                step,
                source: StepError::ToolFailed { .. },
            } => vec![
                format!("Inspect the {step} output above for the underlying failure"),
                "Use --ignore-tool-failures to package whatever the build left behind"
                    .to_string(),
            ],
            ReleaseError::Step {
                step: Step::CopyArtifacts,
                source: StepError::MissingSource { .. },
            } => vec![
                "Make sure the build produced all artifacts in the build output directory"
                    .to_string(),
                "Adjust `build_output_dir` or `artifacts` in release.toml".to_string(),
            ],
            ReleaseError::Step {
                step: Step::CopyAssets,
                source: StepError::MissingSource { .. },
            } => vec!["Adjust `assets` in release.toml to existing directories".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_names_the_step() {
        let err: Result<()> = Err(StepError::MissingSource {
            path: PathBuf::from("out/Release/c8.exe"),
        })
        .during(Step::CopyArtifacts);
        let err = err.unwrap_err();

        assert_eq!(err.step(), Some(Step::CopyArtifacts));
        assert_eq!(
            err.to_string(),
            "copy-artifacts step failed: out/Release/c8.exe does not exist"
        );
    }

    #[test]
    fn tool_failure_describes_signal_termination() {
        let err = StepError::ToolFailed {
            command: "cmake --build out".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));

        let err = StepError::ToolFailed {
            command: "cmake --build out".to_string(),
            code: Some(2),
        };
        assert!(err.to_string().ends_with("exit code 2"));
    }

    #[test]
    fn fs_context_keeps_path() {
        let io: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = io.fs_context("removing directory", "release").unwrap_err();
        assert_eq!(err.to_string(), "removing directory release: denied");
    }

    #[test]
    fn suggestions_for_missing_artifact() {
        let err = ReleaseError::Step {
            step: Step::CopyArtifacts,
            source: StepError::MissingSource {
                path: PathBuf::from("x"),
            },
        };
        assert!(
            err.recovery_suggestions()
                .iter()
                .any(|s| s.contains("build_output_dir"))
        );
    }
}
