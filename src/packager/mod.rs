//! The release packaging procedure.
//!
//! Packaging is one linear sequence: configure, build, wipe the release
//! directory, recreate it, copy the artifacts, copy the assets, verify. The
//! first failing step stops the run and is reported as
//! [`ReleaseError::Step`](crate::error::ReleaseError::Step). Nothing is
//! rolled back, so a failed run can leave a partially populated release tree.
//!
//! # Example
//!
//! ```no_run
//! use chip8_release::{Packager, PackagerConfig, PackagerOptions};
//!
//! # async fn example() -> chip8_release::Result<()> {
//! let packager = Packager::new(PackagerConfig::default(), ".", PackagerOptions::default())?;
//! let report = packager.run().await?;
//! println!("{} files in {}", report.total_files(), report.package_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod report;
pub mod tools;

pub use report::{EntryKind, ReleaseReport, ReportEntry};

use crate::config::{PackagerConfig, ReleaseLayout, ToolCommand, ToolFailurePolicy};
use crate::error::{ErrorExt, Result, StepContext, StepError};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One stage of the packaging procedure, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Platform setup command
    Configure,
    /// Build command
    Build,
    /// Delete the previous release directory
    Clean,
    /// Create the release and package directories
    CreateLayout,
    /// Copy artifacts from the build output
    CopyArtifacts,
    /// Copy asset directories
    CopyAssets,
    /// Check the package directory against the layout
    Verify,
}

impl Step {
    /// All steps in execution order
    pub const ALL: [Step; 7] = [
        Step::Configure,
        Step::Build,
        Step::Clean,
        Step::CreateLayout,
        Step::CopyArtifacts,
        Step::CopyAssets,
        Step::Verify,
    ];

    /// Short kebab-case name
    pub fn name(self) -> &'static str {
        match self {
            Step::Configure => "configure",
            Step::Build => "build",
            Step::Clean => "clean",
            Step::CreateLayout => "create-layout",
            Step::CopyArtifacts => "copy-artifacts",
            Step::CopyAssets => "copy-assets",
            Step::Verify => "verify",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-run switches layered over the manifest.
#[derive(Debug, Clone, Default)]
pub struct PackagerOptions {
    /// Do not run the configure command
    pub skip_configure: bool,
    /// Do not run the build command; package the existing build output
    pub skip_build: bool,
    /// Overrides the manifest's `tool_failure`
    pub tool_failure: Option<ToolFailurePolicy>,
    /// Compute SHA-256 digests for the report
    pub checksums: bool,
}

/// A step as it would run, for previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// The step
    pub step: Step,
    /// What the step does, with resolved paths
    pub description: String,
    /// Whether the step is switched off for this run
    pub skipped: bool,
}

/// Runs the packaging procedure for one project.
#[derive(Debug, Clone)]
pub struct Packager {
    config: PackagerConfig,
    layout: ReleaseLayout,
    options: PackagerOptions,
}

impl Packager {
    /// Validate the manifest and resolve it against `root`
    pub fn new(
        config: PackagerConfig,
        root: impl Into<PathBuf>,
        options: PackagerOptions,
    ) -> Result<Self> {
        let root = root.into();
        let layout = config.resolve(&root)?;
        Ok(Self {
            config,
            layout,
            options,
        })
    }

    /// The manifest in use
    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// The resolved layout
    pub fn layout(&self) -> &ReleaseLayout {
        &self.layout
    }

    /// Effective tool failure policy
    pub fn tool_failure(&self) -> ToolFailurePolicy {
        self.options.tool_failure.unwrap_or(self.config.tool_failure)
    }

    /// Describe every step without touching anything
    pub fn plan(&self) -> Vec<PlannedStep> {
        let layout = &self.layout;
        Step::ALL
            .iter()
            .map(|&step| {
                let (description, skipped) = match step {
                    Step::Configure => (
                        format!("run `{}`", self.config.configure),
                        self.options.skip_configure,
                    ),
                    Step::Build => (
                        format!("run `{}`", self.config.build),
                        self.options.skip_build,
                    ),
                    Step::Clean => (
                        format!("remove {} if it exists", layout.release_dir.display()),
                        false,
                    ),
                    Step::CreateLayout => (
                        format!("create {}", layout.package_dir.display()),
                        false,
                    ),
                    Step::CopyArtifacts => (
                        format!(
                            "copy {} from {}",
                            join_names(&layout.artifacts),
                            layout.build_output_dir.display()
                        ),
                        layout.artifacts.is_empty(),
                    ),
                    Step::CopyAssets => (
                        format!("copy directories {}", join_names(&layout.assets)),
                        layout.assets.is_empty(),
                    ),
                    Step::Verify => (
                        format!(
                            "check {} holds exactly the entries above",
                            layout.package_dir.display()
                        ),
                        false,
                    ),
                };
                PlannedStep {
                    step,
                    description,
                    skipped,
                }
            })
            .collect()
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self) -> Result<ReleaseReport> {
        self.run_with(|_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_step` before each step starts
    pub async fn run_with<F>(&self, mut on_step: F) -> Result<ReleaseReport>
    where
        F: FnMut(&PlannedStep),
    {
        let mut warnings = Vec::new();
        for planned in self.plan() {
            on_step(&planned);
            if planned.skipped {
                log::info!("Skipping {} step", planned.step);
                continue;
            }

            match planned.step {
                Step::Configure => {
                    warnings.extend(self.run_tool(Step::Configure, &self.config.configure).await?)
                }
                Step::Build => warnings.extend(self.run_tool(Step::Build, &self.config.build).await?),
                Step::Clean => {
                    self.clean_release_dir().await.during(Step::Clean)?;
                }
                Step::CreateLayout => self.create_layout().await.during(Step::CreateLayout)?,
                Step::CopyArtifacts => self.copy_artifacts().await.during(Step::CopyArtifacts)?,
                Step::CopyAssets => self.copy_assets().await.during(Step::CopyAssets)?,
                // always last, handled below
                Step::Verify => {}
            }
        }

        let layout = self.layout.clone();
        let checksums = self.options.checksums;
        let mut report = tokio::task::spawn_blocking(move || {
            ReleaseReport::inspect(&layout, checksums)
        })
        .await
        .map_err(std::io::Error::other)
        .fs_context("inspecting", &self.layout.package_dir)
        .and_then(|inspected| inspected)
        .during(Step::Verify)?;
        report.ensure_exact().during(Step::Verify)?;
        report.warnings = warnings;

        log::info!(
            "Packaged {} files ({} bytes) into {}",
            report.total_files(),
            report.total_size(),
            self.layout.package_dir.display()
        );
        Ok(report)
    }

    /// Remove the release directory. Returns whether it existed.
    pub async fn clean(&self) -> Result<bool> {
        self.clean_release_dir().await.during(Step::Clean)
    }

    /// Runs a tool step. Under the warn policy a failure becomes the returned
    /// warning instead of an error.
    async fn run_tool(&self, step: Step, tool: &ToolCommand) -> Result<Option<String>> {
        match tools::run_tool(tool, &self.layout.root).await {
            Ok(()) => Ok(None),
            Err(err @ (StepError::ToolFailed { .. } | StepError::ToolNotFound { .. }))
                if self.tool_failure() == ToolFailurePolicy::Warn =>
            {
                let warning = format!("{step} step failed, continuing: {err}");
                log::warn!("{warning}");
                Ok(Some(warning))
            }
            Err(err) => Err(err).during(step),
        }
    }

    async fn clean_release_dir(&self) -> std::result::Result<bool, StepError> {
        let removed = fs::remove_dir_all(&self.layout.release_dir).await?;
        if removed {
            log::debug!("Removed {}", self.layout.release_dir.display());
        }
        Ok(removed)
    }

    async fn create_layout(&self) -> std::result::Result<(), StepError> {
        let release_dir = &self.layout.release_dir;
        if let Some(parent) = release_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating directory", parent)?;
        }
        fs::create_dir(release_dir).await?;
        fs::create_dir(&self.layout.package_dir).await
    }

    async fn copy_artifacts(&self) -> std::result::Result<(), StepError> {
        for artifact in &self.layout.artifacts {
            let bytes = fs::copy_file(&artifact.source, &artifact.destination).await?;
            log::debug!("Copied {} ({} bytes)", artifact.name, bytes);
        }
        Ok(())
    }

    async fn copy_assets(&self) -> std::result::Result<(), StepError> {
        for asset in &self.layout.assets {
            let files = fs::copy_dir(&asset.source, &asset.destination).await?;
            log::debug!("Copied {}/ ({} files)", asset.name, files);
        }
        Ok(())
    }
}

fn join_names(entries: &[crate::config::CopyEntry]) -> String {
    if entries.is_empty() {
        return "nothing".to_string();
    }
    entries
        .iter()
        .map(|entry| entry.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Project root for a command line `--root` value, defaulting to the
/// current directory
pub fn project_root(explicit: Option<&Path>) -> std::io::Result<PathBuf> {
    match explicit {
        Some(path) if path.is_absolute() => Ok(path.to_path_buf()),
        Some(path) => Ok(std::env::current_dir()?.join(path)),
        None => std::env::current_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packager(options: PackagerOptions) -> Packager {
        Packager::new(PackagerConfig::default(), "/proj", options).unwrap()
    }

    #[test]
    fn plan_lists_every_step_in_order() {
        let plan = packager(PackagerOptions::default()).plan();
        let steps: Vec<Step> = plan.iter().map(|p| p.step).collect();

        assert_eq!(steps, Step::ALL.to_vec());
        assert!(plan.iter().all(|p| !p.skipped));
        assert!(plan[1].description.contains("cmake --build out --config Release"));
        assert!(plan[4].description.contains("c8.exe, c8a.exe, SDL2.dll"));
    }

    #[test]
    fn plan_marks_skipped_tool_steps() {
        let plan = packager(PackagerOptions {
            skip_configure: true,
            skip_build: true,
            ..Default::default()
        })
        .plan();

        assert!(plan[0].skipped);
        assert!(plan[1].skipped);
        assert!(!plan[2].skipped);
    }

    #[test]
    fn option_overrides_manifest_policy() {
        let p = packager(PackagerOptions {
            tool_failure: Some(ToolFailurePolicy::Warn),
            ..Default::default()
        });
        assert_eq!(p.tool_failure(), ToolFailurePolicy::Warn);
        assert_eq!(
            packager(PackagerOptions::default()).tool_failure(),
            ToolFailurePolicy::Abort
        );
    }

    #[test]
    fn step_names_are_kebab_case() {
        assert_eq!(Step::CopyArtifacts.to_string(), "copy-artifacts");
        assert_eq!(
            serde_json::to_string(&Step::CreateLayout).unwrap(),
            "\"create-layout\""
        );
    }

    #[test]
    fn invalid_manifest_is_rejected_up_front() {
        let config = PackagerConfig {
            package_name: "a/b".to_string(),
            ..Default::default()
        };
        let err = Packager::new(config, "/proj", PackagerOptions::default()).unwrap_err();
        assert!(matches!(err, crate::error::ReleaseError::Config(_)));
    }
}
