//! Packaging manifest.
//!
//! The manifest names the tools to run and the files to collect. Every field
//! is optional in `release.toml`; missing fields fall back to the layout the
//! emulator project has always shipped with:
//!
//! ```text
//! release/
//!   chip8/
//!     c8.exe  c8a.exe  SDL2.dll
//!     fonts/  roms/
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Default manifest file name, looked up in the project root
pub const MANIFEST_FILE_NAME: &str = "release.toml";

/// An external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name (looked up on PATH) or path relative to the project root
    pub program: String,
    /// Arguments passed verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a command from a program and its arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Platform setup script invoked before building
    pub fn default_configure() -> Self {
        if cfg!(windows) {
            Self::new("cmd", ["/C", "CALL", "scripts\\configure.bat"])
        } else {
            Self::new("sh", ["scripts/configure.sh"])
        }
    }

    /// Release build through CMake
    pub fn default_build() -> Self {
        Self::new("cmake", ["--build", "out", "--config", "Release"])
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_arg(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote_arg(arg))?;
        }
        Ok(())
    }
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

/// What to do when the configure or build command fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFailurePolicy {
    /// Stop packaging at the failing step
    #[default]
    Abort,
    /// Log a warning and keep going with whatever the build left behind
    Warn,
}

/// Packaging manifest, usually read from `release.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Destination root, relative to the project root
    pub release_dir: PathBuf,
    /// Name of the directory created inside `release_dir`
    pub package_name: String,
    /// Where the build system leaves compiled artifacts
    pub build_output_dir: PathBuf,
    /// File names copied from `build_output_dir`, in order
    pub artifacts: Vec<String>,
    /// Directories copied recursively, in order
    pub assets: Vec<PathBuf>,
    /// Exit status handling for the configure and build commands
    pub tool_failure: ToolFailurePolicy,
    /// Build environment setup command
    pub configure: ToolCommand,
    /// Build command
    pub build: ToolCommand,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            release_dir: PathBuf::from("release"),
            package_name: "chip8".to_string(),
            build_output_dir: PathBuf::from("out").join("Release"),
            artifacts: vec![
                "c8.exe".to_string(),
                "c8a.exe".to_string(),
                "SDL2.dll".to_string(),
            ],
            assets: vec![PathBuf::from("fonts"), PathBuf::from("roms")],
            tool_failure: ToolFailurePolicy::Abort,
            configure: ToolCommand::default_configure(),
            build: ToolCommand::default_build(),
        }
    }
}

impl PackagerConfig {
    /// Parse a manifest from TOML text. `origin` is only used in error messages.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content, path)?;
        log::debug!("Loaded manifest from {}", path.display());
        Ok(config)
    }

    /// Load the manifest for a project.
    ///
    /// An explicit path must exist. Without one, `<root>/release.toml` is used
    /// when present and the built-in defaults otherwise.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    root.join(path)
                };
                Self::load(&path)
            }
            None => {
                let candidate = root.join(MANIFEST_FILE_NAME);
                if candidate.is_file() {
                    Self::load(&candidate)
                } else {
                    log::debug!(
                        "No {} in {}, using built-in layout",
                        MANIFEST_FILE_NAME,
                        root.display()
                    );
                    Ok(Self::default())
                }
            }
        }
    }

    /// Render the manifest as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that the manifest describes a layout the packager can produce
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !is_single_name(&self.package_name) {
            return Err(invalid(
                "package_name",
                format!(
                    "'{}' must be a single directory name",
                    self.package_name
                ),
            ));
        }

        check_relative_path("release_dir", &self.release_dir)?;
        if self.release_dir.components().all(|c| c == Component::CurDir) {
            return Err(invalid(
                "release_dir",
                "must name a directory below the project root",
            ));
        }
        check_relative_path("build_output_dir", &self.build_output_dir)?;
        check_disjoint(&self.release_dir, "build_output_dir", &self.build_output_dir)?;

        for (field, tool) in [("configure", &self.configure), ("build", &self.build)] {
            if tool.program.trim().is_empty() {
                return Err(invalid(&format!("{field}.program"), "must not be empty"));
            }
        }

        let mut destinations = HashSet::new();
        for artifact in &self.artifacts {
            if !is_single_name(artifact) {
                return Err(invalid(
                    "artifacts",
                    format!("'{artifact}' must be a plain file name"),
                ));
            }
            if !destinations.insert(artifact.clone()) {
                return Err(duplicate(artifact));
            }
        }

        for asset in &self.assets {
            check_relative_path("assets", asset)?;
            check_disjoint(&self.release_dir, "assets", asset)?;
            let name = asset_name(asset).ok_or_else(|| {
                invalid(
                    "assets",
                    format!("'{}' does not end in a directory name", asset.display()),
                )
            })?;
            if !destinations.insert(name.clone()) {
                return Err(duplicate(&name));
            }
        }

        Ok(())
    }

    /// Resolve every configured path against the project root
    pub fn resolve(&self, root: &Path) -> std::result::Result<ReleaseLayout, ConfigError> {
        self.validate()?;

        let release_dir = root.join(&self.release_dir);
        let package_dir = release_dir.join(&self.package_name);
        let build_output_dir = root.join(&self.build_output_dir);

        let artifacts = self
            .artifacts
            .iter()
            .map(|name| CopyEntry {
                name: name.clone(),
                source: build_output_dir.join(name),
                destination: package_dir.join(name),
            })
            .collect();

        let assets = self
            .assets
            .iter()
            .filter_map(|asset| {
                asset_name(asset).map(|name| CopyEntry {
                    source: root.join(asset),
                    destination: package_dir.join(&name),
                    name,
                })
            })
            .collect();

        Ok(ReleaseLayout {
            root: root.to_path_buf(),
            build_output_dir,
            release_dir,
            package_dir,
            artifacts,
            assets,
        })
    }
}

/// One item copied into the package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyEntry {
    /// Name inside the package directory
    pub name: String,
    /// Where the item comes from
    pub source: PathBuf,
    /// Where the item ends up
    pub destination: PathBuf,
}

/// A manifest resolved against a project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseLayout {
    /// Project root; tools run here
    pub root: PathBuf,
    /// Build output the artifacts are taken from
    pub build_output_dir: PathBuf,
    /// Directory that is wiped and recreated
    pub release_dir: PathBuf,
    /// Nested directory receiving the artifacts and assets
    pub package_dir: PathBuf,
    /// Files copied from the build output
    pub artifacts: Vec<CopyEntry>,
    /// Directories copied recursively
    pub assets: Vec<CopyEntry>,
}

impl ReleaseLayout {
    /// Names expected directly inside the package directory
    pub fn expected_names(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .chain(&self.assets)
            .map(|entry| entry.name.as_str())
            .collect()
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn duplicate(name: &str) -> ConfigError {
    invalid(
        "artifacts/assets",
        format!("'{name}' would be copied into the package directory twice"),
    )
}

fn is_single_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

fn check_relative_path(field: &str, path: &Path) -> std::result::Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(invalid(
                    field,
                    format!("'{}' must not contain '..'", path.display()),
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(
                    field,
                    format!("'{}' must be relative to the project root", path.display()),
                ));
            }
        }
    }
    Ok(())
}

/// Rejects a release directory that contains, or sits inside, `source`.
fn check_disjoint(
    release_dir: &Path,
    field: &str,
    source: &Path,
) -> std::result::Result<(), ConfigError> {
    let release = normal_components(release_dir);
    let source_parts = normal_components(source);
    if source_parts.starts_with(&release) || release.starts_with(&source_parts) {
        return Err(invalid(
            "release_dir",
            format!(
                "'{}' overlaps {field} '{}'",
                release_dir.display(),
                source.display()
            ),
        ));
    }
    Ok(())
}

fn normal_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| *c != Component::CurDir)
        .collect()
}

fn asset_name(path: &Path) -> Option<String> {
    path.components().rev().find_map(|component| match component {
        Component::Normal(name) => name.to_str().map(str::to_string),
        _ => None,
    })
}
