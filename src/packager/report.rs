//! Inspection of a produced release tree.

use crate::config::ReleaseLayout;
use crate::error::{ErrorExt, StepError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Kind of a top-level package entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Dir,
    /// Symbolic link
    Symlink,
}

/// One item directly inside the package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Name inside the package directory
    pub name: String,
    /// Entry kind
    pub kind: EntryKind,
    /// Total size in bytes (sum over files for directories)
    pub size: u64,
    /// Number of regular files (1 for a file)
    pub files: usize,
    /// Hex SHA-256 of the file contents, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// What ended up in the package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Inspected package directory
    pub package_dir: PathBuf,
    /// Entries sorted by name
    pub entries: Vec<ReportEntry>,
    /// Entries present but not part of the layout
    pub unexpected: Vec<String>,
    /// Layout names absent from the package directory
    pub missing: Vec<String>,
    /// Tool failures tolerated under the warn policy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ReleaseReport {
    /// Walk the package directory of `layout`.
    ///
    /// With `checksums`, every top-level file gets a SHA-256 digest.
    pub fn inspect(layout: &ReleaseLayout, checksums: bool) -> Result<Self, StepError> {
        let package_dir = &layout.package_dir;
        let mut entries = Vec::new();

        let read_dir = std::fs::read_dir(package_dir).fs_context("reading directory", package_dir)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.fs_context("reading directory", package_dir)?;
            let path = dir_entry.path();
            let file_type = dir_entry
                .file_type()
                .fs_context("inspecting", &path)?;
            let name = dir_entry.file_name().to_string_lossy().into_owned();

            let entry = if file_type.is_symlink() {
                ReportEntry {
                    name,
                    kind: EntryKind::Symlink,
                    size: 0,
                    files: 0,
                    sha256: None,
                }
            } else if file_type.is_dir() {
                let (size, files) = tree_size(&path)?;
                ReportEntry {
                    name,
                    kind: EntryKind::Dir,
                    size,
                    files,
                    sha256: None,
                }
            } else {
                let size = dir_entry
                    .metadata()
                    .fs_context("inspecting", &path)?
                    .len();
                let sha256 = if checksums {
                    Some(sha256_file(&path)?)
                } else {
                    None
                };
                ReportEntry {
                    name,
                    kind: EntryKind::File,
                    size,
                    files: 1,
                    sha256,
                }
            };
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let expected: BTreeSet<&str> = layout.expected_names().into_iter().collect();
        let present: BTreeSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let unexpected = present
            .difference(&expected)
            .map(|name| name.to_string())
            .collect();
        let missing = expected
            .difference(&present)
            .map(|name| name.to_string())
            .collect();

        Ok(Self {
            package_dir: package_dir.clone(),
            entries,
            unexpected,
            missing,
            warnings: Vec::new(),
        })
    }

    /// Whether the package directory holds exactly the configured entries
    pub fn is_exact(&self) -> bool {
        self.unexpected.is_empty() && self.missing.is_empty()
    }

    /// Error out unless the package directory matches the layout
    pub fn ensure_exact(&self) -> Result<(), StepError> {
        if self.is_exact() {
            Ok(())
        } else {
            Err(StepError::LayoutMismatch {
                unexpected: self.unexpected.clone(),
                missing: self.missing.clone(),
            })
        }
    }

    /// Total bytes across all entries
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Total regular files across all entries
    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|e| e.files).sum()
    }
}

fn tree_size(dir: &Path) -> Result<(u64, usize), StepError> {
    let mut size = 0;
    let mut files = 0;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            size += entry
                .metadata()
                .map_err(StepError::Walk)?
                .len();
            files += 1;
        }
    }
    Ok((size, files))
}

/// Calculate the SHA-256 checksum of a file
pub fn sha256_file(path: &Path) -> Result<String, StepError> {
    use sha2::{Digest, Sha256};
    use std::io::Read;

    let mut file = std::fs::File::open(path).fs_context("opening file", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let n = file.read(&mut buffer).fs_context("reading file", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagerConfig;

    #[test]
    fn sha256_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("abc");
        std::fs::write(&path, "abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn inspect_flags_strays_and_gaps() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = PackagerConfig::default().resolve(tmp.path()).unwrap();
        std::fs::create_dir_all(layout.package_dir.join("fonts")).unwrap();
        std::fs::write(layout.package_dir.join("fonts/default.chip8"), [0u8; 80]).unwrap();
        std::fs::write(layout.package_dir.join("c8.exe"), [1u8; 1024]).unwrap();
        std::fs::write(layout.package_dir.join("old.txt"), "stale").unwrap();

        let report = ReleaseReport::inspect(&layout, true).unwrap();

        assert_eq!(report.unexpected, vec!["old.txt"]);
        assert_eq!(report.missing, vec!["SDL2.dll", "c8a.exe", "roms"]);
        assert!(!report.is_exact());
        assert!(matches!(
            report.ensure_exact(),
            Err(StepError::LayoutMismatch { .. })
        ));

        let fonts = report.entries.iter().find(|e| e.name == "fonts").unwrap();
        assert_eq!((fonts.kind, fonts.size, fonts.files), (EntryKind::Dir, 80, 1));
        let exe = report.entries.iter().find(|e| e.name == "c8.exe").unwrap();
        assert_eq!(exe.size, 1024);
        assert!(exe.sha256.is_some());
    }
}
