//! File system utilities for packaging.
//!
//! Provides the copy and reset operations the packager is built from, with
//! symlink preservation and path context on every error.

use crate::error::{ErrorExt, StepError};
use std::{io, path::Path};
use tokio::fs;

type Result<T> = std::result::Result<T, StepError>;

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Removes the directory and its contents if it exists.
///
/// Returns whether anything was removed.
pub async fn remove_dir_all(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path)
                .await
                .fs_context("removing directory", path)?;
            Ok(true)
        }
        Ok(_) => {
            // A stray file or symlink where the directory should be
            fs::remove_file(path)
                .await
                .fs_context("removing file", path)?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).fs_context("inspecting", path),
    }
}

/// Creates a single directory. The parent must already exist.
pub async fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)
        .await
        .fs_context("creating directory", path)
}

/// Copies a regular file to `to`, keeping the file name given by `to`.
///
/// Fails if the source path is a directory or doesn't exist. The destination's
/// parent directory must already exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    let meta = match fs::metadata(from).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StepError::MissingSource {
                path: from.to_path_buf(),
            });
        }
        Err(e) => return Err(e).fs_context("inspecting", from),
    };
    if !meta.is_file() {
        return Err(StepError::NotAFile {
            path: from.to_path_buf(),
        });
    }
    fs::copy(from, to).await.fs_context("copying file", from)
}

/// Recursively copies a directory to `to`, which must not exist yet.
///
/// Preserves symlinks on platforms that support them. Fails if the source path
/// is not a directory or doesn't exist. Returns the number of regular files
/// copied.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    let meta = match fs::metadata(from).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StepError::MissingSource {
                path: from.to_path_buf(),
            });
        }
        Err(e) => return Err(e).fs_context("inspecting", from),
    };
    if !meta.is_dir() {
        return Err(StepError::NotADirectory {
            path: from.to_path_buf(),
        });
    }
    if fs::symlink_metadata(to).await.is_ok() {
        return Err(StepError::Fs {
            context: "copying directory into",
            path: to.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
        });
    }

    let mut files = 0;
    let walker = walkdir::WalkDir::new(from)
        .follow_root_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry?;
        debug_assert!(entry.path().starts_with(from));
        if entry.depth() == 0 {
            // The root is copied as a directory even when `from` is a link
            fs::create_dir_all(to)
                .await
                .fs_context("creating directory", to)?;
            continue;
        }
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .fs_context("reading link", entry.path())?;
            if entry.path().is_dir() {
                symlink_dir(&target, &dest_path).fs_context("creating link", &dest_path)?;
            } else {
                symlink_file(&target, &dest_path).fs_context("creating link", &dest_path)?;
            }
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .await
                .fs_context("creating directory", &dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file", entry.path())?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_dir_preserves_structure() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("roms");
        std::fs::create_dir_all(src.join("games")).unwrap();
        std::fs::write(src.join("pong.ch8"), b"\x00\xe0").unwrap();
        std::fs::write(src.join("games/tetris.ch8"), b"\x12\x00").unwrap();

        let dst = tmp.path().join("out/roms");
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();
        let copied = copy_dir(&src, &dst).await.unwrap();

        assert_eq!(copied, 2);
        assert_eq!(std::fs::read(dst.join("pong.ch8")).unwrap(), b"\x00\xe0");
        assert_eq!(
            std::fs::read(dst.join("games/tetris.ch8")).unwrap(),
            b"\x12\x00"
        );
    }

    #[tokio::test]
    async fn copy_dir_refuses_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("fonts");
        let dst = tmp.path().join("copy");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dst).unwrap();

        let err = copy_dir(&src, &dst).await.unwrap_err();
        assert!(matches!(err, StepError::Fs { .. }));
    }

    #[tokio::test]
    async fn copy_file_reports_missing_and_non_file_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("c8.exe");
        let err = copy_file(&missing, &tmp.path().join("x")).await.unwrap_err();
        assert!(matches!(err, StepError::MissingSource { path } if path == missing));

        let err = copy_file(tmp.path(), &tmp.path().join("x")).await.unwrap_err();
        assert!(matches!(err, StepError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn remove_dir_all_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("release/chip8");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old.txt"), "stale").unwrap();

        let release = tmp.path().join("release");
        assert!(remove_dir_all(&release).await.unwrap());
        assert!(!release.exists());
        assert!(!remove_dir_all(&release).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copy_dir_keeps_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("fonts");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("default.chip8"), b"font").unwrap();
        std::os::unix::fs::symlink("default.chip8", src.join("current.chip8")).unwrap();

        let dst = tmp.path().join("fonts-copy");
        copy_dir(&src, &dst).await.unwrap();

        let link = std::fs::read_link(dst.join("current.chip8")).unwrap();
        assert_eq!(link, Path::new("default.chip8"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copy_dir_follows_linked_root() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data/roms");
        std::fs::create_dir_all(data.join("games")).unwrap();
        std::fs::write(data.join("pong.ch8"), b"\x00\xe0").unwrap();
        std::fs::write(data.join("games/tetris.ch8"), b"\x12\x00").unwrap();

        let relative = tmp.path().join("roms");
        std::os::unix::fs::symlink("data/roms", &relative).unwrap();
        let absolute = tmp.path().join("roms-abs");
        std::os::unix::fs::symlink(&data, &absolute).unwrap();

        for src in [&relative, &absolute] {
            let dst = tmp.path().join("out").join(src.file_name().unwrap());
            std::fs::create_dir_all(tmp.path().join("out")).unwrap();
            let copied = copy_dir(src, &dst).await.unwrap();

            assert_eq!(copied, 2);
            assert!(!std::fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
            assert_eq!(std::fs::read(dst.join("pong.ch8")).unwrap(), b"\x00\xe0");
            assert_eq!(
                std::fs::read(dst.join("games/tetris.ch8")).unwrap(),
                b"\x12\x00"
            );
        }
    }
}
