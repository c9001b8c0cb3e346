//! Shared fixtures for packaging tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A throwaway emulator checkout with build output and assets in place.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Project with `out/Release/{c8.exe,c8a.exe,SDL2.dll}`, `fonts/` and `roms/`.
    pub fn new() -> Self {
        let project = Self::empty();
        project.write("out/Release/c8.exe", &[0xC8; 1024]);
        project.write("out/Release/c8a.exe", &[0xCA; 1024]);
        project.write("out/Release/SDL2.dll", &[0x5D; 2048]);
        project.write("fonts/default.chip8", &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        project.write("roms/pong.ch8", &[0x6A, 0x02, 0x6B, 0x0C]);
        project
    }

    /// Project without any files
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).unwrap();
    }

    /// Names directly inside `rel`, sorted
    pub fn list(&self, rel: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path(rel))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every file under `rel`, keyed by relative path
    pub fn snapshot(&self, rel: &str) -> BTreeMap<String, Vec<u8>> {
        tree(&self.path(rel))
    }
}

/// Every file under `dir`, keyed by path relative to `dir`
pub fn tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}
