//! # chip8_release
//!
//! Release packaging for the CHIP-8 emulator and assembler.
//!
//! A packaging run is a single linear procedure:
//!
//! 1. run the platform configure script
//! 2. run the Release build (`cmake --build out --config Release`)
//! 3. delete `release/` if it exists
//! 4. create `release/chip8/`
//! 5. copy `c8.exe`, `c8a.exe` and `SDL2.dll` from `out/Release/`
//! 6. copy `fonts/` and `roms/` recursively
//! 7. check the result holds exactly those entries
//!
//! The first failing step stops the run and is named in the error. Paths and
//! commands come from an optional `release.toml` manifest (see [`config`]).
//!
//! ## Usage
//!
//! ```bash
//! chip8_release                      # configure, build, package
//! chip8_release package --skip-build # package an existing build
//! chip8_release plan                 # show the steps without running them
//! chip8_release clean --yes          # remove release/
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod packager;

pub use config::{PackagerConfig, ReleaseLayout, ToolCommand, ToolFailurePolicy};
pub use error::{ConfigError, ReleaseError, Result, StepError};
pub use packager::{Packager, PackagerOptions, PlannedStep, ReleaseReport, Step};
