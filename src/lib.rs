//! Slipway - CMake build orchestration for packaging pipelines
//!
//! This crate drives an external CMake toolchain on behalf of a
//! higher-level packaging process: executable discovery with a minimum
//! version constraint, generator selection, and the sequential
//! configure → build → install protocol, plus readme metadata
//! composition for the packaging side.

pub mod cmake;
pub mod metadata;
pub mod settings;
pub mod util;

pub use cmake::errors::CMakeError;
pub use cmake::generator::Generator;
pub use cmake::program::{CMakeProgram, SearchContext};
pub use cmake::session::{CMakeSession, CacheValue};
pub use metadata::readme::{Readme, ReadmeConfig};
pub use settings::BuildSettings;
pub use util::process::{CommandOutput, LaunchError};
