//! CMake invocation orchestration.
//!
//! Tool discovery and version resolution, generator selection, and the
//! configure/build/install protocol with its directory-layout rules.

pub mod errors;
pub mod generator;
pub mod program;
pub mod session;

pub use errors::CMakeError;
pub use generator::Generator;
pub use program::{CMakeProgram, SearchContext};
pub use session::{CMakeSession, CacheValue};
