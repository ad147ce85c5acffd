//! Orchestration error types.

use thiserror::Error;

use crate::util::process::{CommandOutput, LaunchError};

/// Error from the CMake orchestration layer.
///
/// The configure/build/install variants carry the full captured output so
/// callers can diagnose the tool's complaint without re-running it.
#[derive(Debug, Error)]
pub enum CMakeError {
    #[error("no cmake executable satisfying >= {minimum} found ({})", fmt_searched(.searched))]
    ToolNotFound {
        minimum: String,
        /// Candidate executables probed, in search order.
        searched: Vec<String>,
    },

    #[error("cmake configure failed with exit code {:?}\n{}", .output.exit_code, .output.stderr)]
    Configure { output: CommandOutput },

    #[error("cmake build failed with exit code {:?}\n{}", .output.exit_code, .output.stderr)]
    Build { output: CommandOutput },

    #[error("cmake install failed with exit code {:?}\n{}", .output.exit_code, .output.stderr)]
    Install { output: CommandOutput },

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn fmt_searched(searched: &[String]) -> String {
    if searched.is_empty() {
        "no candidates on PATH or in well-known locations".to_string()
    } else {
        format!("tried: {}", searched.join(", "))
    }
}
