//! CMake executable discovery and version resolution.
//!
//! Discovery is a pure function over a [`SearchContext`]: everything it is
//! allowed to look at (override, PATH entries, platform) is captured up
//! front, normally once per session via [`SearchContext::from_env`]. There
//! is no process-wide cache of "the" cmake; each session resolves its own
//! handle, which keeps tests isolated from the host environment.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::cmake::errors::CMakeError;
use crate::util::process::{find_executable_in, ProcessBuilder};

/// Binary names probed on PATH, in order.
const CANDIDATE_NAMES: &[&str] = &["cmake", "cmake3"];

/// Inputs to executable discovery and generator selection.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    /// Explicit executable override (`CMAKE_EXECUTABLE`), tried first and
    /// verbatim.
    pub executable_override: Option<PathBuf>,
    /// Generator override (`CMAKE_GENERATOR`).
    pub generator_override: Option<String>,
    /// Directories searched for candidate binaries, in order.
    pub path_dirs: Vec<PathBuf>,
    /// Host platform identifier, `std::env::consts::OS` style.
    pub os: String,
}

impl SearchContext {
    /// Capture the search context from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os("CMAKE_EXECUTABLE"),
            env::var_os("CMAKE_GENERATOR"),
            env::var_os("PATH"),
            env::consts::OS,
        )
    }

    /// Build a context from raw variable values. Set-but-empty overrides
    /// count as unset.
    fn from_vars(
        executable: Option<OsString>,
        generator: Option<OsString>,
        path: Option<OsString>,
        os: &str,
    ) -> Self {
        let path_dirs = path
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();

        SearchContext {
            executable_override: executable
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            generator_override: generator
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string_lossy().into_owned()),
            path_dirs,
            os: os.to_string(),
        }
    }

    /// Whether the context describes a Windows host.
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Well-known install locations probed after PATH.
    fn well_known_dirs(&self) -> Vec<PathBuf> {
        if self.is_windows() {
            vec![
                PathBuf::from(r"C:\Program Files\CMake\bin"),
                PathBuf::from(r"C:\Program Files (x86)\CMake\bin"),
            ]
        } else if self.os == "macos" {
            vec![
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/Applications/CMake.app/Contents/bin"),
            ]
        } else {
            vec![PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]
        }
    }
}

/// A discovered cmake binary together with its reported version.
///
/// Immutable once returned; the version is guaranteed to satisfy the
/// minimum the handle was resolved against.
#[derive(Debug, Clone)]
pub struct CMakeProgram {
    pub path: PathBuf,
    pub version: Version,
}

impl CMakeProgram {
    /// Locate a cmake executable whose version satisfies `minimum`.
    ///
    /// Search order: the explicit override, then each candidate name across
    /// the context's PATH entries, then well-known install locations. The
    /// first candidate reporting a version at or above `minimum` wins;
    /// candidates that fail to run, to parse, or to satisfy the constraint
    /// are skipped.
    pub fn find(ctx: &SearchContext, minimum: &Version) -> Result<Self, CMakeError> {
        let mut searched = Vec::new();

        for path in candidate_paths(ctx) {
            searched.push(path.display().to_string());

            let version = match query_version(&path) {
                Some(version) => version,
                None => {
                    tracing::debug!("rejecting `{}`: no parseable version", path.display());
                    continue;
                }
            };

            if version < *minimum {
                tracing::debug!(
                    "rejecting `{}`: version {} is below {}",
                    path.display(),
                    version,
                    minimum
                );
                continue;
            }

            tracing::debug!("using `{}` (cmake {})", path.display(), version);
            return Ok(CMakeProgram { path, version });
        }

        Err(CMakeError::ToolNotFound {
            minimum: minimum.to_string(),
            searched,
        })
    }
}

/// Candidate executables in search order, without duplicates.
fn candidate_paths(ctx: &SearchContext) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(ref path) = ctx.executable_override {
        push_unique(&mut candidates, path.clone());
    }

    for name in CANDIDATE_NAMES {
        if let Some(path) = find_executable_in(name, &ctx.path_dirs) {
            push_unique(&mut candidates, path);
        }
    }

    let well_known = ctx.well_known_dirs();
    for name in CANDIDATE_NAMES {
        if let Some(path) = find_executable_in(name, &well_known) {
            push_unique(&mut candidates, path);
        }
    }

    candidates
}

fn push_unique(candidates: &mut Vec<PathBuf>, path: PathBuf) {
    if !candidates.contains(&path) {
        candidates.push(path);
    }
}

/// Run `<path> --version` and parse the reported version.
fn query_version(path: &Path) -> Option<Version> {
    let output = ProcessBuilder::new(path).arg("--version").exec().ok()?;
    if !output.success() {
        return None;
    }
    parse_cmake_version(&output.stdout)
}

/// Parse `cmake --version` output.
///
/// The first line looks like `cmake version 3.20.5`, possibly with a
/// suffix (`3.28.0-rc1`) or a `cmake3` binary name on older distros.
fn parse_cmake_version(stdout: &str) -> Option<Version> {
    for line in stdout.lines() {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some(tool), Some("version"), Some(raw)) if tool.starts_with("cmake") => {
                let clean = raw.split('-').next().unwrap_or(raw);
                return parse_version_flexible(clean);
            }
            _ => continue,
        }
    }
    None
}

/// Parse a version string into semver::Version, handling incomplete
/// versions.
///
/// Handles versions like "3.20.5", "3.20", or "3"; missing components
/// default to zero and anything after the numeric part is dropped.
pub fn parse_version_flexible(version_str: &str) -> Option<Version> {
    let clean_version = version_str
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or(version_str);

    if let Ok(v) = clean_version.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = clean_version.split('.').collect();
    let major = parts.first().and_then(|s| s.parse().ok())?;
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(Version::new(major, minor, patch))
}
