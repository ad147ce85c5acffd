//! Build session state and the configure/build/install protocol.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cmake::errors::CMakeError;
use crate::cmake::generator::Generator;
use crate::cmake::program::CMakeProgram;
use crate::util::fs::{ensure_dir, write_string};
use crate::util::process::{CommandOutput, ProcessBuilder};

/// Name of the persisted initial-cache file inside the build tree.
const INIT_CACHE_FILE: &str = "CMakeInit.txt";

/// A typed value for a cache entry or a configure define.
///
/// The type decides how the value is written into the initial-cache file;
/// on the command line everything renders as text, with bools as ON/OFF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Bool(bool),
    String(String),
    Path(PathBuf),
}

impl CacheValue {
    fn cache_type(&self) -> &'static str {
        match self {
            CacheValue::Bool(_) => "BOOL",
            CacheValue::String(_) => "STRING",
            CacheValue::Path(_) => "PATH",
        }
    }

    /// Render for the command line (`-DKEY=<this>`).
    fn render(&self) -> String {
        match self {
            CacheValue::Bool(true) => "ON".to_string(),
            CacheValue::Bool(false) => "OFF".to_string(),
            CacheValue::String(s) => s.clone(),
            // CMake wants forward slashes, even on Windows.
            CacheValue::Path(p) => p.to_string_lossy().replace('\\', "/"),
        }
    }

    /// Render one initial-cache `set()` line.
    ///
    /// String and path values use bracket quoting so embedded quotes and
    /// semicolons survive; bools are plain ON/OFF.
    fn cache_line(&self, name: &str) -> String {
        match self {
            CacheValue::Bool(_) => {
                format!("set({} {} CACHE BOOL \"\" FORCE)", name, self.render())
            }
            _ => format!(
                "set({} [===[{}]===] CACHE {} \"\" FORCE)",
                name,
                self.render(),
                self.cache_type()
            ),
        }
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::String(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::String(value)
    }
}

impl From<PathBuf> for CacheValue {
    fn from(value: PathBuf) -> Self {
        CacheValue::Path(value)
    }
}

impl From<&Path> for CacheValue {
    fn from(value: &Path) -> Self {
        CacheValue::Path(value.to_path_buf())
    }
}

/// One logical build: a resolved tool, a generator choice, and the state
/// needed to drive configure → build → install.
///
/// `configure` may be repeated and simply re-evaluates the build tree.
/// `build` needs a prior successful configure and `install` a prior build;
/// both preconditions are reported by the tool itself rather than checked
/// here. A failed operation leaves the build tree as-is, and re-running
/// configure is the recovery path.
#[derive(Debug, Clone)]
pub struct CMakeSession {
    program: CMakeProgram,
    generator: Generator,
    source_dir: PathBuf,
    build_dir: PathBuf,
    build_type: String,
    cache_entries: Vec<(String, CacheValue)>,
    extra_args: Vec<String>,
    env: HashMap<String, String>,
    jobs: Option<usize>,
    verbose: bool,
}

impl CMakeSession {
    /// Create a session for one logical build.
    pub fn new(
        program: CMakeProgram,
        generator: Generator,
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        build_type: impl Into<String>,
    ) -> Self {
        CMakeSession {
            program,
            generator,
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            build_type: build_type.into(),
            cache_entries: Vec::new(),
            extra_args: Vec::new(),
            env: HashMap::new(),
            jobs: None,
            verbose: false,
        }
    }

    /// Add extra configure arguments, passed through verbatim after
    /// everything the session assembles itself.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Set an environment variable for every tool invocation.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Cap the number of parallel build jobs.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Ask the underlying build tool for verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn program(&self) -> &CMakeProgram {
        &self.program
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn build_type(&self) -> &str {
        &self.build_type
    }

    /// Whether the session's generator is single-config.
    pub fn single_config(&self) -> bool {
        self.generator.single_config
    }

    /// Record cache entries for the next configure.
    ///
    /// Entries merge with previously recorded ones, last write wins per
    /// key; first-insertion order is kept. Calling after a configure is
    /// accepted and takes effect on the next one.
    pub fn init_cache(&mut self, entries: &[(String, CacheValue)]) {
        for (key, value) in entries {
            match self.cache_entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => self.cache_entries.push((key.clone(), value.clone())),
            }
        }
    }

    fn init_cache_file(&self) -> PathBuf {
        self.build_dir.join(INIT_CACHE_FILE)
    }

    fn render_init_cache(&self) -> String {
        let mut lines = String::new();
        for (name, value) in &self.cache_entries {
            lines.push_str(&value.cache_line(name));
            lines.push('\n');
        }
        lines
    }

    /// Assemble configure arguments.
    ///
    /// The initial-cache file loads via `-C` before any `-D` flag, so
    /// defines override same-named cache entries.
    fn configure_args(&self, defines: &[(String, CacheValue)]) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.display().to_string(),
            "-B".to_string(),
            self.build_dir.display().to_string(),
        ];

        if !self.cache_entries.is_empty() {
            args.push("-C".to_string());
            args.push(self.init_cache_file().display().to_string());
        }

        args.push("-G".to_string());
        args.push(self.generator.name.clone());

        if self.generator.single_config && !self.build_type.is_empty() {
            args.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        }

        for (name, value) in defines {
            args.push(format!("-D{}={}", name, value.render()));
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Run the configure step.
    ///
    /// Creates the build directory if absent and persists the merged cache
    /// entries to the initial-cache file before invoking the tool. For
    /// single-config generators the build type is baked in here.
    pub fn configure(&self, defines: &[(String, CacheValue)]) -> Result<CommandOutput, CMakeError> {
        ensure_dir(&self.build_dir)?;
        if !self.cache_entries.is_empty() {
            write_string(&self.init_cache_file(), &self.render_init_cache())
                .context("failed to write the initial-cache file")?;
        }

        tracing::info!("configuring `{}`", self.source_dir.display());
        let output = self.run(&self.configure_args(defines))?;
        if !output.success() {
            return Err(CMakeError::Configure { output });
        }
        Ok(output)
    }

    fn build_args(&self, target: Option<&str>) -> Vec<String> {
        let mut args = vec!["--build".to_string(), self.build_dir.display().to_string()];

        if !self.generator.single_config && !self.build_type.is_empty() {
            args.push("--config".to_string());
            args.push(self.build_type.clone());
        }

        if let Some(target) = target {
            args.push("--target".to_string());
            args.push(target.to_string());
        }

        args.push("--parallel".to_string());
        if let Some(jobs) = self.jobs {
            args.push(jobs.to_string());
        }

        if self.verbose {
            args.push("-v".to_string());
        }

        args
    }

    /// Run the build step, optionally for a single target.
    ///
    /// Multi-config generators get the build type again via `--config`;
    /// the build directory alone does not imply it.
    pub fn build(&self, target: Option<&str>) -> Result<CommandOutput, CMakeError> {
        tracing::info!("building `{}`", self.build_dir.display());

        let output = self.run(&self.build_args(target))?;
        if !output.success() {
            return Err(CMakeError::Build { output });
        }
        Ok(output)
    }

    /// Run the install step into `destination`.
    pub fn install(&self, destination: &Path) -> Result<CommandOutput, CMakeError> {
        tracing::info!("installing into `{}`", destination.display());

        let mut args = vec![
            "--install".to_string(),
            self.build_dir.display().to_string(),
            "--prefix".to_string(),
            destination.display().to_string(),
        ];
        if !self.generator.single_config && !self.build_type.is_empty() {
            args.push("--config".to_string());
            args.push(self.build_type.clone());
        }

        let output = self.run(&args)?;
        if !output.success() {
            return Err(CMakeError::Install { output });
        }
        Ok(output)
    }

    /// Where a named build product lands.
    ///
    /// Single-config generators put binaries directly under the build
    /// directory; multi-config generators nest them under a
    /// build-type-named subdirectory.
    pub fn binary_path(&self, name: &str) -> PathBuf {
        if self.generator.single_config || self.build_type.is_empty() {
            self.build_dir.join(name)
        } else {
            self.build_dir.join(&self.build_type).join(name)
        }
    }

    /// Invoke the resolved tool with the session's environment overlay.
    fn run(&self, args: &[String]) -> Result<CommandOutput, CMakeError> {
        let mut cmd = ProcessBuilder::new(&self.program.path).args(args);
        for (key, value) in &self.env {
            cmd = cmd.env(key, value);
        }

        tracing::debug!("running {}", cmd.display_command());
        Ok(cmd.exec()?)
    }
}
