//! Build settings handed over by the embedding packaging process.
//!
//! One TOML table per build (the packaging tool's `[cmake]`-style section)
//! carrying the minimum tool version, generator and build-type choices,
//! extra configure arguments, and a define table. Environment overrides
//! (`CMAKE_EXECUTABLE`, `CMAKE_GENERATOR`) are not read here; they live in
//! [`SearchContext`](crate::cmake::program::SearchContext) and lose to an
//! explicit generator in this table.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::cmake::program::parse_version_flexible;
use crate::cmake::session::CacheValue;

/// Minimum cmake version assumed when the table does not pin one.
const DEFAULT_MINIMUM_VERSION: &str = "3.15";

/// Settings table for one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildSettings {
    /// Minimum acceptable cmake version, e.g. `"3.15"`.
    pub minimum_version: Option<String>,

    /// Generator override; beats `CMAKE_GENERATOR` from the environment.
    pub generator: Option<String>,

    /// Build type; Release when unset.
    pub build_type: Option<String>,

    /// Extra configure arguments, passed through verbatim.
    #[serde(default)]
    pub args: Vec<String>,

    /// Configure defines (`-D` overrides). Values may be booleans or
    /// strings.
    #[serde(default)]
    pub define: BTreeMap<String, CacheValue>,
}

impl BuildSettings {
    /// Parse a settings table from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse build settings")
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))
    }

    /// Load settings with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load settings from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// The pinned minimum cmake version, parsed leniently.
    pub fn minimum(&self) -> Result<Version> {
        let raw = self
            .minimum_version
            .as_deref()
            .unwrap_or(DEFAULT_MINIMUM_VERSION);

        parse_version_flexible(raw)
            .with_context(|| format!("invalid minimum cmake version: {raw}"))
    }

    /// Build type, defaulting to Release.
    pub fn build_type(&self) -> &str {
        self.build_type.as_deref().unwrap_or("Release")
    }

    /// Defines as ordered pairs for `configure`.
    pub fn defines(&self) -> Vec<(String, CacheValue)> {
        self.define
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
