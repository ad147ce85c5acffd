//! Readme metadata composition.
//!
//! The packaging process hands over a content type plus an ordered list of
//! fragments; each fragment is literal text or a window of a file and
//! carries its own substitution rules. Composition applies the
//! substitutions to each fragment, then concatenates the results in order
//! with no separator. Invoked once per metadata build; nothing is
//! persisted.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

/// Readme composition config, usually a TOML table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReadmeConfig {
    /// Media type of the composed text, e.g. `text/markdown`.
    pub content_type: String,

    /// Fragments, concatenated in order.
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

/// One readme fragment: literal text, or a window of a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Fragment {
    /// Literal text. Mutually exclusive with `path`.
    pub text: Option<String>,

    /// File to read, relative to the composition root.
    pub path: Option<PathBuf>,

    /// Drop everything up to and including this marker.
    pub start_after: Option<String>,

    /// Drop this marker and everything after it.
    pub end_before: Option<String>,

    /// Pattern/replacement rules applied to this fragment, in order.
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

/// A single regex rewrite. Replacements use the `$1` capture syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

/// A composed readme.
#[derive(Debug, Clone, PartialEq)]
pub struct Readme {
    pub content_type: String,
    pub text: String,
}

impl ReadmeConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse readme config")
    }

    /// Compose the readme. File fragments resolve relative to `root`.
    pub fn compose(&self, root: &Path) -> Result<Readme> {
        let mut text = String::new();
        for fragment in &self.fragments {
            text.push_str(&fragment.render(root)?);
        }

        Ok(Readme {
            content_type: self.content_type.clone(),
            text,
        })
    }
}

impl Fragment {
    fn render(&self, root: &Path) -> Result<String> {
        let mut text = match (&self.text, &self.path) {
            (Some(text), None) => text.clone(),
            (None, Some(path)) => read_to_string(&root.join(path))?,
            (Some(_), Some(_)) => bail!("readme fragment has both `text` and `path`"),
            (None, None) => bail!("readme fragment needs either `text` or `path`"),
        };

        if let Some(ref marker) = self.start_after {
            match text.find(marker) {
                Some(pos) => text = text[pos + marker.len()..].to_string(),
                None => bail!("start-after marker {marker:?} not found"),
            }
        }

        if let Some(ref marker) = self.end_before {
            match text.find(marker) {
                Some(pos) => text.truncate(pos),
                None => bail!("end-before marker {marker:?} not found"),
            }
        }

        for substitution in &self.substitutions {
            let re = Regex::new(&substitution.pattern).with_context(|| {
                format!("invalid substitution pattern {:?}", substitution.pattern)
            })?;
            text = re
                .replace_all(&text, substitution.replacement.as_str())
                .into_owned();
        }

        Ok(text)
    }
}
