//! Generator selection and single/multi-config classification.

use std::fmt;

use crate::cmake::program::SearchContext;
use crate::util::process::find_executable_in;

/// Generator names (beyond the Visual Studio family) that keep several
/// build types in one configured tree.
const MULTI_CONFIG_GENERATORS: &[&str] = &["Ninja Multi-Config", "Xcode"];

/// A resolved CMake generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    /// Single-config generators bake the build type in at configure time
    /// and put binaries directly under the build directory. Multi-config
    /// generators nest output under a type-named subdirectory and need the
    /// type again at build and install time.
    pub single_config: bool,
}

impl Generator {
    /// Classify a generator by name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let single_config = !is_multi_config(&name);
        Generator {
            name,
            single_config,
        }
    }

    /// Pick the generator for a session.
    ///
    /// An explicit choice (caller or settings) wins, then the context's
    /// `CMAKE_GENERATOR` value, then the platform default: Visual Studio
    /// on Windows, otherwise Ninja when available and Unix Makefiles as
    /// the fallback.
    pub fn resolve(explicit: Option<&str>, ctx: &SearchContext) -> Self {
        if let Some(name) = explicit {
            return Generator::new(name);
        }
        if let Some(ref name) = ctx.generator_override {
            return Generator::new(name.clone());
        }
        Generator::new(default_generator(ctx))
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Static single/multi classification, never inferred from build output.
fn is_multi_config(name: &str) -> bool {
    name.starts_with("Visual Studio") || MULTI_CONFIG_GENERATORS.contains(&name)
}

fn default_generator(ctx: &SearchContext) -> String {
    if ctx.is_windows() {
        return "Visual Studio 17 2022".to_string();
    }
    if find_executable_in("ninja", &ctx.path_dirs).is_some() {
        return "Ninja".to_string();
    }
    "Unix Makefiles".to_string()
}
