//! # Configuration
//!
//! Runtime settings loaded from a TOML file, with defaults for every key.
//!
//! ```toml
//! [writer]
//! analyzed_kinds = ["particle_flow_candidate", "jet"]
//!
//! [hierarchy]
//! strict = false
//!
//! [output]
//! pretty = true
//! ```

use genprov_core::{GenprovError, ObjectKind, WriterOptions};
use serde::Deserialize;
use std::path::Path;

/// File consulted when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "genprov.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub writer: WriterSection,

    #[serde(default)]
    pub hierarchy: HierarchySection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WriterSection {
    /// Object kinds that get leading-particle and energy-fraction fields.
    #[serde(default = "default_analyzed_kinds")]
    pub analyzed_kinds: Vec<ObjectKind>,
}

fn default_analyzed_kinds() -> Vec<ObjectKind> {
    vec![ObjectKind::ParticleFlowCandidate]
}

impl Default for WriterSection {
    fn default() -> Self {
        Self {
            analyzed_kinds: default_analyzed_kinds(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HierarchySection {
    /// Reject events containing malformed nodes instead of reporting them.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputSection {
    /// Indent JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, GenprovError> {
        toml::from_str(contents).map_err(|e| GenprovError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self, GenprovError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GenprovError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Load an explicitly requested file, or `DEFAULT_CONFIG_FILE` if present.
    ///
    /// Only the implicit default may be missing; it then yields defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, GenprovError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    #[must_use]
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions::default().with_analyzed_kinds(self.writer.analyzed_kinds.iter().copied())
    }
}
