//! CLI configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// CLI configuration loaded from `~/.stratum/config.json`.
///
/// Every field is optional in the file; command-line flags override it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    /// `embedded` or the name of a solver executable.
    pub solver: String,
    /// Extra arguments for an external solver.
    pub solver_args: Vec<String>,
    /// Number of solutions `run` looks for.
    pub solutions: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            solver: "embedded".into(),
            solver_args: Vec::new(),
            solutions: 1,
        }
    }
}

impl CliConfig {
    /// Location of the config file, if a home directory exists.
    pub fn path() -> Option<PathBuf> {
        home::home_dir().map(|home| home.join(".stratum").join("config.json"))
    }

    /// Loads configuration from file, falling back to defaults when absent.
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = Self::path().filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
