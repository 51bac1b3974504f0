//! Project configuration for contract checks

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::key::{DEFAULT_ELIDE_PREFIX, KeyRules};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the contract document and its component files
    #[serde(default = "default_contract_dir")]
    pub contract_dir: PathBuf,

    /// Contract document, relative to `contract_dir`
    #[serde(default = "default_contract_file")]
    pub contract_file: PathBuf,

    /// Component index, relative to `contract_dir`
    #[serde(default = "default_component_index")]
    pub component_index: PathBuf,

    /// Root of the fixture tree (one subdirectory per operation)
    #[serde(default = "default_fixture_dir")]
    pub fixture_dir: PathBuf,

    /// HTML report destination
    #[serde(default)]
    pub html_path: Option<PathBuf>,

    /// CSV report destination
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    /// JSON report destination
    #[serde(default)]
    pub json_path: Option<PathBuf>,

    /// Path prefix removed from operation keys
    #[serde(default = "default_elide_prefix")]
    pub elide_prefix: String,
}

fn default_contract_dir() -> PathBuf {
    PathBuf::from("contract")
}

fn default_contract_file() -> PathBuf {
    PathBuf::from("swagger.yaml")
}

fn default_component_index() -> PathBuf {
    PathBuf::from("src/_components.yaml")
}

fn default_fixture_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

fn default_elide_prefix() -> String {
    DEFAULT_ELIDE_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract_dir: default_contract_dir(),
            contract_file: default_contract_file(),
            component_index: default_component_index(),
            fixture_dir: default_fixture_dir(),
            html_path: None,
            csv_path: None,
            json_path: None,
            elide_prefix: default_elide_prefix(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first default location that exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a found file cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// [`Config::load_default`] rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a found file cannot be read or parsed
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    #[must_use]
    pub fn contract_path(&self) -> PathBuf {
        self.contract_dir.join(&self.contract_file)
    }

    #[must_use]
    pub fn component_index_path(&self) -> PathBuf {
        self.contract_dir.join(&self.component_index)
    }

    #[must_use]
    pub fn key_rules(&self) -> KeyRules {
        KeyRules::new(self.elide_prefix.clone())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# respcheck configuration

# Contract document and its component files
contract_dir = "contract"
contract_file = "swagger.yaml"
component_index = "src/_components.yaml"

# Captured responses: <fixture_dir>/<operation>/<file>
fixture_dir = "fixtures"

# Report destinations (omit to skip)
html_path = "report/index.html"
csv_path = "report/report.csv"
# json_path = "report/report.json"

# Path prefix dropped from operation keys
# elide_prefix = "/v1/projects"
"#
    }
}

/// Config files probed by [`Config::load_default`], in order.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = [".respcheck.toml", ".respcheck.json", "respcheck.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
