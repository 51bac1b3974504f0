//! Check plan types and config validation
//!
//! Describes what a check *would* cover without comparing any bodies.
//! Used for pre-flight validation and CI previews.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::fixture::{FixtureSet, SkippedFixture};
use crate::index::ExpectedSchemaIndex;

// ── Plan types ──

/// Coverage preview: how fixtures line up against the contract.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckPlan {
    /// Contract entries (`{operation}_{status}` keys)
    pub contract_entries: usize,
    /// Fixtures parsed successfully
    pub fixtures_loaded: usize,
    /// Fixture files that failed to parse
    pub skipped: Vec<SkippedFixture>,
    /// Fixture keys with no contract entry, sorted and deduplicated
    pub unmatched_fixtures: Vec<String>,
    /// Contract keys no fixture exercises, sorted
    pub uncovered_operations: Vec<String>,
    /// Config validation results
    pub validations: Vec<Validation>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.into(),
            status,
            message,
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ── Config validation ──

/// Validate config paths and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    let contract = config.contract_path();
    if contract.is_file() {
        checks.push(Validation::new(
            "contract",
            ValidationStatus::Ok,
            format!("contract: {} (exists)", contract.display()),
        ));
    } else {
        checks.push(Validation::new(
            "contract",
            ValidationStatus::Error,
            format!("contract: {} (not found)", contract.display()),
        ));
    }

    // A missing index only means there are no shared components.
    let components = config.component_index_path();
    if components.is_file() {
        checks.push(Validation::new(
            "components",
            ValidationStatus::Ok,
            format!("components: {} (exists)", components.display()),
        ));
    } else {
        checks.push(Validation::new(
            "components",
            ValidationStatus::Warning,
            format!(
                "components: {} (not found, $ref to components will fail)",
                components.display()
            ),
        ));
    }

    if config.fixture_dir.is_dir() {
        checks.push(Validation::new(
            "fixtures",
            ValidationStatus::Ok,
            format!("fixtures: {} (exists)", config.fixture_dir.display()),
        ));
    } else {
        checks.push(Validation::new(
            "fixtures",
            ValidationStatus::Error,
            format!("fixtures: {} (not a directory)", config.fixture_dir.display()),
        ));
    }

    let reports: Vec<String> = [&config.html_path, &config.csv_path, &config.json_path]
        .into_iter()
        .flatten()
        .map(|p| p.display().to_string())
        .collect();
    if reports.is_empty() {
        checks.push(Validation::new(
            "reports",
            ValidationStatus::Warning,
            "reports: none configured (results go to stdout only)".into(),
        ));
    } else {
        checks.push(Validation::new(
            "reports",
            ValidationStatus::Ok,
            format!("reports: {}", reports.join(", ")),
        ));
    }

    checks
}

// ── Plan construction ──

impl CheckPlan {
    /// Cross-reference loaded fixtures against the contract index.
    #[must_use]
    pub fn build(
        index: &ExpectedSchemaIndex,
        fixtures: &FixtureSet,
        validations: Vec<Validation>,
    ) -> Self {
        let fixture_keys: HashSet<_> = fixtures.fixtures.iter().map(|f| f.key()).collect();

        let mut unmatched_fixtures: Vec<String> = fixture_keys
            .iter()
            .filter(|key| !index.contains(key))
            .map(ToString::to_string)
            .collect();
        unmatched_fixtures.sort();

        let uncovered_operations = index
            .keys()
            .into_iter()
            .filter(|key| !fixture_keys.contains(*key))
            .map(ToString::to_string)
            .collect();

        Self {
            contract_entries: index.len(),
            fixtures_loaded: fixtures.fixtures.len(),
            skipped: fixtures.skipped.clone(),
            unmatched_fixtures,
            uncovered_operations,
            validations,
        }
    }

    /// Plan with validations only, for when the inputs could not be loaded.
    #[must_use]
    pub fn invalid(validations: Vec<Validation>) -> Self {
        Self {
            contract_entries: 0,
            fixtures_loaded: 0,
            skipped: Vec::new(),
            unmatched_fixtures: Vec::new(),
            uncovered_operations: Vec::new(),
            validations,
        }
    }
}

// ── Display helpers ──

impl CheckPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} contract entries, {} fixtures loaded, {} skipped\n",
            self.contract_entries,
            self.fixtures_loaded,
            self.skipped.len(),
        ));

        if !self.skipped.is_empty() {
            lines.push("Skipped fixtures:".into());
            for s in &self.skipped {
                lines.push(format!("  {}: {}", s.path, s.reason));
            }
            lines.push(String::new());
        }

        if !self.unmatched_fixtures.is_empty() {
            lines.push("Fixtures without a contract entry:".into());
            for key in &self.unmatched_fixtures {
                lines.push(format!("  {key}"));
            }
            lines.push(String::new());
        }

        if !self.uncovered_operations.is_empty() {
            lines.push("Contract entries without fixtures:".into());
            for key in &self.uncovered_operations {
                lines.push(format!("  {key}"));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
