//! Result aggregation: fixtures + findings → report rows
//!
//! Status mismatches are checked first and exclude the fixture from body
//! comparison. Findings are then sorted by (api, fixture file) and folded into
//! one row per fixture.

use std::collections::{HashMap, HashSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::compare::{CompareContext, CompareError, compare};
use crate::finding::Finding;
use crate::fixture::{ResponseFixture, test_case};
use crate::index::ExpectedSchemaIndex;
use crate::key::OperationKey;

/// Pass/fail outcome of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowResult {
    Pass,
    Fail,
}

impl fmt::Display for RowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Aggregated result for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRow {
    /// Operation id without status, e.g. `get_id`
    pub api: String,
    /// Observed status code
    pub status: String,
    /// Test case label derived from the file name
    pub test_case: String,
    /// Fixture file name
    pub fixture_file: String,
    pub result: RowResult,
    /// One line per discrepancy; empty for PASS rows
    pub descriptions: Vec<String>,
}

impl ReportRow {
    fn new(operation: &OperationKey, fixture_file: &str) -> Self {
        Self {
            api: operation.api().to_string(),
            status: operation.status.clone(),
            test_case: test_case(fixture_file).to_string(),
            fixture_file: fixture_file.to_string(),
            result: RowResult::Pass,
            descriptions: Vec::new(),
        }
    }
}

/// Rows of one API, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiGroup {
    pub api: String,
    pub rows: Vec<ReportRow>,
}

/// A fixture that went through the status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFixture {
    pub operation: OperationKey,
    pub fixture_file: String,
}

impl From<&ResponseFixture> for CheckedFixture {
    fn from(fixture: &ResponseFixture) -> Self {
        Self {
            operation: fixture.key(),
            fixture_file: fixture.file_name.clone(),
        }
    }
}

/// Everything produced by checking a batch of fixtures.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub checked: Vec<CheckedFixture>,
    pub findings: Vec<Finding>,
    /// Fixtures whose comparison faulted; they produce no row.
    pub errors: Vec<CompareError>,
}

/// Check one fixture: status first, body only when the status matched.
///
/// # Errors
///
/// Returns error if the comparator faults on this fixture's body.
pub fn evaluate(
    fixture: &ResponseFixture,
    index: &ExpectedSchemaIndex,
) -> Result<Vec<Finding>, CompareError> {
    let key = fixture.key();

    if !fixture.status_matches() {
        return Ok(vec![Finding::status_mismatch(
            &key,
            &fixture.file_name,
            &fixture.declared_status,
            &fixture.observed_status,
        )]);
    }

    if !index.contains(&key) {
        tracing::debug!(
            key = %key,
            file = %fixture.file_name,
            "no contract entry, expecting no body"
        );
    }

    let ctx = CompareContext {
        operation: &key,
        fixture_file: &fixture.file_name,
    };
    let body = fixture.body.as_ref().unwrap_or(&serde_json::Value::Null);
    compare(index.expected(&key), body, &ctx)
}

/// Check every fixture. A comparator fault skips that fixture only.
#[must_use]
pub fn evaluate_all(fixtures: &[ResponseFixture], index: &ExpectedSchemaIndex) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for fixture in fixtures {
        match evaluate(fixture, index) {
            Ok(findings) => {
                evaluation.checked.push(CheckedFixture::from(fixture));
                evaluation.findings.extend(findings);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping fixture");
                evaluation.errors.push(e);
            }
        }
    }

    evaluation
}

/// Fold findings into rows: sorted by (api, file), one row per (key, file).
///
/// Checked fixtures without findings become PASS rows.
#[must_use]
pub fn aggregate(checked: &[CheckedFixture], findings: &[Finding]) -> Vec<ReportRow> {
    let failed: HashSet<(&OperationKey, &str)> = findings
        .iter()
        .map(|f| (&f.operation, f.fixture_file.as_str()))
        .collect();

    let mut entries: Vec<(&OperationKey, &str, Option<&Finding>)> = findings
        .iter()
        .map(|f| (&f.operation, f.fixture_file.as_str(), Some(f)))
        .collect();
    entries.extend(
        checked
            .iter()
            .filter(|c| !failed.contains(&(&c.operation, c.fixture_file.as_str())))
            .map(|c| (&c.operation, c.fixture_file.as_str(), None)),
    );

    // Stable: findings of one fixture keep their discovery order.
    entries.sort_by(|a, b| (a.0.api(), a.1).cmp(&(b.0.api(), b.1)));

    let mut rows: Vec<ReportRow> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (operation, file, finding) in entries {
        let row_key = format!("{operation}-{file}");
        let pos = *positions.entry(row_key).or_insert_with(|| {
            rows.push(ReportRow::new(operation, file));
            rows.len() - 1
        });
        if let Some(finding) = finding {
            let row = &mut rows[pos];
            row.result = RowResult::Fail;
            row.descriptions.extend(finding.descriptions());
        }
    }

    rows
}

/// Group rows by API, preserving row order.
#[must_use]
pub fn group_by_api(rows: &[ReportRow]) -> Vec<ApiGroup> {
    let mut groups: Vec<ApiGroup> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|g| g.api == row.api) {
            Some(group) => group.rows.push(row.clone()),
            None => groups.push(ApiGroup {
                api: row.api.clone(),
                rows: vec![row.clone()],
            }),
        }
    }
    groups
}

/// Run totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    /// Rows in the report
    pub fixtures: usize,
    pub passed: usize,
    pub failed: usize,
    /// Fixtures left out of the report (unparsable or faulted)
    pub skipped: usize,
}

impl Summary {
    #[must_use]
    pub fn from_rows(rows: &[ReportRow], skipped: usize) -> Self {
        let passed = rows.iter().filter(|r| r.result == RowResult::Pass).count();
        Self {
            fixtures: rows.len(),
            passed,
            failed: rows.len() - passed,
            skipped,
        }
    }

    /// 0 when every row passed, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }
}
