//! Report sinks: CSV, HTML and JSON renderings of aggregated rows
//!
//! Sinks receive rows that are already sorted and grouped by API; they only
//! format and write.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::{ApiGroup, ReportRow, RowResult, Summary};

/// CSV header row.
pub const CSV_HEADERS: [&str; 6] = ["API", "STATUS", "TESTCASE", "JSON_FILE", "RESULT", "DESCRIPTION"];

/// Everything a sink renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContractReport {
    pub summary: Summary,
    pub groups: Vec<ApiGroup>,
}

impl ContractReport {
    #[must_use]
    pub fn new(summary: Summary, groups: Vec<ApiGroup>) -> Self {
        Self { summary, groups }
    }

    /// All rows in report order.
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.groups.iter().flat_map(|g| g.rows.iter())
    }
}

/// Destination for a finished report.
pub trait ReportSink {
    /// # Errors
    ///
    /// Returns error if the report cannot be rendered or written.
    fn write(&mut self, report: &ContractReport) -> Result<(), ReportError>;
}

/// CSV file sink.
#[derive(Debug, Clone)]
pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for CsvReport {
    fn write(&mut self, report: &ContractReport) -> Result<(), ReportError> {
        write_file(&self.path, &render_csv(report))
    }
}

/// HTML file sink.
#[derive(Debug, Clone)]
pub struct HtmlReport {
    path: PathBuf,
}

impl HtmlReport {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for HtmlReport {
    fn write(&mut self, report: &ContractReport) -> Result<(), ReportError> {
        write_file(&self.path, &render_html(report))
    }
}

/// Pretty JSON file sink.
#[derive(Debug, Clone)]
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReport {
    fn write(&mut self, report: &ContractReport) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::Serialize(e.to_string()))?;
        write_file(&self.path, &json)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReportError::Io(format!("create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, content)
        .map_err(|e| ReportError::Io(format!("write {}: {e}", path.display())))
}

/// One line per row; the description list is comma-joined inside quotes.
#[must_use]
pub fn render_csv(report: &ContractReport) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];
    for row in report.rows() {
        lines.push(format!(
            "{},{},{},{},{},{}",
            csv_field(&row.api),
            csv_field(&row.status),
            csv_field(&row.test_case),
            csv_field(&row.fixture_file),
            row.result,
            quoted(&row.descriptions.join(",")),
        ));
    }
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Standalone HTML document, one table per API.
#[must_use]
pub fn render_html(report: &ContractReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        "<!DOCTYPE html>".to_string(),
        "<html lang=\"en\">".to_string(),
        "<head>".to_string(),
        "<meta charset=\"utf-8\">".to_string(),
        "<title>API contract report</title>".to_string(),
        "<style>".to_string(),
        "body { font-family: sans-serif; margin: 2em; }".to_string(),
        "table { border-collapse: collapse; width: 100%; margin-bottom: 2em; }".to_string(),
        "th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }".to_string(),
        "tr.pass td.result { color: #1a7f37; }".to_string(),
        "tr.fail td.result { color: #cf222e; font-weight: bold; }".to_string(),
        "</style>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        "<h1>API contract report</h1>".to_string(),
        format!(
            "<p class=\"summary\">{} fixtures, {} passed, {} failed, {} skipped</p>",
            summary.fixtures, summary.passed, summary.failed, summary.skipped
        ),
    ];

    for group in &report.groups {
        lines.push("<section>".to_string());
        lines.push(format!("<h2>{}</h2>", escape_html(&group.api)));
        lines.push("<table>".to_string());
        lines.push(
            "<thead><tr><th>Status</th><th>Test case</th><th>JSON file</th><th>Result</th><th>Description</th></tr></thead>"
                .to_string(),
        );
        lines.push("<tbody>".to_string());
        for row in &group.rows {
            let class = match row.result {
                RowResult::Pass => "pass",
                RowResult::Fail => "fail",
            };
            let descriptions: Vec<String> =
                row.descriptions.iter().map(|d| escape_html(d)).collect();
            lines.push(format!(
                "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td class=\"result\">{}</td><td>{}</td></tr>",
                escape_html(&row.status),
                escape_html(&row.test_case),
                escape_html(&row.fixture_file),
                row.result,
                descriptions.join("<br>"),
            ));
        }
        lines.push("</tbody>".to_string());
        lines.push("</table>".to_string());
        lines.push("</section>".to_string());
    }

    lines.push("</body>".to_string());
    lines.push("</html>".to_string());
    lines.join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON Schema of [`ContractReport`].
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(ContractReport);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}
