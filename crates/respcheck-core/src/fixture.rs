//! Captured response fixtures
//!
//! A fixture file has three sections separated by a blank line (`\r\n\r\n`):
//!
//! ```text
//! HTTP/2 200
//! content-type: application/json
//!
//! {"id": "x"}
//!
//! expect_code: 200
//! ```
//!
//! Parsing is pure; walking a fixture directory lives behind [`FixtureSource`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::{KeyRules, OperationId, OperationKey};

/// Separator between head, body and trailer.
pub const SECTION_DELIMITER: &str = "\r\n\r\n";

const STATUS_MARKER: &str = "HTTP/2 ";
const EXPECT_MARKER: &str = "expect_code: ";

/// One captured response, ready for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFixture {
    /// Fixture group (directory) name, trimmed and lower-cased
    pub group: String,
    /// Normalized operation id derived from the group
    pub operation: OperationId,
    /// File name, trimmed and lower-cased
    pub file_name: String,
    /// Status the capture was expected to return (`expect_code:` trailer)
    pub declared_status: String,
    /// Status actually captured (`HTTP/2 <code>` line)
    pub observed_status: String,
    /// Parsed body, `None` when the capture had no body
    pub body: Option<Value>,
}

impl ResponseFixture {
    /// Contract join key: `{group}_{observed_status}`.
    #[must_use]
    pub fn key(&self) -> OperationKey {
        OperationKey::new(self.operation.clone(), &self.observed_status)
    }

    /// Whether the captured status matches the expectation.
    #[must_use]
    pub fn status_matches(&self) -> bool {
        self.declared_status == self.observed_status
    }
}

/// `output_list_ok.json` → `list_ok`
#[must_use]
pub fn test_case(file_name: &str) -> &str {
    let name = file_name.strip_prefix("output_").unwrap_or(file_name);
    name.strip_suffix(".json").unwrap_or(name)
}

/// Fixtures produced by a [`FixtureSource`], plus the files it had to skip.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    pub fixtures: Vec<ResponseFixture>,
    pub skipped: Vec<SkippedFixture>,
}

/// A fixture file that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedFixture {
    pub path: String,
    pub reason: String,
}

/// Loader of fixture records.
pub trait FixtureSource {
    /// Load every fixture. Unparsable files are reported in
    /// [`FixtureSet::skipped`]; only an unreadable source is an error.
    ///
    /// # Errors
    ///
    /// Returns error if the source itself cannot be read.
    fn load(&self) -> Result<FixtureSet, FixtureError>;
}

/// Parse one fixture file.
///
/// # Errors
///
/// Returns error if a section, the status line, or the `expect_code` trailer
/// is missing, or the body is not valid JSON.
pub fn parse_fixture(
    group: &str,
    file_name: &str,
    text: &str,
    rules: &KeyRules,
) -> Result<ResponseFixture, FixtureError> {
    let (head, rest) = text
        .split_once(SECTION_DELIMITER)
        .ok_or(FixtureError::MissingSection)?;
    // Trailing blank lines after the trailer do not open a new section.
    let (body, trailer) = rest
        .trim_end()
        .rsplit_once(SECTION_DELIMITER)
        .or_else(|| rest.rsplit_once(SECTION_DELIMITER))
        .ok_or(FixtureError::MissingSection)?;

    if head.trim().is_empty() && trailer.trim().is_empty() {
        return Err(FixtureError::Empty);
    }

    let observed = token_after(head, STATUS_MARKER).ok_or(FixtureError::NoStatusLine)?;
    let declared = token_after(trailer, EXPECT_MARKER).ok_or(FixtureError::NoExpectCode)?;

    let body = body.trim();
    let body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_str(body).map_err(|e| FixtureError::Json(e.to_string()))?)
    };

    let group = group.trim().to_lowercase();
    Ok(ResponseFixture {
        operation: OperationId::from_group(&group, rules),
        group,
        file_name: file_name.trim().to_lowercase(),
        declared_status: declared.to_string(),
        observed_status: observed.to_string(),
        body,
    })
}

/// First whitespace-delimited token following `marker` on any line.
fn token_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (_, rest) = line.split_once(marker)?;
        rest.split_whitespace().next()
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Cannot read {0}")]
    Io(String),
    #[error("Expected head, body and trailer sections separated by blank lines")]
    MissingSection,
    #[error("Head and trailer sections are both empty")]
    Empty,
    #[error("No `HTTP/2 <code>` status line")]
    NoStatusLine,
    #[error("No `expect_code: <code>` trailer")]
    NoExpectCode,
    #[error("Invalid JSON body: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> Result<ResponseFixture, FixtureError> {
        parse_fixture("GET_id", "Output_Case.json ", text, &KeyRules::default())
    }

    #[test]
    fn parse_full_fixture() {
        let text = "HTTP/2 200\r\ncontent-type: application/json\r\n\r\n{\"id\": \"x\"}\r\n\r\nexpect_code: 200\r\n";
        let fixture = parse(text).unwrap();
        assert_eq!(fixture.group, "get_id");
        assert_eq!(fixture.file_name, "output_case.json");
        assert_eq!(fixture.observed_status, "200");
        assert_eq!(fixture.declared_status, "200");
        assert_eq!(fixture.body, Some(json!({"id": "x"})));
        assert_eq!(fixture.key().to_string(), "get_id_200");
        assert!(fixture.status_matches());
        assert_eq!(test_case(&fixture.file_name), "case");
    }

    #[test]
    fn empty_body_is_none() {
        let text = "HTTP/2 204\r\n\r\n\r\n\r\nexpect_code: 204";
        let fixture = parse(text).unwrap();
        assert_eq!(fixture.body, None);
        assert_eq!(fixture.key().to_string(), "get_id_204");
    }

    #[test]
    fn body_containing_delimiter_is_kept_whole() {
        let text = "HTTP/2 200\r\n\r\n{\"a\":\r\n\r\n1}\r\n\r\nexpect_code: 200";
        let fixture = parse(text).unwrap();
        assert_eq!(fixture.body, Some(json!({"a": 1})));
    }

    #[test]
    fn trailing_blank_line_after_trailer() {
        let text = "HTTP/2 200\r\ncontent-type: application/json\r\n\r\n{\"id\": \"x\"}\r\n\r\nexpect_code: 200\r\n\r\n";
        let fixture = parse(text).unwrap();
        assert_eq!(fixture.declared_status, "200");
        assert_eq!(fixture.body, Some(json!({"id": "x"})));

        let fixture = parse("HTTP/2 204\r\n\r\n\r\n\r\nexpect_code: 204\r\n\r\n\r\n").unwrap();
        assert_eq!(fixture.body, None);
        assert_eq!(fixture.declared_status, "204");
    }

    #[test]
    fn status_mismatch_detected() {
        let text = "HTTP/2 404\r\n\r\n{}\r\n\r\nexpect_code: 200";
        let fixture = parse(text).unwrap();
        assert!(!fixture.status_matches());
        assert_eq!(fixture.key().to_string(), "get_id_404");
    }

    #[test]
    fn missing_sections() {
        assert!(matches!(
            parse("HTTP/2 200\r\n{}"),
            Err(FixtureError::MissingSection)
        ));
        assert!(matches!(
            parse("HTTP/2 200\r\n\r\n{}"),
            Err(FixtureError::MissingSection)
        ));
    }

    #[test]
    fn empty_head_and_trailer() {
        assert!(matches!(
            parse("\r\n\r\n{}\r\n\r\n"),
            Err(FixtureError::Empty)
        ));
    }

    #[test]
    fn missing_status_line() {
        assert!(matches!(
            parse("HTTP/1.1 200\r\n\r\n{}\r\n\r\nexpect_code: 200"),
            Err(FixtureError::NoStatusLine)
        ));
    }

    #[test]
    fn missing_expect_code() {
        assert!(matches!(
            parse("HTTP/2 200\r\n\r\n{}\r\n\r\nexpected: 200"),
            Err(FixtureError::NoExpectCode)
        ));
    }

    #[test]
    fn invalid_json_body() {
        assert!(matches!(
            parse("HTTP/2 200\r\n\r\n{oops\r\n\r\nexpect_code: 200"),
            Err(FixtureError::Json(_))
        ));
    }

    #[test]
    fn test_case_label() {
        assert_eq!(test_case("output_list_ok.json"), "list_ok");
        assert_eq!(test_case("plain.txt"), "plain.txt");
    }
}
