//! Findings: one detected discrepancy between contract and fixture

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::key::OperationKey;

/// Kind of discrepancy - determines the human-readable reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Declared property absent from the body
    MissingProperty,
    /// Body property not declared in the contract
    RedundantProperty,
    /// `type: array` but the value is not an array
    NotArray,
    /// `type: float` but the value is not a number
    NotFloat,
    /// `type: integer` but the value has a fractional part or is not a number
    NotInteger,
    /// Runtime type differs from any other declared type
    TypeMismatch,
    /// Contract declares no body but one was returned
    UnexpectedNull,
    /// Contract declares a body but the value is empty
    MissingRequiredValue,
    /// Observed status differs from the fixture's expectation
    UnexpectedStatusCode,
}

impl FindingKind {
    /// Fixed reason text. `TypeMismatch` is completed by [`Finding::reason`].
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::MissingProperty => "missing property",
            Self::RedundantProperty => "redundant property",
            Self::NotArray => "is not array",
            Self::NotFloat => "is not float",
            Self::NotInteger => "is not integer",
            Self::TypeMismatch => "is not",
            Self::UnexpectedNull => "expected null value",
            Self::MissingRequiredValue => "must not empty value",
            Self::UnexpectedStatusCode => "unexpected http status code",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a value inside a response body, rendered as `data[1].tags[0].name`.
///
/// Immutable: `field`/`index` return a new path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    #[must_use]
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(idx));
        Self { segments }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `None` at the root, rendered path otherwise.
    #[must_use]
    pub fn rendered(&self) -> Option<String> {
        (!self.is_root()).then(|| self.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if pos == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// A single discrepancy for one fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub kind: FindingKind,
    /// Fixture file name (lower-cased)
    pub fixture_file: String,
    /// Contract join key of the fixture
    pub operation: OperationKey,
    /// Rendered field path, absent for whole-body findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    /// Declared type for `TypeMismatch`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_status: Option<String>,
}

impl Finding {
    /// Body finding at `path`.
    #[must_use]
    pub fn body(
        kind: FindingKind,
        operation: &OperationKey,
        fixture_file: &str,
        path: &FieldPath,
    ) -> Self {
        Self {
            kind,
            fixture_file: fixture_file.to_string(),
            operation: operation.clone(),
            field_path: path.rendered(),
            declared_type: None,
            expected_status: None,
            actual_status: None,
        }
    }

    /// Status-code mismatch between the fixture's expectation and the capture.
    #[must_use]
    pub fn status_mismatch(
        operation: &OperationKey,
        fixture_file: &str,
        expected: &str,
        actual: &str,
    ) -> Self {
        Self {
            kind: FindingKind::UnexpectedStatusCode,
            fixture_file: fixture_file.to_string(),
            operation: operation.clone(),
            field_path: None,
            declared_type: None,
            expected_status: Some(expected.to_string()),
            actual_status: Some(actual.to_string()),
        }
    }

    /// Attach the declared type (used by `TypeMismatch`)
    #[must_use]
    pub fn with_declared_type(mut self, ty: impl Into<String>) -> Self {
        self.declared_type = Some(ty.into());
        self
    }

    /// Human-readable reason, e.g. `is not string`.
    #[must_use]
    pub fn reason(&self) -> String {
        match (&self.kind, &self.declared_type) {
            (FindingKind::TypeMismatch, Some(ty)) => format!("is not {ty}"),
            (kind, _) => kind.reason().to_string(),
        }
    }

    /// Description lines for the report row.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        if let (Some(expected), Some(actual)) = (&self.expected_status, &self.actual_status) {
            return vec![
                format!("expect status: {expected}"),
                format!("actual status: {actual}"),
            ];
        }
        match &self.field_path {
            Some(path) => vec![format!("{}: {path}", self.reason())],
            None => vec![self.reason()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyRules, OperationId};

    fn key() -> OperationKey {
        OperationKey::new(OperationId::from_group("get_id", &KeyRules::default()), "200")
    }

    #[test]
    fn field_path_rendering() {
        let path = FieldPath::root().field("data").index(1).field("tags").index(0);
        assert_eq!(path.to_string(), "data[1].tags[0]");
        assert_eq!(path.field("name").to_string(), "data[1].tags[0].name");
    }

    #[test]
    fn root_path_renders_none() {
        assert_eq!(FieldPath::root().rendered(), None);
        assert_eq!(FieldPath::root().field("id").rendered(), Some("id".into()));
    }

    #[test]
    fn body_description_with_path() {
        let path = FieldPath::root().field("items").index(2);
        let finding = Finding::body(FindingKind::NotInteger, &key(), "a.json", &path);
        assert_eq!(finding.descriptions(), vec!["is not integer: items[2]"]);
    }

    #[test]
    fn body_description_without_path() {
        let finding = Finding::body(
            FindingKind::UnexpectedNull,
            &key(),
            "a.json",
            &FieldPath::root(),
        );
        assert_eq!(finding.descriptions(), vec!["expected null value"]);
    }

    #[test]
    fn type_mismatch_reason_names_type() {
        let finding = Finding::body(
            FindingKind::TypeMismatch,
            &key(),
            "a.json",
            &FieldPath::root().field("name"),
        )
        .with_declared_type("string");
        assert_eq!(finding.reason(), "is not string");
        assert_eq!(finding.descriptions(), vec!["is not string: name"]);
    }

    #[test]
    fn status_description_is_two_lines() {
        let finding = Finding::status_mismatch(&key(), "a.json", "200", "404");
        assert_eq!(
            finding.descriptions(),
            vec!["expect status: 200", "actual status: 404"]
        );
        assert_eq!(finding.reason(), "unexpected http status code");
    }

    #[test]
    fn finding_serialization_roundtrip() {
        let finding = Finding::status_mismatch(&key(), "a.json", "200", "500");
        let json = serde_json::to_string(&finding).unwrap();
        let parsed: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(finding, parsed);
    }
}
