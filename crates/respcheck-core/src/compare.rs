//! Structural comparator: expected schema vs actual JSON body
//!
//! Pure. Each call returns its own findings; callers concatenate. The only
//! error is [`CompareError::Unhandled`], raised when the walk exceeds its depth
//! limit, and it aborts the one fixture being compared.

use serde_json::{Map, Value};

use crate::finding::{FieldPath, Finding, FindingKind};
use crate::key::OperationKey;
use crate::schema::Schema;

/// Nesting depth at which a body is rejected instead of walked.
const MAX_DEPTH: u32 = 64;

/// Identifies the fixture whose body is being compared.
#[derive(Debug, Clone, Copy)]
pub struct CompareContext<'a> {
    pub operation: &'a OperationKey,
    pub fixture_file: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("unhandled error in {operation}/{file}")]
    Unhandled { operation: String, file: String },
}

/// Compare one fixture body against the schema the contract declares for it.
///
/// `expected == None` means the contract declares no body. A missing body is
/// passed as `Value::Null`.
///
/// # Errors
///
/// Returns [`CompareError::Unhandled`] if the body nests deeper than the walker allows.
pub fn compare(
    expected: Option<&Schema>,
    actual: &Value,
    ctx: &CompareContext<'_>,
) -> Result<Vec<Finding>, CompareError> {
    Walker { ctx }.walk(expected, actual, &FieldPath::root(), 0)
}

/// Runtime type tag of a JSON value.
#[must_use]
pub const fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Integer test by truncation: any number without a fractional part.
#[must_use]
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.trunc() == f),
        _ => false,
    }
}

/// `null`, `false`, zero, or the empty string.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Falsy, or an empty array.
fn is_empty(value: &Value) -> bool {
    is_falsy(value) || value.as_array().is_some_and(Vec::is_empty)
}

struct Walker<'a> {
    ctx: &'a CompareContext<'a>,
}

impl Walker<'_> {
    fn finding(&self, kind: FindingKind, path: &FieldPath) -> Finding {
        Finding::body(kind, self.ctx.operation, self.ctx.fixture_file, path)
    }

    fn walk(
        &self,
        expected: Option<&Schema>,
        actual: &Value,
        path: &FieldPath,
        depth: u32,
    ) -> Result<Vec<Finding>, CompareError> {
        if depth > MAX_DEPTH {
            return Err(CompareError::Unhandled {
                operation: self.ctx.operation.to_string(),
                file: self.ctx.fixture_file.to_string(),
            });
        }

        // Base cases, first match wins.
        if expected.is_none() && is_empty(actual) {
            return Ok(Vec::new());
        }
        if let Some(Schema::Scalar { ty }) = expected {
            if ty != "object" && ty == type_tag(actual) {
                return Ok(Vec::new());
            }
        }
        if let Some(Schema::Any) = expected {
            return Ok(Vec::new());
        }
        let Some(schema) = expected else {
            return Ok(vec![self.finding(FindingKind::UnexpectedNull, path)]);
        };
        if is_falsy(actual) {
            return Ok(vec![self.finding(FindingKind::MissingRequiredValue, path)]);
        }

        match schema {
            Schema::Object { properties } => match actual.as_object() {
                Some(fields) => self.object(properties, fields, path, depth),
                None => Ok(vec![self.type_mismatch("object", path)]),
            },
            other => self.value(other, actual, path, depth),
        }
    }

    fn object(
        &self,
        properties: &[(String, Schema)],
        fields: &Map<String, Value>,
        path: &FieldPath,
        depth: u32,
    ) -> Result<Vec<Finding>, CompareError> {
        let mut findings: Vec<Finding> = fields
            .keys()
            .filter(|key| !properties.iter().any(|(name, _)| name == *key))
            .map(|key| self.finding(FindingKind::RedundantProperty, &path.field(key)))
            .collect();

        for (name, detail) in properties {
            let field_path = path.field(name);
            let Some(value) = fields.get(name) else {
                findings.push(self.finding(FindingKind::MissingProperty, &field_path));
                continue;
            };

            match (detail, value) {
                (Schema::Object { .. }, Value::Array(elements)) => {
                    for (idx, element) in elements.iter().enumerate() {
                        findings.extend(self.walk(
                            Some(detail),
                            element,
                            &field_path.index(idx),
                            depth + 1,
                        )?);
                    }
                }
                (Schema::Object { .. }, _) => {
                    findings.extend(self.walk(Some(detail), value, &field_path, depth + 1)?);
                }
                (_, Value::Null) => {}
                _ => findings.extend(self.value(detail, value, &field_path, depth)?),
            }
        }

        Ok(findings)
    }

    /// Type check of a single value against a non-object schema.
    fn value(
        &self,
        schema: &Schema,
        value: &Value,
        path: &FieldPath,
        depth: u32,
    ) -> Result<Vec<Finding>, CompareError> {
        let finding = match schema {
            Schema::Array { items } => {
                let Some(elements) = value.as_array() else {
                    return Ok(vec![self.finding(FindingKind::NotArray, path)]);
                };
                let Some(items) = items.as_deref() else {
                    return Ok(Vec::new());
                };
                let mut findings = Vec::new();
                for (idx, element) in elements.iter().enumerate() {
                    findings.extend(self.walk(Some(items), element, &path.index(idx), depth + 1)?);
                }
                return Ok(findings);
            }
            Schema::Scalar { ty } if ty == "float" => {
                (!value.is_number()).then(|| self.finding(FindingKind::NotFloat, path))
            }
            Schema::Scalar { ty } if ty == "integer" => {
                (!is_integer(value)).then(|| self.finding(FindingKind::NotInteger, path))
            }
            Schema::Scalar { ty } => (type_tag(value) != ty).then(|| self.type_mismatch(ty, path)),
            Schema::Object { .. } => return self.walk(Some(schema), value, path, depth + 1),
            Schema::Any => None,
        };
        Ok(finding.into_iter().collect())
    }

    fn type_mismatch(&self, ty: &str, path: &FieldPath) -> Finding {
        self.finding(FindingKind::TypeMismatch, path).with_declared_type(ty)
    }
}
