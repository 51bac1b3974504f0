//! Expected-shape schema model
//!
//! Only `type`, `properties`, `items` and `$ref` are honored. Everything else
//! a contract may declare (`required`, `enum`, `oneOf`, formats, ranges) is
//! ignored on purpose.

use std::collections::HashMap;

use serde_json::Value;

/// `$ref` hops allowed before a reference chain is treated as cyclic.
const MAX_REF_DEPTH: u32 = 20;

/// A resolved expected-shape schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// `properties` present; `type` is implied and never re-checked.
    Object { properties: Vec<(String, Schema)> },
    /// `type: array`, one `items` schema for every element.
    Array { items: Option<Box<Schema>> },
    /// Any other declared `type`: `string`, `integer`, `float`, `boolean`, ...
    Scalar { ty: String },
    /// No `type` and no `properties`; accepts anything.
    Any,
}

/// Source of named component schemas for `$ref` resolution.
pub trait RefResolver {
    /// Raw schema node registered under `name`.
    fn resolve(&self, name: &str) -> Option<&Value>;
}

impl RefResolver for HashMap<String, Value> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Resolver for documents that must not contain `$ref`.
pub struct NoRefs;

impl RefResolver for NoRefs {
    fn resolve(&self, _name: &str) -> Option<&Value> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unresolved $ref: {0}")]
    UnresolvedRef(String),
    #[error("$ref chain too deep (cyclic?) at {0}")]
    RefDepth(String),
}

impl Schema {
    /// Build a schema from a raw JSON/YAML node, resolving `$ref` through `refs`.
    ///
    /// # Errors
    ///
    /// Returns error if a `$ref` names an unknown component or the reference
    /// chain exceeds the depth limit.
    pub fn from_value(value: &Value, refs: &dyn RefResolver) -> Result<Self, SchemaError> {
        build(value, refs, 0)
    }

    /// Property list of an object schema, `None` for every other variant.
    #[must_use]
    pub fn properties(&self) -> Option<&[(String, Schema)]> {
        match self {
            Self::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Declared property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }
}

/// Trailing segment of a reference: `#/components/schemas/Project` → `Project`.
#[must_use]
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn build(value: &Value, refs: &dyn RefResolver, depth: u32) -> Result<Schema, SchemaError> {
    let Some(obj) = value.as_object() else {
        return Ok(Schema::Any);
    };

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        if depth >= MAX_REF_DEPTH {
            return Err(SchemaError::RefDepth(reference.to_string()));
        }
        let target = refs
            .resolve(ref_name(reference))
            .ok_or_else(|| SchemaError::UnresolvedRef(reference.to_string()))?;
        return build(target, refs, depth + 1);
    }

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        let properties = props
            .iter()
            .map(|(name, node)| Ok((name.clone(), build(node, refs, depth)?)))
            .collect::<Result<Vec<_>, SchemaError>>()?;
        return Ok(Schema::Object { properties });
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = obj
                .get("items")
                .map(|node| build(node, refs, depth).map(Box::new))
                .transpose()?;
            Ok(Schema::Array { items })
        }
        Some(ty) => Ok(Schema::Scalar { ty: ty.to_string() }),
        None => Ok(Schema::Any),
    }
}
