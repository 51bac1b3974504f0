//! Flatten `paths → method → responses → status → content` into an expected-schema index

use std::path::Path;

use serde_json::{Map, Value};

use respcheck_core::schema::SchemaError;
use respcheck_core::{ExpectedSchemaIndex, KeyRules, OperationId, OperationKey, RefResolver, Schema};

use super::{ComponentRegistry, ContractError, load_document};

/// Path-item keys treated as operations.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "head", "options", "trace",
];

/// The only response media type whose schema is compared.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Expected-schema index built from one contract document.
#[derive(Debug, Clone, Default)]
pub struct ContractIndex {
    pub entries: ExpectedSchemaIndex,
    /// Keys declared more than once; the last declaration was kept.
    pub replaced: Vec<String>,
}

/// Resolves `$ref` through the registry, then the document's own `components.schemas`.
struct DocumentRefs<'a> {
    registry: &'a ComponentRegistry,
    local: Option<&'a Map<String, Value>>,
}

impl RefResolver for DocumentRefs<'_> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.registry
            .resolve(name)
            .or_else(|| self.local.and_then(|schemas| schemas.get(name)))
    }
}

impl ContractIndex {
    /// Load the contract at `contract_path` and the components listed at `component_index`.
    ///
    /// # Errors
    ///
    /// Returns error if either file is unreadable or a `$ref` cannot be resolved
    pub fn load(
        contract_path: &Path,
        component_index: &Path,
        rules: &KeyRules,
    ) -> Result<Self, ContractError> {
        let registry = ComponentRegistry::load(component_index)?;
        tracing::debug!(components = ?registry.names(), "component registry ready");
        let document = load_document(contract_path)?;
        Self::build(&document, &registry, rules)
    }

    /// Build the index from a parsed contract document.
    ///
    /// # Errors
    ///
    /// Returns error if the document has no `paths` object or a `$ref` cannot be resolved
    pub fn build(
        document: &Value,
        registry: &ComponentRegistry,
        rules: &KeyRules,
    ) -> Result<Self, ContractError> {
        let paths = document
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| ContractError::Parse("contract has no `paths` object".into()))?;

        let refs = DocumentRefs {
            registry,
            local: document
                .pointer("/components/schemas")
                .and_then(Value::as_object),
        };

        let mut contract = Self::default();

        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for (method, operation) in item {
                let method = method.to_ascii_lowercase();
                if !HTTP_METHODS.contains(&method.as_str()) {
                    continue;
                }
                let id = OperationId::from_route(&method, path, rules);
                let Some(responses) = operation.get("responses").and_then(Value::as_object)
                else {
                    tracing::debug!(operation = %id, "operation declares no responses");
                    continue;
                };

                for (status, response) in responses {
                    let key = OperationKey::new(id.clone(), status);
                    let schema = expected_schema(response, &refs)
                        .map_err(|e| schema_error(e, &key))?;
                    if contract.entries.insert(key.clone(), schema) {
                        tracing::debug!(key = %key, "duplicate contract entry, keeping the last");
                        contract.replaced.push(key.to_string());
                    }
                }
            }
        }

        tracing::debug!(entries = contract.entries.len(), "built contract index");
        Ok(contract)
    }
}

/// Schema for one response; `None` when it declares no JSON body.
fn expected_schema(
    response: &Value,
    refs: &dyn RefResolver,
) -> Result<Option<Schema>, SchemaError> {
    let Some(node) = response
        .get("content")
        .and_then(|content| content.get(JSON_CONTENT_TYPE))
        .and_then(|media| media.get("schema"))
    else {
        return Ok(None);
    };

    if node.get("$ref").is_some() {
        return Schema::from_value(node, refs).map(Some);
    }

    let mut node = node.clone();
    coerce_items(&mut node);
    Schema::from_value(&node, refs).map(Some)
}

/// A `properties.items` node is always a list; force `type: array` unless it is a `$ref`.
fn coerce_items(schema: &mut Value) {
    let Some(items) = schema
        .get_mut("properties")
        .and_then(|props| props.get_mut("items"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    let is_array = items.get("type").and_then(Value::as_str) == Some("array");
    if !is_array && !items.contains_key("$ref") {
        items.insert("type".into(), Value::String("array".into()));
    }
}

fn schema_error(error: SchemaError, key: &OperationKey) -> ContractError {
    match error {
        SchemaError::UnresolvedRef(reference) => ContractError::UnresolvedRef {
            reference,
            location: key.to_string(),
        },
        SchemaError::RefDepth(reference) => {
            ContractError::Parse(format!("$ref chain too deep at {reference} in {key}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn key(group: &str, status: &str) -> OperationKey {
        OperationKey::new(OperationId::from_group(group, &KeyRules::default()), status)
    }

    fn build(document: &Value) -> ContractIndex {
        ContractIndex::build(document, &ComponentRegistry::default(), &KeyRules::default())
            .unwrap()
    }

    #[test]
    fn inline_schema_keyed_by_normalized_route() {
        let doc = json!({
            "paths": {
                "/v1/projects/{id}": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {"id": {"type": "string"}}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        let schema = contract.entries.expected(&key("get_id", "200")).unwrap();
        assert_eq!(
            schema.property("id"),
            Some(&Schema::Scalar { ty: "string".into() })
        );
    }

    #[test]
    fn non_json_and_missing_content_are_bodiless() {
        let doc = json!({
            "paths": {
                "/items": {
                    "delete": {"responses": {"204": {"description": "gone"}}},
                    "get": {
                        "responses": {
                            "200": {"content": {"text/plain": {"schema": {"type": "string"}}}}
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        assert_eq!(contract.entries.get(&key("delete_items", "204")), Some(None));
        assert_eq!(contract.entries.get(&key("get_items", "200")), Some(None));
    }

    #[test]
    fn ref_resolved_through_registry() {
        let registry = ComponentRegistry::from_components(HashMap::from([(
            "Project".to_string(),
            json!({"properties": {"name": {"type": "string"}}}),
        )]));
        let doc = json!({
            "paths": {
                "/v1/projects": {
                    "post": {
                        "responses": {
                            "201": {
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/Project"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let contract = ContractIndex::build(&doc, &registry, &KeyRules::default()).unwrap();
        let schema = contract.entries.expected(&key("post", "201")).unwrap();
        assert!(schema.property("name").is_some());
    }

    #[test]
    fn ref_falls_back_to_document_components() {
        let doc = json!({
            "components": {"schemas": {"Tag": {"type": "string"}}},
            "paths": {
                "/tags": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {"schema": {"$ref": "#/components/schemas/Tag"}}
                                }
                            }
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        assert_eq!(
            contract.entries.expected(&key("get_tags", "200")),
            Some(&Schema::Scalar { ty: "string".into() })
        );
    }

    #[test]
    fn unresolved_ref_is_fatal() {
        let doc = json!({
            "paths": {
                "/x": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {"schema": {"$ref": "#/components/schemas/Nope"}}
                                }
                            }
                        }
                    }
                }
            }
        });
        let err = ContractIndex::build(&doc, &ComponentRegistry::default(), &KeyRules::default())
            .unwrap_err();
        match err {
            ContractError::UnresolvedRef { reference, location } => {
                assert_eq!(reference, "#/components/schemas/Nope");
                assert_eq!(location, "get_x_200");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn untyped_items_property_becomes_array() {
        let doc = json!({
            "paths": {
                "/list": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "properties": {
                                                "items": {"items": {"type": "integer"}}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        let schema = contract.entries.expected(&key("get_list", "200")).unwrap();
        assert_eq!(
            schema.property("items"),
            Some(&Schema::Array {
                items: Some(Box::new(Schema::Scalar { ty: "integer".into() }))
            })
        );
    }

    #[test]
    fn typed_items_property_becomes_array() {
        let doc = json!({
            "paths": {
                "/list": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "properties": {
                                                "items": {"type": "object", "items": {"type": "integer"}},
                                                "owner": {"type": "object", "properties": {"items": {"type": "string"}}}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        let schema = contract.entries.expected(&key("get_list", "200")).unwrap();
        assert_eq!(
            schema.property("items"),
            Some(&Schema::Array {
                items: Some(Box::new(Schema::Scalar { ty: "integer".into() }))
            })
        );
        // only the top-level `properties.items` is rewritten
        assert_eq!(
            schema.property("owner").and_then(|owner| owner.property("items")),
            Some(&Schema::Scalar { ty: "string".into() })
        );
    }

    #[test]
    fn non_method_keys_ignored() {
        let doc = json!({
            "paths": {
                "/x": {
                    "parameters": [{"name": "id", "in": "query"}],
                    "summary": "x",
                    "GET": {"responses": {"200": {}}}
                }
            }
        });
        let contract = build(&doc);
        assert_eq!(contract.entries.keys().len(), 1);
        assert!(contract.entries.contains(&key("get_x", "200")));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let doc = json!({
            "paths": {
                "/v1/projects/{id}": {"get": {"responses": {"200": {}}}},
                "/{id}": {
                    "get": {
                        "responses": {
                            "200": {"content": {"application/json": {"schema": {"type": "string"}}}}
                        }
                    }
                }
            }
        });
        let contract = build(&doc);
        assert_eq!(contract.replaced, ["get_id_200"]);
        assert_eq!(
            contract.entries.expected(&key("get_id", "200")),
            Some(&Schema::Scalar { ty: "string".into() })
        );
    }

    #[test]
    fn missing_paths_is_an_error() {
        let err = ContractIndex::build(&json!({}), &ComponentRegistry::default(), &KeyRules::default())
            .unwrap_err();
        assert!(matches!(err, ContractError::Parse(_)));
    }
}
