//! Named component schemas loaded from the component index
//!
//! The index maps each component name to a file reference:
//!
//! ```yaml
//! schemas:
//!   Project:
//!     $ref: ./schemas/project.yaml
//! ```
//!
//! Referenced files are resolved relative to the index file's directory.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use respcheck_core::RefResolver;

use super::{ContractError, load_document};

/// `name → raw schema`, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Value>,
}

impl ComponentRegistry {
    /// Load every component listed in the index at `index_path`.
    ///
    /// An absent index yields an empty registry.
    ///
    /// # Errors
    ///
    /// Returns error if the index or any file it references is missing or unparsable
    pub fn load(index_path: &Path) -> Result<Self, ContractError> {
        if !index_path.exists() {
            tracing::debug!(path = %index_path.display(), "no component index, registry is empty");
            return Ok(Self::default());
        }

        let index = load_document(index_path)?;
        let base = index_path.parent().unwrap_or_else(|| Path::new("."));

        let Some(schemas) = index.get("schemas").and_then(Value::as_object) else {
            tracing::debug!(path = %index_path.display(), "component index lists no schemas");
            return Ok(Self::default());
        };

        let mut components = HashMap::with_capacity(schemas.len());
        for (name, entry) in schemas {
            let reference = entry.get("$ref").and_then(Value::as_str).ok_or_else(|| {
                ContractError::Component {
                    name: name.clone(),
                    reason: "entry has no $ref".into(),
                }
            })?;
            let relative = reference.strip_prefix("./").unwrap_or(reference);
            let path = base.join(relative);
            let schema = load_document(&path).map_err(|e| ContractError::Component {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            tracing::debug!(component = %name, path = %path.display(), "loaded component");
            components.insert(name.clone(), schema);
        }

        Ok(Self { components })
    }

    /// Registry over already-parsed components.
    #[must_use]
    pub fn from_components(components: HashMap<String, Value>) -> Self {
        Self { components }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.components.get(name)
    }

    /// Component names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl RefResolver for ComponentRegistry {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}
