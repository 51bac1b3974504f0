//! Flat lookup from operation key to expected schema

use std::collections::HashMap;

use crate::key::OperationKey;
use crate::schema::Schema;

/// `{operation}_{status}` → expected schema, `None` for bodiless responses.
///
/// Built once per run by the contract index builder, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExpectedSchemaIndex {
    entries: HashMap<OperationKey, Option<Schema>>,
}

impl ExpectedSchemaIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A duplicate key overwrites the earlier one.
    ///
    /// Returns `true` if an entry was replaced.
    pub fn insert(&mut self, key: OperationKey, schema: Option<Schema>) -> bool {
        self.entries.insert(key, schema).is_some()
    }

    /// `Some(None)` for a declared bodiless response, `None` for an undeclared key.
    #[must_use]
    pub fn get(&self, key: &OperationKey) -> Option<Option<&Schema>> {
        self.entries.get(key).map(Option::as_ref)
    }

    /// Expected schema; undeclared keys are treated as bodiless.
    #[must_use]
    pub fn expected(&self, key: &OperationKey) -> Option<&Schema> {
        self.get(key).flatten()
    }

    #[must_use]
    pub fn contains(&self, key: &OperationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&OperationKey> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
