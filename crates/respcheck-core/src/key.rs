//! Operation keys shared by the contract index and the fixture loader
//!
//! Both sides derive their join key through [`normalize`], so a contract
//! route and a fixture directory can never disagree on spelling.
//!
//! ```text
//! GET /v1/projects/{id}   → get_id
//! fixtures/get_id/…       → get_id
//! ```

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default path segment elided from every route.
pub const DEFAULT_ELIDE_PREFIX: &str = "/v1/projects";

/// Contract-specific normalization rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRules {
    /// Path segment removed from every route, e.g. `/v1/projects`
    pub elide_prefix: String,
}

impl Default for KeyRules {
    fn default() -> Self {
        Self {
            elide_prefix: DEFAULT_ELIDE_PREFIX.to_string(),
        }
    }
}

impl KeyRules {
    #[must_use]
    pub fn new(elide_prefix: impl Into<String>) -> Self {
        Self {
            elide_prefix: elide_prefix.into(),
        }
    }
}

/// Normalized operation identifier, e.g. `get_id`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Contract side: HTTP method + path template.
    #[must_use]
    pub fn from_route(method: &str, path: &str, rules: &KeyRules) -> Self {
        Self(normalize(&format!("{method}{path}"), rules))
    }

    /// Fixture side: the fixture group directory name.
    #[must_use]
    pub fn from_group(group: &str, rules: &KeyRules) -> Self {
        Self(normalize(group.trim(), rules))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join key between a contract response and a fixture: `{operation}_{status}`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct OperationKey {
    pub operation: OperationId,
    pub status: String,
}

impl OperationKey {
    #[must_use]
    pub fn new(operation: OperationId, status: &str) -> Self {
        Self {
            operation,
            status: status.trim().to_lowercase(),
        }
    }

    /// Bare operation id, i.e. the key without its `_status` suffix.
    #[must_use]
    pub fn api(&self) -> &str {
        self.operation.as_str()
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.operation, self.status)
    }
}

/// Lower-case, `/` → `_`, drop `{`/`}`, drop the elided prefix.
///
/// Idempotent: normalizing an already-normalized id returns it unchanged.
#[must_use]
pub fn normalize(raw: &str, rules: &KeyRules) -> String {
    let flat: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .map(|c| if c == '/' { '_' } else { c })
        .collect();

    let elided = flatten_prefix(&rules.elide_prefix);
    if elided.is_empty() {
        flat
    } else {
        flat.replace(&elided, "")
    }
}

/// `/v1/projects` → `_v1_projects`
fn flatten_prefix(prefix: &str) -> String {
    prefix.trim().to_lowercase().replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_with_path_param() {
        let rules = KeyRules::default();
        let id = OperationId::from_route("GET", "/v1/projects/{id}", &rules);
        assert_eq!(id.as_str(), "get_id");
    }

    #[test]
    fn route_without_prefix() {
        let rules = KeyRules::default();
        let id = OperationId::from_route("post", "/health/check", &rules);
        assert_eq!(id.as_str(), "post_health_check");
    }

    #[test]
    fn nested_params_are_unbraced() {
        let rules = KeyRules::default();
        let id = OperationId::from_route(
            "delete",
            "/v1/projects/{projectId}/members/{memberId}",
            &rules,
        );
        assert_eq!(id.as_str(), "delete_projectid_members_memberid");
    }

    #[test]
    fn group_and_route_agree() {
        let rules = KeyRules::default();
        let route = OperationId::from_route("get", "/v1/projects/{id}/conversions", &rules);
        let group = OperationId::from_group("  GET_id_conversions ", &rules);
        assert_eq!(route, group);
    }

    #[test]
    fn normalize_is_idempotent() {
        let rules = KeyRules::default();
        let once = normalize("put/v1/projects/{id}", &rules);
        assert_eq!(normalize(&once, &rules), once);
    }

    #[test]
    fn empty_prefix_elides_nothing() {
        let rules = KeyRules::new("");
        let id = OperationId::from_route("get", "/v1/projects", &rules);
        assert_eq!(id.as_str(), "get_v1_projects");
    }

    #[test]
    fn key_display_and_api() {
        let rules = KeyRules::default();
        let key = OperationKey::new(OperationId::from_group("get_id", &rules), " 200 ");
        assert_eq!(key.to_string(), "get_id_200");
        assert_eq!(key.api(), "get_id");
    }
}
