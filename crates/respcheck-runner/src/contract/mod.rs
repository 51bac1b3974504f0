//! Contract loading: component registry and expected-schema index

mod index;
mod registry;

use std::path::Path;

pub use index::{ContractIndex, HTTP_METHODS, JSON_CONTENT_TYPE};
pub use registry::ComponentRegistry;

/// Read and parse a YAML or JSON document.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_document(path: &Path) -> Result<serde_json::Value, ContractError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ContractError::Io(format!("Cannot read {}: {e}", path.display())))?;
    parse_document(path, &content)
}

/// Parse a YAML or JSON document. Extension decides; otherwise the content is sniffed.
///
/// # Errors
///
/// Returns error if the content is not valid for the detected format
pub fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value, ContractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse_yaml = |content: &str| -> Result<serde_json::Value, ContractError> {
        serde_yml::from_str(content)
            .map_err(|e| ContractError::Parse(format!("Invalid YAML in {}: {e}", path.display())))
    };
    let parse_json = |content: &str| -> Result<serde_json::Value, ContractError> {
        serde_json::from_str(content)
            .map_err(|e| ContractError::Parse(format!("Invalid JSON in {}: {e}", path.display())))
    };

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ => {
            if content.trim_start().starts_with('{') {
                parse_json(content)
            } else {
                parse_yaml(content)
            }
        }
    }
}

/// Load-time failures. Any of these aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Component {name}: {reason}")]
    Component { name: String, reason: String },
    #[error("Unresolved $ref {reference} in {location}")]
    UnresolvedRef { reference: String, location: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_by_extension() {
        let v = parse_document(Path::new("swagger.json"), r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn parse_yaml_by_extension() {
        let yaml = "openapi: '3.0.0'\npaths: {}\n";
        let v = parse_document(Path::new("swagger.yml"), yaml).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn parse_sniffs_content() {
        let v = parse_document(Path::new("swagger"), r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
        let v = parse_document(Path::new("swagger"), "openapi: '3.0.0'\n").unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn parse_error_names_file() {
        let err = parse_document(Path::new("bad.json"), "{oops").unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn load_missing_file() {
        let err = load_document(Path::new("/nonexistent/swagger.yaml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
