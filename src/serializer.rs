//! Serialization module for rendering emitted documents as YAML or JSON.
//!
//! The analyzer never writes files itself; the CLI renders the Swagger document and the
//! graph schema through these functions and persists them with [`write_to_file`].

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use swagger_from_flow::config::DocumentInfo;
/// use swagger_from_flow::openapi_builder::{ApiDocument, SwaggerDocument};
/// use swagger_from_flow::serializer::serialize_yaml;
///
/// let doc = SwaggerDocument::new(ApiDocument::default(), &DocumentInfo::default());
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("basePath: /v1"));
/// ```
pub fn serialize_yaml<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes a document to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and any missing parent directories, or overwrites an existing file.
///
/// # Arguments
///
/// * `content` - The string content to write
/// * `path` - The file path to write to
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentInfo;
    use crate::extractor::{HttpMethod, ParameterLocation};
    use crate::openapi_builder::{
        EndpointDescriptor, EndpointParameter, SchemaAccumulator, SwaggerDocument,
    };
    use crate::schema_generator::{Primitive, Schema};
    use tempfile::TempDir;

    /// Helper function to create a small Swagger document for testing
    fn create_test_document() -> SwaggerDocument {
        let mut accumulator = SchemaAccumulator::new();
        accumulator.record(EndpointDescriptor {
            method: HttpMethod::Get,
            path: "/pet/:id".to_string(),
            parameters: vec![EndpointParameter {
                name: "id".to_string(),
                location: ParameterLocation::Path,
                required: true,
                schema: Schema::Primitive(Primitive::Number),
            }],
            response_schema: Schema::OpaqueObject,
            content_type: "application/json".to_string(),
        });
        let info = DocumentInfo {
            title: "Pet Store".to_string(),
            ..Default::default()
        };
        SwaggerDocument::new(accumulator.emit().api, &info)
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("basePath: /v1"));
        assert!(yaml.contains("title: Pet Store"));
        assert!(yaml.contains("in: path"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["swagger"].as_str(), Some("2.0"));
        assert_eq!(parsed["host"].as_str(), Some("localhost:3000"));
        assert!(parsed["paths"]["/pet/{id}"]["get"].is_mapping());
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        // Pretty-printed
        assert!(json.lines().count() > 5);

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["swagger"], "2.0");
        assert_eq!(parsed["info"]["title"], "Pet Store");
        assert_eq!(
            parsed["paths"]["/pet/{id}"]["get"]["responses"]["200"]["description"],
            "get /pet/{id}"
        );
    }

    #[test]
    fn test_write_to_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/nested/swagger.json");

        write_to_file("{}", &path).unwrap();
        write_to_file("{\"a\": 1}", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_write_to_file_under_a_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("swagger.json");
        write_to_file("{}", &blocker).unwrap();

        let result = write_to_file("{}", &blocker.join("graph.json"));

        assert!(result.is_err());
    }
}
