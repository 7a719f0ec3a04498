mod common;

use http::Method;
use openapi_request_validator::{load_api_document, ParameterLocation, ParameterStyle, SecurityScheme};
use std::io::Write;

fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_document() {
    let file = write_temp(common::PETSTORE, ".yaml");
    let doc = load_api_document(file.path()).unwrap();
    assert!(doc.paths.contains_key("/pets/{id}"));
    assert!(matches!(
        doc.components.security_schemes.get("apiKeyAuth"),
        Some(SecurityScheme::ApiKey { .. })
    ));
    assert!(doc.components.other.contains_key("schemas"));
}

#[test]
fn test_load_json_document() {
    let doc = common::petstore();
    let json = serde_json::to_string(&doc).unwrap();
    let file = write_temp(&json, ".json");
    assert_eq!(load_api_document(file.path()).unwrap(), doc);
}

#[test]
fn test_load_missing_file_fails() {
    let err = load_api_document("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn test_path_level_parameters_are_merged() {
    let doc = common::petstore();
    let op = doc.operation(&Method::GET, "/pets/{id}").unwrap().unwrap();
    let names: Vec<(&str, ParameterLocation)> = op
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    assert_eq!(
        names,
        vec![
            ("id", ParameterLocation::Path),
            ("X-Request-Id", ParameterLocation::Header),
            ("session", ParameterLocation::Cookie),
        ]
    );
    assert_eq!(op.operation_id.as_deref(), Some("getPet"));
}

#[test]
fn test_parameter_refs_and_overrides() {
    let doc = openapi_request_validator::ApiDocument::from_yaml_str(
        r#"
paths:
  /items:
    parameters:
      - { name: limit, in: query, schema: { type: string } }
    get:
      parameters:
        - $ref: '#/components/parameters/Limit'
        - $ref: '#/components/parameters/Ids'
components:
  parameters:
    Limit: { name: limit, in: query, schema: { type: integer } }
    Ids: { name: ids, in: query, style: pipeDelimited, schema: { type: array } }
"#,
    )
    .unwrap();
    let op = doc.operation(&Method::GET, "/items").unwrap().unwrap();
    assert_eq!(op.parameters.len(), 2);
    assert_eq!(op.parameters[0].schema, Some(serde_json::json!({"type": "integer"})));
    assert_eq!(op.parameters[1].effective_style(), ParameterStyle::PipeDelimited);
}

#[test]
fn test_unknown_route_or_method() {
    let doc = common::petstore();
    assert!(doc.operation(&Method::GET, "/nope").unwrap().is_none());
    assert!(doc.operation(&Method::PATCH, "/pets").unwrap().is_none());
}

#[test]
fn test_unresolved_parameter_ref_is_error() {
    let doc = openapi_request_validator::ApiDocument::from_yaml_str(
        "paths:\n  /x:\n    get:\n      parameters:\n        - $ref: '#/components/parameters/Nope'\n",
    )
    .unwrap();
    assert!(doc.operation(&Method::GET, "/x").is_err());
}
