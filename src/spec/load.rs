use super::types::{ApiDocument, OperationSchema, ParameterMeta};
use anyhow::Context;
use http::Method;
use serde_json::Value;
use std::path::Path;

impl ApiDocument {
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Resolve the operation for `method` on the route template `route`.
    ///
    /// Path-item level parameters are merged in; an operation parameter with
    /// the same `(name, in)` replaces the path-item one. `$ref`s to
    /// `#/components/parameters/*` are resolved.
    ///
    /// Returns `Ok(None)` when the route or the method is not declared.
    pub fn operation(&self, method: &Method, route: &str) -> anyhow::Result<Option<OperationSchema>> {
        let Some(item) = self.paths.get(route) else {
            return Ok(None);
        };
        let method_key = method.as_str().to_ascii_lowercase();
        let Some(raw_operation) = item.get(&method_key) else {
            return Ok(None);
        };

        let mut operation: OperationSchema = serde_json::from_value(self.resolve_parameters(raw_operation)?)
            .with_context(|| format!("invalid operation {} {}", method, route))?;

        if let Some(shared) = item.get("parameters") {
            let shared: Vec<ParameterMeta> = serde_json::from_value(self.resolve_parameter_list(shared)?)
                .with_context(|| format!("invalid path parameters for {}", route))?;
            let mut merged: Vec<ParameterMeta> = shared
                .into_iter()
                .filter(|p| {
                    !operation
                        .parameters
                        .iter()
                        .any(|o| o.name == p.name && o.location == p.location)
                })
                .collect();
            merged.append(&mut operation.parameters);
            operation.parameters = merged;
        }

        Ok(Some(operation))
    }

    fn resolve_parameters(&self, raw_operation: &Value) -> anyhow::Result<Value> {
        let mut operation = raw_operation.clone();
        if let Some(params) = operation.get("parameters") {
            let resolved = self.resolve_parameter_list(params)?;
            operation["parameters"] = resolved;
        }
        Ok(operation)
    }

    fn resolve_parameter_list(&self, params: &Value) -> anyhow::Result<Value> {
        let Some(list) = params.as_array() else {
            return Ok(params.clone());
        };
        let mut resolved = Vec::with_capacity(list.len());
        for param in list {
            match param.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    let name = reference
                        .strip_prefix("#/components/parameters/")
                        .with_context(|| format!("unsupported parameter reference {}", reference))?;
                    let target = self
                        .components
                        .other
                        .get("parameters")
                        .and_then(|p| p.get(name))
                        .with_context(|| format!("unresolved parameter reference {}", reference))?;
                    resolved.push(target.clone());
                }
                None => resolved.push(param.clone()),
            }
        }
        Ok(Value::Array(resolved))
    }
}

/// Load an API document from a YAML (`.yaml`/`.yml`) or JSON file.
pub fn load_api_document(file_path: impl AsRef<Path>) -> anyhow::Result<ApiDocument> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    let is_yaml = matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        ApiDocument::from_yaml_str(&content)
    } else {
        ApiDocument::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ParameterLocation, SecurityScheme};

    const DOC: &str = r#"
openapi: 3.0.3
info: { title: Pets, version: "1" }
security:
  - apiKeyAuth: []
paths:
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema: { type: string }
      - $ref: '#/components/parameters/Trace'
    get:
      operationId: get_pet
      parameters:
        - name: id
          in: path
          required: true
          schema: { type: integer }
      responses:
        "200": { description: OK }
components:
  parameters:
    Trace:
      name: X-Trace
      in: header
      schema: { type: string }
  schemas:
    Pet:
      type: object
  securitySchemes:
    apiKeyAuth:
      type: apiKey
      in: query
      name: api_key
    bearer:
      type: http
      scheme: bearer
      description: ignored field
"#;

    #[test]
    fn test_operation_merges_path_parameters() {
        let doc = ApiDocument::from_yaml_str(DOC).unwrap();
        let op = doc.operation(&Method::GET, "/pets/{id}").unwrap().unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("get_pet"));
        assert_eq!(op.parameters.len(), 2);
        assert_eq!(op.parameters[0].name, "X-Trace");
        assert_eq!(op.parameters[0].location, ParameterLocation::Header);
        // the operation's own `id` wins over the path-item declaration
        let id = &op.parameters[1];
        assert_eq!(id.schema.as_ref().unwrap()["type"], "integer");
    }

    #[test]
    fn test_missing_operation() {
        let doc = ApiDocument::from_yaml_str(DOC).unwrap();
        assert!(doc.operation(&Method::DELETE, "/pets/{id}").unwrap().is_none());
        assert!(doc.operation(&Method::GET, "/nope").unwrap().is_none());
    }

    #[test]
    fn test_security_schemes_parsed() {
        let doc = ApiDocument::from_yaml_str(DOC).unwrap();
        assert_eq!(doc.security.len(), 1);
        assert!(matches!(
            doc.components.security_schemes.get("apiKeyAuth"),
            Some(SecurityScheme::ApiKey { name, .. }) if name == "api_key"
        ));
        assert!(doc.components.other.contains_key("schemas"));
    }

    #[test]
    fn test_load_api_document_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"paths": {"/x": {"get": {}}}}"#).unwrap();
        let doc = load_api_document(&path).unwrap();
        assert!(doc.operation(&Method::GET, "/x").unwrap().is_some());
    }

    #[test]
    fn test_load_api_document_missing_file() {
        assert!(load_api_document("/definitely/not/here.yaml").is_err());
    }
}
