//! # Security Query Parameters
//!
//! API keys sent in the query string (`?api_key=...`) are not declared as
//! operation parameters, yet they must not be rejected as unknown query
//! parameters. This module derives, per operation, the names of query
//! parameters that carry `apiKey` credentials.
//!
//! Requirements are taken from the operation when it declares a non-empty
//! `security` list, otherwise from the document. Schemes that are missing
//! from `components.securitySchemes`, are not `apiKey`, or are not located
//! `in: query` contribute nothing. Resolution never fails.
//!
//! ```
//! use openapi_request_validator::security::security_query_params;
//! use openapi_request_validator::spec::{ApiDocument, OperationSchema};
//!
//! let doc = ApiDocument::from_yaml_str(r#"
//! security:
//!   - apiKeyAuth: []
//! components:
//!   securitySchemes:
//!     apiKeyAuth: { type: apiKey, in: query, name: api_key }
//! "#).unwrap();
//!
//! let names = security_query_params(&doc, &OperationSchema::default());
//! assert!(names.contains("api_key"));
//! ```

use crate::spec::{ApiDocument, ApiKeyLocation, OperationSchema, SecurityRequirement, SecurityScheme};
use std::collections::BTreeSet;

/// Requirements in force for `operation`.
pub fn effective_requirements<'a>(
    doc: &'a ApiDocument,
    operation: &'a OperationSchema,
) -> &'a [SecurityRequirement] {
    match operation.security.as_deref() {
        Some(requirements) if !requirements.is_empty() => requirements,
        _ => &doc.security,
    }
}

/// Query parameter names used by `apiKey` schemes for `operation`.
pub fn security_query_params(doc: &ApiDocument, operation: &OperationSchema) -> BTreeSet<String> {
    effective_requirements(doc, operation)
        .iter()
        .flat_map(|requirement| requirement.keys())
        .filter_map(|scheme_name| doc.components.security_schemes.get(scheme_name))
        .filter_map(|scheme| match scheme {
            SecurityScheme::ApiKey {
                name,
                location: ApiKeyLocation::Query,
            } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ApiDocument {
        ApiDocument::from_yaml_str(
            r#"
security:
  - apiKeyAuth: []
components:
  securitySchemes:
    apiKeyAuth: { type: apiKey, in: query, name: api_key }
    headerKey: { type: apiKey, in: header, name: X-API-Key }
    otherQueryKey: { type: apiKey, in: query, name: token }
    bearerAuth: { type: http, scheme: bearer }
"#,
        )
        .unwrap()
    }

    fn op_with(security: &str) -> OperationSchema {
        serde_json::from_str(&format!(r#"{{"security": {}}}"#, security)).unwrap()
    }

    #[test]
    fn test_document_level_fallback() {
        let names = security_query_params(&doc(), &OperationSchema::default());
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["api_key"]);
    }

    #[test]
    fn test_operation_level_overrides() {
        let names = security_query_params(&doc(), &op_with(r#"[{"otherQueryKey": []}]"#));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["token"]);
    }

    #[test]
    fn test_empty_operation_security_falls_back() {
        let names = security_query_params(&doc(), &op_with("[]"));
        assert!(names.contains("api_key"));
    }

    #[test]
    fn test_non_query_and_missing_schemes_ignored() {
        let op = op_with(r#"[{"headerKey": []}, {"bearerAuth": []}, {"missing": []}, {}]"#);
        assert!(security_query_params(&doc(), &op).is_empty());
    }

    #[test]
    fn test_combined_requirement_collects_every_scheme() {
        let op = op_with(r#"[{"apiKeyAuth": [], "otherQueryKey": []}]"#);
        let names = security_query_params(&doc(), &op);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_no_registry() {
        let doc = ApiDocument::default();
        assert!(security_query_params(&doc, &op_with(r#"[{"apiKeyAuth": []}]"#)).is_empty());
    }
}
