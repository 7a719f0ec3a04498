//! # Schema Composition
//!
//! Builds the composite schema that validates a whole request in one pass.
//!
//! An operation's parameters are partitioned by location into four object
//! schemas (`query`, `headers`, `params`, `cookies`) keyed by parameter name,
//! and the request body schema selected for the request's content type
//! becomes `body`. The result is wrapped in a root object schema:
//!
//! ```json
//! {
//!   "type": "object",
//!   "required": ["query", "headers", "params", "body"],
//!   "properties": {
//!     "query":   { "type": "object", "properties": { "limit": { "type": "integer" } } },
//!     "headers": { "type": "object", "properties": {} },
//!     "params":  { "type": "object", "properties": { "id": { "type": "string" } }, "required": ["id"] },
//!     "cookies": { "type": "object", "properties": {} },
//!     "body":    { "$ref": "#/components/schemas/Pet" }
//!   },
//!   "components": { "schemas": { "Pet": { "type": "object" } } }
//! }
//! ```
//!
//! The document's `components` (and `paths`) ride along at the root so local
//! `$ref`s resolve. Parameter schemas are additionally expanded inline, since
//! the mutator reads their `type`, `properties` and `default` directly. OpenAPI
//! 3.0 keywords (`nullable`, boolean `exclusiveMinimum`/`exclusiveMaximum`) are
//! rewritten into their 2020-12 form across the whole root.
//!
//! Composition is deterministic: the same operation and content type always
//! produce an equal [`CompositeRequestSchema`].

mod body;
mod dialect;
mod refs;

pub use body::{select_body_schema, BodySchema};
pub use dialect::normalize_schema;
pub use refs::{expand_schema_refs, resolve_schema_ref};

use crate::content_type::ContentType;
use crate::error::HttpError;
use crate::spec::{ApiDocument, OperationSchema, ParameterLocation, ParameterMeta};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Validation schema for every part of a request to one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRequestSchema {
    pub query: Value,
    pub headers: Value,
    pub params: Value,
    pub cookies: Value,
    pub body: Value,
    /// Top-level required parts; always `query`, `headers`, `params`
    pub required: Vec<String>,
    /// Query parameters declared with `allowEmptyValue: true`
    pub allow_empty_query: BTreeSet<String>,
    /// Parameters in declaration order, for the mutator
    pub parameters: Vec<ParameterMeta>,
    pub binary_body: bool,
}

impl CompositeRequestSchema {
    /// Declared query parameter names.
    pub fn query_names(&self) -> BTreeSet<String> {
        self.query
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Root JSON schema handed to the evaluator.
    pub fn to_json_schema(&self, doc: &ApiDocument) -> Value {
        let mut root = Map::new();
        root.insert("type".to_string(), json!("object"));
        root.insert("required".to_string(), json!(self.required));
        root.insert(
            "properties".to_string(),
            json!({
                "query": self.query,
                "headers": self.headers,
                "params": self.params,
                "cookies": self.cookies,
                "body": self.body,
            }),
        );
        if !doc.components.other.is_empty() {
            root.insert(
                "components".to_string(),
                Value::Object(doc.components.other.clone()),
            );
        }
        if !doc.paths.is_empty() {
            root.insert("paths".to_string(), Value::Object(doc.paths.clone()));
        }
        let mut root = Value::Object(root);
        normalize_schema(&mut root);
        root
    }
}

/// Composes [`CompositeRequestSchema`]s for operations of one document.
#[derive(Debug, Clone, Copy)]
pub struct SchemaComposer {
    require_binary_body: bool,
}

impl SchemaComposer {
    pub fn new() -> Self {
        Self {
            require_binary_body: false,
        }
    }

    /// Enforce presence of a required `format: binary` body. Off by default:
    /// binary bodies are then excluded from validation entirely.
    pub fn require_binary_body(mut self, require: bool) -> Self {
        self.require_binary_body = require;
        self
    }

    /// Compose the request schema for `operation` as reached through `route`.
    ///
    /// `doc` resolves `#/components/...` references in parameter schemas.
    pub fn compose(
        &self,
        doc: &ApiDocument,
        route: &str,
        operation: &OperationSchema,
        content_type: &ContentType,
    ) -> Result<CompositeRequestSchema, HttpError> {
        let mut body = select_body_schema(route, operation.request_body.as_ref(), content_type)?;
        normalize_schema(&mut body.schema);
        let parameters = resolve_parameters(doc, &operation.parameters);

        let mut required = vec!["query".to_string(), "headers".to_string(), "params".to_string()];
        if body.required && (!body.binary || self.require_binary_body) {
            required.push("body".to_string());
        }

        let allow_empty_query = parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Query && p.allow_empty_value)
            .map(|p| p.name.clone())
            .collect();

        Ok(CompositeRequestSchema {
            query: location_schema(&parameters, ParameterLocation::Query),
            headers: location_schema(&parameters, ParameterLocation::Header),
            params: location_schema(&parameters, ParameterLocation::Path),
            cookies: location_schema(&parameters, ParameterLocation::Cookie),
            body: if body.binary { json!({}) } else { body.schema },
            required,
            allow_empty_query,
            parameters,
            binary_body: body.binary,
        })
    }
}

impl Default for SchemaComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters with `$ref`s expanded and OpenAPI 3.0 keywords normalized.
fn resolve_parameters(doc: &ApiDocument, parameters: &[ParameterMeta]) -> Vec<ParameterMeta> {
    parameters
        .iter()
        .cloned()
        .map(|mut param| {
            let schemas = param
                .schema
                .iter_mut()
                .chain(param.content.values_mut().filter_map(|m| m.schema.as_mut()));
            for schema in schemas {
                expand_schema_refs(doc, schema);
                normalize_schema(schema);
            }
            param
        })
        .collect()
}

fn location_schema(parameters: &[ParameterMeta], location: ParameterLocation) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in parameters.iter().filter(|p| p.location == location) {
        let schema = param.effective_schema().cloned().unwrap_or_else(|| json!({}));
        properties.insert(param.key(), schema);
        if param.required {
            required.push(Value::String(param.key()));
        }
    }
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}
