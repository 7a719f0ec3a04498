//! # Request Validator
//!
//! Validates inbound requests against the operation the router resolved.
//!
//! ## Flow
//!
//! ```text
//! ApiRequest
//!   ├─ no route metadata ─────────────► PassThrough
//!   ├─ no route template ─────────────► 404 NotFound
//!   ├─ no operation for method ───────► 405 MethodNotAllowed
//!   └─ cache.get_or_build(method, route, content type)
//!        ├─ compose schema (415 on unmatched content type)
//!        ├─ compile schema (500 on failure, not cached)
//!        └─ CompiledRequestValidator::run
//!             ├─ RequestValues::from_request
//!             ├─ ParameterMutator::mutate
//!             ├─ QueryWhitelist::enforce (400, first violation)
//!             └─ schema evaluation (400, every violation)
//! ```
//!
//! A successful validation yields the normalized [`RequestValues`] so the
//! caller can hand typed parameters to its handler.

use crate::content_type::ContentType;
use crate::error::{FieldError, HttpError};
use crate::mutator::ParameterMutator;
use crate::request::{ApiRequest, RequestValues};
use crate::runtime_config::RequestValidatorOptions;
use crate::schema::{CompositeRequestSchema, SchemaComposer};
use crate::security::security_query_params;
use crate::spec::{ApiDocument, OperationSchema};
use crate::validator_cache::{CacheKey, ValidatorCache};
use crate::whitelist::QueryWhitelist;
use jsonschema::Validator;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of a validation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The request carried no route metadata and was not inspected
    PassThrough,
    /// The request satisfied its operation's contract
    Valid(RequestValues),
}

impl ValidationOutcome {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, ValidationOutcome::PassThrough)
    }

    /// Normalized values, if the request was validated.
    pub fn values(&self) -> Option<&RequestValues> {
        match self {
            ValidationOutcome::Valid(values) => Some(values),
            ValidationOutcome::PassThrough => None,
        }
    }
}

/// Everything needed to validate requests for one
/// `(method, route, content type)` combination.
pub struct CompiledRequestValidator {
    key: CacheKey,
    composite: CompositeRequestSchema,
    schema: Validator,
    whitelist: QueryWhitelist,
}

impl fmt::Debug for CompiledRequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRequestValidator")
            .field("key", &self.key.to_string())
            .field("composite", &self.composite)
            .field("whitelist", &self.whitelist)
            .finish_non_exhaustive()
    }
}

impl CompiledRequestValidator {
    /// Compose and compile the validator for `operation`.
    pub fn build(
        doc: &ApiDocument,
        key: CacheKey,
        operation: &OperationSchema,
        content_type: &ContentType,
        options: &RequestValidatorOptions,
    ) -> Result<Self, HttpError> {
        let composite = SchemaComposer::new()
            .require_binary_body(options.require_binary_body)
            .compose(doc, &key.route, operation, content_type)?;

        let root = composite.to_json_schema(doc);
        let schema = jsonschema::validator_for(&root).map_err(|e| {
            error!(cache_key = %key, error = %e, "Failed to compile request schema");
            HttpError::internal_server_error(
                key.route.clone(),
                format!("failed to compile request schema: {}", e),
            )
        })?;

        let security = security_query_params(doc, operation);
        let whitelist = QueryWhitelist::new(
            composite.query_names(),
            &security,
            composite.allow_empty_query.clone(),
            options.allow_unknown_query_parameters,
        );

        debug!(
            cache_key = %key,
            parameter_count = composite.parameters.len(),
            security_query_params = security.len(),
            binary_body = composite.binary_body,
            "Request validator built"
        );

        Ok(Self {
            key,
            composite,
            schema,
            whitelist,
        })
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn composite(&self) -> &CompositeRequestSchema {
        &self.composite
    }

    pub fn whitelist(&self) -> &QueryWhitelist {
        &self.whitelist
    }

    /// Normalize and validate `req`.
    pub fn run(&self, req: &ApiRequest) -> Result<RequestValues, HttpError> {
        let path_params = req
            .route
            .as_ref()
            .map(|r| r.path_params.clone())
            .unwrap_or_default();
        let raw = RequestValues::from_request(req);
        let values = ParameterMutator::new(&self.composite.parameters).mutate(raw, &path_params);

        self.whitelist.enforce(&values.query)?;

        let instance = values.to_instance();
        let errors: Vec<FieldError> = self
            .schema
            .iter_errors(&instance)
            .map(|e| FieldError::from_validation_error(&e))
            .collect();
        if !errors.is_empty() {
            debug!(
                cache_key = %self.key,
                error_count = errors.len(),
                "Request failed schema validation"
            );
            return Err(HttpError::from_field_errors(req.path.clone(), errors));
        }
        Ok(values)
    }
}

/// Validates requests against an [`ApiDocument`].
///
/// Cloning is cheap; clones share the document and the validator cache.
///
/// # Example
///
/// ```rust
/// use openapi_request_validator::{ApiDocument, ApiRequest, RequestValidator, RouteMatch};
/// use openapi_request_validator::runtime_config::RequestValidatorOptions;
/// use http::Method;
/// use std::sync::Arc;
///
/// let doc = ApiDocument::from_yaml_str(r#"
/// paths:
///   /pets:
///     get:
///       parameters:
///         - { name: limit, in: query, schema: { type: integer } }
/// "#).unwrap();
/// let op = Arc::new(doc.operation(&Method::GET, "/pets").unwrap().unwrap());
/// let validator = RequestValidator::new(doc, RequestValidatorOptions::default());
///
/// let ok = ApiRequest::new(Method::GET, "/pets?limit=5")
///     .with_route(RouteMatch::new("/pets", op.clone()));
/// assert!(validator.validate(&ok).is_ok());
///
/// let bad = ApiRequest::new(Method::GET, "/pets?limit=5&foo=1")
///     .with_route(RouteMatch::new("/pets", op));
/// assert_eq!(validator.validate(&bad).unwrap_err().path(), ".query.foo");
/// ```
#[derive(Debug, Clone)]
pub struct RequestValidator {
    doc: Arc<ApiDocument>,
    options: RequestValidatorOptions,
    cache: ValidatorCache<CompiledRequestValidator>,
}

impl RequestValidator {
    pub fn new(doc: ApiDocument, options: RequestValidatorOptions) -> Self {
        info!(
            allow_unknown_query_parameters = options.allow_unknown_query_parameters,
            schema_cache = options.schema_cache,
            require_binary_body = options.require_binary_body,
            "Request validator created"
        );
        Self {
            doc: Arc::new(doc),
            cache: ValidatorCache::new(options.schema_cache),
            options,
        }
    }

    /// Create a validator configured from `OARV_*` environment variables.
    pub fn from_env(doc: ApiDocument) -> Self {
        Self::new(doc, RequestValidatorOptions::from_env())
    }

    pub fn document(&self) -> &ApiDocument {
        &self.doc
    }

    pub fn options(&self) -> &RequestValidatorOptions {
        &self.options
    }

    pub fn cache(&self) -> &ValidatorCache<CompiledRequestValidator> {
        &self.cache
    }

    /// Validate `req` against its resolved operation.
    pub fn validate(&self, req: &ApiRequest) -> Result<ValidationOutcome, HttpError> {
        let Some(route_match) = req.route.as_ref() else {
            debug!(method = %req.method, path = %req.path, "No route metadata, skipping validation");
            return Ok(ValidationOutcome::PassThrough);
        };
        let Some(route) = route_match.route.as_deref() else {
            return Err(HttpError::not_found(req.path.clone(), "not found"));
        };
        let Some(operation) = route_match.operation.as_ref() else {
            return Err(HttpError::method_not_allowed(
                req.path.clone(),
                format!("{} method not allowed", req.method),
            ));
        };

        self.compiled_for(req, route, operation)
            .and_then(|validator| validator.run(req))
            .map(ValidationOutcome::Valid)
            .map_err(|err| {
                debug!(
                    method = %req.method,
                    status = err.status(),
                    path = %err.path(),
                    "Request rejected"
                );
                err
            })
    }

    /// The cached (or freshly built) validator for `req`'s operation.
    pub fn compiled_for(
        &self,
        req: &ApiRequest,
        route: &str,
        operation: &OperationSchema,
    ) -> Result<Arc<CompiledRequestValidator>, HttpError> {
        let content_type = ContentType::from_headers(&req.headers);
        let key = CacheKey::new(req.method.clone(), route, content_type.family());
        self.cache.get_or_build(&key, || {
            CompiledRequestValidator::build(&self.doc, key.clone(), operation, &content_type, &self.options)
        })
    }
}
