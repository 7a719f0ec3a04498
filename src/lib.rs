//! # openapi-request-validator
//!
//! **openapi-request-validator** checks inbound HTTP requests against the
//! operation an OpenAPI 3 document declares for them, before they reach a
//! handler.
//!
//! ## Overview
//!
//! A host router resolves each request to a route template and operation and
//! attaches that as [`RouteMatch`] metadata. The [`RequestValidator`] then:
//!
//! - composes one JSON schema covering query, headers, path params, cookies
//!   and body for the operation and the request's content type
//! - compiles it once and memoizes it per `(method, route, content type)`
//! - normalizes raw string values to the declared types (parameter styles,
//!   JSON-content parameters, defaults)
//! - rejects undeclared or empty query parameters
//! - evaluates the schema and reports every violation in one [`HttpError`]
//!
//! ## Architecture
//!
//! - **[`spec`]** - Document model, loading and operation lookup
//! - **[`request`]** - Request model and its JSON view
//! - **[`content_type`]** - Content-Type parsing and media-type matching
//! - **[`schema`]** - Composite schema construction
//! - **[`mutator`]** - Parameter decoding and coercion
//! - **[`security`]** - apiKey query credential names
//! - **[`whitelist`]** - Unknown/empty query parameter checks
//! - **[`validator`]** - Orchestration
//! - **[`validator_cache`]** - Compiled validator memoization
//! - **[`error`]** - Typed HTTP errors
//! - **[`runtime_config`]** - Options from YAML or environment
//!
//! ### Validation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host Router
//!     participant Val as RequestValidator
//!     participant Cache as ValidatorCache
//!     participant Comp as SchemaComposer
//!     participant Run as CompiledRequestValidator
//!
//!     Host->>Val: validate(&ApiRequest)
//!     alt No route metadata
//!         Val-->>Host: PassThrough
//!     end
//!     alt No route template
//!         Val-->>Host: 404 Not Found
//!     end
//!     alt No operation for method
//!         Val-->>Host: 405 Method Not Allowed
//!     end
//!     Val->>Cache: get_or_build(method, route, content type)
//!     alt Cache miss
//!         Cache->>Comp: compose(operation, content type)
//!         alt Unmatched content type
//!             Comp-->>Host: 415 Unsupported Media Type
//!         end
//!         Comp-->>Cache: CompositeRequestSchema
//!         Cache->>Cache: compile + store
//!     end
//!     Cache-->>Val: Arc<CompiledRequestValidator>
//!     Val->>Run: run(&ApiRequest)
//!     Run->>Run: mutate parameters
//!     Run->>Run: whitelist query
//!     Run->>Run: evaluate schema
//!     alt Violations
//!         Run-->>Host: 400 Bad Request (all field errors)
//!     end
//!     Run-->>Host: Valid(RequestValues)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use openapi_request_validator::{load_api_document, ApiRequest, RequestValidator, RouteMatch};
//! use http::Method;
//! use std::sync::Arc;
//!
//! let doc = load_api_document("openapi.yaml").expect("failed to load document");
//! let op = Arc::new(doc.operation(&Method::GET, "/pets/{id}").unwrap().unwrap());
//! let validator = RequestValidator::from_env(doc);
//!
//! let req = ApiRequest::new(Method::GET, "/pets/42")
//!     .with_route(RouteMatch::new("/pets/{id}", op).with_path_param("id", "42"));
//! match validator.validate(&req) {
//!     Ok(outcome) => println!("ok: {:?}", outcome),
//!     Err(err) => println!("{}: {}", err.status(), err.to_json()),
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for the `OARV_*` environment variables.

pub mod content_type;
pub mod error;
pub mod mutator;
pub mod request;
pub mod runtime_config;
pub mod schema;
pub mod security;
pub mod spec;
pub mod validator;
pub mod validator_cache;
pub mod whitelist;

pub use content_type::ContentType;
pub use error::{FieldError, HttpError, HttpErrorKind};
pub use request::{ApiRequest, RequestValues, RouteMatch};
pub use runtime_config::RequestValidatorOptions;
pub use spec::{
    load_api_document, ApiDocument, OperationSchema, ParameterLocation, ParameterMeta,
    ParameterStyle, SecurityRequirement, SecurityScheme,
};
pub use validator::{CompiledRequestValidator, RequestValidator, ValidationOutcome};
pub use validator_cache::{CacheKey, ValidatorCache};
