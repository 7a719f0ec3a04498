//! # HTTP Error Module
//!
//! Typed errors produced by request validation.
//!
//! Every failure detected while validating a request is reported as an
//! [`HttpError`]: a single tagged type whose [`HttpErrorKind`] selects one of a
//! closed set of HTTP failure classes. Each kind has a default status (see
//! [`HttpErrorKind::default_status`]) which callers may override with
//! [`HttpError::with_status`] without changing the kind.
//!
//! ## Wire Shape
//!
//! Errors serialize to the canonical JSON body:
//!
//! ```json
//! {
//!   "status": 400,
//!   "path": ".query.foo",
//!   "message": "Unknown query parameter 'foo'",
//!   "errors": [{ "path": ".query.foo", "message": "Unknown query parameter 'foo'" }]
//! }
//! ```
//!
//! Deserializing recovers the kind from the status code.
//!
//! ## Field Errors
//!
//! `errors` is never empty. When no field-level detail is supplied it holds a
//! single entry mirroring the top-level `path` and `message`.

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    /// Schema violation, unknown query parameter or disallowed empty value
    BadRequest,
    /// Reserved for authentication collaborators
    Unauthorized,
    /// Reserved for authorization collaborators
    Forbidden,
    /// Routing matched a base path but no operation
    NotFound,
    /// The path exists but has no operation for the method
    MethodNotAllowed,
    /// Reserved for body-size collaborators
    RequestEntityTooLarge,
    /// The request content type matches no declared request body media type
    UnsupportedMediaType,
    /// Fallback for anything unclassified
    InternalServerError,
}

impl HttpErrorKind {
    /// Status code used when no override is given.
    pub fn default_status(self) -> u16 {
        match self {
            HttpErrorKind::BadRequest => 400,
            HttpErrorKind::Unauthorized => 401,
            HttpErrorKind::Forbidden => 403,
            HttpErrorKind::NotFound => 404,
            HttpErrorKind::MethodNotAllowed => 405,
            HttpErrorKind::RequestEntityTooLarge => 413,
            HttpErrorKind::UnsupportedMediaType => 415,
            HttpErrorKind::InternalServerError => 500,
        }
    }

    /// Human readable reason phrase.
    pub fn name(self) -> &'static str {
        match self {
            HttpErrorKind::BadRequest => "Bad Request",
            HttpErrorKind::Unauthorized => "Unauthorized",
            HttpErrorKind::Forbidden => "Forbidden",
            HttpErrorKind::NotFound => "Not Found",
            HttpErrorKind::MethodNotAllowed => "Method Not Allowed",
            HttpErrorKind::RequestEntityTooLarge => "Request Entity Too Large",
            HttpErrorKind::UnsupportedMediaType => "Unsupported Media Type",
            HttpErrorKind::InternalServerError => "Internal Server Error",
        }
    }

    /// Classify a raw status code. Anything outside the table is an
    /// internal server error.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => HttpErrorKind::BadRequest,
            401 => HttpErrorKind::Unauthorized,
            403 => HttpErrorKind::Forbidden,
            404 => HttpErrorKind::NotFound,
            405 => HttpErrorKind::MethodNotAllowed,
            413 => HttpErrorKind::RequestEntityTooLarge,
            415 => HttpErrorKind::UnsupportedMediaType,
            _ => HttpErrorKind::InternalServerError,
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field-level issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted location of the offending value, e.g. `.query.limit`
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convert a schema evaluator error into a field error.
    ///
    /// The JSON pointer instance path becomes a dotted path. Missing required
    /// properties are reported at the property itself rather than at the
    /// enclosing object, so a missing body shows up as `.body`.
    pub fn from_validation_error(error: &ValidationError<'_>) -> Self {
        let mut path = pointer_to_dotted(&error.instance_path.to_string());
        if let ValidationErrorKind::Required { property } = &error.kind {
            match property.as_str() {
                Some(name) => path.push_str(&format!(".{}", name)),
                None => path.push_str(&format!(".{}", property)),
            }
        }
        Self {
            path,
            message: error.to_string(),
        }
    }
}

/// Turn `/query/limit` into `.query.limit`, undoing JSON pointer escapes.
fn pointer_to_dotted(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!(".{}", segment.replace("~1", "/").replace("~0", "~")))
        .collect()
}

/// Error returned when a request fails validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "HttpErrorBody", from = "HttpErrorBody")]
pub struct HttpError {
    kind: HttpErrorKind,
    status: u16,
    path: String,
    message: String,
    errors: Vec<FieldError>,
}

impl HttpError {
    /// Create an error of the given kind with its default status.
    pub fn new(kind: HttpErrorKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        let message = message.into();
        Self {
            kind,
            status: kind.default_status(),
            errors: vec![FieldError::new(path.clone(), message.clone())],
            path,
            message,
        }
    }

    /// Create an error from a raw status, classifying it into a kind.
    ///
    /// The status is kept as given even when it falls outside the table, so
    /// `create(502, ..)` is an `InternalServerError` reporting 502.
    pub fn create(status: u16, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::from_status(status), path, message).with_status(status)
    }

    pub fn bad_request(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::BadRequest, path, message)
    }

    pub fn unauthorized(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Unauthorized, path, message)
    }

    pub fn forbidden(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Forbidden, path, message)
    }

    pub fn not_found(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::NotFound, path, message)
    }

    pub fn method_not_allowed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::MethodNotAllowed, path, message)
    }

    pub fn request_entity_too_large(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::RequestEntityTooLarge, path, message)
    }

    pub fn unsupported_media_type(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::UnsupportedMediaType, path, message)
    }

    pub fn internal_server_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::InternalServerError, path, message)
    }

    /// Build a `BadRequest` from the field errors reported by the schema
    /// evaluator for the request at `request_path`.
    ///
    /// The composed message lists every issue as `request<path> <message>`.
    pub fn from_field_errors(request_path: impl Into<String>, errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            return Self::bad_request(request_path, "request validation failed");
        }
        let message = errors
            .iter()
            .map(|e| format!("request{} {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        Self::bad_request(request_path, message).with_errors(errors)
    }

    /// Override the status without changing the kind.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Replace the field errors. An empty list keeps the default entry.
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        if !errors.is_empty() {
            self.errors = errors;
        }
        self
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status as an [`http::StatusCode`], falling back to 500 for values
    /// `http` rejects.
    pub fn status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Canonical JSON body for the transport layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "path": self.path,
            "message": self.message,
            "errors": self.errors,
        })
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.status, self.message)
    }
}

impl std::error::Error for HttpError {}

/// Serialized form of [`HttpError`].
#[derive(Serialize, Deserialize)]
struct HttpErrorBody {
    status: u16,
    path: String,
    message: String,
    #[serde(default)]
    errors: Vec<FieldError>,
}

impl From<HttpError> for HttpErrorBody {
    fn from(err: HttpError) -> Self {
        Self {
            status: err.status,
            path: err.path,
            message: err.message,
            errors: err.errors,
        }
    }
}

impl From<HttpErrorBody> for HttpError {
    fn from(body: HttpErrorBody) -> Self {
        HttpError::create(body.status, body.path, body.message).with_errors(body.errors)
    }
}
