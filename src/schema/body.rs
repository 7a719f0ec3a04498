use crate::content_type::ContentType;
use crate::error::HttpError;
use crate::spec::{MediaTypeMeta, RequestBodyMeta};
use serde_json::{json, Value};

/// Request body schema chosen for one content type.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySchema {
    pub schema: Value,
    pub required: bool,
    /// `format: binary`; such bodies are opaque to the evaluator
    pub binary: bool,
}

impl BodySchema {
    fn unconstrained(required: bool) -> Self {
        Self {
            schema: json!({}),
            required,
            binary: false,
        }
    }
}

/// Pick the body schema for `content_type` from `request_body`.
///
/// Exact content keys are tried first, then `type/*` and `*/*` patterns in
/// reverse key order. An operation without body content accepts anything.
/// An optional body with no content type on the request is treated as
/// absent. Anything else that matches no key is `415`.
pub fn select_body_schema(
    route: &str,
    request_body: Option<&RequestBodyMeta>,
    content_type: &ContentType,
) -> Result<BodySchema, HttpError> {
    let Some(request_body) = request_body.filter(|b| !b.content.is_empty()) else {
        return Ok(BodySchema::unconstrained(false));
    };

    let matched = find_media_type(request_body, content_type);
    let Some(media) = matched else {
        if !content_type.is_provided() && !request_body.required {
            return Ok(BodySchema::unconstrained(false));
        }
        let message = match content_type.media_type() {
            Some(mt) => format!("unsupported media type {}", mt),
            None => "media type not specified".to_string(),
        };
        return Err(HttpError::unsupported_media_type(route, message));
    };

    let schema = media.schema.clone().unwrap_or_else(|| json!({}));
    let binary = schema.get("format").and_then(Value::as_str) == Some("binary");
    Ok(BodySchema {
        schema,
        required: request_body.required,
        binary,
    })
}

fn find_media_type<'a>(
    request_body: &'a RequestBodyMeta,
    content_type: &ContentType,
) -> Option<&'a MediaTypeMeta> {
    let exact = content_type.equivalents().into_iter().find_map(|candidate| {
        request_body
            .content
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&candidate))
            .map(|(_, media)| media)
    });
    if exact.is_some() {
        return exact;
    }
    request_body
        .content
        .iter()
        .rev()
        .find(|(key, _)| content_type.matches_wildcard(key))
        .map(|(_, media)| media)
}
