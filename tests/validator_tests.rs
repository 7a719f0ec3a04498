//! End-to-end request validation against the petstore fixture.
//!
//! # Test Coverage
//!
//! - pass-through for requests without route metadata
//! - 404 / 405 from incomplete route metadata
//! - unknown and empty query parameters
//! - path, header and body schema violations
//! - 415 content type handling
//! - OpenAPI 3.0 `nullable` and boolean exclusive bounds
//! - error wire shape

mod common;

use common::{routed, validator, validator_with};
use http::Method;
use openapi_request_validator::{
    ApiDocument, ApiRequest, HttpError, HttpErrorKind, RequestValidator, RequestValidatorOptions,
    RouteMatch, ValidationOutcome,
};
use serde_json::json;

#[test]
fn test_request_without_route_passes_through() {
    let v = validator();
    let req = ApiRequest::new(Method::GET, "/not/in/contract?anything=goes");
    assert_eq!(v.validate(&req).unwrap(), ValidationOutcome::PassThrough);
    assert_eq!(v.cache().size(), 0);
}

#[test]
fn test_missing_route_template_is_not_found() {
    let v = validator();
    let req = ApiRequest::new(Method::GET, "/api/unknown").with_route(RouteMatch::default());
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.kind(), HttpErrorKind::NotFound);
    assert_eq!(err.status(), 404);
    assert_eq!(err.path(), "/api/unknown");
    assert_eq!(err.message(), "not found");
}

#[test]
fn test_missing_operation_is_method_not_allowed() {
    let v = validator();
    let req = routed(&v, Method::PATCH, "/pets", "/pets");
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.kind(), HttpErrorKind::MethodNotAllowed);
    assert_eq!(err.status(), 405);
    assert_eq!(err.message(), "PATCH method not allowed");
}

#[test]
fn test_valid_list_request_is_normalized() {
    let v = validator();
    let req = routed(&v, Method::GET, "/pets?limit=5&tags=a,b&ids=1|2&api_key=secret", "/pets");
    let outcome = v.validate(&req).unwrap();
    let values = outcome.values().unwrap();
    assert_eq!(values.query["limit"], json!(5));
    assert_eq!(values.query["tags"], json!(["a", "b"]));
    assert_eq!(values.query["ids"], json!([1, 2]));
    assert_eq!(values.query["api_key"], json!("secret"));
}

#[test]
fn test_default_fills_absent_parameter() {
    let v = validator();
    let req = routed(&v, Method::GET, "/pets", "/pets");
    let outcome = v.validate(&req).unwrap();
    assert_eq!(outcome.values().unwrap().query["limit"], json!(20));
}

#[test]
fn test_unknown_query_parameter() {
    let v = validator();
    let req = routed(&v, Method::GET, "/pets?limit=5&foo=1", "/pets");
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.path(), ".query.foo");
    assert_eq!(err.message(), "Unknown query parameter 'foo'");
    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].path, ".query.foo");
}

#[test]
fn test_unknown_query_parameter_allowed_by_option() {
    let v = validator_with(RequestValidatorOptions {
        allow_unknown_query_parameters: true,
        ..Default::default()
    });
    let req = routed(&v, Method::GET, "/pets?limit=5&foo=1", "/pets");
    assert!(v.validate(&req).is_ok());
}

#[test]
fn test_empty_query_value() {
    let v = validator();
    let err = v
        .validate(&routed(&v, Method::GET, "/pets?owner=", "/pets"))
        .unwrap_err();
    assert_eq!(err.path(), ".query.owner");
    assert_eq!(err.message(), "Empty value found for query parameter 'owner'");

    // `name` declares allowEmptyValue
    assert!(v.validate(&routed(&v, Method::GET, "/pets?name=", "/pets")).is_ok());
}

#[test]
fn test_schema_violations_are_all_reported() {
    let v = validator();
    let req = routed(&v, Method::GET, "/pets?limit=500&ids=1|x", "/pets");
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.kind(), HttpErrorKind::BadRequest);
    assert_eq!(err.path(), "/pets");
    let paths: Vec<&str> = err.errors().iter().map(|e| e.path.as_str()).collect();
    assert!(paths.contains(&".query.limit"));
    assert!(paths.contains(&".query.ids.1"));
    assert!(err.message().contains("request.query.limit "));
    assert!(err.message().contains(", "));
}

#[test]
fn test_path_and_header_parameters() {
    let v = validator();
    let route = common::route(v.document(), &Method::GET, "/pets/{id}").with_path_param("id", "42");
    let ok = ApiRequest::new(Method::GET, "/pets/42")
        .with_header("X-Request-Id", "r-1")
        .with_cookie("session", "abc")
        .with_route(route.clone());
    let values = v.validate(&ok).unwrap();
    assert_eq!(values.values().unwrap().params["id"], json!(42));

    let missing_header = ApiRequest::new(Method::GET, "/pets/42").with_route(route);
    let err = v.validate(&missing_header).unwrap_err();
    assert_eq!(err.errors()[0].path, ".headers.x-request-id");

    let bad_id = common::route(v.document(), &Method::GET, "/pets/{id}").with_path_param("id", "rex");
    let err = v
        .validate(
            &ApiRequest::new(Method::GET, "/pets/rex")
                .with_header("X-Request-Id", "r-1")
                .with_route(bad_id),
        )
        .unwrap_err();
    assert_eq!(err.errors()[0].path, ".params.id");
}

#[test]
fn test_json_body_resolves_component_ref() {
    let v = validator();
    let post = |body| {
        routed(&v, Method::POST, "/pets", "/pets")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(body)
    };
    assert!(v.validate(&post(json!({"name": "Rex", "tag": "dog"}))).is_ok());

    let err = v.validate(&post(json!({"tag": "dog"}))).unwrap_err();
    assert_eq!(err.errors()[0].path, ".body.name");

    let err = v.validate(&post(json!({"name": ""}))).unwrap_err();
    assert_eq!(err.errors()[0].path, ".body.name");
}

#[test]
fn test_missing_required_body() {
    let v = validator();
    let req = routed(&v, Method::POST, "/pets", "/pets").with_header("Content-Type", "application/json");
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.errors()[0].path, ".body");
}

#[test]
fn test_wildcard_content_type() {
    let v = validator();
    let req = routed(&v, Method::POST, "/pets", "/pets")
        .with_header("Content-Type", "text/plain")
        .with_body(json!("Rex"));
    assert!(v.validate(&req).is_ok());
}

#[test]
fn test_unsupported_media_type() {
    let v = validator();
    let req = routed(&v, Method::POST, "/pets", "/pets")
        .with_header("Content-Type", "application/xml")
        .with_body(json!("<pet/>"));
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.kind(), HttpErrorKind::UnsupportedMediaType);
    assert_eq!(err.status(), 415);
    assert_eq!(err.message(), "unsupported media type application/xml");
}

#[test]
fn test_required_body_without_content_type() {
    let v = validator();
    let err = v
        .validate(&routed(&v, Method::POST, "/pets", "/pets"))
        .unwrap_err();
    assert_eq!(err.status(), 415);
    assert_eq!(err.message(), "media type not specified");
}

#[test]
fn test_optional_body_without_content_type_is_absent() {
    let v = validator();
    assert!(v.validate(&routed(&v, Method::PUT, "/notes", "/notes")).is_ok());

    let req = routed(&v, Method::PUT, "/notes", "/notes")
        .with_header("Content-Type", "application/json")
        .with_body(json!({}));
    let err = v.validate(&req).unwrap_err();
    assert_eq!(err.errors()[0].path, ".body.text");
}

#[test]
fn test_binary_body() {
    let v = validator();
    let req = routed(&v, Method::POST, "/upload", "/upload")
        .with_header("Content-Type", "application/octet-stream");
    assert!(v.validate(&req).is_ok());

    let strict = validator_with(RequestValidatorOptions {
        require_binary_body: true,
        ..Default::default()
    });
    let req = routed(&strict, Method::POST, "/upload", "/upload")
        .with_header("Content-Type", "application/octet-stream");
    let err = strict.validate(&req).unwrap_err();
    assert_eq!(err.errors()[0].path, ".body");
}

#[test]
fn test_from_http_request() {
    let v = validator();
    let http_req = http::Request::builder()
        .method("GET")
        .uri("/pets/7")
        .header("X-Request-Id", "abc")
        .header("Cookie", "session=s1")
        .body(None)
        .unwrap();
    let route = common::route(v.document(), &Method::GET, "/pets/{id}").with_path_param("id", "7");
    let req = ApiRequest::from_http(http_req).with_route(route);
    let outcome = v.validate(&req).unwrap();
    let values = outcome.values().unwrap();
    assert_eq!(values.cookies["session"], json!("s1"));
    assert_eq!(values.headers["x-request-id"], json!("abc"));
}

#[test]
fn test_error_wire_shape_round_trips() {
    let v = validator();
    let err = v
        .validate(&routed(&v, Method::GET, "/pets?limit=5&foo=1", "/pets"))
        .unwrap_err();
    let body = err.to_json();
    assert_eq!(
        body,
        json!({
            "status": 400,
            "path": ".query.foo",
            "message": "Unknown query parameter 'foo'",
            "errors": [{"path": ".query.foo", "message": "Unknown query parameter 'foo'"}]
        })
    );
    let back: HttpError = serde_json::from_value(body).unwrap();
    assert_eq!(back, err);
    assert_eq!(back.status_code(), http::StatusCode::BAD_REQUEST);
}

const PRICED: &str = r#"
openapi: 3.0.3
info: { title: Priced, version: "1.0.0" }
paths:
  /items:
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [price]
              properties:
                price: { type: number, minimum: 0, exclusiveMinimum: true }
                note: { type: string, nullable: true }
                owner: { $ref: '#/components/schemas/Owner' }
components:
  schemas:
    Owner: { type: string, nullable: true }
"#;

#[test]
fn test_openapi_3_0_keywords_validate() {
    common::init_tracing();
    let v = RequestValidator::new(
        ApiDocument::from_yaml_str(PRICED).unwrap(),
        RequestValidatorOptions::default(),
    );
    let post = |body| {
        routed(&v, Method::POST, "/items", "/items")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    };
    assert!(v
        .validate(&post(json!({"price": 1, "note": null, "owner": null})))
        .is_ok());

    let err = v.validate(&post(json!({"price": 0}))).unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.errors()[0].path, ".body.price");

    let err = v.validate(&post(json!({"price": 2, "note": 7}))).unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.errors()[0].path, ".body.note");
}
