#![allow(dead_code)]

use http::Method;
use openapi_request_validator::{
    ApiDocument, ApiRequest, RequestValidator, RequestValidatorOptions, RouteMatch,
};
use std::sync::{Arc, Once};

pub const PETSTORE: &str = r#"
openapi: 3.0.3
info: { title: Petstore, version: "1.0" }
security:
  - apiKeyAuth: []
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - { name: limit, in: query, schema: { type: integer, minimum: 1, maximum: 100, default: 20 } }
        - { name: name, in: query, allowEmptyValue: true, schema: { type: string } }
        - { name: owner, in: query, schema: { type: string } }
        - name: tags
          in: query
          explode: false
          schema: { type: array, items: { type: string } }
        - name: ids
          in: query
          style: pipeDelimited
          schema: { type: array, items: { type: integer } }
    post:
      operationId: addPet
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: '#/components/schemas/NewPet' }
          text/*:
            schema: { type: string }
  /pets/{id}:
    parameters:
      - { name: id, in: path, required: true, schema: { type: integer } }
    get:
      operationId: getPet
      parameters:
        - { name: X-Request-Id, in: header, required: true, schema: { type: string } }
        - { name: session, in: cookie, schema: { type: string } }
    delete:
      operationId: deletePet
      security:
        - bearerAuth: []
  /search:
    get:
      operationId: search
      parameters:
        - name: filter
          in: query
          style: deepObject
          explode: true
          schema:
            type: object
            properties:
              color: { type: string }
              age: { type: integer }
        - name: q
          in: query
          content:
            application/json:
              schema:
                type: object
                required: [term]
                properties:
                  term: { type: string }
  /upload:
    post:
      operationId: upload
      requestBody:
        required: true
        content:
          application/octet-stream:
            schema: { type: string, format: binary }
  /notes:
    put:
      operationId: putNote
      requestBody:
        content:
          application/json:
            schema: { type: object, required: [text] }
components:
  schemas:
    NewPet:
      type: object
      required: [name]
      properties:
        name: { type: string, minLength: 1 }
        tag: { type: string }
  securitySchemes:
    apiKeyAuth: { type: apiKey, in: query, name: api_key }
    bearerAuth: { type: http, scheme: bearer }
"#;

static TRACING: Once = Once::new();

/// Route validator logs to the test writer once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn petstore() -> ApiDocument {
    ApiDocument::from_yaml_str(PETSTORE).expect("petstore fixture parses")
}

pub fn validator() -> RequestValidator {
    validator_with(RequestValidatorOptions::default())
}

pub fn validator_with(options: RequestValidatorOptions) -> RequestValidator {
    init_tracing();
    RequestValidator::new(petstore(), options)
}

/// Route metadata for `route`, as a router would attach it.
pub fn route(doc: &ApiDocument, method: &Method, route: &str) -> RouteMatch {
    match doc.operation(method, route).expect("operation lookup") {
        Some(op) => RouteMatch::new(route, Arc::new(op)),
        None => RouteMatch {
            route: Some(route.to_string()),
            operation: None,
            path_params: Default::default(),
        },
    }
}

/// A request already resolved against the validator's document.
pub fn routed(validator: &RequestValidator, method: Method, uri: &str, template: &str) -> ApiRequest {
    let route_match = route(validator.document(), &method, template);
    ApiRequest::new(method, uri).with_route(route_match)
}
