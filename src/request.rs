//! # Request Model
//!
//! [`ApiRequest`] is the raw request as the host hands it over: method, path,
//! query pairs in query-string order, lowercase headers, cookies and an
//! optional JSON body. A router that resolved the request against the
//! contract attaches a [`RouteMatch`]; requests without one are outside the
//! contract and pass validation untouched.
//!
//! [`RequestValues`] is the JSON view of a request that the composite schema
//! validates. The parameter mutator produces a normalized `RequestValues`
//! rather than editing the request in place.

use crate::spec::OperationSchema;
use http::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Route resolution metadata attached by the router.
#[derive(Debug, Clone, Default)]
pub struct RouteMatch {
    /// Matched route template, e.g. `/pets/{id}`. `None` when only a base
    /// path matched.
    pub route: Option<String>,
    /// Operation for the request method. `None` when the path has no
    /// operation for it.
    pub operation: Option<Arc<OperationSchema>>,
    /// Raw path parameter values extracted by the router.
    pub path_params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn new(route: impl Into<String>, operation: Arc<OperationSchema>) -> Self {
        Self {
            route: Some(route.into()),
            operation: Some(operation),
            path_params: HashMap::new(),
        }
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }
}

/// An inbound request awaiting validation.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Decoded query pairs in query-string order, duplicates preserved
    pub query: Vec<(String, String)>,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    /// Cookies whose signature the host already verified
    pub signed_cookies: HashMap<String, String>,
    pub body: Option<Value>,
    pub route: Option<RouteMatch>,
}

impl ApiRequest {
    /// Build a request from a method and a path that may carry a query string.
    pub fn new(method: Method, uri: &str) -> Self {
        let path = uri.split('?').next().unwrap_or("/").to_string();
        Self {
            method,
            path,
            query: parse_query_pairs(uri),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            signed_cookies: HashMap::new(),
            body: None,
            route: None,
        }
    }

    /// Convert an `http::Request` whose body was already parsed as JSON.
    pub fn from_http(req: http::Request<Option<Value>>) -> Self {
        let (parts, body) = req.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        let cookies = parse_cookies(&headers);
        let mut req = Self::new(parts.method, &uri);
        debug!(
            method = %req.method,
            path = %req.path,
            header_count = headers.len(),
            cookie_count = cookies.len(),
            query_count = req.query.len(),
            "Request converted from http::Request"
        );
        req.headers = headers;
        req.cookies = cookies;
        req.body = body;
        req
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_signed_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.signed_cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_route(mut self, route: RouteMatch) -> Self {
        self.route = Some(route);
        self
    }
}

/// Parse cookies from the `cookie` header.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query pairs from a URL path, keeping order and duplicates.
///
/// # Example
///
/// ```
/// use openapi_request_validator::request::parse_query_pairs;
///
/// let q = parse_query_pairs("/users?limit=10&tag=a&tag=b");
/// assert_eq!(q[0], ("limit".to_string(), "10".to_string()));
/// assert_eq!(q.len(), 3);
/// ```
pub fn parse_query_pairs(path: &str) -> Vec<(String, String)> {
    match path.split_once('?') {
        Some((_, query_str)) => url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// JSON view of a request, in the shape the composite schema validates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValues {
    pub method: String,
    pub path: String,
    pub query: Map<String, Value>,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub cookies: Map<String, Value>,
    pub body: Option<Value>,
}

impl RequestValues {
    /// Raw, un-normalized values of `req`.
    ///
    /// A query name seen once maps to a string, a repeated one to an array of
    /// strings. Signed cookies override plain cookies of the same name.
    /// `params` stays empty; the mutator overlays the router's path values.
    pub fn from_request(req: &ApiRequest) -> Self {
        let mut query = Map::new();
        for (name, value) in &req.query {
            match query.get_mut(name) {
                Some(Value::Array(values)) => values.push(Value::String(value.clone())),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value.clone())]);
                }
                None => {
                    query.insert(name.clone(), Value::String(value.clone()));
                }
            }
        }

        let mut header_names: Vec<&String> = req.headers.keys().collect();
        header_names.sort();
        let headers = header_names
            .into_iter()
            .map(|name| (name.clone(), Value::String(req.headers[name].clone())))
            .collect();

        let mut cookies: Vec<(&String, &String)> = req.cookies.iter().collect();
        cookies.sort();
        let mut cookie_map: Map<String, Value> = cookies
            .into_iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut signed: Vec<(&String, &String)> = req.signed_cookies.iter().collect();
        signed.sort();
        for (k, v) in signed {
            cookie_map.insert(k.clone(), Value::String(v.clone()));
        }

        Self {
            method: req.method.to_string(),
            path: req.path.clone(),
            query,
            headers,
            params: Map::new(),
            cookies: cookie_map,
            body: req.body.clone(),
        }
    }

    /// Instance handed to the schema evaluator. `body` is omitted when absent
    /// so `required: ["body"]` can flag it.
    pub fn to_instance(&self) -> Value {
        let mut instance = Map::new();
        instance.insert("method".to_string(), Value::String(self.method.clone()));
        instance.insert("path".to_string(), Value::String(self.path.clone()));
        instance.insert("query".to_string(), Value::Object(self.query.clone()));
        instance.insert("headers".to_string(), Value::Object(self.headers.clone()));
        instance.insert("params".to_string(), Value::Object(self.params.clone()));
        instance.insert("cookies".to_string(), Value::Object(self.cookies.clone()));
        if let Some(body) = &self.body {
            instance.insert("body".to_string(), body.clone());
        }
        Value::Object(instance)
    }
}
