//! # Parameter Mutator
//!
//! Normalizes raw request values into the typed shape the composite schema
//! expects. Query strings, headers, path segments and cookies all arrive as
//! text; the contract says how that text encodes arrays, objects and
//! primitives.
//!
//! | Location | Styles handled |
//! |----------|----------------|
//! | query    | `form` (exploded and not), `spaceDelimited`, `pipeDelimited`, `deepObject` |
//! | header   | `simple` |
//! | path     | `simple`, `label`, `matrix` |
//! | cookie   | `form` |
//!
//! Parameters declared through a JSON `content` entry are parsed as JSON.
//! Values that do not parse as the declared type are left as strings so the
//! schema evaluator reports them. Declared `default`s fill absent parameters.
//!
//! The mutator returns a new [`RequestValues`] and is idempotent: mutating an
//! already mutated value yields the same value.

use crate::request::RequestValues;
use crate::spec::{ParameterLocation, ParameterMeta, ParameterStyle};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeSet, HashMap};

pub struct ParameterMutator<'a> {
    parameters: &'a [ParameterMeta],
}

impl<'a> ParameterMutator<'a> {
    pub fn new(parameters: &'a [ParameterMeta]) -> Self {
        Self { parameters }
    }

    /// Normalize `values`. When the router resolved path parameters they
    /// replace `values.params` before decoding.
    pub fn mutate(&self, values: RequestValues, path_params: &HashMap<String, String>) -> RequestValues {
        let RequestValues {
            method,
            path,
            query,
            headers,
            mut params,
            cookies,
            body,
        } = values;

        if !path_params.is_empty() {
            let mut names: Vec<&String> = path_params.keys().collect();
            names.sort();
            params = names
                .into_iter()
                .map(|name| (name.clone(), Value::String(path_params[name].clone())))
                .collect();
        }

        RequestValues {
            method,
            path,
            query: self.mutate_query(query),
            headers: self.mutate_location(headers, ParameterLocation::Header),
            params: self.mutate_location(params, ParameterLocation::Path),
            cookies: self.mutate_location(cookies, ParameterLocation::Cookie),
            body,
        }
    }

    fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &'a ParameterMeta> {
        let parameters: &'a [ParameterMeta] = self.parameters;
        parameters.iter().filter(move |p| p.location == location)
    }

    fn mutate_query(&self, mut query: Map<String, Value>) -> Map<String, Value> {
        let declared: BTreeSet<&str> = self
            .parameters_in(ParameterLocation::Query)
            .map(|p| p.name.as_str())
            .collect();

        // Gather object parameters spread over several query keys.
        for param in self.parameters_in(ParameterLocation::Query) {
            if query.contains_key(&param.name) || schema_type(param.effective_schema()) != Some("object") {
                continue;
            }
            match param.effective_style() {
                ParameterStyle::DeepObject => {
                    query = collapse_into_object(query, &param.name, |key| {
                        deep_object_property(key, &param.name)
                    });
                }
                ParameterStyle::Form if param.effective_explode() => {
                    let properties = object_properties(param.effective_schema());
                    query = collapse_into_object(query, &param.name, |key| {
                        (properties.contains(key) && !declared.contains(key)).then(|| key.to_string())
                    });
                }
                _ => {}
            }
        }

        self.decode_declared(query, ParameterLocation::Query)
    }

    fn mutate_location(&self, values: Map<String, Value>, location: ParameterLocation) -> Map<String, Value> {
        self.decode_declared(values, location)
    }

    fn decode_declared(&self, mut values: Map<String, Value>, location: ParameterLocation) -> Map<String, Value> {
        for param in self.parameters_in(location) {
            let key = param.key();
            match values.get_mut(&key) {
                Some(value) => {
                    let decoded = decode_parameter(value.take(), param);
                    *value = decoded;
                }
                None => {
                    if let Some(default) = param.effective_schema().and_then(|s| s.get("default")) {
                        values.insert(key, default.clone());
                    }
                }
            }
        }
        values
    }
}

/// Decode one parameter value according to its schema, style and explode flag.
pub fn decode_parameter(value: Value, param: &ParameterMeta) -> Value {
    let schema = param.effective_schema();
    if param.is_json_content() {
        return match value {
            Value::String(raw) => parse_json_text(raw),
            other => other,
        };
    }

    let style = param.effective_style();
    let explode = param.effective_explode();
    match value {
        Value::String(raw) if raw.is_empty() => Value::String(raw),
        Value::String(raw) => match param.location {
            ParameterLocation::Path => {
                let (body, delimiter) = strip_path_style(&raw, &param.name, style, explode, schema);
                decode_delimited(&body, schema, delimiter, explode)
            }
            ParameterLocation::Query
                if style == ParameterStyle::Form
                    && explode
                    && schema_type(schema) == Some("array") =>
            {
                coerce_items(vec![Value::String(raw)], schema)
            }
            _ => decode_delimited(&raw, schema, style.delimiter(), explode),
        },
        Value::Array(items) if schema_type(schema) == Some("array") => coerce_items(items, schema),
        Value::Object(props) => Value::Object(coerce_properties(props, schema)),
        other => other,
    }
}

/// Remove `label` / `matrix` decoration from a path segment.
///
/// Returns the bare value text and the delimiter separating its items.
fn strip_path_style(
    raw: &str,
    name: &str,
    style: ParameterStyle,
    explode: bool,
    schema: Option<&Value>,
) -> (String, char) {
    match style {
        ParameterStyle::Label => {
            let body = raw.strip_prefix('.').unwrap_or(raw).to_string();
            (body, if explode { '.' } else { ',' })
        }
        ParameterStyle::Matrix => {
            let prefix = format!("{}=", name);
            let segments: Vec<&str> = raw
                .trim_start_matches(';')
                .split(';')
                .filter(|s| !s.is_empty())
                .collect();
            let body = if explode && schema_type(schema) == Some("array") {
                segments
                    .iter()
                    .map(|s| s.strip_prefix(prefix.as_str()).unwrap_or(*s))
                    .collect::<Vec<_>>()
                    .join(",")
            } else if explode && schema_type(schema) == Some("object") {
                segments.join(",")
            } else {
                segments
                    .first()
                    .map(|s| s.strip_prefix(prefix.as_str()).unwrap_or(*s).to_string())
                    .unwrap_or_default()
            };
            (body, ',')
        }
        _ => (raw.to_string(), ','),
    }
}

/// Decode delimited text into an array, object or primitive.
///
/// ```
/// use openapi_request_validator::mutator::decode_delimited;
/// use serde_json::json;
///
/// let schema = json!({"type": "array", "items": {"type": "integer"}});
/// assert_eq!(decode_delimited("1,2,3", Some(&schema), ',', false), json!([1, 2, 3]));
/// ```
pub fn decode_delimited(raw: &str, schema: Option<&Value>, delimiter: char, explode: bool) -> Value {
    match schema_type(schema) {
        Some("array") => {
            let items = raw
                .split(delimiter)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.trim().to_string()))
                .collect();
            coerce_items(items, schema)
        }
        Some("object") => decode_object(raw, schema, delimiter, explode),
        _ => coerce_primitive(raw, schema),
    }
}

fn decode_object(raw: &str, schema: Option<&Value>, delimiter: char, explode: bool) -> Value {
    if raw.trim_start().starts_with('{') {
        return match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(props)) => Value::Object(coerce_properties(props, schema)),
            _ => Value::String(raw.to_string()),
        };
    }
    let parts: Vec<&str> = raw.split(delimiter).collect();
    let mut props = Map::new();
    if explode {
        for part in parts {
            match part.split_once('=') {
                Some((k, v)) => {
                    props.insert(k.to_string(), Value::String(v.to_string()));
                }
                None => return Value::String(raw.to_string()),
            }
        }
    } else {
        if parts.len() % 2 != 0 {
            return Value::String(raw.to_string());
        }
        for pair in parts.chunks(2) {
            props.insert(pair[0].to_string(), Value::String(pair[1].to_string()));
        }
    }
    Value::Object(coerce_properties(props, schema))
}

/// Convert text to the primitive type the schema declares. Text that does
/// not parse stays a string.
pub fn coerce_primitive(raw: &str, schema: Option<&Value>) -> Value {
    match schema_type(schema) {
        Some("integer") => parse_integer(raw)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some("boolean") => raw
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

/// Parse text denoting a whole number. Beyond `i64` it falls back to `u64`,
/// then to floats with no fractional part (`5.0`, `1e2`), which is what JSON
/// Schema counts as an integer.
fn parse_integer(raw: &str) -> Option<Number> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n.into());
    }
    let f = raw.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0)?;
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some((f as i64).into())
    } else {
        Number::from_f64(f)
    }
}

fn coerce_items(items: Vec<Value>, schema: Option<&Value>) -> Value {
    let item_schema = schema.and_then(|s| s.get("items"));
    Value::Array(
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => coerce_primitive(&s, item_schema),
                other => other,
            })
            .collect(),
    )
}

fn coerce_properties(props: Map<String, Value>, schema: Option<&Value>) -> Map<String, Value> {
    let prop_schemas = schema.and_then(|s| s.get("properties"));
    props
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => coerce_primitive(&s, prop_schemas.and_then(|p| p.get(&k))),
                other => other,
            };
            (k, v)
        })
        .collect()
}

fn parse_json_text(raw: String) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(&raw).unwrap_or(Value::String(raw))
    } else {
        Value::String(raw)
    }
}

/// Declared `type`, skipping `"null"` in type arrays.
fn schema_type(schema: Option<&Value>) -> Option<&str> {
    match schema?.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn object_properties(schema: Option<&Value>) -> BTreeSet<String> {
    schema
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

/// `filter[status]` -> `status` for the parameter `filter`.
fn deep_object_property(key: &str, name: &str) -> Option<String> {
    key.strip_prefix(name)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|prop| !prop.is_empty())
        .map(str::to_string)
}

/// Move every entry whose key `select` maps to a property into one object
/// stored under `name`, at the position of the first moved entry.
fn collapse_into_object<F>(map: Map<String, Value>, name: &str, select: F) -> Map<String, Value>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = Map::new();
    let mut object = Map::new();
    for (key, value) in map {
        match select(&key) {
            Some(prop) => {
                if object.is_empty() {
                    out.insert(name.to_string(), Value::Null);
                }
                object.insert(prop, value);
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    if !object.is_empty() {
        out.insert(name.to_string(), Value::Object(object));
    }
    out
}
