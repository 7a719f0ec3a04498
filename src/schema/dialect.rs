//! OpenAPI 3.0 schema keywords rewritten into JSON Schema 2020-12.
//!
//! | OpenAPI 3.0 | Rewritten to |
//! |-------------|--------------|
//! | `type: T, nullable: true` | `type: [T, "null"]` (and `null` added to `enum`) |
//! | `nullable: true` without `type` | `anyOf: [<schema>, {type: "null"}]` |
//! | `minimum: N, exclusiveMinimum: true` | `exclusiveMinimum: N` |
//! | `maximum: N, exclusiveMaximum: true` | `exclusiveMaximum: N` |
//! | `exclusiveMinimum: false` / `exclusiveMaximum: false` | removed |
//!
//! Numeric `exclusiveMinimum`/`exclusiveMaximum` are already 2020-12 and stay
//! as they are. Normalizing twice yields the same schema.

use serde_json::{json, Map, Value};

/// Keywords whose values are instance data, not subschemas.
const DATA_KEYWORDS: [&str; 5] = ["enum", "const", "default", "example", "examples"];

/// Keywords whose values map user-chosen names to subschemas.
const SCHEMA_MAPS: [&str; 4] = ["properties", "patternProperties", "$defs", "dependentSchemas"];

/// Rewrite OpenAPI 3.0 keywords throughout `schema`.
pub fn normalize_schema(schema: &mut Value) {
    match schema {
        Value::Object(obj) => {
            rewrite_exclusive_bound(obj, "exclusiveMinimum", "minimum");
            rewrite_exclusive_bound(obj, "exclusiveMaximum", "maximum");
            rewrite_nullable(obj);
            for (key, value) in obj.iter_mut() {
                if SCHEMA_MAPS.contains(&key.as_str()) {
                    if let Value::Object(named) = value {
                        named.values_mut().for_each(normalize_schema);
                    }
                } else if !DATA_KEYWORDS.contains(&key.as_str()) {
                    normalize_schema(value);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize_schema(item);
            }
        }
        _ => {}
    }
}

fn rewrite_exclusive_bound(obj: &mut Map<String, Value>, exclusive: &str, inclusive: &str) {
    let Some(Value::Bool(flag)) = obj.get(exclusive) else {
        return;
    };
    let flag = *flag;
    obj.remove(exclusive);
    if flag {
        if let Some(bound) = obj.remove(inclusive) {
            obj.insert(exclusive.to_string(), bound);
        }
    }
}

fn rewrite_nullable(obj: &mut Map<String, Value>) {
    match obj.get("nullable") {
        Some(Value::Bool(true)) => {}
        Some(Value::Bool(false)) => {
            obj.remove("nullable");
            return;
        }
        _ => return,
    }
    obj.remove("nullable");

    match obj.remove("type") {
        Some(Value::String(ty)) => {
            obj.insert("type".to_string(), json!([ty, "null"]));
        }
        Some(Value::Array(mut types)) => {
            if !types.iter().any(|t| t == "null") {
                types.push(json!("null"));
            }
            obj.insert("type".to_string(), Value::Array(types));
        }
        other => {
            if let Some(ty) = other {
                obj.insert("type".to_string(), ty);
            }
            let inner = std::mem::take(obj);
            obj.insert(
                "anyOf".to_string(),
                json!([Value::Object(inner), {"type": "null"}]),
            );
            return;
        }
    }
    if let Some(Value::Array(values)) = obj.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
}
