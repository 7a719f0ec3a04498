//! Inline expansion of local `#/components/...` references.
//!
//! The evaluator resolves `$ref`s on its own through the embedded
//! `components`, but the parameter mutator needs the concrete `type`,
//! `properties` and `default` of a parameter schema to decode raw strings.
//! Parameter schemas are therefore expanded before they reach it.

use crate::spec::ApiDocument;
use serde_json::Value;

/// Look up a `#/components/<section>/<name>` reference.
///
/// Returns `None` for references outside `components` or that do not resolve.
pub fn resolve_schema_ref<'a>(doc: &'a ApiDocument, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix("#/components/")?;
    let (section, rest) = pointer.split_once('/')?;
    doc.components
        .other
        .get(section)?
        .pointer(&format!("/{}", rest))
}

/// Recursively replace every resolvable `$ref` object in `value` with the
/// schema it points at. Unresolvable and self-referencing `$ref`s stay in
/// place for the evaluator.
pub fn expand_schema_refs(doc: &ApiDocument, value: &mut Value) {
    let mut in_progress = Vec::new();
    expand(doc, value, &mut in_progress);
}

fn expand(doc: &ApiDocument, value: &mut Value, in_progress: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str).map(str::to_string) {
                if !in_progress.contains(&ref_path) {
                    if let Some(target) = resolve_schema_ref(doc, &ref_path) {
                        let mut resolved = target.clone();
                        if let Value::Object(resolved_obj) = &mut resolved {
                            // OAS 3.1 allows siblings next to `$ref`; they refine the target.
                            for (key, sibling) in obj.iter().filter(|(k, _)| k.as_str() != "$ref") {
                                resolved_obj.insert(key.clone(), sibling.clone());
                            }
                        }
                        in_progress.push(ref_path);
                        expand(doc, &mut resolved, in_progress);
                        in_progress.pop();
                        *value = resolved;
                        return;
                    }
                }
            }
            for v in obj.values_mut() {
                expand(doc, v, in_progress);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                expand(doc, v, in_progress);
            }
        }
        _ => {}
    }
}
