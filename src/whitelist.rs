//! Query parameter whitelisting.
//!
//! Query names are checked in query-string order and the first violation
//! wins:
//!
//! 1. a name that is neither declared nor an apiKey query credential is
//!    rejected unless unknown parameters are allowed;
//! 2. an allowed name with an empty value is rejected unless the parameter
//!    declares `allowEmptyValue`.

use crate::error::HttpError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Names accepted in the query string for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryWhitelist {
    allowed: BTreeSet<String>,
    allow_empty: BTreeSet<String>,
    allow_unknown: bool,
}

impl QueryWhitelist {
    /// `declared` and `security` together form the allowed set.
    pub fn new(
        declared: BTreeSet<String>,
        security: &BTreeSet<String>,
        allow_empty: BTreeSet<String>,
        allow_unknown: bool,
    ) -> Self {
        let mut allowed = declared;
        allowed.extend(security.iter().cloned());
        Self {
            allowed,
            allow_empty,
            allow_unknown,
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    /// Reject unknown names and empty values, first violation in query order.
    ///
    /// `allow_unknown` only admits undeclared names. Declared parameters still
    /// need `allowEmptyValue` to arrive empty.
    pub fn enforce(&self, query: &Map<String, Value>) -> Result<(), HttpError> {
        for (name, value) in query {
            if !self.allowed.contains(name) {
                if self.allow_unknown {
                    continue;
                }
                return Err(HttpError::bad_request(
                    format!(".query.{}", name),
                    format!("Unknown query parameter '{}'", name),
                ));
            }
            if is_empty_value(value) && !self.allow_empty.contains(name) {
                return Err(HttpError::bad_request(
                    format!(".query.{}", name),
                    format!("Empty value found for query parameter '{}'", name),
                ));
            }
        }
        Ok(())
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
