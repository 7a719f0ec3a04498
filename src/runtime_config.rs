//! # Runtime Configuration Module
//!
//! Options controlling request validation, loadable from a YAML file or from
//! environment variables.
//!
//! ## Environment Variables
//!
//! ### `OARV_SCHEMA_CACHE`
//!
//! `off` disables validator memoization; every request then composes and
//! compiles its schema. Useful when debugging contract changes.
//!
//! Default: on
//!
//! ### `OARV_ALLOW_UNKNOWN_QUERY`
//!
//! `true` or `1` lets query parameters the contract does not declare through.
//!
//! Default: `false`
//!
//! ### `OARV_REQUIRE_BINARY_BODY`
//!
//! `true` or `1` rejects requests missing a required `format: binary` body.
//! By default binary bodies are not validated at all.
//!
//! Default: `false`
//!
//! ## Usage
//!
//! ```rust
//! use openapi_request_validator::runtime_config::RequestValidatorOptions;
//!
//! let options = RequestValidatorOptions::from_env();
//! println!("unknown query params allowed: {}", options.allow_unknown_query_parameters);
//! ```
//!
//! ## YAML
//!
//! ```yaml
//! allow_unknown_query_parameters: false
//! schema_cache: true
//! require_binary_body: false
//! ```

use serde::{Deserialize, Serialize};
use std::env;

/// Options for [`RequestValidator`](crate::validator::RequestValidator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestValidatorOptions {
    /// Accept query parameters that are neither declared nor apiKey credentials
    pub allow_unknown_query_parameters: bool,
    /// Memoize compiled validators per `(method, route, content type)`
    pub schema_cache: bool,
    /// Require a required binary request body to be present
    pub require_binary_body: bool,
}

impl Default for RequestValidatorOptions {
    fn default() -> Self {
        Self {
            allow_unknown_query_parameters: false,
            schema_cache: true,
            require_binary_body: false,
        }
    }
}

impl RequestValidatorOptions {
    /// Load options from environment variables, defaulting anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse options from YAML; missing keys take their defaults.
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let schema_cache = match lookup("OARV_SCHEMA_CACHE") {
            Some(val) => !val.trim().eq_ignore_ascii_case("off"),
            None => defaults.schema_cache,
        };
        Self {
            allow_unknown_query_parameters: lookup("OARV_ALLOW_UNKNOWN_QUERY")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.allow_unknown_query_parameters),
            schema_cache,
            require_binary_body: lookup("OARV_REQUIRE_BINARY_BODY")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.require_binary_body),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
