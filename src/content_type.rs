//! Media type resolution for request bodies.
//!
//! `application/json`, `application/json; charset=utf-8` and
//! `Application/JSON;charset=UTF-8` all resolve to the family
//! `application/json`. The family is what keys the validator cache.

use std::collections::HashMap;

/// Cache key component used when a request carries no content type.
pub const NOT_PROVIDED: &str = "not_provided";

/// Parsed `Content-Type` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentType {
    raw: Option<String>,
    media_type: Option<String>,
    charset: Option<String>,
}

impl ContentType {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        let mut parts = raw.split(';');
        let media_type = parts
            .next()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty());
        let charset = parts
            .filter_map(|p| {
                let (key, value) = p.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
            })
            .next();
        Self {
            raw: Some(raw.to_string()),
            media_type,
            charset,
        }
    }

    /// Read the `content-type` header from a lowercase-keyed header map.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        Self::parse(headers.get("content-type").map(String::as_str))
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn is_provided(&self) -> bool {
        self.media_type.is_some()
    }

    /// `type/*` patterns.
    pub fn is_wildcard(&self) -> bool {
        self.media_type
            .as_deref()
            .and_then(|m| m.split_once('/'))
            .map(|(ty, sub)| sub == "*" && !ty.is_empty())
            .unwrap_or(false)
    }

    /// Spellings of this media type a contract may use as a content key,
    /// most general first. Empty when no content type was sent.
    pub fn equivalents(&self) -> Vec<String> {
        let Some(media_type) = &self.media_type else {
            return Vec::new();
        };
        let charset = self.charset.as_deref().unwrap_or("utf-8");
        vec![
            media_type.clone(),
            format!("{}; charset={}", media_type, charset),
            format!("{};charset={}", media_type, charset),
        ]
    }

    /// Family used in cache keys: the first equivalent or [`NOT_PROVIDED`].
    pub fn family(&self) -> &str {
        self.media_type.as_deref().unwrap_or(NOT_PROVIDED)
    }

    /// Does a `type/*` or `*/*` content key accept this media type?
    pub fn matches_wildcard(&self, pattern: &str) -> bool {
        let Some(media_type) = &self.media_type else {
            return false;
        };
        if pattern == "*/*" {
            return true;
        }
        match pattern.strip_suffix("/*") {
            Some(ty) if !ty.is_empty() && !ty.contains('/') => media_type
                .split_once('/')
                .map(|(req_ty, sub)| req_ty == ty && !sub.is_empty())
                .unwrap_or(false),
            _ => false,
        }
    }
}
