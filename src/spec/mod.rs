//! # Contract Model
//!
//! Serde model of the parts of an OpenAPI document request validation needs:
//! operation parameters, request bodies, security requirements and security
//! schemes. Dereferencing is assumed to have happened upstream apart from
//! `#/components/parameters` references, which [`ApiDocument::operation`]
//! resolves. Schema `$ref`s are left in place and resolved by the evaluator
//! against the embedded `components`.

mod load;
mod types;

pub use load::*;
pub use types::*;
