//! field model primitives for vantage: nested values, canonicalization, diffs, validation.

pub mod canonical;
pub mod diff;
pub mod field;
pub mod validation;

pub use canonical::{names_equivalent, strings_equivalent};
pub use diff::{DiffInfo, Differ, FieldDiff, NestedObject, Operation, OperationSelector, RECREATE};
pub use field::{FieldName, Nested};
pub use validation::ValidationError;

/// json object map used for request and response bodies.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
