//! Error types for descriptor verification.

use thiserror::Error;

/// Result type alias for descriptor operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Structural invariant violations in an evaluated descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("expected {expected} {kind} declaration(s), found {found}")]
    Count {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("table name {table:?} does not match service env DYNAMODB_TABLE_NAME {env:?}")]
    TableNameMismatch { table: String, env: Option<String> },

    #[error("secret set changed: expected {expected:?}, found {found:?}")]
    SecretSet {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("secret {name} has path {path:?}, expected {expected:?}")]
    SecretPath {
        name: String,
        path: String,
        expected: String,
    },

    #[error("{from} references undeclared {kind} {target}")]
    DanglingReference {
        from: String,
        kind: &'static str,
        target: String,
    },
}
