//! Error types for registry configuration and conversion.

use thiserror::Error;

use crate::report::ErrorTree;

/// The converter graph itself is wrong: a programming or configuration bug,
/// never a problem with a particular input value. These are surfaced
/// immediately and are never wrapped in an [`ErrorTree`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no converter registered for type {type_name}")]
    NotRegistered { type_name: String },

    #[error("a type named {name} is already registered")]
    DuplicateType { name: String },

    #[error(
        "type {type_name} declares {declared} type parameter(s) \
         but {supplied} argument(s) were supplied"
    )]
    ArityMismatch {
        type_name: String,
        declared: usize,
        supplied: usize,
    },

    #[error("unknown type parameter {param} referenced by a field of {type_name}")]
    UnknownTypeParameter { type_name: String, param: String },

    #[error("type parameter {param} reached the registry unresolved; lookups require concrete types")]
    UnresolvedTypeParameter { param: String },

    #[error("converter slot {index} dereferenced before its type finished synthesizing")]
    UnboundForwardRef { index: usize },
}

/// The input JSON does not match the requested type, or the registry could
/// not produce a converter for it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON value does not match the target type:\n{0}")]
    Invalid(ErrorTree),
}

/// A value is in a state with no valid JSON representation. Always a
/// programming or internal-consistency bug, never the end user's fault.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("value has no valid JSON representation:\n{0}")]
    Invalid(ErrorTree),
}

impl DecodeError {
    /// Flattened per-field errors, empty for configuration errors.
    pub fn field_errors(&self) -> Vec<crate::report::FieldError> {
        match self {
            DecodeError::Config(_) => Vec::new(),
            DecodeError::Invalid(tree) => tree.flatten(),
        }
    }
}

impl EncodeError {
    /// Flattened per-field errors, empty for configuration errors.
    pub fn field_errors(&self) -> Vec<crate::report::FieldError> {
        match self {
            EncodeError::Config(_) => Vec::new(),
            EncodeError::Invalid(tree) => tree.flatten(),
        }
    }
}
