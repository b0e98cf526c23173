use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Error

/// A problem in the declared base chains of definition types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HierarchyError {
    #[error("definition type `{ty}` is abstract and cannot be instantiated")]
    AbstractDef { ty: &'static str },

    #[error("base `{base}` of definition type `{ty}` is not a registered definition type")]
    MissingBase {
        ty: &'static str,
        base: &'static str,
    },

    #[error("definition type `{ty}` is its own ancestor")]
    Cycle { ty: &'static str },

    #[error("`{ty}` is not a registered definition type")]
    NotADef { ty: &'static str },
}

/// Errors of the runtime definition operations of a [`Database`](crate::Database).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefError {
    #[error("`{name}` is not a valid definition name; {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("a definition named `{name}` already exists under `{root}`")]
    Duplicate { root: &'static str, name: String },

    #[error("`{name}` is not registered, it was deleted or never existed")]
    NotRegistered { name: String },

    #[error("definition type error: {0}")]
    Hierarchy(#[from] HierarchyError),
}
