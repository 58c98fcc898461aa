//! Error types for the hierarchy and entity helpers.

use istinbat_formula::{EvalError, ParseError};
use istinbat_query::ClauseError;
use thiserror::Error;

/// Errors raised while defining or inspecting sequences, cycles and trees
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("Structure '{name}' has no items")]
    Empty { name: String },

    #[error("Structure '{name}' not found")]
    Unknown { name: String },

    #[error(transparent)]
    Clause(#[from] ClauseError),
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Errors raised by the entity helper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Unknown entity '{name}'")]
    UnknownEntity { name: String },

    #[error("Unknown action '{action}' for actor '{actor}'")]
    UnknownAction { actor: String, action: String },

    #[error("Attribute '{key}' of '{entity}' is {kind} and cannot hold {value}")]
    KindMismatch {
        entity: String,
        key: String,
        kind: String,
        value: String,
    },

    #[error("Unsupported reaction response '{response}': expected 'key += expr', 'key -= expr' or 'key = expr'")]
    MalformedResponse { response: String },

    #[error("Invalid formula: {0}")]
    Parse(#[from] ParseError),

    #[error("Formula evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Clause(#[from] ClauseError),
}

pub type EntityResult<T> = Result<T, EntityError>;
