//! Error types for the inference engine
//!
//! Deductive failure is never an error: a goal that cannot be proven simply
//! produces no solutions. The types here cover the loud cases, clauses that
//! are structurally invalid and queries that have to be aborted.

use thiserror::Error;

/// Errors that abort an in-flight query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The active goal depth went past the configured limit
    #[error("Recursion depth exceeded the limit of {limit} active goals")]
    DepthExceeded { limit: usize },

    /// A goal referenced a predicate that has never been asserted (strict mode only)
    #[error("Unknown predicate {name}/{arity}")]
    UnknownPredicate { name: String, arity: usize },
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while constructing a fact or a rule
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClauseError {
    /// The head of a clause must be an atom or a compound term
    #[error("Invalid clause head {head}: expected an atom or a compound term")]
    InvalidHead { head: String },

    /// A body element is not something the resolver can call
    #[error("Malformed rule body: {reason}")]
    MalformedBody { reason: String },

    /// Probabilities live in the closed unit interval
    #[error("Probability {probability} is outside of [0, 1]")]
    ProbabilityOutOfRange { probability: f64 },
}

/// Result type for clause construction
pub type ClauseResult<T> = Result<T, ClauseError>;
