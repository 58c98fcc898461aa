//! Error types for parsing and evaluating formulas.

use thiserror::Error;

/// A formula that could not be parsed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Formula is empty")]
    Empty,

    #[error("Unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    #[error("Invalid number literal '{text}'")]
    InvalidNumber { text: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Expected {expected}, found end of formula")]
    UnexpectedEnd { expected: String },

    #[error("Unterminated group: missing ')'")]
    UnterminatedGroup,

    #[error("Unexpected {found} after the end of the formula")]
    TrailingInput { found: String },
}

/// A formula that parsed but could not be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown name '{name}'")]
    UnknownName { name: String },

    #[error("Function not allowed: {name}")]
    FunctionNotAllowed { name: String },

    #[error("{function} takes {expected} argument(s) but {given} were given")]
    Arity {
        function: String,
        expected: String,
        given: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result of {operation} is not a finite number")]
    NonFinite { operation: String },
}

/// Either phase failing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type EvalResult<T> = Result<T, EvalError>;
