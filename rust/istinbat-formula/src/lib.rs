//! # istinbat-formula
//!
//! A small arithmetic language for entity effects, reaction responses and
//! equations. A formula is parsed once and can then be evaluated against any
//! [`Environment`] that supplies variable values.
//!
//! ## Syntax
//!
//! - numbers: `3`, `0.25`, `.5`, `1e-3`
//! - variable names, resolved through the environment
//! - `+ - * /`, `**` (right-associative, binding tighter than unary sign),
//!   unary `+` and `-`, parentheses
//! - calls to `min`, `max`, `clamp`, `sqrt`, `abs`, `sin`, `cos`, `tan`,
//!   `exp`, `log` and `rand`
//!
//! `clamp(x)` clamps to `[0, 1]`, `clamp(x, lo, hi)` to `[lo, hi]`. `min` and
//! `max` take any positive number of arguments. `rand()` is uniform in
//! `[0, 1)`. Any other call fails with [`EvalError::FunctionNotAllowed`].
//!
//! ## Example
//!
//! ```
//! use istinbat_formula::Formula;
//!
//! let formula = Formula::parse("clamp(value - 0.4 * action_value)").unwrap();
//! let value = formula.evaluate(&[("value", 0.6), ("action_value", 1.0)]).unwrap();
//! assert!((value - 0.2).abs() < 1e-12);
//! ```

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use tracing::trace;

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod tokenizer;

pub use ast::Expr;
pub use error::{EvalError, EvalResult, FormulaError, ParseError, ParseResult};
pub use eval::{Environment, Function};

/// A parsed formula together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> ParseResult<Self> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Variable names the formula reads
    pub fn names(&self) -> Vec<&str> {
        self.expr.names()
    }

    /// Evaluate with the thread-local random number generator
    pub fn evaluate(&self, environment: &impl Environment) -> EvalResult<f64> {
        self.evaluate_with(environment, &mut rand::thread_rng())
    }

    /// Evaluate drawing `rand()` values from `rng`
    pub fn evaluate_with(&self, environment: &impl Environment, rng: &mut impl Rng) -> EvalResult<f64> {
        let value = eval::evaluate(&self.expr, environment, rng)?;
        trace!(formula = %self.source, value, "Evaluated formula");
        Ok(value)
    }

    /// Evaluate as a condition: any non-zero result holds
    pub fn holds(&self, environment: &impl Environment) -> EvalResult<bool> {
        Ok(self.evaluate(environment)? != 0.0)
    }
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parse and evaluate `source` in one step
pub fn evaluate(source: &str, environment: &impl Environment) -> Result<f64, FormulaError> {
    Ok(Formula::parse(source)?.evaluate(environment)?)
}
