//! Evaluation of formula expressions.
//!
//! Arithmetic is done in `f64`. Any operation whose result is NaN or
//! infinite is an error, as is division by zero; nothing is silently
//! replaced by a default.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rand::Rng;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{EvalError, EvalResult};

/// Source of variable values during evaluation
pub trait Environment {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn lookup(&self, name: &str) -> Option<f64> {
        (**self).lookup(name)
    }
}

impl<S: std::hash::BuildHasher> Environment for HashMap<String, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Environment for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Environment for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| *value)
    }
}

impl<const N: usize> Environment for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.as_slice().lookup(name)
    }
}

/// The functions a formula may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Clamp,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Rand,
}

impl Function {
    pub const ALL: [Function; 11] = [
        Function::Min,
        Function::Max,
        Function::Clamp,
        Function::Sqrt,
        Function::Abs,
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Exp,
        Function::Log,
        Function::Rand,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|function| function.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Clamp => "clamp",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Rand => "rand",
        }
    }

    /// Inclusive bounds on the number of arguments; `None` means unbounded
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Min | Function::Max => (1, None),
            Function::Clamp => (1, Some(3)),
            Function::Log => (1, Some(2)),
            Function::Rand => (0, Some(0)),
            _ => (1, Some(1)),
        }
    }

    fn check_arity(&self, given: usize) -> EvalResult<()> {
        let (least, most) = self.arity();
        if given >= least && most.is_none_or(|most| given <= most) {
            return Ok(());
        }
        let expected = match most {
            None => format!("at least {least}"),
            Some(most) if most == least => format!("{least}"),
            Some(most) => format!("{least} to {most}"),
        };
        Err(EvalError::Arity {
            function: self.name().to_string(),
            expected,
            given,
        })
    }

    fn apply(&self, arguments: &[f64], rng: &mut impl Rng) -> EvalResult<f64> {
        self.check_arity(arguments.len())?;
        let value = match self {
            Function::Min => arguments.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => arguments.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Clamp => {
                let low = arguments.get(1).copied().unwrap_or(0.0);
                let high = arguments.get(2).copied().unwrap_or(1.0);
                low.max(high.min(arguments[0]))
            }
            Function::Sqrt => arguments[0].sqrt(),
            Function::Abs => arguments[0].abs(),
            Function::Sin => arguments[0].sin(),
            Function::Cos => arguments[0].cos(),
            Function::Tan => arguments[0].tan(),
            Function::Exp => arguments[0].exp(),
            Function::Log => match arguments.get(1) {
                Some(base) => arguments[0].ln() / base.ln(),
                None => arguments[0].ln(),
            },
            Function::Rand => rng.gen_range(0.0..1.0),
        };
        finite(value, self.name())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn finite(value: f64, operation: &str) -> EvalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite {
            operation: operation.to_string(),
        })
    }
}

fn binary(op: BinaryOp, left: f64, right: f64) -> EvalResult<f64> {
    let value = match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => {
            if right == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            left / right
        }
        BinaryOp::Power => {
            if left == 0.0 && right < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            left.powf(right)
        }
    };
    finite(value, op.symbol())
}

/// Evaluate `expr` against `environment`, drawing `rand()` values from `rng`.
pub fn evaluate(expr: &Expr, environment: &impl Environment, rng: &mut impl Rng) -> EvalResult<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Name(name) => environment
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownName { name: name.clone() }),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, environment, rng)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, environment, rng)?;
            let right = evaluate(right, environment, rng)?;
            binary(*op, left, right)
        }
        Expr::Call { function, arguments } => {
            let Some(allowed) = Function::from_name(function) else {
                return Err(EvalError::FunctionNotAllowed {
                    name: function.clone(),
                });
            };
            let values = arguments
                .iter()
                .map(|argument| evaluate(argument, environment, rng))
                .collect::<EvalResult<Vec<f64>>>()?;
            allowed.apply(&values, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn eval(source: &str, environment: &[(&str, f64)]) -> EvalResult<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        evaluate(&parse(source).unwrap(), &environment, &mut rng)
    }

    #[test]
    fn it_follows_arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3", &[]), Ok(7.0));
        assert_eq!(eval("-2 ** 2", &[]), Ok(-4.0));
        assert_eq!(eval("2 ** 3 ** 2", &[]), Ok(512.0));
        assert_eq!(eval("2 ** -1", &[]), Ok(0.5));
        assert_eq!(eval("7 / 2", &[]), Ok(3.5));
    }

    #[test]
    fn it_reads_the_environment() {
        let environment = [("value", 0.6), ("action_value", 1.0)];
        let result = eval("value - 0.4*action_value", &environment).unwrap();
        assert!((result - 0.2).abs() < 1e-12);
        assert_eq!(
            eval("power", &environment),
            Err(EvalError::UnknownName {
                name: "power".into()
            })
        );
    }

    #[test]
    fn it_applies_allowed_functions() {
        assert_eq!(eval("clamp(1.5)", &[]), Ok(1.0));
        assert_eq!(eval("clamp(-3)", &[]), Ok(0.0));
        assert_eq!(eval("clamp(15, 0, 10)", &[]), Ok(10.0));
        assert_eq!(eval("min(3, 1, 2)", &[]), Ok(1.0));
        assert_eq!(eval("max(3, 1, 2)", &[]), Ok(3.0));
        assert_eq!(eval("sqrt(16) + abs(-2)", &[]), Ok(6.0));
        assert!((eval("log(8, 2)", &[]).unwrap() - 3.0).abs() < 1e-12);
        let sample = eval("rand()", &[]).unwrap();
        assert!((0.0..1.0).contains(&sample));
    }

    #[test]
    fn it_rejects_disallowed_calls() {
        assert_eq!(
            eval("system(1)", &[]),
            Err(EvalError::FunctionNotAllowed {
                name: "system".into()
            })
        );
        // A function name without a call is just an unknown name
        assert_eq!(
            eval("rand", &[]),
            Err(EvalError::UnknownName { name: "rand".into() })
        );
        assert!(matches!(eval("rand(1)", &[]), Err(EvalError::Arity { .. })));
        assert!(matches!(eval("sqrt()", &[]), Err(EvalError::Arity { .. })));
        assert!(matches!(eval("min()", &[]), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn it_fails_loudly_on_bad_arithmetic() {
        assert_eq!(eval("1 / 0", &[]), Err(EvalError::DivisionByZero));
        assert_eq!(eval("0 ** -1", &[]), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("sqrt(-1)", &[]), Err(EvalError::NonFinite { .. })));
        assert!(matches!(eval("log(0)", &[]), Err(EvalError::NonFinite { .. })));
        assert!(matches!(eval("10 ** 400", &[]), Err(EvalError::NonFinite { .. })));
    }
}
