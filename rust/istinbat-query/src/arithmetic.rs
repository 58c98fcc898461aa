//! Arithmetic evaluation for `is/2` and the comparison goals
//!
//! Evaluation never raises. Unbound variables, non-numeric operands,
//! unknown operators and division by zero all yield `None`, which the
//! resolver turns into goal failure.
//!
//! Operators: binary `+ - * / % **`, unary `+ -`. `/` is always true
//! division; `%` takes the sign of the divisor; `**` stays integral when both
//! operands are integers and the exponent is non-negative. Integer results
//! that overflow fall back to floating point.

use crate::number::Number;
use crate::substitution::Substitution;
use crate::term::Term;

/// A numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparison::Greater),
            "<" => Some(Comparison::Less),
            ">=" => Some(Comparison::GreaterOrEqual),
            "<=" | "=<" => Some(Comparison::LessOrEqual),
            "==" | "=:=" => Some(Comparison::Equal),
            "!=" | "=\\=" => Some(Comparison::NotEqual),
            _ => None,
        }
    }

    /// Evaluate both sides and compare them; `None` if either side does not evaluate
    pub fn holds(self, left: &Term, right: &Term, substitution: &Substitution) -> Option<bool> {
        let left = evaluate(left, substitution)?;
        let right = evaluate(right, substitution)?;
        Some(match self {
            Comparison::Greater => left > right,
            Comparison::Less => left < right,
            Comparison::GreaterOrEqual => left >= right,
            Comparison::LessOrEqual => left <= right,
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
        })
    }
}

/// Evaluate `expression` under `substitution`
pub fn evaluate(expression: &Term, substitution: &Substitution) -> Option<Number> {
    let result = match substitution.walk(expression) {
        Term::Number(number) => *number,
        Term::Compound(compound) => match compound.arguments() {
            [operand] => {
                let operand = evaluate(operand, substitution)?;
                match compound.functor() {
                    "-" => negate(operand),
                    "+" => operand,
                    _ => return None,
                }
            }
            [left, right] => {
                let left = evaluate(left, substitution)?;
                let right = evaluate(right, substitution)?;
                match compound.functor() {
                    "+" => add(left, right),
                    "-" => subtract(left, right),
                    "*" => multiply(left, right),
                    "/" => divide(left, right)?,
                    "%" | "mod" => modulo(left, right)?,
                    "**" | "^" => power(left, right)?,
                    _ => return None,
                }
            }
            _ => return None,
        },
        _ => return None,
    };
    result.is_finite().then_some(result)
}

fn negate(operand: Number) -> Number {
    match operand {
        Number::Integer(value) => value
            .checked_neg()
            .map(Number::Integer)
            .unwrap_or(Number::Float(-(value as f64))),
        Number::Float(value) => Number::Float(-value),
    }
}

fn integral(
    left: Number,
    right: Number,
    checked: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Number {
    match (left, right) {
        (Number::Integer(a), Number::Integer(b)) => checked(a, b)
            .map(Number::Integer)
            .unwrap_or_else(|| Number::Float(float(a as f64, b as f64))),
        (a, b) => Number::Float(float(a.as_f64(), b.as_f64())),
    }
}

fn add(left: Number, right: Number) -> Number {
    integral(left, right, i64::checked_add, |a, b| a + b)
}

fn subtract(left: Number, right: Number) -> Number {
    integral(left, right, i64::checked_sub, |a, b| a - b)
}

fn multiply(left: Number, right: Number) -> Number {
    integral(left, right, i64::checked_mul, |a, b| a * b)
}

fn divide(left: Number, right: Number) -> Option<Number> {
    if right.as_f64() == 0.0 {
        return None;
    }
    Some(Number::Float(left.as_f64() / right.as_f64()))
}

fn modulo(left: Number, right: Number) -> Option<Number> {
    if right.as_f64() == 0.0 {
        return None;
    }
    let result = match (left, right) {
        (Number::Integer(a), Number::Integer(b)) => Number::Integer(a.checked_rem_euclid(b).map(|r| {
            // rem_euclid is never negative; shift into the divisor's sign
            if b < 0 && r != 0 { r + b } else { r }
        })?),
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            let remainder = a % b;
            if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
                Number::Float(remainder + b)
            } else {
                Number::Float(remainder)
            }
        }
    };
    Some(result)
}

fn power(base: Number, exponent: Number) -> Option<Number> {
    if base.as_f64() == 0.0 && exponent.as_f64() < 0.0 {
        return None;
    }
    if let (Number::Integer(b), Number::Integer(e)) = (base, exponent) {
        if let Ok(e) = u32::try_from(e) {
            if let Some(result) = b.checked_pow(e) {
                return Some(Number::Integer(result));
            }
        }
    }
    Some(Number::Float(base.as_f64().powf(exponent.as_f64())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(symbol: &str, left: Term, right: Term) -> Term {
        Term::compound(symbol, [left, right])
    }

    fn eval(expression: &Term) -> Option<Number> {
        evaluate(expression, &Substitution::new())
    }

    #[test]
    fn it_evaluates_nested_expressions() {
        let expression = op(
            "+",
            Term::integer(1),
            op("*", Term::integer(2), Term::integer(3)),
        );
        assert_eq!(eval(&expression), Some(Number::Integer(7)));
    }

    #[test]
    fn division_is_true_division() {
        assert_eq!(
            eval(&op("/", Term::integer(7), Term::integer(2))),
            Some(Number::Float(3.5))
        );
    }

    #[test]
    fn division_and_modulo_by_zero_fail() {
        assert_eq!(eval(&op("/", Term::integer(1), Term::integer(0))), None);
        assert_eq!(eval(&op("%", Term::integer(1), Term::float(0.0))), None);
    }

    #[test]
    fn modulo_follows_the_sign_of_the_divisor() {
        assert_eq!(
            eval(&op("%", Term::integer(-7), Term::integer(3))),
            Some(Number::Integer(2))
        );
        assert_eq!(
            eval(&op("%", Term::integer(7), Term::integer(-3))),
            Some(Number::Integer(-2))
        );
        assert_eq!(
            eval(&op("%", Term::float(-7.5), Term::integer(2))),
            Some(Number::Float(0.5))
        );
    }

    #[test]
    fn powers_stay_integral_when_they_can() {
        assert_eq!(
            eval(&op("**", Term::integer(2), Term::integer(10))),
            Some(Number::Integer(1024))
        );
        assert_eq!(
            eval(&op("**", Term::integer(2), Term::integer(-1))),
            Some(Number::Float(0.5))
        );
        assert_eq!(eval(&op("**", Term::integer(0), Term::integer(-1))), None);
    }

    #[test]
    fn variables_must_be_bound_to_numbers() {
        let substitution = Substitution::new()
            .bind("N".into(), Term::integer(6))
            .bind("A".into(), Term::atom("six"));
        let doubled = op("*", Term::var("N"), Term::integer(2));
        assert_eq!(evaluate(&doubled, &substitution), Some(Number::Integer(12)));
        assert_eq!(evaluate(&Term::var("A"), &substitution), None);
        assert_eq!(evaluate(&Term::var("Unbound"), &substitution), None);
    }

    #[test]
    fn comparisons_mix_integers_and_floats() {
        let substitution = Substitution::new();
        assert_eq!(
            Comparison::Greater.holds(&Term::integer(12), &Term::float(10.5), &substitution),
            Some(true)
        );
        assert_eq!(
            Comparison::Equal.holds(&Term::integer(2), &Term::float(2.0), &substitution),
            Some(true)
        );
        assert_eq!(
            Comparison::Less.holds(&Term::atom("a"), &Term::integer(1), &substitution),
            None
        );
    }

    #[test]
    fn overflow_falls_back_to_floats() {
        let big = op("*", Term::integer(i64::MAX), Term::integer(2));
        assert_eq!(eval(&big), Some(Number::Float(i64::MAX as f64 * 2.0)));
    }
}
