use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric constant, either an integer or a floating point value
///
/// Integers and floats compare numerically, so `2` and `2.0` are the same
/// number for unification and ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// The value widened to a float
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// The value if this is an integer
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Integer(value) => Some(value),
            Number::Float(_) => None,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(value) => value.is_finite(),
        }
    }
}

/// The first float past `i64::MAX`; `i64::MIN` is its negation
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison; NaN sorts after every other number
impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Number::Integer(left), Number::Integer(right)) => left.cmp(&right),
            (Number::Float(left), Number::Float(right)) => compare_floats(left, right),
            (Number::Float(left), Number::Integer(right)) => compare_mixed(left, right),
            (Number::Integer(left), Number::Float(right)) => compare_mixed(right, left).reverse(),
        }
    }
}

fn compare_floats(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // Neither is NaN here, and `0.0` must equal `-0.0`
        (false, false) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    }
}

/// Compare a float against an integer without widening the integer
fn compare_mixed(float: f64, integer: i64) -> Ordering {
    if float.is_nan() || float >= TWO_POW_63 {
        return Ordering::Greater;
    }
    if float < -TWO_POW_63 {
        return Ordering::Less;
    }
    // In range, so the truncated value converts to i64 exactly
    let whole = float.trunc();
    (whole as i64).cmp(&integer).then_with(|| {
        if float > whole {
            Ordering::Greater
        } else if float < whole {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    })
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{value}"),
            // Keep a trailing `.0` so floats stay distinguishable from integers
            Number::Float(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 => {
                write!(f, "{value:.1}")
            }
            Number::Float(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert_eq!(Number::Integer(2), Number::Float(2.0));
        assert!(Number::Integer(2) < Number::Float(2.5));
        assert!(Number::Float(-1.0) < Number::Integer(0));
    }

    #[test]
    fn mixed_comparison_is_exact_near_the_integer_limits() {
        let edge = Number::Float(i64::MAX as f64);
        assert!(Number::Integer(i64::MAX) < edge);
        assert!(Number::Integer(i64::MAX - 1) < Number::Integer(i64::MAX));
        assert_ne!(Number::Integer(i64::MAX - 1), edge);
        assert_eq!(Number::Integer(i64::MIN), Number::Float(i64::MIN as f64));
        assert!(Number::Float(-0.5) > Number::Integer(-1));
        assert!(Number::Float(-0.5) < Number::Integer(0));
        assert_eq!(Number::Float(0.0), Number::Float(-0.0));
        assert!(Number::Float(f64::INFINITY) > Number::Integer(i64::MAX));
        assert!(Number::Float(f64::NEG_INFINITY) < Number::Integer(i64::MIN));
        assert!(Number::Float(f64::NAN) > Number::Float(f64::INFINITY));
        assert_eq!(Number::Float(f64::NAN), Number::Float(f64::NAN));
    }

    #[test]
    fn floats_keep_their_decimal_point() {
        assert_eq!(Number::Float(12.0).to_string(), "12.0");
        assert_eq!(Number::Float(0.25).to_string(), "0.25");
        assert_eq!(Number::Integer(12).to_string(), "12");
    }
}
