use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::substitution::Substitution;
use crate::term::Term;

/// One answer to a query: the values of the query's variables and the
/// probability of the proof that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    bindings: BTreeMap<String, Term>,
    probability: f64,
}

impl Solution {
    pub(crate) fn new(variables: &[Arc<str>], substitution: &Substitution) -> Self {
        let bindings = variables
            .iter()
            .map(|name| (name.to_string(), substitution.resolve(&Term::Variable(name.clone()))))
            .collect();
        Self {
            bindings,
            probability: substitution.probability(),
        }
    }

    /// The value bound to a query variable; a leading `?` in `name` is ignored
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name.strip_prefix('?').unwrap_or(name))
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, term)| (name.as_str(), term))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            write!(f, "yes")?;
        }
        for (index, (name, term)) in self.bindings.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{name} = {term}")?;
        }
        write!(f, " (p={})", self.probability)
    }
}
