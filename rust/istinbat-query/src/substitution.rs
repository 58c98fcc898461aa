use std::collections::BTreeMap;
use std::sync::Arc;

use crate::term::{ListCell, Term};

/// Variable bindings accumulated along one proof, plus the probability of
/// that proof so far
///
/// Cloning a substitution is cheap: bindings are shared until one of the
/// copies is extended, at which point that copy takes its own map.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    bindings: Arc<BTreeMap<Arc<str>, Term>>,
    probability: f64,
}

impl Default for Substitution {
    fn default() -> Self {
        Self::new()
    }
}

impl Substitution {
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(BTreeMap::new()),
            probability: 1.0,
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Multiply the accumulated probability by `factor`
    pub fn scale(mut self, factor: f64) -> Self {
        self.probability *= factor;
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The term a variable is directly bound to, if any
    pub fn lookup(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, term)| (&**name, term))
    }

    /// Bind `name` to `term`, without any consistency check
    pub(crate) fn bind(mut self, name: Arc<str>, term: Term) -> Self {
        Arc::make_mut(&mut self.bindings).insert(name, term);
        self
    }

    /// Follow variable bindings until reaching a non-variable or an unbound variable
    pub fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        let mut current = term;
        while let Term::Variable(name) = current {
            match self.bindings.get(name) {
                Some(bound) => current = bound,
                None => break,
            }
        }
        current
    }

    /// Apply the substitution all the way down, leaving only unbound variables
    pub fn resolve(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(compound) => Term::compound(
                compound.functor(),
                compound.arguments().iter().map(|argument| self.resolve(argument)),
            ),
            Term::List(_) => self.resolve_list(self.walk(term)),
            other => other.clone(),
        }
    }

    fn resolve_list(&self, list: &Term) -> Term {
        // Lists can be long, so walk the spine iteratively
        let mut heads = Vec::new();
        let mut cursor = list;
        let tail = loop {
            match cursor {
                Term::List(cell) => {
                    heads.push(self.resolve(&cell.head));
                    cursor = self.walk(&cell.tail);
                }
                Term::Compound(_) => break self.resolve(cursor),
                other => break other.clone(),
            }
        };
        heads.into_iter().rev().fold(tail, |tail, head| {
            Term::List(Arc::new(ListCell { head, tail }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_dereferences_binding_chains() {
        let substitution = Substitution::new()
            .bind("X".into(), Term::var("Y"))
            .bind("Y".into(), Term::atom("tom"));
        assert_eq!(substitution.walk(&Term::var("X")), &Term::atom("tom"));
        assert_eq!(substitution.walk(&Term::var("Z")), &Term::var("Z"));
    }

    #[test]
    fn it_resolves_nested_structures() {
        let substitution = Substitution::new()
            .bind("T".into(), Term::list([Term::var("X")]))
            .bind("X".into(), Term::integer(3));
        let term = Term::compound(
            "p",
            [Term::list_pattern([Term::integer(1)], Term::var("T"))],
        );
        assert_eq!(substitution.resolve(&term).to_string(), "p([1, 3])");
    }

    #[test]
    fn copies_do_not_see_each_others_bindings() {
        let base = Substitution::new().bind("X".into(), Term::integer(1));
        let extended = base.clone().bind("Y".into(), Term::integer(2));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn scaling_multiplies_probability() {
        let substitution = Substitution::new().scale(0.5).scale(0.4);
        assert!((substitution.probability() - 0.2).abs() < 1e-12);
    }
}
