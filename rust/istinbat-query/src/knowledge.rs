//! The per-predicate clause store behind every world

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::clause::{Clause, Fact, Modal};
use crate::substitution::Substitution;
use crate::term::{Functor, Renamer, Term};
use crate::unify::unify;

/// Generation reserved for renaming clause heads during retraction and
/// lookups, so they never collide with the caller's pattern variables.
/// Anonymous variables in patterns take the generation after it.
const LOOKUP_GENERATION: u64 = 0;

/// Clauses indexed by predicate, each list kept in insertion order
///
/// Clause lists are shared copy-on-write: cloning a knowledge base (to fork a
/// world, or to snapshot it for a running query) shares every list until one
/// side mutates it. Clauses themselves are never mutated once stored.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    predicates: IndexMap<Functor, Arc<Vec<Clause>>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause to its predicate
    pub fn assertz(&mut self, clause: impl Into<Clause>) {
        let clause = clause.into();
        debug!(clause = %clause, "assertz");
        Arc::make_mut(self.predicates.entry(clause.functor()).or_default()).push(clause);
    }

    /// Prepend a clause to its predicate
    pub fn asserta(&mut self, clause: impl Into<Clause>) {
        let clause = clause.into();
        debug!(clause = %clause, "asserta");
        Arc::make_mut(self.predicates.entry(clause.functor()).or_default()).insert(0, clause);
    }

    /// Remove the first clause whose head unifies with `pattern`
    pub fn retract(&mut self, pattern: &Term) -> bool {
        let Some(clauses) = pattern
            .functor()
            .and_then(|functor| self.predicates.get_index_of(&functor))
            .and_then(|index| self.predicates.get_index_mut(index))
            .map(|(_, clauses)| clauses)
        else {
            return false;
        };
        match clauses.iter().position(|clause| matches(clause.head(), pattern)) {
            Some(index) => {
                let removed = Arc::make_mut(clauses).remove(index);
                debug!(clause = %removed, "retract");
                true
            }
            None => false,
        }
    }

    /// Remove every clause whose head unifies with `pattern`, returning how many went
    pub fn retractall(&mut self, pattern: &Term) -> usize {
        let Some(clauses) = pattern
            .functor()
            .and_then(|functor| self.predicates.get_index_of(&functor))
            .and_then(|index| self.predicates.get_index_mut(index))
            .map(|(_, clauses)| clauses)
        else {
            return 0;
        };
        if !clauses.iter().any(|clause| matches(clause.head(), pattern)) {
            return 0;
        }
        let clauses = Arc::make_mut(clauses);
        let before = clauses.len();
        clauses.retain(|clause| !matches(clause.head(), pattern));
        let removed = before - clauses.len();
        debug!(pattern = %pattern, removed, "retractall");
        removed
    }

    /// Clauses stored for `functor`, or `None` if the predicate was never asserted
    pub fn clauses(&self, functor: &Functor) -> Option<&Arc<Vec<Clause>>> {
        self.predicates.get(functor)
    }

    pub fn contains(&self, clause: &Clause) -> bool {
        self.predicates
            .get(&clause.functor())
            .is_some_and(|clauses| clauses.contains(clause))
    }

    /// Every stored clause, predicate by predicate in first-assertion order
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.predicates.values().flat_map(|clauses| clauses.iter())
    }

    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.iter().filter_map(Clause::as_fact)
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Functor> {
        self.predicates.keys()
    }

    pub fn len(&self) -> usize {
        self.predicates.values().map(|clauses| clauses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored facts whose head unifies with `pattern` under `substitution`
    pub fn matching_facts<'a>(
        &'a self,
        pattern: &'a Term,
        substitution: &'a Substitution,
    ) -> impl Iterator<Item = &'a Fact> + 'a {
        let pattern = Renamer::anonymous_only(LOOKUP_GENERATION).rename(substitution.walk(pattern));
        pattern
            .functor()
            .and_then(|functor| self.predicates.get(&functor))
            .into_iter()
            .flat_map(|clauses| clauses.iter())
            .filter_map(Clause::as_fact)
            .filter(move |fact| {
                let head = Renamer::new(LOOKUP_GENERATION).rename(fact.head());
                unify(&pattern, &head, substitution.clone()).is_some()
            })
    }

    /// Is some fact matching `pattern` stored with necessity?
    pub fn is_necessary(&self, pattern: &Term, substitution: &Substitution) -> bool {
        self.matching_facts(pattern, substitution)
            .any(|fact| fact.modal() == Modal::Necessity)
    }

    /// Is some fact matching `pattern` stored as possible, necessary or plain?
    pub fn is_possible(&self, pattern: &Term, substitution: &Substitution) -> bool {
        // Every modal flavour counts, so any match will do
        self.matching_facts(pattern, substitution).next().is_some()
    }
}

fn matches(head: &Term, pattern: &Term) -> bool {
    let head = Renamer::new(LOOKUP_GENERATION).rename(head);
    let pattern = Renamer::anonymous_only(LOOKUP_GENERATION).rename(pattern);
    unify(&head, &pattern, Substitution::new()).is_some()
}
