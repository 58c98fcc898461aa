//! Batched knowledge base changes
//!
//! A [`Transaction`] accumulates changes without touching any world. Handing
//! it to [`Engine::commit`](crate::Engine::commit) applies the changes, in the
//! order they were added, to the world that is active at commit time.

use crate::clause::Clause;
use crate::knowledge::KnowledgeBase;
use crate::term::Term;

/// One pending change
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Append a clause (`assertz`)
    Assert(Clause),
    /// Prepend a clause (`asserta`)
    AssertFirst(Clause),
    /// Remove the first clause matching a pattern
    Retract(Term),
    /// Remove every clause matching a pattern
    RetractAll(Term),
}

/// What a commit did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit {
    pub asserted: usize,
    pub retracted: usize,
}

/// An ordered batch of changes
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    changes: Vec<Change>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assert(&mut self, clause: impl Into<Clause>) -> &mut Self {
        self.changes.push(Change::Assert(clause.into()));
        self
    }

    pub fn asserta(&mut self, clause: impl Into<Clause>) -> &mut Self {
        self.changes.push(Change::AssertFirst(clause.into()));
        self
    }

    pub fn retract(&mut self, pattern: Term) -> &mut Self {
        self.changes.push(Change::Retract(pattern));
        self
    }

    pub fn retract_all(&mut self, pattern: Term) -> &mut Self {
        self.changes.push(Change::RetractAll(pattern));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Apply every change to `knowledge`
    pub(crate) fn apply(self, knowledge: &mut KnowledgeBase) -> Commit {
        let mut commit = Commit::default();
        for change in self.changes {
            match change {
                Change::Assert(clause) => {
                    knowledge.assertz(clause);
                    commit.asserted += 1;
                }
                Change::AssertFirst(clause) => {
                    knowledge.asserta(clause);
                    commit.asserted += 1;
                }
                Change::Retract(pattern) => {
                    if knowledge.retract(&pattern) {
                        commit.retracted += 1;
                    }
                }
                Change::RetractAll(pattern) => commit.retracted += knowledge.retractall(&pattern),
            }
        }
        commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Fact;
    use pretty_assertions::assert_eq;

    #[test]
    fn changes_apply_in_order() {
        let state = |value: f64| {
            Fact::new(Term::compound(
                "state",
                [Term::atom("ali"), Term::atom("anger"), Term::float(value)],
            ))
            .unwrap()
        };
        let mut knowledge = KnowledgeBase::new();
        knowledge.assertz(state(0.1));

        let mut transaction = Transaction::new();
        transaction
            .retract_all(Term::compound(
                "state",
                [Term::atom("ali"), Term::atom("anger"), Term::anonymous()],
            ))
            .assert(state(0.7));
        assert_eq!(transaction.len(), 2);

        let commit = transaction.apply(&mut knowledge);
        assert_eq!(commit, Commit { asserted: 1, retracted: 1 });
        let heads: Vec<String> = knowledge.iter().map(|clause| clause.head().to_string()).collect();
        assert_eq!(heads, vec!["state(ali, anger, 0.7)"]);
    }
}
