//! Goals the resolver proves itself instead of looking them up
//!
//! | Goal | Meaning |
//! |---|---|
//! | `true`, `fail` | trivially succeed / fail |
//! | `A = B`, `A \= B` | unify / not unifiable |
//! | `X is E` | evaluate `E` and unify with `X` |
//! | `A > B`, `<`, `>=`, `<=`, `==`, `!=` | numeric comparison |
//! | `findall/3`, `bagof/3`, `setof/3` | collect solutions of a goal |
//! | `not(G)`, `\+ G` | negation as failure |
//! | `probability(P)` | bind `P` to the probability of the proof so far |
//! | `prob_ge(T)`, `maybe`, `likely` | probability thresholds (0.5 / 0.8 by default) |
//! | `is_necessary(P)`, `is_possible(P)` | modal lookups against stored facts |

use tracing::trace;

use super::{Frame, Goals, Solutions};
use crate::arithmetic::{Comparison, evaluate};
use crate::error::QueryResult;
use crate::substitution::Substitution;
use crate::term::{CONJUNCTION, Term};
use crate::unify::unify;

/// Threshold `maybe` checks against when called without one
pub const MAYBE_THRESHOLD: f64 = 0.5;

/// Threshold `likely` checks against when called without one
pub const LIKELY_THRESHOLD: f64 = 0.8;

enum Outcome {
    Proved(Substitution),
    Failed,
    /// Not a builtin: look the goal up in the knowledge base
    Lookup,
}

impl From<Option<Substitution>> for Outcome {
    fn from(substitution: Option<Substitution>) -> Self {
        match substitution {
            Some(substitution) => Outcome::Proved(substitution),
            None => Outcome::Failed,
        }
    }
}

impl Outcome {
    fn check(holds: bool, substitution: &Substitution) -> Self {
        if holds {
            Outcome::Proved(substitution.clone())
        } else {
            Outcome::Failed
        }
    }
}

impl Solutions {
    /// Prove `goal`, already dereferenced, in front of `rest`
    pub(super) fn call(
        &mut self,
        goal: Term,
        depth: usize,
        rest: Goals,
        substitution: Substitution,
    ) -> QueryResult<()> {
        if let Term::Compound(compound) = &goal {
            if compound.functor() == CONJUNCTION && compound.arity() == 2 {
                // A conjunction reached through a variable: cuts inside it stay local
                let barrier = self.choices.len();
                self.pending = Some(Frame {
                    goals: rest.push_term(&goal, depth, barrier),
                    substitution,
                });
                return Ok(());
            }
        }

        match self.builtin(&goal, depth, &substitution)? {
            Outcome::Proved(substitution) => {
                self.pending = Some(Frame {
                    goals: rest,
                    substitution,
                });
                Ok(())
            }
            Outcome::Failed => {
                trace!(goal = %goal, "builtin failed");
                Ok(())
            }
            Outcome::Lookup => self.call_predicate(goal, depth, rest, substitution),
        }
    }

    fn builtin(&mut self, goal: &Term, depth: usize, substitution: &Substitution) -> QueryResult<Outcome> {
        let name = match goal {
            Term::Atom(name) => &**name,
            Term::Compound(compound) => compound.functor(),
            _ => return Ok(Outcome::Failed),
        };

        let outcome = match (name, goal.arguments()) {
            ("true", []) | ("!", []) => Outcome::Proved(substitution.clone()),
            ("fail" | "false", []) => Outcome::Failed,

            ("=", [left, right]) => unify(left, right, substitution.clone()).into(),
            ("\\=", [left, right]) => {
                Outcome::check(unify(left, right, substitution.clone()).is_none(), substitution)
            }

            ("is", [result, expression]) => evaluate(expression, substitution)
                .and_then(|value| unify(result, &Term::Number(value), substitution.clone()))
                .into(),
            (symbol, [left, right]) if Comparison::from_symbol(symbol).is_some() => {
                let holds = Comparison::from_symbol(symbol)
                    .and_then(|comparison| comparison.holds(left, right, substitution))
                    .unwrap_or(false);
                Outcome::check(holds, substitution)
            }

            ("findall", [template, inner, result]) => {
                let found = self.collect(template, inner, substitution, depth)?;
                unify(result, &Term::list(found), substitution.clone()).into()
            }
            ("bagof", [template, inner, result]) => {
                let found = self.collect(template, inner, substitution, depth)?;
                if found.is_empty() {
                    Outcome::Failed
                } else {
                    unify(result, &Term::list(found), substitution.clone()).into()
                }
            }
            ("setof", [template, inner, result]) => {
                let mut found = self.collect(template, inner, substitution, depth)?;
                if found.is_empty() {
                    Outcome::Failed
                } else {
                    found.sort();
                    found.dedup();
                    unify(result, &Term::list(found), substitution.clone()).into()
                }
            }
            ("not" | "\\+", [inner]) => {
                let provable = self.provable(inner, substitution, depth)?;
                Outcome::check(!provable, substitution)
            }

            ("probability", [probability]) => unify(
                probability,
                &Term::float(substitution.probability()),
                substitution.clone(),
            )
            .into(),
            ("prob_ge" | "maybe" | "likely", [threshold]) => {
                let holds = evaluate(threshold, substitution)
                    .is_some_and(|threshold| substitution.probability() >= threshold.as_f64());
                Outcome::check(holds, substitution)
            }
            ("maybe", []) => Outcome::check(substitution.probability() >= MAYBE_THRESHOLD, substitution),
            ("likely", []) => Outcome::check(substitution.probability() >= LIKELY_THRESHOLD, substitution),

            ("is_necessary", [pattern]) => {
                Outcome::check(self.knowledge.is_necessary(pattern, substitution), substitution)
            }
            ("is_possible", [pattern]) => {
                Outcome::check(self.knowledge.is_possible(pattern, substitution), substitution)
            }

            _ => Outcome::Lookup,
        };
        Ok(outcome)
    }

    /// Instantiate `template` under every solution of `goal`
    fn collect(
        &mut self,
        template: &Term,
        goal: &Term,
        substitution: &Substitution,
        depth: usize,
    ) -> QueryResult<Vec<Term>> {
        let mut inner = self.nested(goal, substitution, depth);
        let mut found = Vec::new();
        while let Some(solution) = inner.next_substitution() {
            found.push(solution?.resolve(template));
        }
        self.generation = inner.generation;
        trace!(goal = %goal, count = found.len(), "collected");
        Ok(found)
    }

    /// Does `goal` have at least one solution?
    fn provable(&mut self, goal: &Term, substitution: &Substitution, depth: usize) -> QueryResult<bool> {
        let mut inner = self.nested(goal, substitution, depth);
        let provable = inner.next_substitution().transpose()?.is_some();
        self.generation = inner.generation;
        Ok(provable)
    }
}
