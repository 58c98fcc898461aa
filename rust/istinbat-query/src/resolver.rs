//! Backward-chaining SLD resolution
//!
//! [`Solutions`] is a lazy iterator over the proofs of a query. It keeps an
//! explicit machine state instead of recursing:
//!
//! - a *frame*: the goals still to prove (a persistent list shared between
//!   alternatives) together with the substitution built so far;
//! - a stack of *choice points*, one per goal with clauses left to try.
//!
//! Proving a goal either rewrites the frame (builtins, facts, rule bodies) or
//! pushes a choice point. When a frame runs out of goals a solution is
//! emitted; when a goal fails the machine resumes the newest choice point.
//!
//! A cut in a rule body is compiled to [`Goal::Cut`] carrying the index of the
//! choice point for the clause that introduced it. Running the cut truncates
//! the choice stack to that index, discarding alternatives for the body goals
//! before it and the remaining clauses of the predicate. Meta-predicates run
//! their argument in a nested resolver, so cuts never escape them.

mod builtin;

use std::sync::Arc;

use tracing::{trace, warn};

use crate::clause::Clause;
use crate::config::ResolverConfig;
use crate::error::{QueryError, QueryResult};
use crate::knowledge::KnowledgeBase;
use crate::solution::Solution;
use crate::substitution::Substitution;
use crate::term::{ANONYMOUS, CONJUNCTION, CUT, Renamer, Term};
use crate::unify::unify;

#[derive(Clone)]
enum Goal {
    Call { term: Term, depth: usize },
    Cut { barrier: usize },
}

/// A persistent stack of goals; pushing never disturbs other holders of the tail
#[derive(Clone, Default)]
struct Goals(Option<Arc<GoalNode>>);

struct GoalNode {
    goal: Goal,
    rest: Goals,
}

impl Goals {
    fn push(self, goal: Goal) -> Goals {
        Goals(Some(Arc::new(GoalNode { goal, rest: self })))
    }

    fn pop(&self) -> Option<(Goal, Goals)> {
        self.0
            .as_ref()
            .map(|node| (node.goal.clone(), node.rest.clone()))
    }

    /// Push `term` as a goal, splitting conjunctions and compiling cuts to `barrier`
    fn push_term(self, term: &Term, depth: usize, barrier: usize) -> Goals {
        match term {
            Term::Atom(name) if &**name == CUT => self.push(Goal::Cut { barrier }),
            Term::Compound(compound) if compound.functor() == CONJUNCTION && compound.arity() == 2 => {
                let [first, second] = compound.arguments() else {
                    return self;
                };
                self.push_term(second, depth, barrier)
                    .push_term(first, depth, barrier)
            }
            _ => self.push(Goal::Call {
                term: term.clone(),
                depth,
            }),
        }
    }

    /// Push a conjunction so that `body[0]` is proven first
    fn prepend(self, body: &[Term], depth: usize, barrier: usize) -> Goals {
        body.iter()
            .rev()
            .fold(self, |goals, term| goals.push_term(term, depth, barrier))
    }
}

impl Drop for Goals {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one at a time so long goal lists do not
        // recurse on drop
        let mut next = self.0.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.rest.0.take(),
                Err(_) => break,
            }
        }
    }
}

struct Frame {
    goals: Goals,
    substitution: Substitution,
}

/// Clauses left to try for one call
struct Choice {
    goal: Term,
    depth: usize,
    clauses: Arc<Vec<Clause>>,
    next: usize,
    goals: Goals,
    substitution: Substitution,
}

/// The goals of a query, proven left to right as a conjunction
#[derive(Debug, Clone, PartialEq)]
pub struct Query(Vec<Term>);

impl Query {
    pub fn goals(&self) -> &[Term] {
        &self.0
    }
}

impl From<Term> for Query {
    fn from(goal: Term) -> Self {
        Query(vec![goal])
    }
}

impl From<Vec<Term>> for Query {
    fn from(goals: Vec<Term>) -> Self {
        Query(goals)
    }
}

impl<const N: usize> From<[Term; N]> for Query {
    fn from(goals: [Term; N]) -> Self {
        Query(goals.into())
    }
}

impl From<&[Term]> for Query {
    fn from(goals: &[Term]) -> Self {
        Query(goals.to_vec())
    }
}

/// Lazy stream of the solutions to a query
///
/// The resolver works on a snapshot of the knowledge base taken when the
/// query started; assertions made while it is being consumed are not seen.
/// Dropping the iterator abandons the search.
pub struct Solutions {
    knowledge: Arc<KnowledgeBase>,
    config: ResolverConfig,
    variables: Vec<Arc<str>>,
    generation: u64,
    pending: Option<Frame>,
    choices: Vec<Choice>,
    exhausted: bool,
}

impl Solutions {
    /// Prove the conjunction of `goals` against `knowledge`
    pub fn new(knowledge: Arc<KnowledgeBase>, config: ResolverConfig, goals: &[Term]) -> Self {
        let mut variables: Vec<Arc<str>> = Vec::new();
        for name in goals.iter().flat_map(Term::variables) {
            if &*name != ANONYMOUS && !variables.contains(&name) {
                variables.push(name);
            }
        }
        let mut solutions = Self::start(knowledge, config, goals, Substitution::new(), 1, 0);
        solutions.variables = variables;
        solutions
    }

    fn start(
        knowledge: Arc<KnowledgeBase>,
        config: ResolverConfig,
        goals: &[Term],
        substitution: Substitution,
        depth: usize,
        generation: u64,
    ) -> Self {
        let mut renamer = Renamer::anonymous_only(generation);
        let goals: Vec<Term> = goals.iter().map(|goal| renamer.rename(goal)).collect();
        Self {
            knowledge,
            config,
            variables: Vec::new(),
            generation: renamer.generation(),
            pending: Some(Frame {
                goals: Goals::default().prepend(&goals, depth, 0),
                substitution,
            }),
            choices: Vec::new(),
            exhausted: false,
        }
    }

    /// A resolver for `goal` that shares this one's knowledge, bindings and
    /// fresh-name counter but has its own choice stack
    fn nested(&self, goal: &Term, substitution: &Substitution, depth: usize) -> Solutions {
        Solutions::start(
            self.knowledge.clone(),
            self.config.clone(),
            std::slice::from_ref(goal),
            substitution.clone(),
            depth + 1,
            self.generation,
        )
    }

    /// Advance to the next proof, returning its raw substitution
    pub(crate) fn next_substitution(&mut self) -> Option<QueryResult<Substitution>> {
        if self.exhausted {
            return None;
        }
        loop {
            let frame = match self.pending.take() {
                Some(frame) => frame,
                None => match self.backtrack() {
                    Some(frame) => frame,
                    None => {
                        self.exhausted = true;
                        return None;
                    }
                },
            };
            let Some((goal, rest)) = frame.goals.pop() else {
                return Some(Ok(frame.substitution));
            };
            if let Err(error) = self.step(goal, rest, frame.substitution) {
                self.exhausted = true;
                self.choices.clear();
                return Some(Err(error));
            }
        }
    }

    fn step(&mut self, goal: Goal, rest: Goals, substitution: Substitution) -> QueryResult<()> {
        match goal {
            Goal::Cut { barrier } => {
                trace!(barrier, discarded = self.choices.len().saturating_sub(barrier), "cut");
                self.choices.truncate(barrier);
                self.pending = Some(Frame {
                    goals: rest,
                    substitution,
                });
                Ok(())
            }
            Goal::Call { term, depth } => {
                if depth > self.config.max_depth {
                    warn!(limit = self.config.max_depth, goal = %term, "Recursion depth exceeded, aborting query");
                    return Err(QueryError::DepthExceeded {
                        limit: self.config.max_depth,
                    });
                }
                let term = substitution.walk(&term).clone();
                trace!(goal = %term, depth, "call");
                self.call(term, depth, rest, substitution)
            }
        }
    }

    /// Open a choice point over the clauses stored for `goal`
    fn call_predicate(
        &mut self,
        goal: Term,
        depth: usize,
        rest: Goals,
        substitution: Substitution,
    ) -> QueryResult<()> {
        let Some(functor) = goal.functor() else {
            trace!(goal = %goal, "not callable");
            return Ok(());
        };
        let Some(clauses) = self.knowledge.clauses(&functor).cloned() else {
            if self.config.strict {
                return Err(QueryError::UnknownPredicate {
                    name: functor.name().to_string(),
                    arity: functor.arity(),
                });
            }
            trace!(predicate = %functor, "unknown predicate");
            return Ok(());
        };
        if !clauses.is_empty() {
            self.choices.push(Choice {
                goal,
                depth,
                clauses,
                next: 0,
                goals: rest,
                substitution,
            });
        }
        Ok(())
    }

    /// Try the remaining clauses of the newest choice point until one applies
    fn backtrack(&mut self) -> Option<Frame> {
        loop {
            let barrier = self.choices.len().checked_sub(1)?;
            let choice = &mut self.choices[barrier];
            let index = choice.next;
            choice.next += 1;
            let clauses = choice.clauses.clone();
            let goal = choice.goal.clone();
            let depth = choice.depth;
            let goals = choice.goals.clone();
            let substitution = choice.substitution.clone();
            if choice.next >= clauses.len() {
                // Last alternative: the choice point is spent
                self.choices.pop();
            }
            let Some(clause) = clauses.get(index) else {
                continue;
            };
            if let Some(frame) = self.resolve(clause, &goal, depth, barrier, goals, substitution) {
                return Some(frame);
            }
        }
    }

    fn resolve(
        &mut self,
        clause: &Clause,
        goal: &Term,
        depth: usize,
        barrier: usize,
        goals: Goals,
        substitution: Substitution,
    ) -> Option<Frame> {
        match clause {
            Clause::Fact(fact) if fact.is_ground() => {
                let substitution = unify(goal, fact.head(), substitution)?;
                trace!(fact = %fact, "fact matched");
                Some(Frame {
                    goals,
                    substitution: substitution.scale(fact.probability()),
                })
            }
            Clause::Fact(fact) => {
                let mut renamer = self.renamer();
                let substitution = unify(goal, &renamer.rename(fact.head()), substitution)?;
                trace!(fact = %fact, "fact matched");
                Some(Frame {
                    goals,
                    substitution: substitution.scale(fact.probability()),
                })
            }
            Clause::Rule(rule) => {
                let mut renamer = self.renamer();
                let substitution = unify(goal, &renamer.rename(rule.head()), substitution)?;
                let body: Vec<Term> = rule.body().iter().map(|term| renamer.rename(term)).collect();
                trace!(rule = %rule, "rule matched");
                Some(Frame {
                    goals: goals.prepend(&body, depth + 1, barrier),
                    substitution: substitution.scale(rule.probability()),
                })
            }
        }
    }

    fn renamer(&mut self) -> Renamer {
        self.generation += 1;
        Renamer::new(self.generation)
    }
}

impl Iterator for Solutions {
    type Item = QueryResult<Solution>;

    fn next(&mut self) -> Option<Self::Item> {
        let substitution = match self.next_substitution()? {
            Ok(substitution) => substitution,
            Err(error) => return Some(Err(error)),
        };
        Some(Ok(Solution::new(&self.variables, &substitution)))
    }
}
