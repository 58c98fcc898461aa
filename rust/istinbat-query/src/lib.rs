//! Istinbat Query Engine
//!
//! A backward-chaining inference engine over an in-memory deductive database.
//! On top of classic SLD resolution it supports:
//!
//! - probabilistic facts and rules, whose probabilities multiply along a proof;
//! - modal (necessity, possibility) and temporal (next, always, eventually,
//!   until) annotations on facts;
//! - named possible worlds that can be forked, switched and diffed;
//! - list patterns, cut, arithmetic and the meta-predicates `findall`,
//!   `bagof`, `setof` and `not`.
//!
//! ```
//! use istinbat_query::{Engine, Fact, Rule, Term};
//!
//! let mut engine = Engine::new();
//! engine.assertz(Fact::new(Term::compound("parent", [Term::atom("tom"), Term::atom("bob")])).unwrap());
//! engine.assertz(Fact::new(Term::compound("parent", [Term::atom("bob"), Term::atom("ann")])).unwrap());
//! engine.assertz(
//!     Rule::new(
//!         Term::compound("grandparent", [Term::var("X"), Term::var("Z")]),
//!         [
//!             Term::compound("parent", [Term::var("X"), Term::var("Y")]),
//!             Term::compound("parent", [Term::var("Y"), Term::var("Z")]),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let solution = engine
//!     .query(Term::compound("grandparent", [Term::var("G"), Term::atom("ann")]))
//!     .next()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(solution.get("G"), Some(&Term::atom("tom")));
//! assert_eq!(solution.probability(), 1.0);
//! ```

/// Arithmetic evaluation for `is/2` and comparisons.
pub mod arithmetic;
/// Facts, rules and their annotations.
pub mod clause;
/// Resolver configuration.
pub mod config;
/// Error types for the query engine.
pub mod error;
/// Per-predicate clause storage.
pub mod knowledge;
/// Integer and floating point constants.
pub mod number;
/// The resolution machine and its builtins.
pub mod resolver;
/// Answers produced by queries.
pub mod solution;
/// Variable bindings with an accumulated probability.
pub mod substitution;
/// Terms and functors.
pub mod term;
/// Batched changes to the active world.
pub mod transaction;
/// Unification with occurs check.
pub mod unify;
/// Possible worlds and the engine.
pub mod world;

pub use clause::{Clause, Fact, Modal, Rule, Temporal};
pub use config::ResolverConfig;
pub use error::{ClauseError, ClauseResult, QueryError, QueryResult};
pub use knowledge::KnowledgeBase;
pub use number::Number;
pub use resolver::{Query, Solutions};
pub use solution::Solution;
pub use substitution::Substitution;
pub use term::{Functor, Term};
pub use transaction::{Change, Commit, Transaction};
pub use unify::unify;
pub use world::{DEFAULT_WORLD, Difference, Engine};
