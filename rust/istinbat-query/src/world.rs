//! Named possible worlds and the engine that switches between them
//!
//! An [`Engine`] owns a set of worlds, each an independent [`KnowledgeBase`].
//! Exactly one world is active; assertions, retractions and queries all go to
//! it. Forking a world copies its clause index; the clauses themselves are
//! immutable and shared, and each predicate's clause list is copied the first
//! time either world changes it, so a change in one world is never visible in
//! another.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clause::{Clause, Fact, Modal, Temporal};
use crate::config::ResolverConfig;
use crate::error::QueryResult;
use crate::knowledge::KnowledgeBase;
use crate::resolver::{Query, Solutions};
use crate::substitution::Substitution;
use crate::term::Term;
use crate::transaction::{Commit, Transaction};

/// The world every engine starts in
pub const DEFAULT_WORLD: &str = "Reality";

static EMPTY: LazyLock<KnowledgeBase> = LazyLock::new(KnowledgeBase::new);

/// A clause present in only one of two compared worlds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Difference {
    /// Present in the second world only
    Added(Clause),
    /// Present in the first world only
    Removed(Clause),
}

impl Difference {
    pub fn clause(&self) -> &Clause {
        match self {
            Difference::Added(clause) | Difference::Removed(clause) => clause,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::Added(clause) => write!(f, "[+ ADDED] {clause}"),
            Difference::Removed(clause) => write!(f, "[- REMOVED] {clause}"),
        }
    }
}

/// The inference engine: a set of named worlds, one of them active
#[derive(Debug, Clone)]
pub struct Engine {
    worlds: IndexMap<String, Arc<KnowledgeBase>>,
    active: String,
    config: ResolverConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with an empty `Reality` world and the default configuration
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        let mut worlds = IndexMap::new();
        worlds.insert(DEFAULT_WORLD.to_string(), Arc::new(KnowledgeBase::new()));
        Self {
            worlds,
            active: DEFAULT_WORLD.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The knowledge base of the active world
    pub fn knowledge(&self) -> &KnowledgeBase {
        self.worlds
            .get(&self.active)
            .map(Arc::as_ref)
            .unwrap_or(&*EMPTY)
    }

    fn knowledge_mut(&mut self) -> &mut KnowledgeBase {
        Arc::make_mut(self.worlds.entry(self.active.clone()).or_default())
    }

    pub fn assertz(&mut self, clause: impl Into<Clause>) {
        self.knowledge_mut().assertz(clause);
    }

    pub fn asserta(&mut self, clause: impl Into<Clause>) {
        self.knowledge_mut().asserta(clause);
    }

    pub fn retract(&mut self, pattern: &Term) -> bool {
        self.knowledge_mut().retract(pattern)
    }

    pub fn retractall(&mut self, pattern: &Term) -> usize {
        self.knowledge_mut().retractall(pattern)
    }

    /// Lazily prove a goal, or a conjunction of goals, in the active world
    pub fn query(&self, query: impl Into<Query>) -> Solutions {
        let query = query.into();
        let knowledge = self
            .worlds
            .get(&self.active)
            .cloned()
            .unwrap_or_default();
        Solutions::new(knowledge, self.config.clone(), query.goals())
    }

    /// Does the query have at least one solution?
    pub fn ask(&self, query: impl Into<Query>) -> QueryResult<bool> {
        Ok(self.query(query).next().transpose()?.is_some())
    }

    /// Start a batch of changes; see [`Engine::commit`]
    pub fn edit(&self) -> Transaction {
        Transaction::new()
    }

    /// Apply a batch of changes to the active world
    pub fn commit(&mut self, transaction: Transaction) -> Commit {
        let changes = transaction.len();
        let commit = transaction.apply(self.knowledge_mut());
        debug!(
            world = %self.active,
            changes,
            asserted = commit.asserted,
            retracted = commit.retracted,
            "Committed transaction"
        );
        commit
    }

    /// Fork `parent` (or the active world) under a new name
    ///
    /// Returns `false` if `name` is taken or `parent` does not exist.
    pub fn create_world(&mut self, name: &str, parent: Option<&str>) -> bool {
        if self.worlds.contains_key(name) {
            return false;
        }
        let parent = parent.unwrap_or(self.active.as_str());
        let Some(knowledge) = self.worlds.get(parent) else {
            return false;
        };
        // Copy the index now so later changes in either world stay local
        let knowledge = Arc::new(KnowledgeBase::clone(knowledge));
        debug!(world = name, parent, "Created world");
        self.worlds.insert(name.to_string(), knowledge);
        true
    }

    pub fn switch_world(&mut self, name: &str) -> bool {
        if !self.worlds.contains_key(name) {
            return false;
        }
        debug!(from = %self.active, to = name, "Switched world");
        self.active = name.to_string();
        true
    }

    pub fn current_world(&self) -> &str {
        &self.active
    }

    /// World names in creation order
    pub fn worlds(&self) -> impl Iterator<Item = &str> {
        self.worlds.keys().map(String::as_str)
    }

    /// Delete a world; the active world and `Reality` cannot be removed
    pub fn remove_world(&mut self, name: &str) -> bool {
        if name == self.active || name == DEFAULT_WORLD {
            return false;
        }
        let removed = self.worlds.shift_remove(name).is_some();
        if removed {
            debug!(world = name, "Removed world");
        }
        removed
    }

    /// Clauses removed from `from` and added in `to`, compared by their printed form
    ///
    /// Returns `None` if either world does not exist.
    pub fn compare_worlds(&self, from: &str, to: &str) -> Option<Vec<Difference>> {
        let before = self.worlds.get(from)?;
        let after = self.worlds.get(to)?;
        let printed = |knowledge: &KnowledgeBase| -> IndexSet<String> {
            knowledge.iter().map(ToString::to_string).collect()
        };
        let (before_printed, after_printed) = (printed(&**before), printed(&**after));

        let mut differences = Vec::new();
        let mut seen = IndexSet::new();
        for clause in before.iter() {
            let key = clause.to_string();
            if !after_printed.contains(&key) && seen.insert(key) {
                differences.push(Difference::Removed(clause.clone()));
            }
        }
        seen.clear();
        for clause in after.iter() {
            let key = clause.to_string();
            if !before_printed.contains(&key) && seen.insert(key) {
                differences.push(Difference::Added(clause.clone()));
            }
        }
        Some(differences)
    }

    fn annotate(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>, modal: Modal, temporal: Temporal) {
        let head = Term::compound(predicate, arguments);
        // A predicate name always yields a callable head
        if let Ok(fact) = Fact::new(head) {
            self.assertz(fact.with_modal(modal).with_temporal(temporal));
        }
    }

    /// Assert `predicate(arguments…)` as necessarily true
    pub fn must(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::Necessity, Temporal::None);
    }

    /// Assert `predicate(arguments…)` as possibly true
    pub fn can(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::Possibility, Temporal::None);
    }

    pub fn always(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::None, Temporal::Always);
    }

    pub fn eventually(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::None, Temporal::Eventually);
    }

    pub fn next(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::None, Temporal::Next);
    }

    pub fn until(&mut self, predicate: &str, arguments: impl IntoIterator<Item = Term>) {
        self.annotate(predicate, arguments, Modal::None, Temporal::Until);
    }

    /// Is `predicate(arguments…)` stored as a necessary fact?
    pub fn is_necessary(&self, predicate: &str, arguments: impl IntoIterator<Item = Term>) -> bool {
        let pattern = Term::compound(predicate, arguments);
        self.knowledge().is_necessary(&pattern, &Substitution::new())
    }

    /// Is `predicate(arguments…)` stored as possible, necessary or plainly true?
    pub fn is_possible(&self, predicate: &str, arguments: impl IntoIterator<Item = Term>) -> bool {
        let pattern = Term::compound(predicate, arguments);
        self.knowledge().is_possible(&pattern, &Substitution::new())
    }

    /// Stored facts matching `pattern` that carry a temporal annotation
    pub fn temporal(&self, pattern: &Term) -> Vec<(Fact, Temporal)> {
        self.facts_with(pattern, |fact| fact.temporal() != Temporal::None)
            .into_iter()
            .map(|fact| {
                let temporal = fact.temporal();
                (fact, temporal)
            })
            .collect()
    }

    /// Stored facts matching `pattern` and accepted by `filter`
    pub fn facts_with(&self, pattern: &Term, filter: impl Fn(&Fact) -> bool) -> Vec<Fact> {
        let substitution = Substitution::new();
        self.knowledge()
            .matching_facts(pattern, &substitution)
            .filter(|&fact| filter(fact))
            .cloned()
            .collect()
    }
}
