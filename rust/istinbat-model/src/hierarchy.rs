//! Ordered sequences, cycles and trees expressed as facts
//!
//! Each definition writes its facts into the active world of an [`Engine`] in
//! a single transaction:
//!
//! | Structure | Facts |
//! |-----------|-------|
//! | sequence `S = [x1 … xn]` | `member(S, xi)`, `order(S, xi, i)`, `first(S, x1)`, `last(S, xn)`, `next(S, xi, xi+1)`, `prev(S, xi+1, xi)` |
//! | cycle | the sequence facts, `next(S, xn, x1)`, `prev(S, x1, xn)`, `is_cycle(S)`, `cause(xi, xi+1)` wrapping around, with p = 0.9 and `next` timing |
//! | tree `T` rooted at `r` | `root(T, r)`, `parent(T, p, c)`, `child(T, c, p)` |
//!
//! The first definition in a world also installs the `ancestor/3` rules and
//! the `property/4` inheritance rule.

use indexmap::IndexMap;
use istinbat_query::{Clause, Engine, Fact, Rule, Temporal, Term, Transaction};
use tracing::debug;

use crate::error::{HierarchyError, HierarchyResult};

/// Probability of `cause/2` facts between consecutive cycle items
pub const CYCLE_CAUSE_PROBABILITY: f64 = 0.9;

fn atom(name: &str) -> Term {
    Term::atom(name)
}

fn fact<const N: usize>(predicate: &str, arguments: [Term; N]) -> HierarchyResult<Fact> {
    Ok(Fact::new(Term::compound(predicate, arguments))?)
}

/// A tree: a root and, for each parent, its children in order
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: String,
    children: IndexMap<String, Vec<String>>,
}

impl Tree {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn children(&self, parent: &str) -> &[String] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every `(parent, child)` edge, parents in definition order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children.iter().flat_map(|(parent, children)| {
            children
                .iter()
                .map(move |child| (parent.as_str(), child.as_str()))
        })
    }
}

/// The standing rules every structure relies on
fn standing_rules() -> HierarchyResult<Vec<Rule>> {
    let var = Term::var;
    let call = |name: &str, arguments: Vec<Term>| Term::compound(name, arguments);
    Ok(vec![
        Rule::new(
            call("ancestor", vec![var("Tree"), var("A"), var("B")]),
            [call("parent", vec![var("Tree"), var("A"), var("B")])],
        )?,
        Rule::new(
            call("ancestor", vec![var("Tree"), var("A"), var("C")]),
            [
                call("parent", vec![var("Tree"), var("A"), var("B")]),
                call("ancestor", vec![var("Tree"), var("B"), var("C")]),
            ],
        )?,
        Rule::new(
            call("property", vec![var("Tree"), var("Child"), var("Key"), var("Value")]),
            [
                call("ancestor", vec![var("Tree"), var("Parent"), var("Child")]),
                call("property", vec![var("Tree"), var("Parent"), var("Key"), var("Value")]),
            ],
        )?,
    ])
}

/// Registry of defined structures; facts live in the engine
///
/// The registry is not scoped to a world. A definition is remembered here
/// whichever world is active later, and lookups such as [`Hierarchy::sequence`]
/// and [`Hierarchy::validate_sequence`] keep answering after a switch. The
/// facts themselves are only written into the world that was active when the
/// structure was defined. Define it again to write it into another world.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    sequences: IndexMap<String, Vec<String>>,
    cycles: IndexMap<String, Vec<String>>,
    trees: IndexMap<String, Tree>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self, name: &str) -> Option<&[String]> {
        self.sequences.get(name).map(Vec::as_slice)
    }

    pub fn cycle(&self, name: &str) -> Option<&[String]> {
        self.cycles.get(name).map(Vec::as_slice)
    }

    pub fn tree(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    /// Queue the standing rules missing from the active world
    fn install_rules(engine: &Engine, transaction: &mut Transaction) -> HierarchyResult<()> {
        for rule in standing_rules()? {
            if !engine.knowledge().contains(&Clause::Rule(rule.clone())) {
                transaction.assert(rule);
            }
        }
        Ok(())
    }

    fn sequence_facts(name: &str, items: &[String], transaction: &mut Transaction) -> HierarchyResult<()> {
        let structure = atom(name);
        for (index, item) in items.iter().enumerate() {
            transaction.assert(fact("member", [structure.clone(), atom(item)])?);
            transaction.assert(fact(
                "order",
                [structure.clone(), atom(item), Term::integer(index as i64 + 1)],
            )?);
        }
        if let (Some(first), Some(last)) = (items.first(), items.last()) {
            transaction.assert(fact("first", [structure.clone(), atom(first)])?);
            transaction.assert(fact("last", [structure.clone(), atom(last)])?);
        }
        for pair in items.windows(2) {
            let (item, next) = (&pair[0], &pair[1]);
            transaction.assert(fact("next", [structure.clone(), atom(item), atom(next)])?);
            transaction.assert(fact("prev", [structure.clone(), atom(next), atom(item)])?);
        }
        Ok(())
    }

    fn collect(name: &str, items: impl IntoIterator<Item = impl Into<String>>) -> HierarchyResult<Vec<String>> {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(HierarchyError::Empty {
                name: name.to_string(),
            });
        }
        Ok(items)
    }

    /// Define the linear sequence `name` over `items`
    pub fn define_sequence(
        &mut self,
        engine: &mut Engine,
        name: &str,
        items: impl IntoIterator<Item = impl Into<String>>,
    ) -> HierarchyResult<()> {
        let items = Self::collect(name, items)?;
        let mut transaction = engine.edit();
        Self::install_rules(engine, &mut transaction)?;
        Self::sequence_facts(name, &items, &mut transaction)?;
        let commit = engine.commit(transaction);
        debug!(sequence = name, items = items.len(), asserted = commit.asserted, "Defined sequence");
        self.sequences.insert(name.to_string(), items);
        Ok(())
    }

    /// Define the cycle `name`: a sequence whose last item leads back to the first
    pub fn define_cycle(
        &mut self,
        engine: &mut Engine,
        name: &str,
        items: impl IntoIterator<Item = impl Into<String>>,
    ) -> HierarchyResult<()> {
        let items = Self::collect(name, items)?;
        let mut transaction = engine.edit();
        Self::install_rules(engine, &mut transaction)?;
        Self::sequence_facts(name, &items, &mut transaction)?;

        let structure = atom(name);
        // Non-empty, checked by collect
        let (first, last) = (&items[0], &items[items.len() - 1]);
        transaction.assert(fact("next", [structure.clone(), atom(last), atom(first)])?);
        transaction.assert(fact("prev", [structure.clone(), atom(first), atom(last)])?);
        transaction.assert(fact("is_cycle", [structure])?);

        for (index, item) in items.iter().enumerate() {
            let next = &items[(index + 1) % items.len()];
            transaction.assert(
                fact("cause", [atom(item), atom(next)])?
                    .with_probability(CYCLE_CAUSE_PROBABILITY)?
                    .with_temporal(Temporal::Next),
            );
        }

        let commit = engine.commit(transaction);
        debug!(cycle = name, items = items.len(), asserted = commit.asserted, "Defined cycle");
        self.cycles.insert(name.to_string(), items);
        Ok(())
    }

    /// Define the tree `name` rooted at `root` from a parent to children map
    pub fn define_hierarchy<P, C>(
        &mut self,
        engine: &mut Engine,
        name: &str,
        root: &str,
        structure: impl IntoIterator<Item = (P, Vec<C>)>,
    ) -> HierarchyResult<()>
    where
        P: Into<String>,
        C: Into<String>,
    {
        let mut children: IndexMap<String, Vec<String>> = IndexMap::new();
        for (parent, kids) in structure {
            children
                .entry(parent.into())
                .or_default()
                .extend(kids.into_iter().map(Into::into));
        }
        let tree = Tree {
            root: root.to_string(),
            children,
        };

        let mut transaction = engine.edit();
        Self::install_rules(engine, &mut transaction)?;
        let structure = atom(name);
        transaction.assert(fact("root", [structure.clone(), atom(root)])?);
        for (parent, child) in tree.edges() {
            transaction.assert(fact("parent", [structure.clone(), atom(parent), atom(child)])?);
            transaction.assert(fact("child", [structure.clone(), atom(child), atom(parent)])?);
        }

        let commit = engine.commit(transaction);
        debug!(tree = name, root, asserted = commit.asserted, "Defined hierarchy");
        self.trees.insert(name.to_string(), tree);
        Ok(())
    }

    /// Check that the items of a sequence or cycle share at least one type
    ///
    /// `types` maps an item to the types it is known to have. The result is a
    /// list of human-readable warnings; an empty list means the structure is
    /// consistent.
    pub fn validate_sequence(
        &self,
        name: &str,
        types: impl Fn(&str) -> Vec<String>,
    ) -> HierarchyResult<Vec<String>> {
        let items = self
            .sequences
            .get(name)
            .or_else(|| self.cycles.get(name))
            .ok_or_else(|| HierarchyError::Unknown {
                name: name.to_string(),
            })?;

        let resolved: Vec<Vec<String>> = items.iter().map(|item| types(item.as_str())).collect();
        let mut warnings = Vec::new();
        let Some(first) = resolved.first().filter(|known| !known.is_empty()) else {
            warnings.push(format!(
                "Validation skipped: first item '{}' has no defined type.",
                items[0]
            ));
            return Ok(warnings);
        };

        let shared = first
            .iter()
            .filter(|candidate| resolved[1..].iter().all(|known| known.contains(*candidate)))
            .count();
        if shared == 0 {
            warnings.push(format!(
                "Semantic mismatch: items in '{name}' do not share a common type. ({})",
                items.join(", ")
            ));
            for (item, types) in items.iter().zip(&resolved) {
                if types.is_empty() {
                    warnings.push(format!("  - '{item}' has no known type."));
                } else {
                    warnings.push(format!("  - '{item}' is a [{}]", types.join(", ")));
                }
            }
        }
        Ok(warnings)
    }
}
