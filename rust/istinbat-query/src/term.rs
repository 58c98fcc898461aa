//! Term types for facts, rules and queries
//!
//! A [`Term`] is an immutable value. Structured terms share their children
//! through `Arc`, so cloning a term (for example when a choice point keeps a
//! copy of its goal) never copies the underlying tree.
//!
//! Lists are built from [`ListCell`]s terminated by [`Term::Nil`]. A list whose
//! final tail is a variable doubles as a list pattern: `[H1, H2 | T]` unifies
//! with every list of at least two elements, binding `T` to the remainder.
//!
//! Terms order by the standard order used by `setof`:
//! variables < numbers < atoms < strings < compound terms. Compound terms
//! (lists included, as `'.'/2` cells) order by arity, then functor name, then
//! arguments left to right.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::number::Number;

/// Name of the functor used for conjunctions inside goals
pub const CONJUNCTION: &str = ",";

/// Name of the cut atom
pub const CUT: &str = "!";

/// Name given to anonymous variables
pub const ANONYMOUS: &str = "_";

/// A term: the unit of data the resolver unifies and rewrites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Term {
    /// A symbolic constant such as `oil` or `tom`
    Atom(Arc<str>),
    /// A logic variable; two variables are the same iff their names are equal
    #[serde(rename = "?")]
    Variable(Arc<str>),
    Number(Number),
    /// An opaque string literal
    String(Arc<str>),
    Compound(Compound),
    /// A list cell holding a head and a tail
    List(Arc<ListCell>),
    /// The empty list
    Nil,
}

/// A functor applied to one or more arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compound {
    functor: Arc<str>,
    arguments: Arc<[Term]>,
}

impl Compound {
    pub fn functor(&self) -> &str {
        &self.functor
    }

    pub fn arguments(&self) -> &[Term] {
        &self.arguments
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }
}

/// One cell of a list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCell {
    pub head: Term,
    pub tail: Term,
}

impl Drop for ListCell {
    fn drop(&mut self) {
        // Unlink uniquely owned cells one at a time so long lists do not
        // recurse on drop
        let mut next = std::mem::replace(&mut self.tail, Term::Nil);
        while let Term::List(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cell) => next = std::mem::replace(&mut cell.tail, Term::Nil),
                Err(_) => break,
            }
        }
    }
}

/// Predicate identity: a name together with an arity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Functor {
    name: Arc<str>,
    arity: usize,
}

impl Functor {
    pub fn new(name: impl Into<Arc<str>>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

impl Term {
    pub fn atom(name: impl Into<Arc<str>>) -> Self {
        Term::Atom(name.into())
    }

    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Term::Variable(name.into())
    }

    /// A fresh anonymous variable; every occurrence is distinct
    pub fn anonymous() -> Self {
        Term::Variable(ANONYMOUS.into())
    }

    pub fn number(value: impl Into<Number>) -> Self {
        Term::Number(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Term::Number(Number::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Term::Number(Number::Float(value))
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Term::String(value.into())
    }

    /// Apply `functor` to `arguments`
    ///
    /// With no arguments the result is the atom `functor`, so `compound("rain", [])`
    /// and `atom("rain")` denote the same zero-arity goal.
    pub fn compound(functor: impl Into<Arc<str>>, arguments: impl IntoIterator<Item = Term>) -> Self {
        let arguments: Arc<[Term]> = arguments.into_iter().collect();
        if arguments.is_empty() {
            Term::Atom(functor.into())
        } else {
            Term::Compound(Compound {
                functor: functor.into(),
                arguments,
            })
        }
    }

    pub fn nil() -> Self {
        Term::Nil
    }

    pub fn cut() -> Self {
        Term::Atom(CUT.into())
    }

    /// A proper list of `elements`
    pub fn list(elements: impl IntoIterator<Item = Term>) -> Self {
        Self::list_of(elements, Term::Nil)
    }

    /// A list of `elements` ending in `tail` instead of `[]`
    pub fn list_of(elements: impl IntoIterator<Item = Term>, tail: Term) -> Self {
        let elements: Vec<Term> = elements.into_iter().collect();
        elements
            .into_iter()
            .rev()
            .fold(tail, |tail, head| Term::List(Arc::new(ListCell { head, tail })))
    }

    /// The pattern `[H1, …, Hk | tail]`
    ///
    /// Patterns are ordinary list cells with an open tail, so they unify with
    /// plain lists and with other patterns alike.
    pub fn list_pattern(heads: impl IntoIterator<Item = Term>, tail: Term) -> Self {
        Self::list_of(heads, tail)
    }

    /// `left is right`
    pub fn is(left: Term, right: Term) -> Self {
        Term::compound("is", [left, right])
    }

    /// `left = right`
    pub fn unifies(left: Term, right: Term) -> Self {
        Term::compound("=", [left, right])
    }

    pub fn greater(left: Term, right: Term) -> Self {
        Term::compound(">", [left, right])
    }

    pub fn less(left: Term, right: Term) -> Self {
        Term::compound("<", [left, right])
    }

    pub fn greater_or_equal(left: Term, right: Term) -> Self {
        Term::compound(">=", [left, right])
    }

    pub fn less_or_equal(left: Term, right: Term) -> Self {
        Term::compound("<=", [left, right])
    }

    pub fn numeric_equal(left: Term, right: Term) -> Self {
        Term::compound("==", [left, right])
    }

    pub fn numeric_not_equal(left: Term, right: Term) -> Self {
        Term::compound("!=", [left, right])
    }

    /// The conjunction of `goals`, nested to the right; `true` when empty
    pub fn conjunction(goals: impl IntoIterator<Item = Term>) -> Self {
        let goals: Vec<Term> = goals.into_iter().collect();
        let mut goals = goals.into_iter().rev();
        match goals.next() {
            None => Term::atom("true"),
            Some(last) => goals.fold(last, |rest, goal| Term::compound(CONJUNCTION, [goal, rest])),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Term::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Term::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    /// The elements of a proper list, or `None` if this is not one
    pub fn as_list(&self) -> Option<Vec<Term>> {
        let mut elements = Vec::new();
        let mut cursor = self;
        loop {
            match cursor {
                Term::Nil => return Some(elements),
                Term::List(cell) => {
                    elements.push(cell.head.clone());
                    cursor = &cell.tail;
                }
                _ => return None,
            }
        }
    }

    /// The predicate this term calls when used as a goal
    pub fn functor(&self) -> Option<Functor> {
        match self {
            Term::Atom(name) => Some(Functor::new(name.clone(), 0)),
            Term::Compound(compound) => Some(Functor::new(compound.functor.clone(), compound.arity())),
            _ => None,
        }
    }

    /// Atoms and compound terms can stand as goals or clause heads
    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Compound(_))
    }

    /// Argument slice of a compound, empty for every other term
    pub fn arguments(&self) -> &[Term] {
        match self {
            Term::Compound(compound) => compound.arguments(),
            _ => &[],
        }
    }

    /// Names of the variables in this term, in order of first occurrence
    pub fn variables(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = Vec::new();
        self.visit_variables(&mut |name| {
            if !names.iter().any(|seen| seen == name) {
                names.push(name.clone());
            }
        });
        names
    }

    pub fn is_ground(&self) -> bool {
        let mut ground = true;
        self.visit_variables(&mut |_| ground = false);
        ground
    }

    /// Does a variable named `name` occur in this term (without dereferencing)?
    pub fn contains_variable(&self, name: &str) -> bool {
        let mut found = false;
        self.visit_variables(&mut |candidate| found |= &**candidate == name);
        found
    }

    fn visit_variables(&self, visit: &mut impl FnMut(&Arc<str>)) {
        match self {
            Term::Variable(name) => visit(name),
            Term::Compound(compound) => {
                for argument in compound.arguments.iter() {
                    argument.visit_variables(visit);
                }
            }
            Term::List(cell) => {
                let mut cursor = cell;
                loop {
                    cursor.head.visit_variables(visit);
                    match &cursor.tail {
                        Term::List(next) => cursor = next,
                        tail => {
                            tail.visit_variables(visit);
                            break;
                        }
                    }
                }
            }
            Term::Atom(_) | Term::Number(_) | Term::String(_) | Term::Nil => {}
        }
    }

    /// Rewrite every variable name through `rename`
    pub(crate) fn rename_variables(&self, rename: &mut impl FnMut(&Arc<str>) -> Arc<str>) -> Term {
        match self {
            Term::Variable(name) => Term::Variable(rename(name)),
            Term::Compound(compound) => Term::Compound(Compound {
                functor: compound.functor.clone(),
                arguments: compound
                    .arguments
                    .iter()
                    .map(|argument| argument.rename_variables(rename))
                    .collect(),
            }),
            Term::List(cell) => {
                let mut heads = vec![cell.head.rename_variables(rename)];
                let mut cursor = &cell.tail;
                while let Term::List(next) = cursor {
                    heads.push(next.head.rename_variables(rename));
                    cursor = &next.tail;
                }
                let tail = cursor.rename_variables(rename);
                heads
                    .into_iter()
                    .rev()
                    .fold(tail, |tail, head| Term::List(Arc::new(ListCell { head, tail })))
            }
            Term::Atom(_) | Term::Number(_) | Term::String(_) | Term::Nil => self.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Term::Variable(_) => 0,
            Term::Number(_) => 1,
            Term::Atom(_) | Term::Nil => 2,
            Term::String(_) => 3,
            Term::Compound(_) | Term::List(_) => 4,
        }
    }
}

/// Renames the variables of clauses apart using a generation suffix
///
/// Each call to [`Renamer::rename`] with the same renamer maps a name to the
/// same fresh name, except `_`, which becomes a new variable every time.
pub(crate) struct Renamer {
    generation: u64,
    anonymous: usize,
    names: HashMap<Arc<str>, Arc<str>>,
    named: bool,
}

impl Renamer {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            anonymous: 0,
            names: HashMap::new(),
            named: true,
        }
    }

    /// A renamer for query goals: only `_` is split apart, under the
    /// generation after `generation`
    pub(crate) fn anonymous_only(generation: u64) -> Self {
        Self {
            named: false,
            ..Self::new(generation + 1)
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn rename(&mut self, term: &Term) -> Term {
        term.rename_variables(&mut |name| {
            if &**name == ANONYMOUS {
                self.anonymous += 1;
                return format!("_#{}.{}", self.generation, self.anonymous).into();
            }
            if !self.named {
                return name.clone();
            }
            let generation = self.generation;
            self.names
                .entry(name.clone())
                .or_insert_with(|| format!("{name}#{generation}").into())
                .clone()
        })
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Term::Variable(left), Term::Variable(right)) => left.cmp(right),
            (Term::Number(left), Term::Number(right)) => left.cmp(right),
            (Term::Atom(left), Term::Atom(right)) => left.cmp(right),
            (Term::Nil, Term::Nil) => Ordering::Equal,
            (Term::Nil, Term::Atom(name)) => "[]".cmp(name).then(Ordering::Less),
            (Term::Atom(name), Term::Nil) => (**name).cmp("[]").then(Ordering::Greater),
            (Term::String(left), Term::String(right)) => left.cmp(right),
            (Term::List(left), Term::List(right)) => compare_lists(left, right),
            (Term::Compound(left), Term::Compound(right)) => left
                .arity()
                .cmp(&right.arity())
                .then_with(|| left.functor.cmp(&right.functor))
                .then_with(|| left.arguments.iter().cmp(right.arguments.iter())),
            (Term::List(cell), Term::Compound(compound)) => compare_cell(cell, compound),
            (Term::Compound(compound), Term::List(cell)) => compare_cell(cell, compound).reverse(),
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }
}

/// Walks both spines together and compares the first differing element
fn compare_lists(mut left: &ListCell, mut right: &ListCell) -> Ordering {
    loop {
        match left.head.cmp(&right.head) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        match (&left.tail, &right.tail) {
            (Term::List(next_left), Term::List(next_right)) => {
                left = next_left;
                right = next_right;
            }
            (left_tail, right_tail) => return left_tail.cmp(right_tail),
        }
    }
}

/// Lists order as `'.'(Head, Tail)`; ties go to the list
fn compare_cell(cell: &ListCell, compound: &Compound) -> Ordering {
    2usize.cmp(&compound.arity())
        .then_with(|| ".".cmp(compound.functor()))
        .then_with(|| [&cell.head, &cell.tail].into_iter().cmp(compound.arguments.iter()))
        .then(Ordering::Less)
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{name}"),
            Term::Variable(name) => write!(f, "?{name}"),
            Term::Number(number) => write!(f, "{number}"),
            Term::String(value) => write!(f, "{value:?}"),
            Term::Compound(compound) => {
                write!(f, "{}(", compound.functor)?;
                for (index, argument) in compound.arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Term::List(cell) => {
                write!(f, "[{}", cell.head)?;
                let mut tail = &cell.tail;
                loop {
                    match tail {
                        Term::List(next) => {
                            write!(f, ", {}", next.head)?;
                            tail = &next.tail;
                        }
                        Term::Nil => break,
                        open => {
                            write!(f, " | {open}")?;
                            break;
                        }
                    }
                }
                write!(f, "]")
            }
            Term::Nil => write!(f, "[]"),
        }
    }
}

impl From<Number> for Term {
    fn from(value: Number) -> Self {
        Term::Number(value)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::integer(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::float(value)
    }
}

/// Plain strings become atoms, which is what helpers that name entities want
impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::atom(value)
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::atom(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_displays_terms_in_prolog_syntax() {
        let term = Term::compound(
            "member",
            [
                Term::var("X"),
                Term::list_pattern([Term::atom("a"), Term::integer(2)], Term::var("T")),
            ],
        );
        assert_eq!(term.to_string(), "member(?X, [a, 2 | ?T])");
        assert_eq!(Term::list([]).to_string(), "[]");
        assert_eq!(Term::string("hi").to_string(), "\"hi\"");
    }

    #[test]
    fn compound_without_arguments_is_an_atom() {
        assert_eq!(Term::compound("rain", []), Term::atom("rain"));
        assert_eq!(Term::atom("rain").functor(), Some(Functor::new("rain", 0)));
    }

    #[test]
    fn it_follows_the_standard_order() {
        let mut terms = vec![
            Term::compound("f", [Term::atom("a")]),
            Term::string("s"),
            Term::atom("b"),
            Term::integer(3),
            Term::var("X"),
            Term::float(1.5),
            Term::atom("a"),
        ];
        terms.sort();
        assert_eq!(
            terms,
            vec![
                Term::var("X"),
                Term::float(1.5),
                Term::integer(3),
                Term::atom("a"),
                Term::atom("b"),
                Term::string("s"),
                Term::compound("f", [Term::atom("a")]),
            ]
        );
    }

    #[test]
    fn nil_and_the_atom_named_nil_differ() {
        assert_ne!(Term::Nil, Term::atom("[]"));
        assert_ne!(
            Term::list([Term::atom("a")]),
            Term::compound(".", [Term::atom("a"), Term::Nil])
        );
    }

    #[test]
    fn it_collects_variables_in_order_of_appearance() {
        let term = Term::compound(
            "p",
            [Term::var("Y"), Term::list_pattern([Term::var("X")], Term::var("Y"))],
        );
        let names: Vec<String> = term.variables().iter().map(|name| name.to_string()).collect();
        assert_eq!(names, vec!["Y", "X"]);
        assert!(!term.is_ground());
        assert!(Term::list([Term::integer(1)]).is_ground());
    }

    #[test]
    fn renaming_keeps_sharing_but_splits_anonymous_variables() {
        let mut renamer = Renamer::new(7);
        let term = Term::compound(
            "p",
            [Term::var("X"), Term::var("X"), Term::anonymous(), Term::anonymous()],
        );
        let renamed = renamer.rename(&term);
        let arguments = renamed.arguments();
        assert_eq!(arguments[0], Term::var("X#7"));
        assert_eq!(arguments[1], Term::var("X#7"));
        assert_ne!(arguments[2], arguments[3]);
    }

    #[test]
    fn long_lists_rename_compare_and_drop_without_recursing() {
        let length = 200_000;
        let open = Term::list_pattern((0..length).map(Term::integer), Term::var("T"));
        let renamed = Renamer::new(3).rename(&open);
        assert_eq!(
            renamed,
            Term::list_pattern((0..length).map(Term::integer), Term::var("T#3"))
        );
        assert!(renamed > open);

        let closed = Term::list((0..length).map(Term::integer));
        let shorter = Term::list((0..length - 1).map(Term::integer));
        assert!(shorter < closed);
        drop(renamed);
        drop(Term::list((0..500_000).map(Term::integer)));
    }

    #[test]
    fn conjunction_nests_to_the_right() {
        let goal = Term::conjunction([Term::atom("a"), Term::atom("b"), Term::atom("c")]);
        assert_eq!(goal.to_string(), ",(a, ,(b, c))");
        assert_eq!(Term::conjunction([]), Term::atom("true"));
    }
}
