//! Facts and rules, the two kinds of clause a knowledge base stores
//!
//! Both are validated when constructed: heads must be callable, rule bodies
//! must consist of callable goals, and probabilities must lie in `[0, 1]`.
//! Deserialization goes through the same constructors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClauseError, ClauseResult};
use crate::term::{Functor, Term};

/// Modal qualification of a fact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modal {
    #[default]
    None,
    Necessity,
    Possibility,
}

/// Temporal qualification of a fact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Temporal {
    #[default]
    None,
    Next,
    Always,
    Eventually,
    Until,
}

impl fmt::Display for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modal::None => write!(f, "none"),
            Modal::Necessity => write!(f, "necessity"),
            Modal::Possibility => write!(f, "possibility"),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::None => write!(f, "none"),
            Temporal::Next => write!(f, "next"),
            Temporal::Always => write!(f, "always"),
            Temporal::Eventually => write!(f, "eventually"),
            Temporal::Until => write!(f, "until"),
        }
    }
}

fn check_probability(probability: f64) -> ClauseResult<f64> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(ClauseError::ProbabilityOutOfRange { probability })
    }
}

fn check_head(head: &Term) -> ClauseResult<()> {
    if head.is_callable() {
        Ok(())
    } else {
        Err(ClauseError::InvalidHead {
            head: head.to_string(),
        })
    }
}

/// A unit clause: a head that holds unconditionally, with a probability and
/// optional modal and temporal annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FactSyntax", into = "FactSyntax")]
pub struct Fact {
    head: Term,
    probability: f64,
    modal: Modal,
    temporal: Temporal,
    ground: bool,
}

impl Fact {
    pub fn new(head: Term) -> ClauseResult<Self> {
        check_head(&head)?;
        Ok(Self {
            ground: head.is_ground(),
            head,
            probability: 1.0,
            modal: Modal::None,
            temporal: Temporal::None,
        })
    }

    pub fn with_probability(mut self, probability: f64) -> ClauseResult<Self> {
        self.probability = check_probability(probability)?;
        Ok(self)
    }

    pub fn with_modal(mut self, modal: Modal) -> Self {
        self.modal = modal;
        self
    }

    pub fn with_temporal(mut self, temporal: Temporal) -> Self {
        self.temporal = temporal;
        self
    }

    pub fn head(&self) -> &Term {
        &self.head
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn temporal(&self) -> Temporal {
        self.temporal
    }

    /// Facts without variables can be used without renaming
    pub fn is_ground(&self) -> bool {
        self.ground
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.", self.head)?;
        let mut notes = Vec::new();
        if self.probability != 1.0 {
            notes.push(format!("p={}", self.probability));
        }
        if self.modal != Modal::None {
            notes.push(format!("modal={}", self.modal));
        }
        if self.temporal != Temporal::None {
            notes.push(format!("temporal={}", self.temporal));
        }
        if !notes.is_empty() {
            write!(f, " [{}]", notes.join(", "))?;
        }
        Ok(())
    }
}

/// A Horn clause `head :- body`, where the body is a non-empty conjunction of goals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSyntax", into = "RuleSyntax")]
pub struct Rule {
    head: Term,
    body: Vec<Term>,
    probability: f64,
}

impl Rule {
    pub fn new(head: Term, body: impl IntoIterator<Item = Term>) -> ClauseResult<Self> {
        check_head(&head)?;
        let body: Vec<Term> = body.into_iter().collect();
        if body.is_empty() {
            return Err(ClauseError::MalformedBody {
                reason: format!("rule for {head} has an empty body"),
            });
        }
        for goal in &body {
            if !goal.is_callable() {
                return Err(ClauseError::MalformedBody {
                    reason: format!("{goal} in the body of {head} is not a goal"),
                });
            }
        }
        Ok(Self {
            head,
            body,
            probability: 1.0,
        })
    }

    pub fn with_probability(mut self, probability: f64) -> ClauseResult<Self> {
        self.probability = check_probability(probability)?;
        Ok(self)
    }

    pub fn head(&self) -> &Term {
        &self.head
    }

    pub fn body(&self) -> &[Term] {
        &self.body
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- ", self.head)?;
        for (index, goal) in self.body.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{goal}")?;
        }
        write!(f, ".")?;
        if self.probability != 1.0 {
            write!(f, " [p={}]", self.probability)?;
        }
        Ok(())
    }
}

/// Anything a knowledge base stores under a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    Fact(Fact),
    Rule(Rule),
}

impl Clause {
    pub fn head(&self) -> &Term {
        match self {
            Clause::Fact(fact) => fact.head(),
            Clause::Rule(rule) => rule.head(),
        }
    }

    pub fn functor(&self) -> Functor {
        // Heads are checked to be callable on construction
        self.head()
            .functor()
            .unwrap_or_else(|| Functor::new(self.head().to_string(), 0))
    }

    pub fn probability(&self) -> f64 {
        match self {
            Clause::Fact(fact) => fact.probability(),
            Clause::Rule(rule) => rule.probability(),
        }
    }

    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Clause::Fact(fact) => Some(fact),
            Clause::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Clause::Rule(rule) => Some(rule),
            Clause::Fact(_) => None,
        }
    }
}

impl From<Fact> for Clause {
    fn from(fact: Fact) -> Self {
        Clause::Fact(fact)
    }
}

impl From<Rule> for Clause {
    fn from(rule: Rule) -> Self {
        Clause::Rule(rule)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Fact(fact) => write!(f, "{fact}"),
            Clause::Rule(rule) => write!(f, "{rule}"),
        }
    }
}

fn certain() -> f64 {
    1.0
}

fn is_certain(probability: &f64) -> bool {
    *probability == 1.0
}

#[derive(Serialize, Deserialize)]
struct FactSyntax {
    head: Term,
    #[serde(default = "certain", skip_serializing_if = "is_certain")]
    probability: f64,
    #[serde(default)]
    modal: Modal,
    #[serde(default)]
    temporal: Temporal,
}

impl TryFrom<FactSyntax> for Fact {
    type Error = ClauseError;

    fn try_from(syntax: FactSyntax) -> Result<Self, Self::Error> {
        Ok(Fact::new(syntax.head)?
            .with_probability(syntax.probability)?
            .with_modal(syntax.modal)
            .with_temporal(syntax.temporal))
    }
}

impl From<Fact> for FactSyntax {
    fn from(fact: Fact) -> Self {
        Self {
            head: fact.head,
            probability: fact.probability,
            modal: fact.modal,
            temporal: fact.temporal,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RuleSyntax {
    head: Term,
    body: Vec<Term>,
    #[serde(default = "certain", skip_serializing_if = "is_certain")]
    probability: f64,
}

impl TryFrom<RuleSyntax> for Rule {
    type Error = ClauseError;

    fn try_from(syntax: RuleSyntax) -> Result<Self, Self::Error> {
        Rule::new(syntax.head, syntax.body)?.with_probability(syntax.probability)
    }
}

impl From<Rule> for RuleSyntax {
    fn from(rule: Rule) -> Self {
        Self {
            head: rule.head,
            body: rule.body,
            probability: rule.probability,
        }
    }
}
