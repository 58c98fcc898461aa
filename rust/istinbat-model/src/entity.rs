//! Entities with typed states and properties, actions and reactions
//!
//! Every attribute write is mirrored into the active world of an [`Engine`]
//! so it can be queried like any other fact:
//!
//! - `entity(Name)` when an entity first appears
//! - `state(Entity, Key, Value)` and `property(Entity, Key, Value)`, replacing
//!   the previous value for the same key
//! - `changed(Target, Key, Old, New)` for every effect an action has
//! - `event(Actor, Action, Target, ActionValue)` once per applied action
//!
//! Effect formulas, conditions, reaction responses and equations are
//! [`Formula`]s. Effects, conditions and responses are evaluated with the
//! names `value`, `action_value`, `power` and `sensitivity`; equations see the
//! entity's numeric attributes by key.

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use istinbat_formula::Formula;
use istinbat_query::{Engine, Fact, Term};
use tracing::debug;

use crate::error::{EntityError, EntityResult};

/// Value of a state read before it was ever written
pub const DEFAULT_STATE: f64 = 0.5;
/// Value of a property read by an action before it was ever written
pub const DEFAULT_PROPERTY: f64 = 0.0;

/// How writes to an attribute are constrained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeKind {
    /// Clamped to `[0, 1]`
    Fuzzy,
    /// Unconstrained
    Numeric,
    /// Clamped to `[min, max]`
    Bounded { min: f64, max: f64 },
    /// Opaque text
    Text,
}

impl AttributeKind {
    fn accept(&self, value: AttributeValue) -> Result<AttributeValue, AttributeValue> {
        match (self, value) {
            (AttributeKind::Fuzzy, AttributeValue::Number(n)) => Ok(AttributeValue::Number(n.clamp(0.0, 1.0))),
            (AttributeKind::Numeric, AttributeValue::Number(n)) => Ok(AttributeValue::Number(n)),
            (AttributeKind::Bounded { min, max }, AttributeValue::Number(n)) => {
                Ok(AttributeValue::Number(n.max(*min).min(*max)))
            }
            (AttributeKind::Text, AttributeValue::Text(text)) => Ok(AttributeValue::Text(text)),
            (_, value) => Err(value),
        }
    }

    fn default_for(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Number(_) => AttributeKind::Fuzzy,
            AttributeValue::Text(_) => AttributeKind::Text,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Fuzzy => write!(f, "fuzzy"),
            AttributeKind::Numeric => write!(f, "numeric"),
            AttributeKind::Bounded { min, max } => write!(f, "bounded [{min}, {max}]"),
            AttributeKind::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Number(_) => None,
        }
    }

    fn to_term(&self) -> Term {
        match self {
            AttributeValue::Number(n) => Term::float(*n),
            AttributeValue::Text(text) => Term::string(text.as_str()),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// A value together with the kind that constrains it
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    kind: AttributeKind,
    value: AttributeValue,
}

impl Attribute {
    pub fn fuzzy(value: f64) -> Self {
        Self::typed(AttributeKind::Fuzzy, value.into())
    }

    pub fn numeric(value: f64) -> Self {
        Self::typed(AttributeKind::Numeric, value.into())
    }

    pub fn bounded(value: f64, min: f64, max: f64) -> Self {
        Self::typed(AttributeKind::Bounded { min, max }, value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::typed(AttributeKind::Text, AttributeValue::Text(value.into()))
    }

    fn typed(kind: AttributeKind, value: AttributeValue) -> Self {
        let value = kind.accept(value).unwrap_or_else(|value| value);
        Self { kind, value }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

/// Which attribute map a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    State,
    Property,
}

impl Scope {
    fn predicate(&self) -> &'static str {
        match self {
            Scope::State => "state",
            Scope::Property => "property",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate())
    }
}

/// How a reaction response combines with the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOp {
    Add,
    Subtract,
    Assign,
}

/// `key += formula`, `key -= formula` or `key = formula`, applied to a state
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    key: String,
    op: ResponseOp,
    formula: Formula,
}

impl Response {
    pub fn parse(source: &str) -> EntityResult<Self> {
        let malformed = || EntityError::MalformedResponse {
            response: source.to_string(),
        };
        let (key, op, expr) = if let Some((key, expr)) = source.split_once("+=") {
            (key, ResponseOp::Add, expr)
        } else if let Some((key, expr)) = source.split_once("-=") {
            (key, ResponseOp::Subtract, expr)
        } else if let Some((key, expr)) = source.split_once('=') {
            (key, ResponseOp::Assign, expr)
        } else {
            return Err(malformed());
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            key: key.to_string(),
            op,
            formula: Formula::parse(expr)?,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn op(&self) -> ResponseOp {
        self.op
    }
}

/// How an entity reacts when it receives an action
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    sensitivity: f64,
    response: Option<Response>,
}

impl Default for Reaction {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Reaction {
    /// A reaction with `sensitivity` clamped to `[0, 1]` and no response
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity: sensitivity.clamp(0.0, 1.0),
            response: None,
        }
    }

    pub fn with_response(mut self, response: &str) -> EntityResult<Self> {
        self.response = Some(Response::parse(response)?);
        Ok(self)
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

/// One change an action makes to its target
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    key: String,
    formula: Formula,
    condition: Option<Formula>,
}

impl Effect {
    pub fn new(key: impl Into<String>, formula: &str) -> EntityResult<Self> {
        Ok(Self {
            key: key.into(),
            formula: Formula::parse(formula)?,
            condition: None,
        })
    }

    /// Only apply the effect when `condition` evaluates to non-zero
    pub fn when(mut self, condition: &str) -> EntityResult<Self> {
        self.condition = Some(Formula::parse(condition)?);
        Ok(self)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    power: f64,
    effects: Vec<Effect>,
}

impl Action {
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
}

/// Keeps `key` in `scope` equal to a formula over the entity's attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    scope: Scope,
    key: String,
    formula: Formula,
}

/// Initial attributes and reactions for [`Entities::create_entity`]
#[derive(Debug, Clone, Default)]
pub struct EntitySpec {
    states: IndexMap<String, Attribute>,
    properties: IndexMap<String, Attribute>,
    reactions: IndexMap<String, Reaction>,
}

impl EntitySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.states.insert(key.into(), attribute);
        self
    }

    pub fn property(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.properties.insert(key.into(), attribute);
        self
    }

    /// React to receiving `action`
    pub fn reaction(mut self, action: impl Into<String>, reaction: Reaction) -> Self {
        self.reactions.insert(action.into(), reaction);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    states: IndexMap<String, Attribute>,
    properties: IndexMap<String, Attribute>,
    actions: IndexMap<String, Action>,
    reactions: IndexMap<String, Reaction>,
    equations: Vec<Equation>,
    enforcing: bool,
}

impl Entity {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            states: IndexMap::new(),
            properties: IndexMap::new(),
            actions: IndexMap::new(),
            reactions: IndexMap::new(),
            equations: Vec::new(),
            enforcing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self, key: &str) -> Option<&Attribute> {
        self.states.get(key)
    }

    pub fn property(&self, key: &str) -> Option<&Attribute> {
        self.properties.get(key)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn reaction(&self, action: &str) -> Option<&Reaction> {
        self.reactions.get(action)
    }

    fn attributes(&self, scope: Scope) -> &IndexMap<String, Attribute> {
        match scope {
            Scope::State => &self.states,
            Scope::Property => &self.properties,
        }
    }

    fn attributes_mut(&mut self, scope: Scope) -> &mut IndexMap<String, Attribute> {
        match scope {
            Scope::State => &mut self.states,
            Scope::Property => &mut self.properties,
        }
    }

    /// Numeric attributes by key; states shadow properties of the same name
    fn environment(&self) -> HashMap<String, f64> {
        self.properties
            .iter()
            .chain(&self.states)
            .filter_map(|(key, attribute)| Some((key.clone(), attribute.value.as_number()?)))
            .collect()
    }

    /// Number stored under `key`, or `default` if it is unset or not a number
    fn number(&self, scope: Scope, key: &str, default: f64) -> f64 {
        self.attributes(scope)
            .get(key)
            .and_then(|attribute| attribute.value.as_number())
            .unwrap_or(default)
    }
}

/// Who takes part in [`Entities::perform_action`]
#[derive(Debug, Clone, PartialEq)]
pub enum Participant {
    /// A single entity with a responsiveness degree
    Entity { name: String, degree: f64 },
    /// Every member of a group; the degree defaults to 1
    Group { name: String, degree: Option<f64> },
    /// Everyone who took part in the previous `perform_action`; the degree defaults to 1
    Last { degree: Option<f64> },
}

impl Participant {
    pub fn entity(name: impl Into<String>, degree: f64) -> Self {
        Participant::Entity {
            name: name.into(),
            degree,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Participant::Group {
            name: name.into(),
            degree: None,
        }
    }

    pub fn last() -> Self {
        Participant::Last { degree: None }
    }
}

/// Values an action wrote, by key
pub type Changes = IndexMap<String, f64>;

/// Every entity plus named groups of them
#[derive(Debug, Clone, Default)]
pub struct Entities {
    entities: IndexMap<String, Entity>,
    groups: IndexMap<String, Vec<String>>,
    last_participants: Vec<String>,
}

fn mirror(scope: Scope, entity: &str, key: &str, value: Option<&AttributeValue>) -> Term {
    let value = value.map(AttributeValue::to_term).unwrap_or_else(Term::anonymous);
    Term::compound(scope.predicate(), [Term::atom(entity), Term::atom(key), value])
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// The named entity, created and mirrored as `entity(Name)` if it is new
    fn ensure(&mut self, engine: &mut Engine, name: &str) -> EntityResult<&mut Entity> {
        if !self.entities.contains_key(name) {
            engine.assertz(Fact::new(Term::compound("entity", [Term::atom(name)]))?);
            debug!(entity = name, "Created entity");
        }
        Ok(self
            .entities
            .entry(name.to_string())
            .or_insert_with(|| Entity::new(name)))
    }

    /// Create (or replace) an entity and mirror all of its attributes
    pub fn create_entity(&mut self, engine: &mut Engine, name: &str, spec: EntitySpec) -> EntityResult<()> {
        let mut entity = Entity::new(name);
        entity.states = spec.states;
        entity.properties = spec.properties;
        entity.reactions = spec.reactions;

        let entity_fact = Term::compound("entity", [Term::atom(name)]);
        let mut transaction = engine.edit();
        transaction
            .retract_all(entity_fact.clone())
            .assert(Fact::new(entity_fact)?);
        for scope in [Scope::State, Scope::Property] {
            for (key, attribute) in entity.attributes(scope) {
                transaction
                    .retract_all(mirror(scope, name, key, None))
                    .assert(Fact::new(mirror(scope, name, key, Some(&attribute.value)))?);
            }
        }
        engine.commit(transaction);
        debug!(
            entity = name,
            states = entity.states.len(),
            properties = entity.properties.len(),
            "Created entity"
        );
        self.entities.insert(name.to_string(), entity);
        Ok(())
    }

    fn write(
        &mut self,
        engine: &mut Engine,
        name: &str,
        scope: Scope,
        key: &str,
        value: AttributeValue,
    ) -> EntityResult<AttributeValue> {
        let entity = self.ensure(engine, name)?;
        let kind = entity
            .attributes(scope)
            .get(key)
            .map(Attribute::kind)
            .unwrap_or_else(|| AttributeKind::default_for(&value));
        let value = kind.accept(value).map_err(|value| EntityError::KindMismatch {
            entity: name.to_string(),
            key: key.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        })?;
        entity.attributes_mut(scope).insert(
            key.to_string(),
            Attribute {
                kind,
                value: value.clone(),
            },
        );

        let mut transaction = engine.edit();
        transaction
            .retract_all(mirror(scope, name, key, None))
            .assert(Fact::new(mirror(scope, name, key, Some(&value)))?);
        engine.commit(transaction);
        debug!(entity = name, %scope, key, %value, "Set attribute");

        self.enforce(engine, name)?;
        Ok(value)
    }

    /// Evaluate the entity's equations in order, writing each result back
    ///
    /// Stops at the first failing equation. Writes made before it stand.
    fn enforce(&mut self, engine: &mut Engine, name: &str) -> EntityResult<()> {
        let equations = match self.entities.get_mut(name) {
            Some(entity) if !entity.enforcing && !entity.equations.is_empty() => {
                entity.enforcing = true;
                entity.equations.clone()
            }
            _ => return Ok(()),
        };

        let mut outcome = Ok(());
        for equation in &equations {
            let environment = match self.entities.get(name) {
                Some(entity) => entity.environment(),
                None => break,
            };
            let written = equation
                .formula
                .evaluate(&environment)
                .map_err(EntityError::from)
                .and_then(|value| self.write(engine, name, equation.scope, &equation.key, value.into()));
            if let Err(error) = written {
                outcome = Err(error);
                break;
            }
        }

        if let Some(entity) = self.entities.get_mut(name) {
            entity.enforcing = false;
        }
        outcome
    }

    /// Store a state value, mirror it as `state/3` and re-run the equations
    ///
    /// The value and its mirror are committed before the equations run, so a
    /// failing equation returns its error while the write stays in effect.
    pub fn set_state(
        &mut self,
        engine: &mut Engine,
        name: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> EntityResult<AttributeValue> {
        self.write(engine, name, Scope::State, key, value.into())
    }

    /// Like [`Entities::set_state`] for properties, mirrored as `property/3`
    pub fn set_property(
        &mut self,
        engine: &mut Engine,
        name: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> EntityResult<AttributeValue> {
        self.write(engine, name, Scope::Property, key, value.into())
    }

    pub fn get_state(&self, name: &str, key: &str) -> Option<&AttributeValue> {
        self.entities.get(name)?.state(key).map(Attribute::value)
    }

    pub fn get_property(&self, name: &str, key: &str) -> Option<&AttributeValue> {
        self.entities.get(name)?.property(key).map(Attribute::value)
    }

    /// Keep `key` equal to `expression` after every write to `entity`
    ///
    /// The equation is enforced once immediately. If that fails the equation
    /// is dropped again and the error returned.
    pub fn add_equation(
        &mut self,
        engine: &mut Engine,
        entity: &str,
        scope: Scope,
        key: &str,
        expression: &str,
    ) -> EntityResult<()> {
        let formula = Formula::parse(expression)?;
        let Some(target) = self.entities.get_mut(entity) else {
            return Err(EntityError::UnknownEntity {
                name: entity.to_string(),
            });
        };
        target.equations.push(Equation {
            scope,
            key: key.to_string(),
            formula,
        });
        debug!(entity, %scope, key, expression, "Added equation");
        let enforced = self.enforce(engine, entity);
        if enforced.is_err() {
            if let Some(target) = self.entities.get_mut(entity) {
                target.equations.pop();
            }
        }
        enforced
    }

    /// Give `actor` an action; `power` is clamped to `[0, 1]`
    pub fn define_action(
        &mut self,
        engine: &mut Engine,
        actor: &str,
        action: &str,
        power: f64,
        effects: impl IntoIterator<Item = Effect>,
    ) -> EntityResult<()> {
        let entity = self.ensure(engine, actor)?;
        entity.actions.insert(
            action.to_string(),
            Action {
                power: power.clamp(0.0, 1.0),
                effects: effects.into_iter().collect(),
            },
        );
        debug!(actor, action, "Defined action");
        Ok(())
    }

    /// Apply `actor`'s `action` to `target` using the target's own sensitivity
    pub fn apply_action(
        &mut self,
        engine: &mut Engine,
        actor: &str,
        action: &str,
        target: &str,
        action_value: f64,
    ) -> EntityResult<Changes> {
        self.apply_action_with(engine, actor, action, target, action_value, None)
    }

    /// Apply an action, optionally overriding the target's sensitivity for this call
    pub fn apply_action_with(
        &mut self,
        engine: &mut Engine,
        actor: &str,
        action: &str,
        target: &str,
        action_value: f64,
        sensitivity: Option<f64>,
    ) -> EntityResult<Changes> {
        let definition = self
            .ensure(engine, actor)?
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| EntityError::UnknownAction {
                actor: actor.to_string(),
                action: action.to_string(),
            })?;
        let reaction = self
            .ensure(engine, target)?
            .reactions
            .get(action)
            .cloned()
            .unwrap_or_default();
        let sensitivity = sensitivity.unwrap_or(reaction.sensitivity);
        let environment = |value: f64| {
            [
                ("value", value),
                ("action_value", action_value),
                ("power", definition.power),
                ("sensitivity", sensitivity),
            ]
        };

        let mut changes = Changes::new();
        for effect in &definition.effects {
            let Some(receiver) = self.entities.get(target) else {
                break;
            };
            if let Some(condition) = &effect.condition {
                let current = receiver.number(Scope::State, &effect.key, DEFAULT_STATE);
                if !condition.holds(&environment(current))? {
                    continue;
                }
            }

            // Keys that are only known as properties stay properties
            let (scope, default) = if receiver.states.contains_key(&effect.key)
                || !receiver.properties.contains_key(&effect.key)
            {
                (Scope::State, DEFAULT_STATE)
            } else {
                (Scope::Property, DEFAULT_PROPERTY)
            };
            let old = receiver.number(scope, &effect.key, default);
            let new = effect.formula.evaluate(&environment(old))?;
            let new = self.number_written(engine, target, scope, &effect.key, new)?;

            changes.insert(effect.key.clone(), new);
            engine.assertz(Fact::new(Term::compound(
                "changed",
                [
                    Term::atom(target),
                    Term::atom(effect.key.as_str()),
                    Term::float(old),
                    Term::float(new),
                ],
            ))?);
        }

        if let Some(response) = &reaction.response {
            let base = self
                .entities
                .get(target)
                .map_or(DEFAULT_STATE, |receiver| receiver.number(Scope::State, &response.key, DEFAULT_STATE));
            let delta = response.formula.evaluate(&environment(base))?;
            let value = match response.op {
                ResponseOp::Add => base + delta,
                ResponseOp::Subtract => base - delta,
                ResponseOp::Assign => delta,
            };
            let value = self.number_written(engine, target, Scope::State, &response.key, value)?;
            changes.insert(response.key.clone(), value);
        }

        engine.assertz(Fact::new(Term::compound(
            "event",
            [
                Term::atom(actor),
                Term::atom(action),
                Term::atom(target),
                Term::float(action_value),
            ],
        ))?);
        debug!(actor, action, target, action_value, changes = changes.len(), "Applied action");
        Ok(changes)
    }

    /// Write a number and read back what was stored after clamping
    fn number_written(
        &mut self,
        engine: &mut Engine,
        name: &str,
        scope: Scope,
        key: &str,
        value: f64,
    ) -> EntityResult<f64> {
        let written = self.write(engine, name, scope, key, value.into())?;
        // Numbers are only ever accepted as numbers
        Ok(written.as_number().unwrap_or(value))
    }

    /// Entity names and degrees for `participants`, groups and references expanded
    fn expand(&self, participants: &[Participant]) -> Vec<(String, f64)> {
        let mut expanded = Vec::new();
        for participant in participants {
            match participant {
                Participant::Entity { name, degree } => expanded.push((name.clone(), *degree)),
                Participant::Group { name, degree } => expanded.extend(
                    self.group_members(name)
                        .iter()
                        .map(|member| (member.clone(), degree.unwrap_or(1.0))),
                ),
                Participant::Last { degree } => expanded.extend(
                    self.last_participants
                        .iter()
                        .map(|member| (member.clone(), degree.unwrap_or(1.0))),
                ),
            }
        }
        expanded
    }

    /// Perform `action` among `participants`
    ///
    /// `states` and `properties` are `(entity, key, value)` assignments made
    /// before the action. Participants that define the action are its actors;
    /// if none does, the first participant acts alone. When every participant
    /// is an actor, each acts on itself. Otherwise each actor acts on every
    /// participant, itself included. The degree of each target overrides its
    /// sensitivity.
    ///
    /// Returns the changes per target.
    pub fn perform_action(
        &mut self,
        engine: &mut Engine,
        action: &str,
        participants: &[Participant],
        states: &[(&str, &str, f64)],
        properties: &[(&str, &str, f64)],
        action_value: f64,
    ) -> EntityResult<IndexMap<String, Changes>> {
        let expanded = self.expand(participants);
        let mut results: IndexMap<String, Changes> = IndexMap::new();
        if expanded.is_empty() {
            return Ok(results);
        }

        for (entity, key, value) in states {
            self.set_state(engine, entity, key, *value)?;
        }
        for (entity, key, value) in properties {
            self.set_property(engine, entity, key, *value)?;
        }

        let mut degrees: HashMap<&str, f64> = HashMap::new();
        let mut names: IndexSet<&str> = IndexSet::new();
        for (name, degree) in &expanded {
            degrees.insert(name, *degree);
            names.insert(name);
        }
        let mut actors: IndexSet<&str> = IndexSet::new();
        for name in &names {
            if self.ensure(engine, name)?.actions.contains_key(action) {
                actors.insert(*name);
            }
        }
        if actors.is_empty() {
            actors.insert(expanded[0].0.as_str());
        }

        if actors.len() == names.len() {
            for actor in &actors {
                let degree = degrees.get(actor).copied();
                let changes = self.apply_action_with(engine, actor, action, actor, action_value, degree)?;
                results.entry(actor.to_string()).or_default().extend(changes);
            }
        } else {
            for actor in &actors {
                for target in &names {
                    let degree = degrees.get(target).copied();
                    let changes = self.apply_action_with(engine, actor, action, target, action_value, degree)?;
                    results.entry(target.to_string()).or_default().extend(changes);
                }
            }
        }

        self.last_participants = names.iter().map(|name| name.to_string()).collect();
        Ok(results)
    }

    pub fn define_group(&mut self, name: &str, members: impl IntoIterator<Item = impl Into<String>>) {
        self.groups
            .insert(name.to_string(), members.into_iter().map(Into::into).collect());
    }

    /// Append members not already in the group, creating it if needed
    pub fn add_to_group(&mut self, name: &str, members: impl IntoIterator<Item = impl Into<String>>) {
        let group = self.groups.entry(name.to_string()).or_default();
        for member in members {
            let member = member.into();
            if !group.contains(&member) {
                group.push(member);
            }
        }
    }

    pub fn group_members(&self, name: &str) -> &[String] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}
