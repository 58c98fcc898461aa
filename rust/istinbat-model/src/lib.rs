//! # istinbat-model
//!
//! Domain helpers that describe structured knowledge as facts in an
//! [`istinbat_query::Engine`]:
//!
//! - [`Hierarchy`] turns ordered sequences, cycles and trees into
//!   `member/2`, `order/3`, `next/3`, `parent/3` and related facts, together
//!   with `ancestor/3` and property inheritance rules.
//! - [`Entities`] keeps typed states and properties for named entities,
//!   applies actions whose effects are [`istinbat_formula::Formula`]s, and
//!   mirrors every change as `state/3`, `property/3`, `changed/4` and
//!   `event/4` facts.
//!
//! The helpers never own the engine; each call takes it explicitly and
//! writes into whichever world is active.
//!
//! ```
//! use istinbat_model::{Attribute, Effect, Entities, EntitySpec};
//! use istinbat_query::{Engine, Term};
//!
//! let mut engine = Engine::new();
//! let mut entities = Entities::new();
//! entities
//!     .create_entity(&mut engine, "ahmad", EntitySpec::new().state("hunger", Attribute::fuzzy(0.6)))
//!     .unwrap();
//! entities
//!     .define_action(&mut engine, "mohammad", "serve_meal", 1.0, [
//!         Effect::new("hunger", "value - 0.4*action_value").unwrap(),
//!     ])
//!     .unwrap();
//! entities
//!     .apply_action(&mut engine, "mohammad", "serve_meal", "ahmad", 1.0)
//!     .unwrap();
//!
//! let hunger = entities.get_state("ahmad", "hunger").and_then(|value| value.as_number()).unwrap();
//! assert!((hunger - 0.2).abs() < 1e-9);
//! assert!(engine
//!     .ask(Term::compound("event", [
//!         Term::atom("mohammad"),
//!         Term::atom("serve_meal"),
//!         Term::atom("ahmad"),
//!         Term::var("V"),
//!     ]))
//!     .unwrap());
//! ```

pub mod entity;
pub mod error;
pub mod hierarchy;

pub use entity::{
    Action, Attribute, AttributeKind, AttributeValue, Changes, Effect, Entities, Entity, EntitySpec, Participant,
    Reaction, Response, ResponseOp, Scope,
};
pub use error::{EntityError, EntityResult, HierarchyError, HierarchyResult};
pub use hierarchy::{Hierarchy, Tree};
