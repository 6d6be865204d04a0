//! ActionCore domain crate.
//!
//! Pure domain types and invariants for the action-resolution engine:
//! entities (characters, items), value objects (attribute resolution,
//! resource pools, roll expressions, cost formulas), and the unified
//! domain error. No I/O, no RNG (randomness is injected via closure),
//! no async.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{Character, CharacterKind, DamageSpec, Item, ItemKind, Skill};
pub use error::DomainError;
pub use ids::{CharacterId, ItemId};
pub use value_objects::{
    eval_formula, expand_attribute_refs, resolve_attribute, DiceParseError, FormulaError,
    ResourcePool, RollExpression, RolledExpression, RolledTerm,
};
