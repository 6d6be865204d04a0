//! Domain entities.

mod character;
mod item;

pub use character::{Character, CharacterKind, Skill};
pub use item::{DamageSpec, Item, ItemKind};
