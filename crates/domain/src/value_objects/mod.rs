//! Value objects: small immutable types with domain meaning.

mod attributes;
mod dice;
mod formula;
mod resource_pool;

pub use attributes::{expand_attribute_refs, resolve_attribute};
pub use dice::{
    DiceParseError, RollExpression, RolledExpression, RolledTerm, SignedTerm, TermKind,
};
pub use formula::{eval_formula, FormulaError};
pub use resource_pool::ResourcePool;
