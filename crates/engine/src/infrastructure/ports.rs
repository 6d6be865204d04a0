//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Dice evaluation (host platform roller vs in-process RNG)
//! - Character/item persistence (treated as a key-value store)
//! - User notifications (host UI vs logging)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use actioncore_domain::{Character, CharacterId, Item, ItemId};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DiceServiceError {
    #[error("Invalid roll formula: {0}")]
    InvalidFormula(String),
    #[error("Dice service unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Dice Types
// =============================================================================

/// How a formula should be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollMode {
    /// Roll every die normally.
    Roll,
    /// Every die shows its highest face (formula ceiling).
    Maximize,
}

/// One die (or constant) result inside a rolled term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DieResult {
    pub value: i32,
    /// Inactive results are dropped dice (advantage mechanics etc.).
    pub active: bool,
}

/// One evaluated term of a roll: faces is None for constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollTermResult {
    pub faces: Option<u32>,
    pub results: Vec<DieResult>,
}

/// The outcome of evaluating a roll formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
    pub formula: String,
    pub total: i32,
    pub terms: Vec<RollTermResult>,
}

impl RollOutcome {
    /// The active face value of the first term with the given die size
    /// (e.g. the d20 of an attack roll).
    pub fn active_face(&self, faces: u32) -> Option<i32> {
        let term = self.terms.iter().find(|t| t.faces == Some(faces))?;
        term.results
            .iter()
            .find(|r| r.active)
            .or_else(|| term.results.first())
            .map(|r| r.value)
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Dice evaluation service. The engine builds formula strings; this
/// port turns them into totals and per-die results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiceRoller: Send + Sync {
    async fn evaluate(
        &self,
        formula: &str,
        mode: RollMode,
    ) -> Result<RollOutcome, DiceServiceError>;
}

/// Character and item persistence. Updates are fire-and-forget from the
/// core's perspective; per-character serialization is the caller's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, StoreError>;
    async fn get_item(
        &self,
        character: CharacterId,
        item: ItemId,
    ) -> Result<Option<Item>, StoreError>;
    async fn save(&self, character: &Character) -> Result<(), StoreError>;
}

/// User-facing notification sink. Used only on missing-entity,
/// insufficient-resource, and malformed-formula paths - never for
/// expected control flow.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}
