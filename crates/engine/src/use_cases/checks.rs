//! Skill, save, and raw attribute checks: 1d20 plus a sheet bonus.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use actioncore_domain::CharacterId;

use crate::infrastructure::ports::{
    CharacterStore, DiceRoller, DiceServiceError, RollMode, StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("No such skill or save: {0}")]
    NotFound(String),
    #[error(transparent)]
    Dice(#[from] DiceServiceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A resolved d20 check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Display title ("Stealth Check", "Will Save").
    pub title: String,
    pub formula: String,
    pub total: i32,
    pub critical_success: bool,
    pub critical_failure: bool,
}

/// Rolls checks against a character's sheet.
pub struct CheckRoll {
    store: Arc<dyn CharacterStore>,
    dice: Arc<dyn DiceRoller>,
}

impl CheckRoll {
    pub fn new(store: Arc<dyn CharacterStore>, dice: Arc<dyn DiceRoller>) -> Self {
        Self { store, dice }
    }

    /// Skill check: the sheet's skill bonus over 1d20. The skill key is
    /// matched case-insensitively.
    pub async fn roll_skill(
        &self,
        character_id: CharacterId,
        skill_key: &str,
    ) -> Result<CheckResult, CheckError> {
        let character = self.load(character_id).await?;
        let wanted = skill_key.to_lowercase();
        let skill = character
            .skills
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, skill)| skill)
            .ok_or_else(|| CheckError::NotFound(skill_key.to_string()))?;

        self.roll(format!("{} Check", skill.label), skill.bonus).await
    }

    /// Saving throw: the sheet's save bonus.
    pub async fn roll_save(
        &self,
        character_id: CharacterId,
        save_key: &str,
    ) -> Result<CheckResult, CheckError> {
        let character = self.load(character_id).await?;
        let wanted = save_key.to_lowercase();
        let bonus = character
            .saves
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, bonus)| *bonus)
            .ok_or_else(|| CheckError::NotFound(save_key.to_string()))?;

        self.roll(format!("{} Save", title_case(save_key)), bonus).await
    }

    /// Raw attribute check; the key goes through attribute resolution,
    /// so aliases and near-misses work here too.
    pub async fn roll_attribute(
        &self,
        character_id: CharacterId,
        attribute_key: &str,
    ) -> Result<CheckResult, CheckError> {
        let character = self.load(character_id).await?;
        let bonus = character.attribute(attribute_key);

        self.roll(format!("{} Check", title_case(attribute_key)), bonus)
            .await
    }

    async fn load(
        &self,
        character_id: CharacterId,
    ) -> Result<actioncore_domain::Character, CheckError> {
        self.store
            .get(character_id)
            .await?
            .ok_or(CheckError::CharacterNotFound(character_id))
    }

    async fn roll(&self, title: String, bonus: i32) -> Result<CheckResult, CheckError> {
        let formula = if bonus >= 0 {
            format!("1d20 + {bonus}")
        } else {
            format!("1d20 - {}", -bonus)
        };
        let outcome = self.dice.evaluate(&formula, RollMode::Roll).await?;
        let face = outcome.active_face(20);

        Ok(CheckResult {
            title,
            formula,
            total: outcome.total,
            critical_success: face == Some(20),
            critical_failure: face == Some(1),
        })
    }
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
