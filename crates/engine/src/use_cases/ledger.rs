//! Resource accounting: spending, refunds, damage, and turn refresh.
//!
//! Every mutation loads the character, adjusts pools, and saves. Charges
//! are all-or-nothing: both costs are checked before either pool moves,
//! so a failed SP check never leaves AP half-spent.

use std::sync::Arc;

use actioncore_domain::CharacterId;

use crate::infrastructure::ports::{CharacterStore, Notifier, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("Insufficient AP: need {need}, have {have}")]
    InsufficientAp { need: i32, have: i32 },
    #[error("Insufficient SP: need {need}, have {have}")]
    InsufficientSp { need: i32, have: i32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which pool a refund targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    ActionPoints,
    SpellPoints,
}

/// What a successful charge actually deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargedCosts {
    pub ap: i32,
    pub sp: i32,
}

/// Spends and restores character resources.
pub struct ResourceLedger {
    store: Arc<dyn CharacterStore>,
    notifier: Arc<dyn Notifier>,
}

impl ResourceLedger {
    pub fn new(store: Arc<dyn CharacterStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Charges an action's costs.
    ///
    /// SP is checked first, then AP. AP is only enforced (and deducted)
    /// while the character is in combat; out of combat the returned AP
    /// charge is zero. On an insufficient pool the user is notified and
    /// nothing is deducted.
    pub async fn charge_for_action(
        &self,
        character_id: CharacterId,
        ap_cost: i32,
        sp_cost: i32,
    ) -> Result<ChargedCosts, LedgerError> {
        let mut character = self
            .store
            .get(character_id)
            .await?
            .ok_or(LedgerError::CharacterNotFound(character_id))?;

        if sp_cost > 0 && !character.spell_points.can_afford(sp_cost) {
            let have = character.spell_points.value;
            self.notifier
                .error(&format!("Not enough SP! Need {sp_cost}, have {have}."));
            return Err(LedgerError::InsufficientSp {
                need: sp_cost,
                have,
            });
        }

        let charge_ap = character.in_combat && ap_cost > 0;
        if charge_ap && !character.action_points.can_afford(ap_cost) {
            let have = character.action_points.value;
            self.notifier
                .error(&format!("Not enough AP! Need {ap_cost}, have {have}."));
            return Err(LedgerError::InsufficientAp {
                need: ap_cost,
                have,
            });
        }

        if sp_cost > 0 {
            character.spell_points.spend(sp_cost);
        }
        let ap_charged = if charge_ap {
            character.action_points.spend(ap_cost);
            ap_cost
        } else {
            0
        };

        self.store.save(&character).await?;
        tracing::debug!(
            character = %character.name,
            ap = ap_charged,
            sp = sp_cost.max(0),
            "charged action costs"
        );

        Ok(ChargedCosts {
            ap: ap_charged,
            sp: sp_cost.max(0),
        })
    }

    /// Returns points to a pool, clamped to its maximum. Returns the
    /// pool's new value.
    pub async fn refund(
        &self,
        character_id: CharacterId,
        pool: PoolKind,
        amount: i32,
    ) -> Result<i32, LedgerError> {
        let mut character = self
            .store
            .get(character_id)
            .await?
            .ok_or(LedgerError::CharacterNotFound(character_id))?;

        let target = match pool {
            PoolKind::ActionPoints => &mut character.action_points,
            PoolKind::SpellPoints => &mut character.spell_points,
        };
        target.restore(amount);
        let new_value = target.value;

        self.store.save(&character).await?;
        Ok(new_value)
    }

    /// Applies damage to hit points, clamped at zero. Returns the new
    /// HP value.
    pub async fn apply_damage(
        &self,
        character_id: CharacterId,
        amount: i32,
    ) -> Result<i32, LedgerError> {
        let mut character = self
            .store
            .get(character_id)
            .await?
            .ok_or(LedgerError::CharacterNotFound(character_id))?;

        character.hit_points.spend(amount);
        let new_value = character.hit_points.value;

        self.store.save(&character).await?;
        tracing::debug!(character = %character.name, amount, hp = new_value, "applied damage");
        Ok(new_value)
    }

    /// Applies healing to hit points, clamped at the maximum. Returns
    /// the new HP value.
    pub async fn apply_healing(
        &self,
        character_id: CharacterId,
        amount: i32,
    ) -> Result<i32, LedgerError> {
        let mut character = self
            .store
            .get(character_id)
            .await?
            .ok_or(LedgerError::CharacterNotFound(character_id))?;

        character.hit_points.restore(amount);
        let new_value = character.hit_points.value;

        self.store.save(&character).await?;
        tracing::debug!(character = %character.name, amount, hp = new_value, "applied healing");
        Ok(new_value)
    }

    /// Refreshes action points at the start of a combat turn.
    ///
    /// From round 2 on, unspent AP carries over up to a reactive cap of
    /// `ceil(level / 2) + 1` (challenge rating for NPCs), so the pool
    /// may sit above its maximum for the turn. Returns the new AP value.
    pub async fn refresh_turn_ap(
        &self,
        character_id: CharacterId,
        round: i32,
    ) -> Result<i32, LedgerError> {
        let mut character = self
            .store
            .get(character_id)
            .await?
            .ok_or(LedgerError::CharacterNotFound(character_id))?;

        let level = character.effective_level().max(1);
        let reactive_cap = (level + 1) / 2 + 1;
        let carryover = if round > 1 {
            character.action_points.value.clamp(0, reactive_cap)
        } else {
            0
        };

        // Deliberate overfill: carryover stacks on top of the maximum.
        character.action_points.value = character.action_points.max + carryover;
        let new_value = character.action_points.value;

        self.store.save(&character).await?;
        tracing::debug!(
            character = %character.name,
            round,
            carryover,
            ap = new_value,
            "refreshed turn AP"
        );
        Ok(new_value)
    }
}
