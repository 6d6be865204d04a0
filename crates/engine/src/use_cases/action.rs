//! Unified action resolution.
//!
//! One pipeline resolves weapons, spells, and features: load the actor
//! and item, decide whether an attack roll is needed, roll it, evaluate
//! the hit against the first target, and collect damage/healing effects
//! (structured data first, description scraping as fallback). Thin
//! wrappers put resource charging in front of the pipeline per item
//! kind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use actioncore_domain::{
    expand_attribute_refs, Character, CharacterId, Item, ItemId, ItemKind,
};

use crate::infrastructure::ports::{
    CharacterStore, DiceRoller, DiceServiceError, Notifier, RollMode, StoreError,
};
use crate::use_cases::costs::evaluate_ap_cost;
use crate::use_cases::ledger::{LedgerError, ResourceLedger};
use crate::use_cases::scrape::{
    has_spell_attack_phrase, scrape_all_effects, scrape_attack_bonus,
};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    #[error(transparent)]
    Dice(#[from] DiceServiceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Who gets to see the roll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollVisibility {
    #[default]
    Public,
    Blind,
}

/// Per-use options chosen at execution time.
#[derive(Debug, Clone, Default)]
pub struct TacticalOptions {
    pub visibility: RollVisibility,
    /// Flat attack bonus from tactical advantage.
    pub tactical_advantage: i32,
    /// Flat attack penalty from tactical disadvantage.
    pub tactical_disadvantage: i32,
    /// AP discount from maneuvers; never drives the cost below zero.
    pub ap_cost_reduction: i32,
    /// Extra damage dice stacked onto the attack (e.g. sneak dice).
    pub extra_damage_formula: Option<String>,
    pub extra_damage_type: Option<String>,
}

/// The d20 attack roll, when the action called for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRoll {
    pub formula: String,
    pub total: i32,
    /// Natural face of the d20, when the roller reported one.
    pub face: Option<i32>,
    pub critical_success: bool,
    pub critical_failure: bool,
}

/// Hit/miss against the first target, with its defense revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitEvaluation {
    pub target_id: CharacterId,
    pub target_name: String,
    pub defense: i32,
    pub hit: bool,
}

/// One damage or healing line of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectEntry {
    /// Formula with attribute references already expanded.
    pub formula: String,
    pub damage_type: String,
    pub is_healing: bool,
    /// Upgraded formula on a critical hit: maximized base plus the dice
    /// again plus luck. Healing lines are never upgraded.
    pub critical_formula: Option<String>,
}

/// What the action cost, as actually charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCosts {
    pub ap: i32,
    pub sp: i32,
}

/// The fully resolved action, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub character_id: CharacterId,
    pub character_name: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub attack: Option<AttackRoll>,
    pub hit: Option<HitEvaluation>,
    pub effects: Vec<EffectEntry>,
    pub costs: ActionCosts,
    pub visibility: RollVisibility,
}

/// The resolution pipeline shared by every action kind.
pub struct ExecuteAction {
    store: Arc<dyn CharacterStore>,
    dice: Arc<dyn DiceRoller>,
    notifier: Arc<dyn Notifier>,
}

impl ExecuteAction {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        dice: Arc<dyn DiceRoller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            dice,
            notifier,
        }
    }

    /// Resolves one use of an item. Costs are assumed already charged;
    /// they are embedded in the result for display. Only the first
    /// target is evaluated for hit/miss.
    pub async fn execute(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        options: &TacticalOptions,
        targets: &[CharacterId],
        costs: ActionCosts,
    ) -> Result<ActionResult, ActionError> {
        let character = self.load_character(character_id).await?;
        let item = self.load_item(&character, item_id).await?;

        // NPC feature and action rolls stay hidden from players.
        let visibility = if character.is_npc()
            && matches!(item.kind, ItemKind::Feature | ItemKind::Action)
        {
            RollVisibility::Blind
        } else {
            options.visibility
        };

        let explicit_bonus = scrape_attack_bonus(&item.description);
        // Weapon-like gates only the crit-damage rule; features never
        // roll without an explicit attack phrase.
        let weapon_like =
            item.is_weapon() || (character.is_npc() && item.description.contains("Weapon"));
        let rolls_attack = item.is_weapon()
            || explicit_bonus.is_some()
            || (item.is_spell() && has_spell_attack_phrase(&item.description));

        let attack = if rolls_attack {
            Some(
                self.roll_attack(&character, &item, explicit_bonus, options)
                    .await?,
            )
        } else {
            None
        };

        let hit = match (&attack, targets.first()) {
            (Some(roll), Some(&target_id)) => {
                self.evaluate_hit(roll, target_id).await?
            }
            _ => None,
        };

        // Only weapon-like items get the critical damage upgrade.
        let critical = weapon_like && attack.as_ref().is_some_and(|a| a.critical_success);
        let effects = self
            .collect_effects(&character, &item, options, critical)
            .await;

        tracing::info!(
            character = %character.name,
            item = %item.name,
            attack = attack.as_ref().map(|a| a.total),
            hit = hit.as_ref().map(|h| h.hit),
            effects = effects.len(),
            "resolved action"
        );

        Ok(ActionResult {
            character_id: character.id,
            character_name: character.name,
            item_id: item.id,
            item_name: item.name,
            attack,
            hit,
            effects,
            costs,
            visibility,
        })
    }

    async fn load_character(&self, id: CharacterId) -> Result<Character, ActionError> {
        match self.store.get(id).await? {
            Some(character) => Ok(character),
            None => {
                self.notifier.warn("Character not found.");
                Err(ActionError::CharacterNotFound(id))
            }
        }
    }

    async fn load_item(
        &self,
        character: &Character,
        item_id: ItemId,
    ) -> Result<Item, ActionError> {
        match self.store.get_item(character.id, item_id).await? {
            Some(item) => Ok(item),
            None => {
                self.notifier.warn("Item not found.");
                Err(ActionError::ItemNotFound(item_id))
            }
        }
    }

    async fn roll_attack(
        &self,
        character: &Character,
        item: &Item,
        explicit_bonus: Option<i32>,
        options: &TacticalOptions,
    ) -> Result<AttackRoll, ActionError> {
        let base = explicit_bonus.unwrap_or_else(|| {
            character.attribute(item.attack_attribute_or_default(character.spell_attribute()))
        });
        let bonus = base + options.tactical_advantage - options.tactical_disadvantage;
        let formula = if bonus > 0 {
            format!("1d20 + {bonus}")
        } else if bonus < 0 {
            format!("1d20 - {}", -bonus)
        } else {
            "1d20".to_string()
        };

        let outcome = self.dice.evaluate(&formula, RollMode::Roll).await?;
        let face = outcome.active_face(20);

        Ok(AttackRoll {
            formula,
            total: outcome.total,
            face,
            critical_success: face == Some(20),
            critical_failure: face == Some(1),
        })
    }

    async fn evaluate_hit(
        &self,
        roll: &AttackRoll,
        target_id: CharacterId,
    ) -> Result<Option<HitEvaluation>, ActionError> {
        let Some(target) = self.store.get(target_id).await? else {
            self.notifier.warn("Target not found.");
            return Ok(None);
        };
        let defense = target.defense.unwrap_or(10);
        Ok(Some(HitEvaluation {
            target_id: target.id,
            target_name: target.name,
            defense,
            hit: roll.total >= defense,
        }))
    }

    async fn collect_effects(
        &self,
        character: &Character,
        item: &Item,
        options: &TacticalOptions,
        critical: bool,
    ) -> Vec<EffectEntry> {
        let mut effects: Vec<EffectEntry> = Vec::new();

        if let Some(damage) = &item.damage {
            effects.push(EffectEntry {
                formula: damage.formula.clone(),
                is_healing: damage.damage_type.eq_ignore_ascii_case("healing"),
                damage_type: damage.damage_type.clone(),
                critical_formula: None,
            });
        } else {
            for scraped in scrape_all_effects(&item.description) {
                effects.push(EffectEntry {
                    is_healing: scraped.is_healing(),
                    formula: scraped.formula,
                    damage_type: scraped.damage_type,
                    critical_formula: None,
                });
            }
        }

        // Extra damage folds into structured damage; on the scraped
        // path it stays its own entry.
        if let Some(extra) = options
            .extra_damage_formula
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
        {
            let structured = item.damage.is_some();
            match effects.iter_mut().find(|e| !e.is_healing) {
                Some(entry) if structured => {
                    entry.formula = format!("{} + {}", entry.formula, extra);
                }
                _ => {
                    effects.push(EffectEntry {
                        formula: extra.to_string(),
                        damage_type: options
                            .extra_damage_type
                            .clone()
                            .unwrap_or_else(|| "Extra".to_string()),
                        is_healing: false,
                        critical_formula: None,
                    });
                }
            }
        }

        for entry in &mut effects {
            entry.formula = expand_attribute_refs(&entry.formula, &character.attributes);
        }

        if critical {
            let luck = character.attribute("lck");
            for entry in &mut effects {
                if !entry.is_healing {
                    entry.critical_formula =
                        Some(self.critical_formula(&entry.formula, luck).await);
                }
            }
        }

        effects
    }

    /// Builds the critical damage formula: maximized base total, the
    /// dice rolled again, plus luck. Falls back to the base formula when
    /// the roller cannot evaluate it.
    async fn critical_formula(&self, formula: &str, luck: i32) -> String {
        match self.dice.evaluate(formula, RollMode::Maximize).await {
            Ok(outcome) => {
                let dice_terms: Vec<String> = outcome
                    .terms
                    .iter()
                    .filter_map(|term| {
                        term.faces
                            .map(|faces| format!("{}d{}", term.results.len(), faces))
                    })
                    .collect();
                if dice_terms.is_empty() {
                    format!("{} + {}", outcome.total, luck)
                } else {
                    format!("{} + {} + {}", outcome.total, dice_terms.join(" + "), luck)
                }
            }
            Err(error) => {
                tracing::warn!(formula, %error, "cannot maximize formula for critical");
                formula.to_string()
            }
        }
    }
}

/// Weapon use: AP cost (minus any maneuver discount) is charged, then
/// the pipeline runs.
pub struct WeaponAttack {
    store: Arc<dyn CharacterStore>,
    notifier: Arc<dyn Notifier>,
    ledger: ResourceLedger,
    action: ExecuteAction,
}

impl WeaponAttack {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        dice: Arc<dyn DiceRoller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger: ResourceLedger::new(store.clone(), notifier.clone()),
            action: ExecuteAction::new(store.clone(), dice, notifier.clone()),
            store,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        options: &TacticalOptions,
        targets: &[CharacterId],
    ) -> Result<ActionResult, ActionError> {
        let character = self
            .store
            .get(character_id)
            .await?
            .ok_or(ActionError::CharacterNotFound(character_id))?;
        let item = self
            .store
            .get_item(character_id, item_id)
            .await?
            .ok_or(ActionError::ItemNotFound(item_id))?;

        let ap_cost = (evaluate_ap_cost(&item, &character, self.notifier.as_ref())
            - options.ap_cost_reduction)
            .max(0);
        let charged = self.ledger.charge_for_action(character_id, ap_cost, 0).await?;

        self.action
            .execute(
                character_id,
                item_id,
                options,
                targets,
                ActionCosts {
                    ap: charged.ap,
                    sp: 0,
                },
            )
            .await
    }
}

/// Spell cast: SP and AP are charged up front. NPCs can fast-cast,
/// skipping resource accounting entirely.
pub struct CastSpell {
    store: Arc<dyn CharacterStore>,
    notifier: Arc<dyn Notifier>,
    ledger: ResourceLedger,
    action: ExecuteAction,
}

impl CastSpell {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        dice: Arc<dyn DiceRoller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger: ResourceLedger::new(store.clone(), notifier.clone()),
            action: ExecuteAction::new(store.clone(), dice, notifier.clone()),
            store,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        options: &TacticalOptions,
        targets: &[CharacterId],
    ) -> Result<ActionResult, ActionError> {
        let character = self
            .store
            .get(character_id)
            .await?
            .ok_or(ActionError::CharacterNotFound(character_id))?;
        let item = self
            .store
            .get_item(character_id, item_id)
            .await?
            .ok_or(ActionError::ItemNotFound(item_id))?;

        let ap_cost = evaluate_ap_cost(&item, &character, self.notifier.as_ref());
        let charged = self
            .ledger
            .charge_for_action(character_id, ap_cost, item.sp_cost)
            .await?;

        self.action
            .execute(
                character_id,
                item_id,
                options,
                targets,
                ActionCosts {
                    ap: charged.ap,
                    sp: charged.sp,
                },
            )
            .await
    }

    /// NPC fast-cast: the spell resolves without touching pools.
    pub async fn execute_npc_fast(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        options: &TacticalOptions,
        targets: &[CharacterId],
    ) -> Result<ActionResult, ActionError> {
        self.action
            .execute(character_id, item_id, options, targets, ActionCosts::default())
            .await
    }
}

/// Feature use: features are free, the pipeline runs directly.
pub struct UseFeature {
    action: ExecuteAction,
}

impl UseFeature {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        dice: Arc<dyn DiceRoller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            action: ExecuteAction::new(store, dice, notifier),
        }
    }

    pub async fn execute(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        options: &TacticalOptions,
        targets: &[CharacterId],
    ) -> Result<ActionResult, ActionError> {
        self.action
            .execute(character_id, item_id, options, targets, ActionCosts::default())
            .await
    }
}

/// Convenience bundle wiring every action use case to the same ports.
pub struct ActionUseCases {
    pub weapon_attack: WeaponAttack,
    pub cast_spell: CastSpell,
    pub use_feature: UseFeature,
}

impl ActionUseCases {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        dice: Arc<dyn DiceRoller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            weapon_attack: WeaponAttack::new(store.clone(), dice.clone(), notifier.clone()),
            cast_spell: CastSpell::new(store.clone(), dice.clone(), notifier.clone()),
            use_feature: UseFeature::new(store, dice, notifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        DieResult, MockCharacterStore, MockDiceRoller, MockNotifier, RollOutcome,
        RollTermResult,
    };
    use actioncore_domain::{CharacterKind, DamageSpec, ResourcePool};

    fn d20_outcome(face: i32, bonus: i32) -> RollOutcome {
        RollOutcome {
            formula: format!("1d20 + {bonus}"),
            total: face + bonus,
            terms: vec![
                RollTermResult {
                    faces: Some(20),
                    results: vec![DieResult {
                        value: face,
                        active: true,
                    }],
                },
                RollTermResult {
                    faces: None,
                    results: vec![DieResult {
                        value: bonus,
                        active: true,
                    }],
                },
            ],
        }
    }

    fn fencer() -> Character {
        let mut character = Character::new("Vex", CharacterKind::Player);
        character.attributes.insert("dex".to_string(), 4);
        character.attributes.insert("lck".to_string(), 1);
        character
    }

    fn rapier() -> Item {
        let mut item = Item::new("Rapier", ItemKind::Weapon);
        item.attack_attribute = Some("dex".to_string());
        item.damage = Some(DamageSpec {
            formula: "1d6 + 2".to_string(),
            damage_type: "sharp".to_string(),
        });
        item
    }

    fn store_with(character: Character, item: Item) -> MockCharacterStore {
        let mut store = MockCharacterStore::new();
        let char_clone = character.clone();
        let char_id = character.id;
        store
            .expect_get()
            .withf(move |id| *id == char_id)
            .returning(move |_| Ok(Some(char_clone.clone())));
        store
            .expect_get_item()
            .returning(move |_, _| Ok(Some(item.clone())));
        store
    }

    fn pipeline(store: MockCharacterStore, dice: MockDiceRoller) -> ExecuteAction {
        ExecuteAction::new(
            Arc::new(store),
            Arc::new(dice),
            Arc::new(MockNotifier::new()),
        )
    }

    #[tokio::test]
    async fn test_weapon_attack_hits_revealed_defense() {
        let character = fencer();
        let item = rapier();
        let char_id = character.id;
        let item_id = item.id;

        let mut target = Character::new("Brigand", CharacterKind::Npc);
        target.defense = Some(12);
        let target_id = target.id;
        let target_clone = target.clone();

        let mut store = store_with(character, item);
        store
            .expect_get()
            .withf(move |id| *id == target_id)
            .returning(move |_| Ok(Some(target_clone.clone())));

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|formula, mode| formula == "1d20 + 4" && *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(12, 4)));

        let result = pipeline(store, dice)
            .execute(
                char_id,
                item_id,
                &TacticalOptions::default(),
                &[target_id],
                ActionCosts { ap: 3, sp: 0 },
            )
            .await
            .expect("execute");

        let attack = result.attack.expect("attack roll");
        assert_eq!(attack.total, 16);
        assert!(!attack.critical_success);

        let hit = result.hit.expect("hit evaluation");
        assert_eq!(hit.defense, 12);
        assert!(hit.hit);

        assert_eq!(result.effects.len(), 1);
        assert_eq!(result.effects[0].formula, "1d6 + 2");
        assert_eq!(result.costs, ActionCosts { ap: 3, sp: 0 });
    }

    #[tokio::test]
    async fn test_advantage_and_disadvantage_shift_the_bonus() {
        let character = fencer();
        let item = rapier();
        let char_id = character.id;
        let item_id = item.id;
        let store = store_with(character, item);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|formula, _| formula == "1d20 + 5")
            .returning(|_, _| Ok(d20_outcome(7, 5)));

        let options = TacticalOptions {
            tactical_advantage: 2,
            tactical_disadvantage: 1,
            ..TacticalOptions::default()
        };
        let result = pipeline(store, dice)
            .execute(char_id, item_id, &options, &[], ActionCosts::default())
            .await
            .expect("execute");

        assert_eq!(result.attack.expect("attack roll").formula, "1d20 + 5");
    }

    #[tokio::test]
    async fn test_natural_twenty_builds_critical_formula() {
        let character = fencer();
        let item = rapier();
        let char_id = character.id;
        let item_id = item.id;
        let store = store_with(character, item);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(20, 4)));
        dice.expect_evaluate()
            .withf(|formula, mode| formula == "1d6 + 2" && *mode == RollMode::Maximize)
            .returning(|_, _| {
                Ok(RollOutcome {
                    formula: "1d6 + 2".to_string(),
                    total: 8,
                    terms: vec![
                        RollTermResult {
                            faces: Some(6),
                            results: vec![DieResult {
                                value: 6,
                                active: true,
                            }],
                        },
                        RollTermResult {
                            faces: None,
                            results: vec![DieResult {
                                value: 2,
                                active: true,
                            }],
                        },
                    ],
                })
            });

        let result = pipeline(store, dice)
            .execute(
                char_id,
                item_id,
                &TacticalOptions::default(),
                &[],
                ActionCosts::default(),
            )
            .await
            .expect("execute");

        let attack = result.attack.expect("attack roll");
        assert!(attack.critical_success);
        // Maximized 8, the 1d6 again, luck 1.
        assert_eq!(
            result.effects[0].critical_formula.as_deref(),
            Some("8 + 1d6 + 1")
        );
    }

    #[tokio::test]
    async fn test_critical_formula_falls_back_on_roller_error() {
        let mut character = fencer();
        character.attributes.insert("str".to_string(), 2);
        let mut item = rapier();
        // Attribute reference expands to "1d6 + 2"; pretend the roller
        // rejects it anyway.
        item.damage = Some(DamageSpec {
            formula: "1d6 + @str".to_string(),
            damage_type: "sharp".to_string(),
        });
        let char_id = character.id;
        let item_id = item.id;
        let store = store_with(character, item);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(20, 4)));
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Maximize)
            .returning(|f, _| Err(DiceServiceError::InvalidFormula(f.to_string())));

        let result = pipeline(store, dice)
            .execute(
                char_id,
                item_id,
                &TacticalOptions::default(),
                &[],
                ActionCosts::default(),
            )
            .await
            .expect("execute");

        assert_eq!(result.effects[0].formula, "1d6 + 2");
        assert_eq!(
            result.effects[0].critical_formula.as_deref(),
            Some("1d6 + 2")
        );
    }

    #[tokio::test]
    async fn test_npc_feature_roll_is_forced_blind() {
        let mut npc = Character::new("Ogre", CharacterKind::Npc);
        npc.attributes.insert("str".to_string(), 3);
        let mut feature = Item::new("Roar", ItemKind::Feature);
        feature.description = "Attack: +5 against all nearby foes.".to_string();
        let char_id = npc.id;
        let item_id = feature.id;
        let store = store_with(npc, feature);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|formula, _| formula == "1d20 + 5")
            .returning(|_, _| Ok(d20_outcome(9, 5)));

        let options = TacticalOptions {
            visibility: RollVisibility::Public,
            ..TacticalOptions::default()
        };
        let result = pipeline(store, dice)
            .execute(char_id, item_id, &options, &[], ActionCosts::default())
            .await
            .expect("execute");

        assert_eq!(result.visibility, RollVisibility::Blind);
    }

    #[tokio::test]
    async fn test_scraped_effects_and_extra_damage() {
        let character = fencer();
        let mut item = Item::new("Flame Jet", ItemKind::Spell);
        item.description = "Make a magic attack. Deals 2d6 fire damage.".to_string();
        let char_id = character.id;
        let item_id = item.id;
        let store = store_with(character, item);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(11, 0)));

        let options = TacticalOptions {
            extra_damage_formula: Some("1d4".to_string()),
            ..TacticalOptions::default()
        };
        let result = pipeline(store, dice)
            .execute(char_id, item_id, &options, &[], ActionCosts::default())
            .await
            .expect("execute");

        assert!(result.attack.is_some());
        // Scraped damage and extra damage stay separate entries.
        assert_eq!(result.effects.len(), 2);
        assert_eq!(result.effects[0].formula, "2d6");
        assert_eq!(result.effects[0].damage_type, "fire");
        assert_eq!(result.effects[1].formula, "1d4");
        assert_eq!(result.effects[1].damage_type, "Extra");
    }

    #[tokio::test]
    async fn test_extra_damage_folds_into_structured_damage() {
        let character = fencer();
        let item = rapier();
        let char_id = character.id;
        let item_id = item.id;
        let store = store_with(character, item);

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(10, 4)));

        let options = TacticalOptions {
            extra_damage_formula: Some("1d4".to_string()),
            ..TacticalOptions::default()
        };
        let result = pipeline(store, dice)
            .execute(char_id, item_id, &options, &[], ActionCosts::default())
            .await
            .expect("execute");

        assert_eq!(result.effects.len(), 1);
        assert_eq!(result.effects[0].formula, "1d6 + 2 + 1d4");
    }

    #[tokio::test]
    async fn test_npc_feature_without_attack_phrase_does_not_roll() {
        let mut npc = Character::new("Ogre", CharacterKind::Npc);
        npc.attributes.insert("str".to_string(), 3);
        let mut feature = Item::new("Guard Stance", ItemKind::Feature);
        feature.description = "Raises its Weapon to block incoming blows.".to_string();
        let char_id = npc.id;
        let item_id = feature.id;
        let store = store_with(npc, feature);

        // No dice expectations: nothing may be rolled.
        let result = pipeline(store, MockDiceRoller::new())
            .execute(
                char_id,
                item_id,
                &TacticalOptions::default(),
                &[],
                ActionCosts::default(),
            )
            .await
            .expect("execute");

        assert!(result.attack.is_none());
        assert!(result.hit.is_none());
    }

    #[tokio::test]
    async fn test_missing_target_warns_and_skips_hit_evaluation() {
        let character = fencer();
        let item = rapier();
        let char_id = character.id;
        let item_id = item.id;
        let missing_target = CharacterId::new();

        let mut store = store_with(character, item);
        store
            .expect_get()
            .withf(move |id| *id == missing_target)
            .returning(|_| Ok(None));

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(12, 4)));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_warn()
            .withf(|msg| msg.contains("Target not found"))
            .times(1)
            .return_const(());

        let use_case = ExecuteAction::new(
            Arc::new(store),
            Arc::new(dice),
            Arc::new(notifier),
        );
        let result = use_case
            .execute(
                char_id,
                item_id,
                &TacticalOptions::default(),
                &[missing_target],
                ActionCosts::default(),
            )
            .await
            .expect("execute");

        assert!(result.attack.is_some());
        assert!(result.hit.is_none());
    }

    #[tokio::test]
    async fn test_weapon_attack_wrapper_charges_discounted_ap() {
        let mut character = fencer();
        character.in_combat = true;
        character.action_points = ResourcePool::new(6, 6);
        let mut item = rapier();
        item.ap_cost_formula = Some("3".to_string());
        let char_id = character.id;
        let item_id = item.id;

        let mut store = store_with(character, item);
        store
            .expect_save()
            .withf(|saved| saved.action_points.value == 4)
            .times(1)
            .returning(|_| Ok(()));

        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(10, 4)));

        let use_case = WeaponAttack::new(
            Arc::new(store),
            Arc::new(dice),
            Arc::new(MockNotifier::new()),
        );
        let options = TacticalOptions {
            ap_cost_reduction: 1,
            ..TacticalOptions::default()
        };
        let result = use_case
            .execute(char_id, item_id, &options, &[])
            .await
            .expect("execute");

        assert_eq!(result.costs, ActionCosts { ap: 2, sp: 0 });
    }

    #[tokio::test]
    async fn test_npc_fast_cast_skips_resource_accounting() {
        let mut npc = Character::new("Hag", CharacterKind::Npc);
        npc.in_combat = true;
        npc.spell_points = ResourcePool::new(0, 0);
        let mut spell = Item::new("Hex Bolt", ItemKind::Spell);
        spell.sp_cost = 4;
        spell.description = "Make a magic attack. Deals 1d8 necrotic damage.".to_string();
        let char_id = npc.id;
        let item_id = spell.id;

        // No save expectation: fast-cast must never persist pool changes.
        let store = store_with(npc, spell);
        let mut dice = MockDiceRoller::new();
        dice.expect_evaluate()
            .withf(|_, mode| *mode == RollMode::Roll)
            .returning(|_, _| Ok(d20_outcome(14, 0)));

        let use_case = CastSpell::new(
            Arc::new(store),
            Arc::new(dice),
            Arc::new(MockNotifier::new()),
        );
        let result = use_case
            .execute_npc_fast(char_id, item_id, &TacticalOptions::default(), &[])
            .await
            .expect("execute");

        assert_eq!(result.costs, ActionCosts::default());
    }
}
