//! ActionCore engine library.
//!
//! Server-side action resolution for attribute-driven tabletop play:
//! attack rolls, damage and healing extraction, resource accounting,
//! and loadout assembly.
//!
//! ## Structure
//!
//! - `use_cases/` - Action resolution user stories
//! - `infrastructure/` - Port traits and in-process adapters

pub mod infrastructure;
pub mod use_cases;

pub use infrastructure::ports::{
    CharacterStore, DiceRoller, DiceServiceError, DieResult, Notifier, RollMode,
    RollOutcome, RollTermResult, StoreError,
};
pub use infrastructure::{RngDiceRoller, TracingNotifier};
pub use use_cases::action::{
    ActionCosts, ActionError, ActionResult, ActionUseCases, AttackRoll, CastSpell,
    EffectEntry, ExecuteAction, HitEvaluation, RollVisibility, TacticalOptions,
    UseFeature, WeaponAttack,
};
pub use use_cases::checks::{CheckError, CheckResult, CheckRoll};
pub use use_cases::costs::{evaluate_ap_cost, DEFAULT_AP_COST};
pub use use_cases::ledger::{ChargedCosts, LedgerError, PoolKind, ResourceLedger};
pub use use_cases::loadout::{build_loadout, ItemSummary, Loadout, MultiattackSummary};
pub use use_cases::scrape::{
    classify_spell_preview, find_item_references, has_spell_attack_phrase,
    scrape_all_effects, scrape_attack_bonus, scrape_damage, scrape_healing,
    ScrapedEffect, SpellPreview,
};
