//! Action point cost evaluation.

use actioncore_domain::{eval_formula, Character, Item};

use crate::infrastructure::ports::Notifier;

/// AP cost used when an item has no formula or its formula is broken.
pub const DEFAULT_AP_COST: i32 = 3;

/// Evaluates an item's AP cost formula against its owner's attributes.
///
/// Results round half-up to the nearest integer. A malformed formula is
/// reported once through the notifier and falls back to
/// [`DEFAULT_AP_COST`] so a data-entry typo never blocks play.
pub fn evaluate_ap_cost(item: &Item, character: &Character, notifier: &dyn Notifier) -> i32 {
    let Some(formula) = item.ap_cost_formula.as_deref() else {
        return DEFAULT_AP_COST;
    };
    let formula = formula.trim();
    if formula.is_empty() {
        return DEFAULT_AP_COST;
    }

    match eval_formula(formula, |key| character.attribute(key)) {
        Ok(value) => value.round() as i32,
        Err(error) => {
            tracing::error!(
                item = %item.name,
                formula,
                %error,
                "failed to evaluate AP cost formula"
            );
            notifier.error(&format!(
                "Invalid AP cost formula on {}: \"{}\". Using {} AP.",
                item.name, formula, DEFAULT_AP_COST
            ));
            DEFAULT_AP_COST
        }
    }
}
