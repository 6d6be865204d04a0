//! Loadout assembly: grouping and enriching a character's items for
//! presentation.
//!
//! Pure over the inputs - the caller supplies the character and item
//! list, and gets back sorted buckets with attack/cost/damage summaries
//! precomputed so the presentation layer never touches game math.

use serde::{Deserialize, Serialize};

use actioncore_domain::{Character, Item, ItemId, ItemKind};

use crate::infrastructure::ports::Notifier;
use crate::use_cases::costs::evaluate_ap_cost;
use crate::use_cases::scrape::{
    classify_spell_preview, find_item_references, scrape_attack_bonus, scrape_damage,
    SpellPreview,
};

/// One item prepared for display. Enrichment fields are only populated
/// for weapons and spells; grouping kinds carry just identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Attribute backing the attack roll.
    pub attr_key: Option<String>,
    pub attr_value: Option<i32>,
    /// Signed attack bonus label ("+4", "-1").
    pub attack_label: Option<String>,
    pub ap_cost: Option<i32>,
    /// Damage formula with the attack attribute folded in.
    pub resolved_damage: Option<String>,
    pub preview: Option<SpellPreview>,
}

/// An NPC multiattack routine and the sibling items it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiattackSummary {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    /// Names of the actions this routine chains, in longest-match order.
    pub references: Vec<String>,
}

/// A character's items grouped for the action bar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loadout {
    pub is_npc: bool,
    pub weapons: Vec<ItemSummary>,
    pub spells: Vec<ItemSummary>,
    pub talents: Vec<ItemSummary>,
    pub features: Vec<ItemSummary>,
    pub actions: Vec<ItemSummary>,
    pub reactions: Vec<ItemSummary>,
    pub multiattack: Option<MultiattackSummary>,
}

/// Groups and enriches a character's items.
///
/// Weapons and spells carry attack, cost, and damage summaries. NPC
/// weapons also appear under actions, and an NPC item named
/// "multiattack" is pulled out with its referenced siblings resolved.
pub fn build_loadout(character: &Character, items: &[Item], notifier: &dyn Notifier) -> Loadout {
    let mut loadout = Loadout {
        is_npc: character.is_npc(),
        ..Loadout::default()
    };
    let mut multiattack_item: Option<&Item> = None;

    for item in items {
        if character.is_npc() && is_multiattack_name(&item.name) {
            multiattack_item = Some(item);
            continue;
        }

        match effective_bucket(item) {
            Bucket::Weapons => {
                let summary = enrich(item, character, notifier);
                if character.is_npc() {
                    loadout.actions.push(summary.clone());
                }
                loadout.weapons.push(summary);
            }
            Bucket::Spells => loadout.spells.push(enrich(item, character, notifier)),
            Bucket::Talents => loadout.talents.push(bare(item)),
            Bucket::Features => loadout.features.push(bare(item)),
            Bucket::Actions => loadout.actions.push(bare(item)),
            Bucket::Reactions => loadout.reactions.push(bare(item)),
        }
    }

    if let Some(item) = multiattack_item {
        let mut names: Vec<String> = loadout
            .actions
            .iter()
            .chain(loadout.spells.iter())
            .chain(loadout.features.iter())
            .map(|summary| summary.name.clone())
            .collect();
        names.sort();
        names.dedup();

        loadout.multiattack = Some(MultiattackSummary {
            item_id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            references: find_item_references(&item.description, &names),
        });
    }

    for bucket in [
        &mut loadout.weapons,
        &mut loadout.spells,
        &mut loadout.talents,
        &mut loadout.features,
        &mut loadout.actions,
        &mut loadout.reactions,
    ] {
        bucket.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }

    loadout
}

enum Bucket {
    Weapons,
    Spells,
    Talents,
    Features,
    Actions,
    Reactions,
}

/// Kind drives the bucket; a category hint can reroute features and
/// actions the sheet filed loosely.
fn effective_bucket(item: &Item) -> Bucket {
    let category = item.category_lower();
    match item.kind {
        ItemKind::Weapon => Bucket::Weapons,
        ItemKind::Spell => Bucket::Spells,
        ItemKind::Talent | ItemKind::Passive => Bucket::Talents,
        ItemKind::Reaction => Bucket::Reactions,
        ItemKind::Action => match category.as_deref() {
            Some("reaction") => Bucket::Reactions,
            _ => Bucket::Actions,
        },
        ItemKind::Feature => match category.as_deref() {
            Some("action") => Bucket::Actions,
            Some("reaction") => Bucket::Reactions,
            Some("passive") => Bucket::Talents,
            _ => Bucket::Features,
        },
    }
}

fn is_multiattack_name(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "multiattack" | "multi attack" | "multi-attack"
    )
}

fn bare(item: &Item) -> ItemSummary {
    ItemSummary {
        item_id: item.id,
        name: item.name.clone(),
        kind: item.kind,
        attr_key: None,
        attr_value: None,
        attack_label: None,
        ap_cost: None,
        resolved_damage: None,
        preview: None,
    }
}

fn enrich(item: &Item, character: &Character, notifier: &dyn Notifier) -> ItemSummary {
    let attr_key = item
        .attack_attribute_or_default(character.spell_attribute())
        .to_string();
    let attr_value = character.attribute(&attr_key);
    let bonus = scrape_attack_bonus(&item.description).unwrap_or(attr_value);

    ItemSummary {
        item_id: item.id,
        name: item.name.clone(),
        kind: item.kind,
        attack_label: Some(signed(bonus)),
        ap_cost: Some(evaluate_ap_cost(item, character, notifier)),
        resolved_damage: resolved_damage(item, character, attr_value),
        preview: item.is_spell().then(|| classify_spell_preview(&item.description)),
        attr_key: Some(attr_key),
        attr_value: Some(attr_value),
    }
}

/// Damage line for display: the base formula with the attack attribute
/// appended, unless the formula already references an attribute.
fn resolved_damage(item: &Item, character: &Character, attr_value: i32) -> Option<String> {
    let formula = match &item.damage {
        Some(damage) => damage.formula.clone(),
        None => scrape_damage(&item.description)?.formula,
    };
    if formula.contains('@') {
        return Some(actioncore_domain::expand_attribute_refs(
            &formula,
            &character.attributes,
        ));
    }
    if attr_value != 0 {
        Some(format!("{} + {}", formula, attr_value))
    } else {
        Some(formula)
    }
}

fn signed(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}
