//! Item entity - weapons, spells, and features a character can use.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// What kind of item this is. Weapon, Spell, and Feature drive the
/// resolution pipeline; the remaining kinds exist for loadout grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Weapon,
    Spell,
    Feature,
    Action,
    Reaction,
    Talent,
    Passive,
}

/// Structured damage on an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageSpec {
    /// Dice formula, may reference attributes (e.g. "1d8 + @str")
    pub formula: String,
    /// Damage type label (e.g. "sharp", "fire")
    pub damage_type: String,
}

/// An item a character can act with.
///
/// Data-carrying struct: any combination of values is valid. Items with
/// no structured `damage` rely on description scraping at resolution
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Attribute override for attack rolls. Weapons default to "str",
    /// spells to the caster's spell attribute.
    pub attack_attribute: Option<String>,
    /// Cost formula over attributes and max/min. Absent means the fixed
    /// default cost applies.
    pub ap_cost_formula: Option<String>,
    /// Spell point cost (spells only).
    pub sp_cost: i32,
    pub damage: Option<DamageSpec>,
    /// Free text; may embed attack/damage/healing phrases.
    pub description: String,
    /// Free-form categorization hint ("action", "reaction", "passive").
    pub category: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind,
            attack_attribute: None,
            ap_cost_formula: None,
            sp_cost: 0,
            damage: None,
            description: String::new(),
            category: None,
        }
    }

    /// The attribute code backing this item's attack roll, given the
    /// caster's configured spell attribute.
    pub fn attack_attribute_or_default<'a>(&'a self, spell_attribute: &'a str) -> &'a str {
        if let Some(attr) = self.attack_attribute.as_deref() {
            return attr;
        }
        match self.kind {
            ItemKind::Spell => spell_attribute,
            _ => "str",
        }
    }

    pub fn is_spell(&self) -> bool {
        self.kind == ItemKind::Spell
    }

    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon
    }

    /// Category hint, lowercased, for loadout grouping.
    pub fn category_lower(&self) -> Option<String> {
        self.category.as_ref().map(|c| c.to_lowercase())
    }
}
