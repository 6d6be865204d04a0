//! Character entity - the actor performing (or targeted by) actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::CharacterId;
use crate::value_objects::{resolve_attribute, ResourcePool};

/// Whether a character is player-controlled or an NPC.
///
/// NPCs get special handling in a few places: feature rolls are forced
/// blind, spell fast-casting bypasses resource accounting, and the
/// challenge rating stands in for level when refreshing action points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharacterKind {
    Player,
    Npc,
}

/// A learned skill with a display label and a roll bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub label: String,
    pub bonus: i32,
}

/// The actor entity.
///
/// A data-carrying struct; pool invariants are protected by
/// [`ResourcePool`], everything else is free-form sheet data. Attribute
/// keys are whatever the sheet uses - resolution goes through
/// [`resolve_attribute`] which tolerates aliases and near-misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub kind: CharacterKind,
    /// Attribute code -> modifier. Keys are not guaranteed canonical.
    pub attributes: HashMap<String, i32>,
    pub action_points: ResourcePool,
    pub spell_points: ResourcePool,
    pub hit_points: ResourcePool,
    /// Gates whether AP cost is enforced at all.
    pub in_combat: bool,
    /// Hit/miss threshold when this character is targeted. None means
    /// the sheet never defined one; resolution defaults to 10.
    pub defense: Option<i32>,
    /// Configured default attribute for spell attacks (falls back to "int").
    pub spell_attribute: Option<String>,
    pub level: i32,
    /// NPC challenge rating; stands in for level when present.
    pub challenge_rating: Option<i32>,
    pub skills: HashMap<String, Skill>,
    pub saves: HashMap<String, i32>,
}

impl Character {
    pub fn new(name: impl Into<String>, kind: CharacterKind) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            kind,
            attributes: HashMap::new(),
            action_points: ResourcePool::default(),
            spell_points: ResourcePool::default(),
            hit_points: ResourcePool::default(),
            in_combat: false,
            defense: None,
            spell_attribute: None,
            level: 1,
            challenge_rating: None,
            skills: HashMap::new(),
            saves: HashMap::new(),
        }
    }

    pub fn is_npc(&self) -> bool {
        self.kind == CharacterKind::Npc
    }

    /// Resolve an attribute code against this character's sheet.
    pub fn attribute(&self, key: &str) -> i32 {
        resolve_attribute(&self.attributes, key)
    }

    /// The attribute backing this character's spell attacks.
    pub fn spell_attribute(&self) -> &str {
        self.spell_attribute.as_deref().unwrap_or("int")
    }

    /// Level for AP carryover purposes: NPCs use their challenge rating
    /// when one is set.
    pub fn effective_level(&self) -> i32 {
        if self.is_npc() {
            self.challenge_rating.unwrap_or(self.level)
        } else {
            self.level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_goes_through_resolver() {
        let mut character = Character::new("Sable", CharacterKind::Player);
        character.attributes.insert("con".to_string(), 2);
        assert_eq!(character.attribute("end"), 2);
        assert_eq!(character.attribute("unknown"), 0);
    }

    #[test]
    fn test_spell_attribute_defaults_to_int() {
        let mut character = Character::new("Sable", CharacterKind::Player);
        assert_eq!(character.spell_attribute(), "int");
        character.spell_attribute = Some("cha".to_string());
        assert_eq!(character.spell_attribute(), "cha");
    }

    #[test]
    fn test_effective_level_prefers_cr_for_npcs() {
        let mut npc = Character::new("Ogre", CharacterKind::Npc);
        npc.level = 1;
        npc.challenge_rating = Some(4);
        assert_eq!(npc.effective_level(), 4);

        let mut pc = Character::new("Sable", CharacterKind::Player);
        pc.level = 3;
        pc.challenge_rating = Some(9);
        assert_eq!(pc.effective_level(), 3);
    }
}
