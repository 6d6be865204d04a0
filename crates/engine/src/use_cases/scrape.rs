//! Description scraping for items without structured data.
//!
//! Many imported items carry their mechanics only as prose ("deals
//! 2d6+3 fire damage", "regains 5 (1d8 + 2) hit points"). The scraper
//! mines those phrases with an ordered rule list - healing first, then
//! damage - so call sites never need to know the patterns. A miss is
//! valid output: scraping returns `None`/empty and never errors.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

// Rule 1 (highest priority): healing phrases.
// Verbs regain/restore/heal, an optional "N (" / "N [" maximized
// prefix, then a dice expression or a bare integer.
static HEAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:regain|restore|heal)s?\s+(?:\d+\s*[\(\[])?\s*(\d+d\d+(?:\s*[+\-]\s*(?:\d+|[a-zA-Z]+))?|\d+)\s*[\)\]]?",
    )
    .expect("valid regex")
});

// Rule 2: damage phrases.
// Optional verb deal/take/hit (with optional ":" or "for"), a dice
// expression, then a bareword type token and an optional literal
// "damage". A bare integer is not accepted here - too many false
// positives in prose.
static DMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:deal|take|hit)s?(?::| for)?\s+)?(?:\d+\s*[\(\[])?\s*(\d+d\d+(?:\s*[+\-]\s*(?:\d+|[a-zA-Z@.]+))?)\s*[\)\]]?\s+(\w+)(?:\s+damage)?",
    )
    .expect("valid regex")
});

// Explicit attack bonus: "Attack: +5" or "1d20+5".
static ATTACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:attack:?\s*|1d20\s*)([+-]?\s*\d+)").expect("valid regex"));

// Spell attack phrasing: "make a magic attack", "magic attack against".
static SPELL_ATTACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)make an?\s+(?:magic\s+)?attack|magic\s+attack\s+against").expect("valid regex")
});

// Loose preview variants (classification only, no captures needed).
static PREVIEW_HEAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:regain|restore|heal)s?\s+(?:\d+d\d+(?:\s*\+\s*\d+)?|\d+)")
        .expect("valid regex")
});
static PREVIEW_DMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:deal|take)s?\s+\d+d\d+(?:\s*\+\s*\d+)?\s+\w+\s+damage")
        .expect("valid regex")
});

/// A damage or healing sub-formula scraped from prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedEffect {
    pub formula: String,
    /// Type label; "healing" for the healing rule.
    pub damage_type: String,
}

impl ScrapedEffect {
    pub fn is_healing(&self) -> bool {
        self.damage_type.eq_ignore_ascii_case("healing")
    }
}

/// First healing phrase in the text, if any.
pub fn scrape_healing(text: &str) -> Option<ScrapedEffect> {
    let caps = HEAL_RE.captures(text)?;
    Some(ScrapedEffect {
        formula: caps[1].to_string(),
        damage_type: "healing".to_string(),
    })
}

/// First damage phrase in the text, if any. A type token equal to
/// "damage" normalizes to the generic "Damage" label.
pub fn scrape_damage(text: &str) -> Option<ScrapedEffect> {
    let caps = DMG_RE.captures(text)?;
    Some(ScrapedEffect {
        formula: caps[1].to_string(),
        damage_type: normalize_type(&caps[2]),
    })
}

/// Every healing and damage phrase in the text, healing matches first.
/// Damage matches whose type token belongs to the healing pass
/// ("healing", "hp") are excluded.
pub fn scrape_all_effects(text: &str) -> Vec<ScrapedEffect> {
    let mut effects = Vec::new();

    for caps in HEAL_RE.captures_iter(text) {
        effects.push(ScrapedEffect {
            formula: caps[1].to_string(),
            damage_type: "healing".to_string(),
        });
    }

    for caps in DMG_RE.captures_iter(text) {
        let type_token = &caps[2];
        if type_token.eq_ignore_ascii_case("healing") || type_token.eq_ignore_ascii_case("hp") {
            continue;
        }
        effects.push(ScrapedEffect {
            formula: caps[1].to_string(),
            damage_type: normalize_type(type_token),
        });
    }

    effects
}

fn normalize_type(token: &str) -> String {
    if token.eq_ignore_ascii_case("damage") {
        "Damage".to_string()
    } else {
        token.to_string()
    }
}

/// Explicit attack bonus embedded in the text ("Attack: +5", "1d20+5").
pub fn scrape_attack_bonus(text: &str) -> Option<i32> {
    let caps = ATTACK_RE.captures(text)?;
    let bonus: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    bonus.parse().ok()
}

/// Whether the text instructs the caster to make a (magic) attack.
pub fn has_spell_attack_phrase(text: &str) -> bool {
    SPELL_ATTACK_RE.is_match(text)
}

/// Coarse classification of a spell description for list previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpellPreview {
    Healing,
    Damage,
    Utility,
}

pub fn classify_spell_preview(text: &str) -> SpellPreview {
    if PREVIEW_HEAL_RE.is_match(text) {
        SpellPreview::Healing
    } else if PREVIEW_DMG_RE.is_match(text) {
        SpellPreview::Damage
    } else {
        SpellPreview::Utility
    }
}

/// Item names referenced inside a multiattack description.
///
/// Names are scanned longest-first so "Mega Bite" wins over "Bite", with
/// word-boundary checks on both ends, and each name is reported once.
pub fn find_item_references(description: &str, names: &[String]) -> Vec<String> {
    let description = description.to_lowercase();
    let mut sorted: Vec<&String> = names.iter().filter(|n| !n.is_empty()).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut found: Vec<String> = Vec::new();
    for name in sorted {
        if found.iter().any(|f| f.eq_ignore_ascii_case(name)) {
            continue;
        }
        if contains_bounded(&description, &name.to_lowercase()) {
            found.push(name.clone());
        }
    }
    found
}

fn contains_bounded(haystack: &str, needle: &str) -> bool {
    let needs_start_boundary = needle.chars().next().is_some_and(is_word_char);
    let needs_end_boundary = needle.chars().next_back().is_some_and(is_word_char);

    for (idx, _) in haystack.match_indices(needle) {
        let before_ok = !needs_start_boundary
            || !haystack[..idx].chars().next_back().is_some_and(is_word_char);
        let after_ok = !needs_end_boundary
            || !haystack[idx + needle.len()..]
                .chars()
                .next()
                .is_some_and(is_word_char);
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
