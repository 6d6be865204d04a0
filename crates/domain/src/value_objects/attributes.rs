//! Attribute resolution with alias and fuzzy fallback.
//!
//! Character sheets are not guaranteed to use canonical attribute codes:
//! one sheet stores `con`, another `end`, a third spells out `stamina`.
//! Resolution is best-effort and total - it always returns a number and
//! never fails, so a misspelled code degrades to 0 instead of blocking
//! an action.

use std::collections::HashMap;

/// Canonical alias groups. Any member of a group resolves to whichever
/// member is actually present on the sheet.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["con", "end", "stamina"],
    &["awa", "awr", "per", "perception"],
    &["dex", "agi", "agility"],
    &["lck", "luck"],
];

/// Resolve an attribute code against a character's attribute map.
///
/// Lookup order:
/// 1. Exact case-insensitive match
/// 2. Alias group members (bidirectional)
/// 3. Fuzzy fallback: first present key where either lowercase name
///    contains the other as a substring
/// 4. Default 0
///
/// An empty key resolves to 0 immediately.
pub fn resolve_attribute(attributes: &HashMap<String, i32>, key: &str) -> i32 {
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return 0;
    }

    if let Some(value) = lookup_exact(attributes, &key) {
        return value;
    }

    for group in ALIAS_GROUPS {
        if group.contains(&key.as_str()) {
            for alias in *group {
                if *alias == key {
                    continue;
                }
                if let Some(value) = lookup_exact(attributes, alias) {
                    return value;
                }
            }
        }
    }

    for (present, value) in attributes {
        let present = present.to_lowercase();
        if present.contains(&key) || key.contains(&present) {
            return *value;
        }
    }

    0
}

fn lookup_exact(attributes: &HashMap<String, i32>, key: &str) -> Option<i32> {
    attributes
        .iter()
        .find(|(k, _)| k.to_lowercase() == key)
        .map(|(_, v)| *v)
}

/// Replace every `@word` token in a formula with its resolved attribute
/// value (unresolved tokens become 0).
///
/// Manual scan rather than regex - the domain crate carries no regex
/// dependency.
pub fn expand_attribute_refs(formula: &str, attributes: &HashMap<String, i32>) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut chars = formula.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        let mut token = String::new();
        while let Some((_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || *next == '_' {
                token.push(*next);
                chars.next();
            } else {
                break;
            }
        }
        if token.is_empty() {
            // A bare '@' with no identifier is passed through untouched.
            out.push('@');
        } else {
            out.push_str(&resolve_attribute(attributes, &token).to_string());
        }
    }

    out
}
