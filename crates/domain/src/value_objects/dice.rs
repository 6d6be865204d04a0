//! Roll expression parsing and evaluation.
//!
//! Supports dice formulas like "1d20+5", "2d6-1", and multi-term sums
//! such as "1d6 + 2 + 1d4". Randomness is injected via closure so the
//! domain stays deterministic under test.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error when parsing a roll expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected a sum of XdY and integer terms
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// One term of a roll expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TermKind {
    /// X dice of Y faces (X in XdY, Y in XdY)
    Dice { count: u32, faces: u32 },
    /// A flat integer modifier
    Const(i32),
}

/// A term together with its sign in the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTerm {
    pub negative: bool,
    pub kind: TermKind,
}

/// A parsed roll expression: a signed sum of dice and constant terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollExpression {
    terms: Vec<SignedTerm>,
}

impl RollExpression {
    /// Parse an expression like "1d20+5", "2d6 - 1 + 1d4", "d20", or "7".
    ///
    /// Case-insensitive and whitespace-tolerant. "dY" is shorthand for
    /// "1dY". Zero dice counts and die sizes below 2 are rejected.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input: String = input.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let mut terms = Vec::new();
        let mut chunk = String::new();
        let mut negative = false;
        let mut pending_negative = false;

        for (i, c) in input.char_indices() {
            match c {
                '+' | '-' if i > 0 && !chunk.is_empty() => {
                    terms.push(parse_term(&chunk, negative)?);
                    chunk.clear();
                    negative = c == '-';
                }
                '-' if chunk.is_empty() => {
                    // Leading sign (or sign right after another operator)
                    if pending_negative || negative {
                        return Err(DiceParseError::InvalidFormat(input.clone()));
                    }
                    pending_negative = true;
                }
                '+' if chunk.is_empty() => {
                    return Err(DiceParseError::InvalidFormat(input.clone()));
                }
                _ => {
                    if pending_negative {
                        negative = true;
                        pending_negative = false;
                    }
                    chunk.push(c);
                }
            }
        }

        if chunk.is_empty() {
            return Err(DiceParseError::InvalidFormat(input));
        }
        terms.push(parse_term(&chunk, negative)?);

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[SignedTerm] {
        &self.terms
    }

    /// Roll every die through the injected RNG and sum the terms.
    ///
    /// The closure receives `(min, max)` inclusive bounds, matching the
    /// random port contract.
    pub fn roll_with(&self, mut rng: impl FnMut(i32, i32) -> i32) -> RolledExpression {
        let mut term_results = Vec::with_capacity(self.terms.len());
        let mut total = 0i32;

        for term in &self.terms {
            let sign = if term.negative { -1 } else { 1 };
            match term.kind {
                TermKind::Dice { count, faces } => {
                    let rolls: Vec<i32> =
                        (0..count).map(|_| rng(1, faces as i32)).collect();
                    total += sign * rolls.iter().sum::<i32>();
                    term_results.push(RolledTerm {
                        faces: Some(faces),
                        rolls,
                    });
                }
                TermKind::Const(n) => {
                    total += sign * n;
                    term_results.push(RolledTerm {
                        faces: None,
                        rolls: vec![n],
                    });
                }
            }
        }

        RolledExpression {
            formula: self.to_string(),
            term_results,
            total,
        }
    }

    /// The expression ceiling: every die showing its highest face.
    pub fn maximized_total(&self) -> i32 {
        self.terms
            .iter()
            .map(|term| {
                let sign = if term.negative { -1 } else { 1 };
                match term.kind {
                    TermKind::Dice { count, faces } => sign * (count * faces) as i32,
                    TermKind::Const(n) => sign * n,
                }
            })
            .sum()
    }

    /// The expression floor: every die showing 1.
    pub fn minimized_total(&self) -> i32 {
        self.terms
            .iter()
            .map(|term| {
                let sign = if term.negative { -1 } else { 1 };
                match term.kind {
                    TermKind::Dice { count, faces: _ } => sign * count as i32,
                    TermKind::Const(n) => sign * n,
                }
            })
            .sum()
    }

    /// The literal dice terms ("2d6"), constants excluded.
    pub fn dice_terms(&self) -> Vec<String> {
        self.terms
            .iter()
            .filter_map(|term| match term.kind {
                TermKind::Dice { count, faces } => Some(format!("{}d{}", count, faces)),
                TermKind::Const(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for RollExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i == 0 {
                if term.negative {
                    write!(f, "-")?;
                }
            } else if term.negative {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            match term.kind {
                TermKind::Dice { count, faces } => write!(f, "{}d{}", count, faces)?,
                TermKind::Const(n) => write!(f, "{}", n)?,
            }
        }
        Ok(())
    }
}

fn parse_term(chunk: &str, negative: bool) -> Result<SignedTerm, DiceParseError> {
    let kind = if let Some(d_pos) = chunk.find('d') {
        let count_str = &chunk[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1 // "d20" means "1d20"
        } else {
            count_str
                .parse()
                .map_err(|_| DiceParseError::InvalidFormat(chunk.to_string()))?
        };
        if count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let faces: u32 = chunk[d_pos + 1..]
            .parse()
            .map_err(|_| DiceParseError::InvalidFormat(chunk.to_string()))?;
        if faces < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        TermKind::Dice { count, faces }
    } else {
        TermKind::Const(
            chunk
                .parse()
                .map_err(|_| DiceParseError::InvalidFormat(chunk.to_string()))?,
        )
    };

    Ok(SignedTerm { negative, kind })
}

/// One rolled term: the faces (None for constants) and per-die results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolledTerm {
    pub faces: Option<u32>,
    pub rolls: Vec<i32>,
}

/// Result of evaluating a roll expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolledExpression {
    /// Canonical formula text
    pub formula: String,
    /// Per-term results, in formula order
    pub term_results: Vec<RolledTerm>,
    /// Final total across all terms
    pub total: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_d20() {
        let expr = RollExpression::parse("1d20").expect("parse");
        assert_eq!(
            expr.terms(),
            &[SignedTerm {
                negative: false,
                kind: TermKind::Dice { count: 1, faces: 20 }
            }]
        );
    }

    #[test]
    fn test_parse_shorthand() {
        let expr = RollExpression::parse("d20").expect("parse");
        assert_eq!(expr.to_string(), "1d20");
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = RollExpression::parse("2d6+3").expect("parse");
        assert_eq!(expr.to_string(), "2d6 + 3");
        assert_eq!(expr.maximized_total(), 15);
        assert_eq!(expr.minimized_total(), 5);
    }

    #[test]
    fn test_parse_negative_modifier() {
        let expr = RollExpression::parse("1d20-3").expect("parse");
        assert_eq!(expr.maximized_total(), 17);
    }

    #[test]
    fn test_parse_multi_term() {
        let expr = RollExpression::parse("1d6 + 2 + 1d4").expect("parse");
        assert_eq!(expr.dice_terms(), vec!["1d6", "1d4"]);
        assert_eq!(expr.maximized_total(), 12);
    }

    #[test]
    fn test_parse_bare_integer() {
        let expr = RollExpression::parse("7").expect("parse");
        assert_eq!(expr.maximized_total(), 7);
        assert!(expr.dice_terms().is_empty());
    }

    #[test]
    fn test_parse_case_and_whitespace() {
        let expr = RollExpression::parse("  1D20 + 5 ").expect("parse");
        assert_eq!(expr.to_string(), "1d20 + 5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            RollExpression::parse(""),
            Err(DiceParseError::Empty)
        ));
        assert!(matches!(
            RollExpression::parse("abc"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            RollExpression::parse("0d6"),
            Err(DiceParseError::InvalidDiceCount)
        ));
        assert!(matches!(
            RollExpression::parse("1d1"),
            Err(DiceParseError::InvalidDieSize)
        ));
        assert!(matches!(
            RollExpression::parse("1d6+"),
            Err(DiceParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_roll_with_injected_rng() {
        let expr = RollExpression::parse("2d6+3").expect("parse");
        // RNG pinned to the maximum of each range
        let rolled = expr.roll_with(|_, max| max);
        assert_eq!(rolled.total, 15);
        assert_eq!(rolled.term_results[0].faces, Some(6));
        assert_eq!(rolled.term_results[0].rolls, vec![6, 6]);
        assert_eq!(rolled.term_results[1].faces, None);
    }

    #[test]
    fn test_roll_with_negative_term() {
        let expr = RollExpression::parse("1d20-2").expect("parse");
        let rolled = expr.roll_with(|min, _| min);
        assert_eq!(rolled.total, -1);
    }
}
