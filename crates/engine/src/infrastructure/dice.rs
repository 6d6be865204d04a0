//! In-process dice adapter backed by `rand`.
//!
//! The engine is usually wired to the host platform's roller; this
//! adapter keeps the crate usable standalone and in integration tests.

use async_trait::async_trait;
use rand::Rng;

use actioncore_domain::RollExpression;

use super::ports::{DiceRoller, DiceServiceError, DieResult, RollMode, RollOutcome, RollTermResult};

/// [`DiceRoller`] implementation that parses roll expressions in the
/// domain and rolls them with the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RngDiceRoller;

impl RngDiceRoller {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DiceRoller for RngDiceRoller {
    async fn evaluate(
        &self,
        formula: &str,
        mode: RollMode,
    ) -> Result<RollOutcome, DiceServiceError> {
        let expression = RollExpression::parse(formula)
            .map_err(|e| DiceServiceError::InvalidFormula(format!("{}: {}", formula, e)))?;

        let rolled = match mode {
            RollMode::Roll => {
                let mut rng = rand::thread_rng();
                expression.roll_with(|min, max| rng.gen_range(min..=max))
            }
            RollMode::Maximize => expression.roll_with(|_, max| max),
        };

        Ok(RollOutcome {
            formula: rolled.formula,
            total: rolled.total,
            terms: rolled
                .term_results
                .into_iter()
                .map(|term| RollTermResult {
                    faces: term.faces,
                    results: term
                        .rolls
                        .into_iter()
                        .map(|value| DieResult {
                            value,
                            active: true,
                        })
                        .collect(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roll_stays_in_range() {
        let roller = RngDiceRoller::new();
        for _ in 0..50 {
            let outcome = roller
                .evaluate("1d20+5", RollMode::Roll)
                .await
                .expect("evaluate");
            assert!(outcome.total >= 6 && outcome.total <= 25);
        }
    }

    #[tokio::test]
    async fn test_maximize_returns_ceiling() {
        let roller = RngDiceRoller::new();
        let outcome = roller
            .evaluate("2d6+3", RollMode::Maximize)
            .await
            .expect("evaluate");
        assert_eq!(outcome.total, 15);
        assert_eq!(outcome.terms[0].faces, Some(6));
        assert_eq!(outcome.terms[0].results.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_formula_is_rejected() {
        let roller = RngDiceRoller::new();
        let err = roller.evaluate("fireball", RollMode::Roll).await;
        assert!(matches!(err, Err(DiceServiceError::InvalidFormula(_))));
    }
}
