//! Skill check resolution port.
//!
//! Rules describe a check as an (ability, optional skill) pair plus a
//! difficulty class. How the d20 actually gets rolled is behind the
//! `CheckResolver` trait so hosts and tests can substitute their own.

use crate::dice::{DiceError, DiceExpression};
use crate::party::{Ability, Skill, Traveler};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of rolling a skill check, before comparing to a DC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRoll {
    pub total: i32,
    /// Human-readable roll breakdown, e.g. `1d20+5 = [12] + 5 = 17`.
    pub detail: String,
}

/// Errors from resolving a skill check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("check resolution failed: {0}")]
    Failed(String),
}

/// Resolves a traveler's skill check to a rolled total.
#[async_trait]
pub trait CheckResolver: Send + Sync {
    async fn resolve(
        &self,
        traveler: &Traveler,
        ability: Ability,
        skill: Option<Skill>,
    ) -> Result<CheckRoll, CheckError>;
}

/// Default resolver: a d20 plus the traveler's sheet modifier.
pub struct DiceResolver;

#[async_trait]
impl CheckResolver for DiceResolver {
    async fn resolve(
        &self,
        traveler: &Traveler,
        ability: Ability,
        skill: Option<Skill>,
    ) -> Result<CheckRoll, CheckError> {
        let modifier = traveler.check_modifier(ability, skill);
        let notation = if modifier >= 0 {
            format!("1d20+{modifier}")
        } else {
            format!("1d20-{}", -modifier)
        };

        let result = DiceExpression::parse(&notation)?.roll();
        Ok(CheckRoll {
            total: result.total,
            detail: result.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::AbilityScores;

    #[tokio::test]
    async fn dice_resolver_stays_in_modifier_range() {
        let guide = Traveler::new("Guide", 3, AbilityScores::new(10, 10, 10, 10, 16, 10))
            .proficient_in(Skill::Survival);
        let resolver = DiceResolver;

        for _ in 0..50 {
            let roll = resolver
                .resolve(&guide, Ability::Wisdom, Some(Skill::Survival))
                .await
                .unwrap();
            // +5 modifier: d20 total must land in 6..=25
            assert!(roll.total >= 6 && roll.total <= 25, "got {}", roll.total);
            assert!(roll.detail.contains("1d20+5"));
        }
    }

    #[tokio::test]
    async fn dice_resolver_handles_negative_modifiers() {
        let clumsy = Traveler::new("Clumsy", 1, AbilityScores::new(10, 10, 10, 10, 6, 10));
        let resolver = DiceResolver;

        let roll = resolver
            .resolve(&clumsy, Ability::Wisdom, None)
            .await
            .unwrap();
        assert!(roll.total >= -1 && roll.total <= 18, "got {}", roll.total);
        assert!(roll.detail.contains("1d20-2"));
    }
}
