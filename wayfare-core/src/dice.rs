//! Dice rolling for navigation checks and forage yields.
//!
//! Supports standard dice notation (XdY+Z) with multiple components
//! and flat modifiers, e.g. `1d20+5`, `2d4`, `1d6+2`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Standard die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A single die component of a dice expression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die: DieType,
}

/// A parsed dice expression (e.g. `2d4+1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_term(&current, sign, &mut components, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_term(&current, sign, &mut components, &mut modifier)?;
        }

        if components.is_empty() {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            components,
            modifier,
            original: notation,
        })
    }

    fn parse_term(
        s: &str,
        sign: i32,
        components: &mut Vec<DiceComponent>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            let count_str = &s[..d_pos];
            let sides_str = &s[d_pos + 1..];

            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };
            if count == 0 {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }

            let sides: u32 = sides_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

            components.push(DiceComponent { count, die });
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier += sign * value;
        }

        Ok(())
    }

    /// Roll the dice expression with the thread-local RNG.
    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        let mut rolls = Vec::new();
        for component in &self.components {
            for _ in 0..component.count {
                rolls.push(rng.gen_range(1..=component.die.sides()));
            }
        }

        let dice_total: i32 = rolls.iter().map(|&r| r as i32).sum();
        let total = dice_total + self.modifier;

        RollResult {
            notation: self.original.clone(),
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    pub notation: String,
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// True when the total meets or beats the difficulty class.
    pub fn meets_dc(&self, dc: i32) -> bool {
        self.total >= dc
    }

    /// Format the individual dice and modifier, e.g. `[12] + 5`.
    pub fn breakdown(&self) -> String {
        let dice = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if self.modifier > 0 {
            format!("{dice} + {}", self.modifier)
        } else if self.modifier < 0 {
            format!("{dice} - {}", -self.modifier)
        } else {
            dice
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} = {}", self.notation, self.breakdown(), self.total)
    }
}

/// Parse and roll a notation string in one step.
pub fn roll(notation: &str) -> Result<RollResult, DiceError> {
    Ok(DiceExpression::parse(notation)?.roll())
}
