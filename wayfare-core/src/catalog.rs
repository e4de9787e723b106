//! The navigation rule catalog.
//!
//! A fixed, ordered table of rule descriptors. Descriptors are plain
//! data (key, label, check shape, daily cap); the side-effecting piece
//! of each rule is a named `OutcomeHandler` the executor dispatches on.

use crate::chat::ChatMessage;
use crate::dice::{DiceError, DiceExpression};
use crate::party::{Ability, Skill, Traveler};
use lazy_static::lazy_static;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys of the navigation rules, in catalog order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKey {
    Orient,
    ForageRations,
    ForageSpices,
    ForageWater,
    KeepSpiritsUp,
    Assist,
}

impl RuleKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKey::Orient => "orient",
            RuleKey::ForageRations => "forage-rations",
            RuleKey::ForageSpices => "forage-spices",
            RuleKey::ForageWater => "forage-water",
            RuleKey::KeepSpiritsUp => "keep-spirits-up",
            RuleKey::Assist => "assist",
        }
    }

    pub fn all() -> [RuleKey; 6] {
        [
            RuleKey::Orient,
            RuleKey::ForageRations,
            RuleKey::ForageSpices,
            RuleKey::ForageWater,
            RuleKey::KeepSpiritsUp,
            RuleKey::Assist,
        ]
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What invoking a rule requires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RuleKind {
    /// A skill check against a difficulty class.
    Check {
        ability: Ability,
        skill: Option<Skill>,
        dc: i32,
    },
    /// No check; using the rule is the whole action.
    Assist,
}

impl RuleKind {
    pub fn dc(&self) -> Option<i32> {
        match self {
            RuleKind::Check { dc, .. } => Some(*dc),
            RuleKind::Assist => None,
        }
    }
}

/// A rule descriptor from the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub key: RuleKey,
    pub label: &'static str,
    pub kind: RuleKind,
    pub daily_max: u32,
    pub handler: OutcomeHandler,
}

lazy_static! {
    /// The full catalog, in presentation order.
    pub static ref CATALOG: Vec<Rule> = vec![
        Rule {
            key: RuleKey::Orient,
            label: "Orient",
            kind: RuleKind::Check {
                ability: Ability::Wisdom,
                skill: Some(Skill::Survival),
                dc: 15,
            },
            daily_max: 1,
            handler: OutcomeHandler::Orient,
        },
        Rule {
            key: RuleKey::ForageRations,
            label: "Forage (Rations)",
            kind: RuleKind::Check {
                ability: Ability::Wisdom,
                skill: Some(Skill::Survival),
                dc: 10,
            },
            daily_max: 2,
            handler: OutcomeHandler::ForageRations,
        },
        Rule {
            key: RuleKey::ForageSpices,
            label: "Forage (Spices)",
            kind: RuleKind::Check {
                ability: Ability::Intelligence,
                skill: Some(Skill::Nature),
                dc: 10,
            },
            daily_max: 1,
            handler: OutcomeHandler::ForageSpices,
        },
        Rule {
            key: RuleKey::ForageWater,
            label: "Forage (Water)",
            kind: RuleKind::Check {
                ability: Ability::Wisdom,
                skill: Some(Skill::Survival),
                dc: 10,
            },
            daily_max: 2,
            handler: OutcomeHandler::ForageWater,
        },
        Rule {
            key: RuleKey::KeepSpiritsUp,
            label: "Keep Spirits Up",
            kind: RuleKind::Check {
                ability: Ability::Charisma,
                skill: Some(Skill::Persuasion),
                dc: 20,
            },
            daily_max: 1,
            handler: OutcomeHandler::KeepSpiritsUp,
        },
        Rule {
            key: RuleKey::Assist,
            label: "Assist",
            kind: RuleKind::Assist,
            daily_max: 5,
            handler: OutcomeHandler::Assist,
        },
    ];
}

/// All rules in catalog order.
pub fn rules() -> &'static [Rule] {
    &CATALOG
}

/// Look up a rule by key.
///
/// The catalog is indexed in `RuleKey` declaration order; a unit test
/// pins that alignment.
pub fn rule(key: RuleKey) -> &'static Rule {
    &CATALOG[key as usize]
}

/// Named outcome handlers, one per rule.
///
/// Handlers build the chat message for an outcome. They never read
/// usage and never post; the executor owns both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeHandler {
    Orient,
    ForageRations,
    ForageSpices,
    ForageWater,
    KeepSpiritsUp,
    Assist,
}

impl OutcomeHandler {
    /// Message for a successful check. The DC comes in from the rule
    /// descriptor; forage yields roll their own dice here.
    pub fn on_success<R: Rng>(
        &self,
        traveler: &Traveler,
        dc: i32,
        rng: &mut R,
    ) -> Result<ChatMessage, DiceError> {
        let name = traveler.name.as_str();
        let message = match self {
            OutcomeHandler::Orient => ChatMessage::flavor(
                name,
                format!(
                    "**{name}** gets the party oriented (DC {dc}). \
                     The group may pick up the pace or drop to a cautious one."
                ),
            ),
            OutcomeHandler::ForageRations => {
                let roll = DiceExpression::parse("1d6+2")?.roll_with_rng(rng).total;
                // Half the roll, rounded up
                let rations = (roll + 1) / 2;
                ChatMessage::flavor(
                    name,
                    format!("{name} gathers {rations} rations (roll: {roll})."),
                )
            }
            OutcomeHandler::ForageSpices => {
                let roll = DiceExpression::parse("1d4")?.roll_with_rng(rng).total;
                ChatMessage::flavor(name, format!("{name} collects {roll} spices."))
            }
            OutcomeHandler::ForageWater => {
                let roll = DiceExpression::parse("2d4")?.roll_with_rng(rng).total;
                ChatMessage::flavor(name, format!("{name} finds {roll} gallons of water."))
            }
            OutcomeHandler::KeepSpiritsUp => ChatMessage::flavor(
                name,
                format!(
                    "**{name}** rallies the group (DC {dc}). +2 to every navigation action."
                ),
            ),
            // Assist has no check; being used is the success.
            OutcomeHandler::Assist => self.on_use(traveler),
        };
        Ok(message)
    }

    /// Message for a failed check, given the rolled total.
    pub fn on_failure(&self, traveler: &Traveler, total: i32) -> ChatMessage {
        let name = traveler.name.as_str();
        match self {
            OutcomeHandler::Orient => ChatMessage::content(
                name,
                format!("{name} fails to get their bearings (total: {total})."),
            ),
            OutcomeHandler::ForageRations => ChatMessage::content(
                name,
                format!("{name} finds nothing useful (total: {total})."),
            ),
            OutcomeHandler::ForageSpices => {
                ChatMessage::content(name, format!("{name} finds no spices."))
            }
            OutcomeHandler::ForageWater => ChatMessage::content(
                name,
                format!("{name} comes back without water (total: {total})."),
            ),
            OutcomeHandler::KeepSpiritsUp => ChatMessage::content(
                name,
                format!("{name} fails to lift the group's spirits."),
            ),
            OutcomeHandler::Assist => self.on_use(traveler),
        }
    }

    /// Message for a no-check rule being used.
    pub fn on_use(&self, traveler: &Traveler) -> ChatMessage {
        let name = traveler.name.as_str();
        match self {
            OutcomeHandler::Assist => ChatMessage::flavor(
                name,
                format!(
                    "{name} assists another traveler: \
                     +1 to one navigation action (+2 with proficiency)."
                ),
            ),
            // Checked rules narrate through on_success/on_failure.
            _ => ChatMessage::flavor(name, format!("{name} sets to work.")),
        }
    }
}
