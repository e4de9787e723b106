//! The traveling party: abilities, skills, and the travelers themselves.
//!
//! Travelers carry just enough of a character sheet to resolve
//! navigation checks: ability scores, level, and skill proficiencies.

use crate::toolbar::Settings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// The six abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Ability modifier: score 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
    pub fn modifier(&self, ability: Ability) -> i32 {
        let score = self.get(ability) as i32;
        // Floor division so scores below 10 round toward negative
        (score - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// Skills a traveler may be proficient in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unique identifier for a traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelerId(pub Uuid);

impl TravelerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TravelerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TravelerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of the traveling party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traveler {
    pub id: TravelerId,
    pub name: String,
    pub level: u8,
    pub ability_scores: AbilityScores,
    pub proficiencies: HashSet<Skill>,
}

impl Traveler {
    pub fn new(name: impl Into<String>, level: u8, ability_scores: AbilityScores) -> Self {
        Self {
            id: TravelerId::new(),
            name: name.into(),
            level,
            ability_scores,
            proficiencies: HashSet::new(),
        }
    }

    /// Add a skill proficiency (builder style).
    pub fn proficient_in(mut self, skill: Skill) -> Self {
        self.proficiencies.insert(skill);
        self
    }

    pub fn proficiency_bonus(&self) -> i32 {
        match self.level {
            0..=4 => 2,
            5..=8 => 3,
            9..=12 => 4,
            13..=16 => 5,
            _ => 6,
        }
    }

    /// Modifier applied to a d20 check against the given ability,
    /// adding the proficiency bonus when the skill is proficient.
    pub fn check_modifier(&self, ability: Ability, skill: Option<Skill>) -> i32 {
        let mut modifier = self.ability_scores.modifier(ability);
        if let Some(skill) = skill {
            if self.proficiencies.contains(&skill) {
                modifier += self.proficiency_bonus();
            }
        }
        modifier
    }
}

/// The traveling party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub travelers: Vec<Traveler>,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            travelers: Vec::new(),
        }
    }

    /// Add a traveler (builder style).
    pub fn with_traveler(mut self, traveler: Traveler) -> Self {
        self.travelers.push(traveler);
        self
    }

    pub fn traveler(&self, id: TravelerId) -> Option<&Traveler> {
        self.travelers.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.travelers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.travelers.len()
    }
}

/// The set of travelers the user currently has selected.
///
/// Mirrors token selection at a virtual tabletop: rule clicks act on
/// the first selected traveler, and nothing happens with none selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub controlled: Vec<TravelerId>,
}

impl Selection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(id: TravelerId) -> Self {
        Self {
            controlled: vec![id],
        }
    }

    pub fn first(&self) -> Option<TravelerId> {
        self.controlled.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.controlled.is_empty()
    }
}

/// Role of the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    GameMaster,
    Player,
}

impl UserRole {
    pub fn is_gm(&self) -> bool {
        matches!(self, UserRole::GameMaster)
    }
}

/// Errors from party file persistence.
#[derive(Debug, Error)]
pub enum PartyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current party file version.
const PARTY_VERSION: u32 = 1;

/// A saved party with the world settings needed to resume travel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedParty {
    /// File format version for compatibility checking.
    pub version: u32,

    /// When the file was written.
    pub saved_at: String,

    pub party: Party,

    pub settings: Settings,
}

impl SavedParty {
    pub fn new(party: Party, settings: Settings) -> Self {
        Self {
            version: PARTY_VERSION,
            saved_at: chrono::Local::now().to_rfc3339(),
            party,
            settings,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PartyError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PartyError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != PARTY_VERSION {
            return Err(PartyError::VersionMismatch {
                expected: PARTY_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// A small party for demos and tests: a guide, a scholar, and a talker.
pub fn sample_party() -> Party {
    Party::new("The Wayfarers")
        .with_traveler(
            Traveler::new("Rangrim Stonebrow", 3, AbilityScores::new(12, 14, 13, 10, 16, 8))
                .proficient_in(Skill::Survival)
                .proficient_in(Skill::Perception),
        )
        .with_traveler(
            Traveler::new("Mira Thistledown", 3, AbilityScores::new(8, 14, 12, 16, 12, 10))
                .proficient_in(Skill::Nature)
                .proficient_in(Skill::Arcana),
        )
        .with_traveler(
            Traveler::new("Tovan Reed", 3, AbilityScores::new(10, 12, 12, 10, 13, 16))
                .proficient_in(Skill::Persuasion)
                .proficient_in(Skill::Performance),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_modifiers_round_down() {
        let scores = AbilityScores::new(7, 8, 10, 11, 15, 16);
        assert_eq!(scores.modifier(Ability::Strength), -2);
        assert_eq!(scores.modifier(Ability::Dexterity), -1);
        assert_eq!(scores.modifier(Ability::Constitution), 0);
        assert_eq!(scores.modifier(Ability::Intelligence), 0);
        assert_eq!(scores.modifier(Ability::Wisdom), 2);
        assert_eq!(scores.modifier(Ability::Charisma), 3);
    }

    #[test]
    fn proficiency_bonus_tiers() {
        let scores = AbilityScores::default();
        assert_eq!(Traveler::new("a", 1, scores.clone()).proficiency_bonus(), 2);
        assert_eq!(Traveler::new("b", 4, scores.clone()).proficiency_bonus(), 2);
        assert_eq!(Traveler::new("c", 5, scores.clone()).proficiency_bonus(), 3);
        assert_eq!(Traveler::new("d", 9, scores.clone()).proficiency_bonus(), 4);
        assert_eq!(Traveler::new("e", 17, scores).proficiency_bonus(), 6);
    }

    #[test]
    fn check_modifier_adds_proficiency_only_when_proficient() {
        let guide = Traveler::new("Guide", 3, AbilityScores::new(10, 10, 10, 10, 16, 10))
            .proficient_in(Skill::Survival);

        assert_eq!(guide.check_modifier(Ability::Wisdom, Some(Skill::Survival)), 5);
        assert_eq!(guide.check_modifier(Ability::Wisdom, Some(Skill::Perception)), 3);
        assert_eq!(guide.check_modifier(Ability::Wisdom, None), 3);
    }

    #[test]
    fn skills_map_to_abilities() {
        assert_eq!(Skill::Survival.ability(), Ability::Wisdom);
        assert_eq!(Skill::Nature.ability(), Ability::Intelligence);
        assert_eq!(Skill::Persuasion.ability(), Ability::Charisma);
    }

    #[test]
    fn party_lookup_by_id() {
        let party = sample_party();
        assert_eq!(party.len(), 3);

        let id = party.travelers[1].id;
        assert_eq!(party.traveler(id).map(|t| t.name.as_str()), Some("Mira Thistledown"));
        assert!(party.traveler(TravelerId::new()).is_none());
    }

    #[test]
    fn selection_first_and_empty() {
        let id = TravelerId::new();
        assert_eq!(Selection::single(id).first(), Some(id));
        assert!(Selection::none().is_empty());
        assert_eq!(Selection::none().first(), None);
    }

    #[tokio::test]
    async fn save_and_load_party_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("party.json");

        let saved = SavedParty::new(sample_party(), Settings::default());
        saved.save_json(&path).await.unwrap();

        let loaded = SavedParty::load_json(&path).await.unwrap();
        assert_eq!(loaded.party, saved.party);
        assert!(loaded.settings.show_navigation_button);
    }

    #[tokio::test]
    async fn load_rejects_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("party.json");

        let mut saved = SavedParty::new(sample_party(), Settings::default());
        saved.version = 99;
        let content = serde_json::to_string_pretty(&saved).unwrap();
        tokio::fs::write(&path, content).await.unwrap();

        match SavedParty::load_json(&path).await {
            Err(PartyError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, 1);
                assert_eq!(found, 99);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }
}
