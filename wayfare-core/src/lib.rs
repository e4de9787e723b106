//! Overland navigation rules with per-traveler daily limits.
//!
//! This crate provides:
//! - A fixed catalog of navigation rules (skill checks with daily caps)
//! - Per-traveler usage tracking with a lazy daily reset
//! - Rule execution that posts outcomes to a shared chat log
//! - A presentation-free form controller plus toolbar gating
//! - Port traits for check resolution, chat, flag storage, and time
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wayfare_core::{
//!     catalog, open_navigation, sample_party, ActionExecutor, DiceResolver,
//!     MemoryFlagStore, Selection, Transcript, UsageStore, UserRole,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let usage = Arc::new(UsageStore::with_system_clock(Arc::new(MemoryFlagStore::new())));
//!     let executor = Arc::new(ActionExecutor::new(
//!         usage.clone(),
//!         Arc::new(DiceResolver),
//!         Arc::new(Transcript::new()),
//!     ));
//!
//!     let party = sample_party();
//!     let selection = Selection::single(party.travelers[0].id);
//!     let form = open_navigation(UserRole::GameMaster, &selection, usage, executor)?;
//!
//!     if let Some(notice) = form.rule_clicked(&party, &selection, catalog::RuleKey::Orient).await {
//!         println!("{}", notice.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chat;
pub mod check;
pub mod dice;
pub mod executor;
pub mod form;
pub mod party;
pub mod store;
pub mod testing;
pub mod toolbar;
pub mod usage;

// Primary public API
pub use catalog::{OutcomeHandler, Rule, RuleKey, RuleKind};
pub use chat::{ChatError, ChatLog, ChatMessage, MessageKind, Transcript};
pub use check::{CheckError, CheckResolver, CheckRoll, DiceResolver};
pub use executor::{ActionExecutor, Outcome, PerformError, Performance};
pub use form::{FormData, NavigationForm, Notice, RuleRow};
pub use party::{
    sample_party, Ability, AbilityScores, Party, PartyError, SavedParty, Selection, Skill,
    Traveler, TravelerId, UserRole,
};
pub use store::{FlagError, FlagStore, JsonFlagStore, MemoryFlagStore, FLAG_NAMESPACE};
pub use toolbar::{open_navigation, scene_controls, OpenError, Settings, ToolButton};
pub use usage::{
    Clock, FixedClock, SystemClock, UsageMap, UsageRecord, UsageStore, USAGE_FLAG,
};
