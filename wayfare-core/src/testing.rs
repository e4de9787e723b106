//! Testing utilities for the navigation rules.
//!
//! This module provides tools for integration testing:
//! - `ScriptedResolver` for deterministic check totals
//! - `RecordingChat` / `FailingChat` chat doubles
//! - `FailingFlagStore` / `ReadOnlyFlagStore` storage doubles
//! - `Scenario` for wiring a whole stack over in-memory ports
//! - Assertion helpers for chat expectations

use crate::catalog::RuleKey;
use crate::chat::{ChatError, ChatLog, ChatMessage};
use crate::check::{CheckError, CheckResolver, CheckRoll};
use crate::executor::ActionExecutor;
use crate::form::NavigationForm;
use crate::party::{sample_party, Ability, Party, Selection, Skill, Traveler, TravelerId, UserRole};
use crate::store::{FlagError, FlagStore, MemoryFlagStore};
use crate::toolbar::{self, OpenError};
use crate::usage::{FixedClock, UsageStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A check resolver that replays queued totals in order.
///
/// Runs out of script, fails the check; tests that expect no rolls can
/// leave it empty.
#[derive(Default)]
pub struct ScriptedResolver {
    totals: Mutex<VecDeque<i32>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next check total.
    pub fn queue(&self, total: i32) {
        self.totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(total);
    }
}

#[async_trait]
impl CheckResolver for ScriptedResolver {
    async fn resolve(
        &self,
        _traveler: &Traveler,
        _ability: Ability,
        _skill: Option<Skill>,
    ) -> Result<CheckRoll, CheckError> {
        let total = self
            .totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| CheckError::Failed("no scripted check totals left".to_string()))?;
        Ok(CheckRoll {
            total,
            detail: format!("scripted total {total}"),
        })
    }
}

/// A chat log that records every post for later assertion.
#[derive(Default)]
pub struct RecordingChat {
    posts: Mutex<Vec<ChatMessage>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<ChatMessage> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChatLog for RecordingChat {
    async fn post(&self, message: ChatMessage) -> Result<(), ChatError> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

/// A chat log that always refuses the post.
pub struct FailingChat;

#[async_trait]
impl ChatLog for FailingChat {
    async fn post(&self, _message: ChatMessage) -> Result<(), ChatError> {
        Err(ChatError::Unavailable("scripted chat outage".to_string()))
    }
}

fn storage_outage() -> FlagError {
    FlagError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "scripted storage outage",
    ))
}

/// A flag store where every operation fails.
pub struct FailingFlagStore;

#[async_trait]
impl FlagStore for FailingFlagStore {
    async fn read_flag(
        &self,
        _owner: TravelerId,
        _key: &str,
    ) -> Result<Option<Value>, FlagError> {
        Err(storage_outage())
    }

    async fn write_flag(
        &self,
        _owner: TravelerId,
        _key: &str,
        _value: Value,
    ) -> Result<(), FlagError> {
        Err(storage_outage())
    }
}

/// A flag store that reads normally but refuses every write.
#[derive(Default)]
pub struct ReadOnlyFlagStore {
    inner: MemoryFlagStore,
}

impl ReadOnlyFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for ReadOnlyFlagStore {
    async fn read_flag(
        &self,
        owner: TravelerId,
        key: &str,
    ) -> Result<Option<Value>, FlagError> {
        self.inner.read_flag(owner, key).await
    }

    async fn write_flag(
        &self,
        _owner: TravelerId,
        _key: &str,
        _value: Value,
    ) -> Result<(), FlagError> {
        Err(storage_outage())
    }
}

/// A whole navigation stack wired over in-memory ports.
///
/// Sample party, fixed clock, scripted checks, recorded chat. The
/// fixed starting date is arbitrary but stable so assertions can name
/// it.
pub struct Scenario {
    pub party: Party,
    pub clock: Arc<FixedClock>,
    pub flags: Arc<dyn FlagStore>,
    pub chat: Arc<RecordingChat>,
    pub resolver: Arc<ScriptedResolver>,
    pub usage: Arc<UsageStore>,
    pub executor: Arc<ActionExecutor>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::build(Arc::new(MemoryFlagStore::new()), Self::start_date())
    }

    /// A scenario whose storage fails every read and write.
    pub fn with_failing_storage() -> Self {
        Self::build(Arc::new(FailingFlagStore), Self::start_date())
    }

    pub fn on_date(day: NaiveDate) -> Self {
        Self::build(Arc::new(MemoryFlagStore::new()), day)
    }

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap_or_default()
    }

    fn build(flags: Arc<dyn FlagStore>, day: NaiveDate) -> Self {
        let clock = Arc::new(FixedClock::new(day));
        let chat = Arc::new(RecordingChat::new());
        let resolver = Arc::new(ScriptedResolver::new());
        let usage = Arc::new(UsageStore::new(flags.clone(), clock.clone()));
        let executor = Arc::new(ActionExecutor::new(
            usage.clone(),
            resolver.clone(),
            chat.clone(),
        ));

        Self {
            party: sample_party(),
            clock,
            flags,
            chat,
            resolver,
            usage,
            executor,
        }
    }

    pub fn traveler(&self, index: usize) -> &Traveler {
        &self.party.travelers[index]
    }

    /// A selection controlling the indexed traveler.
    pub fn select(&self, index: usize) -> Selection {
        Selection::single(self.party.travelers[index].id)
    }

    /// Queue the next scripted check total.
    pub fn expect_total(&self, total: i32) -> &Self {
        self.resolver.queue(total);
        self
    }

    /// Move the clock forward one day.
    pub fn advance_day(&self) {
        self.clock.advance(1);
    }

    /// Open the form through the toolbar gate as the GM.
    pub fn gm_form(&self, selection: &Selection) -> Result<NavigationForm, OpenError> {
        toolbar::open_navigation(
            UserRole::GameMaster,
            selection,
            self.usage.clone(),
            self.executor.clone(),
        )
    }

    /// Open the form through the toolbar gate as a player.
    pub fn player_form(&self, selection: &Selection) -> Result<NavigationForm, OpenError> {
        toolbar::open_navigation(
            UserRole::Player,
            selection,
            self.usage.clone(),
            self.executor.clone(),
        )
    }

    /// Uses the traveler has spent on a rule today.
    pub async fn used_today(
        &self,
        traveler: &Traveler,
        key: RuleKey,
    ) -> Result<u32, FlagError> {
        let usage = self.usage.load(traveler).await?;
        Ok(usage.get(&key).map(|record| record.used).unwrap_or(0))
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the chat has exactly the expected number of posts.
#[track_caller]
pub fn assert_post_count(chat: &RecordingChat, expected: usize) {
    let actual = chat.len();
    assert_eq!(
        actual, expected,
        "Expected {expected} chat posts, found {actual}"
    );
}

/// Assert the most recent chat post contains the given text.
#[track_caller]
pub fn assert_last_post_contains(chat: &RecordingChat, needle: &str) {
    let posts = chat.posts();
    let last = posts
        .last()
        .unwrap_or_else(|| panic!("Expected at least one chat post, found none"));
    assert!(
        last.text.contains(needle),
        "Expected last post to contain {needle:?}, got {:?}",
        last.text
    );
}
