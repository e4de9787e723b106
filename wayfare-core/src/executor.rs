//! Rule execution: quota gate, check resolution, chat, increment.
//!
//! `perform` is the single mutation path for usage counts. Everything
//! fallible happens before the increment, so an aborted action never
//! burns a use.

use crate::catalog::{Rule, RuleKey, RuleKind};
use crate::chat::{ChatError, ChatLog};
use crate::check::{CheckError, CheckResolver, CheckRoll};
use crate::dice::DiceError;
use crate::party::Traveler;
use crate::store::FlagError;
use crate::usage::{UsageRecord, UsageStore};
use std::sync::Arc;
use thiserror::Error;

/// How a performed rule turned out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded { roll: CheckRoll },
    Failed { roll: CheckRoll },
    Assisted,
}

/// Report of one performed rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub rule: RuleKey,
    pub outcome: Outcome,
    /// Uses spent today, after this one.
    pub used: u32,
    pub daily_max: u32,
}

/// Errors from performing a rule.
#[derive(Debug, Error)]
pub enum PerformError {
    #[error("{rule} has no uses left today ({used}/{max})")]
    QuotaExceeded { rule: RuleKey, used: u32, max: u32 },

    #[error("check failed to resolve: {0}")]
    Check(#[from] CheckError),

    #[error("dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("chat post failed: {0}")]
    Chat(#[from] ChatError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] FlagError),
}

/// Performs catalog rules for travelers.
pub struct ActionExecutor {
    usage: Arc<UsageStore>,
    resolver: Arc<dyn CheckResolver>,
    chat: Arc<dyn ChatLog>,
}

impl ActionExecutor {
    pub fn new(
        usage: Arc<UsageStore>,
        resolver: Arc<dyn CheckResolver>,
        chat: Arc<dyn ChatLog>,
    ) -> Self {
        Self {
            usage,
            resolver,
            chat,
        }
    }

    /// Perform a rule for a traveler, under that traveler's lock.
    ///
    /// Order is fixed: quota gate, resolve, post one chat message,
    /// then increment. A failure at any step leaves the count as it
    /// was; a chat post followed by a failed save keeps the message
    /// but not the use.
    pub async fn perform(
        &self,
        rule: &Rule,
        traveler: &Traveler,
    ) -> Result<Performance, PerformError> {
        let _guard = self.usage.lock(traveler.id).await;

        let usage = self.usage.load(traveler).await?;
        let record = usage
            .get(&rule.key)
            .copied()
            .unwrap_or_else(|| UsageRecord::fresh(self.usage.today()));

        if record.used >= rule.daily_max {
            return Err(PerformError::QuotaExceeded {
                rule: rule.key,
                used: record.used,
                max: rule.daily_max,
            });
        }

        let (outcome, message) = match rule.kind {
            RuleKind::Assist => (Outcome::Assisted, rule.handler.on_use(traveler)),
            RuleKind::Check { ability, skill, dc } => {
                let roll = self.resolver.resolve(traveler, ability, skill).await?;
                if roll.total >= dc {
                    let message =
                        rule.handler
                            .on_success(traveler, dc, &mut rand::thread_rng())?;
                    (Outcome::Succeeded { roll }, message)
                } else {
                    let message = rule.handler.on_failure(traveler, roll.total);
                    (Outcome::Failed { roll }, message)
                }
            }
        };

        self.chat.post(message).await?;

        let updated = UsageRecord {
            day: record.day,
            used: record.used + 1,
        };
        self.usage.save(traveler, rule.key, updated).await?;

        tracing::debug!(
            rule = %rule.key,
            traveler = %traveler.name,
            used = updated.used,
            max = rule.daily_max,
            "navigation rule performed"
        );

        Ok(Performance {
            rule: rule.key,
            outcome,
            used: updated.used,
            daily_max: rule.daily_max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::chat::MessageKind;
    use crate::testing::{
        assert_post_count, FailingChat, ReadOnlyFlagStore, Scenario, ScriptedResolver,
    };
    use crate::usage::FixedClock;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn success_increments_once_and_posts_once() {
        let scenario = Scenario::new();
        let guide = scenario.traveler(0).clone();
        scenario.expect_total(17);

        let performance = scenario
            .executor
            .perform(catalog::rule(RuleKey::Orient), &guide)
            .await
            .unwrap();

        assert_eq!(performance.used, 1);
        assert!(matches!(
            performance.outcome,
            Outcome::Succeeded { ref roll } if roll.total == 17
        ));
        assert_post_count(&scenario.chat, 1);
        assert_eq!(scenario.chat.posts()[0].kind, MessageKind::Flavor);
        assert_eq!(
            scenario.used_today(&guide, RuleKey::Orient).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn failure_still_spends_a_use() {
        let scenario = Scenario::new();
        let guide = scenario.traveler(0).clone();
        scenario.expect_total(8);

        let performance = scenario
            .executor
            .perform(catalog::rule(RuleKey::ForageWater), &guide)
            .await
            .unwrap();

        assert!(matches!(
            performance.outcome,
            Outcome::Failed { ref roll } if roll.total == 8
        ));
        assert_eq!(performance.used, 1);

        let posts = scenario.chat.posts();
        assert_eq!(posts[0].kind, MessageKind::Content);
        assert!(posts[0].text.contains("8"));
    }

    #[tokio::test]
    async fn quota_blocks_with_no_side_effects() {
        let scenario = Scenario::new();
        let guide = scenario.traveler(0).clone();
        scenario.expect_total(17);

        let orient = catalog::rule(RuleKey::Orient);
        scenario.executor.perform(orient, &guide).await.unwrap();

        match scenario.executor.perform(orient, &guide).await {
            Err(PerformError::QuotaExceeded { rule, used, max }) => {
                assert_eq!(rule, RuleKey::Orient);
                assert_eq!((used, max), (1, 1));
            }
            other => panic!("expected quota error, got {other:?}"),
        }

        // No second message, no second increment
        assert_post_count(&scenario.chat, 1);
        assert_eq!(
            scenario.used_today(&guide, RuleKey::Orient).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn assist_skips_the_resolver() {
        let scenario = Scenario::new();
        let helper = scenario.traveler(2).clone();
        // Nothing queued: a check would fail with an empty script

        let performance = scenario
            .executor
            .perform(catalog::rule(RuleKey::Assist), &helper)
            .await
            .unwrap();

        assert_eq!(performance.outcome, Outcome::Assisted);
        assert_eq!(performance.used, 1);
        assert_post_count(&scenario.chat, 1);
    }

    #[tokio::test]
    async fn chat_outage_aborts_before_increment() {
        let flags = Arc::new(crate::store::MemoryFlagStore::new());
        let clock = Arc::new(FixedClock::new(day("2026-08-23")));
        let usage = Arc::new(UsageStore::new(flags, clock));
        let resolver = Arc::new(ScriptedResolver::new());
        resolver.queue(17);
        let executor = ActionExecutor::new(usage.clone(), resolver, Arc::new(FailingChat));

        let guide = crate::party::sample_party().travelers[0].clone();
        let result = executor
            .perform(catalog::rule(RuleKey::Orient), &guide)
            .await;

        assert!(matches!(result, Err(PerformError::Chat(_))));
        let after = usage.load(&guide).await.unwrap();
        assert_eq!(after[&RuleKey::Orient].used, 0);
    }

    #[tokio::test]
    async fn failed_save_keeps_the_message_but_not_the_use() {
        let flags = Arc::new(ReadOnlyFlagStore::new());
        let clock = Arc::new(FixedClock::new(day("2026-08-23")));
        let usage = Arc::new(UsageStore::new(flags, clock));
        let resolver = Arc::new(ScriptedResolver::new());
        resolver.queue(17);
        let chat = Arc::new(crate::testing::RecordingChat::new());
        let executor = ActionExecutor::new(usage.clone(), resolver, chat.clone());

        let guide = crate::party::sample_party().travelers[0].clone();
        let result = executor
            .perform(catalog::rule(RuleKey::Orient), &guide)
            .await;

        assert!(matches!(result, Err(PerformError::Persistence(_))));
        // The post landed before the save failed
        assert_post_count(&chat, 1);
        let after = usage.load(&guide).await.unwrap();
        assert_eq!(after[&RuleKey::Orient].used, 0);
    }
}
