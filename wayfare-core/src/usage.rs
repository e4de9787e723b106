//! Per-traveler daily usage tracking.
//!
//! Each traveler carries one flag (`"usos"`, the key existing flag
//! data was written under) holding a mapping from rule key to a dated
//! usage record. The daily reset is lazy: a record from an earlier day
//! reads as zero uses today, and nothing is written until the next
//! save. Reads never mutate storage.

use crate::catalog::{self, RuleKey};
use crate::party::{Traveler, TravelerId};
use crate::store::{FlagError, FlagStore};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Flag key the usage mapping is stored under.
pub const USAGE_FLAG: &str = "usos";

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Real-world local date.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A settable clock for exercising the lazy daily reset.
pub struct FixedClock {
    day: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: RwLock::new(day),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.write().unwrap_or_else(PoisonError::into_inner) = day;
    }

    pub fn advance(&self, days: u64) {
        let mut day = self.day.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = day.checked_add_days(Days::new(days)) {
            *day = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Usage of one rule by one traveler on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// The day the count belongs to.
    pub day: NaiveDate,
    /// Uses spent on that day.
    pub used: u32,
}

impl UsageRecord {
    pub fn fresh(day: NaiveDate) -> Self {
        Self { day, used: 0 }
    }
}

/// Usage per catalog rule, in catalog order.
pub type UsageMap = BTreeMap<RuleKey, UsageRecord>;

/// The stored mapping keeps string keys so entries written by retired
/// rules survive loads and saves untouched.
type RawUsage = BTreeMap<String, UsageRecord>;

/// Load/save/reset of usage records over the flag store.
pub struct UsageStore {
    flags: Arc<dyn FlagStore>,
    clock: Arc<dyn Clock>,
    locks: StdMutex<HashMap<TravelerId, Arc<Mutex<()>>>>,
}

impl UsageStore {
    pub fn new(flags: Arc<dyn FlagStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            flags,
            clock,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(flags: Arc<dyn FlagStore>) -> Self {
        Self::new(flags, Arc::new(SystemClock))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Advisory lock covering one traveler's read-modify-write cycle.
    ///
    /// Callers hold the guard across load, decide, and save so two
    /// concurrent performs cannot both observe the same count.
    pub async fn lock(&self, traveler: TravelerId) -> OwnedMutexGuard<()> {
        let cell = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(traveler).or_default().clone()
        };
        cell.lock_owned().await
    }

    async fn read_raw(&self, traveler: TravelerId) -> Result<RawUsage, FlagError> {
        match self.flags.read_flag(traveler, USAGE_FLAG).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(RawUsage::new()),
        }
    }

    /// Current usage for every catalog rule.
    ///
    /// A stored record counts only when its day is today; anything
    /// older (or missing) reads as zero uses. Pure read.
    pub async fn load(&self, traveler: &Traveler) -> Result<UsageMap, FlagError> {
        let today = self.today();
        let raw = self.read_raw(traveler.id).await?;

        if let Some((key, record)) = raw.iter().find(|(_, r)| r.day > today) {
            tracing::warn!(
                rule = %key,
                stored = %record.day,
                %today,
                "usage record dated in the future reads as zero"
            );
        }

        let mut usage = UsageMap::new();
        for rule in catalog::rules() {
            let record = raw
                .get(rule.key.as_str())
                .filter(|r| r.day == today)
                .copied()
                .unwrap_or_else(|| UsageRecord::fresh(today));
            usage.insert(rule.key, record);
        }
        Ok(usage)
    }

    /// Write one rule's record, merging into the stored mapping.
    pub async fn save(
        &self,
        traveler: &Traveler,
        key: RuleKey,
        record: UsageRecord,
    ) -> Result<(), FlagError> {
        let mut raw = self.read_raw(traveler.id).await?;
        raw.insert(key.as_str().to_string(), record);
        self.flags
            .write_flag(traveler.id, USAGE_FLAG, serde_json::to_value(&raw)?)
            .await
    }

    /// Zero every rule for every given traveler, dated today.
    ///
    /// Overwrites each traveler's whole mapping, so stale and retired
    /// entries are cleared too. Idempotent.
    pub async fn reset_all(&self, travelers: &[Traveler]) -> Result<(), FlagError> {
        let today = self.today();
        let mut fresh = RawUsage::new();
        for rule in catalog::rules() {
            fresh.insert(rule.key.as_str().to_string(), UsageRecord::fresh(today));
        }
        let value = serde_json::to_value(&fresh)?;

        for traveler in travelers {
            let _guard = self.lock(traveler.id).await;
            self.flags
                .write_flag(traveler.id, USAGE_FLAG, value.clone())
                .await?;
        }

        tracing::info!(travelers = travelers.len(), %today, "daily navigation uses reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::{sample_party, AbilityScores};
    use crate::store::MemoryFlagStore;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store_with_clock(date: &str) -> (UsageStore, Arc<MemoryFlagStore>, Arc<FixedClock>) {
        let flags = Arc::new(MemoryFlagStore::new());
        let clock = Arc::new(FixedClock::new(day(date)));
        let store = UsageStore::new(flags.clone(), clock.clone());
        (store, flags, clock)
    }

    fn traveler() -> Traveler {
        Traveler::new("Test Traveler", 3, AbilityScores::default())
    }

    #[test]
    fn records_serialize_with_iso_dates() {
        let record = UsageRecord {
            day: day("2026-08-23"),
            used: 2,
        };
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({"day": "2026-08-23", "used": 2})
        );
    }

    #[tokio::test]
    async fn load_with_no_flag_reads_fresh_and_writes_nothing() {
        let (store, flags, _) = store_with_clock("2026-08-23");
        let t = traveler();

        let usage = store.load(&t).await.unwrap();
        assert_eq!(usage.len(), 6);
        for record in usage.values() {
            assert_eq!(record.used, 0);
            assert_eq!(record.day, day("2026-08-23"));
        }

        // Pure read: the store was never touched
        assert!(flags.read_flag(t.id, USAGE_FLAG).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_same_day() {
        let (store, _, _) = store_with_clock("2026-08-23");
        let t = traveler();

        let record = UsageRecord {
            day: day("2026-08-23"),
            used: 1,
        };
        store.save(&t, RuleKey::Orient, record).await.unwrap();

        let usage = store.load(&t).await.unwrap();
        assert_eq!(usage[&RuleKey::Orient], record);
        assert_eq!(usage[&RuleKey::Assist].used, 0);
    }

    #[tokio::test]
    async fn stale_records_read_as_zero_without_mutation() {
        let (store, flags, clock) = store_with_clock("2026-08-23");
        let t = traveler();

        store
            .save(
                &t,
                RuleKey::ForageWater,
                UsageRecord {
                    day: day("2026-08-23"),
                    used: 2,
                },
            )
            .await
            .unwrap();

        clock.advance(1);

        let usage = store.load(&t).await.unwrap();
        assert_eq!(usage[&RuleKey::ForageWater].used, 0);
        assert_eq!(usage[&RuleKey::ForageWater].day, day("2026-08-24"));

        // The stale record is still on disk until the next save
        let raw = flags.read_flag(t.id, USAGE_FLAG).await.unwrap().unwrap();
        assert_eq!(raw["forage-water"]["day"], "2026-08-23");
        assert_eq!(raw["forage-water"]["used"], 2);
    }

    #[tokio::test]
    async fn future_dated_records_read_as_zero() {
        let (store, _, clock) = store_with_clock("2026-08-23");
        let t = traveler();

        store
            .save(
                &t,
                RuleKey::Orient,
                UsageRecord {
                    day: day("2026-08-23"),
                    used: 1,
                },
            )
            .await
            .unwrap();

        // Clock moved backwards relative to the stored record
        clock.set(day("2026-08-22"));

        let usage = store.load(&t).await.unwrap();
        assert_eq!(usage[&RuleKey::Orient].used, 0);
        assert_eq!(usage[&RuleKey::Orient].day, day("2026-08-22"));
    }

    #[tokio::test]
    async fn save_merges_and_preserves_unknown_keys() {
        let (store, flags, _) = store_with_clock("2026-08-23");
        let t = traveler();

        // A record from a rule this catalog no longer knows
        flags
            .write_flag(
                t.id,
                USAGE_FLAG,
                json!({
                    "orient": {"day": "2026-08-23", "used": 1},
                    "read-the-stars": {"day": "2026-08-20", "used": 3}
                }),
            )
            .await
            .unwrap();

        store
            .save(
                &t,
                RuleKey::Assist,
                UsageRecord {
                    day: day("2026-08-23"),
                    used: 1,
                },
            )
            .await
            .unwrap();

        let raw = flags.read_flag(t.id, USAGE_FLAG).await.unwrap().unwrap();
        assert_eq!(raw["orient"]["used"], 1);
        assert_eq!(raw["assist"]["used"], 1);
        assert_eq!(raw["read-the-stars"]["used"], 3);
    }

    #[tokio::test]
    async fn corrupt_flag_value_is_a_persistence_error() {
        let (store, flags, _) = store_with_clock("2026-08-23");
        let t = traveler();

        flags
            .write_flag(t.id, USAGE_FLAG, json!({"orient": "not a record"}))
            .await
            .unwrap();

        assert!(matches!(
            store.load(&t).await,
            Err(FlagError::Json(_))
        ));
    }

    #[tokio::test]
    async fn reset_all_zeroes_everyone_and_is_idempotent() {
        let (store, flags, _) = store_with_clock("2026-08-23");
        let party = sample_party();

        for t in &party.travelers {
            store
                .save(
                    t,
                    RuleKey::ForageRations,
                    UsageRecord {
                        day: day("2026-08-23"),
                        used: 2,
                    },
                )
                .await
                .unwrap();
        }

        store.reset_all(&party.travelers).await.unwrap();
        store.reset_all(&party.travelers).await.unwrap();

        for t in &party.travelers {
            let usage = store.load(t).await.unwrap();
            for record in usage.values() {
                assert_eq!(record.used, 0);
                assert_eq!(record.day, day("2026-08-23"));
            }
            // Overwrite, not merge: exactly the catalog keys remain
            let raw = flags.read_flag(t.id, USAGE_FLAG).await.unwrap().unwrap();
            assert_eq!(raw.as_object().unwrap().len(), 6);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn advisory_lock_prevents_lost_updates() {
        let (store, _, _) = store_with_clock("2026-08-23");
        let store = Arc::new(store);
        let t = traveler();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let t = t.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    let _guard = store.lock(t.id).await;
                    let usage = store.load(&t).await.unwrap();
                    let mut record = usage[&RuleKey::Assist];
                    record.used += 1;
                    store.save(&t, RuleKey::Assist, record).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let usage = store.load(&t).await.unwrap();
        assert_eq!(usage[&RuleKey::Assist].used, 20);
    }
}
