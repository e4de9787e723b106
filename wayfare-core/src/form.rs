//! The navigation form controller.
//!
//! Presentation-free: `data` projects a snapshot for whatever renders
//! the form, and the click handlers map every failure to a notice.
//! The form itself never panics and never half-applies an action.

use crate::catalog::{self, Rule, RuleKey};
use crate::executor::{ActionExecutor, PerformError};
use crate::party::{Party, Selection, Traveler, UserRole};
use crate::store::FlagError;
use crate::usage::{UsageRecord, UsageStore};
use chrono::NaiveDate;
use std::sync::Arc;

/// A user-facing notice, rendered by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Warning(text) | Notice::Error(text) => text,
        }
    }
}

/// One rule's row in the form.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    pub key: RuleKey,
    pub label: &'static str,
    pub used: u32,
    pub daily_max: u32,
    pub available: bool,
    pub dc: Option<i32>,
}

/// Snapshot the form renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct FormData {
    pub today: NaiveDate,
    pub rules: Vec<RuleRow>,
    pub can_reset: bool,
}

/// The navigation form, opened through the toolbar gate.
///
/// Stays open across rule clicks and resets; only an explicit close
/// (or dropping it) closes it.
pub struct NavigationForm {
    role: UserRole,
    usage: Arc<UsageStore>,
    executor: Arc<ActionExecutor>,
    open: bool,
}

impl NavigationForm {
    pub fn new(role: UserRole, usage: Arc<UsageStore>, executor: Arc<ActionExecutor>) -> Self {
        Self {
            role,
            usage,
            executor,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Project the current snapshot for the acting traveler.
    ///
    /// With nothing selected every row reads zero used; interaction is
    /// where the missing selection gets reported.
    pub async fn data(&self, party: &Party, selection: &Selection) -> Result<FormData, FlagError> {
        let today = self.usage.today();
        let acting = selection.first().and_then(|id| party.traveler(id));

        let usage = match acting {
            Some(traveler) => self.usage.load(traveler).await?,
            None => Default::default(),
        };

        let rules = catalog::rules()
            .iter()
            .map(|rule| {
                let record = usage
                    .get(&rule.key)
                    .copied()
                    .unwrap_or_else(|| UsageRecord::fresh(today));
                RuleRow {
                    key: rule.key,
                    label: rule.label,
                    used: record.used,
                    daily_max: rule.daily_max,
                    available: record.used < rule.daily_max,
                    dc: rule.kind.dc(),
                }
            })
            .collect();

        Ok(FormData {
            today,
            rules,
            can_reset: self.role.is_gm(),
        })
    }

    /// Handle a click on a rule row.
    ///
    /// Returns `None` on success (the chat message is the feedback);
    /// every failure comes back as a notice for the status line.
    pub async fn rule_clicked(
        &self,
        party: &Party,
        selection: &Selection,
        key: RuleKey,
    ) -> Option<Notice> {
        let rule = catalog::rule(key);

        let Some(traveler) = selection.first().and_then(|id| party.traveler(id)) else {
            return Some(Notice::Warning("No traveler is selected.".to_string()));
        };

        // Precheck so an exhausted rule reports without rolling anything
        match self.usage.load(traveler).await {
            Ok(usage) => {
                if let Some(record) = usage.get(&key) {
                    if record.used >= rule.daily_max {
                        return Some(quota_notice(rule));
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, traveler = %traveler.name, "failed to load usage");
                return Some(Notice::Error("Could not read navigation usage.".to_string()));
            }
        }

        match self.executor.perform(rule, traveler).await {
            Ok(performance) => {
                tracing::debug!(rule = %key, used = performance.used, "rule click resolved");
                None
            }
            Err(PerformError::QuotaExceeded { .. }) => Some(quota_notice(rule)),
            Err(e) => {
                tracing::error!(error = %e, rule = %key, "navigation rule failed");
                Some(Notice::Error(format!("{} could not be resolved.", rule.label)))
            }
        }
    }

    /// Handle a click on the reset button. Silent no-op for non-GMs.
    pub async fn reset_clicked(&self, party: &Party) -> Option<Notice> {
        if !self.role.is_gm() {
            return None;
        }

        match self.usage.reset_all(&party.travelers).await {
            Ok(()) => Some(Notice::Info(
                "Daily navigation uses reset for the whole party.".to_string(),
            )),
            Err(e) => {
                tracing::error!(error = %e, "reset failed");
                Some(Notice::Error("Could not reset daily uses.".to_string()))
            }
        }
    }

    /// The acting traveler for a selection, if any.
    pub fn acting_traveler<'p>(
        &self,
        party: &'p Party,
        selection: &Selection,
    ) -> Option<&'p Traveler> {
        selection.first().and_then(|id| party.traveler(id))
    }
}

fn quota_notice(rule: &Rule) -> Notice {
    Notice::Error(format!("{} has no uses left today.", rule.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_post_count, Scenario};

    #[tokio::test]
    async fn data_lists_catalog_in_order() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();

        let data = form.data(&scenario.party, &selection).await.unwrap();
        assert!(data.can_reset);
        assert_eq!(data.rules.len(), 6);
        assert_eq!(data.rules[0].label, "Orient");
        assert_eq!(data.rules[0].dc, Some(15));
        assert_eq!(data.rules[5].label, "Assist");
        assert_eq!(data.rules[5].dc, None);
        assert!(data.rules.iter().all(|row| row.available && row.used == 0));
    }

    #[tokio::test]
    async fn data_without_selection_reads_zero_rows() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();

        let data = form.data(&scenario.party, &Selection::none()).await.unwrap();
        assert!(data.rules.iter().all(|row| row.used == 0 && row.available));
    }

    #[tokio::test]
    async fn click_without_selection_warns_and_touches_nothing() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();

        let notice = form
            .rule_clicked(&scenario.party, &Selection::none(), RuleKey::Orient)
            .await;
        assert!(matches!(notice, Some(Notice::Warning(_))));
        assert_post_count(&scenario.chat, 0);
    }

    #[tokio::test]
    async fn click_success_returns_no_notice_and_refreshes() {
        let scenario = Scenario::new();
        let guide = scenario.traveler(0).clone();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();
        scenario.expect_total(17);

        let notice = form
            .rule_clicked(&scenario.party, &selection, RuleKey::Orient)
            .await;
        assert_eq!(notice, None);
        assert_post_count(&scenario.chat, 1);

        let data = form.data(&scenario.party, &selection).await.unwrap();
        let orient = &data.rules[0];
        assert_eq!(orient.used, 1);
        assert!(!orient.available);
        assert_eq!(
            scenario.used_today(&guide, RuleKey::Orient).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn click_on_exhausted_rule_reports_quota() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();
        scenario.expect_total(17);

        let first = form
            .rule_clicked(&scenario.party, &selection, RuleKey::Orient)
            .await;
        assert_eq!(first, None);
        let notice = form
            .rule_clicked(&scenario.party, &selection, RuleKey::Orient)
            .await;

        match notice {
            Some(Notice::Error(text)) => assert!(text.contains("no uses left")),
            other => panic!("expected quota notice, got {other:?}"),
        }
        // The precheck fires before the resolver, so one post total
        assert_post_count(&scenario.chat, 1);
    }

    #[tokio::test]
    async fn reset_is_silent_for_players_and_loud_for_gm() {
        let scenario = Scenario::new();
        let guide = scenario.traveler(0).clone();
        let selection = scenario.select(0);
        scenario.expect_total(17);

        let gm_form = scenario.gm_form(&selection).unwrap();
        let notice = gm_form
            .rule_clicked(&scenario.party, &selection, RuleKey::Orient)
            .await;
        assert_eq!(notice, None);

        let player_form = NavigationForm::new(
            UserRole::Player,
            scenario.usage.clone(),
            scenario.executor.clone(),
        );
        assert_eq!(player_form.reset_clicked(&scenario.party).await, None);
        assert_eq!(
            scenario.used_today(&guide, RuleKey::Orient).await.unwrap(),
            1
        );

        let notice = gm_form.reset_clicked(&scenario.party).await;
        assert!(matches!(notice, Some(Notice::Info(_))));
        assert_eq!(
            scenario.used_today(&guide, RuleKey::Orient).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn storage_outage_surfaces_as_error_notice() {
        let scenario = Scenario::with_failing_storage();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();

        let notice = form
            .rule_clicked(&scenario.party, &selection, RuleKey::Orient)
            .await;
        assert!(matches!(notice, Some(Notice::Error(_))));
        assert_post_count(&scenario.chat, 0);
    }

    #[tokio::test]
    async fn form_stays_open_until_closed() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let mut form = scenario.gm_form(&selection).unwrap();

        assert!(form.is_open());
        let notice = form
            .rule_clicked(&scenario.party, &selection, RuleKey::Assist)
            .await;
        assert_eq!(notice, None);
        assert!(form.is_open());
        form.close();
        assert!(!form.is_open());
    }
}
