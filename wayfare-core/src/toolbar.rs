//! Scene toolbar wiring: the world setting, the button, and the gate.
//!
//! The navigation button lives with the token tools and opens the form
//! only for a GM with at least one traveler selected. A refused open
//! touches no storage.

use crate::executor::ActionExecutor;
use crate::form::NavigationForm;
use crate::party::{Selection, UserRole};
use crate::usage::UsageStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// World-scoped settings, persisted alongside the party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether the navigation button appears in the scene toolbar.
    #[serde(default = "default_show_navigation_button")]
    pub show_navigation_button: bool,
}

fn default_show_navigation_button() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_navigation_button: default_show_navigation_button(),
        }
    }
}

/// A button in the scene toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolButton {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

/// The navigation tool, grouped with the token tools.
pub const NAVIGATION_BUTTON: ToolButton = ToolButton {
    id: "navigation",
    label: "Navigation",
    icon: "compass",
};

/// Buttons this module contributes to the scene toolbar.
pub fn scene_controls(settings: &Settings) -> Vec<ToolButton> {
    if settings.show_navigation_button {
        vec![NAVIGATION_BUTTON]
    } else {
        Vec::new()
    }
}

/// Why the navigation form refused to open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenError {
    #[error("Only the GM can open the navigation form.")]
    NotGameMaster,

    #[error("Select a traveler token first.")]
    NothingSelected,
}

/// Authorization gate in front of the form.
pub fn open_navigation(
    role: UserRole,
    selection: &Selection,
    usage: Arc<UsageStore>,
    executor: Arc<ActionExecutor>,
) -> Result<NavigationForm, OpenError> {
    if !role.is_gm() {
        return Err(OpenError::NotGameMaster);
    }
    if selection.is_empty() {
        return Err(OpenError::NothingSelected);
    }
    Ok(NavigationForm::new(role, usage, executor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::Selection;
    use crate::store::FlagStore;
    use crate::testing::Scenario;
    use crate::usage::USAGE_FLAG;
    use serde_json::json;

    #[test]
    fn settings_default_on_and_camel_case() {
        let settings = Settings::default();
        assert!(settings.show_navigation_button);

        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({"showNavigationButton": true})
        );

        // Missing key falls back to the default
        let parsed: Settings = serde_json::from_str("{}").unwrap();
        assert!(parsed.show_navigation_button);

        let parsed: Settings =
            serde_json::from_str(r#"{"showNavigationButton": false}"#).unwrap();
        assert!(!parsed.show_navigation_button);
    }

    #[test]
    fn scene_controls_respect_the_setting() {
        let on = scene_controls(&Settings::default());
        assert_eq!(on.len(), 1);
        assert_eq!(on[0].id, "navigation");
        assert_eq!(on[0].label, "Navigation");
        assert_eq!(on[0].icon, "compass");

        let off = scene_controls(&Settings {
            show_navigation_button: false,
        });
        assert!(off.is_empty());
    }

    #[tokio::test]
    async fn gate_refuses_players_even_with_a_selection() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);

        let refused = scenario.player_form(&selection);
        assert_eq!(refused.err(), Some(OpenError::NotGameMaster));

        // Nothing was read or written for the refused open
        let id = scenario.traveler(0).id;
        assert!(scenario
            .flags
            .read_flag(id, USAGE_FLAG)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn gate_requires_a_selection() {
        let scenario = Scenario::new();
        let refused = scenario.gm_form(&Selection::none());
        assert_eq!(refused.err(), Some(OpenError::NothingSelected));
    }

    #[test]
    fn gate_opens_for_gm_with_selection() {
        let scenario = Scenario::new();
        let selection = scenario.select(0);
        let form = scenario.gm_form(&selection).unwrap();
        assert!(form.is_open());
    }
}
