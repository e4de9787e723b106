//! Main application state and logic

use std::sync::Arc;

use wayfare_core::{
    open_navigation, scene_controls, ActionExecutor, ChatMessage, FormData, NavigationForm, Party,
    Selection, Settings, ToolButton, Transcript, UsageStore, UserRole,
};

/// The navigation form overlay together with its latest snapshot.
///
/// The snapshot is re-requested after every command so the rows always
/// reflect what is on disk, not what the last render assumed.
pub struct FormOverlay {
    pub form: NavigationForm,
    pub data: FormData,
}

/// Main application state
pub struct App {
    pub party: Party,
    pub settings: Settings,
    pub role: UserRole,

    // Shared ports, also held by the executor
    pub usage: Arc<UsageStore>,
    pub executor: Arc<ActionExecutor>,
    pub transcript: Arc<Transcript>,

    /// Transcript entries cached for rendering.
    pub messages: Vec<ChatMessage>,
    /// Roster row the cursor is on; doubles as the controlled token.
    pub roster_index: usize,
    pub overlay: Option<FormOverlay>,
    status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        party: Party,
        settings: Settings,
        role: UserRole,
        usage: Arc<UsageStore>,
        executor: Arc<ActionExecutor>,
        transcript: Arc<Transcript>,
    ) -> Self {
        Self {
            party,
            settings,
            role,
            usage,
            executor,
            transcript,
            messages: Vec::new(),
            roster_index: 0,
            overlay: None,
            status_message: None,
            should_quit: false,
        }
    }

    /// The selection implied by the roster cursor.
    pub fn selection(&self) -> Selection {
        self.party
            .travelers
            .get(self.roster_index)
            .map(|traveler| Selection::single(traveler.id))
            .unwrap_or_default()
    }

    pub fn toolbar_buttons(&self) -> Vec<ToolButton> {
        scene_controls(&self.settings)
    }

    pub fn is_gm(&self) -> bool {
        self.role.is_gm()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn select_next(&mut self) {
        if !self.party.is_empty() {
            self.roster_index = (self.roster_index + 1) % self.party.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.party.is_empty() {
            self.roster_index = (self.roster_index + self.party.len() - 1) % self.party.len();
        }
    }

    pub async fn refresh_transcript(&mut self) {
        self.messages = self.transcript.snapshot().await;
    }

    /// Press the navigation toolbar button.
    ///
    /// The button only exists while the setting shows it, and the form
    /// itself refuses non-GMs and empty selections. Refusals land on
    /// the status line instead of opening anything.
    pub async fn press_navigation(&mut self) {
        if !self.settings.show_navigation_button {
            return;
        }

        let selection = self.selection();
        match open_navigation(
            self.role,
            &selection,
            self.usage.clone(),
            self.executor.clone(),
        ) {
            Ok(form) => match form.data(&self.party, &selection).await {
                Ok(data) => {
                    self.overlay = Some(FormOverlay { form, data });
                    self.status_message = None;
                }
                Err(e) => {
                    tracing::error!(error = %e, "could not load navigation usage");
                    self.set_status("Could not read navigation usage.");
                }
            },
            Err(refusal) => {
                tracing::warn!(%refusal, "navigation form refused to open");
                self.set_status(refusal.to_string());
            }
        }
    }

    /// Invoke the rule on the given form row (0-based).
    pub async fn invoke_rule(&mut self, index: usize) {
        let selection = self.selection();
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let Some(key) = overlay.data.rules.get(index).map(|row| row.key) else {
            return;
        };

        let notice = overlay.form.rule_clicked(&self.party, &selection, key).await;
        match overlay.form.data(&self.party, &selection).await {
            Ok(data) => overlay.data = data,
            Err(e) => {
                // Keep the stale snapshot rather than closing the form
                tracing::error!(error = %e, "could not refresh form data");
            }
        }

        self.status_message = notice.map(|n| n.text().to_string());
        self.refresh_transcript().await;
    }

    /// Reset every traveler's daily uses. The form no-ops for players.
    pub async fn reset_all(&mut self) {
        let selection = self.selection();
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };

        let notice = overlay.form.reset_clicked(&self.party).await;
        match overlay.form.data(&self.party, &selection).await {
            Ok(data) => overlay.data = data,
            Err(e) => {
                tracing::error!(error = %e, "could not refresh form data");
            }
        }

        self.status_message = notice.map(|n| n.text().to_string());
    }

    pub fn close_form(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.form.close();
        }
    }
}
