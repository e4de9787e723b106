//! Event handling for the navigation TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// Work that needs the async runtime; the main loop runs it.
    Command(Command),
}

/// Deferred async work produced by a keypress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenForm,
    InvokeRule(usize),
    ResetAll,
    CloseForm,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // Form overlay captures keys while it is up
    if app.overlay.is_some() {
        return handle_form_key(app, key);
    }

    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('n') => EventResult::Command(Command::OpenForm),
        _ => EventResult::Continue,
    }
}

/// Handle keys while the navigation form overlay is up
fn handle_form_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => EventResult::Command(Command::CloseForm),
        KeyCode::Char('r') => {
            let can_reset = app
                .overlay
                .as_ref()
                .map(|overlay| overlay.data.can_reset)
                .unwrap_or(false);
            if can_reset {
                EventResult::Command(Command::ResetAll)
            } else {
                EventResult::Continue
            }
        }
        KeyCode::Char(c @ '1'..='6') => {
            let index = (c as usize) - ('1' as usize);
            EventResult::Command(Command::InvokeRule(index))
        }
        _ => EventResult::Continue,
    }
}
