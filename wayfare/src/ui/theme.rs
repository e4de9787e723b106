//! Color theme and styling for the navigation TUI

use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct Theme {
    pub border: Color,
    pub border_focused: Color,
    pub title: Color,

    pub toolbar_button: Color,
    pub roster_selected: Color,

    // Transcript colors
    pub speaker: Color,
    pub flavor_text: Color,
    pub content_text: Color,

    // Form row colors
    pub row_available: Color,
    pub row_exhausted: Color,

    pub notice: Color,
    pub hint: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            title: Color::Yellow,

            toolbar_button: Color::Cyan,
            roster_selected: Color::LightGreen,

            speaker: Color::White,
            flavor_text: Color::Cyan,
            content_text: Color::White,

            row_available: Color::Green,
            row_exhausted: Color::DarkGray,

            notice: Color::Yellow,
            hint: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    pub fn speaker_style(&self) -> Style {
        Style::default()
            .fg(self.speaker)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for narration produced by successful checks
    pub fn flavor_style(&self) -> Style {
        Style::default()
            .fg(self.flavor_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for plain report messages
    pub fn content_style(&self) -> Style {
        Style::default().fg(self.content_text)
    }

    /// Style for a form row depending on remaining uses
    pub fn row_style(&self, available: bool) -> Style {
        if available {
            Style::default().fg(self.row_available)
        } else {
            Style::default()
                .fg(self.row_exhausted)
                .add_modifier(Modifier::DIM)
        }
    }

    pub fn notice_style(&self) -> Style {
        Style::default().fg(self.notice)
    }

    pub fn hint_style(&self) -> Style {
        Style::default().fg(self.hint).add_modifier(Modifier::DIM)
    }
}
