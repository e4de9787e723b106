//! Render orchestration for the navigation TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use wayfare_core::MessageKind;

use crate::app::{App, FormOverlay};
use crate::ui::theme::Theme;

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let theme = Theme::default();
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // toolbar
            Constraint::Min(5),    // roster + transcript
            Constraint::Length(1), // status line
        ])
        .split(area);

    render_toolbar(frame, app, &theme, rows[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[1]);

    render_roster(frame, app, &theme, panels[0]);
    render_transcript(frame, app, &theme, panels[1]);
    render_status_line(frame, app, &theme, rows[2]);

    if let Some(overlay) = &app.overlay {
        render_form_overlay(frame, app, &theme, overlay, area);
    }
}

/// Scene control bar: the registered tool buttons plus role and date
fn render_toolbar(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let mut spans = vec![Span::styled(" Wayfare ", theme.title_style())];

    for button in app.toolbar_buttons() {
        spans.push(Span::styled(
            format!("[{} {}] ", button.icon, button.label),
            Style::default().fg(theme.toolbar_button),
        ));
    }

    let role = if app.is_gm() { "GM" } else { "player" };
    spans.push(Span::styled(
        format!("role: {role}  day: {}", app.usage.today()),
        theme.hint_style(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Party roster; the cursor row is the controlled token
fn render_roster(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let items: Vec<ListItem> = app
        .party
        .travelers
        .iter()
        .enumerate()
        .map(|(i, traveler)| {
            let selected = i == app.roster_index;
            let marker = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(theme.roster_selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(
                format!("{marker}{} (lvl {})", traveler.name, traveler.level),
                style,
            )))
        })
        .collect();

    let block = Block::default()
        .title(format!(" {} ", app.party.name))
        .borders(Borders::ALL)
        .border_style(theme.border_style(app.overlay.is_none()));

    frame.render_widget(List::new(items).block(block), area);
}

/// Shared chat transcript, newest messages at the bottom
fn render_transcript(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    // One line per message; keep the tail that fits the panel
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.messages.len().saturating_sub(visible);

    let lines: Vec<Line> = app
        .messages
        .iter()
        .skip(skip)
        .map(|message| {
            let text_style = match message.kind {
                MessageKind::Flavor => theme.flavor_style(),
                MessageKind::Content => theme.content_style(),
            };
            Line::from(vec![
                Span::styled(format!("{}: ", message.speaker), theme.speaker_style()),
                Span::styled(message.text.clone(), text_style),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Transcript ")
        .borders(Borders::ALL)
        .border_style(theme.border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Status line: the latest notice, or key hints
fn render_status_line(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let line = match app.status_message() {
        Some(notice) => Line::from(Span::styled(format!(" {notice}"), theme.notice_style())),
        None => {
            let hints = if app.overlay.is_some() {
                " [1-6] use rule  [r] reset  [Esc] close"
            } else {
                " [j/k] select  [n] navigation  [q] quit"
            };
            Line::from(Span::styled(hints, theme.hint_style()))
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// The navigation form as a centered modal overlay
fn render_form_overlay(
    frame: &mut Frame,
    app: &App,
    theme: &Theme,
    overlay: &FormOverlay,
    area: Rect,
) {
    let popup_area = centered_rect_fixed(58, 14, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let acting = app
        .party
        .travelers
        .get(app.roster_index)
        .map(|traveler| traveler.name.as_str())
        .unwrap_or("nobody");

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Acting traveler: {acting}"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, row) in overlay.data.rules.iter().enumerate() {
        let dc = match row.dc {
            Some(dc) => format!("DC {dc}"),
            None => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{}. {:<24} {}/{}  {}",
                i + 1,
                row.label,
                row.used,
                row.daily_max,
                dc
            ),
            theme.row_style(row.available),
        )));
    }

    lines.push(Line::from(""));
    let hints = if overlay.data.can_reset {
        "[1-6] use  [r] reset all  [Esc] close"
    } else {
        "[1-6] use  [Esc] close"
    };
    lines.push(Line::from(Span::styled(hints, theme.hint_style())));

    let block = Block::default()
        .title(format!(" Navigation ({}) ", overlay.data.today))
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Calculate fixed-size centered popup
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
