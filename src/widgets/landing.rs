use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::config::Theme;

/// Backend greeting shown under the call-to-action buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online(String),
    Offline(String),
}

/// Hero page: title, subtitle and the two entry points.
pub fn render_landing(area: Rect, buf: &mut Buffer, theme: &Theme, backend: Option<&BackendStatus>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(2), // title
            Constraint::Length(2), // subtitle
            Constraint::Length(2), // buttons
            Constraint::Length(1), // backend status
            Constraint::Fill(1),
        ])
        .split(area);

    Paragraph::new("Futuristic Data Visualization Studio")
        .style(
            Style::default()
                .fg(theme.get("nav_active"))
                .add_modifier(Modifier::BOLD),
        )
        .centered()
        .render(layout[1], buf);

    Paragraph::new("Upload datasets, explore data, and create interactive graphs.")
        .style(Style::default().fg(theme.get("text_secondary")))
        .centered()
        .wrap(Wrap { trim: true })
        .render(layout[2], buf);

    let primary = Style::default()
        .fg(theme.get("background"))
        .bg(theme.get("primary"))
        .add_modifier(Modifier::BOLD);
    let ghost = Style::default().fg(theme.get("primary"));
    Paragraph::new(Line::from(vec![
        Span::styled(" [u] Upload Data ", primary),
        Span::raw("   "),
        Span::styled(" [d] View Dataset ", ghost),
    ]))
    .centered()
    .render(layout[3], buf);

    if let Some(status) = backend {
        let (text, color) = match status {
            BackendStatus::Checking => ("Checking backend...".to_string(), theme.get("dimmed")),
            BackendStatus::Online(msg) => (format!("Backend: {}", msg), theme.get("success")),
            BackendStatus::Offline(msg) => (msg.clone(), theme.get("error")),
        };
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .centered()
            .render(layout[4], buf);
    }
}
