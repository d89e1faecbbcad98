use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::config::Theme;
use crate::upload::{has_accepted_extension, UploadFocus, UploadForm};

/// Upload page: error line, path prompt and the submit button.
pub fn render_upload(area: Rect, buf: &mut Buffer, form: &UploadForm, theme: &Theme) {
    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // heading
            Constraint::Length(2), // error
            Constraint::Length(3), // path input
            Constraint::Length(1), // extension hint
            Constraint::Length(1),
            Constraint::Length(1), // button
            Constraint::Fill(1),
        ])
        .horizontal_margin(2)
        .split(area);

    Paragraph::new("Upload Dataset")
        .style(
            Style::default()
                .fg(theme.get("text_primary"))
                .add_modifier(Modifier::BOLD),
        )
        .render(layout[0], buf);

    if let Some(error) = form.error() {
        Paragraph::new(error)
            .style(Style::default().fg(theme.get("error")))
            .wrap(Wrap { trim: true })
            .render(layout[1], buf);
    }

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if form.focus == UploadFocus::Path {
            active
        } else {
            border
        }))
        .title(" File ");
    let input_area = input_block.inner(layout[2]);
    input_block.render(layout[2], buf);
    form.path_input.render(input_area, buf);

    let path = form.path();
    let hint = if path.as_os_str().is_empty() || has_accepted_extension(&path) {
        "Accepted: .csv, .xlsx, .xls"
    } else {
        "Accepted: .csv, .xlsx, .xls (this file will be sent as-is)"
    };
    Paragraph::new(hint)
        .style(Style::default().fg(theme.get("dimmed")))
        .render(layout[3], buf);

    let (label, style) = if form.is_loading() {
        (" Uploading... ", Style::default().fg(theme.get("dimmed")))
    } else if form.focus == UploadFocus::Submit {
        (
            " Upload ",
            Style::default()
                .fg(theme.get("background"))
                .bg(active)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (" Upload ", Style::default().fg(theme.get("primary")))
    };
    Paragraph::new(label).style(style).render(layout[5], buf);
}
