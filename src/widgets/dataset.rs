//! Dataset page: counts, selection controls and the preview table.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::config::Theme;
use crate::dataset_view::{DatasetFocus, DatasetView};
use crate::snapshot::{label_text, DatasetSnapshot};

/// Shown whenever a page needs a dataset and the store is empty.
pub fn render_no_dataset(area: Rect, buf: &mut Buffer, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .horizontal_margin(2)
        .split(area);
    Paragraph::new("No dataset loaded")
        .style(
            Style::default()
                .fg(theme.get("text_primary"))
                .add_modifier(Modifier::BOLD),
        )
        .render(layout[0], buf);
    Paragraph::new("Please upload a dataset first.")
        .style(Style::default().fg(theme.get("text_secondary")))
        .render(layout[1], buf);
    Paragraph::new(" [u] Upload Data ")
        .style(Style::default().fg(theme.get("primary")))
        .render(layout[2], buf);
}

fn selector<'a>(label: &'a str, value: &'a str, focused: bool, theme: &Theme) -> Line<'a> {
    let (marker_style, value_style) = if focused {
        let active = theme.get("modal_border_active");
        (
            Style::default().fg(active),
            Style::default().fg(active).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(theme.get("dimmed")),
            Style::default().fg(theme.get("text_primary")),
        )
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(theme.get("text_secondary"))),
        Span::styled("◂ ", marker_style),
        Span::styled(value, value_style),
        Span::styled(" ▸", marker_style),
    ])
}

pub fn render_dataset(
    area: Rect,
    buf: &mut Buffer,
    view: &DatasetView,
    snapshot: Option<&DatasetSnapshot>,
    theme: &Theme,
) {
    let Some(snapshot) = snapshot else {
        render_no_dataset(area, buf, theme);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // heading
            Constraint::Length(2), // counts
            Constraint::Length(1), // x
            Constraint::Length(1), // y
            Constraint::Length(1), // kind
            Constraint::Length(2), // view graph
            Constraint::Fill(1),   // preview
        ])
        .horizontal_margin(1)
        .split(area);

    Paragraph::new("Dataset Preview")
        .style(
            Style::default()
                .fg(theme.get("text_primary"))
                .add_modifier(Modifier::BOLD),
        )
        .render(layout[0], buf);

    let mut counts = vec![
        Span::styled("Rows: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(snapshot.rows.to_string()),
        Span::raw("   "),
        Span::styled("Columns: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(snapshot.column_count().to_string()),
    ];
    if let Some(name) = &snapshot.filename {
        counts.push(Span::raw("   "));
        counts.push(Span::styled("File: ", Style::default().add_modifier(Modifier::BOLD)));
        counts.push(Span::raw(name.as_str()));
    }
    Paragraph::new(Line::from(counts))
        .style(Style::default().fg(theme.get("text_primary")))
        .render(layout[1], buf);

    let x = view.x.column(snapshot).unwrap_or("Select");
    let y = view.y.column(snapshot).unwrap_or("None");
    Paragraph::new(selector("X Column", x, view.focus == DatasetFocus::XColumn, theme))
        .render(layout[2], buf);
    Paragraph::new(selector("Y Column", y, view.focus == DatasetFocus::YColumn, theme))
        .render(layout[3], buf);
    Paragraph::new(selector(
        "Chart Type",
        view.kind.as_str(),
        view.focus == DatasetFocus::ChartKind,
        theme,
    ))
    .render(layout[4], buf);

    let enabled = view.can_view_graph(snapshot);
    let button_style = match (enabled, view.focus == DatasetFocus::ViewGraph) {
        (false, _) => Style::default().fg(theme.get("dimmed")),
        (true, true) => Style::default()
            .fg(theme.get("background"))
            .bg(theme.get("modal_border_active"))
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default().fg(theme.get("primary")),
    };
    Paragraph::new(Span::styled(" View Graph ", button_style)).render(layout[5], buf);

    render_preview(layout[6], buf, view, snapshot, theme);
}

fn render_preview(
    area: Rect,
    buf: &mut Buffer,
    view: &DatasetView,
    snapshot: &DatasetSnapshot,
    theme: &Theme,
) {
    let border = if view.focus == DatasetFocus::Preview {
        theme.get("modal_border_active")
    } else {
        theme.get("table_border")
    };
    let shown_to = (view.preview_offset + area.height.saturating_sub(3) as usize)
        .min(snapshot.preview.len());
    let title = if snapshot.preview.is_empty() {
        " Preview Rows ".to_string()
    } else {
        format!(
            " Preview Rows {}-{} of {} ",
            view.preview_offset + 1,
            shown_to,
            snapshot.preview.len()
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    let header = Row::new(
        snapshot
            .columns
            .iter()
            .map(|c| Cell::from(c.as_str()))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(theme.get("table_header"))
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = snapshot
        .preview
        .iter()
        .skip(view.preview_offset)
        .map(|row| {
            Row::new(
                snapshot
                    .columns
                    .iter()
                    .map(|c| Cell::from(label_text(row.get(c))))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let widths = vec![Constraint::Fill(1); snapshot.columns.len().max(1)];
    Table::new(rows, widths)
        .header(header)
        .block(block)
        .style(Style::default().fg(theme.get("text_primary")))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use serde_json::json;

    fn screen(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn counts_come_from_the_response() {
        // `rows` is the full file size, not the preview length
        let snapshot: DatasetSnapshot = serde_json::from_value(json!({
            "rows": 1250,
            "columns": ["name", "score", "city"],
            "preview": [
                {"name": "A", "score": 1, "city": "Oslo"},
                {"name": "B", "score": 2, "city": "Rome"}
            ],
            "filename": "people.csv"
        }))
        .unwrap();
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        render_dataset(area, &mut buf, &DatasetView::new(10), Some(&snapshot), &theme);

        let text = screen(&buf);
        assert!(text.contains("Rows: 1250"), "{}", text);
        assert!(text.contains("Columns: 3"), "{}", text);
        assert!(text.contains("File: people.csv"), "{}", text);
    }

    #[test]
    fn empty_store_shows_upload_hint() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        render_dataset(area, &mut buf, &DatasetView::new(10), None, &theme);
        let text = screen(&buf);
        assert!(text.contains("No dataset loaded"));
        assert!(!text.contains("Rows:"));
    }
}
