//! Graph page: controls row, chart area (with entrance animation and zoom window), statistics cards.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph, Widget, Wrap,
    },
};
use std::f64::consts::PI;

use crate::chart_data::{pie_fractions, ChartKind, ChartRenderData, SeriesData};
use crate::config::{ColorParser, Theme};
use crate::graph_view::{data_bounds, GraphState, GraphView, Status};
use crate::palette::{self, Rgba};
use crate::snapshot::DatasetSnapshot;
use crate::statistics::format_stat;

use super::dataset::render_no_dataset;

/// Translucent colors are blended onto a black background first.
fn terminal_color(parser: &ColorParser, c: Rgba) -> Color {
    let (r, g, b) = c.over((0, 0, 0));
    parser.rgb(r, g, b)
}

fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Label of the category nearest to `x`, or empty when `x` is outside the labels.
pub fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if i >= 0.0 && (i as usize) < labels.len() {
        labels[i as usize].clone()
    } else {
        String::new()
    }
}

pub fn render_graph(
    area: Rect,
    buf: &mut Buffer,
    view: &GraphView,
    snapshot: Option<&DatasetSnapshot>,
    theme: &Theme,
    parser: &ColorParser,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(3), // controls
            Constraint::Fill(1),   // chart
            Constraint::Length(3), // statistics
            Constraint::Length(1), // status
        ])
        .split(area);

    let title = view
        .selection()
        .map(|s| format!("Graph: {}", s.title()))
        .unwrap_or_else(|| "Graph".to_string());
    Paragraph::new(title)
        .style(
            Style::default()
                .fg(theme.get("table_header"))
                .bg(theme.get("controls_bg"))
                .add_modifier(Modifier::BOLD),
        )
        .render(layout[0], buf);

    let data = match view.state(snapshot) {
        GraphState::NoDataset => {
            render_no_dataset(layout[1].union(layout[4]), buf, theme);
            return;
        }
        GraphState::MissingConfig => {
            let body = Rect {
                height: area.height.saturating_sub(1),
                ..layout[1]
            };
            Paragraph::new(vec![
                Line::from(Span::styled(
                    crate::error::ClientError::MissingChartConfig.to_string(),
                    Style::default().fg(theme.get("warning")),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    " [d] Go to Dataset ",
                    Style::default().fg(theme.get("primary")),
                )),
            ])
            .wrap(Wrap { trim: true })
            .render(body, buf);
            return;
        }
        GraphState::Ready(data) => data,
    };

    render_controls(layout[1], buf, view, theme);

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.get("table_border")));
    let chart_area = chart_block.inner(layout[2]);
    chart_block.render(layout[2], buf);

    let progress = view.animation_progress();
    if data.kind == ChartKind::Pie {
        render_pie(chart_area, buf, &data, view, parser, progress);
    } else {
        render_cartesian(chart_area, buf, &data, view, theme, parser, progress);
    }

    render_statistics(layout[3], buf, &data, theme);

    if let Some(status) = view.status() {
        let (text, color) = match status {
            Status::Info(msg) => (msg.as_str(), theme.get("success")),
            Status::Error(msg) => (msg.as_str(), theme.get("error")),
        };
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .render(layout[4], buf);
    }
}

fn render_controls(area: Rect, buf: &mut Buffer, view: &GraphView, theme: &Theme) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22), // palette
            Constraint::Length(16), // row count
            Constraint::Fill(1),    // zoom state
        ])
        .split(area);

    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");

    Paragraph::new(format!(" {} ", view.palette.as_str()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(" Palette [p] "),
        )
        .render(cols[0], buf);

    let rows_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if view.row_input.is_focused() {
            active
        } else {
            border
        }))
        .title(" Rows [Tab] ");
    let rows_inner = rows_block.inner(cols[1]);
    rows_block.render(cols[1], buf);
    view.row_input.render(rows_inner, buf);

    let zoom = if view.viewport.is_zoomed() {
        "zoomed: [r] reset"
    } else {
        "[+/-] zoom  [arrows] pan"
    };
    Paragraph::new(format!(" {}  [e] export PNG", zoom))
        .style(Style::default().fg(theme.get("text_secondary")))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .render(cols[2], buf);
}

fn render_cartesian(
    area: Rect,
    buf: &mut Buffer,
    data: &ChartRenderData,
    view: &GraphView,
    theme: &Theme,
    parser: &ColorParser,
    progress: f64,
) {
    let text_secondary = theme.get("text_secondary");
    let (Some(dataset), Some(full)) = (data.primary(), data_bounds(data)) else {
        Paragraph::new("No numeric values to chart")
            .style(Style::default().fg(text_secondary))
            .centered()
            .render(area, buf);
        return;
    };
    let bounds = view.viewport.bounds(full);
    let colors = palette::colors(view.palette);
    let options = crate::chart_data::chart_options(view.palette);
    let tick = Style::default().fg(terminal_color(parser, options.tick_color));

    // Values rise from the zero baseline during the entrance animation
    let points: Vec<(f64, f64)> = match &dataset.data {
        SeriesData::Values(values) => values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| (i as f64, v * progress))
            .collect(),
        SeriesData::Points(points) => points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| (p.x, p.y * progress))
            .collect(),
    };

    let (graph_type, marker, color) = match data.kind {
        ChartKind::Bar => (GraphType::Bar, symbols::Marker::HalfBlock, colors.border),
        ChartKind::Scatter => (GraphType::Scatter, symbols::Marker::Dot, colors.point),
        _ => (GraphType::Line, symbols::Marker::Braille, colors.border),
    };

    let mut datasets = vec![Dataset::default()
        .name(dataset.label.clone())
        .marker(marker)
        .graph_type(graph_type)
        .style(Style::default().fg(terminal_color(parser, color)))
        .data(&points)];
    if data.kind == ChartKind::Line {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(terminal_color(parser, colors.point)))
                .data(&points),
        );
    }

    let x_labels: Vec<Span> = if data.kind == ChartKind::Scatter {
        [bounds.x[0], (bounds.x[0] + bounds.x[1]) / 2.0, bounds.x[1]]
            .into_iter()
            .map(|v| Span::styled(format_axis_label(v), tick))
            .collect()
    } else {
        [
            bounds.x[0].ceil(),
            ((bounds.x[0] + bounds.x[1]) / 2.0).round(),
            bounds.x[1].floor(),
        ]
        .into_iter()
        .map(|v| Span::styled(category_label(&data.labels, v), tick))
        .collect()
    };
    let y_labels: Vec<Span> = [bounds.y[0], (bounds.y[0] + bounds.y[1]) / 2.0, bounds.y[1]]
        .into_iter()
        .map(|v| Span::styled(format_axis_label(v), tick))
        .collect();

    Chart::new(datasets)
        .x_axis(Axis::default().bounds(bounds.x).style(tick).labels(x_labels))
        .y_axis(Axis::default().bounds(bounds.y).style(tick).labels(y_labels))
        .legend_position(Some(LegendPosition::TopRight))
        .render(area, buf);
}

fn render_pie(
    area: Rect,
    buf: &mut Buffer,
    data: &ChartRenderData,
    view: &GraphView,
    parser: &ColorParser,
    progress: f64,
) {
    let Some(dataset) = data.primary() else {
        return;
    };
    let SeriesData::Values(values) = &dataset.data else {
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Max(30)])
        .split(area);
    let plot = cols[0];
    if plot.width == 0 || plot.height == 0 {
        return;
    }

    let slice_color = |i: usize| {
        let c = dataset
            .background_color
            .at(i)
            .unwrap_or_else(|| palette::slice_color(view.palette, i));
        terminal_color(parser, c)
    };

    // Braille dots are square when x spans w/2h of the y span
    let y_span = 1.1;
    let x_span = y_span * f64::from(plot.width) / (2.0 * f64::from(plot.height));
    let fractions = pie_fractions(values);
    let sweep = 2.0 * PI * progress;

    let canvas = Canvas::default()
        .marker(symbols::Marker::Braille)
        .x_bounds([-x_span, x_span])
        .y_bounds([-y_span, y_span])
        .paint(|ctx| {
            let rings = 40;
            let mut start = 0.0;
            for (i, fraction) in fractions.iter().enumerate() {
                let end = (start + fraction * 2.0 * PI).min(sweep);
                if end > start {
                    let mut coords = Vec::new();
                    for r in 1..=rings {
                        let radius = f64::from(r) / f64::from(rings);
                        let steps = ((end - start) * radius * 60.0).ceil().max(1.0) as usize;
                        for s in 0..=steps {
                            // clockwise from 12 o'clock
                            let a = PI / 2.0 - (start + (end - start) * s as f64 / steps as f64);
                            coords.push((radius * a.cos(), radius * a.sin()));
                        }
                    }
                    ctx.draw(&Points {
                        coords: &coords,
                        color: slice_color(i),
                    });
                }
                start += fraction * 2.0 * PI;
            }
        });
    canvas.render(plot, buf);

    let legend: Vec<Line> = data
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(slice_color(i))),
                Span::raw(label.as_str()),
            ])
        })
        .collect();
    Paragraph::new(legend).render(cols[1], buf);
}

fn render_statistics(area: Rect, buf: &mut Buffer, data: &ChartRenderData, theme: &Theme) {
    let stats = GraphView::statistics(data);
    let cards = [
        ("Count", stats.count.to_string()),
        ("Mean", format_stat(stats.mean)),
        ("Min", format_stat(stats.min)),
        ("Max", format_stat(stats.max)),
    ];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    for (i, (title, value)) in cards.into_iter().enumerate() {
        Paragraph::new(value)
            .style(Style::default().fg(theme.get("text_primary")))
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.get("modal_border")))
                    .title(format!(" {} ", title)),
            )
            .render(cols[i], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_follow_index() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 0.0), "a");
        assert_eq!(category_label(&labels, 1.2), "b");
        assert_eq!(category_label(&labels, -0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
    }

    #[test]
    fn axis_label_format() {
        assert_eq!(format_axis_label(12.5), "12.50");
        assert_eq!(format_axis_label(0.0), "0.00");
        assert_eq!(format_axis_label(2_000_000.0), "2.00e6");
    }

    #[test]
    fn faint_colors_blend_toward_black() {
        let parser = ColorParser::with_capabilities(true, true, false);
        assert_eq!(
            terminal_color(&parser, Rgba::rgba(255, 255, 255, 0.1)),
            Color::Rgb(26, 26, 26)
        );
        assert_eq!(
            terminal_color(&parser, Rgba::rgb(56, 189, 248)),
            Color::Rgb(56, 189, 248)
        );
    }
}
