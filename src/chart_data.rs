//! Prepare chart data from the dataset snapshot: window the preview rows, parse values, apply palette styling.

use std::time::Duration;

use crate::palette::{self, Palette, Rgba, GRID_COLOR, SLICE_BORDER};
use crate::snapshot::{is_truthy, label_text, numeric, DatasetSnapshot};

/// Rows charted when the user has not changed the row-count cap.
pub const DEFAULT_SHOW_COUNT: usize = 15;

/// Chart type: Line, Bar, Pie, or Scatter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
    Pie,
}

impl ChartKind {
    pub const ALL: [Self; 4] = [Self::Line, Self::Bar, Self::Scatter, Self::Pie];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Bar => "Bar",
            Self::Scatter => "Scatter",
            Self::Pie => "Pie",
        }
    }

    pub fn has_axes(self) -> bool {
        !matches!(self, Self::Pie)
    }
}

/// Columns and chart kind chosen in the Dataset view, handed to the Graph view on navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSelection {
    pub x_column: String,
    pub y_column: Option<String>,
    pub chart_type: ChartKind,
}

impl ChartSelection {
    pub fn new(x_column: impl Into<String>, y_column: Option<String>, chart_type: ChartKind) -> Self {
        Self {
            x_column: x_column.into(),
            y_column: y_column.filter(|y| !y.is_empty()),
            chart_type,
        }
    }

    /// "y vs x" when a Y column is chosen, else just x.
    pub fn title(&self) -> String {
        match &self.y_column {
            Some(y) => format!("{} vs {}", y, self.x_column),
            None => self.x_column.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    /// One value per label (line, bar, pie).
    Values(Vec<f64>),
    /// Free-standing points (scatter).
    Points(Vec<ScatterPoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Points(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single color for the whole series, or one per data item.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSet {
    Uniform(Rgba),
    PerItem(Vec<Rgba>),
}

impl ColorSet {
    pub fn at(&self, index: usize) -> Option<Rgba> {
        match self {
            Self::Uniform(c) => Some(*c),
            Self::PerItem(cs) => cs.get(index).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub label: String,
    pub data: SeriesData,
    pub border_color: ColorSet,
    pub background_color: ColorSet,
    pub point_color: Rgba,
    pub tension: f64,
    pub border_width: u32,
}

/// Chart-library-ready data: labels along the category axis plus the datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRenderData {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartRenderData {
    pub fn primary(&self) -> Option<&ChartDataset> {
        self.datasets.first()
    }
}

/// Entrance animation with a quartic ease-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub duration: Duration,
}

impl Animation {
    /// Eased progress in [0, 1] after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return 1.0;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        1.0 - (1.0 - t).powi(4)
    }

    pub fn is_running(&self, elapsed: Duration) -> bool {
        elapsed < self.duration
    }
}

/// Zoom and pan both act on the x and y axes together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionOptions {
    pub pan_enabled: bool,
    pub zoom_enabled: bool,
}

/// Chart-level options shared by every chart kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub responsive: bool,
    pub animation: Animation,
    pub interaction: InteractionOptions,
    pub legend_color: Rgba,
    pub tick_color: Rgba,
    pub grid_color: Rgba,
}

pub fn chart_options(palette: Palette) -> ChartOptions {
    let border = palette::colors(palette).border;
    ChartOptions {
        responsive: true,
        animation: Animation {
            duration: Duration::from_millis(600),
        },
        interaction: InteractionOptions {
            pan_enabled: true,
            zoom_enabled: true,
        },
        legend_color: border,
        tick_color: border,
        grid_color: GRID_COLOR,
    }
}

/// Build the chart data for `selection`.
///
/// Line, bar and pie use the first `show_count` preview rows. Scatter always uses the
/// whole preview.
pub fn build_chart_data(
    snapshot: &DatasetSnapshot,
    selection: &ChartSelection,
    palette: Palette,
    show_count: usize,
) -> ChartRenderData {
    let x = selection.x_column.as_str();
    let y = selection.y_column.as_deref();
    let window: Vec<_> = snapshot.preview.iter().take(show_count).collect();
    let labels: Vec<String> = window.iter().map(|row| label_text(row.get(x))).collect();

    let data = match (selection.chart_type, y) {
        (ChartKind::Scatter, _) => SeriesData::Points(
            snapshot
                .preview
                .iter()
                .map(|row| {
                    let y_cell = y.and_then(|y| row.get(y)).filter(|v| is_truthy(Some(*v)));
                    ScatterPoint {
                        x: numeric(row.get(x)),
                        y: numeric(y_cell.or_else(|| row.get(x))),
                    }
                })
                .collect(),
        ),
        (_, Some(y)) => SeriesData::Values(window.iter().map(|row| numeric(row.get(y))).collect()),
        (_, None) => SeriesData::Values(vec![1.0; labels.len()]),
    };

    let colors = palette::colors(palette);
    let (border_color, background_color) = if selection.chart_type == ChartKind::Pie {
        (
            ColorSet::PerItem(vec![SLICE_BORDER; labels.len()]),
            ColorSet::PerItem(
                (0..labels.len())
                    .map(|i| palette::slice_color(palette, i))
                    .collect(),
            ),
        )
    } else {
        (
            ColorSet::Uniform(colors.border),
            ColorSet::Uniform(colors.fill),
        )
    };

    let dataset = ChartDataset {
        label: y.unwrap_or(x).to_string(),
        data,
        border_color,
        background_color,
        point_color: colors.point,
        tension: 0.4,
        border_width: 2,
    };

    ChartRenderData {
        kind: selection.chart_type,
        labels,
        datasets: vec![dataset],
    }
}

/// Share of the whole for each pie slice. Slices count by magnitude; NaN and infinities count as zero.
pub fn pie_fractions(values: &[f64]) -> Vec<f64> {
    let sizes: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { v.abs() } else { 0.0 })
        .collect();
    let total: f64 = sizes.iter().sum();
    if total <= 0.0 {
        return vec![0.0; values.len()];
    }
    sizes.iter().map(|s| s / total).collect()
}

/// Integer prefix of `s` (leading whitespace and sign allowed, trailing text ignored).
fn parse_int_prefix(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (sign, digits) = match t.as_bytes().first() {
        Some(b'-') => (-1, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|v| v * sign)
        .or(Some(if sign < 0 { i64::MIN } else { i64::MAX }))
}

/// Row-count cap from user input: clamped to `[1, preview_len]`, or `[1, value]` when
/// the preview is empty. Unparsable input counts as 0.
pub fn clamp_show_count(input: &str, preview_len: usize) -> usize {
    let value = parse_int_prefix(input).unwrap_or(0);
    let bound = if preview_len > 0 {
        i64::try_from(preview_len).unwrap_or(i64::MAX)
    } else {
        value
    };
    value.min(bound).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> DatasetSnapshot {
        serde_json::from_value(json!({
            "rows": 4,
            "columns": ["name", "score", "age"],
            "preview": [
                {"name": "ann", "score": 90, "age": 31},
                {"name": "bob", "score": "75.5", "age": 0},
                {"name": "cy", "score": "n/a", "age": 22},
                {"name": "dee", "score": 60, "age": 45}
            ]
        }))
        .unwrap()
    }

    fn values(data: &ChartRenderData) -> Vec<f64> {
        match &data.datasets[0].data {
            SeriesData::Values(v) => v.clone(),
            SeriesData::Points(_) => panic!("expected values"),
        }
    }

    #[test]
    fn labels_follow_row_window() {
        let snap = people();
        let sel = ChartSelection::new("name", Some("score".into()), ChartKind::Line);
        for k in 1..=4 {
            let data = build_chart_data(&snap, &sel, Palette::Ocean, k);
            let expected: Vec<String> = ["ann", "bob", "cy", "dee"][..k]
                .iter()
                .map(|s| s.to_string())
                .collect();
            assert_eq!(data.labels, expected);
            assert_eq!(values(&data).len(), k);
        }
    }

    #[test]
    fn non_numeric_values_stay_nan() {
        let snap = people();
        let sel = ChartSelection::new("name", Some("score".into()), ChartKind::Bar);
        let v = values(&build_chart_data(&snap, &sel, Palette::Ocean, 15));
        assert_eq!(v[0], 90.0);
        assert_eq!(v[1], 75.5);
        assert!(v[2].is_nan());
        assert_eq!(v[3], 60.0);
    }

    #[test]
    fn missing_y_charts_ones() {
        let snap = people();
        let sel = ChartSelection::new("name", None, ChartKind::Line);
        let data = build_chart_data(&snap, &sel, Palette::Ocean, 3);
        assert_eq!(values(&data), vec![1.0, 1.0, 1.0]);
        assert_eq!(data.datasets[0].label, "name");
    }

    #[test]
    fn scatter_ignores_row_cap() {
        let snap = people();
        let sel = ChartSelection::new("age", Some("score".into()), ChartKind::Scatter);
        let data = build_chart_data(&snap, &sel, Palette::Ocean, 2);
        assert_eq!(data.datasets[0].data.len(), snap.preview.len());
        assert_eq!(data.labels.len(), 2);
        match &data.datasets[0].data {
            SeriesData::Points(p) => {
                assert_eq!(p[0], ScatterPoint { x: 31.0, y: 90.0 });
                assert!(p[2].y.is_nan());
            }
            SeriesData::Values(_) => panic!("expected points"),
        }
    }

    #[test]
    fn scatter_without_y_reuses_x() {
        let snap = people();
        let sel = ChartSelection::new("age", None, ChartKind::Scatter);
        let data = build_chart_data(&snap, &sel, Palette::Ocean, 15);
        match &data.datasets[0].data {
            SeriesData::Points(p) => {
                assert!(p.iter().all(|pt| pt.x == pt.y));
            }
            SeriesData::Values(_) => panic!("expected points"),
        }
    }

    #[test]
    fn scatter_falls_back_to_x_for_falsy_y() {
        let snap = people();
        // bob's age is 0, so y falls back to his name, which is not numeric.
        let sel = ChartSelection::new("name", Some("age".into()), ChartKind::Scatter);
        let data = build_chart_data(&snap, &sel, Palette::Ocean, 15);
        match &data.datasets[0].data {
            SeriesData::Points(p) => {
                assert!(p[0].x.is_nan());
                assert_eq!(p[0].y, 31.0);
                assert!(p[1].y.is_nan());
            }
            SeriesData::Values(_) => panic!("expected points"),
        }
    }

    #[test]
    fn pie_slices_cycle_palette() {
        let preview: Vec<_> = (0..12).map(|i| json!({"k": format!("s{i}"), "v": i})).collect();
        let snap: DatasetSnapshot = serde_json::from_value(json!({
            "rows": 12, "columns": ["k", "v"], "preview": preview
        }))
        .unwrap();
        let sel = ChartSelection::new("k", Some("v".into()), ChartKind::Pie);
        let data = build_chart_data(&snap, &sel, Palette::Sunset, 12);
        let ds = &data.datasets[0];
        for i in 0..12 {
            assert_eq!(
                ds.background_color.at(i),
                Some(palette::colors(Palette::Sunset).slices[i % 5])
            );
            assert_eq!(ds.border_color.at(i), Some(SLICE_BORDER));
        }
    }

    #[test]
    fn palette_changes_colors_only() {
        let snap = people();
        let sel = ChartSelection::new("name", Some("score".into()), ChartKind::Line);
        let a = build_chart_data(&snap, &sel, Palette::Ocean, 3);
        let b = build_chart_data(&snap, &sel, Palette::Violet, 3);
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.datasets[0].data.len(), b.datasets[0].data.len());
        assert_ne!(a.datasets[0].border_color, b.datasets[0].border_color);
        assert_eq!(
            b.datasets[0].border_color,
            ColorSet::Uniform(palette::colors(Palette::Violet).border)
        );
    }

    #[test]
    fn clamp_show_count_bounds() {
        assert_eq!(clamp_show_count("10", 4), 4);
        assert_eq!(clamp_show_count("3", 4), 3);
        assert_eq!(clamp_show_count("0", 4), 1);
        assert_eq!(clamp_show_count("-7", 4), 1);
        assert_eq!(clamp_show_count("", 4), 1);
        assert_eq!(clamp_show_count("abc", 4), 1);
        assert_eq!(clamp_show_count(" 2rows", 4), 2);
        assert_eq!(clamp_show_count("99999999999999999999", 4), 4);
        assert_eq!(clamp_show_count("20", 0), 20);
        assert_eq!(clamp_show_count("0", 0), 1);
    }

    #[test]
    fn animation_eases_out() {
        let opts = chart_options(Palette::Ocean);
        let anim = opts.animation;
        assert_eq!(anim.duration, Duration::from_millis(600));
        assert_eq!(anim.progress(Duration::ZERO), 0.0);
        assert_eq!(anim.progress(Duration::from_millis(600)), 1.0);
        let half = anim.progress(Duration::from_millis(300));
        assert!((half - 0.9375).abs() < 1e-9);
        assert!(!anim.is_running(Duration::from_millis(700)));
    }

    #[test]
    fn options_follow_palette_border() {
        let opts = chart_options(Palette::Neon);
        assert_eq!(opts.tick_color, palette::colors(Palette::Neon).border);
        assert!(opts.interaction.pan_enabled && opts.interaction.zoom_enabled);
        assert!(opts.responsive);
    }

    #[test]
    fn selection_title() {
        let s = ChartSelection::new("name", Some("score".into()), ChartKind::Bar);
        assert_eq!(s.title(), "score vs name");
        let s = ChartSelection::new("name", Some(String::new()), ChartKind::Bar);
        assert_eq!(s.y_column, None);
        assert_eq!(s.title(), "name");
    }

    #[test]
    fn pie_fractions_sum_to_one() {
        let f = pie_fractions(&[1.0, 3.0, f64::NAN, -4.0]);
        assert_eq!(f, vec![0.125, 0.375, 0.0, 0.5]);
        assert_eq!(pie_fractions(&[0.0, f64::NAN]), vec![0.0, 0.0]);
        assert!(pie_fractions(&[]).is_empty());
    }
}
