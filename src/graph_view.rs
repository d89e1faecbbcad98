//! Graph page state: what to draw, how it is zoomed, and the controls around it.

use crossterm::event::{KeyCode, KeyEvent, MouseEventKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::chart_data::{
    build_chart_data, chart_options, clamp_show_count, ChartKind, ChartRenderData, ChartSelection,
    SeriesData,
};
use crate::chart_export;
use crate::palette::{self, Palette};
use crate::snapshot::DatasetSnapshot;
use crate::statistics::SummaryStatistics;
use crate::widgets::text_input::{TextInput, TextInputEvent};

/// Zoom factor per step; below 1 narrows the visible window.
const ZOOM_IN: f64 = 0.8;
const ZOOM_OUT: f64 = 1.25;
/// Pan step as a fraction of the visible span.
const PAN_STEP: f64 = 0.1;

/// What the Graph page shows, checked in this order.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphState {
    NoDataset,
    MissingConfig,
    Ready(ChartRenderData),
}

/// Data-space rectangle shown by a cartesian chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Bounds {
    fn span(range: [f64; 2]) -> f64 {
        range[1] - range[0]
    }

    fn scaled(range: [f64; 2], factor: f64) -> [f64; 2] {
        let mid = (range[0] + range[1]) / 2.0;
        let half = Self::span(range) * factor / 2.0;
        [mid - half, mid + half]
    }

    fn shifted(range: [f64; 2], frac: f64) -> [f64; 2] {
        let d = Self::span(range) * frac;
        [range[0] + d, range[1] + d]
    }
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

/// Widen a degenerate range so it can be drawn.
fn non_empty(range: [f64; 2]) -> [f64; 2] {
    if range[1] > range[0] {
        range
    } else {
        [range[0] - 1.0, range[1] + 1.0]
    }
}

/// Full extent of the chart's data. None for pie charts and for data with no finite value.
///
/// Category charts put label `i` at `x = i`; bar charts always include zero on the value axis.
pub fn data_bounds(data: &ChartRenderData) -> Option<Bounds> {
    if !data.kind.has_axes() {
        return None;
    }
    let dataset = data.primary()?;
    match &dataset.data {
        SeriesData::Values(values) => {
            let mut y = finite_range(values.iter().copied())?;
            if data.kind == ChartKind::Bar {
                y = [y[0].min(0.0), y[1].max(0.0)];
            }
            let n = values.len().max(1) as f64;
            let x = if data.kind == ChartKind::Bar {
                [-0.5, n - 0.5]
            } else {
                [0.0, n - 1.0]
            };
            Some(Bounds {
                x: non_empty(x),
                y: non_empty(y),
            })
        }
        SeriesData::Points(points) => Some(Bounds {
            x: non_empty(finite_range(points.iter().map(|p| p.x))?),
            y: non_empty(finite_range(points.iter().map(|p| p.y))?),
        }),
    }
}

/// Zoom/pan window over the data. Unzoomed until the first zoom or pan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    window: Option<Bounds>,
}

impl Viewport {
    pub fn is_zoomed(&self) -> bool {
        self.window.is_some()
    }

    pub fn bounds(&self, full: Bounds) -> Bounds {
        self.window.unwrap_or(full)
    }

    /// Scale both axes around the window center.
    pub fn zoom(&mut self, factor: f64, full: Bounds) {
        let current = self.bounds(full);
        self.window = Some(Bounds {
            x: Bounds::scaled(current.x, factor),
            y: Bounds::scaled(current.y, factor),
        });
    }

    /// Move the window by fractions of its own span.
    pub fn pan(&mut self, dx: f64, dy: f64, full: Bounds) {
        let current = self.bounds(full);
        self.window = Some(Bounds {
            x: Bounds::shifted(current.x, dx),
            y: Bounds::shifted(current.y, dy),
        });
    }

    /// Back to the full extent. Returns false when nothing was zoomed.
    pub fn reset(&mut self) -> bool {
        self.window.take().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Outcome of a key press on the Graph page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphAction {
    Handled,
    Export,
    Ignored,
}

pub struct GraphView {
    selection: Option<ChartSelection>,
    pub palette: Palette,
    show_count: usize,
    pub row_input: TextInput,
    pub viewport: Viewport,
    /// Start of the entrance animation; None once it is skipped.
    started: Option<Instant>,
    status: Option<Status>,
}

impl GraphView {
    pub fn new(selection: Option<ChartSelection>, palette: Palette, show_count: usize) -> Self {
        let show_count = show_count.max(1);
        let mut row_input = TextInput::new();
        row_input.set_value(show_count.to_string());
        Self {
            selection,
            palette,
            show_count,
            row_input,
            viewport: Viewport::default(),
            started: Some(Instant::now()),
            status: None,
        }
    }

    pub fn selection(&self) -> Option<&ChartSelection> {
        self.selection.as_ref()
    }

    pub fn show_count(&self) -> usize {
        self.show_count
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn state(&self, snapshot: Option<&DatasetSnapshot>) -> GraphState {
        let Some(snapshot) = snapshot else {
            return GraphState::NoDataset;
        };
        match &self.selection {
            Some(selection) if !selection.x_column.is_empty() => GraphState::Ready(
                build_chart_data(snapshot, selection, self.palette, self.show_count),
            ),
            _ => GraphState::MissingConfig,
        }
    }

    pub fn statistics(data: &ChartRenderData) -> SummaryStatistics {
        data.primary()
            .map(SummaryStatistics::from_dataset)
            .unwrap_or_default()
    }

    /// Eased entrance progress in [0, 1].
    pub fn animation_progress(&self) -> f64 {
        match self.started {
            Some(t) => chart_options(self.palette).animation.progress(t.elapsed()),
            None => 1.0,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.started
            .is_some_and(|t| chart_options(self.palette).animation.is_running(t.elapsed()))
    }

    /// Jump to the settled chart.
    pub fn finish_animation(&mut self) {
        self.started = None;
    }

    pub fn next_palette(&mut self) {
        self.palette = palette::next(self.palette);
    }

    /// Apply a typed row-count value. The field then shows the clamped value.
    pub fn set_show_count(&mut self, input: &str, preview_len: usize) {
        let count = clamp_show_count(input, preview_len);
        if count != self.show_count {
            self.started = Some(Instant::now());
        }
        self.show_count = count;
        self.row_input.set_value(count.to_string());
    }

    fn full_bounds(&self, snapshot: Option<&DatasetSnapshot>) -> Option<Bounds> {
        match self.state(snapshot) {
            GraphState::Ready(data) => data_bounds(&data),
            _ => None,
        }
    }

    pub fn zoom(&mut self, factor: f64, snapshot: Option<&DatasetSnapshot>) {
        if !chart_options(self.palette).interaction.zoom_enabled {
            return;
        }
        if let Some(full) = self.full_bounds(snapshot) {
            self.viewport.zoom(factor, full);
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64, snapshot: Option<&DatasetSnapshot>) {
        if !chart_options(self.palette).interaction.pan_enabled {
            return;
        }
        if let Some(full) = self.full_bounds(snapshot) {
            self.viewport.pan(dx, dy, full);
        }
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.viewport.reset()
    }

    pub fn handle_key(&mut self, key: &KeyEvent, snapshot: Option<&DatasetSnapshot>) -> GraphAction {
        if self.row_input.is_focused() {
            match self.row_input.handle_key(key) {
                TextInputEvent::Edited => {
                    let preview_len = snapshot.map(|s| s.preview.len()).unwrap_or(0);
                    let typed = self.row_input.value().to_string();
                    self.set_show_count(&typed, preview_len);
                }
                TextInputEvent::Submit | TextInputEvent::Cancel => {
                    self.row_input.set_focused(false)
                }
                TextInputEvent::None if key.code == KeyCode::Tab => {
                    self.row_input.set_focused(false)
                }
                TextInputEvent::None => {}
            }
            return GraphAction::Handled;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Char('n') => self.row_input.set_focused(true),
            KeyCode::Char('p') => self.next_palette(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(ZOOM_IN, snapshot),
            KeyCode::Char('-') => self.zoom(ZOOM_OUT, snapshot),
            KeyCode::Left => self.pan(-PAN_STEP, 0.0, snapshot),
            KeyCode::Right => self.pan(PAN_STEP, 0.0, snapshot),
            KeyCode::Up => self.pan(0.0, PAN_STEP, snapshot),
            KeyCode::Down => self.pan(0.0, -PAN_STEP, snapshot),
            KeyCode::Char('r') => {
                self.reset_zoom();
            }
            KeyCode::Char('e') => return GraphAction::Export,
            _ => return GraphAction::Ignored,
        }
        GraphAction::Handled
    }

    pub fn handle_mouse(&mut self, kind: MouseEventKind, snapshot: Option<&DatasetSnapshot>) {
        match kind {
            MouseEventKind::ScrollUp => self.zoom(ZOOM_IN, snapshot),
            MouseEventKind::ScrollDown => self.zoom(ZOOM_OUT, snapshot),
            _ => {}
        }
    }

    /// Write the current chart as a PNG into `dir`. The outcome is kept as the status line.
    pub fn export(
        &mut self,
        snapshot: Option<&DatasetSnapshot>,
        dir: &Path,
        size: (u32, u32),
    ) -> color_eyre::Result<PathBuf> {
        let result = match (self.state(snapshot), &self.selection) {
            (GraphState::Ready(data), Some(selection)) => {
                let window = data_bounds(&data).map(|full| self.viewport.bounds(full));
                chart_export::export_chart(dir, &data, selection, self.palette, window, size)
            }
            (GraphState::NoDataset, _) => Err(color_eyre::eyre::eyre!(
                crate::error::ClientError::NoDataset
            )),
            _ => Err(color_eyre::eyre::eyre!(
                crate::error::ClientError::MissingChartConfig
            )),
        };
        self.status = Some(match &result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "chart exported");
                Status::Info(format!("Saved {}", path.display()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "chart export failed");
                Status::Error(format!("Export failed: {}", e))
            }
        });
        result
    }
}
