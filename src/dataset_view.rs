//! Dataset page state: X/Y column and chart kind selection, preview scrolling.

use crossterm::event::{KeyCode, KeyEvent};

use crate::chart_data::{ChartKind, ChartSelection};
use crate::snapshot::DatasetSnapshot;
use crate::store::StoreChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetFocus {
    #[default]
    XColumn,
    YColumn,
    ChartKind,
    ViewGraph,
    Preview,
}

impl DatasetFocus {
    const ORDER: [Self; 5] = [
        Self::XColumn,
        Self::YColumn,
        Self::ChartKind,
        Self::ViewGraph,
        Self::Preview,
    ];

    fn step(self, forward: bool) -> Self {
        let pos = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let len = Self::ORDER.len();
        let next = if forward { pos + 1 } else { pos + len - 1 };
        Self::ORDER[next % len]
    }
}

/// Choice in a column picker: index 0 is the "nothing chosen" entry, `i > 0` is `columns[i - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnChoice(pub usize);

impl ColumnChoice {
    pub fn column<'a>(&self, snapshot: &'a DatasetSnapshot) -> Option<&'a str> {
        self.0
            .checked_sub(1)
            .and_then(|i| snapshot.columns.get(i))
            .map(String::as_str)
    }

    fn shift(&mut self, delta: isize, columns: usize) {
        let max = columns as isize;
        self.0 = (self.0 as isize + delta).clamp(0, max) as usize;
    }
}

#[derive(Debug, Default)]
pub struct DatasetView {
    pub focus: DatasetFocus,
    pub x: ColumnChoice,
    pub y: ColumnChoice,
    pub kind: ChartKind,
    pub preview_offset: usize,
    page_size: usize,
}

impl DatasetView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Forget the selection; the dataset it referred to is gone.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn on_store_change(&mut self, change: StoreChange) {
        tracing::debug!(?change, "dataset selection reset");
        self.reset();
    }

    /// Selection to hand to the Graph view, or None until an X column is chosen.
    pub fn selection(&self, snapshot: &DatasetSnapshot) -> Option<ChartSelection> {
        let x = self.x.column(snapshot)?;
        let y = self.y.column(snapshot).map(str::to_string);
        Some(ChartSelection::new(x, y, self.kind))
    }

    pub fn can_view_graph(&self, snapshot: &DatasetSnapshot) -> bool {
        self.selection(snapshot).is_some()
    }

    fn cycle_kind(&mut self, forward: bool) {
        let all = ChartKind::ALL;
        let pos = all.iter().position(|k| *k == self.kind).unwrap_or(0);
        let len = all.len();
        let next = if forward { pos + 1 } else { pos + len - 1 };
        self.kind = all[next % len];
    }

    fn scroll(&mut self, delta: isize, rows: usize) {
        let max = rows.saturating_sub(1) as isize;
        self.preview_offset = (self.preview_offset as isize + delta).clamp(0, max.max(0)) as usize;
    }

    /// Handle a key. Returns the selection when "View Graph" is activated with an X column.
    pub fn handle_key(
        &mut self,
        key: &KeyEvent,
        snapshot: Option<&DatasetSnapshot>,
    ) -> Option<ChartSelection> {
        let snapshot = snapshot?;
        let columns = snapshot.columns.len();
        let rows = snapshot.preview.len();
        let page = self.page_size as isize;

        match key.code {
            KeyCode::Tab => self.focus = self.focus.step(true),
            KeyCode::BackTab => self.focus = self.focus.step(false),
            KeyCode::PageDown => self.scroll(page, rows),
            KeyCode::PageUp => self.scroll(-page, rows),
            KeyCode::Char('g') => return self.selection(snapshot),
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                let forward = matches!(key.code, KeyCode::Down | KeyCode::Right);
                let delta = if forward { 1 } else { -1 };
                match self.focus {
                    DatasetFocus::XColumn => self.x.shift(delta, columns),
                    DatasetFocus::YColumn => self.y.shift(delta, columns),
                    DatasetFocus::ChartKind => self.cycle_kind(forward),
                    DatasetFocus::Preview => self.scroll(delta, rows),
                    DatasetFocus::ViewGraph => {}
                }
            }
            KeyCode::Enter => match self.focus {
                DatasetFocus::ViewGraph => return self.selection(snapshot),
                _ => self.focus = self.focus.step(true),
            },
            _ => {}
        }
        None
    }
}
