use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};
use ratatui::{buffer::Buffer, layout::Rect};

pub mod cache;
pub mod chart_data;
pub mod chart_export;
pub mod cli;
pub mod config;
pub mod dataset_view;
pub mod error;
pub mod graph_view;
pub mod logging;
pub mod palette;
pub mod snapshot;
pub mod statistics;
pub mod store;
pub mod upload;
pub mod widgets;

pub use cache::CacheManager;
pub use chart_data::{ChartKind, ChartSelection};
pub use cli::Args;
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use error::ClientError;
pub use snapshot::DatasetSnapshot;
pub use store::{DatasetStore, StoreChange};
pub use upload::{HttpUploader, Uploader};

use dataset_view::DatasetView;
use graph_view::{GraphAction, GraphState, GraphView};
use upload::{UploadFocus, UploadForm};
use widgets::controls::{Controls, NavBar};
use widgets::debug::DebugState;
use widgets::landing::BackendStatus;

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "datavis";

/// The four pages. Graph carries the selection handed over from the Dataset page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Landing,
    Upload,
    Dataset,
    Graph(Option<ChartSelection>),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Landing => "landing",
            Route::Upload => "upload",
            Route::Dataset => "dataset",
            Route::Graph(_) => "graph",
        }
    }

    /// Position in the navigation bar.
    pub fn nav_index(&self) -> usize {
        match self {
            Route::Landing => 0,
            Route::Upload => 1,
            Route::Dataset => 2,
            Route::Graph(_) => 3,
        }
    }

    fn from_nav_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Route::Landing),
            1 => Some(Route::Upload),
            2 => Some(Route::Dataset),
            3 => Some(Route::Graph(None)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16), // resized (width, height)
    /// Redraw request while an animation runs
    Tick,
    Navigate(Route),
    SubmitUpload,
    UploadFinished(Result<DatasetSnapshot, ClientError>),
    BackendStatus(Result<String, ClientError>),
    Exit,
    Crash(String),
}

pub struct App {
    events: Sender<AppEvent>,
    config: AppConfig,
    theme: Theme,
    colors: ColorParser,
    store: DatasetStore,
    store_changes: Receiver<StoreChange>,
    uploader: Arc<dyn Uploader>,
    route: Route,
    history: Vec<Route>,
    pub upload_form: UploadForm,
    pub dataset_view: DatasetView,
    graph: Option<GraphView>,
    backend: Option<BackendStatus>,
    notice: Option<String>,
    debug: DebugState,
}

impl App {
    pub fn new(
        events: Sender<AppEvent>,
        config: AppConfig,
        mut store: DatasetStore,
        uploader: Arc<dyn Uploader>,
    ) -> color_eyre::Result<App> {
        let theme = Theme::from_config(&config.theme)?;
        let store_changes = store.subscribe();
        let page_size = config.display.preview_page_size;
        let upload_form = UploadForm::with_theme(&theme);
        Ok(App {
            events,
            config,
            theme,
            colors: ColorParser::new(),
            store,
            store_changes,
            uploader,
            route: Route::Landing,
            history: Vec::new(),
            upload_form,
            dataset_view: DatasetView::new(page_size),
            graph: None,
            backend: None,
            notice: None,
            debug: DebugState::default(),
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn graph(&self) -> Option<&GraphView> {
        self.graph.as_ref()
    }

    pub fn backend_status(&self) -> Option<&BackendStatus> {
        self.backend.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.route, Route::Graph(_))
            && self.graph.as_ref().is_some_and(GraphView::is_animating)
    }

    /// Start the backend liveness probe; the answer arrives as `AppEvent::BackendStatus`.
    pub fn check_backend(&mut self) {
        self.backend = Some(BackendStatus::Checking);
        upload::spawn_backend_check(self.uploader.clone(), self.events.clone());
    }

    fn enter(&mut self, route: Route) {
        if let Route::Graph(selection) = &route {
            self.graph = Some(GraphView::new(
                selection.clone(),
                self.config.default_palette(),
                self.config.display.default_row_count,
            ));
        }
        if route == Route::Upload {
            self.upload_form.focus = UploadFocus::Path;
            self.upload_form.path_input.set_focused(true);
        }
        tracing::debug!(route = route.name(), "navigate");
        self.route = route;
    }

    /// Go to `route`, remembering the current page for `back`.
    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        let previous = std::mem::take(&mut self.route);
        self.history.push(previous);
        self.enter(route);
    }

    /// Return to the previous page. Returns false when there is none.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(route) => {
                self.enter(route);
                true
            }
            None => false,
        }
    }

    fn sync_store(&mut self) {
        while let Ok(change) = self.store_changes.try_recv() {
            self.dataset_view.on_store_change(change);
        }
    }

    fn submit_upload(&mut self) {
        // The error is recorded on the form and rendered inline
        let _ = self
            .upload_form
            .submit(self.uploader.clone(), self.events.clone());
    }

    fn upload_finished(&mut self, result: &Result<DatasetSnapshot, ClientError>) {
        match result {
            Ok(snapshot) => {
                self.upload_form.finish(Ok(()));
                self.notice = match self.store.set(snapshot.clone()) {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::error!(error = %e, "could not persist dataset");
                        Some(format!("Dataset not saved: {}", e))
                    }
                };
                self.sync_store();
                self.navigate(Route::Dataset);
            }
            Err(e) => self.upload_form.finish(Err(e)),
        }
    }

    /// Forget the active dataset, in memory and on disk.
    pub fn clear_dataset(&mut self) {
        self.notice = match self.store.clear() {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(error = %e, "could not remove stored dataset");
                Some(format!("Dataset not removed: {}", e))
            }
        };
        self.sync_store();
    }

    fn text_input_focused(&self) -> bool {
        match &self.route {
            Route::Upload => self.upload_form.path_input.is_focused(),
            Route::Graph(_) => self
                .graph
                .as_ref()
                .is_some_and(|g| g.row_input.is_focused()),
            _ => false,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }
        if let KeyCode::F(n @ 1..=4) = event.code {
            return Route::from_nav_index(usize::from(n) - 1).map(AppEvent::Navigate);
        }

        if !self.text_input_focused() {
            match event.code {
                KeyCode::Char('q') => return Some(AppEvent::Exit),
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    return Route::from_nav_index(index).map(AppEvent::Navigate);
                }
                KeyCode::Esc => {
                    self.back();
                    return None;
                }
                _ => {}
            }
        }

        match self.route.clone() {
            Route::Landing => match event.code {
                KeyCode::Char('u') => Some(AppEvent::Navigate(Route::Upload)),
                KeyCode::Char('d') => Some(AppEvent::Navigate(Route::Dataset)),
                KeyCode::Char('b') => {
                    self.check_backend();
                    None
                }
                _ => None,
            },
            Route::Upload => self.upload_key(event),
            Route::Dataset => {
                if self.store.get().is_none() {
                    return (event.code == KeyCode::Char('u'))
                        .then_some(AppEvent::Navigate(Route::Upload));
                }
                if event.code == KeyCode::Char('x') {
                    self.clear_dataset();
                    return None;
                }
                self.dataset_view
                    .handle_key(event, self.store.get())
                    .map(|selection| AppEvent::Navigate(Route::Graph(Some(selection))))
            }
            Route::Graph(_) => self.graph_key(event),
        }
    }

    fn upload_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match (self.upload_form.focus, event.code) {
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => self.upload_form.toggle_focus(),
            (UploadFocus::Path, KeyCode::Esc) => {
                self.back();
            }
            (UploadFocus::Path, _) => {
                if self.upload_form.handle_path_key(event) {
                    return Some(AppEvent::SubmitUpload);
                }
            }
            (UploadFocus::Submit, KeyCode::Enter) | (UploadFocus::Submit, KeyCode::Char(' ')) => {
                return Some(AppEvent::SubmitUpload);
            }
            _ => {}
        }
        None
    }

    fn graph_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let snapshot = self.store.get();
        let graph = self.graph.as_mut()?;
        match graph.state(snapshot) {
            GraphState::NoDataset => {
                return (event.code == KeyCode::Char('u'))
                    .then_some(AppEvent::Navigate(Route::Upload));
            }
            GraphState::MissingConfig => {
                return (event.code == KeyCode::Char('d'))
                    .then_some(AppEvent::Navigate(Route::Dataset));
            }
            GraphState::Ready(_) => {}
        }
        match graph.handle_key(event, snapshot) {
            GraphAction::Export => {
                let dir = self.config.export_dir();
                let size = (self.config.export.width, self.config.export.height);
                // Outcome is shown on the graph's status line
                let _ = graph.export(snapshot, &dir, size);
            }
            GraphAction::Ignored if event.code == KeyCode::Char(' ') => graph.finish_animation(),
            GraphAction::Handled | GraphAction::Ignored => {}
        }
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        self.sync_store();
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Mouse(mouse) => {
                if matches!(self.route, Route::Graph(_)) {
                    let snapshot = self.store.get();
                    if let Some(graph) = self.graph.as_mut() {
                        graph.handle_mouse(mouse.kind, snapshot);
                    }
                }
                None
            }
            AppEvent::Navigate(route) => {
                self.navigate(route.clone());
                None
            }
            AppEvent::SubmitUpload => {
                self.navigate(Route::Upload);
                self.submit_upload();
                None
            }
            AppEvent::UploadFinished(result) => {
                self.upload_finished(result);
                None
            }
            AppEvent::BackendStatus(result) => {
                self.backend = Some(match result {
                    Ok(message) => BackendStatus::Online(message.clone()),
                    Err(e) => BackendStatus::Offline(e.to_string()),
                });
                None
            }
            AppEvent::Tick | AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match &self.route {
            Route::Landing => &[("u", "Upload"), ("d", "Dataset"), ("b", "Backend"), ("q", "Quit")],
            Route::Upload => &[("Enter", "Upload"), ("Tab", "Focus"), ("Esc", "Back")],
            Route::Dataset => &[
                ("Tab", "Next"),
                ("←→", "Change"),
                ("g", "View Graph"),
                ("PgUp/PgDn", "Scroll"),
                ("x", "Clear"),
                ("Esc", "Back"),
            ],
            Route::Graph(_) => &[
                ("Tab", "Rows"),
                ("p", "Palette"),
                ("+/-", "Zoom"),
                ("r", "Reset"),
                ("e", "Export"),
                ("Esc", "Back"),
            ],
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        self.debug.route = self.route.name();
        self.debug.history_depth = self.history.len();

        Block::default()
            .style(Style::default().bg(self.theme.get("background")))
            .render(area, buf);

        let mut constraints = vec![
            Constraint::Length(1), // navigation
            Constraint::Fill(1),   // page
            Constraint::Length(1), // controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let nav = NavBar {
            active: self.route.nav_index(),
            active_color: self.theme.get("nav_active"),
            background: self.theme.get("controls_bg"),
        };
        (&nav).render(layout[0], buf);

        let snapshot = self.store.get();
        match &self.route {
            Route::Landing => {
                widgets::landing::render_landing(layout[1], buf, &self.theme, self.backend.as_ref())
            }
            Route::Upload => {
                widgets::upload::render_upload(layout[1], buf, &self.upload_form, &self.theme)
            }
            Route::Dataset => widgets::dataset::render_dataset(
                layout[1],
                buf,
                &self.dataset_view,
                snapshot,
                &self.theme,
            ),
            Route::Graph(_) => {
                if let Some(graph) = &self.graph {
                    widgets::chart::render_graph(
                        layout[1],
                        buf,
                        graph,
                        snapshot,
                        &self.theme,
                        &self.colors,
                    );
                }
            }
        }

        let status = self
            .notice
            .clone()
            .or_else(|| snapshot.map(|s| format!("Rows: {} Columns: {}", s.rows, s.column_count())));
        let controls = Controls::new(self.hints())
            .with_status(status)
            .with_dimmed(self.upload_form.is_loading())
            .with_background(self.theme.get("controls_bg"));
        (&controls).render(layout[2], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[3], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::path::Path;
    use std::sync::mpsc::channel;

    struct OfflineUploader;

    impl Uploader for OfflineUploader {
        fn upload(&self, _path: &Path) -> Result<DatasetSnapshot, ClientError> {
            Err(ClientError::upload_failed(None))
        }

        fn ping(&self) -> Result<String, ClientError> {
            Err(ClientError::BackendUnavailable("connection refused".into()))
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::open(dir.path().join("data_info.json"));
        let (tx, _rx) = channel();
        let app =
            App::new(tx, AppConfig::default(), store, Arc::new(OfflineUploader)).unwrap();
        (app, dir)
    }

    #[test]
    fn starts_on_landing() {
        let (app, _dir) = app();
        assert_eq!(app.route(), &Route::Landing);
        assert!(app.history().is_empty());
    }

    #[test]
    fn landing_keys_lead_to_pages() {
        let (mut app, _dir) = app();
        assert!(matches!(
            app.event(&key(KeyCode::Char('u'))),
            Some(AppEvent::Navigate(Route::Upload))
        ));
        assert!(matches!(
            app.event(&key(KeyCode::Char('d'))),
            Some(AppEvent::Navigate(Route::Dataset))
        ));
    }

    #[test]
    fn navigate_and_back() {
        let (mut app, _dir) = app();
        app.navigate(Route::Dataset);
        app.navigate(Route::Graph(None));
        assert_eq!(app.history(), &[Route::Landing, Route::Dataset]);
        assert!(app.back());
        assert_eq!(app.route(), &Route::Dataset);
        assert!(app.back());
        assert!(!app.back());
        assert_eq!(app.route(), &Route::Landing);
    }

    #[test]
    fn navigating_to_current_page_keeps_history() {
        let (mut app, _dir) = app();
        app.navigate(Route::Dataset);
        app.navigate(Route::Dataset);
        assert_eq!(app.history().len(), 1);
    }

    #[test]
    fn function_keys_navigate() {
        let (mut app, _dir) = app();
        assert!(matches!(
            app.event(&key(KeyCode::F(4))),
            Some(AppEvent::Navigate(Route::Graph(None)))
        ));
        assert!(app.event(&key(KeyCode::F(9))).is_none());
    }

    #[test]
    fn q_quits_unless_typing() {
        let (mut app, _dir) = app();
        assert!(matches!(app.event(&key(KeyCode::Char('q'))), Some(AppEvent::Exit)));
        app.navigate(Route::Upload);
        assert!(app.event(&key(KeyCode::Char('q'))).is_none());
        assert_eq!(app.upload_form.path_input.value(), "q");
    }

    #[test]
    fn graph_without_dataset_is_empty_state() {
        let (mut app, _dir) = app();
        app.navigate(Route::Graph(None));
        let graph = app.graph().unwrap();
        assert!(matches!(graph.state(None), GraphState::NoDataset));
    }

    #[test]
    fn backend_status_is_recorded() {
        let (mut app, _dir) = app();
        app.event(&AppEvent::BackendStatus(Ok("Backend is running".into())));
        assert_eq!(
            app.backend_status(),
            Some(&BackendStatus::Online("Backend is running".into()))
        );
        app.event(&AppEvent::BackendStatus(Err(ClientError::BackendUnavailable(
            "refused".into(),
        ))));
        assert!(matches!(app.backend_status(), Some(BackendStatus::Offline(_))));
    }

    #[test]
    fn failed_upload_stays_on_upload_page() {
        let (mut app, _dir) = app();
        app.navigate(Route::Upload);
        app.event(&AppEvent::UploadFinished(Err(ClientError::upload_failed(None))));
        assert_eq!(app.route(), &Route::Upload);
        assert_eq!(app.upload_form.error(), Some(error::UPLOAD_FALLBACK_MESSAGE));
        assert!(app.store().get().is_none());
    }

    #[test]
    fn failed_upload_keeps_previous_dataset() {
        let (mut app, dir) = app();
        let snapshot: DatasetSnapshot = serde_json::from_value(serde_json::json!({
            "rows": 2,
            "columns": ["name", "score"],
            "preview": [{"name": "A", "score": 1}, {"name": "B", "score": 2}],
            "filename": "first.csv"
        }))
        .unwrap();
        app.event(&AppEvent::UploadFinished(Ok(snapshot.clone())));
        let on_disk = std::fs::read_to_string(dir.path().join("data_info.json")).unwrap();

        app.navigate(Route::Upload);
        app.event(&AppEvent::UploadFinished(Err(ClientError::upload_failed(Some(
            "File reading failed".into(),
        )))));

        assert_eq!(app.route(), &Route::Upload);
        assert_eq!(app.upload_form.error(), Some("File reading failed"));
        assert_eq!(app.store().get(), Some(&snapshot));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_info.json")).unwrap(),
            on_disk
        );
    }

    #[test]
    fn clearing_dataset_removes_store_file() {
        let (mut app, dir) = app();
        let snapshot: DatasetSnapshot = serde_json::from_value(serde_json::json!({
            "rows": 1,
            "columns": ["a"],
            "preview": [{"a": 1}]
        }))
        .unwrap();
        app.event(&AppEvent::UploadFinished(Ok(snapshot)));
        assert_eq!(app.route(), &Route::Dataset);
        assert!(dir.path().join("data_info.json").exists());

        app.event(&key(KeyCode::Char('x')));
        assert!(app.store().get().is_none());
        assert!(!dir.path().join("data_info.json").exists());
    }

    #[test]
    fn renders_every_page() {
        let (mut app, _dir) = app();
        let area = Rect::new(0, 0, 100, 30);
        for route in [
            Route::Landing,
            Route::Upload,
            Route::Dataset,
            Route::Graph(None),
        ] {
            app.navigate(route);
            let mut buf = Buffer::empty(area);
            (&mut app).render(area, &mut buf);
        }
    }
}
