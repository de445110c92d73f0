//! View coordinator
//!
//! Owns the application state and is the only thing that mutates it. Input arrives
//! as [`Event`]s; output is a list of [`Effect`]s for the host to carry out. Timers
//! belong to the host: a debounced action comes back as a settle event carrying the
//! token it was scheduled with, and a stale token is ignored.
//!
//! A view is laid out at most once per dataset generation. Switching back to a view
//! that is already rendered is a no-op; a dataset refresh or theme change clears
//! every rendered flag and redraws only the active view.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::Dataset;
use crate::sources::{DatasetSources, TodoSnapshot, TodosStore};
use crate::storage::{Storage, VIEW_MODE_KEY};
use crate::theme::{self, Palette, ThemeEnvironment};
use crate::tooltip::Tooltip;
use crate::views::time::filter::TimeFilterState;
use crate::views::{RenderContext, Renderer, ViewHandle};

/// The four views
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Graph,
    Grid,
    Radial,
    Time,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Graph,
        ViewKind::Grid,
        ViewKind::Radial,
        ViewKind::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Graph => "graph",
            ViewKind::Grid => "grid",
            ViewKind::Radial => "radial",
            ViewKind::Time => "time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }

    /// Toggle button caption
    pub fn label(&self) -> &'static str {
        match self {
            ViewKind::Graph => "Graph",
            ViewKind::Grid => "Grid",
            ViewKind::Radial => "Radial",
            ViewKind::Time => "Time",
        }
    }

    /// Id of the page element holding this view
    pub fn container_id(&self) -> String {
        format!("{}-container", self.as_str())
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active view plus one rendered flag per view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub active: ViewKind,
    rendered: BTreeMap<ViewKind, bool>,
}

impl ViewState {
    pub fn new(active: ViewKind) -> Self {
        Self {
            active,
            rendered: BTreeMap::new(),
        }
    }

    pub fn is_rendered(&self, kind: ViewKind) -> bool {
        self.rendered.get(&kind).copied().unwrap_or(false)
    }

    fn mark_rendered(&mut self, kind: ViewKind) {
        self.rendered.insert(kind, true);
    }

    fn clear(&mut self, kind: ViewKind) {
        self.rendered.insert(kind, false);
    }

    fn clear_all(&mut self) {
        self.rendered.clear();
    }
}

/// Everything the coordinator owns between events
pub struct AppState {
    pub view: ViewState,
    pub time_filter: TimeFilterState,
    pub theme: ThemeEnvironment,
    pub palette: Palette,
    /// Current dataset snapshot, absent until a source produced one
    pub dataset: Option<Arc<Dataset>>,
    /// Bumped whenever the dataset is replaced
    pub generation: u64,
    pub todos: TodoSnapshot,
}

/// Input to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectView(ViewKind),
    /// The document theme attribute or a custom property changed
    ThemeChanged(ThemeEnvironment),
    ThemeSettled { token: u64 },
    /// The notes store finished syncing
    SyncComplete,
    /// The todos store changed
    TodosUpdated,
    SetTimeFilter(TimeFilterState),
    TimeFilterSettled { token: u64 },
    Hover { target: String, pointer: (f64, f64) },
    HoverEnd,
    Click { target: String, via_link: bool },
    Resize { width: f64, height: f64 },
    Zoom { factor: f64 },
    Pan { dx: f64, dy: f64 },
}

/// Output for the host
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Full-page navigation
    Navigate(String),
    /// Deliver `event` back to the coordinator after `delay_ms`
    Schedule { delay_ms: u64, event: Event },
}

/// What the embedding page provides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Views that have a container on this page
    pub containers: BTreeSet<ViewKind>,
    /// Path of the page being displayed
    pub current_path: Option<String>,
}

impl Page {
    /// A page with a container for every view
    pub fn full() -> Self {
        Self {
            containers: ViewKind::ALL.into_iter().collect(),
            current_path: None,
        }
    }

    pub fn with_current_path(mut self, path: impl Into<String>) -> Self {
        self.current_path = Some(path.into());
        self
    }

    pub fn has(&self, kind: ViewKind) -> bool {
        self.containers.contains(&kind)
    }
}

/// Which legend accompanies the active view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Legend {
    /// Category legend shared by graph, grid and radial
    Shared,
    /// The time view's own legend and filter controls
    Time,
}

/// Visibility of containers, toggles and legends
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    /// The single visible container, if the page has one for the active view
    pub visible: Option<ViewKind>,
    /// Toggle shown as pressed
    pub pressed: ViewKind,
    pub legend: Legend,
}

impl Chrome {
    pub fn is_visible(&self, kind: ViewKind) -> bool {
        self.visible == Some(kind)
    }
}

pub struct Coordinator {
    state: AppState,
    config: Config,
    storage: Box<dyn Storage>,
    sources: DatasetSources,
    todos_store: Option<Box<dyn TodosStore>>,
    page: Page,
    renderers: Vec<Box<dyn Renderer>>,
    handles: BTreeMap<ViewKind, ViewHandle>,
    tooltip: Tooltip,
    surface_size: (f64, f64),
    theme_token: u64,
    filter_token: u64,
    clock: fn() -> DateTime<Local>,
}

impl Coordinator {
    /// Build a coordinator, restoring the persisted view and time filter
    pub fn new(
        config: Config,
        storage: Box<dyn Storage>,
        sources: DatasetSources,
        todos_store: Option<Box<dyn TodosStore>>,
        page: Page,
        renderers: Vec<Box<dyn Renderer>>,
        theme: ThemeEnvironment,
    ) -> Self {
        let active = storage
            .get(VIEW_MODE_KEY)
            .and_then(|v| ViewKind::parse(&v))
            .unwrap_or(config.site.default_view);
        let time_filter = TimeFilterState::load(storage.as_ref());
        let palette = theme::resolve(&theme);
        let surface_size = (config.viewport.width, config.viewport.height);

        Self {
            state: AppState {
                view: ViewState::new(active),
                time_filter,
                theme,
                palette,
                dataset: None,
                generation: 0,
                todos: TodoSnapshot::Unavailable,
            },
            config,
            storage,
            sources,
            todos_store,
            page,
            renderers,
            handles: BTreeMap::new(),
            tooltip: Tooltip::new(),
            surface_size,
            theme_token: 0,
            filter_token: 0,
            clock: Local::now,
        }
    }

    /// Replace the wall clock used for time filtering
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    /// Initial load: fetch the dataset and todos, then draw the active view
    pub fn start(&mut self) {
        self.reload_dataset();
        self.state.todos = TodoSnapshot::pull(self.todos_store.as_deref());
        let active = self.state.view.active;
        self.ensure_rendered(active, false);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active(&self) -> ViewKind {
        self.state.view.active
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn handle(&self, kind: ViewKind) -> Option<&ViewHandle> {
        self.handles.get(&kind)
    }

    /// Current markup of a view, if it has been rendered
    pub fn markup(&self, kind: ViewKind) -> Option<String> {
        self.handles.get(&kind).map(|h| h.surface.markup())
    }

    pub fn is_rendered(&self, kind: ViewKind) -> bool {
        self.state.view.is_rendered(kind)
    }

    pub fn chrome(&self) -> Chrome {
        let active = self.state.view.active;
        Chrome {
            visible: self.page.has(active).then_some(active),
            pressed: active,
            legend: if active == ViewKind::Time {
                Legend::Time
            } else {
                Legend::Shared
            },
        }
    }

    /// Render every view present on the page without changing the active one
    pub fn prerender_all(&mut self) {
        for kind in ViewKind::ALL {
            self.ensure_rendered(kind, false);
        }
    }

    /// Time dashboard markup for another filter, leaving the app state untouched.
    ///
    /// Lets a static page carry every preset so the filter can be switched offline.
    pub fn preview_time_filter(&mut self, filter: TimeFilterState) -> Option<String> {
        if !self.page.has(ViewKind::Time) {
            return None;
        }
        let dataset = self.state.dataset.clone()?;
        let renderer = self
            .renderers
            .iter_mut()
            .find(|r| r.kind() == ViewKind::Time)?;
        let ctx = RenderContext {
            dataset: &dataset,
            palette: &self.state.palette,
            config: &self.config,
            current_path: self.page.current_path.as_deref(),
            todos: &self.state.todos,
            time_filter: &filter,
            now: (self.clock)(),
            swap: false,
            generation: self.state.generation,
        };
        let handle = renderer.activate(&ctx);
        let markup = handle.surface.markup();
        renderer.teardown(handle);
        Some(markup)
    }

    /// Handle one event
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SelectView(kind) => {
                self.select(kind);
                Vec::new()
            }
            Event::ThemeChanged(env) => {
                self.state.theme = env;
                self.theme_token += 1;
                vec![Effect::Schedule {
                    delay_ms: self.config.theme_settle_ms,
                    event: Event::ThemeSettled {
                        token: self.theme_token,
                    },
                }]
            }
            Event::ThemeSettled { token } => {
                if token != self.theme_token {
                    debug!(token, current = self.theme_token, "ignoring stale theme settle");
                    return Vec::new();
                }
                self.state.palette = theme::resolve(&self.state.theme);
                info!(mode = self.state.palette.mode.as_str(), "theme changed, redrawing");
                self.invalidate_all();
                Vec::new()
            }
            Event::SyncComplete => {
                if self.reload_dataset() {
                    self.invalidate_all();
                }
                Vec::new()
            }
            Event::TodosUpdated => {
                self.state.todos = TodoSnapshot::pull(self.todos_store.as_deref());
                self.state.view.clear(ViewKind::Time);
                if self.state.view.active == ViewKind::Time {
                    self.ensure_rendered(ViewKind::Time, false);
                }
                Vec::new()
            }
            Event::SetTimeFilter(filter) => {
                self.state.time_filter = filter;
                filter.save(self.storage.as_mut());
                self.filter_token += 1;
                vec![Effect::Schedule {
                    delay_ms: self.config.time.filter_debounce_ms,
                    event: Event::TimeFilterSettled {
                        token: self.filter_token,
                    },
                }]
            }
            Event::TimeFilterSettled { token } => {
                if token != self.filter_token {
                    debug!(token, current = self.filter_token, "ignoring stale filter settle");
                    return Vec::new();
                }
                self.state.view.clear(ViewKind::Time);
                if self.state.view.active == ViewKind::Time {
                    self.ensure_rendered(ViewKind::Time, true);
                }
                Vec::new()
            }
            Event::Hover { target, pointer } => {
                let content = self
                    .active_handle_mut()
                    .and_then(|h| h.surface.hover(&target));
                match content {
                    Some(content) => self.tooltip.show(content, pointer, self.surface_size),
                    None => self.tooltip.hide(),
                }
                Vec::new()
            }
            Event::HoverEnd => {
                if let Some(handle) = self.active_handle_mut() {
                    handle.surface.hover_end();
                }
                self.tooltip.hide();
                Vec::new()
            }
            Event::Click { target, via_link } => self
                .active_handle()
                .and_then(|h| h.surface.click(&target, via_link))
                .map(Effect::Navigate)
                .into_iter()
                .collect(),
            Event::Resize { width, height } => {
                self.surface_size = (width, height);
                for handle in self.handles.values_mut() {
                    handle.surface.resize(width, height);
                }
                Vec::new()
            }
            Event::Zoom { factor } => {
                if let Some(handle) = self.active_handle_mut() {
                    handle.surface.zoom(factor);
                }
                Vec::new()
            }
            Event::Pan { dx, dy } => {
                if let Some(handle) = self.active_handle_mut() {
                    handle.surface.pan(dx, dy);
                }
                Vec::new()
            }
        }
    }

    fn select(&mut self, kind: ViewKind) {
        self.storage.set(VIEW_MODE_KEY, kind.as_str());
        if self.state.view.active != kind {
            self.tooltip.hide();
        }
        self.state.view.active = kind;
        debug!(view = %kind, "view selected");
        self.ensure_rendered(kind, false);
    }

    fn active_handle(&self) -> Option<&ViewHandle> {
        self.handles.get(&self.state.view.active)
    }

    fn active_handle_mut(&mut self) -> Option<&mut ViewHandle> {
        self.handles.get_mut(&self.state.view.active)
    }

    /// Pull a fresh dataset. Returns whether the dataset was replaced.
    fn reload_dataset(&mut self) -> bool {
        match self.sources.load() {
            Some(dataset) => {
                self.state.dataset = Some(Arc::new(dataset));
                self.state.generation += 1;
                true
            }
            None => {
                warn!("no dataset available; views stay as they are");
                false
            }
        }
    }

    /// Clear every rendered flag and redraw the active view only
    fn invalidate_all(&mut self) {
        self.state.view.clear_all();
        self.tooltip.hide();
        let active = self.state.view.active;
        self.ensure_rendered(active, false);
    }

    fn ensure_rendered(&mut self, kind: ViewKind, swap: bool) {
        if !self.page.has(kind) {
            debug!(view = %kind, "no container for view, skipping");
            return;
        }
        if self.state.view.is_rendered(kind) {
            debug!(view = %kind, "view already rendered for this dataset");
            return;
        }
        let Some(dataset) = self.state.dataset.clone() else {
            debug!(view = %kind, "no dataset yet, nothing to render");
            return;
        };
        let Some(renderer) = self.renderers.iter_mut().find(|r| r.kind() == kind) else {
            warn!(view = %kind, "no renderer registered for view");
            return;
        };

        if let Some(old) = self.handles.remove(&kind) {
            renderer.teardown(old);
        }
        let ctx = RenderContext {
            dataset: &dataset,
            palette: &self.state.palette,
            config: &self.config,
            current_path: self.page.current_path.as_deref(),
            todos: &self.state.todos,
            time_filter: &self.state.time_filter,
            now: (self.clock)(),
            swap,
            generation: self.state.generation,
        };
        let mut handle = renderer.activate(&ctx);
        let (width, height) = self.surface_size;
        if (width, height) != (self.config.viewport.width, self.config.viewport.height) {
            handle.surface.resize(width, height);
        }
        debug!(view = %kind, generation = handle.generation, "view rendered");
        self.handles.insert(kind, handle);
        self.state.view.mark_rendered(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Todo;
    use crate::scene::Schedule;
    use crate::sources::fakes::{FakeNotes, FakeTodos, note};
    use crate::storage::{MemoryStorage, TIME_FILTER_KEY};
    use crate::theme::ThemeMode;
    use crate::tooltip::TooltipContent;
    use crate::views::Surface;
    use crate::views::time::filter::TimeFilterMode;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Surface recording interaction
    struct SpySurface {
        schedule: Schedule,
        palette_edge: String,
        node_count: usize,
        zooms: Rc<Cell<usize>>,
    }

    impl Surface for SpySurface {
        fn markup(&self) -> String {
            format!("nodes={} edge={}", self.node_count, self.palette_edge)
        }

        fn schedule(&self) -> &Schedule {
            &self.schedule
        }

        fn hover(&mut self, target: &str) -> Option<TooltipContent> {
            (target == "node").then(|| TooltipContent::new("Node"))
        }

        fn click(&self, target: &str, _via_link: bool) -> Option<String> {
            (target == "node").then(|| "/notes/node/".to_string())
        }

        fn zoom(&mut self, _factor: f64) {
            self.zooms.set(self.zooms.get() + 1);
        }
    }

    /// Renderer counting activations
    struct SpyRenderer {
        kind: ViewKind,
        activations: Rc<Cell<usize>>,
        swaps: Rc<RefCell<Vec<bool>>>,
        zooms: Rc<Cell<usize>>,
    }

    impl Renderer for SpyRenderer {
        fn kind(&self) -> ViewKind {
            self.kind
        }

        fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle {
            self.activations.set(self.activations.get() + 1);
            self.swaps.borrow_mut().push(ctx.swap);
            let surface = SpySurface {
                schedule: Schedule::new(),
                palette_edge: ctx.palette.edge.clone(),
                node_count: ctx.dataset.nodes().len(),
                zooms: self.zooms.clone(),
            };
            ViewHandle::new(self.kind, ctx, surface)
        }
    }

    struct Harness {
        coordinator: Coordinator,
        activations: BTreeMap<ViewKind, Rc<Cell<usize>>>,
        swaps: Rc<RefCell<Vec<bool>>>,
        zooms: Rc<Cell<usize>>,
        notes_reads: Rc<Cell<usize>>,
    }

    impl Harness {
        fn count(&self, kind: ViewKind) -> usize {
            self.activations[&kind].get()
        }
    }

    fn harness_with(page: Page, storage: MemoryStorage, todos: Option<Vec<Todo>>) -> Harness {
        let swaps = Rc::new(RefCell::new(Vec::new()));
        let zooms = Rc::new(Cell::new(0));
        let mut activations = BTreeMap::new();
        let renderers: Vec<Box<dyn Renderer>> = ViewKind::ALL
            .into_iter()
            .map(|kind| {
                let counter = Rc::new(Cell::new(0));
                activations.insert(kind, counter.clone());
                Box::new(SpyRenderer {
                    kind,
                    activations: counter,
                    swaps: swaps.clone(),
                    zooms: zooms.clone(),
                }) as Box<dyn Renderer>
            })
            .collect();

        let notes = FakeNotes::ok(vec![
            note("1", "Rust", &["lang"]),
            note("2", "Go", &["lang"]),
        ]);
        let notes_reads = notes.reads.clone();
        let sources = DatasetSources {
            live: Some(Box::new(notes)),
            fallback: None,
            base_url: String::new(),
        };
        let todos_store = todos.map(|t| Box::new(FakeTodos(t)) as Box<dyn TodosStore>);

        let mut coordinator = Coordinator::new(
            Config::default(),
            Box::new(storage),
            sources,
            todos_store,
            page,
            renderers,
            ThemeEnvironment::with_mode(ThemeMode::Light),
        );
        coordinator.start();
        Harness {
            coordinator,
            activations,
            swaps,
            zooms,
            notes_reads,
        }
    }

    fn harness() -> Harness {
        harness_with(Page::full(), MemoryStorage::new(), None)
    }

    #[test]
    fn starts_on_the_default_view() {
        let h = harness();
        assert_eq!(h.coordinator.active(), ViewKind::Graph);
        assert_eq!(h.count(ViewKind::Graph), 1);
        assert_eq!(h.count(ViewKind::Grid), 0);
        assert_eq!(h.coordinator.generation(), 1);
        assert_eq!(h.notes_reads.get(), 1);
    }

    #[test]
    fn restores_the_persisted_view() {
        let mut storage = MemoryStorage::new();
        storage.set(VIEW_MODE_KEY, "radial");
        let h = harness_with(Page::full(), storage, None);
        assert_eq!(h.coordinator.active(), ViewKind::Radial);
        assert_eq!(h.count(ViewKind::Radial), 1);
    }

    #[test]
    fn unknown_persisted_view_falls_back_to_default() {
        let mut storage = MemoryStorage::new();
        storage.set(VIEW_MODE_KEY, "timeline");
        let h = harness_with(Page::full(), storage, None);
        assert_eq!(h.coordinator.active(), ViewKind::Graph);
    }

    #[test]
    fn reactivating_a_rendered_view_is_a_no_op() {
        let mut h = harness();
        h.coordinator.dispatch(Event::SelectView(ViewKind::Grid));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Graph));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Grid));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Grid));

        assert_eq!(h.count(ViewKind::Graph), 1);
        assert_eq!(h.count(ViewKind::Grid), 1);
        assert_eq!(h.coordinator.active(), ViewKind::Grid);
    }

    #[test]
    fn exactly_one_container_is_visible() {
        let mut h = harness();
        h.coordinator.dispatch(Event::SelectView(ViewKind::Time));
        let chrome = h.coordinator.chrome();
        let visible: Vec<_> = ViewKind::ALL
            .into_iter()
            .filter(|&k| chrome.is_visible(k))
            .collect();
        assert_eq!(visible, vec![ViewKind::Time]);
        assert_eq!(chrome.legend, Legend::Time);

        h.coordinator.dispatch(Event::SelectView(ViewKind::Radial));
        assert_eq!(h.coordinator.chrome().legend, Legend::Shared);
    }

    #[test]
    fn theme_change_redraws_the_active_view_after_settling() {
        let mut h = harness();
        h.coordinator.dispatch(Event::SelectView(ViewKind::Grid));
        let before = h.coordinator.state().dataset.clone().unwrap();
        let old_markup = h.coordinator.markup(ViewKind::Grid).unwrap();

        let effects = h
            .coordinator
            .dispatch(Event::ThemeChanged(ThemeEnvironment::with_mode(ThemeMode::Dark)));
        assert_eq!(
            effects,
            vec![Effect::Schedule {
                delay_ms: 50,
                event: Event::ThemeSettled { token: 1 },
            }]
        );
        // Nothing is redrawn until the settle event arrives
        assert_eq!(h.count(ViewKind::Grid), 1);

        h.coordinator.dispatch(Event::ThemeSettled { token: 1 });
        assert_eq!(h.count(ViewKind::Grid), 2);
        assert_eq!(h.count(ViewKind::Graph), 1);
        assert!(!h.coordinator.is_rendered(ViewKind::Graph));
        assert_ne!(h.coordinator.markup(ViewKind::Grid).unwrap(), old_markup);

        let after = h.coordinator.state().dataset.clone().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(h.coordinator.generation(), 1);

        // The graph redraws lazily on the next switch
        h.coordinator.dispatch(Event::SelectView(ViewKind::Graph));
        assert_eq!(h.count(ViewKind::Graph), 2);
    }

    #[test]
    fn stale_theme_settles_are_ignored() {
        let mut h = harness();
        let dark = ThemeEnvironment::with_mode(ThemeMode::Dark);
        h.coordinator.dispatch(Event::ThemeChanged(dark.clone()));
        h.coordinator.dispatch(Event::ThemeChanged(dark));

        h.coordinator.dispatch(Event::ThemeSettled { token: 1 });
        assert_eq!(h.count(ViewKind::Graph), 1);
        h.coordinator.dispatch(Event::ThemeSettled { token: 2 });
        assert_eq!(h.count(ViewKind::Graph), 2);
    }

    #[test]
    fn theme_settle_without_a_dataset_only_updates_the_palette() {
        let spy = harness();
        let before: Vec<usize> = ViewKind::ALL
            .iter()
            .map(|kind| spy.activations[kind].get())
            .collect();
        let mut coordinator = Coordinator::new(
            Config::default(),
            Box::new(MemoryStorage::new()),
            DatasetSources {
                live: Some(Box::new(FakeNotes::failing())),
                fallback: Some(crate::sources::StaticGraph::new("/nonexistent/graph.json")),
                base_url: String::new(),
            },
            None,
            Page::full(),
            spy.coordinator.renderers,
            ThemeEnvironment::with_mode(ThemeMode::Light),
        );
        coordinator.start();
        assert!(coordinator.state().dataset.is_none());

        let dark = ThemeEnvironment::with_mode(ThemeMode::Dark);
        let effects = coordinator.dispatch(Event::ThemeChanged(dark));
        assert_eq!(effects.len(), 1);
        coordinator.dispatch(Event::ThemeSettled { token: 1 });

        assert_eq!(coordinator.state().palette.mode, ThemeMode::Dark);
        assert!(!coordinator.is_rendered(ViewKind::Graph));
        assert_eq!(coordinator.markup(ViewKind::Graph), None);
        let after: Vec<usize> = ViewKind::ALL
            .iter()
            .map(|kind| spy.activations[kind].get())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn time_preview_leaves_state_alone() {
        let mut h = harness_with(Page::full(), MemoryStorage::new(), Some(Vec::new()));
        let week = TimeFilterState::preset(TimeFilterMode::Week);

        assert!(h.coordinator.preview_time_filter(week).is_some());
        assert_eq!(h.count(ViewKind::Time), 1);
        assert!(!h.coordinator.is_rendered(ViewKind::Time));
        assert_eq!(h.coordinator.state().time_filter, TimeFilterState::default());
        assert_eq!(h.coordinator.storage.get(TIME_FILTER_KEY), None);
        assert!(!h.swaps.borrow()[1]);
    }

    #[test]
    fn time_preview_needs_a_container() {
        let page = Page {
            containers: [ViewKind::Graph].into_iter().collect(),
            current_path: None,
        };
        let mut h = harness_with(page, MemoryStorage::new(), Some(Vec::new()));
        let week = TimeFilterState::preset(TimeFilterMode::Week);
        assert_eq!(h.coordinator.preview_time_filter(week), None);
    }

    #[test]
    fn sync_complete_rebuilds_the_dataset() {
        let mut h = harness();
        h.coordinator.dispatch(Event::SelectView(ViewKind::Grid));
        h.coordinator.dispatch(Event::SyncComplete);

        assert_eq!(h.notes_reads.get(), 2);
        assert_eq!(h.coordinator.generation(), 2);
        assert_eq!(h.count(ViewKind::Grid), 2);
        assert!(!h.coordinator.is_rendered(ViewKind::Graph));
        assert_eq!(h.coordinator.handle(ViewKind::Grid).unwrap().generation, 2);
    }

    #[test]
    fn missing_container_is_a_silent_no_op() {
        let page = Page {
            containers: [ViewKind::Graph, ViewKind::Grid].into_iter().collect(),
            current_path: None,
        };
        let mut h = harness_with(page, MemoryStorage::new(), None);
        h.coordinator.dispatch(Event::SelectView(ViewKind::Radial));

        assert_eq!(h.coordinator.active(), ViewKind::Radial);
        assert_eq!(h.count(ViewKind::Radial), 0);
        assert_eq!(h.coordinator.chrome().visible, None);
        assert_eq!(h.coordinator.markup(ViewKind::Radial), None);
    }

    #[test]
    fn filter_changes_are_debounced() {
        let mut h = harness_with(Page::full(), MemoryStorage::new(), Some(Vec::new()));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Time));
        assert_eq!(h.count(ViewKind::Time), 1);

        let week = TimeFilterState::preset(TimeFilterMode::Week);
        let year = TimeFilterState::preset(TimeFilterMode::Year);
        h.coordinator.dispatch(Event::SetTimeFilter(week));
        let effects = h.coordinator.dispatch(Event::SetTimeFilter(year));
        assert_eq!(
            effects,
            vec![Effect::Schedule {
                delay_ms: 250,
                event: Event::TimeFilterSettled { token: 2 },
            }]
        );
        assert_eq!(h.coordinator.state().time_filter, year);

        h.coordinator.dispatch(Event::TimeFilterSettled { token: 1 });
        assert_eq!(h.count(ViewKind::Time), 1);
        h.coordinator.dispatch(Event::TimeFilterSettled { token: 2 });
        assert_eq!(h.count(ViewKind::Time), 2);
        assert!(*h.swaps.borrow().last().unwrap());
    }

    #[test]
    fn filter_is_persisted_immediately() {
        let mut h = harness();
        h.coordinator
            .dispatch(Event::SetTimeFilter(TimeFilterState::preset(TimeFilterMode::All)));
        assert_eq!(
            h.coordinator.storage.get(TIME_FILTER_KEY).as_deref(),
            Some("all")
        );
    }

    #[test]
    fn todos_update_refreshes_the_active_time_view() {
        let mut h = harness_with(Page::full(), MemoryStorage::new(), Some(Vec::new()));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Time));
        h.coordinator.dispatch(Event::TodosUpdated);
        assert_eq!(h.count(ViewKind::Time), 2);
    }

    #[test]
    fn todos_update_marks_an_inactive_time_view_stale() {
        let mut h = harness_with(Page::full(), MemoryStorage::new(), Some(Vec::new()));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Time));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Graph));
        h.coordinator.dispatch(Event::TodosUpdated);

        assert_eq!(h.count(ViewKind::Time), 1);
        assert!(!h.coordinator.is_rendered(ViewKind::Time));
        h.coordinator.dispatch(Event::SelectView(ViewKind::Time));
        assert_eq!(h.count(ViewKind::Time), 2);
    }

    #[test]
    fn hover_uses_the_shared_tooltip() {
        let mut h = harness();
        h.coordinator.dispatch(Event::Hover {
            target: "node".to_string(),
            pointer: (10.0, 10.0),
        });
        assert!(h.coordinator.tooltip().is_visible());
        assert_eq!(h.coordinator.tooltip().content().title, "Node");

        h.coordinator.dispatch(Event::HoverEnd);
        assert!(!h.coordinator.tooltip().is_visible());

        h.coordinator.dispatch(Event::Hover {
            target: "edge".to_string(),
            pointer: (10.0, 10.0),
        });
        assert!(!h.coordinator.tooltip().is_visible());
    }

    #[test]
    fn click_produces_navigation() {
        let mut h = harness();
        let effects = h.coordinator.dispatch(Event::Click {
            target: "node".to_string(),
            via_link: false,
        });
        assert_eq!(effects, vec![Effect::Navigate("/notes/node/".to_string())]);
        let effects = h.coordinator.dispatch(Event::Click {
            target: "background".to_string(),
            via_link: false,
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn zoom_goes_to_the_active_view_only() {
        let mut h = harness();
        h.coordinator.dispatch(Event::Zoom { factor: 1.2 });
        assert_eq!(h.zooms.get(), 1);
        assert_eq!(h.count(ViewKind::Graph), 1);
    }

    #[test]
    fn prerender_draws_every_view_once() {
        let mut h = harness();
        h.coordinator.prerender_all();
        h.coordinator.prerender_all();
        for kind in ViewKind::ALL {
            assert_eq!(h.count(kind), 1, "{kind}");
        }
        assert_eq!(h.coordinator.active(), ViewKind::Graph);
    }

    #[test]
    fn without_any_dataset_nothing_renders() {
        let renderers = crate::views::default_renderers();
        let mut coordinator = Coordinator::new(
            Config::default(),
            Box::new(MemoryStorage::new()),
            DatasetSources {
                live: Some(Box::new(FakeNotes::failing())),
                fallback: Some(crate::sources::StaticGraph::new("/nonexistent/graph.json")),
                base_url: String::new(),
            },
            None,
            Page::full(),
            renderers,
            ThemeEnvironment::default(),
        );
        coordinator.start();
        coordinator.dispatch(Event::SelectView(ViewKind::Grid));
        assert!(coordinator.state().dataset.is_none());
        assert!(!coordinator.is_rendered(ViewKind::Grid));
        assert_eq!(coordinator.markup(ViewKind::Graph), None);
    }

    #[test]
    fn view_kind_parses_case_insensitively() {
        assert_eq!(ViewKind::parse(" Radial "), Some(ViewKind::Radial));
        assert_eq!(ViewKind::parse("sunburst"), None);
        assert_eq!(ViewKind::Time.container_id(), "time-container");
    }
}
