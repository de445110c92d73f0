//! Static site writer
//!
//! Drives a [`Coordinator`] through start-up, prerenders every view and writes the
//! result as a single `index.html` next to the normalized dataset. The dataset file
//! name carries a content hash so it can be cached forever.
//!
//! Every time filter preset is rendered into an inert `<template>` so the page
//! script can switch presets without a server. Custom ranges need one, see
//! [`SiteJob::time_fragment`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use askama::Template;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::Config;
use crate::coordinator::{Coordinator, Effect, Event, Legend, Page, ViewKind};
use crate::error::{Error, Result};
use crate::model::Dataset;
use crate::sources::{DatasetSources, JsonTodosStore, TodosStore};
use crate::storage::{JsonFileStorage, MemoryStorage, Storage};
use crate::theme::{ThemeEnvironment, ThemeMode};
use crate::views::default_renderers;
use crate::views::time::filter::{TimeFilterMode, TimeFilterState};
use crate::views::time::{FADE_IN_MS, FADE_OUT_MS};

/// Hex digits of the content hash kept in the dataset file name
const FINGERPRINT_LEN: usize = 12;

/// Page-relative path the page script fetches custom time ranges from
pub const TIME_ENDPOINT: &str = "api/time";

/// Everything needed to produce one snapshot
pub struct SiteInputs {
    pub sources: DatasetSources,
    pub todos: Option<Box<dyn TodosStore>>,
    /// Client state restored before rendering and updated by `view` and `time_filter`
    pub storage: Box<dyn Storage>,
    pub theme: ThemeMode,
    /// Path of the page the snapshot is embedded in, if any
    pub current_path: Option<String>,
    /// View selected before rendering, persisted like a toggle click
    pub view: Option<ViewKind>,
    /// Time filter applied before rendering, persisted like a filter click
    pub time_filter: Option<TimeFilterState>,
}

impl SiteInputs {
    /// Inputs with throwaway client state and nothing preselected
    pub fn new(sources: DatasetSources, theme: ThemeMode) -> Self {
        Self {
            sources,
            todos: None,
            storage: Box::new(MemoryStorage::new()),
            theme,
            current_path: None,
            view: None,
            time_filter: None,
        }
    }
}

/// What was written
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub nodes: usize,
    pub edges: usize,
    pub index: PathBuf,
    /// Dataset file path relative to the output directory
    pub data_file: String,
}

struct ViewSection {
    kind: &'static str,
    label: &'static str,
    container_id: String,
    visible: bool,
    markup: String,
}

struct LegendItem {
    name: &'static str,
    color: String,
}

struct FilterButton {
    mode: &'static str,
    label: &'static str,
    pressed: bool,
}

struct TimeVariant {
    mode: &'static str,
    markup: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    theme: &'a str,
    active: &'a str,
    data_file: &'a str,
    views: Vec<ViewSection>,
    legend: Vec<LegendItem>,
    time_legend: bool,
    filters: Vec<FilterButton>,
    custom_from: String,
    custom_to: String,
    filter_debounce_ms: u64,
    fade_out_ms: u64,
    fade_in_ms: u64,
    time_endpoint: &'static str,
    time_variants: Vec<TimeVariant>,
}

/// A snapshot build described by file paths, re-runnable whenever an input changes
#[derive(Debug, Clone, PartialEq)]
pub struct SiteJob {
    /// Static graph document, or a JSON array of note records when `notes` is set
    pub input: PathBuf,
    pub notes: bool,
    /// Static graph used when the note records are unreadable or empty
    pub fallback: Option<PathBuf>,
    pub todos: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// JSON file persisting the selected view and time filter between runs
    pub state: Option<PathBuf>,
    pub theme: ThemeMode,
    pub current_path: Option<String>,
    pub view: Option<ViewKind>,
    pub time_filter: Option<TimeFilterState>,
    pub output: PathBuf,
}

impl SiteJob {
    /// A job for `input` with every option at its default
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            notes: false,
            fallback: None,
            todos: None,
            config: None,
            state: None,
            theme: ThemeMode::Light,
            current_path: None,
            view: None,
            time_filter: None,
            output: output.into(),
        }
    }

    /// Files whose changes should trigger a rebuild
    pub fn watched_files(&self) -> Vec<&Path> {
        std::iter::once(self.input.as_path())
            .chain(self.fallback.as_deref())
            .chain(self.todos.as_deref())
            .chain(self.config.as_deref())
            .collect()
    }

    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }

    pub fn inputs(&self, config: &Config) -> SiteInputs {
        let sources = DatasetSources::from_file(
            &self.input,
            self.notes,
            self.fallback.as_deref(),
            &config.site.base_url,
        );
        let storage: Box<dyn Storage> = match &self.state {
            Some(path) => Box::new(JsonFileStorage::open(path)),
            None => Box::new(MemoryStorage::new()),
        };
        SiteInputs {
            sources,
            todos: self
                .todos
                .as_ref()
                .map(|path| Box::new(JsonTodosStore::new(path)) as Box<dyn TodosStore>),
            storage,
            theme: self.theme,
            current_path: self.current_path.clone(),
            view: self.view,
            time_filter: self.time_filter,
        }
    }

    pub fn run(&self) -> Result<SiteSummary> {
        let config = self.load_config()?;
        write(&config, self.inputs(&config), &self.output)
    }

    /// Time dashboard markup for one filter, recorded in the state file like a
    /// filter change on the page
    pub fn time_fragment(&self, filter: TimeFilterState) -> Result<String> {
        let config = self.load_config()?;
        let mut inputs = self.inputs(&config);
        inputs.view = None;
        inputs.time_filter = Some(filter);
        let (mut coordinator, _) = start(&config, inputs)?;
        coordinator
            .preview_time_filter(filter)
            .ok_or_else(|| Error::Source("time dashboard is not available".to_string()))
    }
}

/// Content-addressed file name for a serialized dataset
pub fn fingerprint(json: &str) -> String {
    let digest = Sha256::digest(json.as_bytes());
    let hex = hex::encode(digest);
    format!("graph.{}.json", &hex[..FINGERPRINT_LEN])
}

fn write_dataset(dataset: &Dataset, output: &Path) -> Result<String> {
    let json = serde_json::to_string(&dataset.to_document())?;
    let name = fingerprint(&json);
    let dir = output.join("data");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(&name), json)?;
    Ok(format!("data/{name}"))
}

/// Dispatch an event and run its scheduled follow-ups straight away; a snapshot
/// has no timers to wait for
fn settle(coordinator: &mut Coordinator, event: Event) {
    let mut pending = vec![event];
    while let Some(event) = pending.pop() {
        for effect in coordinator.dispatch(event) {
            if let Effect::Schedule { event, .. } = effect {
                pending.push(event);
            }
        }
    }
}

/// Start a coordinator on the inputs and apply the requested view and filter
fn start(config: &Config, inputs: SiteInputs) -> Result<(Coordinator, Arc<Dataset>)> {
    let page = match inputs.current_path {
        Some(path) => Page::full().with_current_path(path),
        None => Page::full(),
    };
    let mut coordinator = Coordinator::new(
        config.clone(),
        inputs.storage,
        inputs.sources,
        inputs.todos,
        page,
        default_renderers(),
        ThemeEnvironment::with_mode(inputs.theme),
    );
    coordinator.start();
    let Some(dataset) = coordinator.state().dataset.clone() else {
        return Err(Error::Source("no dataset could be loaded".to_string()));
    };
    if let Some(view) = inputs.view {
        settle(&mut coordinator, Event::SelectView(view));
    }
    if let Some(filter) = inputs.time_filter {
        settle(&mut coordinator, Event::SetTimeFilter(filter));
    }
    Ok((coordinator, dataset))
}

/// Render every view and write the snapshot into `output`
pub fn write(config: &Config, inputs: SiteInputs, output: &Path) -> Result<SiteSummary> {
    let (mut coordinator, dataset) = start(config, inputs)?;
    coordinator.prerender_all();
    let time_variants = TimeFilterMode::ALL
        .into_iter()
        .filter(|m| *m != TimeFilterMode::Custom)
        .filter_map(|mode| {
            let markup = coordinator.preview_time_filter(TimeFilterState::preset(mode))?;
            Some(TimeVariant {
                mode: mode.as_str(),
                markup,
            })
        })
        .collect();

    fs::create_dir_all(output)?;
    let data_file = write_dataset(&dataset, output)?;

    let chrome = coordinator.chrome();
    let views = ViewKind::ALL
        .into_iter()
        .map(|kind| ViewSection {
            kind: kind.as_str(),
            label: kind.label(),
            container_id: kind.container_id(),
            visible: chrome.is_visible(kind),
            markup: coordinator.markup(kind).unwrap_or_default(),
        })
        .collect();

    let state = coordinator.state();
    let legend = state
        .palette
        .categories()
        .map(|(category, colors)| LegendItem {
            name: category.as_str(),
            color: colors.node.clone(),
        })
        .collect();
    let filters = TimeFilterMode::ALL
        .into_iter()
        .filter(|m| *m != TimeFilterMode::Custom)
        .map(|mode| FilterButton {
            mode: mode.as_str(),
            label: mode.label(),
            pressed: state.time_filter.mode == mode,
        })
        .collect();
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    let template = IndexTemplate {
        title: &config.site.title,
        theme: state.palette.mode.as_str(),
        active: coordinator.active().as_str(),
        data_file: &data_file,
        views,
        legend,
        time_legend: chrome.legend == Legend::Time,
        filters,
        custom_from: date(state.time_filter.custom_from),
        custom_to: date(state.time_filter.custom_to),
        filter_debounce_ms: config.time.filter_debounce_ms,
        fade_out_ms: FADE_OUT_MS,
        fade_in_ms: FADE_IN_MS,
        time_endpoint: TIME_ENDPOINT,
        time_variants,
    };
    let html = template.render()?;
    let index = output.join("index.html");
    fs::write(&index, html)?;

    info!(
        output = %output.display(),
        nodes = dataset.nodes().len(),
        data = %data_file,
        "wrote static snapshot"
    );
    Ok(SiteSummary {
        nodes: dataset.nodes().len(),
        edges: dataset.edges().len(),
        index,
        data_file,
    })
}
