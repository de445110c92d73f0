//! Dataset and todo sources
//!
//! The live notes store is preferred; when it is unavailable or returns nothing the
//! static graph document is used instead. Failures are logged and turned into
//! absence so the coordinator simply has nothing to dispatch.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{Dataset, GraphDocument, NoteRecord, Todo};
use crate::normalize;

/// External notes store
pub trait NotesStore {
    fn get_all_notes(&self) -> Result<Vec<NoteRecord>>;
}

/// External todos store
pub trait TodosStore {
    fn get_all_todos(&self) -> Result<Vec<Todo>>;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Source(format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}

/// Notes store reading a JSON array of note records
#[derive(Debug, Clone)]
pub struct JsonNotesStore {
    path: PathBuf,
}

impl JsonNotesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NotesStore for JsonNotesStore {
    fn get_all_notes(&self) -> Result<Vec<NoteRecord>> {
        read_json(&self.path)
    }
}

/// Todos store reading a JSON array of todos
#[derive(Debug, Clone)]
pub struct JsonTodosStore {
    path: PathBuf,
}

impl JsonTodosStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TodosStore for JsonTodosStore {
    fn get_all_todos(&self) -> Result<Vec<Todo>> {
        read_json(&self.path)
    }
}

/// The pre-built `{nodes, edges}` document
#[derive(Debug, Clone)]
pub struct StaticGraph {
    path: PathBuf,
}

impl StaticGraph {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn fetch(&self) -> Result<GraphDocument> {
        read_json(&self.path)
    }
}

/// Where the graph dataset comes from
#[derive(Default)]
pub struct DatasetSources {
    pub live: Option<Box<dyn NotesStore>>,
    pub fallback: Option<StaticGraph>,
    /// Prefix for navigation paths of live records
    pub base_url: String,
}

impl DatasetSources {
    /// Sources for a single input file: note records when `notes` is set, otherwise
    /// a static graph document. `fallback` names a static graph used when the note
    /// records cannot be read or are empty.
    pub fn from_file(input: &Path, notes: bool, fallback: Option<&Path>, base_url: &str) -> Self {
        if notes {
            Self {
                live: Some(Box::new(JsonNotesStore::new(input))),
                fallback: fallback.map(StaticGraph::new),
                base_url: base_url.to_string(),
            }
        } else {
            Self {
                live: None,
                fallback: Some(StaticGraph::new(input)),
                base_url: base_url.to_string(),
            }
        }
    }

    /// Load and normalize a dataset.
    ///
    /// Returns `None` only when no source produced a document at all (every source
    /// failed). An empty dataset is a valid result and lets views show their empty
    /// states.
    pub fn load(&self) -> Option<Dataset> {
        if let Some(store) = &self.live {
            match store.get_all_notes() {
                Ok(records) if !records.is_empty() => {
                    let dataset = normalize::from_notes(&records, &self.base_url);
                    info!(
                        nodes = dataset.nodes().len(),
                        edges = dataset.edges().len(),
                        "loaded dataset from live notes store"
                    );
                    return Some(dataset);
                }
                Ok(_) => info!("live notes store is empty, falling back to static graph"),
                Err(e) => warn!(
                    error = %e,
                    "live notes store unavailable, falling back to static graph"
                ),
            }
        }

        let Some(fallback) = &self.fallback else {
            return self.live.as_ref().map(|_| Dataset::default());
        };
        match fallback.fetch() {
            Ok(doc) => {
                let dataset = normalize::from_document(doc);
                info!(
                    nodes = dataset.nodes().len(),
                    edges = dataset.edges().len(),
                    "loaded dataset from static graph"
                );
                Some(dataset)
            }
            Err(e) => {
                warn!(error = %e, "failed to load static graph");
                None
            }
        }
    }
}

/// Todos as seen by the time view
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TodoSnapshot {
    /// No todos store is connected (sync not set up)
    #[default]
    Unavailable,
    Loaded(Vec<Todo>),
}

impl TodoSnapshot {
    /// Pull todos from a store. A failing store counts as unavailable.
    pub fn pull(store: Option<&dyn TodosStore>) -> Self {
        let Some(store) = store else {
            return TodoSnapshot::Unavailable;
        };
        match store.get_all_todos() {
            Ok(todos) => TodoSnapshot::Loaded(todos),
            Err(e) => {
                warn!(error = %e, "todos store unavailable");
                TodoSnapshot::Unavailable
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use tempfile::tempdir;

    fn write_static(dir: &Path) -> PathBuf {
        let path = dir.join("graph.json");
        std::fs::write(
            &path,
            r#"{"nodes":[{"id":"s1","label":"Static","path":"/s1/","category":"books","tags":[]}],"edges":[]}"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn live_store_is_preferred() {
        let dir = tempdir().unwrap();
        let sources = DatasetSources {
            live: Some(Box::new(FakeNotes::ok(vec![note("1", "Live", &[])]))),
            fallback: Some(StaticGraph::new(write_static(dir.path()))),
            base_url: String::new(),
        };
        let dataset = sources.load().unwrap();
        assert_eq!(dataset.nodes()[0].label, "Live");
    }

    #[test]
    fn empty_or_failing_live_store_falls_back_to_static() {
        let dir = tempdir().unwrap();
        for live in [FakeNotes::ok(vec![]), FakeNotes::failing()] {
            let sources = DatasetSources {
                live: Some(Box::new(live)),
                fallback: Some(StaticGraph::new(write_static(dir.path()))),
                base_url: String::new(),
            };
            let dataset = sources.load().unwrap();
            assert_eq!(dataset.nodes()[0].label, "Static");
        }
    }

    #[test]
    fn unreadable_notes_file_falls_back_to_the_given_graph() {
        let dir = tempdir().unwrap();
        let fallback = write_static(dir.path());
        let notes = dir.path().join("missing-notes.json");

        let sources = DatasetSources::from_file(&notes, true, Some(&fallback), "");
        assert_eq!(sources.load().unwrap().nodes()[0].label, "Static");

        let without = DatasetSources::from_file(&notes, true, None, "");
        assert!(without.load().unwrap().is_empty());
    }

    #[test]
    fn missing_static_file_yields_no_dataset() {
        let sources = DatasetSources {
            live: None,
            fallback: Some(StaticGraph::new("/nonexistent/graph.json")),
            base_url: String::new(),
        };
        assert!(sources.load().is_none());
    }

    #[test]
    fn malformed_static_file_yields_no_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{\"nodes\": [").unwrap();
        let sources = DatasetSources {
            live: None,
            fallback: Some(StaticGraph::new(path)),
            base_url: String::new(),
        };
        assert!(sources.load().is_none());
    }

    #[test]
    fn empty_live_store_without_fallback_is_an_empty_dataset() {
        let sources = DatasetSources {
            live: Some(Box::new(FakeNotes::ok(vec![]))),
            fallback: None,
            base_url: String::new(),
        };
        assert!(sources.load().unwrap().is_empty());
    }

    #[test]
    fn todo_snapshot_without_store_is_unavailable() {
        assert_eq!(TodoSnapshot::pull(None), TodoSnapshot::Unavailable);
        let store = FakeTodos(vec![]);
        assert_eq!(
            TodoSnapshot::pull(Some(&store)),
            TodoSnapshot::Loaded(vec![])
        );
    }
}
