//! Canonical data model shared by every view
//!
//! All external records (static graph documents, live note records) are converted
//! into [`Node`] and [`Edge`] by the normalizer before any renderer sees them.
//! Renderers only ever borrow a [`Dataset`]; presentation state such as positions
//! and radii lives in the view layouts, never on the canonical node.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Node identifier, unique per session
pub type NodeId = String;

/// Identifier on the wire. Stores disagree on whether ids are strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Category a note belongs to, derived from its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Books,
    Topics,
    Inbox,
    Snippets,
    #[serde(other)]
    Default,
}

impl Category {
    /// Every category, in legend order
    pub const ALL: [Category; 5] = [
        Category::Books,
        Category::Topics,
        Category::Inbox,
        Category::Snippets,
        Category::Default,
    ];

    /// Map a note's `destination` field to a category. Unrecognized values map to `Default`.
    pub fn from_destination(destination: &str) -> Self {
        match destination.trim().to_ascii_lowercase().as_str() {
            "books" => Category::Books,
            "topics" => Category::Topics,
            "inbox" => Category::Inbox,
            "snippets" => Category::Snippets,
            _ => Category::Default,
        }
    }

    /// Lowercase name used in markup, tooltips and CSS custom properties
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Books => "books",
            Category::Topics => "topics",
            Category::Inbox => "inbox",
            Category::Snippets => "snippets",
            Category::Default => "default",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How two notes are related
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The notes share at least one tag
    Tag,
    /// One note links to the other
    Backlink,
}

/// A note in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(deserialize_with = "text_or_number")]
    pub id: NodeId,
    pub label: String,
    /// Navigation target for the note
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Number of edges touching this node, recomputed on every normalization
    #[serde(default)]
    pub number_neighbours: usize,
}

fn default_category() -> Category {
    Category::Default
}

/// An undirected relation between two notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(deserialize_with = "text_or_number")]
    pub source: NodeId,
    #[serde(deserialize_with = "text_or_number")]
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    /// Canonical `min|max` key used to collapse parallel edges
    pub fn dedup_key(a: &str, b: &str) -> String {
        if a <= b {
            format!("{a}|{b}")
        } else {
            format!("{b}|{a}")
        }
    }

    /// Whether this edge touches the given node
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    /// The endpoint opposite to `id`, if the edge touches it
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Raw `{nodes, edges}` document as produced by the static-site pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A normalized, frozen dataset snapshot
///
/// Only the normalizer can build one; once constructed it is shared read-only
/// (usually behind an `Arc`) by every renderer for a whole render cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl Dataset {
    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a node in [`Dataset::nodes`]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Serializable copy in the static document shape
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

/// A note as supplied by the live notes store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Timestamp as stored by the todos store: epoch milliseconds or a date string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(f64),
    Text(String),
}

impl Timestamp {
    /// Resolve to a local date-time. Returns `None` for anything unparseable.
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        match self {
            Timestamp::Millis(ms) => {
                if !ms.is_finite() {
                    return None;
                }
                Local.timestamp_millis_opt(*ms as i64).single()
            }
            Timestamp::Text(s) => parse_timestamp_text(s.trim()),
        }
    }
}

fn parse_timestamp_text(s: &str) -> Option<DateTime<Local>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local.from_local_datetime(&naive).earliest();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Local.from_local_datetime(&naive).earliest();
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
}

/// A todo as supplied by the todos store (read-only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub estimated_min: Option<f64>,
    #[serde(default)]
    pub actual_min: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Todo {
    /// The timestamp used for range filtering: completion, else last update, else creation
    pub fn reference_timestamp(&self) -> Option<&Timestamp> {
        self.completed_at
            .as_ref()
            .or(self.updated_at.as_ref())
            .or(self.created_at.as_ref())
    }
}
