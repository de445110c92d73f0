//! notegraph - Multi-view knowledge graph renderer for a personal notes application.
//!
//! A single dataset of notes and their tag/backlink relations is presented as a
//! force-directed graph, a card grid and a radial sunburst; completed todos feed a
//! time analytics dashboard. The [`coordinator`] owns view switching, theme changes
//! and data refreshes; [`site`] writes a static snapshot of every view.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod normalize;
pub mod scene;
pub mod server;
pub mod site;
pub mod sources;
pub mod storage;
pub mod svg;
pub mod theme;
pub mod tooltip;
pub mod views;

pub use error::{Error, Result};
