//! Configuration file handling
//!
//! The configuration is an optional YAML file. Every field has a default, so a
//! missing file, an empty file or a partial file all produce a usable [`Config`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coordinator::ViewKind;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub viewport: Viewport,
    pub graph: GraphConfig,
    pub radial: RadialConfig,
    pub time: TimeConfig,
    /// Delay after a theme attribute change before re-rendering (ms)
    pub theme_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            viewport: Viewport::default(),
            graph: GraphConfig::default(),
            radial: RadialConfig::default(),
            time: TimeConfig::default(),
            theme_settle_ms: 50,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(Error::Config(
                "viewport width and height must be positive".to_string(),
            ));
        }
        if self.graph.zoom_min <= 0.0 || self.graph.zoom_min > self.graph.zoom_max {
            return Err(Error::Config(
                "graph zoom range must satisfy 0 < zoom_min <= zoom_max".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    /// Prefix for navigation paths built from live note records
    pub base_url: String,
    /// View shown when nothing is persisted yet
    pub default_view: ViewKind,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Knowledge Graph".to_string(),
            base_url: String::new(),
            default_view: ViewKind::Graph,
        }
    }
}

/// Drawing surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
        }
    }
}

/// Force layout, zoom and animation settings for the graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Many-body strength (negative = repulsion)
    pub charge: f64,
    /// Rest length of every link
    pub link_distance: f64,
    /// Strength of the x/y centering forces
    pub center_strength: f64,
    /// Extra separation added to the node radii by the collision force
    pub collision_padding: f64,
    /// Number of simulation steps run before the layout is frozen
    pub ticks: usize,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Padding kept around the graph when fitting it to the viewport
    pub fit_padding: f64,
    /// Largest zoom-in the auto-fit may choose
    pub fit_max_scale: f64,
    /// Radius multiplier for the hovered node
    pub hover_scale: f64,
    /// Opacity of nodes and labels outside the hovered neighbourhood
    pub dim_opacity: f64,
    pub node_stagger_ms: u64,
    pub label_offset_ms: u64,
    pub edge_offset_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            charge: -220.0,
            link_distance: 70.0,
            center_strength: 0.05,
            collision_padding: 4.0,
            ticks: 300,
            zoom_min: 0.2,
            zoom_max: 4.0,
            fit_padding: 40.0,
            fit_max_scale: 1.4,
            hover_scale: 1.5,
            dim_opacity: 0.15,
            node_stagger_ms: 15,
            label_offset_ms: 200,
            edge_offset_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    /// Angular padding between sibling arcs (radians)
    pub pad_angle: f64,
    /// Smallest angular span (radians) that still gets an item label
    pub min_label_span: f64,
    pub category_opacity: f64,
    pub item_opacity: f64,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            pad_angle: 0.005,
            min_label_span: 0.15,
            category_opacity: 0.6,
            item_opacity: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Quiet period before a filter change re-renders the dashboard (ms)
    pub filter_debounce_ms: u64,
    pub bar_stagger_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            filter_debounce_ms: 250,
            bar_stagger_ms: 80,
        }
    }
}
