//! Theme resolution
//!
//! Derives a [`Palette`] from the current document theme. The palette is resolved
//! afresh on every view activation because the underlying custom properties may
//! have changed since the last one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Category;

/// Light or dark mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

/// What the page currently says about its theme
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeEnvironment {
    /// Explicit `data-theme` attribute on the document, if any
    pub attribute: Option<String>,
    /// Operating-system dark mode preference
    pub prefers_dark: bool,
    /// Current values of the page's CSS custom properties (`--name` → value)
    pub custom_properties: HashMap<String, String>,
}

impl ThemeEnvironment {
    /// Environment with an explicit theme attribute
    pub fn with_mode(mode: ThemeMode) -> Self {
        Self {
            attribute: Some(mode.as_str().to_string()),
            ..Default::default()
        }
    }

    /// The explicit attribute wins; otherwise the OS preference decides.
    pub fn mode(&self) -> ThemeMode {
        self.attribute
            .as_deref()
            .and_then(ThemeMode::parse)
            .unwrap_or(if self.prefers_dark {
                ThemeMode::Dark
            } else {
                ThemeMode::Light
            })
    }

    fn property(&self, name: &str) -> Option<&str> {
        self.custom_properties
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Node fill and glow for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryColors {
    pub node: String,
    pub glow: String,
}

/// Frozen color table for one render activation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    pub mode: ThemeMode,
    categories: Vec<(Category, CategoryColors)>,
    pub edge: String,
    pub edge_hover: String,
    pub edge_dimmed: String,
    pub label: String,
    pub background: String,
    pub text: String,
    pub text_muted: String,
}

impl Palette {
    /// Colors for a category
    pub fn category(&self, category: Category) -> &CategoryColors {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .or_else(|| self.categories.iter().find(|(c, _)| *c == Category::Default))
            .map(|(_, colors)| colors)
            .unwrap_or(&self.categories[0].1)
    }

    /// Category colors in legend order
    pub fn categories(&self) -> impl Iterator<Item = (Category, &CategoryColors)> {
        self.categories.iter().map(|(c, colors)| (*c, colors))
    }
}

fn default_category_color(category: Category, mode: ThemeMode) -> (&'static str, &'static str) {
    match (category, mode) {
        (Category::Books, ThemeMode::Light) => ("#d97706", "rgba(217, 119, 6, 0.35)"),
        (Category::Books, ThemeMode::Dark) => ("#fbbf24", "rgba(251, 191, 36, 0.45)"),
        (Category::Topics, ThemeMode::Light) => ("#2563eb", "rgba(37, 99, 235, 0.35)"),
        (Category::Topics, ThemeMode::Dark) => ("#60a5fa", "rgba(96, 165, 250, 0.45)"),
        (Category::Inbox, ThemeMode::Light) => ("#059669", "rgba(5, 150, 105, 0.35)"),
        (Category::Inbox, ThemeMode::Dark) => ("#34d399", "rgba(52, 211, 153, 0.45)"),
        (Category::Snippets, ThemeMode::Light) => ("#7c3aed", "rgba(124, 58, 237, 0.35)"),
        (Category::Snippets, ThemeMode::Dark) => ("#a78bfa", "rgba(167, 139, 250, 0.45)"),
        (Category::Default, ThemeMode::Light) => ("#64748b", "rgba(100, 116, 139, 0.35)"),
        (Category::Default, ThemeMode::Dark) => ("#94a3b8", "rgba(148, 163, 184, 0.45)"),
    }
}

/// Resolve the palette for the current environment.
///
/// Custom properties override the built-in colors; anything unset falls back to the
/// defaults for the active mode.
pub fn resolve(env: &ThemeEnvironment) -> Palette {
    let mode = env.mode();
    let pick = |name: &str, light: &str, dark: &str| -> String {
        env.property(name)
            .map(str::to_string)
            .unwrap_or_else(|| match mode {
                ThemeMode::Light => light.to_string(),
                ThemeMode::Dark => dark.to_string(),
            })
    };

    let categories = Category::ALL
        .iter()
        .map(|&category| {
            let (node, glow) = default_category_color(category, mode);
            let colors = CategoryColors {
                node: env
                    .property(&format!("--graph-{}", category.as_str()))
                    .unwrap_or(node)
                    .to_string(),
                glow: env
                    .property(&format!("--graph-{}-glow", category.as_str()))
                    .unwrap_or(glow)
                    .to_string(),
            };
            (category, colors)
        })
        .collect();

    Palette {
        mode,
        categories,
        edge: pick("--graph-edge", "#cbd5e1", "#475569"),
        edge_hover: pick("--graph-edge-hover", "#f59e0b", "#fbbf24"),
        edge_dimmed: pick("--graph-edge-dimmed", "#e2e8f0", "#1e293b"),
        label: pick("--graph-label", "#334155", "#e2e8f0"),
        background: pick("--bg", "#ffffff", "#0f172a"),
        text: pick("--text", "#0f172a", "#f1f5f9"),
        text_muted: pick("--text-muted", "#64748b", "#94a3b8"),
    }
}
