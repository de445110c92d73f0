//! Card grid view
//!
//! One card per node in dataset order. There is no layout algorithm; the browser
//! flows the cards.

use askama::Template;
use tracing::warn;

use crate::coordinator::ViewKind;
use crate::model::Dataset;
use crate::scene::{Easing, Schedule, Tween};
use crate::theme::Palette;
use crate::tooltip::pluralize;
use crate::views::{EmptySurface, RenderContext, Renderer, Surface, ViewHandle};

/// Tags shown on a card before the "+N more" indicator
pub const MAX_CARD_TAGS: usize = 5;
const CARD_STAGGER_MS: u64 = 30;
const CARD_ENTER_MS: u64 = 300;
const CARD_SLIDE_PX: f64 = 12.0;

/// Presentation data for one card
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub element_id: String,
    pub label: String,
    pub path: String,
    pub category: &'static str,
    pub color: String,
    /// Pluralized neighbour count
    pub neighbours: String,
    /// At most [`MAX_CARD_TAGS`] tags
    pub tags: Vec<String>,
    /// Tags left out of `tags`
    pub more: usize,
    pub delay_ms: u64,
    pub duration_ms: u64,
}

#[derive(Template)]
#[template(path = "views/grid.html")]
struct GridTemplate<'a> {
    cards: &'a [Card],
}

fn card_element_id(i: usize) -> String {
    format!("grid-card-{i}")
}

fn card_index(target: &str) -> Option<usize> {
    target.strip_prefix("grid-card-")?.parse().ok()
}

/// Build the cards for a dataset
pub fn cards(dataset: &Dataset, palette: &Palette) -> Vec<Card> {
    dataset
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| Card {
            element_id: card_element_id(i),
            label: node.label.clone(),
            path: node.path.clone(),
            category: node.category.as_str(),
            color: palette.category(node.category).node.clone(),
            neighbours: pluralize(node.number_neighbours, "neighbour", "neighbours"),
            tags: node.tags.iter().take(MAX_CARD_TAGS).cloned().collect(),
            more: node.tags.len().saturating_sub(MAX_CARD_TAGS),
            delay_ms: i as u64 * CARD_STAGGER_MS,
            duration_ms: CARD_ENTER_MS,
        })
        .collect()
}

/// Activated grid view
pub struct GridSurface {
    markup: String,
    schedule: Schedule,
    paths: Vec<String>,
}

impl GridSurface {
    pub fn new(cards: &[Card]) -> crate::Result<Self> {
        let markup = GridTemplate { cards }.render()?;
        let mut schedule = Schedule::new();
        for card in cards {
            schedule.push(
                card.element_id.clone(),
                Tween::SlideIn {
                    offset: CARD_SLIDE_PX,
                },
                card.delay_ms,
                card.duration_ms,
                Easing::CubicOut,
            );
        }
        Ok(Self {
            markup,
            schedule,
            paths: cards.iter().map(|c| c.path.clone()).collect(),
        })
    }
}

impl Surface for GridSurface {
    fn markup(&self) -> String {
        self.markup.clone()
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// A click on the card body navigates; a click on the title link is left to the link.
    fn click(&self, target: &str, via_link: bool) -> Option<String> {
        if via_link {
            return None;
        }
        let path = self.paths.get(card_index(target)?)?;
        (!path.is_empty()).then(|| path.clone())
    }
}

/// Renderer for the card grid
#[derive(Debug, Default)]
pub struct GridRenderer;

impl Renderer for GridRenderer {
    fn kind(&self) -> ViewKind {
        ViewKind::Grid
    }

    fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle {
        if ctx.dataset.is_empty() {
            let empty = EmptySurface::new("grid-empty", "No notes to display yet.");
            return ViewHandle::new(ViewKind::Grid, ctx, empty);
        }
        match GridSurface::new(&cards(ctx.dataset, ctx.palette)) {
            Ok(surface) => ViewHandle::new(ViewKind::Grid, ctx, surface),
            Err(e) => {
                warn!(error = %e, "failed to render grid cards");
                let empty = EmptySurface::new("grid-empty", "The card grid could not be drawn.");
                ViewHandle::new(ViewKind::Grid, ctx, empty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, GraphDocument};
    use crate::normalize;
    use crate::theme::{self, ThemeEnvironment, ThemeMode};
    use crate::views::testing::{node, sample_dataset};

    fn palette() -> Palette {
        theme::resolve(&ThemeEnvironment::with_mode(ThemeMode::Dark))
    }

    #[test]
    fn one_card_per_node_in_order() {
        let cards = cards(&sample_dataset(), &palette());
        let labels: Vec<_> = cards.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Note a", "Note b", "Note c", "Note d"]);
        assert_eq!(cards[1].neighbours, "2 neighbours");
        assert_eq!(cards[0].neighbours, "1 neighbour");
        assert_eq!(cards[2].delay_ms, 2 * CARD_STAGGER_MS);
    }

    #[test]
    fn long_tag_lists_are_truncated() {
        let dataset = normalize::from_document(GraphDocument {
            nodes: vec![node(
                "t",
                Category::Snippets,
                &["a", "b", "c", "d", "e", "f", "g"],
            )],
            edges: vec![],
        });
        let cards = cards(&dataset, &palette());
        assert_eq!(cards[0].tags.len(), MAX_CARD_TAGS);
        assert_eq!(cards[0].more, 2);

        let surface = GridSurface::new(&cards).unwrap();
        assert!(surface.markup().contains("+2 more"));
    }

    #[test]
    fn markup_escapes_labels() {
        let mut n = node("x", Category::Topics, &[]);
        n.label = "<script>".to_string();
        let dataset = normalize::from_document(GraphDocument {
            nodes: vec![n],
            edges: vec![],
        });
        let surface = GridSurface::new(&cards(&dataset, &palette())).unwrap();
        assert!(!surface.markup().contains("<script>"));
        assert!(surface.markup().contains("&lt;script&gt;"));
    }

    #[test]
    fn card_click_navigates_unless_on_the_link() {
        let surface = GridSurface::new(&cards(&sample_dataset(), &palette())).unwrap();
        assert_eq!(
            surface.click("grid-card-3", false).as_deref(),
            Some("/notes/d/")
        );
        assert_eq!(surface.click("grid-card-3", true), None);
        assert_eq!(surface.click("grid-card-9", false), None);
    }

    #[test]
    fn cards_slide_in_staggered() {
        let surface = GridSurface::new(&cards(&sample_dataset(), &palette())).unwrap();
        let delays: Vec<_> = surface
            .schedule()
            .entries()
            .iter()
            .map(|a| a.delay_ms)
            .collect();
        assert_eq!(delays, vec![0, 30, 60, 90]);
        assert!(matches!(
            surface.schedule().entries()[0].tween,
            Tween::SlideIn { .. }
        ));
    }
}
