//! Radial hierarchy ("sunburst") view
//!
//! Three levels: a synthetic root in the middle, one ring segment per category and
//! one outer segment per note. Angular spans come from a partition of the full
//! circle by weight, where a note weighs `max(1, neighbours + 1)`.

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use tracing::debug;

use crate::config::RadialConfig;
use crate::coordinator::ViewKind;
use crate::model::{Category, Dataset};
use crate::scene::{Easing, Element, Patch, Scene, Schedule, Shape, Style, TextAnchor, Tween};
use crate::svg;
use crate::theme::Palette;
use crate::tooltip::{TooltipContent, pluralize};
use crate::views::{EmptySurface, RenderContext, Renderer, Surface, ViewHandle};

const MARGIN: f64 = 10.0;
const SWEEP_MS: u64 = 750;
/// Delay between the category ring and the item ring
const DEPTH_STAGGER_MS: u64 = 300;
const LABEL_DELAY_MS: u64 = 600;
const HOVER_MS: u64 = 150;
const MAX_TOOLTIP_TAGS: usize = 4;
/// Approximate glyph width used to fit labels into their arc
const GLYPH_WIDTH: f64 = 6.5;

/// One partitioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct RadialArc {
    pub name: String,
    pub category: Category,
    /// 1 for categories, 2 for notes
    pub depth: u8,
    pub value: f64,
    pub start: f64,
    pub end: f64,
    pub inner: f64,
    pub outer: f64,
    /// Number of notes, for category segments
    pub children: usize,
    pub tags: Vec<String>,
    pub path: String,
}

impl RadialArc {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn mid_angle(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn mid_radius(&self) -> f64 {
        (self.inner + self.outer) / 2.0
    }
}

/// Weight of a note in the partition
pub fn leaf_weight(neighbours: usize) -> f64 {
    (neighbours as f64 + 1.0).max(1.0)
}

/// Partition the full circle over categories and notes.
///
/// Categories are ordered by total weight (largest first, ties by name); notes keep
/// dataset order within equal weights. Each ring is a third of `radius`; the
/// innermost third belongs to the root.
pub fn partition(dataset: &Dataset, radius: f64) -> Vec<RadialArc> {
    let mut groups: BTreeMap<&'static str, (Category, Vec<usize>)> = BTreeMap::new();
    for (i, node) in dataset.nodes().iter().enumerate() {
        groups
            .entry(node.category.as_str())
            .or_insert_with(|| (node.category, Vec::new()))
            .1
            .push(i);
    }

    let nodes = dataset.nodes();
    let weight = |i: usize| leaf_weight(nodes[i].number_neighbours);
    let mut groups: Vec<(&str, Category, Vec<usize>, f64)> = groups
        .into_iter()
        .map(|(name, (category, mut members))| {
            members.sort_by(|&a, &b| weight(b).total_cmp(&weight(a)));
            let value = members.iter().map(|&i| weight(i)).sum();
            (name, category, members, value)
        })
        .collect();
    groups.sort_by(|a, b| b.3.total_cmp(&a.3).then_with(|| a.0.cmp(b.0)));

    let total: f64 = groups.iter().map(|g| g.3).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let ring = radius / 3.0;
    let mut arcs = Vec::new();
    let mut angle = 0.0;

    for (name, category, members, value) in groups {
        let span = TAU * value / total;
        arcs.push(RadialArc {
            name: name.to_string(),
            category,
            depth: 1,
            value,
            start: angle,
            end: angle + span,
            inner: ring,
            outer: 2.0 * ring,
            children: members.len(),
            tags: Vec::new(),
            path: String::new(),
        });

        let mut leaf_angle = angle;
        for i in members {
            let node = &nodes[i];
            let leaf_span = TAU * weight(i) / total;
            arcs.push(RadialArc {
                name: node.label.clone(),
                category,
                depth: 2,
                value: weight(i),
                start: leaf_angle,
                end: leaf_angle + leaf_span,
                inner: 2.0 * ring,
                outer: radius,
                children: 0,
                tags: node.tags.clone(),
                path: node.path.clone(),
            });
            leaf_angle += leaf_span;
        }
        angle += span;
    }
    arcs
}

fn polar(r: f64, angle: f64) -> (f64, f64) {
    (r * angle.sin(), -r * angle.cos())
}

/// SVG path for an annular sector; angles run clockwise from 12 o'clock.
///
/// `pad` is removed from the span, half at each end, while leaving at least a
/// hairline.
pub fn arc_path(start: f64, end: f64, inner: f64, outer: f64, pad: f64) -> String {
    let span = end - start;
    if span >= TAU - 1e-9 {
        // A full ring cannot be drawn with a single arc command
        let mut d = format!(
            "M0,{:.3}A{outer:.3},{outer:.3} 0 1 1 0,{outer:.3}A{outer:.3},{outer:.3} 0 1 1 0,{:.3}Z",
            -outer, -outer
        );
        if inner > 0.0 {
            d.push_str(&format!(
                "M0,{:.3}A{inner:.3},{inner:.3} 0 1 0 0,{inner:.3}A{inner:.3},{inner:.3} 0 1 0 0,{:.3}Z",
                -inner, -inner
            ));
        }
        return d;
    }

    let shrink = (pad / 2.0).min(span * 0.25);
    let (a0, a1) = (start + shrink, end - shrink);
    let large = if a1 - a0 > PI { 1 } else { 0 };
    let (ox0, oy0) = polar(outer, a0);
    let (ox1, oy1) = polar(outer, a1);
    let mut d = format!(
        "M{ox0:.3},{oy0:.3}A{outer:.3},{outer:.3} 0 {large} 1 {ox1:.3},{oy1:.3}"
    );
    if inner > 0.0 {
        let (ix1, iy1) = polar(inner, a1);
        let (ix0, iy0) = polar(inner, a0);
        d.push_str(&format!(
            "L{ix1:.3},{iy1:.3}A{inner:.3},{inner:.3} 0 {large} 0 {ix0:.3},{iy0:.3}Z"
        ));
    } else {
        d.push_str("L0,0Z");
    }
    d
}

/// Label rotation in degrees for a segment centered on `mid_angle` radians.
///
/// Follows the arc tangent, turned half a circle where the text would otherwise
/// read upside-down.
pub fn label_rotation(mid_angle: f64) -> f64 {
    let degrees = mid_angle.to_degrees().rem_euclid(360.0);
    if degrees > 90.0 && degrees < 270.0 {
        (degrees + 180.0).rem_euclid(360.0)
    } else {
        degrees
    }
}

fn fit_label(label: &str, arc: &RadialArc) -> String {
    let room = (arc.span() * arc.mid_radius() / GLYPH_WIDTH).floor().max(1.0) as usize;
    let count = label.chars().count();
    if count <= room {
        label.to_string()
    } else {
        let keep: String = label.chars().take(room.saturating_sub(1)).collect();
        format!("{keep}\u{2026}")
    }
}

fn arc_element_id(i: usize) -> String {
    format!("radial-arc-{i}")
}

fn arc_index(target: &str) -> Option<usize> {
    target.strip_prefix("radial-arc-")?.parse().ok()
}

fn arc_tooltip(arc: &RadialArc) -> TooltipContent {
    let content = TooltipContent::new(&arc.name).line(arc.category.as_str());
    if arc.depth == 1 {
        return content.line(pluralize(arc.children, "note", "notes"));
    }
    let tags: Vec<&str> = arc
        .tags
        .iter()
        .take(MAX_TOOLTIP_TAGS)
        .map(String::as_str)
        .collect();
    if tags.is_empty() {
        content
    } else {
        content.line(tags.join(", "))
    }
}

fn build_scene(
    arcs: &[RadialArc],
    width: f64,
    height: f64,
    palette: &Palette,
    config: &RadialConfig,
    note_count: usize,
) -> (Scene, Schedule) {
    let mut scene = Scene::new("radial-svg", width, height);
    let mut schedule = Schedule::new();
    let ring = arcs.first().map(|a| a.inner).unwrap_or_default();

    scene.push(Element::group(
        "radial-root",
        Style {
            transform: Some(center_transform(width, height)),
            ..Default::default()
        },
    ));

    for (i, arc) in arcs.iter().enumerate() {
        let colors = palette.category(arc.category);
        let opacity = if arc.depth == 1 {
            config.category_opacity
        } else {
            config.item_opacity
        };
        let mut element = Element::new(
            arc_element_id(i),
            Shape::Path {
                d: arc_path(arc.start, arc.end, arc.inner, arc.outer, config.pad_angle),
            },
            Style {
                fill: Some(colors.node.clone()),
                stroke: Some(palette.background.clone()),
                stroke_width: Some(1.0),
                opacity: Some(opacity),
                ..Default::default()
            },
        )
        .with_class(if arc.depth == 1 {
            "radial-arc radial-category"
        } else {
            "radial-arc radial-item"
        })
        .with_data("depth", arc.depth.to_string())
        .with_data("tooltip", arc_tooltip(arc).to_text());
        if arc.depth == 2 && !arc.path.is_empty() {
            element = element.with_data("path", arc.path.clone());
        }
        scene.push(element);

        let delay = (arc.depth as u64 - 1) * DEPTH_STAGGER_MS;
        schedule.push(
            arc_element_id(i),
            Tween::Sweep {
                from: arc.start,
                to: arc.end,
            },
            delay,
            SWEEP_MS,
            Easing::CubicOut,
        );
    }

    for (i, arc) in arcs.iter().enumerate() {
        let show = match arc.depth {
            1 => arc.span() > config.pad_angle,
            _ => arc.span() > config.min_label_span,
        };
        if !show {
            continue;
        }
        let (x, y) = polar(arc.mid_radius(), arc.mid_angle());
        let id = format!("radial-label-{i}");
        scene.push(
            Element::new(
                id.clone(),
                Shape::Text {
                    x,
                    y,
                    content: fit_label(&arc.name, arc),
                    anchor: TextAnchor::Middle,
                },
                Style {
                    fill: Some(palette.text.clone()),
                    font_size: Some(if arc.depth == 1 { 12.0 } else { 10.0 }),
                    font_weight: (arc.depth == 1).then_some("600"),
                    transform: Some(format!(
                        "rotate({:.2} {x:.2} {y:.2})",
                        label_rotation(arc.mid_angle())
                    )),
                    ..Default::default()
                },
            )
            .with_class("radial-label"),
        );
        schedule.push(
            id,
            Tween::FadeIn,
            (arc.depth as u64 - 1) * DEPTH_STAGGER_MS + LABEL_DELAY_MS,
            SWEEP_MS / 2,
            Easing::Linear,
        );
    }

    scene.push(
        Element::new(
            "radial-center",
            Shape::Circle {
                cx: 0.0,
                cy: 0.0,
                r: (ring - 2.0).max(0.0),
            },
            Style {
                fill: Some(palette.background.clone()),
                ..Default::default()
            },
        )
        .with_class("radial-center"),
    );
    scene.push(
        Element::new(
            "radial-count",
            Shape::Text {
                x: 0.0,
                y: -8.0,
                content: note_count.to_string(),
                anchor: TextAnchor::Middle,
            },
            Style {
                fill: Some(palette.text.clone()),
                font_size: Some(28.0),
                font_weight: Some("bold"),
                ..Default::default()
            },
        )
        .with_class("radial-count"),
    );
    scene.push(
        Element::new(
            "radial-caption",
            Shape::Text {
                x: 0.0,
                y: 16.0,
                content: "notes".to_string(),
                anchor: TextAnchor::Middle,
            },
            Style {
                fill: Some(palette.text_muted.clone()),
                font_size: Some(12.0),
                ..Default::default()
            },
        )
        .with_class("radial-caption"),
    );
    scene.push(Element::group_end());

    (scene, schedule)
}

fn center_transform(width: f64, height: f64) -> String {
    format!("translate({:.2},{:.2})", width / 2.0, height / 2.0)
}

/// Activated radial view
pub struct RadialSurface {
    scene: Scene,
    schedule: Schedule,
    arcs: Vec<RadialArc>,
    hovered: Option<usize>,
}

impl RadialSurface {
    pub fn arcs(&self) -> &[RadialArc] {
        &self.arcs
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Surface for RadialSurface {
    fn markup(&self) -> String {
        svg::render(&self.scene, Some(&self.schedule))
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn hover(&mut self, target: &str) -> Option<TooltipContent> {
        let index = arc_index(target)?;
        let arc = self.arcs.get(index)?;
        let content = arc_tooltip(arc);

        let mut patches = Vec::new();
        if let Some(previous) = self.hovered.filter(|&p| p != index) {
            patches.push(Patch::reset(arc_element_id(previous), HOVER_MS));
        }
        let mut patch = Patch::reset(arc_element_id(index), HOVER_MS);
        patch.filter = Some(Some("brightness(1.2)".to_string()));
        patch.opacity = Some(1.0);
        patches.push(patch);
        self.scene.apply(&patches);
        self.hovered = Some(index);
        Some(content)
    }

    fn hover_end(&mut self) {
        if let Some(index) = self.hovered.take() {
            self.scene
                .apply(&[Patch::reset(arc_element_id(index), HOVER_MS)]);
        }
    }

    fn click(&self, target: &str, _via_link: bool) -> Option<String> {
        let arc = self.arcs.get(arc_index(target)?)?;
        (arc.depth == 2 && !arc.path.is_empty()).then(|| arc.path.clone())
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.scene.width = width;
        self.scene.height = height;
        if let Some(root) = self.scene.element_mut("radial-root") {
            root.style.transform = Some(center_transform(width, height));
            root.base_style.transform = root.style.transform.clone();
        }
    }
}

/// Renderer for the radial hierarchy
#[derive(Debug, Default)]
pub struct RadialRenderer;

impl RadialRenderer {
    pub fn build(ctx: &RenderContext<'_>) -> RadialSurface {
        let viewport = ctx.config.viewport;
        let radius = (viewport.width.min(viewport.height) / 2.0 - MARGIN).max(1.0);
        let arcs = partition(ctx.dataset, radius);
        let (scene, schedule) = build_scene(
            &arcs,
            viewport.width,
            viewport.height,
            ctx.palette,
            &ctx.config.radial,
            ctx.dataset.nodes().len(),
        );
        debug!(arcs = arcs.len(), radius, "radial partition computed");
        RadialSurface {
            scene,
            schedule,
            arcs,
            hovered: None,
        }
    }
}

impl Renderer for RadialRenderer {
    fn kind(&self) -> ViewKind {
        ViewKind::Radial
    }

    fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle {
        if ctx.dataset.is_empty() {
            let empty = EmptySurface::new("radial-empty", "No notes to display yet.");
            return ViewHandle::new(ViewKind::Radial, ctx, empty);
        }
        ViewHandle::new(ViewKind::Radial, ctx, Self::build(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::GraphDocument;
    use crate::normalize;
    use crate::sources::TodoSnapshot;
    use crate::theme::{self, ThemeEnvironment, ThemeMode};
    use crate::views::testing::{node, sample_dataset};
    use crate::views::time::filter::TimeFilterState;
    use chrono::Local;

    fn build(dataset: &Dataset) -> RadialSurface {
        let palette = theme::resolve(&ThemeEnvironment::with_mode(ThemeMode::Light));
        let config = Config::default();
        let ctx = RenderContext {
            dataset,
            palette: &palette,
            config: &config,
            current_path: None,
            todos: &TodoSnapshot::Unavailable,
            time_filter: &TimeFilterState::default(),
            now: Local::now(),
            swap: false,
            generation: 1,
        };
        RadialRenderer::build(&ctx)
    }

    #[test]
    fn leaf_weight_is_at_least_one() {
        assert_eq!(leaf_weight(0), 1.0);
        assert_eq!(leaf_weight(4), 5.0);
    }

    #[test]
    fn categories_are_ordered_by_weight_and_cover_the_circle() {
        // weights: a=2 (books), b=3 and c=2 (topics), d=1 (inbox)
        let arcs = partition(&sample_dataset(), 300.0);
        let categories: Vec<_> = arcs.iter().filter(|a| a.depth == 1).collect();
        let names: Vec<_> = categories.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["topics", "books", "inbox"]);

        assert_eq!(categories[0].start, 0.0);
        assert!((categories[2].end - TAU).abs() < 1e-9);
        assert!((categories[0].span() - TAU * 5.0 / 8.0).abs() < 1e-9);
        assert_eq!(categories[0].children, 2);
    }

    #[test]
    fn leaves_nest_inside_their_category() {
        let arcs = partition(&sample_dataset(), 300.0);
        let topics = &arcs[0];
        let leaves: Vec<_> = arcs[1..3].iter().collect();
        assert!(leaves.iter().all(|l| l.depth == 2 && l.category == Category::Topics));
        assert_eq!(leaves[0].name, "Note b");
        assert!((leaves[0].start - topics.start).abs() < 1e-9);
        assert!((leaves[1].end - topics.end).abs() < 1e-9);
        assert_eq!(leaves[0].inner, 200.0);
        assert_eq!(leaves[0].outer, 300.0);
        assert_eq!(topics.inner, 100.0);
    }

    #[test]
    fn labels_never_render_upside_down() {
        assert_eq!(label_rotation(0.0), 0.0);
        assert!((label_rotation(PI / 4.0) - 45.0).abs() < 1e-9);
        assert!((label_rotation(PI) - 0.0).abs() < 1e-9);
        assert!((label_rotation(PI * 1.25) - 45.0).abs() < 1e-9);
        assert!((label_rotation(PI * 1.75) - 315.0).abs() < 1e-9);
    }

    #[test]
    fn arc_path_uses_large_arc_flag_for_wide_segments() {
        let narrow = arc_path(0.0, 1.0, 10.0, 20.0, 0.0);
        let wide = arc_path(0.0, 4.0, 10.0, 20.0, 0.0);
        assert!(narrow.contains(" 0 0 1 "));
        assert!(wide.contains(" 0 1 1 "));
    }

    #[test]
    fn single_category_draws_a_full_ring() {
        let d = arc_path(0.0, TAU, 10.0, 20.0, 0.0);
        assert!(d.starts_with("M0,-20.000"));
        assert_eq!(d.matches('Z').count(), 2);
    }

    #[test]
    fn narrow_items_have_no_label() {
        let mut nodes = vec![node("hub", Category::Topics, &[])];
        for i in 0..60 {
            nodes.push(node(&format!("n{i}"), Category::Books, &[]));
        }
        let dataset = normalize::from_document(GraphDocument {
            nodes,
            edges: vec![],
        });
        let surface = build(&dataset);
        let item_labels = surface
            .scene()
            .elements
            .iter()
            .filter(|e| e.id.starts_with("radial-label-"))
            .filter(|e| e.style.font_size == Some(10.0))
            .count();
        // every item spans 2*pi/61, below the label threshold
        assert_eq!(item_labels, 0);
    }

    #[test]
    fn center_shows_note_count() {
        let surface = build(&sample_dataset());
        let count = surface.scene().element("radial-count").unwrap();
        assert!(matches!(&count.shape, Shape::Text { content, .. } if content == "4"));
        assert!(surface.markup().contains(">notes</text>"));
    }

    #[test]
    fn categories_sweep_before_items() {
        let surface = build(&sample_dataset());
        let schedule = surface.schedule();
        let category = schedule.get("radial-arc-0").unwrap();
        let item = schedule.get("radial-arc-1").unwrap();
        assert!(category.delay_ms < item.delay_ms);
        assert!(matches!(category.tween, Tween::Sweep { from, .. } if from == 0.0));
    }

    #[test]
    fn arcs_carry_their_sweep_in_the_markup() {
        let surface = build(&sample_dataset());
        let markup = surface.markup();
        assert!(markup.contains("class=\"radial-arc radial-category anim-sweep\""));
        assert!(markup.contains("data-sweep-from=\"0.0000\""));
        assert!(markup.contains(&format!("data-sweep-delay=\"{DEPTH_STAGGER_MS}\"")));
        assert!(!markup.contains("radial-item anim-fade-in"));
    }

    #[test]
    fn hover_brightens_and_describes_segments() {
        let mut surface = build(&sample_dataset());

        let tooltip = surface.hover("radial-arc-0").unwrap();
        assert_eq!(tooltip.lines, vec!["topics", "2 notes"]);
        let arc = surface.scene().element("radial-arc-0").unwrap();
        assert_eq!(arc.style.filter.as_deref(), Some("brightness(1.2)"));

        let tooltip = surface.hover("radial-arc-1").unwrap();
        assert_eq!(tooltip.title, "Note b");
        assert_eq!(tooltip.lines, vec!["topics", "rust"]);
        let previous = surface.scene().element("radial-arc-0").unwrap();
        assert_eq!(previous.style, previous.base_style);

        surface.hover_end();
        let arc = surface.scene().element("radial-arc-1").unwrap();
        assert_eq!(arc.style, arc.base_style);
    }

    #[test]
    fn only_leaves_are_clickable() {
        let surface = build(&sample_dataset());
        assert_eq!(surface.click("radial-arc-0", false), None);
        assert_eq!(
            surface.click("radial-arc-1", false).as_deref(),
            Some("/notes/b/")
        );
    }
}
