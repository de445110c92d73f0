//! Force-directed graph view
//!
//! Nodes are laid out by a fixed number of force-simulation steps, fitted into the
//! viewport and drawn as edges, then nodes, then labels. Hovering a node focuses its
//! neighbourhood; zoom and pan only move the camera.

pub mod camera;
pub mod simulation;

use tracing::debug;

use crate::config::GraphConfig;
use crate::coordinator::ViewKind;
use crate::model::{Dataset, EdgeKind};
use crate::scene::{Easing, Element, Patch, Scene, Schedule, Shape, Style, TextAnchor, Tween};
use crate::svg;
use crate::theme::Palette;
use crate::tooltip::{TooltipContent, pluralize};
use crate::views::{EmptySurface, RenderContext, Renderer, Surface, ViewHandle};

use camera::{BoundingBox, Camera2D};
use simulation::{CpuSimulation, SimEdge, SimulationConfig};

const MIN_RADIUS: f64 = 8.0;
const MAX_RADIUS: f64 = 32.0;
const NODE_ENTER_MS: u64 = 400;
const LABEL_ENTER_MS: u64 = 300;
const EDGE_ENTER_MS: u64 = 400;
const HOVER_MS: u64 = 200;
const LABEL_GAP: f64 = 12.0;

/// Node radius for a neighbour count: `clamp(8 * sqrt(n + 1), 8, 32)`
pub fn node_radius(neighbours: usize) -> f64 {
    (MIN_RADIUS * ((neighbours + 1) as f64).sqrt()).clamp(MIN_RADIUS, MAX_RADIUS)
}

fn trim_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Whether a node path refers to the page being displayed, ignoring a trailing slash
pub fn is_current_path(node_path: &str, current: &str) -> bool {
    !node_path.is_empty() && trim_slash(node_path) == trim_slash(current)
}

/// Positions and derived lookup tables, computed once per activation
#[derive(Debug, Clone)]
pub struct GraphLayout {
    pub positions: Vec<(f64, f64)>,
    pub radii: Vec<f64>,
    /// Index of the node for the current page. At most one node is current.
    pub current: Option<usize>,
    /// `(source, target, kind)` by node index, in dataset edge order
    pub edges: Vec<(usize, usize, EdgeKind)>,
    /// Sorted neighbour indices per node
    pub adjacency: Vec<Vec<usize>>,
}

impl GraphLayout {
    pub fn compute(ctx: &RenderContext<'_>) -> Self {
        let dataset = ctx.dataset;
        let radii: Vec<f64> = dataset
            .nodes()
            .iter()
            .map(|n| node_radius(n.number_neighbours))
            .collect();
        let edges = indexed_edges(dataset);

        let mut adjacency = vec![Vec::new(); radii.len()];
        for &(s, t, _) in &edges {
            adjacency[s].push(t);
            adjacency[t].push(s);
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        let current = ctx.current_path.and_then(|current| {
            dataset
                .nodes()
                .iter()
                .position(|n| is_current_path(&n.path, current))
        });

        let mut sim = CpuSimulation::new(
            &radii,
            edges
                .iter()
                .map(|&(source, target, _)| SimEdge { source, target })
                .collect(),
            SimulationConfig::for_graph(&ctx.config.graph, &ctx.config.viewport),
        );
        sim.run(ctx.config.graph.ticks);

        Self {
            positions: sim.positions(),
            radii,
            current,
            edges,
            adjacency,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for (&(x, y), &r) in self.positions.iter().zip(&self.radii) {
            bounds.include_circle(x, y, r + LABEL_GAP);
        }
        bounds
    }
}

fn indexed_edges(dataset: &Dataset) -> Vec<(usize, usize, EdgeKind)> {
    dataset
        .edges()
        .iter()
        .filter_map(|e| {
            let s = dataset.index_of(&e.source)?;
            let t = dataset.index_of(&e.target)?;
            Some((s, t, e.kind))
        })
        .collect()
}

/// Entrance animations: nodes scale in staggered by index, each label follows its
/// node, and edges fade in once every node has started.
pub fn entrance_schedule(node_count: usize, edge_count: usize, config: &GraphConfig) -> Schedule {
    let mut schedule = Schedule::new();
    for i in 0..node_count {
        let delay = i as u64 * config.node_stagger_ms;
        schedule.push(
            node_element_id(i),
            Tween::ScaleIn,
            delay,
            NODE_ENTER_MS,
            Easing::BackOut,
        );
        schedule.push(
            label_element_id(i),
            Tween::FadeIn,
            delay + config.label_offset_ms,
            LABEL_ENTER_MS,
            Easing::CubicOut,
        );
    }
    let edge_delay = node_count as u64 * config.node_stagger_ms + config.edge_offset_ms;
    for i in 0..edge_count {
        schedule.push(
            edge_element_id(i),
            Tween::FadeIn,
            edge_delay,
            EDGE_ENTER_MS,
            Easing::Linear,
        );
    }
    schedule
}

fn node_element_id(i: usize) -> String {
    format!("graph-node-{i}")
}

fn label_element_id(i: usize) -> String {
    format!("graph-label-{i}")
}

fn edge_element_id(i: usize) -> String {
    format!("graph-edge-{i}")
}

fn node_index(target: &str) -> Option<usize> {
    target.strip_prefix("graph-node-")?.parse().ok()
}

fn edge_style(kind: EdgeKind, palette: &Palette) -> Style {
    let (width, dash) = match kind {
        EdgeKind::Tag => (1.0, Some("4 4".to_string())),
        EdgeKind::Backlink => (2.0, None),
    };
    Style {
        stroke: Some(palette.edge.clone()),
        stroke_width: Some(width),
        dash,
        opacity: Some(0.6),
        ..Default::default()
    }
}

/// Tooltip text for a node: label, category, tags and neighbour count
fn node_tooltip(dataset: &Dataset, index: usize) -> Option<TooltipContent> {
    let node = dataset.nodes().get(index)?;
    let mut content = TooltipContent::new(&node.label).line(node.category.as_str());
    if !node.tags.is_empty() {
        content = content.line(node.tags.join(", "));
    }
    Some(content.line(pluralize(
        node.number_neighbours,
        "neighbour",
        "neighbours",
    )))
}

/// Camera state mirrored as `data-*` so the page can zoom and pan without a rebuild
fn camera_data(camera: &Camera2D) -> [(&'static str, String); 5] {
    let (tx, ty) = camera.translation();
    [
        ("tx", format!("{tx:.2}")),
        ("ty", format!("{ty:.2}")),
        ("scale", format!("{:.4}", camera.scale)),
        ("zoom-min", camera.min_scale.to_string()),
        ("zoom-max", camera.max_scale.to_string()),
    ]
}

fn build_scene(ctx: &RenderContext<'_>, layout: &GraphLayout, camera: &Camera2D) -> Scene {
    let palette = ctx.palette;
    let config = &ctx.config.graph;
    let nodes = ctx.dataset.nodes();
    let mut scene = Scene::new("graph-svg", camera.width, camera.height);

    let mut viewport = Element::group(
        "graph-viewport",
        Style {
            transform: Some(camera.transform()),
            ..Default::default()
        },
    )
    .with_class("graph-viewport")
    .with_data("dim-opacity", config.dim_opacity.to_string())
    .with_data("hover-scale", config.hover_scale.to_string())
    .with_data("edge-hover", palette.edge_hover.clone())
    .with_data("edge-dimmed", palette.edge_dimmed.clone());
    for (key, value) in camera_data(camera) {
        viewport = viewport.with_data(key, value);
    }
    scene.push(viewport);

    scene.push(Element::group("graph-edges", Style::default()));
    for (i, &(s, t, kind)) in layout.edges.iter().enumerate() {
        let (x1, y1) = layout.positions[s];
        let (x2, y2) = layout.positions[t];
        scene.push(
            Element::new(
                edge_element_id(i),
                Shape::Line { x1, y1, x2, y2 },
                edge_style(kind, palette),
            )
            .with_class(format!("graph-edge edge-{}", edge_kind_name(kind)))
            .with_data("source", s.to_string())
            .with_data("target", t.to_string()),
        );
    }
    scene.push(Element::group_end());

    scene.push(Element::group("graph-nodes", Style::default()));
    for (i, node) in nodes.iter().enumerate() {
        let (cx, cy) = layout.positions[i];
        let colors = palette.category(node.category);
        let current = layout.current == Some(i);
        let style = if current {
            Style {
                fill: Some(colors.glow.clone()),
                stroke: Some(palette.edge_hover.clone()),
                stroke_width: Some(3.0),
                opacity: Some(1.0),
                filter: Some(format!("drop-shadow(0 0 6px {})", colors.glow)),
                ..Default::default()
            }
        } else {
            Style {
                fill: Some(colors.node.clone()),
                stroke: Some(palette.background.clone()),
                stroke_width: Some(1.5),
                opacity: Some(1.0),
                ..Default::default()
            }
        };
        let neighbours = layout.adjacency[i]
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let tooltip = node_tooltip(ctx.dataset, i)
            .map(|c| c.to_text())
            .unwrap_or_default();
        let class = if current {
            "graph-node current"
        } else {
            "graph-node"
        };
        scene.push(
            Element::new(
                node_element_id(i),
                Shape::Circle {
                    cx,
                    cy,
                    r: layout.radii[i],
                },
                style,
            )
            .with_class(class)
            .with_data("index", i.to_string())
            .with_data("path", node.path.clone())
            .with_data("neighbours", neighbours)
            .with_data("tooltip", tooltip),
        );
    }
    scene.push(Element::group_end());

    scene.push(Element::group("graph-labels", Style::default()));
    for (i, node) in nodes.iter().enumerate() {
        let (x, y) = layout.positions[i];
        scene.push(
            Element::new(
                label_element_id(i),
                Shape::Text {
                    x,
                    y: y + layout.radii[i] + LABEL_GAP,
                    content: node.label.clone(),
                    anchor: TextAnchor::Middle,
                },
                Style {
                    fill: Some(palette.label.clone()),
                    font_size: Some(11.0),
                    font_weight: (layout.current == Some(i)).then_some("bold"),
                    opacity: Some(1.0),
                    ..Default::default()
                },
            )
            .with_class("graph-label"),
        );
    }
    scene.push(Element::group_end());

    scene.push(Element::group_end());
    scene
}

fn edge_kind_name(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Tag => "tag",
        EdgeKind::Backlink => "backlink",
    }
}

/// Activated graph view
pub struct GraphSurface {
    scene: Scene,
    schedule: Schedule,
    layout: GraphLayout,
    camera: Camera2D,
    tooltips: Vec<Option<TooltipContent>>,
    paths: Vec<String>,
    edge_hover: String,
    edge_dimmed: String,
    hover_scale: f64,
    dim_opacity: f64,
    hovered: Option<usize>,
}

impl GraphSurface {
    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    fn focus_patches(&self, index: usize) -> Vec<Patch> {
        let neighbours = &self.layout.adjacency[index];
        let in_focus = |j: usize| j == index || neighbours.binary_search(&j).is_ok();
        let mut patches = Vec::new();

        for j in 0..self.layout.positions.len() {
            let opacity = if in_focus(j) { 1.0 } else { self.dim_opacity };

            let mut node = Patch::reset(node_element_id(j), HOVER_MS);
            node.opacity = Some(opacity);
            if j == index {
                node.radius = Some(self.layout.radii[j] * self.hover_scale);
            }
            patches.push(node);

            let mut label = Patch::reset(label_element_id(j), HOVER_MS);
            label.opacity = Some(opacity);
            patches.push(label);
        }

        for (i, &(s, t, _)) in self.layout.edges.iter().enumerate() {
            let mut edge = Patch::reset(edge_element_id(i), HOVER_MS);
            if s == index || t == index {
                edge.stroke = Some(self.edge_hover.clone());
                edge.opacity = Some(1.0);
            } else {
                edge.stroke = Some(self.edge_dimmed.clone());
                edge.opacity = Some(self.dim_opacity);
            }
            patches.push(edge);
        }
        patches
    }

    fn reset_patches(&self) -> Vec<Patch> {
        let nodes = (0..self.layout.positions.len())
            .flat_map(|j| [node_element_id(j), label_element_id(j)]);
        let edges = (0..self.layout.edges.len()).map(edge_element_id);
        nodes
            .chain(edges)
            .map(|id| Patch::reset(id, HOVER_MS))
            .collect()
    }

    fn apply_camera(&mut self) {
        let transform = self.camera.transform();
        let mut patch = Patch::new("graph-viewport", 0);
        patch.transform = Some(Some(transform.clone()));
        self.scene.apply(&[patch]);
        if let Some(viewport) = self.scene.element_mut("graph-viewport") {
            viewport.base_style.transform = Some(transform);
            for (key, value) in camera_data(&self.camera) {
                viewport.data.insert(key.to_string(), value);
            }
        }
    }
}

impl Surface for GraphSurface {
    fn markup(&self) -> String {
        svg::render(&self.scene, Some(&self.schedule))
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn hover(&mut self, target: &str) -> Option<TooltipContent> {
        let index = node_index(target)?;
        let content = self.tooltips.get(index)?.clone()?;
        let patches = self.focus_patches(index);
        self.scene.apply(&patches);
        self.hovered = Some(index);
        Some(content)
    }

    fn hover_end(&mut self) {
        if self.hovered.take().is_some() {
            let patches = self.reset_patches();
            self.scene.apply(&patches);
        }
    }

    fn click(&self, target: &str, _via_link: bool) -> Option<String> {
        let path = self.paths.get(node_index(target)?)?;
        (!path.is_empty()).then(|| path.clone())
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.camera.resize(width, height);
        self.scene.width = width;
        self.scene.height = height;
        self.apply_camera();
    }

    fn zoom(&mut self, factor: f64) {
        self.camera.zoom(factor);
        self.apply_camera();
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
        self.apply_camera();
    }
}

/// Renderer for the force-directed graph
#[derive(Debug, Default)]
pub struct GraphRenderer;

impl GraphRenderer {
    pub fn build(ctx: &RenderContext<'_>) -> GraphSurface {
        let config = &ctx.config.graph;
        let layout = GraphLayout::compute(ctx);

        let mut camera = Camera2D::new(
            ctx.config.viewport.width,
            ctx.config.viewport.height,
            config.zoom_min,
            config.zoom_max,
        );
        camera.fit_to_bounds(&layout.bounds(), config.fit_padding, config.fit_max_scale);

        let scene = build_scene(ctx, &layout, &camera);
        let schedule = entrance_schedule(layout.positions.len(), layout.edges.len(), config);
        debug!(
            nodes = layout.positions.len(),
            edges = layout.edges.len(),
            scale = camera.scale,
            "graph layout computed"
        );

        GraphSurface {
            tooltips: (0..layout.positions.len())
                .map(|i| node_tooltip(ctx.dataset, i))
                .collect(),
            paths: ctx.dataset.nodes().iter().map(|n| n.path.clone()).collect(),
            edge_hover: ctx.palette.edge_hover.clone(),
            edge_dimmed: ctx.palette.edge_dimmed.clone(),
            hover_scale: config.hover_scale,
            dim_opacity: config.dim_opacity,
            hovered: None,
            scene,
            schedule,
            layout,
            camera,
        }
    }
}

impl Renderer for GraphRenderer {
    fn kind(&self) -> ViewKind {
        ViewKind::Graph
    }

    fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle {
        if ctx.dataset.is_empty() {
            let empty = EmptySurface::new("graph-empty", "No notes to display yet.");
            return ViewHandle::new(ViewKind::Graph, ctx, empty);
        }
        ViewHandle::new(ViewKind::Graph, ctx, Self::build(ctx))
    }
}
