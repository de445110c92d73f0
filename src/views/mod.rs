//! View renderers
//!
//! Each renderer turns the shared dataset (or the todos, for the time view) into a
//! [`ViewHandle`]. The handle owns the view's presentation state behind the
//! [`Surface`] trait; interaction goes through the surface and never touches the
//! dataset.

pub mod graph;
pub mod grid;
pub mod radial;
pub mod time;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::coordinator::ViewKind;
use crate::model::Dataset;
use crate::scene::Schedule;
use crate::sources::TodoSnapshot;
use crate::theme::Palette;
use crate::tooltip::TooltipContent;
use crate::views::time::filter::TimeFilterState;

/// Everything a renderer may read during one activation
pub struct RenderContext<'a> {
    pub dataset: &'a Dataset,
    pub palette: &'a Palette,
    pub config: &'a Config,
    /// Path of the page currently displayed, used to mark the current note
    pub current_path: Option<&'a str>,
    pub todos: &'a TodoSnapshot,
    pub time_filter: &'a TimeFilterState,
    pub now: DateTime<Local>,
    /// Set when the time dashboard is being swapped after a filter change
    pub swap: bool,
    /// Dataset generation the context was built from
    pub generation: u64,
}

/// Presentation state of an activated view
pub trait Surface {
    /// HTML or SVG markup for the current presentation state
    fn markup(&self) -> String;

    /// Entrance animations computed at activation
    fn schedule(&self) -> &Schedule;

    /// Pointer entered an element. Returns tooltip content when the element is interactive.
    fn hover(&mut self, _target: &str) -> Option<TooltipContent> {
        None
    }

    /// Pointer left the hovered element
    fn hover_end(&mut self) {}

    /// Navigation target for a click, if any
    fn click(&self, _target: &str, _via_link: bool) -> Option<String> {
        None
    }

    /// The drawing surface changed size; layout is not recomputed
    fn resize(&mut self, _width: f64, _height: f64) {}

    fn zoom(&mut self, _factor: f64) {}

    fn pan(&mut self, _dx: f64, _dy: f64) {}
}

/// Result of one renderer activation
pub struct ViewHandle {
    pub kind: ViewKind,
    /// Dataset generation the view was rendered from
    pub generation: u64,
    pub surface: Box<dyn Surface>,
}

impl ViewHandle {
    pub fn new(kind: ViewKind, ctx: &RenderContext<'_>, surface: impl Surface + 'static) -> Self {
        Self {
            kind,
            generation: ctx.generation,
            surface: Box::new(surface),
        }
    }
}

/// A view renderer
pub trait Renderer {
    fn kind(&self) -> ViewKind;

    /// Compute layout and presentation for the context's dataset snapshot
    fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle;

    /// Release a handle produced by [`Renderer::activate`]
    fn teardown(&mut self, handle: ViewHandle) {
        drop(handle);
    }
}

/// The built-in renderer for each view
pub fn default_renderers() -> Vec<Box<dyn Renderer>> {
    vec![
        Box::new(graph::GraphRenderer),
        Box::new(grid::GridRenderer),
        Box::new(radial::RadialRenderer),
        Box::new(time::TimeRenderer),
    ]
}

/// Markup shown in place of a view that has nothing to draw
pub(crate) fn empty_state_markup(class: &str, message: &str) -> String {
    format!(
        "<div class=\"empty-state {}\"><p>{}</p></div>",
        crate::svg::escape_xml(class),
        crate::svg::escape_xml(message)
    )
}

/// Surface for a view with nothing to draw
pub(crate) struct EmptySurface {
    markup: String,
    schedule: Schedule,
}

impl EmptySurface {
    pub(crate) fn new(class: &str, message: &str) -> Self {
        Self {
            markup: empty_state_markup(class, message),
            schedule: Schedule::new(),
        }
    }
}

impl Surface for EmptySurface {
    fn markup(&self) -> String {
        self.markup.clone()
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}
