//! Backend-independent display list
//!
//! Renderers describe their output as a [`Scene`]: an ordered list of shapes with
//! presentation styles, plus a [`Schedule`] of entrance animations. Interaction never
//! rebuilds a scene; it produces [`Patch`]es that change presentation state only.
//! The SVG backend lives in [`crate::svg`].

use std::collections::BTreeMap;

/// Geometry of a scene element
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { cx: f64, cy: f64, r: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64, rx: f64 },
    Path { d: String },
    Text {
        x: f64,
        y: f64,
        content: String,
        anchor: TextAnchor,
    },
    /// Opens a group; every following element until the matching [`Shape::GroupEnd`] belongs to it
    Group,
    GroupEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Presentation attributes. `None` means "inherit / backend default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub dash: Option<String>,
    pub opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
    pub font_size: Option<f64>,
    pub font_weight: Option<&'static str>,
    pub filter: Option<String>,
    pub transform: Option<String>,
}

/// One drawable element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub class: Option<String>,
    pub shape: Shape,
    pub style: Style,
    /// Style the element returns to when interaction ends
    pub base_style: Style,
    /// Base geometry radius for circles, restored on hover end
    pub base_radius: Option<f64>,
    /// Extra `data-*` attributes
    pub data: BTreeMap<String, String>,
}

impl Element {
    pub fn new(id: impl Into<String>, shape: Shape, style: Style) -> Self {
        let base_radius = match &shape {
            Shape::Circle { r, .. } => Some(*r),
            _ => None,
        };
        Self {
            id: id.into(),
            class: None,
            shape,
            base_style: style.clone(),
            style,
            base_radius,
            data: BTreeMap::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn group(id: impl Into<String>, style: Style) -> Self {
        Self::new(id, Shape::Group, style)
    }

    pub fn group_end() -> Self {
        Self::new(String::new(), Shape::GroupEnd, Style::default())
    }
}

/// Easing curves understood by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    CubicOut,
    /// Overshoots the target slightly before settling
    BackOut,
}

impl Easing {
    /// Evaluate the curve at `t` in `[0, 1]`
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::BackOut => {
                let s = 1.70158;
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
        }
    }

    /// Equivalent CSS timing function
    /// Short name for script-driven tweens that cannot use a CSS timing function
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::CubicOut => "cubic-out",
            Easing::BackOut => "back-out",
        }
    }

    pub fn css(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::CubicOut => "cubic-bezier(0.33, 1, 0.68, 1)",
            Easing::BackOut => "cubic-bezier(0.34, 1.56, 0.64, 1)",
        }
    }
}

/// What an animation changes
#[derive(Debug, Clone, PartialEq)]
pub enum Tween {
    /// Uniform scale from 0 to 1
    ScaleIn,
    FadeIn,
    FadeOut,
    /// Arc end angle sweeping from its start angle to its final value
    Sweep { from: f64, to: f64 },
    /// Bar height growing from the baseline
    Grow { from: f64, to: f64 },
    /// Slide up by `offset` pixels while fading in
    SlideIn { offset: f64 },
}

/// One entry of a declarative animation schedule
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub element: String,
    pub tween: Tween,
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Animation {
    pub fn end_ms(&self) -> u64 {
        self.delay_ms + self.duration_ms
    }
}

/// Animations computed once per activation, independent of any timer system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    entries: Vec<Animation>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        element: impl Into<String>,
        tween: Tween,
        delay_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) {
        self.entries.push(Animation {
            element: element.into(),
            tween,
            delay_ms,
            duration_ms,
            easing,
        });
    }

    pub fn entries(&self) -> &[Animation] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Animation for an element, if it has one
    pub fn get(&self, element: &str) -> Option<&Animation> {
        self.entries.iter().find(|a| a.element == element)
    }

    /// Shift every entry later by `offset_ms`
    pub fn delayed(mut self, offset_ms: u64) -> Self {
        for entry in &mut self.entries {
            entry.delay_ms += offset_ms;
        }
        self
    }

    /// Append another schedule after this one
    pub fn extend(&mut self, other: Schedule) {
        self.entries.extend(other.entries);
    }

    /// Time at which the last animation finishes
    pub fn total_ms(&self) -> u64 {
        self.entries.iter().map(Animation::end_ms).max().unwrap_or(0)
    }
}

/// A presentation change applied to one element by interaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub element: String,
    pub opacity: Option<f64>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub radius: Option<f64>,
    pub filter: Option<Option<String>>,
    pub transform: Option<Option<String>>,
    pub font_weight: Option<&'static str>,
    /// Restore the element's base style and geometry before applying the fields above
    pub reset: bool,
    pub duration_ms: u64,
}

impl Patch {
    pub fn new(element: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            element: element.into(),
            duration_ms,
            ..Default::default()
        }
    }

    pub fn reset(element: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            reset: true,
            ..Self::new(element, duration_ms)
        }
    }
}

/// A complete drawing for one view
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub background: Option<String>,
    pub elements: Vec<Element>,
}

impl Scene {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            background: None,
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Position of an element in drawing order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Apply interaction patches. Unknown element ids are ignored.
    pub fn apply(&mut self, patches: &[Patch]) {
        for patch in patches {
            let Some(element) = self.element_mut(&patch.element) else {
                continue;
            };
            if patch.reset {
                element.style = element.base_style.clone();
                if let (Shape::Circle { r, .. }, Some(base)) =
                    (&mut element.shape, element.base_radius)
                {
                    *r = base;
                }
            }
            if let Some(opacity) = patch.opacity {
                element.style.opacity = Some(opacity);
            }
            if let Some(stroke) = &patch.stroke {
                element.style.stroke = Some(stroke.clone());
            }
            if let Some(width) = patch.stroke_width {
                element.style.stroke_width = Some(width);
            }
            if let Some(filter) = &patch.filter {
                element.style.filter = filter.clone();
            }
            if let Some(transform) = &patch.transform {
                element.style.transform = transform.clone();
            }
            if let Some(weight) = patch.font_weight {
                element.style.font_weight = Some(weight);
            }
            if let (Some(radius), Shape::Circle { r, .. }) = (patch.radius, &mut element.shape) {
                *r = radius;
            }
        }
    }
}
