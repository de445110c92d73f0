//! SVG backend for [`Scene`]
//!
//! Entrance animations from a [`Schedule`] are emitted as CSS animation classes with
//! per-element delay and duration; the keyframes live in the page stylesheet.
//! An angular sweep cannot be expressed as a keyframe, so sweeps are written as
//! `data-sweep-*` attributes and played by the page script as a growing clip wedge
//! around the element's origin.

use std::fmt::Write;

use crate::scene::{Animation, Element, Scene, Schedule, Shape, Style, Tween};

/// Serialize a scene, optionally annotated with its entrance schedule
pub fn render(scene: &Scene, schedule: Option<&Schedule>) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">",
        escape_xml(&scene.id),
        scene.width,
        scene.height,
        scene.width,
        scene.height
    );
    if let Some(background) = &scene.background {
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(background)
        );
    }
    for element in &scene.elements {
        render_element(&mut svg, element, schedule);
    }
    svg.push_str("</svg>");
    svg
}

fn render_element(svg: &mut String, element: &Element, schedule: Option<&Schedule>) {
    let attrs = common_attributes(element, schedule);
    match &element.shape {
        Shape::Circle { cx, cy, r } => {
            let _ = write!(svg, "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\"{attrs}/>");
        }
        Shape::Line { x1, y1, x2, y2 } => {
            let _ = write!(
                svg,
                "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\"{attrs}/>"
            );
        }
        Shape::Rect {
            x,
            y,
            width,
            height,
            rx,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{rx:.2}\"{attrs}/>"
            );
        }
        Shape::Path { d } => {
            let _ = write!(svg, "<path d=\"{}\"{attrs}/>", escape_xml(d));
        }
        Shape::Text {
            x,
            y,
            content,
            anchor,
        } => {
            let _ = write!(
                svg,
                "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{}\" dominant-baseline=\"middle\"{attrs}>{}</text>",
                anchor.as_str(),
                escape_xml(content)
            );
        }
        Shape::Group => {
            let _ = write!(svg, "<g{attrs}>");
        }
        Shape::GroupEnd => svg.push_str("</g>"),
    }
}

fn common_attributes(element: &Element, schedule: Option<&Schedule>) -> String {
    let mut out = String::new();
    if !element.id.is_empty() {
        let _ = write!(out, " id=\"{}\"", escape_xml(&element.id));
    }

    let animation = schedule.and_then(|s| s.get(&element.id));
    let mut classes: Vec<String> = element.class.iter().cloned().collect();
    if let Some(animation) = animation {
        classes.push(animation_class(&animation.tween).to_string());
    }
    if !classes.is_empty() {
        let _ = write!(out, " class=\"{}\"", escape_xml(&classes.join(" ")));
    }

    style_attributes(&mut out, &element.style);

    for (key, value) in &element.data {
        let _ = write!(out, " data-{}=\"{}\"", key, escape_xml(value));
    }

    match animation {
        Some(Animation {
            tween: Tween::Sweep { from, to },
            delay_ms,
            duration_ms,
            easing,
            ..
        }) => {
            let _ = write!(
                out,
                " data-sweep-from=\"{from:.4}\" data-sweep-to=\"{to:.4}\" data-sweep-delay=\"{delay_ms}\" data-sweep-duration=\"{duration_ms}\" data-sweep-easing=\"{}\"",
                easing.name()
            );
        }
        Some(animation) => {
            let _ = write!(
                out,
                " style=\"animation-delay:{}ms;animation-duration:{}ms;animation-timing-function:{}\"",
                animation.delay_ms,
                animation.duration_ms,
                animation.easing.css()
            );
        }
        None => {}
    }
    out
}

fn style_attributes(out: &mut String, style: &Style) {
    if let Some(fill) = &style.fill {
        let _ = write!(out, " fill=\"{}\"", escape_xml(fill));
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(out, " stroke=\"{}\"", escape_xml(stroke));
    }
    if let Some(width) = style.stroke_width {
        let _ = write!(out, " stroke-width=\"{width:.2}\"");
    }
    if let Some(dash) = &style.dash {
        let _ = write!(out, " stroke-dasharray=\"{}\"", escape_xml(dash));
    }
    if let Some(opacity) = style.opacity {
        let _ = write!(out, " opacity=\"{opacity:.2}\"");
    }
    if let Some(opacity) = style.fill_opacity {
        let _ = write!(out, " fill-opacity=\"{opacity:.2}\"");
    }
    if let Some(size) = style.font_size {
        let _ = write!(out, " font-size=\"{size:.1}\"");
    }
    if let Some(weight) = style.font_weight {
        let _ = write!(out, " font-weight=\"{weight}\"");
    }
    if let Some(filter) = &style.filter {
        let _ = write!(out, " filter=\"{}\"", escape_xml(filter));
    }
    if let Some(transform) = &style.transform {
        let _ = write!(out, " transform=\"{}\"", escape_xml(transform));
    }
}

fn animation_class(tween: &Tween) -> &'static str {
    match tween {
        Tween::ScaleIn => "anim-scale-in",
        Tween::FadeIn => "anim-fade-in",
        Tween::Sweep { .. } => "anim-sweep",
        Tween::FadeOut => "anim-fade-out",
        Tween::Grow { .. } => "anim-grow",
        Tween::SlideIn { .. } => "anim-slide-in",
    }
}

/// Escape text for use in XML/HTML content and attribute values
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
