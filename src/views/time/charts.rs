//! Donut and grouped bar charts for the time dashboard

use crate::scene::{Easing, Element, Patch, Scene, Schedule, Shape, Style, TextAnchor, Tween};
use crate::tooltip::{TooltipContent, pluralize};
use crate::views::radial::arc_path;

use super::aggregate::Aggregation;

/// Tableau 10, cycled by category index
pub const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

pub fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

const DONUT_SWEEP_MS: u64 = 800;
const SLICE_HOVER_OFFSET: f64 = 6.0;
const HOVER_MS: u64 = 150;
const BAR_GROW_MS: u64 = 600;
/// Fraction of headroom above the largest bar
const Y_HEADROOM: f64 = 1.15;
const BAND_PADDING: f64 = 0.2;

fn minutes(value: f64) -> String {
    format!("{} min", format_number(value))
}

/// Whole numbers without a fractional part, everything else with one decimal
pub fn format_number(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// One donut segment
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub name: String,
    pub actual: f64,
    pub percent: f64,
    pub count: usize,
    pub start: f64,
    pub end: f64,
}

impl Slice {
    /// Translation that pushes the slice outward along its centroid direction
    pub fn hover_offset(&self) -> (f64, f64) {
        let mid = (self.start + self.end) / 2.0;
        (SLICE_HOVER_OFFSET * mid.sin(), -SLICE_HOVER_OFFSET * mid.cos())
    }

    fn tooltip(&self) -> TooltipContent {
        TooltipContent::new(&self.name)
            .line(minutes(self.actual))
            .line(format!("{:.1}%", self.percent))
            .line(pluralize(self.count, "task", "tasks"))
    }
}

fn slice_element_id(i: usize) -> String {
    format!("time-slice-{i}")
}

/// Donut chart of actual minutes per category
pub struct DonutChart {
    pub scene: Scene,
    pub schedule: Schedule,
    pub slices: Vec<Slice>,
    hovered: Option<usize>,
}

impl DonutChart {
    pub fn build(aggregation: &Aggregation, size: f64, text_color: &str) -> Self {
        let total = aggregation.summary.actual;
        let outer = size / 2.0 - SLICE_HOVER_OFFSET - 2.0;
        let inner = outer * 0.6;

        let mut angle = 0.0;
        let slices: Vec<Slice> = aggregation
            .categories
            .iter()
            .map(|c| {
                let share = if total > 0.0 { c.actual / total } else { 0.0 };
                let span = std::f64::consts::TAU * share;
                let slice = Slice {
                    name: c.name.clone(),
                    actual: c.actual,
                    percent: share * 100.0,
                    count: c.count,
                    start: angle,
                    end: angle + span,
                };
                angle += span;
                slice
            })
            .collect();

        let mut scene = Scene::new("time-donut", size, size);
        let mut schedule = Schedule::new();
        scene.push(Element::group(
            "time-donut-root",
            Style {
                transform: Some(format!("translate({:.2},{:.2})", size / 2.0, size / 2.0)),
                ..Default::default()
            },
        ));
        for (i, slice) in slices.iter().enumerate() {
            if slice.end <= slice.start {
                continue;
            }
            scene.push(
                Element::new(
                    slice_element_id(i),
                    Shape::Path {
                        d: arc_path(slice.start, slice.end, inner, outer, 0.0),
                    },
                    Style {
                        fill: Some(color(i).to_string()),
                        stroke: Some("#ffffff".to_string()),
                        stroke_width: Some(1.0),
                        ..Default::default()
                    },
                )
                .with_class("time-slice")
                .with_data("tooltip", slice.tooltip().to_text()),
            );
            schedule.push(
                slice_element_id(i),
                Tween::Sweep {
                    from: 0.0,
                    to: slice.end,
                },
                0,
                DONUT_SWEEP_MS,
                Easing::CubicOut,
            );
        }
        scene.push(
            Element::new(
                "time-donut-total",
                Shape::Text {
                    x: 0.0,
                    y: -6.0,
                    content: format_number(total),
                    anchor: TextAnchor::Middle,
                },
                Style {
                    fill: Some(text_color.to_string()),
                    font_size: Some(24.0),
                    font_weight: Some("bold"),
                    ..Default::default()
                },
            )
            .with_class("time-donut-total"),
        );
        scene.push(
            Element::new(
                "time-donut-caption",
                Shape::Text {
                    x: 0.0,
                    y: 16.0,
                    content: "minutes".to_string(),
                    anchor: TextAnchor::Middle,
                },
                Style {
                    fill: Some(text_color.to_string()),
                    font_size: Some(11.0),
                    opacity: Some(0.7),
                    ..Default::default()
                },
            ),
        );
        scene.push(Element::group_end());

        Self {
            scene,
            schedule,
            slices,
            hovered: None,
        }
    }

    pub fn hover(&mut self, target: &str) -> Option<TooltipContent> {
        let index: usize = target.strip_prefix("time-slice-")?.parse().ok()?;
        let slice = self.slices.get(index)?;
        let (dx, dy) = slice.hover_offset();
        let tooltip = slice.tooltip();

        let mut patches = Vec::new();
        if let Some(previous) = self.hovered.filter(|&p| p != index) {
            patches.push(Patch::reset(slice_element_id(previous), HOVER_MS));
        }
        let mut patch = Patch::reset(slice_element_id(index), HOVER_MS);
        patch.transform = Some(Some(format!("translate({dx:.2},{dy:.2})")));
        patches.push(patch);
        self.scene.apply(&patches);
        self.hovered = Some(index);
        Some(tooltip)
    }

    pub fn hover_end(&mut self) {
        if let Some(index) = self.hovered.take() {
            self.scene
                .apply(&[Patch::reset(slice_element_id(index), HOVER_MS)]);
        }
    }
}

/// Estimated or actual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Estimated,
    Actual,
}

impl Series {
    pub fn as_str(&self) -> &'static str {
        match self {
            Series::Estimated => "estimated",
            Series::Actual => "actual",
        }
    }
}

/// One bar of the grouped chart
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    pub series: Series,
    pub value: f64,
    /// Actual minus estimated, for the category
    pub delta: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bar {
    fn tooltip(&self) -> TooltipContent {
        let content = TooltipContent::new(format!("{} ({})", self.category, self.series.as_str()))
            .line(minutes(self.value));
        match self.series {
            Series::Estimated => content,
            Series::Actual => {
                let sign = if self.delta >= 0.0 { "+" } else { "-" };
                content.line(format!(
                    "{sign}{} vs estimate",
                    minutes(self.delta.abs())
                ))
            }
        }
    }
}

fn bar_element_id(i: usize, series: Series) -> String {
    format!("time-bar-{i}-{}", series.as_str())
}

fn parse_bar_id(target: &str) -> Option<(usize, Series)> {
    let rest = target.strip_prefix("time-bar-")?;
    let (index, series) = rest.split_once('-')?;
    let series = match series {
        "estimated" => Series::Estimated,
        "actual" => Series::Actual,
        _ => return None,
    };
    Some((index.parse().ok()?, series))
}

/// Chart margins: top, right, bottom, left
const MARGIN: (f64, f64, f64, f64) = (16.0, 16.0, 36.0, 44.0);

/// Linear y scale from 0 to 1.15x the largest single value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YScale {
    pub domain_max: f64,
    pub top: f64,
    pub bottom: f64,
}

impl YScale {
    pub fn new(max_value: f64, top: f64, bottom: f64) -> Self {
        let domain_max = if max_value > 0.0 {
            max_value * Y_HEADROOM
        } else {
            1.0
        };
        Self {
            domain_max,
            top,
            bottom,
        }
    }

    pub fn y(&self, value: f64) -> f64 {
        self.bottom - (self.bottom - self.top) * (value / self.domain_max)
    }
}

/// Grouped bar chart, estimated next to actual per category
pub struct BarChart {
    pub scene: Scene,
    pub schedule: Schedule,
    pub bars: Vec<Bar>,
    pub scale: YScale,
    hovered: Option<String>,
}

impl BarChart {
    pub fn build(
        aggregation: &Aggregation,
        width: f64,
        height: f64,
        stagger_ms: u64,
        text_color: &str,
    ) -> Self {
        let (top, right, bottom, left) = MARGIN;
        let plot_width = (width - left - right).max(1.0);
        let baseline = height - bottom;
        let scale = YScale::new(aggregation.max_value(), top, baseline);

        let n = aggregation.categories.len().max(1) as f64;
        let step = plot_width / n;
        let band = step * (1.0 - BAND_PADDING);
        let bar_width = band / 2.0;

        let mut scene = Scene::new("time-bars", width, height);
        let mut schedule = Schedule::new();
        let mut bars = Vec::new();

        scene.push(Element::new(
            "time-bars-baseline",
            Shape::Line {
                x1: left,
                y1: baseline,
                x2: width - right,
                y2: baseline,
            },
            Style {
                stroke: Some(text_color.to_string()),
                stroke_width: Some(1.0),
                opacity: Some(0.4),
                ..Default::default()
            },
        ));
        for tick in [0.5, 1.0] {
            let value = scale.domain_max / Y_HEADROOM * tick;
            scene.push(
                Element::new(
                    format!("time-bars-tick-{}", (tick * 100.0) as u32),
                    Shape::Text {
                        x: left - 6.0,
                        y: scale.y(value),
                        content: format_number(value.round()),
                        anchor: TextAnchor::End,
                    },
                    Style {
                        fill: Some(text_color.to_string()),
                        font_size: Some(10.0),
                        opacity: Some(0.7),
                        ..Default::default()
                    },
                )
                .with_class("time-axis"),
            );
        }

        for (i, category) in aggregation.categories.iter().enumerate() {
            let band_x = left + i as f64 * step + (step - band) / 2.0;
            let fill = color(i);
            let delta = category.actual - category.estimated;

            for (offset, series, value) in [
                (0.0, Series::Estimated, category.estimated),
                (bar_width, Series::Actual, category.actual),
            ] {
                let y = scale.y(value);
                let bar = Bar {
                    category: category.name.clone(),
                    series,
                    value,
                    delta,
                    x: band_x + offset,
                    y,
                    width: (bar_width - 2.0).max(1.0),
                    height: baseline - y,
                };
                let style = match series {
                    Series::Estimated => Style {
                        fill: Some(fill.to_string()),
                        fill_opacity: Some(0.25),
                        stroke: Some(fill.to_string()),
                        stroke_width: Some(1.5),
                        dash: Some("4 2".to_string()),
                        ..Default::default()
                    },
                    Series::Actual => Style {
                        fill: Some(fill.to_string()),
                        ..Default::default()
                    },
                };
                let id = bar_element_id(i, series);
                scene.push(
                    Element::new(
                        id.clone(),
                        Shape::Rect {
                            x: bar.x,
                            y: bar.y,
                            width: bar.width,
                            height: bar.height,
                            rx: 2.0,
                        },
                        style,
                    )
                    .with_class(format!("time-bar time-bar-{}", series.as_str()))
                    .with_data("tooltip", bar.tooltip().to_text()),
                );
                schedule.push(
                    id,
                    Tween::Grow {
                        from: 0.0,
                        to: bar.height,
                    },
                    i as u64 * stagger_ms,
                    BAR_GROW_MS,
                    Easing::BackOut,
                );
                bars.push(bar);
            }

            scene.push(
                Element::new(
                    format!("time-bars-label-{i}"),
                    Shape::Text {
                        x: band_x + band / 2.0,
                        y: baseline + 16.0,
                        content: category.name.clone(),
                        anchor: TextAnchor::Middle,
                    },
                    Style {
                        fill: Some(text_color.to_string()),
                        font_size: Some(11.0),
                        ..Default::default()
                    },
                )
                .with_class("time-axis"),
            );
        }

        Self {
            scene,
            schedule,
            bars,
            scale,
            hovered: None,
        }
    }

    pub fn hover(&mut self, target: &str) -> Option<TooltipContent> {
        let (index, series) = parse_bar_id(target)?;
        let bar = self.bars.get(index * 2 + usize::from(series == Series::Actual))?;
        let tooltip = bar.tooltip();

        let mut patches = Vec::new();
        if let Some(previous) = self.hovered.take().filter(|p| p != target) {
            patches.push(Patch::reset(previous, HOVER_MS));
        }
        let mut patch = Patch::reset(target, HOVER_MS);
        patch.filter = Some(Some("brightness(1.15)".to_string()));
        patches.push(patch);
        self.scene.apply(&patches);
        self.hovered = Some(target.to_string());
        Some(tooltip)
    }

    pub fn hover_end(&mut self) {
        if let Some(id) = self.hovered.take() {
            self.scene.apply(&[Patch::reset(id, HOVER_MS)]);
        }
    }
}
