//! Time analytics dashboard
//!
//! Independent of the graph dataset: todos are filtered by range, aggregated per
//! category and drawn as a donut and a grouped bar chart. A filter change swaps
//! the whole content area, fading the old content out before the new one fades in.

pub mod aggregate;
pub mod charts;
pub mod filter;

use std::fmt;

use askama::Template;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::coordinator::ViewKind;
use crate::scene::{Easing, Schedule, Tween};
use crate::sources::TodoSnapshot;
use crate::tooltip::TooltipContent;
use crate::views::{RenderContext, Renderer, Surface, ViewHandle, empty_state_markup};

use aggregate::{Aggregation, aggregate};
use charts::{BarChart, DonutChart, format_number};
use filter::{TimeFilterMode, TimeFilterState};

pub const CONTENT_ELEMENT: &str = "time-content";
pub const FADE_OUT_MS: u64 = 150;
pub const FADE_IN_MS: u64 = 200;
const DONUT_SIZE: f64 = 240.0;
const BAR_HEIGHT: f64 = 260.0;
const MIN_BAR_WIDTH: f64 = 320.0;

/// Why there is nothing to chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEmpty {
    /// No todos store is connected
    NoSync,
    /// No completed top-level todo has a recorded time
    NoTodos,
    /// The range filter removed every record
    NoneInRange,
}

impl TimeEmpty {
    pub fn class(&self) -> &'static str {
        match self {
            TimeEmpty::NoSync => "time-empty-no-sync",
            TimeEmpty::NoTodos => "time-empty-no-todos",
            TimeEmpty::NoneInRange => "time-empty-none-in-range",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TimeEmpty::NoSync => "Time tracking needs sync. Connect a todos store to see where your time goes.",
            TimeEmpty::NoTodos => "No completed tasks with tracked time yet.",
            TimeEmpty::NoneInRange => "No tracked tasks in this time range.",
        }
    }
}

impl fmt::Display for TimeEmpty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Filter and aggregate the todo snapshot, or explain why there is nothing to show
pub fn analyze(
    todos: &TodoSnapshot,
    state: &TimeFilterState,
    now: DateTime<Local>,
) -> Result<Aggregation, TimeEmpty> {
    let TodoSnapshot::Loaded(todos) = todos else {
        return Err(TimeEmpty::NoSync);
    };
    if filter::eligible(todos).is_empty() {
        return Err(TimeEmpty::NoTodos);
    }
    let selected = filter::apply(todos, state, now);
    if selected.is_empty() {
        return Err(TimeEmpty::NoneInRange);
    }
    Ok(aggregate(&selected))
}

/// Human description of the active range
pub fn range_label(state: &TimeFilterState) -> String {
    match state.mode {
        TimeFilterMode::Week => "Last 7 days".to_string(),
        TimeFilterMode::Month => "Last month".to_string(),
        TimeFilterMode::Year => "Last 12 months".to_string(),
        TimeFilterMode::All => "All time".to_string(),
        TimeFilterMode::Custom => match (state.custom_from, state.custom_to) {
            (Some(from), Some(to)) => format!("From {from} to {to}"),
            (Some(from), None) => format!("Since {from}"),
            (None, Some(to)) => format!("Until {to}"),
            (None, None) => "All time".to_string(),
        },
    }
}

/// Fade the old content out, then fade the new content in. The windows never overlap.
pub fn swap_schedule() -> Schedule {
    let mut schedule = Schedule::new();
    schedule.push(CONTENT_ELEMENT, Tween::FadeOut, 0, FADE_OUT_MS, Easing::Linear);
    schedule.push(
        CONTENT_ELEMENT,
        Tween::FadeIn,
        FADE_OUT_MS,
        FADE_IN_MS,
        Easing::Linear,
    );
    schedule
}

struct EmptyView {
    class: &'static str,
    message: &'static str,
}

struct Stat {
    label: &'static str,
    value: String,
}

struct LegendEntry {
    name: String,
    color: &'static str,
}

#[derive(Template)]
#[template(path = "views/time.html")]
struct TimeTemplate<'a> {
    filter_mode: &'a str,
    range: &'a str,
    swap: bool,
    fade_in_delay_ms: u64,
    fade_in_ms: u64,
    empty: Option<EmptyView>,
    stats: Vec<Stat>,
    donut: &'a str,
    bars: &'a str,
    legend: Vec<LegendEntry>,
}

enum Content {
    Empty(TimeEmpty),
    Charts {
        aggregation: Aggregation,
        donut: DonutChart,
        bars: BarChart,
    },
}

/// Activated time dashboard
pub struct TimeSurface {
    content: Content,
    filter: TimeFilterState,
    swap: bool,
    schedule: Schedule,
}

impl TimeSurface {
    pub fn empty_state(&self) -> Option<TimeEmpty> {
        match &self.content {
            Content::Empty(reason) => Some(*reason),
            Content::Charts { .. } => None,
        }
    }

    pub fn aggregation(&self) -> Option<&Aggregation> {
        match &self.content {
            Content::Empty(_) => None,
            Content::Charts { aggregation, .. } => Some(aggregation),
        }
    }

    fn render(&self) -> Result<String, askama::Error> {
        let (empty, stats, donut, bars, legend) = match &self.content {
            Content::Empty(reason) => (
                Some(EmptyView {
                    class: reason.class(),
                    message: reason.message(),
                }),
                Vec::new(),
                String::new(),
                String::new(),
                Vec::new(),
            ),
            Content::Charts {
                aggregation,
                donut,
                bars,
            } => {
                let summary = &aggregation.summary;
                let stats = vec![
                    Stat {
                        label: "tasks completed",
                        value: summary.completed.to_string(),
                    },
                    Stat {
                        label: "minutes tracked",
                        value: format_number(summary.actual),
                    },
                    Stat {
                        label: "minutes estimated",
                        value: format_number(summary.estimated),
                    },
                    Stat {
                        label: "pomodoros",
                        value: format!("{:.1}", summary.pomodoros),
                    },
                ];
                let legend = aggregation
                    .categories
                    .iter()
                    .enumerate()
                    .map(|(i, c)| LegendEntry {
                        name: c.name.clone(),
                        color: charts::color(i),
                    })
                    .collect();
                (
                    None,
                    stats,
                    crate::svg::render(&donut.scene, Some(&donut.schedule)),
                    crate::svg::render(&bars.scene, Some(&bars.schedule)),
                    legend,
                )
            }
        };
        let range = range_label(&self.filter);
        TimeTemplate {
            filter_mode: self.filter.mode.as_str(),
            range: &range,
            swap: self.swap,
            fade_in_delay_ms: FADE_OUT_MS,
            fade_in_ms: FADE_IN_MS,
            empty,
            stats,
            donut: &donut,
            bars: &bars,
            legend,
        }
        .render()
    }
}

impl Surface for TimeSurface {
    fn markup(&self) -> String {
        self.render().unwrap_or_else(|e| {
            warn!(error = %e, "failed to render time dashboard");
            empty_state_markup("time-empty", "The time dashboard could not be drawn.")
        })
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn hover(&mut self, target: &str) -> Option<TooltipContent> {
        let Content::Charts { donut, bars, .. } = &mut self.content else {
            return None;
        };
        if target.starts_with("time-slice-") {
            bars.hover_end();
            donut.hover(target)
        } else if target.starts_with("time-bar-") {
            donut.hover_end();
            bars.hover(target)
        } else {
            None
        }
    }

    fn hover_end(&mut self) {
        if let Content::Charts { donut, bars, .. } = &mut self.content {
            donut.hover_end();
            bars.hover_end();
        }
    }
}

/// Renderer for the time dashboard
#[derive(Debug, Default)]
pub struct TimeRenderer;

impl TimeRenderer {
    pub fn build(ctx: &RenderContext<'_>) -> TimeSurface {
        let content = match analyze(ctx.todos, ctx.time_filter, ctx.now) {
            Err(reason) => {
                debug!(?reason, filter = %ctx.time_filter.mode, "time dashboard is empty");
                Content::Empty(reason)
            }
            Ok(aggregation) => {
                let text = &ctx.palette.text;
                let bar_width = (ctx.config.viewport.width - DONUT_SIZE - 48.0).max(MIN_BAR_WIDTH);
                let donut = DonutChart::build(&aggregation, DONUT_SIZE, text);
                let bars = BarChart::build(
                    &aggregation,
                    bar_width,
                    BAR_HEIGHT,
                    ctx.config.time.bar_stagger_ms,
                    text,
                );
                debug!(
                    categories = aggregation.categories.len(),
                    completed = aggregation.summary.completed,
                    "time dashboard aggregated"
                );
                Content::Charts {
                    aggregation,
                    donut,
                    bars,
                }
            }
        };

        let mut charts = Schedule::new();
        if let Content::Charts { donut, bars, .. } = &content {
            charts.extend(donut.schedule.clone());
            charts.extend(bars.schedule.clone());
        }
        let schedule = if ctx.swap {
            let mut schedule = swap_schedule();
            schedule.extend(charts.delayed(FADE_OUT_MS));
            schedule
        } else {
            charts
        };

        TimeSurface {
            content,
            filter: *ctx.time_filter,
            swap: ctx.swap,
            schedule,
        }
    }
}

impl Renderer for TimeRenderer {
    fn kind(&self) -> ViewKind {
        ViewKind::Time
    }

    fn activate(&mut self, ctx: &RenderContext<'_>) -> ViewHandle {
        ViewHandle::new(ViewKind::Time, ctx, Self::build(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Dataset, Timestamp, Todo};
    use crate::theme::{self, Palette, ThemeEnvironment, ThemeMode};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn todo(category: &str, actual: f64, completed: &str) -> Todo {
        Todo {
            id: format!("{category}-{actual}"),
            done: true,
            category: Some(category.to_string()),
            actual_min: Some(actual),
            completed_at: Some(Timestamp::Text(completed.to_string())),
            ..Default::default()
        }
    }

    struct Fixture {
        dataset: Dataset,
        palette: Palette,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dataset: Dataset::default(),
                palette: theme::resolve(&ThemeEnvironment::with_mode(ThemeMode::Dark)),
                config: Config::default(),
            }
        }

        fn build(&self, todos: &TodoSnapshot, filter: &TimeFilterState, swap: bool) -> TimeSurface {
            TimeRenderer::build(&RenderContext {
                dataset: &self.dataset,
                palette: &self.palette,
                config: &self.config,
                current_path: None,
                todos,
                time_filter: filter,
                now: now(),
                swap,
                generation: 1,
            })
        }
    }

    fn loaded() -> TodoSnapshot {
        TodoSnapshot::Loaded(vec![
            todo("Writing", 50.0, "2026-06-14"),
            todo("Reading", 20.0, "2026-06-10"),
            todo("Writing", 10.0, "2025-01-01"),
        ])
    }

    #[test]
    fn each_empty_state_has_its_own_message() {
        let fixture = Fixture::new();
        let week = TimeFilterState::preset(TimeFilterMode::Week);

        let no_sync = fixture.build(&TodoSnapshot::Unavailable, &week, false);
        assert_eq!(no_sync.empty_state(), Some(TimeEmpty::NoSync));

        let mut open = todo("Writing", 5.0, "2026-06-14");
        open.done = false;
        let no_todos = fixture.build(&TodoSnapshot::Loaded(vec![open]), &week, false);
        assert_eq!(no_todos.empty_state(), Some(TimeEmpty::NoTodos));

        let custom = TimeFilterState::custom(
            NaiveDate::from_ymd_opt(2020, 1, 1),
            NaiveDate::from_ymd_opt(2020, 1, 2),
        );
        let none = fixture.build(&loaded(), &custom, false);
        assert_eq!(none.empty_state(), Some(TimeEmpty::NoneInRange));

        let messages = [no_sync.markup(), no_todos.markup(), none.markup()];
        assert!(messages[0].contains("time-empty-no-sync"));
        assert!(messages[1].contains("time-empty-no-todos"));
        assert!(messages[2].contains("time-empty-none-in-range"));
        assert!(messages.iter().all(|m| !m.contains("<svg")));
    }

    #[test]
    fn range_filter_drives_aggregation() {
        let fixture = Fixture::new();
        let week = fixture.build(&loaded(), &TimeFilterState::preset(TimeFilterMode::Week), false);
        let all = fixture.build(&loaded(), &TimeFilterState::preset(TimeFilterMode::All), false);

        assert_eq!(week.aggregation().unwrap().summary.actual, 70.0);
        assert_eq!(all.aggregation().unwrap().summary.actual, 80.0);
        assert_eq!(all.aggregation().unwrap().categories[0].name, "Writing");
    }

    #[test]
    fn dashboard_markup_contains_both_charts_and_stats() {
        let fixture = Fixture::new();
        let all = TimeFilterState::preset(TimeFilterMode::All);
        let surface = fixture.build(&loaded(), &all, false);
        let markup = surface.markup();
        assert!(markup.contains("id=\"time-donut\""));
        assert!(markup.contains("id=\"time-bars\""));
        assert!(markup.contains("pomodoros"));
        assert!(markup.contains("All time"));
        assert!(!markup.contains("anim-fade-in\" data-filter"));
    }

    #[test]
    fn swap_fades_out_before_fading_in() {
        let schedule = swap_schedule();
        let entries = schedule.entries();
        assert_eq!(entries[0].tween, Tween::FadeOut);
        assert_eq!(entries[1].tween, Tween::FadeIn);
        assert!(entries[0].end_ms() <= entries[1].delay_ms);
    }

    #[test]
    fn swapped_charts_start_after_the_fade_out() {
        let fixture = Fixture::new();
        let filter = TimeFilterState::preset(TimeFilterMode::All);
        let surface = fixture.build(&loaded(), &filter, true);
        let first_chart = surface
            .schedule()
            .entries()
            .iter()
            .filter(|a| a.element != CONTENT_ELEMENT)
            .map(|a| a.delay_ms)
            .min()
            .unwrap();
        assert!(first_chart >= FADE_OUT_MS);
        assert!(surface.markup().contains("time-content anim-fade-in"));
    }

    #[test]
    fn hover_routes_to_the_right_chart() {
        let fixture = Fixture::new();
        let mut surface =
            fixture.build(&loaded(), &TimeFilterState::preset(TimeFilterMode::All), false);
        let slice = surface.hover("time-slice-0").unwrap();
        assert_eq!(slice.title, "Writing");
        let bar = surface.hover("time-bar-1-actual").unwrap();
        assert_eq!(bar.title, "Reading (actual)");
        assert_eq!(surface.hover("time-content"), None);
        surface.hover_end();
    }

    #[test]
    fn custom_range_label() {
        let state = TimeFilterState::custom(NaiveDate::from_ymd_opt(2026, 3, 1), None);
        assert_eq!(range_label(&state), "Since 2026-03-01");
    }
}
