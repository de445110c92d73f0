//! Time range filtering over todos
//!
//! Only completed, top-level todos with a recorded actual time take part. A todo
//! whose timestamp is missing or unparseable is kept in every range: ambiguous
//! data stays visible.

use std::fmt;

use chrono::{DateTime, Local, Months, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::model::Todo;
use crate::storage::{Storage, TIME_FILTER_KEY, TIME_FROM_KEY, TIME_TO_KEY};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Range preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilterMode {
    Week,
    #[default]
    Month,
    Year,
    All,
    Custom,
}

impl TimeFilterMode {
    pub const ALL: [TimeFilterMode; 5] = [
        TimeFilterMode::Week,
        TimeFilterMode::Month,
        TimeFilterMode::Year,
        TimeFilterMode::All,
        TimeFilterMode::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilterMode::Week => "week",
            TimeFilterMode::Month => "month",
            TimeFilterMode::Year => "year",
            TimeFilterMode::All => "all",
            TimeFilterMode::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == value.trim().to_ascii_lowercase())
    }

    /// Button caption
    pub fn label(&self) -> &'static str {
        match self {
            TimeFilterMode::Week => "Week",
            TimeFilterMode::Month => "Month",
            TimeFilterMode::Year => "Year",
            TimeFilterMode::All => "All time",
            TimeFilterMode::Custom => "Custom",
        }
    }
}

impl fmt::Display for TimeFilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active time filter, persisted separately from the view state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeFilterState {
    pub mode: TimeFilterMode,
    pub custom_from: Option<NaiveDate>,
    pub custom_to: Option<NaiveDate>,
}

impl TimeFilterState {
    pub fn preset(mode: TimeFilterMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn custom(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            mode: TimeFilterMode::Custom,
            custom_from: from,
            custom_to: to,
        }
    }

    /// Read the persisted filter. Unknown or malformed values fall back to defaults.
    pub fn load(storage: &dyn Storage) -> Self {
        let date = |key: &str| {
            storage
                .get(key)
                .and_then(|v| NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).ok())
        };
        Self {
            mode: storage
                .get(TIME_FILTER_KEY)
                .and_then(|v| TimeFilterMode::parse(&v))
                .unwrap_or_default(),
            custom_from: date(TIME_FROM_KEY),
            custom_to: date(TIME_TO_KEY),
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        storage.set(TIME_FILTER_KEY, self.mode.as_str());
        for (key, date) in [(TIME_FROM_KEY, self.custom_from), (TIME_TO_KEY, self.custom_to)] {
            match date {
                Some(date) => storage.set(key, &date.format(DATE_FORMAT).to_string()),
                None => storage.remove(key),
            }
        }
    }

    /// Inclusive `[start, end]` bounds relative to `now`; `None` is unbounded
    pub fn bounds(
        &self,
        now: DateTime<Local>,
    ) -> (Option<DateTime<Local>>, Option<DateTime<Local>>) {
        match self.mode {
            TimeFilterMode::Week => (now.checked_sub_signed(TimeDelta::days(7)), None),
            TimeFilterMode::Month => (now.checked_sub_months(Months::new(1)), None),
            TimeFilterMode::Year => (now.checked_sub_months(Months::new(12)), None),
            TimeFilterMode::All => (None, None),
            TimeFilterMode::Custom => (
                self.custom_from.and_then(start_of_day),
                self.custom_to.and_then(end_of_day),
            ),
        }
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_milli_opt(23, 59, 59, 999)?
        .and_local_timezone(Local)
        .latest()
}

/// Completed, top-level and with an actual time recorded
pub fn is_eligible(todo: &Todo) -> bool {
    todo.done && todo.parent_id.is_none() && todo.actual_min.is_some()
}

/// Eligible todos, in input order
pub fn eligible(todos: &[Todo]) -> Vec<&Todo> {
    todos.iter().filter(|t| is_eligible(t)).collect()
}

/// Whether a todo falls inside the filter's range
pub fn in_range(todo: &Todo, state: &TimeFilterState, now: DateTime<Local>) -> bool {
    let Some(at) = todo.reference_timestamp().and_then(|ts| ts.to_local()) else {
        return true;
    };
    let (start, end) = state.bounds(now);
    start.is_none_or(|start| at >= start) && end.is_none_or(|end| at <= end)
}

/// Eligible todos inside the filter's range, in input order
pub fn apply<'a>(
    todos: &'a [Todo],
    state: &TimeFilterState,
    now: DateTime<Local>,
) -> Vec<&'a Todo> {
    todos
        .iter()
        .filter(|t| is_eligible(t) && in_range(t, state, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn todo(id: &str, completed: Option<Timestamp>) -> Todo {
        Todo {
            id: id.to_string(),
            done: true,
            actual_min: Some(30.0),
            completed_at: completed,
            ..Default::default()
        }
    }

    fn days_ago(days: i64) -> Option<Timestamp> {
        let at = now() - TimeDelta::days(days);
        Some(Timestamp::Millis(at.timestamp_millis() as f64))
    }

    fn ids(todos: &[&Todo]) -> Vec<String> {
        todos.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn only_completed_top_level_timed_todos_are_eligible() {
        let mut open = todo("open", None);
        open.done = false;
        let mut child = todo("child", None);
        child.parent_id = Some("p".to_string());
        let mut untimed = todo("untimed", None);
        untimed.actual_min = None;
        let todos = vec![todo("ok", None), open, child, untimed];

        assert_eq!(ids(&eligible(&todos)), vec!["ok"]);
    }

    #[test]
    fn presets_are_nested() {
        let todos = vec![
            todo("d2", days_ago(2)),
            todo("d20", days_ago(20)),
            todo("d200", days_ago(200)),
            todo("d900", days_ago(900)),
            todo("unknown", Some(Timestamp::Text("not a date".to_string()))),
        ];
        let run = |mode| ids(&apply(&todos, &TimeFilterState::preset(mode), now()));

        assert_eq!(run(TimeFilterMode::Week), vec!["d2", "unknown"]);
        assert_eq!(run(TimeFilterMode::Month), vec!["d2", "d20", "unknown"]);
        assert_eq!(run(TimeFilterMode::Year), vec!["d2", "d20", "d200", "unknown"]);
        assert_eq!(run(TimeFilterMode::All).len(), 5);

        for (narrow, wide) in [
            (TimeFilterMode::Week, TimeFilterMode::Month),
            (TimeFilterMode::Month, TimeFilterMode::Year),
            (TimeFilterMode::Year, TimeFilterMode::All),
        ] {
            let wide = run(wide);
            assert!(run(narrow).iter().all(|id| wide.contains(id)));
        }
    }

    #[test]
    fn missing_timestamps_are_kept() {
        let todos = vec![todo("none", None)];
        let state = TimeFilterState::custom(NaiveDate::from_ymd_opt(2020, 1, 1), None);
        assert_eq!(apply(&todos, &state, now()).len(), 1);
    }

    #[test]
    fn updated_at_stands_in_for_completed_at() {
        let mut t = todo("old", None);
        t.updated_at = days_ago(100);
        t.created_at = days_ago(1);
        let todos = vec![t];
        assert!(apply(&todos, &TimeFilterState::preset(TimeFilterMode::Week), now()).is_empty());
    }

    #[test]
    fn custom_range_covers_whole_days() {
        let todos = vec![
            todo("first", Some(Timestamp::Text("2026-03-01T00:00:00".to_string()))),
            todo("last", Some(Timestamp::Text("2026-03-31T23:59:59".to_string()))),
            todo("after", Some(Timestamp::Text("2026-04-01T00:00:00".to_string()))),
            todo("before", Some(Timestamp::Text("2026-02-28".to_string()))),
        ];
        let state = TimeFilterState::custom(
            NaiveDate::from_ymd_opt(2026, 3, 1),
            NaiveDate::from_ymd_opt(2026, 3, 31),
        );
        assert_eq!(ids(&apply(&todos, &state, now())), vec!["first", "last"]);

        let open_start = TimeFilterState::custom(None, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(ids(&apply(&todos, &open_start, now())), vec!["first", "before"]);
    }

    #[test]
    fn persists_and_restores() {
        let mut storage = MemoryStorage::new();
        let state = TimeFilterState::custom(NaiveDate::from_ymd_opt(2026, 1, 2), None);
        state.save(&mut storage);

        assert_eq!(storage.get(TIME_FILTER_KEY).as_deref(), Some("custom"));
        assert_eq!(storage.get(TIME_FROM_KEY).as_deref(), Some("2026-01-02"));
        assert_eq!(TimeFilterState::load(&storage), state);
    }

    #[test]
    fn malformed_persisted_values_fall_back() {
        let mut storage = MemoryStorage::new();
        storage.set(TIME_FILTER_KEY, "fortnight");
        storage.set(TIME_FROM_KEY, "yesterday");
        assert_eq!(TimeFilterState::load(&storage), TimeFilterState::default());
    }
}
