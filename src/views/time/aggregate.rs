//! Per-category totals and summary statistics for the time dashboard

use serde::Serialize;

use crate::model::Todo;

/// Estimate assumed for a todo without one (one pomodoro)
pub const DEFAULT_ESTIMATE_MIN: f64 = 25.0;
pub const POMODORO_MIN: f64 = 25.0;
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub name: String,
    pub estimated: f64,
    pub actual: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub completed: usize,
    pub actual: f64,
    pub estimated: f64,
    pub pomodoros: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    /// Sorted by actual minutes, largest first
    pub categories: Vec<CategoryTotals>,
    pub summary: Summary,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Largest single estimated or actual value across all categories
    pub fn max_value(&self) -> f64 {
        self.categories
            .iter()
            .flat_map(|c| [c.estimated, c.actual])
            .fold(0.0, f64::max)
    }
}

fn category_name(todo: &Todo) -> &str {
    match todo.category.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => UNCATEGORIZED,
    }
}

/// Minutes as recorded, or `missing` when absent. Negative and non-finite values count as zero.
fn minutes(value: Option<f64>, missing: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.max(0.0),
        Some(_) => 0.0,
        None => missing,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Group todos by category and total them up.
///
/// Input is expected to be already filtered; a todo without an actual time
/// contributes zero actual minutes.
pub fn aggregate(todos: &[&Todo]) -> Aggregation {
    let mut categories: Vec<CategoryTotals> = Vec::new();
    for todo in todos {
        let name = category_name(todo);
        let estimated = minutes(todo.estimated_min, DEFAULT_ESTIMATE_MIN);
        let actual = minutes(todo.actual_min, 0.0);

        match categories.iter_mut().find(|c| c.name == name) {
            Some(totals) => {
                totals.estimated += estimated;
                totals.actual += actual;
                totals.count += 1;
            }
            None => categories.push(CategoryTotals {
                name: name.to_string(),
                estimated,
                actual,
                count: 1,
            }),
        }
    }
    // Stable: equal totals keep first-seen order
    categories.sort_by(|a, b| b.actual.total_cmp(&a.actual));

    let actual: f64 = categories.iter().map(|c| c.actual).sum();
    let summary = Summary {
        completed: todos.len(),
        actual,
        estimated: categories.iter().map(|c| c.estimated).sum(),
        pomodoros: round_one_decimal(actual / POMODORO_MIN),
    };
    Aggregation {
        categories,
        summary,
    }
}
