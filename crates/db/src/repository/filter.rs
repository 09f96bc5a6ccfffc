//! Task filtering
//!
//! Turns raw request parameters into an immutable [`TaskFilter`], and a
//! `TaskFilter` into a composed [`Predicate`] over task fields.
//!
//! Every supplied constraint is combined with AND. `search` is itself an OR
//! of a title match and a description match. Constraints are independent,
//! so the order they are applied in has no effect on the result set.

use super::ordering::TaskOrdering;
use crate::error::{DbResult, FieldErrors};
use crate::models::Task;
use crate::values;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw filter parameters as they arrive from a query string or CLI.
///
/// Every field is an unparsed string; an empty string means the parameter
/// was not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

impl FilterParams {
    /// Parse the raw values into a [`TaskFilter`].
    ///
    /// # Errors
    ///
    /// Returns `DbError::Validation` with one entry per malformed field
    /// (`completed`, `overdue`, `due_date_from`, `due_date_to`). An
    /// unrecognized `ordering` is never an error; it falls back to the
    /// default ordering.
    pub fn parse(&self) -> DbResult<TaskFilter> {
        let mut errors = FieldErrors::new();

        let search = present(&self.search).map(str::to_string);
        let completed = bool_param("completed", &self.completed, &mut errors);
        let overdue = bool_param("overdue", &self.overdue, &mut errors);
        let due_date_from = date_param("due_date_from", &self.due_date_from, &mut errors);
        let due_date_to = date_param("due_date_to", &self.due_date_to, &mut errors);
        let ordering = present(&self.ordering)
            .map(TaskOrdering::parse)
            .unwrap_or_default();

        errors.into_result()?;

        Ok(TaskFilter {
            search,
            completed,
            due_date_from,
            due_date_to,
            overdue,
            ordering,
        })
    }
}

/// Trimmed value, or `None` when absent or blank
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean-like parameter, recording an error for unrecognized values
fn bool_param(field: &str, value: &Option<String>, errors: &mut FieldErrors) -> Option<bool> {
    let raw = present(value)?;
    let parsed = values::parse_bool(raw);
    if parsed.is_none() {
        errors.add(field, "Must be a valid boolean.");
    }
    parsed
}

/// Parse a `YYYY-MM-DD` parameter, recording an error for malformed values
fn date_param(field: &str, value: &Option<String>, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let raw = present(value)?;
    let parsed = values::parse_date(raw);
    if parsed.is_none() {
        errors.add(field, "Enter a valid date.");
    }
    parsed
}

/// Parsed filter criteria for one task query.
///
/// Absent fields impose no constraint. `overdue = Some(false)` is also no
/// constraint: it does not mean "not overdue".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring of title OR description
    pub search: Option<String>,
    /// Exact match on the completion flag
    pub completed: Option<bool>,
    /// Inclusive lower bound on the due date
    pub due_date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the due date
    pub due_date_to: Option<NaiveDate>,
    /// When true, only open tasks due before today
    pub overdue: Option<bool>,
    /// Result ordering
    pub ordering: TaskOrdering,
}

impl TaskFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Search title and description; a blank term is ignored
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let trimmed = term.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Match only tasks with this completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Match only tasks due on or after `date`
    pub fn due_from(mut self, date: NaiveDate) -> Self {
        self.due_date_from = Some(date);
        self
    }

    /// Match only tasks due on or before `date`
    pub fn due_to(mut self, date: NaiveDate) -> Self {
        self.due_date_to = Some(date);
        self
    }

    /// Set the overdue flag (false is a no-op)
    pub fn with_overdue(mut self, overdue: bool) -> Self {
        self.overdue = Some(overdue);
        self
    }

    /// Set the result ordering
    pub fn ordered_by(mut self, ordering: TaskOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// The individual constraints this filter imposes, one per supplied
    /// parameter.
    pub fn constraints(&self, today: NaiveDate) -> Vec<Predicate> {
        let mut constraints = Vec::new();

        if let Some(term) = &self.search {
            constraints.push(Predicate::search(term));
        }
        if let Some(completed) = self.completed {
            constraints.push(Predicate::CompletedIs(completed));
        }
        if let Some(from) = self.due_date_from {
            constraints.push(Predicate::DueOnOrAfter(from));
        }
        if let Some(to) = self.due_date_to {
            constraints.push(Predicate::DueOnOrBefore(to));
        }
        if self.overdue == Some(true) {
            constraints.push(Predicate::overdue(today));
        }

        constraints
    }

    /// Filter and order an owner-scoped task set.
    pub fn apply(&self, tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
        let predicate = build_predicate(self, today);
        let matching = tasks.into_iter().filter(|t| predicate.matches(t)).collect();
        self.ordering.apply(matching)
    }
}

/// Compose a filter's constraints into a single predicate.
pub fn build_predicate(filter: &TaskFilter, today: NaiveDate) -> Predicate {
    Predicate::All(filter.constraints(today))
}

/// A boolean condition over task fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Title contains the (lowercased) needle, ignoring case
    TitleContains(String),
    /// Description contains the (lowercased) needle, ignoring case
    DescriptionContains(String),
    /// Completion flag equals the value
    CompletedIs(bool),
    /// `due_date >= date`
    DueOnOrAfter(NaiveDate),
    /// `due_date <= date`
    DueOnOrBefore(NaiveDate),
    /// `due_date < date`
    DueBefore(NaiveDate),
    /// Every inner predicate holds; true when empty
    All(Vec<Predicate>),
    /// At least one inner predicate holds; false when empty
    Any(Vec<Predicate>),
}

impl Predicate {
    /// A predicate matching every task
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    /// Case-insensitive search over title OR description
    pub fn search(term: &str) -> Self {
        let needle = term.to_lowercase();
        Predicate::Any(vec![
            Predicate::TitleContains(needle.clone()),
            Predicate::DescriptionContains(needle),
        ])
    }

    /// Due strictly before `today` AND not completed
    pub fn overdue(today: NaiveDate) -> Self {
        Predicate::All(vec![
            Predicate::DueBefore(today),
            Predicate::CompletedIs(false),
        ])
    }

    /// Evaluate the predicate against a task
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Predicate::TitleContains(needle) => task.title.to_lowercase().contains(needle),
            Predicate::DescriptionContains(needle) => {
                task.description.to_lowercase().contains(needle)
            }
            Predicate::CompletedIs(value) => task.completed == *value,
            Predicate::DueOnOrAfter(date) => task.due_date >= *date,
            Predicate::DueOnOrBefore(date) => task.due_date <= *date,
            Predicate::DueBefore(date) => task.due_date < *date,
            Predicate::All(inner) => inner.iter().all(|p| p.matches(task)),
            Predicate::Any(inner) => inner.iter().any(|p| p.matches(task)),
        }
    }
}
