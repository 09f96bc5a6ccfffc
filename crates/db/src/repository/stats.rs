//! Per-user task statistics

use super::filter::Predicate;
use crate::models::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Counts over one user's tasks.
///
/// `completed + incomplete == total` and `overdue <= incomplete` always hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Count `tasks` as of `today`. Overdue uses the same definition as the
    /// `overdue` filter.
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let overdue = Predicate::overdue(today);
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();

        Self {
            total,
            completed,
            incomplete: total - completed,
            overdue: tasks.iter().filter(|t| overdue.matches(t)).count(),
        }
    }
}
