//! Data models for taskmate
//!
//! Defines Rust types that map to the SurrealDB schema for users and tasks,
//! plus the input types used to create and change tasks.

use crate::error::{DbResult, FieldErrors};
use crate::repository::Predicate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a registered user (the key of a `user` record)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw record key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw record key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identity
    pub id: UserId,
    /// Unique login name
    pub username: String,
    /// Optional contact address
    pub email: Option<String>,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// A task owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identity
    pub id: String,
    /// Task title, never blank
    pub title: String,
    /// Free-form description, may be empty
    pub description: String,
    /// Calendar date the task is due
    pub due_date: NaiveDate,
    /// Completion flag, false unless set explicitly
    pub completed: bool,
    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
    /// The owning user, immutable
    pub owner: UserId,
}

impl Task {
    /// Whether the task is past due and still open as of `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        Predicate::overdue(today).matches(self)
    }
}

/// Wire representation of a task, shared by the JSON API and `--json` output.
///
/// The owner and creation time stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub completed: bool,
}

impl From<&Task> for TaskJson {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            completed: task.completed,
        }
    }
}

/// Input for creating a task.
///
/// There is deliberately no owner field: the repository stamps the owner
/// from the caller's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub completed: bool,
}

impl NewTask {
    /// Create a new open task with an empty description
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            completed: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the initial completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Validation` if the title is blank.
    pub fn validate(&self) -> DbResult<()> {
        let mut errors = FieldErrors::new();
        check_title(&self.title, &mut errors);
        errors.into_result()
    }
}

/// Partial update of a task's mutable fields.
///
/// `id`, `owner` and `created_at` are not representable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set a new description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a new due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set the completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Check if any change is specified
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.due_date.is_some()
            || self.completed.is_some()
    }

    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Validation` if a new title is given and blank.
    pub fn validate(&self) -> DbResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        errors.into_result()
    }
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.add("title", "This field may not be blank.");
    }
}
