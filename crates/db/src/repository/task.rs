//! Owner-scoped task repository
//!
//! Every query issued here carries the owner's identity in its WHERE
//! clause. A task that exists but belongs to someone else is reported the
//! same way as a task that does not exist.

use super::filter::TaskFilter;
use super::stats::TaskStats;
use crate::error::{DbError, DbResult};
use crate::id::IdGenerator;
use crate::models::{NewTask, Task, TaskChanges, UserId};
use chrono::NaiveDate;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

/// Attempts at finding an unused task id before giving up
const MAX_ID_ATTEMPTS: usize = 10;

/// Row shape of the `task` table
#[derive(Debug, Deserialize)]
struct TaskRow {
    id: surrealdb::sql::Thing,
    title: String,
    #[serde(default)]
    description: String,
    due_date: String,
    #[serde(default)]
    completed: bool,
    created_at: surrealdb::sql::Datetime,
    owner: surrealdb::sql::Thing,
}

impl TaskRow {
    fn into_task(self) -> DbResult<Task> {
        let id = self.id.id.to_string();
        let due_date = NaiveDate::parse_from_str(&self.due_date, "%Y-%m-%d").map_err(|e| {
            DbError::InvalidRecord {
                table: "task",
                id: id.clone(),
                reason: format!("due_date '{}': {}", self.due_date, e),
            }
        })?;

        Ok(Task {
            id,
            title: self.title,
            description: self.description,
            due_date,
            completed: self.completed,
            created_at: self.created_at.0,
            owner: UserId::new(self.owner.id.to_string()),
        })
    }
}

/// Minimal row for checking task existence
#[derive(Debug, Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    id: surrealdb::sql::Thing,
}

/// Task operations on behalf of one user.
///
/// Obtained from [`Database::tasks`](crate::Database::tasks). There is no
/// way to read or change a task outside the owner's scope through this
/// type.
pub struct TaskRepository<'a> {
    client: &'a Surreal<Db>,
    owner: UserId,
    ids: IdGenerator,
}

impl<'a> TaskRepository<'a> {
    /// Create a repository scoped to `owner`
    pub fn new(client: &'a Surreal<Db>, owner: UserId) -> Self {
        Self {
            client,
            owner,
            ids: IdGenerator::default(),
        }
    }

    /// The user this repository acts for
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    fn owner_binding(&self) -> (&'static str, String) {
        ("owner", self.owner.as_str().to_string())
    }

    /// Every task owned by the user, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn all(&self) -> DbResult<Vec<Task>> {
        debug!("Fetching all tasks for owner: {}", self.owner);
        let mut result = self
            .client
            .query("SELECT * FROM task WHERE owner = type::thing('user', $owner)")
            .bind(self.owner_binding())
            .await?
            .check()?;
        let rows: Vec<TaskRow> = result.take(0)?;
        trace!("Fetched {} task rows for owner: {}", rows.len(), self.owner);
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Tasks matching `filter`, ordered by the filter's ordering.
    ///
    /// `today` is the evaluation date for the `overdue` constraint.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn list(&self, filter: &TaskFilter, today: NaiveDate) -> DbResult<Vec<Task>> {
        trace!("Listing tasks with filter: {:?}", filter);
        let tasks = self.all().await?;
        let matching = filter.apply(tasks, today);
        debug!(
            "Listed {} tasks for owner: {}",
            matching.len(),
            self.owner
        );
        Ok(matching)
    }

    /// Fetch a single task.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task does not exist or is owned by
    /// another user.
    pub async fn get(&self, id: &str) -> DbResult<Task> {
        debug!("Fetching task: {} for owner: {}", id, self.owner);
        let mut result = self
            .client
            .query(
                "SELECT * FROM type::thing('task', $id) WHERE owner = type::thing('user', $owner)",
            )
            .bind(("id", id.to_string()))
            .bind(self.owner_binding())
            .await?
            .check()?;
        let row: Option<TaskRow> = result.take(0)?;
        match row {
            Some(row) => row.into_task(),
            None => {
                debug!("Task not found in owner scope: {}", id);
                Err(DbError::NotFound {
                    task_id: id.to_string(),
                })
            }
        }
    }

    /// Create a task owned by the user.
    ///
    /// The owner always comes from the repository scope.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Validation` if the title is blank.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn create(&self, new: &NewTask) -> DbResult<Task> {
        new.validate()?;
        let id = self.unused_id().await?;
        debug!("Creating task: {} with title: {}", id, new.title);
        trace!("Task data: {:?}", new);

        let mut result = self
            .client
            .query(
                r#"CREATE type::thing('task', $id) SET
                    title = $title,
                    description = $description,
                    due_date = $due_date,
                    completed = $completed,
                    owner = type::thing('user', $owner)"#,
            )
            .bind(("id", id.clone()))
            .bind(("title", new.title.clone()))
            .bind(("description", new.description.clone()))
            .bind(("due_date", new.due_date.to_string()))
            .bind(("completed", new.completed))
            .bind(self.owner_binding())
            .await?
            .check()?;
        let row: Option<TaskRow> = result.take(0)?;
        row.ok_or(DbError::NotFound { task_id: id })?.into_task()
    }

    /// Apply `changes` to a task and return the updated task.
    ///
    /// Fields left as `None` keep their current values. `id`, `owner` and
    /// `created_at` never change.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task is absent or foreign.
    /// Returns `DbError::Validation` if a new title is blank.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn update(&self, id: &str, changes: &TaskChanges) -> DbResult<Task> {
        debug!("Updating task: {}", id);
        trace!("Changes: {:?}", changes);

        let current = self.get(id).await?;
        changes.validate()?;

        if !changes.has_changes() {
            debug!("No changes specified for task: {}", id);
            return Ok(current);
        }

        let title = changes.title.clone().unwrap_or(current.title);
        let description = changes.description.clone().unwrap_or(current.description);
        let due_date = changes.due_date.unwrap_or(current.due_date);
        let completed = changes.completed.unwrap_or(current.completed);

        let mut result = self
            .client
            .query(
                r#"UPDATE type::thing('task', $id) SET
                    title = $title,
                    description = $description,
                    due_date = $due_date,
                    completed = $completed
                WHERE owner = type::thing('user', $owner)"#,
            )
            .bind(("id", id.to_string()))
            .bind(("title", title))
            .bind(("description", description))
            .bind(("due_date", due_date.to_string()))
            .bind(("completed", completed))
            .bind(self.owner_binding())
            .await?
            .check()?;
        let row: Option<TaskRow> = result.take(0)?;
        match row {
            Some(row) => row.into_task(),
            None => Err(DbError::NotFound {
                task_id: id.to_string(),
            }),
        }
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task is absent or foreign.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!("Deleting task: {}", id);
        self.get(id).await?;

        self.client
            .query("DELETE type::thing('task', $id) WHERE owner = type::thing('user', $owner)")
            .bind(("id", id.to_string()))
            .bind(self.owner_binding())
            .await?
            .check()?;
        Ok(())
    }

    /// Counts over the user's tasks as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn stats(&self, today: NaiveDate) -> DbResult<TaskStats> {
        let tasks = self.all().await?;
        Ok(TaskStats::compute(&tasks, today))
    }

    /// Check whether any task, regardless of owner, uses this id.
    async fn id_taken(&self, id: &str) -> DbResult<bool> {
        let task: Option<IdOnly> = self
            .client
            .select(("task", id))
            .await
            .map_err(|e| DbError::Query(Box::new(e)))?;
        Ok(task.is_some())
    }

    /// Generate an id not used by any existing task
    async fn unused_id(&self) -> DbResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.generate();
            if !self.id_taken(&id).await? {
                return Ok(id);
            }
            trace!("Generated task id collided: {}", id);
        }
        Err(DbError::IdGeneration {
            table: "task",
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}
