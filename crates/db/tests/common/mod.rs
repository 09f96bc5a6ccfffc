//! Test infrastructure for store-level integration tests
//!
//! Each test gets its own in-memory database so no state is shared.

use chrono::{Days, NaiveDate};
use taskmate_db::{Database, NewTask, Task, UserId};

pub const PASSWORD: &str = "integration-pass";

/// Test context holding an isolated, initialized database
pub struct TestContext {
    pub db: Database,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = Database::connect_in_memory().await.unwrap();
        db.init().await.unwrap();
        Self { db }
    }

    /// Register a user and return its identity
    pub async fn user(&self, username: &str) -> UserId {
        self.db
            .users()
            .register(username, None, PASSWORD)
            .await
            .unwrap()
            .id
    }

    /// Create a task owned by `owner`
    pub async fn task(
        &self,
        owner: &UserId,
        title: &str,
        description: &str,
        due_date: NaiveDate,
        completed: bool,
    ) -> Task {
        self.db
            .tasks(owner)
            .create(
                &NewTask::new(title, due_date)
                    .with_description(description)
                    .with_completed(completed),
            )
            .await
            .unwrap()
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    if days >= 0 {
        today().checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today().checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

pub fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}
