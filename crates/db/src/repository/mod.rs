//! Repository modules for database operations
//!
//! Provides the owner-scoped task repository, the user repository, and the
//! pure filtering, ordering and statistics code they share.

mod filter;
mod ordering;
mod stats;
mod task;
mod user;

pub use filter::{FilterParams, Predicate, TaskFilter, build_predicate};
pub use ordering::{OrderField, OrderKey, TaskOrdering, apply_ordering};
pub use stats::TaskStats;
pub use task::TaskRepository;
pub use user::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, UserRepository};
