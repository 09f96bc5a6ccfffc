//! Result ordering for task queries

use crate::models::Task;
use std::cmp::Ordering;
use std::fmt;

/// A sortable task field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    DueDate,
    Title,
    CreatedAt,
}

impl OrderField {
    /// Parameter name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderField::DueDate => "due_date",
            OrderField::Title => "title",
            OrderField::CreatedAt => "created_at",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "due_date" => Some(OrderField::DueDate),
            "title" => Some(OrderField::Title),
            "created_at" => Some(OrderField::CreatedAt),
            _ => None,
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            OrderField::DueDate => a.due_date.cmp(&b.due_date),
            OrderField::Title => a.title.cmp(&b.title),
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

/// One sort key: a field and a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Parse `field` or `-field`
    fn parse(s: &str) -> Option<Self> {
        match s.strip_prefix('-') {
            Some(name) => OrderField::parse(name).map(Self::desc),
            None => OrderField::parse(s).map(Self::asc),
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ord = self.field.compare(a, b);
        if self.descending { ord.reverse() } else { ord }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }
        write!(f, "{}", self.field.as_str())
    }
}

/// Ordered list of sort keys.
///
/// Defaults to due date ascending. Ties on every key are broken by
/// creation time, then id, both ascending, so the order is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOrdering {
    keys: Vec<OrderKey>,
}

impl Default for TaskOrdering {
    fn default() -> Self {
        Self {
            keys: vec![OrderKey::asc(OrderField::DueDate)],
        }
    }
}

impl TaskOrdering {
    /// Ordering by the given keys; an empty list means the default
    pub fn new(keys: Vec<OrderKey>) -> Self {
        if keys.is_empty() {
            Self::default()
        } else {
            Self { keys }
        }
    }

    /// Parse a comma-separated list such as `-due_date,title`.
    ///
    /// Any unrecognized key, including an empty one, yields the default
    /// ordering.
    pub fn parse(raw: &str) -> Self {
        let keys: Option<Vec<OrderKey>> = raw
            .split(',')
            .map(|part| OrderKey::parse(part.trim()))
            .collect();
        keys.map(Self::new).unwrap_or_default()
    }

    /// The sort keys in priority order
    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    /// Whether this is the default ordering
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Total comparison including the tiebreak
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
    }

    /// Sort tasks by this ordering
    pub fn apply(&self, mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(|a, b| self.compare(a, b));
        tasks
    }
}

impl fmt::Display for TaskOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Sort tasks by `ordering`
pub fn apply_ordering(tasks: Vec<Task>, ordering: &TaskOrdering) -> Vec<Task> {
    ordering.apply(tasks)
}
