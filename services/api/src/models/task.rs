//! Task model and list query parameters

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Task entity, always owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New task payload, already validated and trimmed
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
}

/// Partial task update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Per-user task counts
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
}

/// Completion filter for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Parse a query parameter; unknown values mean "all".
    pub fn from_param(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }
}

/// Sort key for task listings.
///
/// Mapped to column names through a fixed allow-list; user input is
/// never interpolated into query text. Unknown values fall back to
/// `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    Created,
    Updated,
    Priority,
    DueDate,
    Title,
}

impl TaskSort {
    /// Parse a query parameter; unknown values mean creation order.
    pub fn from_param(value: &str) -> Self {
        match value {
            "created" | "created_at" => Self::Created,
            "updated" | "updated_at" => Self::Updated,
            "priority" => Self::Priority,
            "due_date" | "dueDate" => Self::DueDate,
            "title" => Self::Title,
            _ => Self::Created,
        }
    }

    /// Column name used in the ORDER BY clause.
    pub fn column(self) -> &'static str {
        match self {
            Self::Created => "created_at",
            Self::Updated => "updated_at",
            Self::Priority => "priority",
            Self::DueDate => "due_date",
            Self::Title => "title",
        }
    }
}

/// Sort direction for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a query parameter; unknown values mean descending.
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// SQL keyword for the ORDER BY clause.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
