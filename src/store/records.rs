//! Row types exchanged with the store.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A persisted session row.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub created: DateTime<Utc>,
}

/// A persisted task row, including the internal ownership fields.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
    pub session_id: String,
    pub created: DateTime<Utc>,
}

/// Fields for inserting a new task. `completed` always starts false and
/// `created` is stamped by the store.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub session_id: &'a str,
}

/// A partial update: `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}
