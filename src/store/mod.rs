//! Store Module
//!
//! Persistent session and task records behind a minimal query contract.
//! The relational engine itself is an external collaborator (SQLite via
//! sqlx); everything above it only sees the methods on [`Store`].

mod records;
mod sqlite;

// Re-export public types
pub use records::{NewTask, SessionRecord, TaskPatch, TaskRecord};
pub use sqlite::Store;
