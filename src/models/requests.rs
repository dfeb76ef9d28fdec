//! Request DTOs for the task-list API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::models::{DEFAULT_PAGE_SIZE, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};

/// Request body for creating a task (POST /api/tasks)
///
/// # Fields
/// - `name`: Task name, required, at most 64 characters
/// - `description`: Optional description, at most 1024 characters
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    /// The task name. Deserialized as an Option so a missing field
    /// surfaces as a validation error rather than a body-decode error.
    pub name: Option<String>,
    /// Optional task description
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let Some(name) = &self.name else {
            return Some("name is required".to_string());
        };
        if name.chars().count() > MAX_NAME_LENGTH {
            return Some(format!(
                "name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            ));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Some(format!(
                    "description exceeds maximum length of {} characters",
                    MAX_DESCRIPTION_LENGTH
                ));
            }
        }
        None
    }
}

/// Request body for updating a task (PUT /api/tasks/:id)
///
/// All fields are optional; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(name) = &self.name {
            if name.chars().count() > MAX_NAME_LENGTH {
                return Some(format!(
                    "name exceeds maximum length of {} characters",
                    MAX_NAME_LENGTH
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Some(format!(
                    "description exceeds maximum length of {} characters",
                    MAX_DESCRIPTION_LENGTH
                ));
            }
        }
        None
    }
}

/// Query parameters for listing tasks (GET /api/tasks)
///
/// Limit/offset pagination plus an optional substring search over task
/// names and descriptions.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTasksQuery {
    /// How many tasks to skip (offset)
    #[serde(default)]
    pub skip: u32,
    /// How many tasks to take (limit); clamped into [1, 50] by the handler
    #[serde(default = "default_take")]
    pub take: u32,
    /// Substring to search for in task names and descriptions
    #[serde(default)]
    pub query: String,
}

fn default_take() -> u32 {
    DEFAULT_PAGE_SIZE
}
