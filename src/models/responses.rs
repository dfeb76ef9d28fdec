//! Response DTOs for the task-list API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::store::TaskRecord;

/// Response body for session creation (POST /api/auth)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Opaque id of the newly created session
    pub session_id: String,
    /// Signed bearer token whose subject is the session id
    pub token: String,
}

/// Response body for a single task
///
/// A projection of the stored task: `session_id` and `created` are
/// internal fields and never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl From<TaskRecord> for TaskResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            completed: record.completed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
