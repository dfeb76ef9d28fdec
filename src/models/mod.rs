//! Request and Response models for the task-list API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest};
pub use responses::{AuthResponse, ErrorResponse, HealthResponse, TaskResponse};

// == Public Constants ==
/// Maximum allowed task name length in characters
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum allowed task description length in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Default page size for task listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum page size for task listings
pub const MAX_PAGE_SIZE: u32 = 50;
