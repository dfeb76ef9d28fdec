//! API Module
//!
//! HTTP handlers and routing for the task-list REST API.
//!
//! # Endpoints
//! - `POST /api/auth` - Create a session and receive its bearer token
//! - `GET /api/tasks` - List/search the session's tasks (paginated)
//! - `GET /api/tasks/:id` - Fetch a single task
//! - `POST /api/tasks` - Create a task
//! - `PUT /api/tasks/:id` - Partially update a task
//! - `DELETE /api/tasks/:id` - Delete a task
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
