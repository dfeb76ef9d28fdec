//! Tasks API - A multi-tenant task-list REST API
//!
//! Anonymous clients obtain a bearer token representing a session and
//! manage tasks scoped to that session. Sessions and their tasks expire
//! and are swept after a configurable TTL.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod store;
pub mod sweeper;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use store::Store;
pub use sweeper::spawn_expiry_sweeper;
