//! Tasks Module
//!
//! Session-scoped task access: ownership checks, task quotas and CRUD on
//! top of the store.

mod service;

pub use service::TaskService;
