//! Task Access Service
//!
//! Every operation is scoped to a verified session id. A task that does
//! not exist and a task owned by a different session are deliberately
//! indistinguishable: both surface as not-found, so the existence of other
//! sessions' tasks never leaks.

use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use crate::store::{NewTask, Store, TaskPatch, TaskRecord};

/// Session-scoped task operations with quota enforcement.
#[derive(Clone)]
pub struct TaskService {
    store: Store,
    max_tasks_count: i64,
    max_tasks_per_session: i64,
}

impl TaskService {
    pub fn new(store: Store, max_tasks_count: i64, max_tasks_per_session: i64) -> Self {
        Self {
            store,
            max_tasks_count,
            max_tasks_per_session,
        }
    }

    // == List ==
    /// Returns one page of the session's tasks, ordered by creation time
    /// ascending. `query` filters by substring of name or description; the
    /// empty query matches everything. Empty results are valid, including
    /// for a session that was already swept.
    pub async fn list_tasks(
        &self,
        session_id: &str,
        skip: u32,
        take: u32,
        query: &str,
    ) -> Result<Vec<TaskResponse>> {
        let records = self.store.find_tasks(session_id, skip, take, query).await?;

        Ok(records.into_iter().map(TaskResponse::from).collect())
    }

    // == Get ==
    /// Fetches a single task owned by the session.
    pub async fn get_task(&self, session_id: &str, task_id: &str) -> Result<TaskResponse> {
        let record = self.find_owned(session_id, task_id).await?;

        Ok(record.into())
    }

    // == Create ==
    /// Creates a task for the session, subject to the global and
    /// per-session task quotas.
    ///
    /// Both counts are read fresh from the store; the check-then-insert
    /// sequence is not atomic and may overshoot slightly under concurrent
    /// writers, which is accepted. If the session was swept between token
    /// verification and the insert, the foreign-key failure surfaces as
    /// not-found rather than an internal error.
    pub async fn create_task(
        &self,
        session_id: &str,
        request: CreateTaskRequest,
    ) -> Result<TaskResponse> {
        if let Some(message) = request.validate() {
            return Err(ApiError::InvalidInput(message));
        }
        // validate() guarantees the name is present.
        let name = request.name.as_deref().unwrap_or_default();

        let current_task_count = self.store.task_count().await?;
        if current_task_count >= self.max_tasks_count {
            return Err(ApiError::QuotaExceeded(
                "the maximum number of tasks has been reached".to_string(),
            ));
        }

        let session_task_count = self.store.task_count_for_session(session_id).await?;
        if session_task_count >= self.max_tasks_per_session {
            return Err(ApiError::QuotaExceeded(
                "the maximum number of tasks for this session has been reached".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let record = match self
            .store
            .create_task(NewTask {
                id: &id,
                name,
                description: request.description.as_deref(),
                session_id,
            })
            .await
        {
            Ok(record) => record,
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                return Err(ApiError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Task created. {} out of a maximum of {} tasks created.",
            current_task_count + 1,
            self.max_tasks_count
        );

        Ok(record.into())
    }

    // == Update ==
    /// Applies a partial update to a task owned by the session. Absent
    /// fields are left unchanged.
    pub async fn update_task(
        &self,
        session_id: &str,
        task_id: &str,
        request: UpdateTaskRequest,
    ) -> Result<TaskResponse> {
        if let Some(message) = request.validate() {
            return Err(ApiError::InvalidInput(message));
        }

        let record = self.find_owned(session_id, task_id).await?;

        let updated = self
            .store
            .update_task(
                &record.id,
                TaskPatch {
                    name: request.name,
                    description: request.description,
                    completed: request.completed,
                },
            )
            .await?
            // Deleted between the ownership check and the update.
            .ok_or(ApiError::NotFound)?;

        Ok(updated.into())
    }

    // == Delete ==
    /// Deletes a task owned by the session. A delete that races another
    /// delete surfaces as not-found.
    pub async fn delete_task(&self, session_id: &str, task_id: &str) -> Result<()> {
        let record = self.find_owned(session_id, task_id).await?;

        if !self.store.delete_task(&record.id).await? {
            return Err(ApiError::NotFound);
        }

        info!("Task deleted");
        Ok(())
    }

    /// Fetches a task and enforces the ownership rule: absent and
    /// foreign-owned are the same not-found.
    async fn find_owned(&self, session_id: &str, task_id: &str) -> Result<TaskRecord> {
        match self.store.find_task_by_id(task_id).await? {
            Some(record) if record.session_id == session_id => Ok(record),
            _ => Err(ApiError::NotFound),
        }
    }
}
