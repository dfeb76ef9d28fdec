//! SQLite Store
//!
//! Implements the store contract over a sqlx connection pool. Foreign keys
//! are enabled on every connection so deleting a session cascades to its
//! tasks inside the storage layer.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::store::{NewTask, SessionRecord, TaskPatch, TaskRecord};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const TASK_COLUMNS: &str = "id, name, description, completed, session_id, created";

// == Store ==
/// Handle to the session/task store. Cheap to clone; all clones share the
/// same connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    // == Constructors ==
    /// Connects to the SQLite database at `url` (e.g. `sqlite:tasks.db`),
    /// creating the file if missing.
    ///
    /// An in-memory URL is routed through [`Store::in_memory`]: a pooled
    /// `:memory:` database would otherwise give every connection its own
    /// empty database.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self { pool })
    }

    /// Creates an in-memory store on a single shared connection.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .create_if_missing(true)
            .foreign_keys(true)
            .shared_cache(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    /// Accesses the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // == Sessions ==
    /// Returns the current number of sessions.
    pub async fn session_count(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
    }

    /// Inserts a new session with the given id, stamped with the current time.
    pub async fn create_session(&self, id: &str) -> sqlx::Result<SessionRecord> {
        let created = Utc::now();

        sqlx::query("INSERT INTO sessions (id, created) VALUES (?, ?)")
            .bind(id)
            .bind(created)
            .execute(&self.pool)
            .await?;

        Ok(SessionRecord {
            id: id.to_string(),
            created,
        })
    }

    /// Deletes all sessions created at or before `cutoff` and returns how
    /// many were removed. The schema's ON DELETE CASCADE removes the
    /// sessions' tasks as part of the same deletion.
    pub async fn delete_sessions_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE created <= ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // == Tasks ==
    /// Returns the total number of tasks across all sessions.
    pub async fn task_count(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await
    }

    /// Returns the number of tasks owned by one session.
    pub async fn task_count_for_session(&self, session_id: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Returns one page of a session's tasks, filtered by a substring match
    /// on name or description and ordered by creation time ascending.
    ///
    /// An empty `query` matches every task. LIKE wildcards in `query` are
    /// escaped so the match is a literal substring match.
    pub async fn find_tasks(
        &self,
        session_id: &str,
        skip: u32,
        take: u32,
        query: &str,
    ) -> sqlx::Result<Vec<TaskRecord>> {
        let pattern = escape_like(query);

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE session_id = ? \
               AND (name LIKE '%' || ? || '%' ESCAPE '\\' \
                OR description LIKE '%' || ? || '%' ESCAPE '\\') \
             ORDER BY created ASC, rowid ASC \
             LIMIT ? OFFSET ?"
        );

        sqlx::query_as(&sql)
            .bind(session_id)
            .bind(&pattern)
            .bind(&pattern)
            .bind(i64::from(take))
            .bind(i64::from(skip))
            .fetch_all(&self.pool)
            .await
    }

    /// Fetches a task by id, regardless of owner.
    pub async fn find_task_by_id(&self, id: &str) -> sqlx::Result<Option<TaskRecord>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");

        sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await
    }

    /// Inserts a new task with `completed = false`, stamped with the
    /// current time, and returns the stored row.
    pub async fn create_task(&self, task: NewTask<'_>) -> sqlx::Result<TaskRecord> {
        let sql = format!(
            "INSERT INTO tasks (id, name, description, completed, session_id, created) \
             VALUES (?, ?, ?, 0, ?, ?) \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as(&sql)
            .bind(task.id)
            .bind(task.name)
            .bind(task.description)
            .bind(task.session_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
    }

    /// Applies a partial update and returns the updated row, or `None` if
    /// the task no longer exists.
    pub async fn update_task(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> sqlx::Result<Option<TaskRecord>> {
        let sql = format!(
            "UPDATE tasks \
             SET name = COALESCE(?, name), \
                 description = COALESCE(?, description), \
                 completed = COALESCE(?, completed) \
             WHERE id = ? \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as(&sql)
            .bind(patch.name)
            .bind(patch.description)
            .bind(patch.completed)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes a task by id. Returns `false` if nothing was deleted, which
    /// callers surface as not-found.
    pub async fn delete_task(&self, id: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escapes SQL LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    async fn test_store() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    async fn seed_session(store: &Store) -> String {
        let id = Uuid::new_v4().to_string();
        store.create_session(&id).await.unwrap();
        id
    }

    async fn seed_task(store: &Store, session_id: &str, name: &str) -> TaskRecord {
        let id = Uuid::new_v4().to_string();
        store
            .create_task(NewTask {
                id: &id,
                name,
                description: None,
                session_id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_count_and_create() {
        let store = test_store().await;
        assert_eq!(store.session_count().await.unwrap(), 0);

        seed_session(&store).await;
        seed_session(&store).await;
        assert_eq!(store.session_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_task_defaults_to_not_completed() {
        let store = test_store().await;
        let session = seed_session(&store).await;

        let task = seed_task(&store, &session, "Buy milk").await;
        assert_eq!(task.name, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.session_id, session);
        assert!(task.description.is_none());
    }

    #[tokio::test]
    async fn test_create_task_rejects_unknown_session() {
        let store = test_store().await;

        let result = store
            .create_task(NewTask {
                id: "t1",
                name: "orphan",
                description: None,
                session_id: "no-such-session",
            })
            .await;

        match result {
            Err(sqlx::Error::Database(e)) => assert!(e.is_foreign_key_violation()),
            other => panic!("expected foreign key violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_tasks_filters_and_orders() {
        let store = test_store().await;
        let session = seed_session(&store).await;
        let other = seed_session(&store).await;

        seed_task(&store, &session, "Buy milk").await;
        seed_task(&store, &session, "Walk dog").await;
        seed_task(&store, &other, "Buy milk too").await;

        // Empty query matches everything in the session, in creation order.
        let all = store.find_tasks(&session, 0, 10, "").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Buy milk");
        assert_eq!(all[1].name, "Walk dog");

        // Substring match on name.
        let milk = store.find_tasks(&session, 0, 10, "milk").await.unwrap();
        assert_eq!(milk.len(), 1);
        assert_eq!(milk[0].name, "Buy milk");
    }

    #[tokio::test]
    async fn test_find_tasks_matches_description() {
        let store = test_store().await;
        let session = seed_session(&store).await;

        let id = Uuid::new_v4().to_string();
        store
            .create_task(NewTask {
                id: &id,
                name: "Errand",
                description: Some("get milk from the shop"),
                session_id: &session,
            })
            .await
            .unwrap();
        seed_task(&store, &session, "Walk dog").await;

        let found = store.find_tasks(&session, 0, 10, "milk").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Errand");
    }

    #[tokio::test]
    async fn test_find_tasks_escapes_like_wildcards() {
        let store = test_store().await;
        let session = seed_session(&store).await;

        seed_task(&store, &session, "100% done").await;
        seed_task(&store, &session, "1000 things").await;

        // A literal "%" must not act as a wildcard.
        let found = store.find_tasks(&session, 0, 10, "100%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "100% done");
    }

    #[tokio::test]
    async fn test_find_tasks_pagination() {
        let store = test_store().await;
        let session = seed_session(&store).await;

        for i in 0..5 {
            seed_task(&store, &session, &format!("task {}", i)).await;
        }

        let page = store.find_tasks(&session, 1, 2, "").await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "task 1");
        assert_eq!(page[1].name, "task 2");

        let tail = store.find_tasks(&session, 4, 10, "").await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].name, "task 4");
    }

    #[tokio::test]
    async fn test_update_task_partial() {
        let store = test_store().await;
        let session = seed_session(&store).await;
        let task = seed_task(&store, &session, "Buy milk").await;

        let updated = store
            .update_task(
                &task.id,
                TaskPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(updated.completed);
        assert_eq!(updated.name, "Buy milk");
        assert_eq!(updated.description, task.description);
    }

    #[tokio::test]
    async fn test_update_task_missing_returns_none() {
        let store = test_store().await;
        let updated = store
            .update_task("missing", TaskPatch::default())
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let store = test_store().await;
        let session = seed_session(&store).await;
        let task = seed_task(&store, &session, "Buy milk").await;

        assert!(store.delete_task(&task.id).await.unwrap());
        assert!(!store.delete_task(&task.id).await.unwrap());
        assert!(store.find_task_by_id(&task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_cascades_to_tasks() {
        let store = test_store().await;
        let session = seed_session(&store).await;
        let task = seed_task(&store, &session, "Buy milk").await;

        let deleted = store
            .delete_sessions_created_before(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        assert_eq!(store.session_count().await.unwrap(), 0);
        assert_eq!(store.task_count().await.unwrap(), 0);
        assert!(store.find_task_by_id(&task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_spares_recent() {
        let store = test_store().await;
        seed_session(&store).await;

        let deleted = store
            .delete_sessions_created_before(Utc::now() - Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(store.session_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_task_counts() {
        let store = test_store().await;
        let a = seed_session(&store).await;
        let b = seed_session(&store).await;

        seed_task(&store, &a, "one").await;
        seed_task(&store, &a, "two").await;
        seed_task(&store, &b, "three").await;

        assert_eq!(store.task_count().await.unwrap(), 3);
        assert_eq!(store.task_count_for_session(&a).await.unwrap(), 2);
        assert_eq!(store.task_count_for_session(&b).await.unwrap(), 1);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
