//! API Handlers
//!
//! HTTP request handlers for each endpoint. All `/api/tasks` handlers run
//! behind the bearer-auth middleware and read the verified session from a
//! request extension.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::auth::{AuthService, AuthSession, TokenService};
use crate::config::Config;
use crate::error::Result;
use crate::limiter::{RateLimiter, WindowConfig};
use crate::models::{
    AuthResponse, CreateTaskRequest, HealthResponse, ListTasksQuery, TaskResponse,
    UpdateTaskRequest, MAX_PAGE_SIZE,
};
use crate::store::Store;
use crate::tasks::TaskService;

/// Application state shared across all handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Token issue/verify, used by the auth middleware
    pub tokens: TokenService,
    /// Session creation with quota enforcement
    pub auth: AuthService,
    /// Session-scoped task operations
    pub tasks: TaskService,
    /// Per-client, per-route-class request throttling
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates the application state from a connected store and the
    /// configuration.
    pub fn new(store: Store, config: &Config) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiration_time);
        let auth = AuthService::new(store.clone(), tokens.clone(), config.max_session_count);
        let tasks = TaskService::new(
            store,
            config.max_tasks_count,
            config.max_tasks_per_session,
        );
        let limiter = Arc::new(RateLimiter::new(
            WindowConfig::new(
                config.session_post_limit,
                Duration::from_secs(config.session_post_ttl),
            ),
            WindowConfig::new(config.get_limit, Duration::from_secs(config.get_ttl)),
            WindowConfig::new(
                config.post_put_delete_limit,
                Duration::from_secs(config.post_put_delete_ttl),
            ),
        ));

        Self {
            tokens,
            auth,
            tasks,
            limiter,
        }
    }
}

/// Handler for POST /api/auth
///
/// Creates a new session and returns its id and bearer token.
pub async fn create_session_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth.create_session().await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /api/tasks
///
/// Lists the session's tasks with limit/offset pagination and an optional
/// substring search. `take` is clamped into [1, 50].
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>> {
    let take = params.take.clamp(1, MAX_PAGE_SIZE);

    let tasks = state
        .tasks
        .list_tasks(&session.session_id, params.skip, take, &params.query)
        .await?;

    Ok(Json(tasks))
}

/// Handler for GET /api/tasks/:id
pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>> {
    let task = state.tasks.get_task(&session.session_id, &task_id).await?;

    Ok(Json(task))
}

/// Handler for POST /api/tasks
pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .tasks
        .create_task(&session.session_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /api/tasks/:id
pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>> {
    let task = state
        .tasks
        .update_task(&session.session_id, &task_id, request)
        .await?;

    Ok(Json(task))
}

/// Handler for DELETE /api/tasks/:id
pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<String>,
) -> Result<StatusCode> {
    state
        .tasks
        .delete_task(&session.session_id, &task_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DEFAULT_MAX_SESSION_COUNT, DEFAULT_MAX_TASKS_COUNT, DEFAULT_MAX_TASKS_PER_SESSION,
    };

    fn test_config() -> Config {
        Config {
            jwt_secret: "handler-test-secret".to_string(),
            jwt_expiration_time: 3600,
            session_ttl: 3600,
            max_session_count: DEFAULT_MAX_SESSION_COUNT,
            max_tasks_count: DEFAULT_MAX_TASKS_COUNT,
            max_tasks_per_session: DEFAULT_MAX_TASKS_PER_SESSION,
            session_post_limit: 100,
            session_post_ttl: 60,
            get_limit: 1000,
            get_ttl: 60,
            post_put_delete_limit: 1000,
            post_put_delete_ttl: 60,
            cron_pattern: "0 */6 * * *".to_string(),
            server_port: 0,
            database_url: "sqlite::memory:".to_string(),
        }
    }

    async fn test_state() -> AppState {
        let store = Store::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        AppState::new(store, &test_config())
    }

    #[tokio::test]
    async fn test_create_session_handler() {
        let state = test_state().await;

        let (status, Json(response)) =
            create_session_handler(State(state.clone())).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            state.tokens.verify(&response.token).unwrap(),
            response.session_id
        );
    }

    #[tokio::test]
    async fn test_task_handlers_roundtrip() {
        let state = test_state().await;
        let (_, Json(auth)) = create_session_handler(State(state.clone())).await.unwrap();
        let session = AuthSession {
            session_id: auth.session_id,
        };

        let (status, Json(created)) = create_task_handler(
            State(state.clone()),
            Extension(session.clone()),
            Json(CreateTaskRequest {
                name: Some("Buy milk".to_string()),
                description: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(fetched) = get_task_handler(
            State(state.clone()),
            Extension(session.clone()),
            Path(created.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(fetched.name, "Buy milk");

        let status = delete_task_handler(
            State(state.clone()),
            Extension(session.clone()),
            Path(created.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let result =
            get_task_handler(State(state), Extension(session), Path(created.id)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_tasks_handler_clamps_take() {
        let state = test_state().await;
        let (_, Json(auth)) = create_session_handler(State(state.clone())).await.unwrap();
        let session = AuthSession {
            session_id: auth.session_id,
        };

        // take=0 must still return results (clamped up to 1).
        create_task_handler(
            State(state.clone()),
            Extension(session.clone()),
            Json(CreateTaskRequest {
                name: Some("first".to_string()),
                description: None,
            }),
        )
        .await
        .unwrap();

        let Json(tasks) = list_tasks_handler(
            State(state),
            Extension(session),
            Query(ListTasksQuery {
                skip: 0,
                take: 0,
                query: String::new(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
