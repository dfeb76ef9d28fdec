//! API Routes
//!
//! Configures the Axum router. Task routes sit behind two layers, applied
//! outside-in: the rate limiter first (a flooded client gets 429 before
//! anything else runs), then bearer authentication.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_session_handler, create_task_handler, delete_task_handler, get_task_handler,
    health_handler, list_tasks_handler, update_task_handler, AppState,
};
use crate::auth::require_bearer_auth;
use crate::limiter::{limit_session_create, limit_task_routes};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/auth` - Create a session (throttled per client)
/// - `GET/POST /api/tasks`, `GET/PUT/DELETE /api/tasks/:id` - Task CRUD
///   (throttled per client and route class, bearer auth required)
/// - `GET /health` - Health check, unauthenticated and unthrottled
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/auth", post(create_session_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit_session_create,
        ));

    let task_routes = Router::new()
        .route(
            "/tasks",
            get(list_tasks_handler).post(create_task_handler),
        )
        .route(
            "/tasks/:id",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        // Layers run bottom-up from here: the limiter wraps auth.
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit_task_routes,
        ));

    Router::new()
        .nest("/api", auth_routes.merge(task_routes))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
