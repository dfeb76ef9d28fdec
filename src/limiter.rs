//! Rate Limiter
//!
//! Sliding-window request counters keyed by (route class, client). Every
//! route belongs to one of three independently configured classes:
//! session creation, reads, and mutations. State is process-local; a
//! horizontally scaled deployment would need these counters in a shared
//! store.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::error::ApiError;

/// Groups of endpoints sharing one rate-limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// POST /api/auth - the quota-bypass surface, throttled hardest
    SessionCreate,
    /// GET /api/tasks and GET /api/tasks/:id
    Read,
    /// POST, PUT and DELETE under /api/tasks
    Mutation,
}

/// One window configuration: at most `limit` requests per `ttl`.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub limit: u32,
    pub ttl: Duration,
}

impl WindowConfig {
    pub fn new(limit: u32, ttl: Duration) -> Self {
        Self { limit, ttl }
    }
}

/// Sliding-window rate limiter backed by `DashMap`.
///
/// Each (class, client) pair maps to a `VecDeque<Instant>` recording the
/// timestamps of recent requests. On every check the window is trimmed to
/// the class TTL before the count is compared against the class limit.
pub struct RateLimiter {
    windows: DashMap<(RouteClass, String), VecDeque<Instant>>,
    session_create: WindowConfig,
    read: WindowConfig,
    mutation: WindowConfig,
}

impl RateLimiter {
    pub fn new(session_create: WindowConfig, read: WindowConfig, mutation: WindowConfig) -> Self {
        Self {
            windows: DashMap::new(),
            session_create,
            read,
            mutation,
        }
    }

    fn config(&self, class: RouteClass) -> WindowConfig {
        match class {
            RouteClass::SessionCreate => self.session_create,
            RouteClass::Read => self.read,
            RouteClass::Mutation => self.mutation,
        }
    }

    /// Checks whether `client` may make another request in `class`. If the
    /// request is allowed the current timestamp is recorded; otherwise
    /// `RateLimited` is returned and nothing is recorded.
    pub fn check(&self, class: RouteClass, client: &str) -> Result<(), ApiError> {
        let WindowConfig { limit, ttl } = self.config(class);
        let now = Instant::now();

        let mut entry = self
            .windows
            .entry((class, client.to_owned()))
            .or_default();
        let timestamps = entry.value_mut();

        // Trim expired entries from the front of the deque.
        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) > ttl {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= limit as usize {
            return Err(ApiError::RateLimited);
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// Removes entries whose windows are completely empty so memory usage
    /// stays bounded.
    pub fn cleanup(&self) {
        let now = Instant::now();

        self.windows.retain(|(class, _), timestamps| {
            let ttl = self.config(*class).ttl;
            while let Some(&front) = timestamps.front() {
                if now.duration_since(front) > ttl {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }
            !timestamps.is_empty()
        });
    }

    /// Spawns a background task that periodically drops stale windows.
    ///
    /// Returns the `JoinHandle` so the caller can abort the task during
    /// shutdown.
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                self.cleanup();
            }
        })
    }
}

// == Middleware ==

/// Throttles POST /api/auth under the session-creation window.
pub async fn limit_session_create(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    if let Err(error) = state.limiter.check(RouteClass::SessionCreate, &client) {
        return error.into_response();
    }

    next.run(request).await
}

/// Throttles /api/tasks routes: GET requests under the read window,
/// everything else under the mutation window.
pub async fn limit_task_routes(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let class = if request.method() == Method::GET {
        RouteClass::Read
    } else {
        RouteClass::Mutation
    };

    let client = client_key(&request);
    if let Err(error) = state.limiter.check(class, &client) {
        return error.into_response();
    }

    next.run(request).await
}

/// Derives the client identity for throttling: the first `x-forwarded-for`
/// entry when present, else the peer socket address, else a shared
/// fallback bucket.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return forwarded.to_string();
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}
