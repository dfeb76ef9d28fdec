//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use anyhow::Context;

// == Default Values ==
/// Maximum number of concurrently active sessions
pub const DEFAULT_MAX_SESSION_COUNT: i64 = 1000;
/// Maximum number of tasks across all sessions
pub const DEFAULT_MAX_TASKS_COUNT: i64 = 500_000;
/// Maximum number of tasks a single session may own
pub const DEFAULT_MAX_TASKS_PER_SESSION: i64 = 500;

/// Session-creation rate limit: requests per window
pub const DEFAULT_SESSION_POST_LIMIT: u32 = 1;
/// Session-creation rate limit window in seconds
pub const DEFAULT_SESSION_POST_TTL: u64 = 20;

/// Read rate limit: requests per window
pub const DEFAULT_GET_LIMIT: u32 = 200;
/// Read rate limit window in seconds
pub const DEFAULT_GET_TTL: u64 = 60;

/// Mutation (create/update/delete) rate limit: requests per window
pub const DEFAULT_POST_PUT_DELETE_LIMIT: u32 = 30;
/// Mutation rate limit window in seconds
pub const DEFAULT_POST_PUT_DELETE_TTL: u64 = 60;

/// Token lifetime in seconds
pub const DEFAULT_JWT_EXPIRATION_TIME: u64 = 86_400;

/// Sweeper schedule: minute 0 of every 6th hour
pub const DEFAULT_CRON_PATTERN: &str = "0 */6 * * *";

/// Server configuration parameters.
///
/// All values can be configured via environment variables. Everything has a
/// sensible default except `JWT_SECRET`, which must be provided.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify bearer tokens (required)
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_expiration_time: u64,
    /// Session lifetime in seconds; sessions older than this are swept
    pub session_ttl: u64,
    /// Maximum number of concurrently active sessions
    pub max_session_count: i64,
    /// Maximum number of tasks across all sessions
    pub max_tasks_count: i64,
    /// Maximum number of tasks per session
    pub max_tasks_per_session: i64,
    /// Session-creation rate limit and window (seconds)
    pub session_post_limit: u32,
    pub session_post_ttl: u64,
    /// Read rate limit and window (seconds)
    pub get_limit: u32,
    pub get_ttl: u64,
    /// Mutation rate limit and window (seconds)
    pub post_put_delete_limit: u32,
    pub post_put_delete_ttl: u64,
    /// Cron pattern for the expiry sweeper
    pub cron_pattern: String,
    /// HTTP server port
    pub server_port: u16,
    /// SQLite connection URL
    pub database_url: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Fails if `JWT_SECRET` is unset. `SESSION_TTL` defaults to
    /// `JWT_EXPIRATION_TIME` so a token never outlives its session record.
    ///
    /// # Environment Variables
    /// - `JWT_SECRET` - Token signing secret (required)
    /// - `JWT_EXPIRATION_TIME` - Token lifetime in seconds (default: 86400)
    /// - `SESSION_TTL` - Session lifetime in seconds (default: JWT_EXPIRATION_TIME)
    /// - `MAX_SESSION_COUNT` - Session quota (default: 1000)
    /// - `MAX_TASKS_COUNT` - Global task quota (default: 500000)
    /// - `MAX_TASKS_PER_SESSION` - Per-session task quota (default: 500)
    /// - `SESSION_POST_LIMIT` / `SESSION_POST_TTL` - Session-creation throttle (default: 1 per 20s)
    /// - `GET_LIMIT` / `GET_TTL` - Read throttle (default: 200 per 60s)
    /// - `POST_PUT_DELETE_LIMIT` / `POST_PUT_DELETE_TTL` - Mutation throttle (default: 30 per 60s)
    /// - `CRON_PATTERN` - Sweeper schedule (default: "0 */6 * * *")
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_URL` - SQLite URL (default: "sqlite:tasks.db")
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let jwt_expiration_time = env_or("JWT_EXPIRATION_TIME", DEFAULT_JWT_EXPIRATION_TIME);
        let session_ttl = env_or("SESSION_TTL", jwt_expiration_time);

        Ok(Self {
            jwt_secret,
            jwt_expiration_time,
            session_ttl,
            max_session_count: env_or("MAX_SESSION_COUNT", DEFAULT_MAX_SESSION_COUNT),
            max_tasks_count: env_or("MAX_TASKS_COUNT", DEFAULT_MAX_TASKS_COUNT),
            max_tasks_per_session: env_or(
                "MAX_TASKS_PER_SESSION",
                DEFAULT_MAX_TASKS_PER_SESSION,
            ),
            session_post_limit: env_or("SESSION_POST_LIMIT", DEFAULT_SESSION_POST_LIMIT),
            session_post_ttl: env_or("SESSION_POST_TTL", DEFAULT_SESSION_POST_TTL),
            get_limit: env_or("GET_LIMIT", DEFAULT_GET_LIMIT),
            get_ttl: env_or("GET_TTL", DEFAULT_GET_TTL),
            post_put_delete_limit: env_or(
                "POST_PUT_DELETE_LIMIT",
                DEFAULT_POST_PUT_DELETE_LIMIT,
            ),
            post_put_delete_ttl: env_or("POST_PUT_DELETE_TTL", DEFAULT_POST_PUT_DELETE_TTL),
            cron_pattern: env::var("CRON_PATTERN")
                .unwrap_or_else(|_| DEFAULT_CRON_PATTERN.to_string()),
            server_port: env_or("SERVER_PORT", 3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:tasks.db".to_string()),
        })
    }
}

/// Reads an environment variable and parses it, falling back to `default`
/// when the variable is unset or unparsable.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
