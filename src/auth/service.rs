//! Session creation
//!
//! Creates sessions subject to the global session quota and hands out the
//! matching bearer token.

use tracing::info;
use uuid::Uuid;

use crate::auth::TokenService;
use crate::error::{ApiError, Result};
use crate::models::AuthResponse;
use crate::store::Store;

/// Creates sessions and issues their tokens.
#[derive(Clone)]
pub struct AuthService {
    store: Store,
    tokens: TokenService,
    max_session_count: i64,
}

impl AuthService {
    pub fn new(store: Store, tokens: TokenService, max_session_count: i64) -> Self {
        Self {
            store,
            tokens,
            max_session_count,
        }
    }

    /// Creates a new session and returns its id together with a signed
    /// bearer token.
    ///
    /// The session count is read fresh from the store on every call; at or
    /// over `MAX_SESSION_COUNT` the request fails with `QuotaExceeded`.
    /// The count-then-insert sequence is not atomic, so concurrent calls
    /// near the limit may overshoot slightly; that is accepted.
    pub async fn create_session(&self) -> Result<AuthResponse> {
        let current_session_count = self.store.session_count().await?;
        if current_session_count >= self.max_session_count {
            return Err(ApiError::QuotaExceeded(
                "the maximum number of sessions has been reached".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let session = self.store.create_session(&id).await?;

        info!(
            "Session created. {} out of a maximum of {} sessions created.",
            current_session_count + 1,
            self.max_session_count
        );

        let token = self.tokens.issue(&session.id)?;

        Ok(AuthResponse {
            session_id: session.id,
            token,
        })
    }
}
