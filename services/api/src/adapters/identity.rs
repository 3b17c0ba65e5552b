//! services/api/src/adapters/identity.rs
//!
//! Resolves session tokens against the sessions table the auth service
//! writes. This adapter never issues or revokes sessions.

use async_trait::async_trait;
use sqlx::PgPool;
use storefront_core::ports::{IdentityService, PortError, PortResult};
use uuid::Uuid;

/// A database adapter that implements the `IdentityService` port.
#[derive(Clone)]
pub struct PgIdentity {
    pool: PgPool,
}

impl PgIdentity {
    /// Creates a new `PgIdentity`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityService for PgIdentity {
    async fn resolve_session(&self, token: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unavailable(e.to_string()))?;

        user_id.ok_or(PortError::Unauthorized)
    }
}
