use crate::error::Result;
use crate::store::SessionStore;
use async_trait::async_trait;
use sqlx::PgPool;
use usercore_models::{NewSession, Session};

pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    /// Create a new session
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, refresh_token, user_agent, client_ip, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_session.user_id)
        .bind(&new_session.refresh_token)
        .bind(&new_session.user_agent)
        .bind(&new_session.client_ip)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Find session by refresh token, revoked or expired ones included
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>> {
        let session =
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token = $1")
                .bind(refresh_token)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session)
    }

    async fn revoke(&self, session_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked = TRUE, updated_at = NOW()
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        let revoked = result.rows_affected() == 1;
        tracing::debug!(session_id, revoked, "Session revoke");

        Ok(revoked)
    }

    /// Revoke all sessions for a user (logout from all devices)
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked = TRUE, updated_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id, count = result.rows_affected(), "Revoked user sessions");

        Ok(result.rows_affected())
    }
}
