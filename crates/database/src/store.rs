//! Storage capabilities consumed by the auth engine.
//!
//! Lookups return `Ok(None)` for "not found" so callers can tell a missing
//! record apart from a failing store.

use crate::error::Result;
use async_trait::async_trait;
use usercore_models::{NewSession, NewUser, Session, User, UserUpdate};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user. Fails with `DuplicateEntry` if the email is taken.
    async fn create(&self, new_user: &NewUser, password_hash: &str) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Overwrite the profile fields. `Ok(None)` if there is no such user.
    async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>>;

    /// Returns whether a user was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// A page of users ordered by id, plus the total user count.
    async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, new_session: &NewSession) -> Result<Session>;

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>>;

    /// Atomically mark a session revoked if it is not already.
    ///
    /// Returns `true` only for the call that flipped the flag, so two
    /// concurrent callers can never both observe an active session.
    async fn revoke(&self, session_id: i64) -> Result<bool>;

    /// Revoke every session of a user, returning how many changed.
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64>;
}
