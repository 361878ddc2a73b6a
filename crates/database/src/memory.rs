//! In-memory stores with the same invariants as the Postgres ones.
//!
//! Each store counts the write calls it receives so callers can assert that
//! an operation left storage untouched.

use crate::error::{DatabaseError, Result};
use crate::store::{CredentialStore, SessionStore};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use usercore_models::{NewSession, NewUser, Session, User, UserUpdate};

struct Table<T> {
    rows: Vec<T>,
    last_id: i64,
}

// Not derived: the derive would demand `T: Default`
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Table<User>>,
    writes: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create`/`update`/`delete` calls received, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, new_user: &NewUser, password_hash: &str) -> Result<User> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.users.write().await;

        if table.rows.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::duplicate("User", "email"));
        }

        let now = Utc::now();
        let user = User {
            id: table.next_id(),
            email: new_user.email.clone(),
            password_hash: password_hash.to_string(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            phone: new_user.phone.clone(),
            birthdate: new_user.birthdate,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let table = self.users.read().await;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let table = self.users.read().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.users.write().await;

        let Some(user) = table.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.first_name = update.first_name.clone();
        user.last_name = update.last_name.clone();
        user.phone = update.phone.clone();
        user.birthdate = update.birthdate;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.users.write().await;

        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        Ok(table.rows.len() < before)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)> {
        let table = self.users.read().await;
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);

        // Rows are appended with increasing ids, so insertion order is id order
        let page = table.rows.iter().skip(offset).take(limit).cloned().collect();
        Ok((page, table.rows.len() as i64))
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<Table<Session>>,
    writes: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create`/`revoke`/`revoke_all_for_user` calls received.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn sessions_for_user(&self, user_id: i64) -> Vec<Session> {
        let table = self.sessions.read().await;
        table
            .rows
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.sessions.write().await;

        if table
            .rows
            .iter()
            .any(|s| s.refresh_token == new_session.refresh_token)
        {
            return Err(DatabaseError::duplicate("Session", "refresh_token"));
        }

        let now = Utc::now();
        let session = Session {
            id: table.next_id(),
            user_id: new_session.user_id,
            refresh_token: new_session.refresh_token.clone(),
            user_agent: new_session.user_agent.clone(),
            client_ip: new_session.client_ip.clone(),
            revoked: false,
            expires_at: new_session.expires_at,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(session.clone());

        Ok(session)
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>> {
        let table = self.sessions.read().await;
        Ok(table
            .rows
            .iter()
            .find(|s| s.refresh_token == refresh_token)
            .cloned())
    }

    async fn revoke(&self, session_id: i64) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.sessions.write().await;

        match table
            .rows
            .iter_mut()
            .find(|s| s.id == session_id && !s.revoked)
        {
            Some(session) => {
                session.revoked = true;
                session.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut table = self.sessions.write().await;
        let now = Utc::now();

        let mut count = 0;
        for session in table
            .rows
            .iter_mut()
            .filter(|s| s.user_id == user_id && !s.revoked)
        {
            session.revoked = true;
            session.updated_at = now;
            count += 1;
        }

        Ok(count)
    }
}
