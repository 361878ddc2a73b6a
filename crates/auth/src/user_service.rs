use crate::error::{AuthError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use usercore_database::{CredentialStore, SessionStore};
use usercore_models::{UserProfile, UserUpdate};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserProfile>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Read and maintain user profiles after registration.
pub struct UserService {
    users: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn CredentialStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { users, sessions }
    }

    pub async fn get(&self, id: i64) -> Result<UserProfile> {
        self.users
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// One page of users, ordered by id. Pages start at 1; out-of-range
    /// values fall back to the first page and the default size.
    pub async fn list(&self, page: Option<i64>, page_size: Option<i64>) -> Result<UserPage> {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = match page_size {
            Some(size) if size >= 1 => size.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        let offset = (page - 1).saturating_mul(page_size);

        let (users, total) = self.users.list(offset, page_size).await?;

        Ok(UserPage {
            users: users.into_iter().map(UserProfile::from).collect(),
            total,
            page,
            page_size,
        })
    }

    /// Replace the profile fields of a user
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<UserProfile> {
        let update = UserUpdate {
            first_name: Some(request.first_name),
            last_name: Some(request.last_name),
            phone: request.phone,
            birthdate: request.birthdate,
        };

        self.users
            .update(id, &update)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete a user after revoking every session they hold
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.sessions.revoke_all_for_user(id).await?;

        if !self.users.delete(id).await? {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}
