use super::auth::{auth_error_response, validated};
use crate::handlers::ErrorResponse;
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use usercore_auth::{AuthError, UpdateUserRequest, UserPage};
use usercore_models::UserProfile;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

fn user_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| auth_error_response(AuthError::ValidationError(e.body_text())))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .user_service
        .get(auth_user.user_id)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(profile))
}

/// Replace the authenticated user's profile fields
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let request = validated(payload)?;

    let profile = state
        .user_service
        .update(auth_user.user_id, request)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(user_id = profile.id, "Profile updated");
    Ok(Json(profile))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UserPage>, ApiError> {
    let Query(query) =
        query.map_err(|e| auth_error_response(AuthError::ValidationError(e.body_text())))?;

    let page = state
        .user_service
        .list(query.page, query.page_size)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(page))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = user_id(path)?;

    let profile = state.user_service.get(id).await.map_err(auth_error_response)?;

    Ok(Json(profile))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = user_id(path)?;
    let request = validated(payload)?;

    let profile = state
        .user_service
        .update(id, request)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(user_id = id, by = auth_user.user_id, "User updated");
    Ok(Json(profile))
}

/// Delete a user and revoke their sessions
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = user_id(path)?;

    state
        .user_service
        .delete(id)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(user_id = id, by = auth_user.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
