use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use usercore_auth::{AuthError, LoginRequest, RegisterRequest, TokenPair};
use usercore_models::UserProfile;
use validator::Validate;

// Column width of sessions.client_ip
const MAX_CLIENT_IP_LEN: usize = 45;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Map an engine error onto a status code and a JSON body.
///
/// Server-side failures are logged in full and reported to the client
/// with a generic message.
pub fn auth_error_response(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &err {
        AuthError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
        AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "invalid_session"),
        AuthError::SessionRevoked => (StatusCode::UNAUTHORIZED, "session_revoked"),
        AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "session_expired"),
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
        AuthError::RepositoryError(_)
        | AuthError::HashingError(_)
        | AuthError::JwtError(_)
        | AuthError::ConfigurationError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };

    if err.is_internal() {
        tracing::error!(error = %err, "Request failed");
        return (
            status,
            Json(ErrorResponse::new(code, "Internal server error")),
        );
    }

    tracing::warn!(error = %err, "Request rejected");
    (status, Json(ErrorResponse::new(code, &err.to_string())))
}

/// Unwrap a JSON body and run its validation rules
pub(crate) fn validated<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload
        .map_err(|e| auth_error_response(AuthError::ValidationError(e.body_text())))?;

    request
        .validate()
        .map_err(|e| auth_error_response(AuthError::from(e)))?;

    Ok(request)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    fn new(tokens: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), (StatusCode, Json<ErrorResponse>)> {
    let request = validated(payload)?;

    let profile = state
        .auth_service
        .register(request)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(user_id = profile.id, "User registered");
    Ok((StatusCode::CREATED, Json(profile)))
}

// API-level login request; device context comes from the transport
#[derive(Debug, Deserialize, Validate)]
pub struct ApiLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login with email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<ApiLoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = validated(payload)?;

    // Create service-level login request
    let login_request = LoginRequest {
        email: request.email,
        password: request.password,
        user_agent: user_agent(&headers),
        client_ip: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
    };

    let tokens = state
        .auth_service
        .login(login_request)
        .await
        .map_err(auth_error_response)?;

    let expires_in = state.auth_service.jwt.access_token_ttl().num_seconds();
    Ok(Json(TokenResponse::new(tokens, expires_in)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Exchange a refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = validated(payload)?;

    let tokens = state
        .auth_service
        .refresh_token(&request.refresh_token)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::SessionRevoked) {
                tracing::warn!("Revoked refresh token presented");
            }
            auth_error_response(e)
        })?;

    let expires_in = state.auth_service.jwt.access_token_ttl().num_seconds();
    Ok(Json(TokenResponse::new(tokens, expires_in)))
}

/// Logout (revoke the session behind a refresh token)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let request = validated(payload)?;

    state
        .auth_service
        .logout(&request.refresh_token)
        .await
        .map_err(auth_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Logout from every device of the authenticated user
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let revoked = state
        .auth_service
        .logout_all(user.user_id)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(user_id = user.user_id, revoked, "Revoked all sessions");
    Ok(StatusCode::NO_CONTENT)
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// First hop of `X-Forwarded-For`, falling back to the peer address
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    let mut ip = forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default();
    ip.truncate(MAX_CLIENT_IP_LEN);
    ip
}
