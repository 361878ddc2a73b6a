use thiserror::Error;
use usercore_database::DatabaseError;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Unknown email and wrong password are deliberately the same error.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid session")]
    InvalidSession,

    #[error("Session revoked")]
    SessionRevoked,

    #[error("Session expired")]
    SessionExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Repository error: {0}")]
    RepositoryError(#[from] DatabaseError),

    #[error("Password hashing error: {0}")]
    HashingError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// Whether the failure is on the server side rather than the caller's.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::RepositoryError(_)
                | AuthError::HashingError(_)
                | AuthError::JwtError(_)
                | AuthError::ConfigurationError(_)
        )
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AuthError::HashingError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}
