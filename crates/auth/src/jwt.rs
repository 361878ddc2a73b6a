use crate::clock::Clock;
use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use usercore_models::User;
use uuid::Uuid;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: i64, // User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>, // Access tokens only
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // Keeps tokens minted in the same second distinct
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// A signed token together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "usercore".to_string(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::hours(7 * 24),
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AuthError::ConfigurationError("JWT_SECRET must be set".to_string()))?;

        let mut config = Self::new(secret);

        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Some(minutes) = env_i64("JWT_ACCESS_EXPIRY_MINUTES")? {
            config.access_token_ttl = Duration::minutes(minutes);
        }
        if let Some(hours) = env_i64("JWT_REFRESH_EXPIRY_HOURS")? {
            config.refresh_token_ttl = Duration::hours(hours);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigurationError(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if self.access_token_ttl <= Duration::zero() || self.refresh_token_ttl <= Duration::zero() {
            return Err(AuthError::ConfigurationError(
                "Token lifetimes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_i64(name: &str) -> Result<Option<i64>> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AuthError::ConfigurationError(format!("{} must be an integer", name))),
        Err(_) => Ok(None),
    }
}

/// Signs and verifies HS256 tokens with one process-wide secret.
///
/// Expiry is checked against the injected clock with no leeway; the
/// library's own wall-clock expiry check is disabled.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: Algorithm::HS256,
            issuer: config.issuer,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
            clock,
        })
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Sign a token for `user_id` that expires `ttl` from now.
    pub fn issue(
        &self,
        user_id: i64,
        email: Option<&str>,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken> {
        let now = self.clock.now();
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user_id,
            email: email.map(str::to_string),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtError(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Generate an access token carrying the user's id and email
    pub fn generate_access_token(&self, user: &User) -> Result<IssuedToken> {
        self.issue(
            user.id,
            Some(&user.email),
            TokenType::Access,
            self.access_token_ttl,
        )
    }

    /// Generate a refresh token carrying only the user's id
    pub fn generate_refresh_token(&self, user: &User) -> Result<IssuedToken> {
        self.issue(user.id, None, TokenType::Refresh, self.refresh_token_ttl)
    }

    /// Validate signature, issuer and expiry, and decode the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if self.clock.now().timestamp() >= token_data.claims.exp {
            return Err(AuthError::InvalidToken("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    /// Validate access token specifically
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate_token_type(token, TokenType::Access)
    }

    /// Validate refresh token specifically
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate_token_type(token, TokenType::Refresh)
    }

    fn validate_token_type(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != expected {
            return Err(AuthError::InvalidToken(format!(
                "Token is not a{} token",
                match expected {
                    TokenType::Access => "n access",
                    TokenType::Refresh => " refresh",
                }
            )));
        }

        Ok(claims)
    }
}
