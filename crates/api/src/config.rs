use usercore_auth::{AuthError, JwtConfig};
use usercore_database::DatabaseConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_env("SERVER_PORT", 8080)?,
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            database: DatabaseConfig::from_env()
                .map_err(|e| AuthError::ConfigurationError(e.to_string()))?,
            jwt: JwtConfig::from_env()?,
            bcrypt_cost: parse_env("BCRYPT_COST", usercore_auth::password::DEFAULT_COST)?,
        })
    }

    /// Production switches logging to JSON lines.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AuthError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| AuthError::ConfigurationError(format!("{} is not valid: {}", name, value))),
        Err(_) => Ok(default),
    }
}
