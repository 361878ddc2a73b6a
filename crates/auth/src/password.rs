use crate::error::{AuthError, Result};

/// bcrypt cost used in production.
pub const DEFAULT_COST: u32 = 10;

/// Lowest cost bcrypt accepts. Fast, so tests use it.
pub const MIN_COST: u32 = 4;

pub const MAX_COST: u32 = 31;

/// Salted bcrypt hashing with a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Fails with `ConfigurationError` outside bcrypt's accepted range.
    pub fn new(cost: u32) -> Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(AuthError::ConfigurationError(format!(
                "bcrypt cost must be between {} and {}, got {}",
                MIN_COST, MAX_COST, cost
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Verify a password against a hash. Malformed hashes never match.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}
