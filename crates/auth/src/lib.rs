pub mod clock;
pub mod error;
pub mod jwt;
pub mod password;
pub mod service;
pub mod user_service;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::{AuthError, Result};
pub use jwt::{Claims, JwtConfig, JwtService, TokenType};
pub use password::PasswordHasher;
pub use service::{AuthService, LoginRequest, RegisterRequest, TokenPair};
pub use user_service::{UpdateUserRequest, UserPage, UserService};
