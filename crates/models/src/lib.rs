pub mod session;
pub mod user;

// Re-export commonly used types
pub use session::{NewSession, Session, SessionState};
pub use user::{NewUser, User, UserProfile, UserUpdate};
