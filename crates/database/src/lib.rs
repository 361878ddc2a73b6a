pub mod connection;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig, HealthCheck};
pub use error::{DatabaseError, Result};
pub use memory::{MemoryCredentialStore, MemorySessionStore};
pub use repositories::{sessions::SessionRepository, users::UserRepository};
pub use store::{CredentialStore, SessionStore};
