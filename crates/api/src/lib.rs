// Usercore API
// HTTP surface over the auth engine

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use usercore_auth::{AuthService, UserService};
use usercore_database::HealthCheck;

pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub health: Arc<dyn HealthCheck>,
}
