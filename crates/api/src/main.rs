// Usercore API Server
// Main entry point for the authentication REST API

use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use usercore_api::{config::Config, routes, AppState};
use usercore_auth::{AuthService, Clock, JwtService, PasswordHasher, SystemClock, UserService};
use usercore_database::{
    CredentialStore, Database, SessionRepository, SessionStore, UserRepository,
};

fn init_tracing(production: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,usercore_api=debug,tower_http=debug"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if production {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    init_tracing(config.is_production());

    tracing::info!("🚀 Starting Usercore API Server");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("🌍 Environment: {}", config.environment);
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);

    // Initialize database
    tracing::info!("🗄️  Connecting to database...");
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    database.migrate().await.context("Failed to run migrations")?;
    tracing::info!("✅ Database connected");

    // Initialize JWT service
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let jwt_service = JwtService::new(config.jwt.clone(), clock.clone())
        .context("Failed to initialize JWT service")?;
    tracing::info!("🔐 JWT service initialized");

    let users: Arc<dyn CredentialStore> = Arc::new(UserRepository::new(database.pool().clone()));
    let sessions: Arc<dyn SessionStore> =
        Arc::new(SessionRepository::new(database.pool().clone()));

    // Create services
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("Invalid BCRYPT_COST")?;
    let auth_service = AuthService::new(users.clone(), sessions.clone(), jwt_service, hasher, clock)
        .context("Failed to initialize auth service")?;
    let user_service = UserService::new(users, sessions);
    tracing::info!("🔑 Auth service initialized");

    let state = Arc::new(AppState {
        auth_service,
        user_service,
        health: Arc::new(database.clone()),
    });

    // Create router
    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("📡 Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   POST /api/auth/register");
    tracing::info!("   POST /api/auth/login");
    tracing::info!("   POST /api/auth/refresh");
    tracing::info!("   POST /api/auth/logout");
    tracing::info!("   POST /api/auth/logout-all");
    tracing::info!("   GET  /api/auth/me");
    tracing::info!("   PUT  /api/auth/me");
    tracing::info!("   GET  /api/users");
    tracing::info!("   GET  /api/users/:id");
    tracing::info!("   PUT  /api/users/:id");
    tracing::info!("   DELETE /api/users/:id");

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    database.close().await;
    tracing::info!("👋 Server stopped");

    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
