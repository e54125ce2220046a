//! # Linus POS Server
//!
//! REST API over [`linus_core`] and [`linus_db`].
//!
//! ## Module Organization
//! ```text
//! linus_server/
//! ├── lib.rs          ◄─── You are here (startup, router, tracing)
//! ├── config.rs       ◄─── ServerConfig: defaults → TOML → LINUS_* env
//! ├── error.rs        ◄─── ApiError {code, message} + IntoResponse
//! ├── poller.rs       ◄─── LowStockPoller background task
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── session.rs  ◄─── Sessions, CurrentSession extractor
//! │   ├── settings.rs ◄─── SettingsContext
//! │   ├── signal.rs   ◄─── ChangeSignal
//! │   └── notifications.rs ◄─── LowStockBoard
//! └── routes/         ◄─── One module per resource
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Server Startup                                    │
//! │                                                                         │
//! │  1. init_tracing()      EnvFilter, default info,linus=debug,sqlx=warn   │
//! │  2. ServerConfig::load  defaults → TOML → LINUS_* → validate            │
//! │  3. start()                                                             │
//! │     • open SQLite (WAL), run migrations                                 │
//! │     • upgrade legacy user records                                       │
//! │     • create default admin if the user table is empty                   │
//! │     • load SettingsContext                                              │
//! │     • spawn LowStockPoller                                              │
//! │  4. axum::serve(...).with_graceful_shutdown(ctrl_c | SIGTERM)           │
//! │  5. stop poller, close pool                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linus_core::auth::hash_password;
use linus_db::{Database, DbConfig};

use config::ServerConfig;
use error::StartupError;
use poller::{LowStockPoller, PollerHandle};
use state::AppState;

/// A started application: state for the router plus the poller to stop.
pub struct App {
    pub state: AppState,
    pub poller: PollerHandle,
}

impl App {
    /// Stops background work and closes the pool.
    pub async fn shutdown(self) {
        self.poller.shutdown().await;
        self.state.db.close().await;
        info!("Shutdown complete");
    }
}

/// Full middleware stack over the API routes.
pub fn build_router(state: AppState) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Opens the store and brings up state and background tasks.
pub async fn start(config: &ServerConfig) -> Result<App, StartupError> {
    let db_path = config.database.resolved_path()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StartupError::DataDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    info!(?db_path, "Database path determined");

    let db = Database::new(
        DbConfig::new(db_path).max_connections(config.database.max_connections),
    )
    .await?;

    prepare_users(&db, config).await?;

    let state = AppState::new(db, config.inventory.stock_policy).await?;
    let poller = LowStockPoller::spawn(&state, config.poller.interval());

    info!(stock_policy = ?state.stock_policy, "State initialized");
    Ok(App { state, poller })
}

/// One-time user maintenance run before any login is served.
async fn prepare_users(db: &Database, config: &ServerConfig) -> Result<(), StartupError> {
    let users = db.users();

    let upgraded = users.upgrade_legacy_records().await?;
    if upgraded > 0 {
        info!(upgraded, "Legacy user records upgraded");
    }

    if users.count().await? == 0 {
        let hash = hash_password(&config.bootstrap.admin_password)?;
        users
            .ensure_default_admin(&config.bootstrap.admin_name, &hash)
            .await?;
    }

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=linus_server=trace` - Trace for the server only
/// - Default: `info,linus=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linus=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
