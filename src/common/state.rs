// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::oauth::OAuthFlow;
use crate::auth::refresh::TokenRefresher;
use crate::auth::session::SessionIssuer;
use crate::auth::tokens::TokenCodec;
use crate::common::clock::Clock;
use crate::common::config::AppConfig;
use crate::services::google::{GoogleError, GoogleService};
use crate::users::directory::SqliteUserDirectory;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub directory: Arc<SqliteUserDirectory>,
    pub codec: TokenCodec,
    pub sessions: SessionIssuer,
    pub refresher: TokenRefresher,
    pub oauth: OAuthFlow,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, GoogleError> {
        let google = GoogleService::new(config.google.clone(), clock.clone())?;
        Ok(Self::with_google(db, config, clock, google))
    }

    /// Wire the auth core around an already-built Google client
    pub fn with_google(
        db: SqlitePool,
        config: AppConfig,
        clock: Arc<dyn Clock>,
        google: GoogleService,
    ) -> Self {
        let directory = Arc::new(SqliteUserDirectory::new(db.clone()));
        let codec = TokenCodec::new(&config.tokens, clock);
        let sessions = SessionIssuer::new(directory.clone(), codec.clone());
        let refresher = TokenRefresher::new(directory.clone(), codec.clone());
        let oauth = OAuthFlow::new(codec.clone(), Arc::new(google), sessions.clone());

        Self {
            db,
            config: Arc::new(config),
            directory,
            codec,
            sessions,
            refresher,
            oauth,
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies()
    }
}
