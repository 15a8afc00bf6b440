//! services/app/src/state.rs
//!
//! Wires configuration, storage backends and service adapters into one `AppState`
//! that every CLI command runs against.

use crate::adapters::{DbAdapter, LocalStore, OpenRouterAdapter, PdfPageExtractor};
use crate::auth::AuthManager;
use crate::config::Config;
use crate::error::AppResult;
use dream_path_core::ports::{AccountStore, CompletionService, NotebookStore};
use dream_path_core::{
    ContentNormalizer, NotebookLibrary, Orchestrator, SearchImageLookup, User,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

//=========================================================================================
// Storage Backends
//=========================================================================================

/// The storage capabilities available for this run, chosen once at startup.
pub struct Backends {
    pub notebooks: Arc<dyn NotebookStore>,
    /// Accounts need the database; `None` means the client runs anonymously.
    pub accounts: Option<Arc<dyn AccountStore>>,
    /// Always present: history and the session token live here regardless of backend.
    pub local: Arc<LocalStore>,
}

impl Backends {
    /// Local-only storage under the configured data directory.
    pub fn local(config: &Config) -> Self {
        let local = Arc::new(LocalStore::new(&config.data_dir));
        Self {
            notebooks: local.clone(),
            accounts: None,
            local,
        }
    }

    /// Uses PostgreSQL when `DATABASE_URL` is a usable URL and the database answers;
    /// otherwise falls back to the local store.
    pub async fn select(config: &Config) -> Self {
        let Some(url) = config.database_url.as_deref() else {
            info!("No DATABASE_URL configured; using local storage");
            return Self::local(config);
        };
        if !config.has_valid_database_url() {
            warn!("DATABASE_URL is not a postgres URL; using local storage");
            return Self::local(config);
        }

        match connect(url).await {
            Ok(db) => {
                let db = Arc::new(db);
                Self {
                    notebooks: db.clone(),
                    accounts: Some(db),
                    local: Arc::new(LocalStore::new(&config.data_dir)),
                }
            }
            Err(e) => {
                warn!("Database unavailable ({}); using local storage", e);
                Self::local(config)
            }
        }
    }
}

async fn connect(url: &str) -> AppResult<DbAdapter> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    let db = DbAdapter::new(pool);
    info!("Running database migrations...");
    db.run_migrations().await?;
    info!("Database migrations complete.");
    Ok(db)
}

//=========================================================================================
// AppState
//=========================================================================================

/// The shared application state, created once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Orchestrator,
    pub notebooks: NotebookLibrary,
    pub normalizer: Arc<ContentNormalizer>,
    pub auth: Option<AuthManager>,
    pub local: Arc<LocalStore>,
}

impl AppState {
    /// Builds the state with the real provider adapter and the selected backends.
    pub async fn build(config: Config) -> AppResult<Self> {
        let backends = Backends::select(&config).await;
        let completion = Arc::new(OpenRouterAdapter::new(
            config.provider_api_key.clone(),
            config.provider_base_url.clone(),
            config.model.clone(),
            config.app_title.clone(),
            config.app_referer.clone(),
        )?);
        Ok(Self::from_parts(config, backends, completion))
    }

    pub fn from_parts(
        config: Config,
        backends: Backends,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let images = Arc::new(SearchImageLookup::new(config.image_base_url.clone()));
        let orchestrator = Orchestrator::new(completion, images, config.orchestrator_settings())
            .with_history(backends.local.clone());
        let notebooks = NotebookLibrary::new(backends.notebooks);
        let normalizer = Arc::new(ContentNormalizer::new(Arc::new(PdfPageExtractor)));
        let auth = backends
            .accounts
            .map(|accounts| AuthManager::new(accounts, backends.local.clone()));

        info!(backend = notebooks.backend_name(), "Application state ready");
        Self {
            config: Arc::new(config),
            orchestrator,
            notebooks,
            normalizer,
            auth,
            local: backends.local,
        }
    }

    /// The signed-in user, if accounts are available and a session is stored.
    pub async fn current_user(&self) -> Option<User> {
        match &self.auth {
            Some(auth) => auth.current_user().await,
            None => None,
        }
    }
}
