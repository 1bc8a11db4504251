pub mod api;
pub mod batch;
pub mod categories;
pub mod config;
pub mod cost;
pub mod db;
pub mod dedup;
pub mod errors;
pub mod import;
pub mod inference;
pub mod places;
pub mod retry;
pub mod sessions;
pub mod subscribe;

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::api::build_router;
pub use crate::config::AppConfig;
pub use crate::errors::{AppError, AppResult};

use crate::db::{bootstrap, DatabaseContext};
use crate::places::{HttpPlacesClient, PlacesApi};
use crate::sessions::SessionStore;
use crate::subscribe::WaitlistForwarder;

#[derive(Clone)]
pub struct AppState {
    pub db_path: PathBuf,
    pub config: AppConfig,
    pub sessions: SessionStore,
    /// Absent when GOOGLE_PLACES_API_KEY is not configured; import requests
    /// then fail with a config error at invocation time.
    pub places: Option<Arc<dyn PlacesApi>>,
    pub waitlist: WaitlistForwarder,
}

impl AppState {
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        let DatabaseContext { connection, path } =
            bootstrap(&config.data_dir, &config.database_file_name)?;
        let sessions = SessionStore::new(Arc::new(Mutex::new(connection)));

        let places: Option<Arc<dyn PlacesApi>> = match config.google_places_api_key.clone() {
            Some(key) => Some(Arc::new(HttpPlacesClient::new(
                key,
                &config.places_api_base,
            )?)),
            None => None,
        };

        let waitlist = WaitlistForwarder::new(&config)?;

        Ok(Self {
            db_path: path,
            config,
            sessions,
            places,
            waitlist,
        })
    }
}

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,workspace_importer=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
