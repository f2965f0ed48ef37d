//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! The collection backend, view engine and dispatcher are wired here
//! from the persisted settings.

use crate::config::{APP_DIR_NAME, DATA_DIR_ENV, OFFLINE_DB_FILE};
use crate::database::{create_pool, SqliteCollection};
use crate::error::{AppError, Result};
use crate::remote::{CollectionClient, FirebaseCollection, MemoryCollection};
use crate::services::settings::RemoteSettings;
use crate::services::{AppSettings, Backend, MutationDispatcher, SettingsService, ViewEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: AppSettings,
    pub dispatcher: MutationDispatcher,
}

/// Resolve the data directory: env override first, then the platform data dir
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Generic("Failed to get app data dir".to_string()))
}

/// Build the collection client selected in the settings
pub async fn connect(remote: &RemoteSettings, data_dir: &Path) -> Result<Arc<dyn CollectionClient>> {
    let client: Arc<dyn CollectionClient> = match remote.backend {
        Backend::Firebase => {
            tracing::info!("Using Firebase collection {}/{}", remote.database_url, remote.collection);
            Arc::new(FirebaseCollection::new(
                &remote.database_url,
                &remote.collection,
                remote.auth_token.clone(),
                remote.timeout(),
            )?)
        }
        Backend::Sqlite => {
            let pool = create_pool(&data_dir.join(OFFLINE_DB_FILE)).await?;
            Arc::new(SqliteCollection::new(pool))
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory collection; changes are lost on exit");
            Arc::new(MemoryCollection::new())
        }
    };
    Ok(client)
}

/// Application setup - called once on startup
pub async fn setup(data_dir: PathBuf) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", data_dir);

    tokio::fs::create_dir_all(&data_dir).await?;

    let service = SettingsService::new(data_dir.clone());
    let first_run = !service.exists();
    let settings = service.load().await?;
    if first_run {
        tracing::warn!(
            "No settings found; using the default {:?} backend in {:?}. Set remote.backend in settings.json to sync with Firebase",
            settings.remote.backend,
            data_dir
        );
    }
    tracing::info!("Collection backend: {:?}", settings.remote.backend);
    let client = connect(&settings.remote, &data_dir).await?;

    let engine = ViewEngine::new(
        settings.view.sorting(),
        settings.view.status_filter()?,
        settings.view.hot_only,
    );
    let dispatcher = MutationDispatcher::new(client, engine, settings.retry.policy());

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        data_dir,
        settings,
        dispatcher,
    })
}
