//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::*;
use crate::error::{AppError, Result};
use crate::remote::RetryPolicy;
use crate::services::view::{SortColumn, SortOrder, Sorting, StatusFilter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Where the collection lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Firebase Realtime Database
    Firebase,
    /// Local SQLite file in the data directory
    #[default]
    Sqlite,
    /// Process memory, lost on exit
    Memory,
}

/// Remote store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the Firebase database, e.g. "https://<project>.firebaseio.com"
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            database_url: String::new(),
            collection: default_collection(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Initial state of the list view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default = "default_sort_column")]
    pub sort_column: String,
    #[serde(default)]
    pub descending: bool,
    /// "all" or a status value
    #[serde(default = "default_status_filter")]
    pub status_filter: String,
    #[serde(default)]
    pub hot_only: bool,
}

fn default_sort_column() -> String {
    DEFAULT_SORT_COLUMN.to_string()
}

fn default_status_filter() -> String {
    "all".to_string()
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sort_column: default_sort_column(),
            descending: false,
            status_filter: default_status_filter(),
            hot_only: false,
        }
    }
}

impl ViewSettings {
    pub fn sorting(&self) -> Sorting {
        Sorting {
            column: SortColumn::from(self.sort_column.as_str()),
            order: if self.descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
        }
    }

    pub fn status_filter(&self) -> Result<StatusFilter> {
        self.status_filter.parse()
    }
}

/// Retry behavior for transient store failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay")]
    pub base_delay_ms: u64,
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_base_delay() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl AppSettings {
    /// Check values against the limits in `config`
    pub fn validate(&self) -> Result<()> {
        let remote = &self.remote;
        if remote.backend == Backend::Firebase && remote.database_url.trim().is_empty() {
            return Err(AppError::Settings(
                "remote.database_url is required for the firebase backend".to_string(),
            ));
        }
        if remote.collection.trim_matches('/').is_empty() {
            return Err(AppError::Settings("remote.collection must not be empty".to_string()));
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&remote.timeout_ms) {
            return Err(AppError::Settings(format!(
                "remote.timeout_ms must be between {} and {}",
                MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS
            )));
        }
        if !VALID_SORT_COLUMNS.contains(&self.view.sort_column.as_str()) {
            return Err(AppError::Settings(format!(
                "view.sort_column must be one of {:?}",
                VALID_SORT_COLUMNS
            )));
        }
        self.view
            .status_filter()
            .map_err(|e| AppError::Settings(format!("view.status_filter: {}", e)))?;
        if self.retry.max_attempts == 0 || self.retry.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(AppError::Settings(format!(
                "retry.max_attempts must be between 1 and {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        if self.retry.base_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(AppError::Settings(format!(
                "retry.base_delay_ms must not exceed {}",
                MAX_RETRY_DELAY_MS
            )));
        }
        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Whether a settings file has been written yet
    pub fn exists(&self) -> bool {
        self.settings_path.exists()
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn update_remote(&self, remote: RemoteSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.remote = remote;
        self.save(&settings).await
    }

    pub async fn update_view(&self, view: ViewSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.view = view;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        assert!(!service.exists());
        let settings = service.load().await.unwrap();

        assert!(service.exists());
        assert_eq!(settings.remote.backend, Backend::Sqlite);
        assert_eq!(settings.remote.collection, "mangas");
        assert_eq!(settings.view.sort_column, "title");
        assert_eq!(settings.retry.max_attempts, DEFAULT_RETRY_ATTEMPTS);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_field_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join("settings.json"),
            r#"{ "view": { "hot_only": true } }"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();

        assert!(settings.view.hot_only);
        assert_eq!(settings.view.status_filter, "all");
        assert_eq!(settings.remote.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[tokio::test]
    async fn test_firebase_requires_url() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_remote(RemoteSettings {
                backend: Backend::Firebase,
                ..RemoteSettings::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(data_dir.clone());
            service
                .update_view(ViewSettings {
                    sort_column: "releasedChapters".to_string(),
                    descending: true,
                    status_filter: "in_progress".to_string(),
                    hot_only: false,
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(data_dir);
            let loaded = service.load().await.unwrap();
            assert_eq!(
                loaded.view.sorting(),
                Sorting {
                    column: SortColumn::ReleasedChapters,
                    order: SortOrder::Descending,
                }
            );
            assert_eq!(
                loaded.view.status_filter().unwrap(),
                StatusFilter::Only(crate::database::Status::InProgress)
            );
        }
    }

    #[test]
    fn test_validate_limits() {
        let mut settings = AppSettings::default();
        assert!(settings.validate().is_ok());

        settings.remote.timeout_ms = 10;
        assert!(settings.validate().is_err());

        settings.remote.timeout_ms = DEFAULT_REQUEST_TIMEOUT_MS;
        settings.view.sort_column = "lastChapterRead".to_string();
        assert!(settings.validate().is_err());

        settings.view.sort_column = "priority".to_string();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());
    }
}
