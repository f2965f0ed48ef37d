//! Application configuration constants
//!
//! Central location for defaults, resource limits and validation
//! boundaries used throughout the application.

// ===== Remote Store =====

/// Name of the remote collection holding manga records
pub const DEFAULT_COLLECTION: &str = "mangas";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "MANGALIST_DATA_DIR";

/// Directory name used under the platform data dir
pub const APP_DIR_NAME: &str = "mangalist";

/// File name of the SQLite database used by the offline backend
pub const OFFLINE_DB_FILE: &str = "mangas.db";

/// Default per-request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Minimum per-request timeout in milliseconds
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 500;

/// Maximum per-request timeout in milliseconds (2 minutes)
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;

// ===== Retry Limits =====

/// Default number of attempts for a transient remote failure (1 = no retry)
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Upper bound on attempts; keeps a dead store from stalling the session
pub const MAX_RETRY_ATTEMPTS: u32 = 8;

/// Default delay before the first retry in milliseconds, doubled per attempt
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Cap on a single backoff delay in milliseconds
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

// ===== View Defaults =====

/// Column the list is sorted by on startup
pub const DEFAULT_SORT_COLUMN: &str = "title";

/// Sortable columns understood by the view engine
pub const VALID_SORT_COLUMNS: &[&str] = &["title", "priority", "releasedChapters"];

/// Status values offered by the status picker
pub const KNOWN_STATUSES: &[&str] = &["to_read", "in_progress", "finished"];

/// Maximum title length accepted on create or rename
pub const MAX_TITLE_LENGTH: usize = 200;
