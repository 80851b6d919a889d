//! Process configuration
//!
//! Read once at startup from the environment (a `.env` file is honored when
//! present). Unparseable values fall back to their defaults rather than
//! aborting; the data directory resolves to the platform's config dir unless
//! overridden.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Default retention cap for rotated process log files
pub const DEFAULT_MAX_LOG_FILES: usize = 15;

/// Default number of audit entries scanned per correlation
pub const DEFAULT_AUDIT_SCAN_LIMIT: usize = 25;

#[derive(Debug, Clone)]
pub struct Config {
    /// Platform authentication token; unused by the store itself, carried
    /// for the embedding gateway client
    pub token: String,
    /// Root of the on-disk record tree
    pub data_dir: PathBuf,
    /// Whether message snapshots and the deleted-message index are recorded
    pub message_caching: bool,
    /// Rotated process log files kept on disk
    pub max_log_files: usize,
    /// Audit entries scanned when correlating a mute/deafen
    pub audit_scan_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            token: env::var("LEDGER_TOKEN").unwrap_or_default(),
            data_dir: env::var("LEDGER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            message_caching: env::var("LEDGER_MESSAGE_CACHING")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            max_log_files: env::var("LEDGER_MAX_LOG_FILES")
                .unwrap_or_else(|_| DEFAULT_MAX_LOG_FILES.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_LOG_FILES),
            audit_scan_limit: env::var("LEDGER_AUDIT_SCAN_LIMIT")
                .unwrap_or_else(|_| DEFAULT_AUDIT_SCAN_LIMIT.to_string())
                .parse()
                .unwrap_or(DEFAULT_AUDIT_SCAN_LIMIT),
        }
    }

    /// Config with defaults rooted at a given directory
    ///
    /// The usual constructor for tests and for embedders that manage their
    /// own paths.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            token: String::new(),
            data_dir: data_dir.into(),
            message_caching: true,
            max_log_files: DEFAULT_MAX_LOG_FILES,
            audit_scan_limit: DEFAULT_AUDIT_SCAN_LIMIT,
        }
    }
}

/// Platform config directory for the ledger, e.g. `~/.config/guild-ledger`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "guild-ledger")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".guild-ledger"))
}
