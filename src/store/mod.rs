//! Record store - file primitives and the typed log layer
//!
//! Every piece of guild state is a JSON document on local disk. The store
//! provides the file primitives (ensure-with-default, read, write, recursive
//! delete) and, on top of them, the typed append/load operations for the four
//! per-guild log arrays.
//!
//! Appends are whole-file rewrites: read the array, push, write the array
//! back through a temp file + rename. Two handlers for the same guild can
//! run at once, so the `[]` bootstrap and every load or rewrite of a file
//! take that file's mutex from the lock table; rewrites are atomic so
//! readers never observe a torn array.
//!
//! Failure handling follows the store's degradation rules: missing files are
//! re-created with defaults (WARN), corrupt array elements are skipped on
//! load (WARN, counted), failed writes are dropped (ERROR, counted), and
//! failed deletes are retried then abandoned (WARN). Only unreadable or
//! structurally corrupt files surface as errors.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::types::{GuildId, LogEntry, LogKind, MessageId};

mod lifecycle;
mod paths;
mod retention;

pub use lifecycle::GuildLifecycle;
pub use paths::PathResolver;
pub use retention::LogRetention;

/// Default contents of every log array
pub const EMPTY_ARRAY: &str = "[]";

const DELETE_MAX_ATTEMPTS: u32 = 10;
const DELETE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// File primitives and typed log access for the guild record tree
pub struct RecordStore {
    paths: PathResolver,
    /// One mutex per file, created lazily; serializes every touch of
    /// that file
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    skipped_entries: AtomicU64,
    dropped_writes: AtomicU64,
}

impl RecordStore {
    pub fn new(config: &Config) -> Self {
        Self::with_root(config.data_dir.clone())
    }

    /// Store rooted at an explicit directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathResolver::new(root),
            locks: Mutex::new(HashMap::new()),
            skipped_entries: AtomicU64::new(0),
            dropped_writes: AtomicU64::new(0),
        }
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Array elements skipped as corrupt since startup
    pub fn skipped_entries(&self) -> u64 {
        self.skipped_entries.load(Ordering::Relaxed)
    }

    /// Writes dropped after an I/O failure since startup
    pub fn dropped_writes(&self) -> u64 {
        self.dropped_writes.load(Ordering::Relaxed)
    }

    pub(crate) fn note_skipped_entry(&self) {
        self.skipped_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_dropped_write(&self) {
        self.dropped_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// The mutex serializing all access to one file
    pub(crate) fn file_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // ------------------------------------------------------------------
    // File primitives
    // ------------------------------------------------------------------

    /// Create a directory (and parents) if missing
    pub fn create_dir(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(|e| StoreError::io(path, e))?;
        info!(path = %path.display(), "created directory");
        Ok(())
    }

    /// Create a file with default contents if missing; leave it untouched
    /// if present. Idempotent; runs under the file's lock, so a bootstrap
    /// racing an append cannot truncate what the append wrote.
    pub fn ensure_file(&self, path: &Path, default_contents: &str) -> Result<()> {
        let lock = self.file_lock(path);
        let _guard = lock.lock();
        self.ensure_file_unlocked(path, default_contents)
    }

    fn ensure_file_unlocked(&self, path: &Path, default_contents: &str) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        warn!(path = %path.display(), "file is missing, creating it with default contents");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        atomic_write(path, default_contents).map_err(|e| StoreError::io(path, e))
    }

    /// Full file contents, or an empty string if the file cannot be read
    pub fn read_raw(&self, path: &Path) -> String {
        match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read file, returning empty contents");
                String::new()
            }
        }
    }

    /// Write contents to a file; `append` adds at end-of-file, otherwise the
    /// file is atomically replaced
    ///
    /// Runs under the file's lock. A failed write is logged at ERROR and
    /// dropped; read-append-write sequences go through the typed layer.
    pub fn write_raw(&self, path: &Path, contents: &str, append: bool) {
        let lock = self.file_lock(path);
        let _guard = lock.lock();
        let result = if append {
            append_to_file(path, contents)
        } else {
            atomic_write(path, contents)
        };
        if let Err(e) = result {
            self.note_dropped_write();
            error!(path = %path.display(), error = %e, "write failed, contents dropped");
        }
    }

    /// Atomically replace a file's contents, creating parent directories
    ///
    /// Unlike [`write_raw`](Self::write_raw) a failure here surfaces to the
    /// caller; used for documents whose writers need to know. Runs under
    /// the file's lock.
    pub fn overwrite(&self, path: &Path, contents: &str) -> Result<()> {
        let lock = self.file_lock(path);
        let _guard = lock.lock();
        self.overwrite_unlocked(path, contents)
    }

    /// Variant for callers already holding the file's lock; the per-file
    /// mutex is not reentrant
    pub(crate) fn overwrite_unlocked(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        atomic_write(path, contents).map_err(|e| StoreError::io(path, e))
    }

    /// Recursively delete a directory tree, retrying on transient failures
    ///
    /// Up to 10 attempts, one second apart, to ride out platform-level file
    /// locks. Gives up with a WARN; a missing tree counts as already done.
    /// Never fails the caller.
    pub async fn delete_tree(&self, path: &Path) {
        for attempt in 1..=DELETE_MAX_ATTEMPTS {
            match fs::remove_dir_all(path) {
                Ok(()) => {
                    info!(path = %path.display(), "deleted directory tree");
                    return;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "directory tree already absent");
                    return;
                }
                Err(e) if attempt == DELETE_MAX_ATTEMPTS => {
                    warn!(
                        path = %path.display(),
                        attempts = DELETE_MAX_ATTEMPTS,
                        error = %e,
                        "failed to delete directory tree, giving up"
                    );
                }
                Err(_) => tokio::time::sleep(DELETE_RETRY_DELAY).await,
            }
        }
    }

    // ------------------------------------------------------------------
    // JSON array layer
    // ------------------------------------------------------------------

    /// Load a JSON array file, bootstrapping `[]` if it is missing
    ///
    /// Errors mean the file is unreadable or not an array; per-element
    /// validation is left to the typed callers. Runs under the file's lock.
    pub fn load_array(&self, path: &Path) -> Result<Vec<serde_json::Value>> {
        let lock = self.file_lock(path);
        let _guard = lock.lock();
        self.load_array_unlocked(path)
    }

    /// Variant for callers already holding the file's lock
    pub(crate) fn load_array_unlocked(&self, path: &Path) -> Result<Vec<serde_json::Value>> {
        self.ensure_file_unlocked(path, EMPTY_ARRAY)?;
        let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::json(path, e))
    }

    /// Append values to a JSON array file under its lock
    ///
    /// Returns the number of values persisted: all of them, or zero when
    /// the rewrite failed and was dropped. Elements already in the file are
    /// carried over untouched, whatever their shape.
    pub fn append_values(&self, path: &Path, values: Vec<serde_json::Value>) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }
        let count = values.len();
        let lock = self.file_lock(path);
        let _guard = lock.lock();

        let mut array = self.load_array_unlocked(path)?;
        array.extend(values);

        let contents =
            serde_json::to_string_pretty(&array).map_err(|e| StoreError::json(path, e))?;
        match atomic_write(path, &contents) {
            Ok(()) => Ok(count),
            Err(e) => {
                self.note_dropped_write();
                error!(path = %path.display(), error = %e, "append failed, entries dropped");
                Ok(0)
            }
        }
    }

    // ------------------------------------------------------------------
    // Typed log layer
    // ------------------------------------------------------------------

    /// Load a guild's structured log, skipping corrupt elements
    ///
    /// Elements that fail to parse, or whose `kind` tag belongs to another
    /// log, are skipped with a WARN and counted. Not for the deleted-message
    /// index, which holds plain strings.
    pub fn load_log(&self, guild: &GuildId, kind: LogKind) -> Result<Vec<LogEntry>> {
        debug_assert!(kind != LogKind::DeletedMessage);
        let path = self.paths.guild_log(guild, kind);
        let values = self.load_array(&path)?;

        let mut entries = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<LogEntry>(value) {
                Ok(entry) if entry.kind() == kind => entries.push(entry),
                Ok(entry) => {
                    self.note_skipped_entry();
                    warn!(
                        guild = %guild,
                        log = %kind,
                        found = %entry.kind(),
                        "entry tagged for another log, skipping"
                    );
                }
                Err(e) => {
                    self.note_skipped_entry();
                    warn!(guild = %guild, log = %kind, error = %e, "corrupted log entry, skipping");
                }
            }
        }
        Ok(entries)
    }

    /// Append one entry to the log file matching its kind
    pub fn append_log(&self, guild: &GuildId, entry: LogEntry) -> Result<()> {
        let path = self.paths.guild_log(guild, entry.kind());
        let value = serde_json::to_value(&entry).map_err(|e| StoreError::json(&path, e))?;
        self.append_values(&path, vec![value]).map(|_| ())
    }

    /// Load the guild's deleted-message index, skipping non-string elements
    pub fn load_deleted_ids(&self, guild: &GuildId) -> Result<Vec<String>> {
        let path = self.paths.guild_log(guild, LogKind::DeletedMessage);
        let values = self.load_array(&path)?;

        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            match value {
                serde_json::Value::String(id) => ids.push(id),
                _ => {
                    self.note_skipped_entry();
                    warn!(guild = %guild, "corrupted deleted-message id, skipping");
                }
            }
        }
        Ok(ids)
    }

    /// Append a message id to the deleted-message index
    pub fn append_deleted_id(&self, guild: &GuildId, message: &MessageId) -> Result<()> {
        let path = self.paths.guild_log(guild, LogKind::DeletedMessage);
        self.append_values(
            &path,
            vec![serde_json::Value::String(message.as_str().to_string())],
        )
        .map(|_| ())
    }
}

/// Write contents through a temp file and rename, syncing before the rename
fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
}

fn append_to_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}
