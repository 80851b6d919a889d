//! Process logging
//!
//! Diagnostics go to two independent `tracing` layers on one registry: a
//! console layer and a plain-text file layer appending to a per-run file
//! under `<root>/logs/`, named after the startup time. The retention pass
//! keeps that directory bounded across runs.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::PathResolver;

/// Install the global subscriber; returns the per-run log file path
///
/// Each layer gets its own `EnvFilter` (default `info`, `RUST_LOG`
/// override). Call once from the embedding process; tests never install
/// the global subscriber.
pub fn init(config: &Config) -> Result<PathBuf> {
    let logs_dir = PathResolver::new(config.data_dir.clone()).process_logs_dir();
    std::fs::create_dir_all(&logs_dir).map_err(|e| StoreError::io(&logs_dir, e))?;

    let file_path = logs_dir.join(run_file_name(Local::now()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file_path)
        .map_err(|e| StoreError::io(&file_path, e))?;

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_target(false);
    // ANSI disabled so the formatter never emits escape codes into the file
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(FileMakeWriter::new(Arc::new(Mutex::new(file))));

    tracing_subscriber::registry()
        .with(console_layer.with_filter(console_filter))
        .with(file_layer.with_filter(file_filter))
        .init();

    Ok(file_path)
}

/// One log file per process run, named after the startup time
fn run_file_name(now: DateTime<Local>) -> String {
    format!("{}.txt", now.format("%Y-%m-%d %H-%M-%S"))
}

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) for the file layer
#[derive(Clone)]
pub struct FileMakeWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl FileMakeWriter {
    pub fn new(file: Arc<Mutex<std::fs::File>>) -> Self {
        Self { file }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: Arc::clone(&self.file),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer: buffers the formatted event, appends on [`Drop`]
/// under the file lock so concurrent events never interleave
pub struct FileWriter {
    file: Arc<Mutex<std::fs::File>>,
    buf: Vec<u8>,
}

impl Write for FileWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let mut file = self.file.lock();
        let _ = file.write_all(&self.buf);
        let _ = file.flush();
    }
}
