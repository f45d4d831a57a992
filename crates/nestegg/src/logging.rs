//! File logging for the command-line front end
//!
//! The engine only emits `tracing` events; this module installs the
//! subscriber that writes them to `{data_dir}/nestegg.log`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "nestegg.log";
/// Rotate once the log grows past 5 MB
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Most recent bytes kept by a rotation
const KEEP_SIZE: u64 = 1024 * 1024;
const ROTATION_MARKER: &[u8] = b"--- Log rotated (older entries removed) ---\n";

/// Trim `log_path` to its last `keep` bytes when it exceeds `max_size`.
/// Returns whether the file was rotated.
fn rotate_if_needed(log_path: &Path, max_size: u64, keep: u64) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_size {
        return Ok(false);
    }

    let mut tail = Vec::with_capacity(keep as usize);
    {
        let mut file = File::open(log_path)?;
        file.seek(SeekFrom::Start(size.saturating_sub(keep)))?;
        file.read_to_end(&mut tail)?;
    }

    // Drop the partial first line
    let first_full_line = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |i| i + 1);

    let mut file = File::create(log_path)?;
    file.write_all(ROTATION_MARKER)?;
    file.write_all(&tail[first_full_line..])?;
    Ok(true)
}

/// Shared handle to the open log file
#[derive(Clone)]
struct SharedLogFile(Arc<Mutex<File>>);

impl SharedLogFile {
    fn lock(&self) -> MutexGuard<'_, File> {
        // A panic mid-write leaves the file usable
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SharedLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = SharedLogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(level: &str) -> String {
    format!("nestegg={level},nestegg_core=warn")
}

/// Initialize logging to the data directory and return the log path.
///
/// Logs past 5 MB are trimmed to their most recent 1 MB before opening.
/// `RUST_LOG` overrides `level`.
pub fn init_logging(data_dir: &Path, level: &str) -> color_eyre::Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join(LOG_FILE_NAME);

    if let Err(e) = rotate_if_needed(&log_path, MAX_LOG_SIZE, KEEP_SIZE) {
        eprintln!("Warning: Failed to rotate log file: {}", e);
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(SharedLogFile(Arc::new(Mutex::new(file))))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false),
        )
        .init();

    tracing::info!(log_path = %log_path.display(), "nestegg logging initialized");
    Ok(log_path)
}
