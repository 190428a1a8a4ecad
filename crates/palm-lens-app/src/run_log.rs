//! Per-run file logger used by the desktop shell.
//!
//! One pipe-delimited line per event; flushed eagerly on ERROR so a crash
//! still leaves the failure on disk. Image bytes and payload contents are
//! never logged.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::OffsetDateTime;

/// Append-only per-run log file.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates a timestamped log file next to the executable.
    ///
    /// # Errors
    /// Returns a human-readable message when the path cannot be resolved or
    /// the file cannot be created.
    pub fn new() -> Result<Self, String> {
        let exe_path = std::env::current_exe()
            .map_err(|error| format!("unable to resolve executable path: {error}"))?;
        let exe_dir = exe_path
            .parent()
            .ok_or_else(|| "executable parent directory is missing".to_string())?
            .to_path_buf();
        Self::create_in(&exe_dir)
    }

    /// Creates a timestamped log file in the given directory.
    ///
    /// # Errors
    /// Returns a human-readable message when the file cannot be created.
    pub fn create_in(dir: &Path) -> Result<Self, String> {
        let timestamp = timestamp_compact_utc();
        let path = dir.join(format!("{timestamp}_palm_lens_log.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| format!("unable to create log file '{}': {error}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Appends one structured log line.
    pub fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let timestamp = timestamp_compact_utc();
        let line = format!("{timestamp} | {level} | {stage} | {action} | {detail}\n");

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            if level == "ERROR" {
                let _ = file.flush();
            }
        }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn timestamp_compact_utc() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
