//! Match log files.
//!
//! Logs live under `<root>/<YYYY-MM-DD>/<YYYY-MM-DD HH-MM-SS> log.txt`,
//! named after the moment the file was started, with a ` (n)` suffix when
//! that name is taken. Files are UTF-8 and only ever appended to after the
//! header line.

use crate::error::MatchError;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An open match log.
#[derive(Debug, Clone)]
pub struct MatchLog {
    path: PathBuf,
    started: DateTime<Local>,
}

impl MatchLog {
    /// Creates the day directory and a fresh log file with its header line.
    pub fn create(root: impl AsRef<Path>, started: DateTime<Local>) -> Result<Self, MatchError> {
        let dir = root.as_ref().join(started.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir)?;

        let stamp = started.format("%Y-%m-%d %H-%M-%S").to_string();
        let mut path = dir.join(format!("{} log.txt", stamp));
        let mut copy = 1;
        while path.exists() {
            copy += 1;
            path = dir.join(format!("{} log ({}).txt", stamp, copy));
        }
        fs::write(
            &path,
            format!("geckolog log from {}\n", started.format("%Y-%m-%d %H:%M:%S")),
        )?;

        tracing::info!("Logging to {}", path.display());
        Ok(Self { path, started })
    }

    /// Appends rendered text.
    pub fn append(&self, text: &str) -> Result<(), MatchError> {
        if text.is_empty() {
            return Ok(());
        }
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn started(&self) -> DateTime<Local> {
        self.started
    }
}
