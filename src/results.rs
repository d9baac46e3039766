//! Append-only result logs shared by the worker pools
//!
//! Each log owns one file handle behind its own lock. A line is written and
//! flushed while the lock is held, so lines from different threads never
//! interleave.

use crate::error::{LookupError, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{LineWriter, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Marker written in place of an address when a hostname did not resolve
pub const NOT_RESOLVED: &str = "NOT_RESOLVED";

/// A shared, line-oriented result file
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl ResultLog {
    /// Create the log, truncating any existing file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| LookupError::LogFile {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line (a trailing newline is added)
    pub fn append(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")
    }

    /// Append a requested hostname
    pub fn record_request(&self, hostname: &str) -> std::io::Result<()> {
        self.append(hostname)
    }

    /// Append a resolution outcome as `hostname, address` or `hostname, NOT_RESOLVED`
    pub fn record_resolution(&self, hostname: &str, address: Option<IpAddr>) -> std::io::Result<()> {
        match address {
            Some(ip) => self.append(&format!("{hostname}, {ip}")),
            None => self.append(&format!("{hostname}, {NOT_RESOLVED}")),
        }
    }

    /// Flush buffered output
    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}
