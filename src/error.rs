//! Error types for multi-lookup
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI validation
//! - Result log setup
//! - Worker thread lifecycle
//! - The work queue
//! - Hostname resolution
//!
//! Only setup-phase errors ever reach the process exit code. Errors that
//! happen while the pools are running (an unreadable input file, a hostname
//! that does not resolve) are contained inside the worker and turned into a
//! log entry or a console warning.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for a lookup run
#[derive(Error, Debug)]
pub enum LookupError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Work queue errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// A result log could not be created or truncated
    #[error("Failed to open log file '{path}': {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Requester pool size out of bounds
    #[error("Invalid requester count {count}: must be between 1 and {max}")]
    InvalidRequesterCount { count: usize, max: usize },

    /// Resolver pool size out of bounds
    #[error("Invalid resolver count {count}: must be between 1 and {max}")]
    InvalidResolverCount { count: usize, max: usize },

    /// Too many input files
    #[error("Too many input files ({count}): maximum of {max}")]
    TooManyFiles { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Log path cannot be used
    #[error("Invalid log path '{path}': {reason}")]
    InvalidLogPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {name} panicked: {message}")]
    Panicked { name: String, message: String },

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {name}: {reason}")]
    SpawnFailed { name: String, reason: String },
}

/// Work queue errors
///
/// The coordinator owns both ends of the queue for the whole run, so these
/// only surface if the queue is torn down while a worker still uses it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// All receivers are gone
    #[error("Work queue closed: no consumers left")]
    Disconnected,
}

/// Hostname resolution errors
///
/// Every variant is a normal outcome for the resolver pool and ends up as a
/// `NOT_RESOLVED` line in the resolver log.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// Empty hostname
    #[error("Empty hostname")]
    Empty,

    /// The system resolver failed
    #[error("Lookup failed for '{hostname}': {reason}")]
    LookupFailed { hostname: String, reason: String },

    /// The resolver answered but returned no addresses
    #[error("No addresses found for '{hostname}'")]
    NoAddresses { hostname: String },

    /// The lookup did not finish within the configured timeout
    #[error("Lookup for '{hostname}' timed out after {timeout:?}")]
    Timeout { hostname: String, timeout: Duration },
}

/// Result type alias for LookupError
pub type Result<T> = std::result::Result<T, LookupError>;

/// Result type alias for ResolveError
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// What happened to a single input file claimed by a requester
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was read to the end
    Serviced {
        path: PathBuf,
        queued: u64,
        skipped: u64,
    },

    /// The file could not be opened or read; partially queued hostnames stay queued
    Failed {
        path: PathBuf,
        queued: u64,
        error: std::io::Error,
    },
}

impl FileOutcome {
    /// Returns true if the file was fully serviced
    pub fn is_serviced(&self) -> bool {
        matches!(self, FileOutcome::Serviced { .. })
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileOutcome::Serviced { path, .. } => path,
            FileOutcome::Failed { path, .. } => path,
        }
    }

    /// Number of hostnames queued from this file
    pub fn queued(&self) -> u64 {
        match self {
            FileOutcome::Serviced { queued, .. } => *queued,
            FileOutcome::Failed { queued, .. } => *queued,
        }
    }
}
