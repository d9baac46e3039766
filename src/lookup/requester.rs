//! Requester thread logic
//!
//! Each requester:
//! - Claims input files from the shared [`FileSource`](super::FileSource)
//! - Reads them line by line, one hostname per line
//! - Pushes every hostname onto the work queue (blocking while it is full)
//! - Records each queued hostname in the requester log
//!
//! A file that cannot be opened or read is skipped with a warning; the
//! requester moves on to the next file.

use super::coordinator::LookupContext;
use super::queue::WorkItem;
use super::{join_worker, spawn_worker};
use crate::error::{FileOutcome, QueueError, WorkerError};
use crate::progress::{WorkerReport, WorkerRole};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Statistics collected by a requester
#[derive(Debug, Default)]
pub struct RequesterStats {
    /// Files read to the end
    pub files_serviced: AtomicU64,

    /// Files that could not be opened or read
    pub files_failed: AtomicU64,

    /// Hostnames pushed onto the queue
    pub hostnames_queued: AtomicU64,

    /// Hostnames dropped by an exclude pattern
    pub hostnames_skipped: AtomicU64,
}

impl RequesterStats {
    fn record_file(&self, outcome: &FileOutcome) {
        if outcome.is_serviced() {
            self.files_serviced.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_queued(&self) {
        self.hostnames_queued.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skip(&self) {
        self.hostnames_skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// A requester thread
pub struct Requester {
    /// Thread name
    name: String,

    /// Thread handle
    handle: Option<JoinHandle<WorkerReport>>,

    /// Requester statistics
    stats: Arc<RequesterStats>,
}

impl Requester {
    /// Spawn a new requester thread
    pub fn spawn(id: usize, context: Arc<LookupContext>) -> Result<Self, WorkerError> {
        let name = format!("requester-{}", id);
        let stats = Arc::new(RequesterStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = spawn_worker(&name, move |name| requester_loop(name, context, stats_clone))?;

        Ok(Self {
            name,
            handle: Some(handle),
            stats,
        })
    }

    /// Get thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get requester statistics
    pub fn stats(&self) -> &RequesterStats {
        &self.stats
    }

    /// Wait for the requester to run out of files
    pub fn join(&mut self) -> Result<WorkerReport, WorkerError> {
        join_worker(&self.name, self.handle.take(), WorkerRole::Requester)
    }
}

/// Main requester loop
fn requester_loop(name: String, context: Arc<LookupContext>, stats: Arc<RequesterStats>) -> WorkerReport {
    let start = Instant::now();
    debug!(worker = %name, "Requester starting");

    while let Some(path) = context.files.claim_next() {
        let outcome = match service_file(&name, path, &context, &stats) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(worker = %name, path = %path.display(), error = %e, "Work queue unavailable");
                break;
            }
        };

        stats.record_file(&outcome);

        let path = outcome.path().display();
        match &outcome {
            FileOutcome::Serviced { queued, skipped, .. } => {
                debug!(
                    worker = %name,
                    path = %path,
                    queued = queued,
                    skipped = skipped,
                    "File serviced"
                );
            }
            FileOutcome::Failed { queued, error, .. } => {
                warn!(
                    worker = %name,
                    path = %path,
                    queued = queued,
                    error = %error,
                    "Input file could not be serviced"
                );
            }
        }
    }

    let report = WorkerReport {
        name,
        role: WorkerRole::Requester,
        processed: stats.files_serviced.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };

    info!(
        worker = %report.name,
        files = report.processed,
        hostnames = stats.hostnames_queued.load(Ordering::Relaxed),
        "Requester finished"
    );
    context.reporter.worker_finished(&report);

    report
}

/// Read one input file and queue its hostnames
///
/// The only hard error is a closed queue; file problems are reported through
/// the returned [`FileOutcome`].
fn service_file(
    name: &str,
    path: &Path,
    context: &LookupContext,
    stats: &RequesterStats,
) -> Result<FileOutcome, QueueError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            return Ok(FileOutcome::Failed {
                path: path.to_path_buf(),
                queued: 0,
                error,
            })
        }
    };

    let mut queued = 0u64;
    let mut skipped = 0u64;

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                return Ok(FileOutcome::Failed {
                    path: path.to_path_buf(),
                    queued,
                    error,
                })
            }
        };

        let hostname = line.trim();
        if hostname.is_empty() {
            continue;
        }

        if context.config.is_excluded(hostname) {
            trace!(worker = name, hostname = hostname, "Hostname excluded");
            stats.record_skip();
            skipped += 1;
            continue;
        }

        context.queue.put(WorkItem::Lookup(hostname.to_string()))?;
        stats.record_queued();
        queued += 1;

        if let Err(e) = context.requester_log.record_request(hostname) {
            warn!(worker = name, hostname = hostname, error = %e, "Failed to write requester log");
        }
    }

    Ok(FileOutcome::Serviced {
        path: path.to_path_buf(),
        queued,
        skipped,
    })
}
