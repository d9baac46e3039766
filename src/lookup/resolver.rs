//! Resolver thread logic
//!
//! Each resolver pulls hostnames off the work queue, resolves them and writes
//! `hostname, address` (or `hostname, NOT_RESOLVED`) to the resolver log. It
//! stops after taking exactly one [`WorkItem::Shutdown`] off the queue.

use super::coordinator::LookupContext;
use super::queue::WorkItem;
use super::{join_worker, panic_message, spawn_worker};
use crate::error::WorkerError;
use crate::progress::{WorkerReport, WorkerRole};
use std::net::IpAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Statistics collected by a resolver
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Hostnames that resolved to an address
    pub resolved: AtomicU64,

    /// Hostnames logged as NOT_RESOLVED
    pub not_resolved: AtomicU64,
}

impl ResolverStats {
    fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    fn record_not_resolved(&self) {
        self.not_resolved.fetch_add(1, Ordering::Relaxed);
    }

    /// Every hostname handled, whatever the outcome
    pub fn total(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed) + self.not_resolved.load(Ordering::Relaxed)
    }
}

/// A resolver thread
pub struct Resolver {
    /// Thread name
    name: String,

    /// Thread handle
    handle: Option<JoinHandle<WorkerReport>>,

    /// Resolver statistics
    stats: Arc<ResolverStats>,
}

impl Resolver {
    /// Spawn a new resolver thread
    pub fn spawn(id: usize, context: Arc<LookupContext>) -> Result<Self, WorkerError> {
        let name = format!("resolver-{}", id);
        let stats = Arc::new(ResolverStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = spawn_worker(&name, move |name| resolver_loop(name, context, stats_clone))?;

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

    /// Get resolver statistics
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Wait for the resolver to consume its shutdown item
    pub fn join(&mut self) -> Result<WorkerReport, WorkerError> {
        join_worker(&self.name, self.handle.take(), WorkerRole::Resolver)
    }
}

/// Main resolver loop
fn resolver_loop(name: String, context: Arc<LookupContext>, stats: Arc<ResolverStats>) -> WorkerReport {
    let start = Instant::now();
    debug!(worker = %name, "Resolver starting");

    loop {
        let hostname = match context.queue.get() {
            Ok(WorkItem::Lookup(hostname)) => hostname,
            Ok(WorkItem::Shutdown) => {
                trace!(worker = %name, "Shutdown received");
                break;
            }
            Err(e) => {
                error!(worker = %name, error = %e, "Work queue unavailable");
                break;
            }
        };

        resolve_one(&name, &hostname, &context, &stats);
    }

    let report = WorkerReport {
        name,
        role: WorkerRole::Resolver,
        processed: stats.total(),
        elapsed: start.elapsed(),
    };

    info!(
        worker = %report.name,
        resolved = stats.resolved.load(Ordering::Relaxed),
        not_resolved = stats.not_resolved.load(Ordering::Relaxed),
        "Resolver finished"
    );
    context.reporter.worker_finished(&report);

    report
}

/// Resolve a single hostname and log the outcome
///
/// A panic inside the resolution primitive is contained here and counts as
/// NOT_RESOLVED; the thread keeps draining the queue.
fn resolve_one(name: &str, hostname: &str, context: &LookupContext, stats: &ResolverStats) {
    let address = match lookup_contained(name, hostname, context) {
        Some(ip) => {
            trace!(worker = name, hostname = hostname, ip = %ip, "Hostname resolved");
            stats.record_resolved();
            Some(ip)
        }
        None => {
            stats.record_not_resolved();
            None
        }
    };

    if let Err(e) = context.resolver_log.record_resolution(hostname, address) {
        warn!(worker = name, hostname = hostname, error = %e, "Failed to write resolver log");
    }

    context.reporter.record_resolution();
}

fn lookup_contained(name: &str, hostname: &str, context: &LookupContext) -> Option<IpAddr> {
    match panic::catch_unwind(AssertUnwindSafe(|| context.resolver.resolve(hostname))) {
        Ok(Ok(ip)) => Some(ip),
        Ok(Err(e)) => {
            debug!(worker = name, hostname = hostname, error = %e, "Hostname not resolved");
            None
        }
        Err(payload) => {
            warn!(
                worker = name,
                hostname = hostname,
                panic = %panic_message(payload.as_ref()),
                "Resolution panicked"
            );
            None
        }
    }
}
