//! Lookup coordinator - orchestrates the two worker pools
//!
//! The coordinator is responsible for:
//! - Creating the result logs, the work queue and the file source
//! - Spawning the resolver and requester pools
//! - Joining every requester, then pushing exactly one shutdown item per resolver
//! - Joining the resolvers and collecting final statistics

use super::queue::{BoundedQueue, WorkItem};
use super::requester::Requester;
use super::resolver::Resolver;
use super::source::FileSource;
use crate::config::LookupConfig;
use crate::error::Result;
use crate::progress::{Reporter, WorkerReport};
use crate::resolve::{Resolve, SystemResolver};
use crate::results::ResultLog;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// State shared by every worker thread
///
/// Created once by the coordinator before any worker starts. Workers only
/// hold an `Arc` to it; all mutation goes through the locks and the queue
/// inside.
pub struct LookupContext {
    /// Validated configuration
    pub config: Arc<LookupConfig>,

    /// Queue between the two pools
    pub queue: BoundedQueue<WorkItem>,

    /// Input files for the requester pool
    pub files: FileSource,

    /// Every hostname read by a requester
    pub requester_log: ResultLog,

    /// Resolution outcomes
    pub resolver_log: ResultLog,

    /// Console sink for per-thread statistics
    pub reporter: Reporter,

    /// Name resolution primitive
    pub resolver: Arc<dyn Resolve>,
}

impl LookupContext {
    /// Build the shared state; fails if either log cannot be created
    pub fn new(config: Arc<LookupConfig>, resolver: Arc<dyn Resolve>) -> Result<Self> {
        let requester_log = ResultLog::create(&config.requester_log)?;
        let resolver_log = ResultLog::create(&config.resolver_log)?;

        Ok(Self {
            queue: BoundedQueue::new(config.queue_size),
            files: FileSource::new(config.input_files.clone()),
            requester_log,
            resolver_log,
            reporter: Reporter::new(config.show_progress),
            resolver,
            config,
        })
    }
}

/// Result of a completed lookup run
#[derive(Debug, Default)]
pub struct LookupResult {
    /// Input files read to the end
    pub files_serviced: u64,

    /// Input files that could not be opened or read
    pub files_failed: u64,

    /// Hostnames pushed onto the queue
    pub hostnames_queued: u64,

    /// Hostnames dropped by exclude patterns
    pub hostnames_skipped: u64,

    /// Hostnames resolved to an address
    pub resolved: u64,

    /// Hostnames logged as NOT_RESOLVED
    pub not_resolved: u64,

    /// Puts that had to wait on a full queue
    pub backpressure_events: u64,

    /// Workers that panicked
    pub worker_failures: u64,

    /// Per-thread reports, requesters first
    pub reports: Vec<WorkerReport>,

    /// Wall-clock time for the whole run
    pub duration: Duration,
}

impl LookupResult {
    /// Calculate hostnames per second rate
    pub fn hostnames_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.resolved + self.not_resolved) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates the requester and resolver pools
pub struct LookupCoordinator {
    /// Shared worker state
    context: Arc<LookupContext>,

    /// Requester threads
    requesters: Vec<Requester>,

    /// Resolver threads
    resolvers: Vec<Resolver>,
}

impl LookupCoordinator {
    /// Create a coordinator that resolves through the system resolver
    pub fn new(config: LookupConfig) -> Result<Self> {
        let resolver = match config.resolve_timeout {
            Some(timeout) => SystemResolver::with_timeout(timeout),
            None => SystemResolver::new(),
        };
        Self::with_resolver(config, Arc::new(resolver))
    }

    /// Create a coordinator with a custom resolution primitive
    pub fn with_resolver(config: LookupConfig, resolver: Arc<dyn Resolve>) -> Result<Self> {
        let context = LookupContext::new(Arc::new(config), resolver)?;

        Ok(Self {
            context: Arc::new(context),
            requesters: Vec::new(),
            resolvers: Vec::new(),
        })
    }

    /// Get the shared worker state
    pub fn context(&self) -> Arc<LookupContext> {
        Arc::clone(&self.context)
    }

    /// Run both pools to completion
    pub fn run(mut self) -> Result<LookupResult> {
        let start_time = Instant::now();
        let config = Arc::clone(&self.context.config);

        info!(
            requesters = config.requester_count,
            resolvers = config.resolver_count,
            queue_size = config.queue_size,
            files = config.input_files.len(),
            "Starting lookup"
        );

        // Consumers first, so producers never wait on a queue nobody drains
        if let Err(e) = self.spawn_resolvers().and_then(|()| self.spawn_requesters()) {
            warn!(error = %e, "Worker spawn failed, shutting down started workers");
            self.abort_startup();
            return Err(e);
        }

        self.context.reporter.set_status("reading input files");
        let (mut reports, requester_failures) = self.join_requesters();
        debug!(
            claimed = self.context.files.claimed(),
            total = self.context.files.total(),
            "All requesters finished"
        );

        self.context.reporter.set_status("draining queue");
        self.inject_shutdown()?;

        let (resolver_reports, resolver_failures) = self.join_resolvers();
        reports.extend(resolver_reports);

        for log in [&self.context.requester_log, &self.context.resolver_log] {
            if let Err(e) = log.flush() {
                warn!(path = %log.path().display(), error = %e, "Failed to flush log");
            }
        }

        let result = self.collect_result(reports, requester_failures + resolver_failures, start_time.elapsed());
        self.context.reporter.finish("lookup complete");

        info!(
            files = result.files_serviced,
            hostnames = result.hostnames_queued,
            resolved = result.resolved,
            not_resolved = result.not_resolved,
            duration_secs = result.duration.as_secs_f64(),
            "Lookup completed"
        );

        Ok(result)
    }

    /// Spawn the resolver pool
    fn spawn_resolvers(&mut self) -> Result<()> {
        for id in 0..self.context.config.resolver_count {
            let resolver = Resolver::spawn(id, Arc::clone(&self.context))?;
            self.resolvers.push(resolver);
        }

        debug!(count = self.resolvers.len(), "Resolvers spawned");
        Ok(())
    }

    /// Spawn the requester pool
    fn spawn_requesters(&mut self) -> Result<()> {
        for id in 0..self.context.config.requester_count {
            let requester = Requester::spawn(id, Arc::clone(&self.context))?;
            self.requesters.push(requester);
        }

        debug!(count = self.requesters.len(), "Requesters spawned");
        Ok(())
    }

    /// Stop whatever workers a failed startup left running
    fn abort_startup(&mut self) -> (Vec<WorkerReport>, u64) {
        let (mut reports, mut failures) = self.join_requesters();
        if let Err(e) = self.inject_shutdown() {
            warn!(error = %e, "Failed to queue shutdown items during cleanup");
        }
        let (resolver_reports, resolver_failures) = self.join_resolvers();
        reports.extend(resolver_reports);
        failures += resolver_failures;
        (reports, failures)
    }

    /// Push one shutdown item for every running resolver
    fn inject_shutdown(&self) -> Result<()> {
        for _ in 0..self.resolvers.len() {
            self.context.queue.put(WorkItem::Shutdown)?;
        }

        debug!(count = self.resolvers.len(), "Shutdown items queued");
        Ok(())
    }

    /// Join all requester threads
    fn join_requesters(&mut self) -> (Vec<WorkerReport>, u64) {
        let mut reports = Vec::with_capacity(self.requesters.len());
        let mut failures = 0;

        for requester in &mut self.requesters {
            match requester.join() {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(error = %e, "Requester failed to join cleanly");
                    failures += 1;
                }
            }
        }

        (reports, failures)
    }

    /// Join all resolver threads
    fn join_resolvers(&mut self) -> (Vec<WorkerReport>, u64) {
        let mut reports = Vec::with_capacity(self.resolvers.len());
        let mut failures = 0;

        for resolver in &mut self.resolvers {
            match resolver.join() {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(error = %e, "Resolver failed to join cleanly");
                    failures += 1;
                }
            }
        }

        (reports, failures)
    }

    /// Aggregate statistics from every worker
    fn collect_result(&self, reports: Vec<WorkerReport>, worker_failures: u64, duration: Duration) -> LookupResult {
        let mut result = LookupResult {
            reports,
            worker_failures,
            duration,
            backpressure_events: self.context.queue.stats().backpressure_count(),
            ..LookupResult::default()
        };

        for requester in &self.requesters {
            let stats = requester.stats();
            result.files_serviced += stats.files_serviced.load(Ordering::Relaxed);
            result.files_failed += stats.files_failed.load(Ordering::Relaxed);
            result.hostnames_queued += stats.hostnames_queued.load(Ordering::Relaxed);
            result.hostnames_skipped += stats.hostnames_skipped.load(Ordering::Relaxed);
        }

        for resolver in &self.resolvers {
            let stats = resolver.stats();
            result.resolved += stats.resolved.load(Ordering::Relaxed);
            result.not_resolved += stats.not_resolved.load(Ordering::Relaxed);
        }

        result
    }
}
