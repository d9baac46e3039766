//! Console reporting for a lookup run
//!
//! All worker threads report through one [`Reporter`], which serializes
//! output behind its own lock. When the live spinner is enabled, lines are
//! printed with the spinner suspended so the two never garble each other.

use crate::lookup::LookupResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;

/// Which pool a worker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Requester,
    Resolver,
}

/// Per-thread statistics, reported once when the thread exits
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Thread name, e.g. `requester-0`
    pub name: String,

    /// Pool the thread belonged to
    pub role: WorkerRole,

    /// Files serviced (requesters) or hostnames resolved (resolvers)
    pub processed: u64,

    /// Time from thread start to exit
    pub elapsed: Duration,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            WorkerRole::Requester => write!(
                f,
                "thread {} serviced {} files in {} seconds",
                self.name,
                self.processed,
                format_secs(self.elapsed)
            ),
            WorkerRole::Resolver => write!(
                f,
                "thread {} resolved {} hostnames in {} seconds",
                self.name,
                self.processed,
                format_secs(self.elapsed)
            ),
        }
    }
}

/// Synchronized sink for per-thread statistics and live progress
pub struct Reporter {
    /// Serializes console writes from worker threads
    lock: Mutex<()>,

    /// Optional live spinner
    bar: Option<ProgressBar>,
}

impl Reporter {
    /// Create a reporter, optionally with a live spinner
    pub fn new(show_progress: bool) -> Self {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(spinner) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} hostnames resolved {msg}")
            {
                bar.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self {
            lock: Mutex::new(()),
            bar,
        }
    }

    /// Count one finished resolution on the spinner
    pub fn record_resolution(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Set the spinner status message
    pub fn set_status(&self, status: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(status.to_string());
        }
    }

    /// Print a worker's exit statistics
    pub fn worker_finished(&self, report: &WorkerReport) {
        self.println(&report.to_string());
    }

    /// Print a line without tearing the spinner
    pub fn println(&self, line: &str) {
        let _guard = self.lock.lock();
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Stop the spinner, leaving a final message
    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}

/// Format a duration as seconds with microsecond precision
pub fn format_secs(duration: Duration) -> String {
    format!("{:.6}", duration.as_secs_f64())
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print a header at the start of the run
pub fn print_header(requesters: usize, resolvers: usize, queue_size: usize, files: usize) {
    println!();
    println!(
        "{} {}",
        style("multi-lookup").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Requesters:").bold(), requesters);
    println!("  {} {}", style("Resolvers:").bold(), resolvers);
    println!("  {} {}", style("Queue size:").bold(), queue_size);
    println!("  {} {}", style("Input files:").bold(), files);
    println!();
}

/// Print a summary of the run
pub fn print_summary(result: &LookupResult) {
    println!();
    println!("{}", style("Lookup Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files serviced:").bold(),
        format_number(result.files_serviced)
    );
    if result.files_failed > 0 {
        println!(
            "  {} {}",
            style("Files failed:").yellow().bold(),
            format_number(result.files_failed)
        );
    }
    println!(
        "  {} {}",
        style("Hostnames:").bold(),
        format_number(result.hostnames_queued)
    );
    if result.hostnames_skipped > 0 {
        println!(
            "  {} {}",
            style("Excluded:").bold(),
            format_number(result.hostnames_skipped)
        );
    }
    println!(
        "  {} {}",
        style("Resolved:").bold(),
        format_number(result.resolved)
    );
    if result.not_resolved > 0 {
        println!(
            "  {} {}",
            style("Not resolved:").yellow().bold(),
            format_number(result.not_resolved)
        );
    }
    println!(
        "  {} {}",
        style("Queue waits:").bold(),
        format_number(result.backpressure_events)
    );
    println!(
        "  {} {:.1}s ({:.0} hostnames/sec)",
        style("Duration:").bold(),
        result.duration.as_secs_f64(),
        result.hostnames_per_second()
    );
    println!();
}
