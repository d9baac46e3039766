//! multi-lookup - Parallel bulk hostname resolution
//!
//! Reads hostnames from a set of input files and resolves them with two
//! cooperating thread pools connected by a fixed-capacity blocking queue.
//!
//! # Features
//!
//! - **Bounded Queue with Backpressure**: requesters block when the resolvers
//!   fall behind, so memory use stays flat no matter how large the inputs are.
//!
//! - **Exactly-Once File Claims**: input files are handed out one at a time
//!   from a shared cursor; no file is read twice.
//!
//! - **Deterministic Shutdown**: after the last requester exits, the
//!   coordinator queues exactly one shutdown item per resolver. Every hostname
//!   queued before it is resolved first.
//!
//! - **Recoverable Failures**: unreadable input files are skipped with a
//!   warning and unresolvable hostnames are logged as `NOT_RESOLVED`; neither
//!   stops a worker.
//!
//! # Architecture
//!
//! ```text
//!   input files ──► Requester pool ──► BoundedQueue ──► Resolver pool
//!                        │                                   │
//!                        ▼                                   ▼
//!                  requester log                       resolver log
//! ```
//!
//! # Example
//!
//! ```bash
//! # 3 requesters, 5 resolvers
//! multi-lookup 3 5 serviced.txt results.txt input/names*.txt
//!
//! # Larger queue, live progress, 2 second resolution timeout
//! multi-lookup 4 8 req.log res.log input/*.txt --queue-size 64 --timeout 2000 -p
//! ```

pub mod config;
pub mod error;
pub mod lookup;
pub mod progress;
pub mod resolve;
pub mod results;

pub use config::{CliArgs, LookupConfig};
pub use error::{LookupError, Result};
pub use lookup::{BoundedQueue, FileSource, LookupCoordinator, LookupResult, WorkItem};
pub use resolve::{Resolve, SystemResolver};
pub use results::{ResultLog, NOT_RESOLVED};
