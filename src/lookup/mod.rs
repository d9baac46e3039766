//! Parallel hostname lookup
//!
//! Two fixed-size thread pools joined by one bounded queue:
//!
//! ```text
//!        ┌──────────────────────────┐
//!        │   FileSource (cursor)    │
//!        └────────────┬─────────────┘
//!                     │ claim_next
//!     ┌───────────────┼───────────────┐
//! ┌───▼────┐     ┌────▼───┐      ┌────▼───┐
//! │ Req 0  │     │ Req 1  │ ...  │ Req N  │ ──► requester log
//! └───┬────┘     └────┬───┘      └────┬───┘
//!     └───────────────┼───────────────┘
//!                     ▼ put (blocks when full)
//!        ┌──────────────────────────┐
//!        │  BoundedQueue<WorkItem>  │
//!        └────────────┬─────────────┘
//!                     ▼ get (blocks when empty)
//!     ┌───────────────┼───────────────┐
//! ┌───▼────┐     ┌────▼───┐      ┌────▼───┐
//! │ Res 0  │     │ Res 1  │ ...  │ Res M  │ ──► resolver log
//! └────────┘     └────────┘      └────────┘
//! ```
//!
//! The coordinator joins every requester, then pushes one
//! [`WorkItem::Shutdown`] per resolver and joins the resolvers.

pub mod coordinator;
pub mod queue;
pub mod requester;
pub mod resolver;
pub mod source;

pub use coordinator::{LookupContext, LookupCoordinator, LookupResult};
pub use queue::{BoundedQueue, QueueStats, WorkItem};
pub use requester::{Requester, RequesterStats};
pub use resolver::{Resolver, ResolverStats};
pub use source::FileSource;

use crate::error::WorkerError;
use crate::progress::{WorkerReport, WorkerRole};
use std::any::Any;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Spawn a named worker thread running `body`
fn spawn_worker<F>(name: &str, body: F) -> Result<JoinHandle<WorkerReport>, WorkerError>
where
    F: FnOnce(String) -> WorkerReport + Send + 'static,
{
    let thread_name = name.to_string();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(thread_name))
        .map_err(|e| WorkerError::SpawnFailed {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Join a worker thread, turning a panic into [`WorkerError::Panicked`]
///
/// Joining an already-joined worker yields an empty report.
fn join_worker(
    name: &str,
    handle: Option<JoinHandle<WorkerReport>>,
    role: WorkerRole,
) -> Result<WorkerReport, WorkerError> {
    match handle {
        Some(handle) => handle.join().map_err(|payload| WorkerError::Panicked {
            name: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
        None => Ok(WorkerReport {
            name: name.to_string(),
            role,
            processed: 0,
            elapsed: Duration::ZERO,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker thread panicked".to_string()
    }
}
