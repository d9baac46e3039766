//! Hostname resolution
//!
//! The resolver pool talks to name resolution through the [`Resolve`] trait
//! so tests can substitute a deterministic table. [`SystemResolver`] uses the
//! platform resolver (`getaddrinfo` via `ToSocketAddrs`) and can put an upper
//! bound on how long a single lookup may block a resolver thread.

use crate::error::{ResolveError, ResolveResult};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Timed-out lookups still running in the background before new bounded
/// lookups are refused
pub const MAX_STALLED_LOOKUPS: usize = 64;

/// A thread-safe hostname to address lookup
///
/// Implementations are called concurrently from every resolver thread.
/// Failure is an expected outcome, not a reason to stop.
pub trait Resolve: Send + Sync {
    /// Resolve `hostname` to a single address
    fn resolve(&self, hostname: &str) -> ResolveResult<IpAddr>;
}

/// Resolver backed by the operating system
///
/// With a timeout, each lookup runs on a `lookup-helper` thread. `getaddrinfo`
/// cannot be cancelled, so a helper that outlives its timeout keeps running
/// until the OS answers. At most [`MAX_STALLED_LOOKUPS`] helpers may be alive
/// at once; past that, lookups fail immediately instead of piling up threads.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    /// Upper bound for a single lookup (None = wait as long as the OS does)
    timeout: Option<Duration>,

    /// Helper threads currently alive, shared across clones
    helpers: Arc<AtomicUsize>,

    /// Cap on `helpers`
    max_helpers: usize,
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemResolver {
    /// Create a resolver without a timeout
    pub fn new() -> Self {
        Self {
            timeout: None,
            helpers: Arc::new(AtomicUsize::new(0)),
            max_helpers: MAX_STALLED_LOOKUPS,
        }
    }

    /// Create a resolver that gives up after `timeout`
    ///
    /// A zero duration disables the timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: (!timeout.is_zero()).then_some(timeout),
            ..Self::new()
        }
    }

    /// Configured timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Helper threads still running
    pub fn helpers_in_flight(&self) -> usize {
        self.helpers.load(Ordering::Acquire)
    }

    /// Run `lookup` on a helper thread and wait at most `timeout` for it
    pub(crate) fn bounded_by<F>(&self, hostname: &str, timeout: Duration, lookup: F) -> ResolveResult<IpAddr>
    where
        F: FnOnce() -> ResolveResult<IpAddr> + Send + 'static,
    {
        let slot = HelperSlot::acquire(&self.helpers, self.max_helpers).ok_or_else(|| {
            warn!(hostname = %hostname, limit = self.max_helpers, "Too many stalled lookups");
            ResolveError::LookupFailed {
                hostname: hostname.to_string(),
                reason: format!("{} stalled lookups still running", self.max_helpers),
            }
        })?;

        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("lookup-helper".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(lookup());
            })
            .map_err(|e| ResolveError::LookupFailed {
                hostname: hostname.to_string(),
                reason: format!("failed to spawn lookup thread: {e}"),
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                debug!(hostname = %hostname, timeout_ms = timeout.as_millis() as u64, "Lookup timed out");
                Err(ResolveError::Timeout {
                    hostname: hostname.to_string(),
                    timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(ResolveError::LookupFailed {
                hostname: hostname.to_string(),
                reason: "lookup thread exited without an answer".into(),
            }),
        }
    }
}

impl Resolve for SystemResolver {
    fn resolve(&self, hostname: &str) -> ResolveResult<IpAddr> {
        if hostname.is_empty() {
            return Err(ResolveError::Empty);
        }

        match self.timeout {
            Some(timeout) => {
                let host = hostname.to_string();
                self.bounded_by(hostname, timeout, move || system_lookup(&host))
            }
            None => system_lookup(hostname),
        }
    }
}

/// One live helper thread; released on drop, even if the lookup panics
struct HelperSlot(Arc<AtomicUsize>);

impl HelperSlot {
    fn acquire(helpers: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        helpers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| Self(Arc::clone(helpers)))
    }
}

impl Drop for HelperSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Blocking lookup through the system resolver
fn system_lookup(hostname: &str) -> ResolveResult<IpAddr> {
    let addrs = (hostname, 0u16)
        .to_socket_addrs()
        .map_err(|e| ResolveError::LookupFailed {
            hostname: hostname.to_string(),
            reason: e.to_string(),
        })?;

    let ip = pick_address(addrs).ok_or_else(|| ResolveError::NoAddresses {
        hostname: hostname.to_string(),
    })?;

    trace!(hostname = %hostname, ip = %ip, "Resolved");
    Ok(ip)
}

/// Choose one address from a lookup answer: first IPv4, else first of any family
fn pick_address(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<IpAddr> {
    let mut fallback = None;
    for addr in addrs {
        match addr.ip() {
            ip @ IpAddr::V4(_) => return Some(ip),
            ip => {
                fallback.get_or_insert(ip);
            }
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::Instant;

    #[test]
    fn test_pick_address_prefers_ipv4() {
        let addrs = vec![
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 0),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 0),
        ];
        assert_eq!(
            pick_address(addrs),
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
        );
    }

    #[test]
    fn test_pick_address_falls_back_to_ipv6() {
        let addrs = vec![SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0)];
        assert_eq!(pick_address(addrs), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(pick_address(Vec::new()), None);
    }

    #[test]
    fn test_numeric_hosts_resolve_without_dns() {
        let resolver = SystemResolver::new();
        assert_eq!(
            resolver.resolve("127.0.0.1").unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );

        let bounded = SystemResolver::with_timeout(Duration::from_secs(5));
        assert_eq!(
            bounded.resolve("10.1.2.3").unwrap(),
            IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))
        );
    }

    #[test]
    fn test_empty_hostname_rejected() {
        let resolver = SystemResolver::new();
        assert!(matches!(resolver.resolve(""), Err(ResolveError::Empty)));
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        assert_eq!(SystemResolver::with_timeout(Duration::ZERO).timeout(), None);
        assert_eq!(
            SystemResolver::with_timeout(Duration::from_millis(250)).timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_stalled_lookup_times_out() {
        let resolver = SystemResolver::with_timeout(Duration::from_millis(20));
        let (release, stalled) = bounded::<()>(0);

        let result = resolver.bounded_by("stalled.example", Duration::from_millis(20), move || {
            let _ = stalled.recv();
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        });

        match result {
            Err(ResolveError::Timeout { hostname, timeout }) => {
                assert_eq!(hostname, "stalled.example");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        drop(release);
    }

    #[test]
    fn test_stalled_helpers_are_capped() {
        let resolver = SystemResolver {
            max_helpers: 1,
            ..SystemResolver::with_timeout(Duration::from_millis(10))
        };
        let (release, stalled) = bounded::<()>(0);
        let quick = || -> ResolveResult<IpAddr> { Ok(IpAddr::V4(Ipv4Addr::LOCALHOST)) };

        let first = resolver.bounded_by("stalled.example", Duration::from_millis(10), move || {
            let _ = stalled.recv();
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        });
        assert!(matches!(first, Err(ResolveError::Timeout { .. })));
        assert_eq!(resolver.helpers_in_flight(), 1);

        let refused = resolver.bounded_by("next.example", Duration::from_secs(1), quick);
        assert!(matches!(refused, Err(ResolveError::LookupFailed { .. })));

        drop(release);
        let deadline = Instant::now() + Duration::from_secs(5);
        while resolver.helpers_in_flight() > 0 {
            assert!(Instant::now() < deadline, "helper thread never exited");
            thread::sleep(Duration::from_millis(5));
        }

        let answered = resolver.bounded_by("next.example", Duration::from_secs(1), quick);
        assert_eq!(answered.unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_panicking_helper_releases_its_slot() {
        let resolver = SystemResolver::with_timeout(Duration::from_secs(5));
        let result = resolver.bounded_by("boom.example", Duration::from_secs(5), || panic!("lookup blew up"));

        assert!(matches!(result, Err(ResolveError::LookupFailed { .. })));
        let deadline = Instant::now() + Duration::from_secs(5);
        while resolver.helpers_in_flight() > 0 {
            assert!(Instant::now() < deadline, "slot never released");
            thread::sleep(Duration::from_millis(5));
        }
    }
}
