//! Failing Host Registry
//!
//! Remembers hosts that failed at the connection level so that rosters can
//! push them to the back of their lists. Entries never expire; the set only
//! grows for the lifetime of the registry.
//!
//! A single process-wide registry is available through
//! [`FailingHosts::global`]. Tests and embedders that need isolation build
//! their own instance and hand it to each context.

use std::sync::{Arc, OnceLock};

use dashmap::DashSet;

static GLOBAL: OnceLock<Arc<FailingHosts>> = OnceLock::new();

/// Concurrency-safe set of hostnames known to have failed
#[derive(Debug, Default)]
pub struct FailingHosts {
    hosts: DashSet<String>,
}

impl FailingHosts {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry ready to be shared between contexts
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The registry shared by every context in this process
    pub fn global() -> Arc<Self> {
        GLOBAL.get_or_init(Self::shared).clone()
    }

    /// Record `host` as failing
    ///
    /// Returns `true` the first time a host is recorded. Existing rosters are
    /// not reordered until they rotate.
    pub fn add(&self, host: impl Into<String>) -> bool {
        let host = host.into();
        let inserted = self.hosts.insert(host.clone());
        if inserted {
            tracing::warn!(host = %host, "Host marked as failing");
        }
        inserted
    }

    /// Check whether `host` has been recorded
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    /// Number of recorded hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check whether no host has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Sorted copy of the recorded hosts
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.hosts.iter().map(|h| h.key().clone()).collect();
        hosts.sort();
        hosts
    }
}

/// Record `host` as failing in the process-wide registry
pub fn add_failing_host(host: impl Into<String>) -> bool {
    FailingHosts::global().add(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let failing = FailingHosts::new();
        assert!(failing.add("a.algolianet.com"));
        assert_eq!(failing.len(), 1);

        assert!(!failing.add("a.algolianet.com"));
        assert_eq!(failing.len(), 1);
    }

    #[test]
    fn test_membership_is_exact() {
        let failing = FailingHosts::new();
        failing.add("app-1.algolianet.com");

        assert!(failing.contains("app-1.algolianet.com"));
        assert!(!failing.contains("APP-1.algolianet.com"));
        assert!(!failing.contains("app-1.algolianet.com."));
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let failing = FailingHosts::new();
        failing.add("c");
        failing.add("a");
        failing.add("b");
        assert_eq!(failing.snapshot(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_global_is_shared() {
        let a = FailingHosts::global();
        let b = FailingHosts::global();
        assert!(Arc::ptr_eq(&a, &b));

        add_failing_host("global-registry-test.algolianet.com");
        assert!(b.contains("global-registry-test.algolianet.com"));
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        let failing = FailingHosts::shared();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let failing = Arc::clone(&failing);
                scope.spawn(move || {
                    for i in 0..100 {
                        failing.add(format!("host-{t}-{i}"));
                        // Every thread also races on a shared name
                        failing.add(format!("shared-{i}"));
                    }
                });
            }
        });

        assert_eq!(failing.len(), 8 * 100 + 100);
    }
}
