//! Pooled Multiplexer Management
//!
//! A context issues concurrent requests through one multiplexer shared by all
//! of its request handles. The multiplexer is:
//! - created lazily, on the first registration
//! - reused by every later registration
//! - closed exactly once, when the pool is dropped
//!
//! # Design
//!
//! The transport primitive is abstracted behind [`Transport`] so the request
//! layer can plug in whatever actually performs network calls. The pool owns
//! the multiplexer as an `Option` behind a mutex. The mutex is held only while
//! a handle is registered or unregistered; callers drive I/O through the
//! cloneable [`Transport::Shared`] view, so one request in flight never blocks
//! the next registration. `Drop` takes the multiplexer out so the close
//! operation cannot run twice, including while unwinding.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::ConnectionConfig;
use crate::error::PoolError;

// ============================================================================
// Transport Trait
// ============================================================================

/// Transport primitive consumed by the pool
pub trait Transport: Send + Sync {
    /// Pool of in-flight request handles
    type Multiplexer: Send;

    /// One network request
    type Handle;

    /// Cheap view of the multiplexer used to drive I/O outside the pool lock
    type Shared: Clone + Send;

    /// Create a new multiplexer
    fn create_multiplexer(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Self::Multiplexer, PoolError>;

    /// Register a request with the multiplexer
    fn add_handle(
        &self,
        multiplexer: &mut Self::Multiplexer,
        handle: &Self::Handle,
    ) -> Result<(), PoolError>;

    /// Unregister a request from the multiplexer
    fn remove_handle(
        &self,
        multiplexer: &mut Self::Multiplexer,
        handle: &Self::Handle,
    ) -> Result<(), PoolError>;

    /// Hand out a view of the multiplexer for a registered request
    fn share(&self, multiplexer: &Self::Multiplexer) -> Self::Shared;

    /// Release the multiplexer and everything it holds
    fn close_multiplexer(&self, multiplexer: Self::Multiplexer);
}

// ============================================================================
// Pool Statistics
// ============================================================================

/// Snapshot of pool activity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Multiplexers created
    pub multiplexers_created: u64,
    /// Multiplexers closed
    pub multiplexers_closed: u64,
    /// Handles currently registered
    pub registered_handles: usize,
    /// Successful registrations
    pub registrations: u64,
    /// Failed registrations or unregistrations
    pub errors: u64,
}

/// Atomic statistics for lock-free reads
#[derive(Default)]
struct PoolStatsAtomic {
    multiplexers_created: AtomicU64,
    multiplexers_closed: AtomicU64,
    registered_handles: AtomicUsize,
    registrations: AtomicU64,
    errors: AtomicU64,
}

impl PoolStatsAtomic {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            multiplexers_created: self.multiplexers_created.load(Ordering::Relaxed),
            multiplexers_closed: self.multiplexers_closed.load(Ordering::Relaxed),
            registered_handles: self.registered_handles.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Handle Pool
// ============================================================================

/// Lazily created multiplexer shared by one context's requests
pub struct HandlePool<T: Transport> {
    transport: T,
    multiplexer: Mutex<Option<T::Multiplexer>>,
    stats: PoolStatsAtomic,
}

impl<T: Transport> HandlePool<T> {
    /// Create a pool; no multiplexer exists until the first registration
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            multiplexer: Mutex::new(None),
            stats: PoolStatsAtomic::default(),
        }
    }

    /// The transport backing this pool
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Check whether the multiplexer has been created
    pub fn is_open(&self) -> bool {
        self.multiplexer.lock().is_some()
    }

    /// Current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Register `handle`, creating the multiplexer on first use
    ///
    /// The lock is released before returning; the shared view stays valid
    /// while further requests register.
    pub fn acquire(
        &self,
        handle: &T::Handle,
        config: &ConnectionConfig,
    ) -> Result<T::Shared, PoolError> {
        let mut slot = self.multiplexer.lock();
        let multiplexer = match *slot {
            Some(ref mut existing) => existing,
            ref mut empty @ None => {
                let created = self.transport.create_multiplexer(config).inspect_err(|e| {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "Failed to create multiplexer");
                })?;
                self.stats
                    .multiplexers_created
                    .fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Multiplexer created");
                empty.insert(created)
            }
        };

        if let Err(e) = self.transport.add_handle(multiplexer, handle) {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
        self.stats.registrations.fetch_add(1, Ordering::Relaxed);
        self.stats
            .registered_handles
            .fetch_add(1, Ordering::Relaxed);

        Ok(self.transport.share(multiplexer))
    }

    /// Inspect the multiplexer, if it has been created
    pub fn with_multiplexer<R>(&self, f: impl FnOnce(&T::Multiplexer) -> R) -> Option<R> {
        self.multiplexer.lock().as_ref().map(f)
    }

    /// Unregister `handle`
    ///
    /// The multiplexer itself stays open for later requests.
    pub fn release(&self, handle: &T::Handle) -> Result<(), PoolError> {
        let mut slot = self.multiplexer.lock();
        let Some(multiplexer) = slot.as_mut() else {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            return Err(PoolError::NotRegistered(
                "no multiplexer has been created".to_string(),
            ));
        };

        if let Err(e) = self.transport.remove_handle(multiplexer, handle) {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
        self.stats
            .registered_handles
            .fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

impl<T: Transport> Drop for HandlePool<T> {
    fn drop(&mut self) {
        if let Some(multiplexer) = self.multiplexer.get_mut().take() {
            self.transport.close_multiplexer(multiplexer);
            self.stats
                .multiplexers_closed
                .fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                handles_left = self.stats.registered_handles.load(Ordering::Relaxed),
                "Multiplexer closed"
            );
        }
    }
}
