//! Host Roster
//!
//! Ordered, failure-aware host lists for one client.
//!
//! # Design
//!
//! A roster keeps one list for reads and one for writes. Index 0 is the host
//! the request layer tries first. When a host fails at the connection level
//! the request layer records it in the shared [`FailingHosts`] registry and
//! calls [`HostRoster::rotate`]; every roster referencing that registry then
//! moves the host away from the front on its next rotation.
//!
//! ```text
//!   [A, B, C]  --A fails-->  FailingHosts{A}  --rotate-->  [B, C, A]
//! ```
//!
//! Rotation is bounded by the list length, so a roster whose hosts are all
//! failing comes back to its original order instead of spinning.

pub mod defaults;
pub mod failing;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use failing::{add_failing_host, FailingHosts};

// ============================================================================
// Host Types
// ============================================================================

/// What a host list is used for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostPurpose {
    /// Search and other read operations
    Read,
    /// Indexing and settings changes
    Write,
}

impl fmt::Display for HostPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Which default read hosts to generate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMode {
    /// The application's own DSN and replicas
    #[default]
    Standard,
    /// The shared places sub-service
    Places,
}

impl HostMode {
    /// Mode matching the `places_enabled` flag of the client
    #[must_use]
    pub fn from_places(places_enabled: bool) -> Self {
        if places_enabled {
            Self::Places
        } else {
            Self::Standard
        }
    }
}

/// Ordered list of candidate hosts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostList {
    hosts: Vec<String>,
}

impl HostList {
    /// Wrap a list of hosts, rejecting an empty one
    #[must_use]
    pub fn new(hosts: Vec<String>) -> Option<Self> {
        if hosts.is_empty() {
            None
        } else {
            Some(Self { hosts })
        }
    }

    /// Hosts in the order they should be tried
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.hosts
    }

    /// Preferred host
    #[must_use]
    pub fn head(&self) -> &str {
        &self.hosts[0]
    }

    /// Number of hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Always `false`; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Move failing hosts away from the front
    ///
    /// Rotates left while the head is failing, at most `len` times. Returns
    /// the number of rotations applied; a full cycle leaves the list in its
    /// original order.
    pub fn rotate_failing(&mut self, failing: &FailingHosts) -> usize {
        let mut rotations = 0;
        while rotations < self.hosts.len() && failing.contains(self.head()) {
            self.hosts.rotate_left(1);
            rotations += 1;
        }
        rotations
    }
}

#[derive(Clone, Debug)]
struct HostLists {
    read: HostList,
    write: HostList,
}

impl HostLists {
    fn get(&self, purpose: HostPurpose) -> &HostList {
        match purpose {
            HostPurpose::Read => &self.read,
            HostPurpose::Write => &self.write,
        }
    }
}

// ============================================================================
// Roster
// ============================================================================

/// Read and write host lists for one client
///
/// Lists live behind a lock so a roster shared between tasks can be rotated
/// and read through `&self`. Accessors return snapshots.
pub struct HostRoster {
    lists: RwLock<HostLists>,
    failing: Arc<FailingHosts>,
}

impl HostRoster {
    /// Build a roster and apply an initial rotation
    ///
    /// A non-empty `explicit` list is used verbatim for both purposes;
    /// otherwise default hosts are generated for `application_id` with replica
    /// order drawn from `rng`.
    pub fn build<R: Rng + ?Sized>(
        application_id: &str,
        explicit: Option<Vec<String>>,
        mode: HostMode,
        failing: Arc<FailingHosts>,
        rng: &mut R,
    ) -> Self {
        let lists = match explicit.and_then(HostList::new) {
            Some(list) => HostLists {
                read: list.clone(),
                write: list,
            },
            None => HostLists {
                read: default_list(defaults::read_hosts(application_id, mode, rng)),
                write: default_list(defaults::write_hosts(application_id, rng)),
            },
        };

        tracing::debug!(
            application_id = application_id,
            read = ?lists.read.as_slice(),
            write = ?lists.write.as_slice(),
            "Host roster resolved"
        );

        let roster = Self {
            lists: RwLock::new(lists),
            failing,
        };
        roster.rotate();
        roster
    }

    /// Reorder both lists so known-failing hosts are tried last
    ///
    /// Returns the number of rotations applied to the read and write lists.
    pub fn rotate(&self) -> (usize, usize) {
        let mut lists = self.lists.write();
        let read = lists.read.rotate_failing(&self.failing);
        let write = lists.write.rotate_failing(&self.failing);

        if read > 0 || write > 0 {
            tracing::debug!(
                read_rotations = read,
                write_rotations = write,
                read_head = lists.read.head(),
                write_head = lists.write.head(),
                "Rotated away from failing hosts"
            );
        }
        (read, write)
    }

    /// Record `host` as failing in this roster's registry
    ///
    /// Does not rotate; call [`rotate`](Self::rotate) before the next attempt.
    pub fn add_failing_host(&self, host: impl Into<String>) -> bool {
        self.failing.add(host)
    }

    /// Registry this roster consults when rotating
    #[must_use]
    pub fn failing_hosts(&self) -> &Arc<FailingHosts> {
        &self.failing
    }

    /// Snapshot of the hosts for `purpose`
    #[must_use]
    pub fn hosts(&self, purpose: HostPurpose) -> Vec<String> {
        self.lists.read().get(purpose).as_slice().to_vec()
    }

    /// Snapshot of the read hosts
    #[must_use]
    pub fn read_hosts(&self) -> Vec<String> {
        self.hosts(HostPurpose::Read)
    }

    /// Snapshot of the write hosts
    #[must_use]
    pub fn write_hosts(&self) -> Vec<String> {
        self.hosts(HostPurpose::Write)
    }

    /// Host to use for the given attempt, if the list is long enough
    #[must_use]
    pub fn host(&self, purpose: HostPurpose, attempt: usize) -> Option<String> {
        self.lists.read().get(purpose).as_slice().get(attempt).cloned()
    }

    /// Number of hosts for `purpose`
    #[must_use]
    pub fn len(&self, purpose: HostPurpose) -> usize {
        self.lists.read().get(purpose).len()
    }
}

impl fmt::Debug for HostRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lists = self.lists.read();
        f.debug_struct("HostRoster")
            .field("read", &lists.read.as_slice())
            .field("write", &lists.write.as_slice())
            .field("failing", &self.failing.len())
            .finish()
    }
}

// Default generation always yields four hosts
fn default_list(hosts: Vec<String>) -> HostList {
    HostList { hosts }
}
