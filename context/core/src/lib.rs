//! Search Context Core - Host Failover and Connection Pooling
//!
//! This crate is the connection-context layer of a search-service client. It
//! decides which host a request should go to and brokers the multiplexer that
//! concurrent requests share. It never performs network I/O and never retries:
//! the request layer above drives both.
//!
//! # Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                    Request layer (caller)                     |
//! |   for attempt in 0..hosts {  send  | on connect error:        |
//! |                                    |   add_failing_host(h)    |
//! |                                    |   rotate_hosts()         |
//! +-------------------+-----------------------------+-------------+
//!                     |                             |
//!                     v                             v
//! +---------------------------------------------------------------+
//! |                        ClientContext                          |
//! |  +----------------+  +------------------+  +---------------+  |
//! |  | ClientIdentity |  |    HostRoster    |  |  HandlePool   |  |
//! |  |  app id / key  |  |  read / write    |  | (Transport)   |  |
//! |  +----------------+  +--------+---------+  +---------------+  |
//! |  ConnectionConfig             |                               |
//! +-------------------------------+-------------------------------+
//!                                 |
//!                                 v
//!                      +----------------------+
//!                      |     FailingHosts     |  <-- shared by every
//!                      +----------------------+      context in process
//! ```
//!
//! # Key Types
//!
//! - [`ClientContext`]: identity, roster, configuration and pool of one client
//! - [`HostRoster`]: ordered read/write host lists with failure rotation
//! - [`FailingHosts`]: concurrency-safe registry of failing hosts
//! - [`ConnectionConfig`]: timeouts, forwarded headers, rate-limit impersonation
//! - [`HandlePool`]: lazily created multiplexer, closed exactly once on drop
//! - [`Transport`]: the network primitive the pool drives
//!
//! # Module Overview
//!
//! - [`config`]: connection configuration and request headers
//! - [`context`]: client identity, builder and context
//! - [`error`]: error types
//! - [`http`]: `reqwest`-backed transport
//! - [`pool`]: transport trait and pooled multiplexer
//! - [`roster`]: host lists, default hosts and the failing-host registry
//! - [`settings`]: TOML and environment settings
//! - [`text`]: multi-byte aware string helpers

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod pool;
pub mod roster;
pub mod settings;
pub mod text;

// Re-exports for convenience
pub use config::{ConnectionConfig, RateLimit, Timeouts};
pub use context::{ClientContext, ClientIdentity, ContextBuilder};
pub use error::{ConfigError, ContextError, PoolError, SettingsError};
pub use http::{HttpMultiplexer, HttpRequest, HttpTransport, RequestId};
pub use pool::{HandlePool, PoolStats, Transport};
pub use roster::{add_failing_host, FailingHosts, HostList, HostMode, HostPurpose, HostRoster};
pub use settings::{default_settings_path, ContextSettings};
