//! Client Context
//!
//! Everything one search client needs to issue requests: its identity, the
//! host roster, the mutable connection configuration and the pooled
//! multiplexer. The request layer above owns the retry loop; it reads hosts
//! from here, records failures, rotates, and moves on to the next host.
//!
//! # Usage
//!
//! ```
//! use search_context_core::{ClientContext, HostPurpose};
//!
//! let mut context = ClientContext::new("APPID", "api-key", None, false)?;
//! context.set_user_token("user-42");
//!
//! let first = context.host(HostPurpose::Read, 0);
//! assert_eq!(first.as_deref(), Some("APPID-dsn.algolia.net"));
//! # Ok::<(), search_context_core::ConfigError>(())
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::{ConnectionConfig, RateLimit, Timeouts};
use crate::error::{ConfigError, ContextError, PoolError};
use crate::http::HttpTransport;
use crate::pool::{HandlePool, PoolStats, Transport};
use crate::roster::{FailingHosts, HostMode, HostPurpose, HostRoster};
use crate::settings::ContextSettings;
use crate::text;

// ============================================================================
// Identity
// ============================================================================

/// Application ID and API key of a client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    application_id: String,
    api_key: String,
}

impl ClientIdentity {
    /// Validate and wrap an identity
    ///
    /// Both values must contain at least one character.
    pub fn new(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let application_id = application_id.into();
        let api_key = api_key.into();

        if text::char_len(&application_id) == 0 {
            return Err(ConfigError::MissingApplicationId);
        }
        if text::char_len(&api_key) == 0 {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            application_id,
            api_key,
        })
    }

    /// Application ID
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// API key
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("application_id", &self.application_id)
            .field("api_key", &format_args!("***"))
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientContext`]
pub struct ContextBuilder<T: Transport = HttpTransport> {
    application_id: String,
    api_key: String,
    hosts: Option<Vec<String>>,
    mode: HostMode,
    failing: Option<Arc<FailingHosts>>,
    timeouts: Timeouts,
    transport: T,
}

impl ContextBuilder {
    /// Start building a context with the default HTTP transport
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            hosts: None,
            mode: HostMode::Standard,
            failing: None,
            timeouts: Timeouts::default(),
            transport: HttpTransport::default(),
        }
    }
}

impl<T: Transport> ContextBuilder<T> {
    /// Use an explicit host list for both reads and writes
    #[must_use]
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    /// Use the places sub-service read hosts
    #[must_use]
    pub fn with_places(mut self, enabled: bool) -> Self {
        self.mode = HostMode::from_places(enabled);
        self
    }

    /// Share a failing-host registry instead of the process-wide one
    #[must_use]
    pub fn with_failing_hosts(mut self, failing: Arc<FailingHosts>) -> Self {
        self.failing = Some(failing);
        self
    }

    /// Set the initial timeouts
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Swap the transport
    pub fn with_transport<U: Transport>(self, transport: U) -> ContextBuilder<U> {
        ContextBuilder {
            application_id: self.application_id,
            api_key: self.api_key,
            hosts: self.hosts,
            mode: self.mode,
            failing: self.failing,
            timeouts: self.timeouts,
            transport,
        }
    }

    /// Build the context, shuffling default replicas with the thread RNG
    pub fn build(self) -> Result<ClientContext<T>, ConfigError> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    /// Build the context, shuffling default replicas with `rng`
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        rng: &mut R,
    ) -> Result<ClientContext<T>, ConfigError> {
        let identity = ClientIdentity::new(self.application_id, self.api_key)?;
        let failing = self.failing.unwrap_or_else(FailingHosts::global);
        let roster = HostRoster::build(
            identity.application_id(),
            self.hosts,
            self.mode,
            failing,
            rng,
        );

        tracing::debug!(
            application_id = identity.application_id(),
            mode = ?self.mode,
            "Client context created"
        );

        Ok(ClientContext {
            identity,
            roster,
            config: ConnectionConfig::new().with_timeouts(self.timeouts),
            pool: HandlePool::new(self.transport),
        })
    }
}

// ============================================================================
// Context
// ============================================================================

/// Connection context of one search client
pub struct ClientContext<T: Transport = HttpTransport> {
    identity: ClientIdentity,
    roster: HostRoster,
    config: ConnectionConfig,
    pool: HandlePool<T>,
}

impl ClientContext {
    /// Create a context with the default transport and the process-wide
    /// failing-host registry
    ///
    /// `hosts`, when given and non-empty, replaces the default hosts for both
    /// reads and writes.
    pub fn new(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
        hosts: Option<Vec<String>>,
        places_enabled: bool,
    ) -> Result<Self, ConfigError> {
        let mut builder = ContextBuilder::new(application_id, api_key).with_places(places_enabled);
        if let Some(hosts) = hosts {
            builder = builder.with_hosts(hosts);
        }
        builder.build()
    }

    /// Start a [`ContextBuilder`]
    pub fn builder(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ContextBuilder {
        ContextBuilder::new(application_id, api_key)
    }

    /// Create a context from loaded settings
    pub fn from_settings(settings: &ContextSettings) -> Result<Self, ContextError> {
        let mut builder = ContextBuilder::new(&settings.application_id, &settings.api_key)
            .with_places(settings.places_enabled)
            .with_timeouts(settings.timeouts());
        if let Some(hosts) = &settings.hosts {
            builder = builder.with_hosts(hosts.iter().cloned());
        }
        Ok(builder.build()?)
    }
}

impl<T: Transport> ClientContext<T> {
    // ------------------------------------------------------------------------
    // Identity and hosts
    // ------------------------------------------------------------------------

    /// Identity of the client
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Application ID
    #[must_use]
    pub fn application_id(&self) -> &str {
        self.identity.application_id()
    }

    /// API key
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.identity.api_key()
    }

    /// Host roster
    #[must_use]
    pub fn roster(&self) -> &HostRoster {
        &self.roster
    }

    /// Snapshot of the read hosts, in the order to try them
    #[must_use]
    pub fn read_hosts(&self) -> Vec<String> {
        self.roster.read_hosts()
    }

    /// Snapshot of the write hosts, in the order to try them
    #[must_use]
    pub fn write_hosts(&self) -> Vec<String> {
        self.roster.write_hosts()
    }

    /// Host for the given attempt of a request
    #[must_use]
    pub fn host(&self, purpose: HostPurpose, attempt: usize) -> Option<String> {
        self.roster.host(purpose, attempt)
    }

    /// Reorder both host lists so failing hosts are tried last
    pub fn rotate_hosts(&self) -> (usize, usize) {
        self.roster.rotate()
    }

    /// Record a host that failed at the connection level
    pub fn add_failing_host(&self, host: impl Into<String>) -> bool {
        self.roster.add_failing_host(host)
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Current connection configuration
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Current timeouts
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        self.config.timeouts
    }

    /// Connect timeout and overall timeout for one attempt
    #[must_use]
    pub fn timeout_for(&self, is_search: bool) -> (Duration, Duration) {
        let timeouts = self.config.timeouts;
        (timeouts.connect, timeouts.for_request(is_search))
    }

    /// Replace all three timeouts
    pub fn set_timeouts(&mut self, connect: Duration, read: Duration, search: Duration) {
        self.config.timeouts = Timeouts {
            connect,
            read,
            search,
        };
    }

    /// End-user IP forwarded with each request
    #[must_use]
    pub fn forwarded_for(&self) -> Option<&str> {
        self.config.forwarded_for.as_deref()
    }

    /// Forward the end user's IP with each request
    pub fn set_forwarded_for(&mut self, ip: impl Into<String>) {
        self.config.set_forwarded_for(ip);
    }

    /// User token sent with each request
    #[must_use]
    pub fn user_token(&self) -> Option<&str> {
        self.config.user_token.as_deref()
    }

    /// Send a user token with each request
    pub fn set_user_token(&mut self, token: impl Into<String>) {
        self.config.set_user_token(token);
    }

    /// Active rate-limit impersonation
    #[must_use]
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.config.rate_limit.as_ref()
    }

    /// Sign requests with `admin_api_key` while applying the rate limit of
    /// `rate_limit_api_key` to `end_user_ip`
    pub fn set_rate_limit(
        &mut self,
        admin_api_key: impl Into<String>,
        end_user_ip: impl Into<String>,
        rate_limit_api_key: impl Into<String>,
    ) {
        self.config
            .set_rate_limit(admin_api_key, end_user_ip, rate_limit_api_key);
    }

    /// Stop rate-limit impersonation
    pub fn disable_rate_limit(&mut self) {
        self.config.disable_rate_limit();
    }

    /// Insert or replace an extra header
    pub fn set_extra_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.set_extra_header(key, value);
    }

    /// Headers to attach to every request
    #[must_use]
    pub fn request_headers(&self) -> Vec<(String, String)> {
        self.config
            .request_headers(self.identity.application_id(), self.identity.api_key())
    }

    // ------------------------------------------------------------------------
    // Pooled multiplexer
    // ------------------------------------------------------------------------

    /// Register a request with the shared multiplexer
    ///
    /// The multiplexer is created on the first call. The returned view drives
    /// I/O for the request and may be held while other requests register.
    pub fn get_handle(&self, handle: &T::Handle) -> Result<T::Shared, PoolError> {
        self.pool.acquire(handle, &self.config)
    }

    /// Inspect the multiplexer, if any request has created it
    pub fn with_multiplexer<R>(&self, f: impl FnOnce(&T::Multiplexer) -> R) -> Option<R> {
        self.pool.with_multiplexer(f)
    }

    /// Unregister a request; the multiplexer stays open
    pub fn release_handle(&self, handle: &T::Handle) -> Result<(), PoolError> {
        self.pool.release(handle)
    }

    /// Pool activity counters
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<T: Transport> fmt::Debug for ClientContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("identity", &self.identity)
            .field("roster", &self.roster)
            .field("config", &self.config)
            .field("pool", &self.pool.stats())
            .finish()
    }
}
