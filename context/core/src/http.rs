//! HTTP Transport
//!
//! Default [`Transport`] backed by `reqwest`. The multiplexer owns one
//! `reqwest::Client`, which keeps its own connection pool per host, and
//! tracks the requests currently registered against it. Registered requests
//! receive a clone of that client; clones share the same connection pool.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::config::ConnectionConfig;
use crate::error::PoolError;
use crate::pool::Transport;

/// Unique identifier of an in-flight request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One request aimed at a host from the roster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request identifier
    pub id: RequestId,
    /// Target hostname
    pub host: String,
    /// Path and query, starting with `/`
    pub path: String,
}

impl HttpRequest {
    /// Create a request for `path` on `host`
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            host: host.into(),
            path: path.into(),
        }
    }

    /// Full HTTPS URL of the request
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://{}{}", self.host, self.path)
    }
}

/// Shared client plus the requests registered against it
pub struct HttpMultiplexer {
    client: reqwest::Client,
    in_flight: HashMap<RequestId, HttpRequest>,
}

impl HttpMultiplexer {
    /// Client to issue registered requests with
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Check whether a request is registered
    #[must_use]
    pub fn contains(&self, id: RequestId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Number of registered requests
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl fmt::Debug for HttpMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMultiplexer")
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// `reqwest`-backed transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Maximum idle connections kept per host
    pub max_idle_per_host: usize,
    /// How long an idle connection is kept
    pub idle_timeout: Duration,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            max_idle_per_host: 4,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Transport for HttpTransport {
    type Multiplexer = HttpMultiplexer;
    type Handle = HttpRequest;
    type Shared = reqwest::Client;

    fn create_multiplexer(&self, config: &ConnectionConfig) -> Result<HttpMultiplexer, PoolError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.read)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
            .build()
            .map_err(|e| PoolError::CreateFailed(e.to_string()))?;

        Ok(HttpMultiplexer {
            client,
            in_flight: HashMap::new(),
        })
    }

    fn add_handle(
        &self,
        multiplexer: &mut HttpMultiplexer,
        handle: &HttpRequest,
    ) -> Result<(), PoolError> {
        if multiplexer.in_flight.contains_key(&handle.id) {
            return Err(PoolError::AlreadyRegistered(handle.id.to_string()));
        }
        tracing::debug!(request_id = %handle.id, host = %handle.host, "Request registered");
        multiplexer.in_flight.insert(handle.id, handle.clone());
        Ok(())
    }

    fn remove_handle(
        &self,
        multiplexer: &mut HttpMultiplexer,
        handle: &HttpRequest,
    ) -> Result<(), PoolError> {
        multiplexer
            .in_flight
            .remove(&handle.id)
            .map(|_| ())
            .ok_or_else(|| PoolError::NotRegistered(handle.id.to_string()))
    }

    fn share(&self, multiplexer: &HttpMultiplexer) -> reqwest::Client {
        multiplexer.client.clone()
    }

    fn close_multiplexer(&self, multiplexer: HttpMultiplexer) {
        if !multiplexer.in_flight.is_empty() {
            tracing::warn!(
                in_flight = multiplexer.in_flight.len(),
                "Closing multiplexer with requests still registered"
            );
        }
        drop(multiplexer);
    }
}
