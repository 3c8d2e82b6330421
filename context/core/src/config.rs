//! Connection Configuration
//!
//! Per-client settings the request layer reads before every attempt:
//! timeouts, forwarding and user-token headers, rate-limit impersonation and
//! arbitrary extra headers. Every setter is last-write-wins.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header carrying the application ID
pub const APPLICATION_ID_HEADER: &str = "X-Algolia-Application-Id";
/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Algolia-API-Key";
/// Header carrying the end user's IP
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";
/// Header carrying the key whose rate limit applies to the end user
pub const FORWARDED_API_KEY_HEADER: &str = "X-Forwarded-API-Key";
/// Header carrying the user token for analytics and personalization
pub const USER_TOKEN_HEADER: &str = "X-Algolia-UserToken";

// ============================================================================
// Timeouts
// ============================================================================

/// Per-attempt timeouts applied by the request layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Time allowed to establish a connection
    pub connect: Duration,
    /// Overall time allowed for non-search requests
    pub read: Duration,
    /// Overall time allowed for search requests
    pub search: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(1),
            read: Duration::from_secs(30),
            search: Duration::from_secs(5),
        }
    }
}

impl Timeouts {
    /// Overall timeout for a request
    #[must_use]
    pub fn for_request(&self, is_search: bool) -> Duration {
        if is_search {
            self.search
        } else {
            self.read
        }
    }
}

// ============================================================================
// Rate Limit Impersonation
// ============================================================================

/// Rate-limit impersonation fields
///
/// Requests are signed with the admin key while the rate limit of
/// `rate_limit_api_key` is applied to `end_user_ip`. The three values are only
/// ever set or cleared together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Key used to authenticate the request
    pub admin_api_key: String,
    /// IP of the end user the limit applies to
    pub end_user_ip: String,
    /// Key whose rate limit is applied
    pub rate_limit_api_key: String,
}

impl fmt::Debug for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimit")
            .field("admin_api_key", &format_args!("***"))
            .field("end_user_ip", &self.end_user_ip)
            .field("rate_limit_api_key", &format_args!("***"))
            .finish()
    }
}

// ============================================================================
// Connection Config
// ============================================================================

/// Mutable per-client connection settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connect/read/search timeouts
    pub timeouts: Timeouts,
    /// End-user IP forwarded with each request
    pub forwarded_for: Option<String>,
    /// User token forwarded with each request
    pub user_token: Option<String>,
    /// Additional headers, keyed by header name
    pub extra_headers: HashMap<String, String>,
    /// Active rate-limit impersonation, if any
    pub rate_limit: Option<RateLimit>,
}

impl ConnectionConfig {
    /// Create a configuration with default timeouts and no headers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeouts
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the forwarded end-user IP
    pub fn set_forwarded_for(&mut self, ip: impl Into<String>) {
        self.forwarded_for = Some(ip.into());
    }

    /// Set the user token
    pub fn set_user_token(&mut self, token: impl Into<String>) {
        self.user_token = Some(token.into());
    }

    /// Enable rate-limit impersonation
    pub fn set_rate_limit(
        &mut self,
        admin_api_key: impl Into<String>,
        end_user_ip: impl Into<String>,
        rate_limit_api_key: impl Into<String>,
    ) {
        self.rate_limit = Some(RateLimit {
            admin_api_key: admin_api_key.into(),
            end_user_ip: end_user_ip.into(),
            rate_limit_api_key: rate_limit_api_key.into(),
        });
    }

    /// Disable rate-limit impersonation
    pub fn disable_rate_limit(&mut self) {
        self.rate_limit = None;
    }

    /// Insert or replace an extra header
    pub fn set_extra_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_headers.insert(key.into(), value.into());
    }

    /// Headers the request layer attaches to every call
    ///
    /// While rate-limit impersonation is active the admin key authenticates
    /// the request and the impersonated IP replaces `forwarded_for`. Extra
    /// headers come last, sorted by name.
    #[must_use]
    pub fn request_headers(&self, application_id: &str, api_key: &str) -> Vec<(String, String)> {
        let mut headers = vec![(APPLICATION_ID_HEADER.to_string(), application_id.to_string())];

        match &self.rate_limit {
            Some(limit) => {
                headers.push((API_KEY_HEADER.to_string(), limit.admin_api_key.clone()));
                headers.push((FORWARDED_FOR_HEADER.to_string(), limit.end_user_ip.clone()));
                headers.push((
                    FORWARDED_API_KEY_HEADER.to_string(),
                    limit.rate_limit_api_key.clone(),
                ));
            }
            None => {
                headers.push((API_KEY_HEADER.to_string(), api_key.to_string()));
                if let Some(ip) = &self.forwarded_for {
                    headers.push((FORWARDED_FOR_HEADER.to_string(), ip.clone()));
                }
            }
        }

        if let Some(token) = &self.user_token {
            headers.push((USER_TOKEN_HEADER.to_string(), token.clone()));
        }

        let mut extra: Vec<_> = self
            .extra_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        extra.sort();
        headers.extend(extra);
        headers
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(1));
        assert_eq!(timeouts.read, Duration::from_secs(30));
        assert_eq!(timeouts.search, Duration::from_secs(5));
        assert_eq!(timeouts.for_request(true), Duration::from_secs(5));
        assert_eq!(timeouts.for_request(false), Duration::from_secs(30));
    }

    #[test]
    fn test_setters_are_last_write_wins() {
        let mut config = ConnectionConfig::new();
        config.set_forwarded_for("1.1.1.1");
        config.set_forwarded_for("2.2.2.2");
        config.set_user_token("first");
        config.set_user_token("second");
        config.set_extra_header("X-Custom", "a");
        config.set_extra_header("X-Custom", "b");

        assert_eq!(config.forwarded_for.as_deref(), Some("2.2.2.2"));
        assert_eq!(config.user_token.as_deref(), Some("second"));
        assert_eq!(config.extra_headers.len(), 1);
        assert_eq!(config.extra_headers["X-Custom"], "b");
    }

    #[test]
    fn test_rate_limit_set_and_cleared_together() {
        let mut config = ConnectionConfig::new();
        config.set_rate_limit("admin", "10.0.0.1", "limited");

        assert_eq!(
            config.rate_limit,
            Some(RateLimit {
                admin_api_key: "admin".to_string(),
                end_user_ip: "10.0.0.1".to_string(),
                rate_limit_api_key: "limited".to_string(),
            })
        );

        config.disable_rate_limit();
        assert_eq!(config.rate_limit, None);
    }

    #[test]
    fn test_rate_limit_debug_hides_keys() {
        let mut config = ConnectionConfig::new();
        config.set_rate_limit("s3cr3t-admin", "10.0.0.1", "s3cr3t-limited");

        let debug = format!("{config:?}");
        assert!(debug.contains("10.0.0.1"));
        assert!(!debug.contains("s3cr3t"), "{debug}");
    }

    #[test]
    fn test_request_headers_without_rate_limit() {
        let mut config = ConnectionConfig::new();
        config.set_forwarded_for("1.2.3.4");
        config.set_user_token("user-42");
        config.set_extra_header("X-B", "2");
        config.set_extra_header("X-A", "1");

        let headers = config.request_headers("APPID", "key");
        assert_eq!(header(&headers, APPLICATION_ID_HEADER), Some("APPID"));
        assert_eq!(header(&headers, API_KEY_HEADER), Some("key"));
        assert_eq!(header(&headers, FORWARDED_FOR_HEADER), Some("1.2.3.4"));
        assert_eq!(header(&headers, FORWARDED_API_KEY_HEADER), None);
        assert_eq!(header(&headers, USER_TOKEN_HEADER), Some("user-42"));

        let tail: Vec<_> = headers[headers.len() - 2..].iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(tail, vec!["X-A", "X-B"]);
    }

    #[test]
    fn test_request_headers_with_rate_limit() {
        let mut config = ConnectionConfig::new();
        config.set_forwarded_for("1.2.3.4");
        config.set_rate_limit("admin", "10.0.0.1", "limited");

        let headers = config.request_headers("APPID", "key");
        assert_eq!(header(&headers, API_KEY_HEADER), Some("admin"));
        assert_eq!(header(&headers, FORWARDED_FOR_HEADER), Some("10.0.0.1"));
        assert_eq!(header(&headers, FORWARDED_API_KEY_HEADER), Some("limited"));

        config.disable_rate_limit();
        let headers = config.request_headers("APPID", "key");
        assert_eq!(header(&headers, API_KEY_HEADER), Some("key"));
        assert_eq!(header(&headers, FORWARDED_FOR_HEADER), Some("1.2.3.4"));
        assert_eq!(header(&headers, FORWARDED_API_KEY_HEADER), None);
    }
}
