//! Context Settings
//!
//! Construction input for a [`ClientContext`](crate::ClientContext), loadable
//! from a TOML file and overridable from the environment.
//!
//! ```toml
//! application_id = "APPID"
//! api_key = "secret"
//! hosts = ["search-1.example.com", "search-2.example.com"]
//! places_enabled = false
//! connect_timeout_ms = 1000
//! read_timeout_ms = 30000
//! search_timeout_ms = 5000
//! ```
//!
//! Environment variables:
//! - `ALGOLIA_APPLICATION_ID`: application ID
//! - `ALGOLIA_API_KEY`: API key
//! - `ALGOLIA_HOSTS`: comma separated explicit host list
//! - `ALGOLIA_PLACES`: "1" or "true" to use the places hosts

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Timeouts;
use crate::error::SettingsError;
use crate::roster::HostMode;

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Settings used to build a context
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Application ID
    pub application_id: String,
    /// API key
    pub api_key: String,
    /// Explicit hosts; `None` or empty means default hosts
    pub hosts: Option<Vec<String>>,
    /// Use the places sub-service read hosts
    pub places_enabled: bool,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Search timeout in milliseconds
    pub search_timeout_ms: u64,
}

impl Default for ContextSettings {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            application_id: String::new(),
            api_key: String::new(),
            hosts: None,
            places_enabled: false,
            connect_timeout_ms: duration_ms(timeouts.connect),
            read_timeout_ms: duration_ms(timeouts.read),
            search_timeout_ms: duration_ms(timeouts.search),
        }
    }
}

impl ContextSettings {
    /// Settings for an identity with every other field defaulted
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded context settings");
        Ok(settings)
    }

    /// Load settings from the default path, then apply environment overrides
    ///
    /// A missing file is not an error; the environment alone may be enough.
    pub fn load() -> Result<Self, SettingsError> {
        let path = default_settings_path().ok_or(SettingsError::NoConfigDir)?;
        let settings = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        Ok(settings.with_env_overrides())
    }

    /// Settings taken purely from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of these settings
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(id) = var("ALGOLIA_APPLICATION_ID") {
            self.application_id = id;
        }
        if let Some(key) = var("ALGOLIA_API_KEY") {
            self.api_key = key;
        }
        if let Some(hosts) = var("ALGOLIA_HOSTS") {
            let hosts: Vec<String> = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
            self.hosts = Some(hosts);
        }
        if let Some(places) = var("ALGOLIA_PLACES") {
            self.places_enabled = matches!(places.to_lowercase().as_str(), "1" | "true");
        }
        self
    }

    /// Host mode selected by these settings
    #[must_use]
    pub fn host_mode(&self) -> HostMode {
        HostMode::from_places(self.places_enabled)
    }

    /// Timeouts selected by these settings
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
            search: Duration::from_millis(self.search_timeout_ms),
        }
    }
}

/// Default settings path: `<config dir>/search-context/settings.toml`
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("search-context").join(SETTINGS_FILE))
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
