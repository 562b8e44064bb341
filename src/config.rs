// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Connection profiles.
//!
//! # Example
//!
//! ```
//! use search_builder::ConnectionConfig;
//!
//! // Default config carries a single local "default" profile
//! let config = ConnectionConfig::default();
//! let profile = config.profile("default").unwrap();
//! assert_eq!(profile.hosts, vec!["http://127.0.0.1:9200".to_string()]);
//! assert_eq!(profile.max_connections, 50);
//!
//! // Profiles deserialize from a name → profile map
//! let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
//!     "search": {"hosts": ["http://es-1:9200", "http://es-2:9200"], "timeout": 5.0}
//! })).unwrap();
//! assert!(config.profile("default").is_err());
//! assert_eq!(config.profile("search").unwrap().hosts.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::transport::QueryError;

/// One named connection profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionProfile {
    /// Engine endpoints (e.g., "http://127.0.0.1:9200")
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Connection pool capacity (default: 50)
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Per-request timeout in seconds; 0 disables it (default: 2.0)
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Basic-auth user; empty means no authentication
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_hosts() -> Vec<String> { vec!["http://127.0.0.1:9200".to_string()] }
fn default_max_connections() -> usize { 50 }
fn default_timeout() -> f64 { 2.0 }

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            max_connections: default_max_connections(),
            timeout: default_timeout(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ConnectionProfile {
    /// Request deadline, if one is configured.
    ///
    /// Fails with [`QueryError::Configuration`] when the timeout is not a
    /// representable duration (NaN, infinite, or too large).
    pub fn timeout_duration(&self) -> Result<Option<Duration>, QueryError> {
        if self.timeout <= 0.0 {
            return Ok(None);
        }
        Duration::try_from_secs_f64(self.timeout)
            .map(Some)
            .map_err(|e| QueryError::Configuration(format!("invalid timeout {}: {}", self.timeout, e)))
    }

    /// `(username, password)` when a username is set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        (!self.username.is_empty()).then_some((self.username.as_str(), self.password.as_str()))
    }
}

/// Named connection profiles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConnectionConfig {
    profiles: BTreeMap<String, ConnectionProfile>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::empty().with_profile("default", ConnectionProfile::default())
    }
}

impl ConnectionConfig {
    /// A config with no profiles.
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, name: impl Into<String>, profile: ConnectionProfile) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    /// Look up a profile.
    ///
    /// Fails with [`QueryError::Configuration`] if the profile is missing,
    /// lists no hosts, has a zero pool capacity or an unusable timeout.
    pub fn profile(&self, name: &str) -> Result<&ConnectionProfile, QueryError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| QueryError::Configuration(format!("connection profile '{}' is not defined", name)))?;

        if profile.hosts.is_empty() {
            return Err(QueryError::Configuration(format!(
                "connection profile '{}' has no hosts",
                name
            )));
        }
        if profile.max_connections == 0 {
            return Err(QueryError::Configuration(format!(
                "connection profile '{}' has max_connections = 0",
                name
            )));
        }
        profile.timeout_duration()?;
        Ok(profile)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_defaults() {
        let profile: ConnectionProfile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile, ConnectionProfile::default());
        assert_eq!(profile.timeout_duration(), Ok(Some(Duration::from_secs(2))));
        assert_eq!(profile.credentials(), None);
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let profile = ConnectionProfile {
            timeout: 0.0,
            ..Default::default()
        };
        assert_eq!(profile.timeout_duration(), Ok(None));
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let config: ConnectionConfig = serde_json::from_value(json!({"default": {"timeout": 1e20}})).unwrap();
        assert!(matches!(config.profile("default"), Err(QueryError::Configuration(_))));

        let profile = ConnectionProfile {
            timeout: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(profile.timeout_duration(), Err(QueryError::Configuration(_))));
    }

    #[test]
    fn test_credentials() {
        let profile = ConnectionProfile {
            username: "elastic".into(),
            password: "secret".into(),
            ..Default::default()
        };
        assert_eq!(profile.credentials(), Some(("elastic", "secret")));
    }

    #[test]
    fn test_missing_profile() {
        let err = ConnectionConfig::empty().profile("default").unwrap_err();
        assert!(matches!(err, QueryError::Configuration(_)));
    }

    #[test]
    fn test_empty_hosts_rejected() {
        let config: ConnectionConfig = serde_json::from_value(json!({"default": {"hosts": []}})).unwrap();
        assert!(matches!(config.profile("default"), Err(QueryError::Configuration(_))));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = ConnectionConfig::empty().with_profile(
            "default",
            ConnectionProfile {
                max_connections: 0,
                ..Default::default()
            },
        );
        assert!(matches!(config.profile("default"), Err(QueryError::Configuration(_))));
    }

    #[test]
    fn test_names() {
        let config = ConnectionConfig::default().with_profile("logs", ConnectionProfile::default());
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["default", "logs"]);
    }
}
