//! Explicit client session for an optimization service.
//!
//! Service credentials are an explicit, passed-in handle rather than
//! process-wide ambient state: construct a [`Session`] once and hand it to
//! the service that needs it. The local simulator accepts any session; a
//! remote implementation would exchange the token for platform credentials
//! at construction time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration for a service session.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session name, used in logs.
    pub name: String,
    /// Service endpoint URL, if remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl SessionConfig {
    /// Create a new session configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// An established session handle.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Open a session from its configuration.
    pub fn open(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Open an anonymous local session.
    pub fn local() -> Self {
        Self::open(SessionConfig::new("local"))
    }

    /// Session name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configured endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.config.endpoint.as_deref()
    }

    /// Whether the session carries a credential.
    pub fn has_token(&self) -> bool {
        self.config.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_redacted_in_debug() {
        let config = SessionConfig::new("prod")
            .with_endpoint("https://solver.example")
            .with_token("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::open(SessionConfig::new("s").with_token("t"));
        assert_eq!(session.name(), "s");
        assert!(session.has_token());
        assert!(session.endpoint().is_none());
        assert!(!Session::local().has_token());
    }
}
