//! Error types for checker registration and execution.

use thiserror::Error;

use crate::session::SessionError;

/// Errors raised while building or querying the checker registry.
///
/// These are configuration errors: they surface before any row is processed.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A provider key was registered twice
    #[error(
        "provider key '{key}' is already registered\n  Suggestion: Give each checker a unique provider key"
    )]
    DuplicateKey {
        /// The conflicting key
        key: String,
    },

    /// No checker is registered under the requested key
    #[error(
        "unknown provider '{key}'\n  Suggestion: Use one of: {known} (see --list-providers)"
    )]
    UnknownProvider {
        /// The requested key
        key: String,
        /// Comma-separated registered keys
        known: String,
    },
}

impl RegistryError {
    /// Creates a `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(key: &str) -> Self {
        Self::DuplicateKey {
            key: key.to_string(),
        }
    }

    /// Creates an `UnknownProvider` error listing the registered keys.
    #[must_use]
    pub fn unknown_provider<'a>(key: &str, known: impl IntoIterator<Item = &'a str>) -> Self {
        let known: Vec<&str> = known.into_iter().collect();
        Self::UnknownProvider {
            key: key.to_string(),
            known: if known.is_empty() {
                "(none registered)".to_string()
            } else {
                known.join(", ")
            },
        }
    }
}

/// Errors escaping a checker's `setup` or `verify`.
///
/// Recoverable page conditions are reported as error-branch results instead;
/// a `CheckError` aborts the run.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    /// The session failed (navigation, selector or proxy login)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Provider-specific failure
    #[error("{provider} checker failed: {reason}")]
    Provider {
        /// Checker name
        provider: &'static str,
        /// What went wrong
        reason: String,
    },
}

impl CheckError {
    /// Creates a `Provider` error.
    #[must_use]
    pub fn provider(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            reason: reason.into(),
        }
    }

    /// Returns true if the failure came from the proxy login.
    #[must_use]
    pub fn is_proxy_login(&self) -> bool {
        matches!(self, Self::Session(error) if error.is_proxy_login())
    }
}
