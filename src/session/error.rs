//! Error types for session operations.
//!
//! Follows the What/Why/Fix message pattern used across the project.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`Session`](super::Session) implementation.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The HTTP client backing the session could not be built
    #[error("cannot initialize browsing session: {reason}")]
    Client {
        /// Why construction failed
        reason: String,
    },

    /// Navigation failed at the transport level
    #[error(
        "navigation to '{url}' failed: {reason}\n  Suggestion: Check network connectivity and the URL"
    )]
    Navigation {
        /// The URL being loaded
        url: String,
        /// Why navigation failed
        reason: String,
    },

    /// Navigation did not finish within the navigation timeout
    #[error(
        "navigation to '{url}' timed out after {}s\n  Suggestion: Raise the navigation timeout with --timeout",
        .timeout.as_secs()
    )]
    Timeout {
        /// The URL being loaded
        url: String,
        /// The timeout in effect
        timeout: Duration,
    },

    /// A page query was attempted before any page was loaded
    #[error("no page loaded: {operation} requires a prior visit")]
    NoPage {
        /// The operation that needed a page
        operation: &'static str,
    },

    /// The CSS selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector
        selector: String,
        /// Parser diagnostic
        reason: String,
    },

    /// An element required by the operation is absent from the page
    #[error("element not found on '{url}': {target}")]
    ElementNotFound {
        /// Current page URL
        url: String,
        /// Selector or field name that was looked up
        target: String,
    },

    /// `submit` was called without a form to submit
    #[error("no form to submit on '{url}': {reason}")]
    NoForm {
        /// Current page URL
        url: String,
        /// Why no form could be submitted
        reason: String,
    },

    /// Proxy login did not get past the login interstitial
    #[error(
        "proxy login failed at '{login_url}': {reason}\n  Suggestion: Check the proxy username and password; login is not retried"
    )]
    ProxyLogin {
        /// Interstitial URL the session is stuck on
        login_url: String,
        /// What went wrong
        reason: String,
    },
}

impl SessionError {
    /// Creates a `Navigation` error.
    #[must_use]
    pub fn navigation(url: &str, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidSelector` error.
    #[must_use]
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `ElementNotFound` error.
    #[must_use]
    pub fn element_not_found(url: &str, target: &str) -> Self {
        Self::ElementNotFound {
            url: url.to_string(),
            target: target.to_string(),
        }
    }

    /// Creates a `NoForm` error.
    #[must_use]
    pub fn no_form(url: &str, reason: impl Into<String>) -> Self {
        Self::NoForm {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `ProxyLogin` error.
    #[must_use]
    pub fn proxy_login(login_url: &str, reason: impl Into<String>) -> Self {
        Self::ProxyLogin {
            login_url: login_url.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true for a proxy authentication failure.
    #[must_use]
    pub fn is_proxy_login(&self) -> bool {
        matches!(self, Self::ProxyLogin { .. })
    }
}
