//! Browsing sessions used by checkers to load and inspect pages.
//!
//! # Architecture
//!
//! - [`Session`] - Async trait for one browsing context (navigation, page queries, forms)
//! - [`HttpSession`] - `reqwest`-backed session with a persistent cookie jar
//! - [`ProxySession`] - Decorator that logs in through an institutional proxy on demand
//! - [`cookies`] - Netscape cookie file loading for pre-authenticated sessions
//!
//! A run creates one session and reuses it for every row so cookies and proxy
//! authentication carry over between checks.

pub mod cookies;
mod error;
mod html;
mod http;
mod http_client;
mod proxy;
#[cfg(test)]
pub(crate) mod testing;

pub use error::SessionError;
pub use http::{DEFAULT_NAVIGATION_TIMEOUT, HttpSession};
pub use proxy::{ProxyCredentials, ProxyLogin, ProxySession};

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

/// One logical browsing context.
///
/// Cookies and other state persist across navigations. Page queries read the
/// page left by the most recent navigation. Sessions are driven by a single
/// logical thread of control and are not shared between concurrent checks.
///
/// # Object Safety
///
/// This trait uses `async_trait` so checkers can take `&mut dyn Session`.
#[async_trait]
pub trait Session: Send {
    /// Navigates to `url`, following redirects, and makes the result the current page.
    async fn visit(&mut self, url: &Url) -> Result<(), SessionError>;

    /// Location of the current page after redirects, if a page is loaded.
    fn current_url(&self) -> Option<&Url>;

    /// HTTP status of the current page, when the session knows it.
    fn status(&self) -> Option<u16>;

    /// Raw content of the current page; empty before the first visit.
    fn content(&self) -> &str;

    /// Returns true if the current page content contains `text`.
    fn has_content(&self, text: &str) -> bool {
        self.content().contains(text)
    }

    /// Returns true if an element matching the CSS selector is present.
    fn has_selector(&self, selector: &str) -> Result<bool, SessionError>;

    /// Text of the first element matching the CSS selector.
    fn select_text(&self, selector: &str) -> Result<Option<String>, SessionError>;

    /// Stages `value` for the form field named `field` on the current page.
    fn fill_in(&mut self, field: &str, value: &str) -> Result<(), SessionError>;

    /// Submits the form holding the staged fields; the response becomes the current page.
    async fn submit(&mut self) -> Result<(), SessionError>;

    /// Follows the link of the first element matching the CSS selector.
    async fn click_link(&mut self, selector: &str) -> Result<(), SessionError>;

    /// Timeout applied to each navigation.
    fn navigation_timeout(&self) -> Duration;

    /// Changes the timeout applied to subsequent navigations.
    fn set_navigation_timeout(&mut self, timeout: Duration);
}
