//! Institutional proxy login handling.
//!
//! Library proxies (EZproxy and similar) answer a request for a protected
//! resource with a login page whose URL carries the original target in a query
//! parameter, e.g. `https://proxy.example.edu/login?qurl=https%3A%2F%2F...`.
//! [`ProxySession`] notices that page after a navigation, logs in once with
//! the stored credentials and lets the proxy forward the session to the
//! original target, so checkers never see the login wall.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use super::{Session, SessionError};

/// Default path of the proxy login page.
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Query parameters that carry the deferred redirect target.
pub const DEFAULT_TARGET_PARAMS: &[&str] = &["qurl", "url"];
const DEFAULT_USER_FIELD: &str = "user";
const DEFAULT_PASSWORD_FIELD: &str = "pass";

/// Proxy account credentials.
///
/// The password is redacted from `Debug` output.
#[derive(Clone)]
pub struct ProxyCredentials {
    username: String,
    password: String,
}

impl ProxyCredentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// How to recognize and fill in the proxy login interstitial.
#[derive(Debug, Clone)]
pub struct ProxyLogin {
    credentials: ProxyCredentials,
    host: Option<String>,
    login_path: String,
    target_params: Vec<String>,
    user_field: String,
    password_field: String,
}

impl ProxyLogin {
    /// Login settings with the conventional EZproxy page shape:
    /// path `/login`, target in `qurl` or `url`, fields `user` and `pass`.
    #[must_use]
    pub fn new(credentials: ProxyCredentials) -> Self {
        Self {
            credentials,
            host: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            target_params: DEFAULT_TARGET_PARAMS.iter().map(ToString::to_string).collect(),
            user_field: DEFAULT_USER_FIELD.to_string(),
            password_field: DEFAULT_PASSWORD_FIELD.to_string(),
        }
    }

    /// Stored proxy credentials.
    #[must_use]
    pub fn credentials(&self) -> &ProxyCredentials {
        &self.credentials
    }

    /// Only treat pages on `host` as the interstitial.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into().to_ascii_lowercase());
        self
    }

    /// Overrides the login page path.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Overrides the form field names for username and password.
    #[must_use]
    pub fn with_fields(
        mut self,
        user_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Self {
        self.user_field = user_field.into();
        self.password_field = password_field.into();
        self
    }

    /// Returns true if `url` is the login interstitial.
    ///
    /// Both the path and a non-empty target parameter are required; pages that
    /// merely share the path are not login walls.
    #[must_use]
    pub fn is_interstitial(&self, url: &Url) -> bool {
        if let Some(host) = &self.host
            && !url
                .host_str()
                .is_some_and(|current| current.eq_ignore_ascii_case(host))
        {
            return false;
        }
        if url.path() != self.login_path {
            return false;
        }
        url.query_pairs().any(|(key, value)| {
            !value.trim().is_empty() && self.target_params.iter().any(|param| *param == key)
        })
    }
}

/// A [`Session`] decorator that passes the proxy login wall on navigation.
///
/// Every operation is forwarded to the wrapped session. After `visit` and
/// `click_link`, if the session sits on the login interstitial, the stored
/// credentials are submitted once; when the session is still on the
/// interstitial afterwards the navigation fails with
/// [`SessionError::ProxyLogin`].
#[derive(Debug)]
pub struct ProxySession<S> {
    inner: S,
    login: ProxyLogin,
    logins: usize,
}

impl<S: Session> ProxySession<S> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: S, login: ProxyLogin) -> Self {
        Self {
            inner,
            login,
            logins: 0,
        }
    }

    /// Number of successful proxy logins performed so far.
    #[must_use]
    pub fn login_count(&self) -> usize {
        self.logins
    }

    /// Wrapped session.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the decorated session.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn on_interstitial(&self) -> Option<String> {
        self.inner
            .current_url()
            .filter(|url| self.login.is_interstitial(url))
            .map(ToString::to_string)
    }

    async fn pass_login_wall(&mut self) -> Result<(), SessionError> {
        let Some(login_url) = self.on_interstitial() else {
            return Ok(());
        };
        info!(
            login_url = %login_url,
            user = %self.login.credentials.username,
            "Proxy login page detected; submitting credentials"
        );

        let filled = self
            .inner
            .fill_in(&self.login.user_field, &self.login.credentials.username)
            .and_then(|()| {
                self.inner
                    .fill_in(&self.login.password_field, &self.login.credentials.password)
            });
        if let Err(error) = filled {
            return Err(SessionError::proxy_login(
                &login_url,
                format!("login form is not fillable: {error}"),
            ));
        }
        self.inner.submit().await.map_err(|error| match error {
            SessionError::NoForm { reason, .. } => SessionError::proxy_login(&login_url, reason),
            other => other,
        })?;

        if let Some(still_on) = self.on_interstitial() {
            warn!(login_url = %still_on, "Proxy login rejected");
            return Err(SessionError::proxy_login(
                &still_on,
                "still on the login page after submitting credentials",
            ));
        }

        self.logins += 1;
        debug!(
            url = ?self.inner.current_url().map(Url::as_str),
            "Proxy login succeeded"
        );
        Ok(())
    }
}

#[async_trait]
impl<S: Session> Session for ProxySession<S> {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn visit(&mut self, url: &Url) -> Result<(), SessionError> {
        self.inner.visit(url).await?;
        self.pass_login_wall().await
    }

    fn current_url(&self) -> Option<&Url> {
        self.inner.current_url()
    }

    fn status(&self) -> Option<u16> {
        self.inner.status()
    }

    fn content(&self) -> &str {
        self.inner.content()
    }

    fn has_content(&self, text: &str) -> bool {
        self.inner.has_content(text)
    }

    fn has_selector(&self, selector: &str) -> Result<bool, SessionError> {
        self.inner.has_selector(selector)
    }

    fn select_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        self.inner.select_text(selector)
    }

    fn fill_in(&mut self, field: &str, value: &str) -> Result<(), SessionError> {
        self.inner.fill_in(field, value)
    }

    async fn submit(&mut self) -> Result<(), SessionError> {
        self.inner.submit().await
    }

    async fn click_link(&mut self, selector: &str) -> Result<(), SessionError> {
        self.inner.click_link(selector).await?;
        self.pass_login_wall().await
    }

    fn navigation_timeout(&self) -> Duration {
        self.inner.navigation_timeout()
    }

    fn set_navigation_timeout(&mut self, timeout: Duration) {
        self.inner.set_navigation_timeout(timeout);
    }
}
