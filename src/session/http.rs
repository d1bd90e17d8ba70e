//! `reqwest`-backed browsing session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, trace};
use url::Url;

use super::html::{self, FormMethod};
use super::http_client::build_session_http_client;
use super::{Session, SessionError};

/// Navigation timeout used until a caller or checker changes it.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug)]
struct Page {
    url: Url,
    status: u16,
    body: String,
}

/// A browsing session over plain HTTP.
///
/// Redirects are followed and every response's cookies land in the shared
/// jar, so logins performed through the session (or cookies preloaded from a
/// file) apply to later navigations. Pages are not scripted: content is the
/// server-rendered HTML.
pub struct HttpSession {
    client: Client,
    cookie_jar: Arc<Jar>,
    navigation_timeout: Duration,
    page: Option<Page>,
    staged: Vec<(String, String)>,
}

impl HttpSession {
    /// Creates a session with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, SessionError> {
        Self::with_cookie_jar(Arc::new(Jar::default()))
    }

    /// Creates a session that reads and writes cookies through `cookie_jar`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] if the HTTP client cannot be constructed.
    pub fn with_cookie_jar(cookie_jar: Arc<Jar>) -> Result<Self, SessionError> {
        Ok(Self {
            client: build_session_http_client(Arc::clone(&cookie_jar))?,
            cookie_jar,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            page: None,
            staged: Vec::new(),
        })
    }

    /// Sets the initial navigation timeout.
    #[must_use]
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Cookie jar shared by every request of this session.
    #[must_use]
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookie_jar
    }

    fn page(&self, operation: &'static str) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::NoPage { operation })
    }

    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError> {
        let request = self.client.get(url.clone());
        self.load(url, request).await
    }

    async fn load(&mut self, requested: &Url, request: RequestBuilder) -> Result<(), SessionError> {
        self.staged.clear();
        let timeout = self.navigation_timeout;
        let response = request
            .header(ACCEPT, HTML_ACCEPT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|error| map_transport_error(requested, timeout, &error))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|error| map_transport_error(requested, timeout, &error))?;

        debug!(
            requested = %requested,
            url = %final_url,
            status,
            bytes = body.len(),
            "Page loaded"
        );

        self.page = Some(Page {
            url: final_url,
            status,
            body,
        });
        Ok(())
    }
}

fn map_transport_error(url: &Url, timeout: Duration, error: &reqwest::Error) -> SessionError {
    if error.is_timeout() {
        SessionError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        SessionError::navigation(url.as_str(), error.to_string())
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("navigation_timeout", &self.navigation_timeout)
            .field("current_url", &self.page.as_ref().map(|page| page.url.as_str()))
            .field("staged_fields", &self.staged.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Session for HttpSession {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn visit(&mut self, url: &Url) -> Result<(), SessionError> {
        self.navigate(url).await
    }

    fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|page| &page.url)
    }

    fn status(&self) -> Option<u16> {
        self.page.as_ref().map(|page| page.status)
    }

    fn content(&self) -> &str {
        self.page.as_ref().map_or("", |page| page.body.as_str())
    }

    fn has_selector(&self, selector: &str) -> Result<bool, SessionError> {
        html::has_selector(&self.page("has_selector")?.body, selector)
    }

    fn select_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        html::select_text(&self.page("select_text")?.body, selector)
    }

    fn fill_in(&mut self, field: &str, value: &str) -> Result<(), SessionError> {
        let page = self.page("fill_in")?;
        if !html::has_field(&page.body, field)? {
            return Err(SessionError::element_not_found(
                page.url.as_str(),
                &format!("form field '{field}'"),
            ));
        }
        trace!(field, "Staging form field");
        match self.staged.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.staged.push((field.to_string(), value.to_string())),
        }
        Ok(())
    }

    async fn submit(&mut self) -> Result<(), SessionError> {
        let page = self.page("submit")?;
        let submission = html::build_form_submission(&page.body, &page.url, &self.staged)?;
        debug!(
            action = %submission.action,
            method = ?submission.method,
            fields = submission.fields.len(),
            "Submitting form"
        );
        let request = match submission.method {
            FormMethod::Post => self
                .client
                .post(submission.action.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(submission.encoded_body()),
            FormMethod::Get => self.client.get(submission.get_url()),
        };
        self.load(&submission.action, request).await
    }

    async fn click_link(&mut self, selector: &str) -> Result<(), SessionError> {
        let page = self.page("click_link")?;
        let Some(target) = html::link_target(&page.body, &page.url, selector)? else {
            return Err(SessionError::element_not_found(
                page.url.as_str(),
                &format!("link '{selector}'"),
            ));
        };
        debug!(selector, target = %target, "Following link");
        self.navigate(&target).await
    }

    fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    fn set_navigation_timeout(&mut self, timeout: Duration) {
        self.navigation_timeout = timeout;
    }
}
