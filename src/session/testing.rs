//! In-memory [`Session`] used by unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::html;
use super::{DEFAULT_NAVIGATION_TIMEOUT, Session, SessionError};

const MAX_REDIRECTS: usize = 10;

type SubmitHandler = Box<dyn Fn(&[(String, String)]) -> String + Send>;

#[derive(Debug, Clone)]
enum Response {
    Page { status: u16, body: String },
    Redirect(String),
    Fail(String),
}

/// Scripted pages keyed by URL; unknown URLs fail navigation.
pub(crate) struct FakeSession {
    responses: HashMap<String, Response>,
    on_submit: Option<SubmitHandler>,
    current: Option<(Url, u16, String)>,
    staged: Vec<(String, String)>,
    visits: Vec<String>,
    submissions: Vec<Vec<(String, String)>>,
    timeout: Duration,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            on_submit: None,
            current: None,
            staged: Vec::new(),
            visits: Vec::new(),
            submissions: Vec::new(),
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    pub(crate) fn page(self, url: &str, body: &str) -> Self {
        self.status_page(url, 200, body)
    }

    pub(crate) fn status_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            normalize(url),
            Response::Page {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub(crate) fn redirect(mut self, from: &str, to: &str) -> Self {
        self.responses
            .insert(normalize(from), Response::Redirect(to.to_string()));
        self
    }

    pub(crate) fn failing(mut self, url: &str, reason: &str) -> Self {
        self.responses
            .insert(normalize(url), Response::Fail(reason.to_string()));
        self
    }

    /// Decides where a form submission lands from the submitted fields.
    pub(crate) fn on_submit(
        mut self,
        handler: impl Fn(&[(String, String)]) -> String + Send + 'static,
    ) -> Self {
        self.on_submit = Some(Box::new(handler));
        self
    }

    pub(crate) fn visits(&self) -> &[String] {
        &self.visits
    }

    pub(crate) fn submissions(&self) -> &[Vec<(String, String)>] {
        &self.submissions
    }

    fn load(&mut self, url: &str) -> Result<(), SessionError> {
        self.staged.clear();
        let mut location = normalize(url);
        for _ in 0..=MAX_REDIRECTS {
            match self.responses.get(&location).cloned() {
                Some(Response::Page { status, body }) => {
                    let parsed = Url::parse(&location)
                        .map_err(|error| SessionError::navigation(&location, error.to_string()))?;
                    self.current = Some((parsed, status, body));
                    return Ok(());
                }
                Some(Response::Redirect(next)) => location = normalize(&next),
                Some(Response::Fail(reason)) => {
                    return Err(SessionError::navigation(&location, reason));
                }
                None => return Err(SessionError::navigation(&location, "connection refused")),
            }
        }
        Err(SessionError::navigation(url, "too many redirects"))
    }

    fn page_state(&self, operation: &'static str) -> Result<&(Url, u16, String), SessionError> {
        self.current.as_ref().ok_or(SessionError::NoPage { operation })
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.to_string())
}

#[async_trait]
impl Session for FakeSession {
    async fn visit(&mut self, url: &Url) -> Result<(), SessionError> {
        self.visits.push(url.to_string());
        self.load(url.as_str())
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|(url, _, _)| url)
    }

    fn status(&self) -> Option<u16> {
        self.current.as_ref().map(|(_, status, _)| *status)
    }

    fn content(&self) -> &str {
        self.current.as_ref().map_or("", |(_, _, body)| body.as_str())
    }

    fn has_selector(&self, selector: &str) -> Result<bool, SessionError> {
        html::has_selector(&self.page_state("has_selector")?.2, selector)
    }

    fn select_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        html::select_text(&self.page_state("select_text")?.2, selector)
    }

    fn fill_in(&mut self, field: &str, value: &str) -> Result<(), SessionError> {
        let (url, _, body) = self.page_state("fill_in")?;
        if !html::has_field(body, field)? {
            return Err(SessionError::element_not_found(url.as_str(), field));
        }
        self.staged.push((field.to_string(), value.to_string()));
        Ok(())
    }

    async fn submit(&mut self) -> Result<(), SessionError> {
        let (url, _, body) = self.page_state("submit")?;
        let submission = html::build_form_submission(body, url, &self.staged)?;
        let target = match &self.on_submit {
            Some(handler) => handler(&submission.fields),
            None => submission.action.to_string(),
        };
        self.submissions.push(submission.fields);
        self.load(&target)
    }

    async fn click_link(&mut self, selector: &str) -> Result<(), SessionError> {
        let (url, _, body) = self.page_state("click_link")?;
        let Some(target) = html::link_target(body, url, selector)? else {
            return Err(SessionError::element_not_found(url.as_str(), selector));
        };
        self.visits.push(target.to_string());
        self.load(target.as_str())
    }

    fn navigation_timeout(&self) -> Duration {
        self.timeout
    }

    fn set_navigation_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}
