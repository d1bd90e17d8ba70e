//! Data-driven page rules shared by the built-in providers.
//!
//! A provider lists its signatures as a `&[PageRule]` table; [`evaluate`]
//! checks the HTTP status first and then each rule in order, returning the
//! first match.

use regex::Regex;
use tracing::trace;

use crate::result::{AccessResult, ResultKind};
use crate::session::{Session, SessionError};

use super::CheckError;

/// What a rule looks for on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Needle {
    /// Substring of the raw page content.
    Text(&'static str),
    /// CSS selector that must match at least one element.
    Selector(&'static str),
}

/// One page signature and the result it implies.
#[derive(Debug, Clone, Copy)]
pub struct PageRule {
    /// Signature to look for.
    pub needle: Needle,
    /// Result kind when the signature is present.
    pub kind: ResultKind,
    /// Message attached to the result.
    pub message: &'static str,
}

impl PageRule {
    /// Rule matching a substring of the page.
    #[must_use]
    pub const fn text(text: &'static str, kind: ResultKind, message: &'static str) -> Self {
        Self {
            needle: Needle::Text(text),
            kind,
            message,
        }
    }

    /// Rule matching a CSS selector.
    #[must_use]
    pub const fn selector(css: &'static str, kind: ResultKind, message: &'static str) -> Self {
        Self {
            needle: Needle::Selector(css),
            kind,
            message,
        }
    }

    /// Returns true if the current page carries this rule's signature.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSelector`] for a bad CSS selector.
    pub fn matches(&self, session: &dyn Session) -> Result<bool, SessionError> {
        match self.needle {
            Needle::Text(text) => Ok(session.has_content(text)),
            Needle::Selector(css) => session.has_selector(css),
        }
    }

    fn result(&self) -> AccessResult {
        AccessResult::with_message(self.kind, self.message)
    }
}

/// Returns the first rule in `rules` matching the current page.
///
/// # Errors
///
/// Returns [`CheckError::Session`] if a selector query fails.
pub fn first_match(
    session: &dyn Session,
    rules: &[PageRule],
) -> Result<Option<AccessResult>, CheckError> {
    for rule in rules {
        if rule.matches(session)? {
            trace!(needle = ?rule.needle, kind = rule.kind.name(), "Page rule matched");
            return Ok(Some(rule.result()));
        }
    }
    Ok(None)
}

/// `PageNotFound` when the current page answered HTTP 404.
#[must_use]
pub fn page_not_found(session: &dyn Session) -> Option<AccessResult> {
    (session.status() == Some(404)).then(|| {
        let url = session.current_url().map_or("", url::Url::as_str);
        AccessResult::with_message(ResultKind::PAGE_NOT_FOUND, format!("HTTP 404 for {url}"))
    })
}

/// Applies the 404 check, then `rules` in order.
///
/// # Errors
///
/// Returns [`CheckError::Session`] if a selector query fails.
pub fn evaluate(
    session: &dyn Session,
    rules: &[PageRule],
) -> Result<Option<AccessResult>, CheckError> {
    if let Some(result) = page_not_found(session) {
        return Ok(Some(result));
    }
    first_match(session, rules)
}

/// Compiles a regex literal defined in this crate.
///
/// # Panics
///
/// Panics if `pattern` is invalid; only call it with literals covered by tests.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}
