//! JSTOR checker.
//!
//! JSTOR pages are slow behind most proxies, so the navigation timeout is
//! raised to at least [`JSTOR_MIN_TIMEOUT`] before navigating. A higher
//! configured timeout is left alone.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule};
use super::{CheckError, Checker};

/// Navigation timeout floor for JSTOR pages.
pub const JSTOR_MIN_TIMEOUT: Duration = Duration::from_secs(60);

const RULES: &[PageRule] = &[
    PageRule::text("Download PDF", ResultKind::FULL_ACCESS, "PDF download offered"),
    PageRule::text("Download this book", ResultKind::FULL_ACCESS, "Book download offered"),
    PageRule::text(
        "Log in through your library",
        ResultKind::NO_ACCESS,
        "Institutional login required",
    ),
    PageRule::text(
        "Preview only",
        ResultKind::RESTRICTED_ACCESS,
        "Only a preview is available",
    ),
];

/// Checker for JSTOR stable URLs.
#[derive(Debug, Default)]
pub struct JstorChecker;

#[async_trait]
impl Checker for JstorChecker {
    fn name(&self) -> &'static str {
        "JSTOR"
    }

    async fn setup(&mut self, session: &mut dyn Session, url: &Url) -> Result<(), CheckError> {
        if session.navigation_timeout() < JSTOR_MIN_TIMEOUT {
            debug!(
                from = ?session.navigation_timeout(),
                to = ?JSTOR_MIN_TIMEOUT,
                "Raising navigation timeout for JSTOR"
            );
            session.set_navigation_timeout(JSTOR_MIN_TIMEOUT);
        }
        session.visit(url).await?;
        Ok(())
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        rules::evaluate(session, RULES)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checker::Check;
    use crate::session::testing::FakeSession;

    const PAGE: &str = "https://www.jstor.org/stable/10.2307/j.ctt1234";

    async fn run(session: &mut FakeSession) -> AccessResult {
        Check::new(Box::new(JstorChecker), Url::parse(PAGE).unwrap())
            .result(session)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_jstor_raises_timeout_floor() {
        let mut session = FakeSession::new().page(PAGE, "<a>Download PDF</a>");
        session.set_navigation_timeout(Duration::from_secs(30));
        let result = run(&mut session).await;
        assert_eq!(result.name(), "FullAccess");
        assert_eq!(session.navigation_timeout(), JSTOR_MIN_TIMEOUT);
    }

    #[tokio::test]
    async fn test_jstor_keeps_higher_timeout() {
        let mut session = FakeSession::new().page(PAGE, "<p></p>");
        session.set_navigation_timeout(Duration::from_secs(120));
        run(&mut session).await;
        assert_eq!(session.navigation_timeout(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_jstor_library_login_is_no_access() {
        let mut session = FakeSession::new().page(PAGE, "<a>Log in through your library</a>");
        let result = run(&mut session).await;
        assert_eq!(result.name(), "NoAccess");
    }
}
