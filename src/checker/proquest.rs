//! ProQuest Ebook Central checker.
//!
//! Ebook Central may show a "Continue to book" page before the book detail
//! page. The checker follows it during setup so `verify` sees the detail page.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule};
use super::{CheckError, Checker};

const CONTINUE_LINK: &str = "a#continue-to-book, a[title=\"Continue to book\"]";

const RULES: &[PageRule] = &[
    PageRule::text("Read Online", ResultKind::FULL_ACCESS, "Online reading available"),
    PageRule::text("Download Book", ResultKind::FULL_ACCESS, "Book download offered"),
    PageRule::text(
        "limited preview",
        ResultKind::RESTRICTED_ACCESS,
        "Limited preview only",
    ),
    PageRule::text(
        "not available to your institution",
        ResultKind::NO_ACCESS,
        "Book not licensed",
    ),
    PageRule::text("Request this book", ResultKind::NO_ACCESS, "Purchase request offered"),
];

/// Checker for Ebook Central detail pages.
#[derive(Debug, Default)]
pub struct ProquestChecker;

#[async_trait]
impl Checker for ProquestChecker {
    fn name(&self) -> &'static str {
        "ProQuest Ebook Central"
    }

    async fn setup(&mut self, session: &mut dyn Session, url: &Url) -> Result<(), CheckError> {
        session.visit(url).await?;
        if session.has_selector(CONTINUE_LINK)? {
            debug!(url = %url, "Following 'Continue to book' interstitial");
            session.click_link(CONTINUE_LINK).await?;
        }
        Ok(())
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        rules::evaluate(session, RULES)
    }
}
