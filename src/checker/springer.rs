//! SpringerLink checker.

use async_trait::async_trait;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule};
use super::{CheckError, Checker};

const RULES: &[PageRule] = &[
    PageRule::text("Download book PDF", ResultKind::FULL_ACCESS, "Book PDF download offered"),
    PageRule::text("Download book EPUB", ResultKind::FULL_ACCESS, "Book EPUB download offered"),
    PageRule::text(
        "Download chapter PDF",
        ResultKind::PROBABLE_FULL_ACCESS,
        "Chapter PDF download offered",
    ),
    PageRule::text(
        "Log in via an institution",
        ResultKind::NO_ACCESS,
        "Institutional login offered",
    ),
    PageRule::selector(
        "[data-test=\"buybox\"], .buybox",
        ResultKind::NO_ACCESS,
        "Purchase options shown",
    ),
];

/// Checker for SpringerLink book and chapter pages.
#[derive(Debug, Default)]
pub struct SpringerChecker;

#[async_trait]
impl Checker for SpringerChecker {
    fn name(&self) -> &'static str {
        "SpringerLink"
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        rules::evaluate(session, RULES)
    }
}
