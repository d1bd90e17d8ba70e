//! Wiley Online Library checker.

use async_trait::async_trait;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule};
use super::{CheckError, Checker};

const RULES: &[PageRule] = &[
    PageRule::text("full text access", ResultKind::FULL_ACCESS, "Full text access granted"),
    PageRule::text("Free Access", ResultKind::FULL_ACCESS, "Free access"),
    PageRule::text("Request access", ResultKind::NO_ACCESS, "Access must be requested"),
    PageRule::text("Get access", ResultKind::NO_ACCESS, "Purchase or login required"),
];

/// Checker for Wiley Online Library book and chapter pages.
#[derive(Debug, Default)]
pub struct WileyChecker;

#[async_trait]
impl Checker for WileyChecker {
    fn name(&self) -> &'static str {
        "Wiley Online Library"
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        rules::evaluate(session, RULES)
    }
}
