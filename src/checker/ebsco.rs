//! EBSCOhost eBook Collection checker.

use async_trait::async_trait;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule};
use super::{CheckError, Checker};

const RULES: &[PageRule] = &[
    PageRule::selector(
        "a.pdf-ft, a[data-auto=\"pdf-full-text\"]",
        ResultKind::FULL_ACCESS,
        "PDF full text link",
    ),
    PageRule::text("Download This eBook", ResultKind::FULL_ACCESS, "eBook download offered"),
    PageRule::text("eBook Full Text", ResultKind::FULL_ACCESS, "eBook full text link"),
    PageRule::text(
        "This eBook is not available",
        ResultKind::NO_ACCESS,
        "eBook not available to this institution",
    ),
    PageRule::text(
        "You do not have access",
        ResultKind::NO_ACCESS,
        "No access for this account",
    ),
];

/// Checker for EBSCOhost eBook detail pages.
#[derive(Debug, Default)]
pub struct EbscoChecker;

#[async_trait]
impl Checker for EbscoChecker {
    fn name(&self) -> &'static str {
        "EBSCOhost"
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
    use url::Url;

    use super::*;
    use crate::checker::Check;
    use crate::session::testing::FakeSession;

    const PAGE: &str = "https://search.ebscohost.com/login.aspx?direct=true&db=nlebk&AN=123";

    async fn check(body: &str) -> AccessResult {
        let mut session = FakeSession::new().page(PAGE, body);
        Check::new(Box::new(EbscoChecker), Url::parse(PAGE).unwrap())
            .result(&mut session)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ebsco_pdf_link_is_full_access() {
        let result = check(r#"<a class="pdf-ft" href="/pdf">PDF Full Text</a>"#).await;
        assert_eq!(result.name(), "FullAccess");
        assert_eq!(result.message(), "PDF full text link");
    }

    #[tokio::test]
    async fn test_ebsco_download_offer_is_full_access() {
        let result = check("<button>Download This eBook</button>").await;
        assert_eq!(result.kind(), ResultKind::FULL_ACCESS);
    }

    #[tokio::test]
    async fn test_ebsco_unavailable_is_no_access() {
        let result = check("<p>This eBook is not available for your institution.</p>").await;
        assert_eq!(result.name(), "NoAccess");
    }

    #[tokio::test]
    async fn test_ebsco_unknown_page_falls_back() {
        let result = check("<p>Search results</p>").await;
        assert_eq!(result.name(), "NoRuleMatched");
    }
}
