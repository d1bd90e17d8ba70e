//! DOI resolver checker.
//!
//! Follows a `doi.org` link to the publisher landing page. Landing anywhere
//! off the resolver with a 2xx status is treated as probable access, since
//! the publisher page itself is not inspected.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

use super::rules::{self, PageRule, compile_static_regex};
use super::{CheckError, Checker};

const DOI_HOSTS: &[&str] = &["doi.org", "dx.doi.org", "www.doi.org"];

/// `/10.<registrant>/<suffix>` as it appears in a resolver URL path.
static DOI_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^/10\.\d{4,9}/\S+$"));

const RULES: &[PageRule] = &[
    PageRule::text("DOI Not Found", ResultKind::DOI_ERROR, "DOI not found by the resolver"),
    PageRule::text(
        "This DOI cannot be found",
        ResultKind::DOI_ERROR,
        "DOI not found by the resolver",
    ),
];

fn is_doi_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| DOI_HOSTS.iter().any(|known| host.eq_ignore_ascii_case(known)))
}

/// Checker for `https://doi.org/10.x/y` style links.
#[derive(Debug, Default)]
pub struct DoiChecker {
    rejected: Option<String>,
}

#[async_trait]
impl Checker for DoiChecker {
    fn name(&self) -> &'static str {
        "DOI resolver"
    }

    async fn setup(&mut self, session: &mut dyn Session, url: &Url) -> Result<(), CheckError> {
        if is_doi_host(url) && !DOI_PATH_RE.is_match(url.path()) {
            debug!(url = %url, "Resolver URL does not carry a DOI; skipping navigation");
            self.rejected = Some(format!("Not a DOI: {}", url.path()));
            return Ok(());
        }
        session.visit(url).await?;
        Ok(())
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        if let Some(message) = self.rejected.take() {
            return Ok(Some(AccessResult::with_message(ResultKind::DOI_ERROR, message)));
        }
        if let Some(result) = rules::evaluate(session, RULES)? {
            return Ok(Some(result));
        }

        let Some(landed) = session.current_url() else {
            return Ok(None);
        };
        if is_doi_host(landed) {
            return Ok(None);
        }
        let succeeded = session
            .status()
            .is_some_and(|status| (200..300).contains(&status));
        Ok(succeeded.then(|| {
            AccessResult::with_message(
                ResultKind::PROBABLE_FULL_ACCESS,
                format!("Resolved to {}", landed.host_str().unwrap_or_default()),
            )
        }))
    }
}
