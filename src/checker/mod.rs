//! Access classification for individual resource URLs.
//!
//! This module hosts the site rules: a [`Checker`] classifies the page a
//! session lands on, and a [`CheckerRegistry`] maps short provider keys to
//! checker factories.
//!
//! # Architecture
//!
//! - [`Checker`] - Async trait with the `setup` / `verify` steps providers implement
//! - [`Check`] - One pending classification; [`Check::result`] runs it exactly once
//! - [`CheckerRegistry`] - Key-sorted provider table built at start-up
//! - [`PageRule`] - Data-driven text/selector rules shared by the built-in providers
//!
//! # Example
//!
//! ```no_run
//! use access_checker_core::checker::build_default_checker_registry;
//! use access_checker_core::session::HttpSession;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_checker_registry()?;
//! let entry = registry.lookup("springer")?;
//! let mut session = HttpSession::new()?;
//!
//! let url = Url::parse("https://link.springer.com/book/10.1007/978-3-030-00000-0")?;
//! let result = entry.check(url).result(&mut session).await?;
//! println!("{}: {}", result.name(), result.message());
//! # Ok(())
//! # }
//! ```

mod doi;
mod ebsco;
mod error;
mod jstor;
mod proquest;
mod registry;
mod rules;
mod springer;
mod wiley;

pub use doi::DoiChecker;
pub use ebsco::EbscoChecker;
pub use error::{CheckError, RegistryError};
pub use jstor::JstorChecker;
pub use proquest::ProquestChecker;
pub use registry::{CheckerEntry, CheckerFactory, CheckerRegistry};
pub use rules::{Needle, PageRule};
pub use springer::SpringerChecker;
pub use wiley::WileyChecker;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::result::{AccessResult, ResultKind};
use crate::session::Session;

/// Message attached to the fallback result when no rule matched.
pub const FALLBACK_MESSAGE: &str = "No rule matched (default fallback)";

/// Result returned when a checker's `verify` finds nothing.
#[must_use]
pub fn fallback_result() -> AccessResult {
    AccessResult::with_message(ResultKind::NO_RULE_MATCHED, FALLBACK_MESSAGE)
}

/// Builds the registry of built-in providers used by the CLI.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateKey`] if two built-ins share a key.
pub fn build_default_checker_registry() -> Result<CheckerRegistry, RegistryError> {
    let mut registry = CheckerRegistry::new();
    registry.register::<DoiChecker>("doi", Some("DOI resolver landing pages"))?;
    registry.register::<EbscoChecker>("ebsco", Some("EBSCOhost eBook Collection"))?;
    registry.register::<JstorChecker>("jstor", Some("JSTOR books and journals"))?;
    registry.register::<ProquestChecker>("proquest", Some("ProQuest Ebook Central"))?;
    registry.register::<SpringerChecker>("springer", Some("SpringerLink books and chapters"))?;
    registry.register::<WileyChecker>("wiley", Some("Wiley Online Library"))?;
    Ok(registry)
}

/// A site-specific classifier.
///
/// A fresh checker is built for every URL, so implementations may keep
/// per-check state between `setup` and `verify`.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the registry can hand out `Box<dyn Checker>`.
#[async_trait]
pub trait Checker: Send {
    /// Human-readable checker name, used as the default registry description.
    fn name(&self) -> &'static str;

    /// Positions the session on the page to classify.
    ///
    /// The default navigates to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] if navigation fails.
    async fn setup(&mut self, session: &mut dyn Session, url: &Url) -> Result<(), CheckError> {
        session.visit(url).await?;
        Ok(())
    }

    /// Classifies the current page, or returns `None` when no rule applies.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] if a page query fails.
    async fn verify(&mut self, session: &mut dyn Session)
    -> Result<Option<AccessResult>, CheckError>;
}

/// One unchecked URL bound to the checker that will classify it.
///
/// [`Check::result`] consumes the value, so a check runs at most once.
pub struct Check {
    checker: Box<dyn Checker>,
    url: Url,
}

impl Check {
    /// Binds `checker` to `url`.
    #[must_use]
    pub fn new(checker: Box<dyn Checker>, url: Url) -> Self {
        Self { checker, url }
    }

    /// URL being checked.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Runs setup then verify, falling back to `NoRuleMatched`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] when setup or verify fails. Errors are not retried.
    #[tracing::instrument(skip(self, session), fields(checker = self.checker.name(), url = %self.url))]
    pub async fn result(mut self, session: &mut dyn Session) -> Result<AccessResult, CheckError> {
        self.checker.setup(session, &self.url).await?;
        let result = match self.checker.verify(session).await? {
            Some(result) => result,
            None => {
                debug!("No rule matched; using fallback result");
                fallback_result()
            }
        };
        debug!(result = result.name(), "Check complete");
        Ok(result)
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("checker", &self.checker.name())
            .field("url", &self.url.as_str())
            .finish()
    }
}
