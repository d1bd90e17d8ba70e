//! Provider registry mapping short keys to checker factories.
//!
//! Built once at start-up and read-only afterwards. Keys are case-preserving
//! and kept sorted, so listings are deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use super::{Check, Checker, RegistryError};

/// Builds a fresh checker for one URL.
pub type CheckerFactory = Arc<dyn Fn() -> Box<dyn Checker> + Send + Sync>;

/// A registered provider: key, description and checker factory.
#[derive(Clone)]
pub struct CheckerEntry {
    key: String,
    description: String,
    factory: CheckerFactory,
}

impl CheckerEntry {
    /// Provider key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Provider description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Builds a new checker instance.
    #[must_use]
    pub fn build(&self) -> Box<dyn Checker> {
        (self.factory)()
    }

    /// Binds a new checker instance to `url`.
    #[must_use]
    pub fn check(&self, url: Url) -> Check {
        Check::new(self.build(), url)
    }
}

impl fmt::Debug for CheckerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerEntry")
            .field("key", &self.key)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Key-sorted collection of provider checkers.
#[derive(Default)]
pub struct CheckerRegistry {
    entries: BTreeMap<String, CheckerEntry>,
}

impl CheckerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers checker type `C` under `key`.
    ///
    /// Without a description, the checker's declared name is used.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if `key` is taken; the existing
    /// entry is left unchanged.
    pub fn register<C>(
        &mut self,
        key: &str,
        description: Option<&str>,
    ) -> Result<(), RegistryError>
    where
        C: Checker + Default + 'static,
    {
        let description = match description {
            Some(description) => description.to_string(),
            None => C::default().name().to_string(),
        };
        self.register_factory(
            key,
            description,
            Arc::new(|| Box::new(C::default()) as Box<dyn Checker>),
        )
    }

    /// Registers an arbitrary checker factory under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if `key` is taken.
    #[tracing::instrument(skip(self, description, factory))]
    pub fn register_factory(
        &mut self,
        key: &str,
        description: impl Into<String>,
        factory: CheckerFactory,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(key) {
            return Err(RegistryError::duplicate_key(key));
        }
        let description = description.into();
        debug!(key, description = %description, "Registering checker");
        self.entries.insert(
            key.to_string(),
            CheckerEntry {
                key: key.to_string(),
                description,
                factory,
            },
        );
        Ok(())
    }

    /// Looks up the entry registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProvider`] if nothing is registered under `key`.
    pub fn lookup(&self, key: &str) -> Result<&CheckerEntry, RegistryError> {
        self.entries.get(key).ok_or_else(|| {
            RegistryError::unknown_provider(key, self.entries.keys().map(String::as_str))
        })
    }

    /// Iterates `(key, description)` pairs in key order.
    ///
    /// Each call starts a new pass over the registry.
    pub fn list_all(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.description.as_str()))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerRegistry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
