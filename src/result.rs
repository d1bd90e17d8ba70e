//! Access result taxonomy.
//!
//! Every checked URL produces exactly one [`AccessResult`]: a [`ResultKind`]
//! plus a free-text message. Kinds are open tag values rather than a closed
//! enum so provider checkers can declare their own leaves; each leaf carries
//! the [`Branch`] it belongs to, and that branch is what downstream code
//! should match on.

use std::fmt;

/// Top-level classification of a result kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Access to the full resource was confirmed (or is very likely).
    Success,
    /// The check could not determine the real access status.
    Error,
    /// The status was determined and access is denied.
    NoAccess,
}

impl Branch {
    /// Returns true for the `Success` branch.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for either failure sub-branch (`Error` or `NoAccess`).
    #[must_use]
    pub fn is_failure(self) -> bool {
        !self.is_success()
    }

    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::NoAccess => "no_access",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf of the result taxonomy.
///
/// Built-in leaves are associated constants. Providers add their own with
/// [`ResultKind::error`] or [`ResultKind::no_access`]:
///
/// ```
/// use access_checker_core::{Branch, ResultKind};
///
/// const SESSION_LIMIT: ResultKind = ResultKind::no_access("SessionLimitReached");
/// assert_eq!(SESSION_LIMIT.branch(), Branch::NoAccess);
/// ```
///
/// Success leaves are fixed; providers cannot add to that branch:
///
/// ```compile_fail
/// use access_checker_core::ResultKind;
///
/// const UNLOCKED: ResultKind = ResultKind::success("Unlocked");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultKind {
    name: &'static str,
    branch: Branch,
}

impl ResultKind {
    /// Full access confirmed by a positive page signature.
    pub const FULL_ACCESS: Self = Self::success("FullAccess");
    /// Full access likely, inferred rather than confirmed.
    pub const PROBABLE_FULL_ACCESS: Self = Self::success("ProbableFullAccess");
    /// No provider rule matched the page.
    pub const NO_RULE_MATCHED: Self = Self::error("NoRuleMatched");
    /// The DOI could not be resolved.
    pub const DOI_ERROR: Self = Self::error("DOIError");
    /// The page does not exist.
    pub const PAGE_NOT_FOUND: Self = Self::error("PageNotFound");
    /// Access was denied.
    pub const NO_ACCESS: Self = Self::no_access("NoAccess");
    /// Only a preview or otherwise limited portion is available.
    pub const RESTRICTED_ACCESS: Self = Self::no_access("RestrictedAccess");

    const fn new(name: &'static str, branch: Branch) -> Self {
        Self { name, branch }
    }

    const fn success(name: &'static str) -> Self {
        Self::new(name, Branch::Success)
    }

    /// Declares an `Error` leaf (status undetermined).
    #[must_use]
    pub const fn error(name: &'static str) -> Self {
        Self::new(name, Branch::Error)
    }

    /// Declares a `NoAccess` leaf (status determined, access denied).
    #[must_use]
    pub const fn no_access(name: &'static str) -> Self {
        Self::new(name, Branch::NoAccess)
    }

    /// Stable identifier written to the `result` output column.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Branch this leaf belongs to.
    #[must_use]
    pub fn branch(&self) -> Branch {
        self.branch
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Outcome of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessResult {
    kind: ResultKind,
    message: String,
}

impl AccessResult {
    /// Creates a result with an empty message.
    #[must_use]
    pub fn new(kind: ResultKind) -> Self {
        Self::with_message(kind, "")
    }

    /// Creates a result with a message.
    ///
    /// Line breaks are folded to spaces so the message stays on one output row.
    #[must_use]
    pub fn with_message(kind: ResultKind, message: impl Into<String>) -> Self {
        let message: String = message.into();
        let message = if message.contains(['\r', '\n']) {
            message
                .split(['\r', '\n'])
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            message
        };
        Self { kind, message }
    }

    /// Returns the result kind.
    #[must_use]
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Returns the kind's stable identifier.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns the message (empty when none was given).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the branch of the result kind.
    #[must_use]
    pub fn branch(&self) -> Branch {
        self.kind.branch()
    }
}

impl From<ResultKind> for AccessResult {
    fn from(kind: ResultKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for AccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILT_IN: [ResultKind; 7] = [
        ResultKind::FULL_ACCESS,
        ResultKind::PROBABLE_FULL_ACCESS,
        ResultKind::NO_RULE_MATCHED,
        ResultKind::DOI_ERROR,
        ResultKind::PAGE_NOT_FOUND,
        ResultKind::NO_ACCESS,
        ResultKind::RESTRICTED_ACCESS,
    ];

    #[test]
    fn test_result_names_are_stable_and_non_empty() {
        let names: Vec<&str> = BUILT_IN.iter().map(ResultKind::name).collect();
        assert_eq!(
            names,
            [
                "FullAccess",
                "ProbableFullAccess",
                "NoRuleMatched",
                "DOIError",
                "PageNotFound",
                "NoAccess",
                "RestrictedAccess",
            ]
        );
        for kind in BUILT_IN {
            assert!(!AccessResult::new(kind).name().is_empty());
            assert_eq!(AccessResult::new(kind).name(), AccessResult::new(kind).name());
        }
    }

    #[test]
    fn test_result_message_defaults_to_empty() {
        let result = AccessResult::new(ResultKind::FULL_ACCESS);
        assert_eq!(result.message(), "");
        assert_eq!(AccessResult::from(ResultKind::NO_ACCESS).message(), "");
    }

    #[test]
    fn test_result_branches() {
        assert_eq!(ResultKind::FULL_ACCESS.branch(), Branch::Success);
        assert_eq!(ResultKind::PROBABLE_FULL_ACCESS.branch(), Branch::Success);
        assert_eq!(ResultKind::NO_RULE_MATCHED.branch(), Branch::Error);
        assert_eq!(ResultKind::DOI_ERROR.branch(), Branch::Error);
        assert_eq!(ResultKind::PAGE_NOT_FOUND.branch(), Branch::Error);
        assert_eq!(ResultKind::NO_ACCESS.branch(), Branch::NoAccess);
        assert_eq!(ResultKind::RESTRICTED_ACCESS.branch(), Branch::NoAccess);
        assert!(Branch::Error.is_failure());
        assert!(Branch::NoAccess.is_failure());
        assert!(!Branch::Success.is_failure());
    }

    #[test]
    fn test_result_equality_is_structural() {
        let a = AccessResult::with_message(ResultKind::NO_ACCESS, "login wall");
        let b = AccessResult::with_message(ResultKind::NO_ACCESS, "login wall");
        let c = AccessResult::with_message(ResultKind::NO_ACCESS, "paywall");
        let d = AccessResult::with_message(ResultKind::RESTRICTED_ACCESS, "login wall");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_provider_defined_kind_keeps_declared_branch() {
        const EXPIRED: ResultKind = ResultKind::error("LicenseExpired");
        let result = AccessResult::with_message(EXPIRED, "licence ended 2024");
        assert_eq!(result.name(), "LicenseExpired");
        assert_eq!(result.branch(), Branch::Error);
        assert_ne!(EXPIRED, ResultKind::no_access("LicenseExpired"));
    }

    #[test]
    fn test_result_message_line_breaks_are_folded() {
        let result = AccessResult::with_message(ResultKind::NO_ACCESS, "first\r\nsecond\nthird");
        assert_eq!(result.message(), "first second third");
    }

    #[test]
    fn test_result_display() {
        assert_eq!(AccessResult::new(ResultKind::FULL_ACCESS).to_string(), "FullAccess");
        assert_eq!(
            AccessResult::with_message(ResultKind::PAGE_NOT_FOUND, "HTTP 404").to_string(),
            "PageNotFound: HTTP 404"
        );
    }
}
