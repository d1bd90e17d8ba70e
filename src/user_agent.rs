//! Shared User-Agent string for session HTTP traffic.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/access-checker";

/// Default User-Agent for session requests (identifies the tool).
#[must_use]
pub(crate) fn default_session_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("access-checker/{version} (library-holdings-check; +{PROJECT_UA_URL})")
}
