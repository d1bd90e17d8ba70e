//! HTTP client construction policy for browsing sessions.
//!
//! Centralizes connect timeout, user-agent, compression, proxy compatibility
//! and cookie support so every session talks to providers the same way.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

use super::SessionError;

/// Connect timeout for session HTTP clients.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client behind an [`HttpSession`](super::HttpSession).
///
/// Navigation timeouts are applied per request, so the client itself only
/// bounds connection setup.
///
/// # Errors
///
/// Returns [`SessionError::Client`] when client construction fails.
pub(crate) fn build_session_http_client(cookie_jar: Arc<Jar>) -> Result<Client, SessionError> {
    match try_build_client(Arc::clone(&cookie_jar), false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some restricted sandbox environments panic when querying system
            // proxy settings; env-proxy support survives the fallback.
            warn!("Session client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(cookie_jar, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(SessionError::Client {
                    reason: "HTTP client construction panicked while reading proxy settings"
                        .to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(SessionError::Client {
                    reason: format!("HTTP client construction failed: {error}"),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(SessionError::Client {
            reason: format!("HTTP client construction failed: {error}"),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    cookie_jar: Arc<Jar>,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(cookie_jar);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(cookie_jar: Arc<Jar>) -> ClientBuilder {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(user_agent::default_session_user_agent())
        .gzip(true)
        .cookie_provider(cookie_jar)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
