//! Access Checker Core Library
//!
//! This library checks, for batches of URLs describing library e-resource
//! holdings, whether each resource is reachable in full. Each page is fetched
//! through a browsing session and matched against provider-specific
//! signatures.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`result`] - Result taxonomy: outcome kinds grouped into success, error and no-access branches
//! - [`checker`] - Checker protocol, provider registry and built-in provider checkers
//! - [`session`] - Browsing sessions, including the institutional proxy login decorator
//! - [`pipeline`] - Streaming row pipeline appending `result` and `message` to each row

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checker;
pub mod pipeline;
pub mod result;
pub mod session;
mod user_agent;

// Re-export commonly used types
pub use checker::{
    Check, CheckError, Checker, CheckerEntry, CheckerRegistry, FALLBACK_MESSAGE, RegistryError,
    build_default_checker_registry,
};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineStats};
pub use result::{AccessResult, Branch, ResultKind};
pub use session::{HttpSession, ProxyCredentials, ProxyLogin, ProxySession, Session, SessionError};
