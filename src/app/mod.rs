//! Runtime wiring for the `access-checker` binary.

pub(crate) mod config;
pub(crate) mod exit;
pub(crate) mod progress;
pub(crate) mod runtime;
pub(crate) mod terminal;
