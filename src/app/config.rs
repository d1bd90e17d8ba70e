//! File configuration and settings resolution for a run.
//!
//! The optional config file holds `key = value` lines; command-line values
//! always win over file values, which win over built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use access_checker_core::pipeline::{DEFAULT_DELIMITER, PipelineOptions};
use access_checker_core::session::DEFAULT_NAVIGATION_TIMEOUT;
use access_checker_core::{ProxyCredentials, ProxyLogin};
use anyhow::{Context, Result, bail};

use crate::cli::{Args, parse_delimiter};

const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=600;

/// Defaults read from the config file.
#[derive(Clone, Default)]
pub(crate) struct FileConfig {
    pub(crate) delimiter: Option<u8>,
    pub(crate) headers: Option<bool>,
    pub(crate) url_column: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) proxy_user: Option<String>,
    pub(crate) proxy_password: Option<String>,
    pub(crate) proxy_host: Option<String>,
    pub(crate) proxy_login_path: Option<String>,
}

impl std::fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfig")
            .field("delimiter", &self.delimiter.map(char::from))
            .field("headers", &self.headers)
            .field("url_column", &self.url_column)
            .field("timeout_secs", &self.timeout_secs)
            .field("proxy_user", &self.proxy_user)
            .field(
                "proxy_password",
                &self.proxy_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("proxy_host", &self.proxy_host)
            .field("proxy_login_path", &self.proxy_login_path)
            .finish()
    }
}

/// Everything a run needs, after merging CLI, file config and defaults.
#[derive(Debug)]
pub(crate) struct RunSettings {
    pub(crate) provider: String,
    pub(crate) input: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) append: bool,
    pub(crate) options: PipelineOptions,
    pub(crate) timeout: Duration,
    pub(crate) cookies: Option<PathBuf>,
    pub(crate) proxy: Option<ProxyLogin>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/access-checker/config.toml`
/// 2. `$HOME/.config/access-checker/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("access-checker")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("access-checker")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path, if one exists.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "delimiter" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let delimiter = parse_delimiter(&parsed)
                    .map_err(anyhow::Error::msg)
                    .with_context(invalid)?;
                cfg.delimiter = Some(delimiter);
            }
            "headers" => cfg.headers = Some(parse_boolean(value).with_context(invalid)?),
            "url_column" => {
                cfg.url_column = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "proxy_user" => {
                cfg.proxy_user = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "proxy_password" => {
                cfg.proxy_password = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "proxy_host" => {
                cfg.proxy_host = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "proxy_login_path" => {
                cfg.proxy_login_path = Some(parse_string_literal(value).with_context(invalid)?);
            }
            unknown => bail!("Unknown configuration key: '{unknown}' on line {line_number}"),
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_secs
            && !TIMEOUT_RANGE.contains(&timeout)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..=600");
        }
        if let Some(path) = &self.proxy_login_path
            && !path.starts_with('/')
        {
            bail!("Invalid config value for `proxy_login_path`: '{path}'. Must start with '/'");
        }
        Ok(())
    }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected boolean value `true` or `false`"),
    }
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    token
        .parse::<u64>()
        .with_context(|| format!("Expected non-negative integer, got '{token}'"))
}

/// Merges CLI arguments over file config and defaults.
pub(crate) fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<RunSettings> {
    let file = file.cloned().unwrap_or_default();
    let Some(provider) = args.provider.clone() else {
        bail!("A provider is required\n  Suggestion: Pass --provider KEY (see --list-providers)");
    };

    let headers = !args.no_headers && file.headers.unwrap_or(true);
    let url_column = args.url_column.clone().or(file.url_column);
    if url_column.is_some() && !headers {
        bail!(
            "A URL column name requires a header row\n  Suggestion: Set `headers = true` in the config file or drop the URL column setting"
        );
    }

    let timeout = args
        .timeout
        .or(file.timeout_secs)
        .map_or(DEFAULT_NAVIGATION_TIMEOUT, Duration::from_secs);

    let proxy = resolve_proxy(
        args.proxy_user.clone().or(file.proxy_user),
        args.proxy_password.clone().or(file.proxy_password),
        args.proxy_host.clone().or(file.proxy_host),
        args.proxy_login_path.clone().or(file.proxy_login_path),
    )?;

    Ok(RunSettings {
        provider,
        input: args
            .input
            .clone()
            .filter(|path| path.as_os_str() != "-"),
        output: args.output.clone(),
        append: args.append,
        options: PipelineOptions {
            delimiter: args
                .delimiter
                .or(file.delimiter)
                .unwrap_or(DEFAULT_DELIMITER),
            headers,
            url_column,
            resume: false,
        },
        timeout,
        cookies: args.cookies.clone(),
        proxy,
    })
}

fn resolve_proxy(
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    login_path: Option<String>,
) -> Result<Option<ProxyLogin>> {
    let (user, password) = match (user, password) {
        (Some(user), Some(password)) => (user, password),
        (None, None) => {
            if host.is_some() || login_path.is_some() {
                bail!(
                    "Proxy host or login path given without credentials\n  Suggestion: Set --proxy-user and --proxy-password (or ACCESS_CHECKER_PROXY_USER / ACCESS_CHECKER_PROXY_PASSWORD)"
                );
            }
            return Ok(None);
        }
        (Some(_), None) => bail!(
            "--proxy-user requires a password\n  Suggestion: Set --proxy-password or ACCESS_CHECKER_PROXY_PASSWORD"
        ),
        (None, Some(_)) => bail!(
            "A proxy password was given without a user\n  Suggestion: Set --proxy-user or ACCESS_CHECKER_PROXY_USER"
        ),
    };

    let mut login = ProxyLogin::new(ProxyCredentials::new(user, password));
    if let Some(host) = host {
        login = login.with_host(host);
    }
    if let Some(path) = login_path {
        if !path.starts_with('/') {
            bail!("Proxy login path '{path}' must start with '/'");
        }
        login = login.with_login_path(path);
    }
    Ok(Some(login))
}
