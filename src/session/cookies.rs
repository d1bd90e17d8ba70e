//! Netscape cookie file loading for pre-authenticated sessions.
//!
//! Lets a run start with cookies exported from a browser (for example an
//! existing proxy or publisher login) so the first rows do not hit login walls.
//! The format is 7 TAB-separated fields per line:
//! `domain`, `tailmatch`, `path`, `secure`, `expires`, `name`, `value`.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use reqwest::cookie::Jar;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// One cookie from a Netscape cookie file.
///
/// The value is redacted from `Debug` output.
#[derive(Clone)]
pub struct NetscapeCookie {
    /// Cookie domain (e.g. `.proxy.example.edu`).
    pub domain: String,
    /// Path scope.
    pub path: String,
    /// Only sent over HTTPS.
    pub secure: bool,
    /// Unix expiry timestamp; 0 for a session cookie.
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    value: String,
}

impl NetscapeCookie {
    /// Cookie value. Never log it.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn set_cookie_header(&self) -> String {
        let mut header = format!(
            "{}={}; Domain={}; Path={}",
            self.name, self.value, self.domain, self.path
        );
        if self.secure {
            header.push_str("; Secure");
        }
        if self.expires > 0 {
            match UNIX_EPOCH.checked_add(Duration::from_secs(self.expires)) {
                Some(expiry) => {
                    header.push_str("; Expires=");
                    header.push_str(&httpdate::fmt_http_date(expiry));
                }
                None => warn!(
                    domain = %self.domain,
                    name = %self.name,
                    "Cookie expiry overflows; treating as session cookie"
                ),
            }
        }
        header
    }

    fn origin(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.domain.trim_start_matches('.');
        Url::parse(&format!("{scheme}://{host}{}", self.path)).ok()
    }
}

impl fmt::Debug for NetscapeCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetscapeCookie")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors reading a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The file could not be opened or read.
    #[error("cannot read cookie file '{path}'")]
    Io {
        /// Cookie file path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file had data lines but none of them parsed.
    #[error(
        "no valid cookies found ({malformed} malformed line(s))\n  Suggestion: Export cookies in Netscape format (7 TAB-separated fields)"
    )]
    NoCookiesFound {
        /// Number of rejected lines
        malformed: usize,
    },
}

/// Cookies parsed from a file plus per-line warnings.
#[derive(Debug, Default)]
pub struct ParsedCookies {
    /// Accepted cookies.
    pub cookies: Vec<NetscapeCookie>,
    /// Rejected lines as (1-based line number, reason).
    pub warnings: Vec<(usize, String)>,
}

/// Parses Netscape-format cookies from a reader.
///
/// Comment lines (`#`) and blank lines are skipped; malformed lines are
/// collected as warnings.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure and
/// [`CookieError::NoCookiesFound`] when data lines exist but none parse.
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<ParsedCookies, CookieError> {
    let mut parsed = ParsedCookies::default();
    let mut data_lines = 0_usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CookieError::Io {
            path: "<reader>".to_string(),
            source,
        })?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        data_lines += 1;

        match parse_cookie_line(line) {
            Ok(cookie) => parsed.cookies.push(cookie),
            Err(reason) => {
                warn!(line = index + 1, reason = %reason, "Skipping malformed cookie line");
                parsed.warnings.push((index + 1, reason));
            }
        }
    }

    if parsed.cookies.is_empty() && data_lines > 0 {
        return Err(CookieError::NoCookiesFound {
            malformed: parsed.warnings.len(),
        });
    }
    Ok(parsed)
}

fn parse_cookie_line(line: &str) -> Result<NetscapeCookie, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, tailmatch, path, secure, expires, name, value] = fields.as_slice() else {
        return Err(format!(
            "expected 7 TAB-separated fields, found {}",
            fields.len()
        ));
    };

    parse_flag(tailmatch, "tailmatch")?;
    let secure = parse_flag(secure, "secure")?;
    let expires = expires
        .parse::<u64>()
        .map_err(|_| format!("expires must be a non-negative integer, got '{expires}'"))?;
    if domain.is_empty() {
        return Err("domain field is empty".to_string());
    }
    if name.is_empty() {
        return Err("cookie name field is empty".to_string());
    }

    Ok(NetscapeCookie {
        domain: (*domain).to_string(),
        path: if path.is_empty() { "/" } else { *path }.to_string(),
        secure,
        expires,
        name: (*name).to_string(),
        value: (*value).to_string(),
    })
}

fn parse_flag(value: &str, field: &str) -> Result<bool, String> {
    match value {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        other => Err(format!("{field} must be TRUE or FALSE, got '{other}'")),
    }
}

/// Adds cookies to `jar`, returning how many were accepted.
#[instrument(level = "debug", skip(jar, cookies), fields(count = cookies.len()))]
pub fn add_cookies_to_jar(jar: &Jar, cookies: &[NetscapeCookie]) -> usize {
    let mut added = 0;
    for cookie in cookies {
        let Some(origin) = cookie.origin() else {
            warn!(
                domain = %cookie.domain,
                name = %cookie.name,
                "Skipping cookie with unusable domain"
            );
            continue;
        };
        jar.add_cookie_str(&cookie.set_cookie_header(), &origin);
        debug!(domain = %cookie.domain, name = %cookie.name, "Loaded cookie");
        added += 1;
    }
    added
}

/// Reads a cookie file and returns a jar holding its cookies.
///
/// # Errors
///
/// Returns [`CookieError`] if the file cannot be read or holds no valid cookie.
pub fn load_cookie_file(path: &Path) -> Result<Arc<Jar>, CookieError> {
    let file = File::open(path).map_err(|source| CookieError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = parse_netscape_cookies(BufReader::new(file)).map_err(|error| match error {
        CookieError::Io { source, .. } => CookieError::Io {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;

    let jar = Arc::new(Jar::default());
    let added = add_cookies_to_jar(&jar, &parsed.cookies);
    info!(
        path = %path.display(),
        cookies = added,
        skipped = parsed.warnings.len(),
        "Loaded session cookies"
    );
    Ok(jar)
}
