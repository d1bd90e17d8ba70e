//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

/// Check library e-resource holdings for full-text access.
///
/// Reads delimited rows (one resource per row), visits each row's URL with the
/// selected provider checker and writes every row back with two extra fields:
/// the result name and a message.
#[derive(Parser)]
#[command(name = "access-checker")]
#[command(author, version, about)]
pub struct Args {
    /// Input file of delimited rows (stdin when omitted or "-")
    pub input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of truncating it (for resumed runs)
    #[arg(long, requires = "output")]
    pub append: bool,

    /// Provider checker key (see --list-providers)
    #[arg(short, long, required_unless_present = "list_providers")]
    pub provider: Option<String>,

    /// Field delimiter, a single ASCII character or "tab" [default: ;]
    #[arg(short, long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Treat the first row as data rather than a header row
    #[arg(long)]
    pub no_headers: bool,

    /// Header name of the column holding the URL
    #[arg(long, conflicts_with = "no_headers")]
    pub url_column: Option<String>,

    /// Institutional proxy account name (enables proxy login)
    #[arg(long, env = "ACCESS_CHECKER_PROXY_USER")]
    pub proxy_user: Option<String>,

    /// Institutional proxy password
    #[arg(long, env = "ACCESS_CHECKER_PROXY_PASSWORD", hide_env_values = true)]
    pub proxy_password: Option<String>,

    /// Only treat login pages on this host as the proxy login wall
    #[arg(long)]
    pub proxy_host: Option<String>,

    /// Path of the proxy login page [default: /login]
    #[arg(long)]
    pub proxy_login_path: Option<String>,

    /// Netscape-format cookie file to preload into the session
    #[arg(long)]
    pub cookies: Option<PathBuf>,

    /// Navigation timeout in seconds (1-600) [default: 30]
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: Option<u64>,

    /// List provider keys and exit
    #[arg(long)]
    pub list_providers: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("append", &self.append)
            .field("provider", &self.provider)
            .field("delimiter", &self.delimiter.map(char::from))
            .field("no_headers", &self.no_headers)
            .field("url_column", &self.url_column)
            .field("proxy_user", &self.proxy_user)
            .field(
                "proxy_password",
                &self.proxy_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("proxy_host", &self.proxy_host)
            .field("cookies", &self.cookies)
            .field("timeout", &self.timeout)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

/// Parses a delimiter argument: one ASCII character, or `tab` / `\t`.
pub(crate) fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let invalid = || {
        format!(
            "delimiter must be a single ASCII character other than a quote or newline, got '{raw}'"
        )
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if !matches!(ch, '"' | '\n' | '\r') => {
            u8::try_from(ch).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_provider_required_without_list_providers() {
        let err = Args::try_parse_from(["access-checker"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );

        let args = Args::try_parse_from(["access-checker", "--list-providers"]).unwrap();
        assert!(args.list_providers);
        assert!(args.provider.is_none());
    }

    #[test]
    fn test_cli_minimal_args() {
        let args = Args::try_parse_from(["access-checker", "-p", "doi", "rows.csv"]).unwrap();
        assert_eq!(args.provider.as_deref(), Some("doi"));
        assert_eq!(args.input, Some(PathBuf::from("rows.csv")));
        assert!(args.output.is_none());
        assert!(args.delimiter.is_none());
        assert!(!args.no_headers);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["access-checker", "-p", "doi", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_delimiter_parsing() {
        let args = Args::try_parse_from(["access-checker", "-p", "doi", "-d", ","]).unwrap();
        assert_eq!(args.delimiter, Some(b','));
        let args = Args::try_parse_from(["access-checker", "-p", "doi", "-d", "tab"]).unwrap();
        assert_eq!(args.delimiter, Some(b'\t'));

        let result = Args::try_parse_from(["access-checker", "-p", "doi", "-d", ";;"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_delimiter_rejects_quote_and_non_ascii() {
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("§").is_err());
        assert!(parse_delimiter("").is_err());
        assert_eq!(parse_delimiter("|"), Ok(b'|'));
    }

    #[test]
    fn test_cli_timeout_range() {
        let args = Args::try_parse_from(["access-checker", "-p", "doi", "--timeout", "90"]).unwrap();
        assert_eq!(args.timeout, Some(90));
        assert!(Args::try_parse_from(["access-checker", "-p", "doi", "--timeout", "0"]).is_err());
        assert!(Args::try_parse_from(["access-checker", "-p", "doi", "--timeout", "601"]).is_err());
    }

    #[test]
    fn test_cli_url_column_conflicts_with_no_headers() {
        let result = Args::try_parse_from([
            "access-checker",
            "-p",
            "doi",
            "--no-headers",
            "--url-column",
            "link",
        ]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_cli_append_requires_output() {
        assert!(Args::try_parse_from(["access-checker", "-p", "doi", "--append"]).is_err());
        let args =
            Args::try_parse_from(["access-checker", "-p", "doi", "--append", "-o", "out.csv"])
                .unwrap();
        assert!(args.append);
    }

    #[test]
    fn test_cli_debug_redacts_proxy_password() {
        let args = Args::try_parse_from([
            "access-checker",
            "-p",
            "doi",
            "--proxy-user",
            "alice",
            "--proxy-password",
            "s3cret",
        ])
        .unwrap();
        let debug = format!("{args:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["access-checker", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
