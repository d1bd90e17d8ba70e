//! Error types for the row pipeline.

use thiserror::Error;

use crate::checker::CheckError;

/// Errors that abort a pipeline run.
///
/// Rows written before the error stay flushed in the output.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input could not be read or parsed as delimited rows
    #[error("cannot read input")]
    Read {
        /// Underlying reader error (carries the input position)
        #[source]
        source: csv::Error,
    },

    /// The output could not be written
    #[error("cannot write output")]
    Write {
        /// Underlying writer error
        #[source]
        source: csv::Error,
    },

    /// The configured URL column is not in the header row
    #[error(
        "URL column '{column}' not found in header row (columns: {available})\n  Suggestion: Pass one of the header names to --url-column"
    )]
    MissingUrlColumn {
        /// Requested column name
        column: String,
        /// Header names, comma separated
        available: String,
    },

    /// A URL column name was given but the input has no header row
    #[error(
        "a URL column name requires a header row\n  Suggestion: Drop --no-headers or drop --url-column"
    )]
    UrlColumnWithoutHeaders,

    /// A row has no field at the URL column's position
    #[error("line {line}: row has no URL field\n  Suggestion: Check the delimiter (--delimiter)")]
    MissingUrlField {
        /// 1-based input line number
        line: u64,
    },

    /// The URL field does not parse as an absolute URL
    #[error("line {line}: invalid URL '{url}'")]
    InvalidUrl {
        /// Field value as read
        url: String,
        /// 1-based input line number
        line: u64,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// The checker failed on a row
    #[error("line {line}: checking '{url}' failed")]
    CheckFailed {
        /// 1-based input line number
        line: u64,
        /// URL being checked
        url: String,
        /// Checker failure
        #[source]
        source: CheckError,
    },
}

impl PipelineError {
    /// Returns true for errors raised before any row is classified.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingUrlColumn { .. } | Self::UrlColumnWithoutHeaders
        )
    }

    /// 1-based input line the error is attached to, if any.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::MissingUrlField { line }
            | Self::InvalidUrl { line, .. }
            | Self::CheckFailed { line, .. } => Some(*line),
            Self::Read { source } => source.position().map(csv::Position::line),
            Self::Write { .. } | Self::MissingUrlColumn { .. } | Self::UrlColumnWithoutHeaders => {
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message_names_line_and_url() {
        let err = PipelineError::InvalidUrl {
            url: "not a url".to_string(),
            line: 7,
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("'not a url'"));
        assert_eq!(err.line(), Some(7));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_missing_url_column_is_configuration_error() {
        let err = PipelineError::MissingUrlColumn {
            column: "href".to_string(),
            available: "title, link".to_string(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'href'"));
        assert!(err.to_string().contains("title, link"));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_check_failed_keeps_source_chain() {
        let err = PipelineError::CheckFailed {
            line: 3,
            url: "https://example.org/".to_string(),
            source: CheckError::provider("doi", "boom"),
        };
        assert!(err.to_string().contains("line 3"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("boom"));
    }
}
