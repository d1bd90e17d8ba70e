//! Locating the URL field within a row.

use csv::StringRecord;
use tracing::{debug, warn};

use super::PipelineError;

/// Header names probed, in order, when no URL column is configured.
pub const URL_HEADER_CANDIDATES: [&str; 3] = ["url", "URL", "link"];

/// Where the URL sits in each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlColumn {
    /// Fixed 0-based field index taken from the header row.
    Index(usize),
    /// Last field of each row.
    Last,
}

impl UrlColumn {
    /// Resolves the URL column from the header row.
    ///
    /// An explicit name must be present in the header. Otherwise the
    /// candidates are probed in order; with no candidate present, the last
    /// field of each row is used.
    pub(crate) fn from_header(
        header: &StringRecord,
        explicit: Option<&str>,
    ) -> Result<Self, PipelineError> {
        let position = |name: &str| header.iter().position(|field| field == name);

        if let Some(column) = explicit {
            return position(column)
                .map(Self::Index)
                .ok_or_else(|| PipelineError::MissingUrlColumn {
                    column: column.to_string(),
                    available: header.iter().collect::<Vec<_>>().join(", "),
                });
        }

        for candidate in URL_HEADER_CANDIDATES {
            if let Some(index) = position(candidate) {
                debug!(column = candidate, index, "Using URL column from header");
                return Ok(Self::Index(index));
            }
        }

        warn!(
            header = ?header.iter().collect::<Vec<_>>(),
            "No url/URL/link column in header; using the last field of each row"
        );
        Ok(Self::Last)
    }

    /// Field holding the URL in `record`, if the row is long enough.
    pub(crate) fn get<'r>(&self, record: &'r StringRecord) -> Option<&'r str> {
        match *self {
            Self::Index(index) => record.get(index),
            Self::Last => record.len().checked_sub(1).and_then(|last| record.get(last)),
        }
    }
}
