//! Streaming row pipeline: one classification per input row.
//!
//! The pipeline reads delimited rows, checks the URL found in each one and
//! writes the row back with two trailing fields, the result name and its
//! message. Each output row is flushed before the next row is read, so a
//! partial output is always valid and a run can resume by feeding the
//! unprocessed remainder of the input.
//!
//! # Example
//!
//! ```no_run
//! use access_checker_core::checker::build_default_checker_registry;
//! use access_checker_core::pipeline::{Pipeline, PipelineOptions};
//! use access_checker_core::session::HttpSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_checker_registry()?;
//! let entry = registry.lookup("ebsco")?.clone();
//! let mut session = HttpSession::new()?;
//!
//! let input = std::io::stdin().lock();
//! let output = std::io::stdout().lock();
//! let stats = Pipeline::new(entry, PipelineOptions::default())
//!     .run(input, output, &mut session)
//!     .await?;
//! eprintln!("checked {} rows", stats.checked);
//! # Ok(())
//! # }
//! ```

mod error;
mod url_column;

pub use error::PipelineError;
pub use url_column::URL_HEADER_CANDIDATES;

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};
use url::Url;

use crate::checker::CheckerEntry;
use crate::result::{AccessResult, Branch};
use crate::session::Session;

use url_column::UrlColumn;

/// Field labels appended to the header row.
pub const RESULT_HEADERS: [&str; 2] = ["result", "message"];

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Input and output format options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Field delimiter for both input and output.
    pub delimiter: u8,
    /// Whether the first record is a header row.
    pub headers: bool,
    /// Header name of the URL column; requires `headers`.
    pub url_column: Option<String>,
    /// Continuing an earlier run into the same output: the header row is
    /// still read to locate the URL column but is not written again.
    pub resume: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            headers: true,
            url_column: None,
            resume: false,
        }
    }
}

/// Counters for a finished (or interrupted) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Rows classified and written.
    pub checked: usize,
    /// Rows with a success-branch result.
    pub success: usize,
    /// Rows with an error-branch result.
    pub error: usize,
    /// Rows with a no-access-branch result.
    pub no_access: usize,
    /// The run stopped early on an interrupt request.
    pub interrupted: bool,
    /// 1-based input line of the last row written (header included).
    pub last_line: Option<u64>,
}

impl PipelineStats {
    fn record(&mut self, result: &AccessResult) {
        self.checked += 1;
        match result.branch() {
            Branch::Success => self.success += 1,
            Branch::Error => self.error += 1,
            Branch::NoAccess => self.no_access += 1,
        }
    }
}

/// Drives one checker over every row of an input stream.
#[derive(Debug)]
pub struct Pipeline {
    entry: CheckerEntry,
    options: PipelineOptions,
    interrupt: Option<Arc<AtomicBool>>,
    progress: Option<Arc<AtomicUsize>>,
}

impl Pipeline {
    /// Creates a pipeline checking rows with `entry`'s checker.
    #[must_use]
    pub fn new(entry: CheckerEntry, options: PipelineOptions) -> Self {
        Self {
            entry,
            options,
            interrupt: None,
            progress: None,
        }
    }

    /// Stops the run before the next row once `flag` is set.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Increments `counter` after every written row.
    #[must_use]
    pub fn with_progress(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.progress = Some(counter);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Processes `input` row by row, writing each checked row to `output`.
    ///
    /// Rows are handled strictly in input order; only one row is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on the first fatal condition: unreadable
    /// input, unwritable output, a misconfigured URL column, a row without a
    /// valid URL, or a checker failure. Rows already written stay flushed.
    #[tracing::instrument(skip_all, fields(provider = self.entry.key()))]
    pub async fn run<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
        session: &mut dyn Session,
    ) -> Result<PipelineStats, PipelineError> {
        if self.options.url_column.is_some() && !self.options.headers {
            return Err(PipelineError::UrlColumnWithoutHeaders);
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut writer = WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .flexible(true)
            .from_writer(output);

        let mut stats = PipelineStats::default();
        let mut record = StringRecord::new();
        let mut column = (!self.options.headers).then_some(UrlColumn::Last);

        loop {
            if self.interrupted() {
                warn!(last_line = ?stats.last_line, "Interrupted; stopping before the next row");
                stats.interrupted = true;
                break;
            }
            let more = reader
                .read_record(&mut record)
                .map_err(|source| PipelineError::Read { source })?;
            if !more {
                break;
            }
            let line = record.position().map_or(0, csv::Position::line);

            let Some(url_column) = column else {
                let resolved = UrlColumn::from_header(&record, self.options.url_column.as_deref())?;
                column = Some(resolved);
                if self.options.resume {
                    debug!(line, "Resuming; header row already in the output");
                } else {
                    for label in RESULT_HEADERS {
                        record.push_field(label);
                    }
                    write_row(&mut writer, &record)?;
                }
                stats.last_line = Some(line);
                continue;
            };

            let raw = url_column
                .get(&record)
                .ok_or(PipelineError::MissingUrlField { line })?
                .trim()
                .to_string();
            let url = Url::parse(&raw).map_err(|source| PipelineError::InvalidUrl {
                url: raw.clone(),
                line,
                source,
            })?;

            debug!(line, url = %url, "Checking row");
            let result = self
                .entry
                .check(url)
                .result(session)
                .await
                .map_err(|source| PipelineError::CheckFailed {
                    line,
                    url: raw,
                    source,
                })?;
            info!(line, result = result.name(), message = result.message(), "Row checked");

            stats.record(&result);
            record.push_field(result.name());
            record.push_field(result.message());
            write_row(&mut writer, &record)?;
            stats.last_line = Some(line);
            if let Some(progress) = &self.progress {
                progress.fetch_add(1, Ordering::SeqCst);
            }
        }

        debug!(?stats, "Pipeline finished");
        Ok(stats)
    }
}

fn write_row<W: Write>(
    writer: &mut csv::Writer<W>,
    record: &StringRecord,
) -> Result<(), PipelineError> {
    writer
        .write_record(record)
        .map_err(|source| PipelineError::Write { source })?;
    writer.flush().map_err(|source| PipelineError::Write {
        source: source.into(),
    })
}
