//! Market data source abstraction for MBO event logs.
//!
//! The reconstructor consumes any iterator of `Result<MboMessage>`. This
//! module provides the trait plus two implementations:
//!
//! - [`VecSource`]: in-memory messages, for tests and simulations
//! - [`CsvSource`]: a delimited event log with one header record
//!
//! # Input layout
//!
//! Data records carry at least 15 fields. Only these positions are read
//! (0-based):
//!
//! | Field | Content |
//! |-------|---------|
//! | 1 | event timestamp |
//! | 5 | action code |
//! | 6 | side code |
//! | 7 | price (decimal) |
//! | 8 | size |
//! | 10 | order id |
//! | 13 | sequence |
//!
//! Records are read as raw bytes, so non-UTF-8 content in unread fields has
//! no effect. Records with fewer fields are not rejected: they become a
//! default message (action `Other`), which the reconstructor ignores.
//!
//! # Example
//!
//! ```
//! use mbo_mbp_reconstructor::source::CsvSource;
//! use mbo_mbp_reconstructor::MbpReconstructor;
//!
//! let csv = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol\n\
//!            r1,t1,160,2,1108,A,B,100.00,50,0,1,130,165200,1,ARL\n";
//!
//! let source = CsvSource::from_reader(csv.as_bytes());
//! let mut mbp = MbpReconstructor::new(10);
//! mbp.process_source(source).unwrap();
//!
//! assert_eq!(mbp.snapshots().len(), 1);
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};

use crate::error::{MbpError, Result};
use crate::types::{price_from_f64, Action, MboMessage, Side};

/// Minimum number of fields for a data record to be parsed.
pub const MIN_FIELDS: usize = 15;

const TIMESTAMP_FIELD: usize = 1;
const ACTION_FIELD: usize = 5;
const SIDE_FIELD: usize = 6;
const PRICE_FIELD: usize = 7;
const SIZE_FIELD: usize = 8;
const ORDER_ID_FIELD: usize = 10;
const SEQUENCE_FIELD: usize = 13;

/// I/O buffer size for file reading.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024;

// ============================================================================
// Source Metadata
// ============================================================================

/// Metadata about a market data source.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadata {
    /// Original file path (if loaded from file)
    pub file_path: Option<PathBuf>,

    /// Data provider name (e.g., "csv", "memory")
    pub provider: Option<String>,
}

impl SourceMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Short label for log lines: the file path, else the provider.
    pub fn label(&self) -> String {
        match (&self.file_path, &self.provider) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(provider)) => format!("<{provider}>"),
            (None, None) => "<unknown>".to_string(),
        }
    }
}

// ============================================================================
// Market Data Source Trait
// ============================================================================

/// Trait for market data sources.
///
/// `messages()` consumes `self` to allow single-pass iteration. An `Err`
/// item means the underlying stream failed and no further items follow.
pub trait MarketDataSource {
    /// The iterator type for messages.
    type MessageIter: Iterator<Item = Result<MboMessage>>;

    /// Consume the source and return an iterator over messages.
    fn messages(self) -> Result<Self::MessageIter>;

    /// Get metadata about the source.
    fn metadata(&self) -> &SourceMetadata;
}

// ============================================================================
// Vector Source
// ============================================================================

/// A simple in-memory source.
pub struct VecSource {
    messages: Vec<MboMessage>,
    metadata: SourceMetadata,
}

impl VecSource {
    /// Create a new vector source.
    pub fn new(messages: Vec<MboMessage>) -> Self {
        Self {
            messages,
            metadata: SourceMetadata::new().with_provider("memory"),
        }
    }
}

impl MarketDataSource for VecSource {
    type MessageIter =
        std::iter::Map<std::vec::IntoIter<MboMessage>, fn(MboMessage) -> Result<MboMessage>>;

    fn messages(self) -> Result<Self::MessageIter> {
        Ok(self.messages.into_iter().map(Ok as fn(MboMessage) -> Result<MboMessage>))
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

// ============================================================================
// CSV Source
// ============================================================================

/// Statistics for delimited-text loading.
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    /// Data records read (header excluded)
    pub records_read: u64,

    /// Data records with fewer than [`MIN_FIELDS`] fields
    pub malformed_records: u64,
}

/// Delimited event log with an optional header record.
pub struct CsvSource {
    reader: Box<dyn Read>,
    delimiter: u8,
    has_header: bool,
    metadata: SourceMetadata,
}

impl CsvSource {
    /// Open a file.
    ///
    /// # Errors
    /// `MbpError::InputUnavailable` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MbpError::input(path, e))?;
        log::debug!("Opened {}", path.display());

        Ok(Self {
            reader: Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, file)),
            delimiter: b',',
            has_header: true,
            metadata: SourceMetadata::new().with_file_path(path).with_provider("csv"),
        })
    }

    /// Read from any byte stream (e.g. an in-memory buffer).
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            delimiter: b',',
            has_header: true,
            metadata: SourceMetadata::new().with_provider("csv"),
        }
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Whether the first record is a header to skip.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

impl MarketDataSource for CsvSource {
    type MessageIter = CsvMessageIter;

    fn messages(self) -> Result<Self::MessageIter> {
        let reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(self.reader);

        Ok(CsvMessageIter {
            records: reader.into_byte_records(),
            stats: SourceStats::default(),
            failed: false,
        })
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

/// Iterator over messages in a delimited event log.
pub struct CsvMessageIter {
    records: ByteRecordsIntoIter<Box<dyn Read>>,
    stats: SourceStats,
    failed: bool,
}

impl CsvMessageIter {
    /// Get current statistics.
    pub fn stats(&self) -> &SourceStats {
        &self.stats
    }
}

impl Iterator for CsvMessageIter {
    type Item = Result<MboMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let record = match self.records.next() {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                self.failed = true;
                log::error!("Read failed after {} records: {e}", self.stats.records_read);
                return Some(Err(e.into()));
            }
            None => {
                if self.stats.malformed_records > 0 {
                    log::info!(
                        "{} of {} records had fewer than {MIN_FIELDS} fields",
                        self.stats.malformed_records,
                        self.stats.records_read
                    );
                }
                return None;
            }
        };

        self.stats.records_read += 1;
        match parse_record(&record) {
            Some(msg) => Some(Ok(msg)),
            None => {
                self.stats.malformed_records += 1;
                log::debug!(
                    "Record {} has {} fields, using defaults",
                    self.stats.records_read,
                    record.len()
                );
                Some(Ok(MboMessage::default()))
            }
        }
    }
}

/// Parse one data record. Returns `None` when it has too few fields.
///
/// Unparseable numeric fields fall back to zero, and unknown action or side
/// codes to [`Action::Other`] / [`Side::None`].
pub fn parse_record(record: &ByteRecord) -> Option<MboMessage> {
    if record.len() < MIN_FIELDS {
        return None;
    }
    let field = |i: usize| record.get(i).unwrap_or_default();

    Some(MboMessage {
        timestamp: String::from_utf8_lossy(field(TIMESTAMP_FIELD)).into_owned(),
        action: field(ACTION_FIELD)
            .first()
            .and_then(|&b| Action::from_byte(b))
            .unwrap_or(Action::Other),
        side: field(SIDE_FIELD)
            .first()
            .and_then(|&b| Side::from_byte(b))
            .unwrap_or(Side::None),
        price: parse_field::<f64>(field(PRICE_FIELD))
            .map(price_from_f64)
            .unwrap_or(0),
        size: parse_field(field(SIZE_FIELD)).unwrap_or(0),
        order_id: parse_field(field(ORDER_ID_FIELD)).unwrap_or(0),
        sequence: parse_field(field(SEQUENCE_FIELD)).unwrap_or(0),
    })
}

#[inline]
fn parse_field<T: std::str::FromStr>(bytes: &[u8]) -> Option<T> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
