//! MBP snapshot rendering and the buffered output log.
//!
//! Every book-mutating event produces one [`MbpSnapshot`] holding the top N
//! levels of each side. Snapshots accumulate in a [`SnapshotLog`] in
//! processing order and are flushed in a single pass at the end of a run.
//!
//! # Row format
//!
//! ```text
//! timestamp,sequence,bid_px_00,bid_sz_00,...,bid_px_09,bid_sz_09,ask_px_00,ask_sz_00,...,ask_px_09,ask_sz_09
//! ```
//!
//! Prices use 2 decimals, sizes are plain integers. Slots beyond the
//! available depth are empty fields, never zero.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};

use crate::error::{MbpError, Result};
use crate::lob::{PriceLevel, PriceLevelBook};
use crate::types::{price_to_f64, Side};

/// One rendered point-in-time view of the top levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbpSnapshot {
    /// Timestamp the snapshot is attributed to
    pub timestamp: String,
    /// Sequence number the snapshot is attributed to
    pub sequence: u64,
    /// Bid levels, best (highest) first
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<PriceLevel>,
}

impl MbpSnapshot {
    /// Capture the top `depth` levels of `book`.
    pub fn capture(
        book: &PriceLevelBook,
        depth: usize,
        timestamp: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            sequence,
            bids: book.top_levels(Side::Bid, depth),
            asks: book.top_levels(Side::Ask, depth),
        }
    }

    /// Best bid level, if any.
    #[inline]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    /// Best ask level, if any.
    #[inline]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Record fields with exactly `depth` slot pairs per side.
    pub fn to_record(&self, depth: usize) -> Vec<String> {
        let mut fields = Vec::with_capacity(2 + depth * 4);
        fields.push(self.timestamp.clone());
        fields.push(self.sequence.to_string());
        push_side(&mut fields, &self.bids, depth);
        push_side(&mut fields, &self.asks, depth);
        fields
    }
}

fn push_side(fields: &mut Vec<String>, levels: &[PriceLevel], depth: usize) {
    for slot in 0..depth {
        match levels.get(slot) {
            Some(level) => {
                fields.push(format!("{:.2}", price_to_f64(level.price)));
                fields.push(level.size.to_string());
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }
}

/// Column names for a snapshot of `depth` levels per side.
pub fn csv_header(depth: usize) -> Vec<String> {
    let mut header = vec!["timestamp".to_string(), "sequence".to_string()];
    for prefix in ["bid", "ask"] {
        for i in 0..depth {
            header.push(format!("{prefix}_px_{i:02}"));
            header.push(format!("{prefix}_sz_{i:02}"));
        }
    }
    header
}

/// Append-only, ordered log of emitted snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotLog {
    depth: usize,
    snapshots: Vec<MbpSnapshot>,
}

impl SnapshotLog {
    /// Create an empty log rendering `depth` levels per side.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            snapshots: Vec::new(),
        }
    }

    /// Capture `book` and append the snapshot.
    pub fn emit(
        &mut self,
        book: &PriceLevelBook,
        timestamp: impl Into<String>,
        sequence: u64,
    ) -> &MbpSnapshot {
        let snapshot = MbpSnapshot::capture(book, self.depth, timestamp, sequence);
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Levels per side.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of snapshots emitted.
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if nothing has been emitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// All snapshots in emission order.
    #[inline]
    pub fn snapshots(&self) -> &[MbpSnapshot] {
        &self.snapshots
    }

    /// Most recent snapshot.
    #[inline]
    pub fn last(&self) -> Option<&MbpSnapshot> {
        self.snapshots.last()
    }

    /// Write header plus every row to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        wtr.write_record(csv_header(self.depth))?;
        for snapshot in &self.snapshots {
            wtr.write_record(snapshot.to_record(self.depth))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Flush the whole log to a file in one scoped write.
    ///
    /// # Errors
    /// `MbpError::OutputUnavailable` if the file cannot be created or written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| MbpError::output(path, e))?;
        self.write_to(file).map_err(|e| MbpError::output(path, e))?;

        log::info!(
            "Wrote {} snapshots ({} levels) to {}",
            self.snapshots.len(),
            self.depth,
            path.display()
        );
        Ok(())
    }

    /// Drop all buffered snapshots.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
