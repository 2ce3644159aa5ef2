//! # MBO-MBP-Reconstructor
//!
//! Converts a Market-By-Order (MBO) event log into a sequence of
//! Market-By-Price (MBP-10) snapshots: the aggregated top 10 price levels of
//! each side, emitted after every book-mutating event.
//!
//! ## Features
//!
//! - **Price-level aggregation**: order-level events fold into per-price totals
//! - **T→F→C correlation**: a Trade / Fill / Cancel triple for the same order
//!   is applied once, to the resting side opposite the aggressor
//! - **Buffered output**: snapshots accumulate in memory and are written once
//! - **Warning tracking**: orphan fills, overwritten trades and missing levels
//!   are counted and summarised per category
//!
//! ## Quick Start
//!
//! ```rust
//! use mbo_mbp_reconstructor::{Action, MboMessage, MbpReconstructor, Side};
//!
//! let mut mbp = MbpReconstructor::new(10);
//!
//! let msg = MboMessage::new(
//!     1001,                    // order_id
//!     Action::Add,             // action
//!     Side::Bid,               // side
//!     100_000_000_000,         // price ($100.00 in fixed-point)
//!     100,                     // size
//! )
//! .with_timestamp("2025-07-17T08:05:03.360842448Z")
//! .with_sequence(1);
//!
//! let snapshot = mbp.process_message(&msg).unwrap();
//! assert_eq!(snapshot.best_bid().unwrap().size, 100);
//! ```
//!
//! ### From a CSV event log
//!
//! ```ignore
//! use mbo_mbp_reconstructor::{CsvSource, MbpReconstructor};
//!
//! let source = CsvSource::open("data/mbo.csv")?;
//! let mut mbp = MbpReconstructor::new(10);
//! mbp.process_source(source)?;
//! mbp.write_output()?; // mbp_output.csv
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `MboMessage`, `Action`, `Side`, `PRICE_SCALE` |
//! | [`lob`] | Book state: `PriceLevelBook`, `TradeCorrelator`, `MbpReconstructor` |
//! | [`snapshot`] | Snapshot rendering: `MbpSnapshot`, `SnapshotLog` |
//! | [`source`] | Input: `MarketDataSource`, `CsvSource`, `VecSource` |
//! | [`warnings`] | Warning tracking: `WarningTracker`, `Warning`, `WarningCategory` |

pub mod error;
pub mod lob;
pub mod snapshot;
pub mod source;
pub mod types;
pub mod warnings;

// Re-exports - Core types
pub use error::{MbpError, Result};
pub use types::{
    price_from_f64, price_to_f64, Action, MboMessage, Order, Side, MBP_DEPTH, PRICE_SCALE,
};

// Re-exports - Book reconstruction
pub use lob::{
    MbpConfig, MbpReconstructor, MbpStats, ModifyPolicy, PriceLevel, PriceLevelBook,
    DEFAULT_OUTPUT_PATH,
};

// Re-exports - Trade correlation
pub use lob::{CorrelatorStats, PendingTrade, ResolvedCancel, TradeCorrelator, TradeOutcome};

// Re-exports - Snapshots
pub use snapshot::{csv_header, MbpSnapshot, SnapshotLog};

// Re-exports - Warnings
pub use warnings::{
    Warning, WarningCategory, WarningSummary, WarningTracker, WarningTrackerConfig,
};

// Re-exports - Source abstraction
pub use source::{
    parse_record, CsvMessageIter, CsvSource, MarketDataSource, SourceMetadata, SourceStats,
    VecSource,
};
