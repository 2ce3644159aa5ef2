//! Single-symbol MBO → MBP reconstructor.
//!
//! Dispatches each event by action to the price-level book and the trade
//! correlator, and appends a snapshot to the output log whenever the book
//! may have changed:
//!
//! | Action | Book | Snapshot |
//! |--------|------|----------|
//! | Add | add at side/price | event's ts/seq |
//! | Modify | replace at side/price | event's ts/seq |
//! | Cancel | via [`TradeCorrelator::on_cancel`] | resolved ts/seq |
//! | Trade | none (tracked) | none |
//! | Fill | none | none |
//! | Clear | skipped | none |
//! | Other | none | none |

use ahash::AHashMap;
use std::path::PathBuf;

use crate::error::{MbpError, Result};
use crate::lob::price_level::PriceLevelBook;
use crate::lob::trade_correlator::{TradeCorrelator, TradeOutcome};
use crate::snapshot::{MbpSnapshot, SnapshotLog};
use crate::source::MarketDataSource;
use crate::types::{Action, MboMessage, Order, Side, MBP_DEPTH};
use crate::warnings::{Warning, WarningCategory, WarningTracker};

/// Default output file for the command-line tool.
pub const DEFAULT_OUTPUT_PATH: &str = "mbp_output.csv";

/// How Modify events treat the order's previously resting size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifyPolicy {
    /// Only add the new size; the previous size is never removed (default)
    #[default]
    AddOnly,

    /// Track each order's resting side/price/size and remove it before
    /// adding the modified size
    ReplaceResting,
}

/// Configuration for reconstructor behavior.
#[derive(Debug, Clone)]
pub struct MbpConfig {
    /// Number of price levels per side in each snapshot
    pub levels: usize,

    /// How to handle Modify events
    pub modify_policy: ModifyPolicy,

    /// Whether to record anomalies in the warning tracker
    pub track_warnings: bool,

    /// Where the command-line tool writes its output
    pub output_path: PathBuf,
}

impl Default for MbpConfig {
    fn default() -> Self {
        Self {
            levels: MBP_DEPTH,
            modify_policy: ModifyPolicy::AddOnly,
            track_warnings: true,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl MbpConfig {
    /// Create a new config with specified number of levels.
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            ..Default::default()
        }
    }

    /// Set modify handling policy.
    pub fn with_modify_policy(mut self, policy: ModifyPolicy) -> Self {
        self.modify_policy = policy;
        self
    }

    /// Enable/disable warning tracking.
    pub fn with_warnings(mut self, track: bool) -> Self {
        self.track_warnings = track;
        self
    }

    /// Set the output file path.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Reject configurations that cannot produce a meaningful snapshot.
    pub fn validate(&self) -> Result<()> {
        if self.levels == 0 {
            return Err(MbpError::InvalidConfig(
                "levels must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics for monitoring a run.
#[derive(Debug, Clone, Default)]
pub struct MbpStats {
    /// Total messages handed to `process_message`
    pub messages_processed: u64,

    /// Snapshots appended to the log
    pub snapshots_emitted: u64,

    /// Clear markers filtered before dispatch
    pub clears_skipped: u64,

    pub adds: u64,
    pub modifies: u64,
    pub cancels: u64,
    pub trades: u64,
    pub fills: u64,

    /// Events with an action the reconstructor does not act on
    pub ignored: u64,

    /// Cancels that completed a T→F→C sequence
    pub correlated_cancels: u64,

    /// Cancels whose target level did not exist
    pub missing_level_cancels: u64,

    /// Number of price levels (bid side)
    pub bid_levels: usize,

    /// Number of price levels (ask side)
    pub ask_levels: usize,

    /// Trades awaiting their Cancel
    pub pending_trades: usize,
}

/// Single-symbol MBP reconstructor.
///
/// Owns the price-level book, the trade correlator and the append-only
/// snapshot log. Processing is strictly sequential: each call completes,
/// including its snapshot, before the next begins.
#[derive(Debug, Clone)]
pub struct MbpReconstructor {
    config: MbpConfig,
    book: PriceLevelBook,
    correlator: TradeCorrelator,
    snapshots: SnapshotLog,

    /// order_id -> resting order, only populated under `ReplaceResting`
    orders: AHashMap<u64, Order>,

    warnings: WarningTracker,
    stats: MbpStats,
}

impl Default for MbpReconstructor {
    fn default() -> Self {
        Self::new(MBP_DEPTH)
    }
}

impl MbpReconstructor {
    /// Create a new reconstructor emitting `levels` levels per side.
    ///
    /// A depth of zero is raised to one; use [`with_config`](Self::with_config)
    /// to have it rejected instead.
    ///
    /// # Example
    /// ```
    /// use mbo_mbp_reconstructor::MbpReconstructor;
    ///
    /// let mbp = MbpReconstructor::new(10);
    /// assert!(mbp.snapshots().is_empty());
    /// ```
    pub fn new(levels: usize) -> Self {
        Self::build(MbpConfig::new(levels.max(1)))
    }

    /// Create a new reconstructor with custom configuration.
    ///
    /// # Example
    /// ```
    /// use mbo_mbp_reconstructor::{MbpConfig, MbpReconstructor, ModifyPolicy};
    ///
    /// let config = MbpConfig::new(10).with_modify_policy(ModifyPolicy::ReplaceResting);
    /// let mbp = MbpReconstructor::with_config(config).unwrap();
    /// assert_eq!(mbp.levels(), 10);
    /// ```
    ///
    /// # Errors
    /// `MbpError::InvalidConfig` if the configuration fails validation.
    pub fn with_config(config: MbpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MbpConfig) -> Self {
        let levels = config.levels;
        Self {
            config,
            book: PriceLevelBook::new(),
            correlator: TradeCorrelator::new(),
            snapshots: SnapshotLog::new(levels),
            orders: AHashMap::new(),
            warnings: WarningTracker::new(),
            stats: MbpStats::default(),
        }
    }

    /// Get the number of price levels per side.
    #[inline]
    pub fn levels(&self) -> usize {
        self.config.levels
    }

    /// Get a reference to the current configuration.
    #[inline]
    pub fn config(&self) -> &MbpConfig {
        &self.config
    }

    /// Process a single MBO event.
    ///
    /// Returns the snapshot it emitted, if any. Clear markers are filtered
    /// here and never reach dispatch.
    pub fn process_message(&mut self, msg: &MboMessage) -> Option<&MbpSnapshot> {
        self.stats.messages_processed += 1;

        match msg.action {
            Action::Clear => self.stats.clears_skipped += 1,
            Action::Add => self.add_order(msg),
            Action::Modify => self.modify_order(msg),
            Action::Cancel => self.cancel_order(msg),
            Action::Trade => self.process_trade(msg),
            Action::Fill => self.process_fill(msg),
            Action::Other => {
                self.stats.ignored += 1;
                self.warn(
                    Warning::new(
                        WarningCategory::UnknownAction,
                        format!("Ignored event for order {}", msg.order_id),
                    )
                    .with_order_id(msg.order_id)
                    .with_sequence(msg.sequence),
                );
            }
        }

        self.refresh_stats();
        if msg.action.emits_snapshot() {
            self.stats.snapshots_emitted += 1;
            self.snapshots.last()
        } else {
            None
        }
    }

    /// Drive every message from `source` through the reconstructor.
    ///
    /// Returns the number of snapshots emitted by this source.
    pub fn process_source<S: MarketDataSource>(&mut self, source: S) -> Result<u64> {
        let before = self.stats.snapshots_emitted;
        let label = source.metadata().label();

        for msg in source.messages()? {
            self.process_message(&msg?);
        }

        let emitted = self.stats.snapshots_emitted - before;
        log::info!(
            "Processed {} from {label}: {} snapshots, {} pending trades left open",
            self.stats.messages_processed,
            emitted,
            self.correlator.pending_count()
        );
        Ok(emitted)
    }

    fn add_order(&mut self, msg: &MboMessage) {
        self.stats.adds += 1;
        self.book.add_liquidity(msg.side, msg.price, msg.size);

        if self.tracks_orders() && msg.side != Side::None {
            self.orders.insert(
                msg.order_id,
                Order {
                    side: msg.side,
                    price: msg.price,
                    size: msg.size,
                },
            );
        }

        self.emit(msg.timestamp.clone(), msg.sequence);
    }

    fn modify_order(&mut self, msg: &MboMessage) {
        self.stats.modifies += 1;

        let previous = if self.tracks_orders() {
            self.orders.remove(&msg.order_id)
        } else {
            None
        };

        match previous {
            Some(old) if old.side == msg.side && old.price == msg.price => {
                self.book
                    .replace_liquidity(msg.side, msg.price, old.size, msg.size);
            }
            Some(old) => {
                // Price or side moved: pull the old resting size first
                self.book.remove_liquidity(old.side, old.price, old.size);
                self.book.add_liquidity(msg.side, msg.price, msg.size);
            }
            None => {
                self.book.replace_liquidity(msg.side, msg.price, 0, msg.size);
            }
        }

        if self.tracks_orders() && msg.side != Side::None && msg.size > 0 {
            self.orders.insert(
                msg.order_id,
                Order {
                    side: msg.side,
                    price: msg.price,
                    size: msg.size,
                },
            );
        }

        self.emit(msg.timestamp.clone(), msg.sequence);
    }

    fn cancel_order(&mut self, msg: &MboMessage) {
        self.stats.cancels += 1;

        let resolved = self.correlator.on_cancel(msg);
        if resolved.correlated {
            self.stats.correlated_cancels += 1;
        }

        let removed = self
            .book
            .remove_liquidity(resolved.side, resolved.price, resolved.size);
        if !removed {
            self.stats.missing_level_cancels += 1;
            self.warn(
                Warning::new(
                    WarningCategory::MissingLevel,
                    format!(
                        "Cancel for order {} found no {:?} level at {:.4}",
                        msg.order_id,
                        resolved.side,
                        msg.price_as_f64()
                    ),
                )
                .with_order_id(msg.order_id)
                .with_price(msg.price)
                .with_timestamp(msg.timestamp.clone())
                .with_sequence(msg.sequence),
            );
        }

        if self.tracks_orders() {
            self.reduce_tracked_order(msg.order_id, msg.size);
        }

        self.emit(resolved.timestamp, resolved.sequence);
    }

    fn process_trade(&mut self, msg: &MboMessage) {
        self.stats.trades += 1;

        match self.correlator.on_trade(msg) {
            TradeOutcome::Tracked => {}
            TradeOutcome::Overwrote(previous) => self.warn(
                Warning::new(
                    WarningCategory::OverwrittenTrade,
                    format!(
                        "Trade for order {} replaced pending trade from seq {}",
                        msg.order_id, previous.sequence
                    ),
                )
                .with_order_id(msg.order_id)
                .with_timestamp(msg.timestamp.clone())
                .with_sequence(msg.sequence),
            ),
            TradeOutcome::Untracked => self.warn(
                Warning::new(
                    WarningCategory::UntrackedTrade,
                    format!("Trade for order {} has no side", msg.order_id),
                )
                .with_order_id(msg.order_id)
                .with_sequence(msg.sequence),
            ),
        }
    }

    fn process_fill(&mut self, msg: &MboMessage) {
        self.stats.fills += 1;

        if !self.correlator.on_fill(msg.order_id) {
            log::debug!(
                "Fill for order {} (seq {}) without pending trade",
                msg.order_id,
                msg.sequence
            );
            self.warn(
                Warning::new(
                    WarningCategory::OrphanFill,
                    format!("Fill for order {} without pending trade", msg.order_id),
                )
                .with_order_id(msg.order_id)
                .with_sequence(msg.sequence),
            );
        }
    }

    #[inline]
    fn tracks_orders(&self) -> bool {
        self.config.modify_policy == ModifyPolicy::ReplaceResting
    }

    fn reduce_tracked_order(&mut self, order_id: u64, size: u32) {
        if let Some(order) = self.orders.get_mut(&order_id) {
            if order.size > size {
                order.size -= size;
            } else {
                self.orders.remove(&order_id);
            }
        }
    }

    #[inline]
    fn emit(&mut self, timestamp: String, sequence: u64) {
        self.snapshots.emit(&self.book, timestamp, sequence);
    }

    fn warn(&mut self, warning: Warning) {
        if self.config.track_warnings {
            self.warnings.record(warning);
        }
    }

    #[inline(always)]
    fn refresh_stats(&mut self) {
        self.stats.bid_levels = self.book.bid_levels();
        self.stats.ask_levels = self.book.ask_levels();
        self.stats.pending_trades = self.correlator.pending_count();
    }

    /// Flush the snapshot log to the configured output path.
    pub fn write_output(&self) -> Result<()> {
        self.snapshots.write_csv(&self.config.output_path)
    }

    /// The price-level book.
    #[inline]
    pub fn book(&self) -> &PriceLevelBook {
        &self.book
    }

    /// The trade correlator.
    #[inline]
    pub fn correlator(&self) -> &TradeCorrelator {
        &self.correlator
    }

    /// The snapshot log.
    #[inline]
    pub fn snapshots(&self) -> &SnapshotLog {
        &self.snapshots
    }

    /// Recorded warnings.
    #[inline]
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Get current statistics.
    pub fn stats(&self) -> &MbpStats {
        &self.stats
    }

    /// Get number of tracked resting orders (`ReplaceResting` only).
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Reset to an empty book, empty log and zeroed counters.
    pub fn reset(&mut self) {
        self.book.clear();
        self.correlator.reset();
        self.snapshots.clear();
        self.orders.clear();
        self.warnings.clear();
        self.stats = MbpStats::default();
    }
}
