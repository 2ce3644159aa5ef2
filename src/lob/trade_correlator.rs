//! Trade → Fill → Cancel correlation.
//!
//! Many MBO feeds report one execution as three events sharing an order id:
//!
//! 1. **Trade** (`T`) announcing the execution, with the *aggressor's* side
//!    (or `N` when the venue does not disclose it)
//! 2. **Fill** (`F`) confirming the resting order's allocation
//! 3. **Cancel** (`C`) that actually removes the consumed resting liquidity
//!
//! The correlator defers every book mutation until the Cancel arrives. The
//! consumed liquidity rests on the side opposite the aggressor, so that is
//! the side the Cancel is applied to. The snapshot produced by the Cancel
//! carries the Trade's timestamp and sequence, not its own.
//!
//! # States per order id
//!
//! ```text
//!   Idle ──T(B|A)──▶ TradeSeen ──F──▶ FillSeen
//!     ▲                 │                │
//!     └──────C──────────┴───────C────────┘   (entry consumed)
//! ```
//!
//! A second Trade for an order id that is still pending overwrites the first.
//!
//! # Example
//!
//! ```
//! use mbo_mbp_reconstructor::lob::TradeCorrelator;
//! use mbo_mbp_reconstructor::{Action, MboMessage, Side};
//!
//! let mut correlator = TradeCorrelator::new();
//!
//! let trade = MboMessage::new(7, Action::Trade, Side::Bid, 50_000_000_000, 3)
//!     .with_timestamp("T1")
//!     .with_sequence(10);
//! assert!(correlator.on_trade(&trade).is_tracked());
//! assert!(correlator.on_fill(7));
//!
//! let cancel = MboMessage::new(7, Action::Cancel, Side::Ask, 50_000_000_000, 3)
//!     .with_timestamp("T9")
//!     .with_sequence(99);
//! let resolved = correlator.on_cancel(&cancel);
//! assert!(resolved.correlated);
//! assert_eq!(resolved.side, Side::Ask);
//! assert_eq!(resolved.timestamp, "T1");
//! assert_eq!(resolved.sequence, 10);
//! ```

use ahash::AHashMap;

use crate::types::{MboMessage, Side};

/// A Trade awaiting its completing Cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTrade {
    /// Timestamp of the Trade event
    pub timestamp: String,
    /// Aggressor side reported on the Trade event
    pub original_side: Side,
    /// Trade price (fixed-point)
    pub price: i64,
    /// Trade size
    pub size: u32,
    /// Sequence number of the Trade event
    pub sequence: u64,
    /// A Fill for this order id has been seen
    pub fill_seen: bool,
    /// The completing Cancel has been seen
    pub cancel_seen: bool,
}

impl PendingTrade {
    fn from_trade(msg: &MboMessage) -> Self {
        Self {
            timestamp: msg.timestamp.clone(),
            original_side: msg.side,
            price: msg.price,
            size: msg.size,
            sequence: msg.sequence,
            fill_seen: false,
            cancel_seen: false,
        }
    }

    /// Side that holds the liquidity this trade consumed.
    #[inline]
    pub fn resting_side(&self) -> Side {
        self.original_side.opposite()
    }
}

/// What happened to a Trade event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Newly tracked
    Tracked,
    /// Tracked, replacing an unconsumed pending trade for the same order id
    Overwrote(PendingTrade),
    /// Side `N`: never correlated
    Untracked,
}

impl TradeOutcome {
    /// Whether the trade is now pending.
    #[inline]
    pub fn is_tracked(&self) -> bool {
        !matches!(self, TradeOutcome::Untracked)
    }
}

/// The book mutation and snapshot metadata a Cancel resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCancel {
    /// Side to remove liquidity from
    pub side: Side,
    /// Price to remove at (always the Cancel's own price)
    pub price: i64,
    /// Size to remove (always the Cancel's own size)
    pub size: u32,
    /// Timestamp the snapshot must carry
    pub timestamp: String,
    /// Sequence the snapshot must carry
    pub sequence: u64,
    /// True when the Cancel completed a T→F→C sequence
    pub correlated: bool,
}

/// Counters for the correlator.
#[derive(Debug, Clone, Default)]
pub struct CorrelatorStats {
    pub trades_tracked: u64,
    pub trades_untracked: u64,
    pub trades_overwritten: u64,
    pub fills_matched: u64,
    pub fills_orphaned: u64,
    pub cancels_correlated: u64,
    pub cancels_plain: u64,
}

/// Per-order-id T→F→C state tracker.
#[derive(Debug, Clone, Default)]
pub struct TradeCorrelator {
    pending: AHashMap<u64, PendingTrade>,
    stats: CorrelatorStats,
}

impl TradeCorrelator {
    /// Create an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a Trade event.
    ///
    /// Only trades with a concrete side are tracked. Tracking replaces any
    /// pending trade for the same order id rather than merging with it.
    pub fn on_trade(&mut self, msg: &MboMessage) -> TradeOutcome {
        if msg.side == Side::None {
            self.stats.trades_untracked += 1;
            return TradeOutcome::Untracked;
        }

        self.stats.trades_tracked += 1;
        match self.pending.insert(msg.order_id, PendingTrade::from_trade(msg)) {
            Some(previous) => {
                self.stats.trades_overwritten += 1;
                log::debug!(
                    "Pending trade for order {} overwritten (seq {} -> {})",
                    msg.order_id,
                    previous.sequence,
                    msg.sequence
                );
                TradeOutcome::Overwrote(previous)
            }
            None => TradeOutcome::Tracked,
        }
    }

    /// Record a Fill event. Returns `false` when no trade is pending.
    pub fn on_fill(&mut self, order_id: u64) -> bool {
        match self.pending.get_mut(&order_id) {
            Some(trade) => {
                trade.fill_seen = true;
                self.stats.fills_matched += 1;
                true
            }
            None => {
                self.stats.fills_orphaned += 1;
                false
            }
        }
    }

    /// Resolve a Cancel event, consuming the pending trade if one exists.
    ///
    /// Correlated cancels apply the Cancel's price and size to the side
    /// opposite the trade's aggressor, stamped with the trade's timestamp
    /// and sequence. Anything else is a plain cancel on the event's own
    /// side, stamped with its own timestamp and sequence.
    pub fn on_cancel(&mut self, msg: &MboMessage) -> ResolvedCancel {
        match self.pending.remove(&msg.order_id) {
            Some(mut trade) => {
                trade.cancel_seen = true;
                self.stats.cancels_correlated += 1;
                ResolvedCancel {
                    side: trade.resting_side(),
                    price: msg.price,
                    size: msg.size,
                    timestamp: trade.timestamp,
                    sequence: trade.sequence,
                    correlated: true,
                }
            }
            None => {
                self.stats.cancels_plain += 1;
                ResolvedCancel {
                    side: msg.side,
                    price: msg.price,
                    size: msg.size,
                    timestamp: msg.timestamp.clone(),
                    sequence: msg.sequence,
                    correlated: false,
                }
            }
        }
    }

    /// Pending trade for `order_id`, if any.
    #[inline]
    pub fn pending(&self, order_id: u64) -> Option<&PendingTrade> {
        self.pending.get(&order_id)
    }

    /// Number of trades awaiting their Cancel.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CorrelatorStats {
        &self.stats
    }

    /// Forget all pending trades and counters.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.stats = CorrelatorStats::default();
    }
}
