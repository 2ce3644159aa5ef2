//! Core data types for MBO events and aggregated price levels.
//!
//! These types are designed to be:
//! - Small and `Copy` where the hot path allows it
//! - Exact as map keys (prices are fixed-point integers, not floats)
//! - Compatible with Databento-style MBO action and side codes

use serde::{Deserialize, Serialize};

/// Fixed-point scale for prices (1e9 = nanodollars, as in Databento).
pub const PRICE_SCALE: i64 = 1_000_000_000;

/// Depth of an MBP-10 snapshot.
pub const MBP_DEPTH: usize = 10;

/// Convert a decimal price to fixed-point, rounding to the nearest tick of 1e-9.
#[inline]
pub fn price_from_f64(price: f64) -> i64 {
    (price * PRICE_SCALE as f64).round() as i64
}

/// Convert a fixed-point price back to a decimal.
#[inline]
pub fn price_to_f64(price: i64) -> f64 {
    price as f64 / PRICE_SCALE as f64
}

/// MBO action type (what happened to the order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Action {
    /// Add new order to book
    Add = b'A',
    /// Modify existing order
    Modify = b'M',
    /// Cancel/remove order
    Cancel = b'C',
    /// Trade execution against a resting order
    Trade = b'T',
    /// Fill confirming the resting order's allocation
    Fill = b'F',
    /// Full book clear marker
    Clear = b'R',
    /// Any code this crate does not act on
    #[default]
    Other = 0,
}

impl Action {
    /// Parse action from its one-byte code.
    ///
    /// Unknown codes return `None`; callers map them to [`Action::Other`].
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Action::Add),
            b'M' => Some(Action::Modify),
            b'C' => Some(Action::Cancel),
            b'T' => Some(Action::Trade),
            b'F' => Some(Action::Fill),
            b'R' => Some(Action::Clear),
            _ => None,
        }
    }

    /// Whether dispatching this action always ends in a snapshot.
    #[inline]
    pub fn emits_snapshot(self) -> bool {
        matches!(self, Action::Add | Action::Modify | Action::Cancel)
    }
}

/// Order side (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional or undisclosed
    #[default]
    None = b'N',
}

impl Side {
    /// Parse side from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// The side resting liquidity sits on when `self` is the aggressor.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
            Side::None => Side::None,
        }
    }
}

/// Market By Order (MBO) event.
///
/// One parsed input record. The timestamp is kept as the original text so
/// it can be echoed into snapshots byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MboMessage {
    /// Event timestamp, opaque but ordered
    pub timestamp: String,

    /// Order action
    pub action: Action,

    /// Order side
    pub side: Side,

    /// Price in fixed-point format (divide by 1e9 for dollars)
    pub price: i64,

    /// Order size in shares/contracts
    pub size: u32,

    /// Order identifier
    pub order_id: u64,

    /// Venue sequence number
    pub sequence: u64,
}

impl MboMessage {
    /// Create a new MBO message with an empty timestamp and sequence 0.
    pub fn new(order_id: u64, action: Action, side: Side, price: i64, size: u32) -> Self {
        Self {
            timestamp: String::new(),
            action,
            side,
            price,
            size,
            order_id,
            sequence: 0,
        }
    }

    /// Create with timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Create with sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Get price as floating point dollars.
    #[inline]
    pub fn price_as_f64(&self) -> f64 {
        price_to_f64(self.price)
    }
}

/// Resting order information, kept only when modify tracking is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: i64,
    pub size: u32,
}
