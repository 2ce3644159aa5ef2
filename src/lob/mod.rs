//! Order book state machine.
//!
//! Aggregated price levels, T→F→C trade correlation and the event dispatcher
//! that ties them to the snapshot log.

pub mod price_level;
pub mod reconstructor;
pub mod trade_correlator;

pub use price_level::{PriceLevel, PriceLevelBook};
pub use reconstructor::{MbpConfig, MbpReconstructor, MbpStats, ModifyPolicy, DEFAULT_OUTPUT_PATH};
pub use trade_correlator::{
    CorrelatorStats, PendingTrade, ResolvedCancel, TradeCorrelator, TradeOutcome,
};
