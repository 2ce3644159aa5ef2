//! Warning tracking for MBO → MBP reconstruction.
//!
//! The reconstructor never rejects an event: orphan fills, untracked trades
//! and cancels against missing levels are all legal no-ops. They are still
//! worth knowing about when a run's output looks wrong, so they are
//! categorised and counted here without changing book behaviour.
//!
//! # Example
//!
//! ```
//! use mbo_mbp_reconstructor::warnings::{Warning, WarningCategory, WarningTracker};
//!
//! let mut tracker = WarningTracker::new();
//! tracker.record(
//!     Warning::new(WarningCategory::OrphanFill, "Fill without pending trade")
//!         .with_order_id(42)
//!         .with_sequence(7),
//! );
//!
//! let summary = tracker.summary();
//! assert_eq!(summary.total, 1);
//! assert_eq!(summary.unique_orders, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Fill arrived with no pending trade for its order id
    OrphanFill,

    /// Trade with side `N`, never correlated
    UntrackedTrade,

    /// Trade replaced an unconsumed pending trade for the same order id
    OverwrittenTrade,

    /// Cancel targeted a price with no resting level
    MissingLevel,

    /// Action code the reconstructor does not act on
    UnknownAction,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::OrphanFill => "ORPHAN_FILL",
            WarningCategory::UntrackedTrade => "UNTRACKED_TRADE",
            WarningCategory::OverwrittenTrade => "OVERWRITTEN_TRADE",
            WarningCategory::MissingLevel => "MISSING_LEVEL",
            WarningCategory::UnknownAction => "UNKNOWN_ACTION",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::OrphanFill => 1,
            WarningCategory::UntrackedTrade => 1,
            WarningCategory::UnknownAction => 1,
            WarningCategory::MissingLevel => 2,
            // Loses the first trade's price/size/timestamp
            WarningCategory::OverwrittenTrade => 3,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Position in the tracker (1-based, assigned on record)
    pub id: u64,

    /// Warning category
    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Event timestamp as it appeared in the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Related order ID (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,

    /// Related price (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    /// Event sequence number (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl Warning {
    /// Create a new warning with minimal information.
    pub fn new(category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            category,
            message: message.into(),
            timestamp: None,
            order_id: None,
            price: None,
            sequence: None,
        }
    }

    /// Set the event timestamp.
    pub fn with_timestamp(mut self, ts: impl Into<String>) -> Self {
        self.timestamp = Some(ts.into());
        self
    }

    /// Set the order ID.
    pub fn with_order_id(mut self, order_id: u64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Set the price.
    pub fn with_price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings (including ones past the storage cap)
    pub total: u64,

    /// Count by category name
    pub by_category: BTreeMap<String, u64>,

    /// Count by severity
    pub by_severity: BTreeMap<u8, u64>,

    /// Number of unique order IDs involved
    pub unique_orders: u64,
}

/// Configuration for warning tracker.
#[derive(Debug, Clone)]
pub struct WarningTrackerConfig {
    /// Maximum number of warnings to keep in memory
    pub max_warnings: usize,

    /// Whether to emit each recorded warning through `log`
    pub log_warnings: bool,

    /// Minimum severity to log (1=all, 2=medium+, 3=high only)
    pub min_log_severity: u8,
}

impl Default for WarningTrackerConfig {
    fn default() -> Self {
        Self {
            max_warnings: 100_000,
            log_warnings: true,
            min_log_severity: 3,
        }
    }
}

/// Categorised warning store with bounded memory.
#[derive(Debug, Clone, Default)]
pub struct WarningTracker {
    config: WarningTrackerConfig,
    warnings: Vec<Warning>,
    category_counts: BTreeMap<WarningCategory, u64>,
    unique_orders: HashSet<u64>,
}

impl WarningTracker {
    /// Create a new warning tracker with default configuration.
    pub fn new() -> Self {
        Self::with_config(WarningTrackerConfig::default())
    }

    /// Create a new warning tracker with custom configuration.
    pub fn with_config(config: WarningTrackerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record a warning and return its id.
    ///
    /// Past `max_warnings` only the counters are updated.
    pub fn record(&mut self, mut warning: Warning) -> u64 {
        let count = self.category_counts.entry(warning.category).or_insert(0);
        *count += 1;
        warning.id = self.total_count();

        if self.config.log_warnings && warning.category.severity() >= self.config.min_log_severity
        {
            log::warn!(
                "[{}] #{}: {}",
                warning.category.name(),
                warning.id,
                warning.message
            );
        }

        if let Some(order_id) = warning.order_id {
            self.unique_orders.insert(order_id);
        }

        let id = warning.id;
        if self.warnings.len() < self.config.max_warnings {
            self.warnings.push(warning);
        }
        id
    }

    /// Get the number of warnings stored.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Check if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.category_counts.is_empty()
    }

    /// Get total count including warnings past the storage cap.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Get count for a specific category.
    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Get all stored warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Get summary statistics.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            unique_orders: self.unique_orders.len() as u64,
        }
    }

    /// Clear all warnings.
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.category_counts.clear();
        self.unique_orders.clear();
    }
}
