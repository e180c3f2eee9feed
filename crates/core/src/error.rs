//! Error types shared by the packing crates.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing, packing or refining an order.
#[derive(Debug, Error)]
pub enum Error {
    /// An order line or item has invalid dimensions or weight.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// A catalog entry has invalid dimensions or weight.
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Some item of the order fits no catalog container in any rotation.
    #[error("order cannot be packed: {0}")]
    Unpackable(String),

    /// Neither reordering nor container replacement produced a legal action.
    ///
    /// This means the catalog holds no container able to take some item and is a
    /// configuration defect rather than a runtime condition.
    #[error("no catalog container can take item {item}")]
    CatalogExhausted {
        /// Display name of the item that could not be placed.
        item: String,
    },

    /// A committed action was not legal for the current item.
    #[error("illegal action {action}: {reason}")]
    IllegalAction {
        /// Dense action id.
        action: usize,
        /// Why the action was rejected.
        reason: String,
    },

    /// The action id is outside the action space, or not a child of the search root.
    #[error("unknown action {0}")]
    UnknownAction(usize),

    /// An already placed item was asked to change.
    #[error("item {0} is already placed and cannot be modified")]
    ItemFrozen(String),

    /// The policy/value oracle failed.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Catalog or order data could not be parsed.
    #[cfg(feature = "serde")]
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Internal invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}
