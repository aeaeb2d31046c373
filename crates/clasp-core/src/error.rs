//! # Error Types
//!
//! Domain-specific error types for clasp-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  CoreError                                                              │
//! │  ├── configuration  NoActivePrice, InvalidPerInchRate, ...              │
//! │  │                  → the line must not be offered for sale             │
//! │  ├── cart           LineNotFound, CartTooLarge, QuantityTooLarge        │
//! │  ├── commit         InsufficientStock, UnresolvedComponents, Storage    │
//! │  │                  → abort the commit, re-preview                      │
//! │  └── Validation(ValidationError)                                        │
//! │                                                                         │
//! │  ConfigError        register.toml / environment problems                │
//! │                                                                         │
//! │  NOT errors: low stock, unmatched material. Those are                   │
//! │  ReconciliationWarning values and never block a preview.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, product type, etc.)
//! 3. Clamped conditions (oversized discounts) are defined behavior, not errors

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No active [`ChainProductPrice`](crate::types::ChainProductPrice) for
    /// the pair. The UI must not offer this chain as this product type.
    #[error("No active price for chain {inventory_item_id} as product type {product_type_id}")]
    NoActivePrice {
        inventory_item_id: String,
        product_type_id: String,
    },

    /// A per-inch chain with a rate of zero or less cannot be sold.
    #[error("Chain {inventory_item_id} has no per-inch rate")]
    InvalidPerInchRate { inventory_item_id: String },

    /// Per-inch sale lines are priced on a measured length, never on the
    /// product type's estimate.
    #[error("Chain {inventory_item_id} must be measured before it can be sold")]
    MeasurementRequired { inventory_item_id: String },

    /// A custom line was added without an operator-entered price.
    #[error("Custom item '{name}' needs a price")]
    CustomPriceRequired { name: String },

    /// The inventory row cannot be sold as the requested kind of line.
    #[error("{inventory_item_id} is not sellable: {reason}")]
    NotSellable {
        inventory_item_id: String,
        reason: String,
    },

    /// No cart line with this id.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    #[error("A sale holds at most {max} lines")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} is over the per-line limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The atomic draw at commit found less stock than the sale needs.
    ///
    /// ## User Workflow
    /// ```text
    /// Terminal A preview: 7 needed, 8 on hand  ✓
    /// Terminal B commits: draws 3 → 5 on hand
    /// Terminal A commits: draw 7 from 5
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "jr-gf-4mm", available: 5, requested: 7 }
    ///      │
    ///      ▼
    /// Sale stays open, operator sees a fresh preview
    /// ```
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// The register requires every component to be matched before commit.
    #[error("{count} cart line(s) have no matching jump ring set up")]
    UnresolvedComponents { count: usize },

    /// The stock ledger failed for a reason unrelated to quantities.
    #[error("Stock ledger error: {0}")]
    Storage(String),

    /// Bad operator input, surfaced through the cart or resolver.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input failures: operator entries, cart actions, config values.
///
/// `field` names the input as the operator sees it ("quantity", "tip",
/// "pricing.tax_rate_bps").
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero-length measurements, zero quantities.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Line ids that are not UUIDs.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A cart line id added twice.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Config Error
// =============================================================================

/// Register configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================
