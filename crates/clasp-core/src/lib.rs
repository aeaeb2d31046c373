//! # clasp-core: Pricing & Component Reconciliation for Clasp POS
//!
//! Point-of-sale engine for a permanent-jewelry studio. Chains are sold as
//! bracelets, anklets or necklaces, either at a fixed price per product
//! type or by the inch; charms and connectors are added on. Every piece
//! quietly consumes jump rings, which this crate matches against inventory.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Clasp POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Register UI                                  │    │
//! │  │    Pick chain ──► Measure ──► Add charms ──► Review ──► Pay     │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ CartAction                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ clasp-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │  pricing  │  │ discount  │  │   cart    │  │ reconcile │    │    │
//! │  │   │ per piece │  │ flat / %  │  │  reducer  │  │ jump rings│    │    │
//! │  │   │ per inch  │  │  clamped  │  │  totals   │  │ warnings  │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   checkout::StockLedger  ◄── the only seam that touches stock   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    Storage (implements StockLedger)             │    │
//! │  │              inventory rows, atomic conditional draw            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent Money and the one rounding rule
//! - [`types`] - Inventory rows, product types, rates, lengths, discounts
//! - [`pricing`] - Unit price for a sellable unit
//! - [`discount`] - Line totals under a flat or percent discount
//! - [`cart`] - Cart state, actions and the totals breakdown
//! - [`reconcile`] - Jump-ring needs matched by material
//! - [`warnings`] - Low-stock and needs-setup advisories
//! - [`checkout`] - Commit-time re-reconciliation and stock draw
//! - [`config`] - Register settings from TOML and environment
//! - [`validation`], [`error`]
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: cents in `i64`, rates in basis points, lengths in
//!    hundredths of an inch
//! 2. **Round Once**: half away from zero, once per derived field
//! 3. **Immutable Cart**: every action returns a new cart and fresh totals
//! 4. **Advise, Then Enforce**: previews warn, only the ledger draw refuses
//!
//! ## Example Usage
//!
//! ```rust
//! use clasp_core::cart::{Cart, CartAction};
//! use clasp_core::money::Money;
//! use clasp_core::types::{FeeHandling, Rate};
//!
//! let cart = Cart::new(Rate::from_bps(800), Some(Rate::from_bps(500)), FeeHandling::Absorb);
//! let snapshot = cart.apply(CartAction::SetTip { amount: Money::from_cents(1000) }).unwrap();
//!
//! assert!(snapshot.cart.is_empty());
//! assert_eq!(snapshot.totals.total.cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod config;
pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod reconcile;
pub mod types;
pub mod validation;
pub mod warnings;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{recompute, Cart, CartAction, CartItem, CartSnapshot, CartTotals};
pub use checkout::{commit_components, CheckoutPolicy, CommitOutcome, MemoryLedger, StockLedger};
pub use config::RegisterConfig;
pub use error::{ConfigError, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconcile::{reconcile, JumpRingResolution};
pub use types::*;
pub use warnings::{format_warnings, ReconciliationWarning};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used when a register has not been assigned one.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price, tip or catalog price accepted: $1,000,000.00.
///
/// Keeps `price × quantity` summed over a full cart well inside `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;

/// Longest chain an operator can enter: 100 inches.
pub const MAX_MEASURED_INCHES: Inches = Inches::from_hundredths(10_000);
