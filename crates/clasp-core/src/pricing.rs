//! # Line Pricing Resolver
//!
//! Computes the unit price of one sellable unit.
//!
//! ## Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Chain Gets Its Price                           │
//! │                                                                         │
//! │  PER_PRODUCT                         PER_INCH                           │
//! │  ───────────                         ────────                           │
//! │  (chain, product type)               chain.sell_price = rate per inch   │
//! │        │                                   │                            │
//! │        ▼                                   ├── before measuring:        │
//! │  active ChainProductPrice                  │   rate × default_inches    │
//! │        │                                   │   shown as "~$15.00"       │
//! │        ├── found → sell_price              │   (PriceEstimate only)     │
//! │        └── none  → NoActivePrice           │                            │
//! │                                            └── at sale:                 │
//! │                                                rate × measured inches   │
//! │                                                (ResolvedPrice)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver never guesses: a chain with no active price row, or a
//! per-inch chain with no positive rate, is an error and must not be offered.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ChainProductPrice, Inches, InventoryItem, ItemType, PricingMode, ProductType};
use crate::validation::{validate_amount, validate_item_name, validate_measured_inches};

// =============================================================================
// Sellable Units
// =============================================================================

/// Something an operator can ring up.
#[derive(Debug, Clone, Copy)]
pub enum SellableUnit<'a> {
    /// A chain finished as a product type (bracelet, anklet, ...).
    Chain {
        chain: &'a InventoryItem,
        product_type: &'a ProductType,
    },
    Charm(&'a InventoryItem),
    Connector(&'a InventoryItem),
    /// A line with no inventory behind it. The operator must type a price.
    Custom { name: &'a str, price: Option<Money> },
}

/// A unit price that a sale line may be created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedPrice {
    pub unit_price: Money,
    /// The measurement a per-inch price was computed from.
    pub measured_inches: Option<Inches>,
}

/// A display-only price shown before measuring.
///
/// Deliberately a separate type from [`ResolvedPrice`]: nothing in the cart
/// accepts an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceEstimate {
    pub amount: Money,
    /// Length the estimate assumes, if length matters for this chain.
    pub inches: Option<Inches>,
    /// True for per-inch estimates; rendered with a `~` prefix.
    pub approximate: bool,
}

impl fmt::Display for PriceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.approximate {
            write!(f, "~{}", self.amount)
        } else {
            write!(f, "{}", self.amount)
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Finds the active price row for a (chain, product type) pair.
///
/// At most one active row per pair is expected; the first is used.
pub fn find_active_price<'a>(
    price_table: &'a [ChainProductPrice],
    inventory_item_id: &str,
    product_type_id: &str,
) -> Option<&'a ChainProductPrice> {
    price_table.iter().find(|p| {
        p.is_active
            && p.inventory_item_id == inventory_item_id
            && p.product_type_id == product_type_id
    })
}

/// `round2(rate × inches)`.
///
/// ```rust
/// use clasp_core::money::Money;
/// use clasp_core::pricing::per_inch_price;
/// use clasp_core::types::Inches;
///
/// let price = per_inch_price(Money::from_cents(200), Inches::from_f64(18.5));
/// assert_eq!(price.cents(), 3700);
/// ```
pub fn per_inch_price(rate: Money, inches: Inches) -> Money {
    rate.scale(inches.hundredths() as i64, 100)
}

fn ensure_kind(item: &InventoryItem, expected: ItemType) -> CoreResult<()> {
    if item.item_type != expected {
        return Err(CoreError::NotSellable {
            inventory_item_id: item.id.clone(),
            reason: format!("expected {:?}, found {:?}", expected, item.item_type),
        });
    }
    if !item.is_active {
        return Err(CoreError::NotSellable {
            inventory_item_id: item.id.clone(),
            reason: "item is inactive".to_string(),
        });
    }
    Ok(())
}

fn per_inch_rate(chain: &InventoryItem) -> CoreResult<Money> {
    if !chain.sell_price.is_positive() {
        return Err(CoreError::InvalidPerInchRate {
            inventory_item_id: chain.id.clone(),
        });
    }
    Ok(chain.sell_price)
}

fn fixed_chain_price<'a>(
    chain: &InventoryItem,
    product_type: &ProductType,
    price_table: &'a [ChainProductPrice],
) -> CoreResult<&'a ChainProductPrice> {
    find_active_price(price_table, &chain.id, &product_type.id).ok_or_else(|| {
        CoreError::NoActivePrice {
            inventory_item_id: chain.id.clone(),
            product_type_id: product_type.id.clone(),
        }
    })
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves the unit price of a sale line.
///
/// `measured_inches` is required for per-inch chains and ignored by
/// everything else except being carried along on chain lines.
///
/// ## Errors
/// - [`CoreError::NoActivePrice`] - per-product chain without an active row
/// - [`CoreError::InvalidPerInchRate`] - per-inch chain with rate ≤ 0
/// - [`CoreError::MeasurementRequired`] - per-inch chain, no measurement
/// - [`CoreError::CustomPriceRequired`] - custom line without a price
/// - [`CoreError::NotSellable`] - wrong item type or inactive item
pub fn resolve_unit_price(
    unit: &SellableUnit<'_>,
    price_table: &[ChainProductPrice],
    measured_inches: Option<Inches>,
) -> CoreResult<ResolvedPrice> {
    let resolved = match *unit {
        SellableUnit::Chain {
            chain,
            product_type,
        } => {
            ensure_kind(chain, ItemType::Chain)?;
            match chain.pricing_mode {
                PricingMode::PerProduct => {
                    let row = fixed_chain_price(chain, product_type, price_table)?;
                    ResolvedPrice {
                        unit_price: row.sell_price,
                        measured_inches,
                    }
                }
                PricingMode::PerInch => {
                    let rate = per_inch_rate(chain)?;
                    let inches = measured_inches.ok_or_else(|| CoreError::MeasurementRequired {
                        inventory_item_id: chain.id.clone(),
                    })?;
                    validate_measured_inches(inches)?;
                    ResolvedPrice {
                        unit_price: per_inch_price(rate, inches),
                        measured_inches: Some(inches),
                    }
                }
            }
        }
        SellableUnit::Charm(item) => {
            ensure_kind(item, ItemType::Charm)?;
            validate_amount("price", item.sell_price)?;
            ResolvedPrice {
                unit_price: item.sell_price,
                measured_inches: None,
            }
        }
        SellableUnit::Connector(item) => {
            ensure_kind(item, ItemType::Connector)?;
            validate_amount("price", item.sell_price)?;
            ResolvedPrice {
                unit_price: item.sell_price,
                measured_inches: None,
            }
        }
        SellableUnit::Custom { name, price } => {
            validate_item_name(name)?;
            let price = price.ok_or_else(|| CoreError::CustomPriceRequired {
                name: name.to_string(),
            })?;
            validate_amount("price", price)?;
            ResolvedPrice {
                unit_price: price,
                measured_inches: None,
            }
        }
    };

    debug!(unit_price = %resolved.unit_price, inches = ?resolved.measured_inches, "Resolved unit price");
    Ok(resolved)
}

/// Prices a chain as a product type before it is measured.
///
/// Per-product chains return their fixed price (not approximate). Per-inch
/// chains return `rate × default_inches`, flagged approximate.
pub fn estimate_price(
    chain: &InventoryItem,
    product_type: &ProductType,
    price_table: &[ChainProductPrice],
) -> CoreResult<PriceEstimate> {
    ensure_kind(chain, ItemType::Chain)?;
    match chain.pricing_mode {
        PricingMode::PerProduct => {
            let row = fixed_chain_price(chain, product_type, price_table)?;
            Ok(PriceEstimate {
                amount: row.sell_price,
                inches: Some(row.default_inches.unwrap_or(product_type.default_inches)),
                approximate: false,
            })
        }
        PricingMode::PerInch => {
            let rate = per_inch_rate(chain)?;
            let inches = product_type.default_inches;
            Ok(PriceEstimate {
                amount: per_inch_price(rate, inches),
                inches: Some(inches),
                approximate: true,
            })
        }
    }
}

/// Product types a chain may be offered as, in display order.
///
/// Per-product chains offer only types with an active price row; per-inch
/// chains offer every active type as long as their rate is positive.
pub fn sellable_product_types<'a>(
    chain: &InventoryItem,
    product_types: &'a [ProductType],
    price_table: &[ChainProductPrice],
) -> Vec<&'a ProductType> {
    if ensure_kind(chain, ItemType::Chain).is_err() {
        return Vec::new();
    }

    let mut offered: Vec<&ProductType> = product_types
        .iter()
        .filter(|pt| pt.is_active)
        .filter(|pt| match chain.pricing_mode {
            PricingMode::PerProduct => find_active_price(price_table, &chain.id, &pt.id).is_some(),
            PricingMode::PerInch => chain.sell_price.is_positive(),
        })
        .collect();
    offered.sort_by_key(|pt| pt.sort_order);
    offered
}

// =============================================================================
// Unit Tests
// =============================================================================
