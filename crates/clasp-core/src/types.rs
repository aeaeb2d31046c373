//! # Domain Types
//!
//! Inventory, catalog and pricing value types shared by every engine module.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │ ChainProductPrice│   │  ProductType    │       │
//! │  │  ─────────────  │   │  ─────────────── │   │  ─────────────  │       │
//! │  │  item_type      │◄──│  inventory_item  │──►│  name           │       │
//! │  │  material       │   │  sell_price      │   │  default_inches │       │
//! │  │  pricing_mode   │   │  default_inches? │   │  components/unit│       │
//! │  │  sell_price     │   └──────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Rate        │   │    Discount     │   │     Inches      │        │
//! │  │  bps (u32)      │   │  none/flat/pct  │   │  hundredths     │        │
//! │  │  825 = 8.25%    │   └─────────────────┘   │  1850 = 18.5in  │        │
//! │  └─────────────────┘                         └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::reconcile::normalize_material;

// =============================================================================
// Rate
// =============================================================================

/// A rate in basis points (bps).
///
/// 1 basis point = 0.01%. Tax rates, platform fee rates and percent
/// discounts all use this type: 825 bps = 8.25%, 1000 bps = 10% off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100%.
    pub const FULL: Rate = Rate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (e.g. `8.25`). Negative input
    /// saturates to zero.
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Inches
// =============================================================================

/// A chain length in hundredths of an inch.
///
/// Operators measure to the quarter inch at most, so hundredths keep
/// `rate × length` exact in integer math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Inches(u32);

impl Inches {
    #[inline]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Inches(hundredths)
    }

    /// Converts an operator-entered length (e.g. `18.5`).
    pub fn from_f64(inches: f64) -> Self {
        Inches((inches * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn hundredths(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Inches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}in", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}in", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}in", whole, frac)
        }
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// How a chain is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Fixed price per finished piece, from [`ChainProductPrice`].
    #[default]
    PerProduct,
    /// `sell_price` is a per-inch rate, multiplied by the measured length.
    PerInch,
}

/// Physical kind of an inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Chain,
    JumpRing,
    Charm,
    Connector,
    Other,
}

/// What a cart line physically consumes jump rings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Chain,
    Charm,
    Connector,
    /// Custom or service lines that consume nothing.
    #[default]
    None,
}

/// Whether the platform commission is added to the customer's total.
///
/// ```text
///   pre_total = subtotal + tax + tip          fee = pre_total × fee_rate
///
///   PassToCustomer:  total = pre_total + fee   (customer pays the fee)
///   Absorb:          total = pre_total         (fee reported, merchant pays)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FeeHandling {
    Absorb,
    #[default]
    PassToCustomer,
}

impl fmt::Display for FeeHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeHandling::Absorb => write!(f, "absorb"),
            FeeHandling::PassToCustomer => write!(f, "pass_to_customer"),
        }
    }
}

impl std::str::FromStr for FeeHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absorb" => Ok(FeeHandling::Absorb),
            "pass_to_customer" | "pass" | "customer" => Ok(FeeHandling::PassToCustomer),
            other => Err(format!(
                "Unknown fee handling: '{}'. Valid options: absorb, pass_to_customer",
                other
            )),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount on a single line or on the whole cart.
///
/// Serialized as `{"kind": "flat", "value": 500}` /
/// `{"kind": "percent", "value": 1500}` (bps) / `{"kind": "none"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Fixed amount off.
    Flat(Money),
    /// Percentage off, in basis points.
    Percent(Rate),
}

impl Discount {
    /// False for `None` and for any value ≤ 0, which behave identically.
    pub fn is_effective(&self) -> bool {
        match self {
            Discount::None => false,
            Discount::Flat(amount) => amount.is_positive(),
            Discount::Percent(rate) => !rate.is_zero(),
        }
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A physical stock unit.
///
/// `quantity_on_hand` is owned by the storage layer; the engine reads it
/// and never writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub tenant_id: String,
    /// Display name, e.g. "Jump Ring 4mm Gold-Filled".
    pub name: String,
    pub item_type: ItemType,
    /// Free text; compared through [`normalize_material`].
    pub material: Option<String>,
    pub quantity_on_hand: i64,
    pub reorder_threshold: i64,
    /// Only meaningful for chains.
    #[serde(default)]
    pub pricing_mode: PricingMode,
    /// Per-piece price, or per-inch rate when `pricing_mode = per_inch`.
    pub sell_price: Money,
    /// What one unit costs the business.
    #[serde(default)]
    pub cost_per_unit: Money,
    pub is_active: bool,
}

impl InventoryItem {
    /// The material key used for matching, if any.
    ///
    /// Storage should persist this alongside the free text so both sides
    /// of the match use the same normalization.
    pub fn normalized_material(&self) -> Option<String> {
        self.material.as_deref().and_then(normalize_material)
    }

    /// Active jump-ring rows are the only reconciliation candidates.
    #[inline]
    pub fn is_active_jump_ring(&self) -> bool {
        self.is_active && self.item_type == ItemType::JumpRing
    }

    /// True when stock left after drawing `needed` is at or below the
    /// reorder threshold.
    pub fn needs_reorder_after(&self, needed: i64) -> bool {
        self.quantity_on_hand - needed <= self.reorder_threshold
    }
}

// =============================================================================
// Product Type
// =============================================================================

/// A named sellable form, e.g. "Bracelet" or "Anklet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductType {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Typical finished length, used for per-inch estimates.
    pub default_inches: Inches,
    /// Jump rings used to close one finished piece. `None` means 1.
    #[serde(default)]
    pub components_per_unit: Option<u32>,
    pub sort_order: i32,
    pub is_active: bool,
}

// =============================================================================
// Chain Product Price
// =============================================================================

/// Fixed price of one chain as one product type (per-product pricing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChainProductPrice {
    pub id: String,
    pub inventory_item_id: String,
    pub product_type_id: String,
    pub sell_price: Money,
    /// Overrides the product type's default length for this chain.
    pub default_inches: Option<Inches>,
    pub is_active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
        assert_eq!(Rate::from_percentage(-3.0).bps(), 0);
        assert!((Rate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_inches_display() {
        assert_eq!(Inches::from_f64(18.5).to_string(), "18.5in");
        assert_eq!(Inches::from_hundredths(700).to_string(), "7in");
        assert_eq!(Inches::from_hundredths(725).to_string(), "7.25in");
    }

    #[test]
    fn test_discount_effectiveness() {
        assert!(!Discount::None.is_effective());
        assert!(!Discount::Flat(Money::from_cents(-100)).is_effective());
        assert!(!Discount::Flat(Money::zero()).is_effective());
        assert!(!Discount::Percent(Rate::zero()).is_effective());
        assert!(Discount::Flat(Money::from_cents(1)).is_effective());
        assert!(Discount::Percent(Rate::from_bps(1000)).is_effective());
    }

    #[test]
    fn test_discount_json_shape() {
        let json = serde_json::to_string(&Discount::Flat(Money::from_cents(500))).unwrap();
        assert_eq!(json, r#"{"kind":"flat","value":500}"#);

        let none: Discount = serde_json::from_str(r#"{"kind":"none"}"#).unwrap();
        assert_eq!(none, Discount::None);

        let pct: Discount = serde_json::from_str(r#"{"kind":"percent","value":1500}"#).unwrap();
        assert_eq!(pct, Discount::Percent(Rate::from_bps(1500)));
    }

    #[test]
    fn test_fee_handling_parsing() {
        assert_eq!("absorb".parse::<FeeHandling>().unwrap(), FeeHandling::Absorb);
        assert_eq!(
            "Pass_To_Customer".parse::<FeeHandling>().unwrap(),
            FeeHandling::PassToCustomer
        );
        assert!("split".parse::<FeeHandling>().is_err());
    }

    #[test]
    fn test_reorder_threshold() {
        let ring = InventoryItem {
            id: "jr-1".to_string(),
            tenant_id: "t".to_string(),
            name: "Jump Ring".to_string(),
            item_type: ItemType::JumpRing,
            material: Some(" Gold-Filled ".to_string()),
            quantity_on_hand: 10,
            reorder_threshold: 5,
            pricing_mode: PricingMode::PerProduct,
            sell_price: Money::zero(),
            cost_per_unit: Money::from_cents(12),
            is_active: true,
        };
        assert!(!ring.needs_reorder_after(4));
        assert!(ring.needs_reorder_after(5));
        assert_eq!(ring.normalized_material().as_deref(), Some("gold-filled"));
    }
}
