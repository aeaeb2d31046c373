//! # Cart Aggregator
//!
//! The cart is an immutable value. Every change is a [`CartAction`] applied
//! through [`Cart::apply`], which returns a new cart together with totals
//! recomputed from scratch.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Reducer                                         │
//! │                                                                         │
//! │  UI Event                 CartAction                 Result             │
//! │  ────────                 ──────────                 ──────             │
//! │  Ring up item ──────────► AddItem ──────────┐                           │
//! │  Change qty ────────────► SetQuantity ──────┤                           │
//! │  Line discount ─────────► SetItemDiscount ──┤    cart.apply(action)     │
//! │  Re-measure ────────────► Reprice ──────────┼──► CartSnapshot {         │
//! │  Cart discount ─────────► SetCartDiscount ──┤      cart:   new Cart,    │
//! │  Tip / tax / fee ───────► SetTip ... ───────┤      totals: recompute()  │
//! │  Remove / cancel ───────► RemoveItem/Reset ─┘    }                      │
//! │                                                                         │
//! │  Invalid action → Err(CoreError), the original cart is unchanged.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Order of Operations
//! ```text
//! 1. item_subtotal       = Σ line_total          (item discounts baked in)
//! 2. discount_amount     = flat: min(v, item_subtotal)
//!                          pct:  round2(item_subtotal × v)
//! 3. subtotal            = max(0, item_subtotal − discount_amount)
//! 4. tax_amount          = round2(subtotal × tax_rate)
//! 5. pre_total           = subtotal + tax_amount + tip
//! 6. platform_fee_amount = round2(pre_total × fee_rate)
//! 7. total               = pre_total (+ fee when passed to customer)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::{apply_discount, discount_amount};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{resolve_unit_price, ResolvedPrice, SellableUnit};
use crate::types::{ChainProductPrice, ComponentKind, Discount, FeeHandling, Inches, Rate};
use crate::validation::{
    validate_amount, validate_cart_size, validate_item_name, validate_measured_inches,
    validate_quantity, validate_rate, validate_uuid,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// One sellable line.
///
/// There is no stored line total: [`CartItem::line_total`] derives it from
/// quantity, unit price and discount every time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub line_id: String,
    /// Inventory row this line sells; `None` for custom lines.
    pub source_item_id: Option<String>,
    pub product_type_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount: Discount,
    #[serde(default)]
    pub component_kind: ComponentKind,
    /// Jump rings per finished chain piece; `None` means one.
    pub components_per_unit: Option<u32>,
    pub material: Option<String>,
    pub measured_inches: Option<Inches>,
}

impl CartItem {
    /// Prices a sellable unit and builds a line for it.
    pub fn from_unit(
        unit: &SellableUnit<'_>,
        price_table: &[ChainProductPrice],
        measured_inches: Option<Inches>,
        quantity: i64,
    ) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        let ResolvedPrice {
            unit_price,
            measured_inches,
        } = resolve_unit_price(unit, price_table, measured_inches)?;

        let line_id = Uuid::new_v4().to_string();
        let item = match *unit {
            SellableUnit::Chain {
                chain,
                product_type,
            } => CartItem {
                line_id,
                source_item_id: Some(chain.id.clone()),
                product_type_id: Some(product_type.id.clone()),
                name: format!("{} {}", chain.name, product_type.name),
                quantity,
                unit_price,
                discount: Discount::None,
                component_kind: ComponentKind::Chain,
                components_per_unit: product_type.components_per_unit,
                material: chain.material.clone(),
                measured_inches,
            },
            SellableUnit::Charm(item) | SellableUnit::Connector(item) => CartItem {
                line_id,
                source_item_id: Some(item.id.clone()),
                product_type_id: None,
                name: item.name.clone(),
                quantity,
                unit_price,
                discount: Discount::None,
                component_kind: if matches!(unit, SellableUnit::Charm(_)) {
                    ComponentKind::Charm
                } else {
                    ComponentKind::Connector
                },
                components_per_unit: None,
                material: item.material.clone(),
                measured_inches: None,
            },
            SellableUnit::Custom { name, .. } => CartItem {
                line_id,
                source_item_id: None,
                product_type_id: None,
                name: name.trim().to_string(),
                quantity,
                unit_price,
                discount: Discount::None,
                component_kind: ComponentKind::None,
                components_per_unit: None,
                material: None,
                measured_inches: None,
            },
        };
        Ok(item)
    }

    /// `quantity × unit_price` before any discount.
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Line total after the item discount, clamped at zero.
    pub fn line_total(&self) -> Money {
        apply_discount(self.quantity, self.unit_price, &self.discount)
    }

    /// Amount the item discount removed.
    pub fn discount_amount(&self) -> Money {
        discount_amount(self.quantity, self.unit_price, &self.discount)
    }
}

// =============================================================================
// Cart Actions
// =============================================================================

/// Every way the UI can change a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    AddItem { item: CartItem },
    RemoveItem { line_id: String },
    /// Quantity 0 removes the line.
    SetQuantity { line_id: String, quantity: i64 },
    SetItemDiscount { line_id: String, discount: Discount },
    /// Source price changed, or a per-inch line was re-measured.
    ///
    /// The line takes the price's measurement as-is: `None` clears it.
    Reprice { line_id: String, price: ResolvedPrice },
    SetCartDiscount { discount: Discount },
    SetTaxRate { rate: Rate },
    SetTip { amount: Money },
    SetPlatformFee {
        rate: Option<Rate>,
        handling: FeeHandling,
    },
    /// Empties the cart after commit or cancel. Register settings stay.
    Reset,
}

// =============================================================================
// Cart
// =============================================================================

/// One in-progress sale.
///
/// ## Invariants
/// - No derived monetary field is stored; [`Cart::totals`] computes them
/// - At most [`MAX_CART_ITEMS`] lines, each with quantity 1..=999
/// - Line ids are unique
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub cart_discount: Discount,
    #[serde(default)]
    pub tax_rate: Rate,
    #[serde(default)]
    pub tip_amount: Money,
    #[serde(default)]
    pub platform_fee_rate: Option<Rate>,
    #[serde(default)]
    pub fee_handling: FeeHandling,
}

/// A cart together with the totals derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub totals: CartTotals,
}

impl Cart {
    /// Creates an empty cart with the register's tax and fee settings.
    pub fn new(tax_rate: Rate, platform_fee_rate: Option<Rate>, fee_handling: FeeHandling) -> Self {
        Cart {
            items: Vec::new(),
            cart_discount: Discount::None,
            tax_rate,
            tip_amount: Money::zero(),
            platform_fee_rate,
            fee_handling,
        }
    }

    /// Applies one action and returns the resulting cart with fresh totals.
    ///
    /// `self` is never modified; on error the caller keeps the old cart.
    pub fn apply(&self, action: CartAction) -> CoreResult<CartSnapshot> {
        let mut next = self.clone();

        match action {
            CartAction::AddItem { item } => {
                validate_cart_size(next.items.len())
                    .map_err(|_| CoreError::CartTooLarge { max: MAX_CART_ITEMS })?;
                validate_uuid(&item.line_id)?;
                validate_item_name(&item.name)?;
                validate_quantity(item.quantity)?;
                validate_amount("unit_price", item.unit_price)?;
                if let Some(inches) = item.measured_inches {
                    validate_measured_inches(inches)?;
                }
                if next.items.iter().any(|i| i.line_id == item.line_id) {
                    return Err(ValidationError::Duplicate {
                        field: "line_id".to_string(),
                        value: item.line_id,
                    }
                    .into());
                }
                debug!(line_id = %item.line_id, name = %item.name, qty = item.quantity, "Adding cart line");
                next.items.push(item);
            }
            CartAction::RemoveItem { line_id } => {
                next.remove_line(&line_id)?;
            }
            CartAction::SetQuantity { line_id, quantity } => {
                if quantity == 0 {
                    next.remove_line(&line_id)?;
                } else {
                    if quantity > MAX_ITEM_QUANTITY {
                        return Err(CoreError::QuantityTooLarge {
                            requested: quantity,
                            max: MAX_ITEM_QUANTITY,
                        });
                    }
                    validate_quantity(quantity)?;
                    next.line_mut(&line_id)?.quantity = quantity;
                }
            }
            CartAction::SetItemDiscount { line_id, discount } => {
                next.line_mut(&line_id)?.discount = discount;
            }
            CartAction::Reprice { line_id, price } => {
                validate_amount("unit_price", price.unit_price)?;
                if let Some(inches) = price.measured_inches {
                    validate_measured_inches(inches)?;
                }
                let line = next.line_mut(&line_id)?;
                line.unit_price = price.unit_price;
                line.measured_inches = price.measured_inches;
            }
            CartAction::SetCartDiscount { discount } => {
                next.cart_discount = discount;
            }
            CartAction::SetTaxRate { rate } => {
                validate_rate("tax_rate", rate)?;
                next.tax_rate = rate;
            }
            CartAction::SetTip { amount } => {
                validate_amount("tip", amount)?;
                next.tip_amount = amount;
            }
            CartAction::SetPlatformFee { rate, handling } => {
                if let Some(rate) = rate {
                    validate_rate("platform_fee_rate", rate)?;
                }
                next.platform_fee_rate = rate;
                next.fee_handling = handling;
            }
            CartAction::Reset => {
                next = Cart::new(next.tax_rate, next.platform_fee_rate, next.fee_handling);
            }
        }

        let totals = recompute(&next);
        debug!(
            items = totals.item_count,
            subtotal = %totals.subtotal,
            total = %totals.total,
            "Cart recomputed"
        );
        Ok(CartSnapshot { cart: next, totals })
    }

    /// Totals for the current state.
    pub fn totals(&self) -> CartTotals {
        recompute(self)
    }

    /// Looks up a line by id.
    pub fn item(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.line_id == line_id)
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Malformed ids are simply not found.
    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.line_id != line_id);

        if self.items.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// The monetary breakdown of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    /// Σ line totals, item discounts included.
    pub item_subtotal: Money,
    /// Cart-level discount only.
    pub discount_amount: Money,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub tip_amount: Money,
    /// Always reported, whichever side pays it.
    pub platform_fee_amount: Money,
    /// What the customer pays.
    pub total: Money,
    pub fee_handling: FeeHandling,
}

/// Cart-level discount on an already item-discounted subtotal, never more
/// than the subtotal itself.
fn cart_discount_amount(item_subtotal: Money, discount: &Discount) -> Money {
    if !discount.is_effective() {
        return Money::zero();
    }
    let amount = match *discount {
        Discount::None => Money::zero(),
        Discount::Flat(value) => value,
        Discount::Percent(rate) => item_subtotal.apply_rate(rate),
    };
    amount.min(item_subtotal.non_negative())
}

/// Recomputes every derived figure from the cart inputs.
///
/// Pure and idempotent; there is no cached or incremental path.
pub fn recompute(cart: &Cart) -> CartTotals {
    // 1. Item discounts are already inside each line total
    let item_subtotal: Money = cart.items.iter().map(CartItem::line_total).sum();

    // 2-3. Cart-level discount layer
    let discount_amount = cart_discount_amount(item_subtotal, &cart.cart_discount);
    let subtotal = (item_subtotal - discount_amount).non_negative();

    // 4. Tax on the post-discount subtotal
    let tax_amount = subtotal.apply_rate(cart.tax_rate);

    // 5. Tip is absolute: never discounted, never taxed
    let tip_amount = cart.tip_amount.non_negative();
    let pre_total = subtotal + tax_amount + tip_amount;

    // 6-7. Platform fee
    let platform_fee_amount = cart
        .platform_fee_rate
        .map(|rate| pre_total.apply_rate(rate))
        .unwrap_or_default();
    let total = match cart.fee_handling {
        FeeHandling::PassToCustomer => pre_total + platform_fee_amount,
        FeeHandling::Absorb => pre_total,
    };

    CartTotals {
        item_count: cart.item_count(),
        total_quantity: cart.total_quantity(),
        item_subtotal,
        discount_amount,
        subtotal,
        tax_amount,
        tip_amount,
        platform_fee_amount,
        total,
        fee_handling: cart.fee_handling,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
