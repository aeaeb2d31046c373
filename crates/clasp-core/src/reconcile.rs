//! # Component Reconciler
//!
//! Works out how many jump rings each cart line consumes and which
//! jump-ring inventory row supplies them.
//!
//! ## Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart line                      Jump-ring inventory (active only)       │
//! │  ─────────                      ─────────────────────────────────       │
//! │  Figaro Bracelet  ×1            jr-gf   "Gold-Filled"     on hand 40    │
//! │    chain, 2/unit  → need 2 ──┐  jr-ss   "Sterling Silver" on hand 12    │
//! │    " gold-filled"            │                                          │
//! │                              ├─ normalize_material: trim + lowercase    │
//! │  Heart Charm ×3              │  "gold-filled" == "gold-filled"  ✓       │
//! │    charm → need 3 ───────────┘                                          │
//! │                                                                         │
//! │  Rose Gold Anklet ×1  → need 1   no "rose gold" row → resolved = false  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconciliation only reads inventory. The decrement happens in the
//! storage layer at commit, after matching again against fresh rows
//! (see [`crate::checkout`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::money::Money;
use crate::types::{ComponentKind, InventoryItem};

/// The key two materials are compared by: trimmed and lowercased.
///
/// Returns `None` for blank input, which never matches anything.
///
/// ```rust
/// use clasp_core::reconcile::normalize_material;
///
/// assert_eq!(normalize_material("  Gold-Filled "), Some("gold-filled".to_string()));
/// assert_eq!(normalize_material("   "), None);
/// ```
pub fn normalize_material(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// How one cart line's jump rings were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JumpRingResolution {
    pub cart_line_id: String,
    pub item_name: String,
    pub material: Option<String>,
    pub jump_rings_needed: i64,
    pub matched_inventory_id: Option<String>,
    pub cost_each: Option<Money>,
    /// True iff a jump-ring row with this material was found.
    pub resolved: bool,
    /// True when several active jump-ring rows share the material.
    pub ambiguous: bool,
}

/// Total need against one jump-ring row, summed across cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregatedNeed {
    pub inventory_id: String,
    pub needed: i64,
}

/// Jump rings a line consumes.
///
/// Chains use `components_per_unit` (default 1) per piece; charms and
/// connectors use one each. Custom lines and lines with no source
/// inventory consume nothing.
pub fn jump_rings_needed(item: &CartItem) -> i64 {
    if item.source_item_id.is_none() {
        return 0;
    }
    let per_unit = match item.component_kind {
        ComponentKind::Chain => item.components_per_unit.unwrap_or(1) as i64,
        ComponentKind::Charm | ComponentKind::Connector => 1,
        ComponentKind::None => 0,
    };
    per_unit * item.quantity
}

/// Matches every consuming cart line against active jump-ring rows.
///
/// One resolution is emitted per line that needs at least one ring, matched
/// or not. Rows that are inactive or not jump rings are ignored. When
/// several rows share a material, the first in `inventory` order is used
/// and the resolution is flagged `ambiguous`.
pub fn reconcile(items: &[CartItem], inventory: &[InventoryItem]) -> Vec<JumpRingResolution> {
    let mut by_material: HashMap<String, Vec<&InventoryItem>> = HashMap::new();
    for row in inventory.iter().filter(|r| r.is_active_jump_ring()) {
        if let Some(key) = row.normalized_material() {
            by_material.entry(key).or_default().push(row);
        }
    }

    let resolutions: Vec<JumpRingResolution> = items
        .iter()
        .filter_map(|item| {
            let needed = jump_rings_needed(item);
            if needed == 0 {
                return None;
            }

            let candidates = item
                .material
                .as_deref()
                .and_then(normalize_material)
                .and_then(|key| by_material.get(&key))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let matched = candidates.first();
            let ambiguous = candidates.len() > 1;

            if matched.is_none() {
                warn!(
                    line_id = %item.line_id,
                    material = ?item.material,
                    needed,
                    "No jump ring matches cart line material"
                );
            } else if ambiguous {
                warn!(
                    line_id = %item.line_id,
                    material = ?item.material,
                    candidates = candidates.len(),
                    "Several active jump rings share a material, using the first"
                );
            }

            Some(JumpRingResolution {
                cart_line_id: item.line_id.clone(),
                item_name: item.name.clone(),
                material: item.material.clone(),
                jump_rings_needed: needed,
                matched_inventory_id: matched.map(|r| r.id.clone()),
                cost_each: matched.map(|r| r.cost_per_unit),
                resolved: matched.is_some(),
                ambiguous,
            })
        })
        .collect();

    debug!(
        lines = items.len(),
        consuming = resolutions.len(),
        unresolved = resolutions.iter().filter(|r| !r.resolved).count(),
        "Reconciled jump rings"
    );
    resolutions
}

/// Sums needs per matched jump-ring row, in first-seen order.
///
/// Unresolved resolutions are not included.
pub fn aggregate_needs(resolutions: &[JumpRingResolution]) -> Vec<AggregatedNeed> {
    let mut needs: Vec<AggregatedNeed> = Vec::new();
    for resolution in resolutions {
        let Some(id) = resolution.matched_inventory_id.as_deref() else {
            continue;
        };
        match needs.iter_mut().find(|n| n.inventory_id == id) {
            Some(need) => need.needed += resolution.jump_rings_needed,
            None => needs.push(AggregatedNeed {
                inventory_id: id.to_string(),
                needed: resolution.jump_rings_needed,
            }),
        }
    }
    needs
}

/// Total cost of the matched jump rings, for margin reporting.
pub fn component_cost(resolutions: &[JumpRingResolution]) -> Money {
    resolutions
        .iter()
        .filter_map(|r| r.cost_each.map(|c| c.multiply_quantity(r.jump_rings_needed)))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Discount, ItemType, PricingMode};

    pub(crate) fn jump_ring(id: &str, material: &str, on_hand: i64) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: format!("Jump Ring {}", material),
            item_type: ItemType::JumpRing,
            material: Some(material.to_string()),
            quantity_on_hand: on_hand,
            reorder_threshold: 5,
            pricing_mode: PricingMode::PerProduct,
            sell_price: Money::zero(),
            cost_per_unit: Money::from_cents(15),
            is_active: true,
        }
    }

    pub(crate) fn line(
        line_id: &str,
        kind: ComponentKind,
        per_unit: Option<u32>,
        material: Option<&str>,
        quantity: i64,
    ) -> CartItem {
        CartItem {
            line_id: line_id.to_string(),
            source_item_id: Some(format!("src-{}", line_id)),
            product_type_id: None,
            name: format!("Line {}", line_id),
            quantity,
            unit_price: Money::from_cents(1000),
            discount: Discount::None,
            component_kind: kind,
            components_per_unit: per_unit,
            material: material.map(str::to_string),
            measured_inches: None,
        }
    }

    #[test]
    fn test_needs_by_kind() {
        assert_eq!(jump_rings_needed(&line("a", ComponentKind::Chain, Some(2), None, 3)), 6);
        assert_eq!(jump_rings_needed(&line("b", ComponentKind::Chain, None, None, 3)), 3);
        assert_eq!(jump_rings_needed(&line("c", ComponentKind::Charm, Some(9), None, 3)), 3);
        assert_eq!(jump_rings_needed(&line("d", ComponentKind::Connector, None, None, 2)), 2);
        assert_eq!(jump_rings_needed(&line("e", ComponentKind::None, Some(2), None, 2)), 0);
        assert_eq!(jump_rings_needed(&line("f", ComponentKind::Chain, Some(0), None, 2)), 0);

        let mut custom = line("g", ComponentKind::Chain, Some(2), None, 1);
        custom.source_item_id = None;
        assert_eq!(jump_rings_needed(&custom), 0);
    }

    #[test]
    fn test_shared_material_aggregates_to_seven() {
        let items = vec![
            line("b1", ComponentKind::Chain, Some(2), Some("Gold-Filled"), 1),
            line("b2", ComponentKind::Chain, Some(2), Some("gold-filled "), 1),
            line("c1", ComponentKind::Charm, None, Some("GOLD-FILLED"), 3),
        ];
        let inventory = vec![jump_ring("jr-gf", "Gold-Filled", 6)];

        let resolutions = reconcile(&items, &inventory);
        assert_eq!(resolutions.len(), 3);
        assert!(resolutions.iter().all(|r| r.resolved));
        assert!(resolutions
            .iter()
            .all(|r| r.matched_inventory_id.as_deref() == Some("jr-gf")));

        let needs = aggregate_needs(&resolutions);
        assert_eq!(
            needs,
            vec![AggregatedNeed {
                inventory_id: "jr-gf".to_string(),
                needed: 7
            }]
        );
        assert_eq!(component_cost(&resolutions).cents(), 7 * 15);
    }

    #[test]
    fn test_unmatched_material_is_unresolved_not_dropped() {
        let items = vec![line("a", ComponentKind::Chain, Some(1), Some("Rose Gold"), 2)];
        let inventory = vec![jump_ring("jr-gf", "Gold-Filled", 100)];

        let resolutions = reconcile(&items, &inventory);
        assert_eq!(resolutions.len(), 1);
        let r = &resolutions[0];
        assert!(!r.resolved);
        assert_eq!(r.matched_inventory_id, None);
        assert_eq!(r.cost_each, None);
        assert_eq!(r.jump_rings_needed, 2);
        assert!(aggregate_needs(&resolutions).is_empty());
    }

    #[test]
    fn test_missing_material_is_unresolved() {
        let items = vec![line("a", ComponentKind::Charm, None, None, 1)];
        let resolutions = reconcile(&items, &[jump_ring("jr-gf", "Gold-Filled", 100)]);
        assert!(!resolutions[0].resolved);
    }

    #[test]
    fn test_inactive_and_non_ring_rows_ignored() {
        let mut inactive = jump_ring("jr-old", "Sterling Silver", 50);
        inactive.is_active = false;
        let mut chain = jump_ring("chain-ss", "Sterling Silver", 50);
        chain.item_type = ItemType::Chain;

        let items = vec![line("a", ComponentKind::Connector, None, Some("sterling silver"), 1)];
        let resolutions = reconcile(&items, &[inactive, chain]);
        assert!(!resolutions[0].resolved);
    }

    #[test]
    fn test_duplicate_material_uses_first_and_flags() {
        let inventory = vec![
            jump_ring("jr-a", "Gold-Filled", 3),
            jump_ring("jr-b", " gold-filled", 300),
        ];
        let items = vec![line("a", ComponentKind::Charm, None, Some("Gold-Filled"), 1)];

        let resolutions = reconcile(&items, &inventory);
        assert_eq!(resolutions[0].matched_inventory_id.as_deref(), Some("jr-a"));
        assert!(resolutions[0].ambiguous);
    }

    #[test]
    fn test_non_consuming_lines_emit_nothing() {
        let items = vec![line("svc", ComponentKind::None, None, Some("Gold-Filled"), 1)];
        assert!(reconcile(&items, &[jump_ring("jr-gf", "Gold-Filled", 10)]).is_empty());
    }
}
