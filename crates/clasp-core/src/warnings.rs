//! # Warning Formatter
//!
//! Turns reconciliation results into advisories shown before checkout.
//! Advisories never block a sale on their own.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Category      Trigger                              Example             │
//! │  ────────      ───────                              ───────             │
//! │  LowStock      Σ need for one row > on hand         "Low stock: Jump    │
//! │                                                      Ring Gold-Filled   │
//! │                                                      has 6 on hand, 7   │
//! │                                                      needed for this    │
//! │                                                      sale"              │
//! │  NeedsSetup    no jump ring matches the material    "Needs setup: ..."  │
//! │  Duplicate     several rows share the material      "Needs review: ..." │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::reconcile::{aggregate_needs, JumpRingResolution};
use crate::types::InventoryItem;

/// One advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ReconciliationWarning {
    LowStock {
        inventory_id: String,
        item_name: String,
        on_hand: i64,
        needed: i64,
    },
    NeedsSetup {
        cart_line_id: String,
        item_name: String,
        material: Option<String>,
        needed: i64,
    },
    DuplicateMaterial {
        inventory_id: String,
        item_name: String,
        material: Option<String>,
    },
}

impl ReconciliationWarning {
    /// True for low-stock advisories, which the commit will also enforce.
    pub fn is_low_stock(&self) -> bool {
        matches!(self, ReconciliationWarning::LowStock { .. })
    }

    pub fn is_needs_setup(&self) -> bool {
        matches!(self, ReconciliationWarning::NeedsSetup { .. })
    }
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationWarning::LowStock {
                item_name,
                on_hand,
                needed,
                ..
            } => write!(
                f,
                "Low stock: {} has {} on hand, {} needed for this sale",
                item_name, on_hand, needed
            ),
            ReconciliationWarning::NeedsSetup {
                item_name,
                material: Some(material),
                needed,
                ..
            } => write!(
                f,
                "Needs setup: no jump ring for material '{}' ({} needs {})",
                material.trim(),
                item_name,
                needed
            ),
            ReconciliationWarning::NeedsSetup {
                item_name, needed, ..
            } => write!(
                f,
                "Needs setup: {} has no material set ({} jump rings needed)",
                item_name, needed
            ),
            ReconciliationWarning::DuplicateMaterial {
                item_name,
                material,
                ..
            } => write!(
                f,
                "Needs review: several active jump rings are '{}', using {}",
                material.as_deref().map(str::trim).unwrap_or_default(),
                item_name
            ),
        }
    }
}

/// Builds typed advisories: low stock first (one per jump-ring row), then
/// unresolved lines, then duplicate materials.
pub fn collect_warnings(
    resolutions: &[JumpRingResolution],
    inventory: &[InventoryItem],
) -> Vec<ReconciliationWarning> {
    let find = |id: &str| inventory.iter().find(|row| row.id == id);
    let mut warnings = Vec::new();

    for need in aggregate_needs(resolutions) {
        let row = find(&need.inventory_id);
        let on_hand = row.map(|r| r.quantity_on_hand).unwrap_or(0);
        if need.needed > on_hand {
            warnings.push(ReconciliationWarning::LowStock {
                item_name: row
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| need.inventory_id.clone()),
                inventory_id: need.inventory_id,
                on_hand,
                needed: need.needed,
            });
        }
    }

    for r in resolutions.iter().filter(|r| !r.resolved) {
        warnings.push(ReconciliationWarning::NeedsSetup {
            cart_line_id: r.cart_line_id.clone(),
            item_name: r.item_name.clone(),
            material: r.material.clone(),
            needed: r.jump_rings_needed,
        });
    }

    let mut flagged: Vec<&str> = Vec::new();
    for r in resolutions.iter().filter(|r| r.ambiguous) {
        let Some(id) = r.matched_inventory_id.as_deref() else {
            continue;
        };
        if flagged.contains(&id) {
            continue;
        }
        flagged.push(id);
        let row = find(id);
        warnings.push(ReconciliationWarning::DuplicateMaterial {
            inventory_id: id.to_string(),
            item_name: row.map(|r| r.name.clone()).unwrap_or_else(|| id.to_string()),
            material: row.and_then(|r| r.material.clone()).or_else(|| r.material.clone()),
        });
    }

    warnings
}

/// Human-readable advisories for the operator.
pub fn format_warnings(
    resolutions: &[JumpRingResolution],
    inventory: &[InventoryItem],
) -> Vec<String> {
    collect_warnings(resolutions, inventory)
        .iter()
        .map(ToString::to_string)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
