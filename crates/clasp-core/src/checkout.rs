//! # Checkout Commit Seam
//!
//! Where reconciliation meets real stock. A preview may be stale by the time
//! the operator taps "Complete Sale", so the commit matches again against
//! rows fetched from the ledger and then draws every jump ring in one
//! atomic step.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_components(ledger, items, policy)                               │
//! │                                                                         │
//! │  1. ledger.jump_rings()          fresh rows, not the preview's          │
//! │  2. reconcile(items, rows)       same matching as the preview           │
//! │  3. policy check                 unresolved lines → UnresolvedComponents│
//! │  4. aggregate_needs              one StockDraw per jump-ring row        │
//! │  5. ledger.draw(&draws)          all rows or none                       │
//! │         │                                                               │
//! │         ├── Ok(rows)  → CommitOutcome { resolutions, warnings,          │
//! │         │                               reorder_needed }                │
//! │         └── Err       → nothing changed, caller re-previews             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Terminals, Last Units
//! ```text
//! on hand: 7
//! Terminal A needs 4 ──┐
//!                      ├── draw() holds the ledger lock across
//! Terminal B needs 4 ──┘   check-then-decrement
//!
//! first draw:  7 ≥ 4 → 3 on hand      ✓
//! second draw: 3 < 4 → InsufficientStock, stock untouched
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::error::{CoreError, CoreResult};
use crate::reconcile::{aggregate_needs, reconcile, JumpRingResolution};
use crate::types::{InventoryItem, ItemType};
use crate::warnings::{collect_warnings, ReconciliationWarning};

// =============================================================================
// Stock Ledger
// =============================================================================

/// One decrement against a jump-ring row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDraw {
    pub inventory_id: String,
    pub quantity: i64,
}

/// Storage-side owner of `quantity_on_hand`.
///
/// Implemented by the database layer; [`MemoryLedger`] backs tests and the
/// `quote` tool.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Current jump-ring rows (active or not; matching filters them).
    async fn jump_rings(&self) -> CoreResult<Vec<InventoryItem>>;

    /// Decrements every row iff every row has enough on hand.
    ///
    /// Returns the updated rows. On `InsufficientStock` no row changes.
    async fn draw(&self, draws: &[StockDraw]) -> CoreResult<Vec<InventoryItem>>;
}

/// In-memory [`StockLedger`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<InventoryItem>>,
}

impl MemoryLedger {
    pub fn new(rows: Vec<InventoryItem>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// On-hand count for a row, if it exists.
    pub async fn on_hand(&self, inventory_id: &str) -> Option<i64> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.id == inventory_id)
            .map(|r| r.quantity_on_hand)
    }

    /// Copy of every row.
    pub async fn snapshot(&self) -> Vec<InventoryItem> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl StockLedger for MemoryLedger {
    async fn jump_rings(&self) -> CoreResult<Vec<InventoryItem>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|r| r.item_type == ItemType::JumpRing)
            .cloned()
            .collect())
    }

    async fn draw(&self, draws: &[StockDraw]) -> CoreResult<Vec<InventoryItem>> {
        // Sum first so a row listed twice is checked against its full need.
        let mut totals: Vec<(&str, i64)> = Vec::new();
        for d in draws {
            if d.quantity <= 0 {
                return Err(CoreError::Storage(format!(
                    "draw of {} from {} must be positive",
                    d.quantity, d.inventory_id
                )));
            }
            match totals.iter_mut().find(|(id, _)| *id == d.inventory_id) {
                Some((_, q)) => *q += d.quantity,
                None => totals.push((d.inventory_id.as_str(), d.quantity)),
            }
        }

        let mut rows = self.rows.lock().await;
        let index: HashMap<&str, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let mut plan = Vec::with_capacity(totals.len());
        for (id, quantity) in &totals {
            let Some(&i) = index.get(id) else {
                return Err(CoreError::Storage(format!("unknown inventory row {}", id)));
            };
            let available = rows[i].quantity_on_hand;
            if available < *quantity {
                return Err(CoreError::InsufficientStock {
                    item_id: id.to_string(),
                    available,
                    requested: *quantity,
                });
            }
            plan.push((i, *quantity));
        }
        drop(index);

        let mut updated = Vec::with_capacity(plan.len());
        for (i, quantity) in plan {
            rows[i].quantity_on_hand -= quantity;
            debug!(
                id = %rows[i].id,
                drawn = quantity,
                remaining = rows[i].quantity_on_hand,
                "Drew jump rings"
            );
            updated.push(rows[i].clone());
        }
        Ok(updated)
    }
}

// =============================================================================
// Commit
// =============================================================================

/// Register rules applied at commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPolicy {
    /// Refuse the sale while any consuming line has no matching jump ring.
    pub require_component_setup: bool,
}

/// What a successful commit drew and what is left to tell the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitOutcome {
    pub resolutions: Vec<JumpRingResolution>,
    pub draws: Vec<StockDraw>,
    /// Advisories that survive the draw (needs-setup, duplicates).
    pub warnings: Vec<ReconciliationWarning>,
    /// Rows that fell to or below their reorder threshold.
    pub reorder_needed: Vec<String>,
}

/// Re-reconciles `items` against fresh ledger rows and draws the jump rings.
///
/// Unresolved lines are skipped (and reported) unless the policy requires
/// component setup, in which case the commit is refused before any draw.
pub async fn commit_components<L: StockLedger + ?Sized>(
    ledger: &L,
    items: &[CartItem],
    policy: CheckoutPolicy,
) -> CoreResult<CommitOutcome> {
    let inventory = ledger.jump_rings().await?;
    let resolutions = reconcile(items, &inventory);

    let unresolved = resolutions.iter().filter(|r| !r.resolved).count();
    if policy.require_component_setup && unresolved > 0 {
        warn!(unresolved, "Commit refused: components not set up");
        return Err(CoreError::UnresolvedComponents { count: unresolved });
    }

    let draws: Vec<StockDraw> = aggregate_needs(&resolutions)
        .into_iter()
        .map(|need| StockDraw {
            inventory_id: need.inventory_id,
            quantity: need.needed,
        })
        .collect();

    let updated = if draws.is_empty() {
        Vec::new()
    } else {
        ledger.draw(&draws).await.map_err(|e| {
            warn!(error = %e, "Commit refused: stock draw failed");
            e
        })?
    };

    let reorder_needed: Vec<String> = updated
        .iter()
        .filter(|r| r.quantity_on_hand <= r.reorder_threshold)
        .map(|r| r.id.clone())
        .collect();

    let warnings: Vec<ReconciliationWarning> = collect_warnings(&resolutions, &inventory)
        .into_iter()
        .filter(|w| !w.is_low_stock())
        .collect();

    info!(
        lines = items.len(),
        rows_drawn = draws.len(),
        jump_rings = draws.iter().map(|d| d.quantity).sum::<i64>(),
        unresolved,
        reorder = reorder_needed.len(),
        "Committed sale components"
    );

    Ok(CommitOutcome {
        resolutions,
        draws,
        warnings,
        reorder_needed,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::tests::{jump_ring, line};
    use crate::types::ComponentKind;

    fn seven_ring_sale() -> Vec<CartItem> {
        vec![
            line("b1", ComponentKind::Chain, Some(2), Some("Gold-Filled"), 1),
            line("b2", ComponentKind::Chain, Some(2), Some("Gold-Filled"), 1),
            line("c1", ComponentKind::Charm, None, Some("Gold-Filled"), 3),
        ]
    }

    #[tokio::test]
    async fn test_commit_draws_aggregated_need() {
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 20)]);

        let outcome = commit_components(&ledger, &seven_ring_sale(), CheckoutPolicy::default())
            .await
            .unwrap();

        assert_eq!(
            outcome.draws,
            vec![StockDraw {
                inventory_id: "jr-gf".to_string(),
                quantity: 7
            }]
        );
        assert_eq!(ledger.on_hand("jr-gf").await, Some(13));
        assert!(outcome.reorder_needed.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_commit_reports_reorder() {
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 12)]);
        let outcome = commit_components(&ledger, &seven_ring_sale(), CheckoutPolicy::default())
            .await
            .unwrap();
        // 12 - 7 = 5, threshold 5
        assert_eq!(outcome.reorder_needed, vec!["jr-gf".to_string()]);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let ledger = MemoryLedger::new(vec![
            jump_ring("jr-gf", "Gold-Filled", 6),
            jump_ring("jr-ss", "Sterling Silver", 10),
        ]);
        let mut items = seven_ring_sale();
        items.push(line("s1", ComponentKind::Charm, None, Some("Sterling Silver"), 2));

        let err = commit_components(&ledger, &items, CheckoutPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { ref item_id, available: 6, requested: 7 } if item_id == "jr-gf"
        ));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(6));
        assert_eq!(ledger.on_hand("jr-ss").await, Some(10));
    }

    #[tokio::test]
    async fn test_unresolved_lines_skipped_or_refused() {
        let mut items = seven_ring_sale();
        items.push(line("r1", ComponentKind::Chain, Some(1), Some("Rose Gold"), 1));

        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 20)]);
        let outcome = commit_components(&ledger, &items, CheckoutPolicy::default())
            .await
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].is_needs_setup());
        assert_eq!(ledger.on_hand("jr-gf").await, Some(13));

        let strict = CheckoutPolicy {
            require_component_setup: true,
        };
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 20)]);
        let err = commit_components(&ledger, &items, strict).await.unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedComponents { count: 1 }));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(20));
    }

    #[tokio::test]
    async fn test_commit_matches_fresh_rows() {
        // The preview saw an inactive row; by commit it has been activated.
        let mut row = jump_ring("jr-gf", "Gold-Filled", 20);
        row.is_active = false;
        let preview = reconcile(&seven_ring_sale(), &[row.clone()]);
        assert!(preview.iter().all(|r| !r.resolved));

        row.is_active = true;
        let ledger = MemoryLedger::new(vec![row]);
        let outcome = commit_components(&ledger, &seven_ring_sale(), CheckoutPolicy::default())
            .await
            .unwrap();
        assert!(outcome.resolutions.iter().all(|r| r.resolved));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(13));
    }

    #[tokio::test]
    async fn test_nothing_to_draw() {
        let ledger: Box<dyn StockLedger> =
            Box::new(MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 1)]));
        let items = vec![line("svc", ComponentKind::None, None, None, 1)];
        let outcome = commit_components(ledger.as_ref(), &items, CheckoutPolicy::default())
            .await
            .unwrap();
        assert!(outcome.draws.is_empty());
        assert!(outcome.resolutions.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_commits_for_last_units() {
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 7)]);
        let sale_a = vec![line("a", ComponentKind::Charm, None, Some("Gold-Filled"), 4)];
        let sale_b = vec![line("b", ComponentKind::Charm, None, Some("Gold-Filled"), 4)];

        let (a, b) = tokio::join!(
            commit_components(&ledger, &sale_a, CheckoutPolicy::default()),
            commit_components(&ledger, &sale_b, CheckoutPolicy::default()),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser,
            Err(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(3));
    }

    #[tokio::test]
    async fn test_draw_rejects_unknown_and_non_positive() {
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 7)]);

        let err = ledger
            .draw(&[StockDraw {
                inventory_id: "nope".to_string(),
                quantity: 1,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));

        let err = ledger
            .draw(&[StockDraw {
                inventory_id: "jr-gf".to_string(),
                quantity: 0,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(7));
    }

    #[tokio::test]
    async fn test_draw_sums_repeated_rows() {
        let ledger = MemoryLedger::new(vec![jump_ring("jr-gf", "Gold-Filled", 7)]);
        let draw = |q| StockDraw {
            inventory_id: "jr-gf".to_string(),
            quantity: q,
        };
        let err = ledger.draw(&[draw(4), draw(4)]).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 8, .. }));
        assert_eq!(ledger.on_hand("jr-gf").await, Some(7));
    }
}
