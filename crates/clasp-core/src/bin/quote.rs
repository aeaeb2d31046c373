//! # Quote Tool
//!
//! Prices a cart snapshot and previews its jump-ring consumption.
//!
//! ## Usage
//! ```bash
//! # Price a snapshot with the register's config
//! cargo run -p clasp-core --bin quote -- --cart ./sale.json
//!
//! # Use a specific register.toml and simulate the commit draw
//! cargo run -p clasp-core --bin quote -- -c ./sale.json --config ./register.toml --commit
//! ```
//!
//! ## Snapshot Format
//! ```json
//! {
//!   "items": [ { "line_id": "…", "name": "Figaro Bracelet", "quantity": 1, … } ],
//!   "cart_discount": { "kind": "percent", "value": 1000 },
//!   "tip": 500,
//!   "inventory": [ { "id": "jr-gf", "item_type": "jump_ring", … } ]
//! }
//! ```
//!
//! Logging follows `RUST_LOG` (default `info,clasp=debug`).

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use clasp_core::cart::{CartAction, CartItem};
use clasp_core::checkout::{commit_components, MemoryLedger};
use clasp_core::config::RegisterConfig;
use clasp_core::reconcile::{component_cost, reconcile};
use clasp_core::types::{Discount, FeeHandling, InventoryItem};
use clasp_core::warnings::format_warnings;
use clasp_core::Money;

/// What `--cart` points at.
#[derive(Debug, Deserialize)]
struct QuoteInput {
    items: Vec<CartItem>,
    #[serde(default)]
    cart_discount: Discount,
    #[serde(default)]
    tip: Money,
    #[serde(default)]
    inventory: Vec<InventoryItem>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clasp=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    let mut cart_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut commit = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--cart" | "-c" => {
                if i + 1 < args.len() {
                    cart_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--commit" => commit = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let Some(cart_path) = cart_path else {
        print_help();
        return Err("--cart <PATH> is required".into());
    };

    let config = RegisterConfig::load(config_path)?;
    let input: QuoteInput = serde_json::from_str(&std::fs::read_to_string(&cart_path)?)?;

    // Build the cart through the reducer so every line is validated
    let mut snapshot = config
        .new_cart()
        .apply(CartAction::SetCartDiscount {
            discount: input.cart_discount,
        })?;
    for item in input.items {
        snapshot = snapshot.cart.apply(CartAction::AddItem { item })?;
    }
    snapshot = snapshot.cart.apply(CartAction::SetTip { amount: input.tip })?;

    let cart = &snapshot.cart;
    let totals = &snapshot.totals;
    let money = |m: Money| config.format_currency(m.cents());

    println!("{} Quote", config.register.store_name);
    println!("================================");
    for item in &cart.items {
        let length = item
            .measured_inches
            .map(|inches| format!(" ({})", inches))
            .unwrap_or_default();
        println!(
            "  {:<32} x{:<4} {:>10}",
            format!("{}{}", item.name, length),
            item.quantity,
            money(item.line_total())
        );
        if item.discount.is_effective() {
            println!("  {:<38} -{:>10}", "  item discount", money(item.discount_amount()));
        }
    }
    println!("--------------------------------");
    println!("  {:<38} {:>10}", "Items", money(totals.item_subtotal));
    if !totals.discount_amount.is_zero() {
        println!("  {:<38} -{:>10}", "Discount", money(totals.discount_amount));
    }
    println!("  {:<38} {:>10}", "Subtotal", money(totals.subtotal));
    println!(
        "  {:<38} {:>10}",
        format!("Tax ({})", cart.tax_rate),
        money(totals.tax_amount)
    );
    if !totals.tip_amount.is_zero() {
        println!("  {:<38} {:>10}", "Tip", money(totals.tip_amount));
    }
    if let Some(rate) = cart.platform_fee_rate {
        let label = match totals.fee_handling {
            FeeHandling::PassToCustomer => format!("Platform fee ({})", rate),
            FeeHandling::Absorb => format!("Platform fee ({}, absorbed)", rate),
        };
        println!("  {:<38} {:>10}", label, money(totals.platform_fee_amount));
    }
    println!("  {:<38} {:>10}", "TOTAL", money(totals.total));

    let resolutions = reconcile(&cart.items, &input.inventory);
    println!();
    println!("Jump rings");
    for r in &resolutions {
        println!(
            "  {:<32} {:>3}  {}",
            r.item_name,
            r.jump_rings_needed,
            r.matched_inventory_id.as_deref().unwrap_or("(unmatched)")
        );
    }
    println!("  component cost {}", money(component_cost(&resolutions)));

    let warnings = format_warnings(&resolutions, &input.inventory);
    if !warnings.is_empty() {
        println!();
        for w in &warnings {
            println!("⚠ {}", w);
        }
    }

    if commit {
        let ledger = MemoryLedger::new(input.inventory);
        println!();
        match commit_components(&ledger, &cart.items, config.checkout_policy()).await {
            Ok(outcome) => {
                for d in &outcome.draws {
                    println!("✓ Drew {} from {}", d.quantity, d.inventory_id);
                }
                for id in &outcome.reorder_needed {
                    println!("  Reorder: {}", id);
                }
            }
            Err(e) => println!("✗ Commit refused: {}", e),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Clasp POS Quote Tool");
    println!();
    println!("Usage: quote --cart <PATH> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --cart <PATH>    Cart snapshot JSON (items, inventory, discount, tip)");
    println!("      --config <PATH>  register.toml (default: platform config dir)");
    println!("      --commit         Simulate the stock draw against the snapshot inventory");
    println!("  -h, --help           Show this help message");
}
