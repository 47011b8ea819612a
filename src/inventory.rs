use crate::model::{Cost, CostSnapshot, InventoryItem, Sale, SaleStatus};
use crate::stats::ProductMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum InventoryError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("requested quantity {requested} exceeds available {available}")]
    InsufficientQuantity { requested: f64, available: f64 },
    #[error("sale price must be greater than zero")]
    NonPositivePrice,
}

/// One lot joined against the current market price.
#[derive(Debug, Clone, Serialize)]
pub struct ValuedItem {
    pub item: InventoryItem,
    /// False when the produce reference no longer resolves (deleted product);
    /// the lot renders as "producto no encontrado" with a zero market price.
    pub product_found: bool,
    pub product_name: String,
    pub market_price: f64,
    pub pnl_per_unit: f64,
    pub pnl_total: f64,
    pub pnl_percent: f64,
    /// Sum of the fixed cost snapshots, per crate.
    pub fixed_cost_per_crate: f64,
    /// Purchase price plus fixed costs, per crate. Display figure only; the
    /// pnl fields above stay on the raw purchase price.
    pub all_in_unit_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioValuation {
    pub items: Vec<ValuedItem>,
    pub total_invested: f64,
    pub total_market_value: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusGroup {
    pub status: String,
    pub quantity: f64,
    pub invested: f64,
    pub item_count: usize,
}

/// A sale flattened out of its lot for the recent-activity view.
#[derive(Debug, Clone, Serialize)]
pub struct SaleEntry {
    pub item_id: String,
    pub produce_id: String,
    pub sale: Sale,
}

/// Value one lot against the product metrics map (produce id → metrics).
pub fn value_item(item: &InventoryItem, metrics: &HashMap<&str, &ProductMetrics>) -> ValuedItem {
    let (product_found, product_name, market_price) = match metrics.get(item.produce_id.as_str()) {
        Some(m) => (true, m.name.clone(), m.current_price),
        None => {
            debug!(item = %item.id, produce = %item.produce_id, "inventory lot references missing produce");
            (false, String::new(), 0.0)
        }
    };

    let pnl_per_unit = market_price - item.purchase_price;
    let pnl_percent = if item.purchase_price == 0.0 {
        0.0
    } else {
        pnl_per_unit / item.purchase_price * 100.0
    };
    let fixed_cost_per_crate: f64 = item.costs.iter().map(|c| c.amount).sum();

    ValuedItem {
        item: item.clone(),
        product_found,
        product_name,
        market_price,
        pnl_per_unit,
        pnl_total: pnl_per_unit * item.quantity,
        pnl_percent,
        fixed_cost_per_crate,
        all_in_unit_cost: item.purchase_price + fixed_cost_per_crate,
    }
}

/// Value every lot and roll the totals up.
pub fn value_portfolio(items: &[InventoryItem], metrics: &[ProductMetrics]) -> PortfolioValuation {
    let by_id: HashMap<&str, &ProductMetrics> =
        metrics.iter().map(|m| (m.produce_id.as_str(), m)).collect();

    let valued: Vec<ValuedItem> = items.iter().map(|i| value_item(i, &by_id)).collect();

    let total_invested: f64 = items.iter().map(|i| i.purchase_price * i.quantity).sum();
    let total_market_value: f64 = valued.iter().map(|v| v.market_price * v.item.quantity).sum();
    let total_pnl = total_market_value - total_invested;
    let total_pnl_percent = if total_invested == 0.0 {
        0.0
    } else {
        total_pnl / total_invested * 100.0
    };

    PortfolioValuation {
        items: valued,
        total_invested,
        total_market_value,
        total_pnl,
        total_pnl_percent,
    }
}

/// Sum quantity and invested value per status/location label, sorted by label.
pub fn group_by_status(items: &[InventoryItem]) -> Vec<StatusGroup> {
    let mut groups: BTreeMap<&str, StatusGroup> = BTreeMap::new();

    for item in items {
        let entry = groups.entry(item.status.as_str()).or_insert(StatusGroup {
            status: item.status.clone(),
            quantity: 0.0,
            invested: 0.0,
            item_count: 0,
        });
        entry.quantity += item.quantity;
        entry.invested += item.purchase_price * item.quantity;
        entry.item_count += 1;
    }

    groups.into_values().collect()
}

/// The five most recent sales across every lot, newest first.
pub fn recent_sales(items: &[InventoryItem]) -> Vec<SaleEntry> {
    let mut entries: Vec<SaleEntry> = items
        .iter()
        .flat_map(|item| {
            item.sales.iter().map(|sale| SaleEntry {
                item_id: item.id.clone(),
                produce_id: item.produce_id.clone(),
                sale: sale.clone(),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.sale.date.cmp(&a.sale.date));
    entries.truncate(5);
    entries
}

/// Build the cost snapshots for a new lot from the live cost catalog.
pub fn snapshot_costs(catalog: &[Cost]) -> Vec<CostSnapshot> {
    catalog
        .iter()
        .map(|c| CostSnapshot {
            name: c.name.clone(),
            amount: c.amount,
        })
        .collect()
}

/// Move `quantity` crates out of `item` into a new lot with `new_status`.
///
/// The new lot keeps the purchase price, date and cost snapshots, gets a
/// fresh id and an empty sale list. Rejected requests leave `item` untouched.
pub fn split(
    item: &mut InventoryItem,
    quantity: f64,
    new_status: &str,
) -> Result<InventoryItem, InventoryError> {
    if quantity <= 0.0 {
        return Err(InventoryError::NonPositiveQuantity);
    }
    if quantity > item.quantity {
        return Err(InventoryError::InsufficientQuantity {
            requested: quantity,
            available: item.quantity,
        });
    }

    item.quantity -= quantity;

    Ok(InventoryItem {
        id: Uuid::new_v4().to_string(),
        produce_id: item.produce_id.clone(),
        quantity,
        purchase_price: item.purchase_price,
        purchase_date: item.purchase_date,
        status: new_status.to_string(),
        costs: item.costs.clone(),
        sales: Vec::new(),
    })
}

/// Append a sale to the lot and reduce the remaining quantity.
///
/// A lot sold down to zero is kept as a closed historical record, not
/// deleted. Rejected requests leave `item` untouched.
pub fn record_sale(
    item: &mut InventoryItem,
    quantity: f64,
    price: f64,
    status: SaleStatus,
    date: DateTime<Utc>,
) -> Result<(), InventoryError> {
    if quantity <= 0.0 {
        return Err(InventoryError::NonPositiveQuantity);
    }
    if quantity > item.quantity {
        return Err(InventoryError::InsufficientQuantity {
            requested: quantity,
            available: item.quantity,
        });
    }
    if price <= 0.0 {
        return Err(InventoryError::NonPositivePrice);
    }

    item.sales.push(Sale {
        quantity,
        price,
        date,
        status,
    });
    item.quantity -= quantity;

    Ok(())
}
