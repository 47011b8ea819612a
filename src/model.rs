use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry for one product listing at the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Produce {
    pub id: String,
    pub name: String,
    /// Empty string when the listing has no named variety.
    #[serde(default)]
    pub variety: String,
    pub category: String,
    #[serde(default)]
    pub weight_per_crate: Option<f64>,
}

/// One appended price observation. Price changes never mutate old records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: String,
    pub produce_id: String,
    pub price: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    pub price: f64,
}

/// A produce joined with its full price history.
///
/// `history` is always present (empty when no records exist) and sorted
/// chronologically ascending by the aggregator. Views that want newest-first
/// re-sort on their side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedProduct {
    pub produce: Produce,
    pub history: Vec<PricePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    Pagado,
    Pendiente,
}

/// A sale recorded against an inventory lot. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub quantity: f64,
    pub price: f64,
    pub date: DateTime<Utc>,
    pub status: SaleStatus,
}

/// Fixed per-crate cost captured at lot creation time. Later edits to the
/// cost catalog do not touch this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub name: String,
    pub amount: f64,
}

/// One purchased lot of a product, owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub produce_id: String,
    /// Crates remaining in the lot.
    pub quantity: f64,
    /// Purchase price per crate.
    pub purchase_price: f64,
    pub purchase_date: DateTime<Utc>,
    /// Free-text location/state label, e.g. "En Reserva" or "Puesto 5".
    pub status: String,
    #[serde(default)]
    pub costs: Vec<CostSnapshot>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

/// Entry in a user's fixed-cost catalog (amount per crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cost {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

/// Agricultural news entry. AI-generated articles are ephemeral and carry no
/// summary; curated ones are persisted with one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub source: String,
    /// Markdown body, Spanish.
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Immutable read of the two shared collections. The engine recomputes every
/// derived view from one of these, never from incremental updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub produces: Vec<Produce>,
    pub prices: Vec<PriceRecord>,
}

/// One user's private sub-collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    pub inventory: Vec<InventoryItem>,
    pub costs: Vec<Cost>,
}

impl MarketSnapshot {
    /// Parse a snapshot exported from the document store as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl UserData {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
