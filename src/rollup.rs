use crate::stats::ProductMetrics;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Market-wide roll-up of the per-product metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    /// Mean daily change across every product ("market trend").
    pub avg_change_pct: f64,
    pub top_performer: Option<ProductMetrics>,
    pub bottom_performer: Option<ProductMetrics>,
    pub most_volatile: Option<ProductMetrics>,
    pub least_volatile: Option<ProductMetrics>,
    pub product_count: usize,
}

/// Per-category roll-up.
#[derive(Debug, Clone, Serialize)]
pub struct SectorSummary {
    pub category: String,
    pub avg_change_pct: f64,
    pub avg_volatility_pct: f64,
    pub top_performer: Option<ProductMetrics>,
    pub bottom_performer: Option<ProductMetrics>,
    pub product_count: usize,
}

pub fn market_summary(metrics: &[ProductMetrics]) -> MarketSummary {
    MarketSummary {
        avg_change_pct: mean_or_zero(metrics.iter().map(|m| m.daily_change_pct)),
        top_performer: pick(metrics.iter(), |m| m.daily_change_pct, Extreme::Max),
        bottom_performer: pick(metrics.iter(), |m| m.daily_change_pct, Extreme::Min),
        most_volatile: pick(metrics.iter(), |m| m.volatility_pct, Extreme::Max),
        least_volatile: pick(metrics.iter(), |m| m.volatility_pct, Extreme::Min),
        product_count: metrics.len(),
    }
}

/// Group by category and roll up each group. Output is sorted alphabetically
/// by category name so tables render deterministically.
pub fn sector_summaries(metrics: &[ProductMetrics]) -> Vec<SectorSummary> {
    let mut groups: BTreeMap<&str, Vec<&ProductMetrics>> = BTreeMap::new();
    for m in metrics {
        groups.entry(m.category.as_str()).or_default().push(m);
    }

    groups
        .into_iter()
        .map(|(category, members)| SectorSummary {
            category: category.to_string(),
            avg_change_pct: mean_or_zero(members.iter().map(|m| m.daily_change_pct)),
            avg_volatility_pct: mean_or_zero(members.iter().map(|m| m.volatility_pct)),
            top_performer: pick(members.iter().copied(), |m| m.daily_change_pct, Extreme::Max),
            bottom_performer: pick(members.iter().copied(), |m| m.daily_change_pct, Extreme::Min),
            product_count: members.len(),
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

impl Extreme {
    /// Strict comparison so the first-encountered product wins ties.
    fn beats(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Extreme::Max => candidate > incumbent,
            Extreme::Min => candidate < incumbent,
        }
    }
}

fn pick<'a>(
    metrics: impl Iterator<Item = &'a ProductMetrics>,
    key: impl Fn(&ProductMetrics) -> f64,
    extreme: Extreme,
) -> Option<ProductMetrics> {
    let mut best: Option<&ProductMetrics> = None;
    for m in metrics {
        match best {
            Some(b) if !extreme.beats(key(m), key(b)) => {}
            _ => best = Some(m),
        }
    }
    best.cloned()
}

fn mean_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        0.0
    } else {
        values.mean()
    }
}
