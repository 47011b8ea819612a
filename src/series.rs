use crate::model::{AggregatedProduct, PricePoint, PriceRecord, Produce};
use std::collections::HashMap;
use tracing::debug;

/// Bucket raw price records by product identifier.
///
/// The buckets preserve input order and are NOT sorted by date; each consumer
/// sorts in the direction it needs (ascending for charts and metrics,
/// descending for "current state" tables).
pub fn build_series(records: &[PriceRecord]) -> HashMap<String, Vec<PricePoint>> {
    let mut map: HashMap<String, Vec<PricePoint>> = HashMap::new();

    for rec in records {
        map.entry(rec.produce_id.clone()).or_default().push(PricePoint {
            date: rec.date,
            price: rec.price,
        });
    }

    map
}

/// Join the produce catalog with its price series.
///
/// Every produce yields exactly one entry, with an empty history when no
/// records exist. History comes out sorted ascending by date. Buckets whose
/// product id does not resolve belong to deleted produces (the cascading
/// delete is not atomic) and are dropped here.
pub fn aggregate_products(
    produces: &[Produce],
    mut series: HashMap<String, Vec<PricePoint>>,
) -> Vec<AggregatedProduct> {
    let mut results = Vec::with_capacity(produces.len());

    for produce in produces {
        let mut history = series.remove(&produce.id).unwrap_or_default();
        history.sort_by_key(|p| p.date);

        results.push(AggregatedProduct {
            produce: produce.clone(),
            history,
        });
    }

    if !series.is_empty() {
        debug!(orphaned = series.len(), "dropping price buckets with no matching produce");
    }

    results
}

/// Convenience over [`build_series`] + [`aggregate_products`].
pub fn aggregate_snapshot(snapshot: &crate::model::MarketSnapshot) -> Vec<AggregatedProduct> {
    aggregate_products(&snapshot.produces, build_series(&snapshot.prices))
}

/// Filter an aggregate list by product-name prefix (case-insensitive).
/// Operates on the derived list only; the aggregate itself is never mutated.
pub fn filter_by_name_prefix<'a>(
    products: &'a [AggregatedProduct],
    prefix: &str,
) -> Vec<&'a AggregatedProduct> {
    let prefix = prefix.to_lowercase();
    products
        .iter()
        .filter(|p| p.produce.name.to_lowercase().starts_with(&prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn produce(id: &str, name: &str) -> Produce {
        Produce {
            id: id.into(),
            name: name.into(),
            variety: String::new(),
            category: "Verduras".into(),
            weight_per_crate: None,
        }
    }

    fn record(id: &str, produce_id: &str, price: f64, day: u32) -> PriceRecord {
        PriceRecord {
            id: id.into(),
            produce_id: produce_id.into(),
            price,
            date: Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn buckets_by_product() {
        let records = vec![
            record("r1", "p1", 3100.0, 1),
            record("r2", "p2", 500.0, 1),
            record("r3", "p1", 3200.0, 2),
        ];
        let series = build_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series["p1"].len(), 2);
        assert_eq!(series["p2"].len(), 1);
    }

    #[test]
    fn every_produce_gets_an_entry() {
        let produces = vec![produce("p1", "Tomate"), produce("p2", "Lechuga")];
        let records = vec![record("r1", "p1", 3100.0, 1)];
        let agg = aggregate_products(&produces, build_series(&records));

        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].history.len(), 1);
        assert!(agg[1].history.is_empty());
    }

    #[test]
    fn history_sorted_ascending() {
        let produces = vec![produce("p1", "Tomate")];
        let records = vec![
            record("r1", "p1", 3200.0, 3),
            record("r2", "p1", 3100.0, 1),
            record("r3", "p1", 3300.0, 2),
        ];
        let agg = aggregate_products(&produces, build_series(&records));
        let prices: Vec<f64> = agg[0].history.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![3100.0, 3300.0, 3200.0]);
    }

    #[test]
    fn orphaned_records_are_dropped() {
        // Mid-delete snapshot: the produce is gone, its prices are not yet.
        let produces = vec![produce("p1", "Tomate")];
        let records = vec![
            record("r1", "p1", 3100.0, 1),
            record("r2", "deleted", 900.0, 1),
        ];
        let agg = aggregate_products(&produces, build_series(&records));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].produce.id, "p1");
    }

    #[test]
    fn prefix_filter_is_case_insensitive() {
        let produces = vec![produce("p1", "Tomate"), produce("p2", "Lechuga")];
        let agg = aggregate_products(&produces, HashMap::new());
        let hits = filter_by_name_prefix(&agg, "t");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].produce.name, "Tomate");
    }
}
