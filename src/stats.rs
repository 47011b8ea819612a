use crate::model::AggregatedProduct;
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Window for the moving average, in price records.
pub const MOVING_AVG_WINDOW: usize = 7;

/// Per-product derived figures, recomputed from scratch on every snapshot.
///
/// All numeric fields report 0.0 when the history is empty; callers that need
/// to distinguish "no data" from a genuine zero check `data_points`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMetrics {
    pub produce_id: String,
    pub name: String,
    pub variety: String,
    pub category: String,

    pub current_price: f64,
    pub prior_price: f64,

    pub daily_change_pct: f64,
    pub weekly_change_pct: f64,

    /// Coefficient of variation over the full history, as a percentage.
    pub volatility_pct: f64,
    /// Mean of the last `MOVING_AVG_WINDOW` records (or fewer).
    pub moving_avg: f64,

    pub data_points: usize,
}

impl ProductMetrics {
    pub fn has_data(&self) -> bool {
        self.data_points > 0
    }
}

/// Compute metrics for every aggregated product. Pure; `now` anchors the
/// weekly lookback so results are reproducible in tests.
pub fn build_metrics(products: &[AggregatedProduct], now: DateTime<Utc>) -> Vec<ProductMetrics> {
    products
        .par_iter()
        .map(|p| product_metrics(p, now))
        .collect()
}

/// Metrics for a single product. History is assumed chronological ascending
/// (the aggregator's output order).
pub fn product_metrics(product: &AggregatedProduct, now: DateTime<Utc>) -> ProductMetrics {
    let prices: Vec<f64> = product.history.iter().map(|p| p.price).collect();

    let current = prices.last().copied().unwrap_or(0.0);
    let prior = if prices.len() > 1 {
        prices[prices.len() - 2]
    } else {
        current
    };

    let weekly_ref = closest_price(product, now - Duration::days(7)).unwrap_or(current);

    ProductMetrics {
        produce_id: product.produce.id.clone(),
        name: product.produce.name.clone(),
        variety: product.produce.variety.clone(),
        category: product.produce.category.clone(),
        current_price: current,
        prior_price: prior,
        daily_change_pct: pct_change(current, prior),
        weekly_change_pct: pct_change(current, weekly_ref),
        volatility_pct: volatility_pct(&prices),
        moving_avg: moving_average(&prices, MOVING_AVG_WINDOW),
        data_points: prices.len(),
    }
}

/// Percent change from `prior` to `current`; 0 when prior is 0 so a missing
/// baseline reads as flat, never as infinite.
pub fn pct_change(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        0.0
    } else {
        (current - prior) / prior * 100.0
    }
}

/// Coefficient of variation (population std dev / mean) as a percentage.
pub fn volatility_pct(prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }

    let mean = prices.iter().mean();
    if mean == 0.0 {
        return 0.0;
    }

    prices.iter().population_std_dev() / mean * 100.0
}

/// Mean of the last `min(window, len)` chronological entries.
pub fn moving_average(prices: &[f64], window: usize) -> f64 {
    if prices.is_empty() || window == 0 {
        return 0.0;
    }

    let start = prices.len().saturating_sub(window);
    prices[start..].iter().mean()
}

/// The price whose record date is closest (by absolute distance) to `target`.
/// Earlier records win ties; exact ties are measure-zero in live data.
fn closest_price(product: &AggregatedProduct, target: DateTime<Utc>) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;

    for point in &product.history {
        let dist = (point.date - target).num_milliseconds().abs();
        match best {
            Some((best_dist, _)) if dist >= best_dist => {}
            _ => best = Some((dist, point.price)),
        }
    }

    best.map(|(_, price)| price)
}

/// Min/max current price across listings of the same (name, variety) from
/// different sellers. Zero prices mean "no data" and are excluded; `None`
/// when no listing has data.
pub fn market_range(listings: &[&ProductMetrics]) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;

    for m in listings {
        if m.current_price <= 0.0 {
            continue;
        }
        range = Some(match range {
            None => (m.current_price, m.current_price),
            Some((lo, hi)) => (lo.min(m.current_price), hi.max(m.current_price)),
        });
    }

    range
}

/// Group a metrics list by (name, variety) and compute each group's range.
pub fn market_ranges(metrics: &[ProductMetrics]) -> Vec<((String, String), (f64, f64))> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<(String, String), Vec<&ProductMetrics>> = BTreeMap::new();
    for m in metrics {
        groups
            .entry((m.name.clone(), m.variety.clone()))
            .or_default()
            .push(m);
    }

    groups
        .into_iter()
        .filter_map(|(key, listings)| market_range(&listings).map(|r| (key, r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, Produce};
    use chrono::TimeZone;

    fn tomate(history: &[(i64, f64)]) -> AggregatedProduct {
        let base = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        AggregatedProduct {
            produce: Produce {
                id: "p1".into(),
                name: "Tomate".into(),
                variety: "Redondo".into(),
                category: "Verduras".into(),
                weight_per_crate: Some(20.0),
            },
            history: history
                .iter()
                .map(|&(day_offset, price)| PricePoint {
                    date: base + Duration::days(day_offset),
                    price,
                })
                .collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_history_reports_zeroes() {
        let m = product_metrics(&tomate(&[]), now());
        assert_eq!(m.current_price, 0.0);
        assert_eq!(m.prior_price, 0.0);
        assert_eq!(m.daily_change_pct, 0.0);
        assert_eq!(m.weekly_change_pct, 0.0);
        assert_eq!(m.volatility_pct, 0.0);
        assert_eq!(m.moving_avg, 0.0);
        assert!(!m.has_data());
    }

    #[test]
    fn single_record_means_flat() {
        let m = product_metrics(&tomate(&[(0, 3200.0)]), now());
        assert_eq!(m.current_price, 3200.0);
        assert_eq!(m.prior_price, 3200.0);
        assert_eq!(m.daily_change_pct, 0.0);
        assert_eq!(m.weekly_change_pct, 0.0);
        assert!(m.has_data());
    }

    #[test]
    fn daily_change_from_last_two_records() {
        // Scenario A from the product sheet: 3100, 3300, 3200 ascending.
        let m = product_metrics(&tomate(&[(-2, 3100.0), (-1, 3300.0), (0, 3200.0)]), now());
        assert_eq!(m.current_price, 3200.0);
        assert_eq!(m.prior_price, 3300.0);
        assert!((m.daily_change_pct - (-100.0 / 3300.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_prior_gives_zero_change() {
        let m = product_metrics(&tomate(&[(-1, 0.0), (0, 3200.0)]), now());
        assert_eq!(m.daily_change_pct, 0.0);
    }

    #[test]
    fn weekly_change_uses_closest_record() {
        // Records at -9d, -6d, 0d; -6d is closest to the 7-day lookback.
        let m = product_metrics(&tomate(&[(-9, 2800.0), (-6, 3000.0), (0, 3300.0)]), now());
        assert!((m.weekly_change_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn weekly_tie_goes_to_earlier_record() {
        // -8d and -6d are equidistant from -7d; the chronological scan keeps
        // the first match.
        let m = product_metrics(&tomate(&[(-8, 2000.0), (-6, 4000.0), (0, 3000.0)]), now());
        assert!((m.weekly_change_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_is_population_cv() {
        // Prices 2, 4: mean 3, population std dev 1 → CV 33.33%.
        let m = product_metrics(&tomate(&[(-1, 2.0), (0, 4.0)]), now());
        assert!((m.volatility_pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_scale_invariant() {
        let base = product_metrics(&tomate(&[(-2, 3100.0), (-1, 3300.0), (0, 3200.0)]), now());
        let scaled = product_metrics(
            &tomate(&[(-2, 3100.0 * 4.5), (-1, 3300.0 * 4.5), (0, 3200.0 * 4.5)]),
            now(),
        );
        assert!((base.volatility_pct - scaled.volatility_pct).abs() < 1e-9);
    }

    #[test]
    fn moving_average_degenerate_window() {
        let prices = [1.0, 2.0, 3.0];
        assert_eq!(moving_average(&prices, 10), 2.0);
        assert_eq!(moving_average(&prices, 3), 2.0);
        assert_eq!(moving_average(&prices, 2), 2.5);
        assert_eq!(moving_average(&[], 7), 0.0);
    }

    #[test]
    fn market_range_excludes_no_data_listings() {
        let mk = |id: &str, price: f64| {
            let mut p = tomate(&[]);
            p.produce.id = id.into();
            if price > 0.0 {
                p.history.push(PricePoint { date: now(), price });
            }
            product_metrics(&p, now())
        };
        let a = mk("p1", 3200.0);
        let b = mk("p2", 3100.0);
        let empty = mk("p3", 0.0);

        assert_eq!(market_range(&[&a, &b, &empty]), Some((3100.0, 3200.0)));
        assert_eq!(market_range(&[&empty]), None);
    }

    #[test]
    fn market_ranges_groups_by_name_and_variety() {
        let mut perita = tomate(&[(0, 2000.0)]);
        perita.produce.id = "p9".into();
        perita.produce.variety = "Perita".into();

        let metrics = build_metrics(
            &[tomate(&[(0, 3200.0)]), tomate(&[(0, 3100.0)]), perita],
            now(),
        );
        let ranges = market_ranges(&metrics);
        assert_eq!(ranges.len(), 2);

        let redondo = ranges
            .iter()
            .find(|((_, v), _)| v == "Redondo")
            .map(|(_, r)| *r);
        assert_eq!(redondo, Some((3100.0, 3200.0)));
    }
}
