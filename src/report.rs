use crate::inventory::{PortfolioValuation, SaleEntry, StatusGroup};
use crate::rollup::{MarketSummary, SectorSummary};
use crate::stats::ProductMetrics;
use std::fmt::Write;

/// Render the market overview as plain text.
///
/// Products are shown newest-movers-first (descending daily change); the
/// sector table keeps the roll-up's alphabetical order.
pub fn render_market_report(
    metrics: &[ProductMetrics],
    summary: &MarketSummary,
    sectors: &[SectorSummary],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Campo Mercado — Resumen de Mercado ===");
    let _ = writeln!(
        out,
        "Tendencia general: {:+.2}% | Productos: {}",
        summary.avg_change_pct, summary.product_count
    );
    if let Some(top) = &summary.top_performer {
        let _ = writeln!(out, "Mayor suba:  {} {:+.2}%", label(top), top.daily_change_pct);
    }
    if let Some(bottom) = &summary.bottom_performer {
        let _ = writeln!(out, "Mayor baja:  {} {:+.2}%", label(bottom), bottom.daily_change_pct);
    }
    if let Some(v) = &summary.most_volatile {
        let _ = writeln!(out, "Más volátil: {} {:.1}%", label(v), v.volatility_pct);
    }
    if let Some(v) = &summary.least_volatile {
        let _ = writeln!(out, "Menos volátil: {} {:.1}%", label(v), v.volatility_pct);
    }

    let _ = writeln!(out, "\n--- Sectores ---");
    for s in sectors {
        let _ = writeln!(
            out,
            "{:<20} {:+.2}% | vol {:.1}% | {} productos",
            s.category, s.avg_change_pct, s.avg_volatility_pct, s.product_count
        );
    }

    let _ = writeln!(out, "\n--- Productos (por variación diaria) ---");
    let mut rows: Vec<&ProductMetrics> = metrics.iter().collect();
    rows.sort_by(|a, b| {
        b.daily_change_pct
            .partial_cmp(&a.daily_change_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for m in rows {
        if !m.has_data() {
            let _ = writeln!(out, "{:<28} sin datos", label(m));
            continue;
        }
        let _ = writeln!(
            out,
            "{:<28} ${:<10.0} {:+7.2}% | sem {:+7.2}% | vol {:5.1}% | ma7 ${:.0}",
            label(m),
            m.current_price,
            m.daily_change_pct,
            m.weekly_change_pct,
            m.volatility_pct,
            m.moving_avg
        );
    }

    out
}

/// Render one user's portfolio valuation.
pub fn render_portfolio_report(
    valuation: &PortfolioValuation,
    groups: &[StatusGroup],
    recent: &[SaleEntry],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Inventario ===");
    let _ = writeln!(
        out,
        "Invertido: ${:.0} | Valor de mercado: ${:.0} | PnL: ${:+.0} ({:+.2}%)",
        valuation.total_invested,
        valuation.total_market_value,
        valuation.total_pnl,
        valuation.total_pnl_percent
    );

    for v in &valuation.items {
        if !v.product_found {
            let _ = writeln!(
                out,
                "{:<12} producto no encontrado | {} cajones",
                v.item.produce_id, v.item.quantity
            );
            continue;
        }
        let _ = writeln!(
            out,
            "{:<12} {:>5} cajones @ ${:<8.0} mercado ${:<8.0} PnL ${:+.0} ({:+.2}%) [{}]",
            v.product_name,
            v.item.quantity,
            v.item.purchase_price,
            v.market_price,
            v.pnl_total,
            v.pnl_percent,
            v.item.status
        );
    }

    if !groups.is_empty() {
        let _ = writeln!(out, "\n--- Por ubicación ---");
        for g in groups {
            let _ = writeln!(
                out,
                "{:<16} {:>6} cajones | ${:.0} invertido | {} lotes",
                g.status, g.quantity, g.invested, g.item_count
            );
        }
    }

    if !recent.is_empty() {
        let _ = writeln!(out, "\n--- Ventas recientes ---");
        for entry in recent {
            let _ = writeln!(
                out,
                "{} {:>5} cajones @ ${:.0} ({:?})",
                entry.sale.date.format("%Y-%m-%d"),
                entry.sale.quantity,
                entry.sale.price,
                entry.sale.status
            );
        }
    }

    out
}

fn label(m: &ProductMetrics) -> String {
    if m.variety.is_empty() {
        m.name.clone()
    } else {
        format!("{} {}", m.name, m.variety)
    }
}
