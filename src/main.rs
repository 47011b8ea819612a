use chrono::Utc;
use mercado_analyzer::{inventory, loader, report, rollup, series, stats};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "mercado.db".to_string());
    let user_id = args.next();

    let snapshot = match loader::load_snapshot(&db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("no se pudo leer {db_path}: {e}");
            std::process::exit(1);
        }
    };

    let now = Utc::now();
    let aggregated = series::aggregate_snapshot(&snapshot);
    let metrics = stats::build_metrics(&aggregated, now);
    let summary = rollup::market_summary(&metrics);
    let sectors = rollup::sector_summaries(&metrics);

    print!("{}", report::render_market_report(&metrics, &summary, &sectors));

    if let Some(user_id) = user_id {
        let user = match loader::load_user_data(&db_path, &user_id) {
            Ok(u) => u,
            Err(e) => {
                eprintln!("no se pudo leer el inventario de {user_id}: {e}");
                std::process::exit(1);
            }
        };

        let valuation = inventory::value_portfolio(&user.inventory, &metrics);
        let groups = inventory::group_by_status(&user.inventory);
        let recent = inventory::recent_sales(&user.inventory);

        println!();
        print!("{}", report::render_portfolio_report(&valuation, &groups, &recent));
    }
}
