use crate::model::{
    Cost, CostSnapshot, InventoryItem, MarketSnapshot, PriceRecord, Produce, Sale, SaleStatus,
    UserData,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// Read the shared `produces` and `prices` collections from a local snapshot
/// database. Price rows with unparseable dates are skipped with a warning,
/// not surfaced as errors.
pub fn load_snapshot(db_path: &str) -> Result<MarketSnapshot, LoadError> {
    let conn = Connection::open(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT id, name, variety, category, weight_per_crate
         FROM produces
         ORDER BY name",
    )?;
    let produces: Vec<Produce> = stmt
        .query_map([], |row| {
            Ok(Produce {
                id: row.get(0)?,
                name: row.get(1)?,
                variety: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                category: row.get(3)?,
                weight_per_crate: row.get(4)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut stmt = conn.prepare(
        "SELECT id, produce_id, price, record_date
         FROM prices
         ORDER BY record_date",
    )?;
    let prices: Vec<PriceRecord> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .filter_map(|(id, produce_id, price, date)| {
            let date = parse_date(&id, &date)?;
            Some(PriceRecord { id, produce_id, price, date })
        })
        .collect();

    Ok(MarketSnapshot { produces, prices })
}

/// Read one user's `inventory` and `costs` sub-collections, reassembling the
/// sale and cost-snapshot rows into their lots.
pub fn load_user_data(db_path: &str, user_id: &str) -> Result<UserData, LoadError> {
    let conn = Connection::open(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT id, produce_id, quantity, purchase_price, purchase_date, status
         FROM inventory_items
         WHERE user_id = ?1
         ORDER BY purchase_date",
    )?;
    let mut inventory: Vec<InventoryItem> = stmt
        .query_map([user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .filter_map(|(id, produce_id, quantity, purchase_price, date, status)| {
            let purchase_date = parse_date(&id, &date)?;
            Some(InventoryItem {
                id,
                produce_id,
                quantity,
                purchase_price,
                purchase_date,
                status,
                costs: Vec::new(),
                sales: Vec::new(),
            })
        })
        .collect();

    let index: HashMap<String, usize> = inventory
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id.clone(), i))
        .collect();

    let mut stmt = conn.prepare(
        "SELECT c.item_id, c.name, c.amount
         FROM item_costs c
         JOIN inventory_items i ON c.item_id = i.id
         WHERE i.user_id = ?1",
    )?;
    let cost_rows: Vec<(String, String, f64)> = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .filter_map(|r| r.ok())
        .collect();
    for (item_id, name, amount) in cost_rows {
        if let Some(&i) = index.get(&item_id) {
            inventory[i].costs.push(CostSnapshot { name, amount });
        }
    }

    let mut stmt = conn.prepare(
        "SELECT s.item_id, s.quantity, s.price, s.sale_date, s.status
         FROM sales s
         JOIN inventory_items i ON s.item_id = i.id
         WHERE i.user_id = ?1
         ORDER BY s.sale_date",
    )?;
    let sale_rows: Vec<(String, f64, f64, String, String)> = stmt
        .query_map([user_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .filter_map(|r| r.ok())
        .collect();
    for (item_id, quantity, price, date, status) in sale_rows {
        let (Some(&i), Some(date), Some(status)) = (
            index.get(&item_id),
            parse_date(&item_id, &date),
            parse_status(&item_id, &status),
        ) else {
            continue;
        };
        inventory[i].sales.push(Sale { quantity, price, date, status });
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, amount FROM costs WHERE user_id = ?1 ORDER BY name",
    )?;
    let costs: Vec<Cost> = stmt
        .query_map([user_id], |row| {
            Ok(Cost {
                id: row.get(0)?,
                name: row.get(1)?,
                amount: row.get(2)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(UserData { inventory, costs })
}

fn parse_date(row_id: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(d) => Some(d.with_timezone(&Utc)),
        Err(e) => {
            warn!(row = %row_id, raw, error = %e, "skipping row with unparseable date");
            None
        }
    }
}

fn parse_status(row_id: &str, raw: &str) -> Option<SaleStatus> {
    match raw {
        "Pagado" => Some(SaleStatus::Pagado),
        "Pendiente" => Some(SaleStatus::Pendiente),
        other => {
            warn!(row = %row_id, status = other, "skipping sale with unknown status");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE produces (id TEXT PRIMARY KEY, name TEXT, variety TEXT, category TEXT, weight_per_crate REAL);
             CREATE TABLE prices (id TEXT PRIMARY KEY, produce_id TEXT, price REAL, record_date TEXT);
             CREATE TABLE inventory_items (id TEXT PRIMARY KEY, user_id TEXT, produce_id TEXT, quantity REAL, purchase_price REAL, purchase_date TEXT, status TEXT);
             CREATE TABLE item_costs (item_id TEXT, name TEXT, amount REAL);
             CREATE TABLE sales (item_id TEXT, quantity REAL, price REAL, sale_date TEXT, status TEXT);
             CREATE TABLE costs (id TEXT PRIMARY KEY, user_id TEXT, name TEXT, amount REAL);

             INSERT INTO produces VALUES ('p1', 'Tomate', 'Redondo', 'Verduras', 20.0);
             INSERT INTO produces VALUES ('p2', 'Lechuga', NULL, 'Verduras', NULL);
             INSERT INTO prices VALUES ('r1', 'p1', 3100.0, '2026-08-18T12:00:00Z');
             INSERT INTO prices VALUES ('r2', 'p1', 3200.0, '2026-08-19T12:00:00Z');
             INSERT INTO prices VALUES ('r3', 'p2', 500.0, 'not-a-date');

             INSERT INTO inventory_items VALUES ('i1', 'u1', 'p1', 10.0, 2000.0, '2026-08-10T09:00:00Z', 'En Reserva');
             INSERT INTO item_costs VALUES ('i1', 'Flete', 100.0);
             INSERT INTO sales VALUES ('i1', 2.0, 2500.0, '2026-08-15T09:00:00Z', 'Pagado');
             INSERT INTO sales VALUES ('i1', 1.0, 2400.0, '2026-08-16T09:00:00Z', 'Quizas');
             INSERT INTO costs VALUES ('c1', 'u1', 'Flete', 100.0);",
        )
        .unwrap();
    }

    #[test]
    fn snapshot_skips_bad_dates() {
        let dir = std::env::temp_dir().join(format!("mercado-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.db");
        let _ = std::fs::remove_file(&path);

        let conn = Connection::open(&path).unwrap();
        seed(&conn);
        drop(conn);

        let snapshot = load_snapshot(path.to_str().unwrap()).unwrap();
        assert_eq!(snapshot.produces.len(), 2);
        // Ordered by name: Lechuga first, its NULL variety read as empty.
        assert_eq!(snapshot.produces[0].name, "Lechuga");
        assert_eq!(snapshot.produces[0].variety, "");
        assert_eq!(snapshot.produces[1].variety, "Redondo");
        assert_eq!(snapshot.prices.len(), 2);

        let user = load_user_data(path.to_str().unwrap(), "u1").unwrap();
        assert_eq!(user.inventory.len(), 1);
        assert_eq!(user.inventory[0].costs.len(), 1);
        // The sale with the unknown status is dropped.
        assert_eq!(user.inventory[0].sales.len(), 1);
        assert_eq!(user.costs.len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
