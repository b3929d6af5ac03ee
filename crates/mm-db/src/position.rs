//! `latest_position` — the durable cross-restart position cache (§4.8,
//! §6). The executor's `PositionTracker` upserts this on every
//! `syncFromPosition`/`updateFromFill` transition and reads it back once on
//! startup so a restart does not have to wait for the next exchange sync to
//! know its inventory.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone, Copy)]
pub struct LatestPosition {
    pub size: f64,
    pub entry_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub updated_ms: i64,
}

pub async fn upsert_latest_position(
    pool: &PgPool,
    exchange: &str,
    symbol: &str,
    size: f64,
    entry_price: Option<f64>,
    unrealized_pnl: Option<f64>,
    updated_ms: i64,
) -> Result<()> {
    sqlx::query(
        r#"insert into latest_position (exchange, symbol, size, entry_price, unrealized_pnl, updated_ms)
           values ($1, $2, $3, $4, $5, $6)
           on conflict (exchange, symbol) do update
           set size = excluded.size,
               entry_price = excluded.entry_price,
               unrealized_pnl = excluded.unrealized_pnl,
               updated_ms = excluded.updated_ms"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(size)
    .bind(entry_price)
    .bind(unrealized_pnl)
    .bind(updated_ms)
    .execute(pool)
    .await
    .context("upsert_latest_position failed")?;
    Ok(())
}

pub async fn fetch_latest_position(pool: &PgPool, exchange: &str, symbol: &str) -> Result<Option<LatestPosition>> {
    let row = sqlx::query(
        r#"select size, entry_price, unrealized_pnl, updated_ms
           from latest_position
           where exchange = $1 and symbol = $2"#,
    )
    .bind(exchange)
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("fetch_latest_position failed")?;

    row.map(|r| {
        Ok(LatestPosition {
            size: r.try_get("size")?,
            entry_price: r.try_get("entry_price")?,
            unrealized_pnl: r.try_get("unrealized_pnl")?,
            updated_ms: r.try_get("updated_ms")?,
        })
    })
    .transpose()
}
