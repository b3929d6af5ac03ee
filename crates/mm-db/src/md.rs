//! `md_bbo`, `md_trade`, `md_price`, `latest_top` — append-only market-data
//! history plus the upsert-only latest-top cache (§6).

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct BboRow {
    pub ts: i64,
    pub exchange: String,
    pub symbol: String,
    pub best_bid_px: f64,
    pub best_bid_sz: f64,
    pub best_ask_px: f64,
    pub best_ask_sz: f64,
    pub mid_px: f64,
    pub seq: Option<i64>,
}

pub async fn insert_bbo(pool: &PgPool, row: &BboRow) -> Result<()> {
    sqlx::query(
        r#"insert into md_bbo (ts, exchange, symbol, best_bid_px, best_bid_sz, best_ask_px, best_ask_sz, mid_px, seq)
           values ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
    )
    .bind(row.ts)
    .bind(&row.exchange)
    .bind(&row.symbol)
    .bind(row.best_bid_px)
    .bind(row.best_bid_sz)
    .bind(row.best_ask_px)
    .bind(row.best_ask_sz)
    .bind(row.mid_px)
    .bind(row.seq)
    .execute(pool)
    .await
    .context("insert_bbo failed")?;
    Ok(())
}

/// Fetch BBO rows near `target_ts`, within `[target_ts - window_ms, target_ts + window_ms]`,
/// ordered by `ts`. Used by the enricher (`mm-enrich::closest_within`) and
/// by the executor to seed rolling windows after a restart.
pub async fn fetch_bbo_window(
    pool: &PgPool,
    exchange: &str,
    symbol: &str,
    target_ts: i64,
    window_ms: i64,
) -> Result<Vec<BboRow>> {
    let rows = sqlx::query(
        r#"select ts, exchange, symbol, best_bid_px, best_bid_sz, best_ask_px, best_ask_sz, mid_px, seq
           from md_bbo
           where exchange = $1 and symbol = $2 and ts between $3 and $4
           order by ts asc"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(target_ts - window_ms)
    .bind(target_ts + window_ms)
    .fetch_all(pool)
    .await
    .context("fetch_bbo_window failed")?;

    rows.into_iter()
        .map(|r| {
            Ok(BboRow {
                ts: r.try_get("ts")?,
                exchange: r.try_get("exchange")?,
                symbol: r.try_get("symbol")?,
                best_bid_px: r.try_get("best_bid_px")?,
                best_bid_sz: r.try_get("best_bid_sz")?,
                best_ask_px: r.try_get("best_ask_px")?,
                best_ask_sz: r.try_get("best_ask_sz")?,
                mid_px: r.try_get("mid_px")?,
                seq: r.try_get("seq")?,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TradeRow {
    pub ts: i64,
    pub exchange: String,
    pub symbol: String,
    pub trade_id: Option<String>,
    pub side: Option<String>,
    pub px: f64,
    pub sz: f64,
    pub kind: Option<String>,
}

pub async fn insert_trade(pool: &PgPool, row: &TradeRow) -> Result<()> {
    sqlx::query(
        r#"insert into md_trade (ts, exchange, symbol, trade_id, side, px, sz, kind)
           values ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(row.ts)
    .bind(&row.exchange)
    .bind(&row.symbol)
    .bind(&row.trade_id)
    .bind(&row.side)
    .bind(row.px)
    .bind(row.sz)
    .bind(&row.kind)
    .execute(pool)
    .await
    .context("insert_trade failed")?;
    Ok(())
}

pub async fn fetch_trade_window(
    pool: &PgPool,
    exchange: &str,
    symbol: &str,
    from_ts: i64,
    to_ts: i64,
) -> Result<Vec<TradeRow>> {
    let rows = sqlx::query(
        r#"select ts, exchange, symbol, trade_id, side, px, sz, kind
           from md_trade
           where exchange = $1 and symbol = $2 and ts between $3 and $4
           order by ts asc"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(from_ts)
    .bind(to_ts)
    .fetch_all(pool)
    .await
    .context("fetch_trade_window failed")?;

    rows.into_iter()
        .map(|r| {
            Ok(TradeRow {
                ts: r.try_get("ts")?,
                exchange: r.try_get("exchange")?,
                symbol: r.try_get("symbol")?,
                trade_id: r.try_get("trade_id")?,
                side: r.try_get("side")?,
                px: r.try_get("px")?,
                sz: r.try_get("sz")?,
                kind: r.try_get("kind")?,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PriceRow {
    pub ts: i64,
    pub exchange: String,
    pub symbol: String,
    pub mark_px: Option<f64>,
    pub index_px: Option<f64>,
}

pub async fn insert_price(pool: &PgPool, row: &PriceRow) -> Result<()> {
    sqlx::query(r#"insert into md_price (ts, exchange, symbol, mark_px, index_px) values ($1, $2, $3, $4, $5)"#)
        .bind(row.ts)
        .bind(&row.exchange)
        .bind(&row.symbol)
        .bind(row.mark_px)
        .bind(row.index_px)
        .execute(pool)
        .await
        .context("insert_price failed")?;
    Ok(())
}

pub async fn fetch_price_near(
    pool: &PgPool,
    exchange: &str,
    symbol: &str,
    target_ts: i64,
    tolerance_ms: i64,
) -> Result<Vec<PriceRow>> {
    let rows = sqlx::query(
        r#"select ts, exchange, symbol, mark_px, index_px
           from md_price
           where exchange = $1 and symbol = $2 and ts between $3 and $4
           order by ts asc"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(target_ts - tolerance_ms)
    .bind(target_ts + tolerance_ms)
    .fetch_all(pool)
    .await
    .context("fetch_price_near failed")?;

    rows.into_iter()
        .map(|r| {
            Ok(PriceRow {
                ts: r.try_get("ts")?,
                exchange: r.try_get("exchange")?,
                symbol: r.try_get("symbol")?,
                mark_px: r.try_get("mark_px")?,
                index_px: r.try_get("index_px")?,
            })
        })
        .collect()
}

/// Upsert the latest-top cache, throttled by the caller per §6's
/// `latestTopUpsertIntervalMs`.
pub async fn upsert_latest_top(
    pool: &PgPool,
    exchange: &str,
    symbol: &str,
    best_bid_px: f64,
    best_ask_px: f64,
    updated_ms: i64,
) -> Result<()> {
    sqlx::query(
        r#"insert into latest_top (exchange, symbol, best_bid_px, best_ask_px, updated_ms)
           values ($1, $2, $3, $4, $5)
           on conflict (exchange, symbol) do update
           set best_bid_px = excluded.best_bid_px,
               best_ask_px = excluded.best_ask_px,
               updated_ms = excluded.updated_ms"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(best_bid_px)
    .bind(best_ask_px)
    .bind(updated_ms)
    .execute(pool)
    .await
    .context("upsert_latest_top failed")?;
    Ok(())
}
