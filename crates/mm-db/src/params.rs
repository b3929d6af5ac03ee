//! `strategy_params` (§3, §4.6, §6). The applier is the only writer; see
//! [`promote`] for the demote-old/insert-new transition it performs
//! atomically.

use anyhow::{Context, Result};
use mm_types::{ParamsRow, StrategyParams};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_params(r: &sqlx::postgres::PgRow) -> Result<ParamsRow, sqlx::Error> {
    Ok(ParamsRow {
        params_set_id: r.try_get("params_set_id")?,
        created_ms: r.try_get("created_ms")?,
        params: StrategyParams {
            base_half_spread_bps: r.try_get("base_half_spread_bps")?,
            vol_spread_gain: r.try_get("vol_spread_gain")?,
            tox_spread_gain: r.try_get("tox_spread_gain")?,
            quote_size_usd: r.try_get("quote_size_usd")?,
            refresh_interval_ms: r.try_get("refresh_interval_ms")?,
            stale_cancel_ms: r.try_get("stale_cancel_ms")?,
            max_inventory: r.try_get("max_inventory")?,
            inventory_skew_gain: r.try_get("inventory_skew_gain")?,
            pause_mark_index_bps: r.try_get("pause_mark_index_bps")?,
            pause_liq_count_10s: r.try_get("pause_liq_count_10s")?,
        },
        is_current: r.try_get("is_current")?,
    })
}

pub async fn fetch_current_params(pool: &PgPool, exchange: &str, symbol: &str) -> Result<Option<ParamsRow>> {
    let row = sqlx::query(
        r#"select params_set_id, created_ms, is_current, base_half_spread_bps, vol_spread_gain,
                  tox_spread_gain, quote_size_usd, refresh_interval_ms, stale_cancel_ms,
                  max_inventory, inventory_skew_gain, pause_mark_index_bps, pause_liq_count_10s
           from strategy_params
           where exchange = $1 and symbol = $2 and is_current = true
           limit 1"#,
    )
    .bind(exchange)
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("fetch_current_params failed")?;

    row.map(|r| row_to_params(&r).map_err(Into::into)).transpose()
}

/// Insert `new_row` and mark it current, demoting the previous current row
/// for `(exchange, symbol)` in the same transaction — the only place a
/// `strategy_params.is_current` flag ever changes (§4.7, §9 single-writer
/// discipline).
pub async fn promote(pool: &PgPool, exchange: &str, symbol: &str, new_row: &ParamsRow) -> Result<()> {
    let mut tx = pool.begin().await.context("begin promote tx")?;

    sqlx::query(r#"update strategy_params set is_current = false where exchange = $1 and symbol = $2 and is_current = true"#)
        .bind(exchange)
        .bind(symbol)
        .execute(&mut *tx)
        .await
        .context("demote previous current params failed")?;

    let p = &new_row.params;
    sqlx::query(
        r#"insert into strategy_params
           (params_set_id, exchange, symbol, created_ms, is_current, base_half_spread_bps, vol_spread_gain,
            tox_spread_gain, quote_size_usd, refresh_interval_ms, stale_cancel_ms, max_inventory,
            inventory_skew_gain, pause_mark_index_bps, pause_liq_count_10s)
           values ($1, $2, $3, $4, true, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
    )
    .bind(new_row.params_set_id)
    .bind(exchange)
    .bind(symbol)
    .bind(new_row.created_ms)
    .bind(p.base_half_spread_bps)
    .bind(p.vol_spread_gain)
    .bind(p.tox_spread_gain)
    .bind(p.quote_size_usd)
    .bind(p.refresh_interval_ms)
    .bind(p.stale_cancel_ms)
    .bind(p.max_inventory)
    .bind(p.inventory_skew_gain)
    .bind(p.pause_mark_index_bps)
    .bind(p.pause_liq_count_10s)
    .execute(&mut *tx)
    .await
    .context("insert new current params failed")?;

    tx.commit().await.context("commit promote tx")?;
    Ok(())
}

pub async fn fetch_params_by_id(pool: &PgPool, params_set_id: Uuid) -> Result<Option<ParamsRow>> {
    let row = sqlx::query(
        r#"select params_set_id, created_ms, is_current, base_half_spread_bps, vol_spread_gain,
                  tox_spread_gain, quote_size_usd, refresh_interval_ms, stale_cancel_ms,
                  max_inventory, inventory_skew_gain, pause_mark_index_bps, pause_liq_count_10s
           from strategy_params where params_set_id = $1"#,
    )
    .bind(params_set_id)
    .fetch_optional(pool)
    .await
    .context("fetch_params_by_id failed")?;

    row.map(|r| row_to_params(&r).map_err(Into::into)).transpose()
}
