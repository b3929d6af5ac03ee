//! `ex_order_event`, `ex_fill`, `fills_enriched` (§3, §4.5, §6).

use anyhow::{Context, Result};
use mm_types::{EnrichedFill, Fill, Liquidity, Side};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

fn side_from_str(s: &str) -> Side {
    match s {
        "sell" => Side::Sell,
        _ => Side::Buy,
    }
}

fn liquidity_str(liquidity: Liquidity) -> &'static str {
    match liquidity {
        Liquidity::Maker => "maker",
        Liquidity::Taker => "taker",
    }
}

fn mode_str(mode: mm_types::Mode) -> &'static str {
    match mode {
        mm_types::Mode::Normal => "normal",
        mm_types::Mode::Defensive => "defensive",
        mm_types::Mode::Pause => "pause",
    }
}

pub async fn insert_order_event(
    pool: &PgPool,
    ts: i64,
    exchange: &str,
    symbol: &str,
    client_order_id: &str,
    event_type: &str,
    side: Option<Side>,
    px: Option<f64>,
    sz: Option<f64>,
    reason_codes: &[String],
) -> Result<()> {
    sqlx::query(
        r#"insert into ex_order_event (ts, exchange, symbol, client_order_id, event_type, side, px, sz, reason_codes)
           values ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
    )
    .bind(ts)
    .bind(exchange)
    .bind(symbol)
    .bind(client_order_id)
    .bind(event_type)
    .bind(side.map(side_str))
    .bind(px)
    .bind(sz)
    .bind(serde_json::to_value(reason_codes).unwrap_or_default())
    .execute(pool)
    .await
    .context("insert_order_event failed")?;
    Ok(())
}

pub async fn insert_fill(pool: &PgPool, fill: &Fill) -> Result<()> {
    sqlx::query(
        r#"insert into ex_fill (id, ts, exchange, symbol, client_order_id, side, fill_px, fill_sz, liquidity, state, params_set_id)
           values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
           on conflict (id) do nothing"#,
    )
    .bind(fill.id)
    .bind(fill.ts)
    .bind(&fill.exchange)
    .bind(&fill.symbol)
    .bind(&fill.client_order_id)
    .bind(side_str(fill.side))
    .bind(fill.fill_px.as_str())
    .bind(fill.fill_sz.as_str())
    .bind(liquidity_str(fill.liquidity))
    .bind(mode_str(fill.state))
    .bind(fill.params_set_id)
    .execute(pool)
    .await
    .context("insert_fill failed")?;
    Ok(())
}

/// Fills eligible for enrichment right now: reported more than
/// [`mm_enrich::horizon::ENRICHMENT_HORIZON_MS`] ago and not yet present in
/// `fills_enriched`.
pub async fn fetch_unenriched_fills(pool: &PgPool, now_ms: i64, horizon_ms: i64) -> Result<Vec<Fill>> {
    let rows = sqlx::query(
        r#"select f.id, f.ts, f.exchange, f.symbol, f.client_order_id, f.side, f.fill_px, f.fill_sz, f.liquidity, f.state, f.params_set_id
           from ex_fill f
           left join fills_enriched e on e.fill_id = f.id
           where e.fill_id is null and f.ts <= $1
           order by f.ts asc"#,
    )
    .bind(now_ms - horizon_ms)
    .fetch_all(pool)
    .await
    .context("fetch_unenriched_fills failed")?;

    rows.into_iter()
        .map(|r| {
            let side: String = r.try_get("side")?;
            let liquidity: String = r.try_get("liquidity")?;
            let state: String = r.try_get("state")?;
            Ok(Fill {
                id: r.try_get("id")?,
                ts: r.try_get("ts")?,
                exchange: r.try_get("exchange")?,
                symbol: r.try_get("symbol")?,
                client_order_id: r.try_get("client_order_id")?,
                side: side_from_str(&side),
                fill_px: mm_types::PriceStr::new(r.try_get::<String, _>("fill_px")?),
                fill_sz: mm_types::SizeStr::new(r.try_get::<String, _>("fill_sz")?),
                liquidity: if liquidity == "taker" { Liquidity::Taker } else { Liquidity::Maker },
                state: match state.as_str() {
                    "defensive" => mm_types::Mode::Defensive,
                    "pause" => mm_types::Mode::Pause,
                    _ => mm_types::Mode::Normal,
                },
                params_set_id: r.try_get("params_set_id")?,
            })
        })
        .collect()
}

pub async fn insert_enriched_fill(pool: &PgPool, ef: &EnrichedFill) -> Result<()> {
    sqlx::query(
        r#"insert into fills_enriched
           (fill_id, ts, side, fill_px, fill_sz, mid_t0, mid_t1s, mid_t10s, mid_t60s,
            markout_1s_bps, markout_10s_bps, markout_60s_bps, spread_bps_t0,
            trade_imbalance_1s_t0, realized_vol_10s_t0, mark_index_div_bps_t0,
            liq_count_10s_t0, state, params_set_id)
           values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
           on conflict (fill_id) do nothing"#,
    )
    .bind(ef.fill_id)
    .bind(ef.ts)
    .bind(side_str(ef.side))
    .bind(ef.fill_px.as_str())
    .bind(ef.fill_sz.as_str())
    .bind(ef.mid_t0)
    .bind(ef.mid_t1s)
    .bind(ef.mid_t10s)
    .bind(ef.mid_t60s)
    .bind(ef.markout_1s_bps)
    .bind(ef.markout_10s_bps)
    .bind(ef.markout_60s_bps)
    .bind(ef.spread_bps_t0)
    .bind(ef.trade_imbalance_1s_t0)
    .bind(ef.realized_vol_10s_t0)
    .bind(ef.mark_index_div_bps_t0)
    .bind(ef.liq_count_10s_t0.map(|v| v as i32))
    .bind(mode_str(ef.state))
    .bind(ef.params_set_id)
    .execute(pool)
    .await
    .context("insert_enriched_fill failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct EnrichedFillRow {
    pub fill_id: Uuid,
    pub ts: i64,
    pub markout_10s_bps: Option<f64>,
}

pub async fn fetch_enriched_fills_window(
    pool: &PgPool,
    from_ts: i64,
    to_ts: i64,
) -> Result<Vec<EnrichedFillRow>> {
    let rows = sqlx::query(
        r#"select fill_id, ts, markout_10s_bps from fills_enriched where ts between $1 and $2 order by ts asc"#,
    )
    .bind(from_ts)
    .bind(to_ts)
    .fetch_all(pool)
    .await
    .context("fetch_enriched_fills_window failed")?;

    rows.into_iter()
        .map(|r| {
            Ok(EnrichedFillRow {
                fill_id: r.try_get("fill_id")?,
                ts: r.try_get("ts")?,
                markout_10s_bps: r.try_get("markout_10s_bps")?,
            })
        })
        .collect()
}

/// The full `fills_enriched` rows in `[from_ts, to_ts]`, for the reflector's
/// window aggregator (§4.5) — unlike [`fetch_enriched_fills_window`], which
/// only carries the three fields the applier's operational gate needs.
pub async fn fetch_enriched_fills_full_window(pool: &PgPool, from_ts: i64, to_ts: i64) -> Result<Vec<EnrichedFill>> {
    let rows = sqlx::query(
        r#"select fill_id, ts, side, fill_px, fill_sz, mid_t0, mid_t1s, mid_t10s, mid_t60s,
                  markout_1s_bps, markout_10s_bps, markout_60s_bps, spread_bps_t0,
                  trade_imbalance_1s_t0, realized_vol_10s_t0, mark_index_div_bps_t0,
                  liq_count_10s_t0, state, params_set_id
           from fills_enriched where ts between $1 and $2 order by ts asc"#,
    )
    .bind(from_ts)
    .bind(to_ts)
    .fetch_all(pool)
    .await
    .context("fetch_enriched_fills_full_window failed")?;

    rows.into_iter()
        .map(|r| {
            let side: String = r.try_get("side")?;
            let state: String = r.try_get("state")?;
            let liq_count_10s_t0: Option<i32> = r.try_get("liq_count_10s_t0")?;
            Ok(EnrichedFill {
                fill_id: r.try_get("fill_id")?,
                ts: r.try_get("ts")?,
                side: side_from_str(&side),
                fill_px: mm_types::PriceStr::new(r.try_get::<String, _>("fill_px")?),
                fill_sz: mm_types::SizeStr::new(r.try_get::<String, _>("fill_sz")?),
                mid_t0: r.try_get("mid_t0")?,
                mid_t1s: r.try_get("mid_t1s")?,
                mid_t10s: r.try_get("mid_t10s")?,
                mid_t60s: r.try_get("mid_t60s")?,
                markout_1s_bps: r.try_get("markout_1s_bps")?,
                markout_10s_bps: r.try_get("markout_10s_bps")?,
                markout_60s_bps: r.try_get("markout_60s_bps")?,
                spread_bps_t0: r.try_get("spread_bps_t0")?,
                trade_imbalance_1s_t0: r.try_get("trade_imbalance_1s_t0")?,
                realized_vol_10s_t0: r.try_get("realized_vol_10s_t0")?,
                mark_index_div_bps_t0: r.try_get("mark_index_div_bps_t0")?,
                liq_count_10s_t0: liq_count_10s_t0.map(|v| v as u32),
                state: match state.as_str() {
                    "defensive" => mm_types::Mode::Defensive,
                    "pause" => mm_types::Mode::Pause,
                    _ => mm_types::Mode::Normal,
                },
                params_set_id: r.try_get("params_set_id")?,
            })
        })
        .collect()
}

/// Count of `ex_order_event` rows of `event_type` in `[from_ts, to_ts]` —
/// used for the aggregator's `cancelCount` (§4.5).
pub async fn count_order_events(pool: &PgPool, exchange: &str, symbol: &str, event_type: &str, from_ts: i64, to_ts: i64) -> Result<u32> {
    let row = sqlx::query(
        r#"select count(*) as n from ex_order_event
           where exchange = $1 and symbol = $2 and event_type = $3 and ts between $4 and $5"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(event_type)
    .bind(from_ts)
    .bind(to_ts)
    .fetch_one(pool)
    .await
    .context("count_order_events failed")?;
    let n: i64 = row.try_get("n")?;
    Ok(n.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_round_trips_through_its_string_form() {
        assert_eq!(side_from_str(side_str(Side::Buy)), Side::Buy);
        assert_eq!(side_from_str(side_str(Side::Sell)), Side::Sell);
    }

    #[test]
    fn side_from_str_defaults_unknown_to_buy() {
        assert_eq!(side_from_str("garbage"), Side::Buy);
    }

    #[test]
    fn side_str_matches_column_convention() {
        assert_eq!(side_str(Side::Buy), "buy");
        assert_eq!(side_str(Side::Sell), "sell");
    }

    #[test]
    fn liquidity_str_matches_column_convention() {
        assert_eq!(liquidity_str(Liquidity::Maker), "maker");
        assert_eq!(liquidity_str(Liquidity::Taker), "taker");
    }

    #[test]
    fn mode_str_matches_column_convention() {
        assert_eq!(mode_str(mm_types::Mode::Normal), "normal");
        assert_eq!(mode_str(mm_types::Mode::Defensive), "defensive");
        assert_eq!(mode_str(mm_types::Mode::Pause), "pause");
    }
}
