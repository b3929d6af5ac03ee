//! Gathers the neighborhood observations `mm_enrich::enrich_fill` needs
//! from `mm-db` and persists the result (§4.5). Runs off the fill
//! consumer's enrichment queue, not on the tick driver's hot path.

use mm_enrich::{enrich_fill, is_eligible, BboObs, EnrichmentInputs, MarkObs, MidObs, TradeObs, ENRICHMENT_HORIZON_MS};
use mm_types::{EnrichedFill, Ms, Side};
use sqlx::PgPool;

/// Covers every horizon tolerance (largest is 5s at t0+60s) either side of
/// the fill's full [0, 60s] span.
const BBO_FETCH_PAD_MS: Ms = 5_000;

fn side_of(s: &str) -> Option<Side> {
    match s {
        "buy" => Some(Side::Buy),
        "sell" => Some(Side::Sell),
        _ => None,
    }
}

fn is_liq(kind: &Option<String>) -> bool {
    matches!(kind.as_deref(), Some("liq") | Some("delev"))
}

async fn gather_inputs(pool: &PgPool, exchange: &str, symbol: &str, fill_ts: Ms) -> anyhow::Result<(Vec<BboObs>, Vec<MarkObs>, Vec<TradeObs>, Vec<MidObs>, Vec<TradeObs>)> {
    let bbo_rows = mm_db::fetch_bbo_window(pool, exchange, symbol, fill_ts + 30_000, 30_000 + BBO_FETCH_PAD_MS).await?;
    let bbos: Vec<BboObs> = bbo_rows
        .iter()
        .map(|r| BboObs { ts: r.ts, best_bid_px: r.best_bid_px, best_ask_px: r.best_ask_px })
        .collect();

    let price_rows = mm_db::fetch_price_near(pool, exchange, symbol, fill_ts, 500).await?;
    let marks: Vec<MarkObs> = price_rows
        .iter()
        .map(|r| MarkObs { ts: r.ts, mark_px: r.mark_px, index_px: r.index_px })
        .collect();

    let trade_1s_rows = mm_db::fetch_trade_window(pool, exchange, symbol, fill_ts - 1_000, fill_ts).await?;
    let trades_1s_t0: Vec<TradeObs> = trade_1s_rows
        .iter()
        .map(|r| TradeObs { ts: r.ts, px: r.px, sz: r.sz, side: r.side.as_deref().and_then(side_of), is_liq: is_liq(&r.kind) })
        .collect();

    let trade_10s_rows = mm_db::fetch_trade_window(pool, exchange, symbol, fill_ts - 10_000, fill_ts).await?;
    let trades_10s_t0: Vec<TradeObs> = trade_10s_rows
        .iter()
        .map(|r| TradeObs { ts: r.ts, px: r.px, sz: r.sz, side: r.side.as_deref().and_then(side_of), is_liq: is_liq(&r.kind) })
        .collect();

    let mids_10s_rows = mm_db::fetch_bbo_window(pool, exchange, symbol, fill_ts - 5_000, 5_000).await?;
    let mids_10s_t0: Vec<MidObs> = mids_10s_rows.iter().map(|r| MidObs { ts: r.ts, mid_px: r.mid_px }).collect();

    Ok((bbos, marks, trades_1s_t0, mids_10s_t0, trades_10s_t0))
}

/// Enrich and persist every fill that has crossed the horizon gate and has
/// no `fills_enriched` row yet. Returns the rows actually written.
pub async fn enrich_pending_fills(pool: &PgPool, exchange: &str, symbol: &str, now_ms: Ms) -> anyhow::Result<Vec<EnrichedFill>> {
    let candidates = mm_db::fetch_unenriched_fills(pool, now_ms, ENRICHMENT_HORIZON_MS).await?;
    let mut written = Vec::new();

    for fill in candidates {
        if !is_eligible(fill.ts, now_ms) {
            continue;
        }
        let (bbos, marks, trades_1s_t0, mids_10s_t0, trades_10s_t0) = gather_inputs(pool, exchange, symbol, fill.ts).await?;
        let inputs = EnrichmentInputs {
            bbos: &bbos,
            marks: &marks,
            trades_1s_t0: &trades_1s_t0,
            mids_10s_t0: &mids_10s_t0,
            trades_10s_t0: &trades_10s_t0,
        };
        let enriched = enrich_fill(&fill, &inputs);
        mm_db::insert_enriched_fill(pool, &enriched).await?;
        written.push(enriched);
    }

    Ok(written)
}
