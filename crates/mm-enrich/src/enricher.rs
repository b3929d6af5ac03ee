//! The mark-out enrichment pipeline: grades a fill against future mids and
//! captures the fill-time feature snapshot. §4.5.
//!
//! Pure given its inputs. The impure part — querying `mm-db` for BBO/mark/
//! trade/mid candidates near the fill, and the horizon-gate check against
//! wall-clock `now` — lives in the caller (`mm-executor`).

use mm_types::{EnrichedFill, Fill, Side};

use crate::horizon::{HORIZONS_MS, HORIZON_TOLERANCES_MS, MARK_TOLERANCE_MS};
use crate::observations::{closest_within, BboObs, MarkObs, MidObs, TradeObs};

const IMBALANCE_EPSILON: f64 = 1e-10;
/// Cap on mids considered for `realizedVol10sT0`, bounding memory (§4.5).
const MAX_MIDS_FOR_VOL: usize = 2000;

/// All the candidate observations the caller gathered in the neighborhood
/// of a fill, used to compute its [`EnrichedFill`].
pub struct EnrichmentInputs<'a> {
    /// BBO candidates spanning from just before `t0` to just after `t0+60s`.
    pub bbos: &'a [BboObs],
    /// Mark/index candidates near `t0`.
    pub marks: &'a [MarkObs],
    /// Trades in the 1s window ending at `t0`.
    pub trades_1s_t0: &'a [TradeObs],
    /// Mids in the 10s window ending at `t0` (for `realizedVol10sT0`).
    pub mids_10s_t0: &'a [MidObs],
    /// Trades in the 10s window ending at `t0` (for `liqCount10sT0`).
    pub trades_10s_t0: &'a [TradeObs],
}

/// Compute the [`EnrichedFill`] for `fill` given the neighborhood
/// observations. Assumes the caller already checked the horizon gate
/// (`horizon::is_eligible`); this function does not read a clock.
pub fn enrich_fill(fill: &Fill, inputs: &EnrichmentInputs<'_>) -> EnrichedFill {
    let t0 = fill.ts;
    let fill_px = fill.fill_px.as_f64();

    let mids: Vec<Option<f64>> = HORIZONS_MS
        .iter()
        .zip(HORIZON_TOLERANCES_MS.iter())
        .map(|(offset, tol)| {
            closest_within(inputs.bbos, t0 + offset, *tol, |o| o.ts).map(BboObs::mid)
        })
        .collect();

    let mid_t0 = mids[0];
    let mid_t1s = mids[1];
    let mid_t10s = mids[2];
    let mid_t60s = mids[3];

    let markout = |mid_th: Option<f64>| -> Option<f64> {
        let (t0v, thv) = (mid_t0?, mid_th?);
        if t0v <= 0.0 {
            return None;
        }
        Some(match fill.side {
            Side::Buy => (thv - fill_px) / t0v * 10_000.0,
            Side::Sell => (fill_px - thv) / t0v * 10_000.0,
        })
    };

    let markout_1s_bps = markout(mid_t1s);
    let markout_10s_bps = markout(mid_t10s);
    let markout_60s_bps = markout(mid_t60s);

    let mark_t0 = closest_within(inputs.marks, t0, MARK_TOLERANCE_MS, |o| o.ts);
    let mark_index_div_bps_t0 = mark_t0.and_then(|m| {
        let mid = mid_t0?;
        if mid <= 0.0 {
            return None;
        }
        let (mark, index) = (m.mark_px?, m.index_px?);
        Some((mark - index).abs() / mid * 10_000.0)
    });

    let spread_bps_t0 = closest_within(inputs.bbos, t0, HORIZON_TOLERANCES_MS[0], |o| o.ts).and_then(|o| {
        let mid = o.mid();
        if mid <= 0.0 {
            None
        } else {
            Some((o.best_ask_px - o.best_bid_px) / mid * 10_000.0)
        }
    });

    let trade_imbalance_1s_t0 = if inputs.trades_1s_t0.is_empty() {
        None
    } else {
        Some(trade_imbalance(inputs.trades_1s_t0, mid_t0.unwrap_or(0.0)))
    };

    let realized_vol_10s_t0 = realized_vol_sample_bps(inputs.mids_10s_t0);

    let liq_count_10s_t0 = Some(inputs.trades_10s_t0.iter().filter(|t| t.is_liq).count() as u32);

    EnrichedFill {
        fill_id: fill.id,
        ts: fill.ts,
        side: fill.side,
        fill_px: fill.fill_px.clone(),
        fill_sz: fill.fill_sz.clone(),
        mid_t0,
        mid_t1s,
        mid_t10s,
        mid_t60s,
        markout_1s_bps,
        markout_10s_bps,
        markout_60s_bps,
        spread_bps_t0,
        trade_imbalance_1s_t0,
        realized_vol_10s_t0,
        mark_index_div_bps_t0,
        liq_count_10s_t0,
        state: fill.state,
        params_set_id: fill.params_set_id,
    }
}

fn trade_imbalance(trades: &[TradeObs], mid: f64) -> f64 {
    let mut buy_vol = 0.0;
    let mut sell_vol = 0.0;
    for t in trades {
        let side = t.side.unwrap_or(if t.px >= mid { Side::Buy } else { Side::Sell });
        match side {
            Side::Buy => buy_vol += t.sz.abs(),
            Side::Sell => sell_vol += t.sz.abs(),
        }
    }
    let total = buy_vol + sell_vol;
    (buy_vol - sell_vol) / total.max(IMBALANCE_EPSILON)
}

/// Sample stddev (N-1 divisor, per §4.5's distinction from `FeatureCalc`'s
/// population variance), capped at [`MAX_MIDS_FOR_VOL`] observations.
fn realized_vol_sample_bps(mids: &[MidObs]) -> Option<f64> {
    if mids.len() < 2 {
        return None;
    }
    let capped = &mids[mids.len().saturating_sub(MAX_MIDS_FOR_VOL)..];
    let returns: Vec<f64> = capped
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0].mid_px, w[1].mid_px);
            if prev > 0.0 && cur > 0.0 {
                Some((cur / prev).ln())
            } else {
                None
            }
        })
        .collect();
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() * 10_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{decimal::format_price, Liquidity, Mode};
    use uuid::Uuid;

    fn fill(side: Side, px: f64, ts: i64) -> Fill {
        Fill {
            id: Uuid::new_v4(),
            ts,
            exchange: "ex".to_string(),
            symbol: "BTC-PERP".to_string(),
            client_order_id: "coid".to_string(),
            side,
            fill_px: format_price(px),
            fill_sz: format_price(1.0),
            liquidity: Liquidity::Maker,
            state: Mode::Normal,
            params_set_id: Uuid::new_v4(),
        }
    }

    fn bbo(ts: i64, bid: f64, ask: f64) -> BboObs {
        BboObs {
            ts,
            best_bid_px: bid,
            best_ask_px: ask,
        }
    }

    fn inputs<'a>(bbos: &'a [BboObs]) -> EnrichmentInputs<'a> {
        EnrichmentInputs {
            bbos,
            marks: &[],
            trades_1s_t0: &[],
            mids_10s_t0: &[],
            trades_10s_t0: &[],
        }
    }

    #[test]
    fn buy_markout_positive_when_future_mid_higher() {
        let f = fill(Side::Buy, 100.0, 0);
        let bbos = vec![bbo(0, 99.9, 100.1), bbo(10_000, 100.0, 100.2)];
        let e = enrich_fill(&f, &inputs(&bbos));
        assert!((e.markout_10s_bps.unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn sell_markout_symmetric() {
        let f = fill(Side::Sell, 100.0, 0);
        let bbos = vec![bbo(0, 99.9, 100.1), bbo(10_000, 99.8, 100.0)];
        let e = enrich_fill(&f, &inputs(&bbos));
        assert!((e.markout_10s_bps.unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn missing_horizon_bbo_yields_null_markout() {
        let f = fill(Side::Buy, 100.0, 0);
        let bbos = vec![bbo(0, 99.9, 100.1)]; // no t10s candidate within tolerance
        let e = enrich_fill(&f, &inputs(&bbos));
        assert!(e.mid_t10s.is_none());
        assert!(e.markout_10s_bps.is_none());
    }

    #[test]
    fn zero_mid_t0_yields_null_markout() {
        let f = fill(Side::Buy, 100.0, 0);
        let bbos = vec![bbo(0, 0.0, 0.0), bbo(10_000, 100.0, 100.2)];
        let e = enrich_fill(&f, &inputs(&bbos));
        assert_eq!(e.mid_t0, Some(0.0));
        assert!(e.markout_10s_bps.is_none());
    }

    #[test]
    fn out_of_tolerance_bbo_is_ignored() {
        let f = fill(Side::Buy, 100.0, 0);
        // t0 tolerance is 500ms; this candidate is 600ms away.
        let bbos = vec![bbo(600, 99.9, 100.1)];
        let e = enrich_fill(&f, &inputs(&bbos));
        assert!(e.mid_t0.is_none());
    }
}
