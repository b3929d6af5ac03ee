//! Pure computation of decision-time market features from raw observations.
//!
//! This crate converts a [`Snapshot`] plus bounded trade/mid windows into a
//! [`Features`] value. It never fails: malformed input (an unparseable
//! decimal string, an empty window, a crossed book) always coerces to a
//! neutral or maximally-defensive value rather than a panic or an error.
//! Callers that need IO, retries, or persistence live in other crates.

use mm_types::{Features, MidObs, Side, Snapshot, TradeObs};

const IMBALANCE_EPSILON: f64 = 1e-10;

/// Compute [`Features`] from a snapshot and bounded observation windows.
///
/// `trades_1s` and `trades_10s` are expected to already be pruned to their
/// respective windows by the caller (the executor's ring buffers); this
/// function does not re-filter by timestamp, it only aggregates what it's
/// given. `mids_10s` likewise.
pub fn compute_features(
    snapshot: &Snapshot,
    trades_1s: &[TradeObs],
    trades_10s: &[TradeObs],
    mids_10s: &[MidObs],
    stale_cancel_ms: i64,
) -> Features {
    let mid = mid_price(snapshot);
    let spread_bps = spread_bps(snapshot, mid);
    let trade_imbalance_1s = trade_imbalance(trades_1s, mid);
    let realized_vol_10s = realized_vol_bps(mids_10s);
    let mark_index_div_bps = mark_index_div_bps(snapshot, mid);
    let liq_count_10s = liq_count(trades_10s);
    let data_stale = (snapshot.now_ms - snapshot.last_update_ms) > stale_cancel_ms;

    Features {
        mid_px: mid,
        spread_bps,
        trade_imbalance_1s,
        realized_vol_10s,
        mark_index_div_bps,
        liq_count_10s,
        data_stale,
    }
}

/// `(bestBid + bestAsk) / 2`. `NaN` legs are treated as `0` so a malformed
/// snapshot produces a `0` (not `NaN`) mid — `0` then drives every other
/// feature to its safe default via the `mid <= 0` guards below.
fn mid_price(snapshot: &Snapshot) -> f64 {
    let bid = non_nan(snapshot.best_bid_px.as_f64());
    let ask = non_nan(snapshot.best_ask_px.as_f64());
    (bid + ask) / 2.0
}

fn spread_bps(snapshot: &Snapshot, mid: f64) -> f64 {
    if mid <= 0.0 {
        return 0.0;
    }
    let bid = non_nan(snapshot.best_bid_px.as_f64());
    let ask = non_nan(snapshot.best_ask_px.as_f64());
    (ask - bid) / mid * 10_000.0
}

fn trade_imbalance(trades: &[TradeObs], mid: f64) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let mut buy_vol = 0.0;
    let mut sell_vol = 0.0;
    for t in trades {
        let px = non_nan(t.px.as_f64());
        let sz = non_nan(t.sz.as_f64()).abs();
        let side = t.side.unwrap_or_else(|| infer_side(px, mid));
        match side {
            Side::Buy => buy_vol += sz,
            Side::Sell => sell_vol += sz,
        }
    }
    let total = buy_vol + sell_vol;
    (buy_vol - sell_vol) / total.max(IMBALANCE_EPSILON)
}

fn infer_side(px: f64, mid: f64) -> Side {
    if px >= mid {
        Side::Buy
    } else {
        Side::Sell
    }
}

/// Population stddev (divide by N, not N-1) of log returns, in bps.
fn realized_vol_bps(mids: &[MidObs]) -> f64 {
    if mids.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = mids
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
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() * 10_000.0
}

fn mark_index_div_bps(snapshot: &Snapshot, mid: f64) -> f64 {
    if mid <= 0.0 {
        return 0.0;
    }
    let (Some(mark), Some(index)) = (&snapshot.mark_px, &snapshot.index_px) else {
        return 0.0;
    };
    let mark = mark.as_f64();
    let index = index.as_f64();
    if mark.is_nan() || index.is_nan() {
        return 0.0;
    }
    (mark - index).abs() / mid * 10_000.0
}

fn liq_count(trades: &[TradeObs]) -> u32 {
    trades
        .iter()
        .filter(|t| matches!(t.kind.as_deref(), Some("liq") | Some("delev")))
        .count() as u32
}

fn non_nan(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::decimal::format_price;

    fn snapshot(bid: f64, ask: f64, now_ms: i64, last_update_ms: i64) -> Snapshot {
        Snapshot {
            exchange: "ex".to_string(),
            symbol: "BTC-PERP".to_string(),
            now_ms,
            best_bid_px: format_price(bid),
            best_bid_sz: format_price(1.0),
            best_ask_px: format_price(ask),
            best_ask_sz: format_price(1.0),
            mark_px: None,
            index_px: None,
            last_update_ms,
        }
    }

    fn trade(ts: i64, px: f64, sz: f64, side: Option<Side>, kind: Option<&str>) -> TradeObs {
        TradeObs {
            ts,
            px: format_price(px),
            sz: format_price(sz),
            side,
            kind: kind.map(|s| s.to_string()),
        }
    }

    #[test]
    fn mid_and_spread_are_computed_from_book() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert!((f.mid_px - 100.5).abs() < 1e-9);
        assert!((f.spread_bps - (1.0 / 100.5 * 10_000.0)).abs() < 1e-6);
    }

    #[test]
    fn spread_is_zero_when_mid_is_zero() {
        let snap = snapshot(0.0, 0.0, 1_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert_eq!(f.mid_px, 0.0);
        assert_eq!(f.spread_bps, 0.0);
    }

    #[test]
    fn empty_trade_window_gives_zero_imbalance() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert_eq!(f.trade_imbalance_1s, 0.0);
    }

    #[test]
    fn imbalance_uses_explicit_side_when_present() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let trades = vec![
            trade(900, 100.5, 2.0, Some(Side::Buy), None),
            trade(950, 100.5, 1.0, Some(Side::Sell), None),
        ];
        let f = compute_features(&snap, &trades, &[], &[], 5_000);
        assert!((f.trade_imbalance_1s - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn imbalance_infers_side_from_mid_when_missing() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let mid = 100.5;
        let trades = vec![
            trade(900, mid + 1.0, 1.0, None, None), // >= mid -> buy
            trade(950, mid - 1.0, 1.0, None, None), // < mid -> sell
        ];
        let f = compute_features(&snap, &trades, &[], &[], 5_000);
        assert_eq!(f.trade_imbalance_1s, 0.0);
    }

    #[test]
    fn realized_vol_is_zero_for_fewer_than_two_mids() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let mids = vec![MidObs { ts: 0, mid_px: 100.0 }];
        let f = compute_features(&snap, &[], &[], &mids, 5_000);
        assert_eq!(f.realized_vol_10s, 0.0);
    }

    #[test]
    fn realized_vol_is_zero_for_constant_mids() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let mids = vec![
            MidObs { ts: 0, mid_px: 100.0 },
            MidObs { ts: 1, mid_px: 100.0 },
            MidObs { ts: 2, mid_px: 100.0 },
        ];
        let f = compute_features(&snap, &[], &[], &mids, 5_000);
        assert!(f.realized_vol_10s.abs() < 1e-12);
    }

    #[test]
    fn realized_vol_nonzero_for_varying_mids() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let mids = vec![
            MidObs { ts: 0, mid_px: 100.0 },
            MidObs { ts: 1, mid_px: 101.0 },
            MidObs { ts: 2, mid_px: 99.5 },
        ];
        let f = compute_features(&snap, &[], &[], &mids, 5_000);
        assert!(f.realized_vol_10s > 0.0);
    }

    #[test]
    fn realized_vol_ignores_non_positive_mid_pairs() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let mids = vec![
            MidObs { ts: 0, mid_px: 0.0 },
            MidObs { ts: 1, mid_px: 101.0 },
        ];
        let f = compute_features(&snap, &[], &[], &mids, 5_000);
        assert_eq!(f.realized_vol_10s, 0.0);
    }

    #[test]
    fn mark_index_div_is_zero_when_either_absent() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert_eq!(f.mark_index_div_bps, 0.0);
    }

    #[test]
    fn mark_index_div_computed_when_both_present() {
        let mut snap = snapshot(100.0, 101.0, 1_000, 1_000);
        snap.mark_px = Some(format_price(101.0));
        snap.index_px = Some(format_price(100.0));
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert!((f.mark_index_div_bps - (1.0 / 100.5 * 10_000.0)).abs() < 1e-6);
    }

    #[test]
    fn liq_count_counts_only_liq_and_delev_kinds() {
        let snap = snapshot(100.0, 101.0, 1_000, 1_000);
        let trades = vec![
            trade(900, 100.0, 1.0, None, Some("liq")),
            trade(910, 100.0, 1.0, None, Some("delev")),
            trade(920, 100.0, 1.0, None, Some("normal")),
            trade(930, 100.0, 1.0, None, None),
        ];
        let f = compute_features(&snap, &[], &trades, &[], 5_000);
        assert_eq!(f.liq_count_10s, 2);
    }

    #[test]
    fn data_stale_true_when_age_exceeds_threshold() {
        let snap = snapshot(100.0, 101.0, 10_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert!(f.data_stale);
    }

    #[test]
    fn data_stale_false_when_within_threshold() {
        let snap = snapshot(100.0, 101.0, 5_000, 1_000);
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert!(!f.data_stale);
    }

    #[test]
    fn malformed_book_prices_coerce_to_zero_not_panic() {
        let mut snap = snapshot(100.0, 101.0, 1_000, 1_000);
        snap.best_bid_px = mm_types::decimal::DecimalStr::new("garbage");
        let f = compute_features(&snap, &[], &[], &[], 5_000);
        assert_eq!(f.mid_px, 101.0 / 2.0);
    }
}
