//! Pure computation of two-sided quote prices and size from features,
//! position, and strategy parameters.

use mm_types::{format_price, format_size, Features, Position, PriceStr, SizeStr, StrategyParams};

#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub bid_px: PriceStr,
    pub ask_px: PriceStr,
    pub size: SizeStr,
}

/// Compute the two-sided quote for this tick. Never fails: a non-positive
/// mid or notional yields a zero size with bid/ask both pinned to the mid.
pub fn compute_quote(features: &Features, position: &Position, params: &StrategyParams) -> Quote {
    let mid = features.mid_px;
    let half_bps = params.base_half_spread_bps
        + params.vol_spread_gain * features.realized_vol_10s
        + params.tox_spread_gain * features.trade_imbalance_1s.abs();
    let skew_bps = params.inventory_skew_gain * position.size;

    let bid_px = mid - mid * half_bps / 10_000.0 - mid * skew_bps / 10_000.0;
    let ask_px = mid + mid * half_bps / 10_000.0 - mid * skew_bps / 10_000.0;

    let size = if mid <= 0.0 || params.quote_size_usd <= 0.0 {
        0.0
    } else {
        params.quote_size_usd / mid
    };

    Quote {
        bid_px: format_price(bid_px),
        ask_px: format_price(ask_px),
        size: format_size(size),
    }
}

/// `true` when `target` has moved far enough from `current` (relative to
/// `mid`, in bps) to justify cancelling and re-posting a resting order.
pub fn price_exceeds_threshold(current_px: f64, target_px: f64, mid_px: f64, threshold_bps: f64) -> bool {
    if mid_px <= 0.0 {
        return false;
    }
    ((target_px - current_px).abs() / mid_px * 10_000.0) >= threshold_bps
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::Ms;

    fn features(mid: f64) -> Features {
        Features {
            mid_px: mid,
            spread_bps: 0.0,
            trade_imbalance_1s: 0.0,
            realized_vol_10s: 0.0,
            mark_index_div_bps: 0.0,
            liq_count_10s: 0,
            data_stale: false,
        }
    }

    fn position(size: f64) -> Position {
        Position {
            size,
            updated_ms: 0 as Ms,
        }
    }

    #[test]
    fn symmetric_quote_around_mid_with_zero_skew() {
        let params = StrategyParams::sane_defaults();
        let f = features(100.0);
        let q = compute_quote(&f, &position(0.0), &params);
        let bid = q.bid_px.as_f64();
        let ask = q.ask_px.as_f64();
        assert!((100.0 - bid - (ask - 100.0)).abs() < 1e-6);
        assert!(bid < 100.0 && ask > 100.0);
    }

    #[test]
    fn positive_inventory_skews_quotes_down_to_discourage_further_longs() {
        let mut params = StrategyParams::sane_defaults();
        params.inventory_skew_gain = 1.0;
        let f = features(100.0);
        let q_flat = compute_quote(&f, &position(0.0), &params);
        let q_long = compute_quote(&f, &position(1.0), &params);
        assert!(q_long.bid_px.as_f64() < q_flat.bid_px.as_f64());
        assert!(q_long.ask_px.as_f64() < q_flat.ask_px.as_f64());
    }

    #[test]
    fn negative_inventory_skews_quotes_up() {
        let mut params = StrategyParams::sane_defaults();
        params.inventory_skew_gain = 1.0;
        let f = features(100.0);
        let q_flat = compute_quote(&f, &position(0.0), &params);
        let q_short = compute_quote(&f, &position(-1.0), &params);
        assert!(q_short.bid_px.as_f64() > q_flat.bid_px.as_f64());
        assert!(q_short.ask_px.as_f64() > q_flat.ask_px.as_f64());
    }

    #[test]
    fn size_is_notional_over_mid() {
        let mut params = StrategyParams::sane_defaults();
        params.quote_size_usd = 1000.0;
        let f = features(100.0);
        let q = compute_quote(&f, &position(0.0), &params);
        assert!((q.size.as_f64() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn size_is_zero_when_mid_non_positive() {
        let params = StrategyParams::sane_defaults();
        let f = features(0.0);
        let q = compute_quote(&f, &position(0.0), &params);
        assert_eq!(q.size.as_f64(), 0.0);
    }

    #[test]
    fn half_spread_widens_with_volatility_and_toxicity() {
        let mut params = StrategyParams::sane_defaults();
        params.vol_spread_gain = 2.0;
        params.tox_spread_gain = 3.0;
        let mut f = features(100.0);
        f.realized_vol_10s = 10.0;
        f.trade_imbalance_1s = -0.5;
        let q = compute_quote(&f, &position(0.0), &params);
        let half_spread = (q.ask_px.as_f64() - q.bid_px.as_f64()) / 2.0;
        // base=10bps + 2*10 + 3*0.5 = 41.5bps of mid=100 -> 0.415
        assert!((half_spread - 0.415).abs() < 1e-6);
    }

    #[test]
    fn price_exceeds_threshold_true_past_bps_move() {
        assert!(price_exceeds_threshold(100.0, 100.2, 100.0, 10.0));
    }

    #[test]
    fn price_exceeds_threshold_false_within_band() {
        assert!(!price_exceeds_threshold(100.0, 100.01, 100.0, 10.0));
    }

    #[test]
    fn price_exceeds_threshold_false_when_mid_non_positive() {
        assert!(!price_exceeds_threshold(100.0, 200.0, 0.0, 10.0));
    }
}
