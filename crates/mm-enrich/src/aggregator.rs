//! Builds an [`AggregationWindow`] from enriched fills, cancel events, and
//! pause-state observations over `[start, end]`. §4.5.
//!
//! The open question of what counts as a "pause" for this purpose (every
//! `strategy_state` row with `mode=PAUSE`, vs. only transitions into
//! `PAUSE`) is left to the caller: this module just counts whatever
//! `pause_markers` it is given, so either policy composes as long as the
//! caller supplies a non-double-counting marker sequence (§9 open question).

use mm_types::{AggregationWindow, EnrichedFill, Ms, WorstFill};

const MAX_WORST_FILLS: usize = 5;

/// Build the window's aggregate statistics.
///
/// `enriched_fills` and `cancel_count`/`pause_count` are expected to already
/// be filtered to `[window_start_ms, window_end_ms)` by the caller.
pub fn aggregate(
    window_start_ms: Ms,
    window_end_ms: Ms,
    enriched_fills: &[EnrichedFill],
    cancel_count: u32,
    pause_count: u32,
) -> AggregationWindow {
    let mut markouts: Vec<f64> = enriched_fills
        .iter()
        .filter_map(|f| f.markout_10s_bps)
        .collect();
    markouts.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let (p10, p50, p90) = if markouts.is_empty() {
        (None, None, None)
    } else {
        (
            Some(percentile(&markouts, 10.0)),
            Some(percentile(&markouts, 50.0)),
            Some(percentile(&markouts, 90.0)),
        )
    };

    let mut worst: Vec<WorstFill> = enriched_fills
        .iter()
        .filter_map(|f| {
            f.markout_10s_bps.map(|bps| WorstFill {
                fill_id: f.fill_id,
                ts: f.ts,
                markout_10s_bps: bps,
            })
        })
        .collect();
    worst.sort_by(|a, b| a.markout_10s_bps.partial_cmp(&b.markout_10s_bps).unwrap());
    worst.truncate(MAX_WORST_FILLS);

    AggregationWindow {
        window_start_ms,
        window_end_ms,
        fills_count: enriched_fills.len() as u32,
        cancel_count,
        pause_count,
        markout_10s_p10: p10,
        markout_10s_p50: p50,
        markout_10s_p90: p90,
        worst_fills: worst,
    }
}

/// Nearest-rank percentile over an already-sorted-ascending slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{Mode, Side};
    use uuid::Uuid;

    fn fill_with_markout(ts: Ms, bps: Option<f64>) -> EnrichedFill {
        EnrichedFill {
            fill_id: Uuid::new_v4(),
            ts,
            side: Side::Buy,
            fill_px: mm_types::decimal::format_price(100.0),
            fill_sz: mm_types::decimal::format_price(1.0),
            mid_t0: Some(100.0),
            mid_t1s: None,
            mid_t10s: Some(100.0),
            mid_t60s: None,
            markout_1s_bps: None,
            markout_10s_bps: bps,
            markout_60s_bps: None,
            spread_bps_t0: None,
            trade_imbalance_1s_t0: None,
            realized_vol_10s_t0: None,
            mark_index_div_bps_t0: None,
            liq_count_10s_t0: None,
            state: Mode::Normal,
            params_set_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn empty_fills_give_null_percentiles() {
        let w = aggregate(0, 60_000, &[], 2, 1);
        assert_eq!(w.markout_10s_p50, None);
        assert_eq!(w.fills_count, 0);
        assert_eq!(w.cancel_count, 2);
        assert_eq!(w.pause_count, 1);
    }

    #[test]
    fn percentiles_computed_over_non_null_markouts() {
        let fills = vec![
            fill_with_markout(0, Some(-5.0)),
            fill_with_markout(1, Some(0.0)),
            fill_with_markout(2, Some(5.0)),
            fill_with_markout(3, None),
        ];
        let w = aggregate(0, 60_000, &fills, 0, 0);
        assert_eq!(w.fills_count, 4);
        assert_eq!(w.markout_10s_p50, Some(0.0));
    }

    #[test]
    fn worst_fills_ordered_ascending_and_capped_at_five() {
        let fills: Vec<EnrichedFill> = (0..8)
            .map(|i| fill_with_markout(i, Some((i as f64) - 10.0)))
            .collect();
        let w = aggregate(0, 60_000, &fills, 0, 0);
        assert_eq!(w.worst_fills.len(), 5);
        assert_eq!(w.worst_fills[0].markout_10s_bps, -10.0);
        assert!(w.worst_fills.windows(2).all(|p| p[0].markout_10s_bps <= p[1].markout_10s_bps));
    }
}
