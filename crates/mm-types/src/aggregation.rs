//! Aggregation windows built by the enricher/aggregator and fed to the
//! reflector prompt. §3, §4.5, §4.7.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Ms;

/// One of the `worstFills` entries surfaced in an [`AggregationWindow`] —
/// the smallest (most negative) `markout10sBps` fills, ordered ascending.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorstFill {
    pub fill_id: Uuid,
    pub ts: Ms,
    pub markout_10s_bps: f64,
}

/// A fixed time window of enriched-fill statistics, consumed by the
/// reflector as `inputSummary` (§6 reasoning-log format). Built only from
/// fills whose markout horizon has fully elapsed — the enricher's horizon
/// gate guarantees this; an `EnrichedFill` never exists before `fill.ts +
/// 60s` (§4.5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationWindow {
    pub window_start_ms: Ms,
    pub window_end_ms: Ms,
    pub fills_count: u32,
    pub cancel_count: u32,
    pub pause_count: u32,
    /// `None` when there are no non-null `markout10sBps` fills in the window.
    pub markout_10s_p10: Option<f64>,
    pub markout_10s_p50: Option<f64>,
    pub markout_10s_p90: Option<f64>,
    /// At most 5, ordered ascending by `markout10sBps` (most negative first).
    pub worst_fills: Vec<WorstFill>,
}

impl AggregationWindow {
    pub fn empty(window_start_ms: Ms, window_end_ms: Ms) -> Self {
        Self {
            window_start_ms,
            window_end_ms,
            fills_count: 0,
            cancel_count: 0,
            pause_count: 0,
            markout_10s_p10: None,
            markout_10s_p50: None,
            markout_10s_p90: None,
            worst_fills: Vec::new(),
        }
    }
}
