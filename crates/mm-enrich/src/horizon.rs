//! Horizon definitions shared by the enricher. §4.5.

use mm_types::Ms;

/// Markout horizons offset from `fill.ts`, in ms: t0, t0+1s, t0+10s, t0+60s.
pub const HORIZONS_MS: [Ms; 4] = [0, 1_000, 10_000, 60_000];
/// Per-horizon BBO lookup tolerance, in ms, same order as [`HORIZONS_MS`].
pub const HORIZON_TOLERANCES_MS: [Ms; 4] = [500, 500, 1_000, 5_000];
/// Tolerance for the mark/index lookup at `t0` only.
pub const MARK_TOLERANCE_MS: Ms = 500;
/// A fill is eligible for enrichment only once this much time has elapsed
/// since it was reported (the horizon gate).
pub const ENRICHMENT_HORIZON_MS: Ms = 60_000;

/// `true` once `fill.ts + 60s <= now` (§4.5 — the enricher never produces
/// an `EnrichedFill` before this).
pub fn is_eligible(fill_ts_ms: Ms, now_ms: Ms) -> bool {
    now_ms >= fill_ts_ms + ENRICHMENT_HORIZON_MS
}
