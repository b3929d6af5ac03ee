//! Thin views over persisted market data that the enricher searches for
//! the closest observation to a target timestamp. Callers (`mm-executor`,
//! via `mm-db`) supply these already filtered to a reasonable neighborhood
//! of the fill — the enricher does not itself page through the whole
//! `md_bbo`/`md_price` tables.

use mm_types::Ms;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BboObs {
    pub ts: Ms,
    pub best_bid_px: f64,
    pub best_ask_px: f64,
}

impl BboObs {
    pub fn mid(&self) -> f64 {
        (self.best_bid_px + self.best_ask_px) / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkObs {
    pub ts: Ms,
    pub mark_px: Option<f64>,
    pub index_px: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TradeObs {
    pub ts: Ms,
    pub px: f64,
    pub sz: f64,
    pub side: Option<mm_types::Side>,
    pub is_liq: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MidObs {
    pub ts: Ms,
    pub mid_px: f64,
}

/// Find the closest-by-`|ts - target|` observation within `tolerance_ms`.
/// Ties are broken by earliest `ts` in the slice (a deterministic,
/// caller-independent order — §4.5's "ties broken by any deterministic
/// order").
pub fn closest_within<'a, T>(
    obs: &'a [T],
    target_ts: Ms,
    tolerance_ms: Ms,
    ts_of: impl Fn(&T) -> Ms,
) -> Option<&'a T> {
    obs.iter()
        .map(|o| (o, (ts_of(o) - target_ts).abs()))
        .filter(|(_, diff)| *diff <= tolerance_ms)
        .min_by_key(|(_, diff)| *diff)
        .map(|(o, _)| o)
}
