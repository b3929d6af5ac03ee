//! Market-observation types: snapshots, trades, mids, and derived features.
//! §3, §4.1.

use serde::{Deserialize, Serialize};

use crate::decimal::{Ms, PriceStr, SizeStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Instantaneous market state. Invariant: `bestBidPx < bestAskPx` whenever
/// well-formed; a crossed or inverted snapshot is treated as data-stale by
/// `FeatureCalc` (dataStale derives from the age check, not from crossing —
/// crossing shows up downstream as a non-positive or nonsensical mid).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exchange: String,
    pub symbol: String,
    pub now_ms: Ms,
    pub best_bid_px: PriceStr,
    pub best_bid_sz: SizeStr,
    pub best_ask_px: PriceStr,
    pub best_ask_sz: SizeStr,
    pub mark_px: Option<PriceStr>,
    pub index_px: Option<PriceStr>,
    pub last_update_ms: Ms,
}

/// A recent trade observation used by `FeatureCalc`'s rolling windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeObs {
    pub ts: Ms,
    pub px: PriceStr,
    pub sz: SizeStr,
    /// Side, if the feed supplied it; otherwise inferred from mid (§4.1).
    pub side: Option<Side>,
    /// Trade type, e.g. "liq" / "delev" for liquidation/deleverage trades.
    pub kind: Option<String>,
}

/// A recent mid-price observation used for `realizedVol10s`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MidObs {
    pub ts: Ms,
    pub mid_px: f64,
}

/// Derived decision inputs computed by `FeatureCalc` (§4.1). Pure, immutable,
/// and defensively constructed — no field here can be produced by a panic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub mid_px: f64,
    pub spread_bps: f64,
    /// In `[-1, +1]`.
    pub trade_imbalance_1s: f64,
    /// `>= 0`.
    pub realized_vol_10s: f64,
    /// `>= 0`.
    pub mark_index_div_bps: f64,
    pub liq_count_10s: u32,
    pub data_stale: bool,
}
