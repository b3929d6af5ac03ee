//! Fill events and their markout enrichment. §3, §4.5.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Ms, PriceStr, SizeStr};
use crate::market::Side;

/// What produced a resting order: post-only maker, or (never in this
/// system, but modeled for completeness) a taker cross.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liquidity {
    Maker,
    Taker,
}

/// A raw fill reported by the exchange adapter. Immutable once created;
/// referenced by at most one [`EnrichedFill`] (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: Uuid,
    pub ts: Ms,
    pub exchange: String,
    pub symbol: String,
    pub client_order_id: String,
    pub side: Side,
    pub fill_px: PriceStr,
    pub fill_sz: SizeStr,
    pub liquidity: Liquidity,
    /// The kernel state (`Mode`) active when this fill was reported.
    pub state: crate::state::Mode,
    pub params_set_id: Uuid,
}

/// A fill graded against future mid/mark prices at the 1s/10s/60s horizons
/// (§4.5). Created exactly once per fill, only after `now >= fill.ts + 60s`
/// (the horizon gate). Any individual horizon's mid/markout is `None` when
/// no BBO was found within that horizon's tolerance window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedFill {
    pub fill_id: Uuid,
    pub ts: Ms,
    pub side: Side,
    pub fill_px: PriceStr,
    pub fill_sz: SizeStr,

    pub mid_t0: Option<f64>,
    pub mid_t1s: Option<f64>,
    pub mid_t10s: Option<f64>,
    pub mid_t60s: Option<f64>,

    pub markout_1s_bps: Option<f64>,
    pub markout_10s_bps: Option<f64>,
    pub markout_60s_bps: Option<f64>,

    pub spread_bps_t0: Option<f64>,
    pub trade_imbalance_1s_t0: Option<f64>,
    pub realized_vol_10s_t0: Option<f64>,
    pub mark_index_div_bps_t0: Option<f64>,
    pub liq_count_10s_t0: Option<u32>,

    pub state: crate::state::Mode,
    pub params_set_id: Uuid,
}
