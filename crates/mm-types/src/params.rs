//! `StrategyParams` — the ten tunable knobs the reflector may adjust. §3.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Ms;

/// The ten fields the LLM reflector is allowed to propose changes to (§4.6,
/// §6). Field order here is the canonical order used when enumerating
/// "allowed parameter names" for the gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// bps, >= 0.
    pub base_half_spread_bps: f64,
    /// unitless gain, >= 0.
    pub vol_spread_gain: f64,
    /// unitless gain, >= 0.
    pub tox_spread_gain: f64,
    /// notional in quote currency, > 0.
    pub quote_size_usd: f64,
    /// integer ms, > 0.
    pub refresh_interval_ms: i64,
    /// integer ms, > 0.
    pub stale_cancel_ms: i64,
    /// size, > 0.
    pub max_inventory: f64,
    /// bps per unit inventory, >= 0.
    pub inventory_skew_gain: f64,
    /// bps, >= 0.
    pub pause_mark_index_bps: f64,
    /// count, >= 0 (fractional in transit, rounded to an integer on apply).
    pub pause_liq_count_10s: f64,
}

/// All ten allowed parameter names, in canonical order. Used by `mm-gate` to
/// validate the proposal's `changes` map and by `mm-proposal` to overlay a
/// materialized params row.
pub const PARAM_NAMES: [&str; 10] = [
    "baseHalfSpreadBps",
    "volSpreadGain",
    "toxSpreadGain",
    "quoteSizeUsd",
    "refreshIntervalMs",
    "staleCancelMs",
    "maxInventory",
    "inventorySkewGain",
    "pauseMarkIndexBps",
    "pauseLiqCount10s",
];

/// Integer-valued parameters: rounded on apply (§4.6 rule 3).
pub const INTEGER_PARAM_NAMES: [&str; 3] =
    ["refreshIntervalMs", "staleCancelMs", "pauseLiqCount10s"];

impl StrategyParams {
    /// Read a field by its canonical (camelCase) name. Returns `None` for an
    /// unrecognized name — callers (the gate) treat that as a shape error.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "baseHalfSpreadBps" => Some(self.base_half_spread_bps),
            "volSpreadGain" => Some(self.vol_spread_gain),
            "toxSpreadGain" => Some(self.tox_spread_gain),
            "quoteSizeUsd" => Some(self.quote_size_usd),
            "refreshIntervalMs" => Some(self.refresh_interval_ms as f64),
            "staleCancelMs" => Some(self.stale_cancel_ms as f64),
            "maxInventory" => Some(self.max_inventory),
            "inventorySkewGain" => Some(self.inventory_skew_gain),
            "pauseMarkIndexBps" => Some(self.pause_mark_index_bps),
            "pauseLiqCount10s" => Some(self.pause_liq_count_10s),
            _ => None,
        }
    }

    /// Return a copy with `name` overlaid by `value`. Integer-valued fields
    /// are rounded. Unknown names are a no-op (the gate rejects them earlier).
    pub fn with_overlay(&self, name: &str, value: f64) -> Self {
        let mut out = *self;
        let v = if INTEGER_PARAM_NAMES.contains(&name) {
            value.round()
        } else {
            value
        };
        match name {
            "baseHalfSpreadBps" => out.base_half_spread_bps = v,
            "volSpreadGain" => out.vol_spread_gain = v,
            "toxSpreadGain" => out.tox_spread_gain = v,
            "quoteSizeUsd" => out.quote_size_usd = v,
            "refreshIntervalMs" => out.refresh_interval_ms = v as i64,
            "staleCancelMs" => out.stale_cancel_ms = v as i64,
            "maxInventory" => out.max_inventory = v,
            "inventorySkewGain" => out.inventory_skew_gain = v,
            "pauseMarkIndexBps" => out.pause_mark_index_bps = v,
            "pauseLiqCount10s" => out.pause_liq_count_10s = v,
            _ => {}
        }
        out
    }

    pub fn sane_defaults() -> Self {
        Self {
            base_half_spread_bps: 10.0,
            vol_spread_gain: 1.0,
            tox_spread_gain: 1.0,
            quote_size_usd: 500.0,
            refresh_interval_ms: 1_000,
            stale_cancel_ms: 5_000,
            max_inventory: 1.0,
            inventory_skew_gain: 0.0,
            pause_mark_index_bps: 50.0,
            pause_liq_count_10s: 5.0,
        }
    }
}

/// A persisted, identified params set (`strategy_params` table, §6). At
/// most one row per `(exchange, symbol)` has `is_current = true`, and the
/// applier is its only writer (§4.7, §5).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamsRow {
    pub params_set_id: Uuid,
    pub created_ms: Ms,
    pub params: StrategyParams,
    pub is_current: bool,
}
