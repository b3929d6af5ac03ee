//! Pure pause/defensive policy evaluation over [`Features`] and [`Position`].
//!
//! Evaluation order is significant: pause conditions are checked first and
//! short-circuit on the first hit, but every pause condition that fires is
//! still recorded in `reason_codes` for the audit trail. Defensive checks
//! run only when no pause condition fired.

use mm_types::{Features, Position, ReasonCode, StrategyParams};

/// Defensive threshold on realized volatility (bps), hard-coded for
/// determinism in tests rather than promoted to `StrategyParams`.
pub const DEFENSIVE_VOL_THRESHOLD_BPS: f64 = 50.0;
/// Defensive threshold on trade imbalance magnitude, hard-coded likewise.
pub const DEFENSIVE_TOX_THRESHOLD: f64 = 0.7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskDecision {
    pub should_pause: bool,
    pub should_defensive: bool,
    pub reason_codes: Vec<ReasonCode>,
}

/// Evaluate the pause/defensive policy for one tick.
pub fn evaluate(features: &Features, position: &Position, params: &StrategyParams) -> RiskDecision {
    let mut reason_codes = Vec::new();

    if features.data_stale {
        reason_codes.push(ReasonCode::DataStale);
        return RiskDecision {
            should_pause: true,
            should_defensive: false,
            reason_codes,
        };
    }
    if features.mark_index_div_bps >= params.pause_mark_index_bps {
        reason_codes.push(ReasonCode::MarkIndexDiverged);
        return RiskDecision {
            should_pause: true,
            should_defensive: false,
            reason_codes,
        };
    }
    if f64::from(features.liq_count_10s) >= params.pause_liq_count_10s {
        reason_codes.push(ReasonCode::LiquidationSpike);
        return RiskDecision {
            should_pause: true,
            should_defensive: false,
            reason_codes,
        };
    }
    if position.size.abs() > params.max_inventory {
        reason_codes.push(ReasonCode::InventoryLimit);
        return RiskDecision {
            should_pause: true,
            should_defensive: false,
            reason_codes,
        };
    }

    let mut should_defensive = false;
    if features.realized_vol_10s >= DEFENSIVE_VOL_THRESHOLD_BPS {
        reason_codes.push(ReasonCode::DefensiveVol);
        should_defensive = true;
    }
    if features.trade_imbalance_1s.abs() >= DEFENSIVE_TOX_THRESHOLD {
        reason_codes.push(ReasonCode::DefensiveTox);
        should_defensive = true;
    }
    if !should_defensive {
        reason_codes.push(ReasonCode::NormalConditions);
    }

    RiskDecision {
        should_pause: false,
        should_defensive,
        reason_codes,
    }
}
