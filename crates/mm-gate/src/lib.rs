//! Pure validation of a reflector-proposed parameter change before it is
//! allowed anywhere near `ProposalApplier`.
//!
//! Three independent rule families, each producing its own error code so a
//! rejection is traceable to exactly one cause: shape, per-change magnitude
//! band, and numeric sanity (finite, non-negative, correctly rounded).

use std::collections::BTreeMap;

use mm_types::{StrategyParams, INTEGER_PARAM_NAMES, PARAM_NAMES};

/// A single rule violation. Distinct variants map 1:1 to the rule that
/// produced them so callers can log/audit the exact reason.
#[derive(Clone, Debug, PartialEq)]
pub enum GateError {
    TooFewOrTooManyChanges { count: usize },
    UnknownParamName { name: String },
    RollbackMissingThreshold,
    NonFiniteValue { name: String },
    NegativeValue { name: String },
    AbsoluteCapExceeded { name: String, value: f64, cap: f64 },
    RatioBandExceeded {
        name: String,
        current: f64,
        proposed: f64,
        min_ratio: f64,
        max_ratio: f64,
    },
}

#[derive(Clone, Debug, Default)]
pub struct RollbackSpec {
    pub markout_10s_p50_below_bps: Option<f64>,
    pub pause_count_above: Option<f64>,
    pub max_duration_ms: Option<f64>,
}

impl RollbackSpec {
    fn has_any_threshold(&self) -> bool {
        self.markout_10s_p50_below_bps.is_some()
            || self.pause_count_above.is_some()
            || self.max_duration_ms.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ProposedChange {
    pub changes: BTreeMap<String, f64>,
    pub rollback: RollbackSpec,
}

#[derive(Clone, Copy)]
struct ParamBand {
    min_ratio: f64,
    max_ratio: f64,
    abs_cap: f64,
}

/// Ratio band and absolute cap for every allowed parameter. Spread/gain/bps
/// fields get the tighter `[0.3x, 3.0x]` band; interval/count fields get
/// the wider `[0.1x, 10x]` band that tolerates bigger jumps in timing knobs.
fn band_for(name: &str) -> ParamBand {
    match name {
        "refreshIntervalMs" | "staleCancelMs" => ParamBand {
            min_ratio: 0.1,
            max_ratio: 10.0,
            abs_cap: 3_600_000.0,
        },
        "quoteSizeUsd" => ParamBand {
            min_ratio: 0.1,
            max_ratio: 10.0,
            abs_cap: 1e9,
        },
        "maxInventory" | "pauseLiqCount10s" => ParamBand {
            min_ratio: 0.1,
            max_ratio: 10.0,
            abs_cap: 1e6,
        },
        // baseHalfSpreadBps, volSpreadGain, toxSpreadGain, inventorySkewGain,
        // pauseMarkIndexBps: spread/gain-like, tighter band.
        _ => ParamBand {
            min_ratio: 0.3,
            max_ratio: 3.0,
            abs_cap: 1e6,
        },
    }
}

/// Validate a proposed change set against the current params. Returns the
/// list of every rule violated (possibly empty, meaning valid).
pub fn validate(proposal: &ProposedChange, current: &StrategyParams) -> Vec<GateError> {
    let mut errors = Vec::new();

    if proposal.changes.is_empty() || proposal.changes.len() > 2 {
        errors.push(GateError::TooFewOrTooManyChanges {
            count: proposal.changes.len(),
        });
    }

    if !proposal.rollback.has_any_threshold() {
        errors.push(GateError::RollbackMissingThreshold);
    }

    for (name, &proposed) in &proposal.changes {
        if !PARAM_NAMES.contains(&name.as_str()) {
            errors.push(GateError::UnknownParamName { name: name.clone() });
            continue;
        }

        if !proposed.is_finite() {
            errors.push(GateError::NonFiniteValue { name: name.clone() });
            continue;
        }
        if proposed < 0.0 {
            errors.push(GateError::NegativeValue { name: name.clone() });
            continue;
        }

        let band = band_for(name);
        if proposed.abs() > band.abs_cap {
            errors.push(GateError::AbsoluteCapExceeded {
                name: name.clone(),
                value: proposed,
                cap: band.abs_cap,
            });
            continue;
        }

        let current_value = current.get(name).unwrap_or(0.0);
        if current_value != 0.0 {
            let ratio = proposed / current_value;
            if ratio < band.min_ratio || ratio > band.max_ratio {
                errors.push(GateError::RatioBandExceeded {
                    name: name.clone(),
                    current: current_value,
                    proposed,
                    min_ratio: band.min_ratio,
                    max_ratio: band.max_ratio,
                });
            }
        }
    }

    errors
}

pub fn is_integer_param(name: &str) -> bool {
    INTEGER_PARAM_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(changes: &[(&str, f64)], rollback: RollbackSpec) -> ProposedChange {
        ProposedChange {
            changes: changes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            rollback,
        }
    }

    fn rollback_ok() -> RollbackSpec {
        RollbackSpec {
            markout_10s_p50_below_bps: Some(-1.0),
            ..Default::default()
        }
    }

    #[test]
    fn valid_single_change_within_band_passes() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(&[("baseHalfSpreadBps", 15.0)], rollback_ok());
        assert!(validate(&p, &current).is_empty());
    }

    #[test]
    fn zero_changes_is_a_shape_error() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(&[], rollback_ok());
        let errors = validate(&p, &current);
        assert!(matches!(
            errors[0],
            GateError::TooFewOrTooManyChanges { count: 0 }
        ));
    }

    #[test]
    fn three_changes_is_a_shape_error() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(
            &[
                ("baseHalfSpreadBps", 15.0),
                ("volSpreadGain", 1.5),
                ("toxSpreadGain", 1.5),
            ],
            rollback_ok(),
        );
        let errors = validate(&p, &current);
        assert!(matches!(
            errors[0],
            GateError::TooFewOrTooManyChanges { count: 3 }
        ));
    }

    #[test]
    fn missing_rollback_threshold_is_rejected() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(&[("baseHalfSpreadBps", 15.0)], RollbackSpec::default());
        let errors = validate(&p, &current);
        assert!(errors.contains(&GateError::RollbackMissingThreshold));
    }

    #[test]
    fn unknown_param_name_rejected() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(&[("notAParam", 1.0)], rollback_ok());
        let errors = validate(&p, &current);
        assert!(matches!(errors[0], GateError::UnknownParamName { .. }));
    }

    #[test]
    fn negative_value_rejected_even_when_current_is_zero() {
        let mut current = StrategyParams::sane_defaults();
        current.inventory_skew_gain = 0.0;
        let p = proposal(&[("inventorySkewGain", -1.0)], rollback_ok());
        let errors = validate(&p, &current);
        assert!(errors.contains(&GateError::NegativeValue {
            name: "inventorySkewGain".to_string()
        }));
    }

    #[test]
    fn non_finite_value_rejected() {
        let current = StrategyParams::sane_defaults();
        let p = proposal(&[("baseHalfSpreadBps", f64::NAN)], rollback_ok());
        let errors = validate(&p, &current);
        assert!(matches!(errors[0], GateError::NonFiniteValue { .. }));
    }

    #[test]
    fn ratio_band_exceeded_for_spread_like_param() {
        let current = StrategyParams::sane_defaults(); // baseHalfSpreadBps = 10.0
        let p = proposal(&[("baseHalfSpreadBps", 40.0)], rollback_ok()); // 4x > 3.0x band
        let errors = validate(&p, &current);
        assert!(matches!(errors[0], GateError::RatioBandExceeded { .. }));
    }

    #[test]
    fn ratio_band_bypassed_when_current_is_zero() {
        let mut current = StrategyParams::sane_defaults();
        current.inventory_skew_gain = 0.0;
        let p = proposal(&[("inventorySkewGain", 50.0)], rollback_ok());
        let errors = validate(&p, &current);
        assert!(errors.is_empty());
    }

    #[test]
    fn absolute_cap_rejects_hallucinated_magnitude_even_with_zero_current() {
        let mut current = StrategyParams::sane_defaults();
        current.inventory_skew_gain = 0.0;
        let p = proposal(&[("inventorySkewGain", 1e9)], rollback_ok());
        let errors = validate(&p, &current);
        assert!(errors
            .iter()
            .any(|e| matches!(e, GateError::AbsoluteCapExceeded { .. })));
    }

    #[test]
    fn interval_like_param_gets_wider_band() {
        let current = StrategyParams::sane_defaults(); // refreshIntervalMs = 1000
        let p = proposal(&[("refreshIntervalMs", 9000.0)], rollback_ok()); // 9x, within [0.1,10]
        let errors = validate(&p, &current);
        assert!(errors.is_empty());
    }

    #[test]
    fn integer_param_name_classification() {
        assert!(is_integer_param("refreshIntervalMs"));
        assert!(is_integer_param("staleCancelMs"));
        assert!(is_integer_param("pauseLiqCount10s"));
        assert!(!is_integer_param("baseHalfSpreadBps"));
    }
}
