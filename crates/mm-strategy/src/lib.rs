//! The strategy kernel: pure state-machine `decide()` combining risk policy
//! and quote calculation into the next state and this tick's order intents.
//!
//! The kernel never reads a clock — every timestamp comparison is against
//! `now_ms` passed in by the caller, so `decide` is a total, deterministic
//! function of its input. A malformed upstream snapshot never panics here:
//! it surfaces as `features.data_stale` and is absorbed into `PAUSE`.

use mm_types::{Mode, OrderIntent, ReasonCode, StrategyState};

/// Minimum time a `PAUSE` must be held before the kernel allows an exit.
pub const PAUSE_MIN_DURATION_MS: i64 = 10_000;

pub struct DecideInput<'a> {
    pub now_ms: i64,
    pub state: &'a StrategyState,
    pub features: &'a mm_types::Features,
    pub params: &'a mm_types::StrategyParams,
    pub position: &'a mm_types::Position,
}

pub struct DecideOutput {
    pub next_state: StrategyState,
    pub intents: Vec<OrderIntent>,
}

/// Run one strategy tick: evaluate risk, transition mode, and emit this
/// tick's intents. See module docs for the kernel's determinism invariant.
pub fn decide(input: DecideInput<'_>) -> DecideOutput {
    let DecideInput {
        now_ms,
        state,
        features,
        params,
        position,
    } = input;

    let risk = mm_risk::evaluate(features, position, params);

    let pause_duration_elapsed = match state.pause_until_ms {
        None => true,
        Some(until) => now_ms >= until,
    };

    let was_paused = state.mode == Mode::Pause;
    let next_mode = if risk.should_pause {
        Mode::Pause
    } else if was_paused && !pause_duration_elapsed {
        Mode::Pause
    } else if was_paused && pause_duration_elapsed {
        // Exit-dampening: a pause never resolves directly back to NORMAL.
        Mode::Defensive
    } else if risk.should_defensive {
        Mode::Defensive
    } else {
        Mode::Normal
    };

    let mode_changed = next_mode != state.mode;
    let mode_since_ms = if mode_changed { now_ms } else { state.mode_since_ms };

    let pause_until_ms = if next_mode == Mode::Pause {
        match state.pause_until_ms {
            Some(until) if was_paused => Some(until),
            _ => Some(now_ms + PAUSE_MIN_DURATION_MS),
        }
    } else {
        None
    };

    let mut next_state = StrategyState {
        mode: next_mode,
        mode_since_ms,
        pause_until_ms,
        last_quote_ms: state.last_quote_ms,
    };

    let intents = if next_mode == Mode::Pause {
        let mut reason_codes = risk.reason_codes.clone();
        if was_paused && !pause_duration_elapsed {
            reason_codes.push(ReasonCode::PauseMinDuration);
        }
        vec![OrderIntent::CancelAll { reason_codes }]
    } else {
        let quote = mm_quote::compute_quote(features, position, params);
        next_state.last_quote_ms = Some(now_ms);
        vec![OrderIntent::Quote {
            bid_px: quote.bid_px,
            ask_px: quote.ask_px,
            size: quote.size,
            post_only: true,
            reason_codes: risk.reason_codes.clone(),
        }]
    };

    DecideOutput { next_state, intents }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{Features, Position, StrategyParams};

    fn features(overrides: impl FnOnce(&mut Features)) -> Features {
        let mut f = Features {
            mid_px: 100.0,
            spread_bps: 1.0,
            trade_imbalance_1s: 0.0,
            realized_vol_10s: 0.0,
            mark_index_div_bps: 0.0,
            liq_count_10s: 0,
            data_stale: false,
        };
        overrides(&mut f);
        f
    }

    fn position() -> Position {
        Position {
            size: 0.0,
            updated_ms: 0,
        }
    }

    #[test]
    fn normal_conditions_emit_quote_and_stay_normal() {
        let params = StrategyParams::sane_defaults();
        let state = StrategyState::initial(0);
        let f = features(|_| {});
        let out = decide(DecideInput {
            now_ms: 1_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode, Mode::Normal);
        assert!(out.intents[0].is_quote());
    }

    #[test]
    fn data_stale_enters_pause_and_cancels() {
        let params = StrategyParams::sane_defaults();
        let state = StrategyState::initial(0);
        let f = features(|f| f.data_stale = true);
        let out = decide(DecideInput {
            now_ms: 1_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode, Mode::Pause);
        assert_eq!(out.next_state.pause_until_ms, Some(1_000 + PAUSE_MIN_DURATION_MS));
        assert!(!out.intents[0].is_quote());
    }

    #[test]
    fn pause_holds_for_minimum_duration_even_after_condition_clears() {
        let params = StrategyParams::sane_defaults();
        let mut state = StrategyState::initial(0);
        state.mode = Mode::Pause;
        state.mode_since_ms = 0;
        state.pause_until_ms = Some(10_000);

        let f = features(|_| {}); // condition cleared
        let out = decide(DecideInput {
            now_ms: 5_000, // before pause_until_ms
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode, Mode::Pause);
        assert!(out
            .intents[0]
            .reason_codes()
            .contains(&ReasonCode::PauseMinDuration));
    }

    #[test]
    fn pause_exits_to_defensive_never_directly_to_normal() {
        let params = StrategyParams::sane_defaults();
        let mut state = StrategyState::initial(0);
        state.mode = Mode::Pause;
        state.mode_since_ms = 0;
        state.pause_until_ms = Some(10_000);

        let f = features(|_| {});
        let out = decide(DecideInput {
            now_ms: 10_000, // duration elapsed
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode, Mode::Defensive);
        assert!(out.intents[0].is_quote());
    }

    #[test]
    fn defensive_conditions_enter_defensive_directly_from_normal() {
        let params = StrategyParams::sane_defaults();
        let state = StrategyState::initial(0);
        let f = features(|f| f.realized_vol_10s = 100.0);
        let out = decide(DecideInput {
            now_ms: 1_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode, Mode::Defensive);
    }

    #[test]
    fn mode_change_resets_mode_since_ms() {
        let params = StrategyParams::sane_defaults();
        let mut state = StrategyState::initial(0);
        state.mode_since_ms = 0;
        let f = features(|f| f.data_stale = true);
        let out = decide(DecideInput {
            now_ms: 7_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out.next_state.mode_since_ms, 7_000);
    }

    #[test]
    fn decide_is_deterministic_given_identical_input() {
        let params = StrategyParams::sane_defaults();
        let state = StrategyState::initial(0);
        let f = features(|f| f.realized_vol_10s = 20.0);
        let out1 = decide(DecideInput {
            now_ms: 1_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        let out2 = decide(DecideInput {
            now_ms: 1_000,
            state: &state,
            features: &f,
            params: &params,
            position: &position(),
        });
        assert_eq!(out1.next_state, out2.next_state);
    }
}
