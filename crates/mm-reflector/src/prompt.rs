//! Prompt construction from a completed aggregation window and the
//! currently-active params (§4.5, §6). Kept to plain string templating —
//! no templating crate, matching how small and fixed the shape is.

use mm_types::{AggregationWindow, ParamsRow, PARAM_NAMES};

const SYSTEM_PROMPT: &str = "You are the self-tuning module of a crypto perpetual-futures market maker. \
You may propose a change to 1 or 2 of the ten allowed strategy parameters, bounded by a ratio band \
around their current values, to improve markout performance without increasing pause frequency. \
Respond with a single JSON object: {\"changes\": {<paramName>: <number>, ...}, \"rollbackConditions\": \
{<at least one of markout10sP50BelowBps, pauseCountAbove, maxDurationMs>: <number>}, \"reasoningTrace\": \
[<string>, ...]}. Do not use any other shape.";

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

pub fn user_prompt(exchange: &str, symbol: &str, window: &AggregationWindow, current: &ParamsRow) -> String {
    let mut s = String::new();
    s.push_str(&format!("exchange: {exchange}\nsymbol: {symbol}\n\n"));
    s.push_str("performance window:\n");
    s.push_str(&format!("  windowStartMs: {}\n", window.window_start_ms));
    s.push_str(&format!("  windowEndMs: {}\n", window.window_end_ms));
    s.push_str(&format!("  fillsCount: {}\n", window.fills_count));
    s.push_str(&format!("  cancelCount: {}\n", window.cancel_count));
    s.push_str(&format!("  pauseCount: {}\n", window.pause_count));
    s.push_str(&format!("  markout10sP10: {:?}\n", window.markout_10s_p10));
    s.push_str(&format!("  markout10sP50: {:?}\n", window.markout_10s_p50));
    s.push_str(&format!("  markout10sP90: {:?}\n", window.markout_10s_p90));
    s.push_str(&format!("  worstFillsCount: {}\n\n", window.worst_fills.len()));

    s.push_str("current params:\n");
    for name in PARAM_NAMES {
        if let Some(v) = current.params.get(name) {
            s.push_str(&format!("  {name}: {v}\n"));
        }
    }
    s.push_str(&format!("  paramsSetId: {}\n", current.params_set_id));
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{Ms, StrategyParams};
    use uuid::Uuid;

    fn sample_params() -> ParamsRow {
        ParamsRow {
            params_set_id: Uuid::nil(),
            created_ms: 0 as Ms,
            params: StrategyParams {
                base_half_spread_bps: 10.0,
                vol_spread_gain: 1.0,
                tox_spread_gain: 2.0,
                quote_size_usd: 10.0,
                refresh_interval_ms: 500,
                stale_cancel_ms: 2000,
                max_inventory: 1.0,
                inventory_skew_gain: 1.0,
                pause_mark_index_bps: 50.0,
                pause_liq_count_10s: 5.0,
            },
            is_current: true,
        }
    }

    #[test]
    fn user_prompt_includes_window_and_params() {
        let window = AggregationWindow::empty(0, 60_000);
        let prompt = user_prompt("binance", "BTC-PERP", &window, &sample_params());
        assert!(prompt.contains("exchange: binance"));
        assert!(prompt.contains("baseHalfSpreadBps: 10"));
    }
}
