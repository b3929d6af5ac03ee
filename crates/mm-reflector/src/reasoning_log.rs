//! The reasoning-log file (§6): written and integrity-hashed *before* the
//! proposal row exists (§5 file-first rule, §7 — a file-sink error aborts
//! the cycle and no proposal is created).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use mm_types::{AggregationWindow, ParamsRow, PARAM_NAMES};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::schema::ValidatedLlmOutput;

/// `llm-reflection-<exchange>-<symbolSanitized>-<utcIsoDashified>-<proposalId>.json`
/// under `<logDir>/llm/` (§6).
pub fn reasoning_log_path(log_dir: &Path, exchange: &str, symbol: &str, proposal_id: Uuid, now: chrono::DateTime<Utc>) -> PathBuf {
    let symbol_sanitized: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let iso_dashified = now.to_rfc3339().replace(':', "-").replace('.', "-");
    let filename = format!("llm-reflection-{exchange}-{symbol_sanitized}-{iso_dashified}-{proposal_id}.json");
    log_dir.join("llm").join(filename)
}

fn input_summary(window: &AggregationWindow) -> Value {
    json!({
        "windowStart": window.window_start_ms,
        "windowEnd": window.window_end_ms,
        "fillsCount": window.fills_count,
        "cancelCount": window.cancel_count,
        "pauseCount": window.pause_count,
        "markout10sP50": window.markout_10s_p50,
        "worstFillsCount": window.worst_fills.len(),
    })
}

fn current_params_json(current: &ParamsRow) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("paramsSetId".to_string(), json!(current.params_set_id));
    for name in PARAM_NAMES {
        if let Some(v) = current.params.get(name) {
            obj.insert(name.to_string(), json!(v));
        }
    }
    Value::Object(obj)
}

fn proposal_json(output: &ValidatedLlmOutput) -> Value {
    json!({
        "changes": output.changes,
        "rollbackConditions": {
            "markout10sP50BelowBps": output.rollback.markout_10s_p50_below_bps,
            "pauseCountAbove": output.rollback.pause_count_above,
            "maxDurationMs": output.rollback.max_duration_ms,
        },
        "reasoningTrace": output.reasoning_trace,
    })
}

/// Write the reasoning-log file, return its path and sha256. The hash is
/// computed over the document with `integrity` absent, so re-hashing the
/// file after reading it back and stripping `integrity` reproduces this
/// same value (§6, §8 reasoning-log-integrity property).
pub fn write_reasoning_log(
    log_dir: &Path,
    exchange: &str,
    symbol: &str,
    proposal_id: Uuid,
    window: &AggregationWindow,
    current: &ParamsRow,
    output: &ValidatedLlmOutput,
    now: chrono::DateTime<Utc>,
) -> Result<(PathBuf, String)> {
    let path = reasoning_log_path(log_dir, exchange, symbol, proposal_id, now);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
    }

    let mut doc = json!({
        "proposalId": proposal_id,
        "timestamp": now.to_rfc3339(),
        "exchange": exchange,
        "symbol": symbol,
        "inputSummary": input_summary(window),
        "currentParams": current_params_json(current),
        "proposal": proposal_json(output),
    });

    let sha256 = mm_audit::sha256_of_json(&doc);
    doc.as_object_mut()
        .expect("doc is always an object")
        .insert("integrity".to_string(), json!({ "sha256": sha256 }));

    let pretty = serde_json::to_vec_pretty(&doc).context("serialize reasoning log")?;
    fs::write(&path, pretty).with_context(|| format!("write reasoning log {path:?}"))?;

    Ok((path, sha256))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{Ms, RollbackSpec, StrategyParams};
    use tempfile::tempdir;

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
    fn writes_file_and_hash_survives_reread() {
        let dir = tempdir().unwrap();
        let window = AggregationWindow::empty(0, 60_000);
        let output = ValidatedLlmOutput {
            changes: [("baseHalfSpreadBps".to_string(), 12.0)].into_iter().collect(),
            rollback: RollbackSpec { pause_count_above: Some(5.0), ..Default::default() },
            reasoning_trace: vec!["widen spreads".to_string()],
        };
        let now = Utc::now();
        let proposal_id = Uuid::nil();

        let (path, sha256) =
            write_reasoning_log(dir.path(), "binance", "BTC-PERP", proposal_id, &window, &sample_params(), &output, now).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut parsed: Value = serde_json::from_str(&content).unwrap();
        parsed.as_object_mut().unwrap().remove("integrity");
        let recomputed = mm_audit::sha256_of_json(&parsed);
        assert_eq!(recomputed, sha256);
    }
}
