//! One reflection cycle (§4.6): prompt construction, the LLM call, strict
//! output validation, the file-first reasoning log, and the resulting
//! `llm_proposal` insert. A failed call or a schema-invalid response
//! aborts the cycle with no proposal created (§7 — `AGENT_FAILED`).

use std::path::Path;

use chrono::Utc;
use mm_reflector::{system_prompt, user_prompt, validate_llm_output, write_reasoning_log, LlmClient};
use mm_types::{AggregationWindow, ParamsRow, Proposal, ProposalStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Run one reflection cycle over `window` and persist a pending proposal.
/// Returns `Ok(None)` when the LLM call or output validation fails — this
/// is an expected, non-fatal outcome (§7), logged at `warn` and otherwise
/// swallowed so the tick driver keeps running.
pub async fn run_reflection_cycle(
    pool: &PgPool,
    llm: &dyn LlmClient,
    log_dir: &Path,
    exchange: &str,
    symbol: &str,
    window: &AggregationWindow,
    current: &ParamsRow,
    now_ms: i64,
) -> anyhow::Result<Option<Proposal>> {
    let sys = system_prompt();
    let user = user_prompt(exchange, symbol, window, current);

    let raw = match llm.complete(sys, &user).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "reflection cycle: LLM call failed (AGENT_FAILED)");
            return Ok(None);
        }
    };

    let validated = match validate_llm_output(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "reflection cycle: LLM output failed schema validation");
            return Ok(None);
        }
    };

    let proposal_id = Uuid::new_v4();
    let now = Utc::now();
    let (path, sha256) = write_reasoning_log(log_dir, exchange, symbol, proposal_id, window, current, &validated, now)?;

    let proposal = Proposal {
        proposal_id,
        exchange: exchange.to_string(),
        symbol: symbol.to_string(),
        ts_ms: now_ms,
        window_start_ms: window.window_start_ms,
        window_end_ms: window.window_end_ms,
        current_params_set_id: current.params_set_id,
        changes: validated.changes,
        rollback: validated.rollback,
        reasoning_log_path: path.to_string_lossy().into_owned(),
        reasoning_log_sha256: sha256,
        status: ProposalStatus::Pending,
    };

    if !proposal.has_valid_shape() {
        tracing::warn!(%proposal_id, "reflection cycle: validated output yielded an invalid proposal shape");
        return Ok(None);
    }

    mm_db::insert_proposal(pool, &proposal).await?;
    Ok(Some(proposal))
}
