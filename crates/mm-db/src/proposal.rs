//! `llm_proposal`, `param_rollout` (§3, §4.6, §4.7, §6).

use anyhow::{Context, Result};
use mm_types::{ParamRollout, Proposal, ProposalStatus, RollbackSpec, RolloutAction};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn status_str(status: ProposalStatus) -> &'static str {
    match status {
        ProposalStatus::Pending => "pending",
        ProposalStatus::Applied => "applied",
        ProposalStatus::Rejected => "rejected",
    }
}

fn status_from_str(s: &str) -> ProposalStatus {
    match s {
        "applied" => ProposalStatus::Applied,
        "rejected" => ProposalStatus::Rejected,
        _ => ProposalStatus::Pending,
    }
}

fn action_str(action: RolloutAction) -> &'static str {
    match action {
        RolloutAction::Apply => "apply",
        RolloutAction::Reject => "reject",
        RolloutAction::Rollback => "rollback",
    }
}

pub async fn insert_proposal(pool: &PgPool, proposal: &Proposal) -> Result<()> {
    sqlx::query(
        r#"insert into llm_proposal
           (proposal_id, exchange, symbol, ts_ms, window_start_ms, window_end_ms,
            current_params_set_id, changes_json, rollback_json, reasoning_log_path,
            reasoning_log_sha256, status)
           values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(proposal.proposal_id)
    .bind(&proposal.exchange)
    .bind(&proposal.symbol)
    .bind(proposal.ts_ms)
    .bind(proposal.window_start_ms)
    .bind(proposal.window_end_ms)
    .bind(proposal.current_params_set_id)
    .bind(serde_json::to_value(&proposal.changes).context("serialize changes")?)
    .bind(serde_json::to_value(proposal.rollback).context("serialize rollback")?)
    .bind(&proposal.reasoning_log_path)
    .bind(&proposal.reasoning_log_sha256)
    .bind(status_str(proposal.status))
    .execute(pool)
    .await
    .context("insert_proposal failed")?;
    Ok(())
}

pub async fn update_proposal_status(pool: &PgPool, proposal_id: Uuid, status: ProposalStatus) -> Result<()> {
    sqlx::query(r#"update llm_proposal set status = $1 where proposal_id = $2"#)
        .bind(status_str(status))
        .bind(proposal_id)
        .execute(pool)
        .await
        .context("update_proposal_status failed")?;
    Ok(())
}

fn row_to_proposal(r: &sqlx::postgres::PgRow) -> Result<Proposal, anyhow::Error> {
    let changes_json: serde_json::Value = r.try_get("changes_json")?;
    let rollback_json: serde_json::Value = r.try_get("rollback_json")?;
    let status: String = r.try_get("status")?;
    Ok(Proposal {
        proposal_id: r.try_get("proposal_id")?,
        exchange: r.try_get("exchange")?,
        symbol: r.try_get("symbol")?,
        ts_ms: r.try_get("ts_ms")?,
        window_start_ms: r.try_get("window_start_ms")?,
        window_end_ms: r.try_get("window_end_ms")?,
        current_params_set_id: r.try_get("current_params_set_id")?,
        changes: serde_json::from_value(changes_json).context("deserialize changes")?,
        rollback: serde_json::from_value::<RollbackSpec>(rollback_json).context("deserialize rollback")?,
        reasoning_log_path: r.try_get("reasoning_log_path")?,
        reasoning_log_sha256: r.try_get("reasoning_log_sha256")?,
        status: status_from_str(&status),
    })
}

/// The oldest still-`pending` proposal for `(exchange, symbol)`, if any —
/// `ProposalApplier` admits at most one per boundary, so this is always
/// either empty or a single row in practice.
pub async fn fetch_oldest_pending(pool: &PgPool, exchange: &str, symbol: &str) -> Result<Option<Proposal>> {
    let row = sqlx::query(
        r#"select proposal_id, exchange, symbol, ts_ms, window_start_ms, window_end_ms,
                  current_params_set_id, changes_json, rollback_json, reasoning_log_path,
                  reasoning_log_sha256, status
           from llm_proposal
           where exchange = $1 and symbol = $2 and status = 'pending'
           order by ts_ms asc
           limit 1"#,
    )
    .bind(exchange)
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("fetch_oldest_pending failed")?;

    row.map(|r| row_to_proposal(&r)).transpose()
}

pub async fn insert_rollout(pool: &PgPool, rollout: &ParamRollout) -> Result<()> {
    sqlx::query(
        r#"insert into param_rollout (ts_ms, proposal_id, from_params_set_id, to_params_set_id, action, reason, metrics_snapshot)
           values ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(rollout.ts_ms)
    .bind(rollout.proposal_id)
    .bind(rollout.from_params_set_id)
    .bind(rollout.to_params_set_id)
    .bind(action_str(rollout.action))
    .bind(&rollout.reason)
    .bind(rollout.metrics_snapshot.clone())
    .execute(pool)
    .await
    .context("insert_rollout failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [ProposalStatus::Pending, ProposalStatus::Applied, ProposalStatus::Rejected] {
            assert_eq!(status_from_str(status_str(status)), status);
        }
    }

    #[test]
    fn status_from_str_defaults_unknown_to_pending() {
        assert_eq!(status_from_str("garbage"), ProposalStatus::Pending);
    }

    #[test]
    fn status_str_matches_column_convention() {
        assert_eq!(status_str(ProposalStatus::Pending), "pending");
        assert_eq!(status_str(ProposalStatus::Applied), "applied");
        assert_eq!(status_str(ProposalStatus::Rejected), "rejected");
    }

    #[test]
    fn action_str_matches_column_convention() {
        assert_eq!(action_str(RolloutAction::Apply), "apply");
        assert_eq!(action_str(RolloutAction::Reject), "reject");
        assert_eq!(action_str(RolloutAction::Rollback), "rollback");
    }
}
