//! `ProposalApplier` — the effectful admission protocol that turns a
//! gate-passing, operationally-healthy proposal into a promoted params row
//! (§4.7). Runs once per boundary tick from the executor loop; never
//! invoked off-boundary, so at most one proposal is applied or rejected per
//! boundary by construction.

use std::collections::BTreeMap;

use mm_types::{Ms, ParamRollout, ParamsRow, Proposal, ProposalStatus, RolloutAction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::boundary::is_at_boundary;
use crate::store::{ApplierOpts, OperationalContext, ProposalStore};

#[derive(Clone, Debug)]
pub enum ApplierResult {
    /// Outside the boundary grace window, or no proposal is pending.
    NoPending,
    Applied { params: ParamsRow, changed_keys: Vec<String> },
    Rejected { proposal_id: Uuid, reason: String },
    Error { message: String },
}

fn to_gate_rollback(r: mm_types::RollbackSpec) -> mm_gate::RollbackSpec {
    mm_gate::RollbackSpec {
        markout_10s_p50_below_bps: r.markout_10s_p50_below_bps,
        pause_count_above: r.pause_count_above,
        max_duration_ms: r.max_duration_ms.map(|v| v as f64),
    }
}

fn describe_gate_errors(errors: &[mm_gate::GateError]) -> String {
    errors
        .iter()
        .map(|e| format!("{:?}", e))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn reject(
    store: &dyn ProposalStore,
    proposal: &Proposal,
    current_params_set_id: Uuid,
    now_ms: Ms,
    reason: String,
) -> ApplierResult {
    if let Err(e) = store.update_proposal_status(proposal.proposal_id, ProposalStatus::Rejected).await {
        warn!(proposal_id = ?proposal.proposal_id, error = %e, "proposal/reject-write-failed");
        return ApplierResult::Error { message: e.to_string() };
    }
    let rollout = ParamRollout {
        ts_ms: now_ms,
        proposal_id: Some(proposal.proposal_id),
        from_params_set_id: current_params_set_id,
        to_params_set_id: None,
        action: RolloutAction::Reject,
        reason: reason.clone(),
        metrics_snapshot: None,
    };
    if let Err(e) = store.insert_rollout(&rollout).await {
        warn!(proposal_id = ?proposal.proposal_id, error = %e, "proposal/reject-audit-failed");
        return ApplierResult::Error { message: e.to_string() };
    }
    info!(proposal_id = ?proposal.proposal_id, %reason, "proposal/rejected");
    ApplierResult::Rejected { proposal_id: proposal.proposal_id, reason }
}

/// Run the applier protocol for one `(exchange, symbol)` at `now_ms`.
///
/// Order of checks, per §4.7: boundary predicate, pending-proposal lookup,
/// shape, `mm-gate` validation, then the operational gates in the fixed
/// order `dbWriteFailures -> exchangeErrors -> dataStale -> pauseCount ->
/// markout`. The first failing check determines the rejection reason; nothing
/// downstream is evaluated.
pub async fn apply_at_boundary(
    store: &dyn ProposalStore,
    now_ms: Ms,
    opts: &ApplierOpts,
    ctx: &OperationalContext,
    current_params: &ParamsRow,
) -> ApplierResult {
    if !is_at_boundary(now_ms, opts.boundary_minutes, opts.grace_seconds) {
        return ApplierResult::NoPending;
    }

    let proposal = match store.fetch_oldest_pending(&opts.exchange, &opts.symbol).await {
        Ok(Some(p)) => p,
        Ok(None) => return ApplierResult::NoPending,
        Err(e) => return ApplierResult::Error { message: e.to_string() },
    };

    if !proposal.has_valid_shape() {
        return reject(
            store,
            &proposal,
            current_params.params_set_id,
            now_ms,
            "shape: changes count or rollback thresholds invalid".to_string(),
        )
        .await;
    }

    let changes: BTreeMap<String, f64> = proposal.changes.clone();
    let gate_input = mm_gate::ProposedChange {
        changes,
        rollback: to_gate_rollback(proposal.rollback),
    };
    let gate_errors = mm_gate::validate(&gate_input, &current_params.params);
    if !gate_errors.is_empty() {
        return reject(
            store,
            &proposal,
            current_params.params_set_id,
            now_ms,
            format!("gate: {}", describe_gate_errors(&gate_errors)),
        )
        .await;
    }

    if ctx.db_write_failures {
        return reject(store, &proposal, current_params.params_set_id, now_ms, "operational: dbWriteFailures".to_string()).await;
    }
    if ctx.exchange_errors {
        return reject(store, &proposal, current_params.params_set_id, now_ms, "operational: exchangeErrors".to_string()).await;
    }
    if ctx.data_stale {
        return reject(store, &proposal, current_params.params_set_id, now_ms, "operational: dataStale".to_string()).await;
    }
    if ctx.pause_count_last_hour > opts.max_pause_count_for_apply {
        return reject(
            store,
            &proposal,
            current_params.params_set_id,
            now_ms,
            format!(
                "operational: pauseCountLastHour {} > max {}",
                ctx.pause_count_last_hour, opts.max_pause_count_for_apply
            ),
        )
        .await;
    }
    if let Some(p50) = ctx.markout_10s_p50 {
        if p50 < opts.min_markout_10s_p50_for_apply {
            return reject(
                store,
                &proposal,
                current_params.params_set_id,
                now_ms,
                format!("operational: markout10sP50 {} < min {}", p50, opts.min_markout_10s_p50_for_apply),
            )
            .await;
        }
    }

    let mut new_params = current_params.params;
    for (name, value) in &proposal.changes {
        new_params = new_params.with_overlay(name, *value);
    }
    let new_row = ParamsRow {
        params_set_id: Uuid::new_v4(),
        created_ms: now_ms,
        params: new_params,
        is_current: true,
    };

    if let Err(e) = store.promote_params(&opts.exchange, &opts.symbol, &new_row).await {
        return ApplierResult::Error { message: e.to_string() };
    }
    if let Err(e) = store.update_proposal_status(proposal.proposal_id, ProposalStatus::Applied).await {
        return ApplierResult::Error { message: e.to_string() };
    }

    let changed_keys: Vec<String> = proposal.changes.keys().cloned().collect();
    let rollout = ParamRollout {
        ts_ms: now_ms,
        proposal_id: Some(proposal.proposal_id),
        from_params_set_id: current_params.params_set_id,
        to_params_set_id: Some(new_row.params_set_id),
        action: RolloutAction::Apply,
        reason: format!("applied: {}", changed_keys.join(",")),
        metrics_snapshot: None,
    };
    if let Err(e) = store.insert_rollout(&rollout).await {
        return ApplierResult::Error { message: e.to_string() };
    }

    info!(proposal_id = ?proposal.proposal_id, changed = ?changed_keys, to = ?new_row.params_set_id, "proposal/applied");
    ApplierResult::Applied { params: new_row, changed_keys }
}
