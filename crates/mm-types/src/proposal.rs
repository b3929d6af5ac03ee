//! LLM-reflector proposals and the param-rollout audit record they produce
//! once gated through `ProposalApplier`. §3, §4.6, §4.7, §6.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::decimal::Ms;

/// Rollback thresholds carried with a proposal (§3). At least one must be
/// set — `ParamGate` rejects a proposal whose `rollback` has none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RollbackSpec {
    pub markout_10s_p50_below_bps: Option<f64>,
    pub pause_count_above: Option<f64>,
    pub max_duration_ms: Option<i64>,
}

impl RollbackSpec {
    pub fn has_any_threshold(&self) -> bool {
        self.markout_10s_p50_below_bps.is_some()
            || self.pause_count_above.is_some()
            || self.max_duration_ms.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Applied,
    Rejected,
}

/// A reflector-authored proposal to adjust 1-2 of the ten [`crate::params::PARAM_NAMES`]
/// (§3). `changes` maps a canonical parameter name to its proposed value —
/// numeric, but carried as `f64` once past the LLM-output JSON boundary
/// (see `mm-reflector`'s schema validation, which accepts string or number
/// and coerces before a `Proposal` is ever constructed).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: Uuid,
    pub exchange: String,
    pub symbol: String,
    pub ts_ms: Ms,
    pub window_start_ms: Ms,
    pub window_end_ms: Ms,
    pub current_params_set_id: Uuid,
    pub changes: BTreeMap<String, f64>,
    pub rollback: RollbackSpec,
    /// Path to the durable reasoning-log JSON file backing this proposal
    /// (§6 — file-first rule: written and hashed before this row exists).
    pub reasoning_log_path: String,
    pub reasoning_log_sha256: String,
    pub status: ProposalStatus,
}

impl Proposal {
    /// `1 <= |changes| <= 2` and at least one rollback threshold set (§3 invariants).
    pub fn has_valid_shape(&self) -> bool {
        (1..=2).contains(&self.changes.len()) && self.rollback.has_any_threshold()
    }
}

/// Append-only audit record of a params-row transition (§3, §4.7). Never
/// mutated or deleted once written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutAction {
    Apply,
    Reject,
    Rollback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRollout {
    pub ts_ms: Ms,
    pub proposal_id: Option<Uuid>,
    pub from_params_set_id: Uuid,
    pub to_params_set_id: Option<Uuid>,
    pub action: RolloutAction,
    pub reason: String,
    pub metrics_snapshot: Option<serde_json::Value>,
}
