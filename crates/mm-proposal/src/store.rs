//! The effectful seam `apply_at_boundary` runs behind — kept as a trait so
//! the admission protocol itself stays testable without a Postgres instance.
//! `mm-db`'s `proposal`/`params` modules are the production implementation
//! the executor wires in.

use async_trait::async_trait;
use mm_types::{ParamRollout, ParamsRow, Proposal, ProposalStatus};
use uuid::Uuid;

#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn fetch_oldest_pending(&self, exchange: &str, symbol: &str) -> anyhow::Result<Option<Proposal>>;
    async fn update_proposal_status(&self, proposal_id: Uuid, status: ProposalStatus) -> anyhow::Result<()>;
    async fn promote_params(&self, exchange: &str, symbol: &str, new_row: &ParamsRow) -> anyhow::Result<()>;
    async fn insert_rollout(&self, rollout: &ParamRollout) -> anyhow::Result<()>;
}

/// Per-`(exchange, symbol)` applier configuration (§4.7, §6).
#[derive(Clone, Debug)]
pub struct ApplierOpts {
    pub exchange: String,
    pub symbol: String,
    pub boundary_minutes: i64,
    pub grace_seconds: i64,
    pub max_pause_count_for_apply: u32,
    pub min_markout_10s_p50_for_apply: f64,
}

/// Live operational signals the applier's last gate family consults (§4.7).
/// `None` markout means "no fills enriched yet in the lookback window" — the
/// gate does not fail closed on that, since a freshly started bot would
/// never be able to apply anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationalContext {
    pub db_write_failures: bool,
    pub exchange_errors: bool,
    pub data_stale: bool,
    pub pause_count_last_hour: u32,
    pub markout_10s_p50: Option<f64>,
}
