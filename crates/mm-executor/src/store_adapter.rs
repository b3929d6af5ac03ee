//! Postgres-backed [`ProposalStore`]: thin glue over `mm-db`'s `proposal`
//! and `params` modules so `mm_proposal::apply_at_boundary` stays
//! DB-agnostic (§4.7).

use async_trait::async_trait;
use mm_proposal::ProposalStore;
use mm_types::{ParamRollout, ParamsRow, Proposal, ProposalStatus};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgProposalStore {
    pool: PgPool,
}

impl PgProposalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalStore for PgProposalStore {
    async fn fetch_oldest_pending(&self, exchange: &str, symbol: &str) -> anyhow::Result<Option<Proposal>> {
        mm_db::fetch_oldest_pending(&self.pool, exchange, symbol).await
    }

    async fn update_proposal_status(&self, proposal_id: Uuid, status: ProposalStatus) -> anyhow::Result<()> {
        mm_db::update_proposal_status(&self.pool, proposal_id, status).await
    }

    async fn promote_params(&self, exchange: &str, symbol: &str, new_row: &ParamsRow) -> anyhow::Result<()> {
        mm_db::promote(&self.pool, exchange, symbol, new_row).await
    }

    async fn insert_rollout(&self, rollout: &ParamRollout) -> anyhow::Result<()> {
        mm_db::insert_rollout(&self.pool, rollout).await
    }
}
