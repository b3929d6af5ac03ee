//! `ProposalApplier` (§4.7) — the boundary-gated protocol that promotes a
//! reflector proposal to a new current `strategy_params` row, or rejects
//! it, with an audit trail of either outcome.

mod applier;
mod boundary;
mod store;

pub use applier::{apply_at_boundary, ApplierResult};
pub use boundary::is_at_boundary;
pub use store::{ApplierOpts, OperationalContext, ProposalStore};
