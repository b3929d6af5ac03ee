//! The mark-out enrichment pipeline and window aggregator (§4.5).
//!
//! `enricher::enrich_fill` and `aggregator::aggregate` are pure over the
//! observations they're handed; the horizon-gate check against wall clock
//! and the DB queries that gather those observations belong to the caller
//! (`mm-executor`).

pub mod aggregator;
pub mod enricher;
pub mod horizon;
pub mod observations;

pub use aggregator::aggregate;
pub use enricher::{enrich_fill, EnrichmentInputs};
pub use horizon::{is_eligible, ENRICHMENT_HORIZON_MS, HORIZONS_MS, HORIZON_TOLERANCES_MS};
pub use observations::{closest_within, BboObs, MarkObs, MidObs, TradeObs};
