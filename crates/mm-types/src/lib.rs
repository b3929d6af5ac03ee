//! Shared value objects and entities for the market-making system.
//!
//! Every other crate in the workspace depends on this one and nothing else
//! in the reverse direction: `mm-types` has no knowledge of features, risk,
//! or execution — it only defines the shapes those crates pass around.

pub mod aggregation;
pub mod decimal;
pub mod fill;
pub mod intent;
pub mod market;
pub mod params;
pub mod position;
pub mod proposal;
pub mod state;

pub use aggregation::{AggregationWindow, WorstFill};
pub use decimal::{format_bps, format_price, format_size, BpsStr, DecimalStr, Ms, PriceStr, SizeStr};
pub use fill::{EnrichedFill, Fill, Liquidity};
pub use intent::{OrderIntent, ReasonCode};
pub use market::{Features, MidObs, Side, Snapshot, TradeObs};
pub use params::{ParamsRow, StrategyParams, INTEGER_PARAM_NAMES, PARAM_NAMES};
pub use position::Position;
pub use proposal::{ParamRollout, Proposal, ProposalStatus, RollbackSpec, RolloutAction};
pub use state::{Mode, StrategyState};
