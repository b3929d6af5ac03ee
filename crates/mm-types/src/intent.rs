//! Order intents emitted by `StrategyKernel::decide` and their reason codes. §4.4.

use serde::{Deserialize, Serialize};

use crate::decimal::{PriceStr, SizeStr};

/// Why a given intent was chosen. Always non-empty on an intent (§4.4 —
/// every decision carries at least one reason code for the audit trail).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    DataStale,
    MarkIndexDiverged,
    LiquidationSpike,
    InventoryLimit,
    DefensiveVol,
    DefensiveTox,
    PostOnlyRejected,
    PauseMinDuration,
    NormalConditions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OrderIntent {
    CancelAll {
        reason_codes: Vec<ReasonCode>,
    },
    Quote {
        bid_px: PriceStr,
        ask_px: PriceStr,
        size: SizeStr,
        post_only: bool,
        reason_codes: Vec<ReasonCode>,
    },
}

impl OrderIntent {
    pub fn reason_codes(&self) -> &[ReasonCode] {
        match self {
            OrderIntent::CancelAll { reason_codes } => reason_codes,
            OrderIntent::Quote { reason_codes, .. } => reason_codes,
        }
    }

    pub fn is_quote(&self) -> bool {
        matches!(self, OrderIntent::Quote { .. })
    }
}
