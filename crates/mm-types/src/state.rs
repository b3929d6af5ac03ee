//! `StrategyState` — the kernel's own mode/timers, carried across ticks. §3, §4.4.

use serde::{Deserialize, Serialize};

use crate::decimal::Ms;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Normal,
    Defensive,
    Pause,
}

/// Carried by the caller between `StrategyKernel::decide` calls. The kernel
/// never reads a clock itself — every timestamp comparison is against
/// `nowMs` passed in alongside this state (§4.4 determinism invariant).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    pub mode: Mode,
    pub mode_since_ms: Ms,
    pub pause_until_ms: Option<Ms>,
    pub last_quote_ms: Option<Ms>,
}

impl StrategyState {
    pub fn initial(now_ms: Ms) -> Self {
        Self {
            mode: Mode::Normal,
            mode_since_ms: now_ms,
            pause_until_ms: None,
            last_quote_ms: None,
        }
    }

    pub fn dwell_ms(&self, now_ms: Ms) -> Ms {
        (now_ms - self.mode_since_ms).max(0)
    }
}
