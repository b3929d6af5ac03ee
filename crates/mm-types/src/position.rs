//! Inventory position, tracked by the executor and fed back into the kernel. §3, §4.8.

use serde::{Deserialize, Serialize};

use crate::decimal::{Ms, SizeStr};

/// Net signed inventory in base units. Positive is long, negative is short.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: f64,
    pub updated_ms: Ms,
}

impl Position {
    pub fn flat(now_ms: Ms) -> Self {
        Self {
            size: 0.0,
            updated_ms: now_ms,
        }
    }

    pub fn as_size_str(&self) -> SizeStr {
        crate::decimal::format_size(self.size)
    }
}
