//! `RuntimeConfig` — the typed, validated configuration surface named in
//! §6. Every field is validated at load time against a range check; no
//! downstream component re-validates raw JSON.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

fn default_bbo_throttle_ms() -> i64 {
    100
}
fn default_bbo_min_change_bps() -> f64 {
    0.5
}
fn default_latest_top_upsert_interval_ms() -> i64 {
    250
}
fn default_state_snapshot_interval_ms() -> i64 {
    1_000
}
fn default_event_flush_interval_ms() -> i64 {
    1_000
}
fn default_proposal_apply_boundary_minutes() -> i64 {
    5
}
fn default_proposal_apply_boundary_grace_seconds() -> i64 {
    30
}
fn default_max_pause_count_for_apply() -> u32 {
    3
}
fn default_min_markout_10s_p50_for_apply() -> f64 {
    -5.0
}
fn default_reflection_interval_ms() -> i64 {
    3_600_000
}
fn default_reflection_window_minutes() -> i64 {
    60
}
fn default_log_dir() -> String {
    "./data/logs".to_string()
}
fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

/// §6's Configuration list, each field documented with its default. Loaded
/// from [`crate::layered::LoadedConfig::config_json`] via `serde_json`'s
/// `Deserialize`, so a malformed or out-of-range value fails at load time —
/// never at the tick driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub exchange: String,
    pub symbol: String,

    pub tick_interval_ms: i64,
    pub stale_cancel_ms: i64,

    #[serde(default = "default_bbo_throttle_ms")]
    pub bbo_throttle_ms: i64,
    #[serde(default = "default_bbo_min_change_bps")]
    pub bbo_min_change_bps: f64,
    #[serde(default = "default_latest_top_upsert_interval_ms")]
    pub latest_top_upsert_interval_ms: i64,
    #[serde(default = "default_state_snapshot_interval_ms")]
    pub state_snapshot_interval_ms: i64,
    #[serde(default = "default_event_flush_interval_ms")]
    pub event_flush_interval_ms: i64,

    #[serde(default = "default_proposal_apply_boundary_minutes")]
    pub proposal_apply_boundary_minutes: i64,
    #[serde(default = "default_proposal_apply_boundary_grace_seconds")]
    pub proposal_apply_boundary_grace_seconds: i64,
    #[serde(default = "default_max_pause_count_for_apply")]
    pub max_pause_count_for_apply: u32,
    #[serde(default = "default_min_markout_10s_p50_for_apply")]
    pub min_markout_10s_p50_for_apply: f64,

    #[serde(default = "default_reflection_interval_ms")]
    pub reflection_interval_ms: i64,
    #[serde(default = "default_reflection_window_minutes")]
    pub reflection_window_minutes: i64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl RuntimeConfig {
    /// Validate every field's documented range (§6). Called once at load
    /// time; nothing downstream branches on raw JSON shape again.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.trim().is_empty() {
            bail!("exchange must not be empty");
        }
        if self.symbol.trim().is_empty() {
            bail!("symbol must not be empty");
        }
        if self.tick_interval_ms <= 0 {
            bail!("tickIntervalMs must be > 0, got {}", self.tick_interval_ms);
        }
        if self.stale_cancel_ms <= 0 {
            bail!("staleCancelMs must be > 0, got {}", self.stale_cancel_ms);
        }
        if self.bbo_throttle_ms < 0 {
            bail!("bboThrottleMs must be >= 0, got {}", self.bbo_throttle_ms);
        }
        if self.bbo_min_change_bps < 0.0 {
            bail!("bboMinChangeBps must be >= 0, got {}", self.bbo_min_change_bps);
        }
        if self.latest_top_upsert_interval_ms <= 0 {
            bail!(
                "latestTopUpsertIntervalMs must be > 0, got {}",
                self.latest_top_upsert_interval_ms
            );
        }
        if self.state_snapshot_interval_ms <= 0 {
            bail!(
                "stateSnapshotIntervalMs must be > 0, got {}",
                self.state_snapshot_interval_ms
            );
        }
        if self.event_flush_interval_ms <= 0 {
            bail!("eventFlushIntervalMs must be > 0, got {}", self.event_flush_interval_ms);
        }
        if self.proposal_apply_boundary_minutes <= 0 || 60 % self.proposal_apply_boundary_minutes != 0 {
            bail!(
                "proposalApplyBoundaryMinutes must divide 60 evenly, got {}",
                self.proposal_apply_boundary_minutes
            );
        }
        if !(0..60).contains(&self.proposal_apply_boundary_grace_seconds) {
            bail!(
                "proposalApplyBoundaryGraceSeconds must be in [0, 60), got {}",
                self.proposal_apply_boundary_grace_seconds
            );
        }
        if self.reflection_interval_ms <= 0 {
            bail!("reflectionIntervalMs must be > 0, got {}", self.reflection_interval_ms);
        }
        if self.reflection_window_minutes <= 0 {
            bail!(
                "reflectionWindowMinutes must be > 0, got {}",
                self.reflection_window_minutes
            );
        }
        if self.log_dir.trim().is_empty() {
            bail!("logDir must not be empty");
        }
        if self.model.trim().is_empty() {
            bail!("model must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sane() -> RuntimeConfig {
        RuntimeConfig {
            exchange: "hyperliquid".to_string(),
            symbol: "BTC-PERP".to_string(),
            tick_interval_ms: 1_000,
            stale_cancel_ms: 5_000,
            bbo_throttle_ms: 100,
            bbo_min_change_bps: 0.5,
            latest_top_upsert_interval_ms: 250,
            state_snapshot_interval_ms: 1_000,
            event_flush_interval_ms: 1_000,
            proposal_apply_boundary_minutes: 5,
            proposal_apply_boundary_grace_seconds: 30,
            max_pause_count_for_apply: 3,
            min_markout_10s_p50_for_apply: -5.0,
            reflection_interval_ms: 3_600_000,
            reflection_window_minutes: 60,
            log_dir: "./data/logs".to_string(),
            model: "claude-sonnet-4-5".to_string(),
        }
    }

    #[test]
    fn sane_config_validates() {
        assert!(sane().validate().is_ok());
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let mut c = sane();
        c.tick_interval_ms = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn boundary_minutes_must_divide_an_hour() {
        let mut c = sane();
        c.proposal_apply_boundary_minutes = 7;
        assert!(c.validate().is_err());
    }

    #[test]
    fn grace_seconds_out_of_range_rejected() {
        let mut c = sane();
        c.proposal_apply_boundary_grace_seconds = 60;
        assert!(c.validate().is_err());
    }
}
