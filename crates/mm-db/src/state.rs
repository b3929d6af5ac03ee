//! `strategy_state` snapshots (§4.4, §4.8, §6). Written on every mode
//! transition and on a periodic heartbeat so a restart can recover the
//! kernel's mode without replaying the whole fill/trade history.

use anyhow::{Context, Result};
use mm_types::Mode;
use sqlx::{PgPool, Row};

fn mode_str(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "normal",
        Mode::Defensive => "defensive",
        Mode::Pause => "pause",
    }
}

fn mode_from_str(s: &str) -> Mode {
    match s {
        "defensive" => Mode::Defensive,
        "pause" => Mode::Pause,
        _ => Mode::Normal,
    }
}

pub async fn insert_state_snapshot(
    pool: &PgPool,
    ts: i64,
    exchange: &str,
    symbol: &str,
    mode: Mode,
    mode_since_ms: i64,
    pause_until_ms: Option<i64>,
) -> Result<()> {
    sqlx::query(
        r#"insert into strategy_state (ts, exchange, symbol, mode, mode_since_ms, pause_until_ms)
           values ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(ts)
    .bind(exchange)
    .bind(symbol)
    .bind(mode_str(mode))
    .bind(mode_since_ms)
    .bind(pause_until_ms)
    .execute(pool)
    .await
    .context("insert_state_snapshot failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub ts: i64,
    pub mode: Mode,
    pub mode_since_ms: i64,
    pub pause_until_ms: Option<i64>,
}

pub async fn fetch_latest_state(pool: &PgPool, exchange: &str, symbol: &str) -> Result<Option<StateSnapshot>> {
    let row = sqlx::query(
        r#"select ts, mode, mode_since_ms, pause_until_ms
           from strategy_state
           where exchange = $1 and symbol = $2
           order by ts desc
           limit 1"#,
    )
    .bind(exchange)
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("fetch_latest_state failed")?;

    row.map(|r| {
        let mode: String = r.try_get("mode")?;
        Ok(StateSnapshot {
            ts: r.try_get("ts")?,
            mode: mode_from_str(&mode),
            mode_since_ms: r.try_get("mode_since_ms")?,
            pause_until_ms: r.try_get("pause_until_ms")?,
        })
    })
    .transpose()
}

/// Count of distinct pause-entry transitions in `[from_ts, to_ts]` — feeds
/// both the aggregator's `pauseCount` and the applier's `pauseCountLastHour`
/// operational gate (§4.5, §4.7). A pause "entry" is a row whose mode is
/// `pause` and whose `mode_since_ms` falls inside the window, since a
/// single pause dwell may be snapshotted more than once.
pub async fn count_pause_entries(pool: &PgPool, exchange: &str, symbol: &str, from_ts: i64, to_ts: i64) -> Result<u32> {
    let row = sqlx::query(
        r#"select count(distinct mode_since_ms) as n
           from strategy_state
           where exchange = $1 and symbol = $2 and mode = 'pause' and mode_since_ms between $3 and $4"#,
    )
    .bind(exchange)
    .bind(symbol)
    .bind(from_ts)
    .bind(to_ts)
    .fetch_one(pool)
    .await
    .context("count_pause_entries failed")?;
    let n: i64 = row.try_get("n")?;
    Ok(n.max(0) as u32)
}
