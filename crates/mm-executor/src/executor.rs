//! The tick driver and the three single-writer consumer roles it hosts
//! (§4.8, §5): the tick driver is the sole writer of `StrategyState` and
//! the sole caller of `decide`; the market-data consumer is the sole
//! writer of `Snapshot` and the rolling windows; the fill consumer is the
//! sole writer of `PositionTracker`. All three live on one `Executor` here
//! because nothing in this workspace drives them from separate OS threads,
//! but each method below only ever touches the fields its role owns.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use mm_adapter::{MarketDataAdapter, MarketDataEvent, PriceType, SubscribeRequest, TradingAdapter};
use mm_audit::AuditWriter;
use mm_proposal::{apply_at_boundary, ApplierOpts, ApplierResult, OperationalContext};
use mm_reflector::LlmClient;
use mm_types::{format_price, format_size, Fill, Mode, Ms, ParamsRow, Snapshot, StrategyState};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::dead_letter::{write_with_retry, DbWriteHealth, DeadLetterQueue, RetryConfig};
use crate::enrichment::enrich_pending_fills;
use crate::order_translate::{translate_intents, OrderEventRecord};
use crate::position_tracker::PositionTracker;
use crate::reflection::run_reflection_cycle;
use crate::rolling::RollingWindows;
use crate::store_adapter::PgProposalStore;
use crate::watchdog::StaleWatchdog;

/// How often the tick driver sweeps for newly-eligible fills to enrich
/// (§4.5). Independent of `refreshIntervalMs`: enrichment only becomes
/// possible once a fill crosses the 60s horizon gate, so sub-second polling
/// buys nothing.
const ENRICH_INTERVAL_MS: Ms = 5_000;

/// Static, rarely-changing configuration the executor is built with (§6).
#[derive(Clone)]
pub struct ExecutorConfig {
    pub exchange: String,
    pub symbol: String,
    pub latest_top_upsert_interval_ms: Ms,
    pub state_snapshot_interval_ms: Ms,
    pub applier_opts: ApplierOpts,
    pub retry: RetryConfig,
    pub reflection_interval_ms: Ms,
    pub reflection_window_minutes: i64,
    pub log_dir: PathBuf,
    pub llm: Arc<dyn LlmClient>,
    pub audit_log_path: PathBuf,
    pub audit_hash_chain: bool,
}

/// Ties together the tick driver, market-data consumer, and fill consumer
/// (§4.8, §5). Construct via [`Executor::new`], feed it events with
/// [`Executor::handle_market_event`]/[`Executor::handle_fill`], and drive
/// ticks with [`Executor::run_tick`] at `current_params().params.refresh_interval_ms`.
pub struct Executor {
    cfg: ExecutorConfig,
    pool: PgPool,
    md_adapter: Arc<dyn MarketDataAdapter>,
    trading_adapter: Arc<dyn TradingAdapter>,
    current_params: Arc<RwLock<ParamsRow>>,

    // tick driver's own state
    state: StrategyState,

    // market-data consumer's own state
    snapshot: Snapshot,
    rolling: RollingWindows,
    watchdog: StaleWatchdog,

    // fill consumer's own state
    position: PositionTracker,

    // remembered so the watchdog's forced reconnect can resubscribe
    md_channels: Vec<String>,

    // shared, append-only bookkeeping
    db_health: DbWriteHealth,
    order_event_dlq: DeadLetterQueue<OrderEventRecord>,
    fill_dlq: DeadLetterQueue<Fill>,
    last_state_snapshot_ms: Ms,
    last_latest_top_upsert_ms: Ms,
    last_enrich_ms: Ms,
    last_reflection_ms: Ms,
    audit: Mutex<AuditWriter>,
}

impl Executor {
    pub fn new(
        cfg: ExecutorConfig,
        pool: PgPool,
        md_adapter: Arc<dyn MarketDataAdapter>,
        trading_adapter: Arc<dyn TradingAdapter>,
        initial_params: ParamsRow,
        initial_state: StrategyState,
        initial_position: PositionTracker,
        now_ms: Ms,
    ) -> anyhow::Result<Self> {
        let stale_ms = initial_params.params.stale_cancel_ms;
        let audit = AuditWriter::new(&cfg.audit_log_path, cfg.audit_hash_chain)?;
        Ok(Self {
            snapshot: Snapshot {
                exchange: cfg.exchange.clone(),
                symbol: cfg.symbol.clone(),
                now_ms,
                best_bid_px: format_price(0.0),
                best_bid_sz: format_size(0.0),
                best_ask_px: format_price(0.0),
                best_ask_sz: format_size(0.0),
                mark_px: None,
                index_px: None,
                last_update_ms: now_ms,
            },
            rolling: RollingWindows::new(),
            watchdog: StaleWatchdog::new(stale_ms, now_ms),
            position: initial_position,
            md_channels: Vec::new(),
            current_params: Arc::new(RwLock::new(initial_params)),
            state: initial_state,
            db_health: DbWriteHealth::new(),
            order_event_dlq: DeadLetterQueue::new(),
            fill_dlq: DeadLetterQueue::new(),
            last_state_snapshot_ms: now_ms,
            last_latest_top_upsert_ms: now_ms,
            last_enrich_ms: now_ms,
            last_reflection_ms: now_ms,
            audit: Mutex::new(audit),
            cfg,
            pool,
            md_adapter,
            trading_adapter,
        })
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn position_snapshot(&self) -> PositionTracker {
        self.position
    }

    pub async fn current_params(&self) -> ParamsRow {
        *self.current_params.read().await
    }

    pub fn watchdog_should_reconnect(&mut self, now_ms: Ms) -> bool {
        self.watchdog.should_kick_reconnect(now_ms)
    }

    /// Connect the market-data adapter and subscribe to `channels`,
    /// remembering them so a later watchdog-forced reconnect (§5) can
    /// resubscribe without the caller repeating the channel list.
    pub async fn connect_market_data(&mut self, channels: Vec<String>) -> anyhow::Result<()> {
        self.md_channels = channels;
        self.md_adapter.connect().await?;
        self.md_adapter
            .subscribe(SubscribeRequest {
                exchange: self.cfg.exchange.clone(),
                symbol: self.cfg.symbol.clone(),
                channels: self.md_channels.clone(),
            })
            .await
    }

    /// Forced reconnect after the stale-data watchdog fires (§5):
    /// disconnect, reconnect, and resubscribe to the same channels.
    pub async fn reconnect_market_data(&mut self) -> anyhow::Result<()> {
        let _ = self.md_adapter.disconnect().await;
        self.md_adapter.connect().await?;
        self.md_adapter
            .subscribe(SubscribeRequest {
                exchange: self.cfg.exchange.clone(),
                symbol: self.cfg.symbol.clone(),
                channels: self.md_channels.clone(),
            })
            .await
    }

    /// Market-data consumer role (§5): the only writer of `snapshot` and
    /// the rolling windows.
    pub fn handle_market_event(&mut self, event: &MarketDataEvent, now_ms: Ms) {
        match event {
            MarketDataEvent::Connected => self.watchdog.on_event(now_ms),
            MarketDataEvent::Disconnected | MarketDataEvent::Reconnecting { .. } => {}
            MarketDataEvent::Bbo(e) => {
                self.snapshot.best_bid_px = format_price(e.best_bid_px);
                self.snapshot.best_bid_sz = format_size(e.best_bid_sz);
                self.snapshot.best_ask_px = format_price(e.best_ask_px);
                self.snapshot.best_ask_sz = format_size(e.best_ask_sz);
                self.snapshot.last_update_ms = e.ts;
                let mid = (e.best_bid_px + e.best_ask_px) / 2.0;
                self.rolling.push_mid(mm_types::MidObs { ts: e.ts, mid_px: mid });
                self.watchdog.on_event(now_ms);
            }
            MarketDataEvent::Trade(e) => {
                self.rolling.push_trade(mm_types::TradeObs {
                    ts: e.ts,
                    px: format_price(e.px),
                    sz: format_size(e.sz),
                    side: e.side,
                    kind: e.trade_type.clone(),
                });
                self.watchdog.on_event(now_ms);
            }
            MarketDataEvent::Price(e) => {
                match e.price_type {
                    PriceType::Mark => self.snapshot.mark_px = e.mark_px.map(format_price),
                    PriceType::Index => self.snapshot.index_px = e.index_px.map(format_price),
                }
                self.watchdog.on_event(now_ms);
            }
            MarketDataEvent::Funding(_) => self.watchdog.on_event(now_ms),
        }
        self.snapshot.now_ms = now_ms;
    }

    /// Fill consumer role (§5): the only writer of `position`. Persists the
    /// raw fill (retried, dead-lettered on exhaustion) and updates the
    /// in-memory mirror unconditionally — the mirror tracks what the
    /// exchange told us regardless of whether the DB write lands.
    pub async fn handle_fill(&mut self, fill: Fill) {
        self.position.update_from_fill(&fill);
        let pool = self.pool.clone();
        let payload = fill.clone();
        write_with_retry(
            payload,
            move || {
                let pool = pool.clone();
                let fill = fill.clone();
                async move { mm_db::insert_fill(&pool, &fill).await }
            },
            &self.cfg.retry,
            &mut self.fill_dlq,
            &self.db_health,
        )
        .await;
    }

    /// Tick driver role (§4.8, §5): the only writer of `state` and the
    /// only caller of `decide`.
    pub async fn run_tick(&mut self, now_ms: Ms) -> anyhow::Result<()> {
        self.rolling.prune(now_ms);

        let params = *self.current_params.read().await;
        let trades_1s = self.rolling.trades_1s(now_ms);
        let trades_10s = self.rolling.trades_10s();
        let mids_10s = self.rolling.mids_10s();

        self.snapshot.now_ms = now_ms;
        let features = mm_features::compute_features(&self.snapshot, &trades_1s, &trades_10s, &mids_10s, params.params.stale_cancel_ms);

        let position = self.position.as_position();
        let out = mm_strategy::decide(mm_strategy::DecideInput {
            now_ms,
            state: &self.state,
            features: &features,
            params: &params.params,
            position: &position,
        });

        let entering_pause = out.next_state.mode == Mode::Pause && self.state.mode != Mode::Pause;
        self.state = out.next_state;

        let records = translate_intents(&*self.trading_adapter, &self.cfg.exchange, &self.cfg.symbol, now_ms, &out.intents).await?;
        for record in records {
            self.persist_order_event(record).await;
        }

        if entering_pause || now_ms - self.last_state_snapshot_ms >= self.cfg.state_snapshot_interval_ms {
            self.persist_state_snapshot(now_ms).await;
            self.last_state_snapshot_ms = now_ms;
        }

        if now_ms - self.last_latest_top_upsert_ms >= self.cfg.latest_top_upsert_interval_ms {
            let _ = mm_db::upsert_latest_top(
                &self.pool,
                &self.cfg.exchange,
                &self.cfg.symbol,
                self.snapshot.best_bid_px.as_f64(),
                self.snapshot.best_ask_px.as_f64(),
                now_ms,
            )
            .await;
            self.last_latest_top_upsert_ms = now_ms;
        }

        self.run_proposal_applier(now_ms, features.data_stale).await?;

        if now_ms - self.last_enrich_ms >= ENRICH_INTERVAL_MS {
            if let Err(e) = enrich_pending_fills(&self.pool, &self.cfg.exchange, &self.cfg.symbol, now_ms).await {
                tracing::warn!(error = %e, "enrichment pass failed");
            }
            self.last_enrich_ms = now_ms;
        }

        if now_ms - self.last_reflection_ms >= self.cfg.reflection_interval_ms {
            self.run_reflection(now_ms).await;
            self.last_reflection_ms = now_ms;
        }

        Ok(())
    }

    async fn run_reflection(&self, now_ms: Ms) {
        let window_ms = self.cfg.reflection_window_minutes * 60_000;
        let (window_start_ms, window_end_ms) = last_complete_utc_window(now_ms, window_ms);

        let fills = match mm_db::fetch_enriched_fills_full_window(&self.pool, window_start_ms, window_end_ms).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "reflection: failed to fetch enriched fills window");
                return;
            }
        };
        let cancel_count = mm_db::count_order_events(
            &self.pool,
            &self.cfg.exchange,
            &self.cfg.symbol,
            "cancel",
            window_start_ms,
            window_end_ms,
        )
        .await
        .unwrap_or(0);
        let pause_count = mm_db::count_pause_entries(&self.pool, &self.cfg.exchange, &self.cfg.symbol, window_start_ms, window_end_ms)
            .await
            .unwrap_or(0);
        let window = mm_enrich::aggregate(window_start_ms, window_end_ms, &fills, cancel_count, pause_count);

        let current = self.current_params().await;
        match run_reflection_cycle(&self.pool, &*self.cfg.llm, &self.cfg.log_dir, &self.cfg.exchange, &self.cfg.symbol, &window, &current, now_ms).await {
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "reflection cycle errored"),
        }
    }

    async fn persist_order_event(&mut self, record: OrderEventRecord) {
        let pool = self.pool.clone();
        let exchange = self.cfg.exchange.clone();
        let symbol = self.cfg.symbol.clone();
        let reason_codes: Vec<String> = record.reason_codes.iter().map(|c| format!("{c:?}")).collect();
        let payload = record.clone();
        write_with_retry(
            record,
            move || {
                let pool = pool.clone();
                let exchange = exchange.clone();
                let symbol = symbol.clone();
                let reason_codes = reason_codes.clone();
                let payload = payload.clone();
                async move {
                    mm_db::insert_order_event(
                        &pool,
                        payload.ts,
                        &exchange,
                        &symbol,
                        &payload.client_order_id,
                        payload.event_type,
                        payload.side,
                        payload.px.as_ref().map(|p| p.as_f64()),
                        payload.sz.as_ref().map(|s| s.as_f64()),
                        &reason_codes,
                    )
                    .await
                }
            },
            &self.cfg.retry,
            &mut self.order_event_dlq,
            &self.db_health,
        )
        .await;
    }

    async fn persist_state_snapshot(&self, now_ms: Ms) {
        let _ = mm_db::insert_state_snapshot(
            &self.pool,
            now_ms,
            &self.cfg.exchange,
            &self.cfg.symbol,
            self.state.mode,
            self.state.mode_since_ms,
            self.state.pause_until_ms,
        )
        .await;

        let event_type = match self.state.mode {
            Mode::Normal => "normal",
            Mode::Defensive => "defensive",
            Mode::Pause => "pause",
        };
        let payload = serde_json::json!({
            "ts": now_ms,
            "exchange": self.cfg.exchange,
            "symbol": self.cfg.symbol,
            "mode_since_ms": self.state.mode_since_ms,
            "pause_until_ms": self.state.pause_until_ms,
        });
        if let Ok(mut audit) = self.audit.lock() {
            if let Err(e) = audit.append("strategy_state", event_type, payload) {
                tracing::warn!(error = %e, "failed to append strategy_state audit event");
            }
        }
    }

    async fn run_proposal_applier(&mut self, now_ms: Ms, data_stale: bool) -> anyhow::Result<()> {
        let store = PgProposalStore::new(self.pool.clone());
        let current = *self.current_params.read().await;

        let pause_count_last_hour =
            mm_db::count_pause_entries(&self.pool, &self.cfg.exchange, &self.cfg.symbol, now_ms - 3_600_000, now_ms)
                .await
                .unwrap_or(0);
        let markout_10s_p50 = self.recent_markout_10s_p50(now_ms).await;

        let ctx = OperationalContext {
            db_write_failures: self.db_health.is_failing(),
            exchange_errors: false,
            data_stale,
            pause_count_last_hour,
            markout_10s_p50,
        };

        match apply_at_boundary(&store, now_ms, &self.cfg.applier_opts, &ctx, &current).await {
            ApplierResult::Applied { params, changed_keys } => {
                let payload = serde_json::json!({
                    "ts": now_ms,
                    "from_params_set_id": current.params_set_id,
                    "to_params_set_id": params.params_set_id,
                    "changed_keys": changed_keys,
                });
                if let Ok(mut audit) = self.audit.lock() {
                    if let Err(e) = audit.append("param_rollout", "apply", payload) {
                        tracing::warn!(error = %e, "failed to append param_rollout apply audit event");
                    }
                }
                *self.current_params.write().await = params;
            }
            ApplierResult::Rejected { proposal_id, reason } => {
                let payload = serde_json::json!({
                    "ts": now_ms,
                    "proposal_id": proposal_id,
                    "from_params_set_id": current.params_set_id,
                    "reason": reason,
                });
                if let Ok(mut audit) = self.audit.lock() {
                    if let Err(e) = audit.append("param_rollout", "reject", payload) {
                        tracing::warn!(error = %e, "failed to append param_rollout reject audit event");
                    }
                }
            }
            ApplierResult::NoPending | ApplierResult::Error { .. } => {}
        }
        Ok(())
    }

    async fn recent_markout_10s_p50(&self, now_ms: Ms) -> Option<f64> {
        let rows = mm_db::fetch_enriched_fills_window(&self.pool, now_ms - 3_600_000, now_ms).await.ok()?;
        let mut markouts: Vec<f64> = rows.into_iter().filter_map(|r| r.markout_10s_bps).collect();
        if markouts.is_empty() {
            return None;
        }
        markouts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Some(nearest_rank_percentile(&markouts, 50.0))
    }

    /// Graceful shutdown (§5): stop admitting new intents, flush whatever
    /// is still in the dead-letter queues one last time, write a final
    /// state snapshot, and disconnect the market-data adapter.
    pub async fn shutdown(&mut self, now_ms: Ms) -> anyhow::Result<()> {
        for record in self.order_event_dlq.drain() {
            let _ = self.persist_order_event_once(record).await;
        }
        for fill in self.fill_dlq.drain() {
            let _ = mm_db::insert_fill(&self.pool, &fill).await;
        }
        self.persist_state_snapshot(now_ms).await;
        self.md_adapter.disconnect().await?;
        Ok(())
    }

    async fn persist_order_event_once(&self, record: OrderEventRecord) -> anyhow::Result<()> {
        let reason_codes: Vec<String> = record.reason_codes.iter().map(|c| format!("{c:?}")).collect();
        mm_db::insert_order_event(
            &self.pool,
            record.ts,
            &self.cfg.exchange,
            &self.cfg.symbol,
            &record.client_order_id,
            record.event_type,
            record.side,
            record.px.as_ref().map(|p| p.as_f64()),
            record.sz.as_ref().map(|s| s.as_f64()),
            &reason_codes,
        )
        .await
    }
}

/// Nearest-rank percentile over an already-sorted-ascending slice, same
/// convention as `mm_enrich::aggregator`'s private helper (§4.5).
fn nearest_rank_percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Floor `now_ms` to the last completed wall-clock-UTC window of width
/// `window_ms` (§4.5: "1-minute and 1-hour aggregations run at minute /
/// hour ticks of wall-clock UTC and cover the last complete unit"). `Ms` is
/// already a Unix-epoch millisecond count, so flooring by simple modulo
/// against the window width lands on UTC minute/hour boundaries with no
/// timezone handling needed — epoch 0 is itself a UTC boundary for every
/// divisor this system uses (60_000ms, 3_600_000ms, ...).
///
/// Returns `(window_start_ms, window_end_ms)` where `window_end_ms` is the
/// most recent boundary at or before `now_ms` and the window spans exactly
/// one `window_ms`-wide completed unit ending there.
fn last_complete_utc_window(now_ms: Ms, window_ms: Ms) -> (Ms, Ms) {
    if window_ms <= 0 {
        return (now_ms, now_ms);
    }
    let window_end_ms = now_ms - now_ms.rem_euclid(window_ms);
    (window_end_ms - window_ms, window_end_ms)
}
