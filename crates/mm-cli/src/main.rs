use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use mm_executor::{Executor, ExecutorConfig, PositionTracker};
use mm_proposal::ApplierOpts;
use mm_reflector::HttpLlmClient;
use mm_testkit::{PaperMarketDataAdapter, PaperTradingAdapter};
use mm_types::{Ms, ParamsRow, StrategyParams};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "mm")]
#[command(about = "Perpetual-futures market-making bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> exchange -> symbol...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run lifecycle commands
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum RunCmd {
    /// Start the executor against the paper adapters (§6 — concrete
    /// exchange connectivity is outside this crate's scope; wiring a real
    /// adapter means swapping these two constructors).
    Start {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = mm_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = mm_db::status(&pool).await?;
                    println!("db_ok={} has_strategy_params_table={}", s.ok, s.has_strategy_params_table);
                }
                DbCmd::Migrate => {
                    mm_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = mm_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Run { cmd } => match cmd {
            RunCmd::Start { config_paths } => run_start(&config_paths).await?,
        },
    }

    Ok(())
}

async fn run_start(config_paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let (runtime, loaded) = mm_config::load_runtime_config(&path_refs).context("load runtime config")?;
    let secrets = mm_config::resolve_secrets(&loaded.config_json);

    let pool = mm_db::connect_from_env().await.context("connect to database")?;
    mm_db::migrate(&pool).await.context("run migrations")?;

    let now_ms: Ms = Utc::now().timestamp_millis();
    let current_params = seed_params_if_missing(&pool, &runtime.exchange, &runtime.symbol, now_ms).await?;

    let llm_base_url = std::env::var("MM_LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let llm_api_key = secrets.llm_api_key.unwrap_or_default();
    let llm = Arc::new(HttpLlmClient::new(llm_base_url, llm_api_key, runtime.model.clone()));

    let log_dir = PathBuf::from(&runtime.log_dir);
    std::fs::create_dir_all(&log_dir).context("create log dir")?;
    let audit_log_path = log_dir.join("audit.jsonl");

    let cfg = ExecutorConfig {
        exchange: runtime.exchange.clone(),
        symbol: runtime.symbol.clone(),
        latest_top_upsert_interval_ms: runtime.latest_top_upsert_interval_ms,
        state_snapshot_interval_ms: runtime.state_snapshot_interval_ms,
        applier_opts: ApplierOpts {
            exchange: runtime.exchange.clone(),
            symbol: runtime.symbol.clone(),
            boundary_minutes: runtime.proposal_apply_boundary_minutes,
            grace_seconds: runtime.proposal_apply_boundary_grace_seconds,
            max_pause_count_for_apply: runtime.max_pause_count_for_apply,
            min_markout_10s_p50_for_apply: runtime.min_markout_10s_p50_for_apply,
        },
        retry: Default::default(),
        reflection_interval_ms: runtime.reflection_interval_ms,
        reflection_window_minutes: runtime.reflection_window_minutes,
        log_dir,
        llm,
        audit_log_path,
        audit_hash_chain: true,
    };

    let md_adapter = Arc::new(PaperMarketDataAdapter::new());
    let md_rx = md_adapter.take_receiver().expect("receiver only taken once");
    let trading_adapter = Arc::new(PaperTradingAdapter::new());

    let mut executor = Executor::new(
        cfg,
        pool,
        md_adapter.clone(),
        trading_adapter,
        current_params,
        mm_types::StrategyState::initial(now_ms),
        PositionTracker::default(),
        now_ms,
    )?;

    executor
        .connect_market_data(vec!["bbo".to_string(), "trades".to_string(), "mark".to_string(), "index".to_string()])
        .await?;

    println!("mm executor started exchange={} symbol={}", runtime.exchange, runtime.symbol);
    run_loop(&mut executor, md_rx, current_params.params.refresh_interval_ms).await
}

/// Drives market events and ticks until Ctrl-C, then shuts the executor
/// down cleanly (§5).
///
/// The tick cadence is re-read from `executor.current_params()` every loop
/// iteration and the `Interval` is rebuilt whenever it has changed, so a
/// reflector-applied `refreshIntervalMs` takes effect without a restart
/// (DESIGN.md open question #2) instead of only the first tick after
/// startup.
async fn run_loop(
    executor: &mut Executor,
    mut md_rx: tokio::sync::mpsc::UnboundedReceiver<mm_adapter::MarketDataEvent>,
    tick_interval_ms: i64,
) -> Result<()> {
    let mut current_interval_ms = tick_interval_ms.max(1);
    let mut tick = tokio::time::interval(std::time::Duration::from_millis(current_interval_ms as u64));

    loop {
        let live_interval_ms = executor.current_params().await.params.refresh_interval_ms.max(1);
        if live_interval_ms != current_interval_ms {
            current_interval_ms = live_interval_ms;
            tick = tokio::time::interval(std::time::Duration::from_millis(current_interval_ms as u64));
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                let now_ms = Utc::now().timestamp_millis();
                tracing::info!("shutdown requested");
                executor.shutdown(now_ms).await?;
                return Ok(());
            }
            maybe_event = md_rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        let now_ms = Utc::now().timestamp_millis();
                        executor.handle_market_event(&event, now_ms);
                    }
                    None => {
                        tracing::warn!("market data channel closed");
                        return Ok(());
                    }
                }
            }
            _ = tick.tick() => {
                let now_ms = Utc::now().timestamp_millis();
                if let Err(e) = executor.run_tick(now_ms).await {
                    tracing::warn!(error = %e, "tick failed");
                }
                if executor.watchdog_should_reconnect(now_ms) {
                    tracing::warn!("market data feed stale, forcing reconnect");
                    if let Err(e) = executor.reconnect_market_data().await {
                        tracing::warn!(error = %e, "reconnect failed");
                    }
                }
            }
        }
    }
}

/// Insert a `sane_defaults()` params row if none is current yet (first run
/// against a fresh database, §4.6 — the reflector only ever proposes
/// changes to an existing row).
async fn seed_params_if_missing(pool: &sqlx::PgPool, exchange: &str, symbol: &str, now_ms: Ms) -> Result<ParamsRow> {
    if let Some(existing) = mm_db::fetch_current_params(pool, exchange, symbol).await? {
        return Ok(existing);
    }
    let seeded = ParamsRow {
        params_set_id: Uuid::new_v4(),
        created_ms: now_ms,
        params: StrategyParams::sane_defaults(),
        is_current: true,
    };
    mm_db::promote(pool, exchange, symbol, &seeded).await?;
    Ok(seeded)
}
