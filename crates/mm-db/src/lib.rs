//! Postgres persistence for the logical tables of §6. DDL lives under
//! `migrations/`, run via `sqlx::migrate!` exactly as the teacher's
//! `mqk-db::migrate` does; row structs are plain, hand-written, and
//! populated with `try_get` rather than `query_as!` so the crate compiles
//! without a live database at build time.

pub mod md;
pub mod orders;
pub mod params;
pub mod position;
pub mod proposal;
pub mod state;

pub use md::*;
pub use orders::*;
pub use params::*;
pub use position::*;
pub use proposal::*;
pub use state::*;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

pub const ENV_DB_URL: &str = "MM_DATABASE_URL";

/// Connect to Postgres using `MM_DATABASE_URL`.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.context("db migrate failed")
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_strategy_params_table: bool,
}

pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as("select 1").fetch_one(pool).await.context("connectivity query")?;
    let row = sqlx::query(
        r#"select exists (
             select 1 from information_schema.tables
             where table_schema = 'public' and table_name = 'strategy_params'
           )"#,
    )
    .fetch_one(pool)
    .await
    .context("table-exists query")?;
    let exists: bool = row.try_get(0)?;
    Ok(DbStatus {
        ok: one == 1,
        has_strategy_params_table: exists,
    })
}
