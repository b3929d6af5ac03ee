//! The executor binds the pure decision crates (`mm-features`,
//! `mm-strategy`, `mm-proposal`, `mm-enrich`) to `mm-db` persistence and
//! `mm-adapter` exchange connectivity, hosting the single-writer roles
//! described in the tick driver module doc (§4.8, §5).

mod dead_letter;
mod enrichment;
mod executor;
mod order_translate;
mod position_tracker;
mod reflection;
mod rolling;
mod store_adapter;
mod watchdog;

pub use dead_letter::{DbWriteHealth, DeadLetterQueue, RetryConfig};
pub use executor::{Executor, ExecutorConfig};
pub use order_translate::{translate_intents, OrderEventRecord};
pub use position_tracker::PositionTracker;
pub use reflection::run_reflection_cycle;
pub use rolling::RollingWindows;
pub use store_adapter::PgProposalStore;
pub use watchdog::StaleWatchdog;
