//! In-memory, deterministic adapters implementing `mm-adapter`'s traits for
//! tests and scenario harnesses — no network I/O, no wall-clock dependence.

mod paper_market_data;
mod paper_trading;

pub use paper_market_data::PaperMarketDataAdapter;
pub use paper_trading::PaperTradingAdapter;
