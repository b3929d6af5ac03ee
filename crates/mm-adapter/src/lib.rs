//! Adapter contracts: the market-data event stream shape and the trading
//! adapter's RPC surface (§6). Concrete exchange adapters and the
//! in-memory paper adapters both implement these traits; this crate is
//! transport-agnostic and carries no network code itself.

pub mod events;
pub mod market_data;
pub mod trading;

pub use events::{BboEvent, FundingEvent, MarketDataEvent, PriceEvent, PriceType, TradeEvent};
pub use market_data::{DeliveredEvent, MarketDataAdapter, SubscribeRequest};
pub use trading::{PlaceOrderRequest, PlaceOrderResult, PositionInfo, TradingAdapter};
