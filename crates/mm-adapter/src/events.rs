//! Market-data event stream shapes (§6). Adapters translate exchange wire
//! formats into these; everything downstream (the executor's market-data
//! consumer) only ever sees this enum.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mm_types::{Ms, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    Mark,
    Index,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BboEvent {
    pub ts: Ms,
    pub exchange: String,
    pub symbol: String,
    pub best_bid_px: f64,
    pub best_bid_sz: f64,
    pub best_ask_px: f64,
    pub best_ask_sz: f64,
    pub seq: Option<i64>,
    pub raw: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub ts: Ms,
    pub side: Option<Side>,
    pub px: f64,
    pub sz: f64,
    pub trade_id: Option<String>,
    pub trade_type: Option<String>,
    pub seq: Option<i64>,
    pub raw: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceEvent {
    pub ts: Ms,
    pub price_type: PriceType,
    pub mark_px: Option<f64>,
    pub index_px: Option<f64>,
    pub raw: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundingEvent {
    pub ts: Ms,
    pub funding_rate: f64,
    pub raw: Option<Value>,
}

/// The market-data adapter's event stream (§6). `Reconnecting` carries the
/// reason the adapter is about to attempt a reconnect, not a terminal error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MarketDataEvent {
    Connected,
    Disconnected,
    Reconnecting { reason: String },
    Bbo(BboEvent),
    Trade(TradeEvent),
    Price(PriceEvent),
    Funding(FundingEvent),
}
