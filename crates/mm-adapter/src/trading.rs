//! Trading adapter contract (§6): post-only placement, cancel-all, and
//! position sync.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mm_types::{Ms, PriceStr, SizeStr, Side};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub px: PriceStr,
    pub sz: SizeStr,
    pub client_order_id: String,
    pub post_only: bool,
}

/// Outcome of a placement attempt. A post-only cross is not an adapter
/// error — it is a named rejection reason surfaced through `Rejected` so
/// the caller can record `POST_ONLY_REJECTED` as an order-event reason
/// code (§3, §6) rather than treating it as an exchange failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlaceOrderResult {
    Accepted { exchange_order_id: String },
    Rejected { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub symbol: String,
    pub size: SizeStr,
    pub entry_price: Option<PriceStr>,
    pub unrealized_pnl: Option<f64>,
    pub updated_at: Ms,
}

#[async_trait]
pub trait TradingAdapter: Send + Sync {
    async fn place_order(&self, req: PlaceOrderRequest) -> anyhow::Result<PlaceOrderResult>;

    async fn cancel_all(&self, exchange: &str, symbol: &str) -> anyhow::Result<()>;

    /// `Ok(None)` when flat (§6).
    async fn sync_position(&self, exchange: &str, symbol: &str) -> anyhow::Result<Option<PositionInfo>>;
}
