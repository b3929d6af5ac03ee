//! Deterministic paper trading adapter. Every order is accepted (unless a
//! test has armed a rejection) and logged; no randomness, no network I/O —
//! same spirit as a bar-close paper broker, adapted to post-only quoting.

use std::sync::Mutex;

use async_trait::async_trait;
use mm_adapter::{PlaceOrderRequest, PlaceOrderResult, PositionInfo, TradingAdapter};
use mm_types::{format_price, format_size};

struct PaperState {
    next_order_id: u64,
    orders: Vec<PlaceOrderRequest>,
    cancel_all_count: u32,
    position_size: f64,
    entry_price: Option<f64>,
    reject_next: Option<String>,
}

pub struct PaperTradingAdapter {
    state: Mutex<PaperState>,
}

impl Default for PaperTradingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperTradingAdapter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PaperState {
                next_order_id: 1,
                orders: Vec::new(),
                cancel_all_count: 0,
                position_size: 0.0,
                entry_price: None,
                reject_next: None,
            }),
        }
    }

    /// Seed the flat-or-not position a subsequent `sync_position` reports.
    pub fn set_position(&self, size: f64, entry_price: Option<f64>) {
        let mut s = self.state.lock().unwrap();
        s.position_size = size;
        s.entry_price = entry_price;
    }

    /// Arm the next `place_order` call to reject with `reason` instead of
    /// accepting — used to exercise `POST_ONLY_REJECTED`-style handling.
    pub fn reject_next(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().reject_next = Some(reason.into());
    }

    pub fn placed_orders(&self) -> Vec<PlaceOrderRequest> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn cancel_all_count(&self) -> u32 {
        self.state.lock().unwrap().cancel_all_count
    }
}

#[async_trait]
impl TradingAdapter for PaperTradingAdapter {
    async fn place_order(&self, req: PlaceOrderRequest) -> anyhow::Result<PlaceOrderResult> {
        let mut s = self.state.lock().unwrap();
        if let Some(reason) = s.reject_next.take() {
            return Ok(PlaceOrderResult::Rejected { reason });
        }
        let order_id = format!("PAPER-{:06}", s.next_order_id);
        s.next_order_id += 1;
        s.orders.push(req);
        Ok(PlaceOrderResult::Accepted { exchange_order_id: order_id })
    }

    async fn cancel_all(&self, _exchange: &str, _symbol: &str) -> anyhow::Result<()> {
        self.state.lock().unwrap().cancel_all_count += 1;
        Ok(())
    }

    async fn sync_position(&self, _exchange: &str, symbol: &str) -> anyhow::Result<Option<PositionInfo>> {
        let s = self.state.lock().unwrap();
        if s.position_size == 0.0 {
            return Ok(None);
        }
        Ok(Some(PositionInfo {
            symbol: symbol.to_string(),
            size: format_size(s.position_size),
            entry_price: s.entry_price.map(format_price),
            unrealized_pnl: None,
            updated_at: 0,
        }))
    }
}
