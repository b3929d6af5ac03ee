//! In-memory mirror of on-exchange position (§4.8). The fill consumer is
//! its only writer (§5); the tick driver only ever reads a cloned snapshot.

use mm_adapter::PositionInfo;
use mm_types::{Fill, Ms, Position, Side};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionTracker {
    pub size: f64,
    pub entry_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub last_update_ms: Ms,
}

impl PositionTracker {
    pub fn as_position(&self) -> Position {
        Position {
            size: self.size,
            updated_ms: self.last_update_ms,
        }
    }

    /// `None` (flat on the exchange) resets `size` to `0` and clears the
    /// derived fields; `Some` replaces every field wholesale.
    pub fn sync_from_position(&mut self, info: Option<&PositionInfo>, now_ms: Ms) {
        match info {
            None => {
                self.size = 0.0;
                self.entry_price = None;
                self.unrealized_pnl = None;
                self.last_update_ms = now_ms;
            }
            Some(p) => {
                self.size = p.size.as_f64();
                self.entry_price = p.entry_price.as_ref().map(|e| e.as_f64());
                self.unrealized_pnl = p.unrealized_pnl;
                self.last_update_ms = p.updated_at;
            }
        }
    }

    /// Adjusts `size` by `±fillSz` (buy increases, sell decreases) and
    /// clears `entryPrice`/`uPnL` — they are stale until the next
    /// `syncFromPosition` — per §4.8.
    pub fn update_from_fill(&mut self, fill: &Fill) {
        let signed = match fill.side {
            Side::Buy => fill.fill_sz.as_f64(),
            Side::Sell => -fill.fill_sz.as_f64(),
        };
        if signed.is_finite() {
            self.size += signed;
        }
        self.entry_price = None;
        self.unrealized_pnl = None;
        self.last_update_ms = fill.ts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{Liquidity, Mode, PriceStr, SizeStr};
    use uuid::Uuid;

    fn fill(side: Side, sz: f64, ts: Ms) -> Fill {
        Fill {
            id: Uuid::new_v4(),
            ts,
            exchange: "hyperliquid".to_string(),
            symbol: "BTC-PERP".to_string(),
            client_order_id: "c1".to_string(),
            side,
            fill_px: PriceStr::from_f64(100.0, 8),
            fill_sz: SizeStr::from_f64(sz, 6),
            liquidity: Liquidity::Maker,
            state: Mode::Normal,
            params_set_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn sync_with_none_resets_to_flat() {
        let mut t = PositionTracker { size: 3.0, entry_price: Some(100.0), unrealized_pnl: Some(5.0), last_update_ms: 1 };
        t.sync_from_position(None, 42);
        assert_eq!(t.size, 0.0);
        assert_eq!(t.entry_price, None);
        assert_eq!(t.unrealized_pnl, None);
        assert_eq!(t.last_update_ms, 42);
    }

    #[test]
    fn sync_with_some_replaces_all_fields() {
        let mut t = PositionTracker::default();
        let info = PositionInfo {
            symbol: "BTC-PERP".to_string(),
            size: SizeStr::from_f64(2.0, 6),
            entry_price: Some(PriceStr::from_f64(101.5, 8)),
            unrealized_pnl: Some(3.25),
            updated_at: 99,
        };
        t.sync_from_position(Some(&info), 0);
        assert!((t.size - 2.0).abs() < 1e-9);
        assert_eq!(t.entry_price, Some(101.5));
        assert_eq!(t.unrealized_pnl, Some(3.25));
        assert_eq!(t.last_update_ms, 99);
    }

    #[test]
    fn buy_fill_increases_size_and_clears_derived_fields() {
        let mut t = PositionTracker { size: 1.0, entry_price: Some(100.0), unrealized_pnl: Some(1.0), last_update_ms: 0 };
        t.update_from_fill(&fill(Side::Buy, 0.5, 10));
        assert!((t.size - 1.5).abs() < 1e-9);
        assert_eq!(t.entry_price, None);
        assert_eq!(t.unrealized_pnl, None);
        assert_eq!(t.last_update_ms, 10);
    }

    #[test]
    fn sell_fill_decreases_size() {
        let mut t = PositionTracker { size: 1.0, entry_price: None, unrealized_pnl: None, last_update_ms: 0 };
        t.update_from_fill(&fill(Side::Sell, 0.5, 10));
        assert!((t.size - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fills_stay_stale_until_next_sync() {
        let mut t = PositionTracker::default();
        t.update_from_fill(&fill(Side::Buy, 1.0, 5));
        t.update_from_fill(&fill(Side::Buy, 1.0, 6));
        assert_eq!(t.entry_price, None);
        assert_eq!(t.unrealized_pnl, None);
        let info = PositionInfo {
            symbol: "BTC-PERP".to_string(),
            size: SizeStr::from_f64(2.0, 6),
            entry_price: Some(PriceStr::from_f64(100.0, 8)),
            unrealized_pnl: Some(0.0),
            updated_at: 7,
        };
        t.sync_from_position(Some(&info), 7);
        assert_eq!(t.entry_price, Some(100.0));
    }
}
