//! Linear trade/mid buffers the market-data consumer owns exclusively
//! (§4.8, §5, §9's "rolling windows without hidden graphs"). Pruned to the
//! last 10 s on every tick; the tick driver only ever reads an immutable
//! clone.

use std::collections::VecDeque;

use mm_types::{Ms, MidObs, TradeObs};

const WINDOW_MS: Ms = 10_000;

#[derive(Clone, Debug, Default)]
pub struct RollingWindows {
    trades: VecDeque<TradeObs>,
    mids: VecDeque<MidObs>,
}

impl RollingWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_trade(&mut self, trade: TradeObs) {
        self.trades.push_back(trade);
    }

    pub fn push_mid(&mut self, mid: MidObs) {
        self.mids.push_back(mid);
    }

    /// Drop everything older than `now_ms - 10s`. Called once per tick
    /// before features are derived (§4.8 step 2).
    pub fn prune(&mut self, now_ms: Ms) {
        let cutoff = now_ms - WINDOW_MS;
        while matches!(self.trades.front(), Some(t) if t.ts < cutoff) {
            self.trades.pop_front();
        }
        while matches!(self.mids.front(), Some(m) if m.ts < cutoff) {
            self.mids.pop_front();
        }
    }

    pub fn trades_10s(&self) -> Vec<TradeObs> {
        self.trades.iter().cloned().collect()
    }

    /// The 1 s sub-slice of the 10 s trade buffer, used by `FeatureCalc`'s
    /// `tradeImbalance1s`.
    pub fn trades_1s(&self, now_ms: Ms) -> Vec<TradeObs> {
        let cutoff = now_ms - 1_000;
        self.trades.iter().filter(|t| t.ts >= cutoff).cloned().collect()
    }

    pub fn mids_10s(&self) -> Vec<MidObs> {
        self.mids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_types::{format_price, format_size, Side};

    fn trade(ts: Ms) -> TradeObs {
        TradeObs { ts, px: format_price(100.0), sz: format_size(1.0), side: Some(Side::Buy), kind: None }
    }

    #[test]
    fn prune_drops_entries_older_than_ten_seconds() {
        let mut w = RollingWindows::new();
        w.push_trade(trade(0));
        w.push_trade(trade(5_000));
        w.push_trade(trade(9_999));
        w.prune(10_000);
        assert_eq!(w.trades_10s().len(), 2);
    }

    #[test]
    fn trades_1s_is_a_sub_slice_of_trades_10s() {
        let mut w = RollingWindows::new();
        w.push_trade(trade(8_000));
        w.push_trade(trade(9_500));
        w.prune(10_000);
        assert_eq!(w.trades_10s().len(), 2);
        assert_eq!(w.trades_1s(10_000).len(), 1);
    }

    #[test]
    fn empty_window_prunes_to_empty() {
        let mut w = RollingWindows::new();
        w.prune(100_000);
        assert!(w.trades_10s().is_empty());
        assert!(w.mids_10s().is_empty());
    }
}
