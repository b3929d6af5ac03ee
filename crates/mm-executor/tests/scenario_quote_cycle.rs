//! End-to-end composition of the pure decision path plus the DB-free
//! executor building blocks (rolling windows, position tracker, order
//! translation) against the paper trading adapter. No Postgres connection
//! involved — the boundary of what can be exercised without one.

use mm_executor::{translate_intents, PositionTracker, RollingWindows};
use mm_testkit::PaperTradingAdapter;
use mm_types::{format_price, format_size, Fill, Liquidity, Mode, Side, StrategyParams, StrategyState, TradeObs};

#[tokio::test]
async fn normal_conditions_quote_both_sides_and_track_the_fill() {
    let params = StrategyParams::sane_defaults();
    let state = StrategyState::initial(0);
    let mut rolling = RollingWindows::new();
    let mut position = PositionTracker::default();

    rolling.push_trade(TradeObs { ts: 0, px: format_price(100.0), sz: format_size(0.5), side: Some(Side::Buy), kind: None });

    let snapshot = mm_types::Snapshot {
        exchange: "hyperliquid".to_string(),
        symbol: "BTC-PERP".to_string(),
        now_ms: 100,
        best_bid_px: format_price(99.9),
        best_bid_sz: format_size(5.0),
        best_ask_px: format_price(100.1),
        best_ask_sz: format_size(5.0),
        mark_px: Some(format_price(100.0)),
        index_px: Some(format_price(100.0)),
        last_update_ms: 100,
    };

    let features = mm_features::compute_features(&snapshot, &rolling.trades_1s(100), &rolling.trades_10s(), &rolling.mids_10s(), params.stale_cancel_ms);
    assert!(!features.data_stale);

    let out = mm_strategy::decide(mm_strategy::DecideInput {
        now_ms: 100,
        state: &state,
        features: &features,
        params: &params,
        position: &position.as_position(),
    });
    assert_eq!(out.next_state.mode, Mode::Normal);

    let adapter = PaperTradingAdapter::new();
    let records = translate_intents(&adapter, "hyperliquid", "BTC-PERP", 100, &out.intents).await.unwrap();
    assert_eq!(records.len(), 2, "a quote intent places both legs");
    assert!(records.iter().all(|r| r.event_type == "ack"));

    let fill = Fill {
        id: uuid::Uuid::new_v4(),
        ts: 100,
        exchange: "hyperliquid".to_string(),
        symbol: "BTC-PERP".to_string(),
        client_order_id: records[0].client_order_id.clone(),
        side: Side::Buy,
        fill_px: format_price(99.9),
        fill_sz: format_size(0.1),
        liquidity: Liquidity::Maker,
        state: Mode::Normal,
        params_set_id: uuid::Uuid::new_v4(),
    };
    position.update_from_fill(&fill);
    assert_eq!(position.as_position().size, 0.1);
}

#[tokio::test]
async fn stale_data_cancels_instead_of_quoting() {
    let params = StrategyParams::sane_defaults();
    let state = StrategyState::initial(0);

    let snapshot = mm_types::Snapshot {
        exchange: "hyperliquid".to_string(),
        symbol: "BTC-PERP".to_string(),
        now_ms: 100,
        best_bid_px: format_price(99.9),
        best_bid_sz: format_size(5.0),
        best_ask_px: format_price(100.1),
        best_ask_sz: format_size(5.0),
        mark_px: None,
        index_px: None,
        last_update_ms: -100_000,
    };

    let features = mm_features::compute_features(&snapshot, &[], &[], &[], params.stale_cancel_ms);
    assert!(features.data_stale);

    let out = mm_strategy::decide(mm_strategy::DecideInput {
        now_ms: 100,
        state: &state,
        features: &features,
        params: &params,
        position: &mm_types::Position::flat(100),
    });
    assert_eq!(out.next_state.mode, Mode::Pause);

    let adapter = PaperTradingAdapter::new();
    let records = translate_intents(&adapter, "hyperliquid", "BTC-PERP", 100, &out.intents).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, "cancel");
    assert_eq!(adapter.cancel_all_count(), 1);
}
