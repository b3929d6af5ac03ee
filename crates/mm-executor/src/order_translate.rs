//! Translates one tick's `OrderIntent`s into trading-adapter calls (§4.8
//! step 5). A post-only rejection is not an adapter error — it is folded
//! into the order-event log as a `POST_ONLY_REJECTED` reason code (§6).

use mm_adapter::{PlaceOrderRequest, PlaceOrderResult, TradingAdapter};
use mm_types::{Ms, OrderIntent, PriceStr, ReasonCode, Side, SizeStr};

/// One row the caller should persist to `ex_order_event` (§6). `client_order_id`
/// is deterministic per tick so a retry of the same intent is idempotent at
/// the exchange if the adapter happens to see it twice.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderEventRecord {
    pub ts: Ms,
    pub client_order_id: String,
    pub event_type: &'static str,
    pub side: Option<Side>,
    pub px: Option<PriceStr>,
    pub sz: Option<SizeStr>,
    pub reason_codes: Vec<ReasonCode>,
}

fn client_order_id(exchange: &str, symbol: &str, now_ms: Ms, leg: &str) -> String {
    format!("mm-{exchange}-{symbol}-{now_ms}-{leg}")
}

/// Execute one tick's intents against `adapter`, returning the order-event
/// rows a caller should persist. `CancelAll` always logs a single `cancel`
/// event; a `Quote` places a post-only bid and ask and logs an `ack` (or a
/// `reject` carrying `POST_ONLY_REJECTED` plus the adapter's own reason)
/// per leg.
pub async fn translate_intents(
    adapter: &dyn TradingAdapter,
    exchange: &str,
    symbol: &str,
    now_ms: Ms,
    intents: &[OrderIntent],
) -> anyhow::Result<Vec<OrderEventRecord>> {
    let mut records = Vec::new();

    for intent in intents {
        match intent {
            OrderIntent::CancelAll { reason_codes } => {
                adapter.cancel_all(exchange, symbol).await?;
                records.push(OrderEventRecord {
                    ts: now_ms,
                    client_order_id: client_order_id(exchange, symbol, now_ms, "cancel"),
                    event_type: "cancel",
                    side: None,
                    px: None,
                    sz: None,
                    reason_codes: reason_codes.clone(),
                });
            }
            OrderIntent::Quote { bid_px, ask_px, size, post_only, reason_codes } => {
                for (side, px) in [(Side::Buy, bid_px), (Side::Sell, ask_px)] {
                    let leg = if side == Side::Buy { "bid" } else { "ask" };
                    let client_id = client_order_id(exchange, symbol, now_ms, leg);
                    let req = PlaceOrderRequest {
                        exchange: exchange.to_string(),
                        symbol: symbol.to_string(),
                        side,
                        px: px.clone(),
                        sz: size.clone(),
                        client_order_id: client_id.clone(),
                        post_only: *post_only,
                    };
                    let result = adapter.place_order(req).await?;
                    records.push(match result {
                        PlaceOrderResult::Accepted { .. } => OrderEventRecord {
                            ts: now_ms,
                            client_order_id: client_id,
                            event_type: "ack",
                            side: Some(side),
                            px: Some(px.clone()),
                            sz: Some(size.clone()),
                            reason_codes: reason_codes.clone(),
                        },
                        PlaceOrderResult::Rejected { reason } => {
                            let mut codes = reason_codes.clone();
                            codes.push(ReasonCode::PostOnlyRejected);
                            tracing::warn!(%reason, %client_id, "order rejected");
                            OrderEventRecord {
                                ts: now_ms,
                                client_order_id: client_id,
                                event_type: "reject",
                                side: Some(side),
                                px: Some(px.clone()),
                                sz: Some(size.clone()),
                                reason_codes: codes,
                            }
                        }
                    });
                }
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_testkit::PaperTradingAdapter;
    use mm_types::format_price;

    fn quote(reason_codes: Vec<ReasonCode>) -> OrderIntent {
        OrderIntent::Quote {
            bid_px: format_price(99.0),
            ask_px: format_price(101.0),
            size: format_price(1.0),
            post_only: true,
            reason_codes,
        }
    }

    #[tokio::test]
    async fn cancel_all_logs_single_cancel_event() {
        let adapter = PaperTradingAdapter::new();
        let intents = vec![OrderIntent::CancelAll { reason_codes: vec![ReasonCode::DataStale] }];
        let records = translate_intents(&adapter, "hyperliquid", "BTC-PERP", 1_000, &intents).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "cancel");
        assert_eq!(adapter.cancel_all_count(), 1);
    }

    #[tokio::test]
    async fn quote_places_both_legs_and_logs_two_acks() {
        let adapter = PaperTradingAdapter::new();
        let intents = vec![quote(vec![ReasonCode::NormalConditions])];
        let records = translate_intents(&adapter, "hyperliquid", "BTC-PERP", 1_000, &intents).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.event_type == "ack"));
        assert_eq!(adapter.placed_orders().len(), 2);
    }

    #[tokio::test]
    async fn rejected_leg_logs_reject_with_post_only_reason() {
        let adapter = PaperTradingAdapter::new();
        adapter.reject_next("would_cross");
        let intents = vec![quote(vec![])];
        let records = translate_intents(&adapter, "hyperliquid", "BTC-PERP", 1_000, &intents).await.unwrap();
        assert_eq!(records[0].event_type, "reject");
        assert!(records[0].reason_codes.contains(&ReasonCode::PostOnlyRejected));
        assert_eq!(records[1].event_type, "ack");
    }
}
