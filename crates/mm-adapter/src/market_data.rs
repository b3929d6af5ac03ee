//! Market-data adapter contract (§6). Signing, reconnection, and wire
//! encoding are the concrete adapter's problem; this crate only fixes the
//! shape of the event stream and the control surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::events::MarketDataEvent;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub exchange: String,
    pub symbol: String,
    pub channels: Vec<String>,
}

/// A market-data adapter: `connect`/`subscribe`/`disconnect`, with events
/// delivered out-of-band via whatever channel `connect` returns to the
/// caller (a `tokio::sync::mpsc::Receiver<MarketDataEvent>` in practice —
/// left to the concrete adapter since the trait itself must stay
/// object-safe and transport-agnostic).
#[async_trait]
pub trait MarketDataAdapter: Send + Sync {
    async fn connect(&self) -> anyhow::Result<()>;
    async fn subscribe(&self, req: SubscribeRequest) -> anyhow::Result<()>;
    async fn disconnect(&self) -> anyhow::Result<()>;
}

/// A single delivered event plus the adapter-local sequencing it arrived
/// with, handed to the executor's market-data consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveredEvent {
    pub event: MarketDataEvent,
}
