//! Deterministic in-memory market-data adapter. Tests push events directly
//! instead of a websocket feeding them; the executor's consumer side sees
//! the identical `MarketDataEvent` stream either way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mm_adapter::{MarketDataAdapter, MarketDataEvent, SubscribeRequest};

pub struct PaperMarketDataAdapter {
    tx: tokio::sync::mpsc::UnboundedSender<MarketDataEvent>,
    rx: Mutex<Option<tokio::sync::mpsc::UnboundedReceiver<MarketDataEvent>>>,
    connected: AtomicBool,
}

impl Default for PaperMarketDataAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperMarketDataAdapter {
    pub fn new() -> Self {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            connected: AtomicBool::new(false),
        }
    }

    /// Hand the event receiver to the executor's market-data consumer. May
    /// only be taken once; a second call returns `None`.
    pub fn take_receiver(&self) -> Option<tokio::sync::mpsc::UnboundedReceiver<MarketDataEvent>> {
        self.rx.lock().unwrap().take()
    }

    /// Inject an event as if it had arrived over the wire.
    pub fn push(&self, event: MarketDataEvent) {
        let _ = self.tx.send(event);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataAdapter for PaperMarketDataAdapter {
    async fn connect(&self) -> anyhow::Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        self.push(MarketDataEvent::Connected);
        Ok(())
    }

    async fn subscribe(&self, _req: SubscribeRequest) -> anyhow::Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.push(MarketDataEvent::Disconnected);
        Ok(())
    }
}
