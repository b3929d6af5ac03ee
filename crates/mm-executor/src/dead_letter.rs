//! Retry-with-backoff batch writer and the in-memory dead-letter queue it
//! feeds on exhaustion (§4.8). Dead-letter presence never blocks new
//! writes; it only sets `dbWriteFailures=true` in the operational context
//! the applier consults (§4.7).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    pub base_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { base_ms: 100, max_retries: 3 }
    }
}

/// `baseMs × 2^(attempt-1)` plus up to 25% jitter (§4.8). `attempt` is
/// 1-based.
pub fn backoff_delay_ms(attempt: u32, base_ms: u64) -> u64 {
    let shift = attempt.saturating_sub(1).min(32);
    let exp = base_ms.saturating_mul(1u64 << shift);
    let jitter_cap = exp / 4;
    let jitter = if jitter_cap == 0 { 0 } else { rand::thread_rng().gen_range(0..=jitter_cap) };
    exp + jitter
}

/// Bounded-by-operator-policy in practice; unbounded here (§4.8 MVP note).
#[derive(Debug, Default)]
pub struct DeadLetterQueue<T> {
    items: Vec<T>,
}

impl<T> DeadLetterQueue<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

/// Shared flag the tick driver reads into `mm_proposal::OperationalContext`.
/// Set once the dead-letter queue is non-empty; an operator draining it is
/// expected to clear it via [`DbWriteHealth::clear`].
#[derive(Clone, Default)]
pub struct DbWriteHealth(Arc<AtomicBool>);

impl DbWriteHealth {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_failing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_failing(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Retry `op` up to `cfg.max_retries` attempts with exponential backoff; on
/// exhaustion, push `payload` onto `dlq` and mark `health` failing.
/// `payload` is cloned once up front so it survives into the dead letter
/// even though `op` itself typically moves its own copy.
pub async fn write_with_retry<T, F, Fut>(
    payload: T,
    mut op: F,
    cfg: &RetryConfig,
    dlq: &mut DeadLetterQueue<T>,
    health: &DbWriteHealth,
) -> bool
where
    T: Clone,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(()) => return true,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "db write failed");
                if attempt >= cfg.max_retries {
                    dlq.push(payload);
                    health.mark_failing();
                    return false;
                }
                let delay = backoff_delay_ms(attempt, cfg.base_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn backoff_grows_exponentially_before_jitter() {
        // jitter is <= 25%, so attempt 3's floor (400) must exceed attempt 2's ceiling (200*1.25=250).
        let a2 = backoff_delay_ms(2, 100);
        let a3 = backoff_delay_ms(3, 100);
        assert!(a2 >= 200 && a2 <= 250);
        assert!(a3 >= 400 && a3 <= 500);
    }

    #[tokio::test]
    async fn succeeds_without_touching_dlq() {
        let mut dlq: DeadLetterQueue<u32> = DeadLetterQueue::new();
        let health = DbWriteHealth::new();
        let ok = write_with_retry(1u32, || async { Ok(()) }, &RetryConfig { base_ms: 1, max_retries: 3 }, &mut dlq, &health).await;
        assert!(ok);
        assert!(dlq.is_empty());
        assert!(!health.is_failing());
    }

    #[tokio::test]
    async fn exhaustion_moves_to_dead_letter_and_marks_health() {
        let mut dlq: DeadLetterQueue<u32> = DeadLetterQueue::new();
        let health = DbWriteHealth::new();
        let attempts = AtomicU32::new(0);
        let ok = write_with_retry(
            7u32,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(anyhow::anyhow!("db down")) }
            },
            &RetryConfig { base_ms: 1, max_retries: 3 },
            &mut dlq,
            &health,
        )
        .await;
        assert!(!ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(dlq.drain(), vec![7]);
        assert!(health.is_failing());
    }

    #[tokio::test]
    async fn clearing_health_after_operator_drains_dlq() {
        let health = DbWriteHealth::new();
        health.mark_failing();
        assert!(health.is_failing());
        health.clear();
        assert!(!health.is_failing());
    }
}
