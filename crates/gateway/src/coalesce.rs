//! Request coalescing for batched overview-style lookups: accumulate keys,
//! flush immediately at a fixed batch size, otherwise flush after a short
//! delay. Bounds both latency and request fan-out.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::GatewayError;

#[derive(Debug, Error, Clone)]
pub enum CoalesceError {
    #[error("batch load failed: {0}")]
    Load(String),

    #[error("coalescer dropped before the batch flushed")]
    Dropped,
}

/// Resolves one batch of keys in a single backend round trip. Results must
/// be returned in key order.
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync {
    async fn load(&self, keys: Vec<K>) -> Result<Vec<V>, GatewayError>;
}

struct Pending<K, V> {
    entries: Vec<(K, oneshot::Sender<Result<V, CoalesceError>>)>,
    generation: u64,
}

pub struct Coalescer<K, V> {
    loader: Arc<dyn BatchLoader<K, V>>,
    max_batch: usize,
    flush_delay: Duration,
    pending: Arc<Mutex<Pending<K, V>>>,
}

impl<K, V> Coalescer<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    pub fn new(loader: Arc<dyn BatchLoader<K, V>>, max_batch: usize, flush_delay: Duration) -> Self {
        Self {
            loader,
            max_batch,
            flush_delay,
            pending: Arc::new(Mutex::new(Pending {
                entries: Vec::new(),
                generation: 0,
            })),
        }
    }

    /// Queue one key and await its value. The first key of a batch arms the
    /// delay timer; reaching `max_batch` flushes immediately.
    pub async fn request(&self, key: K) -> Result<V, CoalesceError> {
        let (sender, receiver) = oneshot::channel();

        let flush_now = {
            let mut pending = self.pending.lock().expect("coalescer lock poisoned");
            pending.entries.push((key, sender));
            let first = pending.entries.len() == 1;
            let full = pending.entries.len() >= self.max_batch;

            if !full && first {
                let generation = pending.generation;
                let pending_arc = Arc::clone(&self.pending);
                let loader = Arc::clone(&self.loader);
                let delay = self.flush_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let batch = take_if_generation(&pending_arc, generation);
                    if !batch.is_empty() {
                        run_batch(loader, batch).await;
                    }
                });
            }
            full
        };

        if flush_now {
            let batch = take_any(&self.pending);
            if !batch.is_empty() {
                run_batch(Arc::clone(&self.loader), batch).await;
            }
        }

        receiver.await.map_err(|_| CoalesceError::Dropped)?
    }
}

type Batch<K, V> = Vec<(K, oneshot::Sender<Result<V, CoalesceError>>)>;

fn take_any<K, V>(pending: &Arc<Mutex<Pending<K, V>>>) -> Batch<K, V> {
    let mut pending = pending.lock().expect("coalescer lock poisoned");
    pending.generation += 1;
    std::mem::take(&mut pending.entries)
}

fn take_if_generation<K, V>(pending: &Arc<Mutex<Pending<K, V>>>, generation: u64) -> Batch<K, V> {
    let mut pending = pending.lock().expect("coalescer lock poisoned");
    if pending.generation != generation {
        // someone flushed this batch already
        return Vec::new();
    }
    pending.generation += 1;
    std::mem::take(&mut pending.entries)
}

async fn run_batch<K, V>(loader: Arc<dyn BatchLoader<K, V>>, batch: Batch<K, V>)
where
    K: Send + 'static,
    V: Send + 'static,
{
    debug!(batch_size = batch.len(), "flushing coalesced batch");
    let (keys, senders): (Vec<K>, Vec<_>) = batch.into_iter().unzip();

    match loader.load(keys).await {
        Ok(values) => {
            for (sender, value) in senders.into_iter().zip(values) {
                let _ = sender.send(Ok(value));
            }
        }
        Err(e) => {
            let message = e.to_string();
            for sender in senders {
                let _ = sender.send(Err(CoalesceError::Load(message.clone())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchLoader<u64, u64> for CountingLoader {
        async fn load(&self, keys: Vec<u64>) -> Result<Vec<u64>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(keys.iter().map(|k| k * 10).collect())
        }
    }

    #[tokio::test]
    async fn flushes_immediately_at_batch_size() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
        });
        let coalescer = Arc::new(Coalescer::new(
            loader.clone() as Arc<dyn BatchLoader<u64, u64>>,
            2,
            Duration::from_secs(60),
        ));

        let a = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.request(1).await })
        };
        // let the first request land before the second fills the batch
        tokio::time::sleep(Duration::from_millis(20)).await;
        let b = coalescer.request(2).await.unwrap();

        assert_eq!(a.await.unwrap().unwrap(), 10);
        assert_eq!(b, 20);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flushes_after_delay_when_batch_not_full() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
        });
        let coalescer = Coalescer::new(
            loader.clone() as Arc<dyn BatchLoader<u64, u64>>,
            100,
            Duration::from_millis(10),
        );

        let value = coalescer.request(7).await.unwrap();
        assert_eq!(value, 70);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }
}
