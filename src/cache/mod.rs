//! Report Cache
//!
//! Raw report rows, keyed by the downloaded query and the account it ran
//! for. Reads are synchronous; writes are handed to a background worker so
//! that storing a report never delays its result.
//!
//! ```text
//! Engine ──get──▶ CsvCache ──▶ CsvStore (file per key)
//!        ──set──▶ bounded queue ──▶ worker task ──spawn_blocking──▶ CsvStore
//! ```

mod error;
mod store;

pub use error::{CacheError, CacheResult};
pub use store::CsvStore;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cache consumed by the engine
pub trait ReportCache: Send + Sync {
    /// Rows stored for the key, or [`CacheError::Miss`]
    fn get(&self, key: &str) -> CacheResult<Vec<Vec<String>>>;

    /// Store rows for the key; best effort, never blocks
    fn set(&self, key: String, rows: Vec<Vec<String>>);
}

struct WriteRequest {
    key: String,
    rows: Vec<Vec<String>>,
}

/// [`CsvStore`] with a bounded background writer
pub struct CsvCache {
    store: Arc<CsvStore>,
    sender: mpsc::Sender<WriteRequest>,
}

impl CsvCache {
    /// Start the writer task on the current tokio runtime
    ///
    /// The worker stops once every handle to the cache is dropped and the
    /// queue is drained.
    pub fn spawn(store: CsvStore, queue_size: usize) -> (Self, JoinHandle<()>) {
        let store = Arc::new(store);
        let (sender, mut receiver) = mpsc::channel::<WriteRequest>(queue_size.max(1));

        let worker_store = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let store = Arc::clone(&worker_store);
                let key = request.key.clone();
                let written =
                    tokio::task::spawn_blocking(move || store.set(&request.key, &request.rows))
                        .await;
                match written {
                    Ok(Ok(())) => tracing::debug!(key = %key, "Cached report"),
                    Ok(Err(e)) => tracing::warn!(key = %key, error = %e, "Failed to cache report"),
                    Err(e) => tracing::warn!(key = %key, error = %e, "Cache writer panicked"),
                }
            }
            tracing::debug!("Cache writer stopped");
        });

        (Self { store, sender }, handle)
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }
}

impl ReportCache for CsvCache {
    fn get(&self, key: &str) -> CacheResult<Vec<Vec<String>>> {
        self.store.get(key)
    }

    fn set(&self, key: String, rows: Vec<Vec<String>>) {
        if let Err(e) = self.sender.try_send(WriteRequest { key, rows }) {
            let err = CacheError::NotStored(e.to_string());
            tracing::warn!(error = %err, "Dropped cache write");
        }
    }
}
