use crate::store::ObjectStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Bucket reachability check for the health endpoint
///
/// Orchestrators poll health often, so a probe result is reused for `ttl`.
/// A zero ttl probes the bucket on every call.
pub struct HealthProbe {
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
    last: Mutex<Option<(Instant, String)>>,
}

impl HealthProbe {
    pub fn new(store: Arc<dyn ObjectStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            last: Mutex::new(None),
        }
    }

    /// "accessible", or "error: <cause>" when the bucket cannot be reached
    ///
    /// The cache lock is not held while probing, so concurrent callers
    /// with an expired entry each probe instead of queueing behind one.
    pub async fn check(&self) -> String {
        if let Some((checked_at, status)) = self.last.lock().await.as_ref() {
            if checked_at.elapsed() < self.ttl {
                return status.clone();
            }
        }

        let status = match self.store.probe().await {
            Ok(()) => "accessible".to_string(),
            Err(e) => format!("error: {}", e.cause()),
        };
        debug!(bucket = %self.store.bucket(), status = %status, "Bucket probed");

        *self.last.lock().await = Some((Instant::now(), status.clone()));
        status
    }
}
