use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

use super::backend::{BackendError, ConnectionFactory, ModelOutput, ScoringConnection};

/// Hard cap on the number of credentials the pool will use.
pub const MAX_POOL_KEYS: usize = 6;

/// Ordered credential pool with one memoized connection per key.
///
/// Keys are tried strictly in configured order, once each, so the worst
/// case latency is `pool size x per-call timeout`. The connection cache
/// lives as long as the pool, which callers are expected to share
/// process-wide behind an `Arc`.
pub struct KeyPoolClient<F: ConnectionFactory> {
    keys: Vec<String>,
    model: String,
    per_call_timeout: Duration,
    factory: F,
    connections: Mutex<HashMap<String, Arc<F::Connection>>>,
}

impl<F: ConnectionFactory> KeyPoolClient<F> {
    pub fn new(
        keys: Vec<String>,
        model: impl Into<String>,
        per_call_timeout: Duration,
        factory: F,
    ) -> Result<Self, BackendError> {
        let mut keys: Vec<String> = keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(BackendError::NoCredentialsConfigured);
        }
        keys.truncate(MAX_POOL_KEYS);

        Ok(Self {
            keys,
            model: model.into(),
            per_call_timeout,
            factory,
            connections: Mutex::new(HashMap::new()),
        })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Submit the prompt, failing over across the pool.
    ///
    /// Each key gets exactly one attempt; the first success wins. When the
    /// pool is exhausted the last observed error is returned.
    pub async fn score(&self, prompt: &str) -> Result<ModelOutput, BackendError> {
        let mut last_error = BackendError::NoCredentialsConfigured;

        for (index, key) in self.keys.iter().enumerate() {
            let connection = match self.connection_for(key) {
                Ok(connection) => connection,
                Err(error) => {
                    warn!(key_index = index, %error, "scoring connection unavailable");
                    last_error = error;
                    continue;
                }
            };

            let attempt =
                tokio::time::timeout(self.per_call_timeout, connection.generate(&self.model, prompt))
                    .await;

            match attempt {
                Ok(Ok(output)) => return Ok(output),
                Ok(Err(error)) => {
                    warn!(key_index = index, %error, "scoring attempt failed, trying next key");
                    last_error = error;
                }
                Err(_) => {
                    let error = BackendError::Timeout(self.per_call_timeout.as_millis() as u64);
                    warn!(key_index = index, %error, "scoring attempt timed out, trying next key");
                    last_error = error;
                }
            }
        }

        Err(last_error)
    }

    // Lock scope stays synchronous; the connection is cloned out before any await.
    fn connection_for(&self, key: &str) -> Result<Arc<F::Connection>, BackendError> {
        let mut cache = self.connections.lock().expect("connection cache poisoned");
        if let Some(connection) = cache.get(key) {
            return Ok(connection.clone());
        }

        let connection = Arc::new(self.factory.connect(key)?);
        cache.insert(key.to_string(), connection.clone());
        Ok(connection)
    }
}
