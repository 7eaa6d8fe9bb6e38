//! Client facade: initialize, publish, shutdown

use redlog_core::{Endpoint, Message, PoolConfig};
use tracing::{debug, info};

use crate::connection::{ConnectionManager, RedisManager};
use crate::error::{ConnectionError, SinkResult};
use crate::pool::PoolSettings;
use crate::pool_set::{PoolSelector, PoolSet};
use crate::publisher::{PushPipeline, send_batch};

/// Publishes batches of messages onto one Redis list across a set of endpoints.
///
/// Built once from a validated [`PoolConfig`] and shared by reference with
/// every caller. `publish` may be called from several threads at once;
/// ordering between concurrent batches is undefined.
///
/// Retrying a failed batch is not idempotent: an attempt that failed after
/// the flush reached the server may already have appended some entries, and
/// a retry appends them again.
pub struct RedisClient<M: ConnectionManager = RedisManager> {
    key: String,
    pools: PoolSet<M>,
}

impl RedisClient<RedisManager> {
    /// Create pools for every configured endpoint. No connection is opened yet.
    pub fn initialize(config: &PoolConfig) -> Result<Self, ConnectionError> {
        Self::initialize_with(config, PoolSettings::default())
    }

    pub fn initialize_with(
        config: &PoolConfig,
        settings: PoolSettings,
    ) -> Result<Self, ConnectionError> {
        let pools = PoolSet::from_config(config, settings)?;
        info!(
            key = config.destination_key(),
            pools = pools.len(),
            "Redis client ready"
        );
        Ok(Self::with_pools(config.destination_key(), pools))
    }
}

impl<M> RedisClient<M>
where
    M: ConnectionManager,
    M::Connection: PushPipeline,
{
    pub fn with_pools(key: impl Into<String>, pools: PoolSet<M>) -> Self {
        Self {
            key: key.into(),
            pools,
        }
    }

    /// Replace the pool selector, typically with a deterministic one.
    pub fn with_selector(self, selector: Box<dyn PoolSelector>) -> Self {
        Self {
            key: self.key,
            pools: self.pools.with_selector(selector),
        }
    }

    pub fn destination_key(&self) -> &str {
        &self.key
    }

    pub fn pools(&self) -> &PoolSet<M> {
        &self.pools
    }

    /// Push `messages`, in order, onto the destination list of one randomly chosen endpoint.
    ///
    /// The whole batch is pipelined on a single connection and flushed once.
    /// Any failure discards that connection rather than returning it for reuse.
    pub fn publish(&self, messages: &[Message]) -> SinkResult<()> {
        let pool = self.pools.select()?;
        let mut conn = pool.get()?;

        let result = send_batch(&mut *conn, &self.key, messages);
        if result.is_err() {
            conn.mark_broken();
        } else {
            debug!(
                endpoint = %conn.endpoint(),
                key = %self.key,
                batch_size = messages.len(),
                "Published batch"
            );
        }
        result
    }

    /// Borrow one connection from every pool and report the outcome per endpoint.
    pub fn ping_all(&self) -> Vec<(Endpoint, SinkResult<()>)> {
        self.pools
            .pools()
            .iter()
            .map(|pool| (pool.endpoint().clone(), pool.get().map(drop)))
            .collect()
    }

    /// Close all pools. Later publishes fail with a closed-pool error.
    pub fn shutdown(&self) {
        self.pools.close_all();
        info!(key = %self.key, "Redis client shut down");
    }
}
