//! One pool per configured endpoint, chosen at random per publish
//!
//! Selection is an independent uniform draw on every call. It does not look
//! at endpoint health, so a failing endpoint keeps being picked as often as a
//! healthy one. The random source is injectable through [`PoolSelector`].

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use redlog_core::PoolConfig;
use tracing::info;

use crate::connection::{ConnectionManager, RedisManager};
use crate::error::{ConnectionError, PoolError};
use crate::pool::{Pool, PoolSettings};

/// Picks the index of the pool used for the next publish.
pub trait PoolSelector: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn select(&self, len: usize) -> usize;
}

/// Uniform choice from the calling thread's random generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl PoolSelector for RandomSelector {
    fn select(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Uniform choice from a shared, seeded generator.
///
/// Two selectors with the same seed yield the same sequence when called
/// from a single thread.
#[derive(Debug)]
pub struct SeededSelector {
    rng: Mutex<StdRng>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PoolSelector for SeededSelector {
    fn select(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..len)
    }
}

/// Owns one [`Pool`] per endpoint.
pub struct PoolSet<M: ConnectionManager = RedisManager> {
    pools: Vec<Pool<M>>,
    selector: Box<dyn PoolSelector>,
}

impl PoolSet<RedisManager> {
    /// Build one Redis pool per endpoint, preserving configuration order.
    pub fn from_config(
        config: &PoolConfig,
        settings: PoolSettings,
    ) -> Result<Self, ConnectionError> {
        let mut pools = Vec::with_capacity(config.endpoints().len());
        for endpoint in config.endpoints().iter() {
            let manager = RedisManager::new(endpoint, config)?;
            pools.push(Pool::new(manager, settings));
        }

        info!(
            endpoints = %config.endpoints(),
            database = config.database(),
            use_tls = config.use_tls(),
            "Created Redis pools"
        );
        Ok(Self::new(pools, Box::new(RandomSelector)))
    }
}

impl<M: ConnectionManager> PoolSet<M> {
    pub fn new(pools: Vec<Pool<M>>, selector: Box<dyn PoolSelector>) -> Self {
        Self { pools, selector }
    }

    /// Replace the random source.
    pub fn with_selector(mut self, selector: Box<dyn PoolSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Choose the pool for one publish call.
    pub fn select(&self) -> Result<&Pool<M>, PoolError> {
        if self.pools.is_empty() {
            return Err(PoolError::Empty);
        }
        let index = self.selector.select(self.pools.len());
        self.pools.get(index).ok_or(PoolError::Missing {
            index,
            available: self.pools.len(),
        })
    }

    /// Close every pool. Safe to call repeatedly.
    pub fn close_all(&self) {
        for pool in &self.pools {
            pool.close();
        }
    }

    pub fn pools(&self) -> &[Pool<M>] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
