//! # redlog testing utilities
//!
//! In-memory stand-ins for the Redis side of a [`RedisClient`], so pooling,
//! selection and batch publishing can be tested without a server.
//!
//! - [`MockBackend`]: shared record of what one fake endpoint received, plus failure switches
//! - [`MockManager`] / [`MockConnection`]: a [`ConnectionManager`] handing out fake pipelines
//! - [`SequenceSelector`]: deterministic pool selection
//!
//! ```rust
//! use redlog_core::Message;
//! use redlog_testing::mock_client;
//!
//! let (client, backends) = mock_client("logstash", 1);
//! client.publish(&[Message::from("test1"), Message::from("test2")]).unwrap();
//!
//! assert_eq!(backends[0].delivered_payloads(), vec![b"test1".to_vec(), b"test2".to_vec()]);
//! assert_eq!(backends[0].flushes(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use redis::{ErrorKind, RedisResult};
use redlog_core::Endpoint;
use redlog_redis::{
    ConnectionError, ConnectionManager, Pool, PoolSelector, PoolSet, PoolSettings, PushPipeline,
    RedisClient,
};

#[derive(Debug, Default)]
struct BackendState {
    pushed: Vec<(String, Vec<u8>)>,
    delivered: Vec<(String, Vec<u8>)>,
    flushes: usize,
    dials: usize,
    checks: usize,
    reject_payload: Option<Vec<u8>>,
    fail_dial: bool,
    fail_check: bool,
    fail_flush: bool,
}

/// Shared view of one fake Redis endpoint.
///
/// Cloning yields another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject pushes carrying exactly this payload.
    pub fn reject_payload(&self, payload: impl Into<Vec<u8>>) -> &Self {
        self.state.lock().unwrap().reject_payload = Some(payload.into());
        self
    }

    /// Make new dials fail.
    pub fn fail_dial(&self, fail: bool) -> &Self {
        self.state.lock().unwrap().fail_dial = fail;
        self
    }

    /// Make health checks on idle connections fail.
    pub fn fail_check(&self, fail: bool) -> &Self {
        self.state.lock().unwrap().fail_check = fail;
        self
    }

    /// Make flushes fail.
    pub fn fail_flush(&self, fail: bool) -> &Self {
        self.state.lock().unwrap().fail_flush = fail;
        self
    }

    /// Payloads accepted into a pipeline, flushed or not, in order.
    pub fn pushed_payloads(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .pushed
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Payloads that reached the list through a successful flush, in order.
    pub fn delivered_payloads(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Keys of delivered pushes, in order.
    pub fn delivered_keys(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.state.lock().unwrap().flushes
    }

    pub fn dials(&self) -> usize {
        self.state.lock().unwrap().dials
    }

    pub fn checks(&self) -> usize {
        self.state.lock().unwrap().checks
    }

    fn transport_error(reason: &'static str) -> redis::RedisError {
        (ErrorKind::IoError, reason).into()
    }
}

/// A fake connection buffering pushes until flushed.
#[derive(Debug)]
pub struct MockConnection {
    backend: MockBackend,
    buffer: Vec<(String, Vec<u8>)>,
}

impl PushPipeline for MockConnection {
    fn push(&mut self, key: &str, payload: &[u8]) -> RedisResult<()> {
        let mut state = self.backend.state.lock().unwrap();
        if state.reject_payload.as_deref() == Some(payload) {
            return Err(MockBackend::transport_error("payload rejected"));
        }
        state.pushed.push((key.to_string(), payload.to_vec()));
        self.buffer.push((key.to_string(), payload.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> RedisResult<()> {
        let mut state = self.backend.state.lock().unwrap();
        if state.fail_flush {
            self.buffer.clear();
            return Err(MockBackend::transport_error("flush failed on mock backend"));
        }
        state.flushes += 1;
        state.delivered.append(&mut self.buffer);
        Ok(())
    }
}

/// Connection manager handing out [`MockConnection`]s for one [`MockBackend`].
#[derive(Debug)]
pub struct MockManager {
    endpoint: Endpoint,
    backend: MockBackend,
}

impl MockManager {
    pub fn new(endpoint: Endpoint, backend: MockBackend) -> Self {
        Self { endpoint, backend }
    }
}

impl ConnectionManager for MockManager {
    type Connection = MockConnection;

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connect(&self) -> Result<MockConnection, ConnectionError> {
        let mut state = self.backend.state.lock().unwrap();
        if state.fail_dial {
            return Err(ConnectionError::Dial {
                endpoint: self.endpoint.clone(),
                source: MockBackend::transport_error("connection refused"),
            });
        }
        state.dials += 1;
        Ok(MockConnection {
            backend: self.backend.clone(),
            buffer: Vec::new(),
        })
    }

    fn check(&self, _conn: &mut MockConnection) -> Result<(), ConnectionError> {
        let mut state = self.backend.state.lock().unwrap();
        state.checks += 1;
        if state.fail_check {
            return Err(ConnectionError::HealthCheck {
                endpoint: self.endpoint.clone(),
                source: MockBackend::transport_error("no PONG"),
            });
        }
        Ok(())
    }
}

/// Selector replaying a fixed list of indices, cycling when exhausted.
#[derive(Debug)]
pub struct SequenceSelector {
    sequence: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequenceSelector {
    /// # Panics
    ///
    /// Panics if `sequence` is empty.
    pub fn new(sequence: Vec<usize>) -> Self {
        assert!(!sequence.is_empty(), "sequence must not be empty");
        Self {
            sequence,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl PoolSelector for SequenceSelector {
    fn select(&self, _len: usize) -> usize {
        let at = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.sequence[at % self.sequence.len()]
    }
}

/// Pools over `count` fake endpoints named `mock-0`, `mock-1`, ...
pub fn mock_pools(
    count: usize,
    settings: PoolSettings,
) -> (PoolSet<MockManager>, Vec<MockBackend>) {
    let backends: Vec<_> = (0..count).map(|_| MockBackend::new()).collect();
    let pools = backends
        .iter()
        .enumerate()
        .map(|(i, backend)| {
            let endpoint = Endpoint::new(format!("mock-{i}"), 6379);
            Pool::new(MockManager::new(endpoint, backend.clone()), settings)
        })
        .collect();
    let selector = Box::new(SequenceSelector::new((0..count.max(1)).collect()));
    (PoolSet::new(pools, selector), backends)
}

/// A client publishing to `key` over `count` fake endpoints, selected round robin.
pub fn mock_client(key: &str, count: usize) -> (RedisClient<MockManager>, Vec<MockBackend>) {
    let (pools, backends) = mock_pools(count, PoolSettings::default());
    (RedisClient::with_pools(key, pools), backends)
}
