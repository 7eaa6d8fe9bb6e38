//! Bounded idle-connection pool for one endpoint
//!
//! Connections are opened lazily, handed out exclusively, and put back on an
//! idle list when the borrower is done. The idle list is capped and entries
//! older than the idle timeout are dropped instead of reused. Every reused
//! connection is health-checked first.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use redlog_core::Endpoint;
use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::error::{PoolError, SinkResult};

/// Idle list limits for a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Most idle connections kept for reuse
    pub max_idle: usize,
    /// Idle connections older than this are closed; zero disables eviction
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle: 3,
            idle_timeout: Duration::from_secs(240),
        }
    }
}

struct IdleConnection<C> {
    conn: C,
    since: Instant,
}

struct PoolState<C> {
    /// Most recently returned first
    idle: VecDeque<IdleConnection<C>>,
    closed: bool,
}

impl<C> PoolState<C> {
    /// Remove idle entries older than `timeout` from the back of the list.
    fn take_stale(&mut self, timeout: Duration) -> Vec<C> {
        let mut stale = Vec::new();
        if timeout.is_zero() {
            return stale;
        }
        while let Some(oldest) = self.idle.back() {
            if oldest.since.elapsed() <= timeout {
                break;
            }
            if let Some(entry) = self.idle.pop_back() {
                stale.push(entry.conn);
            }
        }
        stale
    }
}

/// Connection pool for a single endpoint.
pub struct Pool<M: ConnectionManager> {
    manager: M,
    settings: PoolSettings,
    state: Mutex<PoolState<M::Connection>>,
}

impl<M: ConnectionManager> Pool<M> {
    pub fn new(manager: M, settings: PoolSettings) -> Self {
        Self {
            manager,
            settings,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                closed: false,
            }),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.manager.endpoint()
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Borrow a connection, reusing a healthy idle one or dialing a new one.
    ///
    /// The connection goes back to the pool when the returned guard is dropped.
    pub fn get(&self) -> SinkResult<PooledConnection<'_, M>> {
        loop {
            let (candidate, stale) = {
                let mut state = self.lock();
                if state.closed {
                    return Err(self.closed_error().into());
                }
                let stale = state.take_stale(self.settings.idle_timeout);
                (state.idle.pop_front(), stale)
            };

            if !stale.is_empty() {
                debug!(
                    endpoint = %self.endpoint(),
                    evicted = stale.len(),
                    "Closed stale idle connections"
                );
                drop(stale);
            }

            let Some(mut idle) = candidate else { break };
            match self.manager.check(&mut idle.conn) {
                Ok(()) => {
                    debug!(endpoint = %self.endpoint(), "Reusing idle connection");
                    return Ok(PooledConnection::new(self, idle.conn));
                }
                Err(error) => {
                    warn!(
                        endpoint = %self.endpoint(),
                        error = %error,
                        "Discarding idle connection"
                    );
                }
            }
        }

        let conn = self.manager.connect()?;
        Ok(PooledConnection::new(self, conn))
    }

    /// Close every idle connection and refuse further borrows.
    ///
    /// Connections currently borrowed are closed when they are returned.
    /// Calling this more than once has no further effect.
    pub fn close(&self) {
        let drained: Vec<_> = {
            let mut state = self.lock();
            state.closed = true;
            state.idle.drain(..).collect()
        };
        if !drained.is_empty() {
            debug!(
                endpoint = %self.endpoint(),
                closed = drained.len(),
                "Closed idle connections"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of connections currently waiting on the idle list
    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    fn put(&self, conn: M::Connection, broken: bool) {
        let discarded = {
            let mut state = self.lock();
            if state.closed || broken {
                Some(conn)
            } else {
                state.idle.push_front(IdleConnection {
                    conn,
                    since: Instant::now(),
                });
                if state.idle.len() > self.settings.max_idle {
                    state.idle.pop_back().map(|entry| entry.conn)
                } else {
                    None
                }
            }
        };
        drop(discarded);
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<M::Connection>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed_error(&self) -> PoolError {
        PoolError::Closed {
            endpoint: self.endpoint().clone(),
        }
    }
}

/// A borrowed connection, returned to its pool on drop.
pub struct PooledConnection<'a, M: ConnectionManager> {
    pool: &'a Pool<M>,
    conn: Option<M::Connection>,
    broken: bool,
}

impl<'a, M: ConnectionManager> PooledConnection<'a, M> {
    fn new(pool: &'a Pool<M>, conn: M::Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
            broken: false,
        }
    }

    /// Close the connection on drop instead of returning it to the idle list.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.pool.endpoint()
    }
}

impl<M: ConnectionManager> Deref for PooledConnection<'_, M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("BUG: pooled connection is present until drop")
    }
}

impl<M: ConnectionManager> DerefMut for PooledConnection<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_mut()
            .expect("BUG: pooled connection is present until drop")
    }
}

impl<M: ConnectionManager> Drop for PooledConnection<'_, M> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put(conn, self.broken);
        }
    }
}
