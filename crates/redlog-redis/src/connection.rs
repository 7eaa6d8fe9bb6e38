//! Dialing and checking Redis connections
//!
//! A [`ConnectionManager`] knows how to open a connection to one endpoint and
//! how to verify that an idle one is still alive. [`RedisManager`] is the real
//! implementation; the pool is generic over the trait so tests can swap in
//! in-memory connections.

use std::sync::Once;

use redis::{ConnectionLike, ErrorKind, RedisResult};
use redlog_core::{Endpoint, PoolConfig, SecretString};
use tracing::debug;

use crate::error::ConnectionError;
use crate::publisher::PushPipeline;

/// Opens and health-checks connections for a [`Pool`](crate::Pool).
pub trait ConnectionManager: Send + Sync {
    type Connection: Send;

    /// Endpoint this manager dials
    fn endpoint(&self) -> &Endpoint;

    /// Open a fresh connection, completing any handshake.
    fn connect(&self) -> Result<Self::Connection, ConnectionError>;

    /// Cheap liveness round trip for a connection taken from the idle list.
    fn check(&self, conn: &mut Self::Connection) -> Result<(), ConnectionError>;
}

/// Dials one Redis endpoint with the database, password and TLS settings of a [`PoolConfig`].
///
/// Handshake order: connect (TLS when enabled), `AUTH` when a password is
/// set, then `SELECT` when the database is not 0.
pub struct RedisManager {
    client: redis::Client,
    endpoint: Endpoint,
    database: i64,
    password: Option<SecretString>,
}

impl RedisManager {
    pub fn new(endpoint: &Endpoint, config: &PoolConfig) -> Result<Self, ConnectionError> {
        if config.use_tls() {
            install_crypto_provider();
        }

        let url = endpoint.connection_url(config.use_tls(), config.tls_skip_verify());
        let client = redis::Client::open(url.as_str())
            .map_err(|source| ConnectionError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                source,
            })?;

        let password = Some(config.password().clone()).filter(|password| !password.is_empty());

        Ok(Self {
            client,
            endpoint: endpoint.clone(),
            database: config.database(),
            password,
        })
    }
}

impl ConnectionManager for RedisManager {
    type Connection = RedisConnection;

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connect(&self) -> Result<RedisConnection, ConnectionError> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|source| ConnectionError::Dial {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        // a failed handshake drops `conn`, closing the socket
        if let Some(password) = &self.password {
            redis::cmd("AUTH")
                .arg(password.expose_secret())
                .query::<()>(&mut conn)
                .map_err(|source| ConnectionError::Auth {
                    endpoint: self.endpoint.clone(),
                    source,
                })?;
        }

        if self.database != 0 {
            redis::cmd("SELECT")
                .arg(self.database)
                .query::<()>(&mut conn)
                .map_err(|source| ConnectionError::SelectDatabase {
                    endpoint: self.endpoint.clone(),
                    database: self.database,
                    source,
                })?;
        }

        debug!(
            endpoint = %self.endpoint,
            database = self.database,
            "Opened Redis connection"
        );
        Ok(RedisConnection::new(conn))
    }

    fn check(&self, conn: &mut RedisConnection) -> Result<(), ConnectionError> {
        redis::cmd("PING")
            .query::<()>(&mut conn.inner)
            .map_err(|source| ConnectionError::HealthCheck {
                endpoint: self.endpoint.clone(),
                source,
            })
    }
}

/// A live Redis connection with a client-side pipeline buffer.
///
/// Pushed commands stay in the buffer until [`flush`](PushPipeline::flush),
/// which writes them in one round trip and reads all replies.
pub struct RedisConnection {
    inner: redis::Connection,
    pending: redis::Pipeline,
    queued: usize,
}

impl RedisConnection {
    fn new(inner: redis::Connection) -> Self {
        Self {
            inner,
            pending: redis::pipe(),
            queued: 0,
        }
    }
}

impl PushPipeline for RedisConnection {
    fn push(&mut self, key: &str, payload: &[u8]) -> RedisResult<()> {
        if !self.inner.is_open() {
            return Err((ErrorKind::IoError, "connection is closed").into());
        }
        self.pending.rpush(key, payload).ignore();
        self.queued += 1;
        Ok(())
    }

    fn flush(&mut self) -> RedisResult<()> {
        if self.queued == 0 {
            return Ok(());
        }
        let result = self.pending.query::<()>(&mut self.inner);
        self.pending.clear();
        self.queued = 0;
        result
    }
}

/// rustls needs a process-wide crypto provider before the first TLS handshake.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Err means another component already installed one
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use redlog_core::RawSettings;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    type Script = fn(&[String]) -> &'static str;

    const HANDSHAKE: [&str; 3] = ["AUTH", "SELECT", "PING"];

    /// Read one RESP array command, `None` once the client hangs up.
    fn read_command(reader: &mut impl BufRead) -> Option<Vec<String>> {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            reader.read_line(&mut line).ok()?;
            let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
            let mut buf = vec![0; len + 2];
            reader.read_exact(&mut buf).ok()?;
            buf.truncate(len);
            args.push(String::from_utf8_lossy(&buf).into_owned());
        }
        Some(args)
    }

    /// Accept one connection and answer every command through `script`.
    fn scripted_server(script: Script) -> (Endpoint, JoinHandle<Vec<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut seen = Vec::new();
            while let Some(command) = read_command(&mut reader) {
                if writer.write_all(script(&command).as_bytes()).is_err() {
                    break;
                }
                seen.push(command);
            }
            seen
        });
        (Endpoint::new("127.0.0.1", port), handle)
    }

    fn answer_ok(command: &[String]) -> &'static str {
        match command[0].as_str() {
            "PING" => "+PONG\r\n",
            _ => "+OK\r\n",
        }
    }

    fn reject_auth(command: &[String]) -> &'static str {
        match command[0].as_str() {
            "AUTH" => "-WRONGPASS invalid username-password pair\r\n",
            _ => "+OK\r\n",
        }
    }

    fn reject_select(command: &[String]) -> &'static str {
        match command[0].as_str() {
            "SELECT" => "-ERR DB index is out of range\r\n",
            _ => "+OK\r\n",
        }
    }

    fn config_for(endpoint: &Endpoint, password: &str, db: &str) -> PoolConfig {
        RawSettings::default()
            .with_hosts(endpoint.to_string())
            .with_password(password)
            .with_db(db)
            .validate()
            .unwrap()
    }

    /// Handshake and health check commands, in the order the server saw them
    fn handshake(commands: Vec<Vec<String>>) -> Vec<String> {
        commands
            .into_iter()
            .filter(|command| HANDSHAKE.contains(&command[0].as_str()))
            .map(|command| command.join(" "))
            .collect()
    }

    #[test]
    fn manager_keeps_endpoint_and_skips_empty_password() {
        let config = RawSettings::default()
            .with_hosts("cache:6380")
            .validate()
            .unwrap();
        let endpoint = config.endpoints().first().clone();

        let manager = RedisManager::new(&endpoint, &config).unwrap();
        assert_eq!(manager.endpoint(), &endpoint);
        assert!(manager.password.is_none());
        assert_eq!(manager.database, 0);
    }

    #[test]
    fn manager_accepts_tls_endpoints() {
        let config = RawSettings::default()
            .with_hosts("cache")
            .with_password("geheim")
            .with_db("3")
            .with_use_tls("true")
            .validate()
            .unwrap();

        let manager = RedisManager::new(config.endpoints().first(), &config).unwrap();
        assert!(manager.password.is_some());
        assert_eq!(manager.database, 3);
    }

    #[test]
    fn connect_authenticates_before_selecting() {
        let (endpoint, server) = scripted_server(answer_ok);
        let manager = RedisManager::new(&endpoint, &config_for(&endpoint, "geheim", "3")).unwrap();

        let Ok(mut conn) = manager.connect() else {
            panic!("handshake should succeed");
        };
        manager.check(&mut conn).unwrap();
        drop(conn);

        let commands = handshake(server.join().unwrap());
        assert_eq!(commands, vec!["AUTH geheim", "SELECT 3", "PING"]);
    }

    #[test]
    fn connect_without_password_or_db_skips_handshake() {
        let (endpoint, server) = scripted_server(answer_ok);
        let manager = RedisManager::new(&endpoint, &config_for(&endpoint, "", "")).unwrap();

        let Ok(conn) = manager.connect() else {
            panic!("dial should succeed");
        };
        drop(conn);

        assert!(handshake(server.join().unwrap()).is_empty());
    }

    #[test]
    fn rejected_password_fails_the_dial() {
        let (endpoint, server) = scripted_server(reject_auth);
        let manager = RedisManager::new(&endpoint, &config_for(&endpoint, "wrong", "2")).unwrap();

        let Err(err) = manager.connect() else {
            panic!("a rejected AUTH must fail the dial");
        };
        assert!(matches!(err, ConnectionError::Auth { .. }));

        let commands = handshake(server.join().unwrap());
        assert_eq!(commands, vec!["AUTH wrong"]);
    }

    #[test]
    fn rejected_select_fails_the_dial() {
        let (endpoint, server) = scripted_server(reject_select);
        let manager = RedisManager::new(&endpoint, &config_for(&endpoint, "", "5")).unwrap();

        let Err(err) = manager.connect() else {
            panic!("a rejected SELECT must fail the dial");
        };
        assert!(matches!(err, ConnectionError::SelectDatabase { .. }));
        assert!(err.to_string().starts_with("selecting database 5"));

        let commands = handshake(server.join().unwrap());
        assert_eq!(commands, vec!["SELECT 5"]);
    }
}
