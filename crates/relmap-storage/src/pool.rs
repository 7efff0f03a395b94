//! Bounded set of SQLite connections shared by all callers.
//!
//! Idle connections wait in a bounded channel. New connections are opened
//! lazily until the ceiling is reached; after that callers block until a
//! connection is handed back or their deadline passes.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use relmap_core::config::PoolConfig;
use relmap_core::errors::{MapperError, MapperResult};
use relmap_core::CancelToken;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::pragmas;

/// Longest single wait before re-checking the caller's cancel flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Connection pool for one database.
#[derive(Debug)]
pub struct ConnectionPool {
    driver: Driver,
    dsn: String,
    in_memory: bool,
    capacity: usize,
    busy_timeout_ms: u64,
    acquire_timeout: Option<Duration>,
    idle_tx: Sender<Connection>,
    idle_rx: Receiver<Connection>,
    open: AtomicUsize,
}

impl ConnectionPool {
    /// Open a pool and verify the database answers.
    ///
    /// One connection is opened and pinged up front; the rest open on demand.
    pub fn open(driver: &str, dsn: &str, config: &PoolConfig) -> MapperResult<Self> {
        let driver = Driver::parse(driver)?;
        let in_memory = is_in_memory(dsn);
        let mut capacity = config.effective_max_open_connections();
        if in_memory && capacity > 1 {
            // Every in-memory connection is its own database.
            warn!(requested = capacity, "in-memory database: pool capped at one connection");
            capacity = 1;
        }

        let (idle_tx, idle_rx) = bounded(capacity);
        let pool = Self {
            driver,
            dsn: dsn.to_string(),
            in_memory,
            capacity,
            busy_timeout_ms: config.effective_busy_timeout_ms(),
            acquire_timeout: config.acquire_timeout(),
            idle_tx,
            idle_rx,
            open: AtomicUsize::new(0),
        };

        let conn = pool.connect()?;
        pragmas::ping(&conn)?;
        pool.open.store(1, Ordering::SeqCst);
        pool.release(conn);

        info!(driver = %driver, in_memory, capacity, "connection pool opened");
        Ok(pool)
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Physical connections currently open, idle or checked out.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn idle_connections(&self) -> usize {
        self.idle_rx.len()
    }

    /// Check out a connection, blocking while the pool is exhausted.
    ///
    /// Waiting stops when `token` is cancelled or its deadline passes, or
    /// when the configured acquire timeout elapses.
    pub fn acquire(&self, token: &CancelToken) -> MapperResult<PooledConnection<'_>> {
        token.check()?;

        if let Ok(conn) = self.idle_rx.try_recv() {
            return Ok(self.wrap(conn));
        }
        if let Some(conn) = self.try_grow()? {
            return Ok(self.wrap(conn));
        }

        let timeout_at = self.acquire_timeout.map(|t| Instant::now() + t);
        debug!(capacity = self.capacity, "connection pool exhausted, waiting");
        loop {
            token.check()?;
            let now = Instant::now();
            if timeout_at.is_some_and(|at| now >= at) {
                return Err(MapperError::PoolTimeout {
                    capacity: self.capacity,
                });
            }

            let mut wait = CANCEL_POLL_INTERVAL;
            for limit in [timeout_at, token.deadline()].into_iter().flatten() {
                wait = wait.min(limit.saturating_duration_since(now));
            }

            match self.idle_rx.recv_timeout(wait) {
                Ok(conn) => return Ok(self.wrap(conn)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(MapperError::PoolTimeout {
                        capacity: self.capacity,
                    })
                }
            }
        }
    }

    /// Open one more connection if the ceiling allows it.
    fn try_grow(&self) -> MapperResult<Option<Connection>> {
        let mut open = self.open.load(Ordering::SeqCst);
        while open < self.capacity {
            match self
                .open
                .compare_exchange(open, open + 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    return match self.connect() {
                        Ok(conn) => {
                            debug!(open = open + 1, "opened pooled connection");
                            Ok(Some(conn))
                        }
                        Err(e) => {
                            self.open.fetch_sub(1, Ordering::SeqCst);
                            Err(e)
                        }
                    };
                }
                Err(actual) => open = actual,
            }
        }
        Ok(None)
    }

    fn connect(&self) -> MapperResult<Connection> {
        let conn = match self.driver {
            Driver::Sqlite if self.in_memory => Connection::open_in_memory()?,
            Driver::Sqlite => Connection::open(&self.dsn)?,
        };
        pragmas::configure_connection(&conn, self.busy_timeout_ms, !self.in_memory)?;
        Ok(conn)
    }

    fn wrap(&self, conn: Connection) -> PooledConnection<'_> {
        PooledConnection {
            pool: self,
            conn: Some(conn),
        }
    }

    fn release(&self, conn: Connection) {
        // The channel holds `capacity` slots, so this only fails if the
        // accounting is off; drop the connection rather than block.
        if self.idle_tx.try_send(conn).is_err() {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// A checked-out connection. Returns to the pool when dropped.
#[derive(Debug)]
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `None` after drop has taken it.
        self.conn.as_ref().expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

fn is_in_memory(dsn: &str) -> bool {
    let dsn = dsn.trim();
    dsn.is_empty() || dsn == ":memory:"
}
