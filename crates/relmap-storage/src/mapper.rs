//! The public record mapping API.
//!
//! Owns one connection pool, shared by every clone of the handle. Each
//! operation is one blocking round trip on a pooled connection; the pool is
//! the only state that outlives a call.

use std::sync::{Arc, OnceLock};

use relmap_core::config::{MapperConfig, PoolConfig};
use relmap_core::errors::{MapperError, MapperResult};
use relmap_core::schema::{describe, Record};
use relmap_core::CancelToken;
use rusqlite::{params_from_iter, Connection, Params, Row};
use tracing::debug;

use crate::pool::{ConnectionPool, PooledConnection};
use crate::scan::RowScanner;
use crate::statements::{Statement, StatementBuilder};

struct Inner {
    config: PoolConfig,
    pool: OnceLock<ConnectionPool>,
}

/// Handle to a mapped database.
///
/// Cheap to clone; clones share the pool. Operations fail `NotValid` until
/// [`Mapper::open`] succeeds.
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<Inner>,
    token: CancelToken,
}

impl Mapper {
    /// An unopened mapper that will build its pool from `config`.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pool: OnceLock::new(),
            }),
            token: CancelToken::new(),
        }
    }

    /// Open the pool and verify the database answers. Only once per mapper.
    pub fn open(&self, driver: &str, dsn: &str) -> MapperResult<()> {
        if self.inner.pool.get().is_some() {
            return Err(MapperError::AlreadyOpen);
        }
        let pool = ConnectionPool::open(driver, dsn, &self.inner.config)?;
        self.inner
            .pool
            .set(pool)
            .map_err(|_| MapperError::AlreadyOpen)
    }

    /// New mapper with default pool settings, opened on `driver`/`dsn`.
    pub fn connect(driver: &str, dsn: &str) -> MapperResult<Self> {
        let mapper = Self::new(PoolConfig::default());
        mapper.open(driver, dsn)?;
        Ok(mapper)
    }

    pub fn from_config(config: &MapperConfig) -> MapperResult<Self> {
        let mapper = Self::new(config.pool.clone());
        mapper.open(&config.driver, &config.dsn)?;
        Ok(mapper)
    }

    /// Open from a TOML document; see [`MapperConfig`].
    pub fn from_toml(toml_str: &str) -> MapperResult<Self> {
        let config =
            MapperConfig::from_toml(toml_str).map_err(|e| MapperError::Config(e.to_string()))?;
        Self::from_config(&config)
    }

    pub fn is_open(&self) -> bool {
        self.inner.pool.get().is_some()
    }

    /// A handle on the same pool whose operations observe `token`.
    pub fn with_cancel(&self, token: CancelToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.token
    }

    pub fn pool(&self) -> MapperResult<&ConnectionPool> {
        self.inner.pool.get().ok_or(MapperError::NotValid)
    }

    /// Create the table for `R` if it does not exist yet.
    pub fn create_table<R: Record>(&self) -> MapperResult<()> {
        let (pool, builder) = self.builder()?;
        let schema = describe::<R>()?;
        let sql = builder.create_table(&schema)?;

        let conn = self.acquire(pool)?;
        debug!(table = %schema.table, sql = %sql, "creating table");
        conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Insert `record` and return the generated key. The record's own `id`
    /// is never written.
    pub fn insert<R: Record>(&self, record: &R) -> MapperResult<i64> {
        let (pool, builder) = self.builder()?;
        let schema = describe::<R>()?;
        let statement = builder.insert(&schema, record)?;

        let conn = self.acquire(pool)?;
        execute(&conn, &statement)?;
        Ok(conn.last_insert_rowid())
    }

    /// Load the first row matching `record` into it.
    ///
    /// With `columns`, the row must equal the record's current values in
    /// those columns; without, it is looked up by `id`. Further matching
    /// rows are ignored. `NotFound` leaves the record unchanged.
    pub fn read<R: Record + Clone>(&self, record: &mut R, columns: &[&str]) -> MapperResult<()> {
        let (pool, builder) = self.builder()?;
        let schema = describe::<R>()?;
        let statement = builder.select(&schema, record, columns)?;

        let conn = self.acquire(pool)?;
        debug!(sql = %statement.sql, params = statement.params.len(), "reading record");
        let mut stmt = conn.prepare_cached(&statement.sql)?;
        let scanner = RowScanner::new(&schema, stmt.column_names());
        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let row = rows.next()?.ok_or(MapperError::NotFound)?;
        scanner.scan_into(row, record)
    }

    /// Write every persisted field of `record` to the row with its `id`.
    pub fn update<R: Record>(&self, record: &R) -> MapperResult<()> {
        let (pool, builder) = self.builder()?;
        let schema = describe::<R>()?;
        let statement = builder.update(&schema, record)?;

        let conn = self.acquire(pool)?;
        execute(&conn, &statement)?;
        Ok(())
    }

    /// Delete row `id` from `table`. A missing row is not an error.
    pub fn delete(&self, table: &str, id: i64) -> MapperResult<()> {
        let (pool, builder) = self.builder()?;
        let statement = builder.delete(table, id)?;

        let conn = self.acquire(pool)?;
        execute(&conn, &statement)?;
        Ok(())
    }

    /// Run raw SQL, returning the number of rows changed.
    pub fn exec<P: Params>(&self, sql: &str, params: P) -> MapperResult<usize> {
        let conn = self.acquire(self.pool()?)?;
        debug!(sql = %sql, "exec");
        Ok(conn.execute(sql, params)?)
    }

    /// Run a raw query and scan every row into a fresh `R`.
    pub fn query<R, P>(&self, sql: &str, params: P) -> MapperResult<Vec<R>>
    where
        R: Record + Default + Clone,
        P: Params,
    {
        let schema = describe::<R>()?;
        let conn = self.acquire(self.pool()?)?;
        debug!(sql = %sql, "query");

        let mut stmt = conn.prepare(sql)?;
        let scanner = RowScanner::new(&schema, stmt.column_names());
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            self.token.check()?;
            let mut record = R::default();
            scanner.scan_into(row, &mut record)?;
            records.push(record);
        }
        Ok(records)
    }

    /// Run a raw query and map every row with `f`; for aggregates and joins.
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, mut f: F) -> MapperResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> MapperResult<T>,
    {
        let conn = self.acquire(self.pool()?)?;
        debug!(sql = %sql, "query_map");

        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            self.token.check()?;
            out.push(f(row)?);
        }
        Ok(out)
    }

    /// Run `f` on a pooled connection, e.g. for a transaction.
    ///
    /// The connection stays checked out until `f` returns. Calling back into
    /// a mapper on the same pool from inside `f` needs a second connection;
    /// on a one-connection pool (every in-memory database) that call waits
    /// forever unless an acquire timeout or a deadline token bounds it.
    /// Use `conn` directly instead.
    pub fn with_connection<T, F>(&self, f: F) -> MapperResult<T>
    where
        F: FnOnce(&Connection) -> MapperResult<T>,
    {
        let conn = self.acquire(self.pool()?)?;
        f(&conn)
    }

    fn builder(&self) -> MapperResult<(&ConnectionPool, StatementBuilder)> {
        let pool = self.pool()?;
        Ok((pool, StatementBuilder::new(pool.driver().dialect())))
    }

    /// Check out a connection, then make sure the caller still wants it.
    fn acquire<'a>(&self, pool: &'a ConnectionPool) -> MapperResult<PooledConnection<'a>> {
        let conn = pool.acquire(&self.token)?;
        self.token.check()?;
        Ok(conn)
    }
}

fn execute(conn: &Connection, statement: &Statement) -> MapperResult<usize> {
    debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
    let mut stmt = conn.prepare_cached(&statement.sql)?;
    Ok(stmt.execute(params_from_iter(statement.params.iter()))?)
}
