//! SQLite PRAGMA configuration for pooled connections.
//! Must be called on every connection immediately after opening.

use std::time::Duration;

use relmap_core::errors::MapperResult;
use rusqlite::Connection;

/// Configure a freshly opened connection.
///
/// - busy_timeout so concurrent writers wait instead of failing
/// - WAL for file databases so readers do not block on the writer
/// - NORMAL synchronous for the WAL durability trade-off
pub fn configure_connection(
    conn: &Connection,
    busy_timeout_ms: u64,
    file_backed: bool,
) -> MapperResult<()> {
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    if file_backed {
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }
    conn.execute_batch(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

/// Round trip proving the connection is live.
pub fn ping(conn: &Connection) -> MapperResult<()> {
    let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
    Ok(())
}
