//! SQLite connection pool

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Build a pool of connections to the database file at `path`
pub fn build_pool(path: &Path, max_size: u32, timeout: Duration) -> Result<SqlitePool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(path).with_init(init_connection);
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(timeout)
        .build(manager)
}

/// Per-connection settings, applied whenever the pool opens a connection
fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
    )
}
