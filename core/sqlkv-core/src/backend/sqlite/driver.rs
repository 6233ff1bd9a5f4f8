use crate::config::StoreConfig;
use crate::context::Context;
use crate::error::{KvError, KvResult};
use crate::sql::{
    BatchResults, Connection, Exec, Pool, Query, QueryEach, Record, Row, SendBatch,
    StatementBatch, Transaction,
};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::ValueRef;
use rusqlite::params_from_iter;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A single SQLite connection behind a mutex.
///
/// Acquiring waits for the mutex (bounded by the context deadline), so
/// callers sharing one `SqliteDb` take turns. Good enough for an embedded
/// store and for tests; it is not a connection pool.
pub struct SqliteDb {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteDb {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> KvResult<Self> {
        let conn = rusqlite::Connection::open(path.as_ref())?;
        conn.busy_timeout(busy_timeout)?;
        debug!(path = %path.as_ref().display(), "sqlite database opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> KvResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_config(config: &StoreConfig) -> KvResult<Self> {
        if config.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open(&config.database, config.busy_timeout())
        }
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl Pool for SqliteDb {
    type Conn<'p> = SqliteConnection<'p>;

    fn acquire(&self, ctx: &Context) -> KvResult<SqliteConnection<'_>> {
        ctx.check()?;
        let guard = match ctx.deadline() {
            Some(deadline) => self
                .conn
                .try_lock_until(deadline)
                .ok_or(KvError::DeadlineExceeded)?,
            None => self.conn.lock(),
        };
        trace!("sqlite connection acquired");
        Ok(SqliteConnection { guard })
    }
}

/// Checked-out connection; released when dropped.
pub struct SqliteConnection<'p> {
    guard: MutexGuard<'p, rusqlite::Connection>,
}

impl Connection for SqliteConnection<'_> {
    fn begin_func<R, F>(&mut self, ctx: &Context, f: F) -> KvResult<R>
    where
        F: FnOnce(&dyn Transaction) -> KvResult<R>,
    {
        ctx.check()?;
        let tx = self.guard.transaction()?;
        let result = f(&SqliteTx { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl Drop for SqliteConnection<'_> {
    fn drop(&mut self) {
        trace!("sqlite connection released");
    }
}

/// Statement access inside an open transaction.
pub struct SqliteTx<'t> {
    conn: &'t rusqlite::Connection,
}

impl SqliteTx<'_> {
    fn run(&self, query: &str, args: &[&[u8]]) -> KvResult<u64> {
        let mut stmt = self.conn.prepare_cached(query)?;
        let affected = stmt.execute(params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }

    fn first_row(&self, query: &str, args: &[&[u8]]) -> KvResult<Row> {
        let mut stmt = self.conn.prepare_cached(query)?;
        let columns = stmt.column_count();
        stmt.query_row(params_from_iter(args.iter()), |row| to_row(row, columns))
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => KvError::KeyNotFound,
                other => other.into(),
            })
    }
}

fn to_row(row: &rusqlite::Row<'_>, columns: usize) -> rusqlite::Result<Row> {
    let mut values = Vec::with_capacity(columns);
    for idx in 0..columns {
        let bytes = match row.get_ref(idx)? {
            ValueRef::Null => Vec::new(),
            ValueRef::Integer(i) => i.to_string().into_bytes(),
            ValueRef::Real(f) => f.to_string().into_bytes(),
            ValueRef::Text(t) | ValueRef::Blob(t) => t.to_vec(),
        };
        values.push(bytes);
    }
    Ok(Row::new(values))
}

impl Exec for SqliteTx<'_> {
    fn exec(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> KvResult<u64> {
        ctx.check()?;
        self.run(query, args)
    }
}

impl Query for SqliteTx<'_> {
    fn query(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> Record {
        Record::from(ctx.check().and_then(|()| self.first_row(query, args)))
    }
}

impl QueryEach for SqliteTx<'_> {
    fn query_each(
        &self,
        ctx: &Context,
        callback: &mut dyn FnMut(Row) -> KvResult<()>,
        query: &str,
        args: &[&[u8]],
    ) -> KvResult<()> {
        ctx.check()?;
        let mut stmt = self.conn.prepare_cached(query)?;
        let columns = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        while let Some(row) = rows.next()? {
            callback(to_row(row, columns)?)?;
        }
        Ok(())
    }
}

impl SendBatch for SqliteTx<'_> {
    /// Runs the statements in order. After the first failure the remaining
    /// statements are skipped and report an aborted error.
    fn send_batch(&self, ctx: &Context, batch: StatementBatch) -> BatchResults {
        let mut results = Vec::with_capacity(batch.len());
        let mut failed = false;
        for statement in batch.iter() {
            if failed {
                results.push(Err(KvError::Backend(
                    "batch aborted by an earlier statement".to_string(),
                )));
                continue;
            }
            let result = ctx
                .check()
                .and_then(|()| self.run(statement.query(), &statement.arg_refs()));
            failed = result.is_err();
            results.push(result);
        }
        BatchResults::new(results)
    }
}
