//! SQL collaborator interfaces
//!
//! The store never talks to a driver directly. Everything it needs from a
//! backend goes through the traits in this module:
//!
//! - [`Exec`] runs a statement and reports affected rows.
//! - [`Query`] fetches a single [`Record`]; errors surface on [`Record::scan`].
//! - [`QueryEach`] streams rows to a callback in result order.
//! - [`SendBatch`] submits a [`StatementBatch`] in one round trip.
//! - [`Pool`] / [`Connection`] hand out connections and scope transactions.
//!
//! Arguments are always byte strings (keys, values, log entries).

use crate::context::Context;
use crate::error::{KvError, KvResult};
use smallvec::SmallVec;

/// Executes a statement.
pub trait Exec {
    fn exec(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> KvResult<u64>;
}

impl<E: Exec + ?Sized> Exec for &E {
    fn exec(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> KvResult<u64> {
        (**self).exec(ctx, query, args)
    }
}

/// [`Exec`] backed by a closure.
pub struct ExecFn<F>(F);

/// Wraps a closure as an [`Exec`] collaborator.
pub fn exec_fn<F>(f: F) -> ExecFn<F>
where
    F: Fn(&Context, &str, &[&[u8]]) -> KvResult<u64>,
{
    ExecFn(f)
}

impl<F> Exec for ExecFn<F>
where
    F: Fn(&Context, &str, &[&[u8]]) -> KvResult<u64>,
{
    fn exec(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> KvResult<u64> {
        (self.0)(ctx, query, args)
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: SmallVec<[Vec<u8>; 2]>,
}

impl Row {
    pub fn new(columns: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&[u8]> {
        self.columns.get(idx).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<Vec<u8>> {
        self.columns.into_vec()
    }
}

/// Outcome of [`Query::query`]. Any error from running the query is held
/// back until [`scan`](Record::scan).
#[derive(Debug)]
pub struct Record {
    row: KvResult<Row>,
}

impl Record {
    pub fn found(row: Row) -> Self {
        Self { row: Ok(row) }
    }

    pub fn failed(err: KvError) -> Self {
        Self { row: Err(err) }
    }

    /// Copies the leading columns into `dest`, in order.
    pub fn scan(self, dest: &mut [&mut Vec<u8>]) -> KvResult<()> {
        let row = self.row?;
        if dest.len() > row.len() {
            return Err(KvError::Backend(format!(
                "scan: expected {} columns, row has {}",
                dest.len(),
                row.len()
            )));
        }
        for (slot, column) in dest.iter_mut().zip(row.columns) {
            **slot = column;
        }
        Ok(())
    }
}

impl From<KvResult<Row>> for Record {
    fn from(row: KvResult<Row>) -> Self {
        Self { row }
    }
}

/// Runs a query expected to return at most one row.
pub trait Query {
    fn query(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> Record;
}

impl<Q: Query + ?Sized> Query for &Q {
    fn query(&self, ctx: &Context, query: &str, args: &[&[u8]]) -> Record {
        (**self).query(ctx, query, args)
    }
}

/// Runs a query and invokes `callback` once per row, in result order.
/// Stops at the first callback error and returns it.
pub trait QueryEach {
    fn query_each(
        &self,
        ctx: &Context,
        callback: &mut dyn FnMut(Row) -> KvResult<()>,
        query: &str,
        args: &[&[u8]],
    ) -> KvResult<()>;
}

impl<Q: QueryEach + ?Sized> QueryEach for &Q {
    fn query_each(
        &self,
        ctx: &Context,
        callback: &mut dyn FnMut(Row) -> KvResult<()>,
        query: &str,
        args: &[&[u8]],
    ) -> KvResult<()> {
        (**self).query_each(ctx, callback, query, args)
    }
}

/// A queued statement and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    query: String,
    args: SmallVec<[Vec<u8>; 2]>,
}

impl Statement {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Borrowed view of the arguments in the shape [`Exec`] takes.
    pub fn arg_refs(&self) -> SmallVec<[&[u8]; 2]> {
        self.args.iter().map(Vec::as_slice).collect()
    }
}

/// Statements submitted together; results come back in queue order.
#[derive(Debug, Clone, Default)]
pub struct StatementBatch {
    statements: Vec<Statement>,
}

impl StatementBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, query: impl Into<String>, args: impl IntoIterator<Item = Vec<u8>>) {
        self.statements.push(Statement {
            query: query.into(),
            args: args.into_iter().collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

impl IntoIterator for StatementBatch {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

/// Per-statement results of a sent batch, in submission order.
#[derive(Debug)]
pub struct BatchResults {
    results: std::vec::IntoIter<KvResult<u64>>,
}

impl BatchResults {
    pub fn new(results: Vec<KvResult<u64>>) -> Self {
        Self {
            results: results.into_iter(),
        }
    }

    /// Result of the next statement. Reading past the end is a backend error.
    pub fn exec(&mut self) -> KvResult<u64> {
        self.results.next().unwrap_or_else(|| {
            Err(KvError::Backend(
                "batch returned fewer results than queued statements".to_string(),
            ))
        })
    }

    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}

/// Submits a whole batch at once.
pub trait SendBatch {
    fn send_batch(&self, ctx: &Context, batch: StatementBatch) -> BatchResults;
}

impl<S: SendBatch + ?Sized> SendBatch for &S {
    fn send_batch(&self, ctx: &Context, batch: StatementBatch) -> BatchResults {
        (**self).send_batch(ctx, batch)
    }
}

/// Everything available inside a transaction.
pub trait Transaction: Exec + Query + QueryEach + SendBatch {}

impl<T: Exec + Query + QueryEach + SendBatch + ?Sized> Transaction for T {}

/// A checked-out connection. Dropping it returns it to its pool.
pub trait Connection {
    /// Runs `f` inside a transaction: commit when it returns `Ok`, roll back
    /// otherwise. The closure's error is returned unchanged.
    fn begin_func<R, F>(&mut self, ctx: &Context, f: F) -> KvResult<R>
    where
        F: FnOnce(&dyn Transaction) -> KvResult<R>;
}

/// Source of connections.
pub trait Pool: Send + Sync {
    type Conn<'p>: Connection
    where
        Self: 'p;

    fn acquire(&self, ctx: &Context) -> KvResult<Self::Conn<'_>>;
}
