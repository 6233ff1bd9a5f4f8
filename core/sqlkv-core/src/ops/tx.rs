//! Transactional writers
//!
//! [`pool_exec`] checks a connection out of a [`Pool`], runs a closure inside
//! one transaction and releases the connection when the guard drops, which
//! also happens when the closure panics. The collaborator commits when the
//! closure returns `Ok` and rolls back otherwise.
//!
//! [`TxWriter`] runs the non-atomic writers through `pool_exec`, which makes
//! each call all-or-nothing.

use super::batch::batch_upsert;
use super::non_atomic::{self, NonAtomicSet};
use super::primitive::{
    BucketSetter, BuiltQuery, DynGenerator, add_bucket_factory, add_factory, add_log_factory,
    del_bucket_factory, del_factory, insert_log_factory, set_factory,
};
use crate::buffer_pool::StringPool;
use crate::context::Context;
use crate::error::KvResult;
use crate::model::{Batch, Pair};
use crate::query::Operation;
use crate::sql::{Connection, Pool, Transaction};
use std::borrow::Borrow;
use std::sync::Arc;
use tracing::instrument;

/// Runs `f` in a transaction on a pooled connection.
pub fn pool_exec<P, R, F>(pool: &P, ctx: &Context, f: F) -> KvResult<R>
where
    P: Pool,
    F: FnOnce(&dyn Transaction) -> KvResult<R>,
{
    let mut conn = pool.acquire(ctx)?;
    conn.begin_func(ctx, f)
}

/// Write operations, each in its own transaction.
pub struct TxWriter<P> {
    pool: P,
    generator: DynGenerator,
    strings: Arc<StringPool>,
}

impl<P: Pool> TxWriter<P> {
    /// Writer using the process-wide [`StringPool`].
    pub fn new(pool: P, generator: DynGenerator) -> Self {
        Self::with_string_pool(pool, generator, StringPool::shared())
    }

    pub fn with_string_pool(pool: P, generator: DynGenerator, strings: Arc<StringPool>) -> Self {
        Self {
            pool,
            generator,
            strings,
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn generator(&self) -> &DynGenerator {
        &self.generator
    }

    pub fn string_pool(&self) -> &Arc<StringPool> {
        &self.strings
    }

    /// Upserts every pair into `bucket`.
    #[instrument(skip(self, ctx, pairs), fields(count = pairs.len()))]
    pub fn set_many(&self, ctx: &Context, bucket: &str, pairs: &[Pair]) -> KvResult<()> {
        pool_exec(&self.pool, ctx, |tx| {
            non_atomic::set_many(&set_factory(&self.generator, tx), ctx, bucket, pairs)
        })
    }

    /// Like [`set_many`](Self::set_many), but upserts by deleting then adding
    /// each key, for backends without a native upsert.
    #[instrument(skip(self, ctx, pairs), fields(count = pairs.len()))]
    pub fn set_many_del_add(&self, ctx: &Context, bucket: &str, pairs: &[Pair]) -> KvResult<()> {
        pool_exec(&self.pool, ctx, |tx| {
            let setter = NonAtomicSet::new(
                del_factory(&self.generator, tx),
                add_factory(&self.generator, tx),
            );
            non_atomic::set_many(&setter, ctx, bucket, pairs)
        })
    }

    /// Writer bound to `bucket`, with its `Set` query generated once.
    pub fn bucket(&self, bucket: impl Into<String>) -> BucketWriter<'_, P> {
        BucketWriter {
            writer: self,
            query: BuiltQuery::new(Arc::clone(&self.generator), Operation::Set, bucket),
        }
    }

    #[instrument(skip(self, ctx, pairs))]
    pub fn pairs_to_bucket<I>(&self, ctx: &Context, bucket: &str, pairs: I) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Pair>,
    {
        self.bucket(bucket).pairs_to(ctx, pairs)
    }

    /// Upserts items addressed to any number of buckets in one batch.
    #[instrument(skip(self, ctx, batches))]
    pub fn batch_upsert<I>(&self, ctx: &Context, batches: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<Batch>,
    {
        pool_exec(&self.pool, ctx, |tx| {
            batch_upsert(tx, &*self.generator, &self.strings, ctx, batches)
        })
    }

    #[instrument(skip(self, ctx))]
    pub fn add_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        pool_exec(&self.pool, ctx, |tx| {
            add_bucket_factory(&self.generator, tx).add_bucket(ctx, bucket)
        })
    }

    #[instrument(skip(self, ctx))]
    pub fn del_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        pool_exec(&self.pool, ctx, |tx| {
            del_bucket_factory(&self.generator, tx).del_bucket(ctx, bucket)
        })
    }

    #[instrument(skip(self, ctx))]
    pub fn add_log(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        pool_exec(&self.pool, ctx, |tx| {
            add_log_factory(&self.generator, tx).add_log(ctx, bucket)
        })
    }

    /// Appends every entry to the log bucket.
    #[instrument(skip(self, ctx, entries))]
    pub fn insert_log<I>(&self, ctx: &Context, bucket: &str, entries: I) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        pool_exec(&self.pool, ctx, |tx| {
            let inserter = insert_log_factory(&self.generator, tx);
            entries
                .into_iter()
                .try_for_each(|entry| inserter.insert(ctx, bucket, entry.as_ref()).map(drop))
        })
    }
}

/// Transactional writer for a single bucket; see [`TxWriter::bucket`].
pub struct BucketWriter<'w, P> {
    writer: &'w TxWriter<P>,
    query: BuiltQuery<DynGenerator>,
}

impl<P: Pool> BucketWriter<'_, P> {
    pub fn bucket(&self) -> &str {
        self.query.bucket()
    }

    pub fn set_many(&self, ctx: &Context, pairs: &[Pair]) -> KvResult<()> {
        self.pairs_to(ctx, pairs)
    }

    pub fn pairs_to<I>(&self, ctx: &Context, pairs: I) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Pair>,
    {
        pool_exec(&self.writer.pool, ctx, |tx| {
            let setter = BucketSetter::new(self.query.clone(), tx);
            non_atomic::pairs_to_bucket(&setter, ctx, pairs)
        })
    }
}
