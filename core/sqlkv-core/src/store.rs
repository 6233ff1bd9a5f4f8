//! Key-value store facade
//!
//! Bundles a connection pool, the driver's query generator and a string pool.
//! Every call runs in its own transaction.

use crate::buffer_pool::StringPool;
#[cfg(feature = "sqlite")]
use crate::config::StoreConfig;
use crate::context::Context;
use crate::error::{KvError, KvResult};
use crate::model::{Batch, Pair};
use crate::ops::primitive::{
    DynGenerator, add_factory, del_factory, get_factory, list_factory, set_factory,
};
use crate::ops::{Add, BucketWriter, Del, Set, TxWriter, pool_exec};
use crate::query::QueryGeneratorRegistry;
use crate::sql::Pool;
use std::borrow::Borrow;
use std::sync::Arc;
#[cfg(feature = "sqlite")]
use tracing::info;

pub struct KvStore<P> {
    writer: TxWriter<P>,
}

impl<P: Pool> KvStore<P> {
    pub fn new(pool: P, generator: DynGenerator) -> Self {
        Self {
            writer: TxWriter::new(pool, generator),
        }
    }

    /// Store whose generator is looked up by driver name. An unknown driver
    /// is not an error here; every operation fails with
    /// [`KvError::GeneratorNotFound`] instead.
    pub fn with_driver(pool: P, registry: &QueryGeneratorRegistry, driver: &str) -> Self {
        Self::new(pool, registry.lookup_or_empty(driver))
    }

    pub fn with_string_pool(pool: P, generator: DynGenerator, strings: Arc<StringPool>) -> Self {
        Self {
            writer: TxWriter::with_string_pool(pool, generator, strings),
        }
    }

    pub fn writer(&self) -> &TxWriter<P> {
        &self.writer
    }

    fn generator(&self) -> &DynGenerator {
        self.writer.generator()
    }

    /// Value under `key`, or `None` if the bucket has no such key.
    pub fn get(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let result = pool_exec(self.writer.pool(), ctx, |tx| {
            get_factory(self.generator(), tx).get(ctx, bucket, key)
        });
        match result {
            Ok(val) => Ok(Some(val)),
            Err(KvError::KeyNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn set(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<()> {
        pool_exec(self.writer.pool(), ctx, |tx| {
            set_factory(self.generator(), tx).set(ctx, bucket, key, val)
        })
        .map(drop)
    }

    /// Inserts a new key; fails if it already exists.
    pub fn add(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<()> {
        pool_exec(self.writer.pool(), ctx, |tx| {
            add_factory(self.generator(), tx).add(ctx, bucket, key, val)
        })
        .map(drop)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn del(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<bool> {
        pool_exec(self.writer.pool(), ctx, |tx| {
            del_factory(self.generator(), tx).del(ctx, bucket, key)
        })
        .map(|removed| removed > 0)
    }

    /// Every key in `bucket`, in key order.
    pub fn list(&self, ctx: &Context, bucket: &str) -> KvResult<Vec<Vec<u8>>> {
        pool_exec(self.writer.pool(), ctx, |tx| {
            list_factory(self.generator(), tx).keys(ctx, bucket)
        })
    }

    pub fn add_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        self.writer.add_bucket(ctx, bucket)
    }

    pub fn del_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        self.writer.del_bucket(ctx, bucket)
    }

    pub fn set_many(&self, ctx: &Context, bucket: &str, pairs: &[Pair]) -> KvResult<()> {
        self.writer.set_many(ctx, bucket, pairs)
    }

    pub fn pairs_to_bucket<I>(&self, ctx: &Context, bucket: &str, pairs: I) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Pair>,
    {
        self.writer.pairs_to_bucket(ctx, bucket, pairs)
    }

    pub fn bucket(&self, bucket: impl Into<String>) -> BucketWriter<'_, P> {
        self.writer.bucket(bucket)
    }

    pub fn batch_upsert<I>(&self, ctx: &Context, batches: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<Batch>,
    {
        self.writer.batch_upsert(ctx, batches)
    }

    pub fn add_log(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        self.writer.add_log(ctx, bucket)
    }

    pub fn insert_log<I>(&self, ctx: &Context, bucket: &str, entries: I) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.writer.insert_log(ctx, bucket, entries)
    }
}

#[cfg(feature = "sqlite")]
impl KvStore<crate::backend::sqlite::SqliteDb> {
    /// Opens the SQLite database named by `config`, using the generator
    /// registered under `config.driver` in the global registry.
    pub fn open(config: &StoreConfig) -> KvResult<Self> {
        use crate::backend::sqlite::{self, SqliteDb};

        config.validate()?;
        if config.driver != sqlite::DRIVER {
            return Err(KvError::Config(format!(
                "driver '{}' cannot run on the bundled sqlite backend",
                config.driver
            )));
        }

        let db = SqliteDb::from_config(config)?;
        let generator = QueryGeneratorRegistry::global().lookup_or_empty(&config.driver);
        let strings = Arc::new(StringPool::new(config.string_pool_capacity));
        info!(database = %config.database, "kv store opened");
        Ok(Self::with_string_pool(db, generator, strings))
    }

    /// In-memory store with default settings.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::open(&StoreConfig::default())
    }
}
