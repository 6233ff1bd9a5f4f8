//! Runtime key-value operations
//!
//! - [`primitive`]: single-statement operations built from a
//!   [`QueryGenerator`](crate::query::QueryGenerator) and a SQL collaborator.
//! - [`non_atomic`]: per-item loops over the primitives. No transaction of
//!   their own; the first error stops the loop.
//! - [`batch`]: multi-bucket upsert sent as one statement batch.
//! - [`tx`]: the same writers run inside a pooled transaction.

pub mod batch;
pub mod non_atomic;
pub mod primitive;
pub mod tx;

pub use batch::batch_upsert;
pub use non_atomic::{NonAtomicSet, pairs_to, pairs_to_bucket, set_many, set_many_to_bucket};
pub use primitive::{
    Adder, BucketAdder, BucketRemover, BucketSetter, BuiltQuery, Getter, Lister, LogAdder,
    LogInserter, Remover, Setter,
};
pub use tx::{BucketWriter, TxWriter, pool_exec};

use crate::context::Context;
use crate::error::KvResult;

/// Removes a key from a bucket. Returns the number of rows removed.
pub trait Del {
    fn del(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<u64>;
}

/// Inserts a key that must not exist yet.
pub trait Add {
    fn add(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64>;
}

/// Inserts or overwrites a key.
pub trait Set {
    fn set(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64>;
}

/// [`Set`] bound to one bucket.
pub trait SetToBucket {
    fn set_to_bucket(&self, ctx: &Context, key: &[u8], val: &[u8]) -> KvResult<u64>;
}

impl<D: Del + ?Sized> Del for &D {
    fn del(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<u64> {
        (**self).del(ctx, bucket, key)
    }
}

impl<A: Add + ?Sized> Add for &A {
    fn add(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64> {
        (**self).add(ctx, bucket, key, val)
    }
}

impl<S: Set + ?Sized> Set for &S {
    fn set(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64> {
        (**self).set(ctx, bucket, key, val)
    }
}

impl<S: SetToBucket + ?Sized> SetToBucket for &S {
    fn set_to_bucket(&self, ctx: &Context, key: &[u8], val: &[u8]) -> KvResult<u64> {
        (**self).set_to_bucket(ctx, key, val)
    }
}
