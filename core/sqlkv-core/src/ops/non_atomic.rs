//! Multi-pair writers without a transaction of their own.
//!
//! Pairs are applied one at a time, in source order, and the first error
//! stops the loop. Pairs already written stay written: rolling them back is
//! the job of whatever transaction the caller runs this in.

use super::{Add, Del, Set, SetToBucket};
use crate::context::Context;
use crate::error::KvResult;
use crate::model::Pair;
use std::borrow::Borrow;
use tracing::debug;

/// Upsert for backends without a conditional insert: delete, then add.
///
/// The delete result is ignored (an absent key is the normal case); only the
/// add can fail the call.
pub struct NonAtomicSet<D, A> {
    del: D,
    add: A,
}

impl<D: Del, A: Add> NonAtomicSet<D, A> {
    pub fn new(del: D, add: A) -> Self {
        Self { del, add }
    }
}

impl<D: Del, A: Add> Set for NonAtomicSet<D, A> {
    fn set(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64> {
        if let Err(err) = self.del.del(ctx, bucket, key) {
            debug!(bucket, error = %err, "delete before add failed, continuing");
        }
        self.add.add(ctx, bucket, key, val)
    }
}

pub fn set_many<S: Set + ?Sized>(setter: &S, ctx: &Context, bucket: &str, pairs: &[Pair]) -> KvResult<()> {
    pairs_to(setter, ctx, bucket, pairs)
}

/// Applies `setter` to every pair pulled from `pairs`.
pub fn pairs_to<S, I>(setter: &S, ctx: &Context, bucket: &str, pairs: I) -> KvResult<()>
where
    S: Set + ?Sized,
    I: IntoIterator,
    I::Item: Borrow<Pair>,
{
    pairs.into_iter().try_for_each(|pair| {
        let pair = pair.borrow();
        setter.set(ctx, bucket, &pair.key, &pair.val).map(drop)
    })
}

pub fn set_many_to_bucket<S: SetToBucket + ?Sized>(setter: &S, ctx: &Context, pairs: &[Pair]) -> KvResult<()> {
    pairs_to_bucket(setter, ctx, pairs)
}

pub fn pairs_to_bucket<S, I>(setter: &S, ctx: &Context, pairs: I) -> KvResult<()>
where
    S: SetToBucket + ?Sized,
    I: IntoIterator,
    I::Item: Borrow<Pair>,
{
    pairs.into_iter().try_for_each(|pair| {
        let pair = pair.borrow();
        setter.set_to_bucket(ctx, &pair.key, &pair.val).map(drop)
    })
}
