//! Pull-based iterators for the write path.
//!
//! Everything here is a plain [`Iterator`]: the consumer asks for the next
//! element and the source does exactly the work needed to produce it. The
//! constructors below cover the sources the store writes from (fixed
//! sequences, single optional values, channels, integer ranges); combinators
//! live in [`PullIterExt`] on top of the std adapters.
//!
//! # Exhaustion
//!
//! Every constructor except [`from_channel_nb`] returns a fused iterator:
//! once it yields `None` it keeps yielding `None`, so pulling past the end is
//! always safe.

pub mod channel;
mod combinators;

pub use channel::{ChannelIter, ChannelIterNb, ChannelSink, flatten_to_channel, from_channel, from_channel_nb};
pub use combinators::PullIterExt;

use std::iter::FusedIterator;
use std::ops::{Range, RangeFrom};

/// In-order iterator over a borrowed slice, yielding clones.
#[derive(Debug, Clone)]
pub struct FromSlice<'a, T> {
    items: &'a [T],
    pos: usize,
}

impl<T: Clone> Iterator for FromSlice<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.items.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl<T: Clone> ExactSizeIterator for FromSlice<'_, T> {}
impl<T: Clone> FusedIterator for FromSlice<'_, T> {}

/// Iterates a slice in order. An empty slice yields `None` on every pull.
pub fn from_slice<T: Clone>(items: &[T]) -> FromSlice<'_, T> {
    FromSlice { items, pos: 0 }
}

/// Iterates an owned vector in order.
pub fn from_vec<T>(items: Vec<T>) -> std::vec::IntoIter<T> {
    items.into_iter()
}

/// An iterator that never yields.
pub fn empty<T>() -> std::iter::Empty<T> {
    std::iter::empty()
}

/// Yields the held value once (if any), then `None` forever.
pub fn from_option<T>(o: Option<T>) -> std::option::IntoIter<T> {
    o.into_iter()
}

/// Lazy half-open integer range `[start, end)`.
pub fn range(start: i64, end: i64) -> Range<i64> {
    start..end
}

/// Lazy unbounded range starting at `start`; pair it with `take`.
pub fn range_from(start: i64) -> RangeFrom<i64> {
    start..
}
