use super::channel::{ChannelSink, flatten_to_channel};
use crate::error::KvResult;

/// Terminal combinators used by the write path, on top of the std adapters
/// (`map`, `filter`, `take`, `inspect`, `count`).
///
/// `take(n)` from std already stops pulling its source after `n` elements,
/// which matters for single-consumer channel sources: pulling past the limit
/// would steal an element from the next reader.
pub trait PullIterExt: Iterator + Sized {
    /// Strict left fold over every element. Returns `init` untouched for an
    /// empty source.
    fn reduce_into<A, F>(self, init: A, f: F) -> A
    where
        F: FnMut(A, Self::Item) -> A,
    {
        self.fold(init, f)
    }

    /// Drains into a vector, preserving order.
    fn to_array(self) -> Vec<Self::Item> {
        self.collect()
    }

    /// Method form of [`flatten_to_channel`] for an iterator of iterators.
    fn flatten_into<S, T>(self, sink: &S, limit: usize) -> KvResult<usize>
    where
        Self::Item: IntoIterator<Item = T>,
        S: ChannelSink<T> + ?Sized,
    {
        flatten_to_channel(self, sink, limit)
    }
}

impl<I: Iterator> PullIterExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::{from_slice, from_vec};
    use std::cell::Cell;

    /// Source that counts how many times it was pulled.
    struct Counting<'a> {
        pulls: &'a Cell<usize>,
        next: u32,
    }

    impl Iterator for Counting<'_> {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            self.pulls.set(self.pulls.get() + 1);
            self.next += 1;
            Some(self.next)
        }
    }

    #[test]
    fn take_caps_source_pulls() {
        let pulls = Cell::new(0);
        let mut it = Counting { pulls: &pulls, next: 0 }.take(3);
        assert_eq!(it.by_ref().to_array(), vec![1, 2, 3]);
        for _ in 0..5 {
            assert_eq!(it.next(), None);
        }
        assert_eq!(pulls.get(), 3);
    }

    #[test]
    fn combinators_are_lazy() {
        let pulls = Cell::new(0);
        let mapped = Counting { pulls: &pulls, next: 0 }
            .map(|v| v * 2)
            .filter(|v| v % 4 == 0);
        assert_eq!(pulls.get(), 0);
        assert_eq!(mapped.take(2).to_array(), vec![4, 8]);
        assert_eq!(pulls.get(), 4);
    }

    #[test]
    fn inspect_sees_only_yielded_values() {
        let seen = Cell::new(0);
        let total = from_slice(&[1, 2, 3])
            .inspect(|v| seen.set(seen.get() + v))
            .count();
        assert_eq!(total, 3);
        assert_eq!(seen.get(), 6);
    }

    #[test]
    fn reduce_into_empty_returns_init() {
        let out = from_vec(Vec::<i32>::new()).reduce_into(42, |acc, v| acc + v);
        assert_eq!(out, 42);
    }

    #[test]
    fn reduce_into_is_left_fold() {
        let s = from_slice(&["a", "b", "c"]).reduce_into(String::from(">"), |mut acc, v| {
            acc.push_str(v);
            acc
        });
        assert_eq!(s, ">abc");
    }

    #[test]
    fn flatten_into_from_method() {
        let (tx, rx) = std::sync::mpsc::sync_channel(8);
        let pushed = from_vec(vec![vec![1, 2], vec![3]]).flatten_into(&tx, 8).unwrap();
        assert_eq!(pushed, 3);
        drop(tx);
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
