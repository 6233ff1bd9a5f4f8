//! Channel bridges
//!
//! Iterators over `std::sync::mpsc` receivers, and the reverse direction:
//! spilling nested iterators onto a channel with an upper bound.

use crate::error::{KvError, KvResult};
use std::iter::FusedIterator;
use std::sync::mpsc::{Receiver, Sender, SyncSender};

/// Blocking channel iterator.
///
/// Each pull parks the calling thread until a value arrives. Once every
/// sender is dropped it yields `None`, and keeps doing so.
#[derive(Debug)]
pub struct ChannelIter<T> {
    rx: Receiver<T>,
}

impl<T> Iterator for ChannelIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.rx.recv().ok()
    }
}

impl<T> FusedIterator for ChannelIter<T> {}

/// Wraps a receiver in a blocking iterator.
pub fn from_channel<T>(rx: Receiver<T>) -> ChannelIter<T> {
    ChannelIter { rx }
}

/// Non-blocking channel iterator.
///
/// Never parks: a pull returns `None` as soon as nothing is buffered. This is
/// the one iterator in the crate that is not fused; a later pull can yield
/// again if a sender wrote in between.
#[derive(Debug)]
pub struct ChannelIterNb<T> {
    rx: Receiver<T>,
}

impl<T> Iterator for ChannelIterNb<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// Wraps a receiver in a non-blocking iterator.
pub fn from_channel_nb<T>(rx: Receiver<T>) -> ChannelIterNb<T> {
    ChannelIterNb { rx }
}

/// Sending half accepted by [`flatten_to_channel`].
pub trait ChannelSink<T> {
    /// Pushes one value, blocking while a bounded channel is full.
    fn push(&self, value: T) -> KvResult<()>;
}

impl<T> ChannelSink<T> for Sender<T> {
    fn push(&self, value: T) -> KvResult<()> {
        self.send(value).map_err(|_| KvError::ChannelClosed)
    }
}

impl<T> ChannelSink<T> for SyncSender<T> {
    fn push(&self, value: T) -> KvResult<()> {
        self.send(value).map_err(|_| KvError::ChannelClosed)
    }
}

/// Drains nested iterators onto `sink`, outer-major and inner-minor.
///
/// Stops as soon as `limit` items were pushed, even halfway through an inner
/// iterator; the remaining elements are left unpulled. The channel is never
/// closed here. Returns how many items were pushed.
///
/// # Errors
///
/// [`KvError::ChannelClosed`] when the receiver is gone.
pub fn flatten_to_channel<O, S, T>(outer: O, sink: &S, limit: usize) -> KvResult<usize>
where
    O: IntoIterator,
    O::Item: IntoIterator<Item = T>,
    S: ChannelSink<T> + ?Sized,
{
    let mut pushed = 0;
    if limit == 0 {
        return Ok(pushed);
    }

    for inner in outer {
        for item in inner {
            sink.push(item)?;
            pushed += 1;
            if pushed >= limit {
                return Ok(pushed);
            }
        }
    }

    Ok(pushed)
}
