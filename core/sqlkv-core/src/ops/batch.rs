//! Multi-bucket upsert in one round trip

use crate::buffer_pool::StringPool;
use crate::context::Context;
use crate::error::KvResult;
use crate::model::Batch;
use crate::query::{Operation, QueryGenerator};
use crate::sql::{SendBatch, StatementBatch};
use std::borrow::Borrow;
use tracing::debug;

/// Queues one `Set` statement per item and sends them all as a single batch.
///
/// Statement text is built in a buffer borrowed from `pool`; it goes back to
/// the pool on every exit. Consecutive items for the same bucket share the
/// generated text. Results are read in submission order and the first
/// failure is returned. Returns the number of statements sent.
pub fn batch_upsert<T, G, I>(
    tx: &T,
    generator: &G,
    pool: &StringPool,
    ctx: &Context,
    batches: I,
) -> KvResult<usize>
where
    T: SendBatch + ?Sized,
    G: QueryGenerator + ?Sized,
    I: IntoIterator,
    I::Item: Borrow<Batch>,
{
    let mut text = pool.acquire();
    let mut text_bucket: Option<String> = None;
    let mut statements = StatementBatch::new();

    for item in batches {
        let item = item.borrow();
        if text_bucket.as_deref() != Some(item.bucket()) {
            text.clear();
            generator.write_query(Operation::Set, item.bucket(), &mut text)?;
            text_bucket = Some(item.bucket().to_string());
        }
        let pair = item.pair();
        statements.queue(text.as_str(), [pair.key.clone(), pair.val.clone()]);
    }

    if statements.is_empty() {
        return Ok(0);
    }

    let queued = statements.len();
    debug!(statements = queued, "sending upsert batch");
    let mut results = tx.send_batch(ctx, statements);
    for _ in 0..queued {
        results.exec()?;
    }
    Ok(queued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use crate::query::{TableNameValidator, TemplateQueryGenerator};
    use crate::sql::BatchResults;
    use parking_lot::Mutex;

    fn generator() -> TemplateQueryGenerator {
        TemplateQueryGenerator::new("stub", TableNameValidator::POSTGRES)
            .with_template(Operation::Set, "SET {table}")
    }

    /// Keeps the submitted batch; fails the statement at `fail_at`, if any.
    #[derive(Default)]
    struct Sink {
        sent: Mutex<Vec<(String, Vec<Vec<u8>>)>>,
        sends: Mutex<usize>,
        fail_at: Option<usize>,
    }

    impl SendBatch for Sink {
        fn send_batch(&self, _ctx: &Context, batch: StatementBatch) -> BatchResults {
            *self.sends.lock() += 1;
            let mut results = Vec::new();
            for (idx, stmt) in batch.into_iter().enumerate() {
                self.sent
                    .lock()
                    .push((stmt.query().to_string(), stmt.args().to_vec()));
                results.push(if Some(idx) == self.fail_at {
                    Err(KvError::Backend(format!("statement {idx} failed")))
                } else {
                    Ok(1)
                });
            }
            BatchResults::new(results)
        }
    }

    #[test]
    fn mixed_buckets_one_round_trip() {
        let sink = Sink::default();
        let pool = StringPool::new(2);
        let batches = vec![
            Batch::new("users", "u1", "a"),
            Batch::new("users", "u2", "b"),
            Batch::new("orders", "o1", "c"),
            Batch::new("users", "u3", "d"),
        ];
        let n = batch_upsert(&sink, &generator(), &pool, &Context::background(), batches).unwrap();
        assert_eq!(n, 4);
        assert_eq!(*sink.sends.lock(), 1);

        let sent = sink.sent.lock();
        let queries: Vec<&str> = sent.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["SET users", "SET users", "SET orders", "SET users"]);
        assert_eq!(sent[2].1, vec![b"o1".to_vec(), b"c".to_vec()]);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn empty_input_sends_nothing() {
        let sink = Sink::default();
        let pool = StringPool::new(2);
        let n = batch_upsert(&sink, &generator(), &pool, &Context::background(), Vec::<Batch>::new()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(*sink.sends.lock(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn generation_error_aborts_before_send() {
        let sink = Sink::default();
        let pool = StringPool::new(2);
        let batches = [Batch::new("users", "k", "v"), Batch::new("Bad-Name", "k", "v")];
        let err = batch_upsert(&sink, &generator(), &pool, &Context::background(), &batches).unwrap_err();
        assert!(matches!(err, KvError::InvalidBucketName(_)));
        assert_eq!(*sink.sends.lock(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn first_failed_result_is_returned() {
        let sink = Sink {
            fail_at: Some(1),
            ..Sink::default()
        };
        let pool = StringPool::new(2);
        let batches = (0..3).map(|i| Batch::new("t", vec![b'k', i], "v"));
        let err = batch_upsert(&sink, &generator(), &pool, &Context::background(), batches).unwrap_err();
        assert!(matches!(err, KvError::Backend(ref m) if m == "statement 1 failed"));
    }
}
