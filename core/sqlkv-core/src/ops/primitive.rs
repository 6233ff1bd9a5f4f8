//! Primitive operations
//!
//! Each factory pairs a [`QueryGenerator`] with the collaborator the operation
//! needs and returns a single-purpose value. Every call generates the query
//! for the bucket (errors out before touching the collaborator on failure),
//! then runs it. Collaborator errors come back unchanged.

use super::{Add, Del, Set, SetToBucket};
use crate::context::Context;
use crate::error::{KvError, KvResult};
use crate::query::{Operation, QueryGenerator, QueryGeneratorRegistry};
use crate::sql::{Exec, Query, QueryEach};
use std::sync::Arc;
use tracing::info;

/// Reads the value stored under a key.
pub struct Getter<G, Q> {
    generator: G,
    query: Q,
}

impl<G: QueryGenerator, Q: Query> Getter<G, Q> {
    /// Value under `key`. A missing key is whatever the collaborator reports
    /// (the SQLite backend says [`KvError::KeyNotFound`]).
    pub fn get(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<Vec<u8>> {
        let query = self.generator.get(bucket)?;
        let mut val = Vec::new();
        self.query.query(ctx, &query, &[key]).scan(&mut [&mut val])?;
        Ok(val)
    }
}

pub struct Remover<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> Del for Remover<G, E> {
    fn del(&self, ctx: &Context, bucket: &str, key: &[u8]) -> KvResult<u64> {
        let query = self.generator.del(bucket)?;
        self.exec.exec(ctx, &query, &[key])
    }
}

pub struct Adder<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> Add for Adder<G, E> {
    fn add(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64> {
        let query = self.generator.add(bucket)?;
        self.exec.exec(ctx, &query, &[key, val])
    }
}

/// Upsert through the backend's native `Set` statement.
pub struct Setter<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> Set for Setter<G, E> {
    fn set(&self, ctx: &Context, bucket: &str, key: &[u8], val: &[u8]) -> KvResult<u64> {
        let query = self.generator.set(bucket)?;
        self.exec.exec(ctx, &query, &[key, val])
    }
}

pub struct BucketAdder<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> BucketAdder<G, E> {
    pub fn add_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        let query = self.generator.add_bucket(bucket)?;
        self.exec.exec(ctx, &query, &[])?;
        info!(bucket, "bucket created");
        Ok(())
    }
}

pub struct BucketRemover<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> BucketRemover<G, E> {
    pub fn del_bucket(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        let query = self.generator.del_bucket(bucket)?;
        self.exec.exec(ctx, &query, &[])?;
        info!(bucket, "bucket dropped");
        Ok(())
    }
}

/// Streams the keys of a bucket in key order.
pub struct Lister<G, Q> {
    generator: G,
    query: Q,
}

impl<G: QueryGenerator, Q: QueryEach> Lister<G, Q> {
    /// Calls `f` once per key; stops at the first error `f` returns.
    pub fn for_each_key<F>(&self, ctx: &Context, bucket: &str, mut f: F) -> KvResult<()>
    where
        F: FnMut(Vec<u8>) -> KvResult<()>,
    {
        let query = self.generator.list(bucket)?;
        self.query.query_each(
            ctx,
            &mut |row| {
                if row.is_empty() {
                    return Err(KvError::Backend("list: row without key column".to_string()));
                }
                f(row.into_columns().swap_remove(0))
            },
            &query,
            &[],
        )
    }

    pub fn keys(&self, ctx: &Context, bucket: &str) -> KvResult<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        self.for_each_key(ctx, bucket, |key| {
            keys.push(key);
            Ok(())
        })?;
        Ok(keys)
    }
}

/// Creates append-only log buckets.
pub struct LogAdder<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> LogAdder<G, E> {
    pub fn add_log(&self, ctx: &Context, bucket: &str) -> KvResult<()> {
        let query = self.generator.add_log(bucket)?;
        self.exec.exec(ctx, &query, &[])?;
        info!(bucket, "log bucket created");
        Ok(())
    }
}

/// Appends entries to a log bucket.
pub struct LogInserter<G, E> {
    generator: G,
    exec: E,
}

impl<G: QueryGenerator, E: Exec> LogInserter<G, E> {
    pub fn insert(&self, ctx: &Context, bucket: &str, entry: &[u8]) -> KvResult<u64> {
        let query = self.generator.insert_log(bucket)?;
        self.exec.exec(ctx, &query, &[entry])
    }
}

/// Query text for one operation on one bucket, generated once up front.
///
/// A generation failure is kept and reported on every [`text`](Self::text)
/// call, so builders stay infallible and the error shows up at first use.
#[derive(Clone)]
pub struct BuiltQuery<G> {
    generator: G,
    op: Operation,
    bucket: String,
    text: Option<String>,
}

impl<G: QueryGenerator> BuiltQuery<G> {
    pub fn new(generator: G, op: Operation, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let text = generator.generate(op, &bucket).ok();
        Self {
            generator,
            op,
            bucket,
            text,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn text(&self) -> KvResult<&str> {
        match &self.text {
            Some(text) => Ok(text),
            // Generation is deterministic, so this reproduces the original error.
            None => Err(self
                .generator
                .generate(self.op, &self.bucket)
                .err()
                .unwrap_or_else(|| {
                    KvError::Generation(format!("{} on {} failed earlier", self.op, self.bucket))
                })),
        }
    }
}

/// [`SetToBucket`] over a prebuilt `Set` query.
pub struct BucketSetter<G, E> {
    query: BuiltQuery<G>,
    exec: E,
}

impl<G: QueryGenerator, E> BucketSetter<G, E> {
    pub fn new(query: BuiltQuery<G>, exec: E) -> Self {
        Self { query, exec }
    }

    pub fn bucket(&self) -> &str {
        self.query.bucket()
    }
}

impl<G: QueryGenerator, E: Exec> SetToBucket for BucketSetter<G, E> {
    fn set_to_bucket(&self, ctx: &Context, key: &[u8], val: &[u8]) -> KvResult<u64> {
        let query = self.query.text()?;
        self.exec.exec(ctx, query, &[key, val])
    }
}

pub fn get_factory<G, Q>(generator: G, query: Q) -> Getter<G, Q> {
    Getter { generator, query }
}

pub fn del_factory<G, E>(generator: G, exec: E) -> Remover<G, E> {
    Remover { generator, exec }
}

pub fn add_factory<G, E>(generator: G, exec: E) -> Adder<G, E> {
    Adder { generator, exec }
}

pub fn set_factory<G, E>(generator: G, exec: E) -> Setter<G, E> {
    Setter { generator, exec }
}

pub fn add_bucket_factory<G, E>(generator: G, exec: E) -> BucketAdder<G, E> {
    BucketAdder { generator, exec }
}

pub fn del_bucket_factory<G, E>(generator: G, exec: E) -> BucketRemover<G, E> {
    BucketRemover { generator, exec }
}

pub fn list_factory<G, Q>(generator: G, query: Q) -> Lister<G, Q> {
    Lister { generator, query }
}

pub fn add_log_factory<G, E>(generator: G, exec: E) -> LogAdder<G, E> {
    LogAdder { generator, exec }
}

pub fn insert_log_factory<G, E>(generator: G, exec: E) -> LogInserter<G, E> {
    LogInserter { generator, exec }
}

/// Setter for a single bucket; the `Set` query is generated here, once.
pub fn set_to_bucket_factory<G, E>(generator: G, exec: E, bucket: impl Into<String>) -> BucketSetter<G, E>
where
    G: QueryGenerator,
{
    BucketSetter::new(BuiltQuery::new(generator, Operation::Set, bucket), exec)
}

/// Shared generator handle, as handed out by the registry.
pub type DynGenerator = Arc<dyn QueryGenerator>;

pub fn get_factory_for<Q>(registry: &QueryGeneratorRegistry, driver: &str, query: Q) -> Getter<DynGenerator, Q> {
    get_factory(registry.lookup_or_empty(driver), query)
}

pub fn del_factory_for<E>(registry: &QueryGeneratorRegistry, driver: &str, exec: E) -> Remover<DynGenerator, E> {
    del_factory(registry.lookup_or_empty(driver), exec)
}

pub fn add_factory_for<E>(registry: &QueryGeneratorRegistry, driver: &str, exec: E) -> Adder<DynGenerator, E> {
    add_factory(registry.lookup_or_empty(driver), exec)
}

pub fn set_factory_for<E>(registry: &QueryGeneratorRegistry, driver: &str, exec: E) -> Setter<DynGenerator, E> {
    set_factory(registry.lookup_or_empty(driver), exec)
}

pub fn add_bucket_factory_for<E>(
    registry: &QueryGeneratorRegistry,
    driver: &str,
    exec: E,
) -> BucketAdder<DynGenerator, E> {
    add_bucket_factory(registry.lookup_or_empty(driver), exec)
}

pub fn del_bucket_factory_for<E>(
    registry: &QueryGeneratorRegistry,
    driver: &str,
    exec: E,
) -> BucketRemover<DynGenerator, E> {
    del_bucket_factory(registry.lookup_or_empty(driver), exec)
}

pub fn list_factory_for<Q>(registry: &QueryGeneratorRegistry, driver: &str, query: Q) -> Lister<DynGenerator, Q> {
    list_factory(registry.lookup_or_empty(driver), query)
}

pub fn add_log_factory_for<E>(registry: &QueryGeneratorRegistry, driver: &str, exec: E) -> LogAdder<DynGenerator, E> {
    add_log_factory(registry.lookup_or_empty(driver), exec)
}

pub fn insert_log_factory_for<E>(
    registry: &QueryGeneratorRegistry,
    driver: &str,
    exec: E,
) -> LogInserter<DynGenerator, E> {
    insert_log_factory(registry.lookup_or_empty(driver), exec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{TableNameValidator, TemplateQueryGenerator};
    use crate::sql::{Record, Row, exec_fn};
    use parking_lot::Mutex;

    fn generator() -> TemplateQueryGenerator {
        TemplateQueryGenerator::new("stub", TableNameValidator::POSTGRES)
            .with_template(Operation::Get, "GET {table}")
            .with_template(Operation::Del, "DEL {table}")
            .with_template(Operation::Add, "ADD {table}")
            .with_template(Operation::Set, "SET {table}")
            .with_template(Operation::AddBucket, "CREATE {table}")
            .with_template(Operation::DelBucket, "DROP {table}")
            .with_template(Operation::List, "LIST {table}")
    }

    /// Records every statement it is asked to run.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<Vec<u8>>)>>,
    }

    impl Exec for Recorder {
        fn exec(&self, _ctx: &Context, query: &str, args: &[&[u8]]) -> KvResult<u64> {
            self.calls
                .lock()
                .push((query.to_string(), args.iter().map(|a| a.to_vec()).collect()));
            Ok(1)
        }
    }

    struct FixedRows(Vec<Row>);

    impl Query for FixedRows {
        fn query(&self, _ctx: &Context, _query: &str, _args: &[&[u8]]) -> Record {
            match self.0.first() {
                Some(row) => Record::found(row.clone()),
                None => Record::failed(KvError::KeyNotFound),
            }
        }
    }

    impl QueryEach for FixedRows {
        fn query_each(
            &self,
            _ctx: &Context,
            callback: &mut dyn FnMut(Row) -> KvResult<()>,
            _query: &str,
            _args: &[&[u8]],
        ) -> KvResult<()> {
            self.0.iter().cloned().try_for_each(|row| callback(row))
        }
    }

    #[test]
    fn set_passes_key_and_value() {
        let rec = Recorder::default();
        let setter = set_factory(generator(), &rec);
        setter.set(&Context::background(), "users", b"k", b"v").unwrap();
        assert_eq!(
            *rec.calls.lock(),
            vec![("SET users".to_string(), vec![b"k".to_vec(), b"v".to_vec()])]
        );
    }

    #[test]
    fn generation_error_skips_collaborator() {
        let rec = Recorder::default();
        let remover = del_factory(generator(), &rec);
        let err = remover.del(&Context::background(), "0bad", b"k").unwrap_err();
        assert!(matches!(err, KvError::InvalidBucketName(_)));
        assert!(rec.calls.lock().is_empty());
    }

    #[test]
    fn collaborator_error_is_unchanged() {
        let failing = exec_fn(|_, _, _| Err(KvError::Backend("duplicate key".to_string())));
        let adder = add_factory(generator(), failing);
        let err = adder.add(&Context::background(), "users", b"k", b"v").unwrap_err();
        assert!(matches!(err, KvError::Backend(ref m) if m == "duplicate key"));
    }

    #[test]
    fn get_scans_value() {
        let getter = get_factory(generator(), FixedRows(vec![Row::new([b"v".to_vec()])]));
        assert_eq!(getter.get(&Context::background(), "users", b"k").unwrap(), b"v");

        let missing = get_factory(generator(), FixedRows(Vec::new()));
        assert!(matches!(
            missing.get(&Context::background(), "users", b"k"),
            Err(KvError::KeyNotFound)
        ));
    }

    #[test]
    fn bucket_ops_run_ddl() {
        let rec = Recorder::default();
        let ctx = Context::background();
        add_bucket_factory(generator(), &rec).add_bucket(&ctx, "users").unwrap();
        del_bucket_factory(generator(), &rec).del_bucket(&ctx, "users").unwrap();
        let queries: Vec<String> = rec.calls.lock().iter().map(|(q, _)| q.clone()).collect();
        assert_eq!(queries, vec!["CREATE users", "DROP users"]);
    }

    #[test]
    fn lister_yields_first_column() {
        let rows = FixedRows(vec![Row::new([b"a".to_vec()]), Row::new([b"b".to_vec()])]);
        let keys = list_factory(generator(), rows)
            .keys(&Context::background(), "users")
            .unwrap();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn lister_rejects_row_without_columns() {
        let rows = FixedRows(vec![Row::new([b"a".to_vec()]), Row::default()]);
        let err = list_factory(generator(), rows)
            .keys(&Context::background(), "users")
            .unwrap_err();
        assert!(matches!(err, KvError::Backend(_)));
    }

    #[test]
    fn missing_log_templates_are_generation_errors() {
        let rec = Recorder::default();
        let err = add_log_factory(generator(), &rec)
            .add_log(&Context::background(), "events")
            .unwrap_err();
        assert!(matches!(err, KvError::Generation(_)));
        let err = insert_log_factory(generator(), &rec)
            .insert(&Context::background(), "events", b"entry")
            .unwrap_err();
        assert!(matches!(err, KvError::Generation(_)));
    }

    #[test]
    fn built_query_reports_error_on_every_use() {
        let built = BuiltQuery::new(generator(), Operation::Set, "Bad");
        assert!(matches!(built.text(), Err(KvError::InvalidBucketName(_))));
        assert!(matches!(built.text(), Err(KvError::InvalidBucketName(_))));

        let ok = BuiltQuery::new(generator(), Operation::Set, "users");
        assert_eq!(ok.text().unwrap(), "SET users");
    }

    #[test]
    fn bucket_setter_reuses_query() {
        let rec = Recorder::default();
        let setter = set_to_bucket_factory(generator(), &rec, "users");
        let ctx = Context::background();
        setter.set_to_bucket(&ctx, b"a", b"1").unwrap();
        setter.set_to_bucket(&ctx, b"b", b"2").unwrap();
        assert!(rec.calls.lock().iter().all(|(q, _)| q == "SET users"));
        assert_eq!(setter.bucket(), "users");
    }

    #[test]
    fn unknown_driver_fails_at_first_use() {
        let registry = QueryGeneratorRegistry::new();
        let rec = Recorder::default();
        let setter = set_factory_for(&registry, "mysql", &rec);
        let err = setter.set(&Context::background(), "users", b"k", b"v").unwrap_err();
        assert!(matches!(err, KvError::GeneratorNotFound(ref d) if d == "mysql"));
        assert!(rec.calls.lock().is_empty());
    }

    #[test]
    fn driver_variants_use_registered_generator() {
        let registry = QueryGeneratorRegistry::new();
        registry.register("stub", Some(Arc::new(generator()) as DynGenerator));
        let rec = Recorder::default();
        del_factory_for(&registry, "stub", &rec)
            .del(&Context::background(), "users", b"k")
            .unwrap();
        assert_eq!(rec.calls.lock()[0].0, "DEL users");
    }

    #[test]
    fn log_and_list_driver_variants() {
        let registry = QueryGeneratorRegistry::new();
        let logging = generator()
            .with_template(Operation::AddLog, "CREATE LOG {table}")
            .with_template(Operation::InsertLog, "APPEND {table}");
        registry.register("stub", Some(Arc::new(logging) as DynGenerator));
        let rec = Recorder::default();
        let ctx = Context::background();

        add_log_factory_for(&registry, "stub", &rec).add_log(&ctx, "events").unwrap();
        insert_log_factory_for(&registry, "stub", &rec)
            .insert(&ctx, "events", b"entry")
            .unwrap();
        let calls = rec.calls.lock().clone();
        assert_eq!(calls[0].0, "CREATE LOG events");
        assert_eq!(calls[1], ("APPEND events".to_string(), vec![b"entry".to_vec()]));

        let rows = FixedRows(vec![Row::new([b"k".to_vec()])]);
        let keys = list_factory_for(&registry, "stub", rows).keys(&ctx, "events").unwrap();
        assert_eq!(keys, vec![b"k".to_vec()]);

        let err = list_factory_for(&registry, "mysql", FixedRows(Vec::new()))
            .keys(&ctx, "events")
            .unwrap_err();
        assert!(matches!(err, KvError::GeneratorNotFound(ref d) if d == "mysql"));
    }
}
