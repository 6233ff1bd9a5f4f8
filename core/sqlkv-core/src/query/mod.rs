//! Query generation
//!
//! A [`QueryGenerator`] turns a logical operation on a bucket into backend
//! SQL text. It is the only extension point for a new SQL backend: implement
//! it (usually through [`TemplateQueryGenerator`]) and register it under the
//! driver name in a [`QueryGeneratorRegistry`].
//!
//! For a fixed generator and bucket, generation is deterministic.

pub mod registry;
pub mod template;
pub mod validate;

pub use registry::{EmptyQueryGenerator, QueryGeneratorRegistry};
pub use template::TemplateQueryGenerator;
pub use validate::TableNameValidator;

use crate::error::KvResult;
use std::fmt;

/// Logical operations a generator can produce SQL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the value stored under a key
    Get,
    /// Delete a key
    Del,
    /// Insert a new key (fails if it exists)
    Add,
    /// Insert or overwrite a key
    Set,
    /// Create a bucket table
    AddBucket,
    /// Drop a bucket table
    DelBucket,
    /// Every key of a bucket, in key order
    List,
    /// Create an append-only log table
    AddLog,
    /// Append to a log table
    InsertLog,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Get,
        Operation::Del,
        Operation::Add,
        Operation::Set,
        Operation::AddBucket,
        Operation::DelBucket,
        Operation::List,
        Operation::AddLog,
        Operation::InsertLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Del => "del",
            Operation::Add => "add",
            Operation::Set => "set",
            Operation::AddBucket => "add_bucket",
            Operation::DelBucket => "del_bucket",
            Operation::List => "list",
            Operation::AddLog => "add_log",
            Operation::InsertLog => "insert_log",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-specific SQL text producer.
///
/// Implementors provide [`write_query`](Self::write_query); the per-operation
/// methods are conveniences over it. Implementations must validate the bucket
/// name before substituting it anywhere.
pub trait QueryGenerator: Send + Sync {
    /// Appends the query text for `op` on `bucket` to `buf`.
    ///
    /// On error `buf` may hold a partial query; callers clear it before reuse.
    fn write_query(&self, op: Operation, bucket: &str, buf: &mut String) -> KvResult<()>;

    /// Query text for `op` on `bucket` in a fresh string.
    fn generate(&self, op: Operation, bucket: &str) -> KvResult<String> {
        let mut buf = String::new();
        self.write_query(op, bucket, &mut buf)?;
        Ok(buf)
    }

    fn get(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::Get, bucket)
    }

    fn del(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::Del, bucket)
    }

    fn add(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::Add, bucket)
    }

    fn set(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::Set, bucket)
    }

    fn add_bucket(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::AddBucket, bucket)
    }

    fn del_bucket(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::DelBucket, bucket)
    }

    fn list(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::List, bucket)
    }

    fn add_log(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::AddLog, bucket)
    }

    fn insert_log(&self, bucket: &str) -> KvResult<String> {
        self.generate(Operation::InsertLog, bucket)
    }
}

impl<G: QueryGenerator + ?Sized> QueryGenerator for &G {
    fn write_query(&self, op: Operation, bucket: &str, buf: &mut String) -> KvResult<()> {
        (**self).write_query(op, bucket, buf)
    }
}

impl<G: QueryGenerator + ?Sized> QueryGenerator for std::sync::Arc<G> {
    fn write_query(&self, op: Operation, bucket: &str, buf: &mut String) -> KvResult<()> {
        (**self).write_query(op, bucket, buf)
    }
}
