//! # SQLKV: key-value buckets on SQL backends
//!
//! Byte-string keys and values grouped into named buckets, where each bucket
//! is one table in a pluggable SQL backend. Backends plug in by registering a
//! [`QueryGenerator`](query::QueryGenerator) under their driver name; the
//! store then only talks to the narrow collaborator traits in [`sql`].
//!
//! ## Quick start
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> sqlkv_core::KvResult<()> {
//! use sqlkv_core::{Context, KvStore, Pair};
//!
//! let store = KvStore::open_in_memory()?;
//! let ctx = Context::background();
//!
//! store.add_bucket(&ctx, "users")?;
//! store.set_many(&ctx, "users", &[Pair::new("u1", "Alice"), Pair::new("u2", "Bob")])?;
//!
//! assert_eq!(store.get(&ctx, "users", b"u1")?, Some(b"Alice".to_vec()));
//! assert_eq!(store.list(&ctx, "users")?.len(), 2);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```
//!
//! ## Modules
//!
//! - [`iter`]: pull-based iterator helpers (channels, flatten into a bounded channel)
//! - [`option`]: `Option` accessors
//! - [`query`]: query generators, table-name validation, driver registry
//! - [`ops`]: primitive operations, non-atomic writers, batch upsert, transactional writer
//! - [`sql`]: collaborator traits a backend implements
//! - [`backend`]: bundled backends (`sqlite` driver, `postgres` templates)
//! - [`store`]: the [`KvStore`] facade

pub mod backend;
pub mod buffer_pool;
pub mod config;
pub mod context;
pub mod error;
pub mod iter;
pub mod model;
pub mod ops;
pub mod option;
pub mod query;
pub mod sql;
pub mod store;

// Logging utilities
pub mod logging;

pub use buffer_pool::{PooledString, StringPool};
pub use config::StoreConfig;
pub use context::Context;
pub use error::{KvError, KvResult, bool_to_error};
pub use model::{Batch, Pair};
pub use option::OptionExt;
pub use query::{QueryGenerator, QueryGeneratorRegistry};
pub use store::KvStore;

#[cfg(feature = "sqlite")]
pub use backend::sqlite::SqliteDb;
