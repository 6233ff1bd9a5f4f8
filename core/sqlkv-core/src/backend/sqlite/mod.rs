//! SQLite backend
//!
//! Query templates are always available. The driver ([`SqliteDb`]) needs the
//! `sqlite` feature.
//!
//! Bucket tables refuse empty keys through a `CHECK` constraint, so a write
//! with an empty key fails in the backend rather than in the write path.

#[cfg(feature = "sqlite")]
mod driver;

#[cfg(feature = "sqlite")]
pub use driver::{SqliteConnection, SqliteDb, SqliteTx};

use crate::query::{Operation, TableNameValidator, TemplateQueryGenerator};

pub const DRIVER: &str = "sqlite";

const GET: &str = "SELECT val FROM {table} WHERE key = ?1 LIMIT 1";

const LIST: &str = "SELECT key FROM {table} ORDER BY key";

const DEL: &str = "DELETE FROM {table} WHERE key = ?1";

const ADD: &str = "INSERT INTO {table}(key, val) VALUES (?1, ?2)";

const SET: &str = "INSERT INTO {table}(key, val) VALUES (?1, ?2) \
    ON CONFLICT(key) DO UPDATE SET val = excluded.val \
    WHERE {table}.val <> excluded.val";

const ADD_BUCKET: &str = "CREATE TABLE IF NOT EXISTS {table}(\
    key BLOB NOT NULL PRIMARY KEY CHECK(length(key) > 0), \
    val BLOB NOT NULL)";

const DEL_BUCKET: &str = "DROP TABLE IF EXISTS {table}";

const ADD_LOG: &str = "CREATE TABLE IF NOT EXISTS {table}(\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    lg BLOB NOT NULL)";

const INSERT_LOG: &str = "INSERT INTO {table}(lg) VALUES (?1)";

/// Generator for the `sqlite` driver.
pub fn query_generator() -> TemplateQueryGenerator {
    TemplateQueryGenerator::new(DRIVER, TableNameValidator::SQLITE)
        .with_template(Operation::Get, GET)
        .with_template(Operation::List, LIST)
        .with_template(Operation::Del, DEL)
        .with_template(Operation::Add, ADD)
        .with_template(Operation::Set, SET)
        .with_template(Operation::AddBucket, ADD_BUCKET)
        .with_template(Operation::DelBucket, DEL_BUCKET)
        .with_template(Operation::AddLog, ADD_LOG)
        .with_template(Operation::InsertLog, INSERT_LOG)
}
