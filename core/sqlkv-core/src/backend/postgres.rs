//! Postgres query templates
//!
//! Buckets are `key BYTEA` / `val BYTEA` tables with a primary-key constraint
//! named `<bucket>_pkc`, which the upsert targets.

use crate::query::{Operation, TableNameValidator, TemplateQueryGenerator};

pub const DRIVER: &str = "postgres";

const GET: &str = "
    SELECT val FROM {table}
    WHERE key=$1
    LIMIT 1";

const LIST: &str = "
    SELECT key FROM {table}
    ORDER BY key";

const DEL: &str = "
    DELETE FROM {table}
    WHERE key=$1";

const ADD: &str = "
    INSERT INTO {table}(key, val)
    VALUES ($1, $2)";

const SET: &str = "
    INSERT INTO {table} AS alias_insert (key, val)
    VALUES ($1, $2)
    ON CONFLICT ON CONSTRAINT {table}_pkc
    DO UPDATE SET val=EXCLUDED.val
    WHERE alias_insert.val <> EXCLUDED.val";

const ADD_BUCKET: &str = "
    CREATE TABLE IF NOT EXISTS {table}(
      key BYTEA,
      val BYTEA NOT NULL,
      CONSTRAINT {table}_pkc PRIMARY KEY(key)
    )";

const DEL_BUCKET: &str = "
    DROP TABLE IF EXISTS {table}";

const ADD_LOG: &str = "
    CREATE TABLE IF NOT EXISTS {table}(
      id BIGSERIAL,
      lg BYTEA,
      CONSTRAINT {table}_pkc PRIMARY KEY(id)
    )";

const INSERT_LOG: &str = "
    INSERT INTO {table}(lg)
    VALUES ($1)";

/// Generator for the `postgres` driver.
pub fn query_generator() -> TemplateQueryGenerator {
    TemplateQueryGenerator::new(DRIVER, TableNameValidator::POSTGRES)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use crate::query::QueryGenerator;

    #[test]
    fn every_operation_has_a_template() {
        let g = query_generator();
        for op in Operation::ALL {
            assert!(g.supports(op), "missing template for {op}");
            assert!(g.generate(op, "users").is_ok());
        }
    }

    #[test]
    fn upsert_targets_constraint() {
        let q = query_generator().set("users").unwrap();
        assert!(q.contains("INSERT INTO users AS alias_insert"));
        assert!(q.contains("ON CONFLICT ON CONSTRAINT users_pkc"));
    }

    #[test]
    fn rejects_invalid_table() {
        let err = query_generator().add_bucket("0table").unwrap_err();
        assert!(matches!(err, KvError::InvalidBucketName(_)));
    }
}
