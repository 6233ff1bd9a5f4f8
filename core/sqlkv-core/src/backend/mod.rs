//! Bundled backends
//!
//! Each backend contributes a query generator under its driver name. Only
//! SQLite also ships a driver (behind the `sqlite` feature); Postgres users
//! bring their own collaborator and reuse the generator.

pub mod postgres;
pub mod sqlite;

use crate::query::{QueryGenerator, QueryGeneratorRegistry};
use std::sync::Arc;

/// Registers every bundled generator in `registry`.
pub fn register_builtin(registry: &QueryGeneratorRegistry) {
    let pg: Arc<dyn QueryGenerator> = Arc::new(postgres::query_generator());
    let lite: Arc<dyn QueryGenerator> = Arc::new(sqlite::query_generator());
    registry.register(postgres::DRIVER, Some(pg));
    registry.register(sqlite::DRIVER, Some(lite));
}
