//! Query generator registry
//!
//! Maps a driver name ("postgres", "sqlite", ...) to its [`QueryGenerator`].
//! Registration is first-writer-wins: a second registration under a taken
//! name is ignored and reported through the return value and a `warn` event.
//! Lookups take a shared lock, so concurrent operations never serialize on
//! the registry.

use super::{Operation, QueryGenerator};
use crate::backend;
use crate::error::{KvError, KvResult};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

static GLOBAL: LazyLock<QueryGeneratorRegistry> = LazyLock::new(QueryGeneratorRegistry::with_builtin);

/// Driver name → generator map.
pub struct QueryGeneratorRegistry {
    generators: RwLock<AHashMap<String, Arc<dyn QueryGenerator>>>,
}

impl QueryGeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            generators: RwLock::new(AHashMap::new()),
        }
    }

    /// A registry holding the bundled backends (`postgres`, `sqlite`).
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        backend::register_builtin(&registry);
        registry
    }

    /// Process-wide registry, built with [`with_builtin`](Self::with_builtin)
    /// on first use and never torn down.
    pub fn global() -> &'static QueryGeneratorRegistry {
        &GLOBAL
    }

    /// Registers `generator` under `driver`.
    ///
    /// `None` is ignored. If `driver` is already taken the existing generator
    /// stays active. Returns `true` only when `generator` was installed.
    pub fn register(&self, driver: &str, generator: Option<Arc<dyn QueryGenerator>>) -> bool {
        let Some(generator) = generator else {
            return false;
        };

        let mut generators = self.generators.write();
        if generators.contains_key(driver) {
            warn!(driver, "query generator already registered, keeping the first one");
            return false;
        }

        generators.insert(driver.to_string(), generator);
        info!(driver, "query generator registered");
        true
    }

    /// Generator registered under `driver`.
    pub fn lookup(&self, driver: &str) -> KvResult<Arc<dyn QueryGenerator>> {
        self.generators
            .read()
            .get(driver)
            .cloned()
            .ok_or_else(|| KvError::GeneratorNotFound(driver.to_string()))
    }

    /// Like [`lookup`](Self::lookup), but never fails: an unknown driver gets
    /// an [`EmptyQueryGenerator`] whose every query errors on first use.
    pub fn lookup_or_empty(&self, driver: &str) -> Arc<dyn QueryGenerator> {
        self.lookup(driver)
            .unwrap_or_else(|_| Arc::new(EmptyQueryGenerator::new(driver)) as Arc<dyn QueryGenerator>)
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.generators.read().contains_key(driver)
    }

    /// Registered driver names, sorted.
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generators.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for QueryGeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers `generator` in the global registry.
pub fn register_query_generator(driver: &str, generator: Option<Arc<dyn QueryGenerator>>) -> bool {
    QueryGeneratorRegistry::global().register(driver, generator)
}

/// Looks `driver` up in the global registry, falling back to the empty generator.
pub fn lookup_or_empty(driver: &str) -> Arc<dyn QueryGenerator> {
    QueryGeneratorRegistry::global().lookup_or_empty(driver)
}

/// Stand-in for an unregistered driver: every operation fails with
/// [`KvError::GeneratorNotFound`].
#[derive(Debug, Clone)]
pub struct EmptyQueryGenerator {
    driver: String,
}

impl EmptyQueryGenerator {
    pub fn new(driver: impl Into<String>) -> Self {
        Self { driver: driver.into() }
    }
}

impl QueryGenerator for EmptyQueryGenerator {
    fn write_query(&self, _op: Operation, _bucket: &str, _buf: &mut String) -> KvResult<()> {
        Err(KvError::GeneratorNotFound(self.driver.clone()))
    }
}
