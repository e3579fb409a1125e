//! Format-keyed registry of searcher, resolver and router implementations.
//!
//! A format is only served when all three roles are registered for its key.
//! The process-wide registry is populated with the built-in formats on first
//! access and is read-only once the application is assembled.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use catalog_core::{
    CatalogError, CatalogNode, CatalogSearcher, DatasetResolver, IntakeCatalogSearch,
    IntakeToDataset, ResolverImpl, Result, SearcherImpl, StacCatalogSearch, StacToDataset,
};
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::routers::{CatalogRouter, IntakeRouter, RouterImpl, StacRouter};

/// Builds a searcher for a catalog path.
pub type SearcherFactory = Arc<dyn Fn(&str) -> Box<dyn CatalogSearcher> + Send + Sync>;

/// Builds a resolver bound to one native catalog node.
pub type ResolverFactory =
    Arc<dyn Fn(CatalogNode) -> Result<Arc<dyn DatasetResolver>> + Send + Sync>;

/// The searcher, resolver and router bound to one format key.
#[derive(Clone)]
pub struct CatalogImplementation {
    catalog_type: String,
    searcher: SearcherFactory,
    resolver: ResolverFactory,
    router: Arc<dyn CatalogRouter>,
}

impl CatalogImplementation {
    pub fn catalog_type(&self) -> &str {
        &self.catalog_type
    }

    pub fn catalog_search(&self, catalog_path: &str) -> Box<dyn CatalogSearcher> {
        (self.searcher)(catalog_path)
    }

    pub fn catalog_resolver(&self, catalog: CatalogNode) -> Result<Arc<dyn DatasetResolver>> {
        (self.resolver)(catalog)
    }

    pub fn catalog_router(&self) -> Arc<dyn CatalogRouter> {
        self.router.clone()
    }
}

impl std::fmt::Debug for CatalogImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogImplementation")
            .field("catalog_type", &self.catalog_type)
            .finish_non_exhaustive()
    }
}

/// Per-role registries keyed by lower-case format key.
#[derive(Default)]
pub struct ImplementationRegistry {
    searchers: BTreeMap<String, SearcherFactory>,
    resolvers: BTreeMap<String, ResolverFactory>,
    routers: BTreeMap<String, Arc<dyn CatalogRouter>>,
    memo: OnceCell<BTreeMap<String, CatalogImplementation>>,
}

impl ImplementationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the intake and stac formats.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        registry.register_format::<IntakeCatalogSearch, IntakeToDataset, IntakeRouter>();
        registry.register_format::<StacCatalogSearch, StacToDataset, StacRouter>();
        registry
    }

    pub fn register_searcher<S: SearcherImpl>(&mut self) {
        let factory: SearcherFactory =
            Arc::new(|path: &str| Box::new(S::from_path(path)) as Box<dyn CatalogSearcher>);
        self.insert_role("searcher", S::CATALOG_TYPE, |r, key| {
            r.searchers.insert(key, factory);
        });
    }

    pub fn register_resolver<R: ResolverImpl>(&mut self) {
        let factory: ResolverFactory = Arc::new(|catalog: CatalogNode| {
            R::from_catalog(catalog).map(|r| Arc::new(r) as Arc<dyn DatasetResolver>)
        });
        self.insert_role("resolver", R::CATALOG_TYPE, |r, key| {
            r.resolvers.insert(key, factory);
        });
    }

    pub fn register_router<T: RouterImpl>(&mut self) {
        let router: Arc<dyn CatalogRouter> = Arc::new(T::default());
        self.insert_role("router", T::CATALOG_TYPE, |r, key| {
            r.routers.insert(key, router);
        });
    }

    /// Register all three roles of one format at once.
    pub fn register_format<S, R, T>(&mut self)
    where
        S: SearcherImpl,
        R: ResolverImpl,
        T: RouterImpl,
    {
        self.register_searcher::<S>();
        self.register_resolver::<R>();
        self.register_router::<T>();
    }

    fn insert_role(
        &mut self,
        role: &str,
        catalog_type: &str,
        insert: impl FnOnce(&mut Self, String),
    ) {
        let key = catalog_type.to_lowercase();
        debug!(role = role, catalog_type = %key, "Registered catalog implementation");
        insert(self, key);
        // A new role invalidates the assembled triples.
        self.memo = OnceCell::new();
    }

    /// Every format key that has all three roles, with its implementation.
    ///
    /// Fails when any role registry is empty, or when some key is missing
    /// one of the roles.
    pub fn get_all_implementations(&self) -> Result<&BTreeMap<String, CatalogImplementation>> {
        self.memo.get_or_try_init(|| self.assemble())
    }

    /// Implementation for one format key (case-insensitive).
    pub fn get_catalog_implementation(&self, catalog_type: &str) -> Result<CatalogImplementation> {
        let key = catalog_type.to_lowercase();
        self.get_all_implementations()?
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                CatalogError::not_found(format!("no catalog implementation for '{}'", key))
            })
    }

    fn assemble(&self) -> Result<BTreeMap<String, CatalogImplementation>> {
        if self.searchers.is_empty() || self.resolvers.is_empty() || self.routers.is_empty() {
            return Err(CatalogError::NoImplementations);
        }

        let searcher_keys: BTreeSet<&String> = self.searchers.keys().collect();
        let resolver_keys: BTreeSet<&String> = self.resolvers.keys().collect();
        let router_keys: BTreeSet<&String> = self.routers.keys().collect();

        let union: BTreeSet<&String> = searcher_keys
            .iter()
            .chain(resolver_keys.iter())
            .chain(router_keys.iter())
            .copied()
            .collect();
        let incomplete: Vec<String> = union
            .iter()
            .filter(|k| {
                !(searcher_keys.contains(*k) && resolver_keys.contains(*k) && router_keys.contains(*k))
            })
            .map(|k| {
                let mut missing = Vec::new();
                if !searcher_keys.contains(*k) {
                    missing.push("searcher");
                }
                if !resolver_keys.contains(*k) {
                    missing.push("resolver");
                }
                if !router_keys.contains(*k) {
                    missing.push("router");
                }
                format!("{} (missing {})", k, missing.join(", "))
            })
            .collect();
        if !incomplete.is_empty() {
            return Err(CatalogError::PartialImplementation(format!(
                "every catalog type needs a searcher, resolver and router: {}",
                incomplete.join("; ")
            )));
        }

        Ok(union
            .into_iter()
            .map(|key| {
                let implementation = CatalogImplementation {
                    catalog_type: key.clone(),
                    searcher: self.searchers[key].clone(),
                    resolver: self.resolvers[key].clone(),
                    router: self.routers[key].clone(),
                };
                (key.clone(), implementation)
            })
            .collect())
    }
}

static REGISTRY: Lazy<RwLock<ImplementationRegistry>> =
    Lazy::new(|| RwLock::new(ImplementationRegistry::with_builtin_formats()));

fn read_registry() -> RwLockReadGuard<'static, ImplementationRegistry> {
    REGISTRY.read().unwrap_or_else(|e| e.into_inner())
}

fn write_registry() -> RwLockWriteGuard<'static, ImplementationRegistry> {
    REGISTRY.write().unwrap_or_else(|e| e.into_inner())
}

/// Register a complete format with the process-wide registry.
pub fn register_format<S, R, T>()
where
    S: SearcherImpl,
    R: ResolverImpl,
    T: RouterImpl,
{
    write_registry().register_format::<S, R, T>();
}

/// Snapshot of every complete format in the process-wide registry.
pub fn get_all_implementations() -> Result<BTreeMap<String, CatalogImplementation>> {
    read_registry().get_all_implementations().cloned()
}

pub fn get_catalog_implementation(catalog_type: &str) -> Result<CatalogImplementation> {
    read_registry().get_catalog_implementation(catalog_type)
}
