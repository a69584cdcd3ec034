//! The mutable, ordered route set - single source of truth for matching.

use super::types::{RequestMethod, Route, RouteConfig, RouteId, RoutePatch, StoreError};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Lock-protected, insertion-ordered set of mock routes.
///
/// Insertion order is significant: it is the matcher's tie-break, so routes
/// keep their position across edits and only `remove` changes positions of
/// later entries. Every successful mutation bumps the version counter so
/// matching pipelines can detect stale snapshots.
pub struct RouteStore {
    routes: RwLock<Vec<Route>>,
    version: AtomicU64,
}

impl RouteStore {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
            version: AtomicU64::new(0),
        }
    }

    /// Validate and append a route, returning its freshly assigned id.
    pub fn add(&self, config: RouteConfig) -> Result<RouteId, StoreError> {
        config.validate()?;
        let id = RouteId::fresh();
        {
            let mut routes = self.routes.write();
            routes.push(Route::from_config(id, config));
        }
        self.bump_version();
        debug!(route = %id, "route added");
        Ok(id)
    }

    /// Validate and append several routes as one atomic insertion: either
    /// all land (in the given order) or none do.
    pub fn extend(&self, configs: Vec<RouteConfig>) -> Result<Vec<RouteId>, StoreError> {
        for config in &configs {
            config.validate()?;
        }
        let ids: Vec<RouteId> = configs.iter().map(|_| RouteId::fresh()).collect();
        {
            let mut routes = self.routes.write();
            for (id, config) in ids.iter().zip(configs) {
                routes.push(Route::from_config(*id, config));
            }
        }
        self.bump_version();
        debug!(count = ids.len(), "routes added in bulk");
        Ok(ids)
    }

    /// Apply a partial edit in place. The route keeps its position in the
    /// ordered sequence; the merged result is re-validated first.
    pub fn update(&self, id: RouteId, patch: RoutePatch) -> Result<(), StoreError> {
        let mut routes = self.routes.write();
        let route = routes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut merged = route.clone();
        patch.apply_to(&mut merged);
        merged.to_config().validate()?;

        *route = merged;
        drop(routes);
        self.bump_version();
        debug!(route = %id, "route updated");
        Ok(())
    }

    /// Remove a route. Ledger entries that referenced it are untouched;
    /// their `route_id` becomes a dangling lookup by design.
    pub fn remove(&self, id: RouteId) -> Result<(), StoreError> {
        {
            let mut routes = self.routes.write();
            let position = routes
                .iter()
                .position(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            routes.remove(position);
        }
        self.bump_version();
        debug!(route = %id, "route removed");
        Ok(())
    }

    /// Flip the enabled flag without touching the rest of the route.
    pub fn set_enabled(&self, id: RouteId, enabled: bool) -> Result<(), StoreError> {
        self.update(
            id,
            RoutePatch {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
    }

    pub fn get(&self, id: RouteId) -> Option<Route> {
        self.routes.read().iter().find(|r| r.id == id).cloned()
    }

    /// Snapshot of the full ordered sequence. Matching operates on this
    /// clone, never on live references into the store.
    pub fn list(&self) -> Vec<Route> {
        self.routes.read().clone()
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Groups of routes sharing the same method + url, in insertion order.
    /// Duplicates are legal (the tie-break resolves them) but worth
    /// surfacing so shadowed rules can be flagged to the user.
    pub fn duplicates(&self) -> Vec<Vec<RouteId>> {
        let routes = self.routes.read();
        let mut groups: Vec<Vec<RouteId>> = Vec::new();
        let mut by_key: HashMap<(RequestMethod, String), usize> = HashMap::new();

        for route in routes.iter() {
            let key = (route.request_method, route.request_url.clone());
            match by_key.entry(key) {
                Entry::Occupied(slot) => groups[*slot.get()].push(route.id),
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push(vec![route.id]);
                }
            }
        }

        groups.into_iter().filter(|ids| ids.len() > 1).collect()
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for RouteStore {
    fn default() -> Self {
        Self::new()
    }
}
