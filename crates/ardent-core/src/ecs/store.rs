// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::entity::EntityId;
use super::query::{CachedQuery, QueryId};
use super::EcsError;
use crate::sync::{read, write};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Type-erased component or resource value.
pub type ComponentData = Arc<dyn Any + Send + Sync>;

/// Owns entities, their components and the global resources.
///
/// Reads never fail: unknown entities, components or resources read as
/// absent. Only attaching a component to an entity that is not alive is an
/// error. Query results are sorted by ascending [`EntityId`].
#[derive(Default)]
pub struct EntityStore {
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    next_id: u64,
    entities: BTreeSet<EntityId>,
    components: HashMap<String, BTreeMap<EntityId, ComponentData>>,
    resources: HashMap<String, ComponentData>,
    queries: Vec<CachedQuery>,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            next_id: 1,
            entities: BTreeSet::new(),
            components: HashMap::new(),
            resources: HashMap::new(),
            queries: Vec::new(),
        }
    }
}

impl StoreInner {
    fn has_all(&self, entity: EntityId, names: &[String]) -> bool {
        names.iter().all(|name| {
            self.components
                .get(name)
                .is_some_and(|storage| storage.contains_key(&entity))
        })
    }

    /// Re-evaluates every cached query watching `name` for `entity`.
    fn refresh_membership(&mut self, entity: EntityId, name: &str) {
        let mut queries = std::mem::take(&mut self.queries);
        for query in queries.iter_mut().filter(|q| q.watches(name)) {
            if self.entities.contains(&entity) && self.has_all(entity, &query.names) {
                query.members.insert(entity);
            } else {
                query.members.remove(&entity);
            }
        }
        self.queries = queries;
    }

    fn evaluate(&self, names: &[String]) -> BTreeSet<EntityId> {
        self.entities
            .iter()
            .copied()
            .filter(|entity| self.has_all(*entity, names))
            .collect()
    }
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity with no components.
    pub fn create_entity(&self) -> EntityId {
        let mut inner = write(&self.inner);
        let id = EntityId(inner.next_id);
        inner.next_id += 1;
        inner.entities.insert(id);
        for query in inner.queries.iter_mut().filter(|q| q.matches_all()) {
            query.members.insert(id);
        }
        log::trace!("Created {id}");
        id
    }

    /// Destroys `entity` along with all of its components.
    ///
    /// Unknown or already destroyed entities are ignored.
    pub fn destroy_entity(&self, entity: EntityId) {
        let mut inner = write(&self.inner);
        if !inner.entities.remove(&entity) {
            return;
        }
        for storage in inner.components.values_mut() {
            storage.remove(&entity);
        }
        for query in inner.queries.iter_mut() {
            query.members.remove(&entity);
        }
        log::trace!("Destroyed {entity}");
    }

    /// Returns `true` if `entity` was created and not yet destroyed.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        read(&self.inner).entities.contains(&entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        read(&self.inner).entities.len()
    }

    /// Attaches `data` under `name`, replacing any previous value.
    pub fn set_component<T: Any + Send + Sync>(
        &self,
        entity: EntityId,
        name: &str,
        data: T,
    ) -> Result<(), EcsError> {
        self.set_component_data(entity, name, Arc::new(data))
    }

    /// Attaches an already type-erased value under `name`.
    pub fn set_component_data(
        &self,
        entity: EntityId,
        name: &str,
        data: ComponentData,
    ) -> Result<(), EcsError> {
        let mut inner = write(&self.inner);
        if !inner.entities.contains(&entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        let newly_attached = inner
            .components
            .entry(name.to_string())
            .or_default()
            .insert(entity, data)
            .is_none();
        if newly_attached {
            inner.refresh_membership(entity, name);
        }
        Ok(())
    }

    /// Returns the component `name` of `entity` if it exists and is a `T`.
    pub fn get_component<T: Any + Send + Sync>(
        &self,
        entity: EntityId,
        name: &str,
    ) -> Option<Arc<T>> {
        self.get_component_data(entity, name)
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// Returns the type-erased component `name` of `entity`.
    pub fn get_component_data(&self, entity: EntityId, name: &str) -> Option<ComponentData> {
        read(&self.inner)
            .components
            .get(name)
            .and_then(|storage| storage.get(&entity))
            .cloned()
    }

    /// Returns `true` if `entity` has a component named `name`.
    pub fn has_component(&self, entity: EntityId, name: &str) -> bool {
        read(&self.inner)
            .components
            .get(name)
            .is_some_and(|storage| storage.contains_key(&entity))
    }

    /// Detaches component `name` from `entity`. Absent components are ignored.
    pub fn remove_component(&self, entity: EntityId, name: &str) {
        let mut inner = write(&self.inner);
        let removed = inner
            .components
            .get_mut(name)
            .and_then(|storage| storage.remove(&entity))
            .is_some();
        if removed {
            inner.refresh_membership(entity, name);
        }
    }

    /// Every `(entity, value)` pair of component `name` whose value is a `T`.
    pub fn get_all_components<T: Any + Send + Sync>(&self, name: &str) -> Vec<(EntityId, Arc<T>)> {
        let inner = read(&self.inner);
        let Some(storage) = inner.components.get(name) else {
            return Vec::new();
        };
        storage
            .iter()
            .filter_map(|(entity, data)| {
                Arc::clone(data)
                    .downcast::<T>()
                    .ok()
                    .map(|value| (*entity, value))
            })
            .collect()
    }

    /// Stores a global resource, replacing any previous value.
    pub fn set_resource<T: Any + Send + Sync>(&self, name: &str, value: T) {
        self.set_resource_data(name, Arc::new(value));
    }

    /// Stores a resource that is already behind an `Arc`.
    pub fn set_resource_arc<T: Any + Send + Sync>(&self, name: &str, value: Arc<T>) {
        self.set_resource_data(name, value);
    }

    /// Stores an already type-erased resource.
    pub fn set_resource_data(&self, name: &str, value: ComponentData) {
        write(&self.inner).resources.insert(name.to_string(), value);
    }

    /// Returns the resource `name` if it exists and is a `T`.
    pub fn get_resource<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get_resource_data(name)
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// Returns the type-erased resource `name`.
    pub fn get_resource_data(&self, name: &str) -> Option<ComponentData> {
        read(&self.inner).resources.get(name).cloned()
    }

    /// Returns `true` if a resource named `name` exists.
    pub fn has_resource(&self, name: &str) -> bool {
        read(&self.inner).resources.contains_key(name)
    }

    /// Removes resource `name`, returning whether it existed.
    pub fn remove_resource(&self, name: &str) -> bool {
        write(&self.inner).resources.remove(name).is_some()
    }

    /// Entities that carry every component in `names`.
    ///
    /// An empty list matches every live entity.
    pub fn query(&self, names: &[&str]) -> Vec<EntityId> {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        read(&self.inner).evaluate(&names).into_iter().collect()
    }

    /// Registers a query whose result set is kept up to date as components
    /// are attached and removed.
    pub fn register_query(&self, names: &[&str]) -> QueryId {
        let mut inner = write(&self.inner);
        let mut query = CachedQuery::new(names);
        query.members = inner.evaluate(&query.names);
        let id = QueryId(inner.queries.len());
        inner.queries.push(query);
        id
    }

    /// Current members of a registered query. Unknown ids yield nothing.
    pub fn cached_query(&self, id: QueryId) -> Vec<EntityId> {
        read(&self.inner)
            .queries
            .get(id.0)
            .map(|query| query.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Removes every entity, component and resource and restarts id
    /// allocation at 1. Registered queries survive with no members.
    pub fn clear(&self) {
        let mut inner = write(&self.inner);
        let queries = std::mem::take(&mut inner.queries);
        *inner = StoreInner {
            queries,
            ..StoreInner::default()
        };
        for query in inner.queries.iter_mut() {
            query.members.clear();
        }
        log::debug!("Entity store cleared");
    }
}
