//! Exhibit stores: lookup of exhibits by entity name and id.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::Exhibit;
use crate::frame::Frame;

/// Identifies one exhibit: the entity it describes and that entity's id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExhibitId {
    pub entity: String,
    pub id: String,
}

impl ExhibitId {
    pub fn new(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Build an id from any displayable value, e.g. a [`crate::Value`] read from a frame.
    pub fn create(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::new(entity, id.to_string())
    }
}

impl fmt::Display for ExhibitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.id)
    }
}

/// A source of exhibits keyed by [`ExhibitId`].
pub trait ExhibitStore: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Names of the entities this store can answer for.
    fn entities(&self) -> BTreeSet<String>;

    /// `Ok(None)` means the entity is served here but has no exhibit with this id.
    fn find(&self, id: &ExhibitId) -> ExhibitResult<Option<Exhibit>>;
}

/// In-memory store for a single entity.
#[derive(Clone, Debug)]
pub struct SimpleExhibitStore {
    entity: String,
    exhibits: HashMap<String, Exhibit>,
}

impl SimpleExhibitStore {
    pub fn new(entity: impl Into<String>, exhibits: HashMap<String, Exhibit>) -> Self {
        Self {
            entity: entity.into(),
            exhibits,
        }
    }
}

impl ExhibitStore for SimpleExhibitStore {
    fn is_connected(&self) -> bool {
        true
    }

    fn entities(&self) -> BTreeSet<String> {
        BTreeSet::from([self.entity.clone()])
    }

    fn find(&self, id: &ExhibitId) -> ExhibitResult<Option<Exhibit>> {
        if id.entity != self.entity {
            return Ok(None);
        }
        Ok(self.exhibits.get(&id.id).cloned())
    }
}

/// Routes lookups to one of several stores by entity name.
///
/// When two stores claim the same entity, the one registered later wins. Connectivity is checked
/// against every registered store, including those left without an entity to serve.
#[derive(Clone, Default)]
pub struct MultiExhibitStore {
    children: Vec<Arc<dyn ExhibitStore>>,
    stores: BTreeMap<String, Arc<dyn ExhibitStore>>,
}

impl MultiExhibitStore {
    pub fn create(stores: Vec<Arc<dyn ExhibitStore>>) -> Self {
        let mut routes: BTreeMap<String, Arc<dyn ExhibitStore>> = BTreeMap::new();
        for store in &stores {
            for entity in store.entities() {
                if routes.insert(entity.clone(), Arc::clone(store)).is_some() {
                    log::warn!("entity {entity} claimed by more than one store; using the last one");
                }
            }
        }
        Self {
            children: stores,
            stores: routes,
        }
    }
}

impl fmt::Debug for MultiExhibitStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiExhibitStore")
            .field("children", &self.children.len())
            .field("entities", &self.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExhibitStore for MultiExhibitStore {
    fn is_connected(&self) -> bool {
        self.children.iter().all(|store| store.is_connected())
    }

    fn entities(&self) -> BTreeSet<String> {
        self.stores.keys().cloned().collect()
    }

    fn find(&self, id: &ExhibitId) -> ExhibitResult<Option<Exhibit>> {
        let store = self
            .stores
            .get(&id.entity)
            .ok_or_else(|| ExhibitError::UnknownEntity(id.entity.clone()))?;
        store.find(id)
    }
}

/// Collects the ids of neighboring exhibits referenced by a frame's columns.
#[derive(Clone, Debug, Default)]
pub struct NeighborLookup {
    column_to_entity: BTreeMap<String, String>,
}

impl NeighborLookup {
    pub fn new(column_to_entity: BTreeMap<String, String>) -> Self {
        Self { column_to_entity }
    }

    /// Map the values of `column` to ids of `entity`.
    pub fn with_column(mut self, column: impl Into<String>, entity: impl Into<String>) -> Self {
        self.column_to_entity.insert(column.into(), entity.into());
        self
    }

    /// Every id referenced by the mapped columns of `frame`. Null cells reference nothing.
    pub fn lookup_ids(&self, frame: &dyn Frame) -> ExhibitResult<BTreeSet<ExhibitId>> {
        let mut ids = BTreeSet::new();
        for (column, entity) in &self.column_to_entity {
            let column = frame.column(column)?;
            ids.extend(
                column
                    .iter()
                    .filter(|value| !value.is_null())
                    .map(|value| ExhibitId::create(entity.as_str(), value)),
            );
        }
        Ok(ids)
    }
}
