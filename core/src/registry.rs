//! Per-type map registry.
//!
//! A [`Registry`] caches one [`Map`] per entity type, built on first use
//! with the registry's configuration. It is an ordinary value: share it
//! behind an `Arc` (or a `static` of the application's choosing) for
//! process-wide caching.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::MapperConfiguration;
use crate::descriptor::Entity;
use crate::map::{AnyMap, Map};

struct Entry {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn AnyMap>,
}

impl Entry {
    fn new<T: Entity>(map: Arc<Map<T>>) -> Self {
        Self {
            typed: map.clone(),
            erased: map,
        }
    }

    fn typed<T: Entity>(&self) -> Option<Arc<Map<T>>> {
        self.typed.clone().downcast::<Map<T>>().ok()
    }
}

/// Thread-safe cache of maps keyed by entity type.
///
/// Concurrent first access may build a map more than once; the first map
/// inserted wins and every caller receives it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tablemap_core::{Entity, MapperConfiguration, NameConvention, Registry};
///
/// #[derive(Default, Entity)]
/// struct AuditEntry {
///     id: i64,
/// }
///
/// let registry = Registry::new(
///     MapperConfiguration::new().with_table_convention(NameConvention::SplitCaseLower),
/// );
/// let first = registry.map::<AuditEntry>();
/// let second = registry.map::<AuditEntry>();
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.table_name(), "audit_entry");
/// ```
#[derive(Default)]
pub struct Registry {
    configuration: MapperConfiguration,
    maps: RwLock<HashMap<TypeId, Entry>>,
}

impl Registry {
    pub fn new(configuration: MapperConfiguration) -> Self {
        Self {
            configuration,
            maps: RwLock::new(HashMap::new()),
        }
    }

    /// Configuration used for maps built by this registry.
    pub fn configuration(&self) -> &MapperConfiguration {
        &self.configuration
    }

    /// Returns the map for `T`, building it if absent.
    pub fn map<T: Entity>(&self) -> Arc<Map<T>> {
        if let Some(map) = self.get::<T>() {
            return map;
        }

        let built = Arc::new(Map::<T>::with_configuration(&self.configuration));
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        let entry = maps.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!(entity = built.type_name(), "Registered map");
            Entry::new(built.clone())
        });
        entry.typed::<T>().unwrap_or(built)
    }

    /// Returns the map for `T` without building it.
    pub fn get<T: Entity>(&self) -> Option<Arc<Map<T>>> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&TypeId::of::<T>()).and_then(Entry::typed::<T>)
    }

    /// Returns the type-erased map for a type id, if registered.
    pub fn get_any(&self, type_id: TypeId) -> Option<Arc<dyn AnyMap>> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&type_id).map(|entry| entry.erased.clone())
    }

    /// Installs a map for `T`, replacing any existing one.
    pub fn set_map<T: Entity>(&self, map: Map<T>) -> Arc<Map<T>> {
        let map = Arc::new(map);
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = maps
            .insert(TypeId::of::<T>(), Entry::new(map.clone()))
            .is_some();
        debug!(entity = map.type_name(), replaced, "Set map");
        map
    }

    /// Builds the map for `T` ahead of first use. Returns `true` if this
    /// call built it.
    pub fn pre_map<T: Entity>(&self) -> bool {
        if self.contains::<T>() {
            return false;
        }
        let built = Arc::new(Map::<T>::with_configuration(&self.configuration));
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        match maps.entry(TypeId::of::<T>()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                debug!(entity = built.type_name(), "Pre-mapped");
                slot.insert(Entry::new(built));
                true
            }
        }
    }

    pub fn contains<T: Entity>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    pub fn contains_type(&self, type_id: TypeId) -> bool {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached map.
    pub fn clear(&self) {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        debug!(maps = maps.len(), "Clearing registry");
        maps.clear();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("configuration", &self.configuration)
            .field("maps", &self.len())
            .finish()
    }
}
