//! Surrogate IDs for objects passed by reference.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::observability::metrics;

/// Surrogate identifier handed to remote peers.
pub type ObjectId = u64;

/// Dead entries are swept once the map grows past this many entries.
const MIN_SWEEP_THRESHOLD: usize = 64;

struct Entry<T: ?Sized> {
    id: ObjectId,
    object: Weak<T>,
}

struct RegistryState<T: ?Sized> {
    /// Allocation address → entry.
    by_address: HashMap<usize, Entry<T>>,
    /// Reverse index for resolving incoming IDs.
    by_id: HashMap<ObjectId, usize>,
    /// Last issued ID; 0 means none yet.
    counter: ObjectId,
    sweep_at: usize,
}

impl<T: ?Sized> RegistryState<T> {
    fn sweep(&mut self) -> usize {
        let before = self.by_address.len();
        let by_id = &mut self.by_id;
        self.by_address.retain(|_, entry| {
            let alive = entry.object.strong_count() > 0;
            if !alive {
                by_id.remove(&entry.id);
            }
            alive
        });
        self.sweep_at = (self.by_address.len() * 2).max(MIN_SWEEP_THRESHOLD);
        before - self.by_address.len()
    }
}

/// Maps object identity to a stable, never reused surrogate ID.
///
/// Objects are registered through their `Arc`, and only a `Weak` is kept,
/// so registration never extends an object's lifetime. While an entry
/// exists its `Weak` pins the allocation, so the address key cannot be
/// reused by another object until the entry is swept.
///
/// Safe to share across connections: lookup and assignment happen in one
/// critical section.
pub struct ObjectIdRegistry<T: ?Sized> {
    state: Mutex<RegistryState<T>>,
}

impl<T: ?Sized> ObjectIdRegistry<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                by_address: HashMap::new(),
                by_id: HashMap::new(),
                counter: 0,
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<T>> {
        // Every critical section leaves the maps consistent, so a panic
        // elsewhere cannot have left them half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn address_of(object: &Arc<T>) -> usize {
        Arc::as_ptr(object).cast::<()>() as usize
    }

    /// Return the ID already assigned to `object`, or assign the next one.
    ///
    /// IDs start at 1 and increase by one per newly registered object.
    pub fn get_or_assign(&self, object: &Arc<T>) -> ObjectId {
        let address = Self::address_of(object);
        let mut state = self.lock();

        if let Some(entry) = state.by_address.get(&address) {
            return entry.id;
        }

        if state.by_address.len() >= state.sweep_at {
            let removed = state.sweep();
            tracing::trace!(removed, live = state.by_address.len(), "Swept object registry");
        }

        state.counter += 1;
        let id = state.counter;
        state.by_address.insert(
            address,
            Entry {
                id,
                object: Arc::downgrade(object),
            },
        );
        state.by_id.insert(id, address);
        metrics::record_object_registered();
        id
    }

    /// ID previously assigned to `object`, without assigning one.
    pub fn id_of(&self, object: &Arc<T>) -> Option<ObjectId> {
        let address = Self::address_of(object);
        self.lock().by_address.get(&address).map(|entry| entry.id)
    }

    /// Object registered under `id`, if it is still alive.
    pub fn resolve(&self, id: ObjectId) -> Option<Arc<T>> {
        let state = self.lock();
        let address = state.by_id.get(&id)?;
        state.by_address.get(address)?.object.upgrade()
    }

    /// Drop entries whose objects are gone. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.lock().sweep()
    }

    /// Number of registered objects that are still alive.
    pub fn len(&self) -> usize {
        self.lock()
            .by_address
            .values()
            .filter(|entry| entry.object.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recently issued ID, 0 if none.
    pub fn last_issued(&self) -> ObjectId {
        self.lock().counter
    }
}

impl<T: ?Sized> Default for ObjectIdRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ObjectIdRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ObjectIdRegistry")
            .field("entries", &state.by_address.len())
            .field("last_issued", &state.counter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Handle(u32);

    #[test]
    fn same_object_same_id() {
        let registry = ObjectIdRegistry::new();
        let a = Arc::new(Handle(1));
        let id = registry.get_or_assign(&a);
        assert_eq!(id, 1);
        assert_eq!(registry.get_or_assign(&a), 1);
        assert_eq!(registry.get_or_assign(&Arc::clone(&a)), 1);
        assert_eq!(registry.id_of(&a), Some(1));
    }

    #[test]
    fn equal_values_get_distinct_ids() {
        let registry = ObjectIdRegistry::new();
        let a = Arc::new(Handle(7));
        let b = Arc::new(Handle(7));
        assert_eq!(a, b);

        let id_a = registry.get_or_assign(&a);
        let id_b = registry.get_or_assign(&b);
        assert_eq!((id_a, id_b), (1, 2));
        assert_eq!(registry.last_issued(), 2);
    }

    #[test]
    fn registry_does_not_keep_objects_alive() {
        let registry = ObjectIdRegistry::new();
        let a = Arc::new(Handle(1));
        let id = registry.get_or_assign(&a);
        assert_eq!(Arc::strong_count(&a), 1);
        assert_eq!(registry.resolve(id), Some(Arc::clone(&a)));

        drop(a);
        assert!(registry.resolve(id).is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.sweep(), 0);
    }

    #[test]
    fn ids_are_never_reused() {
        let registry = ObjectIdRegistry::new();
        let first = registry.get_or_assign(&Arc::new(Handle(1)));
        registry.sweep();
        let second = registry.get_or_assign(&Arc::new(Handle(1)));
        assert!(second > first);
    }

    #[test]
    fn dead_entries_swept_on_growth() {
        let registry = ObjectIdRegistry::new();
        for i in 0..(MIN_SWEEP_THRESHOLD as u32 * 4) {
            registry.get_or_assign(&Arc::new(Handle(i)));
        }
        let entries = registry.lock().by_address.len();
        assert!(entries <= MIN_SWEEP_THRESHOLD + 1, "entries = {entries}");
        assert_eq!(registry.last_issued(), MIN_SWEEP_THRESHOLD as u64 * 4);
    }

    #[test]
    fn trait_objects_keyed_by_data_pointer() {
        let registry: ObjectIdRegistry<dyn std::fmt::Debug + Send + Sync> =
            ObjectIdRegistry::new();
        let a: Arc<dyn std::fmt::Debug + Send + Sync> = Arc::new(Handle(3));
        let b: Arc<dyn std::fmt::Debug + Send + Sync> = Arc::new(Handle(3));
        assert_eq!(registry.get_or_assign(&a), 1);
        assert_eq!(registry.get_or_assign(&b), 2);
        assert_eq!(registry.get_or_assign(&a), 1);
    }
}
