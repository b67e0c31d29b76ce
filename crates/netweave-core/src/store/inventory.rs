// ── Generic entity inventory ──
//
// Insertion-ordered storage for one record type with O(1) lookups by
// backend id and by display name.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{Entity, EntityId};

/// Records of a single type, indexed by id and by name.
///
/// Records without an id (not yet persisted) are kept in order but are not
/// addressable by id. When several records share a name, the name index
/// points at the first one.
#[derive(Debug, Clone)]
pub struct Inventory<T> {
    items: Vec<T>,
    by_id: IndexMap<EntityId, usize>,
    by_name: IndexMap<String, usize>,
}

impl<T> Default for Inventory<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_id: IndexMap::new(),
            by_name: IndexMap::new(),
        }
    }
}

impl<T: Entity> Inventory<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut inventory = Self::default();
        for item in items {
            inventory.push(item);
        }
        inventory
    }

    /// Append a record. Returns `false` if its id was already present, in
    /// which case the id index keeps pointing at the earlier record.
    pub fn push(&mut self, item: T) -> bool {
        let pos = self.items.len();
        let mut is_new = true;
        if let Some(id) = item.id() {
            is_new = !self.by_id.contains_key(&id);
            self.by_id.entry(id).or_insert(pos);
        }
        self.by_name.entry(item.name().to_owned()).or_insert(pos);
        self.items.push(item);
        is_new
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.by_id.get(&id).and_then(|&pos| self.items.get(pos))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).and_then(|&pos| self.items.get(pos))
    }

    /// Resolve an operator-supplied identifier: a numeric id first, then a name.
    pub fn resolve(&self, identifier: &str) -> Option<&T> {
        identifier
            .parse::<EntityId>()
            .ok()
            .and_then(|id| self.get(id))
            .or_else(|| self.get_by_name(identifier.trim()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.get(id).map(Entity::name)
    }
}

impl<T> Inventory<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Inventory<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Entity> FromIterator<T> for Inventory<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// Serialized as the plain record list the backend returns.
impl<T: Serialize> Serialize for Inventory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'de, T: Deserialize<'de> + Entity> Deserialize<'de> for Inventory<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Switch;

    fn switch(id: Option<u64>, name: &str) -> Switch {
        Switch {
            id: id.map(EntityId::new),
            name: name.into(),
            project_id: EntityId::new(1),
            controller: None,
        }
    }

    #[test]
    fn lookup_by_id_and_name() {
        let inv = Inventory::new(vec![switch(Some(4), "core"), switch(Some(5), "edge")]);
        assert_eq!(inv.get(EntityId::new(5)).unwrap().name, "edge");
        assert_eq!(inv.get_by_name("core").unwrap().id, Some(EntityId::new(4)));
        assert_eq!(inv.name_of(EntityId::new(4)), Some("core"));
        assert!(inv.get(EntityId::new(6)).is_none());
    }

    #[test]
    fn resolve_prefers_ids_then_names() {
        let inv = Inventory::new(vec![switch(Some(4), "core"), switch(Some(5), "4")]);
        assert_eq!(inv.resolve("4").unwrap().name, "core");
        assert_eq!(inv.resolve("core").unwrap().name, "core");
        assert!(inv.resolve("missing").is_none());
    }

    #[test]
    fn unpersisted_records_are_not_id_addressable() {
        let inv = Inventory::new(vec![switch(None, "draft")]);
        assert_eq!(inv.len(), 1);
        assert!(inv.get_by_name("draft").is_some());
        assert!(!inv.contains(EntityId::new(0)));
    }

    #[test]
    fn duplicate_id_keeps_first_record() {
        let mut inv = Inventory::default();
        assert!(inv.push(switch(Some(1), "a")));
        assert!(!inv.push(switch(Some(1), "b")));
        assert_eq!(inv.get(EntityId::new(1)).unwrap().name, "a");
        assert_eq!(inv.len(), 2);
    }
}
