//! Per-layer ordered entity containers
//!
//! Order encodes paint/z-order: the first entity is the bottom-most.

use crate::entity::Entity;
use crate::geometry::Rect;
use crate::kind::EntityKind;
use uuid::Uuid;

/// The ordered entities of one layer
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: Vec<Entity>,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append on top of the z-order
    pub fn add(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Insert at the bottom of the z-order
    pub fn add_first(&mut self, entity: Entity) {
        self.entities.insert(0, entity);
    }

    /// Insert at an explicit z-position; used to restore removed entities
    pub fn insert(&mut self, index: usize, entity: Entity) {
        self.entities.insert(index.min(self.entities.len()), entity);
    }

    /// Remove by identity, preserving the relative order of the remainder.
    ///
    /// Removing an absent entity is a caller bug; this returns `None` so
    /// the caller can assert on it.
    pub fn remove(&mut self, id: Uuid) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// The top-most entity containing the point, if any
    pub fn topmost_at(&self, x: i32, y: i32) -> Option<&Entity> {
        self.entities
            .iter()
            .rev()
            .find(|e| e.rect().contains_point(x, y))
    }

    /// All entities entirely inside `rect`, bottom-most first
    pub fn within(&self, rect: Rect) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| rect.contains_rect(&e.rect()))
    }

    /// Lookup by kind and name; O(n), maps stay small
    pub fn by_name(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.kind() == kind && e.name() == Some(name))
    }

    /// Remove and return every entity, leaving the collection empty
    pub fn take_all(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;

    fn chest_at(x: i32, y: i32) -> Entity {
        Entity::new(EntityKind::Chest, Layer::Low, x, y)
    }

    #[test]
    fn test_topmost_at_scans_from_top() {
        let mut collection = EntityCollection::new();
        let bottom = chest_at(0, 0);
        let top = chest_at(8, 8);
        let bottom_id = bottom.id;
        let top_id = top.id;
        collection.add(bottom);
        collection.add(top);

        // both cover (8, 8); the later added one wins
        assert_eq!(collection.topmost_at(8, 8).unwrap().id, top_id);
        assert_eq!(collection.topmost_at(0, 0).unwrap().id, bottom_id);
        assert!(collection.topmost_at(200, 200).is_none());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut collection = EntityCollection::new();
        let a = chest_at(0, 0);
        let b = chest_at(32, 0);
        let c = chest_at(64, 0);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        collection.add(a);
        collection.add(b);
        collection.add(c);

        let removed = collection.remove(b_id).unwrap();
        assert_eq!(removed.id, b_id);
        let order: Vec<Uuid> = collection.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![a_id, c_id]);

        assert!(collection.remove(b_id).is_none());
    }

    #[test]
    fn test_insert_restores_position() {
        let mut collection = EntityCollection::new();
        let a = chest_at(0, 0);
        let b = chest_at(32, 0);
        let (a_id, b_id) = (a.id, b.id);
        collection.add(a);
        collection.add(b);

        let removed = collection.remove(a_id).unwrap();
        collection.insert(0, removed);
        let order: Vec<Uuid> = collection.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![a_id, b_id]);
    }

    #[test]
    fn test_within() {
        let mut collection = EntityCollection::new();
        let inside = chest_at(8, 8);
        let straddling = chest_at(56, 8);
        let inside_id = inside.id;
        collection.add(inside);
        collection.add(straddling);

        let found: Vec<Uuid> = collection
            .within(Rect::new(0, 0, 64, 64))
            .map(|e| e.id)
            .collect();
        assert_eq!(found, vec![inside_id]);
    }

    #[test]
    fn test_by_name() {
        let mut collection = EntityCollection::new();
        let mut chest = chest_at(0, 0);
        chest.set_name("boss_chest").unwrap();
        let id = chest.id;
        collection.add(chest);

        assert_eq!(
            collection.by_name(EntityKind::Chest, "boss_chest").unwrap().id,
            id
        );
        assert!(collection.by_name(EntityKind::Enemy, "boss_chest").is_none());
        assert!(collection.by_name(EntityKind::Chest, "other").is_none());
    }
}
