//! The set of currently selected entities of one map
//!
//! Holds entity ids, not copies: the selection always reflects the live
//! entities. Callers remove ids of deleted entities via [`Selection::purge`].

use crate::geometry::Rect;
use crate::layer::Layer;
use crate::map::Map;
use crate::notify::{Listeners, SubscriptionId};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct Selection {
    ids: Vec<Uuid>,
    listeners: Listeners,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Add to the selection; selecting twice is a no-op
    pub fn select(&mut self, id: Uuid) {
        if !self.is_selected(id) {
            self.ids.push(id);
            self.listeners.notify();
        }
    }

    pub fn unselect(&mut self, id: Uuid) {
        if let Some(index) = self.ids.iter().position(|existing| *existing == id) {
            self.ids.remove(index);
            self.listeners.notify();
        }
    }

    pub fn toggle(&mut self, id: Uuid) {
        if self.is_selected(id) {
            self.unselect(id);
        } else {
            self.select(id);
        }
    }

    pub fn clear(&mut self) {
        if !self.ids.is_empty() {
            self.ids.clear();
            self.listeners.notify();
        }
    }

    /// Replace the selection with every entity fully inside `rect`
    pub fn select_within(&mut self, map: &Map, rect: Rect) {
        self.ids = map.entities_within(rect);
        self.listeners.notify();
    }

    /// Drop ids that no longer exist on the map
    pub fn purge(&mut self, map: &Map) {
        let before = self.ids.len();
        self.ids.retain(|id| map.entity(*id).is_some());
        if self.ids.len() != before {
            self.listeners.notify();
        }
    }

    /// The layer shared by every selected entity, or `None` when the
    /// selection is empty or spans several layers
    pub fn common_layer(&self, map: &Map) -> Option<Layer> {
        let mut layers = self
            .ids
            .iter()
            .filter_map(|id| map.entity(*id))
            .map(|e| e.layer());
        let first = layers.next()?;
        layers.all(|layer| layer == first).then_some(first)
    }

    pub fn subscribe(&mut self, callback: impl FnMut() + 'static) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::kind::EntityKind;

    #[test]
    fn test_toggle_and_idempotence() {
        let mut selection = Selection::new();
        let id = Uuid::new_v4();

        selection.select(id);
        selection.select(id);
        assert_eq!(selection.len(), 1);

        selection.toggle(id);
        assert!(selection.is_empty());
        selection.toggle(id);
        assert!(selection.is_selected(id));
    }

    #[test]
    fn test_common_layer() {
        let mut map = Map::new("test");
        let low = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));
        let low2 = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 32, 0));
        let high = map.add_entity(Entity::new(EntityKind::Chest, Layer::High, 0, 0));

        let mut selection = Selection::new();
        assert_eq!(selection.common_layer(&map), None);

        selection.select(low);
        selection.select(low2);
        assert_eq!(selection.common_layer(&map), Some(Layer::Low));

        selection.select(high);
        assert_eq!(selection.common_layer(&map), None);
    }

    #[test]
    fn test_select_within_and_purge() {
        let mut map = Map::new("test");
        let inside = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 8, 8));
        let outside = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 200, 8));

        let mut selection = Selection::new();
        selection.select_within(&map, Rect::new(0, 0, 64, 64));
        assert_eq!(selection.ids(), &[inside]);

        map.remove_entity(inside).unwrap();
        selection.purge(&map);
        assert!(selection.is_empty());
        let _ = outside;
    }
}
