//! The undoable editing commands
//!
//! A command captures enough pre-state at construction or execution to
//! invert itself exactly. `execute` validates through the map's mutators
//! and leaves the map untouched on failure; a command whose `execute`
//! failed is never appended to the history.

use mapforge_core::{
    Entity, Layer, Map, MapError, Rect, Size, TilesetProvider,
};
use std::rc::Rc;
use uuid::Uuid;

/// One undoable, atomic edit of a map
pub trait EditorCommand {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError>;
    fn undo(&mut self, map: &mut Map) -> Result<(), MapError>;
    /// Short label for undo/redo menu entries
    fn description(&self) -> String;
}

fn count_label(count: usize, singular: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        format!("{count} entities")
    }
}

/// Add entities on their layers
pub struct AddEntities {
    entities: Vec<Entity>,
}

impl AddEntities {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

impl EditorCommand for AddEntities {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        for entity in &self.entities {
            map.add_entity(entity.clone());
        }
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        for entity in self.entities.iter().rev() {
            map.remove_entity(entity.id).ok_or(MapError::NoSuchEntity)?;
        }
        Ok(())
    }

    fn description(&self) -> String {
        let label = match self.entities.first() {
            Some(e) if self.entities.len() == 1 => e.kind().display_name().to_lowercase(),
            _ => count_label(self.entities.len(), "entity"),
        };
        format!("Add {label}")
    }
}

/// Remove a set of entities as one atomic edit
pub struct RemoveEntities {
    ids: Vec<Uuid>,
    /// Layer and z-position of each removed entity, captured on execute
    snapshots: Vec<(Layer, usize, Entity)>,
}

impl RemoveEntities {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self {
            ids,
            snapshots: Vec::new(),
        }
    }
}

impl EditorCommand for RemoveEntities {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        // capture everything before touching the map so the removal is
        // all-or-nothing
        let mut snapshots = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            let (layer, index) = map.locate(*id).ok_or(MapError::NoSuchEntity)?;
            let entity = map.entity(*id).ok_or(MapError::NoSuchEntity)?.clone();
            snapshots.push((layer, index, entity));
        }
        for id in &self.ids {
            map.remove_entity(*id);
        }
        self.snapshots = snapshots;
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        let mut snapshots: Vec<&(Layer, usize, Entity)> = self.snapshots.iter().collect();
        snapshots.sort_by_key(|(layer, index, _)| (*layer, *index));
        for (layer, index, entity) in snapshots {
            map.insert_entity_at(*layer, *index, entity.clone());
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Remove {}", count_label(self.ids.len(), "entity"))
    }
}

/// Translate a set of entities by a delta
pub struct MoveEntities {
    ids: Vec<Uuid>,
    dx: i32,
    dy: i32,
}

impl MoveEntities {
    pub fn new(ids: Vec<Uuid>, dx: i32, dy: i32) -> Self {
        Self { ids, dx, dy }
    }
}

impl EditorCommand for MoveEntities {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.move_entities(&self.ids, self.dx, self.dy)
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.move_entities(&self.ids, -self.dx, -self.dy)
    }

    fn description(&self) -> String {
        format!("Move {}", count_label(self.ids.len(), "entity"))
    }
}

/// Move and/or resize one entity
pub struct ResizeEntity {
    id: Uuid,
    from: Rect,
    to: Rect,
}

impl ResizeEntity {
    pub fn new(map: &Map, id: Uuid, to: Rect) -> Result<Self, MapError> {
        let from = map.entity(id).ok_or(MapError::NoSuchEntity)?.rect();
        Ok(Self { id, from, to })
    }
}

impl EditorCommand for ResizeEntity {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_entity_rect(self.id, self.to)
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_entity_rect(self.id, self.from)
    }

    fn description(&self) -> String {
        "Resize entity".to_string()
    }
}

/// Move a set of entities to another layer
pub struct SetEntityLayer {
    ids: Vec<Uuid>,
    layer: Layer,
    before: [Vec<Uuid>; 3],
}

impl SetEntityLayer {
    pub fn new(map: &Map, ids: Vec<Uuid>, layer: Layer) -> Self {
        Self {
            ids,
            layer,
            before: map.layer_order(),
        }
    }
}

impl EditorCommand for SetEntityLayer {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        for id in &self.ids {
            map.locate(*id).ok_or(MapError::NoSuchEntity)?;
        }
        for id in &self.ids {
            map.set_entity_layer(*id, self.layer)?;
        }
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.restore_layer_order(&self.before)
    }

    fn description(&self) -> String {
        format!("Put on layer {}", self.layer.display_name().to_lowercase())
    }
}

/// Raise entities to the top of their layers
pub struct BringToFront {
    ids: Vec<Uuid>,
    before: [Vec<Uuid>; 3],
}

impl BringToFront {
    pub fn new(map: &Map, ids: Vec<Uuid>) -> Self {
        Self {
            before: map.layer_order(),
            ids,
        }
    }
}

impl EditorCommand for BringToFront {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.bring_to_front(&self.ids);
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.restore_layer_order(&self.before)
    }

    fn description(&self) -> String {
        "Bring to front".to_string()
    }
}

/// Lower entities to the bottom of their layers
pub struct BringToBack {
    ids: Vec<Uuid>,
    before: [Vec<Uuid>; 3],
}

impl BringToBack {
    pub fn new(map: &Map, ids: Vec<Uuid>) -> Self {
        Self {
            before: map.layer_order(),
            ids,
        }
    }
}

impl EditorCommand for BringToBack {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.bring_to_back(&self.ids);
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.restore_layer_order(&self.before)
    }

    fn description(&self) -> String {
        "Bring to back".to_string()
    }
}

/// Replace an entity's full state with an edited copy (property form "OK")
pub struct EditEntity {
    before: Entity,
    after: Entity,
    order_before: [Vec<Uuid>; 3],
}

impl EditEntity {
    /// `after` must carry the id of the entity it replaces
    pub fn new(map: &Map, after: Entity) -> Result<Self, MapError> {
        let before = map.entity(after.id).ok_or(MapError::NoSuchEntity)?.clone();
        Ok(Self {
            before,
            after,
            order_before: map.layer_order(),
        })
    }
}

impl EditorCommand for EditEntity {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.replace_entity(self.after.id, self.after.clone())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.replace_entity(self.before.id, self.before.clone())?;
        // a layer change appended the entity; put the z-order back
        map.restore_layer_order(&self.order_before)
    }

    fn description(&self) -> String {
        format!("Edit {}", self.after.kind().display_name().to_lowercase())
    }
}

/// Change the map dimensions
pub struct ResizeMap {
    from: Size,
    to: Size,
}

impl ResizeMap {
    pub fn new(map: &Map, width: u32, height: u32) -> Self {
        Self {
            from: map.size(),
            to: Size::new(width, height),
        }
    }
}

impl EditorCommand for ResizeMap {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_size(self.to.width, self.to.height)
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_size(self.from.width, self.from.height)
    }

    fn description(&self) -> String {
        "Resize map".to_string()
    }
}

/// Change the tileset, dropping tiles whose pattern no longer exists.
///
/// Undo restores the previous tileset and re-inserts the dropped tiles at
/// their former z-positions.
pub struct ChangeTileset {
    tileset_id: String,
    previous_id: String,
    provider: Rc<dyn TilesetProvider>,
    removed: Vec<(Layer, usize, Entity)>,
}

impl ChangeTileset {
    /// Only valid when the map already has a tileset; the initial tileset
    /// assignment of a fresh map is not an undoable edit
    pub fn new(map: &Map, tileset_id: impl Into<String>, provider: Rc<dyn TilesetProvider>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            previous_id: map.tileset_id().to_string(),
            provider,
            removed: Vec::new(),
        }
    }
}

impl EditorCommand for ChangeTileset {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        self.removed = map.set_tileset(&self.tileset_id, self.provider.as_ref())?;
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_tileset(&self.previous_id, self.provider.as_ref())?;
        for (layer, index, entity) in &self.removed {
            map.insert_entity_at(*layer, *index, entity.clone());
        }
        Ok(())
    }

    fn description(&self) -> String {
        "Change tileset".to_string()
    }
}

/// Change the map music
pub struct ChangeMusic {
    from: String,
    to: String,
}

impl ChangeMusic {
    pub fn new(map: &Map, music_id: impl Into<String>) -> Self {
        Self {
            from: map.music_id().to_string(),
            to: music_id.into(),
        }
    }
}

impl EditorCommand for ChangeMusic {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_music(self.to.clone());
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_music(self.from.clone());
        Ok(())
    }

    fn description(&self) -> String {
        "Change music".to_string()
    }
}

/// Rename the map
pub struct RenameMap {
    from: String,
    to: String,
}

impl RenameMap {
    pub fn new(map: &Map, name: impl Into<String>) -> Self {
        Self {
            from: map.name().to_string(),
            to: name.into(),
        }
    }
}

impl EditorCommand for RenameMap {
    fn execute(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_name(self.to.clone());
        Ok(())
    }

    fn undo(&mut self, map: &mut Map) -> Result<(), MapError> {
        map.set_name(self.from.clone());
        Ok(())
    }

    fn description(&self) -> String {
        "Rename map".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_core::{EntityKind, MemoryTilesets, Obstacle, TilePattern, Tileset};

    fn tilesets() -> Rc<MemoryTilesets> {
        let mut provider = MemoryTilesets::new();
        provider.insert(
            Tileset::new("forest")
                .with_pattern(
                    1,
                    TilePattern {
                        size: Size::new(16, 16),
                        default_layer: Layer::Low,
                        obstacle: Obstacle::None,
                    },
                )
                .with_pattern(
                    2,
                    TilePattern {
                        size: Size::new(8, 8),
                        default_layer: Layer::Low,
                        obstacle: Obstacle::None,
                    },
                ),
        );
        provider.insert(Tileset::new("desert").with_pattern(
            1,
            TilePattern {
                size: Size::new(16, 16),
                default_layer: Layer::Low,
                obstacle: Obstacle::None,
            },
        ));
        Rc::new(provider)
    }

    #[test]
    fn test_add_then_undo_is_noop() {
        let mut map = Map::new("test");
        let chest = Entity::new(EntityKind::Chest, Layer::Low, 0, 0);
        let mut command = AddEntities::new(vec![chest]);

        command.execute(&mut map).unwrap();
        assert_eq!(map.entity_count(), 1);
        command.undo(&mut map).unwrap();
        assert_eq!(map.entity_count(), 0);
    }

    #[test]
    fn test_remove_restores_z_positions() {
        let mut map = Map::new("test");
        let a = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));
        let b = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 32, 0));
        let c = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 64, 0));
        let before = map.layer_order();

        let mut command = RemoveEntities::new(vec![c, a]);
        command.execute(&mut map).unwrap();
        assert_eq!(map.entity_count(), 1);

        command.undo(&mut map).unwrap();
        assert_eq!(map.layer_order(), before);
        let _ = b;
    }

    #[test]
    fn test_remove_missing_entity_is_atomic() {
        let mut map = Map::new("test");
        let a = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));

        let mut command = RemoveEntities::new(vec![a, Uuid::new_v4()]);
        assert!(command.execute(&mut map).is_err());
        assert_eq!(map.entity_count(), 1);
    }

    #[test]
    fn test_failed_move_leaves_state() {
        let mut map = Map::new("test");
        let a = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));

        let mut command = MoveEntities::new(vec![a], 4, 0);
        assert!(command.execute(&mut map).is_err());
        assert_eq!(map.entity(a).unwrap().top_left().x, 0);
    }

    #[test]
    fn test_resize_entity_round_trip() {
        let mut map = Map::new("test");
        let id = map.add_entity(Entity::new(EntityKind::JumpSensor, Layer::Low, 0, 0));
        let from = map.entity(id).unwrap().rect();

        let mut command = ResizeEntity::new(&map, id, Rect::new(16, 8, 64, 16)).unwrap();
        command.execute(&mut map).unwrap();
        assert_eq!(map.entity(id).unwrap().rect(), Rect::new(16, 8, 64, 16));
        command.undo(&mut map).unwrap();
        assert_eq!(map.entity(id).unwrap().rect(), from);
    }

    #[test]
    fn test_set_layer_undo_restores_z_position() {
        let mut map = Map::new("test");
        let a = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));
        let b = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 32, 0));
        let before = map.layer_order();

        let mut command = SetEntityLayer::new(&map, vec![a], Layer::High);
        command.execute(&mut map).unwrap();
        assert_eq!(map.entity(a).unwrap().layer(), Layer::High);

        command.undo(&mut map).unwrap();
        assert_eq!(map.layer_order(), before);
        assert_eq!(map.entity(a).unwrap().layer(), Layer::Low);
        let _ = b;
    }

    #[test]
    fn test_edit_entity_swaps_snapshots() {
        let mut map = Map::new("test");
        let id = map.add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0));

        let mut after = map.entity(id).unwrap().clone();
        after.fields_mut().set_int("big_chest", 1);
        after.set_layer(Layer::High);

        let mut command = EditEntity::new(&map, after).unwrap();
        command.execute(&mut map).unwrap();
        assert_eq!(map.entity(id).unwrap().fields().int("big_chest"), Some(1));
        assert_eq!(map.entity(id).unwrap().layer(), Layer::High);

        command.undo(&mut map).unwrap();
        assert_eq!(map.entity(id).unwrap().fields().int("big_chest"), Some(0));
        assert_eq!(map.entity(id).unwrap().layer(), Layer::Low);
    }

    #[test]
    fn test_change_tileset_undo_restores_dropped_tiles() {
        let provider = tilesets();
        let mut map = Map::new("test");
        map.set_tileset("forest", provider.as_ref()).unwrap();
        let keep_tile = map.create_tile(1, 0, 0).unwrap();
        let drop_tile = map.create_tile(2, 16, 0).unwrap();
        map.add_entity(keep_tile);
        let dropped = map.add_entity(drop_tile);
        let before = map.layer_order();

        let provider_dyn: Rc<dyn TilesetProvider> = provider.clone();
        let mut command = ChangeTileset::new(&map, "desert", provider_dyn);
        command.execute(&mut map).unwrap();
        assert!(map.entity(dropped).is_none());

        command.undo(&mut map).unwrap();
        assert_eq!(map.tileset_id(), "forest");
        assert_eq!(map.layer_order(), before);
    }
}
