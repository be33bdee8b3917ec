//! One open map being edited
//!
//! Ties a map, its selection and its command history together and routes
//! every edit through the history so it stays undoable.

use crate::command::{
    AddEntities, BringToBack, BringToFront, ChangeMusic, ChangeTileset, EditEntity, EditorCommand,
    MoveEntities, RemoveEntities, RenameMap, ResizeEntity, ResizeMap, SetEntityLayer,
};
use crate::history::{CommandHistory, HistoryError};
use mapforge_core::{Entity, Layer, Map, ProjectContext, Rect, Selection, TilesetProvider};
use mapforge_format::{save_map, FormatError};
use std::rc::Rc;
use uuid::Uuid;

pub struct EditorSession {
    pub map: Map,
    pub selection: Selection,
    history: CommandHistory,
    tilesets: Rc<dyn TilesetProvider>,
}

impl EditorSession {
    pub fn new(map: Map, tilesets: Rc<dyn TilesetProvider>) -> Self {
        Self {
            map,
            selection: Selection::new(),
            history: CommandHistory::new(),
            tilesets,
        }
    }

    /// Execute a command and record it in the history
    pub fn apply(&mut self, command: Box<dyn EditorCommand>) -> Result<(), HistoryError> {
        self.history.do_command(command, &mut self.map)?;
        self.selection.purge(&self.map);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), HistoryError> {
        self.history.undo(&mut self.map)?;
        self.selection.purge(&self.map);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), HistoryError> {
        self.history.redo(&mut self.map)?;
        self.selection.purge(&self.map);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    /// Whether the map has no edits since the last save
    pub fn is_saved(&self) -> bool {
        self.history.is_saved()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Add one entity and select it
    pub fn add_entity(&mut self, entity: Entity) -> Result<Uuid, HistoryError> {
        let id = entity.id;
        self.apply(Box::new(AddEntities::new(vec![entity])))?;
        self.selection.clear();
        self.selection.select(id);
        Ok(id)
    }

    /// Remove the whole selection as one undoable edit
    pub fn remove_selected(&mut self) -> Result<(), HistoryError> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let ids = self.selection.ids().to_vec();
        self.apply(Box::new(RemoveEntities::new(ids)))
    }

    pub fn move_selected(&mut self, dx: i32, dy: i32) -> Result<(), HistoryError> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let ids = self.selection.ids().to_vec();
        self.apply(Box::new(MoveEntities::new(ids, dx, dy)))
    }

    pub fn resize_entity(&mut self, id: Uuid, to: Rect) -> Result<(), HistoryError> {
        let command = ResizeEntity::new(&self.map, id, to).map_err(HistoryError::Command)?;
        self.apply(Box::new(command))
    }

    pub fn set_selected_layer(&mut self, layer: Layer) -> Result<(), HistoryError> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let ids = self.selection.ids().to_vec();
        self.apply(Box::new(SetEntityLayer::new(&self.map, ids, layer)))
    }

    pub fn bring_selected_to_front(&mut self) -> Result<(), HistoryError> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let ids = self.selection.ids().to_vec();
        self.apply(Box::new(BringToFront::new(&self.map, ids)))
    }

    pub fn bring_selected_to_back(&mut self) -> Result<(), HistoryError> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let ids = self.selection.ids().to_vec();
        self.apply(Box::new(BringToBack::new(&self.map, ids)))
    }

    /// Replace an entity's state with an edited copy carrying the same id
    pub fn edit_entity(&mut self, after: Entity) -> Result<(), HistoryError> {
        let command = EditEntity::new(&self.map, after).map_err(HistoryError::Command)?;
        self.apply(Box::new(command))
    }

    pub fn resize_map(&mut self, width: u32, height: u32) -> Result<(), HistoryError> {
        self.apply(Box::new(ResizeMap::new(&self.map, width, height)))
    }

    pub fn change_music(&mut self, music_id: impl Into<String>) -> Result<(), HistoryError> {
        self.apply(Box::new(ChangeMusic::new(&self.map, music_id)))
    }

    pub fn rename_map(&mut self, name: impl Into<String>) -> Result<(), HistoryError> {
        self.apply(Box::new(RenameMap::new(&self.map, name)))
    }

    /// Switch tilesets. Assigning the first tileset of a fresh map is
    /// applied directly and cannot be undone; later switches are.
    pub fn change_tileset(&mut self, tileset_id: &str) -> Result<(), HistoryError> {
        if self.map.tileset_id().is_empty() {
            self.map
                .set_tileset(tileset_id, self.tilesets.as_ref())
                .map_err(HistoryError::Command)?;
            return Ok(());
        }
        let command = ChangeTileset::new(&self.map, tileset_id, Rc::clone(&self.tilesets));
        self.apply(Box::new(command))
    }

    /// Write the map through the project context and move the saved
    /// watermark
    pub fn save(&mut self, ctx: &mut ProjectContext) -> Result<(), FormatError> {
        save_map(&mut self.map, ctx)?;
        self.history.mark_saved();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_core::{
        EntityKind, Layer, MemoryTilesets, Obstacle, Size, TilePattern, Tileset,
    };
    use mapforge_format::{parse_map, serialize_map};

    const FIXTURE: &str = "320\t240\t0\t-100\t0\t0\t-1\tforest\tnone\n0\t0\t0\t0\t16\t16\t1\t1\n";

    fn tilesets() -> Rc<MemoryTilesets> {
        let mut provider = MemoryTilesets::new();
        provider.insert(Tileset::new("forest").with_pattern(
            1,
            TilePattern {
                size: Size::new(16, 16),
                default_layer: Layer::Low,
                obstacle: Obstacle::None,
            },
        ));
        Rc::new(provider)
    }

    fn session_from_fixture() -> EditorSession {
        let provider = tilesets();
        let map = parse_map("test", FIXTURE, provider.as_ref()).unwrap();
        EditorSession::new(map, provider)
    }

    #[test]
    fn test_undoing_everything_restores_the_serialized_form() {
        let mut session = session_from_fixture();

        let mut chest = Entity::new(EntityKind::Chest, Layer::Low, 16, 16);
        chest.fields_mut().set_int("treasure_content", 3);
        session.add_entity(chest).unwrap();
        session.move_selected(16, 8).unwrap();
        session.bring_selected_to_back().unwrap();
        session.set_selected_layer(Layer::High).unwrap();
        session.resize_map(640, 240).unwrap();
        session.change_music("village").unwrap();

        let edits = 6;
        for _ in 0..edits {
            session.undo().unwrap();
        }
        assert!(!session.can_undo());
        assert_eq!(serialize_map(&session.map).unwrap(), FIXTURE);
    }

    #[test]
    fn test_redo_after_full_undo_restores_the_edited_form() {
        let mut session = session_from_fixture();
        session
            .add_entity(Entity::new(EntityKind::Chest, Layer::Low, 16, 16))
            .unwrap();
        session.move_selected(8, 0).unwrap();
        let edited = serialize_map(&session.map).unwrap();

        session.undo().unwrap();
        session.undo().unwrap();
        session.redo().unwrap();
        session.redo().unwrap();
        assert_eq!(serialize_map(&session.map).unwrap(), edited);
    }

    #[test]
    fn test_remove_selected_is_one_undo_step() {
        let mut session = session_from_fixture();
        let a = session
            .add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0))
            .unwrap();
        let b = session
            .add_entity(Entity::new(EntityKind::Chest, Layer::Low, 32, 0))
            .unwrap();
        session.selection.select(a);
        session.selection.select(b);

        session.remove_selected().unwrap();
        assert!(session.map.entity(a).is_none());
        assert!(session.map.entity(b).is_none());
        assert!(session.selection.is_empty());

        session.undo().unwrap();
        assert!(session.map.entity(a).is_some());
        assert!(session.map.entity(b).is_some());
    }

    #[test]
    fn test_selection_purged_after_undoing_an_add() {
        let mut session = session_from_fixture();
        let id = session
            .add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0))
            .unwrap();
        assert!(session.selection.is_selected(id));

        session.undo().unwrap();
        assert!(session.selection.is_empty());
    }

    #[test]
    fn test_first_tileset_assignment_is_not_undoable() {
        let provider = tilesets();
        let map = Map::new("test");
        let mut session = EditorSession::new(map, provider);

        session.change_tileset("forest").unwrap();
        assert_eq!(session.map.tileset_id(), "forest");
        assert!(!session.can_undo());
    }

    #[test]
    fn test_save_moves_the_watermark() {
        use mapforge_core::{DirStore, MemoryRegistry, ProjectContext};

        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ProjectContext::new(
            Box::new(MemoryTilesets::new()),
            Box::new(MemoryRegistry::new()),
            Box::new(DirStore::new(dir.path())),
        );

        let mut session = session_from_fixture();
        session
            .add_entity(Entity::new(EntityKind::Chest, Layer::Low, 0, 0))
            .unwrap();
        assert!(!session.is_saved());

        session.save(&mut ctx).unwrap();
        assert!(session.is_saved());
        assert_eq!(session.map.id(), Some("1"));

        session.undo().unwrap();
        assert!(!session.is_saved());
    }
}
