//! The linear undo/redo log
//!
//! A cursor counts how many commands of the log are currently applied; a
//! new command truncates everything past the cursor (the redo tail). The
//! saved watermark remembers the cursor position of the last file save.

use crate::command::EditorCommand;
use log::debug;
use mapforge_core::{Listeners, Map, MapError, SubscriptionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Undo requested with nothing applied; a UI gating on `can_undo`
    /// never triggers this
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// The command's forward execution failed; the map is unchanged and
    /// the command was discarded
    #[error(transparent)]
    Command(#[from] MapError),

    /// An undo failed. Undo restores previously valid state, so this is
    /// an internal consistency bug, not a user-facing condition.
    #[error("undo failed, editing state is inconsistent: {0}")]
    Inconsistent(MapError),
}

pub struct CommandHistory {
    log: Vec<Box<dyn EditorCommand>>,
    /// Number of commands currently applied; always in `0..=log.len()`
    cursor: usize,
    /// Cursor position at the last save; `None` once the saved state has
    /// been truncated out of reach
    saved_cursor: Option<usize>,
    listeners: Listeners,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            cursor: 0,
            saved_cursor: Some(0),
            listeners: Listeners::new(),
        }
    }

    /// Execute a command and append it to the log, discarding any redo
    /// tail. A failed command leaves both the map and the log unchanged.
    pub fn do_command(
        &mut self,
        mut command: Box<dyn EditorCommand>,
        map: &mut Map,
    ) -> Result<(), HistoryError> {
        command.execute(map)?;
        if matches!(self.saved_cursor, Some(saved) if saved > self.cursor) {
            // the saved state lived in the redo tail; it is now unreachable
            self.saved_cursor = None;
        }
        self.log.truncate(self.cursor);
        debug!("did: {}", command.description());
        self.log.push(command);
        self.cursor = self.log.len();
        self.listeners.notify();
        Ok(())
    }

    pub fn undo(&mut self, map: &mut Map) -> Result<(), HistoryError> {
        if self.cursor == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        let command = &mut self.log[self.cursor - 1];
        command.undo(map).map_err(HistoryError::Inconsistent)?;
        debug!("undid: {}", command.description());
        self.cursor -= 1;
        self.listeners.notify();
        Ok(())
    }

    pub fn redo(&mut self, map: &mut Map) -> Result<(), HistoryError> {
        if self.cursor == self.log.len() {
            return Err(HistoryError::NothingToRedo);
        }
        let command = &mut self.log[self.cursor];
        command.execute(map)?;
        debug!("redid: {}", command.description());
        self.cursor += 1;
        self.listeners.notify();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.log.len()
    }

    /// Whether the map state matches the last saved state
    pub fn is_saved(&self) -> bool {
        self.saved_cursor == Some(self.cursor)
    }

    /// Record the current cursor as the saved state; called after a
    /// successful file save
    pub fn mark_saved(&mut self) {
        self.saved_cursor = Some(self.cursor);
        self.listeners.notify();
    }

    /// Label of the command an undo would revert
    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.log.get(i))
            .map(|c| c.description())
    }

    /// Label of the command a redo would re-apply
    pub fn redo_description(&self) -> Option<String> {
        self.log.get(self.cursor).map(|c| c.description())
    }

    /// Labels of every logged command, oldest first
    pub fn descriptions(&self) -> Vec<String> {
        self.log.iter().map(|c| c.description()).collect()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Forget everything, e.g. when closing the map
    pub fn clear(&mut self) {
        self.log.clear();
        self.cursor = 0;
        self.saved_cursor = Some(0);
        self.listeners.notify();
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
    use crate::command::{AddEntities, MoveEntities, ResizeMap};
    use mapforge_core::{Entity, EntityKind, Layer};

    fn add_chest(history: &mut CommandHistory, map: &mut Map, x: i32) -> uuid::Uuid {
        let chest = Entity::new(EntityKind::Chest, Layer::Low, x, 0);
        let id = chest.id;
        history
            .do_command(Box::new(AddEntities::new(vec![chest])), map)
            .unwrap();
        id
    }

    #[test]
    fn test_undo_redo_cursor() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();
        assert!(!history.can_undo());
        assert!(matches!(history.undo(&mut map), Err(HistoryError::NothingToUndo)));

        add_chest(&mut history, &mut map, 0);
        add_chest(&mut history, &mut map, 32);
        assert_eq!(history.cursor(), 2);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        history.undo(&mut map).unwrap();
        assert_eq!(map.entity_count(), 1);
        assert!(history.can_redo());

        history.redo(&mut map).unwrap();
        assert_eq!(map.entity_count(), 2);
        assert!(matches!(history.redo(&mut map), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_new_command_discards_redo_tail() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();

        history
            .do_command(Box::new(ResizeMap::new(&map, 640, 480)), &mut map)
            .unwrap();
        add_chest(&mut history, &mut map, 0);
        history.undo(&mut map).unwrap();

        history
            .do_command(Box::new(ResizeMap::new(&map, 320, 480)), &mut map)
            .unwrap();
        assert!(!history.can_redo());
        assert_eq!(
            history.descriptions(),
            vec!["Resize map".to_string(), "Resize map".to_string()]
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_failed_command_not_logged() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();
        let id = add_chest(&mut history, &mut map, 0);

        let result = history.do_command(Box::new(MoveEntities::new(vec![id], 4, 0)), &mut map);
        assert!(matches!(result, Err(HistoryError::Command(_))));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_saved_watermark() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();
        assert!(history.is_saved());

        add_chest(&mut history, &mut map, 0);
        assert!(!history.is_saved());

        history.mark_saved();
        assert!(history.is_saved());

        history.undo(&mut map).unwrap();
        assert!(!history.is_saved());
        history.redo(&mut map).unwrap();
        assert!(history.is_saved());
    }

    #[test]
    fn test_truncated_saved_state_unreachable() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();

        add_chest(&mut history, &mut map, 0);
        add_chest(&mut history, &mut map, 32);
        history.mark_saved();

        history.undo(&mut map).unwrap();
        add_chest(&mut history, &mut map, 64);
        // the saved state was in the discarded tail; no cursor reaches it
        assert!(!history.is_saved());
        history.undo(&mut map).unwrap();
        assert!(!history.is_saved());
        history.undo(&mut map).unwrap();
        assert!(!history.is_saved());
    }

    #[test]
    fn test_descriptions_for_menus() {
        let mut map = Map::new("test");
        let mut history = CommandHistory::new();
        assert_eq!(history.undo_description(), None);

        add_chest(&mut history, &mut map, 0);
        assert_eq!(history.undo_description(), Some("Add chest".to_string()));
        assert_eq!(history.redo_description(), None);

        history.undo(&mut map).unwrap();
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), Some("Add chest".to_string()));
    }
}
