//! Undoable map editing
//!
//! Every edit of an open map is an [`EditorCommand`] that can invert
//! itself. [`CommandHistory`] keeps the linear undo/redo log and the
//! saved watermark; [`EditorSession`] ties a map, its selection and its
//! history together for the editor views.

mod command;
mod history;
mod session;

pub use command::{
    AddEntities, BringToBack, BringToFront, ChangeMusic, ChangeTileset, EditEntity, EditorCommand,
    MoveEntities, RemoveEntities, RenameMap, ResizeEntity, ResizeMap, SetEntityLayer,
};
pub use history::{CommandHistory, HistoryError};
pub use session::EditorSession;
