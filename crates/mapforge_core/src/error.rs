//! Error taxonomy for the editing model

use thiserror::Error;

/// A constraint violation raised by a map or entity mutator.
///
/// Mutators are all-or-nothing: when one of these is returned, the
/// observable state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("position ({x}, {y}) is not aligned on the 8 pixel grid")]
    InvalidPosition { x: i32, y: i32 },

    #[error("this entity is not resizable")]
    NotResizable,

    #[error("the selected rectangle is flat")]
    DegenerateRectangle,

    #[error("invalid size {width}x{height}: must be positive multiples of {unit_width}x{unit_height}")]
    InvalidSize {
        width: u32,
        height: u32,
        unit_width: u32,
        unit_height: u32,
    },

    #[error("invalid direction {direction}: this entity has {directions} direction(s)")]
    InvalidDirection { direction: i32, directions: u32 },

    #[error("this entity cannot have a name")]
    NotNameable,

    #[error("invalid name '{name}': whitespace is not allowed")]
    InvalidName { name: String },

    #[error("invalid subtype {subtype} for this entity")]
    InvalidSubtype { subtype: i32 },

    #[error("invalid map size {width}x{height}: minimum is 320x240, multiples of 8")]
    InvalidMapSize { width: u32, height: u32 },

    #[error("invalid world {world}: expected -1 (inside), 0 (outside) or a dungeon 1..=20")]
    InvalidWorld { world: i32 },

    #[error("invalid floor {floor} for the current world")]
    InvalidFloor { floor: i32 },

    #[error("invalid small keys variable {variable}")]
    InvalidSmallKeysVariable { variable: i32 },

    #[error("no tileset is selected")]
    NoTileset,

    #[error("no entity with this id on the map")]
    NoSuchEntity,

    #[error("invalid value for field '{field}': {cause}")]
    InvalidField { field: String, cause: String },

    #[error(transparent)]
    Tileset(#[from] TilesetError),
}

/// Failure to resolve a tileset snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilesetError {
    #[error("no tileset with id '{0}'")]
    NotFound(String),

    #[error("no pattern {pattern} in tileset '{tileset}'")]
    NoSuchPattern { tileset: String, pattern: i32 },
}

/// Failure of the resource registry persistence
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed resource registry: {0}")]
    Malformed(#[from] serde_json::Error),
}
