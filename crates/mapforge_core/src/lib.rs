//! Map editing data model for a 2D action-RPG editor
//!
//! This crate provides the fundamental types of the editing core:
//! - `Map` - the aggregate of three entity layers plus map metadata
//! - `Entity` - a placed tile instance or game entity
//! - `EntityCollection` - per-layer z-ordered containers
//! - `Selection` - the set of selected entities of one map
//! - `Tileset` - the read-only tileset snapshot the map resolves tiles with
//! - `ProjectContext` - explicit access to registry, tilesets and map files
//!
//! No GUI and no engine runtime live here; views observe the model through
//! change-notification subscriptions and drive it through its mutators.

mod entities;
mod entity;
mod error;
mod geometry;
mod kind;
mod layer;
mod map;
mod notify;
mod resources;
mod selection;
mod tileset;
mod value;

pub use entities::EntityCollection;
pub use entity::{Entity, MAX_SAVEGAME_VARIABLE};
pub use error::{MapError, ResourceError, TilesetError};
pub use geometry::{Point, Rect, Size};
pub use kind::{
    Capabilities, DestructibleKind, EnemyBreed, EntityKind, FieldSpec, FieldType, InteractiveKind,
    PickableKind, Subtype, TeletransporterKind,
};
pub use layer::Layer;
pub use map::{
    dungeon_small_keys_variable, Map, FLOOR_MAX, FLOOR_MIN, FLOOR_NONE, FLOOR_UNKNOWN,
    MAX_SMALL_KEYS_VARIABLE, MINIMUM_HEIGHT, MINIMUM_WIDTH, MUSIC_NONE, MUSIC_SAME,
    WORLD_INSIDE, WORLD_MAX_DUNGEON, WORLD_OUTSIDE,
};
pub use notify::{Listeners, SubscriptionId};
pub use resources::{
    DirStore, FileRegistry, MapStore, MemoryRegistry, MemoryStore, ProjectContext, ResourceKind,
    ResourceRegistry,
};
pub use selection::Selection;
pub use tileset::{MemoryTilesets, Obstacle, TilePattern, Tileset, TilesetProvider};
pub use value::{Fields, Value};
