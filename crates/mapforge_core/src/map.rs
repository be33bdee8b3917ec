//! The map aggregate: three entity layers plus map-level metadata
//!
//! The map is the sole mutator of its entity collections; every mutation
//! validates first, commits, then notifies the registered listeners once.

use crate::entities::EntityCollection;
use crate::entity::Entity;
use crate::error::MapError;
use crate::geometry::{Point, Rect, Size};
use crate::kind::EntityKind;
use crate::layer::Layer;
use crate::notify::{Listeners, SubscriptionId};
use crate::tileset::{Tileset, TilesetProvider};
use log::warn;
use std::collections::HashMap;
use uuid::Uuid;

/// Minimum map width in pixels
pub const MINIMUM_WIDTH: u32 = 320;
/// Minimum map height in pixels
pub const MINIMUM_HEIGHT: u32 = 240;

/// World of maps inside buildings and caves
pub const WORLD_INSIDE: i32 = -1;
/// The outside world
pub const WORLD_OUTSIDE: i32 = 0;
/// Highest dungeon number
pub const WORLD_MAX_DUNGEON: i32 = 20;

/// Floor sentinel for maps without a floor
pub const FLOOR_NONE: i32 = -100;
/// Floor sentinel for maps whose floor is not known
pub const FLOOR_UNKNOWN: i32 = -99;
pub const FLOOR_MIN: i32 = -16;
pub const FLOOR_MAX: i32 = 15;

/// Highest savegame slot usable as a small keys counter
pub const MAX_SMALL_KEYS_VARIABLE: i32 = 2048;

/// Music sentinel: no music on this map
pub const MUSIC_NONE: &str = "none";
/// Music sentinel: keep the music of the previous map
pub const MUSIC_SAME: &str = "same";

/// The small keys counter slot reserved for a given dungeon
pub fn dungeon_small_keys_variable(world: i32) -> i32 {
    204 + 10 * (world - 1)
}

#[derive(Debug)]
pub struct Map {
    /// Registry id, assigned on first successful save
    id: Option<String>,
    name: String,
    size: Size,
    world: i32,
    floor: i32,
    location: Point,
    small_keys_variable: i32,
    tileset_id: String,
    tileset: Option<Tileset>,
    music_id: String,
    layers: [EntityCollection; 3],
    /// Sticky flag: some tile instances referenced patterns absent from the
    /// tileset and were dropped
    bad_tiles: bool,
    listeners: Listeners,
}

impl Map {
    /// Create an empty, unsaved map with the minimum size
    pub fn new(name: impl Into<String>) -> Map {
        Map {
            id: None,
            name: name.into(),
            size: Size::new(MINIMUM_WIDTH, MINIMUM_HEIGHT),
            world: WORLD_INSIDE,
            floor: FLOOR_NONE,
            location: Point::new(0, 0),
            small_keys_variable: -1,
            tileset_id: String::new(),
            tileset: None,
            music_id: MUSIC_NONE.to_string(),
            layers: [
                EntityCollection::new(),
                EntityCollection::new(),
                EntityCollection::new(),
            ],
            bad_tiles: false,
            listeners: Listeners::new(),
        }
    }

    // --- metadata -------------------------------------------------------

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the registry id; done once, on first save
    pub fn assign_id(&mut self, id: impl Into<String>) {
        if self.id.is_none() {
            self.id = Some(id.into());
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.listeners.notify();
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), MapError> {
        if width < MINIMUM_WIDTH || height < MINIMUM_HEIGHT || width % 8 != 0 || height % 8 != 0 {
            return Err(MapError::InvalidMapSize { width, height });
        }
        self.size = Size::new(width, height);
        self.listeners.notify();
        Ok(())
    }

    pub fn world(&self) -> i32 {
        self.world
    }

    pub fn is_dungeon(&self) -> bool {
        self.world >= 1
    }

    /// Set the world, keeping the floor and small keys settings consistent:
    /// the outside world has no floor, and a dungeon pins its small keys
    /// counter to the dungeon's reserved slot.
    pub fn set_world(&mut self, world: i32) -> Result<(), MapError> {
        if !(WORLD_INSIDE..=WORLD_MAX_DUNGEON).contains(&world) {
            return Err(MapError::InvalidWorld { world });
        }
        self.world = world;
        if world == WORLD_OUTSIDE {
            self.floor = FLOOR_NONE;
        } else if world >= 1 {
            self.small_keys_variable = dungeon_small_keys_variable(world);
            if self.floor == FLOOR_NONE {
                self.floor = FLOOR_UNKNOWN;
            }
        }
        self.listeners.notify();
        Ok(())
    }

    pub fn floor(&self) -> i32 {
        self.floor
    }

    pub fn set_floor(&mut self, floor: i32) -> Result<(), MapError> {
        let valid = floor == FLOOR_NONE
            || floor == FLOOR_UNKNOWN
            || (FLOOR_MIN..=FLOOR_MAX).contains(&floor);
        if !valid {
            return Err(MapError::InvalidFloor { floor });
        }
        if self.world == WORLD_OUTSIDE && floor != FLOOR_NONE {
            return Err(MapError::InvalidFloor { floor });
        }
        if self.is_dungeon() && floor == FLOOR_NONE {
            return Err(MapError::InvalidFloor { floor });
        }
        self.floor = floor;
        self.listeners.notify();
        Ok(())
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
        self.listeners.notify();
    }

    pub fn small_keys_variable(&self) -> i32 {
        self.small_keys_variable
    }

    pub fn set_small_keys_variable(&mut self, variable: i32) -> Result<(), MapError> {
        if self.is_dungeon() {
            if variable != dungeon_small_keys_variable(self.world) {
                return Err(MapError::InvalidSmallKeysVariable { variable });
            }
        } else if !(-1..=MAX_SMALL_KEYS_VARIABLE).contains(&variable) {
            return Err(MapError::InvalidSmallKeysVariable { variable });
        }
        self.small_keys_variable = variable;
        self.listeners.notify();
        Ok(())
    }

    pub fn music_id(&self) -> &str {
        &self.music_id
    }

    pub fn set_music(&mut self, music_id: impl Into<String>) {
        self.music_id = music_id.into();
        self.listeners.notify();
    }

    pub fn tileset_id(&self) -> &str {
        &self.tileset_id
    }

    pub fn tileset(&self) -> Option<&Tileset> {
        self.tileset.as_ref()
    }

    /// Change the tileset and re-resolve every tile instance against it.
    ///
    /// Tiles whose pattern does not exist in the new tileset are removed
    /// (the sticky `bad_tiles` flag is raised); a single bad tile must not
    /// block the operation. Returns the removed tiles with their former
    /// layer and z-position so the caller can restore them on undo.
    pub fn set_tileset(
        &mut self,
        id: &str,
        provider: &dyn TilesetProvider,
    ) -> Result<Vec<(Layer, usize, Entity)>, MapError> {
        let tileset = provider.load(id)?;

        let mut removed = Vec::new();
        for layer in Layer::ALL {
            let collection = &mut self.layers[layer.index()];
            // walk from the top so removal does not shift pending indices
            for index in (0..collection.len()).rev() {
                let entity_id = match collection.iter().nth(index) {
                    Some(e) if e.kind() == EntityKind::Tile => e.id,
                    _ => continue,
                };
                let pattern_id = collection.get(entity_id).and_then(Entity::pattern_id);
                match pattern_id.and_then(|p| tileset.pattern(p).copied()) {
                    Some(pattern) => {
                        if let Some(tile) = collection.get_mut(entity_id) {
                            tile.rebind_pattern(&pattern);
                        }
                    }
                    None => {
                        if let Some(tile) = collection.remove(entity_id) {
                            warn!(
                                "tile pattern {:?} does not exist in tileset '{}', removing tile",
                                tile.pattern_id(),
                                id
                            );
                            removed.push((layer, index, tile));
                        }
                    }
                }
            }
        }
        removed.reverse();

        if !removed.is_empty() {
            self.bad_tiles = true;
        }
        self.tileset_id = id.to_string();
        self.tileset = Some(tileset);
        self.listeners.notify();
        Ok(removed)
    }

    /// Whether tile instances were dropped because their pattern no longer
    /// exists; stays set until [`Map::clear_bad_tiles`]
    pub fn bad_tiles(&self) -> bool {
        self.bad_tiles
    }

    pub fn mark_bad_tiles(&mut self) {
        self.bad_tiles = true;
    }

    pub fn clear_bad_tiles(&mut self) {
        self.bad_tiles = false;
    }

    // --- entity creation ------------------------------------------------

    /// Create (but do not add) an entity of the given kind with defaults
    /// suited to this map
    pub fn create_entity(&self, kind: EntityKind, x: i32, y: i32) -> Entity {
        let mut entity = Entity::new(kind, Layer::Low, x, y);
        // a new teletransporter targets its own map by default
        if kind == EntityKind::Teletransporter {
            if let Some(id) = self.id() {
                entity.fields_mut().set_text("destination_map", id);
            }
        }
        entity
    }

    /// Create (but do not add) a tile instance of the given pattern
    pub fn create_tile(&self, pattern_id: i32, x: i32, y: i32) -> Result<Entity, MapError> {
        let tileset = self.tileset.as_ref().ok_or(MapError::NoTileset)?;
        let pattern = tileset
            .pattern(pattern_id)
            .ok_or_else(|| crate::error::TilesetError::NoSuchPattern {
                tileset: tileset.id.clone(),
                pattern: pattern_id,
            })?;
        Ok(Entity::new_tile(pattern_id, pattern, x, y))
    }

    // --- entity access --------------------------------------------------

    pub fn entities(&self, layer: Layer) -> &EntityCollection {
        &self.layers[layer.index()]
    }

    pub fn entity(&self, id: Uuid) -> Option<&Entity> {
        self.layers.iter().find_map(|c| c.get(id))
    }

    fn entity_mut(&mut self, id: Uuid) -> Option<&mut Entity> {
        self.layers.iter_mut().find_map(|c| c.get_mut(id))
    }

    /// Layer and z-position of an entity
    pub fn locate(&self, id: Uuid) -> Option<(Layer, usize)> {
        for layer in Layer::ALL {
            if let Some(index) = self.layers[layer.index()].index_of(id) {
                return Some((layer, index));
            }
        }
        None
    }

    /// The top-most entity under the point, checking the high layer first,
    /// then intermediate, then low. This fixed precedence is the selection
    /// order and matches the paint order.
    pub fn get_entity_at(&self, x: i32, y: i32) -> Option<&Entity> {
        [Layer::High, Layer::Intermediate, Layer::Low]
            .into_iter()
            .find_map(|layer| self.layers[layer.index()].topmost_at(x, y))
    }

    /// Ids of all entities entirely inside `rect`, in map order
    pub fn entities_within(&self, rect: Rect) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for layer in Layer::ALL {
            ids.extend(self.layers[layer.index()].within(rect).map(|e| e.id));
        }
        ids
    }

    pub fn entity_count(&self) -> usize {
        self.layers.iter().map(EntityCollection::len).sum()
    }

    /// All entities, bottom layer first, each layer bottom-most first
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.layers.iter().flat_map(EntityCollection::iter)
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.all_entities().filter(move |e| e.kind() == kind)
    }

    pub fn entity_with_name(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.layers.iter().find_map(|c| c.by_name(kind, name))
    }

    // --- entity mutation ------------------------------------------------

    /// Add an entity on its layer, on top of the z-order. A taken name is
    /// disambiguated with a numeric suffix.
    pub fn add_entity(&mut self, mut entity: Entity) -> Uuid {
        if let Some(name) = entity.name() {
            let unique = self.available_name(entity.kind(), name, None);
            entity.set_name_unchecked(unique);
        }
        let id = entity.id;
        self.layers[entity.layer().index()].add(entity);
        self.listeners.notify();
        id
    }

    /// Re-insert an entity at an explicit z-position (undo of a removal)
    pub fn insert_entity_at(&mut self, layer: Layer, index: usize, mut entity: Entity) {
        entity.set_layer(layer);
        self.layers[layer.index()].insert(index, entity);
        self.listeners.notify();
    }

    pub fn remove_entity(&mut self, id: Uuid) -> Option<Entity> {
        for collection in &mut self.layers {
            if let Some(entity) = collection.remove(id) {
                self.listeners.notify();
                return Some(entity);
            }
        }
        None
    }

    /// Replace an entity in place, keeping its z-position when the layer is
    /// unchanged; a layer change appends to the destination layer.
    pub fn replace_entity(&mut self, id: Uuid, mut entity: Entity) -> Result<(), MapError> {
        let (layer, index) = self.locate(id).ok_or(MapError::NoSuchEntity)?;
        entity.id = id;
        if let Some(name) = entity.name() {
            let unique = self.available_name(entity.kind(), name, Some(id));
            entity.set_name_unchecked(unique);
        }
        self.layers[layer.index()].remove(id);
        if entity.layer() == layer {
            self.layers[layer.index()].insert(index, entity);
        } else {
            self.layers[entity.layer().index()].add(entity);
        }
        self.listeners.notify();
        Ok(())
    }

    /// Move an entity to another layer. Its z-position in the old layer is
    /// lost: it lands on top of the destination layer.
    pub fn set_entity_layer(&mut self, id: Uuid, layer: Layer) -> Result<(), MapError> {
        let (old_layer, _) = self.locate(id).ok_or(MapError::NoSuchEntity)?;
        if old_layer == layer {
            return Ok(());
        }
        if let Some(mut entity) = self.layers[old_layer.index()].remove(id) {
            entity.set_layer(layer);
            self.layers[layer.index()].add(entity);
        }
        self.listeners.notify();
        Ok(())
    }

    /// Raise the given entities to the top of their layers, preserving
    /// their relative order: iterating the stable map order bottom-up and
    /// pushing each on top leaves the subset ordered as before.
    pub fn bring_to_front(&mut self, ids: &[Uuid]) {
        for id in self.stable_order(ids) {
            if let Some((layer, _)) = self.locate(id) {
                if let Some(entity) = self.layers[layer.index()].remove(id) {
                    self.layers[layer.index()].add(entity);
                }
            }
        }
        self.listeners.notify();
    }

    /// Lower the given entities to the bottom of their layers. The stable
    /// order is walked top-down here; going bottom-up would invert the
    /// subset's relative order.
    pub fn bring_to_back(&mut self, ids: &[Uuid]) {
        for id in self.stable_order(ids).into_iter().rev() {
            if let Some((layer, _)) = self.locate(id) {
                if let Some(entity) = self.layers[layer.index()].remove(id) {
                    self.layers[layer.index()].add_first(entity);
                }
            }
        }
        self.listeners.notify();
    }

    /// The subset of `ids` ordered as they appear on the map (layers
    /// bottom-up, then z-order), independent of selection order
    fn stable_order(&self, ids: &[Uuid]) -> Vec<Uuid> {
        self.all_entities()
            .map(|e| e.id)
            .filter(|id| ids.contains(id))
            .collect()
    }

    /// Snapshot of the z-order of every layer
    pub fn layer_order(&self) -> [Vec<Uuid>; 3] {
        [
            self.layers[0].iter().map(|e| e.id).collect(),
            self.layers[1].iter().map(|e| e.id).collect(),
            self.layers[2].iter().map(|e| e.id).collect(),
        ]
    }

    /// Restore a previously captured z-order snapshot, moving entities
    /// across layers as needed. Every id in the snapshot must still exist.
    pub fn restore_layer_order(&mut self, order: &[Vec<Uuid>; 3]) -> Result<(), MapError> {
        let mut pool: HashMap<Uuid, Entity> = HashMap::new();
        for collection in &mut self.layers {
            for entity in collection.take_all() {
                pool.insert(entity.id, entity);
            }
        }

        for layer in Layer::ALL {
            for id in &order[layer.index()] {
                let mut entity = pool.remove(id).ok_or(MapError::NoSuchEntity)?;
                entity.set_layer(layer);
                self.layers[layer.index()].add(entity);
            }
        }
        // entities added after the snapshot keep their own layer, on top
        let mut leftovers: Vec<Entity> = pool.into_values().collect();
        leftovers.sort_by_key(|e| e.id);
        for entity in leftovers {
            self.layers[entity.layer().index()].add(entity);
        }
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_top_left(&mut self, id: Uuid, x: i32, y: i32) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_top_left(x, y)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_origin_position(&mut self, id: Uuid, x: i32, y: i32) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_origin_position(x, y)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_rect(&mut self, id: Uuid, rect: Rect) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_rect(rect)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_size(&mut self, id: Uuid, width: u32, height: u32) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_size(width, height)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_position_by_corners(
        &mut self,
        id: Uuid,
        p1: Point,
        p2: Point,
    ) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_position_by_corners(p1, p2)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_direction(&mut self, id: Uuid, direction: i32) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_direction(direction)?;
        self.listeners.notify();
        Ok(())
    }

    pub fn set_entity_subtype(
        &mut self,
        id: Uuid,
        subtype: crate::kind::Subtype,
    ) -> Result<(), MapError> {
        self.entity_mut(id)
            .ok_or(MapError::NoSuchEntity)?
            .set_subtype(subtype)?;
        self.listeners.notify();
        Ok(())
    }

    /// Rename an entity, auto-disambiguating against same-kind entities
    pub fn set_entity_name(&mut self, id: Uuid, name: &str) -> Result<(), MapError> {
        let kind = self.entity(id).ok_or(MapError::NoSuchEntity)?.kind();
        if !kind.capabilities().has_name {
            return Err(MapError::NotNameable);
        }
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(MapError::InvalidName {
                name: name.to_string(),
            });
        }
        let unique = self.available_name(kind, name, Some(id));
        if let Some(entity) = self.entity_mut(id) {
            entity.set_name_unchecked(unique);
        }
        self.listeners.notify();
        Ok(())
    }

    /// Translate a set of entities by the same delta, atomically: either
    /// every entity moves or none does.
    pub fn move_entities(&mut self, ids: &[Uuid], dx: i32, dy: i32) -> Result<(), MapError> {
        for id in ids {
            let entity = self.entity(*id).ok_or(MapError::NoSuchEntity)?;
            let target = entity.top_left();
            let (x, y) = (target.x + dx, target.y + dy);
            if x.rem_euclid(8) != 0 || y.rem_euclid(8) != 0 {
                return Err(MapError::InvalidPosition { x, y });
            }
        }
        for id in ids {
            if let Some(entity) = self.entity_mut(*id) {
                let target = entity.top_left();
                // already validated above
                let _ = entity.set_top_left(target.x + dx, target.y + dy);
            }
        }
        self.listeners.notify();
        Ok(())
    }

    /// Validate every entity's kind-specific fields, as done before a save
    pub fn check_entities(&self) -> Result<(), MapError> {
        for entity in self.all_entities() {
            entity.check_fields(self)?;
        }
        Ok(())
    }

    // --- names ----------------------------------------------------------

    /// A free name for an entity of `kind`, starting from `desired`.
    ///
    /// A taken name gets a numeric suffix: "chest" becomes "chest_2", then
    /// "chest_3". An existing numeric suffix is replaced, not stacked.
    pub fn available_name(&self, kind: EntityKind, desired: &str, exclude: Option<Uuid>) -> String {
        if !self.name_in_use(kind, desired, exclude) {
            return desired.to_string();
        }
        let base = match desired.rsplit_once('_') {
            Some((prefix, suffix))
                if !prefix.is_empty()
                    && !suffix.is_empty()
                    && suffix.chars().all(|c| c.is_ascii_digit()) =>
            {
                prefix
            }
            _ => desired,
        };
        let mut counter = 2;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.name_in_use(kind, &candidate, exclude) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn name_in_use(&self, kind: EntityKind, name: &str, exclude: Option<Uuid>) -> bool {
        self.entities_of_kind(kind)
            .any(|e| e.name() == Some(name) && exclude != Some(e.id))
    }

    // --- notification ---------------------------------------------------

    pub fn subscribe(&mut self, callback: impl FnMut() + 'static) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }
}
