//! A single placed object: a tile instance or a game entity
//!
//! One struct covers every kind; what a given entity can do is driven by
//! its kind's [`Capabilities`] table. All mutators validate first and only
//! then commit, so a failed call leaves the entity untouched.

use crate::error::MapError;
use crate::geometry::{Point, Rect, Size};
use crate::kind::{Capabilities, EntityKind, Subtype, TeletransporterKind};
use crate::layer::Layer;
use crate::map::Map;
use crate::tileset::{Obstacle, TilePattern, Tileset};
use crate::value::Fields;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest savegame slot index usable by entity properties
pub const MAX_SAVEGAME_VARIABLE: i32 = 32767;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    kind: EntityKind,
    layer: Layer,
    rect: Rect,
    direction: i32,
    name: Option<String>,
    subtype: Option<Subtype>,
    fields: Fields,
    /// Resize granularity; for tiles this is the pattern size
    unit: Size,
}

impl Entity {
    /// Create a new entity of the given kind with default properties,
    /// its top-left corner at `(x, y)`
    pub fn new(kind: EntityKind, layer: Layer, x: i32, y: i32) -> Entity {
        let caps = kind.capabilities();
        Entity {
            id: Uuid::new_v4(),
            kind,
            layer,
            rect: Rect::new(x, y, caps.default_size.width, caps.default_size.height),
            direction: 0,
            name: kind.default_name().map(String::from),
            subtype: kind.default_subtype(),
            fields: kind.default_fields(),
            unit: caps.unit,
        }
    }

    /// Create a tile instance of the given pattern, placed on the pattern's
    /// default layer with its top-left corner at `(x, y)`
    pub fn new_tile(pattern_id: i32, pattern: &TilePattern, x: i32, y: i32) -> Entity {
        let mut entity = Entity::new(EntityKind::Tile, pattern.default_layer, x, y);
        entity.rect.width = pattern.size.width;
        entity.rect.height = pattern.size.height;
        entity.unit = pattern.size;
        entity.fields.set_int("pattern", pattern_id);
        entity
    }

    /// A copy of this entity with a fresh identity.
    ///
    /// The name is kept as is; the map disambiguates it when the copy is
    /// added.
    pub fn duplicate(&self) -> Entity {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn top_left(&self) -> Point {
        self.rect.top_left()
    }

    pub fn size(&self) -> Size {
        self.rect.size()
    }

    /// The origin point in map coordinates (top-left + kind origin offset)
    pub fn origin_position(&self) -> Point {
        let origin = self.capabilities().origin;
        Point::new(self.rect.x + origin.x, self.rect.y + origin.y)
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn subtype(&self) -> Option<Subtype> {
        self.subtype
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// The resize granularity of this instance
    pub fn unit(&self) -> Size {
        self.unit
    }

    /// The tile pattern id, for tile instances
    pub fn pattern_id(&self) -> Option<i32> {
        match self.kind {
            EntityKind::Tile => self.fields.int("pattern"),
            _ => None,
        }
    }

    /// How many times the unit is repeated horizontally
    pub fn repeat_x(&self) -> u32 {
        self.rect.width / self.unit.width
    }

    /// How many times the unit is repeated vertically
    pub fn repeat_y(&self) -> u32 {
        self.rect.height / self.unit.height
    }

    /// Whether this entity can currently be resized.
    ///
    /// A teletransporter is only resizable while it is invisible; the
    /// visible ones have a fixed sprite size.
    pub fn is_resizable(&self) -> bool {
        if !self.capabilities().resizable {
            return false;
        }
        match self.subtype {
            Some(Subtype::Teletransporter(k)) => k == TeletransporterKind::Invisible,
            _ => true,
        }
    }

    /// Move the entity so that its top-left corner is at `(x, y)`
    pub fn set_top_left(&mut self, x: i32, y: i32) -> Result<(), MapError> {
        check_aligned(x, y)?;
        self.rect.x = x;
        self.rect.y = y;
        Ok(())
    }

    /// Move the entity so that its origin point is at `(x, y)`
    pub fn set_origin_position(&mut self, x: i32, y: i32) -> Result<(), MapError> {
        let origin = self.capabilities().origin;
        self.set_top_left(x - origin.x, y - origin.y)
    }

    /// Translate the entity by `(dx, dy)`
    pub fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), MapError> {
        self.set_top_left(self.rect.x + dx, self.rect.y + dy)
    }

    /// Resize the entity, keeping its top-left corner
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), MapError> {
        if !self.is_resizable() {
            return Err(MapError::NotResizable);
        }
        self.set_size_unchecked(width, height)
    }

    /// Resize without the resizability check, still validating the unit.
    ///
    /// Deserialization entry point: the file format stores the size of
    /// kinds that are not interactively resizable once their subtype is
    /// known (a visible teletransporter keeps the size it was created with).
    pub fn set_size_unchecked(&mut self, width: u32, height: u32) -> Result<(), MapError> {
        self.check_size(width, height)?;
        self.rect.width = width;
        self.rect.height = height;
        Ok(())
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), MapError> {
        if width == 0
            || height == 0
            || width % self.unit.width != 0
            || height % self.unit.height != 0
        {
            return Err(MapError::InvalidSize {
                width,
                height,
                unit_width: self.unit.width,
                unit_height: self.unit.height,
            });
        }
        Ok(())
    }

    /// Set position and size at once; validates everything before committing
    pub fn set_rect(&mut self, rect: Rect) -> Result<(), MapError> {
        check_aligned(rect.x, rect.y)?;
        if rect.size() != self.rect.size() {
            if !self.is_resizable() {
                return Err(MapError::NotResizable);
            }
            self.check_size(rect.width, rect.height)?;
        }
        self.rect = rect;
        Ok(())
    }

    /// Set the rectangle spanned by two arbitrary corner points (any order)
    pub fn set_position_by_corners(&mut self, p1: Point, p2: Point) -> Result<(), MapError> {
        if !self.is_resizable() {
            return Err(MapError::NotResizable);
        }
        let rect = Rect::from_corners(p1, p2);
        if rect.width == 0 || rect.height == 0 {
            return Err(MapError::DegenerateRectangle);
        }
        self.set_rect(rect)
    }

    /// Change the layer field only; moving between the map's per-layer
    /// collections is the map's job
    pub fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    pub fn set_direction(&mut self, direction: i32) -> Result<(), MapError> {
        let directions = self.capabilities().directions;
        if direction < 0 || direction as u32 >= directions {
            return Err(MapError::InvalidDirection {
                direction,
                directions,
            });
        }
        self.direction = direction;
        Ok(())
    }

    /// Set the name, without uniqueness handling.
    ///
    /// The owning map disambiguates names against its other entities; see
    /// `Map::set_entity_name`.
    pub fn set_name(&mut self, name: &str) -> Result<(), MapError> {
        if !self.capabilities().has_name {
            return Err(MapError::NotNameable);
        }
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(MapError::InvalidName {
                name: name.to_string(),
            });
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Commit an already validated, already disambiguated name
    pub(crate) fn set_name_unchecked(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn set_subtype(&mut self, subtype: Subtype) -> Result<(), MapError> {
        if !subtype.matches_kind(self.kind) {
            return Err(MapError::InvalidSubtype {
                subtype: subtype.id(),
            });
        }
        self.subtype = Some(subtype);

        // A teletransporter becoming visible takes its fixed sprite size
        if let Subtype::Teletransporter(k) = subtype {
            if k != TeletransporterKind::Invisible {
                let size = self.capabilities().default_size;
                self.rect.width = size.width;
                self.rect.height = size.height;
            }
        }
        Ok(())
    }

    /// Rebind a tile instance to a (possibly different) pattern definition,
    /// keeping its repeat counts
    pub fn rebind_pattern(&mut self, pattern: &TilePattern) {
        let repeat_x = self.repeat_x();
        let repeat_y = self.repeat_y();
        self.unit = pattern.size;
        self.rect.width = pattern.size.width * repeat_x;
        self.rect.height = pattern.size.height * repeat_y;
    }

    /// The obstacle behavior of this entity.
    ///
    /// Tiles take it from their pattern; destructible and transportable
    /// items always block.
    pub fn obstacle(&self, tileset: Option<&Tileset>) -> Obstacle {
        match self.kind {
            EntityKind::Tile => self
                .pattern_id()
                .and_then(|id| tileset.and_then(|t| t.pattern(id)))
                .map(|p| p.obstacle)
                .unwrap_or(Obstacle::None),
            EntityKind::DestructibleItem | EntityKind::TransportableItem => Obstacle::Full,
            _ => Obstacle::None,
        }
    }

    /// Validate the kind-specific fields against the owning map.
    ///
    /// Called before saving; a violation means the entity's property form
    /// needs fixing, not that the in-editor state is corrupt.
    pub fn check_fields(&self, map: &Map) -> Result<(), MapError> {
        match self.kind {
            EntityKind::Teletransporter | EntityKind::MapExit => {
                let destination_map = self.fields.text("destination_map").unwrap_or("");
                if destination_map.is_empty() {
                    return field_error("destination_map", "no destination map selected");
                }
                if self.fields.text("destination_point").unwrap_or("").is_empty() {
                    return field_error("destination_point", "no destination point selected");
                }
                if self.kind == EntityKind::MapExit && map.id() == Some(destination_map) {
                    return field_error("destination_map", "an exit cannot lead to its own map");
                }
            }
            EntityKind::PickableItem => {
                let subtype = match self.subtype {
                    Some(Subtype::Pickable(k)) => k,
                    _ => return field_error("subtype", "missing pickable subtype"),
                };
                check_pickable(
                    subtype.id(),
                    self.fields.int("savegame_variable").unwrap_or(-1),
                    "savegame_variable",
                    map,
                )?;
            }
            EntityKind::DestructibleItem | EntityKind::TransportableItem => {
                check_pickable(
                    self.fields.int("pickable_subtype").unwrap_or(-1),
                    self.fields.int("pickable_savegame_variable").unwrap_or(-1),
                    "pickable_savegame_variable",
                    map,
                )?;
            }
            EntityKind::Chest => {
                let variable = self.fields.int("treasure_savegame_variable").unwrap_or(-1);
                if !(-1..=MAX_SAVEGAME_VARIABLE).contains(&variable) {
                    return field_error(
                        "treasure_savegame_variable",
                        "savegame variable out of range",
                    );
                }
            }
            EntityKind::JumpSensor => {
                let length = self.fields.int("jump_length").unwrap_or(0);
                if length <= 0 || length % 8 != 0 {
                    return field_error("jump_length", "must be a positive multiple of 8");
                }
            }
            EntityKind::Enemy => {
                let rank = self.fields.int("rank").unwrap_or(0);
                if !(0..=2).contains(&rank) {
                    return field_error("rank", "expected 0 (normal), 1 (miniboss) or 2 (boss)");
                }
                let variable = self.fields.int("savegame_variable").unwrap_or(-1);
                if !(-1..=MAX_SAVEGAME_VARIABLE).contains(&variable) {
                    return field_error("savegame_variable", "savegame variable out of range");
                }
                check_pickable(
                    self.fields.int("pickable_subtype").unwrap_or(-1),
                    self.fields.int("pickable_savegame_variable").unwrap_or(-1),
                    "pickable_savegame_variable",
                    map,
                )?;
            }
            EntityKind::Tile | EntityKind::DestinationPoint | EntityKind::InteractiveEntity => {}
        }
        Ok(())
    }
}

fn check_aligned(x: i32, y: i32) -> Result<(), MapError> {
    if x.rem_euclid(8) != 0 || y.rem_euclid(8) != 0 {
        return Err(MapError::InvalidPosition { x, y });
    }
    Ok(())
}

fn field_error(field: &str, cause: &str) -> Result<(), MapError> {
    Err(MapError::InvalidField {
        field: field.to_string(),
        cause: cause.to_string(),
    })
}

/// Shared validation of a (pickable subtype, savegame variable) pair
fn check_pickable(
    subtype_id: i32,
    variable: i32,
    variable_field: &str,
    map: &Map,
) -> Result<(), MapError> {
    use crate::kind::PickableKind;

    let subtype = match PickableKind::from_id(subtype_id) {
        Some(k) => k,
        None => return field_error("pickable_subtype", "unknown pickable item"),
    };
    if !(-1..=MAX_SAVEGAME_VARIABLE).contains(&variable) {
        return field_error(variable_field, "savegame variable out of range");
    }
    if subtype.must_be_saved() && variable < 0 {
        return field_error(variable_field, "this item must be saved");
    }
    if subtype.dungeon_only() && !map.is_dungeon() {
        return field_error("pickable_subtype", "this item only exists in dungeons");
    }
    if subtype == PickableKind::SmallKey && map.small_keys_variable() < 0 {
        return field_error("pickable_subtype", "small keys are not enabled on this map");
    }
    Ok(())
}
