//! Map loading
//!
//! The first line is the header, every following line one entity record.
//! A tile referencing a pattern absent from the tileset is dropped with the
//! map's `bad_tiles` flag raised; any other malformed line aborts the load.
//! Parsing builds into a fresh map, so a failed load leaves nothing behind.

use crate::record::RecordReader;
use crate::FormatError;
use log::warn;
use mapforge_core::{
    Entity, EntityKind, Layer, Map, Point, ProjectContext, ResourceKind, Subtype, TilesetProvider,
};

/// Parse a complete map file
pub fn parse_map(
    name: &str,
    contents: &str,
    tilesets: &dyn TilesetProvider,
) -> Result<Map, FormatError> {
    let mut lines = contents.lines().enumerate();

    let (_, header) = lines
        .next()
        .ok_or_else(|| FormatError::parse(1, "missing header line"))?;
    let mut map = parse_header(name, header, tilesets)?;

    for (index, text) in lines {
        let line = index + 1;
        if text.is_empty() {
            continue;
        }
        parse_entity_line(&mut map, line, text)?;
    }
    Ok(map)
}

/// Read a map from the project's store, resolving its display name through
/// the registry
pub fn load_map(map_id: &str, ctx: &ProjectContext) -> Result<Map, FormatError> {
    let contents = ctx.maps.read(map_id)?;
    let name = ctx
        .registry
        .name_of(ResourceKind::Map, map_id)
        .unwrap_or_else(|| map_id.to_string());
    let mut map = parse_map(&name, &contents, ctx.tilesets.as_ref())?;
    map.assign_id(map_id);
    Ok(map)
}

fn parse_header(
    name: &str,
    header: &str,
    tilesets: &dyn TilesetProvider,
) -> Result<Map, FormatError> {
    let mut r = RecordReader::new(header, 1);
    let width = r.next_u32()?;
    let height = r.next_u32()?;
    let world = r.next_i32()?;
    let floor = r.next_i32()?;
    let location_x = r.next_i32()?;
    let location_y = r.next_i32()?;
    let small_keys_variable = r.next_i32()?;
    let tileset_id = r.next_str()?;
    let music_id = r.next_str()?;

    let mut map = Map::new(name);
    let constraint = |e: mapforge_core::MapError| FormatError::parse(1, e);
    map.set_size(width, height).map_err(constraint)?;
    map.set_world(world).map_err(constraint)?;
    map.set_floor(floor).map_err(constraint)?;
    map.set_location(Point::new(location_x, location_y));
    map.set_small_keys_variable(small_keys_variable)
        .map_err(constraint)?;
    if !tileset_id.is_empty() {
        map.set_tileset(tileset_id, tilesets).map_err(constraint)?;
    }
    map.set_music(music_id);
    Ok(map)
}

fn parse_entity_line(map: &mut Map, line: usize, text: &str) -> Result<(), FormatError> {
    let mut r = RecordReader::new(text, line);
    let tag = r.next_i32()?;
    let kind = EntityKind::from_index(tag)
        .ok_or_else(|| FormatError::parse(line, format!("unknown entity type {tag}")))?;
    let layer_index = r.next_i32()?;
    let layer = Layer::from_index(layer_index)
        .ok_or_else(|| FormatError::parse(line, format!("invalid layer {layer_index}")))?;
    let x = r.next_i32()?;
    let y = r.next_i32()?;
    let constraint = |e: mapforge_core::MapError| FormatError::parse(line, e);

    if kind == EntityKind::Tile {
        let width = r.next_u32()?;
        let height = r.next_u32()?;
        let pattern_id = r.next_i32()?;
        let repeat_x = r.next_u32()?;

        let tileset = map
            .tileset()
            .ok_or_else(|| FormatError::parse(line, "tile record but no tileset selected"))?;
        let pattern = match tileset.pattern(pattern_id) {
            Some(pattern) => *pattern,
            None => {
                // deliberate tolerance: one bad tile must not block the load
                warn!(
                    "line {}: tile pattern {} does not exist in tileset '{}', dropping tile",
                    line,
                    pattern_id,
                    map.tileset_id()
                );
                map.mark_bad_tiles();
                return Ok(());
            }
        };

        let mut tile = Entity::new_tile(pattern_id, &pattern, 0, 0);
        tile.set_layer(layer);
        tile.set_top_left(x, y).map_err(constraint)?;
        tile.set_size_unchecked(width, height).map_err(constraint)?;
        if repeat_x != tile.repeat_x() {
            return Err(FormatError::parse(
                line,
                format!("repeat count {} does not match width {}", repeat_x, width),
            ));
        }
        map.add_entity(tile);
        return Ok(());
    }

    let caps = kind.capabilities();
    let mut entity = map.create_entity(kind, 0, 0);
    entity.set_layer(layer);
    entity.set_origin_position(x, y).map_err(constraint)?;
    if caps.size_variable {
        let width = r.next_u32()?;
        let height = r.next_u32()?;
        entity.set_size_unchecked(width, height).map_err(constraint)?;
    }
    if caps.has_name {
        entity.set_name(r.next_str()?).map_err(constraint)?;
    }
    if caps.directions > 1 {
        entity.set_direction(r.next_i32()?).map_err(constraint)?;
    }
    if caps.has_subtype {
        let subtype_id = r.next_i32()?;
        let subtype = Subtype::from_id(kind, subtype_id)
            .ok_or_else(|| FormatError::parse(line, format!("unknown subtype {subtype_id}")))?;
        entity.set_subtype(subtype).map_err(constraint)?;
    }
    for spec in kind.field_schema() {
        match spec.ty {
            mapforge_core::FieldType::Int => {
                let value = r.next_i32()?;
                entity.fields_mut().set_int(spec.name, value);
            }
            mapforge_core::FieldType::Str => {
                let value = r.next_str()?;
                entity.fields_mut().set_text(spec.name, value);
            }
        }
    }
    map.add_entity(entity);
    Ok(())
}
