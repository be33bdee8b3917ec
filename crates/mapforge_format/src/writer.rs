//! Map saving
//!
//! Emits the header line, then every entity of every layer (low,
//! intermediate, high). Saving requires a selected tileset and valid
//! entity properties; the write itself is all-or-nothing.

use crate::record::RecordWriter;
use crate::FormatError;
use mapforge_core::{Entity, EntityKind, FieldType, Map, MapError, ProjectContext, ResourceKind};

/// Render a map to its text form, validating it first
pub fn serialize_map(map: &Map) -> Result<String, FormatError> {
    if map.tileset_id().is_empty() {
        return Err(MapError::NoTileset.into());
    }
    map.check_entities()?;

    let mut out = String::new();
    out.push_str(&header_record(map));
    out.push('\n');
    for layer in mapforge_core::Layer::ALL {
        for entity in map.entities(layer).iter() {
            out.push_str(&entity_record(entity));
            out.push('\n');
        }
    }
    Ok(out)
}

/// Serialize the map and write it through the project context.
///
/// A new map gets its registry id here; the registry display name is
/// updated and persisted after a successful write.
pub fn save_map(map: &mut Map, ctx: &mut ProjectContext) -> Result<(), FormatError> {
    let contents = serialize_map(map)?;
    let id = match map.id() {
        Some(existing) => existing.to_string(),
        None => {
            let id = ctx.registry.new_id(ResourceKind::Map);
            map.assign_id(id.clone());
            id
        }
    };
    ctx.maps.write(&id, &contents)?;
    ctx.registry.set_name_of(ResourceKind::Map, &id, map.name());
    ctx.registry.persist()?;
    Ok(())
}

fn header_record(map: &Map) -> String {
    let mut w = RecordWriter::new();
    let size = map.size();
    let location = map.location();
    w.push_u32(size.width);
    w.push_u32(size.height);
    w.push_i32(map.world());
    w.push_i32(map.floor());
    w.push_i32(location.x);
    w.push_i32(location.y);
    w.push_i32(map.small_keys_variable());
    w.push_str(map.tileset_id());
    w.push_str(map.music_id());
    w.finish()
}

fn entity_record(entity: &Entity) -> String {
    let caps = entity.capabilities();
    let mut w = RecordWriter::new();
    w.push_i32(entity.kind().index());
    w.push_i32(entity.layer().index() as i32);
    let origin = entity.origin_position();
    w.push_i32(origin.x);
    w.push_i32(origin.y);
    if caps.size_variable {
        let size = entity.size();
        w.push_u32(size.width);
        w.push_u32(size.height);
    }
    if caps.has_name {
        w.push_str(entity.name().unwrap_or(""));
    }
    if caps.directions > 1 {
        w.push_i32(entity.direction());
    }
    if caps.has_subtype {
        w.push_i32(entity.subtype().map(|s| s.id()).unwrap_or(0));
    }
    if entity.kind() == EntityKind::Tile {
        w.push_i32(entity.pattern_id().unwrap_or(0));
        w.push_u32(entity.repeat_x());
    } else {
        for spec in entity.kind().field_schema() {
            match spec.ty {
                FieldType::Int => w.push_i32(entity.fields().int(spec.name).unwrap_or(0)),
                FieldType::Str => w.push_str(entity.fields().text(spec.name).unwrap_or("")),
            }
        }
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{load_map, parse_map};
    use mapforge_core::{
        DirStore, Layer, MemoryRegistry, MemoryTilesets, Obstacle, Size, TilePattern, Tileset,
    };

    fn forest() -> MemoryTilesets {
        let mut provider = MemoryTilesets::new();
        provider.insert(Tileset::new("forest").with_pattern(
            1,
            TilePattern {
                size: Size::new(16, 16),
                default_layer: Layer::Low,
                obstacle: Obstacle::None,
            },
        ));
        provider
    }

    #[test]
    fn test_fixture_round_trips_byte_for_byte() {
        let contents = "320\t240\t0\t-100\t0\t0\t-1\tforest\tnone\n0\t0\t0\t0\t16\t16\t1\t1\n";
        let map = parse_map("test", contents, &forest()).unwrap();
        assert_eq!(serialize_map(&map).unwrap(), contents);
    }

    #[test]
    fn test_full_map_round_trips() {
        let contents = "640\t480\t-1\t2\t8\t16\t30\tforest\tvillage\n\
                        0\t0\t0\t0\t48\t16\t1\t3\n\
                        5\t0\t24\t32\tchest\t0\t0\t1\t-1\n\
                        2\t1\t32\t48\t16\t16\tteletransporter\t0\t1\t8\tentrance\n\
                        6\t1\t0\t0\t32\t8\tjump_sensor\t4\t40\n\
                        7\t2\t16\t21\tenemy\t1\t2\t0\t-1\t-1\t-1\n";
        let provider = forest();
        let map = parse_map("test", contents, &provider).unwrap();
        assert_eq!(serialize_map(&map).unwrap(), contents);
    }

    #[test]
    fn test_save_requires_tileset() {
        let map = Map::new("test");
        assert!(matches!(
            serialize_map(&map),
            Err(FormatError::Map(MapError::NoTileset))
        ));
    }

    #[test]
    fn test_save_rejects_invalid_entity_fields() {
        let provider = forest();
        let mut map = Map::new("test");
        map.set_tileset("forest", &provider).unwrap();
        let teletransporter = map.create_entity(EntityKind::Teletransporter, 0, 0);
        map.add_entity(teletransporter);

        // no destination point selected yet
        assert!(matches!(
            serialize_map(&map),
            Err(FormatError::Map(MapError::InvalidField { .. }))
        ));
    }

    #[test]
    fn test_save_assigns_id_and_updates_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ProjectContext::new(
            Box::new(forest()),
            Box::new(MemoryRegistry::new()),
            Box::new(DirStore::new(dir.path())),
        );

        let mut map = Map::new("Village");
        map.set_tileset("forest", ctx.tilesets.as_ref()).unwrap();
        let tile = map.create_tile(1, 0, 0).unwrap();
        map.add_entity(tile);

        save_map(&mut map, &mut ctx).unwrap();
        assert_eq!(map.id(), Some("1"));
        assert_eq!(
            ctx.registry.name_of(ResourceKind::Map, "1"),
            Some("Village".to_string())
        );

        let reloaded = load_map("1", &ctx).unwrap();
        assert_eq!(reloaded.name(), "Village");
        assert_eq!(reloaded.entity_count(), 1);
        assert_eq!(serialize_map(&reloaded).unwrap(), serialize_map(&map).unwrap());
    }
}
