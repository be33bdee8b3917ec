//! Read-only tileset snapshots consumed by the map core
//!
//! The tileset editor is a peer system; the map core only needs to know,
//! for each pattern id, its pixel size, default layer and obstacle kind.

use crate::error::TilesetError;
use crate::geometry::Size;
use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The obstacle behavior of a tile pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Obstacle {
    #[default]
    None,
    Full,
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
    ShallowWater,
    DeepWater,
}

/// One tile pattern as the map core sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePattern {
    pub size: Size,
    pub default_layer: Layer,
    pub obstacle: Obstacle,
}

/// An immutable snapshot of a tileset's patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub id: String,
    patterns: HashMap<i32, TilePattern>,
}

impl Tileset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patterns: HashMap::new(),
        }
    }

    pub fn with_pattern(mut self, id: i32, pattern: TilePattern) -> Self {
        self.patterns.insert(id, pattern);
        self
    }

    pub fn pattern(&self, id: i32) -> Option<&TilePattern> {
        self.patterns.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.patterns.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Resolves tileset ids to snapshots
pub trait TilesetProvider {
    fn load(&self, id: &str) -> Result<Tileset, TilesetError>;
}

/// An in-memory provider, used by tests and small tools
#[derive(Debug, Clone, Default)]
pub struct MemoryTilesets {
    tilesets: HashMap<String, Tileset>,
}

impl MemoryTilesets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tileset: Tileset) {
        self.tilesets.insert(tileset.id.clone(), tileset);
    }
}

impl TilesetProvider for MemoryTilesets {
    fn load(&self, id: &str) -> Result<Tileset, TilesetError> {
        self.tilesets
            .get(id)
            .cloned()
            .ok_or_else(|| TilesetError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider() {
        let mut provider = MemoryTilesets::new();
        provider.insert(Tileset::new("forest").with_pattern(
            1,
            TilePattern {
                size: Size::new(16, 16),
                default_layer: Layer::Low,
                obstacle: Obstacle::None,
            },
        ));

        let tileset = provider.load("forest").unwrap();
        assert!(tileset.contains(1));
        assert!(!tileset.contains(2));

        assert_eq!(
            provider.load("desert"),
            Err(TilesetError::NotFound("desert".to_string()))
        );
    }
}
