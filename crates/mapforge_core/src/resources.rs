//! Project collaborators: resource registry, map storage, project context
//!
//! The core never reads process-wide state; callers construct a
//! [`ProjectContext`] and pass it where needed.

use crate::error::ResourceError;
use crate::tileset::TilesetProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// The kinds of project resources the map core refers to by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Map,
    Tileset,
    Music,
}

/// Maps resource ids to display names and allocates fresh ids
pub trait ResourceRegistry {
    fn name_of(&self, kind: ResourceKind, id: &str) -> Option<String>;
    fn set_name_of(&mut self, kind: ResourceKind, id: &str, name: &str);
    fn new_id(&mut self, kind: ResourceKind) -> String;
    fn persist(&mut self) -> Result<(), ResourceError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryData {
    maps: BTreeMap<String, String>,
    tilesets: BTreeMap<String, String>,
    musics: BTreeMap<String, String>,
    next_id: BTreeMap<String, u32>,
}

impl RegistryData {
    fn table(&self, kind: ResourceKind) -> &BTreeMap<String, String> {
        match kind {
            ResourceKind::Map => &self.maps,
            ResourceKind::Tileset => &self.tilesets,
            ResourceKind::Music => &self.musics,
        }
    }

    fn table_mut(&mut self, kind: ResourceKind) -> &mut BTreeMap<String, String> {
        match kind {
            ResourceKind::Map => &mut self.maps,
            ResourceKind::Tileset => &mut self.tilesets,
            ResourceKind::Music => &mut self.musics,
        }
    }

    fn counter_key(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Map => "map",
            ResourceKind::Tileset => "tileset",
            ResourceKind::Music => "music",
        }
    }

    fn allocate(&mut self, kind: ResourceKind) -> String {
        let counter = self.next_id.entry(Self::counter_key(kind).to_string()).or_insert(1);
        let id = counter.to_string();
        *counter += 1;
        id
    }
}

/// An in-memory registry for tests and scratch projects
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    data: RegistryData,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceRegistry for MemoryRegistry {
    fn name_of(&self, kind: ResourceKind, id: &str) -> Option<String> {
        self.data.table(kind).get(id).cloned()
    }

    fn set_name_of(&mut self, kind: ResourceKind, id: &str, name: &str) {
        self.data.table_mut(kind).insert(id.to_string(), name.to_string());
    }

    fn new_id(&mut self, kind: ResourceKind) -> String {
        self.data.allocate(kind)
    }

    fn persist(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// A registry persisted as one JSON file in the project directory
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    data: RegistryData,
}

impl FileRegistry {
    /// Open the registry file, creating an empty registry if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            RegistryData::default()
        };
        Ok(Self { path, data })
    }
}

impl ResourceRegistry for FileRegistry {
    fn name_of(&self, kind: ResourceKind, id: &str) -> Option<String> {
        self.data.table(kind).get(id).cloned()
    }

    fn set_name_of(&mut self, kind: ResourceKind, id: &str, name: &str) {
        self.data.table_mut(kind).insert(id.to_string(), name.to_string());
    }

    fn new_id(&mut self, kind: ResourceKind) -> String {
        self.data.allocate(kind)
    }

    fn persist(&mut self) -> Result<(), ResourceError> {
        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Read/write access to map files by map id
pub trait MapStore {
    fn read(&self, map_id: &str) -> io::Result<String>;
    fn write(&mut self, map_id: &str, contents: &str) -> io::Result<()>;
}

/// An in-memory store for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapStore for MemoryStore {
    fn read(&self, map_id: &str) -> io::Result<String> {
        self.files
            .get(map_id)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no map '{map_id}'")))
    }

    fn write(&mut self, map_id: &str, contents: &str) -> io::Result<()> {
        self.files.insert(map_id.to_string(), contents.to_string());
        Ok(())
    }
}

/// One `map<id>.zmap` text file per map under a project directory
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, map_id: &str) -> PathBuf {
        self.root.join(format!("map{map_id}.zmap"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MapStore for DirStore {
    fn read(&self, map_id: &str) -> io::Result<String> {
        std::fs::read_to_string(self.path_of(map_id))
    }

    fn write(&mut self, map_id: &str, contents: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.path_of(map_id), contents)
    }
}

/// Everything the map core needs from the surrounding project, bundled so
/// callers pass one explicit context instead of reaching for globals
pub struct ProjectContext {
    pub tilesets: Box<dyn TilesetProvider>,
    pub registry: Box<dyn ResourceRegistry>,
    pub maps: Box<dyn MapStore>,
}

impl ProjectContext {
    pub fn new(
        tilesets: Box<dyn TilesetProvider>,
        registry: Box<dyn ResourceRegistry>,
        maps: Box<dyn MapStore>,
    ) -> Self {
        Self {
            tilesets,
            registry,
            maps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_registry_ids() {
        let mut registry = MemoryRegistry::new();
        assert_eq!(registry.new_id(ResourceKind::Map), "1");
        assert_eq!(registry.new_id(ResourceKind::Map), "2");
        assert_eq!(registry.new_id(ResourceKind::Tileset), "1");

        registry.set_name_of(ResourceKind::Map, "1", "Village");
        assert_eq!(
            registry.name_of(ResourceKind::Map, "1"),
            Some("Village".to_string())
        );
        assert_eq!(registry.name_of(ResourceKind::Map, "9"), None);
    }

    #[test]
    fn test_file_registry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");

        let mut registry = FileRegistry::open(&path).unwrap();
        let id = registry.new_id(ResourceKind::Map);
        registry.set_name_of(ResourceKind::Map, &id, "Castle");
        registry.persist().unwrap();

        let reopened = FileRegistry::open(&path).unwrap();
        assert_eq!(
            reopened.name_of(ResourceKind::Map, &id),
            Some("Castle".to_string())
        );
    }

    #[test]
    fn test_file_registry_counter_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");

        let mut registry = FileRegistry::open(&path).unwrap();
        assert_eq!(registry.new_id(ResourceKind::Map), "1");
        registry.persist().unwrap();

        let mut reopened = FileRegistry::open(&path).unwrap();
        assert_eq!(reopened.new_id(ResourceKind::Map), "2");
    }

    #[test]
    fn test_dir_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path());

        store.write("7", "320\t240\n").unwrap();
        assert_eq!(store.read("7").unwrap(), "320\t240\n");
        assert!(store.read("8").is_err());
        assert!(dir.path().join("map7.zmap").exists());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.read("1").is_err());
        store.write("1", "contents").unwrap();
        assert_eq!(store.read("1").unwrap(), "contents");
    }
}
