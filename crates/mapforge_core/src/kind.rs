//! The closed registry of entity kinds and their capabilities
//!
//! Each kind declares its capabilities (resizability, name, directions,
//! subtype, resize unit, origin offset) in one table instead of spreading
//! them over virtual overrides. The map file format indexes kinds by the
//! stable integer returned by [`EntityKind::index`].

use crate::geometry::{Point, Size};
use crate::value::Fields;
use serde::{Deserialize, Serialize};

/// The kind of a placed entity, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Tile,
    DestinationPoint,
    Teletransporter,
    PickableItem,
    DestructibleItem,
    Chest,
    JumpSensor,
    Enemy,
    InteractiveEntity,
    TransportableItem,
    MapExit,
}

/// What an entity kind can do, looked up from a compile-time table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the file format stores an explicit width and height
    pub size_variable: bool,
    /// Whether the entity can be resized at all (see also
    /// `Entity::is_resizable` for subtype-dependent cases)
    pub resizable: bool,
    pub has_name: bool,
    /// Number of directions; a direction token is serialized when > 1
    pub directions: u32,
    pub has_subtype: bool,
    /// Resize granularity for resizable kinds
    pub unit: Size,
    /// Offset of the origin point from the top-left corner
    pub origin: Point,
    pub default_size: Size,
}

/// Declared type of a kind-specific field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Str,
}

/// One kind-specific field as it appears in the file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn int_field(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Int,
    }
}

const fn str_field(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Str,
    }
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Tile,
        EntityKind::DestinationPoint,
        EntityKind::Teletransporter,
        EntityKind::PickableItem,
        EntityKind::DestructibleItem,
        EntityKind::Chest,
        EntityKind::JumpSensor,
        EntityKind::Enemy,
        EntityKind::InteractiveEntity,
        EntityKind::TransportableItem,
        EntityKind::MapExit,
    ];

    /// Stable index used as the leading type tag of entity records
    pub fn index(self) -> i32 {
        match self {
            EntityKind::Tile => 0,
            EntityKind::DestinationPoint => 1,
            EntityKind::Teletransporter => 2,
            EntityKind::PickableItem => 3,
            EntityKind::DestructibleItem => 4,
            EntityKind::Chest => 5,
            EntityKind::JumpSensor => 6,
            EntityKind::Enemy => 7,
            EntityKind::InteractiveEntity => 8,
            EntityKind::TransportableItem => 9,
            EntityKind::MapExit => 10,
        }
    }

    pub fn from_index(index: i32) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|k| k.index() == index)
    }

    pub fn capabilities(self) -> Capabilities {
        const UNIT8: Size = Size {
            width: 8,
            height: 8,
        };
        const UNIT16: Size = Size {
            width: 16,
            height: 16,
        };
        const SIZE16: Size = Size {
            width: 16,
            height: 16,
        };
        const ORIGIN0: Point = Point { x: 0, y: 0 };
        const ORIGIN_SPRITE: Point = Point { x: 8, y: 13 };

        match self {
            // The tile unit is a placeholder; instances use their pattern size
            EntityKind::Tile => Capabilities {
                size_variable: true,
                resizable: true,
                has_name: false,
                directions: 0,
                has_subtype: false,
                unit: UNIT8,
                origin: ORIGIN0,
                default_size: SIZE16,
            },
            EntityKind::DestinationPoint => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: true,
                directions: 4,
                has_subtype: false,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::Teletransporter => Capabilities {
                size_variable: true,
                resizable: true,
                has_name: true,
                directions: 0,
                has_subtype: true,
                unit: UNIT16,
                origin: ORIGIN0,
                default_size: SIZE16,
            },
            EntityKind::PickableItem => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: false,
                directions: 0,
                has_subtype: true,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::DestructibleItem => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: false,
                directions: 0,
                has_subtype: true,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::Chest => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: true,
                directions: 0,
                has_subtype: false,
                unit: UNIT8,
                origin: ORIGIN0,
                default_size: SIZE16,
            },
            EntityKind::JumpSensor => Capabilities {
                size_variable: true,
                resizable: true,
                has_name: true,
                directions: 8,
                has_subtype: false,
                unit: UNIT8,
                origin: ORIGIN0,
                default_size: Size {
                    width: 32,
                    height: 8,
                },
            },
            EntityKind::Enemy => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: true,
                directions: 4,
                has_subtype: true,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::InteractiveEntity => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: true,
                directions: 4,
                has_subtype: true,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::TransportableItem => Capabilities {
                size_variable: false,
                resizable: false,
                has_name: false,
                directions: 0,
                has_subtype: true,
                unit: UNIT8,
                origin: ORIGIN_SPRITE,
                default_size: SIZE16,
            },
            EntityKind::MapExit => Capabilities {
                size_variable: true,
                resizable: true,
                has_name: true,
                directions: 0,
                has_subtype: false,
                unit: UNIT16,
                origin: ORIGIN0,
                default_size: SIZE16,
            },
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EntityKind::Tile => "Tile",
            EntityKind::DestinationPoint => "Destination point",
            EntityKind::Teletransporter => "Teletransporter",
            EntityKind::PickableItem => "Pickable item",
            EntityKind::DestructibleItem => "Destructible item",
            EntityKind::Chest => "Chest",
            EntityKind::JumpSensor => "Jump sensor",
            EntityKind::Enemy => "Enemy",
            EntityKind::InteractiveEntity => "Interactive entity",
            EntityKind::TransportableItem => "Transportable item",
            EntityKind::MapExit => "Map exit",
        }
    }

    /// Base name given to freshly created entities of nameable kinds
    pub fn default_name(self) -> Option<&'static str> {
        match self {
            EntityKind::DestinationPoint => Some("destination_point"),
            EntityKind::Teletransporter => Some("teletransporter"),
            EntityKind::Chest => Some("chest"),
            EntityKind::JumpSensor => Some("jump_sensor"),
            EntityKind::Enemy => Some("enemy"),
            EntityKind::InteractiveEntity => Some("interactive_entity"),
            EntityKind::MapExit => Some("map_exit"),
            _ => None,
        }
    }

    /// The kind-specific fields, in file-format order.
    ///
    /// Tile is absent on purpose: its pattern id and repeat count are
    /// handled by the serializer because the repeat count derives from the
    /// entity size.
    pub fn field_schema(self) -> &'static [FieldSpec] {
        const DESTINATION_POINT: &[FieldSpec] = &[int_field("visible")];
        const TELETRANSPORTER: &[FieldSpec] = &[
            int_field("transition"),
            str_field("destination_map"),
            str_field("destination_point"),
        ];
        const PICKABLE: &[FieldSpec] = &[int_field("savegame_variable")];
        const DESTRUCTIBLE: &[FieldSpec] = &[
            int_field("pickable_subtype"),
            int_field("pickable_savegame_variable"),
        ];
        const CHEST: &[FieldSpec] = &[
            int_field("big_chest"),
            int_field("treasure_content"),
            int_field("treasure_amount"),
            int_field("treasure_savegame_variable"),
        ];
        const JUMP_SENSOR: &[FieldSpec] = &[int_field("jump_length")];
        const ENEMY: &[FieldSpec] = &[
            int_field("rank"),
            int_field("savegame_variable"),
            int_field("pickable_subtype"),
            int_field("pickable_savegame_variable"),
        ];
        const INTERACTIVE: &[FieldSpec] = &[str_field("sprite"), str_field("message")];
        const MAP_EXIT: &[FieldSpec] = &[
            int_field("transition"),
            str_field("destination_map"),
            str_field("destination_point"),
        ];

        match self {
            EntityKind::Tile => &[],
            EntityKind::DestinationPoint => DESTINATION_POINT,
            EntityKind::Teletransporter => TELETRANSPORTER,
            EntityKind::PickableItem => PICKABLE,
            EntityKind::DestructibleItem | EntityKind::TransportableItem => DESTRUCTIBLE,
            EntityKind::Chest => CHEST,
            EntityKind::JumpSensor => JUMP_SENSOR,
            EntityKind::Enemy => ENEMY,
            EntityKind::InteractiveEntity => INTERACTIVE,
            EntityKind::MapExit => MAP_EXIT,
        }
    }

    /// Default values of the kind-specific fields for a new entity
    pub fn default_fields(self) -> Fields {
        let mut fields = Fields::new();
        match self {
            EntityKind::Tile => {
                fields.set_int("pattern", 0);
            }
            EntityKind::DestinationPoint => {
                fields.set_int("visible", 1);
            }
            EntityKind::Teletransporter | EntityKind::MapExit => {
                fields.set_int("transition", 1);
                fields.set_text("destination_map", "");
                fields.set_text("destination_point", "");
            }
            EntityKind::PickableItem => {
                fields.set_int("savegame_variable", -1);
            }
            EntityKind::DestructibleItem | EntityKind::TransportableItem => {
                fields.set_int("pickable_subtype", -1);
                fields.set_int("pickable_savegame_variable", -1);
            }
            EntityKind::Chest => {
                fields.set_int("big_chest", 0);
                fields.set_int("treasure_content", 0);
                fields.set_int("treasure_amount", 1);
                fields.set_int("treasure_savegame_variable", -1);
            }
            EntityKind::JumpSensor => {
                fields.set_int("jump_length", 40);
            }
            EntityKind::Enemy => {
                fields.set_int("rank", 0);
                fields.set_int("savegame_variable", -1);
                fields.set_int("pickable_subtype", -1);
                fields.set_int("pickable_savegame_variable", -1);
            }
            EntityKind::InteractiveEntity => {
                fields.set_text("sprite", "_none");
                fields.set_text("message", "_none");
            }
        }
        fields
    }

    /// Default subtype for kinds that carry one
    pub fn default_subtype(self) -> Option<Subtype> {
        match self {
            EntityKind::Teletransporter => {
                Some(Subtype::Teletransporter(TeletransporterKind::Invisible))
            }
            EntityKind::PickableItem => Some(Subtype::Pickable(PickableKind::Random)),
            EntityKind::DestructibleItem | EntityKind::TransportableItem => {
                Some(Subtype::Destructible(DestructibleKind::Pot))
            }
            EntityKind::Enemy => Some(Subtype::Enemy(EnemyBreed::GreenSoldier)),
            EntityKind::InteractiveEntity => Some(Subtype::Interactive(InteractiveKind::Custom)),
            _ => None,
        }
    }
}

/// The subtype of a teletransporter, controlling its sprite and resizability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeletransporterKind {
    /// An invisible detection zone, freely resizable
    Invisible,
    Yellow,
    Blue,
}

impl TeletransporterKind {
    pub fn id(self) -> i32 {
        match self {
            TeletransporterKind::Invisible => 0,
            TeletransporterKind::Yellow => 1,
            TeletransporterKind::Blue => 2,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(TeletransporterKind::Invisible),
            1 => Some(TeletransporterKind::Yellow),
            2 => Some(TeletransporterKind::Blue),
            _ => None,
        }
    }
}

/// What a pickable item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickableKind {
    /// Chosen by the engine at runtime
    Random,
    None,
    GreenRupee,
    BlueRupee,
    RedRupee,
    Heart,
    SmallMagic,
    BigMagic,
    Fairy,
    Bomb1,
    Bomb5,
    Bomb10,
    Arrow1,
    Arrow5,
    Arrow10,
    SmallKey,
}

impl PickableKind {
    pub fn id(self) -> i32 {
        match self {
            PickableKind::Random => -1,
            PickableKind::None => 0,
            PickableKind::GreenRupee => 1,
            PickableKind::BlueRupee => 2,
            PickableKind::RedRupee => 3,
            PickableKind::Heart => 4,
            PickableKind::SmallMagic => 5,
            PickableKind::BigMagic => 6,
            PickableKind::Fairy => 7,
            PickableKind::Bomb1 => 8,
            PickableKind::Bomb5 => 9,
            PickableKind::Bomb10 => 10,
            PickableKind::Arrow1 => 11,
            PickableKind::Arrow5 => 12,
            PickableKind::Arrow10 => 13,
            PickableKind::SmallKey => 14,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        const ALL: [PickableKind; 16] = [
            PickableKind::Random,
            PickableKind::None,
            PickableKind::GreenRupee,
            PickableKind::BlueRupee,
            PickableKind::RedRupee,
            PickableKind::Heart,
            PickableKind::SmallMagic,
            PickableKind::BigMagic,
            PickableKind::Fairy,
            PickableKind::Bomb1,
            PickableKind::Bomb5,
            PickableKind::Bomb10,
            PickableKind::Arrow1,
            PickableKind::Arrow5,
            PickableKind::Arrow10,
            PickableKind::SmallKey,
        ];
        ALL.into_iter().find(|k| k.id() == id)
    }

    /// Whether obtaining this item must be recorded in the savegame
    pub fn must_be_saved(self) -> bool {
        matches!(self, PickableKind::SmallKey)
    }

    /// Whether this item only makes sense on a dungeon map
    pub fn dungeon_only(self) -> bool {
        matches!(self, PickableKind::SmallKey)
    }
}

/// What a destructible or transportable item looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestructibleKind {
    Pot,
    Skull,
    Bush,
    StoneSmallWhite,
    StoneSmallBlack,
    Grass,
}

impl DestructibleKind {
    pub fn id(self) -> i32 {
        match self {
            DestructibleKind::Pot => 0,
            DestructibleKind::Skull => 1,
            DestructibleKind::Bush => 2,
            DestructibleKind::StoneSmallWhite => 3,
            DestructibleKind::StoneSmallBlack => 4,
            DestructibleKind::Grass => 5,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(DestructibleKind::Pot),
            1 => Some(DestructibleKind::Skull),
            2 => Some(DestructibleKind::Bush),
            3 => Some(DestructibleKind::StoneSmallWhite),
            4 => Some(DestructibleKind::StoneSmallBlack),
            5 => Some(DestructibleKind::Grass),
            _ => None,
        }
    }
}

/// The breed of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyBreed {
    GreenSoldier,
    Bubble,
    Tentacle,
    Minillosaur,
}

impl EnemyBreed {
    pub fn id(self) -> i32 {
        match self {
            EnemyBreed::GreenSoldier => 0,
            EnemyBreed::Bubble => 1,
            EnemyBreed::Tentacle => 2,
            EnemyBreed::Minillosaur => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(EnemyBreed::GreenSoldier),
            1 => Some(EnemyBreed::Bubble),
            2 => Some(EnemyBreed::Tentacle),
            3 => Some(EnemyBreed::Minillosaur),
            _ => None,
        }
    }
}

/// The behavior of an interactive entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractiveKind {
    Custom,
    NonPlayingCharacter,
    Sign,
    WaterForBottle,
}

impl InteractiveKind {
    pub fn id(self) -> i32 {
        match self {
            InteractiveKind::Custom => 0,
            InteractiveKind::NonPlayingCharacter => 1,
            InteractiveKind::Sign => 2,
            InteractiveKind::WaterForBottle => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(InteractiveKind::Custom),
            1 => Some(InteractiveKind::NonPlayingCharacter),
            2 => Some(InteractiveKind::Sign),
            3 => Some(InteractiveKind::WaterForBottle),
            _ => None,
        }
    }
}

/// A kind-specific subtype value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtype {
    Teletransporter(TeletransporterKind),
    Pickable(PickableKind),
    Destructible(DestructibleKind),
    Enemy(EnemyBreed),
    Interactive(InteractiveKind),
}

impl Subtype {
    /// Integer id written to the map file
    pub fn id(self) -> i32 {
        match self {
            Subtype::Teletransporter(k) => k.id(),
            Subtype::Pickable(k) => k.id(),
            Subtype::Destructible(k) => k.id(),
            Subtype::Enemy(k) => k.id(),
            Subtype::Interactive(k) => k.id(),
        }
    }

    /// Resolve a subtype id in the context of an entity kind
    pub fn from_id(kind: EntityKind, id: i32) -> Option<Subtype> {
        match kind {
            EntityKind::Teletransporter => {
                TeletransporterKind::from_id(id).map(Subtype::Teletransporter)
            }
            EntityKind::PickableItem => PickableKind::from_id(id).map(Subtype::Pickable),
            EntityKind::DestructibleItem | EntityKind::TransportableItem => {
                DestructibleKind::from_id(id).map(Subtype::Destructible)
            }
            EntityKind::Enemy => EnemyBreed::from_id(id).map(Subtype::Enemy),
            EntityKind::InteractiveEntity => InteractiveKind::from_id(id).map(Subtype::Interactive),
            _ => None,
        }
    }

    /// Whether this subtype is valid for the given kind
    pub fn matches_kind(self, kind: EntityKind) -> bool {
        matches!(
            (self, kind),
            (Subtype::Teletransporter(_), EntityKind::Teletransporter)
                | (Subtype::Pickable(_), EntityKind::PickableItem)
                | (Subtype::Destructible(_), EntityKind::DestructibleItem)
                | (Subtype::Destructible(_), EntityKind::TransportableItem)
                | (Subtype::Enemy(_), EntityKind::Enemy)
                | (Subtype::Interactive(_), EntityKind::InteractiveEntity)
        )
    }
}
