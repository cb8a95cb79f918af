//! Themed dungeon layouts, carving into a chunk store, and enemy population tables.
#![forbid(unsafe_code)]

pub mod carve;
pub mod catalog;
pub mod error;
pub mod layout;
pub mod population;
pub mod rng;
pub mod theme;

pub use carve::{CarveOutcome, Carver, ChestSite, PickupKind, PickupSite, carve, fresh_instance_store};
pub use catalog::{
    CarveParams, ChestDef, ChestVariant, DungeonCatalog, EnemyStats, LayoutParams, PortalDef,
    StagePools, TerrainOverrides, ThemeDef,
};
pub use error::DungeonError;
pub use layout::{
    Axis, Corridor, CorridorKind, DungeonLayout, MIN_CORRIDOR_WIDTH, RelativeAxis, Room, RoomId,
    RoomKind, generate_layout,
};
pub use population::{EnemySpawnPool, SpawnPlan, get_enemy_pool, plan_spawns, stage_for_room};
pub use theme::ThemeId;
