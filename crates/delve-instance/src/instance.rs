use std::collections::BTreeMap;

use delve_dungeon::{ChestVariant, DungeonLayout, RoomId, ThemeId};
use delve_geom::Vec3;
use delve_world::ChunkStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnemyId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InteractableId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChestId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: EnemyId,
    /// Instance the enemy lives in. A handle, not ownership.
    pub instance: InstanceId,
    pub type_id: String,
    pub is_boss: bool,
    pub room: RoomId,
    pub stage: u8,
    pub position: Vec3,
    pub max_hp: u32,
    pub hp: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Pickup { item: String, amount: u32 },
    LockedChest { chest_id: ChestId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interactable {
    pub id: InteractableId,
    pub position: Vec3,
    pub payload: Payload,
    pub consumed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockedChest {
    pub required_key_id: String,
    pub unlocked: bool,
    pub variant: ChestVariant,
    pub loot_item: String,
    pub loot_amount: u32,
}

/// A carved, populated dungeon. Owns its block store; dropping the instance drops it.
pub struct DungeonInstance {
    pub id: InstanceId,
    pub portal_id: String,
    pub theme: ThemeId,
    pub seed: u64,
    pub spawn_point: Vec3,
    pub exit_point: Vec3,
    pub surface_y: i32,
    pub layout: DungeonLayout,
    pub enemies: Vec<Enemy>,
    pub interactables: Vec<Interactable>,
    pub locked_chests: BTreeMap<ChestId, LockedChest>,
    pub store: ChunkStore,
}

impl std::fmt::Debug for DungeonInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DungeonInstance")
            .field("id", &self.id)
            .field("portal_id", &self.portal_id)
            .field("theme", &self.theme)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl DungeonInstance {
    pub fn interactable(&self, id: InteractableId) -> Option<&Interactable> {
        self.interactables.iter().find(|i| i.id == id)
    }

    pub fn bosses(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_boss)
    }

    /// Nearest unconsumed interactable within `reach` of `pos`.
    pub fn nearest_interactable(&self, pos: Vec3, reach: f32) -> Option<&Interactable> {
        self.interactables
            .iter()
            .filter(|i| !i.consumed)
            .map(|i| (i, (i.position - pos).length()))
            .filter(|(_, d)| *d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}
