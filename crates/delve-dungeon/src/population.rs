use delve_geom::{BlockBox, BlockPos, Vec3};
use delve_world::SpatialQuery;
use rand::Rng;

use crate::carve::CarveOutcome;
use crate::catalog::DungeonCatalog;
use crate::error::DungeonError;
use crate::layout::{RoomId, RoomKind};
use crate::rng::population_rng;
use crate::theme::ThemeId;

const PLACEMENT_TRIES: usize = 16;
// Minions keep this far from walls so pillars and torches never bury them.
const WALL_MARGIN: i32 = 3;

/// Enemies available to one stage of one theme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnemySpawnPool {
    pub adds: Vec<String>,
    pub boss: Option<String>,
}

/// Stage a room's enemies are drawn from. Fight rooms ramp 1, 2, 3, 3 and the boss room
/// is stage 4.
pub fn stage_for_room(kind: RoomKind) -> Option<u8> {
    match kind {
        RoomKind::Fight1 => Some(1),
        RoomKind::Fight2 => Some(2),
        RoomKind::Fight3 | RoomKind::Fight4 => Some(3),
        RoomKind::Boss => Some(4),
        _ => None,
    }
}

pub fn get_enemy_pool(catalog: &DungeonCatalog, theme: ThemeId, stage: u8) -> Result<EnemySpawnPool, DungeonError> {
    let def = catalog.theme(theme)?;
    let adds = def
        .pools
        .adds(stage)
        .ok_or_else(|| DungeonError::config(format!("stage {stage} is outside 1..=4")))?;
    if adds.is_empty() {
        return Err(DungeonError::config(format!("theme {theme} stage {stage} has no adds")));
    }
    let boss = if stage == 4 {
        if def.boss.is_empty() {
            return Err(DungeonError::config(format!("theme {theme} has no boss")));
        }
        Some(def.boss.clone())
    } else {
        None
    };
    Ok(EnemySpawnPool {
        adds: adds.to_vec(),
        boss,
    })
}

/// One enemy to be spawned into an instance.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPlan {
    pub room: RoomId,
    pub room_kind: RoomKind,
    pub stage: u8,
    pub type_id: String,
    pub is_boss: bool,
    pub max_hp: u32,
    pub position: Vec3,
}

/// Draws the enemy roster for a carved instance: one add per fight room, and the boss
/// plus `boss_room_minions` adds in the boss room. Every position stands on the floor.
pub fn plan_spawns<Q: SpatialQuery + ?Sized>(
    catalog: &DungeonCatalog,
    outcome: &CarveOutcome,
    query: &Q,
) -> Result<Vec<SpawnPlan>, DungeonError> {
    let theme = outcome.theme;
    let def = catalog.theme(theme)?;
    let mut rng = population_rng(theme, outcome.seed);
    let mut plans = Vec::new();
    for (room, kind, bounds) in &outcome.room_bounds {
        let Some(stage) = stage_for_room(*kind) else {
            continue;
        };
        let pool = get_enemy_pool(catalog, theme, stage)?;
        let minions = if *kind == RoomKind::Boss {
            def.boss_room_minions as usize
        } else {
            1
        };
        if let Some(boss) = &pool.boss {
            plans.push(SpawnPlan {
                room: *room,
                room_kind: *kind,
                stage,
                type_id: boss.clone(),
                is_boss: true,
                max_hp: catalog.enemy_hp(boss)?,
                position: bounds.floor_center().floor_center(),
            });
        }
        for _ in 0..minions {
            let type_id = pool.adds[rng.random_range(0..pool.adds.len())].clone();
            let cell = standing_cell(query, bounds, &mut rng);
            plans.push(SpawnPlan {
                room: *room,
                room_kind: *kind,
                stage,
                max_hp: catalog.enemy_hp(&type_id)?,
                type_id,
                is_boss: false,
                position: cell.floor_center(),
            });
        }
    }
    log::debug!(
        "{theme} seed {}: planned {} enemies ({} boss)",
        outcome.seed,
        plans.len(),
        plans.iter().filter(|p| p.is_boss).count()
    );
    Ok(plans)
}

/// A random floor cell away from the walls with headroom, or the room centre.
fn standing_cell<Q: SpatialQuery + ?Sized>(
    query: &Q,
    bounds: &BlockBox,
    rng: &mut impl Rng,
) -> BlockPos {
    let inner = bounds.expand_xz(-WALL_MARGIN);
    if !inner.is_empty() {
        for _ in 0..PLACEMENT_TRIES {
            let x = rng.random_range(inner.min.x..inner.max.x);
            let z = rng.random_range(inner.min.z..inner.max.z);
            let p = BlockPos::new(x, bounds.min.y, z);
            if query.is_air(p) && query.is_air(p.offset(0, 1, 0)) && !query.is_air(p.offset(0, -1, 0)) {
                return p;
            }
        }
    }
    bounds.floor_center()
}
