use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use delve_blocks::{Block, BlockPalette};
use delve_world::{TerrainParams, WorldGenConfig};
use serde::Deserialize;

use crate::error::DungeonError;
use crate::theme::ThemeId;

const BUILTIN_THEMES: &str = include_str!("../assets/themes.toml");

/// No chest may be declared with less headroom than this.
pub const MIN_CHEST_CLEAR: i32 = 6;
/// No exit may be declared with less headroom than this.
pub const MIN_EXIT_CLEAR: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChestVariant {
    Small,
    Large,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChestDef {
    /// Air cells required above the chest's floor cell.
    pub clear_height: i32,
    /// Side length of the square the chest occupies.
    #[serde(default = "default_footprint")]
    pub footprint: i32,
}

fn default_footprint() -> i32 {
    1
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CarveParams {
    #[serde(default = "default_spawn_clear_height")]
    pub spawn_clear_height: i32,
    /// Half-width of the square spawn footprint (1 gives 3×3).
    #[serde(default = "default_spawn_clear_radius")]
    pub spawn_clear_radius: i32,
    #[serde(default = "default_spawn_decoration_radius")]
    pub spawn_decoration_radius: f32,
    #[serde(default = "default_exit_clear_height")]
    pub exit_clear_height: i32,
    #[serde(default = "default_wall_height")]
    pub wall_height: i32,
    #[serde(default = "default_pillar_inset")]
    pub pillar_inset: i32,
    /// Extra terrain generated around the layout footprint.
    #[serde(default = "default_terrain_margin")]
    pub terrain_margin: i32,
}

fn default_spawn_clear_height() -> i32 {
    24
}
fn default_spawn_clear_radius() -> i32 {
    1
}
fn default_spawn_decoration_radius() -> f32 {
    18.0
}
fn default_exit_clear_height() -> i32 {
    6
}
fn default_wall_height() -> i32 {
    5
}
fn default_pillar_inset() -> i32 {
    3
}
fn default_terrain_margin() -> i32 {
    24
}

impl Default for CarveParams {
    fn default() -> Self {
        Self {
            spawn_clear_height: default_spawn_clear_height(),
            spawn_clear_radius: default_spawn_clear_radius(),
            spawn_decoration_radius: default_spawn_decoration_radius(),
            exit_clear_height: default_exit_clear_height(),
            wall_height: default_wall_height(),
            pillar_inset: default_pillar_inset(),
            terrain_margin: default_terrain_margin(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LayoutParams {
    #[serde(default = "default_room_min")]
    pub room_min: i32,
    #[serde(default = "default_room_max")]
    pub room_max: i32,
    #[serde(default = "default_boss_room_min")]
    pub boss_room_min: i32,
    #[serde(default = "default_boss_room_max")]
    pub boss_room_max: i32,
    #[serde(default = "default_room_height")]
    pub room_height: i32,
    #[serde(default = "default_corridor_width")]
    pub corridor_width: i32,
    /// Distance between neighbouring cells of the coarse room grid.
    #[serde(default = "default_cell_pitch")]
    pub cell_pitch: i32,
    #[serde(default = "default_jitter")]
    pub jitter: i32,
    /// Chance of a second loop corridor when the walk offers one.
    #[serde(default = "default_extra_branch_chance")]
    pub extra_branch_chance: f32,
}

fn default_room_min() -> i32 {
    16
}
fn default_room_max() -> i32 {
    22
}
fn default_boss_room_min() -> i32 {
    24
}
fn default_boss_room_max() -> i32 {
    28
}
fn default_room_height() -> i32 {
    6
}
fn default_corridor_width() -> i32 {
    7
}
fn default_cell_pitch() -> i32 {
    40
}
fn default_jitter() -> i32 {
    2
}
fn default_extra_branch_chance() -> f32 {
    0.25
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            room_min: default_room_min(),
            room_max: default_room_max(),
            boss_room_min: default_boss_room_min(),
            boss_room_max: default_boss_room_max(),
            room_height: default_room_height(),
            corridor_width: default_corridor_width(),
            cell_pitch: default_cell_pitch(),
            jitter: default_jitter(),
            extra_branch_chance: default_extra_branch_chance(),
        }
    }
}

/// Theme tweaks layered over the catalog's base terrain.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TerrainOverrides {
    pub top_block: Option<String>,
    pub subsoil_block: Option<String>,
    pub deep_block: Option<String>,
    pub plant_blocks: Option<Vec<String>>,
    pub plant_density: Option<f32>,
    pub hill_amplitude: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StagePools {
    #[serde(default)]
    pub stage1: Vec<String>,
    #[serde(default)]
    pub stage2: Vec<String>,
    #[serde(default)]
    pub stage3: Vec<String>,
    #[serde(default)]
    pub stage4: Vec<String>,
}

impl StagePools {
    pub fn adds(&self, stage: u8) -> Option<&[String]> {
        match stage {
            1 => Some(&self.stage1),
            2 => Some(&self.stage2),
            3 => Some(&self.stage3),
            4 => Some(&self.stage4),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ThemeDef {
    pub floor: String,
    pub wall: String,
    /// Pillars and other structural ornaments.
    pub accent: String,
    pub light: String,
    /// Ceiling block for roofed themes; the wall block when absent.
    pub roof: Option<String>,
    #[serde(default)]
    pub roofed: bool,
    pub chest: ChestVariant,
    pub key_item: String,
    #[serde(default = "default_coin_item")]
    pub coin_item: String,
    pub loot_item: String,
    #[serde(default = "default_loot_amount")]
    pub loot_amount: u32,
    pub boss: String,
    #[serde(default)]
    pub boss_room_minions: u32,
    #[serde(default)]
    pub layout: LayoutParams,
    #[serde(default)]
    pub terrain: TerrainOverrides,
    pub pools: StagePools,
}

fn default_coin_item() -> String {
    "coin".into()
}
fn default_loot_amount() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EnemyStats {
    pub hp: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PortalDef {
    pub id: String,
    pub theme: ThemeId,
    pub seed: u64,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    world: WorldGenConfig,
    #[serde(default)]
    carve: CarveParams,
    #[serde(default)]
    chests: BTreeMap<ChestVariant, ChestDef>,
    #[serde(default)]
    enemies: BTreeMap<String, EnemyStats>,
    #[serde(default)]
    themes: BTreeMap<ThemeId, ThemeDef>,
    #[serde(default)]
    portals: Vec<PortalDef>,
}

/// Everything dungeon generation reads: themes, clearances, enemy stats and portals,
/// plus the block palette their names resolve against.
#[derive(Clone, Debug)]
pub struct DungeonCatalog {
    world: WorldGenConfig,
    carve: CarveParams,
    chests: BTreeMap<ChestVariant, ChestDef>,
    enemies: BTreeMap<String, EnemyStats>,
    themes: BTreeMap<ThemeId, ThemeDef>,
    portals: Vec<PortalDef>,
    palette: BlockPalette,
}

impl DungeonCatalog {
    pub fn builtin() -> Result<Self, DungeonError> {
        Self::builtin_with_palette(BlockPalette::builtin()?)
    }

    /// The built-in themes resolved against a caller-supplied palette.
    pub fn builtin_with_palette(palette: BlockPalette) -> Result<Self, DungeonError> {
        Self::from_toml_str(BUILTIN_THEMES, palette)
    }

    pub fn load_from_path(path: impl AsRef<Path>, palette: BlockPalette) -> Result<Self, DungeonError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .map_err(|e| DungeonError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&s, palette)
    }

    pub fn from_toml_str(s: &str, palette: BlockPalette) -> Result<Self, DungeonError> {
        let file: CatalogFile = toml::from_str(s)?;
        let catalog = DungeonCatalog {
            world: file.world,
            carve: file.carve,
            chests: file.chests,
            enemies: file.enemies,
            themes: file.themes,
            portals: file.portals,
            palette,
        };
        catalog.validate()?;
        log::debug!(
            "dungeon catalog: {} theme(s), {} enemy type(s), {} portal(s)",
            catalog.themes.len(),
            catalog.enemies.len(),
            catalog.portals.len()
        );
        Ok(catalog)
    }

    pub fn world(&self) -> &WorldGenConfig {
        &self.world
    }

    pub fn carve_params(&self) -> &CarveParams {
        &self.carve
    }

    pub fn palette(&self) -> &BlockPalette {
        &self.palette
    }

    pub fn themes(&self) -> impl Iterator<Item = ThemeId> + '_ {
        self.themes.keys().copied()
    }

    pub fn theme(&self, id: ThemeId) -> Result<&ThemeDef, DungeonError> {
        self.themes
            .get(&id)
            .ok_or_else(|| DungeonError::config(format!("theme `{id}` is not in the catalog")))
    }

    pub fn chest(&self, variant: ChestVariant) -> Result<&ChestDef, DungeonError> {
        self.chests
            .get(&variant)
            .ok_or_else(|| DungeonError::config(format!("chest variant {variant:?} has no clearance entry")))
    }

    pub fn enemy_hp(&self, type_id: &str) -> Result<u32, DungeonError> {
        self.enemies
            .get(type_id)
            .map(|s| s.hp)
            .ok_or_else(|| DungeonError::config(format!("enemy `{type_id}` has no stats entry")))
    }

    pub fn portal(&self, id: &str) -> Option<&PortalDef> {
        self.portals.iter().find(|p| p.id == id)
    }

    pub fn portals(&self) -> &[PortalDef] {
        &self.portals
    }

    pub fn block(&self, name: &str) -> Result<Block, DungeonError> {
        Ok(self.palette.block(name)?)
    }

    /// Base terrain with the theme's overrides applied.
    pub fn terrain_params(&self, theme: ThemeId) -> Result<TerrainParams, DungeonError> {
        let o = &self.theme(theme)?.terrain;
        let mut p = self.world.terrain.clone();
        if let Some(b) = &o.top_block {
            p.top_block = b.clone();
        }
        if let Some(b) = &o.subsoil_block {
            p.subsoil_block = b.clone();
        }
        if let Some(b) = &o.deep_block {
            p.deep_block = b.clone();
        }
        if let Some(v) = &o.plant_blocks {
            p.plant_blocks = v.clone();
        }
        if let Some(d) = o.plant_density {
            p.plant_density = d;
        }
        if let Some(a) = o.hill_amplitude {
            p.hill_amplitude = a;
        }
        Ok(p)
    }

    fn validate(&self) -> Result<(), DungeonError> {
        let c = &self.carve;
        if c.exit_clear_height < MIN_EXIT_CLEAR {
            return Err(DungeonError::config(format!(
                "exit_clear_height {} is below the minimum of {MIN_EXIT_CLEAR}",
                c.exit_clear_height
            )));
        }
        if c.spawn_clear_height < 1 || c.spawn_clear_radius < 0 || c.spawn_decoration_radius < 0.0 {
            return Err(DungeonError::config("spawn clearance must be positive"));
        }
        if c.wall_height < 2 {
            return Err(DungeonError::config("wall_height must be at least 2"));
        }
        for (variant, chest) in &self.chests {
            if chest.clear_height < MIN_CHEST_CLEAR || chest.footprint < 1 {
                return Err(DungeonError::config(format!(
                    "chest {variant:?} needs clear_height >= {MIN_CHEST_CLEAR} and a positive footprint"
                )));
            }
        }
        let surface = self.world.terrain.surface_y;
        if surface + c.spawn_clear_height > self.world.limits.max_y
            || surface - 1 < self.world.limits.min_y
        {
            return Err(DungeonError::config("spawn clearance does not fit inside the store limits"));
        }
        for (id, t) in &self.themes {
            self.validate_theme(*id, t)?;
        }
        let mut seen = BTreeSet::new();
        for p in &self.portals {
            if !seen.insert(p.id.as_str()) {
                return Err(DungeonError::config(format!("portal `{}` is defined twice", p.id)));
            }
            self.theme(p.theme)?;
        }
        Ok(())
    }

    fn validate_theme(&self, id: ThemeId, t: &ThemeDef) -> Result<(), DungeonError> {
        for name in [&t.floor, &t.wall, &t.accent, &t.light]
            .into_iter()
            .chain(t.roof.as_ref())
        {
            self.block(name)
                .map_err(|e| DungeonError::config(format!("theme `{id}`: {e}")))?;
        }
        let terrain = self.terrain_params(id)?;
        for name in [&terrain.top_block, &terrain.subsoil_block, &terrain.deep_block]
            .into_iter()
            .chain(terrain.plant_blocks.iter())
        {
            self.block(name)
                .map_err(|e| DungeonError::config(format!("theme `{id}` terrain: {e}")))?;
        }
        self.chest(t.chest)?;
        if t.boss.is_empty() {
            return Err(DungeonError::config(format!("theme `{id}` has no boss")));
        }
        for stage in 1..=4 {
            let adds = t.pools.adds(stage).unwrap_or_default();
            if adds.is_empty() {
                return Err(DungeonError::config(format!("theme `{id}` stage {stage} has no adds")));
            }
            for a in adds {
                self.enemy_hp(a)?;
            }
        }
        self.enemy_hp(&t.boss)?;
        let l = &t.layout;
        if l.room_min < 8 || l.room_min > l.room_max || l.boss_room_min > l.boss_room_max {
            return Err(DungeonError::config(format!("theme `{id}` has inverted room size ranges")));
        }
        if l.room_height < 3 || l.cell_pitch < 1 || l.jitter < 0 {
            return Err(DungeonError::config(format!("theme `{id}` has a degenerate layout grid")));
        }
        Ok(())
    }
}
