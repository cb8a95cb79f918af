use delve_blocks::Block;
use delve_geom::{BlockBox, BlockPos};
use delve_world::{ChunkStore, SpatialQuery, StoreError, TerrainGenerator};

use crate::catalog::{CarveParams, ChestVariant, DungeonCatalog, ThemeDef};
use crate::error::DungeonError;
use crate::layout::{Axis, Corridor, DungeonLayout, RoomId, RoomKind};
use crate::rng::terrain_seed;
use crate::theme::ThemeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChestSite {
    pub room: RoomId,
    /// Floor cell of the chest's minimum corner.
    pub pos: BlockPos,
    pub variant: ChestVariant,
    pub clear_height: i32,
    pub footprint: i32,
}

impl ChestSite {
    pub fn cells(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let n = self.footprint;
        (0..n).flat_map(move |dz| (0..n).map(move |dx| self.pos.offset(dx, 0, dz)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupKind {
    Coin,
    Key,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickupSite {
    pub room: RoomId,
    pub pos: BlockPos,
    pub kind: PickupKind,
}

/// World-space results of carving one layout.
#[derive(Clone, Debug, PartialEq)]
pub struct CarveOutcome {
    pub theme: ThemeId,
    pub seed: u64,
    /// Cell a standing entity's feet occupy on any room floor.
    pub surface_y: i32,
    pub spawn_point: BlockPos,
    pub exit_point: BlockPos,
    pub room_bounds: Vec<(RoomId, RoomKind, BlockBox)>,
    pub chest_sites: Vec<ChestSite>,
    pub pickup_sites: Vec<PickupSite>,
    pub suppressed_decorations: usize,
}

impl CarveOutcome {
    pub fn room(&self, kind: RoomKind) -> Option<&BlockBox> {
        self.room_bounds.iter().find(|(_, k, _)| *k == kind).map(|(_, _, b)| b)
    }
}

struct ThemeBlocks {
    floor: Block,
    wall: Block,
    accent: Block,
    light: Block,
    roof: Block,
}

/// Turns a layout into block edits on a store and checks the result is playable.
pub struct Carver<'a> {
    theme: ThemeId,
    def: &'a ThemeDef,
    params: &'a CarveParams,
    chest_clear: i32,
    chest_footprint: i32,
    blocks: ThemeBlocks,
    surface_y: i32,
    terrain_top: i32,
}

impl<'a> Carver<'a> {
    pub fn new(catalog: &'a DungeonCatalog, theme: ThemeId) -> Result<Self, DungeonError> {
        let def = catalog.theme(theme)?;
        let chest = catalog.chest(def.chest)?;
        let terrain = catalog.terrain_params(theme)?;
        let blocks = ThemeBlocks {
            floor: catalog.block(&def.floor)?,
            wall: catalog.block(&def.wall)?,
            accent: catalog.block(&def.accent)?,
            light: catalog.block(&def.light)?,
            roof: catalog.block(def.roof.as_deref().unwrap_or(&def.wall))?,
        };
        Ok(Self {
            theme,
            def,
            params: catalog.carve_params(),
            chest_clear: chest.clear_height,
            chest_footprint: chest.footprint,
            blocks,
            surface_y: terrain.surface_y,
            terrain_top: terrain.max_terrain_y(),
        })
    }

    fn room_height(&self, layout: &DungeonLayout) -> i32 {
        layout.rooms[0].bounds.size_y()
    }

    fn wall_top(&self, layout: &DungeonLayout) -> i32 {
        if self.def.roofed {
            self.room_height(layout)
        } else {
            self.params.wall_height.min(self.room_height(layout))
        }
    }

    /// Exclusive top of the air carved above every room and corridor.
    fn clear_top(&self, layout: &DungeonLayout) -> i32 {
        (self.surface_y + self.room_height(layout)).max(self.terrain_top + 1)
    }

    fn world(&self, b: &BlockBox) -> BlockBox {
        b.translate(0, self.surface_y, 0)
    }

    pub fn carve(&self, layout: &DungeonLayout, store: &mut ChunkStore) -> Result<CarveOutcome, DungeonError> {
        if layout.theme != self.theme {
            return Err(DungeonError::config(format!(
                "layout is {} but the carver was built for {}",
                layout.theme, self.theme
            )));
        }
        layout.validate()?;

        let mut outcome = self.markers(layout);
        self.emit_terrain(layout, store)?;
        self.emit_rooms(layout, store)?;
        self.emit_corridors(layout, store)?;
        if self.def.roofed {
            self.emit_roofs(layout, store)?;
        }
        self.emit_ornaments(layout, store, outcome.spawn_point)?;
        self.emit_clearances(&outcome, store)?;
        outcome.suppressed_decorations = self.suppress_decorations(layout, &outcome, store)?;
        self.validate(&outcome, store)?;
        log::info!(
            "carved {} seed {}: spawn {:?}, exit {:?}, {} decoration(s) suppressed",
            self.theme,
            layout.seed,
            outcome.spawn_point,
            outcome.exit_point,
            outcome.suppressed_decorations
        );
        Ok(outcome)
    }

    fn markers(&self, layout: &DungeonLayout) -> CarveOutcome {
        let room_bounds: Vec<(RoomId, RoomKind, BlockBox)> = layout
            .rooms
            .iter()
            .map(|r| (r.id, r.kind, self.world(&r.bounds)))
            .collect();
        let mut chest_sites = Vec::new();
        let mut pickup_sites = Vec::new();
        let mut spawn_point = BlockPos::default();
        let mut exit_point = BlockPos::default();
        for (id, kind, b) in &room_bounds {
            let c = b.floor_center();
            match kind {
                RoomKind::Entrance => spawn_point = c,
                RoomKind::Exit => exit_point = c,
                RoomKind::Treasure => chest_sites.push(ChestSite {
                    room: *id,
                    pos: c,
                    variant: self.def.chest,
                    clear_height: self.chest_clear,
                    footprint: self.chest_footprint,
                }),
                RoomKind::Boss => pickup_sites.push(PickupSite {
                    room: *id,
                    pos: c.offset(b.size_x() / 4, 0, 0),
                    kind: PickupKind::Key,
                }),
                k if k.is_fight() => pickup_sites.push(PickupSite {
                    room: *id,
                    pos: c.offset(0, 0, b.size_z() / 4),
                    kind: PickupKind::Coin,
                }),
                _ => {}
            }
        }
        CarveOutcome {
            theme: self.theme,
            seed: layout.seed,
            surface_y: self.surface_y,
            spawn_point,
            exit_point,
            room_bounds,
            chest_sites,
            pickup_sites,
            suppressed_decorations: 0,
        }
    }

    fn emit_terrain(&self, layout: &DungeonLayout, store: &mut ChunkStore) -> Result<(), DungeonError> {
        let top = self
            .clear_top(layout)
            .max(self.surface_y + self.params.spawn_clear_height)
            .max(self.surface_y + self.chest_clear)
            + 1;
        let fp = self.world(&layout.footprint()).expand_xz(self.params.terrain_margin);
        let region = BlockBox::new(
            BlockPos::new(fp.min.x, store.limits().min_y, fp.min.z),
            BlockPos::new(fp.max.x, top, fp.max.z),
        );
        let created = store.generate_region(&region)?;
        log::debug!("terrain: {created} chunk(s) for {region:?}");
        Ok(())
    }

    fn emit_rooms(&self, layout: &DungeonLayout, store: &mut ChunkStore) -> Result<(), DungeonError> {
        let top = self.clear_top(layout);
        let wall_top = self.surface_y + self.wall_top(layout);
        let floor_y = self.surface_y - 1;
        for room in &layout.rooms {
            let inner = self.world(&room.bounds);
            let outer = inner.expand_xz(1);
            for (x, z) in outer.columns() {
                store.set_block(x, floor_y, z, self.blocks.floor)?;
                let ring = !inner.contains_xz(x, z);
                for y in self.surface_y..top {
                    let b = if ring && y < wall_top { self.blocks.wall } else { Block::AIR };
                    store.set_block(x, y, z, b)?;
                }
            }
        }
        Ok(())
    }

    fn emit_corridors(&self, layout: &DungeonLayout, store: &mut ChunkStore) -> Result<(), DungeonError> {
        let top = self.clear_top(layout);
        let wall_top = self.surface_y + self.wall_top(layout);
        let floor_y = self.surface_y - 1;
        for c in &layout.corridors {
            let inner = self.world(&c.bounds);
            let outer = widen(c, &inner);
            for (x, z) in outer.columns() {
                store.set_block(x, floor_y, z, self.blocks.floor)?;
                if inner.contains_xz(x, z) {
                    for y in self.surface_y..top {
                        store.set_block(x, y, z, Block::AIR)?;
                    }
                } else {
                    // Side walls never intrude on another corridor's walkway.
                    let open = layout
                        .corridors
                        .iter()
                        .any(|o| self.world(&o.bounds).contains_xz(x, z));
                    if !open {
                        for y in self.surface_y..wall_top {
                            store.set_block(x, y, z, self.blocks.wall)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_roofs(&self, layout: &DungeonLayout, store: &mut ChunkStore) -> Result<(), DungeonError> {
        let roof_y = self.surface_y + self.room_height(layout);
        let rooms = layout
            .rooms
            .iter()
            .filter(|r| r.kind != RoomKind::Entrance)
            .map(|r| self.world(&r.bounds).expand_xz(1));
        let corridors = layout.corridors.iter().map(|c| widen(c, &self.world(&c.bounds)));
        for area in rooms.chain(corridors) {
            for (x, z) in area.columns() {
                store.set_block(x, roof_y, z, self.blocks.roof)?;
            }
        }
        Ok(())
    }

    fn emit_ornaments(
        &self,
        layout: &DungeonLayout,
        store: &mut ChunkStore,
        spawn: BlockPos,
    ) -> Result<(), DungeonError> {
        let keep_out = self.params.spawn_decoration_radius + 1.0;
        let near_spawn = |x: i32, z: i32| {
            BlockPos::new(x, spawn.y, z).floor_center().distance_xz(spawn.floor_center()) <= keep_out
        };
        let wall_top = self.surface_y + self.wall_top(layout);
        let inset = self.params.pillar_inset;
        for room in &layout.rooms {
            let b = self.world(&room.bounds);
            if room.kind.is_fight() || room.kind == RoomKind::Boss {
                let size = if room.kind == RoomKind::Boss { 2 } else { 1 };
                let xs = [b.min.x + inset, b.max.x - inset - size];
                let zs = [b.min.z + inset, b.max.z - inset - size];
                for &px in &xs {
                    for &pz in &zs {
                        let pillar = BlockBox::from_origin_size(
                            BlockPos::new(px, self.surface_y, pz),
                            size,
                            wall_top - self.surface_y,
                            size,
                        );
                        if pillar.columns().any(|(x, z)| near_spawn(x, z)) {
                            continue;
                        }
                        store.fill(&pillar, self.blocks.accent)?;
                    }
                }
            }
            if room.kind == RoomKind::Entrance {
                continue;
            }
            // One torch at the middle of each wall, unless a doorway is there.
            let ring = b.expand_xz(1);
            let mid_x = b.min.x + b.size_x() / 2;
            let mid_z = b.min.z + b.size_z() / 2;
            let y = self.surface_y + 2;
            for (x, z) in [
                (mid_x, ring.min.z),
                (mid_x, ring.max.z - 1),
                (ring.min.x, mid_z),
                (ring.max.x - 1, mid_z),
            ] {
                if y < wall_top && !near_spawn(x, z) && store.get_block(x, y, z) == self.blocks.wall {
                    store.set_block(x, y, z, self.blocks.light)?;
                }
            }
        }
        Ok(())
    }

    fn emit_clearances(&self, outcome: &CarveOutcome, store: &mut ChunkStore) -> Result<(), DungeonError> {
        let r = self.params.spawn_clear_radius;
        clear_columns(store, square(outcome.spawn_point, r), self.params.spawn_clear_height)?;
        clear_columns(store, square(outcome.exit_point, 1), self.params.exit_clear_height)?;
        for chest in &outcome.chest_sites {
            clear_columns(store, chest.cells(), chest.clear_height)?;
        }
        Ok(())
    }

    fn suppress_decorations(
        &self,
        layout: &DungeonLayout,
        outcome: &CarveOutcome,
        store: &mut ChunkStore,
    ) -> Result<usize, DungeonError> {
        let removed = store.remove_decorations_within(outcome.spawn_point, self.params.spawn_decoration_radius)?;
        let fp = self.world(&layout.footprint());
        let pruned = store.prune_overwritten_decorations(&fp);
        log::debug!(
            "decorations: {} removed near spawn, {} carved over",
            removed.len(),
            pruned
        );
        Ok(removed.len())
    }

    fn validate(&self, outcome: &CarveOutcome, store: &ChunkStore) -> Result<(), DungeonError> {
        let r = self.params.spawn_clear_radius;
        check_columns(store, "spawn", square(outcome.spawn_point, r), self.params.spawn_clear_height)?;
        check_columns(store, "exit", square(outcome.exit_point, 1), self.params.exit_clear_height)?;
        for chest in &outcome.chest_sites {
            check_columns(store, "chest", chest.cells(), chest.clear_height)?;
        }
        let radius = self.params.spawn_decoration_radius;
        let left = store.decorations_within(outcome.spawn_point, radius);
        if !left.is_empty() {
            return Err(DungeonError::geometry(format!(
                "{} decoration(s) remain within {radius} of spawn",
                left.len()
            )));
        }
        for (_, kind, b) in &outcome.room_bounds {
            let c = b.floor_center();
            if !store.get_block(c.x, c.y - 1, c.z).is_solid() || !store.is_air(c) {
                return Err(DungeonError::geometry(format!("room {} has no standable floor", kind.name())));
            }
        }
        for p in &outcome.pickup_sites {
            if !store.is_air(p.pos) {
                return Err(DungeonError::geometry(format!("{:?} pickup at {:?} is buried", p.kind, p.pos)));
            }
        }
        Ok(())
    }
}

/// Corridor interior plus its two side walls.
fn widen(c: &Corridor, inner: &BlockBox) -> BlockBox {
    match c.axis {
        Axis::X => BlockBox::new(inner.min.offset(0, 0, -1), inner.max.offset(0, 0, 1)),
        Axis::Z => BlockBox::new(inner.min.offset(-1, 0, 0), inner.max.offset(1, 0, 0)),
    }
}

fn square(center: BlockPos, r: i32) -> impl Iterator<Item = BlockPos> {
    (-r..=r).flat_map(move |dz| (-r..=r).map(move |dx| center.offset(dx, 0, dz)))
}

fn clear_columns(
    store: &mut ChunkStore,
    cells: impl Iterator<Item = BlockPos>,
    height: i32,
) -> Result<(), StoreError> {
    for c in cells {
        for dy in 0..height {
            store.set_block(c.x, c.y + dy, c.z, Block::AIR)?;
        }
    }
    Ok(())
}

fn check_columns(
    store: &ChunkStore,
    what: &str,
    cells: impl Iterator<Item = BlockPos>,
    height: i32,
) -> Result<(), DungeonError> {
    for c in cells {
        let run = store.air_run_above(c, height);
        if run < height {
            return Err(DungeonError::geometry(format!(
                "{what} column at {:?} has {run} clear cell(s), needs {height}",
                c
            )));
        }
        if !store.get_block(c.x, c.y - 1, c.z).is_solid() {
            return Err(DungeonError::geometry(format!("{what} column at {c:?} has no floor")));
        }
    }
    Ok(())
}

/// Empty store for one instance, terrain seeded from `(theme, seed)`.
pub fn fresh_instance_store(catalog: &DungeonCatalog, theme: ThemeId, seed: u64) -> Result<ChunkStore, DungeonError> {
    let params = catalog.terrain_params(theme)?;
    let generator = TerrainGenerator::new(terrain_seed(theme, seed), params, catalog.palette())
        .map_err(|e| DungeonError::config(e.to_string()))?;
    Ok(ChunkStore::with_generator(generator, catalog.world().limits.clone()))
}

/// Carves `layout` into `store` with `theme`'s blocks and clearances.
pub fn carve(
    layout: &DungeonLayout,
    store: &mut ChunkStore,
    catalog: &DungeonCatalog,
    theme: ThemeId,
) -> Result<CarveOutcome, DungeonError> {
    Carver::new(catalog, theme)?.carve(layout, store)
}
