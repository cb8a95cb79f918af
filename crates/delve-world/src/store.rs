use delve_blocks::Block;
use delve_chunk::{CHUNK_SIZE, ChunkBuf, ChunkCoord, Decoration, world_to_local};
use delve_geom::{BlockBox, BlockPos};
use hashbrown::HashMap;
use thiserror::Error;

use crate::generation::TerrainGenerator;
use crate::worldgen::StoreLimits;

/// `top_solid_y` result for a column with no solid cell.
pub const EMPTY_COLUMN_Y: i32 = i32::MIN / 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("cell ({x}, {y}, {z}) is outside the store limits")]
    OutOfRange { x: i32, y: i32, z: i32 },
    #[error("chunk budget of {limit} chunks exhausted")]
    ChunkBudgetExhausted { limit: usize },
    #[error("terrain references unknown block `{0}`")]
    UnknownBlock(String),
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub chunks: usize,
    pub dirty: usize,
    pub decorations: usize,
}

/// Owns every chunk of one world. Unmaterialized chunks read as air.
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, ChunkBuf>,
    generator: Option<TerrainGenerator>,
    limits: StoreLimits,
    // Inclusive chunk-y span of materialized chunks, for column scans.
    cy_span: Option<(i32, i32)>,
}

impl ChunkStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            chunks: HashMap::new(),
            generator: None,
            limits,
            cy_span: None,
        }
    }

    pub fn with_generator(generator: TerrainGenerator, limits: StoreLimits) -> Self {
        Self {
            generator: Some(generator),
            ..Self::new(limits)
        }
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    pub fn generator(&self) -> Option<&TerrainGenerator> {
        self.generator.as_ref()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            chunks: self.chunks.len(),
            dirty: self.chunks.values().filter(|c| c.is_dirty()).count(),
            decorations: self.chunks.values().map(|c| c.decorations.len()).sum(),
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkBuf> {
        self.chunks.get(&coord)
    }

    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        if !self.limits.contains(wx, wy, wz) {
            return Block::AIR;
        }
        let (coord, [lx, ly, lz]) = world_to_local(wx, wy, wz);
        self.chunks
            .get(&coord)
            .map(|c| c.get_local(lx, ly, lz))
            .unwrap_or(Block::AIR)
    }

    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> Result<(), StoreError> {
        if !self.limits.contains(wx, wy, wz) {
            return Err(StoreError::OutOfRange {
                x: wx,
                y: wy,
                z: wz,
            });
        }
        let (coord, [lx, ly, lz]) = world_to_local(wx, wy, wz);
        if block.is_air() && self.generator.is_none() && !self.chunks.contains_key(&coord) {
            // Absent chunks of a store without terrain read as air already.
            return Ok(());
        }
        let chunk = self.ensure_chunk(coord)?;
        chunk.set_local(lx, ly, lz, block);
        Ok(())
    }

    /// Highest solid cell in a column, or [`EMPTY_COLUMN_Y`].
    pub fn top_solid_y(&self, wx: i32, wz: i32) -> i32 {
        let Some((lo, hi)) = self.cy_span else {
            return EMPTY_COLUMN_Y;
        };
        let probe = ChunkCoord::containing(wx, 0, wz);
        let lx = wx.rem_euclid(CHUNK_SIZE as i32) as usize;
        let lz = wz.rem_euclid(CHUNK_SIZE as i32) as usize;
        for cy in (lo..=hi).rev() {
            let coord = ChunkCoord::new(probe.cx, cy, probe.cz);
            if let Some(ly) = self.chunks.get(&coord).and_then(|c| c.top_solid_local(lx, lz)) {
                return coord.origin().y + ly as i32;
            }
        }
        EMPTY_COLUMN_Y
    }

    /// Returns the chunk, creating it (from terrain when a generator is attached) if absent.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord) -> Result<&mut ChunkBuf, StoreError> {
        if !self.chunks.contains_key(&coord) {
            self.materialize(coord)?;
        }
        self.chunks
            .get_mut(&coord)
            .ok_or(StoreError::ChunkBudgetExhausted {
                limit: self.limits.max_chunks,
            })
    }

    fn materialize(&mut self, coord: ChunkCoord) -> Result<(), StoreError> {
        if self.chunks.len() >= self.limits.max_chunks {
            return Err(StoreError::ChunkBudgetExhausted {
                limit: self.limits.max_chunks,
            });
        }
        let origin = coord.checked_origin().ok_or(StoreError::OutOfRange {
            x: coord.cx,
            y: coord.cy,
            z: coord.cz,
        })?;
        let buf = match &self.generator {
            Some(g) => g.generate_chunk(coord, self.limits.min_y),
            None => ChunkBuf::new_empty(coord),
        };
        log::trace!(
            "materialized chunk ({}, {}, {}) at ({}, {}, {})",
            coord.cx,
            coord.cy,
            coord.cz,
            origin.x,
            origin.y,
            origin.z
        );
        self.cy_span = Some(match self.cy_span {
            Some((lo, hi)) => (lo.min(coord.cy), hi.max(coord.cy)),
            None => (coord.cy, coord.cy),
        });
        self.chunks.insert(coord, buf);
        Ok(())
    }

    /// Materializes every chunk overlapping `region` (clipped to the limits). Returns how
    /// many chunks were newly created.
    pub fn generate_region(&mut self, region: &BlockBox) -> Result<usize, StoreError> {
        if region.is_empty() {
            return Ok(0);
        }
        let lo_y = region.min.y.max(self.limits.min_y);
        let hi_y = (region.max.y - 1).min(self.limits.max_y - 1);
        if lo_y > hi_y {
            return Ok(0);
        }
        for corner in [region.min, region.max.offset(-1, 0, -1)] {
            if !self.limits.contains(corner.x, lo_y, corner.z) {
                return Err(StoreError::OutOfRange {
                    x: corner.x,
                    y: lo_y,
                    z: corner.z,
                });
            }
        }
        let lo = ChunkCoord::containing(region.min.x, lo_y, region.min.z);
        let hi = ChunkCoord::containing(region.max.x - 1, hi_y, region.max.z - 1);
        let mut created = 0;
        for cy in lo.cy..=hi.cy {
            for cz in lo.cz..=hi.cz {
                for cx in lo.cx..=hi.cx {
                    let coord = ChunkCoord::new(cx, cy, cz);
                    if !self.chunks.contains_key(&coord) {
                        self.materialize(coord)?;
                        created += 1;
                    }
                }
            }
        }
        log::debug!("generated {} chunk(s) for region {:?}", created, region);
        Ok(created)
    }

    /// Writes `block` into every cell of `region`.
    pub fn fill(&mut self, region: &BlockBox, block: Block) -> Result<(), StoreError> {
        for y in region.min.y..region.max.y {
            for (x, z) in region.columns() {
                self.set_block(x, y, z, block)?;
            }
        }
        Ok(())
    }

    pub fn is_dirty(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(|c| c.is_dirty())
    }

    /// Dirty chunk coordinates, clearing their flags. Sorted for stable consumers.
    pub fn take_dirty(&mut self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self
            .chunks
            .iter_mut()
            .filter_map(|(k, c)| c.clear_dirty().then_some(*k))
            .collect();
        out.sort();
        out
    }

    fn chunks_near_xz(&self, center: BlockPos, radius: f32) -> Vec<ChunkCoord> {
        let r = radius.ceil() as i32 + 1;
        let lo = ChunkCoord::containing(center.x.saturating_sub(r), 0, center.z.saturating_sub(r));
        let hi = ChunkCoord::containing(center.x.saturating_add(r), 0, center.z.saturating_add(r));
        let mut out: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|k| k.cx >= lo.cx && k.cx <= hi.cx && k.cz >= lo.cz && k.cz <= hi.cz)
            .copied()
            .collect();
        out.sort();
        out
    }

    /// Decorations whose base lies within `radius` (horizontal) of `center`.
    pub fn decorations_within(&self, center: BlockPos, radius: f32) -> Vec<Decoration> {
        let c = center.floor_center();
        let mut out = Vec::new();
        for coord in self.chunks_near_xz(center, radius) {
            if let Some(chunk) = self.chunks.get(&coord) {
                out.extend(
                    chunk
                        .decorations
                        .iter()
                        .filter(|d| d.base.floor_center().distance_xz(c) <= radius)
                        .copied(),
                );
            }
        }
        out
    }

    /// Deletes decorations within `radius` of `center` and clears the cells they still
    /// occupy. Cells since overwritten by something else are left alone.
    pub fn remove_decorations_within(
        &mut self,
        center: BlockPos,
        radius: f32,
    ) -> Result<Vec<Decoration>, StoreError> {
        let c = center.floor_center();
        let mut removed = Vec::new();
        for coord in self.chunks_near_xz(center, radius) {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                removed.extend(
                    chunk.take_decorations_where(|d| d.base.floor_center().distance_xz(c) <= radius),
                );
            }
        }
        for d in &removed {
            for cell in d.cells() {
                if self.get_block(cell.x, cell.y, cell.z) == d.block {
                    self.set_block(cell.x, cell.y, cell.z, Block::AIR)?;
                }
            }
        }
        Ok(removed)
    }

    /// Drops decoration records inside `region` whose cells no longer all hold the
    /// decoration's block, i.e. plants something else has since been carved over.
    pub fn prune_overwritten_decorations(&mut self, region: &BlockBox) -> usize {
        let mut coords: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|k| {
                let o = k.origin();
                let cs = CHUNK_SIZE as i32;
                o.x < region.max.x
                    && o.x + cs > region.min.x
                    && o.z < region.max.z
                    && o.z + cs > region.min.z
            })
            .copied()
            .collect();
        coords.sort();
        let mut stale: Vec<(ChunkCoord, BlockPos)> = Vec::new();
        for coord in &coords {
            if let Some(chunk) = self.chunks.get(coord) {
                for d in &chunk.decorations {
                    if region.contains_xz(d.base.x, d.base.z)
                        && d.cells().any(|c| self.get_block(c.x, c.y, c.z) != d.block)
                    {
                        stale.push((*coord, d.base));
                    }
                }
            }
        }
        for (coord, base) in &stale {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.take_decorations_where(|d| d.base == *base);
            }
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmaterialized_reads_are_air() {
        let store = ChunkStore::new(StoreLimits::default());
        assert_eq!(store.get_block(10, 10, 10), Block::AIR);
        assert_eq!(store.top_solid_y(10, 10), EMPTY_COLUMN_Y);
        assert_eq!(store.stats().chunks, 0);
    }

    #[test]
    fn set_block_creates_chunk_and_marks_dirty() {
        let mut store = ChunkStore::new(StoreLimits::default());
        store.set_block(-3, 40, 70, Block::new(7)).unwrap();
        assert_eq!(store.get_block(-3, 40, 70), Block::new(7));
        let coord = ChunkCoord::containing(-3, 40, 70);
        assert!(store.is_dirty(coord));
        assert_eq!(store.take_dirty(), vec![coord]);
        assert!(!store.is_dirty(coord));
    }

    #[test]
    fn air_write_into_absent_chunk_allocates_nothing() {
        let mut store = ChunkStore::new(StoreLimits::default());
        store.set_block(0, 5, 0, Block::AIR).unwrap();
        assert_eq!(store.stats().chunks, 0);
    }

    #[test]
    fn top_solid_y_scans_across_chunk_layers() {
        let mut store = ChunkStore::new(StoreLimits::default());
        store.set_block(4, 3, 4, Block::new(1)).unwrap();
        store.set_block(4, 70, 4, Block::new(1)).unwrap();
        assert_eq!(store.top_solid_y(4, 4), 70);
        store.set_block(4, 70, 4, Block::AIR).unwrap();
        assert_eq!(store.top_solid_y(4, 4), 3);
        assert_eq!(store.top_solid_y(5, 4), EMPTY_COLUMN_Y);
    }

    #[test]
    fn out_of_range_writes_fail_and_reads_default() {
        let mut store = ChunkStore::new(StoreLimits::default());
        let err = store.set_block(0, -5, 0, Block::new(1)).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { .. }));
        assert_eq!(store.get_block(i32::MAX, 10, 0), Block::AIR);
    }

    #[test]
    fn chunk_budget_is_enforced() {
        let limits = StoreLimits {
            max_chunks: 2,
            ..StoreLimits::default()
        };
        let mut store = ChunkStore::new(limits);
        store.set_block(0, 0, 0, Block::new(1)).unwrap();
        store.set_block(40, 0, 0, Block::new(1)).unwrap();
        let err = store.set_block(80, 0, 0, Block::new(1)).unwrap_err();
        assert_eq!(err, StoreError::ChunkBudgetExhausted { limit: 2 });
    }
}
