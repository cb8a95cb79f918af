use delve_blocks::{Block, BlockPalette};
use delve_chunk::{CHUNK_SIZE, ChunkBuf, ChunkCoord, Decoration, DecorationKind};
use delve_geom::BlockPos;
use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::store::StoreError;
use crate::worldgen::TerrainParams;

const SALT_PLANT: u32 = 0xA53F9;
const SALT_PLANT_HEIGHT: u32 = 0x0051_F0A7;
const SALT_PLANT_KIND: u32 = 0xBEEF01;

/// Per-instance terrain: a gentle noise heightfield with plants scattered on top.
///
/// Every cell is a function of `(seed, params, x, y, z)` alone, so chunks can be generated in
/// any order and always agree at their seams.
pub struct TerrainGenerator {
    seed: u32,
    params: TerrainParams,
    noise: FastNoiseLite,
    top: Block,
    subsoil: Block,
    deep: Block,
    plants: Vec<Block>,
}

impl TerrainGenerator {
    pub fn new(seed: u64, params: TerrainParams, palette: &BlockPalette) -> Result<Self, StoreError> {
        let resolve = |name: &str| {
            palette
                .block(name)
                .map_err(|_| StoreError::UnknownBlock(name.to_string()))
        };
        let top = resolve(&params.top_block)?;
        let subsoil = resolve(&params.subsoil_block)?;
        let deep = resolve(&params.deep_block)?;
        let plants = params
            .plant_blocks
            .iter()
            .map(|n| resolve(n))
            .collect::<Result<Vec<_>, _>>()?;
        let folded = (seed ^ (seed >> 32)) as u32;
        let mut noise = FastNoiseLite::with_seed(folded as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(params.hill_frequency));
        Ok(Self {
            seed: folded,
            params,
            noise,
            top,
            subsoil,
            deep,
            plants,
        })
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Y of the topmost terrain block in a column (plants excluded).
    pub fn column_height(&self, wx: i32, wz: i32) -> i32 {
        let n = self.noise.get_noise_2d(wx as f32, wz as f32);
        let t = (n * 0.5 + 0.5).clamp(0.0, 1.0);
        let amp = self.params.hill_amplitude.max(0);
        self.params.surface_y - 1 + (t * amp as f32).round() as i32
    }

    /// Plant standing on a column, as `(height, block)`.
    pub fn column_plant(&self, wx: i32, wz: i32) -> Option<(u8, Block)> {
        if self.plants.is_empty() || self.params.plant_max_height == 0 {
            return None;
        }
        if rand01(self.seed, wx, wz, SALT_PLANT) >= self.params.plant_density {
            return None;
        }
        let span = u32::from(self.params.plant_max_height);
        let height = 1 + (hash2(wx, wz, self.seed ^ SALT_PLANT_HEIGHT) % span) as u8;
        let kind = hash2(wx, wz, self.seed ^ SALT_PLANT_KIND) as usize % self.plants.len();
        Some((height, self.plants[kind]))
    }

    pub fn block_at(&self, wx: i32, wy: i32, wz: i32) -> Block {
        let h = self.column_height(wx, wz);
        if wy <= h {
            return self.ground_block(h, wy);
        }
        match self.column_plant(wx, wz) {
            Some((height, block)) if wy <= h + i32::from(height) => block,
            _ => Block::AIR,
        }
    }

    #[inline]
    fn ground_block(&self, top: i32, wy: i32) -> Block {
        if wy == top {
            self.top
        } else if wy > top - self.params.topsoil_thickness {
            self.subsoil
        } else {
            self.deep
        }
    }

    /// Builds one chunk. Cells below `min_y` stay air.
    pub fn generate_chunk(&self, coord: ChunkCoord, min_y: i32) -> ChunkBuf {
        let mut buf = ChunkBuf::new_empty(coord);
        let origin = coord.origin();
        let cs = CHUNK_SIZE as i32;
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let wx = origin.x + lx as i32;
                let wz = origin.z + lz as i32;
                let h = self.column_height(wx, wz);
                let y_lo = origin.y.max(min_y);
                let y_hi = (origin.y + cs - 1).min(h);
                for wy in y_lo..=y_hi {
                    let ly = (wy - origin.y) as usize;
                    buf.blocks[ChunkBuf::idx(lx, ly, lz)] = self.ground_block(h, wy);
                }
                if let Some((height, block)) = self.column_plant(wx, wz) {
                    let base = h + 1;
                    for wy in base..base + i32::from(height) {
                        if wy >= origin.y && wy < origin.y + cs && wy >= min_y {
                            let ly = (wy - origin.y) as usize;
                            buf.blocks[ChunkBuf::idx(lx, ly, lz)] = block;
                        }
                    }
                    // The record lives with whichever chunk holds the plant's base.
                    if base >= origin.y && base < origin.y + cs && base >= min_y {
                        buf.decorations.push(Decoration {
                            kind: if height > 1 {
                                DecorationKind::Shrub
                            } else {
                                DecorationKind::Plant
                            },
                            base: BlockPos::new(wx, base, wz),
                            height,
                            block,
                        });
                    }
                }
            }
        }
        buf
    }
}

fn hash2(ix: i32, iz: i32, seed: u32) -> u32 {
    let mut h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iz as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

fn rand01(seed: u32, ix: i32, iz: i32, salt: u32) -> f32 {
    let h = hash2(ix, iz, (seed ^ salt).wrapping_add(0x9E37_79B9));
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> TerrainGenerator {
        let pal = BlockPalette::builtin().unwrap();
        TerrainGenerator::new(seed, TerrainParams::default(), &pal).unwrap()
    }

    #[test]
    fn heights_stay_within_hill_band() {
        let g = generator(7);
        let p = g.params().clone();
        for x in -40..40 {
            for z in -40..40 {
                let h = g.column_height(x, z);
                assert!(h >= p.surface_y - 1);
                assert!(h <= p.surface_y - 1 + p.hill_amplitude);
            }
        }
    }

    #[test]
    fn chunk_matches_pointwise_sampling() {
        let g = generator(99);
        let coord = ChunkCoord::new(-1, 1, 2);
        let buf = g.generate_chunk(coord, 0);
        let o = coord.origin();
        for (lx, ly, lz) in [(0, 0, 0), (5, 3, 9), (31, 31, 31), (12, 2, 30)] {
            let expect = g.block_at(o.x + lx as i32, o.y + ly as i32, o.z + lz as i32);
            assert_eq!(buf.get_local(lx, ly, lz), expect);
        }
    }

    #[test]
    fn plants_are_recorded_as_decorations() {
        let g = generator(3);
        let mut total = 0;
        for cx in -2..2 {
            for cz in -2..2 {
                let buf = g.generate_chunk(ChunkCoord::new(cx, 1, cz), 0);
                for d in &buf.decorations {
                    let h = g.column_height(d.base.x, d.base.z);
                    assert_eq!(d.base.y, h + 1);
                    for c in d.cells() {
                        assert_eq!(g.block_at(c.x, c.y, c.z), d.block);
                    }
                }
                total += buf.decorations.len();
            }
        }
        assert!(total > 0, "default density should scatter some plants");
    }

    #[test]
    fn unknown_block_name_is_reported() {
        let pal = BlockPalette::builtin().unwrap();
        let params = TerrainParams {
            top_block: "moon_dust".into(),
            ..TerrainParams::default()
        };
        assert!(matches!(
            TerrainGenerator::new(1, params, &pal),
            Err(StoreError::UnknownBlock(_))
        ));
    }
}
