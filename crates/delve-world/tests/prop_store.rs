use delve_blocks::{Block, BlockPalette};
use delve_chunk::ChunkCoord;
use delve_geom::{BlockBox, BlockPos};
use delve_world::{ChunkStore, EMPTY_COLUMN_Y, SpatialQuery, StoreLimits, TerrainGenerator, TerrainParams};
use proptest::prelude::*;

fn terrain_store(seed: u64) -> ChunkStore {
    let pal = BlockPalette::builtin().unwrap();
    let g = TerrainGenerator::new(seed, TerrainParams::default(), &pal).unwrap();
    ChunkStore::with_generator(g, StoreLimits::default())
}

#[test]
fn chunk_creation_order_does_not_change_content() {
    let mut forward = terrain_store(1234);
    let mut backward = terrain_store(1234);
    let mut coords = Vec::new();
    for cy in 0..2 {
        for cz in -1..2 {
            for cx in -1..2 {
                coords.push(ChunkCoord::new(cx, cy, cz));
            }
        }
    }
    for c in &coords {
        forward.ensure_chunk(*c).unwrap();
    }
    for c in coords.iter().rev() {
        backward.ensure_chunk(*c).unwrap();
    }
    for c in &coords {
        let a = forward.chunk(*c).unwrap();
        let b = backward.chunk(*c).unwrap();
        assert_eq!(a.blocks, b.blocks);
        assert_eq!(a.decorations, b.decorations);
    }
}

#[test]
fn generated_region_has_surface_near_nominal_height() {
    let mut store = terrain_store(77);
    let region = BlockBox::new(BlockPos::new(-20, 0, -20), BlockPos::new(20, 64, 20));
    let created = store.generate_region(&region).unwrap();
    assert!(created > 0);
    let params = TerrainParams::default();
    for x in -20..20 {
        for z in -20..20 {
            let top = store.top_solid_y(x, z);
            assert_ne!(top, EMPTY_COLUMN_Y);
            assert!(top >= params.surface_y - 1);
            assert!(top <= params.max_terrain_y());
        }
    }
    // regenerating the same region creates nothing new
    assert_eq!(store.generate_region(&region).unwrap(), 0);
}

#[test]
fn removing_decorations_clears_their_cells() {
    let mut store = terrain_store(5);
    let region = BlockBox::new(BlockPos::new(-32, 0, -32), BlockPos::new(32, 64, 32));
    store.generate_region(&region).unwrap();
    let center = BlockPos::new(0, 32, 0);
    let before = store.decorations_within(center, 18.0);
    assert!(!before.is_empty());
    let removed = store.remove_decorations_within(center, 18.0).unwrap();
    assert_eq!(removed.len(), before.len());
    assert!(store.decorations_within(center, 18.0).is_empty());
    for d in &removed {
        for c in d.cells() {
            assert!(store.is_air(c));
        }
    }
}

#[test]
fn overwritten_plants_lose_their_records() {
    let mut store = terrain_store(5);
    let region = BlockBox::new(BlockPos::new(-32, 0, -32), BlockPos::new(32, 64, 32));
    store.generate_region(&region).unwrap();
    let all = store.decorations_within(BlockPos::new(0, 32, 0), 30.0);
    assert!(all.len() > 2);
    let victim = all[0];
    store
        .set_block(victim.base.x, victim.base.y, victim.base.z, Block::new(1))
        .unwrap();
    assert_eq!(store.prune_overwritten_decorations(&region), 1);
    let left = store.decorations_within(BlockPos::new(0, 32, 0), 30.0);
    assert_eq!(left.len(), all.len() - 1);
    assert!(!left.iter().any(|d| d.base == victim.base));
    assert_eq!(store.prune_overwritten_decorations(&region), 0);
}

#[test]
fn air_write_then_neighbour_write_keeps_the_air() {
    let mut store = terrain_store(7);
    store.set_block(100, 20, 100, Block::AIR).unwrap();
    store.set_block(101, 20, 100, Block::new(1)).unwrap();
    assert_eq!(store.get_block(100, 20, 100), Block::AIR);
    assert_eq!(store.get_block(101, 20, 100), Block::new(1));
}

proptest! {
    // set then get returns the written block anywhere inside the limits
    #[test]
    fn set_get_round_trip(x in -5000i32..5000, y in 0i32..128, z in -5000i32..5000, id in 1u16..100) {
        let mut store = ChunkStore::new(StoreLimits::default());
        store.set_block(x, y, z, Block::new(id)).unwrap();
        prop_assert_eq!(store.get_block(x, y, z), Block::new(id));
        prop_assert_eq!(store.top_solid_y(x, z), y);
        store.set_block(x, y, z, Block::AIR).unwrap();
        prop_assert_eq!(store.get_block(x, y, z), Block::AIR);
        prop_assert_eq!(store.top_solid_y(x, z), EMPTY_COLUMN_Y);
    }

    // air written into unmaterialized terrain survives later writes to the same chunk
    #[test]
    fn air_writes_outlive_terrain_materialization(seed in any::<u64>(), x in -300i32..300, y in 1i32..16, z in -300i32..300) {
        let mut store = terrain_store(seed);
        store.set_block(x, y, z, Block::AIR).unwrap();
        prop_assert_eq!(store.get_block(x, y, z), Block::AIR);
        store.set_block(x, y + 1, z, Block::new(1)).unwrap();
        prop_assert_eq!(store.get_block(x, y, z), Block::AIR);
        prop_assert_eq!(store.get_block(x, y + 1, z), Block::new(1));
    }

    // pointwise terrain sampling agrees with materialized chunks
    #[test]
    fn materialized_terrain_matches_generator(seed in any::<u64>(), x in -200i32..200, y in 0i32..64, z in -200i32..200) {
        let mut store = terrain_store(seed);
        store.ensure_chunk(ChunkCoord::containing(x, y, z)).unwrap();
        let expect = store.generator().unwrap().block_at(x, y, z);
        prop_assert_eq!(store.get_block(x, y, z), expect);
    }
}
