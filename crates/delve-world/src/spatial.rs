use delve_blocks::Block;
use delve_geom::{BlockPos, Vec3};

use crate::store::{ChunkStore, EMPTY_COLUMN_Y, StoreError};

/// Block-level read/write surface offered to gameplay collaborators (camera collision,
/// ground snapping, interaction eligibility).
pub trait SpatialQuery {
    fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block;

    fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> Result<(), StoreError>;

    /// Y of the highest solid cell in the column, or [`EMPTY_COLUMN_Y`].
    fn top_solid_y(&self, wx: i32, wz: i32) -> i32;

    #[inline]
    fn is_air(&self, p: BlockPos) -> bool {
        self.get_block(p.x, p.y, p.z).is_air()
    }

    /// First free cell above the column's surface.
    fn ground_y(&self, wx: i32, wz: i32) -> Option<i32> {
        let top = self.top_solid_y(wx, wz);
        (top != EMPTY_COLUMN_Y).then_some(top + 1)
    }

    /// The cell and both vertical neighbours are air.
    fn is_clear_standing_cell(&self, p: BlockPos) -> bool {
        self.is_air(p) && self.is_air(p.offset(0, 1, 0)) && self.is_air(p.offset(0, -1, 0))
    }

    /// Number of consecutive air cells starting at `from` and going up, capped at `cap`.
    fn air_run_above(&self, from: BlockPos, cap: i32) -> i32 {
        (0..cap)
            .take_while(|dy| self.is_air(from.offset(0, *dy, 0)))
            .count() as i32
    }
}

impl SpatialQuery for ChunkStore {
    #[inline]
    fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        ChunkStore::get_block(self, wx, wy, wz)
    }

    #[inline]
    fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> Result<(), StoreError> {
        ChunkStore::set_block(self, wx, wy, wz, block)
    }

    #[inline]
    fn top_solid_y(&self, wx: i32, wz: i32) -> i32 {
        ChunkStore::top_solid_y(self, wx, wz)
    }
}

/// Pulls a desired camera position toward `anchor` until it sits in a cell whose vertical
/// neighbours are also air. `None` when even the anchor is obstructed.
pub fn resolve_clear_position<Q: SpatialQuery + ?Sized>(
    query: &Q,
    anchor: Vec3,
    desired: Vec3,
    steps: u32,
) -> Option<Vec3> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| desired.lerp(anchor, i as f32 / steps as f32))
        .find(|p| query.is_clear_standing_cell(p.cell()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::StoreLimits;

    fn walled_store() -> ChunkStore {
        let mut store = ChunkStore::new(StoreLimits::default());
        // Floor at y = 9 and a wall at x = 10.
        for x in 0..16 {
            for z in 0..4 {
                store.set_block(x, 9, z, Block::new(1)).unwrap();
            }
        }
        for y in 10..20 {
            for z in 0..4 {
                store.set_block(10, y, z, Block::new(1)).unwrap();
            }
        }
        store
    }

    #[test]
    fn ground_y_is_one_above_top() {
        let store = walled_store();
        assert_eq!(store.ground_y(2, 2), Some(10));
        assert_eq!(store.ground_y(10, 2), Some(20));
        assert_eq!(store.ground_y(100, 2), None);
    }

    #[test]
    fn camera_inside_wall_is_pulled_back() {
        let store = walled_store();
        let anchor = Vec3::new(4.5, 12.5, 1.5);
        let desired = Vec3::new(10.5, 12.5, 1.5);
        let p = resolve_clear_position(&store, anchor, desired, 32).unwrap();
        assert!(store.is_clear_standing_cell(p.cell()));
        assert!(p.x < 10.0);
    }

    #[test]
    fn obstructed_anchor_yields_none() {
        let store = walled_store();
        let anchor = Vec3::new(10.5, 12.5, 1.5);
        assert_eq!(resolve_clear_position(&store, anchor, anchor, 4), None);
    }

    #[test]
    fn standing_cell_needs_air_above_and_below() {
        let store = walled_store();
        assert!(store.is_clear_standing_cell(BlockPos::new(2, 11, 2)));
        // resting on the floor: the cell below is solid
        assert!(!store.is_clear_standing_cell(BlockPos::new(2, 10, 2)));
        assert!(!store.is_clear_standing_cell(BlockPos::new(10, 12, 2)));
    }

    #[test]
    fn air_run_counts_until_first_solid() {
        let store = walled_store();
        assert_eq!(store.air_run_above(BlockPos::new(2, 10, 2), 50), 50);
        assert_eq!(store.air_run_above(BlockPos::new(2, 5, 2), 50), 4);
    }
}
