use delve_geom::BlockPos;
use serde::{Deserialize, Serialize};

/// Edge length of every chunk, in cells.
pub const CHUNK_SIZE: usize = 32;
const CS: i32 = CHUNK_SIZE as i32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk owning a world cell. Total for every `i32` coordinate.
    #[inline]
    pub fn containing(wx: i32, wy: i32, wz: i32) -> Self {
        Self {
            cx: wx.div_euclid(CS),
            cy: wy.div_euclid(CS),
            cz: wz.div_euclid(CS),
        }
    }

    /// World position of local cell (0, 0, 0), or `None` when it would not fit in `i32`.
    #[inline]
    pub fn checked_origin(self) -> Option<BlockPos> {
        Some(BlockPos::new(
            self.cx.checked_mul(CS)?,
            self.cy.checked_mul(CS)?,
            self.cz.checked_mul(CS)?,
        ))
    }

    /// World position of local cell (0, 0, 0). Coordinates built by [`ChunkCoord::containing`]
    /// always fit; out-of-range coordinates saturate.
    #[inline]
    pub fn origin(self) -> BlockPos {
        BlockPos::new(
            self.cx.saturating_mul(CS),
            self.cy.saturating_mul(CS),
            self.cz.saturating_mul(CS),
        )
    }
}

/// Split a world cell into its owning chunk and the local cell inside it.
#[inline]
pub fn world_to_local(wx: i32, wy: i32, wz: i32) -> (ChunkCoord, [usize; 3]) {
    let coord = ChunkCoord::containing(wx, wy, wz);
    let local = [
        wx.rem_euclid(CS) as usize,
        wy.rem_euclid(CS) as usize,
        wz.rem_euclid(CS) as usize,
    ];
    (coord, local)
}

/// Inverse of [`world_to_local`].
#[inline]
pub fn local_to_world(coord: ChunkCoord, local: [usize; 3]) -> BlockPos {
    coord
        .origin()
        .offset(local[0] as i32, local[1] as i32, local[2] as i32)
}
