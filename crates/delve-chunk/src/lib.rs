//! Chunk buffers: a fixed cube of blocks plus the decorations generated with it.
#![forbid(unsafe_code)]

mod coord;

pub use coord::{CHUNK_SIZE, ChunkCoord, local_to_world, world_to_local};

use delve_blocks::Block;
use delve_geom::BlockPos;

const VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Plant,
    Shrub,
}

/// Ambient object baked into terrain generation. `base` is the lowest cell it occupies and
/// it extends `height` cells straight up, all filled with `block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub base: BlockPos,
    pub height: u8,
    pub block: Block,
}

impl Decoration {
    pub fn cells(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (0..i32::from(self.height)).map(|dy| self.base.offset(0, dy, 0))
    }
}

#[derive(Clone, Debug)]
pub struct ChunkBuf {
    pub coord: ChunkCoord,
    pub blocks: Vec<Block>,
    pub decorations: Vec<Decoration>,
    dirty: bool,
}

impl ChunkBuf {
    pub fn new_empty(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![Block::AIR; VOLUME],
            decorations: Vec::new(),
            dirty: false,
        }
    }

    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[Self::idx(x, y, z)]
    }

    /// Writes a cell and marks the chunk dirty when the value changed.
    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, b: Block) -> bool {
        let i = Self::idx(x, y, z);
        if self.blocks[i] == b {
            return false;
        }
        self.blocks[i] = b;
        self.dirty = true;
        true
    }

    /// Highest non-air local y in a column.
    pub fn top_solid_local(&self, x: usize, z: usize) -> Option<usize> {
        (0..CHUNK_SIZE).rev().find(|&y| self.get_local(x, y, z).is_solid())
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the previous flag.
    #[inline]
    pub fn clear_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Removes and returns every decoration matching `pred`.
    pub fn take_decorations_where(
        &mut self,
        mut pred: impl FnMut(&Decoration) -> bool,
    ) -> Vec<Decoration> {
        let mut taken = Vec::new();
        self.decorations.retain(|d| {
            if pred(d) {
                taken.push(*d);
                false
            } else {
                true
            }
        });
        if !taken.is_empty() {
            self.dirty = true;
        }
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_local_only_dirties_on_change() {
        let mut buf = ChunkBuf::new_empty(ChunkCoord::new(0, 0, 0));
        assert!(!buf.set_local(1, 2, 3, Block::AIR));
        assert!(!buf.is_dirty());
        assert!(buf.set_local(1, 2, 3, Block::new(5)));
        assert!(buf.is_dirty());
        assert!(buf.clear_dirty());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn top_solid_local_finds_highest() {
        let mut buf = ChunkBuf::new_empty(ChunkCoord::new(-1, 0, 2));
        assert_eq!(buf.top_solid_local(4, 4), None);
        buf.set_local(4, 3, 4, Block::new(1));
        buf.set_local(4, 17, 4, Block::new(2));
        assert_eq!(buf.top_solid_local(4, 4), Some(17));
    }

    #[test]
    fn take_decorations_removes_matches_only() {
        let mut buf = ChunkBuf::new_empty(ChunkCoord::new(0, 0, 0));
        for x in 0..4 {
            buf.decorations.push(Decoration {
                kind: DecorationKind::Plant,
                base: BlockPos::new(x, 10, 0),
                height: 1,
                block: Block::new(15),
            });
        }
        let taken = buf.take_decorations_where(|d| d.base.x < 2);
        assert_eq!(taken.len(), 2);
        assert_eq!(buf.decorations.len(), 2);
        assert!(buf.is_dirty());
    }
}
