use serde::{Deserialize, Serialize};

pub type BlockId = u16;

// Compact voxel cell; only the identifier is stored.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id }
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }

    /// Every non-air block occupies its cell.
    #[inline]
    pub const fn is_solid(self) -> bool {
        self.id != 0
    }
}

impl From<BlockId> for Block {
    fn from(id: BlockId) -> Self {
        Block { id }
    }
}
