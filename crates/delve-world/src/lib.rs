//! Chunked voxel store, instance terrain, and the spatial query surface.
#![forbid(unsafe_code)]

pub mod generation;
pub mod spatial;
pub mod store;
pub mod worldgen;

pub use generation::TerrainGenerator;
pub use spatial::{SpatialQuery, resolve_clear_position};
pub use store::{ChunkStore, EMPTY_COLUMN_Y, StoreError};
pub use worldgen::{StoreLimits, TerrainParams, WorldGenConfig};
