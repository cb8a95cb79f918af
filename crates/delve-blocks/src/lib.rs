//! Block ids and the name → id palette.
#![forbid(unsafe_code)]

pub mod config;
pub mod palette;
pub mod types;

pub use palette::{BlockPalette, PaletteError};
pub use types::{Block, BlockId};
