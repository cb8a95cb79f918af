use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::BlocksConfig;
use crate::types::{Block, BlockId};

const BUILTIN_BLOCKS: &str = include_str!("../assets/blocks.toml");

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("failed to read block palette: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse block palette: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("block `{name}` reuses id {id} already taken by `{existing}`")]
    DuplicateId {
        name: String,
        id: BlockId,
        existing: String,
    },
    #[error("block `{0}` is defined twice")]
    DuplicateName(String),
    #[error("block `{0}` may not use id 0, which is reserved for air")]
    ReservedAir(String),
    #[error("unknown block name `{0}`")]
    UnknownName(String),
}

/// Name ↔ id table. Id 0 is always `air`.
#[derive(Clone, Debug)]
pub struct BlockPalette {
    names: Vec<Option<String>>,
    by_name: HashMap<String, BlockId>,
}

impl BlockPalette {
    pub fn builtin() -> Result<Self, PaletteError> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, PaletteError> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, PaletteError> {
        let mut pal = BlockPalette {
            names: vec![Some("air".to_string())],
            by_name: HashMap::from([("air".to_string(), 0)]),
        };
        for def in cfg.blocks {
            if pal.by_name.contains_key(&def.name) {
                return Err(PaletteError::DuplicateName(def.name));
            }
            // Unnumbered entries take the next free slot.
            let id = match def.id {
                Some(id) => id,
                None => pal.names.len() as BlockId,
            };
            if id == 0 {
                return Err(PaletteError::ReservedAir(def.name));
            }
            let slot = id as usize;
            if pal.names.len() <= slot {
                pal.names.resize(slot + 1, None);
            }
            if let Some(existing) = &pal.names[slot] {
                return Err(PaletteError::DuplicateId {
                    name: def.name,
                    id,
                    existing: existing.clone(),
                });
            }
            pal.names[slot] = Some(def.name.clone());
            pal.by_name.insert(def.name, id);
        }
        Ok(pal)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn block(&self, name: &str) -> Result<Block, PaletteError> {
        self.id_by_name(name)
            .map(Block::new)
            .ok_or_else(|| PaletteError::UnknownName(name.to_string()))
    }

    pub fn name_of(&self, id: BlockId) -> Option<&str> {
        self.names.get(id as usize).and_then(|n| n.as_deref())
    }

    /// Number of named blocks, air included.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_palette_parses_and_reserves_air() {
        let pal = BlockPalette::builtin().expect("builtin palette");
        assert_eq!(pal.id_by_name("air"), Some(0));
        assert_eq!(pal.name_of(0), Some("air"));
        let stone = pal.block("stone").unwrap();
        assert!(stone.is_solid());
        assert_eq!(pal.name_of(stone.id), Some("stone"));
    }

    #[test]
    fn redefining_air_slot_is_rejected() {
        let err = BlockPalette::from_toml_str(
            r#"
            [[blocks]]
            name = "void"
            id = 0
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, PaletteError::ReservedAir(_)));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let pal = BlockPalette::builtin().unwrap();
        assert!(matches!(
            pal.block("unobtainium"),
            Err(PaletteError::UnknownName(_))
        ));
    }
}
