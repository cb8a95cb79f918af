use serde::Deserialize;

use crate::types::BlockId;

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<BlockId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}
