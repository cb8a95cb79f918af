use delve_blocks::PaletteError;
use delve_world::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DungeonError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("geometry constraint violated: {0}")]
    GeometryConstraint(String),
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(#[from] StoreError),
}

impl DungeonError {
    pub fn config(msg: impl Into<String>) -> Self {
        DungeonError::Configuration(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        DungeonError::GeometryConstraint(msg.into())
    }
}

impl From<PaletteError> for DungeonError {
    fn from(e: PaletteError) -> Self {
        DungeonError::Configuration(e.to_string())
    }
}

impl From<toml::de::Error> for DungeonError {
    fn from(e: toml::de::Error) -> Self {
        DungeonError::Configuration(e.to_string())
    }
}
