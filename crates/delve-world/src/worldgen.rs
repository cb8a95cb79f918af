use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub terrain: TerrainParams,
    #[serde(default)]
    pub limits: StoreLimits,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TerrainParams {
    /// Nominal walkable height: the top of flat ground sits just below it.
    #[serde(default = "default_surface_y")]
    pub surface_y: i32,
    #[serde(default = "default_hill_frequency")]
    pub hill_frequency: f32,
    #[serde(default = "default_hill_amplitude")]
    pub hill_amplitude: i32,
    #[serde(default = "default_topsoil")]
    pub topsoil_thickness: i32,
    #[serde(default = "default_top_block")]
    pub top_block: String,
    #[serde(default = "default_subsoil_block")]
    pub subsoil_block: String,
    #[serde(default = "default_deep_block")]
    pub deep_block: String,
    #[serde(default = "default_plant_density")]
    pub plant_density: f32,
    #[serde(default = "default_plant_max_height")]
    pub plant_max_height: u8,
    #[serde(default = "default_plant_blocks")]
    pub plant_blocks: Vec<String>,
}

fn default_surface_y() -> i32 {
    32
}
fn default_hill_frequency() -> f32 {
    0.035
}
fn default_hill_amplitude() -> i32 {
    5
}
fn default_topsoil() -> i32 {
    3
}
fn default_top_block() -> String {
    "grass".into()
}
fn default_subsoil_block() -> String {
    "dirt".into()
}
fn default_deep_block() -> String {
    "stone".into()
}
fn default_plant_density() -> f32 {
    0.05
}
fn default_plant_max_height() -> u8 {
    2
}
fn default_plant_blocks() -> Vec<String> {
    vec!["tall_grass".into(), "fern".into()]
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            surface_y: default_surface_y(),
            hill_frequency: default_hill_frequency(),
            hill_amplitude: default_hill_amplitude(),
            topsoil_thickness: default_topsoil(),
            top_block: default_top_block(),
            subsoil_block: default_subsoil_block(),
            deep_block: default_deep_block(),
            plant_density: default_plant_density(),
            plant_max_height: default_plant_max_height(),
            plant_blocks: default_plant_blocks(),
        }
    }
}

impl TerrainParams {
    /// Highest cell terrain (including plants) can ever occupy.
    pub fn max_terrain_y(&self) -> i32 {
        self.surface_y - 1 + self.hill_amplitude.max(0) + i32::from(self.plant_max_height)
    }
}

/// Bounds on what the store will materialize.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreLimits {
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    /// Exclusive.
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    #[serde(default = "default_max_abs_xz")]
    pub max_abs_xz: i32,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_min_y() -> i32 {
    0
}
fn default_max_y() -> i32 {
    128
}
fn default_max_abs_xz() -> i32 {
    1 << 20
}
fn default_max_chunks() -> usize {
    8192
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
            max_abs_xz: default_max_abs_xz(),
            max_chunks: default_max_chunks(),
        }
    }
}

impl StoreLimits {
    #[inline]
    pub fn contains(&self, wx: i32, wy: i32, wz: i32) -> bool {
        wy >= self.min_y
            && wy < self.max_y
            && wx.checked_abs().is_some_and(|a| a <= self.max_abs_xz)
            && wz.checked_abs().is_some_and(|a| a <= self.max_abs_xz)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<WorldGenConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_overrides_from_a_file() {
        let path = std::env::temp_dir().join(format!("delve-worldgen-{}.toml", std::process::id()));
        fs::write(&path, "[terrain]\nhill_amplitude = 2\n").unwrap();
        let cfg = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(cfg.terrain.hill_amplitude, 2);
        assert_eq!(cfg.limits, StoreLimits::default());
        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: WorldGenConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.terrain, TerrainParams::default());
        assert_eq!(cfg.limits, StoreLimits::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: WorldGenConfig = toml::from_str(
            r#"
            [terrain]
            surface_y = 40
            plant_blocks = ["cactus"]

            [limits]
            max_chunks = 16
        "#,
        )
        .unwrap();
        assert_eq!(cfg.terrain.surface_y, 40);
        assert_eq!(cfg.terrain.plant_blocks, vec!["cactus".to_string()]);
        assert_eq!(cfg.terrain.top_block, "grass");
        assert_eq!(cfg.limits.max_chunks, 16);
        assert_eq!(cfg.limits.max_y, 128);
    }

    #[test]
    fn limits_reject_extreme_coordinates() {
        let l = StoreLimits::default();
        assert!(l.contains(0, 0, 0));
        assert!(!l.contains(0, -1, 0));
        assert!(!l.contains(i32::MIN, 10, 0));
        assert!(!l.contains(0, 10, l.max_abs_xz + 1));
    }
}
