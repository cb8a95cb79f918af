use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::theme::ThemeId;

pub type DungeonRng = Xoshiro256PlusPlus;

const STREAM_LAYOUT: u64 = 0x4C41_594F;
const STREAM_POPULATION: u64 = 0x504F_5055;
const STREAM_TERRAIN: u64 = 0x5445_5252;

/// splitmix64 finalizer.
pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn stream_seed(theme: ThemeId, seed: u64, stream: u64) -> u64 {
    mix64(seed ^ theme.salt() ^ mix64(stream))
}

pub fn layout_rng(theme: ThemeId, seed: u64) -> DungeonRng {
    DungeonRng::seed_from_u64(stream_seed(theme, seed, STREAM_LAYOUT))
}

pub fn population_rng(theme: ThemeId, seed: u64) -> DungeonRng {
    DungeonRng::seed_from_u64(stream_seed(theme, seed, STREAM_POPULATION))
}

/// Seed handed to the instance terrain generator.
pub fn terrain_seed(theme: ThemeId, seed: u64) -> u64 {
    stream_seed(theme, seed, STREAM_TERRAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn streams_are_reproducible_and_independent() {
        let a: Vec<u32> = (0..4).map({
            let mut r = layout_rng(ThemeId::Plains, 9);
            move |_| r.random()
        }).collect();
        let b: Vec<u32> = (0..4).map({
            let mut r = layout_rng(ThemeId::Plains, 9);
            move |_| r.random()
        }).collect();
        let c: Vec<u32> = (0..4).map({
            let mut r = population_rng(ThemeId::Plains, 9);
            move |_| r.random()
        }).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(terrain_seed(ThemeId::Plains, 9), terrain_seed(ThemeId::Snow, 9));
    }
}
