use delve_dungeon::{
    Axis, CorridorKind, DungeonCatalog, MIN_CORRIDOR_WIDTH, RelativeAxis, RoomKind, ThemeId,
    generate_layout,
};
use proptest::prelude::*;

fn theme_strategy() -> impl Strategy<Value = ThemeId> {
    prop_oneof![
        Just(ThemeId::Forest),
        Just(ThemeId::Plains),
        Just(ThemeId::Desert),
        Just(ThemeId::Snow),
        Just(ThemeId::Mine),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Shape holds for any theme and seed.
    #[test]
    fn layouts_keep_their_shape(theme in theme_strategy(), seed in any::<u64>()) {
        let cat = DungeonCatalog::builtin().unwrap();
        let l = generate_layout(&cat, theme, seed).unwrap();
        prop_assert_eq!(l.rooms.len(), 8);
        for (room, kind) in l.rooms.iter().zip(RoomKind::CHAIN) {
            prop_assert_eq!(room.kind, kind);
        }
        prop_assert!(l.corridors.len() >= 7);
        prop_assert!(l.corridors.iter().all(|c| c.width >= MIN_CORRIDOR_WIDTH));
        prop_assert!(l.corridors.iter().any(|c| c.kind == CorridorKind::Branch));
        let primary = l.primary_axis();
        prop_assert!(l.corridors.iter().any(|c| c.axis != primary));
        prop_assert!(l.corridors.iter().any(|c| l.relative_axis(c) == RelativeAxis::Right));
        for (i, a) in l.rooms.iter().enumerate() {
            for b in &l.rooms[i + 1..] {
                prop_assert!(!a.bounds.intersects(&b.bounds));
            }
        }
    }

    // Regenerating from the same inputs reproduces the layout exactly.
    #[test]
    fn layouts_are_reproducible(theme in theme_strategy(), seed in any::<u64>()) {
        let cat = DungeonCatalog::builtin().unwrap();
        let a = generate_layout(&cat, theme, seed).unwrap();
        let b = generate_layout(&cat, theme, seed).unwrap();
        prop_assert_eq!(a, b);
    }

    // Rooms sit on the floor plane and corridors match the rooms' height.
    #[test]
    fn rooms_and_corridors_share_the_floor(theme in theme_strategy(), seed in any::<u64>()) {
        let cat = DungeonCatalog::builtin().unwrap();
        let l = generate_layout(&cat, theme, seed).unwrap();
        let h = l.rooms[0].bounds.max.y;
        for r in &l.rooms {
            prop_assert_eq!(r.bounds.min.y, 0);
            prop_assert_eq!(r.bounds.max.y, h);
        }
        for c in &l.corridors {
            prop_assert_eq!(c.bounds.min.y, 0);
            prop_assert_eq!(c.bounds.max.y, h);
            let run = match c.axis {
                Axis::X => c.bounds.size_x(),
                Axis::Z => c.bounds.size_z(),
            };
            prop_assert!(run >= 2);
        }
    }
}

#[test]
fn different_seeds_usually_differ() {
    let cat = DungeonCatalog::builtin().unwrap();
    let base = generate_layout(&cat, ThemeId::Plains, 1).unwrap();
    let differing = (2..12u64)
        .filter(|s| generate_layout(&cat, ThemeId::Plains, *s).unwrap() != base)
        .count();
    assert!(differing >= 8);
}

#[test]
fn narrow_theme_corridors_are_widened() {
    let src = include_str!("../assets/themes.toml").replace("corridor_width = 8", "corridor_width = 4");
    let cat = DungeonCatalog::from_toml_str(&src, delve_blocks::BlockPalette::builtin().unwrap()).unwrap();
    let l = generate_layout(&cat, ThemeId::Forest, 17).unwrap();
    assert!(l.corridors.iter().all(|c| c.width == MIN_CORRIDOR_WIDTH));
}
