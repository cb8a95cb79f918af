use delve_dungeon::{
    ChestVariant, DungeonCatalog, RoomKind, ThemeId, carve, fresh_instance_store, generate_layout,
    plan_spawns,
};
use delve_world::SpatialQuery;
use strum::IntoEnumIterator;

fn carve_theme(cat: &DungeonCatalog, theme: ThemeId, seed: u64) -> (delve_world::ChunkStore, delve_dungeon::CarveOutcome) {
    let layout = generate_layout(cat, theme, seed).unwrap();
    let mut store = fresh_instance_store(cat, theme, seed).unwrap();
    let out = carve(&layout, &mut store, cat, theme).unwrap();
    (store, out)
}

#[test]
fn spawn_column_is_clear_and_undecorated() {
    let cat = DungeonCatalog::builtin().unwrap();
    let params = cat.carve_params().clone();
    for theme in ThemeId::iter() {
        let (store, out) = carve_theme(&cat, theme, 31);
        let s = out.spawn_point;
        for dx in -1..=1 {
            for dz in -1..=1 {
                for dy in 0..params.spawn_clear_height {
                    assert!(store.is_air(s.offset(dx, dy, dz)), "{theme}: blocked at {dx},{dy},{dz}");
                }
            }
        }
        assert!(store.decorations_within(s, params.spawn_decoration_radius).is_empty());
    }
}

#[test]
fn enemies_stand_on_the_floor() {
    let cat = DungeonCatalog::builtin().unwrap();
    for theme in ThemeId::iter() {
        let (store, out) = carve_theme(&cat, theme, 64);
        let plans = plan_spawns(&cat, &out, &store).unwrap();
        assert!(!plans.is_empty());
        for p in &plans {
            assert!(p.position.y <= out.surface_y as f32 + 1.6);
            let cell = p.position.cell();
            assert!(store.is_air(cell));
            assert!(!store.is_air(cell.offset(0, -1, 0)));
        }
    }
}

#[test]
fn exits_and_chests_have_headroom() {
    let cat = DungeonCatalog::builtin().unwrap();
    for theme in ThemeId::iter() {
        let (store, out) = carve_theme(&cat, theme, 5);
        assert!(store.air_run_above(out.exit_point, 64) >= 4);
        assert_eq!(out.chest_sites.len(), 1);
        let chest = &out.chest_sites[0];
        let need = match chest.variant {
            ChestVariant::Small => 6,
            ChestVariant::Large => 10,
        };
        match theme {
            ThemeId::Snow | ThemeId::Mine => assert_eq!(need, 10, "{theme}"),
            ThemeId::Desert | ThemeId::Forest | ThemeId::Plains => assert_eq!(need, 6, "{theme}"),
        }
        assert_eq!(chest.clear_height, need);
        for c in chest.cells() {
            assert!(store.air_run_above(c, need) >= need, "{theme}: chest column {c:?}");
        }
    }
}

#[test]
fn carving_is_reproducible_on_a_fresh_store() {
    let cat = DungeonCatalog::builtin().unwrap();
    let (a, out_a) = carve_theme(&cat, ThemeId::Snow, 777);
    let (b, out_b) = carve_theme(&cat, ThemeId::Snow, 777);
    assert_eq!(out_a, out_b);
    let room = out_a.room(RoomKind::Boss).unwrap().expand_xz(2);
    for y in out_a.surface_y - 2..out_a.surface_y + 12 {
        for (x, z) in room.columns() {
            assert_eq!(a.get_block(x, y, z), b.get_block(x, y, z));
        }
    }
}

#[test]
fn plains_roster_is_one_boss_and_four_adds() {
    let cat = DungeonCatalog::builtin().unwrap();
    let (store, out) = carve_theme(&cat, ThemeId::Plains, 2002);
    let plans = plan_spawns(&cat, &out, &store).unwrap();
    assert_eq!(plans.len(), 5);
    assert_eq!(plans.iter().filter(|p| p.is_boss).count(), 1);
    let boss = plans.iter().find(|p| p.is_boss).unwrap();
    assert_eq!(boss.type_id, "giant");
    assert_eq!(boss.room_kind, RoomKind::Boss);
    assert_eq!(boss.stage, 4);
}

#[test]
fn boss_room_minions_add_to_the_roster() {
    let cat = DungeonCatalog::builtin().unwrap();
    let (store, out) = carve_theme(&cat, ThemeId::Mine, 9);
    let plans = plan_spawns(&cat, &out, &store).unwrap();
    // four fight-room adds, the boss, one boss-room minion
    assert_eq!(plans.len(), 6);
    assert_eq!(plans.iter().filter(|p| p.room_kind == RoomKind::Boss).count(), 2);
}

#[test]
fn snow_chest_is_open_ten_above_the_floor() {
    let cat = DungeonCatalog::builtin().unwrap();
    for seed in [0, 4004, 91] {
        let (store, out) = carve_theme(&cat, ThemeId::Snow, seed);
        let chest = &out.chest_sites[0];
        assert_eq!(chest.variant, ChestVariant::Large);
        for c in chest.cells() {
            for dy in 0..10 {
                assert!(store.is_air(c.offset(0, dy, 0)), "seed {seed}: {c:?} +{dy}");
            }
        }
    }
}
