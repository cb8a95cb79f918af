use delve_blocks::config::{BlockDef, BlocksConfig};
use delve_blocks::{BlockPalette, PaletteError};
use proptest::prelude::*;

#[test]
fn unnumbered_blocks_take_next_free_slot() {
    let pal = BlockPalette::from_toml_str(
        r#"
        [[blocks]]
        name = "stone"

        [[blocks]]
        name = "dirt"
    "#,
    )
    .unwrap();
    assert_eq!(pal.id_by_name("stone"), Some(1));
    assert_eq!(pal.id_by_name("dirt"), Some(2));
    assert_eq!(pal.len(), 3);
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = BlockPalette::from_toml_str(
        r#"
        [[blocks]]
        name = "stone"
        id = 4

        [[blocks]]
        name = "dirt"
        id = 4
    "#,
    )
    .unwrap_err();
    assert!(matches!(err, PaletteError::DuplicateId { id: 4, .. }));
}

proptest! {
    // any set of distinct names with distinct nonzero ids round-trips through the palette
    #[test]
    fn names_and_ids_round_trip(ids in proptest::collection::btree_set(1u16..2000, 1..40)) {
        let blocks: Vec<BlockDef> = ids
            .iter()
            .map(|id| BlockDef { name: format!("b{id}"), id: Some(*id) })
            .collect();
        let pal = BlockPalette::from_config(BlocksConfig { blocks }).unwrap();
        for id in &ids {
            let name = format!("b{id}");
            prop_assert_eq!(pal.id_by_name(&name), Some(*id));
            prop_assert_eq!(pal.name_of(*id), Some(name.as_str()));
        }
        prop_assert_eq!(pal.len(), ids.len() + 1);
    }
}
