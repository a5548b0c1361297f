use emberfall_core::{
    config::DungeonConfig, CellCoord, ContentCategory, ContentError, CreatureKind, ItemKind,
    Position, SubCellCoord, TerrainKind,
};
use emberfall_world::{load, save, Dungeon, LevelBlueprint, PersistenceError, SAVE_VERSION};

const LEVEL: &str = "\
##########
#S..~~~..#
#..T~~~.>#
#........#
##########

creature:zombie 2 1
creature:eel 5 2
item:barrel 7 3
item:scroll 7 3
light 1 3
";

fn sample_dungeon() -> Dungeon {
    let mut dungeon = LevelBlueprint::parse(LEVEL)
        .expect("valid blueprint")
        .build(DungeonConfig::default());
    let victim = dungeon
        .add_creature(CreatureKind::Rat, Position::new(6.5, 3.5))
        .expect("in bounds");
    let _ = dungeon.remove_creature(victim, true);
    dungeon.compute_fov(Position::new(1.5, 1.5), dungeon.bounds());
    dungeon.remember_fov();
    dungeon
}

fn saved_bytes(dungeon: &Dungeon) -> Vec<u8> {
    let mut bytes = Vec::new();
    save(dungeon, &mut bytes).expect("save");
    bytes
}

#[test]
fn dungeon_survives_a_save_load_cycle() {
    let original = sample_dungeon();
    let restored = load(saved_bytes(&original).as_slice(), DungeonConfig::default())
        .expect("load");

    assert_eq!(restored.width(), original.width());
    assert_eq!(restored.height(), original.height());
    assert_eq!(restored.stairs(), Some(CellCoord::new(8, 2)));
    assert_eq!(restored.spawn_sources(), original.spawn_sources());
    assert_eq!(restored.sub_cells(), original.sub_cells());
    assert_eq!(restored.canopy_image(), original.canopy_image());
    for (x, y) in original.bounds().iter() {
        let cell = CellCoord::new(x, y);
        assert_eq!(restored.terrain(cell), original.terrain(cell));
        assert_eq!(restored.creatures_at(cell), original.creatures_at(cell));
        assert_eq!(restored.is_remembered(cell), original.is_remembered(cell));
        assert_eq!(restored.is_walkable(cell), original.is_walkable(cell));
        assert_eq!(restored.items_at(cell), original.items_at(cell));
    }
    let probe = SubCellCoord::new(3, 3);
    assert_eq!(restored.shadow_height(probe), original.shadow_height(probe));
    assert_eq!(restored.corpses(), original.corpses());
    assert_eq!(restored.lights().count(), 1);
    assert_eq!(restored.creature_count(), 2);
    assert!(restored.has_corpse(CellCoord::new(6, 3)));
    assert_eq!(
        restored.terrain(CellCoord::new(5, 2)),
        Some(TerrainKind::ShallowWater)
    );
}

#[test]
fn restored_ids_do_not_collide_with_new_ones() {
    let original = sample_dungeon();
    let mut restored = load(saved_bytes(&original).as_slice(), DungeonConfig::default())
        .expect("load");
    let existing: Vec<_> = restored.creatures().map(|creature| creature.id()).collect();
    let fresh = restored
        .add_creature(CreatureKind::Ghoul, Position::new(3.5, 3.5))
        .expect("in bounds");
    assert!(!existing.contains(&fresh));

    let item = restored
        .add_item(ItemKind::Torch, CellCoord::new(2, 3))
        .expect("in bounds");
    assert!(restored.items().filter(|stored| stored.id() == item).count() == 1);
}

#[test]
fn version_mismatch_fails_the_whole_load() {
    let mut bytes = saved_bytes(&sample_dungeon());
    bytes[4..8].copy_from_slice(&(SAVE_VERSION + 1).to_le_bytes());

    match load(bytes.as_slice(), DungeonConfig::default()) {
        Err(PersistenceError::VersionMismatch {
            chunk,
            expected,
            found,
        }) => {
            assert_eq!(chunk, "DUNG");
            assert_eq!(expected, SAVE_VERSION);
            assert_eq!(found, SAVE_VERSION + 1);
        }
        other => panic!("expected a version mismatch, got {other:?}"),
    }
}

#[test]
fn unknown_creature_type_fails_the_load() {
    let bytes = saved_bytes(&sample_dungeon());
    let needle = b"zombie";
    let position = bytes
        .windows(needle.len())
        .position(|window| window == needle)
        .expect("creature name is stored");
    let mut corrupted = bytes.clone();
    corrupted[position..position + needle.len()].copy_from_slice(b"zomble");

    match load(corrupted.as_slice(), DungeonConfig::default()) {
        Err(PersistenceError::UnknownContent(ContentError::Unknown { category, name })) => {
            assert_eq!(category, ContentCategory::Creature);
            assert_eq!(name, "zomble");
        }
        other => panic!("expected an unknown content error, got {other:?}"),
    }
}

#[test]
fn truncated_save_reports_an_error() {
    let bytes = saved_bytes(&sample_dungeon());
    let truncated = &bytes[..bytes.len() / 2];
    assert!(load(truncated, DungeonConfig::default()).is_err());
}
