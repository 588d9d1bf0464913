//! Integration tests for save/load and the session-level flows that
//! combine the record, the catalogs, and the store.

use sheet_core::{
    store, Ability, ItemCatalog, Resource, SessionError, SheetError, SheetSession, SpellCatalog,
    SpellTier, StoreError,
};
use tempfile::TempDir;

const ITEMS_CSV: &str = "\
Name,Rarity,Type,Value,Weight,Damage,Description
Leather Armor,Common,Light Armor,10 gp,10 lb.,11 + Dex,Supple leather armor.
Plate Armor,Common,Heavy Armor,1500 gp,65 lb.,18,Interlocking metal plates.
Dagger,Common,Simple Weapon,2 gp,1 lb.,1d4,A pointy knife.
";

const SORCERER_SPELLS_CSV: &str = "\
Name,Level,School,Casting Time,Range,Duration,Components,Classes,Text,At Higher Levels,Source
Fire Bolt,Cantrip,Evocation,1 action,120 feet,Instantaneous,\"V, S\",Sorcerer,\"Hurl a mote of fire that deals 1d10 fire damage.\",,PHB
Scorching Ray,2nd,Evocation,1 action,120 feet,Instantaneous,\"V, S\",Sorcerer,\"Each ray deals 2d6 fire damage on a hit.\",,PHB
";

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("character_data.csv")
}

#[test]
fn test_full_session_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = store_path(&dir);

    let mut spells = SpellCatalog::default();
    spells.absorb(SORCERER_SPELLS_CSV);
    let mut session = SheetSession::open(&path)
        .expect("open")
        .with_item_catalog(ItemCatalog::parse(ITEMS_CSV))
        .with_spell_catalog(spells);

    // Build up a character through the session API.
    session.set_ability(Ability::Dexterity, 16);
    session.set_ability(Ability::Charisma, 17);
    session.set_info("Race", "Half-Elf");
    session.set_info("Class", "Sorcerer (Draconic Bloodline)");
    session.set_info("Skills", "Arcana, Insight, Persuasion");
    session.award_experience(450);
    session.learn_spell(SpellTier::Cantrip, "Fire Bolt").unwrap();
    session
        .learn_spell(SpellTier::Second, "Scorching Ray")
        .unwrap();
    session.add_item("Dagger", 2, false, None).unwrap();
    session
        .add_item("Leather Armor", 1, true, None)
        .unwrap();
    session.spend(Resource::HitPoints, 9);
    session.save().unwrap();

    // A fresh session over the same file sees every field.
    let restored = SheetSession::open(&path).expect("reopen");
    let record = restored.record();
    assert_eq!(record.abilities.dexterity, 16);
    assert_eq!(record.abilities.charisma, 17);
    assert_eq!(record.experience.level, 2);
    assert_eq!(record.experience.current, 150);
    assert_eq!(record.hit_points.current, 23);
    assert_eq!(record.info["Race"], "Half-Elf");
    assert_eq!(record.info["Skills"], "Arcana, Insight, Persuasion");
    assert!(record.knows_spell(SpellTier::Cantrip, "Fire Bolt"));
    assert!(record.knows_spell(SpellTier::Second, "Scorching Ray"));
    assert_eq!(record.inventory["Dagger"].quantity, 2);
    assert!(record.inventory["Leather Armor"].equipped);
    // Equipping the armor recomputed AC: 11 base + 3 DEX.
    assert_eq!(record.armor_class.current, 14);
}

#[test]
fn test_spell_rows_stay_canonically_sorted_on_disk() {
    let dir = TempDir::new().expect("temp dir");
    let path = store_path(&dir);
    let mut session = SheetSession::open(&path).expect("open");

    // Learned out of order, across tiers, with mixed case.
    session.learn_spell(SpellTier::Third, "Fly").unwrap();
    session.learn_spell(SpellTier::Cantrip, "fire bolt").unwrap();
    session.learn_spell(SpellTier::Third, "Counterspell").unwrap();
    session
        .learn_spell(SpellTier::Cantrip, "Acid Splash")
        .unwrap();

    let text = std::fs::read_to_string(&path).expect("read store");
    let spell_lines: Vec<&str> = text
        .lines()
        .filter(|line| {
            line.split(',')
                .next()
                .map(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(
        spell_lines,
        vec![
            "0,Acid Splash",
            "0,fire bolt",
            "3,Counterspell",
            "3,Fly",
        ]
    );
}

#[test]
fn test_delete_missing_spell_reports_not_found_and_preserves_store() {
    let dir = TempDir::new().expect("temp dir");
    let path = store_path(&dir);
    let mut session = SheetSession::open(&path).expect("open");
    session.learn_spell(SpellTier::Third, "Fireball").unwrap();
    session.save().unwrap();
    let before = std::fs::read_to_string(&path).expect("read store");

    let err = session
        .forget_spell(SpellTier::Third, "Wish")
        .expect_err("should be missing");
    assert!(matches!(
        err,
        SessionError::Sheet(SheetError::SpellNotFound { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).expect("read store"), before);

    // The store-level operation reports the same taxonomy.
    let err = store::delete_spell(&path, SpellTier::First, "Fireball").expect_err("wrong tier");
    assert!(matches!(err, StoreError::SpellNotFound { .. }));
    assert_eq!(std::fs::read_to_string(&path).expect("read store"), before);
}

#[test]
fn test_equipped_item_survives_deletion_attempts() {
    let dir = TempDir::new().expect("temp dir");
    let path = store_path(&dir);
    let mut session = SheetSession::open(&path)
        .expect("open")
        .with_item_catalog(ItemCatalog::parse(ITEMS_CSV));

    session.add_item("Plate Armor", 1, true, None).unwrap();
    assert_eq!(session.record().armor_class.current, 18);

    // Deleting while equipped is refused; the flag does not flip.
    let err = session.remove_item("Plate Armor", 1).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Sheet(SheetError::ItemEquipped(_))
    ));
    assert!(session.record().inventory["Plate Armor"].equipped);

    // Only the explicit unequip path transitions the flag, and it
    // restores the AC baseline.
    session.unequip_item("Plate Armor").unwrap();
    assert!(!session.record().inventory["Plate Armor"].equipped);
    assert_eq!(session.record().armor_class.current, 12);
    session.remove_item("Plate Armor", 1).unwrap();
    assert!(!session.record().inventory.contains_key("Plate Armor"));
}

#[test]
fn test_catalog_backed_spell_lookup_with_damage_annotation() {
    let dir = TempDir::new().expect("temp dir");
    let mut spells = SpellCatalog::default();
    spells.absorb(SORCERER_SPELLS_CSV);
    let session = SheetSession::open(store_path(&dir))
        .expect("open")
        .with_spell_catalog(spells);

    let entry = session.lookup_spell("scorching ray").expect("known spell");
    let damage = entry.damage().expect("has annotation");
    assert_eq!(damage.notation(), "2d6");
    assert_eq!(damage.range(), "2 to 12");

    assert!(session.lookup_spell("Wish").is_err());
}

#[test]
fn test_tolerated_override_round_trips_through_disk() {
    let dir = TempDir::new().expect("temp dir");
    let path = store_path(&dir);
    let mut session = SheetSession::open(&path).expect("open");

    // House rule: current above maximum via the override path.
    session.set_current(Resource::HitPoints, 40);
    session.set_maximum(Resource::SorceryPoints, 2);
    session.save().unwrap();

    let mut session = SheetSession::open(&path).expect("reopen");
    assert_eq!(session.record().hit_points.current, 40);
    // Shrinking the maximum re-clamped the pool before saving.
    assert_eq!(session.record().sorcery_points.current, 2);

    // The next clamped mutation pulls the override back into range.
    session.spend(Resource::HitPoints, 1);
    assert_eq!(session.record().hit_points.current, 32);
}
