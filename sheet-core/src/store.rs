//! Flat-file persistence for the character record.
//!
//! The store is row-oriented text, one logical record per line: ability
//! scores and counters as `Key,Value` pairs, `Max <Resource>` rows for
//! pool ceilings, `Info` rows for narrative fields, one `<tier>,<name>`
//! row per known spell, and `Inventory` rows for the ledger. Rows are
//! identified by their first field: a literal key, or bare digits for a
//! spell tier. Decoding is tolerant: unknown keys and rows with unexpected
//! field counts are ignored, and a missing file is simply the default
//! record.
//!
//! `save` rewrites the whole canonical sorted form atomically (temp file
//! and rename). `append_spell` is the one hot-path exception: it appends a
//! single row without rewriting the store, then runs the resort pass that
//! restores the canonical spell grouping.

use crate::character::{Ability, CharacterRecord, InventoryEntry, SpellTier};
use crate::csv;
use crate::progression;
use std::path::Path;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spell '{name}' not found at tier {tier}")]
    SpellNotFound { tier: SpellTier, name: String },
}

/// Resources with a persisted `Max` row, in canonical order.
const MAX_KEYS: [&str; 6] = [
    "EXP",
    "HP",
    "Spell Points",
    "Sorcery Points",
    "Temp HP",
    "AC",
];

fn is_tier_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Encoding
// ============================================================================

/// Serialize a record into the canonical row order. Deterministic: the
/// same record always encodes to the same text.
pub fn encode(record: &CharacterRecord) -> String {
    let mut lines = Vec::new();
    let mut push = |fields: &[&str]| lines.push(csv::write_row(fields));

    for ability in Ability::all() {
        push(&[
            ability.name(),
            &record.abilities.get(ability).to_string(),
        ]);
    }

    push(&["Level", &record.experience.level.to_string()]);
    push(&["EXP", &record.experience.current.to_string()]);
    push(&["HP", &record.hit_points.current.to_string()]);
    push(&["Temp HP", &record.temp_hit_points.current.to_string()]);
    push(&["AC", &record.armor_class.current.to_string()]);
    push(&["Speed", &record.speed.to_string()]);
    push(&["Spell Points", &record.spell_points.current.to_string()]);
    push(&["Actions", &record.actions.to_string()]);
    push(&["Sorcery Points", &record.sorcery_points.current.to_string()]);

    for key in MAX_KEYS {
        let value = match key {
            // Derived from the progression table, written for display
            // parity and ignored on load.
            "EXP" => progression::threshold_for(record.experience.level).unwrap_or(0) as i32,
            "HP" => record.hit_points.maximum,
            "Spell Points" => record.spell_points.maximum,
            "Sorcery Points" => record.sorcery_points.maximum,
            "Temp HP" => record.temp_hit_points.maximum,
            "AC" => record.armor_class.maximum,
            _ => unreachable!(),
        };
        push(&[&format!("Max {key}"), &value.to_string()]);
    }

    for (field, value) in &record.info {
        push(&["Info", field, value]);
    }

    // Spell rows grouped by tier ascending; each tier's list is already
    // sorted case-insensitively by name.
    for (tier, names) in &record.spells {
        for name in names {
            push(&[&tier.as_index().to_string(), name]);
        }
    }

    for (name, entry) in &record.inventory {
        push(&[
            "Inventory",
            name,
            &entry.quantity.to_string(),
            if entry.equipped { "true" } else { "false" },
        ]);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ============================================================================
// Decoding
// ============================================================================

fn parse_bool(field: &str) -> bool {
    matches!(field.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Deserialize a record, starting from defaults. Absent sections stay at
/// their defaults; malformed rows are skipped, never fatal.
pub fn decode(text: &str) -> CharacterRecord {
    let mut record = CharacterRecord::default();

    for row in csv::parse_rows(text) {
        match row.as_slice() {
            [key, name, quantity] | [key, name, quantity, _] if key == "Inventory" => {
                let equipped = row.get(3).map(|f| parse_bool(f)).unwrap_or(false);
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let quantity = quantity.trim().parse().unwrap_or(1);
                record.inventory.insert(
                    name.to_string(),
                    InventoryEntry {
                        quantity,
                        equipped,
                        description: None,
                    },
                );
            }
            [key, field, value] if key == "Info" => {
                record.info.insert(field.clone(), value.clone());
            }
            [key, value] if is_tier_field(key) => {
                let tier = key.parse::<u8>().ok().and_then(SpellTier::from_index);
                let Some(tier) = tier else {
                    tracing::debug!(row = ?row, "ignoring row with out-of-range tier");
                    continue;
                };
                let name = value.trim();
                if name.is_empty() {
                    continue;
                }
                let list = record.spells.entry(tier).or_default();
                if !list.iter().any(|s| s == name) {
                    list.push(name.to_string());
                }
            }
            [key, value] => {
                let Ok(value) = value.trim().parse::<i32>() else {
                    tracing::debug!(row = ?row, "ignoring row with non-integer value");
                    continue;
                };
                apply_scalar(&mut record, key, value);
            }
            _ => {
                tracing::debug!(row = ?row, "ignoring row with unexpected field count");
            }
        }
    }

    // Restore the record's in-memory ordering invariant regardless of how
    // the file was arranged.
    for list in record.spells.values_mut() {
        list.sort_by_key(|s| s.to_lowercase());
    }

    record
}

/// Apply one `Key,Value` row. Values land directly on the fields: load
/// is an overwrite, not a mutation event, so no clamping or level-up
/// checks run here and the tolerated-override path survives a round trip.
fn apply_scalar(record: &mut CharacterRecord, key: &str, value: i32) {
    if let Some(ability) = Ability::from_name(key) {
        if let Ok(score) = u8::try_from(value) {
            record.abilities.set(ability, score);
        }
        return;
    }
    match key {
        "Level" => {
            if let Ok(level) = u8::try_from(value.max(1)) {
                record.experience.level = level;
            }
        }
        "EXP" => record.experience.current = value.max(0) as u32,
        "HP" => record.hit_points.current = value,
        "Temp HP" => record.temp_hit_points.current = value,
        "AC" => record.armor_class.current = value,
        "Speed" => record.speed = value,
        "Spell Points" => record.spell_points.current = value,
        "Actions" => record.actions = value,
        "Sorcery Points" => record.sorcery_points.current = value,
        "Max HP" => record.hit_points.maximum = value,
        "Max Spell Points" => record.spell_points.maximum = value,
        "Max Sorcery Points" => record.sorcery_points.maximum = value,
        "Max Temp HP" => record.temp_hit_points.maximum = value,
        "Max AC" => record.armor_class.maximum = value,
        // Derived on save; the table is authoritative.
        "Max EXP" => {}
        _ => {
            tracing::debug!(key, "ignoring unknown row key");
        }
    }
}

// ============================================================================
// File operations
// ============================================================================

/// Write the canonical form atomically: temp file in the same directory,
/// then rename over the target.
pub fn save(path: impl AsRef<Path>, record: &CharacterRecord) -> Result<(), StoreError> {
    let path = path.as_ref();
    write_atomic(path, &encode(record))
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => path.with_file_name(format!("{name}.tmp")),
        None => path.with_extension("tmp"),
    };
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read the record back. A missing file is the empty default state.
pub fn load(path: impl AsRef<Path>) -> Result<CharacterRecord, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no store file, starting from defaults");
        return Ok(CharacterRecord::default());
    }
    Ok(decode(&std::fs::read_to_string(path)?))
}

/// Append one spell row without rewriting the store, then resort so the
/// canonical grouping holds.
pub fn append_spell(
    path: impl AsRef<Path>,
    tier: SpellTier,
    name: &str,
) -> Result<(), StoreError> {
    use std::io::Write;

    let path = path.as_ref();
    let row = csv::write_row(&[&tier.as_index().to_string(), name]);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{row}")?;
    drop(file);

    resort_spells(path)
}

/// The resort pass: spell rows move to the tail, sorted by tier then
/// case-insensitive name. All other rows keep their order.
pub fn resort_spells(path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let rows = csv::parse_rows(&std::fs::read_to_string(path)?);

    let (mut spells, others): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|row| row.first().map(|f| is_tier_field(f)).unwrap_or(false));
    spells.sort_by_key(|row| {
        (
            row[0].parse::<u8>().unwrap_or(u8::MAX),
            row.get(1).map(|n| n.to_lowercase()).unwrap_or_default(),
        )
    });

    let mut lines: Vec<String> = Vec::new();
    for row in others.iter().chain(spells.iter()) {
        lines.push(csv::write_row(row));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    write_atomic(path, &out)
}

/// Remove one spell row. Absence of the name at that tier is
/// [`StoreError::SpellNotFound`] and the file is left untouched.
pub fn delete_spell(
    path: impl AsRef<Path>,
    tier: SpellTier,
    name: &str,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    let not_found = || StoreError::SpellNotFound {
        tier,
        name: name.to_string(),
    };

    if !path.exists() {
        return Err(not_found());
    }
    let mut rows = csv::parse_rows(&std::fs::read_to_string(path)?);

    let tier_field = tier.as_index().to_string();
    let idx = rows
        .iter()
        .position(|row| {
            row.len() == 2 && row[0] == tier_field && row[1].trim() == name.trim()
        })
        .ok_or_else(not_found)?;
    rows.remove(idx);

    let mut lines: Vec<String> = Vec::new();
    for row in &rows {
        lines.push(csv::write_row(row));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    write_atomic(path, &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ResourcePool;

    fn sample_record() -> CharacterRecord {
        let mut record = CharacterRecord::default();
        record.abilities.set(Ability::Strength, 15);
        record.abilities.set(Ability::Charisma, 17);
        record.experience.level = 3;
        record.experience.current = 250;
        record.hit_points = ResourcePool {
            current: 21,
            maximum: 28,
        };
        record.spell_points = ResourcePool {
            current: 4,
            maximum: 14,
        };
        record.learn_spell(SpellTier::Third, "Fireball").unwrap();
        record.learn_spell(SpellTier::Cantrip, "Fire Bolt").unwrap();
        record
            .add_item("Leather Armor", 1, true, None)
            .unwrap();
        record
            .info
            .insert("Skills".into(), "Arcana, Insight, Persuasion".into());
        record.info.insert("Race".into(), "Half-Elf".into());
        record
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let record = sample_record();
        let loaded = decode(&encode(&record));

        assert_eq!(loaded.abilities, record.abilities);
        assert_eq!(loaded.experience, record.experience);
        assert_eq!(loaded.hit_points, record.hit_points);
        assert_eq!(loaded.spell_points, record.spell_points);
        assert_eq!(loaded.spells, record.spells);
        assert_eq!(loaded.info, record.info);
        assert_eq!(loaded.inventory["Leather Armor"].quantity, 1);
        assert!(loaded.inventory["Leather Armor"].equipped);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let record = sample_record();
        assert_eq!(encode(&record), encode(&record));
    }

    #[test]
    fn test_round_trip_preserves_override() {
        // A pool left over its maximum by a direct set survives the trip
        // unclamped.
        let mut record = CharacterRecord::default();
        record.hit_points = ResourcePool {
            current: 32,
            maximum: 10,
        };
        let loaded = decode(&encode(&record));
        assert_eq!(loaded.hit_points.current, 32);
        assert_eq!(loaded.hit_points.maximum, 10);
    }

    #[test]
    fn test_decode_tolerates_junk() {
        let text = "\
Strength,15
Nonsense row with no comma
Unknown Key,7
HP,twelve
Too,many,fields,for,a,scalar
3,Fireball
Inventory,Torch,not-a-number
";
        let record = decode(text);
        assert_eq!(record.abilities.strength, 15);
        // Unparseable quantity falls back to 1.
        assert_eq!(record.inventory["Torch"].quantity, 1);
        assert!(record.knows_spell(SpellTier::Third, "Fireball"));
        // The malformed HP row was skipped; the default stands.
        assert_eq!(record.hit_points.current, 32);
    }

    #[test]
    fn test_decode_missing_sections_default_empty() {
        let record = decode("Strength,12\nLevel,2\n");
        assert!(record.spells.is_empty());
        assert!(record.inventory.is_empty());
        assert!(record.info.is_empty());
    }

    #[test]
    fn test_decode_out_of_range_tier_ignored() {
        let record = decode("12,Imaginary Spell\n");
        assert!(record.spells.is_empty());
    }

    #[test]
    fn test_decode_sorts_spells() {
        let record = decode("1,magic missile\n1,Burning Hands\n1,Charm Person\n");
        assert_eq!(
            record.spells[&SpellTier::First],
            vec!["Burning Hands", "Charm Person", "magic missile"]
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character_data.csv");

        let record = sample_record();
        save(&path, &record).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.spells, record.spells);
        assert_eq!(loaded.info, record.info);
        // No stray temp file left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let record = load(dir.path().join("absent.csv")).unwrap();
        assert_eq!(record.experience.level, 1);
        assert!(record.spells.is_empty());
    }

    #[test]
    fn test_append_spell_resorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character_data.csv");
        save(&path, &sample_record()).unwrap();

        append_spell(&path, SpellTier::First, "Burning Hands").unwrap();
        append_spell(&path, SpellTier::Cantrip, "Acid Splash").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let spell_rows: Vec<_> = csv::parse_rows(&text)
            .into_iter()
            .filter(|row| row.first().map(|f| is_tier_field(f)).unwrap_or(false))
            .collect();
        // Canonical grouping after the resort pass: tier ascending, name
        // case-insensitive ascending.
        assert_eq!(
            spell_rows,
            vec![
                vec!["0".to_string(), "Acid Splash".to_string()],
                vec!["0".to_string(), "Fire Bolt".to_string()],
                vec!["1".to_string(), "Burning Hands".to_string()],
                vec!["3".to_string(), "Fireball".to_string()],
            ]
        );

        let loaded = load(&path).unwrap();
        assert!(loaded.knows_spell(SpellTier::Cantrip, "Acid Splash"));
        assert!(loaded.knows_spell(SpellTier::First, "Burning Hands"));
    }

    #[test]
    fn test_delete_spell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character_data.csv");
        save(&path, &sample_record()).unwrap();

        delete_spell(&path, SpellTier::Third, "Fireball").unwrap();
        let loaded = load(&path).unwrap();
        assert!(!loaded.knows_spell(SpellTier::Third, "Fireball"));
        assert!(loaded.knows_spell(SpellTier::Cantrip, "Fire Bolt"));
    }

    #[test]
    fn test_delete_spell_not_found_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character_data.csv");
        save(&path, &sample_record()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // Wrong tier for a known spell is still not-found.
        let err = delete_spell(&path, SpellTier::First, "Fireball").unwrap_err();
        assert!(matches!(err, StoreError::SpellNotFound { .. }));
        let err = delete_spell(&path, SpellTier::Third, "Fly").unwrap_err();
        assert!(matches!(err, StoreError::SpellNotFound { .. }));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_info_with_commas_round_trips() {
        let mut record = CharacterRecord::default();
        record.info.insert(
            "Weapon Proficiencies".into(),
            "Daggers, slings, quarterstaffs, light crossbows".into(),
        );
        let loaded = decode(&encode(&record));
        assert_eq!(
            loaded.info["Weapon Proficiencies"],
            "Daggers, slings, quarterstaffs, light crossbows"
        );
    }
}
