//! Read-only reference catalogs: class spell tables, the item table, the
//! bestiary, and the fixed metamagic list.
//!
//! Catalogs are external flat files the player drops next to the store. A
//! missing file degrades to an empty catalog (the feature is unavailable,
//! lookups report not-found); it never crashes the session. Rows that
//! don't parse are skipped with a warning.

use crate::character::SpellTier;
use crate::csv::Table;
use crate::dice::{self, DamageExpression};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors from catalog loading and lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

// ============================================================================
// Spell Catalog
// ============================================================================

/// One spell as the reference tables describe it.
#[derive(Debug, Clone)]
pub struct SpellCatalogEntry {
    pub name: String,
    pub tier: SpellTier,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub duration: String,
    pub components: String,
    pub classes: String,
    pub optional_classes: String,
    pub text: String,
    pub at_higher_levels: String,
    pub source: String,
}

impl SpellCatalogEntry {
    /// Damage annotation pulled from the descriptive text, when present.
    pub fn damage(&self) -> Option<DamageExpression> {
        dice::extract_damage(&self.text)
    }
}

/// All spells from every per-class table found.
#[derive(Debug, Clone, Default)]
pub struct SpellCatalog {
    entries: Vec<SpellCatalogEntry>,
}

impl SpellCatalog {
    /// Load every `*_Spells.csv` in the directory. A missing directory is
    /// an empty catalog.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<SpellCatalog, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = SpellCatalog::default();
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "spell table directory missing");
            return Ok(catalog);
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_spell_table = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with("_Spells.csv"))
                .unwrap_or(false);
            if !is_spell_table {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => catalog.absorb(&text),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable spell table");
                }
            }
        }
        Ok(catalog)
    }

    /// Parse one table's contents into the catalog.
    pub fn absorb(&mut self, text: &str) {
        let table = Table::parse(text);
        for record in table.records() {
            let name = record.get_or_empty("Name").trim().to_string();
            if name.is_empty() {
                continue;
            }
            let tier = match record.get_or_empty("Level").parse::<SpellTier>() {
                Ok(tier) => tier,
                Err(_) => {
                    tracing::warn!(spell = %name, "skipping row with unparseable level");
                    continue;
                }
            };
            self.entries.push(SpellCatalogEntry {
                name,
                tier,
                school: record.get_or_empty("School").to_string(),
                casting_time: record.get_or_empty("Casting Time").to_string(),
                range: record.get_or_empty("Range").to_string(),
                duration: record.get_or_empty("Duration").to_string(),
                components: record.get_or_empty("Components").to_string(),
                classes: record.get_or_empty("Classes").to_string(),
                optional_classes: record
                    .get_or_empty("Optional/Variant Classes")
                    .to_string(),
                text: record.get_or_empty("Text").to_string(),
                at_higher_levels: record.get_or_empty("At Higher Levels").to_string(),
                source: record.get_or_empty("Source").to_string(),
            });
        }
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Result<&SpellCatalogEntry, CatalogError> {
        let wanted = name.trim();
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "spell",
                name: wanted.to_string(),
            })
    }

    pub fn spells_at(&self, tier: SpellTier) -> impl Iterator<Item = &SpellCatalogEntry> {
        self.entries.iter().filter(move |e| e.tier == tier)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// Item Catalog
// ============================================================================

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+").expect("valid regex");
    static ref ADDS_DEX: Regex = Regex::new(r"(?i)\+\s*Dex").expect("valid regex");
}

/// AC contribution of a piece of armor, parsed from its table annotation
/// (`"12 + Dex"`, `"16"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmorBonus {
    pub base_ac: i32,
    pub adds_dex: bool,
}

/// One row of the item table.
#[derive(Debug, Clone)]
pub struct ItemCatalogEntry {
    pub name: String,
    pub rarity: String,
    pub item_type: String,
    pub value: String,
    pub weight: String,
    /// Damage dice for weapons; the AC annotation for armor.
    pub damage: String,
    pub description: String,
}

impl ItemCatalogEntry {
    pub fn is_armor(&self) -> bool {
        self.item_type.to_lowercase().contains("armor")
    }

    /// Armor and weapons are the only equippable item types.
    pub fn is_equippable(&self) -> bool {
        let kind = self.item_type.to_lowercase();
        kind.contains("armor") || kind.contains("weapon")
    }

    /// The AC annotation, for armor rows that carry one.
    pub fn armor_class(&self) -> Option<ArmorBonus> {
        if !self.is_armor() {
            return None;
        }
        let base_ac = FIRST_NUMBER.find(&self.damage)?.as_str().parse().ok()?;
        Some(ArmorBonus {
            base_ac,
            adds_dex: ADDS_DEX.is_match(&self.damage),
        })
    }
}

/// The item reference table.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    entries: Vec<ItemCatalogEntry>,
}

impl ItemCatalog {
    /// Load the table, degrading to empty when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<ItemCatalog, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "item table missing");
            return Ok(ItemCatalog::default());
        }
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn parse(text: &str) -> ItemCatalog {
        let table = Table::parse(text);
        let mut entries = Vec::new();
        for record in table.records() {
            let name = record.get_or_empty("Name").trim().to_string();
            if name.is_empty() {
                continue;
            }
            entries.push(ItemCatalogEntry {
                name,
                rarity: record.get_or_empty("Rarity").to_string(),
                item_type: record.get_or_empty("Type").to_string(),
                value: record.get_or_empty("Value").to_string(),
                weight: record.get_or_empty("Weight").to_string(),
                damage: record.get_or_empty("Damage").to_string(),
                description: record.get_or_empty("Description").to_string(),
            });
        }
        ItemCatalog { entries }
    }

    pub fn find(&self, name: &str) -> Result<&ItemCatalogEntry, CatalogError> {
        let wanted = name.trim();
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "item",
                name: wanted.to_string(),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = &ItemCatalogEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Bestiary
// ============================================================================

/// One creature row. The headline columns are broken out; everything else
/// the table carries rides along in `extras` for detail views.
#[derive(Debug, Clone)]
pub struct BestiaryEntry {
    pub name: String,
    pub creature_type: String,
    pub challenge_rating: String,
    pub armor_class: String,
    pub hit_points: String,
    pub extras: BTreeMap<String, String>,
}

/// The monster reference table.
#[derive(Debug, Clone, Default)]
pub struct Bestiary {
    entries: Vec<BestiaryEntry>,
}

impl Bestiary {
    pub fn load(path: impl AsRef<Path>) -> Result<Bestiary, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "bestiary missing");
            return Ok(Bestiary::default());
        }
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn parse(text: &str) -> Bestiary {
        let table = Table::parse(text);
        let mut entries = Vec::new();
        for record in table.records() {
            let name = record.get_or_empty("Name").trim().to_string();
            if name.is_empty() {
                continue;
            }
            let extras = record
                .pairs()
                .filter(|(h, _)| !matches!(*h, "Name" | "Type" | "CR" | "AC" | "HP"))
                .map(|(h, f)| (h.to_string(), f.to_string()))
                .collect();
            entries.push(BestiaryEntry {
                name,
                creature_type: record.get_or_empty("Type").to_string(),
                challenge_rating: record.get_or_empty("CR").to_string(),
                armor_class: record.get_or_empty("AC").to_string(),
                hit_points: record.get_or_empty("HP").to_string(),
                extras,
            });
        }
        Bestiary { entries }
    }

    pub fn find(&self, name: &str) -> Result<&BestiaryEntry, CatalogError> {
        let wanted = name.trim();
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "monster",
                name: wanted.to_string(),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = &BestiaryEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Metamagic
// ============================================================================

/// A metamagic option with its short and full descriptions.
#[derive(Debug, Clone, Copy)]
pub struct MetamagicOption {
    pub name: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
}

lazy_static! {
    /// The fixed metamagic list.
    pub static ref METAMAGIC: Vec<MetamagicOption> = vec![
        MetamagicOption {
            name: "Careful Spell",
            summary: "Protect allies from your area spells.",
            description: "Protect chosen creatures from effects of your area spells, making them auto-succeed on saves and avoid half damage.",
        },
        MetamagicOption {
            name: "Distant Spell",
            summary: "Double spell range or extend touch.",
            description: "Spend 1 point to double range or cast touch spells from 30 feet.",
        },
        MetamagicOption {
            name: "Empowered Spell",
            summary: "Reroll damage dice.",
            description: "Spend 1 point to reroll a number of damage dice equal to your Charisma modifier.",
        },
        MetamagicOption {
            name: "Extended Spell",
            summary: "Double duration.",
            description: "Spend 1 point to double spell duration up to 24 hours.",
        },
        MetamagicOption {
            name: "Heightened Spell",
            summary: "Disadvantage on save.",
            description: "Spend 3 points to give a creature disadvantage on its first saving throw against your spell.",
        },
        MetamagicOption {
            name: "Quickened Spell",
            summary: "Cast as bonus action.",
            description: "Spend 2 points to change a spell's casting time from 1 action to 1 bonus action.",
        },
        MetamagicOption {
            name: "Seeking Spell",
            summary: "Reroll missed spell attack.",
            description: "Spend 2 points to reroll a missed spell attack roll.",
        },
        MetamagicOption {
            name: "Subtle Spell",
            summary: "No components.",
            description: "Spend 1 point to cast a spell without verbal or somatic components.",
        },
        MetamagicOption {
            name: "Transmuted Spell",
            summary: "Change damage type.",
            description: "Spend 1 point to change a spell's elemental damage type (acid, fire, etc.).",
        },
        MetamagicOption {
            name: "Twinned Spell",
            summary: "Target a second creature.",
            description: "Spend Sorcery Points equal to the spell's level to target a second creature.",
        },
    ];
}

/// Look up a metamagic option by name.
pub fn metamagic(name: &str) -> Result<&'static MetamagicOption, CatalogError> {
    let wanted = name.trim();
    METAMAGIC
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| CatalogError::NotFound {
            kind: "metamagic",
            name: wanted.to_string(),
        })
}
