//! The mutable character record: ability scores, resource pools, known
//! spells, inventory, and narrative info fields.
//!
//! One record exists per store file. It is built with defaults at startup,
//! mutated through a session, fully overwritten on load, and fully
//! serialized on save. There is no partial persistence.

use crate::catalog::ArmorBonus;
use crate::pool::ResourcePool;
use crate::progression::ExperienceState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Flat proficiency bonus applied to proficient checks and saves.
pub const PROFICIENCY_BONUS: i32 = 2;

/// Errors from record mutations. Each one is surfaced to the action that
/// triggered it; none aborts the session.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("spell '{name}' not found at tier {tier}")]
    SpellNotFound { tier: SpellTier, name: String },

    #[error("item '{0}' not found in inventory")]
    ItemNotFound(String),

    #[error("item '{0}' is equipped; unequip it before removing")]
    ItemEquipped(String),

    #[error("invalid input: {0}")]
    MalformedInput(String),

    #[error("not enough spell points: need {needed}, have {available}")]
    InsufficientPoints { needed: i32, available: i32 },
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Case-insensitive lookup by full name, for store rows and info
    /// fields.
    pub fn from_name(name: &str) -> Option<Ability> {
        let name = name.trim();
        Ability::all()
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ability scores container. Modifiers are always derived, never stored,
/// so they cannot drift from the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    /// `floor((score - 10) / 2)`. Floor division keeps odd low scores
    /// correct: 8-9 is -1, 10-11 is 0, 12-13 is +1.
    pub fn modifier(&self, ability: Ability) -> i8 {
        (self.get(ability) as i8 - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

// ============================================================================
// Skills
// ============================================================================

/// The skills, each governed by one ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }

    pub fn all() -> [Skill; 18] {
        [
            Skill::Athletics,
            Skill::Acrobatics,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Arcana,
            Skill::History,
            Skill::Investigation,
            Skill::Nature,
            Skill::Religion,
            Skill::AnimalHandling,
            Skill::Insight,
            Skill::Medicine,
            Skill::Perception,
            Skill::Survival,
            Skill::Deception,
            Skill::Intimidation,
            Skill::Performance,
            Skill::Persuasion,
        ]
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Spell Tiers
// ============================================================================

/// Spell level, Cantrip (0) through 9th.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SpellTier {
    Cantrip,
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
}

impl SpellTier {
    pub fn all() -> [SpellTier; 10] {
        [
            SpellTier::Cantrip,
            SpellTier::First,
            SpellTier::Second,
            SpellTier::Third,
            SpellTier::Fourth,
            SpellTier::Fifth,
            SpellTier::Sixth,
            SpellTier::Seventh,
            SpellTier::Eighth,
            SpellTier::Ninth,
        ]
    }

    /// Numeric tier: 0 for Cantrip, 1-9 otherwise. This is what the store
    /// writes as the row's first field.
    pub fn as_index(&self) -> u8 {
        *self as u8
    }

    pub fn from_index(index: u8) -> Option<SpellTier> {
        SpellTier::all().get(index as usize).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpellTier::Cantrip => "Cantrip",
            SpellTier::First => "1st",
            SpellTier::Second => "2nd",
            SpellTier::Third => "3rd",
            SpellTier::Fourth => "4th",
            SpellTier::Fifth => "5th",
            SpellTier::Sixth => "6th",
            SpellTier::Seventh => "7th",
            SpellTier::Eighth => "8th",
            SpellTier::Ninth => "9th",
        }
    }

    /// Spell points to cast at this tier.
    pub fn point_cost(&self) -> i32 {
        match self {
            SpellTier::Cantrip => 0,
            SpellTier::First => 2,
            SpellTier::Second => 3,
            SpellTier::Third => 5,
            SpellTier::Fourth => 6,
            SpellTier::Fifth => 7,
            SpellTier::Sixth => 9,
            SpellTier::Seventh => 10,
            SpellTier::Eighth => 11,
            SpellTier::Ninth => 13,
        }
    }
}

impl fmt::Display for SpellTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SpellTier {
    type Err = SheetError;

    /// Accepts `"Cantrip"`, bare digits (`"0"`, `"3"`), and ordinals
    /// (`"1st"`, `"2nd"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("cantrip") {
            return Ok(SpellTier::Cantrip);
        }
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits
            .parse::<u8>()
            .ok()
            .and_then(SpellTier::from_index)
            .ok_or_else(|| SheetError::MalformedInput(format!("not a spell tier: '{s}'")))
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// One inventory stack, keyed in the record by its unique item name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub quantity: u32,
    pub equipped: bool,
    /// Free text for custom items that no catalog describes. Not
    /// persisted by the store format.
    pub description: Option<String>,
}

// ============================================================================
// Character Record
// ============================================================================

/// Everything the sheet tracks for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub abilities: AbilityScores,
    pub experience: ExperienceState,
    pub hit_points: ResourcePool,
    pub temp_hit_points: ResourcePool,
    pub spell_points: ResourcePool,
    pub sorcery_points: ResourcePool,
    /// Current = effective AC, maximum = the unarmored baseline that
    /// unequipping restores.
    pub armor_class: ResourcePool,
    pub speed: i32,
    pub actions: i32,
    /// Known spells per tier, kept sorted case-insensitively by name.
    pub spells: BTreeMap<SpellTier, Vec<String>>,
    /// Item name to stack.
    pub inventory: BTreeMap<String, InventoryEntry>,
    /// Narrative fields: race, class, proficiencies, languages, and
    /// whatever else the player writes down.
    pub info: BTreeMap<String, String>,
}

impl Default for CharacterRecord {
    fn default() -> Self {
        Self {
            abilities: AbilityScores::default(),
            experience: ExperienceState::new(),
            hit_points: ResourcePool::new(32),
            temp_hit_points: ResourcePool::new(0),
            spell_points: ResourcePool::new(6),
            sorcery_points: ResourcePool::new(6),
            armor_class: ResourcePool::new(12),
            speed: 30,
            actions: 2,
            spells: BTreeMap::new(),
            inventory: BTreeMap::new(),
            info: BTreeMap::new(),
        }
    }
}

impl CharacterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Experience
    // ------------------------------------------------------------------

    /// Award experience, resolving any level-ups. Returns levels gained.
    pub fn award_experience(&mut self, amount: u32) -> u8 {
        self.experience.award(amount)
    }

    // ------------------------------------------------------------------
    // Spells
    // ------------------------------------------------------------------

    /// Add a spell to the given tier. Returns `false` when the exact name
    /// was already known there. The tier's list stays sorted.
    pub fn learn_spell(&mut self, tier: SpellTier, name: &str) -> Result<bool, SheetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SheetError::MalformedInput("empty spell name".into()));
        }
        let list = self.spells.entry(tier).or_default();
        if list.iter().any(|s| s == name) {
            return Ok(false);
        }
        list.push(name.to_string());
        list.sort_by_key(|s| s.to_lowercase());
        Ok(true)
    }

    /// Remove a spell from the given tier. A name absent from that tier is
    /// [`SheetError::SpellNotFound`] and the record is unchanged.
    pub fn forget_spell(&mut self, tier: SpellTier, name: &str) -> Result<(), SheetError> {
        let name = name.trim();
        let not_found = || SheetError::SpellNotFound {
            tier,
            name: name.to_string(),
        };
        let list = self.spells.get_mut(&tier).ok_or_else(not_found)?;
        let idx = list.iter().position(|s| s == name).ok_or_else(not_found)?;
        list.remove(idx);
        if list.is_empty() {
            self.spells.remove(&tier);
        }
        Ok(())
    }

    pub fn knows_spell(&self, tier: SpellTier, name: &str) -> bool {
        self.spells
            .get(&tier)
            .map(|list| list.iter().any(|s| s == name))
            .unwrap_or(false)
    }

    /// Spend the spell points a cast at this tier costs. Fails without
    /// mutating anything when the pool cannot cover it.
    pub fn cast_spell(&mut self, tier: SpellTier) -> Result<i32, SheetError> {
        let cost = tier.point_cost();
        if self.spell_points.current < cost {
            return Err(SheetError::InsufficientPoints {
                needed: cost,
                available: self.spell_points.current,
            });
        }
        self.spell_points.spend(cost);
        Ok(self.spell_points.current)
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    /// Add items, merging into an existing stack. Merging adds quantities
    /// and keeps the stack equipped if either side was.
    pub fn add_item(
        &mut self,
        name: &str,
        quantity: u32,
        equipped: bool,
        description: Option<String>,
    ) -> Result<(), SheetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SheetError::MalformedInput("empty item name".into()));
        }
        if quantity == 0 {
            return Err(SheetError::MalformedInput(
                "quantity must be positive".into(),
            ));
        }
        match self.inventory.get_mut(name) {
            Some(entry) => {
                entry.quantity += quantity;
                entry.equipped = entry.equipped || equipped;
            }
            None => {
                self.inventory.insert(
                    name.to_string(),
                    InventoryEntry {
                        quantity,
                        equipped,
                        description,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove up to `quantity` from a stack, deleting the entry when it
    /// empties. An equipped entry is refused: the equipped flag only ever
    /// transitions through [`CharacterRecord::unequip`].
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<(), SheetError> {
        let name = name.trim();
        if quantity == 0 {
            return Err(SheetError::MalformedInput(
                "quantity must be positive".into(),
            ));
        }
        let entry = self
            .inventory
            .get_mut(name)
            .ok_or_else(|| SheetError::ItemNotFound(name.to_string()))?;
        if entry.equipped {
            return Err(SheetError::ItemEquipped(name.to_string()));
        }
        if entry.quantity > quantity {
            entry.quantity -= quantity;
        } else {
            self.inventory.remove(name);
        }
        Ok(())
    }

    /// Mark an entry equipped. AC recomputation happens at the session
    /// layer, which knows whether the item is armor.
    pub fn equip(&mut self, name: &str) -> Result<(), SheetError> {
        let entry = self
            .inventory
            .get_mut(name.trim())
            .ok_or_else(|| SheetError::ItemNotFound(name.trim().to_string()))?;
        entry.equipped = true;
        Ok(())
    }

    /// The explicit unequip path.
    pub fn unequip(&mut self, name: &str) -> Result<(), SheetError> {
        let entry = self
            .inventory
            .get_mut(name.trim())
            .ok_or_else(|| SheetError::ItemNotFound(name.trim().to_string()))?;
        entry.equipped = false;
        Ok(())
    }

    /// Recompute effective AC from equipped armor, or fall back to the
    /// baseline when nothing is worn. Returns the new value.
    pub fn recompute_armor_class(&mut self, armor: Option<&ArmorBonus>) -> i32 {
        let value = match armor {
            Some(bonus) => {
                let dex = if bonus.adds_dex {
                    self.abilities.modifier(Ability::Dexterity) as i32
                } else {
                    0
                };
                bonus.base_ac + dex
            }
            None => self.armor_class.maximum,
        };
        self.armor_class.set(value);
        value
    }

    // ------------------------------------------------------------------
    // Proficiencies and spellcasting
    // ------------------------------------------------------------------

    fn info_name_set(&self, field: &str) -> HashSet<String> {
        self.info
            .get(field)
            .map(|value| {
                value
                    .split(',')
                    .map(|part| part.trim().to_lowercase())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_proficient_skill(&self, skill: Skill) -> bool {
        self.info_name_set("Skills")
            .contains(&skill.name().to_lowercase())
    }

    pub fn is_proficient_save(&self, ability: Ability) -> bool {
        self.info_name_set("Saving Throws")
            .contains(&ability.name().to_lowercase())
    }

    /// Ability modifier plus proficiency when the skill is listed in the
    /// record's `Skills` info field.
    pub fn skill_check_bonus(&self, skill: Skill) -> i32 {
        let base = self.abilities.modifier(skill.ability()) as i32;
        if self.is_proficient_skill(skill) {
            base + PROFICIENCY_BONUS
        } else {
            base
        }
    }

    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        let base = self.abilities.modifier(ability) as i32;
        if self.is_proficient_save(ability) {
            base + PROFICIENCY_BONUS
        } else {
            base
        }
    }

    /// The ability named by the `Spellcasting Ability` info field.
    pub fn spellcasting_ability(&self) -> Option<Ability> {
        self.info
            .get("Spellcasting Ability")
            .and_then(|name| Ability::from_name(name))
    }

    /// `8 + proficiency + spellcasting modifier`, when a spellcasting
    /// ability is recorded.
    pub fn spell_save_dc(&self) -> Option<i32> {
        let ability = self.spellcasting_ability()?;
        Some(8 + PROFICIENCY_BONUS + self.abilities.modifier(ability) as i32)
    }

    /// `proficiency + spellcasting modifier`.
    pub fn spell_attack_bonus(&self) -> Option<i32> {
        let ability = self.spellcasting_ability()?;
        Some(PROFICIENCY_BONUS + self.abilities.modifier(ability) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        let mut scores = AbilityScores::default();
        assert_eq!(scores.modifier(Ability::Strength), 0);
        scores.set(Ability::Strength, 15);
        assert_eq!(scores.modifier(Ability::Strength), 2);
        scores.set(Ability::Strength, 8);
        assert_eq!(scores.modifier(Ability::Strength), -1);
        scores.set(Ability::Strength, 7);
        assert_eq!(scores.modifier(Ability::Strength), -2);
        scores.set(Ability::Strength, 30);
        assert_eq!(scores.modifier(Ability::Strength), 10);
    }

    #[test]
    fn test_ability_from_name() {
        assert_eq!(Ability::from_name("charisma"), Some(Ability::Charisma));
        assert_eq!(Ability::from_name(" Wisdom "), Some(Ability::Wisdom));
        assert_eq!(Ability::from_name("Luck"), None);
    }

    #[test]
    fn test_spell_tier_parsing() {
        assert_eq!("Cantrip".parse::<SpellTier>().unwrap(), SpellTier::Cantrip);
        assert_eq!("0".parse::<SpellTier>().unwrap(), SpellTier::Cantrip);
        assert_eq!("1st".parse::<SpellTier>().unwrap(), SpellTier::First);
        assert_eq!("3".parse::<SpellTier>().unwrap(), SpellTier::Third);
        assert_eq!("9th".parse::<SpellTier>().unwrap(), SpellTier::Ninth);
        assert!("10th".parse::<SpellTier>().is_err());
        assert!("sword".parse::<SpellTier>().is_err());
    }

    #[test]
    fn test_spell_tier_costs() {
        assert_eq!(SpellTier::Cantrip.point_cost(), 0);
        assert_eq!(SpellTier::First.point_cost(), 2);
        assert_eq!(SpellTier::Fifth.point_cost(), 7);
        assert_eq!(SpellTier::Ninth.point_cost(), 13);
    }

    #[test]
    fn test_learn_spell_sorts_case_insensitively() {
        let mut record = CharacterRecord::new();
        record.learn_spell(SpellTier::First, "Magic Missile").unwrap();
        record.learn_spell(SpellTier::First, "burning hands").unwrap();
        record.learn_spell(SpellTier::First, "Charm Person").unwrap();
        assert_eq!(
            record.spells[&SpellTier::First],
            vec!["burning hands", "Charm Person", "Magic Missile"]
        );
    }

    #[test]
    fn test_learn_spell_rejects_empty_and_dedups() {
        let mut record = CharacterRecord::new();
        assert!(matches!(
            record.learn_spell(SpellTier::Cantrip, "  "),
            Err(SheetError::MalformedInput(_))
        ));
        assert!(record.learn_spell(SpellTier::Cantrip, "Fire Bolt").unwrap());
        assert!(!record.learn_spell(SpellTier::Cantrip, "Fire Bolt").unwrap());
        assert_eq!(record.spells[&SpellTier::Cantrip].len(), 1);
    }

    #[test]
    fn test_forget_spell_not_found() {
        let mut record = CharacterRecord::new();
        record.learn_spell(SpellTier::Third, "Fireball").unwrap();
        let err = record.forget_spell(SpellTier::Third, "Fly").unwrap_err();
        assert!(matches!(err, SheetError::SpellNotFound { .. }));
        // Known at a different tier still counts as absent here.
        let err = record.forget_spell(SpellTier::First, "Fireball").unwrap_err();
        assert!(matches!(err, SheetError::SpellNotFound { .. }));
        assert!(record.knows_spell(SpellTier::Third, "Fireball"));
    }

    #[test]
    fn test_cast_spell_deducts_points() {
        let mut record = CharacterRecord::new();
        record.spell_points = ResourcePool::new(6);
        assert_eq!(record.cast_spell(SpellTier::Second).unwrap(), 3);
        assert_eq!(record.cast_spell(SpellTier::First).unwrap(), 1);
        let err = record.cast_spell(SpellTier::First).unwrap_err();
        assert!(matches!(
            err,
            SheetError::InsufficientPoints {
                needed: 2,
                available: 1
            }
        ));
        // Failed casts leave the pool untouched.
        assert_eq!(record.spell_points.current, 1);
        // Cantrips are free even on an empty pool.
        record.spell_points.spend(1);
        assert_eq!(record.cast_spell(SpellTier::Cantrip).unwrap(), 0);
    }

    #[test]
    fn test_add_item_merges_stacks() {
        let mut record = CharacterRecord::new();
        record.add_item("Dagger", 1, false, None).unwrap();
        record.add_item("Dagger", 2, true, None).unwrap();
        let entry = &record.inventory["Dagger"];
        assert_eq!(entry.quantity, 3);
        assert!(entry.equipped);
    }

    #[test]
    fn test_add_item_rejects_bad_input() {
        let mut record = CharacterRecord::new();
        assert!(record.add_item("", 1, false, None).is_err());
        assert!(record.add_item("Rope", 0, false, None).is_err());
        assert!(record.inventory.is_empty());
    }

    #[test]
    fn test_remove_item_refuses_equipped() {
        let mut record = CharacterRecord::new();
        record.add_item("Leather Armor", 1, true, None).unwrap();
        let err = record.remove_item("Leather Armor", 1).unwrap_err();
        assert!(matches!(err, SheetError::ItemEquipped(_)));
        assert!(record.inventory.contains_key("Leather Armor"));
        // Only the explicit unequip path flips the flag.
        record.unequip("Leather Armor").unwrap();
        assert!(!record.inventory["Leather Armor"].equipped);
        record.remove_item("Leather Armor", 1).unwrap();
        assert!(!record.inventory.contains_key("Leather Armor"));
    }

    #[test]
    fn test_remove_item_partial_and_overflow() {
        let mut record = CharacterRecord::new();
        record.add_item("Torch", 5, false, None).unwrap();
        record.remove_item("Torch", 2).unwrap();
        assert_eq!(record.inventory["Torch"].quantity, 3);
        // Removing more than the stack deletes the entry.
        record.remove_item("Torch", 10).unwrap();
        assert!(!record.inventory.contains_key("Torch"));
        assert!(matches!(
            record.remove_item("Torch", 1),
            Err(SheetError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_skill_and_save_bonuses() {
        let mut record = CharacterRecord::new();
        record.abilities.set(Ability::Intelligence, 16);
        record.abilities.set(Ability::Charisma, 14);
        record
            .info
            .insert("Skills".into(), "Arcana, Insight, Persuasion".into());
        record
            .info
            .insert("Saving Throws".into(), "Constitution, Charisma".into());

        assert_eq!(record.skill_check_bonus(Skill::Arcana), 5);
        assert_eq!(record.skill_check_bonus(Skill::History), 3);
        assert_eq!(record.skill_check_bonus(Skill::Persuasion), 4);
        assert_eq!(record.saving_throw_bonus(Ability::Charisma), 4);
        assert_eq!(record.saving_throw_bonus(Ability::Strength), 0);
    }

    #[test]
    fn test_spellcasting_derivations() {
        let mut record = CharacterRecord::new();
        assert_eq!(record.spell_save_dc(), None);
        record
            .info
            .insert("Spellcasting Ability".into(), "Charisma".into());
        record.abilities.set(Ability::Charisma, 16);
        assert_eq!(record.spell_save_dc(), Some(13));
        assert_eq!(record.spell_attack_bonus(), Some(5));
    }

    #[test]
    fn test_recompute_armor_class() {
        let mut record = CharacterRecord::new();
        record.abilities.set(Ability::Dexterity, 16);
        record.armor_class = ResourcePool::new(12);

        let plate = ArmorBonus {
            base_ac: 18,
            adds_dex: false,
        };
        assert_eq!(record.recompute_armor_class(Some(&plate)), 18);

        let leather = ArmorBonus {
            base_ac: 11,
            adds_dex: true,
        };
        assert_eq!(record.recompute_armor_class(Some(&leather)), 14);

        // Nothing worn: back to the baseline.
        assert_eq!(record.recompute_armor_class(None), 12);
    }
}
