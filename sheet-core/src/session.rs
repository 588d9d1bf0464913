//! SheetSession - the primary public API for sheet mutations.
//!
//! The session owns the one character record, its store path, and the
//! loaded reference catalogs. All mutations flow through it on a single
//! logical thread, and each one is announced to registered observers as a
//! typed [`Update`], so display logic subscribes explicitly instead of
//! reading ambient mutable state. Failures are surfaced to the caller of
//! the triggering operation and never abort the session.

use crate::catalog::{Bestiary, CatalogError, ItemCatalog, SpellCatalog, SpellCatalogEntry};
use crate::character::{Ability, CharacterRecord, SheetError, SpellTier};
use crate::compendium::Compendium;
use crate::pool::ResourcePool;
use crate::store::{self, StoreError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// The resources a pool tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    HitPoints,
    TempHitPoints,
    SpellPoints,
    SorceryPoints,
    ArmorClass,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::HitPoints => "HP",
            Resource::TempHitPoints => "Temp HP",
            Resource::SpellPoints => "Spell Points",
            Resource::SorceryPoints => "Sorcery Points",
            Resource::ArmorClass => "AC",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A change announcement delivered to observers after the mutation has
/// been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    AbilityChanged {
        ability: Ability,
        value: u8,
        modifier: i8,
    },
    ExperienceGained {
        amount: u32,
        current: u32,
    },
    LeveledUp {
        level: u8,
    },
    PoolChanged {
        resource: Resource,
        current: i32,
        maximum: i32,
    },
    ArmorClassChanged {
        value: i32,
    },
    SpellLearned {
        tier: SpellTier,
        name: String,
    },
    SpellForgotten {
        tier: SpellTier,
        name: String,
    },
    SpellCast {
        tier: SpellTier,
        remaining: i32,
    },
    ItemAdded {
        name: String,
        quantity: u32,
    },
    ItemRemoved {
        name: String,
    },
    ItemEquipped {
        name: String,
    },
    ItemUnequipped {
        name: String,
    },
    InfoEdited {
        field: String,
    },
    SpeedChanged {
        value: i32,
    },
    ActionsChanged {
        value: i32,
    },
    Loaded,
    Saved,
}

type Observer = Box<dyn FnMut(&Update)>;

/// The controller that owns the record and its persistence.
pub struct SheetSession {
    record: CharacterRecord,
    store_path: PathBuf,
    items: ItemCatalog,
    spells: SpellCatalog,
    bestiary: Bestiary,
    compendium: Compendium,
    observers: Vec<Observer>,
}

impl SheetSession {
    /// Open a session over the given store file, loading the record from
    /// it (or starting from defaults when it doesn't exist yet).
    pub fn open(store_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store_path = store_path.as_ref().to_path_buf();
        let record = store::load(&store_path)?;
        Ok(Self {
            record,
            store_path,
            items: ItemCatalog::default(),
            spells: SpellCatalog::default(),
            bestiary: Bestiary::default(),
            compendium: Compendium::default(),
            observers: Vec::new(),
        })
    }

    pub fn with_item_catalog(mut self, items: ItemCatalog) -> Self {
        self.items = items;
        self
    }

    pub fn with_spell_catalog(mut self, spells: SpellCatalog) -> Self {
        self.spells = spells;
        self
    }

    pub fn with_bestiary(mut self, bestiary: Bestiary) -> Self {
        self.bestiary = bestiary;
        self
    }

    pub fn with_compendium(mut self, compendium: Compendium) -> Self {
        self.compendium = compendium;
        self
    }

    pub fn record(&self) -> &CharacterRecord {
        &self.record
    }

    pub fn item_catalog(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn spell_catalog(&self) -> &SpellCatalog {
        &self.spells
    }

    pub fn bestiary(&self) -> &Bestiary {
        &self.bestiary
    }

    pub fn compendium(&self) -> &Compendium {
        &self.compendium
    }

    /// Register a change observer. Updates are delivered synchronously,
    /// in registration order, after each mutation.
    pub fn observe(&mut self, observer: impl FnMut(&Update) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, update: Update) {
        tracing::debug!(?update, "sheet update");
        for observer in &mut self.observers {
            observer(&update);
        }
    }

    // ------------------------------------------------------------------
    // Abilities and experience
    // ------------------------------------------------------------------

    pub fn set_ability(&mut self, ability: Ability, value: u8) {
        self.record.abilities.set(ability, value);
        self.emit(Update::AbilityChanged {
            ability,
            value,
            modifier: self.record.abilities.modifier(ability),
        });
    }

    /// Award experience. A large award can trigger several level-ups; one
    /// [`Update::LeveledUp`] reports the final level.
    pub fn award_experience(&mut self, amount: u32) {
        let gained = self.record.award_experience(amount);
        self.emit(Update::ExperienceGained {
            amount,
            current: self.record.experience.current,
        });
        if gained > 0 {
            let level = self.record.experience.level;
            tracing::info!(level, "leveled up");
            self.emit(Update::LeveledUp { level });
        }
    }

    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    fn pool_mut(&mut self, resource: Resource) -> &mut ResourcePool {
        match resource {
            Resource::HitPoints => &mut self.record.hit_points,
            Resource::TempHitPoints => &mut self.record.temp_hit_points,
            Resource::SpellPoints => &mut self.record.spell_points,
            Resource::SorceryPoints => &mut self.record.sorcery_points,
            Resource::ArmorClass => &mut self.record.armor_class,
        }
    }

    pub fn pool(&self, resource: Resource) -> ResourcePool {
        match resource {
            Resource::HitPoints => self.record.hit_points,
            Resource::TempHitPoints => self.record.temp_hit_points,
            Resource::SpellPoints => self.record.spell_points,
            Resource::SorceryPoints => self.record.sorcery_points,
            Resource::ArmorClass => self.record.armor_class,
        }
    }

    fn emit_pool(&mut self, resource: Resource) {
        let pool = self.pool(resource);
        self.emit(Update::PoolChanged {
            resource,
            current: pool.current,
            maximum: pool.maximum,
        });
    }

    pub fn gain(&mut self, resource: Resource, amount: i32) {
        self.pool_mut(resource).gain(amount);
        self.emit_pool(resource);
    }

    pub fn spend(&mut self, resource: Resource, amount: i32) {
        self.pool_mut(resource).spend(amount);
        self.emit_pool(resource);
    }

    /// The unclamped override path.
    pub fn set_current(&mut self, resource: Resource, value: i32) {
        self.pool_mut(resource).set(value);
        self.emit_pool(resource);
    }

    pub fn set_maximum(&mut self, resource: Resource, value: i32) {
        self.pool_mut(resource).set_maximum(value);
        self.emit_pool(resource);
    }

    /// Restore a pool to its maximum (the "reset points" action).
    pub fn refill(&mut self, resource: Resource) {
        self.pool_mut(resource).refill();
        self.emit_pool(resource);
    }

    pub fn set_speed(&mut self, value: i32) {
        self.record.speed = value;
        self.emit(Update::SpeedChanged { value });
    }

    pub fn set_actions(&mut self, value: i32) {
        self.record.actions = value;
        self.emit(Update::ActionsChanged { value });
    }

    // ------------------------------------------------------------------
    // Spells
    // ------------------------------------------------------------------

    /// Learn a spell and write it through to the store: a single appended
    /// row plus the resort pass, not a full rewrite.
    pub fn learn_spell(&mut self, tier: SpellTier, name: &str) -> Result<(), SessionError> {
        let newly_learned = self.record.learn_spell(tier, name)?;
        if !newly_learned {
            return Ok(());
        }
        let name = name.trim().to_string();
        store::append_spell(&self.store_path, tier, &name)?;
        self.emit(Update::SpellLearned { tier, name });
        Ok(())
    }

    /// Forget a spell. Absence at that tier is an error and nothing
    /// changes, in memory or on disk.
    pub fn forget_spell(&mut self, tier: SpellTier, name: &str) -> Result<(), SessionError> {
        self.record.forget_spell(tier, name)?;
        // The record mutation is the source of truth; rewrite the store's
        // canonical form rather than patching the one row.
        store::save(&self.store_path, &self.record)?;
        self.emit(Update::SpellForgotten {
            tier,
            name: name.trim().to_string(),
        });
        Ok(())
    }

    /// Cast at the given tier, spending spell points.
    pub fn cast_spell(&mut self, tier: SpellTier) -> Result<(), SessionError> {
        let remaining = self.record.cast_spell(tier)?;
        self.emit(Update::SpellCast { tier, remaining });
        self.emit_pool(Resource::SpellPoints);
        Ok(())
    }

    /// Catalog lookup for display; the entry's text carries the damage
    /// annotation, when one exists.
    pub fn lookup_spell(&self, name: &str) -> Result<&SpellCatalogEntry, CatalogError> {
        self.spells.find(name)
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    /// Add items to the ledger. Asking to equip something the item table
    /// does not list as armor or a weapon is rejected before anything
    /// mutates. Known items take their description from the table; the
    /// caller's description only applies to custom items.
    pub fn add_item(
        &mut self,
        name: &str,
        quantity: u32,
        equip: bool,
        description: Option<String>,
    ) -> Result<(), SessionError> {
        let catalog_entry = self.items.find(name).ok();
        if equip && !catalog_entry.map(|e| e.is_equippable()).unwrap_or(false) {
            return Err(SheetError::MalformedInput(format!(
                "'{}' cannot be equipped",
                name.trim()
            ))
            .into());
        }
        let description = match catalog_entry {
            Some(entry) if !entry.description.is_empty() => Some(entry.description.clone()),
            Some(_) => None,
            None => description,
        };

        self.record.add_item(name, quantity, false, description)?;
        self.emit(Update::ItemAdded {
            name: name.trim().to_string(),
            quantity,
        });
        if equip {
            self.equip_item(name)?;
        }
        Ok(())
    }

    /// Remove items. An equipped stack is refused until explicitly
    /// unequipped; the flag never flips as a side effect of deletion.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<(), SessionError> {
        self.record.remove_item(name, quantity)?;
        self.emit(Update::ItemRemoved {
            name: name.trim().to_string(),
        });
        Ok(())
    }

    /// Equip an inventory entry. Equipping armor is the only path that
    /// recomputes AC.
    pub fn equip_item(&mut self, name: &str) -> Result<(), SessionError> {
        let entry = self.items.find(name)?;
        if !entry.is_equippable() {
            return Err(SheetError::MalformedInput(format!(
                "'{}' cannot be equipped",
                name.trim()
            ))
            .into());
        }
        let armor = entry.armor_class();

        self.record.equip(name)?;
        self.emit(Update::ItemEquipped {
            name: name.trim().to_string(),
        });
        if let Some(bonus) = armor {
            let value = self.record.recompute_armor_class(Some(&bonus));
            self.emit(Update::ArmorClassChanged { value });
        }
        Ok(())
    }

    /// The explicit unequip path. Taking armor off restores the AC
    /// baseline. Works even when the item table is unavailable; the AC
    /// recomputation is simply skipped for unknown items.
    pub fn unequip_item(&mut self, name: &str) -> Result<(), SessionError> {
        let was_armor = self
            .items
            .find(name)
            .map(|e| e.is_armor())
            .unwrap_or(false);

        self.record.unequip(name)?;
        self.emit(Update::ItemUnequipped {
            name: name.trim().to_string(),
        });
        if was_armor {
            let value = self.record.recompute_armor_class(None);
            self.emit(Update::ArmorClassChanged { value });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Info fields and persistence
    // ------------------------------------------------------------------

    pub fn set_info(&mut self, field: &str, value: &str) {
        self.record
            .info
            .insert(field.trim().to_string(), value.to_string());
        self.emit(Update::InfoEdited {
            field: field.trim().to_string(),
        });
    }

    /// Write the full canonical form atomically.
    pub fn save(&mut self) -> Result<(), SessionError> {
        store::save(&self.store_path, &self.record)?;
        self.emit(Update::Saved);
        Ok(())
    }

    /// Replace the record with whatever the store holds.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.record = store::load(&self.store_path)?;
        self.emit(Update::Loaded);
        Ok(())
    }
}
