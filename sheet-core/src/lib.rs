//! Character sheet and resource tracker engine for D&D 5e.
//!
//! This crate provides:
//! - Ability scores with derived modifiers, skills, and saving throws
//! - Bounded resource pools (HP, spell points, sorcery points) with
//!   clamped mutations and an explicit override path
//! - Experience progression over the fixed 5e advancement table,
//!   including multi-level jumps from one large award
//! - Damage-notation extraction from spell descriptions
//! - Read-only reference catalogs (spells, items, bestiary, compendium)
//! - A row-oriented flat-file store with atomic saves
//! - A session controller that announces every mutation to observers
//!
//! The UI layer is out of scope; [`SheetSession`] is the surface a UI
//! binds to.
//!
//! # Quick Start
//!
//! ```ignore
//! use sheet_core::{Resource, SheetSession, SpellTier};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = SheetSession::open("character_data.csv")?;
//!     session.observe(|update| println!("{update:?}"));
//!
//!     session.award_experience(300);
//!     session.spend(Resource::HitPoints, 7);
//!     session.learn_spell(SpellTier::Third, "Fireball")?;
//!
//!     session.save()?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod character;
pub mod compendium;
pub mod csv;
pub mod dice;
pub mod pool;
pub mod progression;
pub mod session;
pub mod store;

// Primary public API
pub use catalog::{
    metamagic, ArmorBonus, Bestiary, BestiaryEntry, CatalogError, ItemCatalog, ItemCatalogEntry,
    MetamagicOption, SpellCatalog, SpellCatalogEntry, METAMAGIC,
};
pub use character::{
    Ability, AbilityScores, CharacterRecord, InventoryEntry, SheetError, Skill, SpellTier,
    PROFICIENCY_BONUS,
};
pub use compendium::Compendium;
pub use dice::{extract_damage, DamageExpression};
pub use pool::ResourcePool;
pub use progression::{threshold_for, ExperienceState, MAX_LEVEL};
pub use session::{Resource, SessionError, SheetSession, Update};
pub use store::StoreError;
