//! The structured compendium document: races, classes, and backgrounds
//! with their nested trait and feature lists.
//!
//! The document is a single JSON file mapped onto explicit structs with
//! optional fields, so a malformed document fails at load time instead of
//! surfacing as a missing key deep inside a lookup. The source data is
//! irregular in two places: numbers sometimes arrive as strings, and
//! feature text is either one string or a list. The `NumberOrString`
//! and `TextBlock` shims absorb both.

use crate::catalog::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Subclass noise filtered out of class feature listings.
const EXCLUDED_FEATURES: [&str; 10] = [
    "Sorcerous",
    "Dragon",
    "Storm:",
    "Draconic",
    "Wild Magic",
    "Shadow",
    "Favored Soul",
    "Phoenix Sorcery",
    "Sea Sorcery",
    "Stone Sorcery",
];

/// A value the source encodes as either a number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(u32),
    Text(String),
}

impl NumberOrString {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            NumberOrString::Number(n) => u8::try_from(*n).ok(),
            NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Trait or feature text: a single paragraph or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextBlock {
    Single(String),
    Many(Vec<String>),
}

impl TextBlock {
    pub fn joined(&self) -> String {
        match self {
            TextBlock::Single(text) => text.clone(),
            TextBlock::Many(lines) => lines.join("\n"),
        }
    }
}

impl Default for TextBlock {
    fn default() -> Self {
        TextBlock::Many(Vec::new())
    }
}

/// A named trait on a race or background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: TextBlock,
}

/// A race and its traits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub speed: Option<NumberOrString>,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default, rename = "trait")]
    pub traits: Vec<TraitEntry>,
}

/// A background and its traits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundEntry {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default, rename = "trait")]
    pub traits: Vec<TraitEntry>,
}

/// One feature gained at some class level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: TextBlock,
}

/// The features a class gains at one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoLevelEntry {
    #[serde(default)]
    pub level: Option<NumberOrString>,
    #[serde(default)]
    pub feature: Vec<FeatureEntry>,
}

/// A class and its per-level feature table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub hd: Option<NumberOrString>,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default, rename = "spellAbility")]
    pub spell_ability: Option<String>,
    #[serde(default)]
    pub autolevel: Vec<AutoLevelEntry>,
}

/// Features grouped under the level they are gained at.
#[derive(Debug, Clone)]
pub struct LevelFeatures {
    pub level: u8,
    pub features: Vec<FeatureEntry>,
}

/// The whole reference document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compendium {
    #[serde(default)]
    pub race: Vec<RaceEntry>,
    #[serde(default)]
    pub class: Vec<ClassEntry>,
    #[serde(default)]
    pub background: Vec<BackgroundEntry>,
}

impl Compendium {
    /// Load the document. A missing file degrades to an empty compendium;
    /// a present-but-malformed one is a load error.
    pub fn load(path: impl AsRef<Path>) -> Result<Compendium, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "compendium missing");
            return Ok(Compendium::default());
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Compendium, CatalogError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Case-insensitive substring match on the race name.
    pub fn find_race(&self, name: &str) -> Result<&RaceEntry, CatalogError> {
        let needle = name.trim().to_lowercase();
        self.race
            .iter()
            .find(|r| r.name.to_lowercase().contains(&needle))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "race",
                name: name.trim().to_string(),
            })
    }

    pub fn find_class(&self, name: &str) -> Result<&ClassEntry, CatalogError> {
        let needle = name.trim().to_lowercase();
        self.class
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "class",
                name: name.trim().to_string(),
            })
    }

    pub fn find_background(&self, name: &str) -> Result<&BackgroundEntry, CatalogError> {
        let needle = name.trim().to_lowercase();
        self.background
            .iter()
            .find(|b| b.name.to_lowercase().contains(&needle))
            .ok_or_else(|| CatalogError::NotFound {
                kind: "background",
                name: name.trim().to_string(),
            })
    }

    /// Class features from level 1 up to and including `level`, grouped in
    /// level order. Subclass features on the exclusion list are dropped.
    pub fn class_features_up_to(
        &self,
        class_name: &str,
        level: u8,
    ) -> Result<Vec<LevelFeatures>, CatalogError> {
        let class = self.find_class(class_name)?;
        let mut grouped: BTreeMap<u8, Vec<FeatureEntry>> = BTreeMap::new();

        for entry in &class.autolevel {
            let entry_level = match entry.level.as_ref().and_then(NumberOrString::as_u8) {
                Some(l) => l,
                None => continue,
            };
            if entry_level > level {
                continue;
            }
            for feature in &entry.feature {
                let name = feature.name.as_deref().unwrap_or("");
                let excluded = EXCLUDED_FEATURES
                    .iter()
                    .any(|word| name.to_lowercase().contains(&word.to_lowercase()));
                if excluded {
                    continue;
                }
                grouped.entry(entry_level).or_default().push(feature.clone());
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(level, features)| LevelFeatures { level, features })
            .collect())
    }
}
